use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::time::Duration;

cfg_if::cfg_if! {
    if #[cfg(target_family = "wasm")] {
        use web_time::Instant;
    } else {
        use std::time::Instant;
    }
}

#[derive(Debug, Default, Clone)]
struct InnerTimer {
    start: Option<Instant>,
    elapsed: Duration,
    subtimers: SubTimersMap,
}

impl InnerTimer {
    fn reset(&mut self) {
        self.start = None;
        self.elapsed = Duration::ZERO;
        self.subtimers.clear();
    }

    fn start(&mut self) {
        self.start = Some(Instant::now());
    }

    fn stop(&mut self) {
        if let Some(instant) = self.start.take() {
            self.elapsed += instant.elapsed();
        }
    }

    fn suspend(&mut self) {
        //bank the time so far if this timer is running
        if let Some(instant) = self.start {
            self.elapsed += instant.elapsed();
            self.subtimers.suspend();
        }
    }

    fn resume(&mut self) {
        if self.start.is_some() {
            self.start = Some(Instant::now());
            self.subtimers.resume();
        }
    }

    // elapsed time including any currently running interval
    fn elapsed(&self) -> Duration {
        match self.start {
            Some(instant) => self.elapsed + instant.elapsed(),
            None => self.elapsed,
        }
    }
}

#[derive(Debug, Default, Clone)]
struct SubTimersMap(HashMap<&'static str, InnerTimer>);

impl Deref for SubTimersMap {
    type Target = HashMap<&'static str, InnerTimer>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl DerefMut for SubTimersMap {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl SubTimersMap {
    fn reset_subtimer(&mut self, key: &'static str) {
        self.entry(key).or_default().reset();
    }

    fn start_subtimer(&mut self, key: &'static str) {
        self.entry(key).or_default().start();
    }

    fn suspend(&mut self) {
        for t in self.values_mut() {
            t.suspend();
        }
    }

    fn resume(&mut self) {
        for t in self.values_mut() {
            t.resume();
        }
    }

    fn total_time(&self) -> Duration {
        self.values()
            .fold(Duration::ZERO, |acc, t| acc + t.elapsed())
    }

    fn find(&self, key: &str) -> Option<&InnerTimer> {
        if let Some(t) = self.get(key) {
            return Some(t);
        }
        self.values().find_map(|t| t.subtimers.find(key))
    }

    fn write_tree(&self, out: &mut String, depth: usize) {
        let mut keys: Vec<_> = self.keys().collect();
        keys.sort();
        for key in keys {
            let val = &self[key];
            let tabs = format!("{: <1$}", "", 4 * depth);
            out.push_str(&format!("{}{} : {:?}\n", tabs, key, val.elapsed()));
            val.subtimers.write_tree(out, depth + 1);
        }
    }
}

/// A stack of named, nestable timers.
///
/// Timers started while another is current become its children.
/// Elapsed times accumulate across repeated start / stop cycles
/// until explicitly reset.
#[derive(Default, Debug, Clone)]
pub struct Timers {
    stack: Vec<&'static str>,
    subtimers: SubTimersMap,
}

impl Timers {
    fn mut_active_timer(&mut self) -> Option<&mut InnerTimer> {
        let (first, rest) = self.stack.split_first()?;
        let mut active_timer = self.subtimers.get_mut(first)?;
        for key in rest {
            active_timer = active_timer.subtimers.get_mut(key)?;
        }
        Some(active_timer)
    }

    /// reset a root level timer and all of its children
    pub fn reset_timer(&mut self, key: &'static str) {
        self.subtimers.reset_subtimer(key);
    }

    /// start the timer `key` as a child of the current timer,
    /// or at root level if there is none
    pub fn start_as_current(&mut self, key: &'static str) {
        match self.mut_active_timer() {
            Some(active) => active.subtimers.start_subtimer(key),
            None => self.subtimers.start_subtimer(key),
        }
        self.stack.push(key);
    }

    /// stop the current timer and make its parent current
    pub fn stop_current(&mut self) {
        if let Some(active) = self.mut_active_timer() {
            active.stop();
        }
        self.stack.pop();
    }

    /// Suspend every timer in the collection.   Used for notimeit!
    pub fn suspend(&mut self) {
        self.subtimers.suspend();
    }

    /// Resume every timer in the collection.   Used for notimeit!
    pub fn resume(&mut self) {
        self.subtimers.resume();
    }

    /// elapsed time of the first timer found with the name `key`,
    /// searching root level timers first.  Zero if never started.
    pub fn elapsed(&self, key: &str) -> Duration {
        self.subtimers
            .find(key)
            .map_or(Duration::ZERO, |t| t.elapsed())
    }

    /// sum of all root level timers
    pub fn total_time(&self) -> Duration {
        self.subtimers.total_time()
    }

    /// indented listing of all timers, sorted by name at each level
    pub fn report(&self) -> String {
        let mut out = String::new();
        self.subtimers.write_tree(&mut out, 0);
        out
    }
}

macro_rules! timeit {
    ($timer:ident => $key:literal; $($tt:tt)+) => {

        $timer.start_as_current($key);
        $(
            $tt
        )+
        $timer.stop_current();
    }
}
pub(crate) use timeit;

macro_rules! notimeit {
    ($timer:ident; $($tt:tt)+) => {

        $timer.suspend();
        $(
            $tt
        )+
        $timer.resume();
    }
}
pub(crate) use notimeit;

#[test]
fn test_timer_nesting() {
    let mut timers = Timers::default();

    timers.start_as_current("setup");
    timers.start_as_current("equilibration");
    timers.stop_current();
    timers.stop_current();

    timers.start_as_current("solve");
    std::thread::sleep(Duration::from_millis(2));
    timers.stop_current();

    assert!(timers.elapsed("solve") >= Duration::from_millis(2));
    assert!(timers.elapsed("equilibration") <= timers.elapsed("setup"));
    assert_eq!(timers.elapsed("missing"), Duration::ZERO);
    assert_eq!(
        timers.total_time(),
        timers.elapsed("setup") + timers.elapsed("solve")
    );

    let report = timers.report();
    assert!(report.contains("    equilibration"));

    timers.reset_timer("solve");
    assert_eq!(timers.elapsed("solve"), Duration::ZERO);
}

#[test]
fn test_timer_suspend() {
    let mut timers = Timers::default();
    timers.start_as_current("solve");
    notimeit! {timers; {
        std::thread::sleep(Duration::from_millis(20));
    }}
    timers.stop_current();
    assert!(timers.elapsed("solve") < Duration::from_millis(20));
}
