//! Hierarchical wall clock timers used to report setup, solve, update
//! and polish times in the solve info.

mod timers;
pub use timers::*;
