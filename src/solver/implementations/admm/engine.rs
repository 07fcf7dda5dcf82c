#![allow(non_snake_case)]
use super::info_print::*;
use super::*;
use crate::algebra::*;
use crate::solver::core::traits::QpEngine;
use crate::solver::core::{EngineError, PolishStatus, ProblemData, QpInfo, QpSettings, QpStatus};
use crate::timers::*;
use std::io::Write;

/// Unscaled outputs of the most recent solve
#[derive(Debug, Clone)]
pub struct AdmmSolution<T> {
    pub x: Vec<T>,
    pub y: Vec<T>,
    pub prim_inf_cert: Vec<T>,
    pub dual_inf_cert: Vec<T>,
}

impl<T> AdmmSolution<T>
where
    T: FloatT,
{
    pub fn new(n: usize, m: usize) -> Self {
        Self {
            x: vec![T::nan(); n],
            y: vec![T::nan(); m],
            prim_inf_cert: vec![T::nan(); m],
            dual_inf_cert: vec![T::nan(); n],
        }
    }
}

/// The default ADMM solve engine
#[derive(Debug)]
pub struct AdmmEngine<T: FloatT> {
    pub(crate) data: AdmmProblemData<T>,
    pub(crate) settings: QpSettings<T>,
    pub(crate) kkt: KKTSystem<T>,
    pub(crate) variables: AdmmVariables<T>,
    pub(crate) residuals: AdmmResiduals<T>,
    pub(crate) constraints: Vec<ConstraintKind>,
    pub(crate) rho_vec: Vec<T>,
    pub(crate) rho_inv_vec: Vec<T>,
    pub(crate) info: QpInfo<T>,
    pub(crate) solution: AdmmSolution<T>,
    pub(crate) timers: Timers,
    // seconds spent in setup
    pub(crate) setup_time: f64,
    // iterations between rho adaptations.  Zero until determined
    pub(crate) adaptive_rho_interval: u32,
    // set when P has been updated to a non-convex matrix
    pub(crate) nonconvex: bool,
    first_run: bool,
}

impl<T> AdmmEngine<T>
where
    T: FloatT,
{
    fn build(data: &ProblemData<T>, settings: &QpSettings<T>) -> Result<Self, EngineError> {
        let (n, m) = (data.n, data.m);
        let mut settings = settings.clone();

        let scaled = AdmmProblemData::new(data, &settings);

        let rho = settings.rho.project(RHO_MIN.as_T(), RHO_MAX.as_T());
        settings.rho = rho;
        let constraints = classify_constraints(&scaled.l, &scaled.u);
        let rho_vec: Vec<T> = constraints.iter().map(|c| c.rho(rho)).collect();
        let mut rho_inv_vec = vec![T::zero(); m];
        rho_inv_vec.scalarop_from(T::recip, &rho_vec);

        let kkt = KKTSystem::new(&scaled.P, &scaled.A, settings.sigma, &rho_vec)?;

        let adaptive_rho_interval = initial_adaptive_rho_interval(&settings);

        let info = QpInfo {
            rho_estimate: rho,
            obj_val: T::nan(),
            pri_res: T::nan(),
            dua_res: T::nan(),
            ..QpInfo::default()
        };

        Ok(Self {
            data: scaled,
            settings,
            kkt,
            variables: AdmmVariables::new(n, m),
            residuals: AdmmResiduals::new(n, m),
            constraints,
            rho_vec,
            rho_inv_vec,
            info,
            solution: AdmmSolution::new(n, m),
            timers: Timers::default(),
            setup_time: 0.0,
            adaptive_rho_interval,
            nonconvex: false,
            first_run: true,
        })
    }

    fn run(&mut self, out: &mut dyn Write, timers: &mut Timers) -> Result<QpStatus, EngineError> {
        let verbose = self.settings.verbose;

        self.reset_info();

        if verbose {
            notimeit! {timers; {
                report_print(print_banner(out));
                report_print(print_configuration(out, &self.data, &self.settings));
                report_print(print_status_header(out));
            }}
        }

        if self.nonconvex {
            log::warn!("solve requested for a non-convex problem");
            self.info.status = QpStatus::NonConvex;
            self.update_timing(timers);
            if verbose {
                report_print(print_footer(out, &self.info));
            }
            return Ok(QpStatus::NonConvex);
        }

        if !self.settings.warm_start {
            self.variables.cold_start();
        }

        let status;
        timeit! {timers => "solve"; {
            status = self.admm_iterations(out, timers);
        }}

        let status = match status {
            Ok(status) => status,
            Err(e) => {
                // don't resume from corrupted iterates
                self.variables.cold_start();
                return Err(e);
            }
        };

        self.info.status = status;
        self.info.obj_val = self.data.objective(&self.variables.x);

        if self.settings.polish && status == QpStatus::Solved {
            timeit! {timers => "polish"; {
                self.info.status_polish = self.polish();
            }}
            if self.info.status_polish == PolishStatus::Successful {
                self.info.obj_val = self.data.objective(&self.variables.x);
            }
            if verbose {
                report_print(print_polish(out, &self.info));
            }
        }

        self.store_solution();
        self.update_timing(timers);

        if verbose {
            report_print(print_footer(out, &self.info));
        }

        Ok(status)
    }

    fn admm_iterations(
        &mut self,
        out: &mut dyn Write,
        timers: &Timers,
    ) -> Result<QpStatus, EngineError> {
        let (sigma, alpha) = (self.settings.sigma, self.settings.alpha);
        let check_every = self.settings.check_termination;
        let verbose = self.settings.verbose;

        let mut status = QpStatus::Unsolved;
        let mut iter = 0;
        let mut printed_last = false;

        for k in 1..=self.settings.max_iter {
            iter = k;

            self.variables.step(
                &self.data,
                &mut self.kkt,
                &self.rho_vec,
                &self.rho_inv_vec,
                sigma,
                alpha,
            );

            if self.time_limit_reached(timers) {
                status = QpStatus::TimeLimitReached;
                break;
            }

            #[cfg(feature = "profiling")]
            self.set_adaptive_rho_interval(k, timers);

            let can_check = check_every > 0 && k % check_every == 0;
            let can_print = verbose && (k == 1 || k % PRINT_INTERVAL == 0);
            let can_adapt = self.settings.adaptive_rho
                && self.adaptive_rho_interval > 0
                && k % self.adaptive_rho_interval == 0;

            if can_check || can_print || can_adapt {
                self.update_residuals();
            }

            if can_print {
                self.info.obj_val = self.data.objective(&self.variables.x);
                report_print(print_status(
                    out,
                    k,
                    self.info.obj_val,
                    self.info.pri_res,
                    self.info.dua_res,
                    self.settings.rho,
                    timers.elapsed("solve"),
                ));
            }
            printed_last = can_print;

            if can_check {
                self.check_finite()?;
                if let Some(s) = self.check_termination(false) {
                    status = s;
                    break;
                }
            }

            if can_adapt {
                self.adapt_rho();
            }
        }

        self.info.iter = iter;
        self.update_residuals();

        if status == QpStatus::Unsolved {
            self.check_finite()?;
            status = self
                .check_termination(false)
                .or_else(|| self.check_termination(true))
                .unwrap_or(QpStatus::MaxIterReached);
        }

        if verbose && !printed_last {
            report_print(print_status(
                out,
                iter,
                self.data.objective(&self.variables.x),
                self.info.pri_res,
                self.info.dua_res,
                self.settings.rho,
                timers.elapsed("solve"),
            ));
        }

        log::debug!(
            "ADMM finished after {} iterations with status \"{}\"",
            iter,
            status
        );
        Ok(status)
    }

    fn update_residuals(&mut self) {
        let vars = &self.variables;
        self.residuals.update(
            &vars.x,
            &vars.z,
            &vars.y,
            &self.data,
            self.settings.scaled_termination,
        );
        self.info.pri_res = self.residuals.pri_res;
        self.info.dua_res = self.residuals.dua_res;
    }

    fn check_finite(&self) -> Result<(), EngineError> {
        let vars = &self.variables;
        if vars.x.is_finite() && vars.y.is_finite() && vars.z.is_finite() {
            Ok(())
        } else {
            Err(EngineError::Numerical("ADMM iterates"))
        }
    }

    // Requires up to date residuals.  With `approximate` set the
    // tolerances are relaxed and the inaccurate statuses reported.
    fn check_termination(&mut self, approximate: bool) -> Option<QpStatus> {
        let set = &self.settings;
        let factor: T = match approximate {
            true => INACCURATE_TOL_FACTOR.as_T(),
            false => T::one(),
        };
        let scaled = set.scaled_termination;

        let pick = |accurate, inaccurate| match approximate {
            false => accurate,
            true => inaccurate,
        };

        if self
            .residuals
            .is_converged(set.eps_abs * factor, set.eps_rel * factor, self.data.m)
        {
            return Some(pick(QpStatus::Solved, QpStatus::SolvedInaccurate));
        }

        if self.residuals.is_primal_infeasible(
            &mut self.variables.delta_y,
            &self.data,
            set.eps_prim_inf * factor,
            scaled,
        ) {
            return Some(pick(
                QpStatus::PrimalInfeasible,
                QpStatus::PrimalInfeasibleInaccurate,
            ));
        }

        if self.residuals.is_dual_infeasible(
            &self.variables.delta_x,
            &self.data,
            set.eps_dual_inf * factor,
            scaled,
        ) {
            return Some(pick(
                QpStatus::DualInfeasible,
                QpStatus::DualInfeasibleInaccurate,
            ));
        }
        None
    }

    fn time_limit_reached(&self, timers: &Timers) -> bool {
        let limit = self.settings.time_limit;
        if limit == 0.0 {
            return false;
        }
        let elapsed = timers.elapsed("solve").as_secs_f64() + self.prior_time(timers);
        elapsed > limit
    }

    // time counted against the time limit before the solve starts
    fn prior_time(&self, timers: &Timers) -> f64 {
        match self.first_run {
            true => self.setup_time,
            false => timers.elapsed("update").as_secs_f64(),
        }
    }

    // fix the automatic rho adaptation interval once the solve has
    // taken a fraction of the setup time
    #[cfg(feature = "profiling")]
    fn set_adaptive_rho_interval(&mut self, iter: u32, timers: &Timers) {
        if !self.settings.adaptive_rho || self.adaptive_rho_interval > 0 {
            return;
        }
        let elapsed = timers.elapsed("solve").as_secs_f64();
        if elapsed <= self.settings.adaptive_rho_fraction * self.setup_time {
            return;
        }

        let check_every = self.settings.check_termination;
        self.adaptive_rho_interval = match check_every {
            0 => iter,
            c => u32::max(round_to_multiple(iter, c), c),
        };
        log::debug!(
            "adaptive rho interval set to {} iterations",
            self.adaptive_rho_interval
        );
    }

    // Requires up to date residuals
    fn adapt_rho(&mut self) {
        let rho = self.settings.rho;
        let rho_new = self
            .residuals
            .rho_estimate(&self.variables.z, &self.data, rho);
        self.info.rho_estimate = rho_new;

        let tol = self.settings.adaptive_rho_tolerance;
        if rho_new > rho * tol || rho_new < rho / tol {
            match self.apply_rho(rho_new) {
                Ok(_) => self.info.rho_updates += 1,
                Err(e) => log::warn!("rho adaptation to {:e} failed: {}", rho_new, e),
            }
        }
    }

    /// Set the scalar step size and refactor.  Returns the clamped
    /// value applied.
    pub(crate) fn apply_rho(&mut self, rho: T) -> Result<T, EngineError> {
        let rho = rho.project(RHO_MIN.as_T(), RHO_MAX.as_T());
        let rho_vec: Vec<T> = self.constraints.iter().map(|c| c.rho(rho)).collect();
        self.kkt.update_rho_vec(&rho_vec)?;

        self.rho_inv_vec.scalarop_from(T::recip, &rho_vec);
        self.rho_vec = rho_vec;
        self.settings.rho = rho;
        Ok(rho)
    }

    fn reset_info(&mut self) {
        self.info = QpInfo {
            rho_estimate: self.settings.rho,
            obj_val: T::nan(),
            pri_res: T::nan(),
            dua_res: T::nan(),
            ..QpInfo::default()
        };
    }

    fn store_solution(&mut self) {
        let status = self.info.status;
        let equil = &self.data.equilibration;
        let vars = &mut self.variables;
        let sol = &mut self.solution;

        if status.is_primal_infeasible() {
            sol.prim_inf_cert.copy_from(&vars.delta_y).hadamard(&equil.e);
            normalize_inf(&mut sol.prim_inf_cert);
            sol.x.set(T::nan());
            sol.y.set(T::nan());
            vars.cold_start();
        } else if status.is_dual_infeasible() {
            sol.dual_inf_cert.copy_from(&vars.delta_x).hadamard(&equil.d);
            normalize_inf(&mut sol.dual_inf_cert);
            sol.x.set(T::nan());
            sol.y.set(T::nan());
            vars.cold_start();
        } else {
            equil.unscale_x(&mut sol.x, &vars.x);
            equil.unscale_y(&mut sol.y, &vars.y);
        }
    }

    fn update_timing(&mut self, timers: &mut Timers) {
        #[cfg(feature = "profiling")]
        {
            let solve_time = timers.elapsed("solve").as_secs_f64();
            let polish_time = timers.elapsed("polish").as_secs_f64();
            let update_time = timers.elapsed("update").as_secs_f64();
            let run_time = solve_time + polish_time + self.prior_time(timers);

            self.info.timing = Some(crate::solver::core::QpTiming {
                setup_time: self.setup_time,
                solve_time,
                update_time,
                polish_time,
                run_time,
            });
        }
        // updates are accumulated until the next solve
        timers.reset_timer("update");
        self.first_run = false;
    }

    /// Run an update operation and accumulate its time
    pub(crate) fn timed_update<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let mut timers = std::mem::take(&mut self.timers);
        let result;
        timeit! {timers => "update"; {
            result = f(self);
        }}
        self.timers = timers;
        result
    }
}

impl<T> QpEngine<T> for AdmmEngine<T>
where
    T: FloatT,
{
    fn setup(data: &ProblemData<T>, settings: &QpSettings<T>) -> Result<Self, EngineError> {
        let mut timers = Timers::default();
        let engine;
        timeit! {timers => "setup"; {
            engine = Self::build(data, settings);
        }}
        let mut engine = engine?;

        engine.setup_time = timers.elapsed("setup").as_secs_f64();
        engine.timers = timers;
        log::debug!("ADMM setup took {:?}", engine.timers.elapsed("setup"));
        Ok(engine)
    }

    fn solve(&mut self, out: &mut dyn Write) -> Result<QpStatus, EngineError> {
        let mut timers = std::mem::take(&mut self.timers);
        timers.reset_timer("solve");
        timers.reset_timer("polish");

        let result = self.run(out, &mut timers);

        self.timers = timers;
        result
    }

    fn info(&self) -> &QpInfo<T> {
        &self.info
    }

    fn primal_solution(&self) -> &[T] {
        &self.solution.x
    }

    fn dual_solution(&self) -> &[T] {
        &self.solution.y
    }

    fn primal_certificate(&self) -> &[T] {
        &self.solution.prim_inf_cert
    }

    fn dual_certificate(&self) -> &[T] {
        &self.solution.dual_inf_cert
    }

    fn x(&self) -> Vec<T> {
        let mut x = vec![T::zero(); self.data.n];
        self.data.equilibration.unscale_x(&mut x, &self.variables.x);
        x
    }

    fn y(&self) -> Vec<T> {
        let mut y = vec![T::zero(); self.data.m];
        self.data.equilibration.unscale_y(&mut y, &self.variables.y);
        y
    }

    fn z(&self) -> Vec<T> {
        let mut z = self.variables.z.clone();
        z.hadamard(&self.data.equilibration.einv);
        z
    }

    fn z_tilde(&self) -> Vec<T> {
        let mut zt = self.variables.z_tilde().to_vec();
        zt.hadamard(&self.data.equilibration.einv);
        zt
    }

    fn Ax(&self) -> Vec<T> {
        let mut Ax = vec![T::zero(); self.data.m];
        self.data
            .A
            .gemv(&mut Ax, &self.variables.x, T::one(), T::zero());
        Ax.hadamard(&self.data.equilibration.einv);
        Ax
    }

    fn rho_vec(&self) -> Vec<T> {
        self.rho_vec.clone()
    }

    fn set_rho_vec(&mut self, rho_vec: &[T]) -> Result<(), EngineError> {
        self.timed_update(|engine| engine.apply_rho_vec(rho_vec))
    }

    fn update_rho(&mut self, rho: T) -> Result<T, EngineError> {
        if !(rho > T::zero() && rho.is_finite()) {
            return Err(EngineError::InvalidValue("rho"));
        }
        self.timed_update(|engine| engine.apply_rho(rho))
    }

    fn update_lin_cost(&mut self, q: &[T]) -> Result<(), EngineError> {
        self.timed_update(|engine| {
            engine.data.set_q(q);
            Ok(())
        })
    }

    fn update_bounds(&mut self, l: &[T], u: &[T]) -> Result<(), EngineError> {
        self.timed_update(|engine| engine.apply_bounds(l, u))
    }

    fn update_P(&mut self, Px: &[T]) -> Result<(), EngineError> {
        self.timed_update(|engine| engine.apply_P(Px))
    }

    fn update_A(&mut self, Ax: &[T]) -> Result<(), EngineError> {
        self.timed_update(|engine| engine.apply_A(Ax))
    }

    fn update_P_and_A(&mut self, Px: &[T], Ax: &[T]) -> Result<(), EngineError> {
        self.timed_update(|engine| engine.apply_P_and_A(Px, Ax))
    }

    fn warm_start(&mut self, x: Option<&[T]>, y: Option<&[T]>) {
        self.timed_update(|engine| engine.apply_warm_start(x, y))
    }

    fn update_settings(&mut self, settings: &QpSettings<T>) -> Result<(), EngineError> {
        // rho is only changed through update_rho
        let rho = self.settings.rho;
        self.settings = settings.clone();
        self.settings.rho = rho;
        Ok(())
    }

    fn cleanup(&mut self) -> Result<(), EngineError> {
        log::debug!("releasing ADMM engine ({} x {})", self.data.n, self.data.m);
        Ok(())
    }

    fn version() -> String {
        crate::version().to_string()
    }
}

fn initial_adaptive_rho_interval<T: FloatT>(settings: &QpSettings<T>) -> u32 {
    if settings.adaptive_rho_interval > 0 {
        return settings.adaptive_rho_interval;
    }
    // determined during the first solve from the setup time
    if cfg!(feature = "profiling") {
        return 0;
    }
    match settings.check_termination {
        0 => ADAPTIVE_RHO_FIXED,
        c => ADAPTIVE_RHO_MULTIPLE_TERMINATION * c,
    }
}

#[cfg(feature = "profiling")]
fn round_to_multiple(x: u32, c: u32) -> u32 {
    ((x + c / 2) / c) * c
}

fn normalize_inf<T: FloatT>(v: &mut [T]) {
    let norm = v.norm_inf();
    if norm > DIVISION_TOL.as_T() {
        v.scale(T::recip(norm));
    }
}

fn report_print(result: std::io::Result<()>) {
    if let Err(e) = result {
        log::warn!("verbose output failed: {}", e);
    }
}

#[cfg(test)]
fn test_engine(settings: QpSettings<f64>) -> AdmmEngine<f64> {
    // minimize x² + y² + x subject to x + y = 1, 0 ≤ x, y ≤ 0.7
    let P = CscMatrix::from(&[[2., 0.], [0., 2.]]);
    let A = CscMatrix::from(&[[1., 1.], [1., 0.], [0., 1.]]);
    let data = ProblemData::new(&P, &[1., 0.], &A, &[1., 0., 0.], &[1., 0.7, 0.7]).unwrap();
    AdmmEngine::setup(&data, &settings).unwrap()
}

#[test]
fn test_engine_solve() {
    let settings = QpSettings {
        verbose: false,
        eps_abs: 1e-7,
        eps_rel: 1e-7,
        ..QpSettings::default()
    };
    let mut engine = test_engine(settings);
    let status = engine.solve(&mut std::io::sink()).unwrap();
    assert_eq!(status, QpStatus::Solved);

    // optimum at x = (0.3, 0.7)
    let x = engine.primal_solution();
    assert!((x[0] - 0.3).abs() < 1e-4);
    assert!((x[1] - 0.7).abs() < 1e-4);
    let obj = 0.09 + 0.49 + 0.3;
    assert!((engine.info().obj_val - obj).abs() < 1e-4);
    assert!(engine.info().iter > 0);
}

#[test]
fn test_engine_verbose_output() {
    let mut engine = test_engine(QpSettings::default());
    let mut buf = Vec::<u8>::new();
    engine.solve(&mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.contains("qpsession"));
    assert!(text.contains("status:               solved"));
}

#[test]
fn test_engine_time_limit() {
    let settings = QpSettings {
        verbose: false,
        time_limit: 1e-12,
        eps_abs: 1e-12,
        eps_rel: 1e-12,
        ..QpSettings::default()
    };
    let mut engine = test_engine(settings);
    let status = engine.solve(&mut std::io::sink()).unwrap();
    assert_eq!(status, QpStatus::TimeLimitReached);
    assert_eq!(engine.info().iter, 1);
}

#[test]
fn test_engine_max_iter() {
    let settings = QpSettings {
        verbose: false,
        max_iter: 5,
        eps_abs: 1e-12,
        eps_rel: 1e-12,
        ..QpSettings::default()
    };
    let mut engine = test_engine(settings);
    let status = engine.solve(&mut std::io::sink()).unwrap();
    assert_eq!(status, QpStatus::MaxIterReached);
    assert_eq!(engine.info().iter, 5);
    assert!(engine.primal_solution().is_finite());
}
