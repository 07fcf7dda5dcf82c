#![allow(non_snake_case)]

use super::problemdata::{check_bounds, check_length};
use super::traits::QpEngine;
use super::*;
use crate::algebra::*;
use crate::io::{ConfigurablePrintTarget, PrintTarget};
use std::io::Write;
use std::marker::PhantomData;

/// Lifecycle state of a [`QpSession`]
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum SessionState {
    /// created, but not yet successfully set up
    Uninitialized,
    /// set up and ready to solve or update
    Ready,
}

// everything that exists only after a successful setup
struct ReadySession<T: FloatT, E> {
    data: ProblemData<T>,
    settings: QpSettings<T>,
    engine: E,
}

/// An incremental QP solver session.
///
/// A session is created empty, set up exactly once, and then solved and
/// updated any number of times.  Every operation other than setup fails
/// with [`SessionError::NotInitialized`] before a successful setup, and
/// a second setup fails with [`SessionError::AlreadyInitialized`].
///
/// All updates are validated in full before anything is changed, so a
/// failed operation never leaves the session partially updated.
///
/// A session is `Send`.  Operations take `&mut self`, so at most one can
/// be in flight at a time.  To share one session between threads, wrap it
/// in a `Mutex`.  Independent sessions share no state.

pub struct QpSession<T: FloatT, E: QpEngine<T>> {
    ready: Option<ReadySession<T, E>>,
    stream: PrintTarget,
    phantom: PhantomData<T>,
}

impl<T, E> Default for QpSession<T, E>
where
    T: FloatT,
    E: QpEngine<T>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> QpSession<T, E>
where
    T: FloatT,
    E: QpEngine<T>,
{
    /// Create an uninitialized session
    pub fn new() -> Self {
        Self {
            ready: None,
            stream: PrintTarget::default(),
            phantom: PhantomData,
        }
    }

    /// Set up the session for the problem
    ///
    /// minimize ½xᵀPx + qᵀx subject to l ≤ Ax ≤ u
    ///
    /// with `P` given as its upper triangle.  The dimensions are taken from
    /// `P` (n × n) and `A` (m × n).  The session keeps its own copies of all
    /// data.  On failure the session remains uninitialized.
    pub fn setup(
        &mut self,
        P: &CscMatrix<T>,
        q: &[T],
        A: &CscMatrix<T>,
        l: &[T],
        u: &[T],
        settings: QpSettings<T>,
    ) -> Result<(), SessionError> {
        if self.ready.is_some() {
            return Err(SessionError::AlreadyInitialized);
        }

        settings.validate()?;
        let data = ProblemData::new(P, q, A, l, u)?;

        log::debug!(
            "setting up session: n = {}, m = {}, nnz(P) = {}, nnz(A) = {}",
            data.n,
            data.m,
            data.P.nnz(),
            data.A.nnz()
        );

        let engine = E::setup(&data, &settings).map_err(|e| {
            log::debug!("engine setup failed: {}", e);
            SessionError::SetupFailed(e)
        })?;

        self.ready = Some(ReadySession {
            data,
            settings,
            engine,
        });
        Ok(())
    }

    /// Solve the problem with the current data, settings and iterates
    pub fn solve(&mut self) -> Result<SolveResult<T>, SessionError> {
        let ready = self.ready.as_mut().ok_or(SessionError::NotInitialized)?;
        let engine = &mut ready.engine;

        let status = engine.solve(&mut self.stream).map_err(|e| {
            log::warn!("solve failed: {}", e);
            SessionError::SolveFailed(e)
        })?;
        log::debug!("solve finished with status \"{}\"", status);

        Ok(SolveResult::assemble(
            engine.info().clone(),
            engine.primal_solution(),
            engine.dual_solution(),
            engine.primal_certificate(),
            engine.dual_certificate(),
        ))
    }

    // ---------------------------------
    // problem data updates
    // ---------------------------------

    /// Replace the linear cost `q`
    pub fn update_lin_cost(&mut self, q: &[T]) -> Result<(), SessionError> {
        let ready = self.ready_mut()?;
        check_length("q", ready.data.n, q.len())?;

        ready
            .engine
            .update_lin_cost(q)
            .map_err(SessionError::UpdateFailed)?;
        ready.data.q.copy_from_slice(q);
        Ok(())
    }

    /// Replace the lower bound `l`.  The new bound must not exceed
    /// the current upper bound.
    pub fn update_lower_bound(&mut self, l: &[T]) -> Result<(), SessionError> {
        let ready = self.ready_mut()?;
        check_length("l", ready.data.m, l.len())?;
        let u = ready.data.u.clone();
        ready.apply_bounds(l, &u)
    }

    /// Replace the upper bound `u`.  The new bound must not be below
    /// the current lower bound.
    pub fn update_upper_bound(&mut self, u: &[T]) -> Result<(), SessionError> {
        let ready = self.ready_mut()?;
        check_length("u", ready.data.m, u.len())?;
        let l = ready.data.l.clone();
        ready.apply_bounds(&l, u)
    }

    /// Replace both bounds
    pub fn update_bounds(&mut self, l: &[T], u: &[T]) -> Result<(), SessionError> {
        let ready = self.ready_mut()?;
        check_length("l", ready.data.m, l.len())?;
        check_length("u", ready.data.m, u.len())?;
        ready.apply_bounds(l, u)
    }

    /// Replace values of the upper triangle of `P`, keeping its sparsity
    /// pattern.  The input can be
    ///
    /// - a slice or Vec holding every nonzero value in structure order,
    ///
    /// - a `CscMatrix` with exactly the sparsity pattern of `P`, or
    ///
    /// - a [`PartialUpdate`] overwriting selected nonzeros by flat index.
    pub fn update_P<D>(&mut self, P: &D) -> Result<(), SessionError>
    where
        D: MatrixDataUpdate<T> + ?Sized,
    {
        let ready = self.ready_mut()?;
        let Px = P.updated_values(&ready.data.P, "P")?;

        ready.engine.update_P(&Px).map_err(|e| {
            log::warn!("update of P rejected: {}", e);
            SessionError::UpdateFailed(e)
        })?;
        ready.data.P.nzval = Px;
        Ok(())
    }

    /// Replace values of `A`, keeping its sparsity pattern.  Accepts the
    /// same inputs as [`update_P`](QpSession::update_P).
    pub fn update_A<D>(&mut self, A: &D) -> Result<(), SessionError>
    where
        D: MatrixDataUpdate<T> + ?Sized,
    {
        let ready = self.ready_mut()?;
        let Ax = A.updated_values(&ready.data.A, "A")?;

        ready.engine.update_A(&Ax).map_err(|e| {
            log::warn!("update of A rejected: {}", e);
            SessionError::UpdateFailed(e)
        })?;
        ready.data.A.nzval = Ax;
        Ok(())
    }

    /// Replace values of both `P` and `A`.  Both updates are validated
    /// before either is applied.
    pub fn update_P_and_A<DP, DA>(&mut self, P: &DP, A: &DA) -> Result<(), SessionError>
    where
        DP: MatrixDataUpdate<T> + ?Sized,
        DA: MatrixDataUpdate<T> + ?Sized,
    {
        let ready = self.ready_mut()?;
        let Px = P.updated_values(&ready.data.P, "P")?;
        let Ax = A.updated_values(&ready.data.A, "A")?;

        ready.engine.update_P_and_A(&Px, &Ax).map_err(|e| {
            log::warn!("update of P and A rejected: {}", e);
            SessionError::UpdateFailed(e)
        })?;
        ready.data.P.nzval = Px;
        ready.data.A.nzval = Ax;
        Ok(())
    }

    // ---------------------------------
    // warm starting
    // ---------------------------------

    /// Seed the next solve with primal and dual iterates.  This also
    /// enables the `warm_start` setting.
    pub fn warm_start(&mut self, x: &[T], y: &[T]) -> Result<(), SessionError> {
        let ready = self.ready_mut()?;
        check_length("x", ready.data.n, x.len())?;
        check_length("y", ready.data.m, y.len())?;
        ready.apply_warm_start(Some(x), Some(y))
    }

    /// Seed the next solve with a primal iterate
    pub fn warm_start_x(&mut self, x: &[T]) -> Result<(), SessionError> {
        let ready = self.ready_mut()?;
        check_length("x", ready.data.n, x.len())?;
        ready.apply_warm_start(Some(x), None)
    }

    /// Seed the next solve with a dual iterate
    pub fn warm_start_y(&mut self, y: &[T]) -> Result<(), SessionError> {
        let ready = self.ready_mut()?;
        check_length("y", ready.data.m, y.len())?;
        ready.apply_warm_start(None, Some(y))
    }

    // ---------------------------------
    // step size
    // ---------------------------------

    /// Change the ADMM step size.  The engine may clamp the value; the
    /// applied value is stored in the settings.  On failure the previous
    /// step size remains in effect.
    pub fn update_rho(&mut self, rho: T) -> Result<(), SessionError> {
        let ready = self.ready_mut()?;
        let applied = ready.engine.update_rho(rho).map_err(|e| {
            log::warn!("rho update to {} rejected: {}", rho, e);
            SessionError::RhoUpdateFailed(e)
        })?;
        ready.settings.rho = applied;
        Ok(())
    }

    /// Per-constraint step sizes
    pub fn rho_vec(&self) -> Result<Vec<T>, SessionError> {
        Ok(self.ready_ref()?.engine.rho_vec())
    }

    /// Replace the per-constraint step sizes.  Only the length is checked.
    pub fn set_rho_vec(&mut self, rho_vec: &[T]) -> Result<(), SessionError> {
        let ready = self.ready_mut()?;
        if rho_vec.len() != ready.data.m {
            return Err(SessionError::SizeMismatch {
                expected: ready.data.m,
                found: rho_vec.len(),
            });
        }
        ready
            .engine
            .set_rho_vec(rho_vec)
            .map_err(SessionError::RhoUpdateFailed)
    }

    // ---------------------------------
    // settings updates
    // ---------------------------------

    pub fn update_max_iter(&mut self, max_iter: u32) -> Result<(), SessionError> {
        self.update_setting(|s| s.max_iter = max_iter)
    }

    pub fn update_eps_abs(&mut self, eps_abs: T) -> Result<(), SessionError> {
        self.update_setting(|s| s.eps_abs = eps_abs)
    }

    pub fn update_eps_rel(&mut self, eps_rel: T) -> Result<(), SessionError> {
        self.update_setting(|s| s.eps_rel = eps_rel)
    }

    pub fn update_eps_prim_inf(&mut self, eps_prim_inf: T) -> Result<(), SessionError> {
        self.update_setting(|s| s.eps_prim_inf = eps_prim_inf)
    }

    pub fn update_eps_dual_inf(&mut self, eps_dual_inf: T) -> Result<(), SessionError> {
        self.update_setting(|s| s.eps_dual_inf = eps_dual_inf)
    }

    pub fn update_alpha(&mut self, alpha: T) -> Result<(), SessionError> {
        self.update_setting(|s| s.alpha = alpha)
    }

    pub fn update_delta(&mut self, delta: T) -> Result<(), SessionError> {
        self.update_setting(|s| s.delta = delta)
    }

    pub fn update_polish(&mut self, polish: bool) -> Result<(), SessionError> {
        self.update_setting(|s| s.polish = polish)
    }

    pub fn update_polish_refine_iter(&mut self, iters: u32) -> Result<(), SessionError> {
        self.update_setting(|s| s.polish_refine_iter = iters)
    }

    pub fn update_verbose(&mut self, verbose: bool) -> Result<(), SessionError> {
        self.update_setting(|s| s.verbose = verbose)
    }

    pub fn update_scaled_termination(&mut self, scaled: bool) -> Result<(), SessionError> {
        self.update_setting(|s| s.scaled_termination = scaled)
    }

    pub fn update_check_termination(&mut self, interval: u32) -> Result<(), SessionError> {
        self.update_setting(|s| s.check_termination = interval)
    }

    pub fn update_warm_start(&mut self, warm_start: bool) -> Result<(), SessionError> {
        self.update_setting(|s| s.warm_start = warm_start)
    }

    pub fn update_time_limit(&mut self, time_limit: f64) -> Result<(), SessionError> {
        self.update_setting(|s| s.time_limit = time_limit)
    }

    /// Replace all updatable settings at once.  Fails if any setup-only
    /// field (or `rho`) differs from its current value.
    pub fn update_settings(&mut self, settings: QpSettings<T>) -> Result<(), SessionError> {
        self.update_setting(|s| *s = settings)
    }

    fn update_setting<F>(&mut self, f: F) -> Result<(), SessionError>
    where
        F: FnOnce(&mut QpSettings<T>),
    {
        let ready = self.ready_mut()?;
        let mut settings = ready.settings.clone();
        f(&mut settings);
        settings.validate_as_update(&ready.settings)?;

        ready
            .engine
            .update_settings(&settings)
            .map_err(SessionError::UpdateFailed)?;
        ready.settings = settings;
        Ok(())
    }

    // ---------------------------------
    // introspection
    // ---------------------------------

    pub fn state(&self) -> SessionState {
        match self.ready {
            Some(_) => SessionState::Ready,
            None => SessionState::Uninitialized,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.ready.is_some()
    }

    /// number of variables and constraints (n, m)
    pub fn dimensions(&self) -> Result<(usize, usize), SessionError> {
        let data = &self.ready_ref()?.data;
        Ok((data.n, data.m))
    }

    /// current settings
    pub fn settings(&self) -> Result<&QpSettings<T>, SessionError> {
        Ok(&self.ready_ref()?.settings)
    }

    /// current (unscaled) problem data
    pub fn problem_data(&self) -> Result<&ProblemData<T>, SessionError> {
        Ok(&self.ready_ref()?.data)
    }

    /// info record of the most recent solve
    pub fn info(&self) -> Result<&QpInfo<T>, SessionError> {
        Ok(self.ready_ref()?.engine.info())
    }

    pub fn lower_bound(&self) -> Result<Vec<T>, SessionError> {
        Ok(self.ready_ref()?.data.l.clone())
    }

    pub fn upper_bound(&self) -> Result<Vec<T>, SessionError> {
        Ok(self.ready_ref()?.data.u.clone())
    }

    /// current primal iterate
    pub fn x(&self) -> Result<Vec<T>, SessionError> {
        Ok(self.ready_ref()?.engine.x())
    }

    /// current dual iterate
    pub fn y(&self) -> Result<Vec<T>, SessionError> {
        Ok(self.ready_ref()?.engine.y())
    }

    /// current projected constraint iterate
    pub fn z(&self) -> Result<Vec<T>, SessionError> {
        Ok(self.ready_ref()?.engine.z())
    }

    /// current unprojected constraint iterate
    pub fn z_tilde(&self) -> Result<Vec<T>, SessionError> {
        Ok(self.ready_ref()?.engine.z_tilde())
    }

    /// A times the current primal iterate
    pub fn Ax(&self) -> Result<Vec<T>, SessionError> {
        Ok(self.ready_ref()?.engine.Ax())
    }

    /// Engine name and version
    pub fn version(&self) -> String {
        E::version()
    }

    fn ready_ref(&self) -> Result<&ReadySession<T, E>, SessionError> {
        self.ready.as_ref().ok_or(SessionError::NotInitialized)
    }

    fn ready_mut(&mut self) -> Result<&mut ReadySession<T, E>, SessionError> {
        self.ready.as_mut().ok_or(SessionError::NotInitialized)
    }
}

impl<T, E> ReadySession<T, E>
where
    T: FloatT,
    E: QpEngine<T>,
{
    fn apply_bounds(&mut self, l: &[T], u: &[T]) -> Result<(), SessionError> {
        check_bounds(l, u)?;
        self.engine
            .update_bounds(l, u)
            .map_err(SessionError::UpdateFailed)?;
        self.data.l.copy_from_slice(l);
        self.data.u.copy_from_slice(u);
        Ok(())
    }

    fn apply_warm_start(&mut self, x: Option<&[T]>, y: Option<&[T]>) -> Result<(), SessionError> {
        if !self.settings.warm_start {
            let mut settings = self.settings.clone();
            settings.warm_start = true;
            self.engine
                .update_settings(&settings)
                .map_err(SessionError::UpdateFailed)?;
            self.settings = settings;
        }
        self.engine.warm_start(x, y);
        Ok(())
    }
}

impl<T, E> ConfigurablePrintTarget for QpSession<T, E>
where
    T: FloatT,
    E: QpEngine<T>,
{
    fn print_to_stdout(&mut self) {
        self.stream.print_to_stdout()
    }
    fn print_to_file(&mut self, file: std::fs::File) {
        self.stream.print_to_file(file)
    }
    fn print_to_stream(&mut self, stream: Box<dyn Write + Send + Sync>) {
        self.stream.print_to_stream(stream)
    }
    fn print_to_buffer(&mut self) {
        self.stream.print_to_buffer()
    }
    fn print_to_sink(&mut self) {
        self.stream.print_to_sink()
    }
    fn get_print_buffer(&mut self) -> std::io::Result<String> {
        self.stream.get_print_buffer()
    }
}

impl<T, E> Drop for QpSession<T, E>
where
    T: FloatT,
    E: QpEngine<T>,
{
    fn drop(&mut self) {
        if let Some(mut ready) = self.ready.take() {
            if let Err(e) = ready.engine.cleanup() {
                log::error!("session cleanup failed: {}", e);
            }
        }
    }
}
