//! Required trait for types providing a session's solve engine.
//!
//! A [`QpSession`](crate::solver::QpSession) owns an engine and drives it
//! through this trait.  The session validates every input before any
//! engine method is called, so implementations may assume that vector
//! and matrix dimensions agree with the problem they were set up with.
//!
//! In nearly all cases there is no need for a user to implement this trait.
//! The [default engine](crate::solver::implementations::admm) solves the
//! problem format described in the top level crate documentation.

#![allow(non_snake_case)]

use super::{EngineError, ProblemData, QpInfo, QpSettings, QpStatus};
use crate::algebra::*;
use std::io::Write;

/// A solve engine for a QP session.
///
/// Every mutating method must either succeed or leave the engine in the
/// state it had before the call.

pub trait QpEngine<T: FloatT>: Sized + Send {
    /// Build an engine for validated problem data and settings.
    fn setup(data: &ProblemData<T>, settings: &QpSettings<T>) -> Result<Self, EngineError>;

    /// Run the solve method, writing any verbose output to `out`.
    ///
    /// An `Err` indicates an internal failure.  Infeasibility and
    /// iteration or time limits are reported through the returned status.
    fn solve(&mut self, out: &mut dyn Write) -> Result<QpStatus, EngineError>;

    /// Summary of the most recent solve
    fn info(&self) -> &QpInfo<T>;

    /// Unscaled primal solution of the most recent solve (length n)
    fn primal_solution(&self) -> &[T];

    /// Unscaled dual solution of the most recent solve (length m)
    fn dual_solution(&self) -> &[T];

    /// Certificate of primal infeasibility (length m)
    fn primal_certificate(&self) -> &[T];

    /// Certificate of dual infeasibility (length n)
    fn dual_certificate(&self) -> &[T];

    /// Current unscaled iterates
    fn x(&self) -> Vec<T>;
    fn y(&self) -> Vec<T>;
    fn z(&self) -> Vec<T>;
    fn z_tilde(&self) -> Vec<T>;
    fn Ax(&self) -> Vec<T>;

    /// Per-constraint step sizes (length m)
    fn rho_vec(&self) -> Vec<T>;

    /// Replace the per-constraint step sizes
    fn set_rho_vec(&mut self, rho_vec: &[T]) -> Result<(), EngineError>;

    /// Change the scalar step size.  Returns the value actually applied.
    fn update_rho(&mut self, rho: T) -> Result<T, EngineError>;

    fn update_lin_cost(&mut self, q: &[T]) -> Result<(), EngineError>;

    fn update_bounds(&mut self, l: &[T], u: &[T]) -> Result<(), EngineError>;

    /// Replace all nonzero values of P (upper triangle, unscaled)
    fn update_P(&mut self, Px: &[T]) -> Result<(), EngineError>;

    /// Replace all nonzero values of A (unscaled)
    fn update_A(&mut self, Ax: &[T]) -> Result<(), EngineError>;

    /// Replace the nonzero values of P and A together
    fn update_P_and_A(&mut self, Px: &[T], Ax: &[T]) -> Result<(), EngineError>;

    /// Seed the next solve with unscaled primal and/or dual iterates
    fn warm_start(&mut self, x: Option<&[T]>, y: Option<&[T]>);

    /// Apply settings already validated against the previous ones
    fn update_settings(&mut self, settings: &QpSettings<T>) -> Result<(), EngineError>;

    /// Release engine resources
    fn cleanup(&mut self) -> Result<(), EngineError>;

    /// Engine name and version
    fn version() -> String;
}
