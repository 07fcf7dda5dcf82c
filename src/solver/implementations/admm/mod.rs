//! Operator splitting (ADMM) solve engine.
//!
//! The engine works on a Ruiz equilibrated copy of the problem data and
//! solves one quasidefinite KKT system per iteration, reusing a single
//! LDLᵀ factorization until the step size or the matrix values change.

#![allow(non_snake_case)]

mod data_updating;
mod engine;
mod equilibration;
mod info_print;
mod kktsystem;
mod polish;
mod problemdata;
mod residuals;
mod variables;

//export flattened
pub use engine::*;
pub use equilibration::*;
pub use kktsystem::*;
pub use problemdata::*;
pub use residuals::*;
pub use variables::*;

use crate::solver::core::QpSession;

/// A [`QpSession`] driven by the ADMM engine
pub type DefaultSession<T = f64> = QpSession<T, AdmmEngine<T>>;

// step size limits
pub(crate) const RHO_MIN: f64 = 1e-6;
pub(crate) const RHO_MAX: f64 = 1e6;
// step size multiplier for equality constraints
pub(crate) const RHO_EQ_OVER_RHO_INEQ: f64 = 1e3;
// bound gap below which a constraint is an equality
pub(crate) const RHO_TOL: f64 = 1e-4;

// equilibration limits
pub(crate) const MIN_SCALING: f64 = 1e-4;
pub(crate) const MAX_SCALING: f64 = 1e4;

pub(crate) const DIVISION_TOL: f64 = 1e-30;

// automatic adaptive rho interval, in units of the termination check interval
pub(crate) const ADAPTIVE_RHO_MULTIPLE_TERMINATION: u32 = 4;
// automatic adaptive rho interval when termination is only checked at the end
pub(crate) const ADAPTIVE_RHO_FIXED: u32 = 25;

// verbose output every PRINT_INTERVAL iterations
pub(crate) const PRINT_INTERVAL: u32 = 200;

// relaxation of the tolerances in the final, approximate, termination check
pub(crate) const INACCURATE_TOL_FACTOR: f64 = 10.0;
