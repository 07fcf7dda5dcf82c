//! QP session main module.
//!
//! This module contains the session state machine, its settings, problem
//! data and result types, and the [`QpEngine`](crate::solver::traits::QpEngine)
//! trait that separates the session from the numerical method that solves it.
//!
//! The crate comes with a [default engine](crate::solver::implementations::admm)
//! implementing an operator splitting method.  Most users should construct
//! a [`DefaultSession`] and never interact with the engine directly.
//!
//! It is also possible to drive a session with a custom engine by
//! implementing [`QpEngine`](crate::solver::traits::QpEngine) and
//! instantiating [`QpSession`] with it.

/// Bound magnitude treated as infinite.  Larger bounds are clipped to it.
pub const QP_INFINITY: f64 = 1e30;

// internal module structure
pub(crate) mod core;
pub mod implementations;

//user facing session, data and result types
pub use crate::solver::core::{
    default_settings, EngineError, MatrixDataUpdate, PartialUpdate, PolishStatus, ProblemData,
    QpInfo, QpSession, QpSettings, QpSettingsBuilder, QpSettingsBuilderError, QpStatus,
    QpTiming, SessionError, SessionState, SettingsError, SolveResult,
};

//user facing traits required to define new engines
pub use crate::solver::core::traits;

pub use crate::solver::implementations::admm;
pub use crate::solver::implementations::admm::{AdmmEngine, DefaultSession};
