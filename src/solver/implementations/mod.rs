//! Solve engine implementations.
//!
//! The [`admm`] engine is used by [`DefaultSession`](crate::solver::DefaultSession).
//! Alternative engines can be provided by implementing
//! [`QpEngine`](crate::solver::traits::QpEngine).

pub mod admm;
