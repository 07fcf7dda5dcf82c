//! __qpsession__ is a Rust implementation of an incremental quadratic program
//! solver session.  A session is set up once for a problem of the form
//!
//! $$
//! \begin{array}{rl}
//! \text{minimize} & \frac{1}{2}x^T P x + q^T x\\\\\[2ex\]
//!  \text{subject to} & l \le Ax \le u
//!  \end{array}
//! $$
//!
//! with decision variables $x \in \mathbb{R}^n$, data matrices
//! $P=P^\top \succeq 0$ (supplied in upper triangular form) and
//! $A \in \mathbb{R}^{m \times n}$, and bounds $l, u \in \mathbb{R}^m$.
//! It is then solved repeatedly, with the cost, bounds, matrix values,
//! starting iterates and most settings updated in place between solves.
//!
//! The default solve engine is an operator splitting (ADMM) method with
//! Ruiz equilibration, adaptive step sizes, infeasibility detection and
//! optional solution polishing.
//!
//! ## Solve outcomes
//!
//! Every call to [`solve`](crate::solver::QpSession::solve) that does not
//! fail returns a [`SolveResult`](crate::solver::SolveResult) tagged by
//! outcome class.  Infeasibility is a successful outcome carrying an
//! infeasibility certificate in place of a solution.
//!
//! ```no_run
//! use qpsession::{algebra::*, solver::*};
//!
//! let P = CscMatrix::from(&[[2.0]]);
//! let A = CscMatrix::from(&[[1.0]]);
//!
//! let settings = QpSettingsBuilder::default().verbose(false).build().unwrap();
//! let mut session = DefaultSession::new();
//! session.setup(&P, &[0.0], &A, &[-1.0], &[1.0], settings).unwrap();
//!
//! match session.solve().unwrap() {
//!     SolveResult::Solution { x, .. } => println!("x = {:?}", x),
//!     SolveResult::PrimalInfeasible { certificate, .. } => println!("y cert = {:?}", certificate),
//!     SolveResult::DualInfeasible { certificate, .. } => println!("x cert = {:?}", certificate),
//! }
//! ```
//!
//! # License
//!
//! Licensed under Apache License, Version 2.0.

//Rust hates greek characters
#![allow(confusable_idents)]

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod algebra;
pub mod io;
pub mod qdldl;
pub mod solver;
pub mod timers;

/// Version string of this crate and its default solve engine
pub fn version() -> &'static str {
    VERSION
}
