//! Sparse and dense linear algebra used by the session and the solve engine.
//!
//! All internal math goes through the [`VectorMath`], [`MatrixMath`] and
//! [`ScalarMath`] traits, implemented generically over [`FloatT`].

mod csc;
mod error_types;
mod floats;
mod math_traits;
mod matrix_types;
mod scalarmath;
mod vecmath;

pub use csc::*;
pub use error_types::*;
pub use floats::*;
pub use math_traits::*;
pub use matrix_types::*;

#[cfg(test)]
mod tests;
