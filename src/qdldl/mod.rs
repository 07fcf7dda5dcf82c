//! Sparse $LDL^T$ factorization of symmetric quasidefinite matrices.
//!
//! This is the direct linear system solver used by the default solve
//! engine for both the ADMM step and solution polishing.  Only the
//! upper triangle of the input matrix is supplied.  A fill reducing
//! ordering is computed once with AMD, after which values may be
//! updated and refactored in place without any further allocation.

#![allow(non_snake_case)]

mod qdldl;
pub use qdldl::*;
