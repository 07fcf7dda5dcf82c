use super::SettingsError;
use crate::algebra::SparseFormatError;
use crate::qdldl::QDLDLError;
use thiserror::Error;

/// Error type returned by a [`QpEngine`](crate::solver::traits::QpEngine)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("KKT factorization failed")]
    Factorization(#[from] QDLDLError),
    #[error("Cost matrix is not positive semidefinite")]
    NonConvex,
    #[error("Invalid value for {0}")]
    InvalidValue(&'static str),
    #[error("Numerical error in {0}")]
    Numerical(&'static str),
}

/// Error type returned by [`QpSession`](crate::solver::QpSession) operations.
///
/// Input validation errors are always reported before the engine is
/// called, and no failed operation leaves the session partially updated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Session is not initialized")]
    NotInitialized,
    #[error("Session is already initialized")]
    AlreadyInitialized,
    #[error("Dimension mismatch in {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Size mismatch: expected {expected}, found {found}")]
    SizeMismatch { expected: usize, found: usize },
    #[error("Index {index} out of range for {nnz} nonzeros")]
    IndexOutOfRange { index: usize, nnz: usize },
    #[error("Lower bound exceeds upper bound at index {index}")]
    LowerExceedsUpper { index: usize },
    #[error("Bad matrix format")]
    BadMatrixFormat(#[from] SparseFormatError),
    #[error("Problem dimensions must be positive")]
    NonPositiveDimension,
    #[error("Invalid settings")]
    Settings(#[from] SettingsError),
    #[error("Setup failed")]
    SetupFailed(#[source] EngineError),
    #[error("Solve failed")]
    SolveFailed(#[source] EngineError),
    #[error("Rho update failed")]
    RhoUpdateFailed(#[source] EngineError),
    #[error("Data update failed")]
    UpdateFailed(#[source] EngineError),
}
