#![allow(non_snake_case)]
use super::SessionError;
use crate::algebra::*;

// ---------------
// Data type for a session's problem data
// ---------------

/// Unscaled problem data for a QP of the form
///
/// minimize ½xᵀPx + qᵀx subject to l ≤ Ax ≤ u
///
/// with `P` supplied as its upper triangle.  A session owns one copy
/// of this data, kept in sync with every accepted update.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemData<T> {
    pub P: CscMatrix<T>,
    pub q: Vec<T>,
    pub A: CscMatrix<T>,
    pub l: Vec<T>,
    pub u: Vec<T>,
    /// number of variables
    pub n: usize,
    /// number of constraints
    pub m: usize,
}

impl<T> ProblemData<T>
where
    T: FloatT,
{
    /// Validates and copies the problem data.
    ///
    /// Dimensions are taken from `P` and `A` and checked against the
    /// vectors.  `P` must be upper triangular and both matrices well
    /// formed.  Symmetry of the implied full `P` is not checked since
    /// only its upper triangle is ever read.
    pub fn new(
        P: &CscMatrix<T>,
        q: &[T],
        A: &CscMatrix<T>,
        l: &[T],
        u: &[T],
    ) -> Result<Self, SessionError> {
        let n = P.ncols();
        let m = A.nrows();

        if n == 0 {
            return Err(SessionError::NonPositiveDimension);
        }
        check_length("P rows", n, P.nrows())?;
        check_length("A columns", n, A.ncols())?;
        check_length("q", n, q.len())?;
        check_length("l", m, l.len())?;
        check_length("u", m, u.len())?;

        P.check_format()?;
        A.check_format()?;
        P.check_triu()?;

        check_bounds(l, u)?;

        Ok(Self {
            P: P.clone(),
            q: q.to_vec(),
            A: A.clone(),
            l: l.to_vec(),
            u: u.to_vec(),
            n,
            m,
        })
    }
}

pub(crate) fn check_length(
    what: &'static str,
    expected: usize,
    found: usize,
) -> Result<(), SessionError> {
    if expected != found {
        return Err(SessionError::DimensionMismatch {
            what,
            expected,
            found,
        });
    }
    Ok(())
}

/// Checks that l ≤ u elementwise.  NaN bounds are rejected.
pub(crate) fn check_bounds<T: FloatT>(l: &[T], u: &[T]) -> Result<(), SessionError> {
    match l.iter().zip(u).position(|(l, u)| !(l <= u)) {
        Some(index) => Err(SessionError::LowerExceedsUpper { index }),
        None => Ok(()),
    }
}

// ---------------
// matrix value updates
// ---------------

/// A selective update of matrix values.
///
/// Each `values[k]` overwrites the existing nonzero at flat position
/// `indices[k]` of the matrix's value array.  The two slices must have
/// the same length.  With no indices, `values` replaces the whole
/// value array in structure order.
#[derive(Debug, Clone, Copy)]
pub struct PartialUpdate<'a, T> {
    pub indices: &'a [usize],
    pub values: &'a [T],
}

impl<'a, T> PartialUpdate<'a, T> {
    pub fn new(indices: &'a [usize], values: &'a [T]) -> Self {
        Self { indices, values }
    }
}

/// Trait for updating the values of `P` and `A` from various data types.
///
/// Implementations produce the complete new (unscaled) nonzero value
/// array for the matrix `M` without modifying it, so that an update
/// can be fully validated before anything is applied.  The sparsity
/// pattern never changes.
pub trait MatrixDataUpdate<T: FloatT> {
    fn updated_values(&self, M: &CscMatrix<T>, what: &'static str)
        -> Result<Vec<T>, SessionError>;
}

impl<T> MatrixDataUpdate<T> for [T]
where
    T: FloatT,
{
    fn updated_values(
        &self,
        M: &CscMatrix<T>,
        what: &'static str,
    ) -> Result<Vec<T>, SessionError> {
        check_length(what, M.nnz(), self.len())?;
        Ok(self.to_vec())
    }
}

impl<T: FloatT> MatrixDataUpdate<T> for Vec<T> {
    fn updated_values(
        &self,
        M: &CscMatrix<T>,
        what: &'static str,
    ) -> Result<Vec<T>, SessionError> {
        self.as_slice().updated_values(M, what)
    }
}

impl<T: FloatT, const N: usize> MatrixDataUpdate<T> for [T; N] {
    fn updated_values(
        &self,
        M: &CscMatrix<T>,
        what: &'static str,
    ) -> Result<Vec<T>, SessionError> {
        self.as_slice().updated_values(M, what)
    }
}

impl<T> MatrixDataUpdate<T> for CscMatrix<T>
where
    T: FloatT,
{
    fn updated_values(
        &self,
        M: &CscMatrix<T>,
        what: &'static str,
    ) -> Result<Vec<T>, SessionError> {
        check_length(what, M.nnz(), self.nnz())?;
        self.check_equal_sparsity(M)?;
        Ok(self.nzval.clone())
    }
}

impl<T> MatrixDataUpdate<T> for PartialUpdate<'_, T>
where
    T: FloatT,
{
    fn updated_values(
        &self,
        M: &CscMatrix<T>,
        what: &'static str,
    ) -> Result<Vec<T>, SessionError> {
        if self.indices.is_empty() {
            return self.values.updated_values(M, what);
        }
        check_length(what, self.indices.len(), self.values.len())?;

        let nnz = M.nnz();
        if let Some(&index) = self.indices.iter().find(|&&idx| idx >= nnz) {
            return Err(SessionError::IndexOutOfRange { index, nnz });
        }

        let mut nzval = M.nzval.clone();
        for (&idx, &v) in self.indices.iter().zip(self.values) {
            nzval[idx] = v;
        }
        Ok(nzval)
    }
}

#[cfg(test)]
fn test_data() -> ProblemData<f64> {
    // P = [4. 1.; 1. 2.], A = [1. 1.; 1. 0.; 0. 1.]
    let P = CscMatrix::from(&[[4., 1.], [0., 2.]]);
    let A = CscMatrix::from(&[[1., 1.], [1., 0.], [0., 1.]]);
    let q = [1., 1.];
    let l = [1., 0., 0.];
    let u = [1., 0.7, 0.7];
    ProblemData::new(&P, &q, &A, &l, &u).unwrap()
}

#[test]
fn test_problem_data_validation() {
    let data = test_data();
    assert_eq!((data.n, data.m), (2, 3));

    // lower triangular P
    let Pl = CscMatrix::from(&[[4., 0.], [1., 2.]]);
    assert_eq!(
        ProblemData::new(&Pl, &data.q, &data.A, &data.l, &data.u),
        Err(SessionError::BadMatrixFormat(
            SparseFormatError::NotUpperTriangular
        ))
    );

    // wrong bound length
    assert_eq!(
        ProblemData::new(&data.P, &data.q, &data.A, &data.l[0..2], &data.u),
        Err(SessionError::DimensionMismatch {
            what: "l",
            expected: 3,
            found: 2
        })
    );

    // crossed bounds
    let l = [1., 0.8, 0.];
    assert_eq!(
        ProblemData::new(&data.P, &data.q, &data.A, &l, &data.u),
        Err(SessionError::LowerExceedsUpper { index: 1 })
    );

    // bad column pointers
    let mut A = data.A.clone();
    A.colptr[1] = 5;
    assert!(matches!(
        ProblemData::new(&data.P, &data.q, &A, &data.l, &data.u),
        Err(SessionError::BadMatrixFormat(_))
    ));

    // no variables
    let P0 = CscMatrix::<f64>::zeros((0, 0));
    let A0 = CscMatrix::<f64>::zeros((0, 0));
    assert_eq!(
        ProblemData::new(&P0, &[], &A0, &[], &[]),
        Err(SessionError::NonPositiveDimension)
    );
}

#[test]
fn test_infinite_and_nan_bounds() {
    let inf = f64::INFINITY;
    assert!(check_bounds(&[-inf, 0.], &[inf, 0.]).is_ok());
    assert_eq!(
        check_bounds(&[f64::NAN], &[1.]),
        Err(SessionError::LowerExceedsUpper { index: 0 })
    );
}

#[test]
fn test_matrix_value_updates() {
    let data = test_data();
    let A = &data.A;

    // full replacement
    let v = vec![2., 2., 3., 3.];
    assert_eq!(v.updated_values(A, "A").unwrap(), v);
    assert_eq!(
        [1., 2.].updated_values(A, "A"),
        Err(SessionError::DimensionMismatch {
            what: "A",
            expected: 4,
            found: 2
        })
    );

    // partial replacement
    let upd = PartialUpdate::new(&[3, 0], &[9., 8.]);
    assert_eq!(upd.updated_values(A, "A").unwrap(), vec![8., 1., 1., 9.]);

    let upd = PartialUpdate::new(&[4], &[1.]);
    assert_eq!(
        upd.updated_values(A, "A"),
        Err(SessionError::IndexOutOfRange { index: 4, nnz: 4 })
    );

    let upd = PartialUpdate::new(&[0, 1], &[1.]);
    assert!(matches!(
        upd.updated_values(A, "A"),
        Err(SessionError::DimensionMismatch { .. })
    ));

    // no indices means a full replacement
    let upd = PartialUpdate::new(&[], &[7., 6., 5., 4.]);
    assert_eq!(upd.updated_values(A, "A").unwrap(), vec![7., 6., 5., 4.]);

    let upd = PartialUpdate::new(&[], &[7., 6.]);
    assert_eq!(
        upd.updated_values(A, "A"),
        Err(SessionError::DimensionMismatch {
            what: "A",
            expected: 4,
            found: 2
        })
    );

    // matrix with the same pattern
    let mut A2 = A.clone();
    A2.nzval.fill(5.);
    assert_eq!(A2.updated_values(A, "A").unwrap(), vec![5.; 4]);

    // matrix with a different pattern
    let A3 = CscMatrix::from(&[[1., 1.], [0., 1.], [1., 0.]]);
    assert_eq!(
        A3.updated_values(A, "A"),
        Err(SessionError::BadMatrixFormat(
            SparseFormatError::SparsityMismatch
        ))
    );
}
