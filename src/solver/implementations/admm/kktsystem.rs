#![allow(non_snake_case)]
use super::*;
use crate::algebra::*;
use crate::qdldl::*;
use crate::solver::core::EngineError;
use std::iter::zip;

// ---------------
// constraint classes
// ---------------

/// Step size class of a constraint, determined by its scaled bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// both bounds infinite
    Loose,
    /// finite gap between the bounds
    Inequality,
    /// bounds closer than RHO_TOL
    Equality,
}

impl ConstraintKind {
    pub(crate) fn classify<T: FloatT>(l: T, u: T) -> Self {
        let inf: T = (QP_INFINITY_SCALED).as_T();
        if l < -inf && u > inf {
            ConstraintKind::Loose
        } else if u - l < RHO_TOL.as_T() {
            ConstraintKind::Equality
        } else {
            ConstraintKind::Inequality
        }
    }

    /// step size for a constraint of this class
    pub(crate) fn rho<T: FloatT>(&self, rho: T) -> T {
        match self {
            ConstraintKind::Loose => RHO_MIN.as_T(),
            ConstraintKind::Inequality => rho,
            ConstraintKind::Equality => rho * RHO_EQ_OVER_RHO_INEQ.as_T(),
        }
    }
}

// bounds beyond this magnitude (after scaling) are treated as infinite
pub(crate) const QP_INFINITY_SCALED: f64 = crate::solver::QP_INFINITY * MIN_SCALING;

/// Classify every constraint from its scaled bounds
pub(crate) fn classify_constraints<T: FloatT>(l: &[T], u: &[T]) -> Vec<ConstraintKind> {
    zip(l, u)
        .map(|(&l, &u)| ConstraintKind::classify(l, u))
        .collect()
}

// ---------------
// KKT assembly
// ---------------

// locations of the data blocks within an assembled KKT matrix
#[derive(Debug, Clone)]
pub(crate) struct KKTMaps {
    // position of every nonzero of P
    pub PtoKKT: Vec<usize>,
    // position of every nonzero of A (in the Aᵀ block)
    pub AtoKKT: Vec<usize>,
    // positions of the diagonal of the upper left block
    pub diagP: Vec<usize>,
    // positions of the diagonal of the lower right block
    pub diagA: Vec<usize>,
}

// Assemble the upper triangular pattern of
//
// [P  Aᵀ]
// [A  0 ]
//
// with explicit (zero valued, where missing) entries on
// the full diagonal.  The diagonal values are left for the
// caller to shift.
pub(crate) fn assemble_kkt<T: FloatT>(P: &CscMatrix<T>, A: &CscMatrix<T>) -> (CscMatrix<T>, KKTMaps) {
    let (n, m) = (P.n, A.m);

    let nnz_diagP = P.count_diagonal_entries();
    let nnzKKT = P.nnz() + (n - nnz_diagP) + A.nnz() + m;

    let mut K = CscMatrix::spalloc((n + m, n + m), nnzKKT);
    K.colptr.fill(0);

    // count first, then fill
    K.colcount_block(P, 0, MatrixShape::N);
    K.colcount_missing_diag(P, 0);
    K.colcount_block(A, n, MatrixShape::T);
    K.colcount_diag(n, m);
    K.colcount_to_colptr();

    let mut maps = KKTMaps {
        PtoKKT: vec![0; P.nnz()],
        AtoKKT: vec![0; A.nnz()],
        diagP: vec![0; n],
        diagA: vec![0; m],
    };

    K.fill_block(P, &mut maps.PtoKKT, 0, 0, MatrixShape::N);
    K.fill_missing_diag(P, 0);
    K.fill_block(A, &mut maps.AtoKKT, 0, n, MatrixShape::T);
    K.fill_diag(&mut maps.diagA, n, m);
    K.backshift_colptrs();

    // the diagonal is the last entry of each of the first n columns
    for (col, idx) in maps.diagP.iter_mut().enumerate() {
        *idx = K.colptr[col + 1] - 1;
    }

    (K, maps)
}

// ---------------
// KKT system
// ---------------

/// The quasidefinite ADMM system
///
/// [P + σI     Aᵀ    ]
/// [  A     -diag(1/ρ)]
///
/// held as an LDLᵀ factorization with maps from the problem
/// data into the factored matrix.
#[derive(Debug)]
pub struct KKTSystem<T: FloatT> {
    ldl: QDLDLFactorisation<T>,
    maps: KKTMaps,
    // which nonzeros of P are on its diagonal
    Pdiag_entry: Vec<bool>,
    sigma: T,
    n: usize,
}

impl<T> KKTSystem<T>
where
    T: FloatT,
{
    /// Assemble and factor the system.  Fails with `NonConvex` if the
    /// factorization has fewer than n positive pivots, i.e. if
    /// P + σI + Aᵀdiag(ρ)A is not positive definite.
    pub fn new(P: &CscMatrix<T>, A: &CscMatrix<T>, sigma: T, rho_vec: &[T]) -> Result<Self, EngineError> {
        let n = P.n;
        let (mut K, maps) = assemble_kkt(P, A);

        for &idx in maps.diagP.iter() {
            K.nzval[idx] += sigma;
        }
        for (&idx, &rho) in zip(&maps.diagA, rho_vec) {
            K.nzval[idx] = -T::recip(rho);
        }

        let ldl = QDLDLFactorisation::new(&K, None)?;

        let Pdiag_entry = diagonal_entries(P);

        let kkt = Self {
            ldl,
            maps,
            Pdiag_entry,
            sigma,
            n,
        };

        if !kkt.is_convex() {
            return Err(EngineError::NonConvex);
        }
        Ok(kkt)
    }

    /// true if the factored matrix has exactly n positive pivots.  An
    /// indefinite P can still pass when Aᵀdiag(ρ)A dominates it.
    pub fn is_convex(&self) -> bool {
        self.ldl.positive_inertia() == self.n
    }

    /// Solve in place for a right hand side of length n + m
    pub fn solve(&mut self, rhs: &mut [T]) {
        self.ldl.solve(rhs);
    }

    /// New values for the P block, given the scaled values of P
    pub(crate) fn P_values(&self, Px: &[T]) -> Vec<T> {
        zip(Px, &self.Pdiag_entry)
            .map(|(&v, &isdiag)| if isdiag { v + self.sigma } else { v })
            .collect()
    }

    /// Replace the scaled values of P and refactor
    pub fn update_P(&mut self, Px: &[T]) -> Result<(), EngineError> {
        let values = self.P_values(Px);
        let indices = self.maps.PtoKKT.clone();
        self.update_values(&indices, &values)
    }

    /// Replace the scaled values of A and refactor
    pub fn update_A(&mut self, Ax: &[T]) -> Result<(), EngineError> {
        let indices = self.maps.AtoKKT.clone();
        self.update_values(&indices, Ax)
    }

    /// Replace the scaled values of both P and A with a single refactor
    pub fn update_P_and_A(&mut self, Px: &[T], Ax: &[T]) -> Result<(), EngineError> {
        let mut indices = self.maps.PtoKKT.clone();
        indices.extend_from_slice(&self.maps.AtoKKT);
        let mut values = self.P_values(Px);
        values.extend_from_slice(Ax);
        self.update_values(&indices, &values)
    }

    /// Replace the step sizes and refactor
    pub fn update_rho_vec(&mut self, rho_vec: &[T]) -> Result<(), EngineError> {
        let values: Vec<T> = rho_vec.iter().map(|&rho| -T::recip(rho)).collect();
        let indices = self.maps.diagA.clone();
        self.update_values(&indices, &values)
    }

    // Overwrite entries of the factored matrix and refactor.  If the
    // new values can't be factored, the previous values are restored.
    fn update_values(&mut self, indices: &[usize], values: &[T]) -> Result<(), EngineError> {
        let previous: Vec<T> = indices.iter().map(|&idx| self.ldl.value(idx)).collect();

        self.ldl.update_values(indices, values);
        if let Err(e) = self.ldl.refactor() {
            log::debug!("KKT refactor failed ({}), restoring previous values", e);
            self.ldl.update_values(indices, &previous);
            self.ldl.refactor()?;
            return Err(e.into());
        }
        Ok(())
    }
}

// flags marking the diagonal nonzeros of a square matrix
fn diagonal_entries<T: FloatT>(M: &CscMatrix<T>) -> Vec<bool> {
    let mut flags = vec![false; M.nnz()];
    for col in 0..M.n {
        for k in M.colptr[col]..M.colptr[col + 1] {
            flags[k] = M.rowval[k] == col;
        }
    }
    flags
}

#[cfg(test)]
fn test_matrices() -> (CscMatrix<f64>, CscMatrix<f64>) {
    // P has no entry at (1,1)
    let P = CscMatrix::new(2, 2, vec![0, 1, 2], vec![0, 0], vec![4., 1.]);
    let A = CscMatrix::from(&[[1., 1.], [1., 0.], [0., 1.]]);
    (P, A)
}

#[test]
fn test_constraint_classes() {
    let inf = crate::solver::QP_INFINITY;
    assert_eq!(ConstraintKind::classify(-inf, inf), ConstraintKind::Loose);
    assert_eq!(ConstraintKind::classify(-inf, 1.0), ConstraintKind::Inequality);
    assert_eq!(ConstraintKind::classify(1.0, 1.0), ConstraintKind::Equality);
    assert_eq!(ConstraintKind::classify(0.0, 1.0), ConstraintKind::Inequality);

    assert_eq!(ConstraintKind::Loose.rho(0.1), RHO_MIN);
    assert_eq!(ConstraintKind::Inequality.rho(0.1), 0.1);
    assert_eq!(ConstraintKind::Equality.rho(0.1), 100.0);
}

#[test]
fn test_kkt_assembly() {
    let (P, A) = test_matrices();
    let (K, maps) = assemble_kkt(&P, &A);

    assert!(K.check_format().is_ok());
    assert!(K.is_triu());
    assert_eq!(K.nnz(), 2 + 1 + 4 + 3);
    assert_eq!(maps.diagP.len(), 2);
    assert_eq!(maps.diagA.len(), 3);

    // every diagonal position holds a diagonal entry
    for (col, &idx) in maps.diagP.iter().enumerate() {
        assert_eq!(K.rowval[idx], col);
    }
    for (i, &idx) in maps.diagA.iter().enumerate() {
        assert_eq!(K.rowval[idx], i + 2);
    }
    for (k, &idx) in maps.AtoKKT.iter().enumerate() {
        assert_eq!(K.nzval[idx], A.nzval[k]);
    }
}

#[test]
fn test_kkt_solve_and_update() {
    let P: CscMatrix<f64> = CscMatrix::from(&[[4., 1.], [0., 2.]]);
    let A = CscMatrix::from(&[[1., 1.], [1., 0.], [0., 1.]]);
    let sigma = 1e-6;
    let rho = vec![0.1; 3];
    let mut kkt = KKTSystem::new(&P, &A, sigma, &rho).unwrap();
    assert!(kkt.is_convex());

    // K*[1,1,0,0,0] = [P+σI Aᵀ; A -I/ρ] * e = [4+σ+1, 1+2+σ, 2, 1, 1]
    let rhs = vec![5. + sigma, 3. + sigma, 2., 1., 1.];
    let expected = [1., 1., 0., 0., 0.];
    let mut b = rhs.clone();
    kkt.solve(&mut b);
    for (x, e) in b.iter().zip(expected) {
        assert!((x - e).abs() < 1e-8);
    }

    // P + σI + Aᵀdiag(ρ)A ≈ [-3.8 1.1; 1.1 -1.8] is negative definite
    kkt.update_P(&[-4., 1., -2.]).unwrap();
    assert!(!kkt.is_convex());
    kkt.update_P(&[4., 1., 2.]).unwrap();
    assert!(kkt.is_convex());

    // a zero step size can't be factored and is rolled back
    assert!(kkt.update_rho_vec(&[0.1, 0.0, 0.1]).is_err());
    let mut b = rhs.clone();
    kkt.solve(&mut b);
    for (x, e) in b.iter().zip(expected) {
        assert!((x - e).abs() < 1e-8);
    }
}

#[test]
fn test_kkt_indefinite_P_masked_by_constraints() {
    // P = -1 is offset by ρA² = 10 in the factored matrix
    let P = CscMatrix::from(&[[-1.0]]);
    let A = CscMatrix::from(&[[1.0]]);
    let kkt = KKTSystem::new(&P, &A, 1e-6, &[10.0]).unwrap();
    assert!(kkt.is_convex());
}

#[test]
fn test_kkt_nonconvex_setup() {
    let P = CscMatrix::from(&[[-1.0]]);
    let A = CscMatrix::from(&[[1.0]]);
    assert_eq!(
        KKTSystem::new(&P, &A, 1e-6, &[0.1]).err(),
        Some(EngineError::NonConvex)
    );
}
