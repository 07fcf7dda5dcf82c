#![allow(non_snake_case)]
use crate::algebra::*;
use core::cmp::{max, min};
use derive_builder::Builder;
use std::iter::zip;
use thiserror::Error;

/// Error codes returnable from [`QDLDLFactorisation`](QDLDLFactorisation) factor operations

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QDLDLError {
    #[error("Matrix dimension fields are incompatible")]
    IncompatibleDimension,
    #[error("Matrix has a zero column")]
    EmptyColumn,
    #[error("Matrix is not upper triangular")]
    NotUpperTriangular,
    #[error("Matrix factorization produced a zero pivot")]
    ZeroPivot,
    #[error("Matrix factorization produced a non-finite pivot")]
    NonFinitePivot,
    #[error("Invalid permutation vector")]
    InvalidPermutation,
    #[error("Fill reducing ordering failed")]
    OrderingFailed,
}

/// Optional settings for [`QDLDLFactorisation`](QDLDLFactorisation)

#[derive(Builder, Debug, Clone)]
pub struct QDLDLSettings {
    /// scaling applied to the AMD dense row threshold
    #[builder(default = "1.5")]
    amd_dense_scale: f64,
    /// user supplied ordering.  AMD is used when not given
    #[builder(default = "None", setter(strip_option))]
    perm: Option<Vec<usize>>,
}

impl Default for QDLDLSettings {
    fn default() -> QDLDLSettings {
        QDLDLSettings {
            amd_dense_scale: 1.5,
            perm: None,
        }
    }
}

/// Performs $LDL^T$ factorization of a symmetric quasidefinite matrix

#[derive(Debug)]
pub struct QDLDLFactorisation<T = f64> {
    // permutation vector
    pub perm: Vec<usize>,
    // lower triangular factor
    pub L: CscMatrix<T>,
    // D and is inverse for A = LDL^T
    pub D: Vec<T>,
    pub Dinv: Vec<T>,
    // workspace data
    workspace: QDLDLWorkspace<T>,
}

impl<T> QDLDLFactorisation<T>
where
    T: FloatT,
{
    /// Factor the upper triangular matrix `Ain`.  Every column of `Ain`
    /// must hold at least its diagonal entry.
    pub fn new(
        Ain: &CscMatrix<T>,
        opts: Option<QDLDLSettings>,
    ) -> Result<QDLDLFactorisation<T>, QDLDLError> {
        check_structure(Ain)?;
        _qdldl_new(Ain, opts.unwrap_or_default())
    }

    /// dimension of the factored matrix
    pub fn dim(&self) -> usize {
        self.D.len()
    }

    /// number of positive entries in D, i.e. the number of
    /// positive eigenvalues of the factored matrix
    pub fn positive_inertia(&self) -> usize {
        self.workspace.positive_inertia
    }

    /// Solves Ax = b using LDL factors for A.
    /// Solves in place (x replaces b)
    pub fn solve(&mut self, b: &mut [T]) {
        assert_eq!(b.len(), self.dim());

        let tmp = &mut self.workspace.fwork;
        _permute(tmp, b, &self.perm);

        _solve(
            &self.L.colptr,
            &self.L.rowval,
            &self.L.nzval,
            &self.Dinv,
            tmp,
        );

        _ipermute(b, tmp, &self.perm);
    }

    /// Overwrite entries of the factorization target.  Indices refer
    /// to positions in the nonzero array of the matrix originally
    /// passed to [`new`](QDLDLFactorisation::new).  The factors are
    /// not updated until [`refactor`](QDLDLFactorisation::refactor).
    pub fn update_values(&mut self, indices: &[usize], values: &[T]) {
        assert_eq!(indices.len(), values.len());
        let nzval = &mut self.workspace.triuA.nzval;
        let AtoPAPt = &self.workspace.AtoPAPt;

        for (&idx, &v) in zip(indices, values) {
            nzval[AtoPAPt[idx]] = v;
        }
    }

    /// Read back an entry of the factorization target, indexed as
    /// in [`update_values`](QDLDLFactorisation::update_values)
    pub fn value(&self, index: usize) -> T {
        self.workspace.triuA.nzval[self.workspace.AtoPAPt[index]]
    }

    /// Recompute the numeric factors using the current values.
    ///
    /// On failure the factors are left in an unusable state and
    /// must be refactored with corrected values before solving.
    pub fn refactor(&mut self) -> Result<(), QDLDLError> {
        _factor(&mut self.L, &mut self.D, &mut self.Dinv, &mut self.workspace)
    }
}

fn check_structure<T: FloatT>(A: &CscMatrix<T>) -> Result<(), QDLDLError> {
    if !A.is_square() || A.colptr.len() != A.n + 1 {
        return Err(QDLDLError::IncompatibleDimension);
    }

    if !A.is_triu() {
        return Err(QDLDLError::NotUpperTriangular);
    }

    //Error if A doesn't have at least one entry in every column
    if !A.colptr.windows(2).all(|c| c[0] < c[1]) {
        return Err(QDLDLError::EmptyColumn);
    }

    Ok(())
}

fn _qdldl_new<T: FloatT>(
    Ain: &CscMatrix<T>,
    opts: QDLDLSettings,
) -> Result<QDLDLFactorisation<T>, QDLDLError> {
    let n = Ain.nrows();

    //Use AMD ordering if a user-provided ordering
    //is not supplied.   For no ordering at all, the
    //user would need to pass (0..n).collect() explicitly
    let (perm, iperm) = match opts.perm {
        Some(perm) => {
            if perm.len() != n {
                return Err(QDLDLError::InvalidPermutation);
            }
            let iperm = _invperm(&perm)?;
            (perm, iperm)
        }
        None => _get_amd_ordering(Ain, opts.amd_dense_scale)?,
    };

    //permute to (another) upper triangular matrix and store the
    //index mapping the input's entries to the permutation's entries
    let (A, AtoPAPt) = _permute_symmetric(Ain, &iperm);

    let mut workspace = QDLDLWorkspace::<T>::new(A, AtoPAPt);

    //total nonzeros in factorization
    let sumLnz = workspace.Lnz.iter().sum();

    let mut L = CscMatrix::spalloc((n, n), sumLnz);
    let mut D = vec![T::zero(); n];
    let mut Dinv = vec![T::zero(); n];

    _factor(&mut L, &mut D, &mut Dinv, &mut workspace)?;

    Ok(QDLDLFactorisation {
        perm,
        L,
        D,
        Dinv,
        workspace,
    })
}

#[derive(Debug)]
struct QDLDLWorkspace<T> {
    // internal workspace data
    etree: Vec<usize>,
    Lnz: Vec<usize>,
    iwork: Vec<usize>,
    bwork: Vec<bool>,
    fwork: Vec<T>,

    // number of positive values in D
    positive_inertia: usize,

    // the post ordering PAPt of the original data
    triuA: CscMatrix<T>,

    // mapping from entries of the original input
    // to entries of triuA
    AtoPAPt: Vec<usize>,
}

impl<T> QDLDLWorkspace<T>
where
    T: FloatT,
{
    fn new(triuA: CscMatrix<T>, AtoPAPt: Vec<usize>) -> Self {
        let n = triuA.ncols();
        let mut etree = vec![0; n];
        let mut Lnz = vec![0; n];
        let mut iwork = vec![0; n * 3];

        _etree(
            triuA.nrows(),
            &triuA.colptr,
            &triuA.rowval,
            &mut iwork,
            &mut Lnz,
            &mut etree,
        );

        Self {
            etree,
            Lnz,
            iwork,
            bwork: vec![false; n],
            fwork: vec![T::zero(); n],
            positive_inertia: 0,
            triuA,
            AtoPAPt,
        }
    }
}

fn _factor<T: FloatT>(
    L: &mut CscMatrix<T>,
    D: &mut [T],
    Dinv: &mut [T],
    workspace: &mut QDLDLWorkspace<T>,
) -> Result<(), QDLDLError> {
    let A = &workspace.triuA;

    let pos_d_count = _factor_inner(
        A.n,
        &A.colptr,
        &A.rowval,
        &A.nzval,
        &mut L.colptr,
        &mut L.rowval,
        &mut L.nzval,
        D,
        Dinv,
        &workspace.Lnz,
        &workspace.etree,
        &mut workspace.bwork,
        &mut workspace.iwork,
        &mut workspace.fwork,
    )?;

    workspace.positive_inertia = pos_d_count;

    Ok(())
}

const QDLDL_UNKNOWN: usize = usize::MAX;
const QDLDL_USED: bool = true;
const QDLDL_UNUSED: bool = false;

// Compute the elimination tree for a quasidefinite matrix
// in compressed sparse column form.

fn _etree(
    n: usize,
    Ap: &[usize],
    Ai: &[usize],
    work: &mut [usize],
    Lnz: &mut [usize],
    etree: &mut [usize],
) {
    work.fill(0);
    Lnz.fill(0);
    etree.fill(QDLDL_UNKNOWN);

    for j in 0..n {
        work[j] = j;
        for istart in Ai.iter().take(Ap[j + 1]).skip(Ap[j]) {
            let mut i = *istart;

            while work[i] != j {
                if etree[i] == QDLDL_UNKNOWN {
                    etree[i] = j;
                }
                Lnz[i] += 1; // nonzeros in this column
                work[i] = j;
                i = etree[i];
            }
        }
    }
}

// checks a pivot and returns its inverse
fn _pivot_inverse<T: FloatT>(d: T) -> Result<T, QDLDLError> {
    if !d.is_finite() {
        return Err(QDLDLError::NonFinitePivot);
    }
    if d == T::zero() {
        return Err(QDLDLError::ZeroPivot);
    }
    Ok(T::recip(d))
}

#[allow(clippy::too_many_arguments)]
fn _factor_inner<T: FloatT>(
    n: usize,
    Ap: &[usize],
    Ai: &[usize],
    Ax: &[T],
    Lp: &mut [usize],
    Li: &mut [usize],
    Lx: &mut [T],
    D: &mut [T],
    Dinv: &mut [T],
    Lnz: &[usize],
    etree: &[usize],
    bwork: &mut [bool],
    iwork: &mut [usize],
    fwork: &mut [T],
) -> Result<usize, QDLDLError> {
    let mut positiveValuesInD = 0;

    // partition working memory into pieces
    let y_markers = bwork;
    let (y_idx, iwork) = iwork.split_at_mut(n);
    let (elim_buffer, next_colspace) = iwork.split_at_mut(n);
    let y_vals = fwork;

    //set Lp to cumsum(Lnz), starting from zero
    Lp[0] = 0;
    let mut acc = 0;
    for (Lp, Lnz) in zip(&mut Lp[1..], Lnz) {
        *Lp = acc + Lnz;
        acc = *Lp;
    }

    y_markers.fill(QDLDL_UNUSED);
    y_vals.fill(T::zero());
    D.fill(T::zero());
    next_colspace.copy_from_slice(&Lp[0..Lp.len() - 1]);

    // First element of the diagonal D.  The input has a
    // nonempty first column, so Ax[0] is the (0,0) entry
    D[0] = Ax[0];
    Dinv[0] = _pivot_inverse(D[0])?;
    if D[0] > T::zero() {
        positiveValuesInD += 1;
    }

    // Start from second row (k=1) here. The upper LH corner is trivially 0
    // in L b/c we are only computing the subdiagonal elements
    for k in 1..n {
        // For each k, we compute a solution to
        // y = L(0:(k-1),0:k-1))\b, where b is the kth
        // column of A that sits above the diagonal.
        // The solution y is then the kth row of L,
        // with an implied '1' at the diagonal entry.

        let mut nnz_y = 0;

        // find where the nonzeros of the kth row of L will go
        for i in Ap[k]..Ap[k + 1] {
            let bidx = Ai[i];

            // the diagonal entry initializes D[k] and
            // takes no part in the elimination
            if bidx == k {
                D[k] = Ax[i];
                continue;
            }

            y_vals[bidx] = Ax[i];

            if y_markers[bidx] == QDLDL_UNUSED {
                y_markers[bidx] = QDLDL_USED;
                elim_buffer[0] = bidx;
                let mut nnz_e = 1;

                // walk up the elimination tree until we hit
                // something already visited
                let mut next_idx = etree[bidx];

                while next_idx != QDLDL_UNKNOWN && next_idx < k {
                    if y_markers[next_idx] == QDLDL_USED {
                        break;
                    }

                    y_markers[next_idx] = QDLDL_USED;
                    elim_buffer[nnz_e] = next_idx;
                    next_idx = etree[next_idx];
                    nnz_e += 1;
                }

                // append the elimination path in reverse order
                while nnz_e != 0 {
                    nnz_e -= 1;
                    y_idx[nnz_y] = elim_buffer[nnz_e];
                    nnz_y += 1;
                }
            }
        }

        // place the values in the kth row
        for i in (0..nnz_y).rev() {
            let cidx = y_idx[i];
            let tmp_idx = next_colspace[cidx];
            let y_vals_cidx = y_vals[cidx];

            let (f, l) = (Lp[cidx], tmp_idx);
            for (&Lij, &Lxj) in zip(&Li[f..l], &Lx[f..l]) {
                y_vals[Lij] -= Lxj * y_vals_cidx;
            }

            Lx[tmp_idx] = y_vals_cidx * Dinv[cidx];
            D[k] -= y_vals_cidx * Lx[tmp_idx];

            Li[tmp_idx] = k;
            next_colspace[cidx] += 1;

            y_vals[cidx] = T::zero();
            y_markers[cidx] = QDLDL_UNUSED;
        }

        Dinv[k] = _pivot_inverse(D[k])?;
        if D[k] > T::zero() {
            positiveValuesInD += 1;
        }
    }

    Ok(positiveValuesInD)
}

// Solves (L+I)x = b, with x replacing b
fn _lsolve<T: FloatT>(Lp: &[usize], Li: &[usize], Lx: &[T], x: &mut [T]) {
    for i in 0..x.len() {
        let xi = x[i];
        let (f, l) = (Lp[i], Lp[i + 1]);
        for (&Lij, &Lxj) in zip(&Li[f..l], &Lx[f..l]) {
            x[Lij] -= Lxj * xi;
        }
    }
}

// Solves (L+I)'x = b, with x replacing b
fn _ltsolve<T: FloatT>(Lp: &[usize], Li: &[usize], Lx: &[T], x: &mut [T]) {
    for i in (0..x.len()).rev() {
        let (f, l) = (Lp[i], Lp[i + 1]);
        let s = zip(&Li[f..l], &Lx[f..l]).fold(T::zero(), |s, (&Lij, &Lxj)| s + Lxj * x[Lij]);
        x[i] -= s;
    }
}

// Solves Ax = b where A has given LDL factors, with x replacing b
fn _solve<T: FloatT>(Lp: &[usize], Li: &[usize], Lx: &[T], Dinv: &[T], b: &mut [T]) {
    _lsolve(Lp, Li, Lx, b);
    b.hadamard(Dinv);
    _ltsolve(Lp, Li, Lx, b);
}

// Construct an inverse permutation from a permutation
fn _invperm(p: &[usize]) -> Result<Vec<usize>, QDLDLError> {
    let mut b = vec![0; p.len()];
    let mut seen = vec![false; p.len()];

    for (i, &j) in p.iter().enumerate() {
        if j >= p.len() || seen[j] {
            return Err(QDLDLError::InvalidPermutation);
        }
        seen[j] = true;
        b[j] = i;
    }
    Ok(b)
}

// permutation and inverse permutation with no allocations

fn _permute<T: Copy>(x: &mut [T], b: &[T], p: &[usize]) {
    zip(p, x).for_each(|(p, x)| *x = b[*p]);
}

fn _ipermute<T: Copy>(x: &mut [T], b: &[T], p: &[usize]) {
    zip(p, b).for_each(|(p, b)| x[*p] = *b);
}

// Given a sparse symmetric matrix `A` (upper triangular entries only), return
// the permuted upper triangular matrix `P` given the inverse permutation
// `iperm`, along with the map from entries of A to entries of P.
fn _permute_symmetric<T: FloatT>(A: &CscMatrix<T>, iperm: &[usize]) -> (CscMatrix<T>, Vec<usize>) {
    let n = A.ncols();
    let mut P = CscMatrix::<T>::spalloc((n, n), A.nnz());
    let mut AtoPAPt = vec![0; A.nnz()];

    _permute_symmetric_inner(A, &mut AtoPAPt, iperm, &mut P);
    (P, AtoPAPt)
}

// Timothy Davis - Direct Methods for Sparse Linear Systems.  The
// result has unordered row indices within columns.
fn _permute_symmetric_inner<T: FloatT>(
    A: &CscMatrix<T>,
    AtoPAPt: &mut [usize],
    iperm: &[usize],
    P: &mut CscMatrix<T>,
) {
    let n = A.nrows();
    let (Ar, Ac, Av) = (&A.rowval, &A.colptr, &A.nzval);

    // count the entries that land in each column of P
    let mut row_starts = vec![0; n];
    for colA in 0..n {
        let colP = iperm[colA];
        for &rowA in &Ar[Ac[colA]..Ac[colA + 1]] {
            let rowP = iperm[rowA];
            row_starts[max(rowP, colP)] += 1;
        }
    }

    // column pointers from the counts
    P.colptr[0] = 0;
    let mut acc = 0;
    for (Pckp1, count) in zip(&mut P.colptr[1..], &row_starts) {
        *Pckp1 = acc + count;
        acc = *Pckp1;
    }
    row_starts.copy_from_slice(&P.colptr[0..n]);

    // place each entry at the next free slot of its column
    for colA in 0..n {
        let colP = iperm[colA];
        for idxA in Ac[colA]..Ac[colA + 1] {
            let rowP = iperm[Ar[idxA]];
            let col_idx = max(colP, rowP);
            let dest = row_starts[col_idx];

            P.rowval[dest] = min(colP, rowP);
            P.nzval[dest] = Av[idxA];
            AtoPAPt[idxA] = dest;
            row_starts[col_idx] += 1;
        }
    }
}

fn _get_amd_ordering<T: FloatT>(
    A: &CscMatrix<T>,
    amd_dense_scale: f64,
) -> Result<(Vec<usize>, Vec<usize>), QDLDLError> {
    // a dense threshold above the AMD default tends to work
    // better for the KKT systems of QPs
    let mut control = amd::Control::default();
    control.dense *= amd_dense_scale;
    let (perm, iperm, _info) = amd::order(A.nrows(), &A.colptr, &A.rowval, &control)
        .map_err(|_| QDLDLError::OrderingFailed)?;
    Ok((perm, iperm))
}

//configure tests of internals
#[path = "test.rs"]
#[cfg(test)]
mod test;
