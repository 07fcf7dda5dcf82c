//---------------------------------------------------------
// low-level internal utilities for counting / filling entries
// in block partitioned, upper triangular sparse matrices.
//
// The counting functions accumulate per-column entry counts
// into colptr.  After colcount_to_colptr, colptr[j] marks the
// next free slot in column j and the fill functions advance it.
// backshift_colptrs then restores standard CSC column pointers.
//---------------------------------------------------------

#![allow(non_snake_case)]
use crate::algebra::{CscMatrix, FloatT, MatrixShape};

impl<T> CscMatrix<T>
where
    T: FloatT,
{
    // increment the self.colptr by the number of nonzeros
    // in a square diagonal matrix placed on the diagonal.
    pub(crate) fn colcount_diag(&mut self, initcol: usize, blockcols: usize) {
        let cols = self.colptr[initcol..(initcol + blockcols)].iter_mut();
        cols.for_each(|x| *x += 1);
    }

    // same as colcount_diag, but counts places
    // where the input matrix M has a missing
    // diagonal entry.  M must be square and TRIU
    pub(crate) fn colcount_missing_diag(&mut self, M: &CscMatrix<T>, initcol: usize) {
        assert_eq!(M.colptr.len(), M.n + 1);
        assert!(self.colptr.len() >= M.n + initcol);

        for i in 0..M.n {
            if _is_missing_diag(M, i) {
                self.colptr[i + initcol] += 1;
            }
        }
    }

    // increment the self.colptr by the number of nonzeros in M
    pub(crate) fn colcount_block(&mut self, M: &CscMatrix<T>, initcol: usize, shape: MatrixShape) {
        match shape {
            MatrixShape::T => {
                for row in M.rowval.iter() {
                    self.colptr[initcol + row] += 1;
                }
            }
            MatrixShape::N => {
                for i in 0..M.n {
                    self.colptr[initcol + i] += M.colptr[i + 1] - M.colptr[i];
                }
            }
        }
    }

    // populate values from M using the self.colptr as indicator of
    // next fill location in each column.  MtoKKT records where each
    // entry of M landed.
    pub(crate) fn fill_block(
        &mut self,
        M: &CscMatrix<T>,
        MtoKKT: &mut [usize],
        initrow: usize,
        initcol: usize,
        shape: MatrixShape,
    ) {
        assert_eq!(MtoKKT.len(), M.nnz());

        for i in 0..M.n {
            for j in M.colptr[i]..M.colptr[i + 1] {
                let (Mrow, Mval) = (M.rowval[j], M.nzval[j]);
                let (row, col) = match shape {
                    MatrixShape::T => (i + initrow, Mrow + initcol),
                    MatrixShape::N => (Mrow + initrow, i + initcol),
                };

                let dest = self.colptr[col];
                self.rowval[dest] = row;
                self.nzval[dest] = Mval;
                self.colptr[col] += 1;
                MtoKKT[j] = dest;
            }
        }
    }

    // Populate the diagonal with 0s using the self.colptr as indicator of
    // next fill location in each column
    pub(crate) fn fill_diag(&mut self, diagtoKKT: &mut [usize], offset: usize, blockdim: usize) {
        for (i, col) in (offset..(offset + blockdim)).enumerate() {
            let dest = self.colptr[col];
            self.rowval[dest] = col;
            self.nzval[dest] = T::zero(); //structural zero
            self.colptr[col] += 1;
            diagtoKKT[i] = dest;
        }
    }

    // same as fill_diag, but only places zero
    // entries where the input matrix M has a missing
    // diagonal entry.  M must be square and TRIU
    pub(crate) fn fill_missing_diag(&mut self, M: &CscMatrix<T>, initcol: usize) {
        for i in 0..M.n {
            if _is_missing_diag(M, i) {
                let col = i + initcol;
                let dest = self.colptr[col];
                self.rowval[dest] = col;
                self.nzval[dest] = T::zero(); //structural zero
                self.colptr[col] += 1;
            }
        }
    }

    pub(crate) fn colcount_to_colptr(&mut self) {
        let mut currentptr = 0;
        for p in &mut self.colptr {
            let count = *p;
            *p = currentptr;
            currentptr += count;
        }
    }

    pub(crate) fn backshift_colptrs(&mut self) {
        self.colptr.rotate_right(1);
        self.colptr[0] = 0;
    }

    pub(crate) fn count_diagonal_entries(&self) -> usize {
        (0..self.n.min(self.m))
            .filter(|&i| !_is_missing_diag(self, i))
            .count()
    }
}

// true if column i of the triu matrix M has no diagonal entry.
// For triu data the diagonal is always the last entry of a column.
fn _is_missing_diag<T>(M: &CscMatrix<T>, i: usize) -> bool {
    let (first, last) = (M.colptr[i], M.colptr[i + 1]);
    first == last || M.rowval[last - 1] != i
}

#[test]
fn test_fill_kkt_pattern() {
    // [P  A'] with P = [1 2; 0 0] (missing P[1,1]) and A = [3 4]
    let P = CscMatrix::new(2, 2, vec![0, 1, 2], vec![0, 0], vec![1., 2.]);
    let A = CscMatrix::new(1, 2, vec![0, 1, 2], vec![0, 0], vec![3., 4.]);
    assert_eq!(P.count_diagonal_entries(), 1);

    let nnz = P.nnz() + 1 + A.nnz() + 1;
    let mut K = CscMatrix::<f64>::spalloc((3, 3), nnz);
    K.colptr.fill(0);
    K.colcount_block(&P, 0, MatrixShape::N);
    K.colcount_missing_diag(&P, 0);
    K.colcount_block(&A, 2, MatrixShape::T);
    K.colcount_diag(2, 1);
    K.colcount_to_colptr();

    let mut PtoKKT = vec![0; P.nnz()];
    let mut AtoKKT = vec![0; A.nnz()];
    let mut diag = vec![0; 1];
    K.fill_block(&P, &mut PtoKKT, 0, 0, MatrixShape::N);
    K.fill_missing_diag(&P, 0);
    K.fill_block(&A, &mut AtoKKT, 0, 2, MatrixShape::T);
    K.fill_diag(&mut diag, 2, 1);
    K.backshift_colptrs();

    assert!(K.check_format().is_ok());
    assert!(K.is_triu());
    assert_eq!(K.colptr, vec![0, 1, 3, 6]);
    assert_eq!(K.rowval, vec![0, 0, 1, 0, 1, 2]);
    assert_eq!(K.nzval, vec![1., 2., 0., 3., 4., 0.]);
    assert_eq!(PtoKKT, vec![0, 1]);
    assert_eq!(AtoKKT, vec![3, 4]);
    assert_eq!(diag, vec![5]);
    assert_eq!(K.nnz(), nnz);
}
