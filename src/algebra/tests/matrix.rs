#![allow(non_snake_case)]
use crate::algebra::*;

fn test_matrix_4x4_triu() -> CscMatrix<f64> {
    // A =
    //[ 4.0  -3.0   7.0    ⋅ ]
    //[  ⋅    8.0  -1.0    ⋅ ]
    //[  ⋅     ⋅    2.0  -3.0]
    //[  ⋅     ⋅     ⋅    1.0]
    let Ap = vec![0, 1, 3, 6, 8];
    let Ai = vec![0, 0, 1, 0, 1, 2, 2, 3];
    let Ax = vec![4., -3., 8., 7., -1., 2., -3., 1.];
    CscMatrix::new(4, 4, Ap, Ai, Ax)
}

fn test_matrix_3x4() -> CscMatrix<f64> {
    // A =
    //[-1.0  -17.0  6.0  10.0]
    //[ 3.0     ⋅   7.0    ⋅ ]
    //[  ⋅    -4.0   ⋅   -5.0]
    let Ap = vec![0, 2, 4, 6, 8];
    let Ai = vec![0, 1, 0, 2, 0, 1, 0, 2];
    let Ax = vec![-1., 3., -17., -4., 6., 7., 10., -5.];
    CscMatrix::new(3, 4, Ap, Ai, Ax)
}

#[test]
fn test_from_dense_array() {
    let A = CscMatrix::from(&[
        [-1., -17., 6., 10.], //
        [3., 0., 7., 0.],     //
        [0., -4., 0., -5.],   //
    ]);
    assert_eq!(A, test_matrix_3x4());
}

#[test]
fn test_nrows_ncols_nnz_is_square() {
    let A = test_matrix_3x4();
    let B = test_matrix_4x4_triu();
    assert_eq!(A.size(), (3, 4));
    assert_eq!(B.size(), (4, 4));
    assert!(!A.is_square());
    assert!(B.is_square());
    assert_eq!(A.nnz(), 8);
    assert_eq!(B.nnz(), 8);
    assert_eq!(A.t().size(), (4, 3));
}

#[test]
fn test_check_format() {
    assert!(test_matrix_3x4().check_format().is_ok());

    // decreasing column pointer
    let mut A = test_matrix_3x4();
    A.colptr[2] = 1;
    assert_eq!(A.check_format(), Err(SparseFormatError::BadColptr));

    // row index out of range
    let mut A = test_matrix_3x4();
    A.rowval[3] = 3;
    assert_eq!(A.check_format(), Err(SparseFormatError::BadRowval));

    // rows out of order within a column
    let mut A = test_matrix_3x4();
    A.rowval.swap(0, 1);
    assert_eq!(A.check_format(), Err(SparseFormatError::BadRowOrdering));

    // column pointer not agreeing with the value array
    let mut A = test_matrix_3x4();
    A.nzval.pop();
    A.rowval.pop();
    assert_eq!(
        A.check_format(),
        Err(SparseFormatError::IncompatibleDimension)
    );
}

#[test]
fn test_check_triu() {
    assert!(test_matrix_4x4_triu().check_triu().is_ok());
    assert_eq!(
        test_matrix_3x4().check_triu(),
        Err(SparseFormatError::IncompatibleDimension)
    );

    let full = CscMatrix::from(&[[1., 2.], [2., 1.]]);
    assert_eq!(
        full.check_triu(),
        Err(SparseFormatError::NotUpperTriangular)
    );
}

#[test]
fn test_check_equal_sparsity() {
    let A = test_matrix_3x4();
    let mut B = A.clone();
    B.nzval.scale(2.);
    assert!(A.check_equal_sparsity(&B).is_ok());

    B.rowval[0] = 2;
    assert_eq!(
        A.check_equal_sparsity(&B),
        Err(SparseFormatError::SparsityMismatch)
    );
}

#[test]
fn test_col_norms() {
    let A = test_matrix_3x4();
    let mut v = vec![0., -30., 12., 4.]; //big values should NOT be ignored
    A.col_norms_no_reset(&mut v);
    assert_eq!(v, vec![3., 17., 12., 10.]);
}

#[test]
fn test_col_norms_sym() {
    let A = test_matrix_4x4_triu();
    let mut v = vec![0., -30., 20., 4.]; //big values should be ignored
    A.col_norms_sym(&mut v);
    assert_eq!(v, vec![7., 8., 7., 3.]);
}

#[test]
fn test_row_norms() {
    let A = test_matrix_3x4();
    let mut v = vec![0., -30., 12.]; //big values should be ignored
    A.row_norms(&mut v);
    assert_eq!(v, vec![17., 7., 5.]);
}

#[test]
fn test_lrscaling() {
    let l = vec![2., -1., 3.];
    let r = vec![2., -1., 1., 4.];

    let mut A = test_matrix_3x4();
    A.lrscale(&l, &r);
    assert_eq!(A.nzval, vec![-4., -6., 34., 12., 12., -7., 80., -60.]);
}

#[test]
fn test_gemv() {
    let A = test_matrix_3x4();
    let x = vec![1., -2., 3., -4.];
    let mut y = vec![5., -6., 7.];

    A.gemv(&mut y, &x, 2., -3.);
    assert_eq!(y, vec![7., 66., 35.]);

    let mut y = vec![1., -2., 3., -4.];
    let x = vec![5., -6., 7.];

    A.t().gemv(&mut y, &x, 2., -3.);
    assert_eq!(y, vec![-49., -220., -33., 42.]);
}

#[test]
fn test_symv() {
    let A = test_matrix_4x4_triu();
    let x = vec![1., 2., -3., -4.];
    let mut y = vec![0., 1., -1., 2.];

    A.sym().symv(&mut y, &x, -2., 3.);
    assert_eq!(y, vec![46.0, -29.0, -25.0, -4.0]);
}

#[test]
fn test_quad_form() {
    let A = test_matrix_4x4_triu();
    let x = vec![1., 2., -3., -4.];
    let y = vec![0., 1., -1., 2.];

    assert_eq!(A.quad_form(&y, &x), 15.);
}

#[test]
fn test_matrix_select_rows() {
    let A = test_matrix_3x4();
    let rows = vec![true, false, true];
    let Ared = A.select_rows(&rows);

    // Ared =
    //[-1.0  -17.0  6.0  10.0]
    //[  ⋅    -4.0   ⋅   -5.0]
    let B = CscMatrix::from(&[
        [-1., -17., 6., 10.], //
        [0., -4., 0., -5.],   //
    ]);
    assert!(Ared.check_format().is_ok());
    assert_eq!(Ared, B);

    let none = A.select_rows(&[false, false, false]);
    assert_eq!(none.size(), (0, 4));
    assert_eq!(none.nnz(), 0);
}
