#![allow(non_snake_case)]

use qpsession::{algebra::*, solver::*};

#[allow(clippy::type_complexity)]
fn basic_qp_data() -> (
    CscMatrix<f64>,
    Vec<f64>,
    CscMatrix<f64>,
    Vec<f64>,
    Vec<f64>,
) {
    // P = [4. 1;1 2]
    let P = CscMatrix::new(
        2,                // m
        2,                // n
        vec![0, 1, 3],    // colptr
        vec![0, 0, 1],    // rowval
        vec![4., 1., 2.], // nzval
    );

    // A = [1. 1;1 0; 0 1]
    let A = CscMatrix::new(
        3,                    // m
        2,                    // n
        vec![0, 2, 4],        // colptr
        vec![0, 1, 0, 2],     // rowval
        vec![1., 1., 1., 1.], // nzval
    );

    let q = vec![1., 1.];
    let l = vec![1., 0., 0.];
    let u = vec![1., 0.7, 0.7];

    (P, q, A, l, u)
}

fn accurate_settings() -> QpSettings<f64> {
    QpSettingsBuilder::default()
        .eps_abs(1e-7)
        .eps_rel(1e-7)
        .polish(true)
        .verbose(false)
        .build()
        .unwrap()
}

#[test]
fn test_qp_univariate() {
    let P = CscMatrix::from(&[[2.]]);
    let A = CscMatrix::from(&[[1.]]);

    let mut session = DefaultSession::new();
    session
        .setup(&P, &[0.], &A, &[-1.], &[1.], accurate_settings())
        .unwrap();
    let result = session.solve().unwrap();

    assert_eq!(result.status(), QpStatus::Solved);
    assert!(result.x().unwrap()[0].abs() <= 1e-6);
    assert!(result.obj_val().abs() <= 1e-6);
}

#[test]
fn test_qp_feasible() {
    let (P, q, A, l, u) = basic_qp_data();

    let mut session = DefaultSession::new();
    session
        .setup(&P, &q, &A, &l, &u, accurate_settings())
        .unwrap();
    let result = session.solve().unwrap();

    assert_eq!(result.status(), QpStatus::Solved);

    let refsol = [0.3, 0.7];
    let x = result.x().unwrap();
    assert!(x.norm_inf_diff(&refsol) <= 1e-5);

    let refobj = 1.88;
    assert!(f64::abs(result.obj_val() - refobj) <= 1e-5);

    let info = result.info();
    assert!(info.iter > 0);
    assert!(info.pri_res <= 1e-5 && info.dua_res <= 1e-5);
}

#[test]
fn test_qp_polish() {
    let (P, q, A, l, u) = basic_qp_data();

    let mut session = DefaultSession::new();
    let settings = QpSettings {
        eps_abs: 1e-3,
        eps_rel: 1e-3,
        ..accurate_settings()
    };
    session.setup(&P, &q, &A, &l, &u, settings).unwrap();
    let result = session.solve().unwrap();

    // polishing recovers the active set exactly
    assert_eq!(result.status(), QpStatus::Solved);
    assert_eq!(result.info().status_polish, PolishStatus::Successful);
    assert!(result.x().unwrap().norm_inf_diff(&[0.3, 0.7]) <= 1e-8);
}

#[test]
fn test_qp_unpolished() {
    let (P, q, A, l, u) = basic_qp_data();

    let mut session = DefaultSession::new();
    let settings = QpSettings {
        polish: false,
        ..accurate_settings()
    };
    session.setup(&P, &q, &A, &l, &u, settings).unwrap();
    let result = session.solve().unwrap();

    assert_eq!(result.status(), QpStatus::Solved);
    assert_eq!(result.info().status_polish, PolishStatus::NotPerformed);

    // dual solution satisfies stationarity Px + q + Aᵀy = 0
    let x = result.x().unwrap();
    let y = result.y().unwrap();
    let mut r = q.clone();
    P.sym().symv(&mut r, x, 1., 1.);
    A.t().gemv(&mut r, y, 1., 1.);
    assert!(r.norm_inf() <= 1e-4);
}

#[test]
fn test_qp_unconstrained_rows() {
    // every constraint is loose, so the solution is the
    // unconstrained minimizer -P⁻¹q
    let P = CscMatrix::from(&[[2., 0.], [0., 4.]]);
    let A = CscMatrix::identity(2);
    let inf = f64::INFINITY;

    let mut session = DefaultSession::new();
    session
        .setup(&P, &[2., -4.], &A, &[-inf, -inf], &[inf, inf], accurate_settings())
        .unwrap();
    let result = session.solve().unwrap();

    assert_eq!(result.status(), QpStatus::Solved);
    assert!(result.x().unwrap().norm_inf_diff(&[-1., 1.]) <= 1e-5);
}

#[test]
fn test_qp_max_iter() {
    let (P, q, A, l, u) = basic_qp_data();

    let mut session = DefaultSession::new();
    let settings = QpSettings {
        max_iter: 2,
        eps_abs: 1e-12,
        eps_rel: 1e-12,
        ..accurate_settings()
    };
    session.setup(&P, &q, &A, &l, &u, settings).unwrap();
    let result = session.solve().unwrap();

    assert_eq!(result.status(), QpStatus::MaxIterReached);
    assert_eq!(result.info().iter, 2);
    assert!(result.x().is_some());
}

#[test]
fn test_qp_f32() {
    let P = CscMatrix::<f32>::from(&[[2.]]);
    let A = CscMatrix::<f32>::from(&[[1.]]);
    let settings = QpSettingsBuilder::<f32>::default()
        .verbose(false)
        .build()
        .unwrap();

    let mut session = DefaultSession::<f32>::new();
    session
        .setup(&P, &[-4.], &A, &[-1.], &[1.], settings)
        .unwrap();
    let result = session.solve().unwrap();

    assert_eq!(result.status(), QpStatus::Solved);
    assert!((result.x().unwrap()[0] - 1.).abs() <= 1e-2);
}
