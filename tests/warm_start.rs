#![allow(non_snake_case)]

use qpsession::{algebra::*, solver::*};

#[allow(clippy::type_complexity)]
fn warm_start_data() -> (
    CscMatrix<f64>,
    Vec<f64>,
    CscMatrix<f64>,
    Vec<f64>,
    Vec<f64>,
) {
    // P = [4. 1;1 2]
    let P = CscMatrix::from(&[[4., 1.], [0., 2.]]);
    let A = CscMatrix::from(&[[1., 1.], [1., 0.], [0., 1.]]);
    let q = vec![1., 1.];
    let l = vec![1., 0., 0.];
    let u = vec![1., 0.7, 0.7];
    (P, q, A, l, u)
}

fn warm_start_session(warm_start: bool) -> DefaultSession<f64> {
    let (P, q, A, l, u) = warm_start_data();
    let settings = QpSettingsBuilder::default()
        .eps_abs(1e-6)
        .eps_rel(1e-6)
        .warm_start(warm_start)
        .check_termination(1)
        .verbose(false)
        .build()
        .unwrap();

    let mut session = DefaultSession::new();
    session.setup(&P, &q, &A, &l, &u, settings).unwrap();
    session
}

#[test]
fn test_warm_start_from_solution() {
    let mut session = warm_start_session(false);
    let cold = session.solve().unwrap();
    assert_eq!(cold.status(), QpStatus::Solved);
    let (x, y) = (cold.x().unwrap().to_vec(), cold.y().unwrap().to_vec());

    let mut session = warm_start_session(false);
    session.warm_start(&x, &y).unwrap();
    assert!(session.settings().unwrap().warm_start);
    assert!(session.x().unwrap().norm_inf_diff(&x) <= 1e-12);
    assert!(session.y().unwrap().norm_inf_diff(&y) <= 1e-12);

    let warm = session.solve().unwrap();
    assert_eq!(warm.status(), QpStatus::Solved);
    assert!(warm.info().iter < cold.info().iter);
}

#[test]
fn test_warm_start_x_sets_z() {
    let mut session = warm_start_session(true);
    session.warm_start_x(&[0.2, 0.4]).unwrap();

    let z = session.z().unwrap();
    assert!(z.norm_inf_diff(&[0.6, 0.2, 0.4]) <= 1e-12);
    assert!(session.Ax().unwrap().norm_inf_diff(&z) <= 1e-12);

    session.warm_start_y(&[-1., 0., 0.]).unwrap();
    assert!(session.y().unwrap().norm_inf_diff(&[-1., 0., 0.]) <= 1e-12);
    assert!(session.x().unwrap().norm_inf_diff(&[0.2, 0.4]) <= 1e-12);
}

#[test]
fn test_warm_start_dimension_checks() {
    let mut session = warm_start_session(true);
    assert!(matches!(
        session.warm_start(&[0.], &[0.; 3]),
        Err(SessionError::DimensionMismatch { what: "x", .. })
    ));
    assert!(matches!(
        session.warm_start_y(&[0.; 2]),
        Err(SessionError::DimensionMismatch { what: "y", .. })
    ));
}
