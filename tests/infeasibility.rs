#![allow(non_snake_case)]

use qpsession::{algebra::*, solver::*};

fn infeasibility_settings() -> QpSettings<f64> {
    QpSettingsBuilder::default()
        .max_iter(10000)
        .verbose(false)
        .build()
        .unwrap()
}

#[allow(clippy::type_complexity)]
fn primal_infeasible_data() -> (
    CscMatrix<f64>,
    Vec<f64>,
    CscMatrix<f64>,
    Vec<f64>,
    Vec<f64>,
) {
    // x ≥ 1 and x ≤ -1
    let inf = f64::INFINITY;
    let P = CscMatrix::from(&[[1.]]);
    let A = CscMatrix::from(&[[1.], [1.]]);
    let q = vec![0.];
    let l = vec![1., -inf];
    let u = vec![inf, -1.];
    (P, q, A, l, u)
}

#[allow(clippy::type_complexity)]
fn dual_infeasible_data() -> (
    CscMatrix<f64>,
    Vec<f64>,
    CscMatrix<f64>,
    Vec<f64>,
    Vec<f64>,
) {
    // P = [1. 1;1 1] is singular and the cost is unbounded along (-1, 1)
    let inf = f64::INFINITY;
    let P = CscMatrix::from(&[[1., 1.], [0., 1.]]);
    let A = CscMatrix::from(&[[1., 1.], [1., 0.]]);
    let q = vec![1., -1.];
    let l = vec![-inf, -inf];
    let u = vec![1., 1.];
    (P, q, A, l, u)
}

#[test]
fn test_primal_infeasible() {
    let (P, q, A, l, u) = primal_infeasible_data();

    let mut session = DefaultSession::new();
    session
        .setup(&P, &q, &A, &l, &u, infeasibility_settings())
        .unwrap();
    let result = session.solve().unwrap();

    assert_eq!(result.status(), QpStatus::PrimalInfeasible);
    assert_eq!(result.obj_val(), f64::INFINITY);
    assert!(result.x().is_none() && result.y().is_none());
    assert!(result.dual_certificate().is_none());

    let cert = result.primal_certificate().unwrap();
    assert_eq!(cert.len(), 2);
    assert!((cert.norm_inf() - 1.).abs() <= 1e-8);

    // Aᵀy ≈ 0 with a negative support value
    assert!((cert[0] + cert[1]).abs() <= 1e-3);
    assert!(cert[0] < 0. && cert[1] > 0.);
}

#[test]
fn test_dual_infeasible() {
    let (P, q, A, l, u) = dual_infeasible_data();

    let mut session = DefaultSession::new();
    session
        .setup(&P, &q, &A, &l, &u, infeasibility_settings())
        .unwrap();
    let result = session.solve().unwrap();

    assert_eq!(result.status(), QpStatus::DualInfeasible);
    assert_eq!(result.obj_val(), f64::NEG_INFINITY);
    assert!(result.x().is_none() && result.primal_certificate().is_none());

    let cert = result.dual_certificate().unwrap();
    assert_eq!(cert.len(), 2);
    assert!((cert.norm_inf() - 1.).abs() <= 1e-8);
    assert!(q.dot(cert) < 0.);
    assert!(cert.norm_inf_diff(&[-1., 1.]) <= 1e-2);
}

#[test]
fn test_recover_from_infeasible() {
    let (P, q, A, l, u) = primal_infeasible_data();

    let mut session = DefaultSession::new();
    session
        .setup(&P, &q, &A, &l, &u, infeasibility_settings())
        .unwrap();
    let result = session.solve().unwrap();
    assert_eq!(result.status(), QpStatus::PrimalInfeasible);

    // iterates are reset after an infeasible solve
    assert!(session.x().unwrap().iter().all(|&x| x == 0.));

    // make the bounds consistent and solve again
    let inf = f64::INFINITY;
    session.update_bounds(&[1., -inf], &[inf, 2.]).unwrap();
    let result = session.solve().unwrap();
    assert_eq!(result.status(), QpStatus::Solved);
    assert!((result.x().unwrap()[0] - 1.).abs() <= 1e-2);
}
