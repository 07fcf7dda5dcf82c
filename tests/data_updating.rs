#![allow(non_snake_case)]

use qpsession::{algebra::*, solver::*};
use std::iter::zip;

#[allow(clippy::type_complexity)]
fn updating_test_data() -> (
    CscMatrix<f64>,
    Vec<f64>,
    CscMatrix<f64>,
    Vec<f64>,
    Vec<f64>,
    QpSettings<f64>,
) {
    // large values so that equilibration is far
    // from identity and carries through updates
    let P = CscMatrix::from(&[
        [40000., 1.], //
        [0., 20000.], //
    ]);
    let q = vec![10000.; 2];

    let A = CscMatrix::identity(2);
    let l = vec![-1.; 2];
    let u = vec![1.; 2];

    let settings = QpSettingsBuilder::default()
        .eps_abs(1e-7)
        .eps_rel(1e-7)
        .polish(true)
        .verbose(false)
        .build()
        .unwrap();

    (P, q, A, l, u, settings)
}

fn solve_new(
    P: &CscMatrix<f64>,
    q: &[f64],
    A: &CscMatrix<f64>,
    l: &[f64],
    u: &[f64],
    settings: &QpSettings<f64>,
) -> SolveResult<f64> {
    let mut session = DefaultSession::new();
    session.setup(P, q, A, l, u, settings.clone()).unwrap();
    session.solve().unwrap()
}

fn assert_same_solution(r1: &SolveResult<f64>, r2: &SolveResult<f64>) {
    assert_eq!(r1.status(), r2.status());
    let (x1, x2) = (r1.x().unwrap(), r2.x().unwrap());
    assert!(x1.norm_inf_diff(x2) <= 1e-5);
    assert!(f64::abs(r1.obj_val() - r2.obj_val()) <= 1e-5 * f64::max(1., r1.obj_val().abs()));
}

#[test]
fn test_update_lin_cost() {
    let (P, q, A, l, u, settings) = updating_test_data();

    let mut session = DefaultSession::new();
    session.setup(&P, &q, &A, &l, &u, settings.clone()).unwrap();
    session.solve().unwrap();

    let q2 = vec![-1000., 0.];
    session.update_lin_cost(&q2).unwrap();
    assert_eq!(session.problem_data().unwrap().q, q2);
    let r1 = session.solve().unwrap();

    let r2 = solve_new(&P, &q2, &A, &l, &u, &settings);
    assert_same_solution(&r1, &r2);
}

#[test]
fn test_update_bounds() {
    let (P, q, A, l, u, settings) = updating_test_data();

    let mut session = DefaultSession::new();
    session.setup(&P, &q, &A, &l, &u, settings.clone()).unwrap();
    session.solve().unwrap();

    // tighten into an equality on the first variable
    let l2 = vec![0.5, -2.];
    let u2 = vec![0.5, 2.];
    session.update_bounds(&l2, &u2).unwrap();
    assert_eq!(session.lower_bound().unwrap(), l2);
    assert_eq!(session.upper_bound().unwrap(), u2);

    let r1 = session.solve().unwrap();
    let r2 = solve_new(&P, &q, &A, &l2, &u2, &settings);
    assert_same_solution(&r1, &r2);
    assert!((r1.x().unwrap()[0] - 0.5).abs() <= 1e-6);
}

#[test]
fn test_update_bounds_round_trip() {
    let (P, q, A, l, u, settings) = updating_test_data();

    let mut session = DefaultSession::new();
    session.setup(&P, &q, &A, &l, &u, settings).unwrap();
    let rho_vec = session.rho_vec().unwrap();

    let inf = f64::INFINITY;
    session.update_bounds(&[-inf, 0.], &[inf, 0.]).unwrap();
    assert_ne!(session.rho_vec().unwrap(), rho_vec);

    // restoring the bounds restores the step sizes
    session.update_bounds(&l, &u).unwrap();
    assert_eq!(session.rho_vec().unwrap(), rho_vec);
    assert_eq!(session.lower_bound().unwrap(), l);
    assert_eq!(session.upper_bound().unwrap(), u);
}

#[test]
fn test_update_single_bounds() {
    let (P, q, A, l, u, settings) = updating_test_data();

    let mut session = DefaultSession::new();
    session.setup(&P, &q, &A, &l, &u, settings).unwrap();

    session.update_lower_bound(&[0., -1.]).unwrap();
    session.update_upper_bound(&[0.5, 0.5]).unwrap();
    assert_eq!(session.lower_bound().unwrap(), vec![0., -1.]);
    assert_eq!(session.upper_bound().unwrap(), vec![0.5, 0.5]);

    // a new lower bound is checked against the current upper one
    assert_eq!(
        session.update_lower_bound(&[0., 0.6]),
        Err(SessionError::LowerExceedsUpper { index: 1 })
    );
    assert_eq!(
        session.update_upper_bound(&[-0.5, 0.5]),
        Err(SessionError::LowerExceedsUpper { index: 0 })
    );
    assert_eq!(session.lower_bound().unwrap(), vec![0., -1.]);
    assert_eq!(session.upper_bound().unwrap(), vec![0.5, 0.5]);
}

#[test]
fn test_update_dimension_checks() {
    let (P, q, A, l, u, settings) = updating_test_data();

    let mut session = DefaultSession::new();
    session.setup(&P, &q, &A, &l, &u, settings).unwrap();

    assert_eq!(
        session.update_lin_cost(&[1.]),
        Err(SessionError::DimensionMismatch {
            what: "q",
            expected: 2,
            found: 1
        })
    );
    assert!(matches!(
        session.update_bounds(&[0.; 3], &[1.; 3]),
        Err(SessionError::DimensionMismatch { what: "l", .. })
    ));
    assert!(matches!(
        session.update_P(&[1., 2.]),
        Err(SessionError::DimensionMismatch { what: "P", .. })
    ));
    assert!(matches!(
        session.update_A(&vec![1.; 3]),
        Err(SessionError::DimensionMismatch { what: "A", .. })
    ));

    // nothing changed
    assert_eq!(session.problem_data().unwrap().q, q);
    assert_eq!(session.problem_data().unwrap().P, P);
}

#[test]
fn test_update_P_matrix_form() {
    let (P, q, A, l, u, settings) = updating_test_data();

    let mut session = DefaultSession::new();
    session.setup(&P, &q, &A, &l, &u, settings.clone()).unwrap();
    session.solve().unwrap();

    let mut P2 = P.clone();
    P2.nzval[0] = 100.;
    session.update_P(&P2).unwrap();
    let r1 = session.solve().unwrap();

    let r2 = solve_new(&P2, &q, &A, &l, &u, &settings);
    assert_same_solution(&r1, &r2);

    // a matrix with a different pattern is rejected
    let P3 = CscMatrix::from(&[[1., 0.], [0., 1.]]);
    assert!(matches!(
        session.update_P(&P3),
        Err(SessionError::DimensionMismatch { what: "P", .. })
    ));
    assert_eq!(session.problem_data().unwrap().P, P2);
}

#[test]
fn test_update_P_partial() {
    let (P, q, A, l, u, settings) = updating_test_data();

    let mut session = DefaultSession::new();
    session.setup(&P, &q, &A, &l, &u, settings.clone()).unwrap();
    session.solve().unwrap();

    // change the off diagonal only
    let Pnz = [2000.];
    session
        .update_P(&PartialUpdate::new(&[1], &Pnz))
        .unwrap();
    let r1 = session.solve().unwrap();

    let mut P2 = P.clone();
    P2.nzval[1] = 2000.;
    assert_eq!(session.problem_data().unwrap().P, P2);

    let r2 = solve_new(&P2, &q, &A, &l, &u, &settings);
    assert_same_solution(&r1, &r2);

    assert_eq!(
        session.update_P(&PartialUpdate::new(&[3], &[1.])),
        Err(SessionError::IndexOutOfRange { index: 3, nnz: 3 })
    );
}

#[test]
fn test_update_A() {
    let (P, q, A, l, u, settings) = updating_test_data();

    let mut session = DefaultSession::new();
    session.setup(&P, &q, &A, &l, &u, settings.clone()).unwrap();
    session.solve().unwrap();

    let Anz = vec![2., 4.];
    session.update_A(&Anz).unwrap();
    let r1 = session.solve().unwrap();

    let mut A2 = A.clone();
    A2.nzval.copy_from_slice(&Anz);
    let r2 = solve_new(&P, &q, &A2, &l, &u, &settings);
    assert_same_solution(&r1, &r2);
}

#[test]
fn test_update_P_and_A() {
    let (P, q, A, l, u, settings) = updating_test_data();

    let mut session = DefaultSession::new();
    session.setup(&P, &q, &A, &l, &u, settings.clone()).unwrap();
    session.solve().unwrap();

    let Pnz = vec![30000., 0., 30000.];
    let Anz = vec![0.5, 3.];
    session.update_P_and_A(&Pnz, &Anz).unwrap();
    let r1 = session.solve().unwrap();

    let mut P2 = P.clone();
    let mut A2 = A.clone();
    for (v, &x) in zip(P2.nzval.iter_mut(), &Pnz) {
        *v = x;
    }
    A2.nzval.copy_from_slice(&Anz);
    let r2 = solve_new(&P2, &q, &A2, &l, &u, &settings);
    assert_same_solution(&r1, &r2);

    // a bad A leaves P untouched as well
    assert!(session.update_P_and_A(&Pnz, &[1.]).is_err());
    assert_eq!(session.problem_data().unwrap().P, P2);
}

#[test]
fn test_update_P_nonconvex() {
    // a single constraint row can't make up for a negative
    // curvature direction of P
    let P: CscMatrix<f64> = CscMatrix::identity(2);
    let q = vec![1., 1.];
    let A = CscMatrix::from(&[[1., 1.]]);
    let (l, u) = (vec![-1.], vec![1.]);
    let settings = QpSettingsBuilder::default().verbose(false).build().unwrap();

    let mut session = DefaultSession::new();
    session.setup(&P, &q, &A, &l, &u, settings).unwrap();

    // accepted, but reported by the next solve
    session.update_P(&[1., -1.]).unwrap();
    let result = session.solve().unwrap();
    assert_eq!(result.status(), QpStatus::NonConvex);
    assert!(result.obj_val().is_nan());
    assert!(result.x().unwrap().iter().all(|x| x.is_nan()));

    session.update_P(&P).unwrap();
    let result = session.solve().unwrap();
    assert_eq!(result.status(), QpStatus::Solved);
}

#[test]
fn test_update_P_nonconvex_masked_by_constraints() {
    // the convexity check sees P + σI + Aᵀdiag(ρ)A.  With A = I
    // and a large P the scaled step sizes dominate a small
    // negative P, which then goes undetected
    let (P, q, A, l, u, settings) = updating_test_data();

    let mut session = DefaultSession::new();
    session.setup(&P, &q, &A, &l, &u, settings).unwrap();

    session.update_P(&[-1., 0., -1.]).unwrap();
    let result = session.solve().unwrap();
    assert_ne!(result.status(), QpStatus::NonConvex);
}
