#![allow(non_snake_case)]

use qpsession::{algebra::*, solver::*};

#[allow(clippy::type_complexity)]
fn session_test_data() -> (
    CscMatrix<f64>,
    Vec<f64>,
    CscMatrix<f64>,
    Vec<f64>,
    Vec<f64>,
    QpSettings<f64>,
) {
    let P = CscMatrix::identity(2);
    let q = vec![-1., -1.];
    let A = CscMatrix::from(&[[1., 1.]]);
    let l = vec![-1.];
    let u = vec![1.];
    let settings = QpSettingsBuilder::default().verbose(false).build().unwrap();
    (P, q, A, l, u, settings)
}

#[test]
fn test_uninitialized_session() {
    let mut session = DefaultSession::<f64>::new();
    assert_eq!(session.state(), SessionState::Uninitialized);
    assert!(!session.is_initialized());

    assert_eq!(session.solve().err(), Some(SessionError::NotInitialized));
    assert_eq!(
        session.update_lin_cost(&[1., 1.]),
        Err(SessionError::NotInitialized)
    );
    assert_eq!(
        session.update_bounds(&[0.], &[1.]),
        Err(SessionError::NotInitialized)
    );
    assert_eq!(session.update_rho(1.), Err(SessionError::NotInitialized));
    assert_eq!(
        session.update_max_iter(10),
        Err(SessionError::NotInitialized)
    );
    assert_eq!(session.x(), Err(SessionError::NotInitialized));
    assert_eq!(session.rho_vec(), Err(SessionError::NotInitialized));
    assert!(matches!(
        session.settings(),
        Err(SessionError::NotInitialized)
    ));

    // the version is available in any state
    assert_eq!(session.version(), qpsession::version());
}

#[test]
fn test_setup_once() {
    let (P, q, A, l, u, settings) = session_test_data();

    let mut session = DefaultSession::new();
    session.setup(&P, &q, &A, &l, &u, settings.clone()).unwrap();
    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(session.dimensions(), Ok((2, 1)));

    // a second setup is rejected and the first problem survives
    let q2 = vec![5., 5.];
    assert_eq!(
        session.setup(&P, &q2, &A, &l, &u, settings),
        Err(SessionError::AlreadyInitialized)
    );
    assert_eq!(session.problem_data().unwrap().q, q);

    let result = session.solve().unwrap();
    assert_eq!(result.status(), QpStatus::Solved);
    let x = result.x().unwrap();
    assert!(x.norm_inf_diff(&[0.5, 0.5]) <= 1e-2);
}

#[test]
fn test_failed_setup_leaves_session_uninitialized() {
    let (P, q, A, _, _, settings) = session_test_data();

    let mut session = DefaultSession::new();
    assert_eq!(
        session.setup(&P, &q, &A, &[2.], &[1.], settings.clone()),
        Err(SessionError::LowerExceedsUpper { index: 0 })
    );
    assert_eq!(session.state(), SessionState::Uninitialized);

    assert!(matches!(
        session.setup(&P, &q[0..1], &A, &[0.], &[1.], settings.clone()),
        Err(SessionError::DimensionMismatch { what: "q", .. })
    ));

    let bad_settings = QpSettings {
        alpha: 3.0,
        ..settings.clone()
    };
    assert_eq!(
        session.setup(&P, &q, &A, &[0.], &[1.], bad_settings),
        Err(SessionError::Settings(SettingsError::BadFieldValue("alpha")))
    );

    // recoverable after any of the failures above
    session.setup(&P, &q, &A, &[0.], &[1.], settings).unwrap();
    assert!(session.is_initialized());
}

#[test]
fn test_nonconvex_setup() {
    let (_, q, A, l, u, settings) = session_test_data();
    let P = CscMatrix::from(&[[1., 0.], [0., -1.]]);

    let mut session = DefaultSession::new();
    assert_eq!(
        session.setup(&P, &q, &A, &l, &u, settings),
        Err(SessionError::SetupFailed(EngineError::NonConvex))
    );
    assert_eq!(session.state(), SessionState::Uninitialized);
}

#[test]
fn test_lower_triangular_P_rejected() {
    let (_, q, A, l, u, settings) = session_test_data();
    let P = CscMatrix::from(&[[1., 0.], [1., 1.]]);

    let mut session = DefaultSession::new();
    assert!(matches!(
        session.setup(&P, &q, &A, &l, &u, settings),
        Err(SessionError::BadMatrixFormat(_))
    ));
}

#[test]
fn test_repeated_solves() {
    let (P, q, A, l, u, settings) = session_test_data();

    let mut session = DefaultSession::new();
    session.setup(&P, &q, &A, &l, &u, settings).unwrap();

    let first = session.solve().unwrap();
    let second = session.solve().unwrap();
    assert_eq!(first.status(), QpStatus::Solved);
    assert_eq!(second.status(), QpStatus::Solved);

    // warm started from a converged point
    assert!(second.info().iter <= first.info().iter);
    assert!(first.x().unwrap().norm_inf_diff(second.x().unwrap()) <= 1e-2);
}

#[test]
fn test_solve_failure_keeps_session_ready() {
    let P = CscMatrix::from(&[[1.]]);
    let A = CscMatrix::from(&[[1.]]);
    let settings = QpSettingsBuilder::default().verbose(false).build().unwrap();

    let mut session = DefaultSession::new();
    session.setup(&P, &[0.], &A, &[-1.], &[1.], settings).unwrap();

    session.update_lin_cost(&[f64::NAN]).unwrap();
    assert!(matches!(
        session.solve(),
        Err(SessionError::SolveFailed(EngineError::Numerical(_)))
    ));
    assert_eq!(session.state(), SessionState::Ready);

    session.update_lin_cost(&[0.]).unwrap();
    let result = session.solve().unwrap();
    assert_eq!(result.status(), QpStatus::Solved);
    assert!(result.x().unwrap()[0].abs() < 1e-3);
}

// An engine that solves nothing and fails to release itself
mod failing_cleanup {
    use qpsession::solver::traits::QpEngine;
    use qpsession::solver::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub static CLEANUP_CALLS: AtomicUsize = AtomicUsize::new(0);

    pub struct StubEngine {
        info: QpInfo<f64>,
        x: Vec<f64>,
        y: Vec<f64>,
    }

    impl QpEngine<f64> for StubEngine {
        fn setup(data: &ProblemData<f64>, _: &QpSettings<f64>) -> Result<Self, EngineError> {
            Ok(Self {
                info: QpInfo::default(),
                x: vec![0.; data.n],
                y: vec![0.; data.m],
            })
        }
        fn solve(&mut self, _: &mut dyn Write) -> Result<QpStatus, EngineError> {
            Ok(self.info.status)
        }
        fn info(&self) -> &QpInfo<f64> {
            &self.info
        }
        fn primal_solution(&self) -> &[f64] {
            &self.x
        }
        fn dual_solution(&self) -> &[f64] {
            &self.y
        }
        fn primal_certificate(&self) -> &[f64] {
            &self.y
        }
        fn dual_certificate(&self) -> &[f64] {
            &self.x
        }
        fn x(&self) -> Vec<f64> {
            self.x.clone()
        }
        fn y(&self) -> Vec<f64> {
            self.y.clone()
        }
        fn z(&self) -> Vec<f64> {
            self.y.clone()
        }
        fn z_tilde(&self) -> Vec<f64> {
            self.y.clone()
        }
        fn Ax(&self) -> Vec<f64> {
            self.y.clone()
        }
        fn rho_vec(&self) -> Vec<f64> {
            vec![0.1; self.y.len()]
        }
        fn set_rho_vec(&mut self, _: &[f64]) -> Result<(), EngineError> {
            Ok(())
        }
        fn update_rho(&mut self, rho: f64) -> Result<f64, EngineError> {
            Ok(rho)
        }
        fn update_lin_cost(&mut self, _: &[f64]) -> Result<(), EngineError> {
            Ok(())
        }
        fn update_bounds(&mut self, _: &[f64], _: &[f64]) -> Result<(), EngineError> {
            Ok(())
        }
        fn update_P(&mut self, _: &[f64]) -> Result<(), EngineError> {
            Ok(())
        }
        fn update_A(&mut self, _: &[f64]) -> Result<(), EngineError> {
            Ok(())
        }
        fn update_P_and_A(&mut self, _: &[f64], _: &[f64]) -> Result<(), EngineError> {
            Ok(())
        }
        fn warm_start(&mut self, _: Option<&[f64]>, _: Option<&[f64]>) {}
        fn update_settings(&mut self, _: &QpSettings<f64>) -> Result<(), EngineError> {
            Ok(())
        }
        fn cleanup(&mut self) -> Result<(), EngineError> {
            CLEANUP_CALLS.fetch_add(1, Ordering::SeqCst);
            Err(EngineError::InvalidValue("cleanup"))
        }
        fn version() -> String {
            "stub".to_string()
        }
    }

    pub fn calls() -> usize {
        CLEANUP_CALLS.load(Ordering::SeqCst)
    }
}

#[test]
fn test_cleanup_failure_on_drop() {
    use failing_cleanup::{calls, StubEngine};

    let (P, q, A, l, u, settings) = session_test_data();

    // nothing to release before setup
    let session = QpSession::<f64, StubEngine>::new();
    drop(session);
    assert_eq!(calls(), 0);

    let mut session = QpSession::<f64, StubEngine>::new();
    session.setup(&P, &q, &A, &l, &u, settings).unwrap();
    drop(session);
    assert_eq!(calls(), 1);
}
