#![allow(non_snake_case)]

use qpsession::{algebra::*, solver::*};

fn settings_test_session() -> DefaultSession<f64> {
    // minimize x² + y² + x subject to x + y = 1, 0 ≤ x, y ≤ 0.7
    let P = CscMatrix::from(&[[2., 0.], [0., 2.]]);
    let A = CscMatrix::from(&[[1., 1.], [1., 0.], [0., 1.]]);
    let q = [1., 0.];
    let l = [1., 0., 0.];
    let u = [1., 0.7, 0.7];
    let settings = QpSettingsBuilder::default().verbose(false).build().unwrap();

    let mut session = DefaultSession::new();
    session.setup(&P, &q, &A, &l, &u, settings).unwrap();
    session
}

#[test]
fn test_update_rho() {
    let mut session = settings_test_session();
    let rho_vec = session.rho_vec().unwrap();

    session.update_rho(1.0).unwrap();
    assert_eq!(session.settings().unwrap().rho, 1.0);

    // equality rows carry a larger step size
    let new_rho_vec = session.rho_vec().unwrap();
    assert_eq!(new_rho_vec[1], 1.0);
    assert_eq!(new_rho_vec[2], 1.0);
    assert!(new_rho_vec[0] > 1.0);
    assert_ne!(new_rho_vec, rho_vec);

    let result = session.solve().unwrap();
    assert_eq!(result.status(), QpStatus::Solved);
}

#[test]
fn test_update_rho_rejected() {
    let mut session = settings_test_session();
    let rho = session.settings().unwrap().rho;
    let rho_vec = session.rho_vec().unwrap();

    assert!(matches!(
        session.update_rho(-1.),
        Err(SessionError::RhoUpdateFailed(_))
    ));
    assert!(matches!(
        session.update_rho(f64::NAN),
        Err(SessionError::RhoUpdateFailed(_))
    ));
    assert_eq!(session.settings().unwrap().rho, rho);
    assert_eq!(session.rho_vec().unwrap(), rho_vec);
}

#[test]
fn test_set_rho_vec() {
    let mut session = settings_test_session();

    session.set_rho_vec(&[10., 0.5, 0.5]).unwrap();
    assert_eq!(session.rho_vec().unwrap(), vec![10., 0.5, 0.5]);

    assert_eq!(
        session.set_rho_vec(&[1.]),
        Err(SessionError::SizeMismatch {
            expected: 3,
            found: 1
        })
    );
    assert_eq!(session.rho_vec().unwrap(), vec![10., 0.5, 0.5]);

    let result = session.solve().unwrap();
    assert_eq!(result.status(), QpStatus::Solved);
}

#[test]
fn test_update_individual_settings() {
    let mut session = settings_test_session();

    session.update_max_iter(10).unwrap();
    session.update_eps_abs(1e-6).unwrap();
    session.update_eps_rel(1e-6).unwrap();
    session.update_eps_prim_inf(1e-5).unwrap();
    session.update_eps_dual_inf(1e-5).unwrap();
    session.update_alpha(1.2).unwrap();
    session.update_delta(1e-7).unwrap();
    session.update_polish(true).unwrap();
    session.update_polish_refine_iter(5).unwrap();
    session.update_verbose(false).unwrap();
    session.update_scaled_termination(true).unwrap();
    session.update_check_termination(5).unwrap();
    session.update_warm_start(false).unwrap();
    session.update_time_limit(10.).unwrap();

    let settings = session.settings().unwrap();
    assert_eq!(settings.max_iter, 10);
    assert_eq!(settings.eps_abs, 1e-6);
    assert_eq!(settings.eps_rel, 1e-6);
    assert_eq!(settings.eps_prim_inf, 1e-5);
    assert_eq!(settings.eps_dual_inf, 1e-5);
    assert_eq!(settings.alpha, 1.2);
    assert_eq!(settings.delta, 1e-7);
    assert!(settings.polish);
    assert_eq!(settings.polish_refine_iter, 5);
    assert!(!settings.verbose);
    assert!(settings.scaled_termination);
    assert_eq!(settings.check_termination, 5);
    assert!(!settings.warm_start);
    assert_eq!(settings.time_limit, 10.);

    // the iteration limit now applies
    let result = session.solve().unwrap();
    assert!(result.info().iter <= 10);
}

#[test]
fn test_update_settings_rejected() {
    let mut session = settings_test_session();
    let before = session.settings().unwrap().clone();

    assert_eq!(
        session.update_alpha(2.5),
        Err(SessionError::Settings(SettingsError::BadFieldValue("alpha")))
    );
    assert_eq!(
        session.update_max_iter(0),
        Err(SessionError::Settings(SettingsError::BadFieldValue(
            "max_iter"
        )))
    );
    assert_eq!(
        session.update_time_limit(-1.),
        Err(SessionError::Settings(SettingsError::BadFieldValue(
            "time_limit"
        )))
    );

    // setup-only settings
    let mut settings = before.clone();
    settings.sigma = 1e-3;
    assert_eq!(
        session.update_settings(settings),
        Err(SessionError::Settings(SettingsError::ImmutableSetting(
            "sigma"
        )))
    );
    let mut settings = before.clone();
    settings.scaling = 0;
    assert_eq!(
        session.update_settings(settings),
        Err(SessionError::Settings(SettingsError::ImmutableSetting(
            "scaling"
        )))
    );

    assert_eq!(session.settings().unwrap(), &before);
}

#[test]
fn test_update_settings_whole() {
    let mut session = settings_test_session();

    let mut settings = session.settings().unwrap().clone();
    settings.max_iter = 123;
    settings.polish = true;
    session.update_settings(settings.clone()).unwrap();
    assert_eq!(session.settings().unwrap(), &settings);
}

#[test]
fn test_time_limit() {
    let mut session = settings_test_session();
    session.update_eps_abs(1e-14).unwrap();
    session.update_eps_rel(1e-14).unwrap();
    session.update_time_limit(1e-9).unwrap();

    // the limit is checked after every iteration
    let result = session.solve().unwrap();
    assert_eq!(result.status(), QpStatus::TimeLimitReached);
    assert_eq!(result.info().iter, 1);
    assert!(result.x().is_some());

    session.update_time_limit(0.).unwrap();
    session.update_eps_abs(1e-3).unwrap();
    session.update_eps_rel(1e-3).unwrap();
    let result = session.solve().unwrap();
    assert_eq!(result.status(), QpStatus::Solved);
}

#[test]
fn test_check_termination_off() {
    let mut session = settings_test_session();
    session.update_check_termination(0).unwrap();
    session.update_max_iter(200).unwrap();

    // termination is only checked after the last iteration
    let result = session.solve().unwrap();
    assert_eq!(result.info().iter, 200);
    assert!(result.status().is_solved());
}
