#![cfg(feature = "serde")]

use qpsession::solver::*;

#[test]
fn test_settings_json_round_trip() {
    let settings = QpSettingsBuilder::<f64>::default()
        .max_iter(77)
        .eps_abs(1e-5)
        .polish(true)
        .time_limit(2.5)
        .build()
        .unwrap();

    let json = settings.to_json().unwrap();
    let settings2 = QpSettings::<f64>::from_json(&json).unwrap();
    assert_eq!(settings, settings2);
}

#[test]
fn test_settings_json_partial() {
    // missing fields take their defaults
    let json = r#"{"max_iter": 10, "verbose": false}"#;
    let settings = QpSettings::<f64>::from_json(json).unwrap();
    assert_eq!(settings.max_iter, 10);
    assert!(!settings.verbose);
    assert_eq!(settings.rho, QpSettings::<f64>::default().rho);
}

#[test]
fn test_info_json() {
    use qpsession::algebra::*;

    let P = CscMatrix::identity(1);
    let A = CscMatrix::identity(1);
    let settings = QpSettingsBuilder::default().verbose(false).build().unwrap();
    let mut session = DefaultSession::new();
    session
        .setup(&P, &[1.], &A, &[-1.], &[1.], settings)
        .unwrap();
    session.solve().unwrap();

    let json = session.info().unwrap().to_json().unwrap();
    assert!(json.contains("\"status\":\"Solved\""));
    assert!(json.contains("\"iter\""));
}
