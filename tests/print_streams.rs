#![allow(non_snake_case)]

use qpsession::{algebra::*, io::ConfigurablePrintTarget, solver::*};

fn test_print_session() -> DefaultSession<f64> {
    let P = CscMatrix::identity(1);
    let A = CscMatrix::identity(1);
    let settings = QpSettings::default();
    let mut session = DefaultSession::new();
    session
        .setup(&P, &[0.], &A, &[1.], &[2.], settings)
        .unwrap();
    session
}

#[test]
fn test_print_to_stdout() {
    let mut session = test_print_session();
    session.print_to_stdout();
    session.solve().unwrap();
}

#[test]
fn test_print_to_buffer() {
    let mut session = test_print_session();
    session.print_to_buffer();
    session.solve().unwrap();
    let result = session.get_print_buffer().unwrap();
    assert!(result.contains("qpsession"));
    assert!(result.contains("status:"));
}

#[test]
fn test_print_to_sink() {
    let mut session = test_print_session();
    session.print_to_sink();
    session.solve().unwrap();
    assert!(session.get_print_buffer().is_err());
}

#[test]
fn test_print_verbose_off() {
    let mut session = test_print_session();
    session.print_to_buffer();
    session.update_verbose(false).unwrap();
    session.solve().unwrap();
    assert!(session.get_print_buffer().unwrap().is_empty());
}

#[test]
fn test_print_to_file() {
    use std::io::{Read, Seek};

    let mut session = test_print_session();
    let file = tempfile::NamedTempFile::new().unwrap();
    let mut file2 = file.reopen().unwrap();
    session.print_to_file(file.into_file());
    session.solve().unwrap();

    file2.seek(std::io::SeekFrom::Start(0)).unwrap();
    let mut result = String::new();
    file2.read_to_string(&mut result).unwrap();
    assert!(result.contains("qpsession"));
}

#[test]
fn test_print_to_stream() {
    use std::io::{Read, Seek};

    let mut session = test_print_session();
    let file = tempfile::NamedTempFile::new().unwrap();
    let mut file2 = file.reopen().unwrap();
    let stream = Box::new(file.into_file());

    session.print_to_stream(stream);
    session.solve().unwrap();

    file2.seek(std::io::SeekFrom::Start(0)).unwrap();
    let mut result = String::new();
    file2.read_to_string(&mut result).unwrap();
    assert!(result.contains("qpsession"));
}
