#![allow(non_snake_case)]

use qpsession::algebra::*;
use qpsession::solver::*;

fn problem_data() -> (CscMatrix<f64>, Vec<f64>, CscMatrix<f64>, Vec<f64>, Vec<f64>) {
    // P = [4. 1;1 2], upper triangle only
    let P: CscMatrix<f64> = CscMatrix::new(
        2,                // m
        2,                // n
        vec![0, 1, 3],    // colptr
        vec![0, 0, 1],    // rowval
        vec![4., 1., 2.], // nzval
    );

    let q = vec![1., 1.];

    // A = [1. 1;1 0; 0 1]
    let A: CscMatrix<f64> = CscMatrix::new(
        3,                    // m
        2,                    // n
        vec![0, 2, 4],        // colptr
        vec![0, 1, 0, 2],     // rowval
        vec![1., 1., 1., 1.], // nzval
    );

    let l = vec![1., 0., 0.];
    let u = vec![1., 0.7, 0.7];

    (P, q, A, l, u)
}

fn main() {
    let (P, q, A, l, u) = problem_data();

    let settings = QpSettingsBuilder::default()
        .eps_abs(1e-6)
        .eps_rel(1e-6)
        .polish(true)
        .build()
        .unwrap();

    let mut session = DefaultSession::new();
    session.setup(&P, &q, &A, &l, &u, settings).unwrap();

    match session.solve().unwrap() {
        SolveResult::Solution { x, y, info } => {
            println!("status = {}", info.status);
            println!("x = {:?}", x);
            println!("y = {:?}", y);
        }
        other => println!("no solution: {}", other.status()),
    }
}
