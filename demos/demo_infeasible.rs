#![allow(non_snake_case)]

use qpsession::algebra::*;
use qpsession::solver::*;

fn main() {
    // x₁ + x₂ ≥ 2 and x₁ + x₂ ≤ 1
    let P = CscMatrix::identity(2);
    let A = CscMatrix::from(&[[1., 1.], [1., 1.]]);
    let inf = f64::INFINITY;

    let mut session = DefaultSession::new();
    session
        .setup(
            &P,
            &[0., 0.],
            &A,
            &[2., -inf],
            &[inf, 1.],
            QpSettings::default(),
        )
        .unwrap();

    match session.solve().unwrap() {
        SolveResult::PrimalInfeasible { certificate, .. } => {
            println!("primal infeasible, certificate = {:?}", certificate)
        }
        SolveResult::DualInfeasible { certificate, .. } => {
            println!("dual infeasible, certificate = {:?}", certificate)
        }
        SolveResult::Solution { x, .. } => println!("solved, x = {:?}", x),
    }

    // relax the second constraint and solve again
    session.update_upper_bound(&[inf, 3.]).unwrap();
    let result = session.solve().unwrap();
    println!("after relaxing: {} x = {:?}", result.status(), result.x());
}
