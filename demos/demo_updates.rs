#![allow(non_snake_case)]

use qpsession::algebra::*;
use qpsession::solver::*;

// Track a moving target: minimize ½‖x - t‖² over a box,
// updating the cost and bounds between solves.

fn main() {
    let n = 3;
    let P = CscMatrix::identity(n);
    let A = CscMatrix::identity(n);

    let settings = QpSettingsBuilder::default()
        .verbose(false)
        .eps_abs(1e-6)
        .eps_rel(1e-6)
        .build()
        .unwrap();

    let mut session = DefaultSession::new();
    session
        .setup(&P, &vec![0.; n], &A, &vec![-1.; n], &vec![1.; n], settings)
        .unwrap();

    for k in 0..10 {
        let t = 0.25 * k as f64;
        let q = vec![-t; n];
        session.update_lin_cost(&q).unwrap();

        // widen the box every other step
        if k % 2 == 0 {
            let w = 1. + 0.1 * k as f64;
            session.update_bounds(&vec![-w; n], &vec![w; n]).unwrap();
        }

        let result = session.solve().unwrap();
        let info = result.info();
        println!(
            "target = {:.2}, x[0] = {:.4}, iterations = {:>3}, status = {}",
            t,
            result.x().map_or(f64::NAN, |x| x[0]),
            info.iter,
            info.status
        );
    }

    // scale the cost curvature in place
    session.update_P(&vec![4.; n]).unwrap();
    let result = session.solve().unwrap();
    println!("after update of P: x = {:?}", result.x());
}
