use crate::algebra::*;

#[test]
fn test_copy_from() {
    let x = vec![3., 0., 2., 1.];
    let mut y = vec![0.; 4];
    y.copy_from(&x);
    assert_eq!(x, y);
}

#[test]
fn test_rsqrt_and_scalarop_from() {
    let mut x = vec![4., 16., 0.25];
    x.rsqrt();
    assert_eq!(x, vec![0.5, 0.25, 2.]);
    let mut y = vec![0.; 3];
    y.scalarop_from(f64::recip, &x);
    assert_eq!(y, vec![2., 4., 0.5]);
}

#[test]
fn test_hadamard() {
    let mut x = vec![1., -2., 3.];
    let y = vec![2., 3., -1.];
    x.hadamard(&y);
    assert_eq!(x, vec![2., -6., -3.]);
}

#[test]
fn test_clip() {
    // Ruiz style limiting: tiny values reset to one, huge values capped
    let mut x = vec![1e-6, 0.5, 1e5];
    x.clip(1e-4, 1e4, 1., 1e4);
    assert_eq!(x, vec![1., 0.5, 1e4]);
}

#[test]
fn test_op_chaining() {
    let mut x = vec![1., 2., 3.];
    x.scale(2.).negate().scalarop(|v| v + 1.);
    assert_eq!(x, vec![-1., -3., -5.]);
}

#[test]
fn test_norms() {
    let x = vec![-3., 4.];
    assert_eq!(x.dot(&x), 25.);
    assert_eq!(x.norm_inf(), 4.);
    assert_eq!(x.norm_inf_diff(&[-1., 1.]), 3.);
    let empty: Vec<f64> = vec![];
    assert_eq!(empty.norm_inf(), 0.);
}

#[test]
fn test_set_and_mean() {
    let mut x = vec![-3., 4., 1.];
    assert_eq!(x.mean(), 2. / 3.);
    x.set(2.);
    assert_eq!(x, vec![2.; 3]);
}

#[test]
fn test_axpby() {
    let mut y = vec![1., 2., 3.];
    let x = vec![1., 1., 1.];
    y.axpby(2., &x, -1.);
    assert_eq!(y, vec![1., 0., -1.]);
}

#[test]
fn test_waxpby() {
    let mut w = vec![0.; 3];
    let x = vec![1., 2., 3.];
    let y = vec![3., 2., 1.];
    w.waxpby(1., &x, -1., &y);
    assert_eq!(w, vec![-2., 0., 2.]);
}

#[test]
fn test_is_finite() {
    assert!(vec![1., 2.].is_finite());
    assert!(!vec![1., f64::INFINITY].is_finite());
    assert!(!vec![f64::NAN].is_finite());
}
