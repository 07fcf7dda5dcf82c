#![allow(non_snake_case)]
use crate::algebra::*;

// ---------------
// equilibration data
// ---------------

/// Data from the Ruiz equilibration procedure.
///
/// The scaled problem is
///
/// minimize ½x̄ᵀ(cDPD)x̄ + (cDq)ᵀx̄ subject to El ≤ (EAD)x̄ ≤ Eu
///
/// with x = Dx̄, y = Eȳ/c and objective values divided by c.
#[derive(Debug, Clone)]
pub struct EquilibrationData<T> {
    /// Vector of variable scaling terms
    pub d: Vec<T>,
    /// Vector of inverse variable scaling terms
    pub dinv: Vec<T>,
    /// Vector of constraint scaling terms
    pub e: Vec<T>,
    /// Vector of inverse constraint scaling terms
    pub einv: Vec<T>,
    /// overall scaling for objective function
    pub c: T,
    /// inverse of c
    pub cinv: T,
}

impl<T> EquilibrationData<T>
where
    T: FloatT,
{
    /// identity scaling for n variables and m constraints
    pub fn new(n: usize, m: usize) -> Self {
        Self {
            d: vec![T::one(); n],
            dinv: vec![T::one(); n],
            e: vec![T::one(); m],
            einv: vec![T::one(); m],
            c: T::one(),
            cinv: T::one(),
        }
    }

    /// scaled primal variable from an unscaled one, x̄ = D⁻¹x
    pub(crate) fn scale_x(&self, xbar: &mut [T], x: &[T]) {
        xbar.copy_from(x).hadamard(&self.dinv);
    }

    /// scaled dual variable from an unscaled one, ȳ = cE⁻¹y
    pub(crate) fn scale_y(&self, ybar: &mut [T], y: &[T]) {
        ybar.copy_from(y).hadamard(&self.einv).scale(self.c);
    }

    /// unscaled primal variable, x = Dx̄
    pub(crate) fn unscale_x(&self, x: &mut [T], xbar: &[T]) {
        x.copy_from(xbar).hadamard(&self.d);
    }

    /// unscaled dual variable, y = Eȳ/c
    pub(crate) fn unscale_y(&self, y: &mut [T], ybar: &[T]) {
        y.copy_from(ybar).hadamard(&self.e).scale(self.cinv);
    }
}

#[test]
fn test_scaling_round_trip() {
    let mut equil = EquilibrationData::<f64>::new(2, 1);
    equil.d = vec![2., 4.];
    equil.dinv = vec![0.5, 0.25];
    equil.e = vec![0.5];
    equil.einv = vec![2.];
    equil.c = 0.1;
    equil.cinv = 10.;

    let mut xbar = vec![0.; 2];
    let mut x = vec![0.; 2];
    equil.scale_x(&mut xbar, &[1., 1.]);
    assert_eq!(xbar, vec![0.5, 0.25]);
    equil.unscale_x(&mut x, &xbar);
    assert_eq!(x, vec![1., 1.]);

    let mut ybar = vec![0.; 1];
    let mut y = vec![0.; 1];
    equil.scale_y(&mut ybar, &[3.]);
    assert!((ybar[0] - 0.6).abs() < 1e-14);
    equil.unscale_y(&mut y, &ybar);
    assert!((y[0] - 3.).abs() < 1e-14);
}
