#![allow(non_snake_case)]
use super::*;
use crate::algebra::*;
use std::iter::zip;

// ---------------
// ADMM iterates
// ---------------

/// Scaled ADMM iterates and the steps between them
#[derive(Debug, Clone)]
pub struct AdmmVariables<T> {
    /// primal variables
    pub x: Vec<T>,
    /// constraint values, projected onto the bounds
    pub z: Vec<T>,
    /// dual variables
    pub y: Vec<T>,
    /// previous iterates
    pub x_prev: Vec<T>,
    pub z_prev: Vec<T>,
    /// KKT solution.  The first n entries hold x̃ and the
    /// remaining m entries z̃ once the step is complete
    pub xz_tilde: Vec<T>,
    /// most recent steps, used for infeasibility detection
    pub delta_x: Vec<T>,
    pub delta_y: Vec<T>,
    n: usize,
}

impl<T> AdmmVariables<T>
where
    T: FloatT,
{
    pub fn new(n: usize, m: usize) -> Self {
        Self {
            x: vec![T::zero(); n],
            z: vec![T::zero(); m],
            y: vec![T::zero(); m],
            x_prev: vec![T::zero(); n],
            z_prev: vec![T::zero(); m],
            xz_tilde: vec![T::zero(); n + m],
            delta_x: vec![T::zero(); n],
            delta_y: vec![T::zero(); m],
            n,
        }
    }

    /// reset the iterates to zero
    pub fn cold_start(&mut self) {
        self.x.set(T::zero());
        self.z.set(T::zero());
        self.y.set(T::zero());
    }

    pub(crate) fn z_tilde(&self) -> &[T] {
        &self.xz_tilde[self.n..]
    }

    /// One ADMM iteration.  The KKT system factors
    /// [P+σI Aᵀ; A -diag(1/ρ)].
    pub(crate) fn step(
        &mut self,
        data: &AdmmProblemData<T>,
        kkt: &mut KKTSystem<T>,
        rho_vec: &[T],
        rho_inv_vec: &[T],
        sigma: T,
        alpha: T,
    ) {
        std::mem::swap(&mut self.x, &mut self.x_prev);
        std::mem::swap(&mut self.z, &mut self.z_prev);

        self.update_xz_tilde(data, kkt, rho_inv_vec, sigma);
        self.update_x(alpha);
        self.update_z(data, rho_inv_vec, alpha);
        self.update_y(rho_vec, alpha);
    }

    fn update_xz_tilde(
        &mut self,
        data: &AdmmProblemData<T>,
        kkt: &mut KKTSystem<T>,
        rho_inv_vec: &[T],
        sigma: T,
    ) {
        let n = self.n;
        let (xt, zt) = self.xz_tilde.split_at_mut(n);

        // rhs = [σx_prev - q; z_prev - y/ρ]
        xt.waxpby(sigma, &self.x_prev, -T::one(), &data.q);
        for (zt, (&z, (&y, &rinv))) in zip(zt.iter_mut(), zip(&self.z_prev, zip(&self.y, rho_inv_vec))) {
            *zt = z - rinv * y;
        }

        kkt.solve(&mut self.xz_tilde);

        // z̃ = z_prev + (ν - y)/ρ
        let zt = &mut self.xz_tilde[n..];
        for (zt, (&z, (&y, &rinv))) in zip(zt.iter_mut(), zip(&self.z_prev, zip(&self.y, rho_inv_vec))) {
            *zt = z + rinv * (*zt - y);
        }
    }

    fn update_x(&mut self, alpha: T) {
        let n = self.n;
        self.x
            .waxpby(alpha, &self.xz_tilde[..n], T::one() - alpha, &self.x_prev);
        self.delta_x.waxpby(T::one(), &self.x, -T::one(), &self.x_prev);
    }

    fn update_z(&mut self, data: &AdmmProblemData<T>, rho_inv_vec: &[T], alpha: T) {
        let n = self.n;
        let zt = &self.xz_tilde[n..];
        for (i, z) in self.z.iter_mut().enumerate() {
            let zrelax = alpha * zt[i] + (T::one() - alpha) * self.z_prev[i];
            *z = zrelax + rho_inv_vec[i] * self.y[i];
        }
        self.z.project(&data.l, &data.u);
    }

    fn update_y(&mut self, rho_vec: &[T], alpha: T) {
        let n = self.n;
        let zt = &self.xz_tilde[n..];
        for i in 0..self.y.len() {
            let zrelax = alpha * zt[i] + (T::one() - alpha) * self.z_prev[i];
            self.delta_y[i] = rho_vec[i] * (zrelax - self.z[i]);
            self.y[i] += self.delta_y[i];
        }
    }
}

#[test]
fn test_cold_start() {
    let mut vars = AdmmVariables::<f64>::new(2, 1);
    vars.x.set(1.);
    vars.y.set(2.);
    vars.z.set(3.);
    vars.cold_start();
    assert_eq!(vars.x, vec![0.; 2]);
    assert_eq!(vars.y, vec![0.]);
    assert_eq!(vars.z, vec![0.]);
    assert_eq!(vars.z_tilde().len(), 1);
}
