#![allow(non_snake_case)]
use super::*;
use crate::algebra::*;
use std::iter::zip;

// ---------------
// residuals and termination criteria
// ---------------

/// Residual norms of the current iterate, and the products
/// needed to compute them
#[derive(Debug, Clone)]
pub struct AdmmResiduals<T> {
    /// Āx̄
    pub Ax: Vec<T>,
    /// P̄x̄, with P̄ treated as symmetric
    pub Px: Vec<T>,
    /// Āᵀȳ
    pub Aty: Vec<T>,

    /// primal residual norm ‖Ax - z‖∞
    pub pri_res: T,
    /// dual residual norm ‖Px + q + Aᵀy‖∞
    pub dua_res: T,
    /// max(‖Ax‖∞, ‖z‖∞)
    pub pri_norm: T,
    /// max(‖Px‖∞, ‖Aᵀy‖∞, ‖q‖∞)
    pub dua_norm: T,

    work_n: Vec<T>,
    work_m: Vec<T>,
}

impl<T> AdmmResiduals<T>
where
    T: FloatT,
{
    pub fn new(n: usize, m: usize) -> Self {
        Self {
            Ax: vec![T::zero(); m],
            Px: vec![T::zero(); n],
            Aty: vec![T::zero(); n],
            pri_res: T::zero(),
            dua_res: T::zero(),
            pri_norm: T::zero(),
            dua_norm: T::zero(),
            work_n: vec![T::zero(); n],
            work_m: vec![T::zero(); m],
        }
    }

    /// Recompute the residuals at the iterate (x, z, y).  Norms are taken
    /// on the unscaled problem unless `scaled` is set.
    pub fn update(&mut self, x: &[T], z: &[T], y: &[T], data: &AdmmProblemData<T>, scaled: bool) {
        let (P, A, q) = (&data.P, &data.A, &data.q);

        A.gemv(&mut self.Ax, x, T::one(), T::zero());
        P.sym().symv(&mut self.Px, x, T::one(), T::zero());
        A.t().gemv(&mut self.Aty, y, T::one(), T::zero());

        // primal : Ax - z
        self.work_m.waxpby(T::one(), &self.Ax, -T::one(), z);
        // dual : Px + q + Aᵀy
        self.work_n
            .waxpby(T::one(), &self.Px, T::one(), &self.Aty)
            .axpby(T::one(), q, T::one());

        if scaled {
            self.pri_res = self.work_m.norm_inf();
            self.pri_norm = T::max(self.Ax.norm_inf(), z.norm_inf());
            self.dua_res = self.work_n.norm_inf();
            self.dua_norm = max3(self.Px.norm_inf(), self.Aty.norm_inf(), q.norm_inf());
        } else {
            let equil = &data.equilibration;
            let (einv, dinv, cinv) = (&equil.einv, &equil.dinv, equil.cinv);

            self.pri_res = self.work_m.norm_inf_scaled(einv);
            self.pri_norm = T::max(self.Ax.norm_inf_scaled(einv), z.norm_inf_scaled(einv));
            self.dua_res = cinv * self.work_n.norm_inf_scaled(dinv);
            self.dua_norm = cinv
                * max3(
                    self.Px.norm_inf_scaled(dinv),
                    self.Aty.norm_inf_scaled(dinv),
                    q.norm_inf_scaled(dinv),
                );
        }
    }

    /// Primal and dual tolerances, eps_abs + eps_rel * norm
    pub fn tolerances(&self, eps_abs: T, eps_rel: T) -> (T, T) {
        (
            eps_abs + eps_rel * self.pri_norm,
            eps_abs + eps_rel * self.dua_norm,
        )
    }

    /// true if both residuals are within tolerance.  A problem
    /// without constraints has no primal residual.
    pub fn is_converged(&self, eps_abs: T, eps_rel: T, m: usize) -> bool {
        let (eps_pri, eps_dua) = self.tolerances(eps_abs, eps_rel);
        (m == 0 || self.pri_res < eps_pri) && self.dua_res < eps_dua
    }

    /// Estimate of the step size balancing the scaled relative
    /// residuals.  Requires a prior call to `update`.
    pub fn rho_estimate(&self, z: &[T], data: &AdmmProblemData<T>, rho: T) -> T {
        let tol: T = DIVISION_TOL.as_T();

        let pri_res = self.Ax.norm_inf_diff(z);
        let pri_norm = T::max(self.Ax.norm_inf(), z.norm_inf());
        let pri_res = pri_res / (pri_norm + tol);

        let dua_res = {
            let mut r = T::zero();
            for ((&px, &aty), &q) in zip(zip(&self.Px, &self.Aty), &data.q) {
                r = T::max(r, T::abs(px + aty + q));
            }
            r
        };
        let dua_norm = max3(self.Px.norm_inf(), self.Aty.norm_inf(), data.q.norm_inf());
        let dua_res = dua_res / (dua_norm + tol);

        let estimate = rho * T::sqrt(pri_res / (dua_res + tol));
        estimate.project(RHO_MIN.as_T(), RHO_MAX.as_T())
    }

    /// Primal infeasibility test on the dual step δy.  δy is projected
    /// onto the polar of the recession cone of the bounds in place.
    pub fn is_primal_infeasible(
        &mut self,
        delta_y: &mut [T],
        data: &AdmmProblemData<T>,
        eps_prim_inf: T,
        scaled: bool,
    ) -> bool {
        if delta_y.is_empty() {
            return false;
        }
        let inf: T = QP_INFINITY_SCALED.as_T();
        let equil = &data.equilibration;

        for ((dy, &l), &u) in zip(zip(delta_y.iter_mut(), &data.l), &data.u) {
            if u > inf {
                *dy = T::min(*dy, T::zero());
            }
            if l < -inf {
                *dy = T::max(*dy, T::zero());
            }
        }

        let norm_delta_y = match scaled {
            true => delta_y.norm_inf(),
            false => delta_y.norm_inf_scaled(&equil.e),
        };

        if norm_delta_y <= DIVISION_TOL.as_T() {
            return false;
        }

        let mut ineq_lhs = T::zero();
        for ((&dy, &l), &u) in zip(zip(delta_y.iter(), &data.l), &data.u) {
            ineq_lhs += u * T::max(dy, T::zero()) + l * T::min(dy, T::zero());
        }
        ineq_lhs /= norm_delta_y;

        if ineq_lhs >= -eps_prim_inf {
            return false;
        }

        // ‖Aᵀδy‖ test
        data.A
            .t()
            .gemv(&mut self.work_n, delta_y, T::one(), T::zero());
        let norm = match scaled {
            true => self.work_n.norm_inf(),
            false => self.work_n.norm_inf_scaled(&equil.dinv),
        };
        norm / norm_delta_y < eps_prim_inf
    }

    /// Dual infeasibility test on the primal step δx
    pub fn is_dual_infeasible(
        &mut self,
        delta_x: &[T],
        data: &AdmmProblemData<T>,
        eps_dual_inf: T,
        scaled: bool,
    ) -> bool {
        let equil = &data.equilibration;
        let inf: T = QP_INFINITY_SCALED.as_T();

        let (norm_delta_x, cost_scaling) = match scaled {
            true => (delta_x.norm_inf(), T::one()),
            false => (delta_x.norm_inf_scaled(&equil.d), equil.c),
        };

        if norm_delta_x <= DIVISION_TOL.as_T() {
            return false;
        }

        let tol = cost_scaling * eps_dual_inf * norm_delta_x;

        // qᵀδx < 0
        if data.q.dot(delta_x) >= -tol {
            return false;
        }

        // Pδx ≈ 0
        data.P
            .sym()
            .symv(&mut self.work_n, delta_x, T::one(), T::zero());
        let normP = match scaled {
            true => self.work_n.norm_inf(),
            false => self.work_n.norm_inf_scaled(&equil.dinv),
        };
        if normP >= tol {
            return false;
        }

        // Aδx in the recession cone of the bounds
        data.A.gemv(&mut self.work_m, delta_x, T::one(), T::zero());
        if !scaled {
            self.work_m.hadamard(&equil.einv);
        }
        let tol = eps_dual_inf * norm_delta_x;
        for ((&adx, &l), &u) in zip(zip(&self.work_m, &data.l), &data.u) {
            if (u < inf && adx > tol) || (l > -inf && adx < -tol) {
                return false;
            }
        }
        true
    }
}

fn max3<T: FloatT>(a: T, b: T, c: T) -> T {
    T::max(a, T::max(b, c))
}

#[cfg(test)]
fn test_data(l: f64, u: f64) -> AdmmProblemData<f64> {
    use crate::solver::core::{ProblemData, QpSettings};
    // minimize x subject to l ≤ x ≤ u, no scaling
    let P = CscMatrix::<f64>::zeros((1, 1));
    let A = CscMatrix::from(&[[1.0]]);
    let data = ProblemData::new(&P, &[1.0], &A, &[l], &[u]).unwrap();
    let settings = QpSettings {
        scaling: 0,
        ..QpSettings::default()
    };
    AdmmProblemData::new(&data, &settings)
}

#[test]
fn test_residuals_at_solution() {
    let data = test_data(-1.0, 1.0);
    let mut r = AdmmResiduals::new(1, 1);

    // x = -1, z = -1, y = -1 is optimal
    r.update(&[-1.0], &[-1.0], &[-1.0], &data, false);
    assert_eq!(r.pri_res, 0.0);
    assert_eq!(r.dua_res, 0.0);
    assert!(r.is_converged(1e-6, 1e-6, 1));

    r.update(&[0.0], &[-1.0], &[0.0], &data, true);
    assert_eq!(r.pri_res, 1.0);
    assert_eq!(r.dua_res, 1.0);
    assert!(!r.is_converged(1e-3, 1e-3, 1));
}

#[test]
fn test_dual_infeasibility_detection() {
    // unbounded below : x can decrease forever
    let data = test_data(f64::NEG_INFINITY, 1.0);
    let mut r = AdmmResiduals::new(1, 1);
    assert!(r.is_dual_infeasible(&[-1.0], &data, 1e-4, false));
    assert!(!r.is_dual_infeasible(&[1.0], &data, 1e-4, false));

    // bounded problem
    let data = test_data(-1.0, 1.0);
    assert!(!r.is_dual_infeasible(&[-1.0], &data, 1e-4, false));
}

#[test]
fn test_primal_infeasibility_detection() {
    use crate::solver::core::{ProblemData, QpSettings};
    // x ≥ 1 and x ≤ -1 as two rows of A
    let P = CscMatrix::<f64>::zeros((1, 1));
    let A = CscMatrix::from(&[[1.0], [1.0]]);
    let inf = f64::INFINITY;
    let pdata = ProblemData::new(&P, &[0.0], &A, &[1.0, -inf], &[inf, -1.0]).unwrap();
    let settings = QpSettings {
        scaling: 0,
        ..QpSettings::default()
    };
    let data = AdmmProblemData::new(&pdata, &settings);
    let mut r = AdmmResiduals::new(1, 2);

    let mut dy = vec![-1.0, 1.0];
    assert!(r.is_primal_infeasible(&mut dy, &data, 1e-4, false));

    // the wrong sign is projected away
    let mut dy = vec![1.0, -1.0];
    assert!(!r.is_primal_infeasible(&mut dy, &data, 1e-4, false));
    assert_eq!(dy, vec![0.0, 0.0]);
}
