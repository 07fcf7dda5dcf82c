#![allow(non_snake_case)]
use super::*;
use crate::algebra::*;
use crate::qdldl::QDLDLFactorisation;
use crate::solver::core::PolishStatus;

// ---------------
// solution polishing
// ---------------

// which bound of a constraint is guessed to be active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActiveBound {
    Lower,
    Upper,
}

impl<T> AdmmEngine<T>
where
    T: FloatT,
{
    /// Try to improve a solved iterate by guessing the active
    /// constraints from the duals and solving the resulting equality
    /// constrained QP.  The iterate is only replaced if the residuals
    /// improve.
    pub(crate) fn polish(&mut self) -> PolishStatus {
        let (n, m) = (self.data.n, self.data.m);
        let data = &self.data;
        let vars = &self.variables;

        // guess the active sets from the scaled duals
        let active: Vec<Option<ActiveBound>> = (0..m)
            .map(|i| {
                if vars.z[i] - data.l[i] < -vars.y[i] {
                    Some(ActiveBound::Lower)
                } else if data.u[i] - vars.z[i] < vars.y[i] {
                    Some(ActiveBound::Upper)
                } else {
                    None
                }
            })
            .collect();

        let is_active: Vec<bool> = active.iter().map(|a| a.is_some()).collect();
        let Ared = data.A.select_rows(&is_active);

        // rhs = [-q; active bounds]
        let mut rhs = Vec::with_capacity(n + Ared.m);
        rhs.extend(data.q.iter().map(|&q| -q));
        for (i, bound) in active.iter().enumerate() {
            match bound {
                Some(ActiveBound::Lower) => rhs.push(data.l[i]),
                Some(ActiveBound::Upper) => rhs.push(data.u[i]),
                None => (),
            }
        }

        // regularized reduced KKT [P+δI Aredᵀ; Ared -δI]
        let delta = self.settings.delta;
        let (mut K, maps) = assemble_kkt(&data.P, &Ared);
        for &idx in maps.diagP.iter() {
            K.nzval[idx] += delta;
        }
        for &idx in maps.diagA.iter() {
            K.nzval[idx] = -delta;
        }

        let mut ldl = match QDLDLFactorisation::new(&K, None) {
            Ok(ldl) => ldl,
            Err(e) => {
                log::debug!("polish factorization failed: {}", e);
                return PolishStatus::Unsuccessful;
            }
        };

        let mut sol = rhs.clone();
        ldl.solve(&mut sol);

        // iterative refinement against the unregularized system
        for _ in 0..self.settings.polish_refine_iter {
            let mut r = rhs.clone();
            kkt_residual(&data.P, &Ared, &sol, &mut r);
            ldl.solve(&mut r);
            sol.axpby(T::one(), &r, T::one());
        }

        // expand the reduced solution
        let (x_pol, yred) = sol.split_at(n);
        let x_pol = x_pol.to_vec();
        let mut y_pol = vec![T::zero(); m];
        let mut k = 0;
        for (i, &act) in is_active.iter().enumerate() {
            if act {
                y_pol[i] = yred[k];
                k += 1;
            }
        }
        let mut z_pol = vec![T::zero(); m];
        data.A.gemv(&mut z_pol, &x_pol, T::one(), T::zero());
        z_pol.project(&data.l, &data.u);

        if !x_pol.is_finite() || !y_pol.is_finite() {
            return PolishStatus::Unsuccessful;
        }

        let scaled = self.settings.scaled_termination;
        self.residuals
            .update(&x_pol, &z_pol, &y_pol, &self.data, scaled);
        let (pri_pol, dua_pol) = (self.residuals.pri_res, self.residuals.dua_res);
        let (pri_res, dua_res) = (self.info.pri_res, self.info.dua_res);
        let tiny: T = (1e-10).as_T();

        let success = (pri_pol < pri_res && dua_pol < dua_res)
            || (pri_pol < pri_res && dua_res < tiny)
            || (dua_pol < dua_res && pri_res < tiny);

        if !success {
            log::debug!(
                "polish rejected: residuals ({:e}, {:e}) vs ({:e}, {:e})",
                pri_pol,
                dua_pol,
                pri_res,
                dua_res
            );
            return PolishStatus::Unsuccessful;
        }

        self.variables.x.copy_from(&x_pol);
        self.variables.y.copy_from(&y_pol);
        self.variables.z.copy_from(&z_pol);
        self.info.pri_res = pri_pol;
        self.info.dua_res = dua_pol;
        PolishStatus::Successful
    }
}

// r = r - [P Aᵀ; A 0]*sol, with P symmetric from triu data
fn kkt_residual<T: FloatT>(P: &CscMatrix<T>, A: &CscMatrix<T>, sol: &[T], r: &mut [T]) {
    let n = P.n;
    let (x, y) = sol.split_at(n);
    let (rx, ry) = r.split_at_mut(n);

    P.sym().symv(rx, x, -T::one(), T::one());
    A.t().gemv(rx, y, -T::one(), T::one());
    A.gemv(ry, x, -T::one(), T::one());
}

#[test]
fn test_kkt_residual() {
    let P = CscMatrix::from(&[[2., 1.], [0., 2.]]);
    let A = CscMatrix::from(&[[1., 1.]]);
    // [2 1 1; 1 2 1; 1 1 0] * [1 1 1] = [4 4 2]
    let mut r = vec![4., 4., 2.];
    kkt_residual(&P, &A, &[1., 1., 1.], &mut r);
    assert_eq!(r, vec![0., 0., 0.]);
}
