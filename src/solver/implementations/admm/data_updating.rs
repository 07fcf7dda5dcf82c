#![allow(non_snake_case)]
use super::*;
use crate::algebra::*;
use crate::solver::core::EngineError;

// Updates of problem data, step sizes and iterates.  Values arrive
// unscaled and already validated, and are scaled with the equilibration
// computed at setup.  The scaling itself is never recomputed.

impl<T> AdmmEngine<T>
where
    T: FloatT,
{
    pub(crate) fn apply_rho_vec(&mut self, rho_vec: &[T]) -> Result<(), EngineError> {
        self.kkt.update_rho_vec(rho_vec)?;
        self.rho_vec.copy_from(rho_vec);
        self.rho_inv_vec.scalarop_from(T::recip, rho_vec);
        Ok(())
    }

    /// New bounds.  The KKT system is only refactored when
    /// a constraint changes its step size class.
    pub(crate) fn apply_bounds(&mut self, l: &[T], u: &[T]) -> Result<(), EngineError> {
        let (l, u) = self.data.scaled_bounds(l, u);
        let constraints = classify_constraints(&l, &u);

        if constraints != self.constraints {
            let rho = self.settings.rho;
            let rho_vec: Vec<T> = constraints.iter().map(|c| c.rho(rho)).collect();
            log::debug!("constraint classes changed, refactoring");
            self.apply_rho_vec(&rho_vec)?;
            self.constraints = constraints;
        }

        self.data.l = l;
        self.data.u = u;
        Ok(())
    }

    pub(crate) fn apply_P(&mut self, Px: &[T]) -> Result<(), EngineError> {
        let Pbar = self.data.scaled_P_values(Px);
        self.kkt.update_P(&Pbar)?;
        self.data.P.nzval = Pbar;
        self.check_convexity();
        Ok(())
    }

    pub(crate) fn apply_A(&mut self, Ax: &[T]) -> Result<(), EngineError> {
        let Abar = self.data.scaled_A_values(Ax);
        self.kkt.update_A(&Abar)?;
        self.data.A.nzval = Abar;
        Ok(())
    }

    pub(crate) fn apply_P_and_A(&mut self, Px: &[T], Ax: &[T]) -> Result<(), EngineError> {
        let Pbar = self.data.scaled_P_values(Px);
        let Abar = self.data.scaled_A_values(Ax);
        self.kkt.update_P_and_A(&Pbar, &Abar)?;
        self.data.P.nzval = Pbar;
        self.data.A.nzval = Abar;
        self.check_convexity();
        Ok(())
    }

    // non-convexity after a P update is reported by the next solve
    fn check_convexity(&mut self) {
        self.nonconvex = !self.kkt.is_convex();
        if self.nonconvex {
            log::warn!("updated P is not positive semidefinite");
        }
    }

    /// Overwrite the iterates with scaled copies of unscaled values.
    /// A new x also resets z to Ax.
    pub(crate) fn apply_warm_start(&mut self, x: Option<&[T]>, y: Option<&[T]>) {
        let equil = &self.data.equilibration;
        let vars = &mut self.variables;

        if let Some(x) = x {
            equil.scale_x(&mut vars.x, x);
            self.data
                .A
                .gemv(&mut vars.z, &vars.x, T::one(), T::zero());
        }
        if let Some(y) = y {
            equil.scale_y(&mut vars.y, y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::core::traits::QpEngine;
    use crate::solver::core::{ProblemData, QpSettings, QpStatus};

    fn test_engine() -> AdmmEngine<f64> {
        // minimize ½x² subject to -1 ≤ x ≤ 1
        let P = CscMatrix::from(&[[1.0]]);
        let A = CscMatrix::from(&[[1.0]]);
        let data = ProblemData::new(&P, &[0.0], &A, &[-1.0], &[1.0]).unwrap();
        let settings = QpSettings {
            verbose: false,
            ..QpSettings::default()
        };
        AdmmEngine::setup(&data, &settings).unwrap()
    }

    #[test]
    fn test_bound_updates_reclassify() {
        let mut engine = test_engine();
        let rho = engine.settings.rho;
        assert_eq!(engine.constraints, vec![ConstraintKind::Inequality]);
        assert_eq!(engine.rho_vec(), vec![rho]);

        // equality constraint
        engine.update_bounds(&[0.5], &[0.5]).unwrap();
        assert_eq!(engine.constraints, vec![ConstraintKind::Equality]);
        assert_eq!(engine.rho_vec(), vec![rho * RHO_EQ_OVER_RHO_INEQ]);

        // loose constraint
        let inf = f64::INFINITY;
        engine.update_bounds(&[-inf], &[inf]).unwrap();
        assert_eq!(engine.constraints, vec![ConstraintKind::Loose]);
        assert_eq!(engine.rho_vec(), vec![RHO_MIN]);
    }

    #[test]
    fn test_rho_updates() {
        let mut engine = test_engine();
        assert_eq!(engine.update_rho(2.0), Ok(2.0));
        assert_eq!(engine.rho_vec(), vec![2.0]);

        // clamped to the allowed range
        assert_eq!(engine.update_rho(1e9), Ok(RHO_MAX));

        assert_eq!(
            engine.update_rho(-1.0),
            Err(EngineError::InvalidValue("rho"))
        );
        assert_eq!(engine.settings.rho, RHO_MAX);

        // a zero step size can't be factored and changes nothing
        assert!(engine.set_rho_vec(&[0.0]).is_err());
        assert_eq!(engine.rho_vec(), vec![RHO_MAX]);
    }

    #[test]
    fn test_nonconvex_P_update() {
        let mut engine = test_engine();
        engine.update_P(&[-1.0]).unwrap();
        let status = engine.solve(&mut std::io::sink()).unwrap();
        assert_eq!(status, QpStatus::NonConvex);

        engine.update_P(&[1.0]).unwrap();
        let status = engine.solve(&mut std::io::sink()).unwrap();
        assert_eq!(status, QpStatus::Solved);
    }

    #[test]
    fn test_warm_start_scaling() {
        let mut engine = test_engine();
        engine.warm_start(Some(&[0.25]), Some(&[0.5]));
        assert!((engine.x()[0] - 0.25).abs() < 1e-14);
        assert!((engine.y()[0] - 0.5).abs() < 1e-14);
        assert!((engine.z()[0] - 0.25).abs() < 1e-14);
        assert!((engine.Ax()[0] - 0.25).abs() < 1e-14);
    }
}
