use super::{QpInfo, QpStatus};
use crate::algebra::*;

/// Result of a successful call to [`QpSession::solve`](crate::solver::QpSession::solve).
///
/// The result is tagged by outcome class.  Infeasibility is not an error:
/// it is a successful outcome carrying a certificate in place of a
/// solution, so callers must match on the variant before touching the
/// payload.
///
/// Every status not in an infeasible class (including iteration and time
/// limits, and non-convexity) is reported as a `Solution` holding the last
/// iterates.  For a non-convex problem these are NaN.

#[derive(Debug, Clone, PartialEq)]
pub enum SolveResult<T> {
    /// primal solution `x` (length n) and dual solution `y` (length m)
    Solution {
        x: Vec<T>,
        y: Vec<T>,
        info: QpInfo<T>,
    },
    /// certificate of primal infeasibility (length m)
    PrimalInfeasible { certificate: Vec<T>, info: QpInfo<T> },
    /// certificate of dual infeasibility (length n)
    DualInfeasible { certificate: Vec<T>, info: QpInfo<T> },
}

impl<T> SolveResult<T>
where
    T: FloatT,
{
    /// Build a result from raw engine state according to the outcome
    /// class of `info.status`.  The objective value is overwritten with
    /// NaN, +∞ or -∞ for the non-convex, primal infeasible and dual
    /// infeasible classes.
    pub(crate) fn assemble(
        mut info: QpInfo<T>,
        x: &[T],
        y: &[T],
        primal_certificate: &[T],
        dual_certificate: &[T],
    ) -> Self {
        let status = info.status;

        if status.is_primal_infeasible() {
            info.obj_val = T::infinity();
            SolveResult::PrimalInfeasible {
                certificate: primal_certificate.to_vec(),
                info,
            }
        } else if status.is_dual_infeasible() {
            info.obj_val = T::neg_infinity();
            SolveResult::DualInfeasible {
                certificate: dual_certificate.to_vec(),
                info,
            }
        } else if status == QpStatus::NonConvex {
            info.obj_val = T::nan();
            SolveResult::Solution {
                x: vec![T::nan(); x.len()],
                y: vec![T::nan(); y.len()],
                info,
            }
        } else {
            SolveResult::Solution {
                x: x.to_vec(),
                y: y.to_vec(),
                info,
            }
        }
    }

    pub fn info(&self) -> &QpInfo<T> {
        match self {
            SolveResult::Solution { info, .. } => info,
            SolveResult::PrimalInfeasible { info, .. } => info,
            SolveResult::DualInfeasible { info, .. } => info,
        }
    }

    pub fn status(&self) -> QpStatus {
        self.info().status
    }

    pub fn obj_val(&self) -> T {
        self.info().obj_val
    }

    /// primal solution, if the outcome was not infeasible
    pub fn x(&self) -> Option<&[T]> {
        match self {
            SolveResult::Solution { x, .. } => Some(x.as_slice()),
            _ => None,
        }
    }

    /// dual solution, if the outcome was not infeasible
    pub fn y(&self) -> Option<&[T]> {
        match self {
            SolveResult::Solution { y, .. } => Some(y.as_slice()),
            _ => None,
        }
    }

    pub fn primal_certificate(&self) -> Option<&[T]> {
        match self {
            SolveResult::PrimalInfeasible { certificate, .. } => Some(certificate.as_slice()),
            _ => None,
        }
    }

    pub fn dual_certificate(&self) -> Option<&[T]> {
        match self {
            SolveResult::DualInfeasible { certificate, .. } => Some(certificate.as_slice()),
            _ => None,
        }
    }
}

#[cfg(test)]
fn info_with(status: QpStatus) -> QpInfo<f64> {
    QpInfo {
        status,
        obj_val: 1.5,
        ..QpInfo::default()
    }
}

#[test]
fn test_assemble_outcome_classes() {
    let (x, y) = ([1., 2.], [3.]);
    let (pcert, dcert) = ([-1.], [0.5, 0.5]);

    let r = SolveResult::assemble(info_with(QpStatus::Solved), &x, &y, &pcert, &dcert);
    assert_eq!(r.x(), Some(&x[..]));
    assert_eq!(r.y(), Some(&y[..]));
    assert!(r.primal_certificate().is_none() && r.dual_certificate().is_none());
    assert_eq!(r.obj_val(), 1.5);

    // iteration limits still report the iterates
    let r = SolveResult::assemble(info_with(QpStatus::MaxIterReached), &x, &y, &pcert, &dcert);
    assert_eq!(r.x(), Some(&x[..]));

    let r = SolveResult::assemble(
        info_with(QpStatus::PrimalInfeasibleInaccurate),
        &x,
        &y,
        &pcert,
        &dcert,
    );
    assert_eq!(r.primal_certificate(), Some(&pcert[..]));
    assert!(r.x().is_none() && r.y().is_none() && r.dual_certificate().is_none());
    assert_eq!(r.obj_val(), f64::INFINITY);

    let r = SolveResult::assemble(info_with(QpStatus::DualInfeasible), &x, &y, &pcert, &dcert);
    assert_eq!(r.dual_certificate(), Some(&dcert[..]));
    assert!(r.x().is_none() && r.primal_certificate().is_none());
    assert_eq!(r.obj_val(), f64::NEG_INFINITY);

    let r = SolveResult::assemble(info_with(QpStatus::NonConvex), &x, &y, &pcert, &dcert);
    assert!(r.obj_val().is_nan());
    assert!(r.x().unwrap().iter().all(|v| v.is_nan()));
    assert_eq!(r.y().unwrap().len(), 1);
}
