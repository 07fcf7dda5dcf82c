#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ---------------------------------
// Solve status type
// ---------------------------------

/// Status of a session after a solve
///
/// Each status carries a fixed integer code and display text,
/// available via [`code`](QpStatus::code) and [`as_str`](QpStatus::as_str).
/// Positive codes are (possibly inaccurate) terminal outcomes, negative
/// codes are failures to converge or certified infeasibility.

#[derive(PartialEq, Eq, Clone, Debug, Copy, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum QpStatus {
    /// Solver terminated with a solution.
    Solved,
    /// Solver terminated with a solution (reduced accuracy)
    SolvedInaccurate,
    /// Problem is primal infeasible.  A certificate of primal infeasibility is available.
    PrimalInfeasible,
    /// Problem is primal infeasible (reduced accuracy).
    PrimalInfeasibleInaccurate,
    /// Problem is dual infeasible.  A certificate of dual infeasibility is available.
    DualInfeasible,
    /// Problem is dual infeasible (reduced accuracy).
    DualInfeasibleInaccurate,
    /// Iteration limit reached before solution or infeasibility certificate found.
    MaxIterReached,
    /// Solve interrupted before termination.
    Interrupted,
    /// Time limit reached before solution or infeasibility certificate found.
    TimeLimitReached,
    /// Cost matrix is not positive semidefinite.
    NonConvex,
    /// Problem is not solved (solver hasn't run).
    #[default]
    Unsolved,
}

impl QpStatus {
    /// integer status code
    pub fn code(&self) -> i32 {
        match self {
            QpStatus::Solved => 1,
            QpStatus::SolvedInaccurate => 2,
            QpStatus::PrimalInfeasibleInaccurate => 3,
            QpStatus::DualInfeasibleInaccurate => 4,
            QpStatus::MaxIterReached => -2,
            QpStatus::PrimalInfeasible => -3,
            QpStatus::DualInfeasible => -4,
            QpStatus::Interrupted => -5,
            QpStatus::TimeLimitReached => -6,
            QpStatus::NonConvex => -7,
            QpStatus::Unsolved => -10,
        }
    }

    /// status from an integer status code
    pub fn from_code(code: i32) -> Option<Self> {
        ALL_STATUSES.iter().copied().find(|s| s.code() == code)
    }

    /// status text
    pub fn as_str(&self) -> &'static str {
        match self {
            QpStatus::Solved => "solved",
            QpStatus::SolvedInaccurate => "solved inaccurate",
            QpStatus::PrimalInfeasibleInaccurate => "primal infeasible inaccurate",
            QpStatus::DualInfeasibleInaccurate => "dual infeasible inaccurate",
            QpStatus::MaxIterReached => "maximum iterations reached",
            QpStatus::PrimalInfeasible => "primal infeasible",
            QpStatus::DualInfeasible => "dual infeasible",
            QpStatus::Interrupted => "interrupted",
            QpStatus::TimeLimitReached => "run time limit reached",
            QpStatus::NonConvex => "problem non convex",
            QpStatus::Unsolved => "unsolved",
        }
    }

    /// true for the primal infeasible outcome class
    pub fn is_primal_infeasible(&self) -> bool {
        matches!(
            *self,
            QpStatus::PrimalInfeasible | QpStatus::PrimalInfeasibleInaccurate
        )
    }

    /// true for the dual infeasible outcome class
    pub fn is_dual_infeasible(&self) -> bool {
        matches!(
            *self,
            QpStatus::DualInfeasible | QpStatus::DualInfeasibleInaccurate
        )
    }

    pub fn is_infeasible(&self) -> bool {
        self.is_primal_infeasible() || self.is_dual_infeasible()
    }

    /// true if a (possibly inaccurate) solution was found
    pub fn is_solved(&self) -> bool {
        matches!(*self, QpStatus::Solved | QpStatus::SolvedInaccurate)
    }
}

const ALL_STATUSES: [QpStatus; 11] = [
    QpStatus::Solved,
    QpStatus::SolvedInaccurate,
    QpStatus::PrimalInfeasible,
    QpStatus::PrimalInfeasibleInaccurate,
    QpStatus::DualInfeasible,
    QpStatus::DualInfeasibleInaccurate,
    QpStatus::MaxIterReached,
    QpStatus::Interrupted,
    QpStatus::TimeLimitReached,
    QpStatus::NonConvex,
    QpStatus::Unsolved,
];

impl std::fmt::Display for QpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of solution polishing

#[derive(PartialEq, Eq, Clone, Debug, Copy, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PolishStatus {
    /// Polished solution accepted
    Successful,
    /// Polishing disabled, or the solve did not reach a solution
    #[default]
    NotPerformed,
    /// Polished solution rejected or polishing failed
    Unsuccessful,
}

impl PolishStatus {
    pub fn code(&self) -> i32 {
        match self {
            PolishStatus::Successful => 1,
            PolishStatus::NotPerformed => 0,
            PolishStatus::Unsuccessful => -1,
        }
    }
}

impl std::fmt::Display for PolishStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            PolishStatus::Successful => "successful",
            PolishStatus::NotPerformed => "not performed",
            PolishStatus::Unsuccessful => "unsuccessful",
        };
        write!(f, "{}", s)
    }
}

#[test]
fn test_status_codes() {
    // codes are unique and round trip
    for s in ALL_STATUSES {
        assert_eq!(QpStatus::from_code(s.code()), Some(s));
    }
    assert_eq!(QpStatus::from_code(0), None);

    assert_eq!(QpStatus::default(), QpStatus::Unsolved);
    assert_eq!(QpStatus::Solved.code(), 1);
    assert_eq!(QpStatus::NonConvex.code(), -7);
    assert_eq!(
        QpStatus::TimeLimitReached.to_string(),
        "run time limit reached"
    );
}

#[test]
fn test_status_classes() {
    assert!(QpStatus::PrimalInfeasibleInaccurate.is_primal_infeasible());
    assert!(!QpStatus::PrimalInfeasible.is_dual_infeasible());
    assert!(QpStatus::DualInfeasible.is_infeasible());
    assert!(QpStatus::SolvedInaccurate.is_solved());
    assert!(!QpStatus::MaxIterReached.is_solved());
    assert!(!QpStatus::MaxIterReached.is_infeasible());
    assert_eq!(PolishStatus::default().code(), 0);
}
