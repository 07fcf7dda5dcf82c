use super::{PolishStatus, QpStatus};
use crate::algebra::*;

#[cfg(feature = "serde")]
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Timing breakdown of a session, in seconds
#[derive(Default, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QpTiming {
    /// time spent in setup
    pub setup_time: f64,
    /// time spent in the most recent solve, excluding polishing
    pub solve_time: f64,
    /// time spent in updates since the previous solve
    pub update_time: f64,
    /// time spent polishing in the most recent solve
    pub polish_time: f64,
    /// total run time of the most recent solve.  The first solve
    /// includes setup time, later solves include update time.
    pub run_time: f64,
}

/// Summary information about the most recent solve
#[derive(Default, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = "T: Serialize + DeserializeOwned"))]
pub struct QpInfo<T> {
    /// number of iterations taken
    pub iter: u32,
    /// solve status
    pub status: QpStatus,
    /// polishing status
    pub status_polish: PolishStatus,
    /// objective value.  NaN for non-convex, +∞ for primal
    /// infeasible and -∞ for dual infeasible problems
    pub obj_val: T,
    /// primal residual norm
    pub pri_res: T,
    /// dual residual norm
    pub dua_res: T,
    /// timing breakdown, when profiling is enabled
    pub timing: Option<QpTiming>,
    /// number of rho updates in the most recent solve
    pub rho_updates: u32,
    /// most recent rho estimate
    pub rho_estimate: T,
}

impl<T> QpInfo<T>
where
    T: FloatT,
{
    /// integer status code
    pub fn status_val(&self) -> i32 {
        self.status.code()
    }

    /// status text
    pub fn status_text(&self) -> &'static str {
        self.status.as_str()
    }

    /// Write the record as a JSON object
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error>
    where
        T: Serialize + DeserializeOwned,
    {
        serde_json::to_string(self)
    }
}
