use crate::algebra::*;
use derive_builder::Builder;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Error type returned by settings validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// A field holds a value outside of its allowed range
    #[error("Bad value for field \"{0}\"")]
    BadFieldValue(&'static str),
    /// The requested linear solver can't be used
    #[error("Problem with {solver} solver ({problem})")]
    LinearSolverProblem {
        solver: &'static str,
        problem: &'static str,
    },
    /// A setup-only field was changed after setup
    #[error("Field \"{0}\" can not be changed after setup")]
    ImmutableSetting(&'static str),
}

/// Session settings.
///
/// Construct with [`QpSettingsBuilder`] to override only some of the
/// defaults.  The builder validates values when `build` is called.
///
/// ```no_run
/// use qpsession::solver::*;
///
/// let settings = QpSettingsBuilder::<f64>::default()
///     .eps_abs(1e-6)
///     .eps_rel(1e-6)
///     .polish(true)
///     .build()
///     .unwrap();
/// ```

#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(build_fn(validate = "Self::validate"))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = "T: Serialize + DeserializeOwned"))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct QpSettings<T: FloatT> {
    ///ADMM step size
    #[builder(default = "(0.1).as_T()")]
    pub rho: T,

    ///ADMM regularization on the x block
    #[builder(default = "(1e-6).as_T()")]
    pub sigma: T,

    ///number of Ruiz equilibration iterations.  Zero disables scaling
    #[builder(default = "10")]
    pub scaling: u32,

    ///adapt rho during the iterations
    #[builder(default = "true")]
    pub adaptive_rho: bool,

    ///iterations between rho adaptations.  Zero selects automatically
    #[builder(default = "0")]
    pub adaptive_rho_interval: u32,

    ///minimum ratio between the current and estimated rho to trigger an update
    #[builder(default = "(5.0).as_T()")]
    pub adaptive_rho_tolerance: T,

    ///fraction of setup time after which rho is adapted, when automatic
    #[builder(default = "0.4")]
    pub adaptive_rho_fraction: f64,

    ///maximum number of iterations
    #[builder(default = "4000")]
    pub max_iter: u32,

    ///absolute convergence tolerance
    #[builder(default = "(1e-3).as_T()")]
    pub eps_abs: T,

    ///relative convergence tolerance
    #[builder(default = "(1e-3).as_T()")]
    pub eps_rel: T,

    ///primal infeasibility tolerance
    #[builder(default = "(1e-4).as_T()")]
    pub eps_prim_inf: T,

    ///dual infeasibility tolerance
    #[builder(default = "(1e-4).as_T()")]
    pub eps_dual_inf: T,

    ///ADMM relaxation parameter
    #[builder(default = "(1.6).as_T()")]
    pub alpha: T,

    ///polishing regularization
    #[builder(default = "(1e-6).as_T()")]
    pub delta: T,

    ///linear system solver ("qdldl" or "auto")
    #[builder(default = r#""qdldl".to_string()"#)]
    pub linsys_solver: String,

    ///polish the solution after convergence
    #[builder(default = "false")]
    pub polish: bool,

    ///iterative refinement steps in polishing
    #[builder(default = "3")]
    pub polish_refine_iter: u32,

    ///verbose printing
    #[builder(default = "true")]
    pub verbose: bool,

    ///check termination on the scaled problem
    #[builder(default = "false")]
    pub scaled_termination: bool,

    ///iterations between termination checks.  Zero checks only at max_iter
    #[builder(default = "25")]
    pub check_termination: u32,

    ///start each solve from the previous iterates
    #[builder(default = "true")]
    pub warm_start: bool,

    ///maximum run time (seconds).  Zero disables the limit
    #[builder(default = "0.0")]
    pub time_limit: f64,
}

impl<T> Default for QpSettings<T>
where
    T: FloatT,
{
    fn default() -> QpSettings<T> {
        QpSettingsBuilder::<T>::default().build().unwrap()
    }
}

/// Default settings for a new session
pub fn default_settings<T: FloatT>() -> QpSettings<T> {
    QpSettings::default()
}

macro_rules! check_field {
    ($cond:expr, $field:ident) => {
        if !($cond) {
            return Err(SettingsError::BadFieldValue(stringify!($field)));
        }
    };
}

macro_rules! check_immutable_setting {
    ($self:expr, $prev:expr, $field:ident) => {
        if $self.$field != $prev.$field {
            return Err(SettingsError::ImmutableSetting(stringify!($field)));
        }
    };
}

impl<T> QpSettings<T>
where
    T: FloatT,
{
    /// Checks that every field holds a legal value
    pub fn validate(&self) -> Result<(), SettingsError> {
        check_field!(_rho_ok(self.rho), rho);
        check_field!(self.sigma > T::zero(), sigma);
        check_field!(self.adaptive_rho_tolerance >= T::one(), adaptive_rho_tolerance);
        check_field!(self.adaptive_rho_fraction > 0.0, adaptive_rho_fraction);
        check_field!(self.max_iter > 0, max_iter);
        check_field!(self.eps_abs >= T::zero(), eps_abs);
        check_field!(self.eps_rel >= T::zero(), eps_rel);
        check_field!(
            self.eps_abs != T::zero() || self.eps_rel != T::zero(),
            eps_abs
        );
        check_field!(self.eps_prim_inf >= T::zero(), eps_prim_inf);
        check_field!(self.eps_dual_inf >= T::zero(), eps_dual_inf);
        check_field!(_alpha_ok(self.alpha), alpha);
        check_field!(self.delta > T::zero(), delta);
        check_field!(self.time_limit >= 0.0, time_limit);
        validate_linsys_solver(&self.linsys_solver)?;
        Ok(())
    }

    /// check that a settings object is valid as an updated collection
    /// of settings for a session that has already been set up.  This
    /// rejects changes to parameters that are only used during setup,
    /// as well as to `rho` which is changed through its own update
    /// operation.  Calls `validate()` internally to check that values
    /// are also legal.
    pub fn validate_as_update(&self, prev: &Self) -> Result<(), SettingsError> {
        self.validate()?;

        check_immutable_setting!(self, prev, rho);
        check_immutable_setting!(self, prev, sigma);
        check_immutable_setting!(self, prev, scaling);
        check_immutable_setting!(self, prev, adaptive_rho);
        check_immutable_setting!(self, prev, adaptive_rho_interval);
        check_immutable_setting!(self, prev, adaptive_rho_tolerance);
        check_immutable_setting!(self, prev, adaptive_rho_fraction);
        check_immutable_setting!(self, prev, linsys_solver);

        Ok(())
    }

    /// Read settings from a JSON object.  Missing fields take
    /// their default values.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error>
    where
        T: Serialize + DeserializeOwned,
    {
        serde_json::from_str(json)
    }

    /// Write settings as a JSON object
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error>
    where
        T: Serialize + DeserializeOwned,
    {
        serde_json::to_string(self)
    }
}

// pre build checker (for auto-validation when using the builder)

impl From<SettingsError> for QpSettingsBuilderError {
    fn from(e: SettingsError) -> Self {
        QpSettingsBuilderError::ValidationError(e.to_string())
    }
}

/// Automatic pre-build settings validation
impl<T> QpSettingsBuilder<T>
where
    T: FloatT,
{
    /// check the values of any fields that have been set
    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(rho) = self.rho {
            check_field!(_rho_ok(rho), rho);
        }
        if let Some(sigma) = self.sigma {
            check_field!(sigma > T::zero(), sigma);
        }
        if let Some(max_iter) = self.max_iter {
            check_field!(max_iter > 0, max_iter);
        }
        if let Some(alpha) = self.alpha {
            check_field!(_alpha_ok(alpha), alpha);
        }
        if let Some(delta) = self.delta {
            check_field!(delta > T::zero(), delta);
        }
        if let Some(time_limit) = self.time_limit {
            check_field!(time_limit >= 0.0, time_limit);
        }
        if let Some(ref linsys_solver) = self.linsys_solver {
            validate_linsys_solver(linsys_solver)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------
// individual validation functions go here
// ---------------------------------------------------------

fn _rho_ok<T: FloatT>(rho: T) -> bool {
    rho > T::zero() && rho.is_finite()
}

fn _alpha_ok<T: FloatT>(alpha: T) -> bool {
    alpha > T::zero() && alpha < (2.0).as_T()
}

fn validate_linsys_solver(linsys_solver: &str) -> Result<(), SettingsError> {
    match linsys_solver {
        "auto" => Ok(()),
        "qdldl" => Ok(()),
        "mkl pardiso" => Err(SettingsError::LinearSolverProblem {
            solver: "mkl pardiso",
            problem: "not available",
        }),
        _ => Err(SettingsError::BadFieldValue("linsys_solver")),
    }
}

#[test]
fn test_settings_defaults() {
    let settings = default_settings::<f64>();
    assert_eq!(settings.rho, 0.1);
    assert_eq!(settings.sigma, 1e-6);
    assert_eq!(settings.max_iter, 4000);
    assert_eq!(settings.alpha, 1.6);
    assert_eq!(settings.check_termination, 25);
    assert_eq!(settings.linsys_solver, "qdldl");
    assert_eq!(settings.time_limit, 0.0);
    assert!(settings.verbose && settings.warm_start && !settings.polish);
    assert!(settings.validate().is_ok());

    // same thing in single precision
    let settings = default_settings::<f32>();
    assert_eq!(settings.eps_abs, 1e-3f32);
}

#[test]
fn test_settings_validate() {
    // fail on bad values through the builder
    assert!(QpSettingsBuilder::<f64>::default()
        .alpha(2.0)
        .build()
        .is_err());
    assert!(QpSettingsBuilder::<f64>::default()
        .rho(0.0)
        .build()
        .is_err());
    assert!(QpSettingsBuilder::<f64>::default()
        .linsys_solver("foo".to_string())
        .build()
        .is_err());
    assert!(QpSettingsBuilder::<f64>::default()
        .linsys_solver("auto".to_string())
        .build()
        .is_ok());

    // directly construct bad settings and manually check
    let settings = QpSettings::<f64> {
        eps_abs: 0.0,
        eps_rel: 0.0,
        ..QpSettings::default()
    };
    assert_eq!(
        settings.validate(),
        Err(SettingsError::BadFieldValue("eps_abs"))
    );

    let settings = QpSettings::<f64> {
        time_limit: f64::NAN,
        ..QpSettings::default()
    };
    assert!(settings.validate().is_err());

    let settings = QpSettings::<f64> {
        linsys_solver: "mkl pardiso".to_string(),
        ..QpSettings::default()
    };
    assert!(matches!(
        settings.validate(),
        Err(SettingsError::LinearSolverProblem { .. })
    ));
}

#[test]
fn test_settings_validate_as_update() {
    let prev = QpSettings::<f64>::default();

    let mut new = prev.clone();
    new.max_iter = 10;
    new.eps_abs = 1e-8;
    new.polish = true;
    assert!(new.validate_as_update(&prev).is_ok());

    let mut new = prev.clone();
    new.scaling = 0;
    assert_eq!(
        new.validate_as_update(&prev),
        Err(SettingsError::ImmutableSetting("scaling"))
    );

    let mut new = prev.clone();
    new.rho = 1.0;
    assert_eq!(
        new.validate_as_update(&prev),
        Err(SettingsError::ImmutableSetting("rho"))
    );
}
