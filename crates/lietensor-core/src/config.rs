//! Process-wide numerical configuration.
//!
//! The engine reads its tolerances from a single [`LieConfig`] instance. The
//! defaults are installed lazily on first use; a custom configuration can be
//! installed once with [`init_config`], before any operator has run.

use crate::error::{LieError, Result};
use once_cell::sync::OnceCell;

/// Numerical settings shared by every kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LieConfig {
    /// Rotation angle (radians) below which closed forms switch to Taylor series.
    pub small_angle_threshold: f64,
    /// Number of Bernoulli terms used when differentiating the inverse left Jacobian.
    pub jinv_series_terms: usize,
    /// Finite-difference step used by the gradient checker.
    pub gradcheck_step: f64,
    /// Maximum error the gradient checker accepts.
    pub gradcheck_tolerance: f64,
}

impl Default for LieConfig {
    fn default() -> Self {
        Self {
            small_angle_threshold: 1e-3,
            jinv_series_terms: 64,
            gradcheck_step: 1e-6,
            gradcheck_tolerance: 1e-5,
        }
    }
}

impl LieConfig {
    /// Start building a configuration from the defaults.
    pub fn builder() -> LieConfigBuilder {
        LieConfigBuilder::new()
    }

    /// Square of the small-angle threshold; kernels compare against θ².
    pub fn small_angle_threshold_sq(&self) -> f64 {
        self.small_angle_threshold * self.small_angle_threshold
    }
}

static CONFIG: OnceCell<LieConfig> = OnceCell::new();

/// Get the active configuration, installing the defaults on first use.
pub fn config() -> &'static LieConfig {
    CONFIG.get_or_init(LieConfig::default)
}

/// Install a custom configuration.
///
/// Fails if a configuration is already active, either from an earlier call or
/// because an operator already read the defaults.
pub fn init_config(config: LieConfig) -> Result<()> {
    CONFIG
        .set(config)
        .map_err(|_| LieError::invalid_config("configuration is already initialised"))
}

/// Builder for [`LieConfig`].
#[derive(Debug, Clone)]
pub struct LieConfigBuilder {
    config: LieConfig,
}

impl LieConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: LieConfig::default(),
        }
    }

    /// Set the small-angle threshold in radians.
    pub fn small_angle_threshold(mut self, threshold: f64) -> Self {
        self.config.small_angle_threshold = threshold;
        self
    }

    /// Set the number of series terms for the Jinv derivative.
    pub fn jinv_series_terms(mut self, terms: usize) -> Self {
        self.config.jinv_series_terms = terms;
        self
    }

    /// Set the finite-difference step.
    pub fn gradcheck_step(mut self, step: f64) -> Self {
        self.config.gradcheck_step = step;
        self
    }

    /// Set the gradient-check tolerance.
    pub fn gradcheck_tolerance(mut self, tolerance: f64) -> Self {
        self.config.gradcheck_tolerance = tolerance;
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<LieConfig> {
        let c = self.config;
        if !(c.small_angle_threshold.is_finite() && c.small_angle_threshold > 0.0) {
            return Err(LieError::invalid_config(format!(
                "small_angle_threshold must be positive, got {}",
                c.small_angle_threshold
            )));
        }
        if c.jinv_series_terms < 2 {
            return Err(LieError::invalid_config(format!(
                "jinv_series_terms must be at least 2, got {}",
                c.jinv_series_terms
            )));
        }
        if !(c.gradcheck_step.is_finite() && c.gradcheck_step > 0.0) {
            return Err(LieError::invalid_config(format!(
                "gradcheck_step must be positive, got {}",
                c.gradcheck_step
            )));
        }
        if !(c.gradcheck_tolerance.is_finite() && c.gradcheck_tolerance > 0.0) {
            return Err(LieError::invalid_config(format!(
                "gradcheck_tolerance must be positive, got {}",
                c.gradcheck_tolerance
            )));
        }
        Ok(c)
    }
}

impl Default for LieConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
