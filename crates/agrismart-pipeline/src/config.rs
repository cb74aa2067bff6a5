//! Pipeline configuration
//!
//! Simulated latencies, progress granularity and display settings. Every
//! field has a default, so a TOML file only needs the keys it overrides.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Per-operation latency in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationDelays {
    /// `approve_request`
    pub approve_ms: u64,
    /// `reject_request`
    pub reject_ms: u64,
    /// `schedule_request`
    pub schedule_ms: u64,
    /// `start_scan`
    pub start_scan_ms: u64,
    /// `request_validation`
    pub request_validation_ms: u64,
    /// `validate_results`
    pub validate_ms: u64,
    /// Generic `transition_status`
    pub transition_ms: u64,
}

impl OperationDelays {
    /// No latency at all
    pub const ZERO: OperationDelays = OperationDelays {
        approve_ms: 0,
        reject_ms: 0,
        schedule_ms: 0,
        start_scan_ms: 0,
        request_validation_ms: 0,
        validate_ms: 0,
        transition_ms: 0,
    };
}

impl Default for OperationDelays {
    fn default() -> Self {
        Self {
            approve_ms: 800,
            reject_ms: 600,
            schedule_ms: 1000,
            start_scan_ms: 600,
            request_validation_ms: 600,
            validate_ms: 800,
            transition_ms: 600,
        }
    }
}

/// Progress granularity for long-running operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Percent per upload step
    pub upload_step: u8,
    /// Wait before each upload report
    pub upload_step_ms: u64,
    /// Percent per analysis step
    pub analysis_step: u8,
    /// Wait before each analysis report
    pub analysis_step_ms: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            upload_step: 10,
            upload_step_ms: 300,
            analysis_step: 5,
            analysis_step_ms: 200,
        }
    }
}

/// Lifecycle pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Simulated latency per short operation
    pub delays: OperationDelays,
    /// Progress granularity for upload and analysis
    pub progress: ProgressConfig,
    /// Prefix for amounts, e.g. `XAF`
    pub currency_code: String,
    /// Reports are published at `{prefix}/{request_id}.pdf`
    pub report_url_prefix: String,
}

impl LifecycleConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with every delay set to zero
    #[must_use]
    pub fn instant() -> Self {
        Self {
            delays: OperationDelays::ZERO,
            progress: ProgressConfig {
                upload_step_ms: 0,
                analysis_step_ms: 0,
                ..ProgressConfig::default()
            },
            ..Self::default()
        }
    }

    /// With operation delays
    #[inline]
    #[must_use]
    pub fn with_delays(mut self, delays: OperationDelays) -> Self {
        self.delays = delays;
        self
    }

    /// With progress settings
    #[inline]
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressConfig) -> Self {
        self.progress = progress;
        self
    }

    /// With currency code
    #[inline]
    #[must_use]
    pub fn with_currency_code(mut self, code: impl Into<String>) -> Self {
        self.currency_code = code.into();
        self
    }

    /// With report URL prefix
    #[inline]
    #[must_use]
    pub fn with_report_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.report_url_prefix = prefix.into();
        self
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// `ConfigError::Parse` on malformed TOML, `ConfigError::Invalid` on
    /// out-of-range values.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    ///
    /// # Errors
    /// `ConfigError::Io` if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&input)?;
        tracing::debug!(path = %path.display(), "loaded lifecycle config");
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, step) in [
            ("progress.upload_step", self.progress.upload_step),
            ("progress.analysis_step", self.progress.analysis_step),
        ] {
            if step == 0 || step > 100 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be between 1 and 100, got {step}"
                )));
            }
        }
        if self.currency_code.trim().is_empty() {
            return Err(ConfigError::Invalid("currency_code is empty".to_string()));
        }
        Ok(())
    }

    /// Report location for a request id
    #[must_use]
    pub fn report_url(&self, request_id: &agrismart_core::RequestId) -> String {
        format!(
            "{}/{}.pdf",
            self.report_url_prefix.trim_end_matches('/'),
            request_id
        )
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            delays: OperationDelays::default(),
            progress: ProgressConfig::default(),
            currency_code: "XAF".to_string(),
            report_url_prefix: "/reports".to_string(),
        }
    }
}

#[inline]
pub(crate) fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}
