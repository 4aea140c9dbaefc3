//! Rejection reporting and diagnostic subscriber setup.
//!
//! Malformed headers arrive from untrusted peers on every request, so they
//! are reported at `DEBUG` under the `tracecontext` target and stay silent
//! unless that level is enabled.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{TraceContextError, TraceContextResult};

/// Target used for every diagnostic event emitted by this crate.
pub const DIAGNOSTIC_TARGET: &str = "tracecontext";

/// How a rejection is surfaced to the caller.
///
/// Both modes accept and reject exactly the same input and both report the
/// rejection through [`reject`]. They only differ in whether the error is
/// returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Report and discard, for untrusted header input
    #[default]
    Lenient,
    /// Report and return the error, for caller-supplied configuration
    Strict,
}

impl ValidationMode {
    /// Apply this policy to a validation result.
    ///
    /// # Errors
    ///
    /// Returns the rejection unchanged in [`ValidationMode::Strict`].
    pub fn check<T>(self, result: TraceContextResult<T>) -> TraceContextResult<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                reject(&err);
                match self {
                    Self::Lenient => Ok(None),
                    Self::Strict => Err(err),
                }
            }
        }
    }
}

/// Report a rejection. This is the only place the crate logs rejections.
pub fn reject(err: &TraceContextError) {
    tracing::debug!(target: DIAGNOSTIC_TARGET, kind = ?err.kind(), "{err}");
}

/// Diagnostic subscriber configuration.
#[derive(Debug, Clone)]
pub struct DiagnosticsConfig {
    /// Log level filter, overridden by `RUST_LOG`
    pub log_level: String,
    /// Whether to output JSON format
    pub json_output: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_output: false,
        }
    }
}

impl DiagnosticsConfig {
    /// Set the log level filter.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Show header rejections, which are logged at `DEBUG`.
    #[must_use]
    pub fn with_rejections(self) -> Self {
        let level = format!("{},{DIAGNOSTIC_TARGET}=debug", self.log_level);
        self.with_log_level(level)
    }

    /// Enable JSON output.
    #[must_use]
    pub const fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }
}

/// Install the global diagnostic subscriber.
///
/// # Errors
///
/// Returns [`TraceContextError::InvalidConfig`] if the level filter does not
/// parse or a global subscriber is already installed.
pub fn init_diagnostics(config: &DiagnosticsConfig) -> TraceContextResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)
            .map_err(|e| TraceContextError::invalid_config(format!("log level: {e}")))?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json_output {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };
    result.map_err(|e| TraceContextError::invalid_config(e.to_string()))
}
