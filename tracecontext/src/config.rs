//! Propagation configuration.

use serde::{Deserialize, Serialize};

use crate::error::TraceContextResult;
use crate::tracestate::DEFAULT_TRACESTATE_KEY;

/// Propagation configuration, usually loaded with the rest of a service's
/// settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationConfig {
    /// Key of this system's entry inside `tracestate`
    pub tracestate_key: String,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            tracestate_key: DEFAULT_TRACESTATE_KEY.to_string(),
        }
    }
}

impl PropagationConfig {
    /// Create a configuration with a custom `tracestate` key.
    #[must_use]
    pub fn new(tracestate_key: impl Into<String>) -> Self {
        Self {
            tracestate_key: tracestate_key.into(),
        }
    }

    /// Load configuration from JSON. Missing fields take their defaults.
    ///
    /// The key is validated when the propagation is built, not here.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TraceContextError::Serialization`] on malformed JSON.
    pub fn from_json(json: &str) -> TraceContextResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
