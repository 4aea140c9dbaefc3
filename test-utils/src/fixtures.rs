//! Test fixtures with sample data.
//!
//! Header values are taken from the W3C Trace Context examples.

use std::collections::HashMap;

use tracecontext::{TRACEPARENT, TRACESTATE, TraceContext};

/// Sampled `traceparent` from the W3C examples.
pub const SAMPLE_TRACEPARENT: &str = "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01";

/// The same trace, not sampled.
pub const SAMPLE_TRACEPARENT_UNSAMPLED: &str =
    "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-00";

/// Two foreign entries from the W3C examples.
pub const SAMPLE_TRACESTATE: &str = "rojo=00f067aa0ba902b7,congo=t61rcWkgMzE";

/// B3 single format value for [`SAMPLE_TRACEPARENT`].
pub const SAMPLE_B3: &str = "0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-1";

/// Context written as [`SAMPLE_TRACEPARENT`].
#[must_use]
pub const fn sample_context() -> TraceContext {
    TraceContext::new(
        0x0af7_6519_16cd_43dd,
        0x8448_eb21_1c80_319c,
        0xb7ad_6b71_6920_3331,
    )
    .with_sampled(true)
}

/// Request headers holding `traceparent` and `tracestate`.
#[must_use]
pub fn sample_headers(traceparent: &str, tracestate: &str) -> HashMap<String, String> {
    HashMap::from([
        (TRACEPARENT.to_string(), traceparent.to_string()),
        (TRACESTATE.to_string(), tracestate.to_string()),
    ])
}

/// Headers an upstream W3C-only system would send.
#[must_use]
pub fn upstream_headers() -> HashMap<String, String> {
    sample_headers(SAMPLE_TRACEPARENT, SAMPLE_TRACESTATE)
}

/// Headers a previous hop of this system would send, with its entry first.
#[must_use]
pub fn b3_headers() -> HashMap<String, String> {
    let tracestate = format!("b3={SAMPLE_B3},{SAMPLE_TRACESTATE}");
    sample_headers(SAMPLE_TRACEPARENT, &tracestate)
}

/// Propagation configuration as JSON.
pub const SAMPLE_CONFIG_JSON: &str = r#"{"tracestate_key":"1@zipkin"}"#;
