//! Shared proptest generators for trace context headers.

use proptest::prelude::*;
use tracecontext::TraceContext;

/// Generate non-zero 64-bit identifiers.
pub fn nonzero_id_strategy() -> impl Strategy<Value = u64> {
    1u64..
}

/// Generate contexts that are valid to write, with any sampling decision.
pub fn trace_context_strategy() -> impl Strategy<Value = TraceContext> {
    (
        any::<u64>(),
        nonzero_id_strategy(),
        nonzero_id_strategy(),
        proptest::option::of(any::<bool>()),
        any::<bool>(),
    )
        .prop_map(|(high, low, span, sampled, debug)| {
            let mut context = TraceContext::new(high, low, span).with_debug(debug);
            if let Some(sampled) = sampled {
                context = context.with_sampled(sampled);
            }
            context
        })
}

/// Generate W3C Trace Context traceparent headers at version 00.
pub fn traceparent_strategy() -> impl Strategy<Value = String> {
    (
        "[0-9a-f]{16}",
        "[0-9a-f]{15}[1-9a-f]",
        "[0-9a-f]{15}[1-9a-f]",
        prop_oneof![Just("00"), Just("01")],
    )
        .prop_map(|(trace_id_high, trace_id, parent_id, flags)| {
            format!("00-{trace_id_high}{trace_id}-{parent_id}-{flags}")
        })
}

/// Generate simple and multi-tenant `tracestate` keys, never `b3`.
pub fn tracestate_key_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[c-z][a-z0-9_*/-]{0,15}",
        ("[a-z0-9][a-z0-9_*/-]{0,7}", "[a-z][a-z0-9_*/-]{0,7}")
            .prop_map(|(tenant, system)| format!("{tenant}@{system}")),
    ]
}

/// Generate `tracestate` values: printable ASCII without `,` or `=`, with
/// spaces only inside.
pub fn tracestate_value_strategy() -> impl Strategy<Value = String> {
    "[!-+\\--<>-~]([ -+\\--<>-~]{0,20}[!-+\\--<>-~])?"
}

/// Generate lists of foreign `tracestate` entries with distinct keys.
pub fn tracestate_entries_strategy(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_map(
        tracestate_key_strategy(),
        tracestate_value_strategy(),
        0..=max,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect()
    })
}
