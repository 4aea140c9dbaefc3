//! Trace context value read from and written to the propagation headers.

use crate::state::Tracestate;

/// Identifiers and sampling decision of one span, as seen across a process
/// boundary.
///
/// The 128-bit trace ID is split in two halves. `trace_id_high` is zero when
/// the trace ID is 64-bit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TraceContext {
    /// Upper 64 bits of the trace ID, zero for 64-bit trace IDs
    pub trace_id_high: u64,
    /// Lower 64 bits of the trace ID
    pub trace_id: u64,
    /// Parent of this span, only carried by the embedded B3 entry
    pub parent_id: Option<u64>,
    /// Span ID, which `traceparent` calls "parent ID"
    pub span_id: u64,
    /// Sampling decision, `None` when not yet decided
    pub sampled: Option<bool>,
    /// Debug (force sampling) flag
    pub debug: bool,
    /// `tracestate` entries owned by other systems
    pub tracestate: Option<Tracestate>,
}

impl TraceContext {
    /// Create a context with an undecided sampling decision.
    #[must_use]
    pub const fn new(trace_id_high: u64, trace_id: u64, span_id: u64) -> Self {
        Self {
            trace_id_high,
            trace_id,
            parent_id: None,
            span_id,
            sampled: None,
            debug: false,
            tracestate: None,
        }
    }

    /// Set the sampling decision.
    #[must_use]
    pub const fn with_sampled(mut self, sampled: bool) -> Self {
        self.sampled = Some(sampled);
        self
    }

    /// Set the debug flag.
    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the parent span ID.
    #[must_use]
    pub const fn with_parent_id(mut self, parent_id: u64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Attach retained `tracestate` entries.
    #[must_use]
    pub fn with_tracestate(mut self, tracestate: Tracestate) -> Self {
        self.tracestate = Some(tracestate);
        self
    }

    /// True when sampled or debug.
    #[must_use]
    pub const fn is_sampled(&self) -> bool {
        self.debug || matches!(self.sampled, Some(true))
    }

    /// Lower-hex trace ID, 32 characters when the high half is set and 16
    /// otherwise.
    #[must_use]
    pub fn trace_id_string(&self) -> String {
        if self.trace_id_high == 0 {
            format!("{:016x}", self.trace_id)
        } else {
            format!("{:016x}{:016x}", self.trace_id_high, self.trace_id)
        }
    }

    /// Lower-hex span ID.
    #[must_use]
    pub fn span_id_string(&self) -> String {
        format!("{:016x}", self.span_id)
    }
}
