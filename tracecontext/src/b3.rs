//! B3 single format, carried as the value of this system's `tracestate`
//! entry.
//!
//! Format: `{trace ID}-{span ID}[-{sampling}[-{parent ID}]]`, where the trace
//! ID is 16 or 32 lower-hex characters and sampling is `0`, `1` or `d`.
//! See <https://github.com/openzipkin/b3-propagation#single-header>.

use std::ops::Range;

use crate::context::TraceContext;
use crate::error::{TraceContextError, TraceContextResult};

/// Longest output: 128-bit trace ID, span ID, sampling and parent ID.
const MAX_LENGTH: usize = 32 + 1 + 16 + 2 + 1 + 16;

/// Encodes a trace context into the value of this system's `tracestate`
/// entry and decodes it back.
pub trait SingleFormat: Send + Sync {
    /// Encode the identifiers and sampling decision of `context`.
    fn encode(&self, context: &TraceContext) -> String;

    /// Decode the region `range` of `value`.
    ///
    /// # Errors
    ///
    /// Returns an error when the region is not in this format.
    fn decode(&self, value: &str, range: Range<usize>) -> TraceContextResult<TraceContext>;
}

/// The B3 single header format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct B3SingleFormat;

fn invalid(reason: &'static str) -> TraceContextError {
    TraceContextError::InvalidSingleFormat(reason)
}

fn parse_lower_hex(field: &[u8]) -> Option<u64> {
    field.iter().try_fold(0u64, |acc, &c| {
        let nibble = match c {
            b'0'..=b'9' => c - b'0',
            b'a'..=b'f' => c - b'a' + 10,
            _ => return None,
        };
        Some((acc << 4) | u64::from(nibble))
    })
}

fn parse_id(field: &[u8], reason: &'static str) -> TraceContextResult<u64> {
    match parse_lower_hex(field) {
        Some(0) | None => Err(invalid(reason)),
        Some(id) => Ok(id),
    }
}

impl SingleFormat for B3SingleFormat {
    fn encode(&self, context: &TraceContext) -> String {
        let mut encoded = String::with_capacity(MAX_LENGTH);
        encoded.push_str(&context.trace_id_string());
        encoded.push('-');
        encoded.push_str(&context.span_id_string());

        let sampling = if context.debug {
            Some('d')
        } else {
            context.sampled.map(|sampled| if sampled { '1' } else { '0' })
        };
        if let Some(flag) = sampling {
            encoded.push('-');
            encoded.push(flag);
            if let Some(parent_id) = context.parent_id {
                encoded.push_str(&format!("-{parent_id:016x}"));
            }
        }
        encoded
    }

    fn decode(&self, value: &str, range: Range<usize>) -> TraceContextResult<TraceContext> {
        let region = value
            .as_bytes()
            .get(range.clone())
            .ok_or(TraceContextError::InvalidRange {
                begin: range.start,
                end: range.end,
                length: value.len(),
            })?;
        if region.is_empty() {
            return Err(invalid("empty"));
        }

        let mut fields = region.split(|&c| c == b'-');
        let trace_id = fields.next().unwrap_or_default();
        let Some(span_id) = fields.next() else {
            // A lone sampling flag carries no identifiers to continue.
            return Err(invalid("missing span ID"));
        };

        let mut context = TraceContext::default();
        match trace_id.len() {
            16 => context.trace_id = parse_id(trace_id, "invalid trace ID")?,
            32 => {
                let high = parse_lower_hex(&trace_id[..16]);
                let low = parse_lower_hex(&trace_id[16..]);
                match (high, low) {
                    (Some(0), Some(0)) | (None, _) | (_, None) => {
                        return Err(invalid("invalid trace ID"));
                    }
                    (Some(high), Some(low)) => {
                        context.trace_id_high = high;
                        context.trace_id = low;
                    }
                }
            }
            _ => return Err(invalid("trace ID must be 16 or 32 characters")),
        }

        if span_id.len() != 16 {
            return Err(invalid("span ID must be 16 characters"));
        }
        context.span_id = parse_id(span_id, "invalid span ID")?;

        if let Some(sampling) = fields.next() {
            match sampling {
                b"0" => context.sampled = Some(false),
                b"1" => context.sampled = Some(true),
                b"d" => {
                    context.sampled = Some(true);
                    context.debug = true;
                }
                _ => return Err(invalid("invalid sampling flags")),
            }
        }

        if let Some(parent_id) = fields.next() {
            if parent_id.len() != 16 {
                return Err(invalid("parent ID must be 16 characters"));
            }
            context.parent_id = Some(parse_id(parent_id, "invalid parent ID")?);
        }

        if fields.next().is_some() {
            return Err(invalid("too many fields"));
        }
        Ok(context)
    }
}
