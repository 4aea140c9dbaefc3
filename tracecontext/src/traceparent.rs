//! `traceparent` header codec.
//!
//! Format: `{version}-{trace ID}-{parent ID}-{trace flags}`, for example
//! `00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01`.
//! See <https://www.w3.org/TR/trace-context-1/#traceparent-header>.

use crate::context::TraceContext;
use crate::error::{Field, TraceContextError, TraceContextResult};

/// Length of a version `00` header. Later versions may be longer.
pub const TRACEPARENT_LENGTH: usize = 3 + 32 + 1 + 16 + 3;

const VERSION_RESERVED: u64 = 0xff;
const FLAG_SAMPLED: u64 = 1;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Write `value` as 16 lower-hex digits starting at `pos`.
fn write_hex_u64(buf: &mut [u8], pos: usize, value: u64) {
    for (i, slot) in buf[pos..pos + 16].iter_mut().enumerate() {
        let shift = (15 - i) * 4;
        *slot = HEX_DIGITS[((value >> shift) & 0xf) as usize];
    }
}

/// Write every `traceparent` field of `context` into a caller-owned buffer.
///
/// Always writes version `00`. The only flag at that version is `sampled`,
/// which is set when the context is sampled or debug. Every byte written is
/// ASCII. Returns the number of bytes written.
pub fn write_traceparent_into(
    context: &TraceContext,
    buf: &mut [u8; TRACEPARENT_LENGTH],
) -> usize {
    buf[0] = b'0';
    buf[1] = b'0';
    buf[2] = b'-';
    write_hex_u64(buf, 3, context.trace_id_high);
    write_hex_u64(buf, 19, context.trace_id);
    buf[35] = b'-';
    write_hex_u64(buf, 36, context.span_id);
    buf[52] = b'-';
    buf[53] = b'0';
    buf[54] = if context.is_sampled() { b'1' } else { b'0' };
    TRACEPARENT_LENGTH
}

/// Write `context` as a `traceparent` header value.
#[must_use]
pub fn write_traceparent(context: &TraceContext) -> String {
    let mut buf = [0u8; TRACEPARENT_LENGTH];
    let length = write_traceparent_into(context, &mut buf);
    buf[..length].iter().copied().map(char::from).collect()
}

/// Like [`write_traceparent`], for carriers with byte-valued headers.
#[must_use]
pub fn write_traceparent_bytes(context: &TraceContext) -> Vec<u8> {
    let mut buf = [0u8; TRACEPARENT_LENGTH];
    let length = write_traceparent_into(context, &mut buf);
    buf[..length].to_vec()
}

/// Parse a complete `traceparent` header value.
///
/// # Errors
///
/// Returns the first rule the input breaks. No partial context is returned.
pub fn parse_traceparent(value: &str) -> TraceContextResult<TraceContext> {
    parse_bytes(value.as_bytes())
}

/// Parse a `traceparent` formatted region of a larger string, such as a value
/// inside `tracestate`, without copying it.
///
/// `begin` is inclusive and `end` exclusive.
///
/// # Errors
///
/// Returns [`TraceContextError::InvalidRange`] when the offsets fall outside
/// `value`, otherwise the first rule the region breaks.
pub fn parse_traceparent_range(
    value: &str,
    begin: usize,
    end: usize,
) -> TraceContextResult<TraceContext> {
    let region = value
        .as_bytes()
        .get(begin..end)
        .ok_or(TraceContextError::InvalidRange {
            begin,
            end,
            length: value.len(),
        })?;
    parse_bytes(region)
}

fn parse_bytes(input: &[u8]) -> TraceContextResult<TraceContext> {
    let length = input.len();
    if length == 0 {
        return Err(TraceContextError::Empty);
    }

    let mut context = TraceContext::default();
    let mut version = 0u64;
    let mut trace_id_high_zero = false;

    let mut field = Field::Version;
    let mut field_length = 0usize;
    // Hex accumulator for the current field
    let mut buffer = 0u64;

    // Visits pos == length so the last field closes inside the loop.
    for pos in 0..=length {
        let is_eof = pos == length;
        let c = if is_eof { b'-' } else { input[pos] };

        if c == b'-' {
            validate_field_length(field, field_length)?;

            match field {
                Field::Version => {
                    version = buffer;
                    if version == VERSION_RESERVED {
                        return Err(TraceContextError::ReservedVersion(field));
                    }
                    if version == 0 && length > TRACEPARENT_LENGTH {
                        return Err(TraceContextError::TooLong);
                    }
                    field = Field::TraceId;
                }
                Field::TraceId => {
                    if trace_id_high_zero && buffer == 0 {
                        return Err(TraceContextError::AllZeros(field));
                    }
                    context.trace_id = buffer;
                    field = Field::ParentId;
                }
                Field::ParentId => {
                    if buffer == 0 {
                        return Err(TraceContextError::AllZeros(field));
                    }
                    context.span_id = buffer;
                    field = Field::TraceFlags;
                }
                Field::TraceFlags => {
                    context.sampled = Some(buffer & FLAG_SAMPLED == FLAG_SAMPLED);

                    // Later versions may define more flags and fields.
                    if version == 0 {
                        if buffer & !FLAG_SAMPLED != 0 {
                            return Err(TraceContextError::InvalidFlags(field));
                        }
                        if !is_eof {
                            return Err(TraceContextError::ExtraFields);
                        }
                    }
                    return Ok(context);
                }
            }

            buffer = 0;
            field_length = 0;
            continue;
        }

        // The 17th trace ID digit starts the low half.
        if field == Field::TraceId && field_length == 16 {
            trace_id_high_zero = buffer == 0;
            context.trace_id_high = buffer;
            buffer = 0;
        }

        field_length += 1;
        // Overlong fields fail on length at the next separator, before their
        // value is used.
        buffer <<= 4;
        buffer |= match c {
            b'0'..=b'9' => u64::from(c - b'0'),
            b'a'..=b'f' => u64::from(c - b'a' + 10),
            _ => return Err(TraceContextError::InvalidHex(field)),
        };
    }

    // Input ended before every field was seen.
    Err(TraceContextError::EmptyField(field))
}

fn validate_field_length(field: Field, length: usize) -> TraceContextResult<()> {
    let expected = field.width();
    if length == 0 {
        Err(TraceContextError::EmptyField(field))
    } else if length < expected {
        Err(TraceContextError::FieldTooShort(field))
    } else if length > expected {
        Err(TraceContextError::FieldTooLong(field))
    } else {
        Ok(())
    }
}
