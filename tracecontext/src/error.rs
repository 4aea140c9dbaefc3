//! Trace context error types using thiserror 2.0.
//!
//! Every rejection produced while reading `traceparent`, `tracestate` or the
//! embedded B3 entry has its own variant, so callers (and diagnostics) see the
//! exact rule that failed.

use std::fmt;

use thiserror::Error;

/// A fixed field of the `traceparent` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Two hex digit version
    Version,
    /// 32 hex digit trace ID
    TraceId,
    /// 16 hex digit span ID, which the W3C format names "parent ID"
    ParentId,
    /// Two hex digit flags
    TraceFlags,
}

impl Field {
    /// Exact width of the field at version `00`.
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::Version | Self::TraceFlags => 2,
            Self::TraceId => 32,
            Self::ParentId => 16,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Version => "version",
            Self::TraceId => "trace ID",
            Self::ParentId => "parent ID",
            Self::TraceFlags => "trace flags",
        })
    }
}

/// Broad classification of a [`TraceContextError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing header or empty input
    Structural,
    /// A field, key or value has the wrong size
    FieldLength,
    /// A character outside the allowed set
    Charset,
    /// Well-formed but meaningless or disallowed content
    Semantic,
    /// Invalid caller-supplied configuration
    Configuration,
}

/// Errors raised while parsing or configuring trace context propagation.
#[derive(Error, Debug)]
pub enum TraceContextError {
    /// Header value was empty
    #[error("Invalid input: empty")]
    Empty,

    /// Header was not present on the request
    #[error("Missing header: {0}")]
    MissingHeader(&'static str),

    /// Begin/end offsets do not describe a range of the input
    #[error("Invalid range: {begin}..{end} of input with length {length}")]
    InvalidRange {
        /// Inclusive begin offset
        begin: usize,
        /// Exclusive end offset
        end: usize,
        /// Length of the input
        length: usize,
    },

    /// A `traceparent` field had no characters
    #[error("Invalid input: empty {0}")]
    EmptyField(Field),

    /// A `traceparent` field was narrower than its width
    #[error("Invalid input: {0} is too short")]
    FieldTooShort(Field),

    /// A `traceparent` field was wider than its width
    #[error("Invalid input: {0} is too long")]
    FieldTooLong(Field),

    /// A version `00` header was longer than the canonical length
    #[error("Invalid input: too long")]
    TooLong,

    /// A `traceparent` field held something other than lower-hex
    #[error("Invalid input: only valid characters are lower-hex for {0}")]
    InvalidHex(Field),

    /// Version `ff` is reserved
    #[error("Invalid input: ff {0}")]
    ReservedVersion(Field),

    /// Trace ID or span ID decoded to zero
    #[error("Invalid input: read all zeros {0}")]
    AllZeros(Field),

    /// Flag bits other than `sampled` at version `00`
    #[error("Invalid input: only choices are 00 or 01 {0}")]
    InvalidFlags(Field),

    /// Data after the flags field at version `00`
    #[error("Invalid input: more than 3 fields exist")]
    ExtraFields,

    /// `tracestate` key had no characters
    #[error("Invalid key: empty")]
    EmptyKey,

    /// `tracestate` key longer than 256 characters
    #[error("Invalid key: too large")]
    KeyTooLarge,

    /// `tracestate` key did not start with a lowercase letter or digit
    #[error("Invalid key: must start with a-z 0-9")]
    InvalidKeyStart,

    /// `tracestate` key held a character outside its charset
    #[error("Invalid key: valid characters are: a-z 0-9 _ - * / @")]
    InvalidKeyChar,

    /// `tracestate` value had no characters
    #[error("Invalid value: empty")]
    EmptyValue,

    /// `tracestate` value longer than 256 characters
    #[error("Invalid value: too large")]
    ValueTooLarge,

    /// `tracestate` value ended in a space
    #[error("Invalid value: must end in a non-space character")]
    TrailingSpace,

    /// `tracestate` value held a character outside its charset
    #[error("Invalid value: valid characters are: ' ' to '~', except ',' and '='")]
    InvalidValueChar,

    /// List held more entries than allowed
    #[error("Invalid input: over {0} entries")]
    TooManyEntries(usize),

    /// The embedded B3 entry could not be decoded
    #[error("Invalid b3 single format: {0}")]
    InvalidSingleFormat(&'static str),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be deserialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for trace context operations.
pub type TraceContextResult<T> = Result<T, TraceContextError>;

impl TraceContextError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Empty | Self::MissingHeader(_) | Self::InvalidRange { .. } => {
                ErrorKind::Structural
            }
            Self::EmptyField(_)
            | Self::FieldTooShort(_)
            | Self::FieldTooLong(_)
            | Self::TooLong
            | Self::EmptyKey
            | Self::KeyTooLarge
            | Self::EmptyValue
            | Self::ValueTooLarge => ErrorKind::FieldLength,
            Self::InvalidHex(_)
            | Self::InvalidKeyStart
            | Self::InvalidKeyChar
            | Self::TrailingSpace
            | Self::InvalidValueChar => ErrorKind::Charset,
            Self::ReservedVersion(_)
            | Self::AllZeros(_)
            | Self::InvalidFlags(_)
            | Self::ExtraFields
            | Self::TooManyEntries(_)
            | Self::InvalidSingleFormat(_) => ErrorKind::Semantic,
            Self::InvalidConfig(_) | Self::Serialization(_) => ErrorKind::Configuration,
        }
    }

    /// Create an invalid configuration error with the given message.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
