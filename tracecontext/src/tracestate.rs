//! `tracestate` header validation and lookup of this system's entry.
//!
//! See <https://www.w3.org/TR/trace-context-1/#tracestate-header>. The W3C
//! document calls an entry a "list member" and its key a "vendor"; this
//! module says entry and key.

use crate::entry_splitter::EntrySplitter;
use crate::error::{TraceContextError, TraceContextResult};

/// Key this system uses inside `tracestate` unless configured otherwise.
pub const DEFAULT_TRACESTATE_KEY: &str = "b3";

/// <https://www.w3.org/TR/trace-context-1/#list>
pub const MAX_ENTRIES: usize = 32;

const MAX_KEY_LENGTH: usize = 256;
const MAX_VALUE_LENGTH: usize = 256;

// Lookup tables indexed by byte, sized to the last valid character so a
// bounds check rejects everything above it.
const LAST_VALID_KEY_CHAR: u8 = b'z';
const LAST_VALID_VALUE_CHAR: u8 = b'~';

static VALID_KEY_CHARS: [bool; LAST_VALID_KEY_CHAR as usize + 1] = key_table();
static VALID_VALUE_CHARS: [bool; LAST_VALID_VALUE_CHAR as usize + 1] = value_table();

const fn is_letter_or_number(c: u8) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}

const fn is_valid_key_char(c: u8) -> bool {
    is_letter_or_number(c) || matches!(c, b'@' | b'_' | b'-' | b'*' | b'/')
}

const fn is_valid_value_char(c: u8) -> bool {
    c >= b' ' && c <= b'~' && c != b',' && c != b'='
}

const fn key_table() -> [bool; LAST_VALID_KEY_CHAR as usize + 1] {
    let mut table = [false; LAST_VALID_KEY_CHAR as usize + 1];
    let mut c = 0;
    while c < table.len() {
        table[c] = is_valid_key_char(c as u8);
        c += 1;
    }
    table
}

const fn value_table() -> [bool; LAST_VALID_VALUE_CHAR as usize + 1] {
    let mut table = [false; LAST_VALID_VALUE_CHAR as usize + 1];
    let mut c = 0;
    while c < table.len() {
        table[c] = is_valid_value_char(c as u8);
        c += 1;
    }
    table
}

/// Validate a `tracestate` key.
///
/// Keys are 1-256 characters of `a-z 0-9 _ - * / @` starting with `a-z` or
/// `0-9`, which admits the multi-tenant form `{tenant}@{system}`.
///
/// # Errors
///
/// Returns the rule the key breaks.
pub fn validate_key(key: &str) -> TraceContextResult<()> {
    let bytes = key.as_bytes();
    let Some(&first) = bytes.first() else {
        return Err(TraceContextError::EmptyKey);
    };
    if bytes.len() > MAX_KEY_LENGTH {
        return Err(TraceContextError::KeyTooLarge);
    }
    if !is_letter_or_number(first) {
        return Err(TraceContextError::InvalidKeyStart);
    }
    for &c in &bytes[1..] {
        if c > LAST_VALID_KEY_CHAR || !VALID_KEY_CHARS[c as usize] {
            return Err(TraceContextError::InvalidKeyChar);
        }
    }
    Ok(())
}

/// Validate a `tracestate` value.
///
/// Values are 1-256 characters from `' '` to `'~'` except `,` and `=`, and
/// must not end in a space. Leading spaces are part of the value, so `"  a"`
/// and `" a"` differ (w3c/trace-context#411).
///
/// # Errors
///
/// Returns the rule the value breaks.
pub fn validate_value(value: &str) -> TraceContextResult<()> {
    let bytes = value.as_bytes();
    let Some(&last) = bytes.last() else {
        return Err(TraceContextError::EmptyValue);
    };
    if bytes.len() > MAX_VALUE_LENGTH {
        return Err(TraceContextError::ValueTooLarge);
    }
    if last == b' ' {
        return Err(TraceContextError::TrailingSpace);
    }
    for &c in bytes {
        if c > LAST_VALID_VALUE_CHAR || !VALID_VALUE_CHARS[c as usize] {
            return Err(TraceContextError::InvalidValueChar);
        }
    }
    Ok(())
}

/// Byte offsets of this system's entry inside a `tracestate` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchedEntry {
    /// Inclusive begin of the key
    pub key_begin: usize,
    /// Exclusive end of the key
    pub key_end: usize,
    /// Inclusive begin of the value
    pub value_begin: usize,
    /// Exclusive end of the value
    pub value_end: usize,
}

/// Offsets recorded by one [`TracestateFormat::parse_into`] scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryPositions {
    /// End of the last entry before the match, `None` when the match is first
    pub before_end: Option<usize>,
    /// First entry with this system's key
    pub matched: Option<MatchedEntry>,
    /// Begin of the first entry after the match
    pub after_begin: Option<usize>,
}

/// Parses `tracestate` and locates the entry owned by this system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracestateFormat {
    this_key: String,
    splitter: EntrySplitter,
}

impl Default for TracestateFormat {
    fn default() -> Self {
        Self::new(DEFAULT_TRACESTATE_KEY)
    }
}

impl TracestateFormat {
    /// Create a format that looks for `this_key`. The key is not validated
    /// here; see [`validate_key`].
    #[must_use]
    pub fn new(this_key: impl Into<String>) -> Self {
        Self {
            this_key: this_key.into(),
            splitter: EntrySplitter::default()
                .max_entries(MAX_ENTRIES)
                .entry_separator(b',')
                .trim_ows_around_entry_separator(true)
                .key_value_separator(b'=')
                // w3c/trace-context#411
                .trim_ows_around_key_value_separator(false),
        }
    }

    /// Key of this system's entry.
    #[must_use]
    pub fn this_key(&self) -> &str {
        &self.this_key
    }

    /// Validate every entry and record where this system's entry is, in one
    /// pass.
    ///
    /// Only the first entry with this system's key is matched. Later
    /// duplicates are treated like any other entry: they stay in the retained
    /// entries and are sent again behind this system's new entry, so an
    /// outgoing header built from such input repeats the key.
    ///
    /// # Errors
    ///
    /// Returns the first rule any entry breaks. A header with one bad entry
    /// is rejected as a whole.
    pub fn parse_into(&self, tracestate: &str) -> TraceContextResult<EntryPositions> {
        let mut positions = EntryPositions::default();
        self.splitter.split(tracestate, |buf, key, value| {
            validate_key(&buf[key.clone()])?;
            validate_value(&buf[value.clone()])?;

            if positions.matched.is_none() {
                if buf[key.clone()] == *self.this_key {
                    positions.matched = Some(MatchedEntry {
                        key_begin: key.start,
                        key_end: key.end,
                        value_begin: value.start,
                        value_end: value.end,
                    });
                } else {
                    positions.before_end = Some(value.end);
                }
            } else if positions.after_begin.is_none() {
                positions.after_begin = Some(key.start);
            }
            Ok(())
        })?;
        Ok(positions)
    }

    /// Validate every entry and return them as `(key, value)` pairs.
    ///
    /// # Errors
    ///
    /// Returns the first rule any entry breaks.
    pub fn entries<'a>(&self, tracestate: &'a str) -> TraceContextResult<Vec<(&'a str, &'a str)>> {
        let mut entries = Vec::new();
        self.splitter.split(tracestate, |_, key, value| {
            let (key, value) = (&tracestate[key], &tracestate[value]);
            validate_key(key)?;
            validate_value(value)?;
            entries.push((key, value));
            Ok(())
        })?;
        Ok(entries)
    }
}
