//! `tracestate` entries retained across a hop.

use std::fmt;
use std::sync::Arc;

use crate::tracestate::EntryPositions;

/// The serialized `tracestate` entries that belong to other systems.
///
/// Those entries are passed through byte for byte: they are never parsed
/// into a structure and re-serialized.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tracestate {
    other_state: Option<Arc<str>>,
}

impl Tracestate {
    /// No retained entries.
    pub const EMPTY: Self = Self { other_state: None };

    /// Retain `other_state`, treating an empty string as no entries.
    #[must_use]
    pub fn create(other_state: &str) -> Self {
        if other_state.is_empty() {
            Self::EMPTY
        } else {
            Self {
                other_state: Some(Arc::from(other_state)),
            }
        }
    }

    /// Retain everything in `tracestate` except the matched entry, joining
    /// what surrounded it with a single `,`.
    ///
    /// Entries on either side keep their original bytes, including any
    /// whitespace between them. Whitespace next to the removed entry is
    /// dropped.
    #[must_use]
    pub fn without_entry(tracestate: &str, positions: &EntryPositions) -> Self {
        match (positions.before_end, positions.after_begin) {
            (None, None) => Self::EMPTY,
            (Some(before_end), None) => Self::create(&tracestate[..before_end]),
            (None, Some(after_begin)) => Self::create(&tracestate[after_begin..]),
            (Some(before_end), Some(after_begin)) => {
                let (before, after) = (&tracestate[..before_end], &tracestate[after_begin..]);
                let mut joined = String::with_capacity(before.len() + 1 + after.len());
                joined.push_str(before);
                joined.push(',');
                joined.push_str(after);
                Self::create(&joined)
            }
        }
    }

    /// Retained entries, if any.
    #[must_use]
    pub fn other_state(&self) -> Option<&str> {
        self.other_state.as_deref()
    }

    /// Build an outgoing `tracestate` value with this system's entry first.
    ///
    /// Nothing is validated: the key was validated at configuration time and
    /// the retained entries when they were received.
    #[must_use]
    pub fn state_string(&self, this_key: &str, this_value: &str) -> String {
        let mut length = this_key.len() + 1 + this_value.len();
        if let Some(other) = &self.other_state {
            length += 1 + other.len();
        }

        // TODO: drop trailing entries past the 512 character limit suggested by
        // https://www.w3.org/TR/trace-context-1/#tracestate-limits
        let mut result = String::with_capacity(length);
        result.push_str(this_key);
        result.push('=');
        result.push_str(this_value);
        if let Some(other) = &self.other_state {
            result.push(',');
            result.push_str(other);
        }
        result
    }
}

impl fmt::Display for Tracestate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.other_state {
            Some(other) => write!(f, "Tracestate{{{other}}}"),
            None => f.write_str("Tracestate{}"),
        }
    }
}
