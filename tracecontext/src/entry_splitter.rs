//! Splits a delimited list of key/value entries, such as `tracestate`,
//! without allocating.

use std::ops::Range;

use crate::error::{TraceContextError, TraceContextResult};

/// Configuration for splitting `k1=v1,k2=v2` style lists.
///
/// Entries are reported to a handler as byte ranges into the input, so
/// nothing is copied before the handler has validated them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntrySplitter {
    max_entries: usize,
    entry_separator: u8,
    key_value_separator: u8,
    trim_ows_around_entry_separator: bool,
    trim_ows_around_key_value_separator: bool,
}

impl Default for EntrySplitter {
    fn default() -> Self {
        Self {
            max_entries: usize::MAX,
            entry_separator: b',',
            key_value_separator: b'=',
            trim_ows_around_entry_separator: true,
            trim_ows_around_key_value_separator: true,
        }
    }
}

const fn is_ows(c: u8) -> bool {
    c == b' ' || c == b'\t'
}

impl EntrySplitter {
    /// Maximum number of non-empty entries.
    #[must_use]
    pub const fn max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Byte separating entries.
    #[must_use]
    pub const fn entry_separator(mut self, separator: u8) -> Self {
        self.entry_separator = separator;
        self
    }

    /// Byte separating a key from its value. Only the first one in an entry
    /// counts.
    #[must_use]
    pub const fn key_value_separator(mut self, separator: u8) -> Self {
        self.key_value_separator = separator;
        self
    }

    /// Whether spaces and tabs around the entry separator are dropped.
    #[must_use]
    pub const fn trim_ows_around_entry_separator(mut self, trim: bool) -> Self {
        self.trim_ows_around_entry_separator = trim;
        self
    }

    /// Whether spaces and tabs around the key/value separator are dropped.
    #[must_use]
    pub const fn trim_ows_around_key_value_separator(mut self, trim: bool) -> Self {
        self.trim_ows_around_key_value_separator = trim;
        self
    }

    /// Call `handler` with the key and value range of each entry, in order.
    ///
    /// Empty and whitespace-only entries are skipped and not counted. An
    /// entry without a key/value separator has an empty value range.
    ///
    /// # Errors
    ///
    /// Returns [`TraceContextError::TooManyEntries`] past the entry limit, or
    /// the first error the handler returns.
    pub fn split<F>(&self, input: &str, mut handler: F) -> TraceContextResult<()>
    where
        F: FnMut(&str, Range<usize>, Range<usize>) -> TraceContextResult<()>,
    {
        let bytes = input.as_bytes();
        let mut count = 0usize;
        let mut begin = 0usize;

        while begin <= bytes.len() {
            let end = bytes[begin..]
                .iter()
                .position(|&c| c == self.entry_separator)
                .map_or(bytes.len(), |i| begin + i);

            let (mut entry_begin, mut entry_end) = (begin, end);
            if self.trim_ows_around_entry_separator {
                while entry_begin < entry_end && is_ows(bytes[entry_begin]) {
                    entry_begin += 1;
                }
                while entry_end > entry_begin && is_ows(bytes[entry_end - 1]) {
                    entry_end -= 1;
                }
            }

            if entry_begin < entry_end {
                count += 1;
                if count > self.max_entries {
                    return Err(TraceContextError::TooManyEntries(self.max_entries));
                }
                let (key, value) = self.key_value(bytes, entry_begin, entry_end);
                handler(input, key, value)?;
            }

            begin = end + 1;
        }
        Ok(())
    }

    fn key_value(&self, bytes: &[u8], begin: usize, end: usize) -> (Range<usize>, Range<usize>) {
        let Some(offset) = bytes[begin..end]
            .iter()
            .position(|&c| c == self.key_value_separator)
        else {
            return (begin..end, end..end);
        };

        let (mut key_end, mut value_begin) = (begin + offset, begin + offset + 1);
        if self.trim_ows_around_key_value_separator {
            while key_end > begin && is_ows(bytes[key_end - 1]) {
                key_end -= 1;
            }
            while value_begin < end && is_ows(bytes[value_begin]) {
                value_begin += 1;
            }
        }
        (begin..key_end, value_begin..end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(splitter: EntrySplitter, input: &str) -> TraceContextResult<Vec<(String, String)>> {
        let mut entries = Vec::new();
        splitter.split(input, |buf, key, value| {
            entries.push((buf[key].to_string(), buf[value].to_string()));
            Ok(())
        })?;
        Ok(entries)
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_split_basic() {
        let entries = collect(EntrySplitter::default(), "a=1,b=2").unwrap();
        assert_eq!(entries, pairs(&[("a", "1"), ("b", "2")]));
    }

    #[test]
    fn test_split_trims_around_entry_separator() {
        let entries = collect(EntrySplitter::default(), " a=1 ,\tb=2\t").unwrap();
        assert_eq!(entries, pairs(&[("a", "1"), ("b", "2")]));
    }

    #[test]
    fn test_split_keeps_ows_around_key_value_separator_when_asked() {
        let splitter = EntrySplitter::default().trim_ows_around_key_value_separator(false);
        let entries = collect(splitter, "a = 1").unwrap();
        assert_eq!(entries, pairs(&[("a ", " 1")]));

        let entries = collect(EntrySplitter::default(), "a = 1").unwrap();
        assert_eq!(entries, pairs(&[("a", "1")]));
    }

    #[test]
    fn test_split_first_key_value_separator_wins() {
        let entries = collect(EntrySplitter::default(), "a=1=2").unwrap();
        assert_eq!(entries, pairs(&[("a", "1=2")]));
    }

    #[test]
    fn test_split_missing_key_value_separator() {
        let entries = collect(EntrySplitter::default(), "a").unwrap();
        assert_eq!(entries, pairs(&[("a", "")]));
    }

    #[test]
    fn test_split_skips_empty_entries() {
        let entries = collect(EntrySplitter::default(), ",a=1,, ,b=2,").unwrap();
        assert_eq!(entries, pairs(&[("a", "1"), ("b", "2")]));
        assert!(collect(EntrySplitter::default(), "").unwrap().is_empty());
        assert!(
            collect(EntrySplitter::default(), " \t ").unwrap().is_empty()
        );
    }

    #[test]
    fn test_split_max_entries() {
        let splitter = EntrySplitter::default().max_entries(2);
        assert!(collect(splitter, "a=1,b=2").is_ok());
        assert!(collect(splitter, "a=1,,b=2,").is_ok());

        let err = collect(splitter, "a=1,b=2,c=3").unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: over 2 entries");
    }

    #[test]
    fn test_split_custom_separators() {
        let splitter = EntrySplitter::default()
            .entry_separator(b';')
            .key_value_separator(b':');
        let entries = collect(splitter, "s:1;o:rum").unwrap();
        assert_eq!(entries, pairs(&[("s", "1"), ("o", "rum")]));
    }

    #[test]
    fn test_split_stops_on_handler_error() {
        let mut seen = 0;
        let result = EntrySplitter::default().split("a=1,b=2,c=3", |buf, key, _| {
            seen += 1;
            if &buf[key] == "b" {
                Err(TraceContextError::InvalidKeyChar)
            } else {
                Ok(())
            }
        });
        assert!(matches!(result, Err(TraceContextError::InvalidKeyChar)));
        assert_eq!(seen, 2);
    }
}
