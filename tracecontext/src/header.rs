//! Access to request headers.
//!
//! The propagation reads and writes headers through these traits so it works
//! with any request type. Case-insensitive lookup, when the transport needs
//! it, is up to the implementation.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Header carrying version, trace ID, span ID and flags.
pub const TRACEPARENT: &str = "traceparent";

/// Header carrying system-specific entries.
pub const TRACESTATE: &str = "tracestate";

/// Reads a header from a request.
pub trait HeaderGetter {
    /// Value of header `name`, if present.
    fn get(&self, name: &str) -> Option<&str>;
}

/// Writes a header to a request.
pub trait HeaderSetter {
    /// Set header `name` to `value`, replacing any previous value.
    fn put(&mut self, name: &str, value: String);
}

impl<S: BuildHasher> HeaderGetter for HashMap<String, String, S> {
    fn get(&self, name: &str) -> Option<&str> {
        Self::get(self, name).map(String::as_str)
    }
}

impl<S: BuildHasher> HeaderSetter for HashMap<String, String, S> {
    fn put(&mut self, name: &str, value: String) {
        self.insert(name.to_string(), value);
    }
}

impl HeaderGetter for BTreeMap<String, String> {
    fn get(&self, name: &str) -> Option<&str> {
        Self::get(self, name).map(String::as_str)
    }
}

impl HeaderSetter for BTreeMap<String, String> {
    fn put(&mut self, name: &str, value: String) {
        self.insert(name.to_string(), value);
    }
}

impl<T: HeaderGetter + ?Sized> HeaderGetter for &T {
    fn get(&self, name: &str) -> Option<&str> {
        (**self).get(name)
    }
}
