//! Shared test utilities for tracecontext.
//!
//! This crate provides:
//! - Proptest generators for header values and contexts
//! - Mock carriers and a log capture layer
//! - Fixtures with the W3C sample headers

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod mocks;

pub use generators::*;
