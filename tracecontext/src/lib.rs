//! W3C Trace Context propagation.
//!
//! Reads and writes the `traceparent` and `tracestate` headers, carrying a
//! B3 single format entry inside `tracestate` and passing every other
//! system's entries through untouched.
//!
//! ```
//! use std::collections::HashMap;
//! use tracecontext::TraceContextPropagation;
//!
//! let propagation: TraceContextPropagation = TraceContextPropagation::default();
//! let mut request = HashMap::new();
//! request.insert(
//!     "traceparent".to_string(),
//!     "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01".to_string(),
//! );
//! request.insert("tracestate".to_string(), "congo=t61rcWkgMzE".to_string());
//!
//! let context = propagation.extract(&request).unwrap();
//! assert!(context.is_sampled());
//!
//! let mut outgoing: HashMap<String, String> = HashMap::new();
//! propagation.inject(&context, &mut outgoing);
//! assert_eq!(
//!     outgoing["tracestate"],
//!     "b3=0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-1,congo=t61rcWkgMzE"
//! );
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod b3;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod entry_splitter;
pub mod error;
pub mod header;
pub mod propagation;
pub mod state;
pub mod traceparent;
pub mod tracestate;

pub use b3::{B3SingleFormat, SingleFormat};
pub use config::PropagationConfig;
pub use context::TraceContext;
pub use diagnostics::{DiagnosticsConfig, ValidationMode, init_diagnostics};
pub use error::{ErrorKind, Field, TraceContextError, TraceContextResult};
pub use header::{HeaderGetter, HeaderSetter, TRACEPARENT, TRACESTATE};
pub use propagation::{PropagationBuilder, TraceContextPropagation};
pub use state::Tracestate;
pub use traceparent::{parse_traceparent, write_traceparent};
pub use tracestate::{TracestateFormat, validate_key, validate_value};
