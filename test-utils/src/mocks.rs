//! Mock carriers and log capture for testing.

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, PoisonError};

use tracecontext::{HeaderGetter, HeaderSetter};
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::Registry;

/// Header carrier that counts every read and write.
#[derive(Debug, Default)]
pub struct MockCarrier {
    headers: HashMap<String, String>,
    gets: Cell<usize>,
    puts: usize,
}

impl MockCarrier {
    /// Create an empty carrier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a carrier holding `headers`.
    #[must_use]
    pub fn with_headers(headers: HashMap<String, String>) -> Self {
        Self {
            headers,
            ..Self::default()
        }
    }

    /// Number of header reads so far.
    #[must_use]
    pub fn get_count(&self) -> usize {
        self.gets.get()
    }

    /// Number of header writes so far.
    #[must_use]
    pub const fn put_count(&self) -> usize {
        self.puts
    }

    /// Current headers.
    #[must_use]
    pub const fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }
}

impl HeaderGetter for MockCarrier {
    fn get(&self, name: &str) -> Option<&str> {
        self.gets.set(self.gets.get() + 1);
        self.headers.get(name).map(String::as_str)
    }
}

impl HeaderSetter for MockCarrier {
    fn put(&mut self, name: &str, value: String) {
        self.puts += 1;
        self.headers.insert(name.to_string(), value);
    }
}

/// A captured log event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedEvent {
    /// Event target
    pub target: String,
    /// Event level
    pub level: tracing::Level,
    /// Formatted message
    pub message: String,
}

/// Layer recording every event it sees.
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl LogCapture {
    /// Create an empty capture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages of the events recorded for `target`.
    #[must_use]
    pub fn messages_for(&self, target: &str) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|event| event.target == target)
            .map(|event| event.message)
            .collect()
    }

    /// Run `f` with this capture as the thread's default subscriber.
    pub fn run<T>(&self, f: impl FnOnce() -> T) -> T {
        let subscriber = Registry::default().with(self.clone());
        tracing::subscriber::with_default(subscriber, f)
    }
}

struct MessageVisitor<'a>(&'a mut String);

impl Visit for MessageVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            self.0.push_str(&format!("{value:?}"));
        }
    }
}

impl<S: tracing::Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut message = String::new();
        event.record(&mut MessageVisitor(&mut message));
        let metadata = event.metadata();
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(CapturedEvent {
                target: metadata.target().to_string(),
                level: *metadata.level(),
                message,
            });
    }
}
