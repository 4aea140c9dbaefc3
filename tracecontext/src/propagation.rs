//! Reads and writes a trace context as `traceparent` and `tracestate`, with
//! B3 carried as this system's `tracestate` entry.

use crate::b3::{B3SingleFormat, SingleFormat};
use crate::config::PropagationConfig;
use crate::context::TraceContext;
use crate::diagnostics::ValidationMode;
use crate::error::{TraceContextError, TraceContextResult};
use crate::header::{HeaderGetter, HeaderSetter, TRACEPARENT, TRACESTATE};
use crate::state::Tracestate;
use crate::traceparent::{parse_traceparent, write_traceparent};
use crate::tracestate::{DEFAULT_TRACESTATE_KEY, TracestateFormat, validate_key};

/// W3C Trace Context propagation.
///
/// Immutable once built, so one instance can serve every request
/// concurrently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceContextPropagation<F = B3SingleFormat> {
    tracestate_format: TracestateFormat,
    single_format: F,
}

impl Default for TraceContextPropagation {
    fn default() -> Self {
        PropagationBuilder::default().build()
    }
}

impl TraceContextPropagation {
    /// Start building a propagation.
    #[must_use]
    pub fn builder() -> PropagationBuilder {
        PropagationBuilder::default()
    }

    /// Build a propagation from configuration.
    ///
    /// # Errors
    ///
    /// Returns the key rule the configured `tracestate` key breaks.
    pub fn from_config(config: &PropagationConfig) -> TraceContextResult<Self> {
        Ok(Self::builder()
            .tracestate_key(config.tracestate_key.as_str())?
            .build())
    }
}

impl<F: SingleFormat> TraceContextPropagation<F> {
    /// Headers this propagation reads and writes.
    #[must_use]
    pub const fn keys() -> [&'static str; 2] {
        [TRACEPARENT, TRACESTATE]
    }

    /// Key of this system's `tracestate` entry.
    #[must_use]
    pub fn tracestate_key(&self) -> &str {
        self.tracestate_format.this_key()
    }

    /// Extract a trace context, discarding malformed headers.
    ///
    /// `None` means the request starts a new trace. Rejections are reported
    /// through [`crate::diagnostics::reject`].
    #[must_use]
    pub fn extract<R: HeaderGetter + ?Sized>(&self, request: &R) -> Option<TraceContext> {
        ValidationMode::Lenient
            .check(self.try_extract(request))
            .ok()
            .flatten()
    }

    /// Extract a trace context, returning why the headers were rejected.
    ///
    /// Both headers must be present and `traceparent` must be valid before
    /// `tracestate` is read. A malformed `tracestate` discards both headers.
    /// When `tracestate` holds this system's entry, the context is decoded
    /// from that entry instead of `traceparent`.
    ///
    /// # Errors
    ///
    /// Returns the first rule the headers break.
    pub fn try_extract<R: HeaderGetter + ?Sized>(
        &self,
        request: &R,
    ) -> TraceContextResult<TraceContext> {
        let traceparent = request
            .get(TRACEPARENT)
            .ok_or(TraceContextError::MissingHeader(TRACEPARENT))?;
        let tracestate = request
            .get(TRACESTATE)
            .ok_or(TraceContextError::MissingHeader(TRACESTATE))?;

        // https://www.w3.org/TR/trace-context-1/#tracestate-header
        // tracestate is never parsed when traceparent is invalid.
        let upstream = parse_traceparent(traceparent)?;
        let positions = self.tracestate_format.parse_into(tracestate)?;

        if let Some(matched) = positions.matched {
            let mut context = self
                .single_format
                .decode(tracestate, matched.value_begin..matched.value_end)?;
            context.tracestate = Some(Tracestate::without_entry(tracestate, &positions));
            return Ok(context);
        }

        // No entry of ours, so before_end is only set when there are entries.
        let other_state = if positions.before_end.is_some() {
            Tracestate::create(tracestate)
        } else {
            Tracestate::EMPTY
        };
        Ok(upstream.with_tracestate(other_state))
    }

    /// Write `context` as `traceparent` and `tracestate`.
    ///
    /// This system's entry is always first in `tracestate`, followed by the
    /// entries retained at extraction.
    pub fn inject<R: HeaderSetter + ?Sized>(&self, context: &TraceContext, request: &mut R) {
        request.put(TRACEPARENT, write_traceparent(context));

        let this_key = self.tracestate_key();
        let this_value = self.single_format.encode(context);
        let tracestate = match &context.tracestate {
            Some(tracestate) => tracestate.state_string(this_key, &this_value),
            None => Tracestate::EMPTY.state_string(this_key, &this_value),
        };
        request.put(TRACESTATE, tracestate);
    }
}

/// Builder for [`TraceContextPropagation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropagationBuilder {
    tracestate_key: String,
}

impl Default for PropagationBuilder {
    fn default() -> Self {
        Self {
            tracestate_key: DEFAULT_TRACESTATE_KEY.to_string(),
        }
    }
}

impl PropagationBuilder {
    /// Key of this system's entry inside `tracestate`. Defaults to `b3`.
    ///
    /// # Errors
    ///
    /// Returns the rule the key breaks, see [`validate_key`].
    pub fn tracestate_key(mut self, key: impl Into<String>) -> TraceContextResult<Self> {
        let key = key.into();
        ValidationMode::Strict.check(validate_key(&key))?;
        self.tracestate_key = key;
        Ok(self)
    }

    /// Build with the B3 single format.
    #[must_use]
    pub fn build(self) -> TraceContextPropagation {
        self.build_with(B3SingleFormat)
    }

    /// Build with a custom format for this system's `tracestate` entry.
    #[must_use]
    pub fn build_with<F: SingleFormat>(self, single_format: F) -> TraceContextPropagation<F> {
        TraceContextPropagation {
            tracestate_format: TracestateFormat::new(self.tracestate_key),
            single_format,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::ops::Range;

    use super::*;
    use crate::diagnostics::tests::capture;

    const TRACEPARENT_VALUE: &str = "00-67891233abcdef012345678912345678-463ac35c9f6413ad-01";
    const B3_VALUE: &str = "67891233abcdef012345678912345678-463ac35c9f6413ad-1";
    const OTHER_STATE: &str = "congo=t61rcWkgMzE";

    fn propagation() -> TraceContextPropagation {
        TraceContextPropagation::default()
    }

    fn sampled_context() -> TraceContext {
        TraceContext::new(
            0x6789_1233_abcd_ef01,
            0x2345_6789_1234_5678,
            0x463a_c35c_9f64_13ad,
        )
        .with_sampled(true)
    }

    fn request(traceparent: &str, tracestate: &str) -> HashMap<String, String> {
        HashMap::from([
            (TRACEPARENT.to_string(), traceparent.to_string()),
            (TRACESTATE.to_string(), tracestate.to_string()),
        ])
    }

    fn assert_extracted(extracted: Option<TraceContext>, other_state: Option<&str>) {
        let extracted = extracted.unwrap();
        let tracestate = extracted.tracestate.clone().unwrap();
        assert_eq!(
            extracted.with_tracestate(Tracestate::EMPTY),
            sampled_context().with_tracestate(Tracestate::EMPTY)
        );
        assert_eq!(tracestate.other_state(), other_state);
    }

    #[test]
    fn test_injects_b3_when_no_other_tracestate() {
        let mut headers: HashMap<String, String> = HashMap::new();
        propagation().inject(&sampled_context(), &mut headers);

        assert_eq!(headers[TRACEPARENT], TRACEPARENT_VALUE);
        assert_eq!(headers[TRACESTATE], format!("b3={B3_VALUE}"));
    }

    #[test]
    fn test_injects_b3_before_other_tracestate() {
        let context = sampled_context().with_tracestate(Tracestate::create(OTHER_STATE));
        let mut headers: HashMap<String, String> = HashMap::new();
        propagation().inject(&context, &mut headers);

        assert_eq!(headers[TRACEPARENT], TRACEPARENT_VALUE);
        assert_eq!(headers[TRACESTATE], format!("b3={B3_VALUE},{OTHER_STATE}"));
    }

    #[test]
    fn test_extracts_b3_when_no_other_tracestate() {
        let headers = request(TRACEPARENT_VALUE, &format!("b3={B3_VALUE}"));
        assert_extracted(propagation().extract(&headers), None);
    }

    #[test]
    fn test_extracts_b3_before_and_after_other_tracestate() {
        let propagation = propagation();

        let headers = request(TRACEPARENT_VALUE, &format!("b3={B3_VALUE},{OTHER_STATE}"));
        assert_extracted(propagation.extract(&headers), Some(OTHER_STATE));

        let headers = request(TRACEPARENT_VALUE, &format!("{OTHER_STATE},b3={B3_VALUE}"));
        assert_extracted(propagation.extract(&headers), Some(OTHER_STATE));
    }

    #[test]
    fn test_extracts_b3_between_other_tracestate_with_spaces() {
        let tracestate = format!("app_id=1, b3={B3_VALUE}, {OTHER_STATE}");
        let headers = request(TRACEPARENT_VALUE, &tracestate);
        assert_extracted(
            propagation().extract(&headers),
            Some("app_id=1,congo=t61rcWkgMzE"),
        );
    }

    #[test]
    fn test_b3_entry_takes_priority_over_traceparent() {
        let headers = request(
            "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-00",
            "b3=2345678912345678-463ac35c9f6413ad-d",
        );
        let extracted = propagation().extract(&headers).unwrap();
        assert_eq!(extracted.trace_id_high, 0);
        assert_eq!(extracted.trace_id, 0x2345_6789_1234_5678);
        assert_eq!(extracted.span_id, 0x463a_c35c_9f64_13ad);
        assert!(extracted.debug);
    }

    #[test]
    fn test_later_duplicate_entry_is_passed_through() {
        let duplicate = "b3=0000000000000001-0000000000000002";
        let headers = request(TRACEPARENT_VALUE, &format!("b3={B3_VALUE},{duplicate}"));
        let extracted = propagation().extract(&headers);
        let context = extracted.clone().unwrap();
        assert_extracted(extracted, Some(duplicate));

        let mut out: HashMap<String, String> = HashMap::new();
        propagation().inject(&context, &mut out);
        assert_eq!(out[TRACESTATE], format!("b3={B3_VALUE},{duplicate}"));
    }

    #[test]
    fn test_extracts_traceparent_without_b3_entry() {
        let headers = request(TRACEPARENT_VALUE, OTHER_STATE);
        assert_extracted(propagation().extract(&headers), Some(OTHER_STATE));
    }

    #[test]
    fn test_extracts_traceparent_with_empty_tracestate() {
        let propagation = propagation();
        for tracestate in ["", " ", ",,"] {
            let headers = request(TRACEPARENT_VALUE, tracestate);
            assert_extracted(propagation.extract(&headers), None);
        }
    }

    #[test]
    fn test_requires_both_headers() {
        let propagation = propagation();
        let mut headers = request(TRACEPARENT_VALUE, OTHER_STATE);
        headers.remove(TRACESTATE);
        assert!(matches!(
            propagation.try_extract(&headers),
            Err(TraceContextError::MissingHeader("tracestate"))
        ));

        let mut headers = request(TRACEPARENT_VALUE, OTHER_STATE);
        headers.remove(TRACEPARENT);
        assert_eq!(propagation.extract(&headers), None);
    }

    #[test]
    fn test_malformed_tracestate_discards_traceparent() {
        let propagation = propagation();
        let headers = request(TRACEPARENT_VALUE, "congo=t61rcWkgMzE,Rojo=1");
        assert_eq!(propagation.extract(&headers), None);

        let headers = request(TRACEPARENT_VALUE, &format!("b3={}", &B3_VALUE[..20]));
        assert_eq!(propagation.extract(&headers), None);
    }

    #[test]
    fn test_extract_reports_rejection_once() {
        let traceparent = "00-00000000000000000000000000000000-463ac35c9f6413ad-01";
        let headers = request(traceparent, OTHER_STATE);
        let (extracted, logged) = capture(|| propagation().extract(&headers));
        assert_eq!(extracted, None);
        assert_eq!(
            logged,
            vec!["Invalid input: read all zeros trace ID".to_string()]
        );
    }

    struct CountingRequest {
        headers: HashMap<String, String>,
        gets: Cell<usize>,
    }

    impl HeaderGetter for CountingRequest {
        fn get(&self, name: &str) -> Option<&str> {
            self.gets.set(self.gets.get() + 1);
            self.headers.get(name).map(String::as_str)
        }
    }

    #[test]
    fn test_reads_each_header_once() {
        let request = CountingRequest {
            headers: request(TRACEPARENT_VALUE, &format!("b3={B3_VALUE},{OTHER_STATE}")),
            gets: Cell::new(0),
        };
        assert!(propagation().extract(&request).is_some());
        assert_eq!(request.gets.get(), 2);
    }

    #[test]
    fn test_custom_tracestate_key() {
        let propagation = TraceContextPropagation::builder()
            .tracestate_key("1@zipkin")
            .unwrap()
            .build();
        assert_eq!(propagation.tracestate_key(), "1@zipkin");

        let headers = request(TRACEPARENT_VALUE, &format!("b3=x,1@zipkin={B3_VALUE}"));
        assert_extracted(propagation.extract(&headers), Some("b3=x"));

        let mut out: HashMap<String, String> = HashMap::new();
        propagation.inject(&sampled_context(), &mut out);
        assert_eq!(out[TRACESTATE], format!("1@zipkin={B3_VALUE}"));
    }

    #[test]
    fn test_invalid_tracestate_key_is_raised() {
        let (result, logged) = capture(|| TraceContextPropagation::builder().tracestate_key("B3"));
        assert_eq!(
            result.unwrap_err().to_string(),
            "Invalid key: must start with a-z 0-9"
        );
        assert_eq!(
            logged,
            vec!["Invalid key: must start with a-z 0-9".to_string()]
        );

        let config = PropagationConfig::new("");
        assert!(matches!(
            TraceContextPropagation::from_config(&config),
            Err(TraceContextError::EmptyKey)
        ));
    }

    #[test]
    fn test_keys() {
        assert_eq!(
            TraceContextPropagation::<B3SingleFormat>::keys(),
            ["traceparent", "tracestate"]
        );
    }

    struct FixedFormat;

    impl SingleFormat for FixedFormat {
        fn encode(&self, _context: &TraceContext) -> String {
            "fixed".to_string()
        }

        fn decode(&self, value: &str, range: Range<usize>) -> TraceContextResult<TraceContext> {
            if &value[range] == "fixed" {
                Ok(TraceContext::new(0, 1, 2))
            } else {
                Err(TraceContextError::InvalidSingleFormat("not fixed"))
            }
        }
    }

    #[test]
    fn test_custom_single_format() {
        let propagation = PropagationBuilder::default().build_with(FixedFormat);
        let headers = request(TRACEPARENT_VALUE, "b3=fixed,congo=1");
        let extracted = propagation.extract(&headers).unwrap();
        assert_eq!((extracted.trace_id, extracted.span_id), (1, 2));

        let mut out: HashMap<String, String> = HashMap::new();
        propagation.inject(&extracted, &mut out);
        assert_eq!(out[TRACESTATE], "b3=fixed,congo=1");
    }
}
