//! Parent trace context extraction from HTTP headers.

use opentelemetry::{Context, global, propagation::Extractor, trace::TraceContextExt as _};
use salvo::http::{HeaderMap, HeaderName};

/// Remote parent carried by `traceparent`, if it names a valid span.
pub(super) fn extract_parent_context(headers: &HeaderMap) -> Option<Context> {
    let carrier = RequestHeaders(headers);

    global::get_text_map_propagator(|propagator| {
        // Fresh base so requests without trace headers start a new trace.
        let context = propagator.extract_with_context(&Context::new(), &carrier);
        let valid = context.span().span_context().is_valid();

        valid.then_some(context)
    })
}

#[derive(Debug)]
struct RequestHeaders<'a>(&'a HeaderMap);

impl Extractor for RequestHeaders<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(HeaderName::as_str).collect()
    }
}
