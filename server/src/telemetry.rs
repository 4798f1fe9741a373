//! Per-request accounting of calls to the hosted service.
//!
//! The service client wraps every outbound request in a `remote.call` span
//! tagged with `service = "auth"` or `service = "rest"`. A tracing layer tallies
//! those spans into a task-local [`RemoteCallTally`] that the counting
//! middleware installs for each request.

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc, LazyLock,
};
use tracing::{
    field::{Field, Visit},
    span::{Attributes, Id},
    Subscriber,
};
use tracing_subscriber::{layer::Context, registry::LookupSpan, Layer};

/// Span name used by the service client around every outbound call.
pub const REMOTE_CALL_SPAN: &str = "remote.call";

pub const REMOTE_CALL_COUNT_HEADER: &str = "X-Remote-Call-Count";

static EXPOSE_COUNT_HEADER: LazyLock<bool> = LazyLock::new(|| {
    std::env::var("TRACK_REMOTE_CALL_COUNT")
        .map(|v| v == "1")
        .unwrap_or(false)
});

/// Remote calls made while serving one request, split by service.
#[derive(Debug, Default)]
pub struct RemoteCallTally {
    auth: AtomicU32,
    rest: AtomicU32,
    other: AtomicU32,
}

impl RemoteCallTally {
    fn record(&self, service: Option<&str>) {
        let slot = match service {
            Some("auth") => &self.auth,
            Some("rest") => &self.rest,
            _ => &self.other,
        };
        slot.fetch_add(1, Ordering::Relaxed);
    }

    pub fn auth(&self) -> u32 {
        self.auth.load(Ordering::Relaxed)
    }

    pub fn rest(&self) -> u32 {
        self.rest.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u32 {
        self.auth() + self.rest() + self.other.load(Ordering::Relaxed)
    }
}

tokio::task_local! {
    static REMOTE_CALLS: Arc<RemoteCallTally>;
}

/// Total remote calls so far in the current request, if one is being tracked.
pub fn get_remote_call_count() -> Option<u32> {
    REMOTE_CALLS.try_with(|tally| tally.total()).ok()
}

#[derive(Default)]
struct ServiceField(Option<String>);

impl Visit for ServiceField {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "service" {
            self.0 = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "service" && self.0.is_none() {
            self.0 = Some(format!("{:?}", value).trim_matches('"').to_string());
        }
    }
}

/// Tallies `remote.call` spans into the request's [`RemoteCallTally`].
///
/// Spans opened from a spawned task (the health probe) have no tally in scope
/// and are ignored.
pub struct RemoteCallCountingLayer;

impl<S> Layer<S> for RemoteCallCountingLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
        if attrs.metadata().name() != REMOTE_CALL_SPAN {
            return;
        }

        let mut service = ServiceField::default();
        attrs.record(&mut service);
        let _ = REMOTE_CALLS.try_with(|tally| tally.record(service.0.as_deref()));
    }
}

/// Installs a fresh tally for the request.
///
/// Must be layered outside the TraceLayer so the tally covers the whole
/// request span.
pub async fn remote_call_counting_middleware(request: Request<Body>, next: Next) -> Response {
    let tally = Arc::new(RemoteCallTally::default());
    let response = REMOTE_CALLS
        .scope(tally.clone(), next.run(request))
        .await;

    if tally.total() > 0 {
        tracing::debug!(
            auth = tally.auth(),
            rest = tally.rest(),
            "remote calls for request"
        );
    }
    response
}

/// Adds the `X-Remote-Call-Count` header when `TRACK_REMOTE_CALL_COUNT=1`.
pub async fn remote_call_count_header_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    if *EXPOSE_COUNT_HEADER {
        if let Some(count) = get_remote_call_count() {
            response
                .headers_mut()
                .insert(REMOTE_CALL_COUNT_HEADER, HeaderValue::from(count));
        }
    }

    response
}
