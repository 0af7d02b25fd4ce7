//! HTTP entry point for a build's event stream
//!
//! Resolves the resume offset from `Last-Event-ID`, opens the build's cursor,
//! sets the stream headers, and hands the cursor to a pump task. Opening the
//! cursor is the last point where an error can still become a status code;
//! once headers are out, the body is the only channel to the client.

use std::convert::Infallible;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use bytes::Bytes;
use tokio::sync::mpsc;
use tower_http::compression::CompressionLayer;
use tower_http::compression::predicate::{And, NotForContentType, Predicate};
use tracing::{Instrument, debug, error};

use atc_core::BuildEvents;
use atc_logging::StreamContext;

use crate::pump;

/// Transport protocol version advertised to clients
pub const STREAM_VERSION: &str = "2.0";

/// Header carrying [`STREAM_VERSION`]
pub const STREAM_VERSION_HEADER: HeaderName = HeaderName::from_static("x-atc-stream-version");

/// Request header naming the last event the client received
pub const LAST_EVENT_ID: HeaderName = HeaderName::from_static("last-event-id");

/// Header disabling response buffering in nginx-style proxies
pub const ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream; charset=utf-8";
pub const NO_CACHE: &str = "no-cache, no-store, must-revalidate";

/// Default number of encoded events the pump may run ahead of the client
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1;

/// When to gzip a response: everything but gRPC and images
pub type StreamCompression = And<NotForContentType, NotForContentType>;

/// Gzip responses for clients sending `Accept-Encoding: gzip`
///
/// tower-http skips `text/event-stream` by default; this layer does not. The
/// encoder flushes whenever the body waits on the pump, so every event
/// reaches the client as soon as it is written.
pub fn compression_layer() -> CompressionLayer<StreamCompression> {
    CompressionLayer::new()
        .gzip(true)
        .compress_when(NotForContentType::GRPC.and(NotForContentType::IMAGES))
}

/// Number of events the client has already consumed
///
/// `Last-Event-ID: n` resumes at `n + 1`. A missing, malformed, or
/// overflowing header reads from the beginning.
pub fn resume_offset(headers: &HeaderMap) -> u64 {
    let Some(value) = headers.get(LAST_EVENT_ID) else {
        return 0;
    };

    let offset = value
        .to_str()
        .ok()
        .and_then(|id| id.parse::<u64>().ok())
        .and_then(|id| id.checked_add(1));

    match offset {
        Some(offset) => offset,
        None => {
            debug!(last_event_id = ?value, "Ignoring malformed Last-Event-ID");
            0
        }
    }
}

/// Streams one build's event log to each request
#[derive(Clone)]
pub struct EventStreamHandler {
    build: Arc<dyn BuildEvents>,
    channel_capacity: usize,
}

impl EventStreamHandler {
    pub fn new(build: Arc<dyn BuildEvents>) -> Self {
        Self {
            build,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Set how many encoded events may wait for the client (minimum 1)
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Serve one event-stream request
    pub async fn serve(&self, headers: &HeaderMap, context: StreamContext) -> Response {
        let from = resume_offset(headers);
        let span = context.span(from);

        async move {
            let source = match self.build.events(from).await {
                Ok(source) => source,
                Err(e) => {
                    error!(error = %e, "Failed to open build event stream");
                    return StatusCode::INTERNAL_SERVER_ERROR.into_response();
                }
            };

            let (tx, rx) = mpsc::channel(self.channel_capacity);
            tokio::spawn(pump::run(source, tx).in_current_span());

            stream_response(rx)
        }
        .instrument(span)
        .await
    }

    /// A router serving this build's stream at `/`
    pub fn into_router(self) -> Router {
        Router::new()
            .route("/", get(stream_build_events))
            .with_state(self)
            .layer(compression_layer())
    }
}

async fn stream_build_events(
    State(handler): State<EventStreamHandler>,
    headers: HeaderMap,
) -> Response {
    handler.serve(&headers, StreamContext::new()).await
}

fn stream_response(rx: mpsc::Receiver<Bytes>) -> Response {
    let frames = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv()
            .await
            .map(|frame| (Ok::<_, Infallible>(frame), rx))
    });

    let mut response = Body::from_stream(frames).into_response();
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(EVENT_STREAM_CONTENT_TYPE));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
    headers.insert(ACCEL_BUFFERING, HeaderValue::from_static("no"));
    headers.insert(STREAM_VERSION_HEADER, HeaderValue::from_static(STREAM_VERSION));
    response
}
