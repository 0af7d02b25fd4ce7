//! Shared fakes and helpers for event stream tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use serde_json::value::RawValue;
use tower::ServiceExt;
use tower_http::decompression::{Decompression, DecompressionBody};

use atc_buildserver::WireEvent;
use atc_core::{BuildEvents, Envelope, EventResult, EventSource, EventStreamError};

pub fn fake_event(payload: &str, event_id: &str) -> Envelope {
    let data = RawValue::from_string(payload.to_string()).unwrap();
    Envelope::new("fake", "42.0", data, event_id)
}

/// What the fake cursor does on each `next`
#[derive(Clone)]
pub enum Script {
    /// Return the stored events after the open offset, then end
    Stored(Vec<Envelope>),
    /// Return one event, then a non-sentinel error
    OneThenError(Envelope),
    /// Return the same event forever
    Forever(Envelope),
    /// Return one event, then never return again
    OneThenHang(Envelope),
    /// Never return
    Hang,
}

/// Call counters shared between a fake build, its cursors, and the test
#[derive(Default)]
pub struct Calls {
    pub opened_from: Mutex<Vec<u64>>,
    pub next: AtomicUsize,
    pub next_after_close: AtomicUsize,
    pub close: AtomicUsize,
}

impl Calls {
    pub fn closes(&self) -> usize {
        self.close.load(Ordering::SeqCst)
    }

    pub fn opened_from(&self) -> Vec<u64> {
        self.opened_from.lock().clone()
    }
}

pub struct FakeBuild {
    script: Option<Script>,
    pub calls: Arc<Calls>,
}

impl FakeBuild {
    pub fn new(script: Script) -> Self {
        Self {
            script: Some(script),
            calls: Arc::default(),
        }
    }

    /// A build whose cursor cannot be opened
    pub fn failing() -> Self {
        Self {
            script: None,
            calls: Arc::default(),
        }
    }
}

#[async_trait]
impl BuildEvents for FakeBuild {
    async fn events(&self, from: u64) -> EventResult<Box<dyn EventSource>> {
        self.calls.opened_from.lock().push(from);

        let Some(script) = self.script.clone() else {
            return Err(EventStreamError::unavailable("nope"));
        };

        Ok(Box::new(FakeEventSource {
            script,
            position: from,
            calls: Arc::clone(&self.calls),
        }))
    }
}

struct FakeEventSource {
    script: Script,
    position: u64,
    calls: Arc<Calls>,
}

#[async_trait]
impl EventSource for FakeEventSource {
    async fn next(&mut self) -> EventResult<Envelope> {
        self.calls.next.fetch_add(1, Ordering::SeqCst);
        if self.calls.closes() > 0 {
            self.calls.next_after_close.fetch_add(1, Ordering::SeqCst);
        }

        let position = self.position;
        self.position += 1;

        match &self.script {
            Script::Stored(events) => usize::try_from(position)
                .ok()
                .and_then(|index| events.get(index))
                .cloned()
                .ok_or(EventStreamError::EndOfStream),
            Script::OneThenError(event) if position == 0 => Ok(event.clone()),
            Script::OneThenError(_) => Err(EventStreamError::read("a coffee machine")),
            Script::Forever(event) => {
                tokio::task::yield_now().await;
                Ok(event.clone())
            }
            Script::OneThenHang(event) if position == 0 => Ok(event.clone()),
            Script::OneThenHang(_) | Script::Hang => std::future::pending().await,
        }
    }

    async fn close(self: Box<Self>) -> EventResult<()> {
        self.calls.close.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub async fn get(app: Router, uri: &str, last_event_id: Option<&str>) -> Response<Body> {
    let mut request = Request::builder().method("GET").uri(uri);
    if let Some(id) = last_event_id {
        request = request.header("Last-Event-ID", id);
    }
    app.oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

fn gzip_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("Accept-Encoding", "gzip")
        .body(Body::empty())
        .unwrap()
}

/// GET accepting gzip, returning the body as sent
pub async fn get_gzip(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(gzip_request(uri)).await.unwrap()
}

/// GET accepting gzip, decoding the body on the client side
pub async fn get_decoded(app: Router, uri: &str) -> Response<DecompressionBody<Body>> {
    Decompression::new(app)
        .oneshot(gzip_request(uri))
        .await
        .unwrap()
}

/// Read a decoded body until its first complete event
pub async fn read_first_decoded_event(response: Response<DecompressionBody<Body>>) -> WireEvent {
    let mut body = std::pin::pin!(response.into_body());
    let mut text = String::new();

    while !text.contains("\n\n") {
        let frame = tokio::time::timeout(Duration::from_secs(5), body.as_mut().frame())
            .await
            .expect("timed out waiting for an event")
            .expect("body ended")
            .unwrap();
        if let Ok(data) = frame.into_data() {
            text.push_str(std::str::from_utf8(&data).unwrap());
        }
    }

    let end = text.find("\n\n").unwrap_or(text.len());
    parse_events(&text[..end]).remove(0)
}

/// Read a whole decoded body and parse it as Server-Sent Events
pub async fn read_decoded_events(response: Response<DecompressionBody<Body>>) -> Vec<WireEvent> {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    parse_events(std::str::from_utf8(&bytes).unwrap())
}

/// Read the whole body and parse it as Server-Sent Events
pub async fn read_events(response: Response<Body>) -> Vec<WireEvent> {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    parse_events(std::str::from_utf8(&bytes).unwrap())
}

/// Read exactly one frame from the body
pub async fn read_frame(body: &mut Body) -> WireEvent {
    let frame = tokio::time::timeout(Duration::from_secs(5), body.frame())
        .await
        .expect("timed out waiting for a frame")
        .expect("body ended")
        .unwrap();
    let data = frame.into_data().unwrap();
    let mut events = parse_events(std::str::from_utf8(&data).unwrap());
    assert_eq!(events.len(), 1);
    events.remove(0)
}

/// Minimal SSE parser: `id`, `event`, and (possibly multi-line) `data`
pub fn parse_events(text: &str) -> Vec<WireEvent> {
    let mut events = Vec::new();

    for block in text.split("\n\n").filter(|block| !block.is_empty()) {
        let mut id = None;
        let mut name = String::from("message");
        let mut data: Vec<&str> = Vec::new();

        for line in block.lines() {
            let (field, value) = line.split_once(':').unwrap_or((line, ""));
            let value = value.strip_prefix(' ').unwrap_or(value);
            match field {
                "id" => id = value.parse().ok(),
                "event" => name = value.to_string(),
                "data" => data.push(value),
                _ => {}
            }
        }

        events.push(WireEvent {
            id: id.expect("event without id"),
            name,
            data: data.join("\n"),
        });
    }

    events
}

/// Poll `condition` until it holds or five seconds pass
pub async fn eventually(condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within 5s"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
