//! Injectable network seam
//!
//! Instead of patching global networking entry points, the embedder
//! routes outbound calls through a [`Transport`] and wraps it in an
//! [`InterceptingTransport`], which emits one structured event per
//! completed call on a channel the capture session drains.

use crate::events::{NetworkEvent, NetworkKind};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct NetworkRequest {
    pub method: String,
    pub url: String,
    pub body: Option<String>,
}

impl NetworkRequest {
    pub fn get(url: &str) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.to_string(),
            body: None,
        }
    }

    pub fn post(url: &str, body: &str) -> Self {
        Self {
            method: "POST".to_string(),
            url: url.to_string(),
            body: Some(body.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NetworkResponse {
    pub status: u16,
    pub body: Option<String>,
}

/// The underlying way out of the process.
pub trait Transport {
    fn send(&mut self, request: &NetworkRequest) -> anyhow::Result<NetworkResponse>;
}

impl<F> Transport for F
where
    F: FnMut(&NetworkRequest) -> anyhow::Result<NetworkResponse>,
{
    fn send(&mut self, request: &NetworkRequest) -> anyhow::Result<NetworkResponse> {
        self(request)
    }
}

/// Wraps a transport and reports every completed call exactly once,
/// after completion. A transport error is still a completed call; it
/// surfaces as status 0 with no response body.
pub struct InterceptingTransport<T> {
    inner: T,
    kind: NetworkKind,
    tx: Sender<NetworkEvent>,
    epoch: Instant,
}

impl<T: Transport> InterceptingTransport<T> {
    pub fn new(inner: T) -> (Self, Receiver<NetworkEvent>) {
        let (tx, rx) = unbounded();
        (
            Self {
                inner,
                kind: NetworkKind::Fetch,
                tx,
                epoch: Instant::now(),
            },
            rx,
        )
    }

    pub fn with_kind(mut self, kind: NetworkKind) -> Self {
        self.kind = kind;
        self
    }
}

impl<T: Transport> Transport for InterceptingTransport<T> {
    fn send(&mut self, request: &NetworkRequest) -> anyhow::Result<NetworkResponse> {
        let start_time = self.epoch.elapsed().as_millis() as u64;
        let began = Instant::now();
        let result = self.inner.send(request);
        let duration_ms = began.elapsed().as_millis() as u64;

        let (status, response_body) = match &result {
            Ok(response) => (response.status, response.body.clone()),
            Err(_) => (0, None),
        };

        let event = NetworkEvent {
            kind: self.kind,
            method: request.method.clone(),
            url: request.url.clone(),
            status,
            request_body: request.body.clone(),
            response_body,
            start_time,
            duration_ms,
        };
        debug!(method = %event.method, url = %event.url, status, "network call completed");
        let _ = self.tx.send(event);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn emits_one_event_per_completed_call() {
        let (mut transport, rx) = InterceptingTransport::new(
            |req: &NetworkRequest| -> anyhow::Result<NetworkResponse> {
                Ok(NetworkResponse {
                    status: 200,
                    body: Some(format!("echo {}", req.url)),
                })
            },
        );

        transport.send(&NetworkRequest::get("https://example.com/a")).unwrap();
        transport
            .send(&NetworkRequest::post("https://example.com/b", "{\"k\":1}"))
            .unwrap();

        let first = rx.try_recv().unwrap();
        assert_eq!(first.method, "GET");
        assert_eq!(first.status, 200);
        assert_eq!(first.response_body.as_deref(), Some("echo https://example.com/a"));

        let second = rx.try_recv().unwrap();
        assert_eq!(second.request_body.as_deref(), Some("{\"k\":1}"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn transport_failure_surfaces_as_status_zero() {
        let (mut transport, rx) = InterceptingTransport::new(
            |_: &NetworkRequest| -> anyhow::Result<NetworkResponse> {
                Err(anyhow!("connection refused"))
            },
        );

        assert!(transport.send(&NetworkRequest::get("https://down.example")).is_err());
        let event = rx.try_recv().unwrap();
        assert_eq!(event.status, 0);
        assert!(event.response_body.is_none());
    }
}
