//! HTTP client boundary.
//!
//! # Design
//! The interceptor only knows the `HttpClient` trait. `UreqClient` is the
//! production implementation: ureq is blocking, so each call runs on
//! tokio's blocking pool. Status codes are never errors at this level; a
//! 500 is returned as an `HttpResponse` like a 200. `TrackedClient` is the
//! client-level hook that drives the global loading flag around every
//! outbound call.
//!
//! A blocking call cannot be interrupted once it is on the wire. Clients
//! therefore honor `HttpRequest::cancel` before issuing the call, bound it
//! with `HttpRequest::timeout`, and `TrackedClient` keeps the global flag
//! raised until the call has really returned, even when the caller has
//! stopped waiting for it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{join_failure, ApiError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::loader::GlobalLoader;

#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Execute one request. `Err` means no response was received.
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

#[async_trait]
impl<C: HttpClient + ?Sized> HttpClient for Arc<C> {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).send(request).await
    }
}

/// Blocking ureq agent driven from async code.
///
/// The agent itself is unbounded; each call is limited by its own
/// `HttpRequest::timeout`.
#[derive(Debug, Clone)]
pub struct UreqClient {
    agent: ureq::Agent,
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new()
    }
}

impl UreqClient {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

#[async_trait]
impl HttpClient for UreqClient {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        if request.is_cancelled() {
            return Err(ApiError::Cancelled);
        }
        let agent = self.agent.clone();
        let request = request.clone();
        tokio::task::spawn_blocking(move || {
            // The pool may have queued us behind other calls.
            if request.is_cancelled() {
                return Err(ApiError::Cancelled);
            }
            execute(&agent, &request)
        })
        .await
        .map_err(join_failure)?
    }
}

fn execute(agent: &ureq::Agent, req: &HttpRequest) -> Result<HttpResponse, ApiError> {
    let headers = req.wire_headers();
    let body = req.body.as_deref();

    let result = match req.method {
        HttpMethod::Get => prepare(agent.get(&req.url), req, &headers).call(),
        HttpMethod::Delete => prepare(agent.delete(&req.url), req, &headers).call(),
        HttpMethod::Post => {
            let builder = prepare(agent.post(&req.url), req, &headers);
            match body {
                Some(b) => builder.send(b.as_bytes()),
                None => builder.send_empty(),
            }
        }
        HttpMethod::Put => {
            let builder = prepare(agent.put(&req.url), req, &headers);
            match body {
                Some(b) => builder.send(b.as_bytes()),
                None => builder.send_empty(),
            }
        }
        HttpMethod::Patch => {
            let builder = prepare(agent.patch(&req.url), req, &headers);
            match body {
                Some(b) => builder.send(b.as_bytes()),
                None => builder.send_empty(),
            }
        }
    };

    let mut response = result.map_err(map_ureq_error)?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(k, v)| {
            v.to_str()
                .ok()
                .map(|v| (k.as_str().to_string(), v.to_string()))
        })
        .collect();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(map_ureq_error)?;

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

fn prepare<B>(
    mut builder: ureq::RequestBuilder<B>,
    req: &HttpRequest,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (k, v) in headers {
        builder = builder.header(k.as_str(), v.as_str());
    }
    if req.timeout.is_some() {
        builder = builder.config().timeout_global(req.timeout).build();
    }
    builder
}

fn map_ureq_error(err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::Timeout(_) => ApiError::Timeout,
        other => ApiError::Transport(other.to_string()),
    }
}

/// Wraps a client so every call raises the global loading flag.
///
/// The inner call runs as its own task, so a caller that stops waiting
/// (cancellation, timeout) does not lower the flag while the call is still
/// in progress.
pub struct TrackedClient<C> {
    inner: Arc<C>,
    global: Arc<GlobalLoader>,
}

impl<C> TrackedClient<C> {
    pub fn new(inner: C, global: Arc<GlobalLoader>) -> Self {
        Self {
            inner: Arc::new(inner),
            global,
        }
    }

    pub fn global(&self) -> &Arc<GlobalLoader> {
        &self.global
    }
}

struct FinishOnDrop(Arc<GlobalLoader>);

impl Drop for FinishOnDrop {
    fn drop(&mut self) {
        self.0.finish();
    }
}

#[async_trait]
impl<C: HttpClient + 'static> HttpClient for TrackedClient<C> {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.global.begin();
        let finish = FinishOnDrop(self.global.clone());
        let inner = self.inner.clone();
        let request = request.clone();
        tokio::spawn(async move {
            let _finish = finish;
            inner.send(&request).await
        })
        .await
        .map_err(join_failure)?
    }
}
