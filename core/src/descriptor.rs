//! Deferred HTTP calls described as data.
//!
//! # Design
//! A `RequestDescriptor` carries everything the interceptor needs to run one
//! call: the request parameters, the resource it loads (`dispatcher_key`)
//! and two continuations that turn the outcome into an application action.
//! The descriptor is moved into the interceptor, so it is consumed exactly
//! once and never retried.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{ApiError, DescriptorError};
use crate::http::{AuthConfig, HttpMethod, HttpRequest, HttpResponse};

/// Identifies one descriptor in logs and lifecycle notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

pub type OnSuccess<A> = Box<dyn FnOnce(HttpResponse) -> A + Send>;
pub type OnError<A> = Box<dyn FnOnce(ApiError) -> A + Send>;

pub struct RequestDescriptor<A> {
    pub id: RequestId,
    pub request: HttpRequest,
    pub dispatcher_key: Option<String>,
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
    pub on_success: OnSuccess<A>,
    pub on_error: OnError<A>,
}

impl<A> RequestDescriptor<A> {
    pub fn new<S, E>(method: HttpMethod, url: impl Into<String>, on_success: S, on_error: E) -> Self
    where
        S: FnOnce(HttpResponse) -> A + Send + 'static,
        E: FnOnce(ApiError) -> A + Send + 'static,
    {
        Self::from_request(HttpRequest::new(method, url), on_success, on_error)
    }

    /// Wrap a request built elsewhere, e.g. by `ResourceClient`.
    pub fn from_request<S, E>(request: HttpRequest, on_success: S, on_error: E) -> Self
    where
        S: FnOnce(HttpResponse) -> A + Send + 'static,
        E: FnOnce(ApiError) -> A + Send + 'static,
    {
        Self {
            id: RequestId::new(),
            request,
            dispatcher_key: None,
            timeout: None,
            cancel: None,
            on_success: Box::new(on_success),
            on_error: Box::new(on_error),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.request.body = Some(body.into());
        self
    }

    /// Serialize `payload` as the body and set the JSON content type.
    pub fn json_body<T: Serialize>(mut self, payload: &T) -> Result<Self, ApiError> {
        let body =
            serde_json::to_string(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
        self.request.body = Some(body);
        self.request
            .headers
            .push(("content-type".to_string(), "application/json".to_string()));
        Ok(self)
    }

    pub fn auth(mut self, auth: AuthConfig) -> Self {
        self.request.auth = Some(auth);
        self
    }

    pub fn dispatcher_key(mut self, key: impl Into<String>) -> Self {
        self.dispatcher_key = Some(key.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancel_with(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.request.method
    }

    pub fn url(&self) -> &str {
        &self.request.url
    }

    /// Reject descriptors that could never be sent.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        let url = self.request.url.trim();
        if url.is_empty() {
            return Err(DescriptorError::EmptyUrl);
        }
        let parsed = url::Url::parse(url).map_err(|e| DescriptorError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(DescriptorError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme {other}"),
            }),
        }
    }
}

impl<A> fmt::Debug for RequestDescriptor<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("id", &self.id)
            .field("request", &self.request)
            .field("dispatcher_key", &self.dispatcher_key)
            .field("timeout", &self.timeout)
            .field("cancellable", &self.cancel.is_some())
            .finish_non_exhaustive()
    }
}
