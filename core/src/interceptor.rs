//! Turns a `RequestDescriptor` into a network call and its lifecycle
//! notifications.
//!
//! # Design
//! Each request moves through start, call, resolve and end. The end
//! notification lives in a drop guard, so it is emitted exactly once on
//! every path: success, error status, transport failure, client panic,
//! timeout, cancellation, and the interceptor future itself being dropped.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::descriptor::{RequestDescriptor, RequestId};
use crate::error::{describe_timeout, panic_message, ApiError};
use crate::http::{HttpRequest, HttpResponse};
use crate::store::{Notification, Store};
use crate::transport::HttpClient;

pub struct Interceptor<A> {
    client: Arc<dyn HttpClient>,
    store: Arc<Store<A>>,
    default_timeout: Option<Duration>,
}

impl<A: Send + 'static> Interceptor<A> {
    pub fn new(client: Arc<dyn HttpClient>, store: Arc<Store<A>>) -> Self {
        Self {
            client,
            store,
            default_timeout: None,
        }
    }

    /// Timeout for descriptors that do not set their own.
    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<Store<A>> {
        &self.store
    }

    /// Run one descriptor to completion.
    pub async fn handle(&self, descriptor: RequestDescriptor<A>) {
        let RequestDescriptor {
            id,
            mut request,
            dispatcher_key,
            timeout,
            cancel,
            on_success,
            on_error,
        } = descriptor;

        let _end = EndGuard {
            store: self.store.clone(),
            id,
            key: dispatcher_key.clone(),
        };

        if let Some(key) = dispatcher_key {
            log::debug!("request {id} start [{key}] {} {}", request.method, request.url);
            self.store.apply(Notification::Start { id, key });
        }

        let timeout = timeout.or(self.default_timeout);
        request.timeout = timeout;
        request.cancel = cancel.clone();
        let outcome = self.call(&request, timeout, cancel.as_ref()).await;

        let action = match outcome {
            Ok(response) if response.is_success() => on_success(response),
            Ok(response) => {
                let err = ApiError::Status {
                    status: response.status,
                    body: response.body,
                };
                log_failure(id, &request, timeout, &err);
                on_error(err)
            }
            Err(err) => {
                log_failure(id, &request, timeout, &err);
                on_error(err)
            }
        };

        self.store.apply(Notification::Resolved { id, action });
    }

    async fn call(
        &self,
        request: &HttpRequest,
        timeout: Option<Duration>,
        cancel: Option<&CancellationToken>,
    ) -> Result<HttpResponse, ApiError> {
        let send = AssertUnwindSafe(self.client.send(request))
            .catch_unwind()
            .map(|result| result.unwrap_or_else(|panic| Err(ApiError::ClientPanic(panic_message(panic)))));

        let bounded = async move {
            match timeout {
                Some(limit) => tokio::time::timeout(limit, send)
                    .await
                    .unwrap_or(Err(ApiError::Timeout)),
                None => send.await,
            }
        };

        match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(ApiError::Cancelled),
                    result = bounded => result,
                }
            }
            None => bounded.await,
        }
    }
}

fn log_failure(id: RequestId, request: &HttpRequest, timeout: Option<Duration>, err: &ApiError) {
    log::error!(
        "request {id} {} {} failed (timeout {}): {err}",
        request.method,
        request.url,
        describe_timeout(timeout)
    );
}

struct EndGuard<A> {
    store: Arc<Store<A>>,
    id: RequestId,
    key: Option<String>,
}

impl<A> Drop for EndGuard<A> {
    fn drop(&mut self) {
        log::debug!("request {} end", self.id);
        self.store.apply(Notification::End {
            id: self.id,
            key: self.key.take(),
        });
    }
}
