//! The action stream between UI event handlers and the interceptor.
//!
//! `Dispatcher` is the cheap, cloneable handle UI code holds. It validates
//! descriptors synchronously and enqueues them; it never performs I/O.
//! `Middleware::run` drains the stream, starting one interceptor task per
//! descriptor and passing plain actions straight to the store.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::descriptor::RequestDescriptor;
use crate::error::DispatchError;
use crate::interceptor::Interceptor;
use crate::store::Notification;

pub enum StoreAction<A> {
    ApiRequest(RequestDescriptor<A>),
    Action(A),
}

pub struct Dispatcher<A> {
    tx: mpsc::UnboundedSender<StoreAction<A>>,
}

impl<A> Clone for Dispatcher<A> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<A> Dispatcher<A> {
    /// Enqueue an HTTP call. Misuse is reported here, before anything is
    /// queued; the call itself happens later on the middleware loop.
    pub fn dispatch_api_request(&self, descriptor: RequestDescriptor<A>) -> Result<(), DispatchError> {
        descriptor.validate()?;
        log::trace!(
            "dispatch {} {} {}",
            descriptor.id,
            descriptor.method(),
            descriptor.url()
        );
        self.tx
            .send(StoreAction::ApiRequest(descriptor))
            .map_err(|_| DispatchError::Closed)
    }

    pub fn dispatch(&self, action: A) -> Result<(), DispatchError> {
        self.tx
            .send(StoreAction::Action(action))
            .map_err(|_| DispatchError::Closed)
    }
}

pub struct Middleware<A> {
    rx: mpsc::UnboundedReceiver<StoreAction<A>>,
    interceptor: Arc<Interceptor<A>>,
}

pub fn channel<A>(interceptor: Interceptor<A>) -> (Dispatcher<A>, Middleware<A>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        Dispatcher { tx },
        Middleware {
            rx,
            interceptor: Arc::new(interceptor),
        },
    )
}

impl<A: Send + 'static> Middleware<A> {
    /// Runs until every `Dispatcher` is dropped, then waits for the requests
    /// still in flight.
    pub async fn run(mut self) {
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                next = self.rx.recv() => match next {
                    Some(StoreAction::ApiRequest(descriptor)) => {
                        let interceptor = self.interceptor.clone();
                        in_flight.spawn(async move { interceptor.handle(descriptor).await });
                    }
                    Some(StoreAction::Action(action)) => {
                        self.interceptor.store().apply(Notification::Action(action));
                    }
                    None => break,
                },
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    report(joined);
                }
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            report(joined);
        }
        log::debug!("middleware loop stopped");
    }
}

fn report(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            log::error!("request task panicked: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::error::{ApiError, DescriptorError};
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};
    use crate::loader::LoaderState;
    use crate::store::Store;
    use crate::transport::HttpClient;

    struct Echo;

    #[async_trait]
    impl HttpClient for Echo {
        async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: request.url.clone(),
            })
        }
    }

    fn wire() -> (
        Dispatcher<String>,
        Middleware<String>,
        mpsc::UnboundedReceiver<Notification<String>>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let store = Arc::new(Store::new(Arc::new(LoaderState::new()), tx));
        let (dispatcher, middleware) = channel(Interceptor::new(Arc::new(Echo), store));
        (dispatcher, middleware, rx)
    }

    #[tokio::test]
    async fn misuse_fails_fast_and_enqueues_nothing() {
        let (dispatcher, middleware, mut rx) = wire();
        let bad = RequestDescriptor::new(HttpMethod::Get, "", |_| String::new(), |_| String::new());
        let err = dispatcher.dispatch_api_request(bad).unwrap_err();
        assert!(matches!(err, DispatchError::Invalid(DescriptorError::EmptyUrl)));

        drop(dispatcher);
        middleware.run().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn plain_actions_reach_the_store() {
        let (dispatcher, middleware, mut rx) = wire();
        dispatcher.dispatch("hello".to_string()).unwrap();
        drop(dispatcher);
        middleware.run().await;
        assert_eq!(rx.try_recv().unwrap(), Notification::Action("hello".to_string()));
    }

    #[tokio::test]
    async fn run_waits_for_in_flight_requests() {
        let (dispatcher, middleware, mut rx) = wire();
        let d = RequestDescriptor::new(
            HttpMethod::Get,
            "http://localhost:3000/scim2/Groups",
            |r| r.body,
            |e| e.to_string(),
        );
        dispatcher.dispatch_api_request(d).unwrap();
        drop(dispatcher);
        middleware.run().await;

        let mut resolved = None;
        while let Ok(n) = rx.try_recv() {
            if let Notification::Resolved { action, .. } = n {
                resolved = Some(action);
            }
        }
        assert_eq!(resolved.as_deref(), Some("http://localhost:3000/scim2/Groups"));
    }

    #[tokio::test]
    async fn dispatch_after_shutdown_is_closed() {
        let (dispatcher, middleware, _rx) = wire();
        drop(middleware);
        let err = dispatcher.dispatch("late".to_string()).unwrap_err();
        assert!(matches!(err, DispatchError::Closed));
    }
}
