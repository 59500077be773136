//! Request lifecycle coordinator for identity-management console APIs.
//!
//! # Overview
//! UI code describes an HTTP call as a `RequestDescriptor` and hands it to a
//! `Dispatcher`. The `Middleware` loop runs each descriptor through the
//! `Interceptor`, which emits start, resolved and end notifications into the
//! `Store`. The store keeps per-resource loading counters (`LoaderState`)
//! and forwards every notification to the application's `Reducer`.
//!
//! # Design
//! - Descriptors are consumed exactly once; there is no retry.
//! - The end notification is emitted from a drop guard, so it fires on
//!   every outcome, including panics, timeouts and cancellation.
//! - Loading state is counted, not flagged, so overlapping requests for the
//!   same resource keep it loading until the last one finishes.
//! - State containers are constructed explicitly and shared with `Arc`.

pub mod config;
pub mod descriptor;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod loader;
pub mod resources;
pub mod store;
pub mod transport;
pub mod types;

use std::sync::Arc;

pub use config::ClientConfig;
pub use descriptor::{RequestDescriptor, RequestId};
pub use dispatcher::{Dispatcher, Middleware};
pub use error::{ApiError, ConfigError, DescriptorError, DispatchError};
pub use http::{AuthConfig, HttpMethod, HttpRequest, HttpResponse};
pub use interceptor::Interceptor;
pub use loader::{GlobalLoader, LoaderState};
pub use resources::{ResourceClient, ResourceKind};
pub use store::{Notification, Reducer, Store};
pub use transport::{HttpClient, TrackedClient, UreqClient};

/// Everything a console needs to issue requests and observe loading state.
pub struct Coordinator<A> {
    pub dispatcher: Dispatcher<A>,
    pub middleware: Middleware<A>,
    pub loader: Arc<LoaderState>,
    pub global: Arc<GlobalLoader>,
}

impl<A: Send + 'static> Coordinator<A> {
    /// Wire the ureq transport, global flag, store and interceptor together.
    /// The caller spawns `middleware.run()`.
    pub fn new(config: &ClientConfig, reducer: impl Reducer<A> + 'static) -> Self {
        let client = UreqClient::new();
        Self::with_client(config, client, reducer)
    }

    pub fn with_client(
        config: &ClientConfig,
        client: impl HttpClient + 'static,
        reducer: impl Reducer<A> + 'static,
    ) -> Self {
        let loader = Arc::new(LoaderState::new());
        let global = Arc::new(GlobalLoader::new());
        let store = Arc::new(Store::new(loader.clone(), reducer));
        let client = TrackedClient::new(client, global.clone());
        let interceptor =
            Interceptor::new(Arc::new(client), store).with_default_timeout(config.request_timeout);
        let (dispatcher, middleware) = dispatcher::channel(interceptor);
        Self {
            dispatcher,
            middleware,
            loader,
            global,
        }
    }
}
