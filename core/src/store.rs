//! The store side of the action stream.
//!
//! `Store` is an explicit, constructor-injected container: it owns the
//! loader counters and the application reducer. Every lifecycle
//! notification goes through `Store::apply`, which updates the loader
//! before the reducer sees the notification.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::descriptor::RequestId;
use crate::loader::LoaderState;

/// What the store receives.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification<A> {
    /// A keyed request is about to be sent.
    Start { id: RequestId, key: String },
    /// Output of the request's `on_success` or `on_error` continuation.
    Resolved { id: RequestId, action: A },
    /// The request is finished. Emitted exactly once per request, keyed or not.
    End { id: RequestId, key: Option<String> },
    /// A plain action dispatched without an HTTP call.
    Action(A),
}

/// Consumer of notifications, typically the application's state reducer.
pub trait Reducer<A>: Send + Sync {
    fn reduce(&self, notification: Notification<A>);
}

impl<A, F> Reducer<A> for F
where
    F: Fn(Notification<A>) + Send + Sync,
{
    fn reduce(&self, notification: Notification<A>) {
        self(notification)
    }
}

impl<A: Send> Reducer<A> for mpsc::UnboundedSender<Notification<A>> {
    fn reduce(&self, notification: Notification<A>) {
        if self.send(notification).is_err() {
            log::debug!("reducer channel closed; dropping notification");
        }
    }
}

pub struct Store<A> {
    loader: Arc<LoaderState>,
    reducer: Box<dyn Reducer<A>>,
}

impl<A> Store<A> {
    pub fn new(loader: Arc<LoaderState>, reducer: impl Reducer<A> + 'static) -> Self {
        Self {
            loader,
            reducer: Box::new(reducer),
        }
    }

    pub fn loader(&self) -> &Arc<LoaderState> {
        &self.loader
    }

    pub fn is_loading(&self, key: &str) -> bool {
        self.loader.is_loading(key)
    }

    pub fn apply(&self, notification: Notification<A>) {
        match &notification {
            Notification::Start { key, .. } => self.loader.mark_start(key),
            Notification::End { key: Some(key), .. } => self.loader.mark_end(key),
            _ => {}
        }
        self.reducer.reduce(notification);
    }
}
