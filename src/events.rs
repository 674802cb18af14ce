//! Publish/subscribe plumbing shared by the engine and by spiders.
//!
//! Each component that emits events holds an [`EventBus`] rather than
//! inheriting emitter behaviour. Subscribers register a callback for one
//! [`EventKind`]; `publish` calls every matching callback synchronously, in
//! registration order.
//!
//! Callbacks run outside the subscriber lock, so a callback may publish
//! further events or (un)subscribe without deadlocking.

use crate::error::FetchFailure;
use crate::request::Request;
use crate::response::Response;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// The named event channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Request,
    Response,
    Error,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventKind::Request => "request",
            EventKind::Response => "response",
            EventKind::Error => "error",
        })
    }
}

/// Anything that can travel on an [`EventBus`].
pub trait Event: Send + Sync {
    fn kind(&self) -> EventKind;
}

/// Events raised by the engine.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    Request(Request),
    Response(Response),
    Error(FetchFailure),
}

impl Event for EngineEvent {
    fn kind(&self) -> EventKind {
        match self {
            EngineEvent::Request(_) => EventKind::Request,
            EngineEvent::Response(_) => EventKind::Response,
            EngineEvent::Error(_) => EventKind::Error,
        }
    }
}

impl Event for Response {
    fn kind(&self) -> EventKind {
        EventKind::Response
    }
}

/// Identifies a subscription so it can be removed later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Subscriber<E> {
    id: SubscriptionId,
    kind: EventKind,
    callback: Callback<E>,
}

/// A synchronous, multi-subscriber event channel.
pub struct EventBus<E> {
    subscribers: RwLock<Vec<Subscriber<E>>>,
    next_id: AtomicU64,
}

impl<E: Event> EventBus<E> {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Registers `callback` for events of `kind`.
    pub fn subscribe<F>(&self, kind: EventKind, callback: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push(Subscriber {
            id,
            kind,
            callback: Arc::new(callback),
        });
        id
    }

    /// Removes a subscription. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        subscribers.len() != before
    }

    /// Delivers `event` to every subscriber of its kind and returns how many were notified.
    pub fn publish(&self, event: &E) -> usize {
        let kind = event.kind();
        let callbacks: Vec<Callback<E>> = self
            .subscribers
            .read()
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| Arc::clone(&s.callback))
            .collect();

        for callback in &callbacks {
            callback(event);
        }
        callbacks.len()
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers
            .read()
            .iter()
            .filter(|s| s.kind == kind)
            .count()
    }
}

impl<E: Event> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.read().len())
            .finish()
    }
}
