//! # Spider Module
//!
//! A [`Spider`] is a named sink for routed responses.
//!
//! ## Overview
//!
//! Spiders are passive: they own no pool or routing logic. The router hands
//! them every response whose URL matches one of their bindings, and the
//! spider republishes it to whatever callbacks subscribed through
//! [`Spider::on_response`]. A callback may do arbitrary work, including
//! feeding new seeds back into the engine through an
//! [`EngineHandle`](crate::EngineHandle), which is how recursive crawls are
//! built.
//!
//! ## Example
//!
//! ```rust,ignore
//! use spider_engine::{Engine, Spider};
//! use std::sync::Arc;
//!
//! let engine = Engine::builder().start_url("https://example.com").build()?;
//! let spider = Arc::new(Spider::new("pages"));
//!
//! let handle = engine.handle();
//! spider.on_response(move |response| {
//!     println!("{} bytes from {}", response.body().len(), response.url());
//!     // handle.enqueue("https://example.com/next").ok();
//! });
//!
//! engine.route_any(spider);
//! engine.run()?;
//! ```

use crate::events::{EventBus, EventKind, SubscriptionId};
use crate::response::Response;
use std::fmt;

const DEFAULT_SPIDER_NAME: &str = "fun";

/// A named response sink.
pub struct Spider {
    name: String,
    events: EventBus<Response>,
}

impl Spider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            events: EventBus::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Subscribes to responses delivered to this spider.
    pub fn on_response<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Response) + Send + Sync + 'static,
    {
        self.events.subscribe(EventKind::Response, callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Delivers a response to this spider's subscribers.
    pub fn publish(&self, response: &Response) -> usize {
        self.events.publish(response)
    }
}

impl Default for Spider {
    fn default() -> Self {
        Self::new(DEFAULT_SPIDER_NAME)
    }
}

impl fmt::Debug for Spider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spider")
            .field("name", &self.name)
            .field("subscribers", &self.events.subscriber_count(EventKind::Response))
            .finish()
    }
}
