//! The core Engine implementation.
//!
//! This module defines the `Engine` struct, the central orchestrator of a
//! crawl. It ties together the request pool, the downloader, the router and the
//! event bus, and tracks progress through `CrawlerState` and `StatCollector`.
//!
//! The engine reacts to its own events: subscribers installed at construction
//! handle `Request`, `Response` and `Error`. Embedders may subscribe to the
//! same bus to observe the crawl. New requests can be submitted at any time,
//! including from spider callbacks while earlier requests are still running.

use crate::builder::{EngineBuilder, EngineConfig};
use crate::concurrency::RequestPool;
use crate::downloader::Downloader;
use crate::error::SpiderError;
use crate::events::{EngineEvent, EventBus, EventKind, SubscriptionId};
use crate::request::{Request, Seed};
use crate::router::{Pattern, Router};
use crate::spider::Spider;
use crate::state::CrawlerState;
use crate::stats::StatCollector;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tracing::{debug, info, trace};

use super::{request_handler, response_handler};

/// State shared between the engine, its handles and its request tasks.
pub(crate) struct EngineInner {
    pub(crate) log_errors: bool,
    pub(crate) router: Router,
    pub(crate) pool: RequestPool,
    pub(crate) downloader: Arc<dyn Downloader>,
    pub(crate) events: EventBus<EngineEvent>,
    pub(crate) state: Arc<CrawlerState>,
    pub(crate) stats: Arc<StatCollector>,
    pub(crate) runtime: Handle,
    seeds: Mutex<Vec<Seed>>,
}

impl EngineInner {
    /// Publishes a `Request` event for an already normalized request.
    pub(crate) fn submit(&self, request: Request) -> usize {
        trace!(url = %request.url(), method = %request.method(), "Submitting request");
        self.events.publish(&EngineEvent::Request(request))
    }

    fn enqueue(&self, seed: Seed) -> Result<(), SpiderError> {
        let request = Request::from_seed(seed)?;
        self.submit(request);
        Ok(())
    }
}

/// The crawl orchestrator.
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    /// Returns a builder with default configuration.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Builds an engine from `config` using the default downloader.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: EngineConfig) -> Result<Self, SpiderError> {
        EngineBuilder::from_config(config).build()
    }

    pub(crate) fn from_parts(
        config: EngineConfig,
        downloader: Arc<dyn Downloader>,
        runtime: Handle,
    ) -> Self {
        debug!(
            "Creating engine with max_requests={}, log={}, {} start urls",
            config.max_requests,
            config.log,
            config.start_urls.len()
        );
        let inner = Arc::new(EngineInner {
            log_errors: config.log,
            router: Router::new(),
            pool: RequestPool::new(config.max_requests),
            downloader,
            events: EventBus::new(),
            state: CrawlerState::new(),
            stats: Arc::new(StatCollector::new()),
            runtime,
            seeds: Mutex::new(config.start_urls),
        });
        install_handlers(&inner);
        Engine { inner }
    }

    /// Binds `spider` to URLs matching `pattern`. Returns the engine for chaining.
    pub fn route(&self, pattern: Pattern, spider: Arc<Spider>) -> &Self {
        self.inner.router.add(Some(pattern), spider);
        self
    }

    /// Binds `spider` to every URL.
    pub fn route_any(&self, spider: Arc<Spider>) -> &Self {
        self.inner.router.add(None, spider);
        self
    }

    /// Issues a request for every configured seed and returns immediately.
    ///
    /// All seeds are normalized before anything is issued: a malformed seed
    /// fails the call and leaves the seed list untouched. On success the seed
    /// list is consumed, so a second call issues nothing. Returns the number
    /// of requests issued.
    pub fn run(&self) -> Result<usize, SpiderError> {
        let requests = {
            let mut seeds = self.inner.seeds.lock();
            let requests = seeds
                .iter()
                .cloned()
                .map(Request::from_seed)
                .collect::<Result<Vec<_>, _>>()?;
            seeds.clear();
            requests
        };

        info!(
            "Engine starting run with {} seeds, max_requests={}",
            requests.len(),
            self.inner.pool.capacity()
        );
        let issued = requests.len();
        for request in requests {
            self.inner.submit(request);
        }
        Ok(issued)
    }

    /// Normalizes `seed` and issues it. Usable at any time, including while
    /// earlier requests are in flight.
    pub fn enqueue(&self, seed: impl Into<Seed>) -> Result<(), SpiderError> {
        self.inner.enqueue(seed.into())
    }

    /// Issues an already normalized request.
    pub fn submit(&self, request: Request) {
        self.inner.submit(request);
    }

    /// Waits until no request is queued, in flight or being dispatched.
    pub async fn wait_idle(&self) {
        self.inner.state.wait_idle().await;
    }

    /// Runs the configured seeds and waits for the crawl, including any
    /// requests spiders enqueue along the way, to finish.
    pub async fn crawl(&self) -> Result<(), SpiderError> {
        self.run()?;
        self.wait_idle().await;
        info!("Crawl has become idle.{}", self.inner.stats);
        Ok(())
    }

    pub fn is_idle(&self) -> bool {
        self.inner.state.is_idle()
    }

    /// Subscribes to engine events of `kind`.
    pub fn subscribe<F>(&self, kind: EventKind, callback: F) -> SubscriptionId
    where
        F: Fn(&EngineEvent) + Send + Sync + 'static,
    {
        self.inner.events.subscribe(kind, callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.events.unsubscribe(id)
    }

    /// Publishes an event on the engine bus, exactly as the engine itself does.
    pub fn publish(&self, event: &EngineEvent) -> usize {
        self.inner.events.publish(event)
    }

    /// A weak handle spiders can hold to enqueue follow-up requests.
    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn router(&self) -> &Router {
        &self.inner.router
    }

    pub fn pool(&self) -> &RequestPool {
        &self.inner.pool
    }

    /// Returns a cloned Arc to the `StatCollector` used by this engine.
    pub fn stats(&self) -> Arc<StatCollector> {
        Arc::clone(&self.inner.stats)
    }

    pub fn state(&self) -> Arc<CrawlerState> {
        Arc::clone(&self.inner.state)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("max_requests", &self.inner.pool.capacity())
            .field("routes", &self.inner.router.len())
            .field("idle", &self.is_idle())
            .finish()
    }
}

/// A non-owning reference to an [`Engine`].
///
/// Spiders keep one of these rather than the engine itself, so that the
/// engine → router → spider → callback chain never forms an ownership cycle.
#[derive(Clone)]
pub struct EngineHandle {
    inner: Weak<EngineInner>,
}

impl EngineHandle {
    /// Normalizes `seed` and issues it on the engine.
    pub fn enqueue(&self, seed: impl Into<Seed>) -> Result<(), SpiderError> {
        let inner = self.inner.upgrade().ok_or(SpiderError::EngineStopped)?;
        inner.enqueue(seed.into())
    }

    /// Issues an already normalized request on the engine.
    pub fn submit(&self, request: Request) -> Result<(), SpiderError> {
        let inner = self.inner.upgrade().ok_or(SpiderError::EngineStopped)?;
        inner.submit(request);
        Ok(())
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}

fn install_handlers(inner: &Arc<EngineInner>) {
    let weak = Arc::downgrade(inner);
    inner.events.subscribe(EventKind::Request, move |event| {
        if let (EngineEvent::Request(request), Some(inner)) = (event, weak.upgrade()) {
            request_handler::spawn_request(inner, request.clone());
        }
    });

    let weak = Arc::downgrade(inner);
    inner.events.subscribe(EventKind::Response, move |event| {
        if let (EngineEvent::Response(response), Some(inner)) = (event, weak.upgrade()) {
            response_handler::handle_response(&inner, response);
        }
    });

    let weak = Arc::downgrade(inner);
    inner.events.subscribe(EventKind::Error, move |event| {
        if let (EngineEvent::Error(failure), Some(inner)) = (event, weak.upgrade()) {
            response_handler::handle_error(&inner, failure);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_debug_shows_pool_routes_and_idle() {
        let engine = Engine::builder().max_requests(3).build().unwrap();
        engine.route_any(Arc::new(Spider::default()));

        let text = format!("{engine:?}");
        assert_eq!(text, "Engine { max_requests: 3, routes: 1, idle: true }");
    }

    #[tokio::test]
    async fn test_handle_debug_tracks_engine_lifetime() {
        let engine = Engine::builder().build().unwrap();
        let handle = engine.handle();
        assert_eq!(format!("{handle:?}"), "EngineHandle { alive: true }");

        drop(engine);
        assert_eq!(format!("{handle:?}"), "EngineHandle { alive: false }");
    }
}
