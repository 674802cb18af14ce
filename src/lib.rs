//! # spider-engine
//!
//! A small event-driven crawling engine.
//!
//! The engine fetches URLs with at most `max_requests` fetches in flight,
//! wraps every `200` answer into a uniform [`Response`] and hands it to every
//! [`Spider`] whose route pattern matches the response's URL. Failed fetches
//! are reported as `Error` events and never abort the crawl.
//!
//! ## Example
//!
//! ```rust,no_run
//! use spider_engine::{Engine, Pattern, Spider};
//! use std::sync::Arc;
//!
//! # async fn crawl() -> Result<(), spider_engine::SpiderError> {
//! let engine = Engine::builder()
//!     .max_requests(4)
//!     .log(true)
//!     .start_url("https://example.com/")
//!     .build()?;
//!
//! let pages = Arc::new(Spider::new("pages"));
//! let handle = engine.handle();
//! pages.on_response(move |response| {
//!     println!("{} -> {} bytes", response.url(), response.body().len());
//!     if response.url().path() == "/" {
//!         let _ = handle.enqueue("https://example.com/about");
//!     }
//! });
//!
//! engine.route(Pattern::new("^https://example\\.com/")?, pages);
//! engine.crawl().await?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod concurrency;
pub mod crawler;
pub mod downloader;
pub mod error;
pub mod events;
pub mod prelude;
pub mod request;
pub mod response;
pub mod router;
pub mod spider;
pub mod state;
pub mod stats;

pub use builder::{EngineBuilder, EngineConfig};
pub use concurrency::{PoolPermit, RequestPool};
pub use crawler::{Engine, EngineHandle};
pub use downloader::{DownloadError, Downloader, Fetched, ReqwestDownloader};
pub use error::{FailureReason, FetchFailure, SpiderError};
pub use events::{EngineEvent, EventBus, EventKind, SubscriptionId};
pub use request::{Request, RequestOptions, Seed};
pub use response::Response;
pub use router::{Pattern, Router};
pub use spider::Spider;
pub use stats::StatCollector;

pub use async_trait::async_trait;
pub use url::Url;
