//! A "prelude" for users of the `spider-engine` crate.
//!
//! This prelude re-exports the most commonly used types and traits so that
//! they can be easily imported.
//!
//! # Example
//!
//! ```
//! use spider_engine::prelude::*;
//! ```

pub use crate::{
    // Core structs
    Engine,
    EngineBuilder,
    EngineHandle,
    Pattern,
    Request,
    Response,
    Spider,
    // Events
    EngineEvent,
    EventKind,
    // Core traits
    Downloader,
    // Errors
    FetchFailure,
    SpiderError,
    // Essential re-exports for trait implementation
    async_trait,
};
