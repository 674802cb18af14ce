//! # Crawler Module
//!
//! Implements the event-driven engine that orchestrates a crawl.
//!
//! ## Overview
//!
//! The [`Engine`] accepts seeds, normalizes them into requests and publishes a
//! `Request` event for each. Its own subscribers then drive every request
//! through the same lifecycle:
//!
//! ```text
//! Seeded → Admitted (pool slot) → Fetching → Completed | Failed
//! ```
//!
//! A completed fetch (status `200`) becomes a `Response` event that the router
//! fans out to every matching spider; anything else becomes an `Error` event
//! carrying the fetch's own status or transport error. There is no retry.
//!
//! ## Internal Components
//!
//! - `request_handler`: spawns one task per request, meters it through the pool
//!   and turns the fetch outcome into an event
//! - `response_handler`: routes responses and sinks errors

mod core;
mod request_handler;
mod response_handler;

pub use self::core::{Engine, EngineHandle};
