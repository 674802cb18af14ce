//! Contains the request handling logic for the engine.
//!
//! Every `Request` event spawns one task that:
//!
//! - waits for a slot in the request pool (admission),
//! - hands the request to the downloader,
//! - turns the outcome into a `Response` event (status `200`) or an `Error`
//!   event carrying that outcome's own status or transport error,
//! - publishes the event and only then gives the slot back.
//!
//! The pool permit and the request's state ticket are owned by the task, so
//! both are returned on every exit path, panics in spider callbacks included.

use super::core::EngineInner;
use crate::downloader::{DownloadError, Fetched};
use crate::error::{FailureReason, FetchFailure};
use crate::events::EngineEvent;
use crate::request::Request;
use crate::response::Response;
use crate::state::RequestTicket;
use crate::stats::StatCollector;
use log::{debug, trace};
use std::sync::Arc;
use tokio::time::Instant;

pub(crate) fn spawn_request(inner: Arc<EngineInner>, request: Request) {
    let ticket = inner.state.seed();
    inner.stats.increment_requests_enqueued();
    trace!("Seeded request for URL: {}", request.url());

    let runtime = inner.runtime.clone();
    runtime.spawn(process_request(inner, request, ticket));
}

async fn process_request(inner: Arc<EngineInner>, request: Request, mut ticket: RequestTicket) {
    let permit = inner.pool.acquire().await;
    ticket.admitted();
    inner.stats.increment_requests_sent();

    trace!("Downloading request for URL: {}", request.url());
    let start_time = Instant::now();
    let outcome = inner.downloader.download(&request).await;
    trace!(
        "Download for URL {} finished in {:?}",
        request.url(),
        start_time.elapsed()
    );

    ticket.dispatching();
    let event = into_event(&inner.stats, &request, outcome);
    inner.events.publish(&event);

    permit.release();
}

/// Classifies a fetch outcome. Only an error-free fetch with status exactly
/// `200` becomes a response.
pub(crate) fn into_event(
    stats: &StatCollector,
    request: &Request,
    outcome: Result<Fetched, DownloadError>,
) -> EngineEvent {
    let reason = match outcome {
        Ok(fetched) => {
            stats.record_response_status(fetched.status);
            stats.add_bytes_downloaded(fetched.body.len());
            if fetched.status == 200 {
                stats.increment_requests_succeeded();
                let body = String::from_utf8_lossy(&fetched.body).into_owned();
                let response = Response::for_request(request)
                    .with_headers(fetched.headers)
                    .with_body(body);
                return EngineEvent::Response(response);
            }
            debug!("Status {} for URL {}", fetched.status, request.url());
            FailureReason::Status(fetched.status)
        }
        Err(e) => {
            debug!("Download error for URL {}: {}", request.url(), e);
            FailureReason::Transport(Arc::new(e))
        }
    };

    stats.increment_requests_failed();
    EngineEvent::Error(FetchFailure::new(
        request.url().clone(),
        request.method().clone(),
        reason,
    ))
}
