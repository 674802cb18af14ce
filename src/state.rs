//! Module for tracking the operational state of the engine.
//!
//! `CrawlerState` counts every request the engine has accepted, split by
//! where it currently is:
//! - queued: seeded, waiting for a pool slot;
//! - in flight: admitted and being fetched;
//! - dispatching: its response or error event is being delivered.
//!
//! Each request carries a [`RequestTicket`] that moves it between counters and
//! removes it when dropped, so the counts stay correct on every exit path.
//! The engine is idle when all three counters are zero.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Represents the shared state of the engine's in-progress requests.
#[derive(Debug, Default)]
pub struct CrawlerState {
    /// The number of requests waiting for admission.
    pub queued_requests: AtomicUsize,
    /// The number of requests currently being downloaded.
    pub in_flight_requests: AtomicUsize,
    /// The number of requests whose outcome is being dispatched.
    pub dispatching_requests: AtomicUsize,
    idle: Notify,
}

impl CrawlerState {
    /// Creates a new, atomically reference-counted `CrawlerState`.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Checks if all engine activities are idle.
    pub fn is_idle(&self) -> bool {
        self.queued_requests.load(Ordering::SeqCst) == 0
            && self.in_flight_requests.load(Ordering::SeqCst) == 0
            && self.dispatching_requests.load(Ordering::SeqCst) == 0
    }

    /// Waits until no request is queued, in flight or dispatching.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }

    /// Registers a newly seeded request.
    pub(crate) fn seed(self: &Arc<Self>) -> RequestTicket {
        self.queued_requests.fetch_add(1, Ordering::SeqCst);
        RequestTicket {
            state: Arc::clone(self),
            phase: Phase::Queued,
        }
    }

    fn counter(&self, phase: Phase) -> &AtomicUsize {
        match phase {
            Phase::Queued => &self.queued_requests,
            Phase::InFlight => &self.in_flight_requests,
            Phase::Dispatching => &self.dispatching_requests,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Queued,
    InFlight,
    Dispatching,
}

/// Tracks one request through the engine; removes it from the counts on drop.
#[derive(Debug)]
pub(crate) struct RequestTicket {
    state: Arc<CrawlerState>,
    phase: Phase,
}

impl RequestTicket {
    pub(crate) fn admitted(&mut self) {
        self.advance(Phase::InFlight);
    }

    pub(crate) fn dispatching(&mut self) {
        self.advance(Phase::Dispatching);
    }

    fn advance(&mut self, next: Phase) {
        // Increment first so the totals never read as idle mid-transition.
        self.state.counter(next).fetch_add(1, Ordering::SeqCst);
        self.state.counter(self.phase).fetch_sub(1, Ordering::SeqCst);
        self.phase = next;
    }
}

impl Drop for RequestTicket {
    fn drop(&mut self) {
        self.state.counter(self.phase).fetch_sub(1, Ordering::SeqCst);
        if self.state.is_idle() {
            self.state.idle.notify_waiters();
        }
    }
}
