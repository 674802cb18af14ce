//! Terminal handlers for the engine's `Response` and `Error` events.

use super::core::EngineInner;
use crate::error::FetchFailure;
use crate::response::Response;
use tracing::{error, trace};

/// Hands a response to the router.
pub(crate) fn handle_response(inner: &EngineInner, response: &Response) {
    let deliveries = inner.router.route(response);
    inner.stats.record_routing(deliveries);
}

/// Final sink for failed fetches. Never propagates.
pub(crate) fn handle_error(inner: &EngineInner, failure: &FetchFailure) {
    if inner.log_errors {
        error!(
            url = %failure.url(),
            method = %failure.method(),
            status = ?failure.status(),
            "Fetch failed: {}",
            failure.reason()
        );
    } else {
        trace!(url = %failure.url(), "Dropping fetch failure: {}", failure.reason());
    }
}

#[cfg(test)]
mod tests {
    use crate::crawler::Engine;
    use crate::error::{FailureReason, FetchFailure};
    use crate::events::EngineEvent;
    use reqwest::Method;
    use std::io;
    use std::sync::{Arc, Mutex};
    use url::Url;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn not_found() -> EngineEvent {
        let url = Url::parse("http://example.com/missing").unwrap();
        EngineEvent::Error(FetchFailure::new(url, Method::GET, FailureReason::Status(404)))
    }

    fn publish_captured(engine: &Engine) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish();

        tracing::subscriber::with_default(subscriber, || engine.publish(&not_found()));
        captured.text()
    }

    #[tokio::test]
    async fn test_failures_are_reported_when_logging_enabled() {
        let engine = Engine::builder().log(true).build().unwrap();
        let text = publish_captured(&engine);

        let errors: Vec<&str> = text.lines().filter(|l| l.contains("ERROR")).collect();
        assert_eq!(errors.len(), 1, "{text}");
        assert!(errors[0].contains("http://example.com/missing"), "{text}");
        assert!(errors[0].contains("404"), "{text}");
    }

    #[tokio::test]
    async fn test_failures_are_not_reported_when_logging_disabled() {
        let engine = Engine::builder().log(false).build().unwrap();
        let text = publish_captured(&engine);

        assert!(!text.contains("ERROR"), "{text}");
    }
}
