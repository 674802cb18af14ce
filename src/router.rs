//! Pattern-based response dispatch.
//!
//! # Responsibilities
//! - Store (pattern, spider) bindings in registration order
//! - Test a response's full URL string against every pattern
//! - Deliver the response to every spider whose pattern matches
//!
//! # Design Decisions
//! - All matches fire; there is no "first match wins" and no priority
//! - Zero matches is not an error, the response is dropped
//! - Patterns are regular expressions searched anywhere in the URL string
//! - Bindings are snapshotted before delivery so spiders may add routes

use crate::events::Event;
use crate::response::Response;
use crate::spider::Spider;
use log::{debug, trace};
use parking_lot::RwLock;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

const MATCH_ALL: &str = "^.*$";

/// A compiled URL matcher.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    /// Compiles a regular expression pattern.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    /// The catch-all pattern, matching every URL.
    pub fn any() -> Self {
        Self {
            regex: Regex::new(MATCH_ALL).expect("catch-all pattern compiles"),
        }
    }

    pub fn matches(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Self::any()
    }
}

impl FromStr for Pattern {
    type Err = regex::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pattern::new(s)
    }
}

impl From<Regex> for Pattern {
    fn from(regex: Regex) -> Self {
        Self { regex }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A (pattern, spider) pair.
#[derive(Debug, Clone)]
pub struct Binding {
    pub pattern: Pattern,
    pub spider: Arc<Spider>,
}

/// Ordered list of bindings with fan-out dispatch.
#[derive(Debug, Default)]
pub struct Router {
    bindings: RwLock<Vec<Binding>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a binding. `None` binds the spider to every URL.
    ///
    /// Duplicate bindings are kept; each fires independently.
    pub fn add(&self, pattern: Option<Pattern>, spider: Arc<Spider>) -> &Self {
        let pattern = pattern.unwrap_or_else(Pattern::any);
        debug!("Binding spider '{}' to pattern {}", spider.name(), pattern);
        self.bindings.write().push(Binding { pattern, spider });
        self
    }

    /// Delivers `response` to every spider whose pattern matches its URL.
    ///
    /// Returns the number of spiders the response was delivered to.
    pub fn route(&self, response: &Response) -> usize {
        let targets = self.matching(response.url().as_str());
        if targets.is_empty() {
            debug!("No route matched {}, dropping response", response.url());
            return 0;
        }

        for spider in &targets {
            trace!(
                "Dispatching {} event for {} to spider '{}'",
                response.kind(),
                response.url(),
                spider.name()
            );
            spider.publish(response);
        }
        targets.len()
    }

    /// Spiders bound to patterns matching `url`, in registration order.
    pub fn matching(&self, url: &str) -> Vec<Arc<Spider>> {
        self.bindings
            .read()
            .iter()
            .filter(|b| b.pattern.matches(url))
            .map(|b| Arc::clone(&b.spider))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use url::Url;

    fn response(url: &str) -> Response {
        Response::new(reqwest::Method::GET, Url::parse(url).unwrap())
    }

    fn recording_spider(name: &str, log: &Arc<Mutex<Vec<String>>>) -> Arc<Spider> {
        let spider = Arc::new(Spider::new(name));
        let log = Arc::clone(log);
        let name = name.to_string();
        spider.on_response(move |res| {
            log.lock().unwrap().push(format!("{name}:{}", res.url().path()));
        });
        spider
    }

    #[test]
    fn test_no_match_drops_response() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new();
        router.add(Some(Pattern::new("/blog/").unwrap()), recording_spider("blog", &log));

        assert_eq!(router.route(&response("http://example.com/shop/1")), 0);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_single_match() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new();
        router
            .add(Some(Pattern::new("/blog/").unwrap()), recording_spider("blog", &log))
            .add(Some(Pattern::new("/shop/").unwrap()), recording_spider("shop", &log));

        assert_eq!(router.route(&response("http://example.com/shop/1")), 1);
        assert_eq!(*log.lock().unwrap(), vec!["shop:/shop/1"]);
    }

    #[test]
    fn test_overlapping_patterns_all_fire_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new();
        router
            .add(Some(Pattern::new("example\\.com").unwrap()), recording_spider("site", &log))
            .add(Some(Pattern::new("/shop/").unwrap()), recording_spider("shop", &log))
            .add(None, recording_spider("all", &log))
            .add(Some(Pattern::new("/blog/").unwrap()), recording_spider("blog", &log));

        assert_eq!(router.route(&response("http://example.com/shop/9")), 3);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["site:/shop/9", "shop:/shop/9", "all:/shop/9"]
        );
    }

    #[test]
    fn test_duplicate_bindings_each_fire() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new();
        let spider = recording_spider("twice", &log);
        router.add(None, Arc::clone(&spider)).add(None, spider);

        assert_eq!(router.len(), 2);
        assert_eq!(router.route(&response("http://example.com/")), 2);
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_catch_all_matches_every_url() {
        let any = Pattern::any();
        for url in [
            "http://example.com/",
            "https://user:pw@sub.example.org:8443/a/b?c=d#e",
            "ftp://files.example.net/pub/file.tar.gz",
            "file:///etc/hosts",
            "data:text/plain,hello",
        ] {
            let parsed = Url::parse(url).unwrap();
            assert!(any.matches(parsed.as_str()), "{url} should match");
        }
    }

    #[test]
    fn test_pattern_sees_whole_url() {
        let router = Router::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        router.add(Some("^https://".parse().unwrap()), recording_spider("tls", &log));
        router.add(Some(Pattern::new("page=2").unwrap()), recording_spider("paged", &log));

        assert_eq!(router.route(&response("https://example.com/list?page=2")), 2);
        assert_eq!(router.route(&response("http://example.com/list?page=1")), 0);
    }
}
