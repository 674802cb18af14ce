//! The uniform response shape handed to spiders.
//!
//! A [`Response`] is only built by the engine after a fetch answered with
//! status `200`. It is never mutated afterwards: the router hands the same
//! value to every matching spider and then drops it.

use crate::request::Request;
use reqwest::Method;
use std::collections::HashMap;
use url::Url;

/// A successfully fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    method: Method,
    url: Url,
    headers: HashMap<String, String>,
    body: String,
}

impl Response {
    /// Creates an empty response (no headers, empty body) for `method url`.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HashMap::new(),
            body: String::new(),
        }
    }

    /// Creates an empty response for the request that produced it.
    pub fn for_request(request: &Request) -> Self {
        Self::new(request.method().clone(), request.url().clone())
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The URL of the request this response answers.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}
