//! # Request Module
//!
//! Normalizes caller-supplied seeds into the canonical [`Request`] consumed by
//! the engine.
//!
//! A seed is either a bare URL string or a partial request object
//! ([`RequestOptions`]). Normalization is pure and synchronous:
//!
//! - the URL is parsed into a structured [`Url`];
//! - the method defaults to `GET` and is uppercased when given;
//! - headers default to an empty map;
//! - the body encoding is always UTF-8.
//!
//! ## Example
//!
//! ```rust
//! use spider_engine::request::{Request, RequestOptions, Seed};
//!
//! let req = Request::from_seed("http://example.com/a").unwrap();
//! assert_eq!(req.method().as_str(), "GET");
//! assert_eq!(req.url().path(), "/a");
//!
//! let seed = Seed::from(RequestOptions::new("http://example.com/form").method("post"));
//! let req = Request::from_seed(seed).unwrap();
//! assert_eq!(req.method().as_str(), "POST");
//! ```

use crate::error::SpiderError;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use url::Url;

/// Text encoding applied to response bodies. Only UTF-8 is supported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyEncoding {
    #[default]
    Utf8,
}

impl BodyEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyEncoding::Utf8 => "utf-8",
        }
    }
}

/// A partial request specification, as accepted in seed lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

impl RequestOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Raw seed input: a URL string or a partial request object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seed {
    Url(String),
    Options(RequestOptions),
}

impl From<&str> for Seed {
    fn from(url: &str) -> Self {
        Seed::Url(url.to_string())
    }
}

impl From<String> for Seed {
    fn from(url: String) -> Self {
        Seed::Url(url)
    }
}

impl From<&Url> for Seed {
    fn from(url: &Url) -> Self {
        Seed::Url(url.to_string())
    }
}

impl From<Url> for Seed {
    fn from(url: Url) -> Self {
        Seed::Url(url.into())
    }
}

impl From<RequestOptions> for Seed {
    fn from(options: RequestOptions) -> Self {
        Seed::Options(options)
    }
}

/// A normalized request, ready to be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    url: Url,
    method: Method,
    headers: HashMap<String, String>,
    encoding: BodyEncoding,
}

impl Request {
    /// Creates a `GET` request for an already parsed URL.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            method: Method::GET,
            headers: HashMap::new(),
            encoding: BodyEncoding::Utf8,
        }
    }

    /// Normalizes a seed into a request.
    pub fn from_seed(seed: impl Into<Seed>) -> Result<Self, SpiderError> {
        match seed.into() {
            Seed::Url(url) => Ok(Self::new(parse_url(&url)?)),
            Seed::Options(options) => {
                let mut request = Self::new(parse_url(&options.url)?);
                if let Some(method) = options.method.as_deref().filter(|m| !m.is_empty()) {
                    request.method = parse_method(method)?;
                }
                request.headers = options.headers;
                Ok(request)
            }
        }
    }

    /// Returns a copy of this request with the given method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Returns a copy of this request with an additional header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn encoding(&self) -> BodyEncoding {
        self.encoding
    }
}

impl TryFrom<Seed> for Request {
    type Error = SpiderError;

    fn try_from(seed: Seed) -> Result<Self, Self::Error> {
        Request::from_seed(seed)
    }
}

impl FromStr for Request {
    type Err = SpiderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Request::from_seed(s)
    }
}

fn parse_url(input: &str) -> Result<Url, SpiderError> {
    Url::parse(input).map_err(|e| SpiderError::malformed(input, e))
}

fn parse_method(input: &str) -> Result<Method, SpiderError> {
    Method::from_bytes(input.to_ascii_uppercase().as_bytes())
        .map_err(|e| SpiderError::malformed(input, e))
}
