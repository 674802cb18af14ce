//! The fetch collaborator.
//!
//! The engine never talks to the network itself. It hands each admitted
//! [`Request`] to a [`Downloader`] and only looks at the status code, headers
//! and body that come back. Transport concerns (TLS, redirects, compression)
//! belong to the implementation; [`ReqwestDownloader`] is the default one.

use crate::request::Request;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::HashMap;
use thiserror::Error;

/// Errors reported by a downloader before any status code is available.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },
    #[error("{0}")]
    Other(String),
}

/// Raw outcome of a completed fetch.
#[derive(Debug, Clone, Default)]
pub struct Fetched {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl Fetched {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }
}

/// Performs a single HTTP request.
#[async_trait]
pub trait Downloader: Send + Sync + 'static {
    async fn download(&self, request: &Request) -> Result<Fetched, DownloadError>;
}

/// [`Downloader`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestDownloader {
    client: reqwest::Client,
}

impl ReqwestDownloader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

fn header_map(headers: &HashMap<String, String>) -> Result<HeaderMap, DownloadError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let key = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            DownloadError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            }
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| DownloadError::InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        map.insert(key, value);
    }
    Ok(map)
}

#[async_trait]
impl Downloader for ReqwestDownloader {
    async fn download(&self, request: &Request) -> Result<Fetched, DownloadError> {
        let response = self
            .client
            .request(request.method().clone(), request.url().clone())
            .headers(header_map(request.headers())?)
            .send()
            .await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?;

        Ok(Fetched {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_map_accepts_valid_headers() {
        let mut headers = HashMap::new();
        headers.insert("Accept".to_string(), "text/html".to_string());
        let map = header_map(&headers).unwrap();
        assert_eq!(map.get("accept").unwrap(), "text/html");
    }

    #[test]
    fn test_header_map_rejects_bad_name() {
        let mut headers = HashMap::new();
        headers.insert("bad header".to_string(), "x".to_string());
        assert!(matches!(
            header_map(&headers),
            Err(DownloadError::InvalidHeader { .. })
        ));
    }
}
