//! Network layer
//!
//! Fetching is abstracted behind the [`Fetcher`] trait so navigation,
//! preloading, and resource hints can run against an HTTP client in
//! production and an in-memory stub in tests.

mod client;

pub use client::HttpFetcher;

use std::future::Future;

use crate::utils::error::FetchError;

/// A fetched page or resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    status: u16,
    body: Vec<u8>,
}

impl FetchedPage {
    /// Create a fetched page from a status code and body
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// HTTP status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Check if the response was successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Response body bytes
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Response body as text, lossy on invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Source of pages and resources, keyed by site-relative path
pub trait Fetcher: Send + Sync + 'static {
    /// Fetch the resource at `path`
    fn fetch(&self, path: &str) -> impl Future<Output = Result<FetchedPage, FetchError>> + Send;
}
