//! HTTP client backed by reqwest

use log::debug;
use reqwest::Client;
use url::Url;

use super::{FetchedPage, Fetcher};
use crate::utils::error::FetchError;

/// Fetcher that resolves site-relative paths against a base URL
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    base: Url,
}

impl HttpFetcher {
    /// Create a fetcher for a site rooted at `base`
    pub fn new(base: Url) -> Self {
        Self {
            client: Client::new(),
            base,
        }
    }

    /// Create a fetcher with a preconfigured client
    pub fn with_client(client: Client, base: Url) -> Self {
        Self { client, base }
    }

    /// Base URL requests are resolved against
    pub fn base(&self) -> &Url {
        &self.base
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, path: &str) -> Result<FetchedPage, FetchError> {
        let url = self
            .base
            .join(path)
            .map_err(|e| FetchError::InvalidUrl(format!("{path}: {e}")))?;
        debug!("Fetching: {url}");

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            FetchError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(FetchedPage::new(status, body.to_vec()))
    }
}
