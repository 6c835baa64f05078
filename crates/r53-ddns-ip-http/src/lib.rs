// # HTTP Address Lookup
//
// This crate provides the plain-text HTTP implementation of `AddressLookup`.
//
// ## Behavior
//
// One `fetch()` is one GET against a "what is my IP" endpoint
// (by default `https://checkip.amazonaws.com`). The raw body is returned
// untouched; trimming, parsing and the public-address check belong to
// `PublicAddressResolver` in `r53-ddns-core`, which also owns the retry budget.
//
// Any failure (connect error, timeout, non-2xx status, unreadable body) is an
// `Error::Http`, which the resolver counts as one failed attempt.

use std::time::Duration;

use r53_ddns_core::traits::AddressLookup;
use r53_ddns_core::{Error, Result};

/// Endpoint used when none is configured
pub const DEFAULT_LOOKUP_URL: &str = "https://checkip.amazonaws.com";

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// "What is my IP" lookup over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpAddressLookup {
    /// URL to fetch the address from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl Default for HttpAddressLookup {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKUP_URL)
    }
}

impl HttpAddressLookup {
    /// Create a lookup against `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .user_agent(concat!("r53-dns-updater/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait::async_trait]
impl AddressLookup for HttpAddressLookup {
    async fn fetch(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::http(format!("Request to {} failed: {}", self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::http(format!("{} answered with HTTP {}", self.url, status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response from {}: {}", self.url, e)))?;

        tracing::debug!("{} answered {:?}", self.url, body);
        Ok(body)
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
