// # Address Lookup Trait
//
// Defines the interface to an external "what is my IP" endpoint.
//
// ## Implementations
//
// - HTTP plain-text endpoint: `r53-ddns-ip-http` crate
//
// The lookup only fetches. Trimming, parsing, routability checks and retries
// are done by `PublicAddressResolver` so that every endpoint gets the same
// validation.

use async_trait::async_trait;

/// Trait for public address lookup implementations
#[async_trait]
pub trait AddressLookup: Send + Sync {
    /// Fetch the raw response body once
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The body as returned, surrounding whitespace included
    /// - `Err(Error)`: Transport failure or non-success status
    async fn fetch(&self) -> Result<String, crate::Error>;

    /// Endpoint description for logging
    fn endpoint(&self) -> &str;
}
