// # Zone Directory Trait
//
// Defines the interface to the hosted-zone DNS service.
//
// ## Implementations
//
// - Route 53: `r53-ddns-provider-route53` crate
// - Tests: in-memory directory in `tests/common`
//
// ## Usage
//
// ```rust,ignore
// use r53_ddns_core::ZoneDirectory;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let directory = /* ZoneDirectory implementation */;
//
//     let page = directory.list_zones(None, 100).await?;
//     for zone in page.zones {
//         println!("{} ({})", zone.name, zone.id);
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::zones::HostedZone;

/// Record type string for IPv4 address records
pub const A_RECORD: &str = "A";

/// One page of hosted zones
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZonePage {
    /// Zones on this page
    pub zones: Vec<HostedZone>,
    /// Marker to pass to the next `list_zones` call, `None` on the last page
    pub next_marker: Option<String>,
}

/// A record set as reported by the provider
///
/// Names are already normalized by the implementation: no trailing dot and
/// provider escapes decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSet {
    /// Record name
    pub name: String,
    /// Record type (e.g. "A", "CNAME")
    pub record_type: String,
    /// Time-to-live in seconds, absent for alias records
    pub ttl: Option<u32>,
    /// Literal target values
    pub values: Vec<String>,
    /// Alias target DNS name, if this is an alias record
    pub alias_target: Option<String>,
    /// Distinguishes sets sharing a name and type (weighted, latency, ...)
    pub set_identifier: Option<String>,
}

impl RecordSet {
    /// Create a plain (non-alias) record set
    pub fn new(
        name: impl Into<String>,
        record_type: impl Into<String>,
        ttl: Option<u32>,
        values: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.into(),
            ttl,
            values,
            alias_target: None,
            set_identifier: None,
        }
    }

    /// Mark this record set as an alias to `target`
    pub fn with_alias_target(mut self, target: impl Into<String>) -> Self {
        self.alias_target = Some(target.into());
        self
    }

    /// Tag this record set with a routing-policy set identifier
    pub fn with_set_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.set_identifier = Some(identifier.into());
        self
    }
}

/// One page of a record set listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSetPage {
    /// Record sets on this page
    pub records: Vec<RecordSet>,
    /// Whether more pages follow
    pub truncated: bool,
    /// Name to start the next page from
    pub next_name: Option<String>,
    /// Type to start the next page from
    pub next_type: Option<String>,
    /// Set identifier to start the next page from, when the page boundary
    /// falls between sets sharing a name and type
    pub next_identifier: Option<String>,
}

/// A create-or-replace write of a single record set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpsert {
    /// Record name
    pub name: String,
    /// Record type
    pub record_type: String,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Complete replacement value set
    pub values: Vec<String>,
}

/// Trait for hosted-zone DNS service implementations
///
/// Implementations translate between the provider's API and the types above.
/// They make exactly one API call per method invocation: paging, matching and
/// the update decision all belong to the core.
///
/// # Thread Safety
///
/// Implementations must be usable from async tasks (`Send + Sync`), even
/// though a reconciliation pass issues its calls one at a time.
#[async_trait]
pub trait ZoneDirectory: Send + Sync {
    /// List one page of hosted zones
    ///
    /// # Parameters
    ///
    /// - `marker`: Continuation marker from the previous page, `None` for the first
    /// - `page_size`: Maximum number of zones to return
    async fn list_zones(
        &self,
        marker: Option<&str>,
        page_size: u32,
    ) -> Result<ZonePage, crate::Error>;

    /// List one page of record sets in a zone
    ///
    /// The listing starts at (`start_name`, `start_type`, `start_identifier`)
    /// in the provider's ordering and continues from there.
    ///
    /// # Parameters
    ///
    /// - `zone_id`: Hosted zone identifier
    /// - `start_name`: Record name to start listing from
    /// - `start_type`: Record type to start listing from
    /// - `start_identifier`: Set identifier to start from, `None` for the first set
    /// - `page_size`: Maximum number of record sets to return
    async fn list_record_sets(
        &self,
        zone_id: &str,
        start_name: &str,
        start_type: &str,
        start_identifier: Option<&str>,
        page_size: u32,
    ) -> Result<RecordSetPage, crate::Error>;

    /// Create or fully replace a record set
    ///
    /// # Parameters
    ///
    /// - `zone_id`: Hosted zone identifier
    /// - `upsert`: The record set to write
    async fn upsert_record(&self, zone_id: &str, upsert: &RecordUpsert)
    -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
