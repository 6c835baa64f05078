//! Hosted zone lookup
//!
//! Maps a target record name to the hosted zone that owns it. The zone list is
//! fetched once per run and kept in a [`ZoneCatalog`].
//!
//! ## Matching
//!
//! The record name is split into labels and the leftmost label is dropped
//! until the remainder names a known zone, so the most specific zone wins:
//!
//! ```text
//! host.a.example.com   -> no zone
//! a.example.com        -> zone "a.example.com"   (match, stop)
//! ```

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::traits::ZoneDirectory;

/// Number of zones requested per listing page
const ZONE_PAGE_SIZE: u32 = 100;

/// A hosted zone in the account
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostedZone {
    /// Domain name, normalized (lowercase, no trailing dot)
    pub name: String,
    /// Provider zone identifier
    pub id: String,
    /// Whether this is a private (VPC-only) zone
    #[serde(default)]
    pub private: bool,
}

impl HostedZone {
    /// Create a public hosted zone
    pub fn new(name: impl AsRef<str>, id: impl Into<String>) -> Self {
        Self {
            name: normalize_name(name.as_ref()),
            id: id.into(),
            private: false,
        }
    }

    /// Mark the zone as private
    pub fn with_private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }
}

/// Normalize a DNS name for comparison: drop one trailing dot, lowercase
pub fn normalize_name(name: &str) -> String {
    name.strip_suffix('.').unwrap_or(name).to_ascii_lowercase()
}

/// Find the zone owning `record_name`
///
/// # Parameters
///
/// - `record_name`: Fully-qualified record name
/// - `zones`: Known zones keyed by normalized name
///
/// # Returns
///
/// - `Ok(HostedZone)`: The most specific zone whose name is a label-wise suffix
/// - `Err(Error::ZoneNotFound)`: No suffix of the name is a known zone
pub fn locate(record_name: &str, zones: &HashMap<String, HostedZone>) -> Result<HostedZone> {
    let normalized = normalize_name(record_name);
    let labels: Vec<&str> = normalized.split('.').collect();

    for start in 0..labels.len() {
        let candidate = labels[start..].join(".");
        if let Some(zone) = zones.get(&candidate) {
            info!(
                "Determined the target record '{}' belongs to the hosted zone '{}' ({})",
                record_name, zone.name, zone.id
            );
            return Ok(zone.clone());
        }
    }

    Err(Error::zone_not_found(record_name))
}

/// Run-scoped cache of the account's hosted zones
///
/// The first call to [`ZoneCatalog::zones`] pages through the directory; later
/// calls return the cached map.
#[derive(Debug, Default)]
pub struct ZoneCatalog {
    zones: OnceCell<HashMap<String, HostedZone>>,
}

impl ZoneCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// All hosted zones keyed by name, fetched on first use
    pub async fn zones(&self, directory: &dyn ZoneDirectory) -> Result<&HashMap<String, HostedZone>> {
        self.zones
            .get_or_try_init(|| fetch_all_zones(directory))
            .await
    }

    /// Resolve `record_name` to its owning zone
    pub async fn locate(&self, directory: &dyn ZoneDirectory, record_name: &str) -> Result<HostedZone> {
        let zones = self.zones(directory).await?;
        locate(record_name, zones)
    }
}

async fn fetch_all_zones(directory: &dyn ZoneDirectory) -> Result<HashMap<String, HostedZone>> {
    let mut zones: HashMap<String, HostedZone> = HashMap::new();
    let mut marker: Option<String> = None;

    loop {
        let page = directory
            .list_zones(marker.as_deref(), ZONE_PAGE_SIZE)
            .await?;

        for zone in page.zones {
            insert_zone(&mut zones, zone);
        }

        match page.next_marker {
            Some(next) if marker.as_deref() == Some(next.as_str()) => {
                return Err(Error::provider(
                    directory.provider_name(),
                    format!("hosted zone listing did not advance past marker {}", next),
                ));
            }
            Some(next) => {
                debug!("Hosted zone listing truncated, continuing from marker {}", next);
                marker = Some(next);
            }
            None => break,
        }
    }

    debug!("Loaded {} hosted zone(s)", zones.len());
    Ok(zones)
}

/// Insert a zone, preferring public zones when two share a name
fn insert_zone(zones: &mut HashMap<String, HostedZone>, zone: HostedZone) {
    match zones.entry(zone.name.clone()) {
        Entry::Vacant(slot) => {
            slot.insert(zone);
        }
        Entry::Occupied(mut slot) => {
            if slot.get().private && !zone.private {
                debug!(
                    "Preferring public zone {} over private zone {} for '{}'",
                    zone.id,
                    slot.get().id,
                    zone.name
                );
                slot.insert(zone);
            } else {
                debug!("Ignoring duplicate zone {} for '{}'", zone.id, zone.name);
            }
        }
    }
}
