//! Current record state
//!
//! Reads back the target A record from its zone. This is a pure read: the
//! listing is paged to the end, filtered to the exact name and type, and
//! checked against the single-value rule before anything is returned.

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::traits::{A_RECORD, RecordSet, ZoneDirectory};
use crate::zones::{HostedZone, normalize_name};

/// Number of record sets requested per listing page
const RECORD_PAGE_SIZE: u32 = 100;

/// What the provider currently holds for the target record
///
/// Both fields are `None` when the record does not exist yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddressRecordState {
    /// The single target value
    pub target_address: Option<String>,
    /// The record's TTL in seconds
    pub ttl: Option<u32>,
}

impl AddressRecordState {
    /// State of a record that does not exist
    pub fn absent() -> Self {
        Self::default()
    }

    /// State of an existing record
    pub fn existing(target_address: impl Into<String>, ttl: u32) -> Self {
        Self {
            target_address: Some(target_address.into()),
            ttl: Some(ttl),
        }
    }

    /// Whether the record exists
    pub fn exists(&self) -> bool {
        self.target_address.is_some()
    }
}

/// Fetch the current state of the A record `record_name` in `zone`
///
/// # Returns
///
/// - `Ok(AddressRecordState)`: Absent, or the record's only value and TTL
/// - `Err(Error::AmbiguousRecord)`: More than one value backs the record
/// - `Err(Error::UnsupportedRecord)`: The record is an alias
pub async fn inspect_record(
    directory: &dyn ZoneDirectory,
    zone: &HostedZone,
    record_name: &str,
) -> Result<AddressRecordState> {
    let record_sets = list_from(directory, &zone.id, record_name).await?;
    let state = select_address_record(record_name, &record_sets)?;

    match (&state.target_address, state.ttl) {
        (Some(address), Some(ttl)) => {
            info!(
                "Existing record found with target of {} and TTL of {}",
                address, ttl
            );
        }
        _ => info!("Target record '{}' does not exist yet", record_name),
    }

    Ok(state)
}

/// Continuation position in a record set listing
#[derive(Debug, Clone, PartialEq, Eq)]
struct ListCursor {
    name: String,
    record_type: String,
    identifier: Option<String>,
}

/// Page through the zone starting at the target name
async fn list_from(
    directory: &dyn ZoneDirectory,
    zone_id: &str,
    record_name: &str,
) -> Result<Vec<RecordSet>> {
    let mut record_sets = Vec::new();
    let mut cursor = ListCursor {
        name: record_name.to_string(),
        record_type: A_RECORD.to_string(),
        identifier: None,
    };

    loop {
        let page = directory
            .list_record_sets(
                zone_id,
                &cursor.name,
                &cursor.record_type,
                cursor.identifier.as_deref(),
                RECORD_PAGE_SIZE,
            )
            .await?;
        record_sets.extend(page.records);

        if !page.truncated {
            break;
        }

        let (Some(name), Some(record_type)) = (page.next_name, page.next_type) else {
            return Err(Error::provider(
                directory.provider_name(),
                "record set listing was truncated without a continuation cursor",
            ));
        };
        let next = ListCursor {
            name,
            record_type,
            identifier: page.next_identifier,
        };

        // A cursor that does not move would page forever
        if next == cursor {
            return Err(Error::provider(
                directory.provider_name(),
                format!(
                    "record set listing did not advance past {} {}",
                    next.name, next.record_type
                ),
            ));
        }

        debug!(
            "{} record set listing truncated, continuing from {} {} {}",
            directory.provider_name(),
            next.name,
            next.record_type,
            next.identifier.as_deref().unwrap_or("-")
        );
        cursor = next;
    }

    Ok(record_sets)
}

/// Reduce a listing to the state of the A record named `record_name`
fn select_address_record(record_name: &str, record_sets: &[RecordSet]) -> Result<AddressRecordState> {
    let wanted = normalize_name(record_name);

    let matching: Vec<&RecordSet> = record_sets
        .iter()
        .filter(|set| set.record_type == A_RECORD && normalize_name(&set.name) == wanted)
        .collect();

    if let Some(alias) = matching.iter().find_map(|set| set.alias_target.as_deref()) {
        return Err(Error::unsupported_record(
            record_name,
            format!("it is an alias to '{}'", alias),
        ));
    }

    let value_count: usize = matching.iter().map(|set| set.values.len()).sum();
    if value_count > 1 {
        return Err(Error::ambiguous_record(record_name, value_count));
    }

    let Some(set) = matching.into_iter().find(|set| !set.values.is_empty()) else {
        return Ok(AddressRecordState::absent());
    };

    let ttl = set.ttl.ok_or_else(|| {
        Error::unsupported_record(record_name, "the provider reported no TTL for it")
    })?;

    Ok(AddressRecordState::existing(set.values[0].clone(), ttl))
}
