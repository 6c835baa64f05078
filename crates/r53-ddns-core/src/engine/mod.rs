//! Record reconciliation
//!
//! The Reconciler is responsible for:
//! - Locating the hosted zone that owns the target record
//! - Discovering the host's public address
//! - Reading back the record's current state
//! - Deciding whether an upsert is needed, and applying it
//! - Notifying the configured topic after a successful write
//!
//! ## Architecture
//!
//! ```text
//!                          ┌──────────────┐
//!                          │  Reconciler  │
//!                          └──────────────┘
//!                                  │
//!       ┌─────────────────┬────────┴─────────┬─────────────────┐
//!       │                 │                  │                 │
//!       ▼                 ▼                  ▼                 ▼
//! ┌───────────┐   ┌───────────────┐  ┌──────────────┐   ┌────────────┐
//! │ZoneCatalog│   │AddressResolver│  │inspect_record│   │  Notifier  │
//! │ (locate)  │   │   (resolve)   │  │    (read)    │   │ (optional) │
//! └───────────┘   └───────────────┘  └──────────────┘   └────────────┘
//! ```
//!
//! ## Flow
//!
//! 1. Locate zone (fatal if none)
//! 2. Resolve public address (fatal once attempts are exhausted)
//! 3. Inspect record (fatal if multi-value or alias)
//! 4. Decide; if out of date, upsert the record
//! 5. After a successful upsert, notify (failures logged, never raised)

use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::{DEFAULT_TTL, UpdaterConfig};
use crate::error::{Error, Result};
use crate::records::{AddressRecordState, inspect_record};
use crate::resolver::{IpVersion, PublicAddressResolver};
use crate::traits::{A_RECORD, AddressLookup, Notifier, RecordUpsert, ZoneDirectory};
use crate::zones::{ZoneCatalog, normalize_name};

/// Why a record needs to be written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateReason {
    /// The record does not exist yet
    Missing,
    /// The record points at a different address
    AddressChanged,
    /// Same address, different TTL
    TtlChanged,
}

/// Outcome of comparing the current record with the desired one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciliationDecision {
    /// Whether an upsert is required
    pub needs_update: bool,
    /// TTL the record should carry
    pub effective_ttl: u32,
    /// Why the upsert is required, `None` when it is not
    pub reason: Option<UpdateReason>,
}

/// Decide whether the record must be written
///
/// TTL precedence is `ttl_override`, then the existing record's TTL, then
/// [`DEFAULT_TTL`]. An update is needed when the address differs, or when the
/// record exists with a TTL other than the effective one.
pub fn decide(
    state: &AddressRecordState,
    actual_ip: IpAddr,
    ttl_override: Option<u32>,
) -> ReconciliationDecision {
    let effective_ttl = ttl_override.or(state.ttl).unwrap_or(DEFAULT_TTL);

    let current_ip = state
        .target_address
        .as_deref()
        .and_then(|value| value.parse::<IpAddr>().ok());

    let reason = if !state.exists() {
        Some(UpdateReason::Missing)
    } else if current_ip != Some(actual_ip) {
        Some(UpdateReason::AddressChanged)
    } else if state.ttl != Some(effective_ttl) {
        Some(UpdateReason::TtlChanged)
    } else {
        None
    };

    ReconciliationDecision {
        needs_update: reason.is_some(),
        effective_ttl,
        reason,
    }
}

/// Result of one reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateOutcome {
    /// The target record
    pub record_name: String,
    /// Zone the record lives in
    pub zone_id: String,
    /// Whether a write was performed
    pub updated: bool,
    /// Whether the write was skipped because of dry-run mode
    pub dry_run: bool,
    /// The record's address after this pass
    pub applied_ip: IpAddr,
    /// The record's TTL after this pass
    pub applied_ttl: u32,
    /// What the record looked like before this pass
    pub previous: AddressRecordState,
}

impl fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match (self.updated, self.dry_run) {
            (true, _) => "updated",
            (false, true) => "would update",
            (false, false) => "up-to-date",
        };
        write!(
            f,
            "{} {} -> {} (ttl {}, zone {})",
            self.record_name, verb, self.applied_ip, self.applied_ttl, self.zone_id
        )
    }
}

/// Orchestrates a single check-and-maybe-update pass for one record
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`] (validates the configuration)
/// 2. Call [`Reconciler::reconcile()`]
/// 3. Drop; nothing is persisted
///
/// The zone list is cached for the lifetime of the Reconciler, so calling
/// `reconcile()` again within the same run does not list zones twice.
pub struct Reconciler {
    /// Hosted zone DNS service
    directory: Box<dyn ZoneDirectory>,

    /// Public address endpoint
    lookup: Box<dyn AddressLookup>,

    /// Change notifications (required when a topic is configured)
    notifier: Option<Box<dyn Notifier>>,

    /// Normalized target record name
    record_name: String,

    config: UpdaterConfig,
    resolver: PublicAddressResolver,
    catalog: ZoneCatalog,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `directory`: Hosted zone DNS service
    /// - `lookup`: Public address endpoint
    /// - `notifier`: Change notifier, needed only when `config.notify_topic` is set
    /// - `config`: What to reconcile and how
    pub fn new(
        directory: Box<dyn ZoneDirectory>,
        lookup: Box<dyn AddressLookup>,
        notifier: Option<Box<dyn Notifier>>,
        config: UpdaterConfig,
    ) -> Result<Self> {
        config.validate()?;

        if config.notify_topic.is_some() && notifier.is_none() {
            return Err(Error::config(
                "a notification topic is configured but no notifier was supplied",
            ));
        }

        let resolver = PublicAddressResolver::new(config.max_attempts)
            .with_version(IpVersion::V4)
            .with_retry_delay(Duration::from_secs(config.retry_delay_secs));

        Ok(Self {
            directory,
            lookup,
            notifier,
            record_name: normalize_name(&config.record_name),
            config,
            resolver,
            catalog: ZoneCatalog::new(),
        })
    }

    /// Run one reconciliation pass
    ///
    /// # Returns
    ///
    /// - `Ok(UpdateOutcome)`: The record is (now) up to date, or would be in dry-run mode
    /// - `Err(Error)`: A fatal error; nothing was written
    pub async fn reconcile(&self) -> Result<UpdateOutcome> {
        let zone = self
            .catalog
            .locate(self.directory.as_ref(), &self.record_name)
            .await?;

        let actual_ip = self.resolver.resolve(self.lookup.as_ref()).await?;

        let state = inspect_record(self.directory.as_ref(), &zone, &self.record_name).await?;

        let decision = decide(&state, actual_ip, self.config.ttl_override);
        self.log_decision(&state, actual_ip, &decision);

        let mut outcome = UpdateOutcome {
            record_name: self.record_name.clone(),
            zone_id: zone.id.clone(),
            updated: false,
            dry_run: false,
            applied_ip: actual_ip,
            applied_ttl: decision.effective_ttl,
            previous: state,
        };

        if !decision.needs_update {
            return Ok(outcome);
        }

        let upsert = RecordUpsert {
            name: self.record_name.clone(),
            record_type: A_RECORD.to_string(),
            ttl: decision.effective_ttl,
            values: vec![actual_ip.to_string()],
        };

        if self.config.dry_run {
            info!(
                "[DRY-RUN] Would upsert {} {} ttl={} values={:?} in zone {}",
                upsert.name, upsert.record_type, upsert.ttl, upsert.values, zone.id
            );
            outcome.dry_run = true;
            return Ok(outcome);
        }

        self.directory.upsert_record(&zone.id, &upsert).await?;
        info!(
            "DNS record updated successfully: {} -> {} (ttl {})",
            self.record_name, actual_ip, decision.effective_ttl
        );
        outcome.updated = true;

        self.notify_change(actual_ip).await;

        Ok(outcome)
    }

    fn log_decision(
        &self,
        state: &AddressRecordState,
        actual_ip: IpAddr,
        decision: &ReconciliationDecision,
    ) {
        if let Some(ttl) = self.config.ttl_override {
            info!("Overriding TTL with provided value of {}", ttl);
        } else if let Some(ttl) = state.ttl {
            info!("Using existing TTL value of {}", ttl);
        } else {
            info!(
                "No existing record found, using default TTL of {}",
                decision.effective_ttl
            );
        }

        match decision.reason {
            Some(UpdateReason::Missing) => warn!(
                "Creating DNS record '{}' with target {}",
                self.record_name, actual_ip
            ),
            Some(UpdateReason::AddressChanged) => warn!(
                "Updating out-of-date DNS record '{}': actual IP ({}) does not match existing record value ({})",
                self.record_name,
                actual_ip,
                state.target_address.as_deref().unwrap_or("none")
            ),
            Some(UpdateReason::TtlChanged) => warn!(
                "Updating out-of-date DNS record '{}': desired TTL ({}) does not match existing value ({})",
                self.record_name,
                decision.effective_ttl,
                state.ttl.map(|ttl| ttl.to_string()).unwrap_or_else(|| "none".to_string())
            ),
            None => info!("Target DNS record is already up-to-date, nothing to do"),
        }
    }

    /// Publish the change message; failures are logged and dropped
    async fn notify_change(&self, new_ip: IpAddr) {
        let (Some(topic), Some(notifier)) = (&self.config.notify_topic, &self.notifier) else {
            return;
        };

        let message = format!("IP for DNS record {} changed to {}", self.record_name, new_ip);
        match notifier.publish(topic, &message).await {
            Ok(()) => info!("Sent change notification to {}", topic),
            Err(e) => error!("Failed to send change notification to {}: {}", topic, e),
        }
    }
}
