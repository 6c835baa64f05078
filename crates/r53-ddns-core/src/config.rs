//! Configuration types for the dynamic DNS updater
//!
//! The binary builds an [`UpdaterConfig`] from command-line arguments (with
//! environment fallbacks) and hands it to the [`Reconciler`](crate::Reconciler).

use serde::{Deserialize, Serialize};

/// TTL applied when the record does not exist yet and no override is given
pub const DEFAULT_TTL: u32 = 60;

/// Default number of attempts to discover the public address
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Largest TTL Route 53 accepts
pub const MAX_TTL: u32 = 2_147_483_647;

/// Upper bound on the address discovery attempt budget
const MAX_ATTEMPTS_LIMIT: u32 = 100;

/// Upper bound on the delay between discovery attempts
const MAX_RETRY_DELAY_SECS: u64 = 300;

/// Configuration for a single reconciliation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Fully-qualified name of the A record to keep up to date
    pub record_name: String,

    /// TTL to apply instead of the existing (or default) one
    #[serde(default)]
    pub ttl_override: Option<u32>,

    /// How many times to ask the lookup endpoint for a usable address
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Topic to notify after the record was changed
    #[serde(default)]
    pub notify_topic: Option<String>,

    /// Delay between address discovery attempts (in seconds)
    #[serde(default)]
    pub retry_delay_secs: u64,

    /// Perform every read but skip the write and the notification
    #[serde(default)]
    pub dry_run: bool,
}

impl UpdaterConfig {
    /// Create a configuration for `record_name` with defaults for everything else
    pub fn new(record_name: impl Into<String>) -> Self {
        Self {
            record_name: record_name.into(),
            ttl_override: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            notify_topic: None,
            retry_delay_secs: 0,
            dry_run: false,
        }
    }

    /// Set the TTL override
    pub fn with_ttl_override(mut self, ttl: Option<u32>) -> Self {
        self.ttl_override = ttl;
        self
    }

    /// Set the address discovery attempt budget
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the notification topic
    pub fn with_notify_topic(mut self, topic: Option<String>) -> Self {
        self.notify_topic = topic;
        self
    }

    /// Set the delay between discovery attempts
    pub fn with_retry_delay_secs(mut self, secs: u64) -> Self {
        self.retry_delay_secs = secs;
        self
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_record_name(&self.record_name)?;

        if self.max_attempts == 0 || self.max_attempts > MAX_ATTEMPTS_LIMIT {
            return Err(crate::Error::config(format!(
                "max attempts must be between 1 and {}. Got: {}",
                MAX_ATTEMPTS_LIMIT, self.max_attempts
            )));
        }

        if let Some(ttl) = self.ttl_override
            && (ttl == 0 || ttl > MAX_TTL)
        {
            return Err(crate::Error::config(format!(
                "TTL must be between 1 and {}. Got: {}",
                MAX_TTL, ttl
            )));
        }

        if self.retry_delay_secs > MAX_RETRY_DELAY_SECS {
            return Err(crate::Error::config(format!(
                "retry delay must be at most {} seconds. Got: {}",
                MAX_RETRY_DELAY_SECS, self.retry_delay_secs
            )));
        }

        if let Some(ref topic) = self.notify_topic {
            validate_topic_arn(topic)?;
        }

        Ok(())
    }
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

/// Validate that a string is a usable record name
///
/// Basic RFC 1035 checks plus a leading `*` label for wildcard records. A
/// single trailing dot is accepted.
pub fn validate_record_name(name: &str) -> Result<(), crate::Error> {
    let name = name.strip_suffix('.').unwrap_or(name);

    if name.is_empty() {
        return Err(crate::Error::config("record name cannot be empty"));
    }

    if name.len() > 253 {
        return Err(crate::Error::config(format!(
            "record name too long: {} chars (max 253). Got: {}",
            name.len(),
            name
        )));
    }

    for (index, label) in name.split('.').enumerate() {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "record name has empty label: '{}'",
                name
            )));
        }

        if index == 0 && label == "*" {
            continue;
        }

        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(crate::Error::config(format!(
                "label contains invalid characters. Label: '{}'. \
                 Valid: alphanumeric and hyphen only.",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::config(format!(
                "label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}

/// Check the shape `arn:<partition>:sns:<region>:<account>:<name>`
fn validate_topic_arn(topic: &str) -> Result<(), crate::Error> {
    let parts: Vec<&str> = topic.split(':').collect();
    let well_formed = parts.len() == 6
        && parts[0] == "arn"
        && parts[2] == "sns"
        && parts.iter().all(|p| !p.is_empty());

    if !well_formed {
        return Err(crate::Error::config(format!(
            "notification topic must be an SNS topic ARN \
             (arn:aws:sns:<region>:<account>:<name>). Got: {}",
            topic
        )));
    }

    Ok(())
}
