//! Error types for the dynamic DNS updater
//!
//! The first four variants are the fatal stops of a reconciliation pass. The
//! rest describe collaborator and input failures.

use thiserror::Error;

/// Result type alias for updater operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the updater
#[derive(Error, Debug)]
pub enum Error {
    /// No valid public address was obtained within the attempt budget
    #[error("could not determine public IP address after {attempts} attempt(s)")]
    AddressDiscovery {
        /// Number of attempts consumed
        attempts: u32,
    },

    /// The record does not fall under any hosted zone in the account
    #[error("DNS record '{record}' does not belong to any hosted zone in this account")]
    ZoneNotFound {
        /// The target record name
        record: String,
    },

    /// The existing record holds more than one target
    #[error(
        "record '{record}' has {values} targets; refusing to overwrite a multi-value record. \
         Remove the extra targets manually (or leave just one) if this is the right record"
    )]
    AmbiguousRecord {
        /// The target record name
        record: String,
        /// Number of target values found
        values: usize,
    },

    /// The existing record is of a shape this tool does not manage
    #[error("record '{record}' cannot be managed: {reason}")]
    UnsupportedRecord {
        /// The target record name
        record: String,
        /// Why the record was rejected
        reason: String,
    },

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// HTTP client errors (from the address lookup endpoint)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Notification delivery errors
    #[error("Notification error: {0}")]
    Notification(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create an address discovery error
    pub fn address_discovery(attempts: u32) -> Self {
        Self::AddressDiscovery { attempts }
    }

    /// Create a "zone not found" error
    pub fn zone_not_found(record: impl Into<String>) -> Self {
        Self::ZoneNotFound {
            record: record.into(),
        }
    }

    /// Create an ambiguous record error
    pub fn ambiguous_record(record: impl Into<String>, values: usize) -> Self {
        Self::AmbiguousRecord {
            record: record.into(),
            values,
        }
    }

    /// Create an unsupported record error
    pub fn unsupported_record(record: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedRecord {
            record: record.into(),
            reason: reason.into(),
        }
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a notification error
    pub fn notification(msg: impl Into<String>) -> Self {
        Self::Notification(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this error is one of the deliberate safety stops
    ///
    /// These are never transient: rerunning without changing the account or
    /// the arguments produces the same error.
    pub fn is_fatal_guard(&self) -> bool {
        matches!(
            self,
            Self::ZoneNotFound { .. } | Self::AmbiguousRecord { .. } | Self::UnsupportedRecord { .. }
        )
    }
}
