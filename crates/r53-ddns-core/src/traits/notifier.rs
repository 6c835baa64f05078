// # Notifier Trait
//
// Defines the interface to the change notification service.
//
// ## Implementations
//
// - SNS topics: `r53-ddns-notify-sns` crate
//
// Implementations report delivery failures as errors. The reconciler logs
// and drops them: by the time a notification is sent the record has already
// been written.

use async_trait::async_trait;

/// Trait for change notification implementations
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Publish `message` to `topic`
    ///
    /// `topic` is an opaque identifier that carries any routing information
    /// (for SNS, the region is embedded in the topic ARN).
    async fn publish(&self, topic: &str, message: &str) -> Result<(), crate::Error>;
}
