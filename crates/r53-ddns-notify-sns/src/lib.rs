// # SNS Change Notifier
//
// This crate provides the AWS SNS implementation of `Notifier`.
//
// The SNS client is bound to the region named in the topic ARN
// (`arn:<partition>:sns:<region>:<account>:<name>`), independent of the
// default region used for Route 53.
//
// Delivery failures are returned as `Error::Notification`; the reconciler
// logs and swallows them, so a broken topic never fails a run.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sns::Client;
use aws_sdk_sns::config::Region;
use aws_sdk_sns::error::DisplayErrorContext;
use r53_ddns_core::traits::Notifier;
use r53_ddns_core::{Error, Result};

/// SNS backed change notifier
#[derive(Debug, Clone)]
pub struct SnsNotifier {
    client: Client,
}

impl SnsNotifier {
    /// Wrap an existing SDK client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a notifier whose client lives in the topic's region
    pub async fn for_topic(topic_arn: &str) -> Result<Self> {
        let region = region_from_arn(topic_arn)?;
        tracing::debug!("Using SNS region {} for {}", region, topic_arn);

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        Ok(Self::new(Client::new(&sdk_config)))
    }
}

#[async_trait]
impl Notifier for SnsNotifier {
    async fn publish(&self, topic: &str, message: &str) -> Result<()> {
        let output = self
            .client
            .publish()
            .topic_arn(topic)
            .message(message)
            .send()
            .await
            .map_err(|e| Error::notification(format!("{}", DisplayErrorContext(e))))?;

        tracing::debug!(
            "Published to {} (message id {})",
            topic,
            output.message_id().unwrap_or("-")
        );
        Ok(())
    }
}

/// Fourth `:`-separated field of a topic ARN
pub fn region_from_arn(topic_arn: &str) -> Result<&str> {
    match topic_arn.split(':').nth(3) {
        Some(region) if !region.is_empty() => Ok(region),
        _ => Err(Error::config(format!(
            "cannot determine region from topic ARN '{}'",
            topic_arn
        ))),
    }
}
