// # Route 53 Zone Directory
//
// This crate provides the AWS Route 53 implementation of `ZoneDirectory`.
//
// ## Responsibilities
//
// - One Route 53 API call per trait method
// - Translation between SDK types and core types:
//   - zone ids lose their `/hostedzone/` prefix
//   - names lose the trailing dot and have `\ddd` octal escapes decoded
//     (Route 53 reports `*` as `\052`)
// - TTL conversion between `u32` (core) and `i64` (SDK)
//
// Paging, record matching and the update decision are owned by
// `r53-ddns-core`. Transport-level retries are the SDK's own.
//
// ## Credentials
//
// Credentials and region come from the standard AWS provider chain
// (environment, shared config/credentials files, instance profile).
// Route 53 is a global service; the region only matters for signing.
//
// ## API Reference
//
// - ListHostedZones: GET `/2013-04-01/hostedzone`
// - ListResourceRecordSets: GET `/2013-04-01/hostedzone/{Id}/rrset`
// - ChangeResourceRecordSets: POST `/2013-04-01/hostedzone/{Id}/rrset`

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_route53::Client;
use aws_sdk_route53::error::DisplayErrorContext;
use aws_sdk_route53::types::{
    Change, ChangeAction, ChangeBatch, ResourceRecord, ResourceRecordSet, RrType,
};
use r53_ddns_core::traits::{RecordSet, RecordSetPage, RecordUpsert, ZoneDirectory, ZonePage};
use r53_ddns_core::{Error, HostedZone, Result};

const PROVIDER: &str = "route53";

/// Prefix Route 53 puts in front of hosted zone ids
const HOSTED_ZONE_PREFIX: &str = "/hostedzone/";

/// Route 53 backed hosted zone directory
pub struct Route53Directory {
    client: Client,
    region: Option<String>,
}

impl std::fmt::Debug for Route53Directory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route53Directory")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

impl Route53Directory {
    /// Create a directory on top of an existing SDK client
    pub fn new(client: Client) -> Self {
        let region = client.config().region().map(|r| r.to_string());
        Self { client, region }
    }

    /// Create a directory using the default AWS configuration chain
    pub async fn from_env() -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::new(Client::new(&sdk_config))
    }

    fn sdk_error(action: &str, err: impl std::error::Error) -> Error {
        Error::provider(PROVIDER, format!("{}: {}", action, DisplayErrorContext(err)))
    }
}

#[async_trait]
impl ZoneDirectory for Route53Directory {
    async fn list_zones(&self, marker: Option<&str>, page_size: u32) -> Result<ZonePage> {
        let output = self
            .client
            .list_hosted_zones()
            .set_marker(marker.map(str::to_string))
            .max_items(page_size_param(page_size))
            .send()
            .await
            .map_err(|e| Self::sdk_error("failed to list hosted zones", e))?;

        let zones = output
            .hosted_zones()
            .iter()
            .map(|zone| {
                let private = zone.config().is_some_and(|config| config.private_zone());
                HostedZone::new(decode_name(zone.name()), zone_id_from_path(zone.id()))
                    .with_private(private)
            })
            .collect();

        let next_marker = if output.is_truncated() {
            output.next_marker().map(str::to_string)
        } else {
            None
        };

        Ok(ZonePage { zones, next_marker })
    }

    async fn list_record_sets(
        &self,
        zone_id: &str,
        start_name: &str,
        start_type: &str,
        start_identifier: Option<&str>,
        page_size: u32,
    ) -> Result<RecordSetPage> {
        tracing::debug!(
            "Listing record sets in {} from {} {} {}",
            zone_id,
            start_name,
            start_type,
            start_identifier.unwrap_or("-")
        );

        let output = self
            .client
            .list_resource_record_sets()
            .hosted_zone_id(zone_id)
            .start_record_name(start_name)
            .start_record_type(RrType::from(start_type))
            .set_start_record_identifier(start_identifier.map(str::to_string))
            .max_items(page_size_param(page_size))
            .send()
            .await
            .map_err(|e| Self::sdk_error("failed to list record sets", e))?;

        let records = output
            .resource_record_sets()
            .iter()
            .map(record_set_from_sdk)
            .collect::<Result<Vec<_>>>()?;

        Ok(RecordSetPage {
            records,
            truncated: output.is_truncated(),
            next_name: output.next_record_name().map(str::to_string),
            next_type: output.next_record_type().map(|t| t.as_str().to_string()),
            next_identifier: output.next_record_identifier().map(str::to_string),
        })
    }

    async fn upsert_record(&self, zone_id: &str, upsert: &RecordUpsert) -> Result<()> {
        let batch = change_batch(upsert)?;

        self.client
            .change_resource_record_sets()
            .hosted_zone_id(zone_id)
            .change_batch(batch)
            .send()
            .await
            .map_err(|e| Self::sdk_error("failed to change record sets", e))?;

        tracing::debug!(
            "Submitted UPSERT for {} {} in {}",
            upsert.name,
            upsert.record_type,
            zone_id
        );
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

fn page_size_param(page_size: u32) -> i32 {
    i32::try_from(page_size).unwrap_or(i32::MAX)
}

/// Build the single-change UPSERT batch for `upsert`
fn change_batch(upsert: &RecordUpsert) -> Result<ChangeBatch> {
    let build_error = |e: aws_sdk_route53::error::BuildError| {
        Error::provider(PROVIDER, format!("invalid change request: {}", e))
    };

    let resource_records = upsert
        .values
        .iter()
        .map(|value| ResourceRecord::builder().value(value).build())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(build_error)?;

    let record_set = ResourceRecordSet::builder()
        .name(&upsert.name)
        .r#type(RrType::from(upsert.record_type.as_str()))
        .ttl(i64::from(upsert.ttl))
        .set_resource_records(Some(resource_records))
        .build()
        .map_err(build_error)?;

    let change = Change::builder()
        .action(ChangeAction::Upsert)
        .resource_record_set(record_set)
        .build()
        .map_err(build_error)?;

    ChangeBatch::builder()
        .changes(change)
        .comment(format!("r53-dns-updater: {}", upsert.name))
        .build()
        .map_err(build_error)
}

fn record_set_from_sdk(set: &ResourceRecordSet) -> Result<RecordSet> {
    let ttl = set
        .ttl()
        .map(|ttl| {
            u32::try_from(ttl).map_err(|_| {
                Error::provider(PROVIDER, format!("TTL {} of {} is out of range", ttl, set.name()))
            })
        })
        .transpose()?;

    let values = set
        .resource_records()
        .iter()
        .map(|record| record.value().to_string())
        .collect();

    let mut record = RecordSet::new(decode_name(set.name()), set.r#type().as_str(), ttl, values);
    if let Some(alias) = set.alias_target() {
        record = record.with_alias_target(decode_name(alias.dns_name()));
    }
    if let Some(identifier) = set.set_identifier() {
        record = record.with_set_identifier(identifier);
    }

    Ok(record)
}

/// `/hostedzone/Z123` -> `Z123`
fn zone_id_from_path(id: &str) -> String {
    id.strip_prefix(HOSTED_ZONE_PREFIX).unwrap_or(id).to_string()
}

/// Drop the trailing dot and decode `\ddd` octal escapes
fn decode_name(name: &str) -> String {
    let name = name.strip_suffix('.').unwrap_or(name);
    let bytes = name.as_bytes();
    let mut decoded = String::with_capacity(name.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' {
            let escaped = name
                .get(i + 1..i + 4)
                .filter(|digits| digits.bytes().all(|b| (b'0'..=b'7').contains(&b)))
                .and_then(|digits| u8::from_str_radix(digits, 8).ok());
            if let Some(code) = escaped {
                decoded.push(char::from(code));
                i += 4;
                continue;
            }
        }
        let Some(ch) = name[i..].chars().next() else {
            break;
        };
        decoded.push(ch);
        i += ch.len_utf8();
    }

    decoded
}
