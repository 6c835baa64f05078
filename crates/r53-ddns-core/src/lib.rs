// # r53-ddns-core
//
// Record reconciliation engine for the Route 53 dynamic DNS updater.
//
// ## Architecture Overview
//
// One invocation performs one check-and-maybe-update pass:
// - **ZoneCatalog / locate**: Resolve the target record to the hosted zone that owns it
// - **PublicAddressResolver**: Discover the host's public address, validating and retrying
// - **inspect_record**: Read back the current A record, refusing multi-value records
// - **Reconciler**: Decide whether an upsert is needed, apply it, notify on change
//
// ## Collaborators
//
// Network access lives behind three traits implemented by sibling crates:
// - **ZoneDirectory**: Hosted zone and record set API (`r53-ddns-provider-route53`)
// - **AddressLookup**: Plain-text "what is my IP" endpoint (`r53-ddns-ip-http`)
// - **Notifier**: Change notification topic (`r53-ddns-notify-sns`)
//
// ## Design Principles
//
// 1. **Single pass**: No daemon loop, no persisted state; the provider's records are the only memory
// 2. **Safety first**: Anything other than a single-valued A record is a fatal stop
// 3. **Idempotency**: A second pass with unchanged inputs never writes
// 4. **Library-First**: All decision logic is usable and testable without the binary

pub mod config;
pub mod engine;
pub mod error;
pub mod records;
pub mod resolver;
pub mod traits;
pub mod zones;

// Re-export core types for convenience
pub use config::{DEFAULT_MAX_ATTEMPTS, DEFAULT_TTL, UpdaterConfig};
pub use engine::{ReconciliationDecision, Reconciler, UpdateOutcome, UpdateReason, decide};
pub use error::{Error, Result};
pub use records::{AddressRecordState, inspect_record};
pub use resolver::{IpVersion, PublicAddressResolver, is_global};
pub use traits::{AddressLookup, Notifier, ZoneDirectory};
pub use zones::{HostedZone, ZoneCatalog, locate};
