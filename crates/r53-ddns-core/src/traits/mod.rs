//! Collaborator traits for the updater
//!
//! Every network boundary of a reconciliation pass sits behind one of these:
//!
//! - [`ZoneDirectory`]: List hosted zones and record sets, upsert a record
//! - [`AddressLookup`]: Ask an external endpoint for our public address
//! - [`Notifier`]: Publish a change message to a topic

pub mod address_lookup;
pub mod notifier;
pub mod zone_directory;

pub use address_lookup::AddressLookup;
pub use notifier::Notifier;
pub use zone_directory::{
    A_RECORD, RecordSet, RecordSetPage, RecordUpsert, ZoneDirectory, ZonePage,
};
