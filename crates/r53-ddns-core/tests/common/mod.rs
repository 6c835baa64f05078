//! Test doubles and common utilities for reconciliation contract tests
//!
//! Every double is cheap to clone and shares its state through `Arc`, so a
//! test can keep a handle for assertions after boxing a clone into the
//! `Reconciler`.

#![allow(dead_code)]

use r53_ddns_core::error::{Error, Result};
use r53_ddns_core::traits::{
    AddressLookup, Notifier, RecordSet, RecordSetPage, RecordUpsert, ZoneDirectory, ZonePage,
};
use r53_ddns_core::{HostedZone, Reconciler, UpdaterConfig};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const ZONE_ID: &str = "Z0EXAMPLE";
pub const TOPIC: &str = "arn:aws:sns:us-west-2:123456789012:dns-changes";

/// A lookup that replays a fixed script of answers
///
/// `Ok(body)` entries are returned as response bodies, `Err(msg)` entries as
/// transport failures. Once the script runs out the last entry repeats.
#[derive(Clone)]
pub struct ScriptedLookup {
    script: Arc<Mutex<VecDeque<std::result::Result<String, String>>>>,
    last: Arc<Mutex<Option<std::result::Result<String, String>>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedLookup {
    pub fn new(script: Vec<std::result::Result<&str, &str>>) -> Self {
        let script = script
            .into_iter()
            .map(|entry| entry.map(str::to_string).map_err(str::to_string))
            .collect();

        Self {
            script: Arc::new(Mutex::new(script)),
            last: Arc::new(Mutex::new(None)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always answer with `body`
    pub fn always(body: &str) -> Self {
        Self::new(vec![Ok(body)])
    }

    /// Number of times fetch() was called
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AddressLookup for ScriptedLookup {
    async fn fetch(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let next = self.script.lock().unwrap().pop_front();
        let entry = match next {
            Some(entry) => {
                *self.last.lock().unwrap() = Some(entry.clone());
                entry
            }
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Err("empty script".to_string())),
        };

        entry.map_err(Error::http)
    }

    fn endpoint(&self) -> &str {
        "scripted"
    }
}

/// An in-memory hosted zone service with provider-like paging
///
/// Record sets are kept sorted by (name, type, set identifier); listings
/// start at the first set at or after the requested start position. Upserts
/// are applied, so a second pass observes the first pass's write.
#[derive(Clone)]
pub struct InMemoryDirectory {
    zones: Arc<Vec<HostedZone>>,
    records: Arc<Mutex<HashMap<String, Vec<RecordSet>>>>,
    zone_page_size: usize,
    record_page_size: usize,
    upserts: Arc<Mutex<Vec<(String, RecordUpsert)>>>,
    zone_list_calls: Arc<AtomicUsize>,
    record_list_calls: Arc<AtomicUsize>,
    fail_upserts: bool,
    repeat_zone_marker: bool,
}

impl InMemoryDirectory {
    pub fn new(zones: Vec<HostedZone>) -> Self {
        Self {
            zones: Arc::new(zones),
            records: Arc::new(Mutex::new(HashMap::new())),
            zone_page_size: usize::MAX,
            record_page_size: usize::MAX,
            upserts: Arc::new(Mutex::new(Vec::new())),
            zone_list_calls: Arc::new(AtomicUsize::new(0)),
            record_list_calls: Arc::new(AtomicUsize::new(0)),
            fail_upserts: false,
            repeat_zone_marker: false,
        }
    }

    /// A directory holding only `example.com` (id [`ZONE_ID`])
    pub fn single_zone() -> Self {
        Self::new(vec![HostedZone::new("example.com", ZONE_ID)])
    }

    /// Serve at most `size` items per page, regardless of what is requested
    pub fn with_page_sizes(mut self, zones: usize, records: usize) -> Self {
        self.zone_page_size = zones.max(1);
        self.record_page_size = records.max(1);
        self
    }

    /// Make every upsert fail
    pub fn with_failing_upserts(mut self) -> Self {
        self.fail_upserts = true;
        self
    }

    /// Hand back the marker it was given instead of advancing it
    pub fn with_repeating_zone_marker(mut self) -> Self {
        self.repeat_zone_marker = true;
        self
    }

    /// Seed a record set into a zone
    pub fn with_record(self, zone_id: &str, set: RecordSet) -> Self {
        {
            let mut records = self.records.lock().unwrap();
            let sets = records.entry(zone_id.to_string()).or_default();
            sets.push(set);
            sets.sort_by(|a, b| listing_key(a).cmp(&listing_key(b)));
        }
        self
    }

    /// Seed a plain A record
    pub fn with_a_record(self, name: &str, ttl: u32, values: &[&str]) -> Self {
        let set = RecordSet::new(
            name,
            "A",
            Some(ttl),
            values.iter().map(|v| v.to_string()).collect(),
        );
        self.with_record(ZONE_ID, set)
    }

    /// All upserts applied so far, with their zone ids
    pub fn upserts(&self) -> Vec<(String, RecordUpsert)> {
        self.upserts.lock().unwrap().clone()
    }

    pub fn zone_list_calls(&self) -> usize {
        self.zone_list_calls.load(Ordering::SeqCst)
    }

    pub fn record_list_calls(&self) -> usize {
        self.record_list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ZoneDirectory for InMemoryDirectory {
    async fn list_zones(&self, marker: Option<&str>, page_size: u32) -> Result<ZonePage> {
        self.zone_list_calls.fetch_add(1, Ordering::SeqCst);

        let start: usize = match marker {
            Some(marker) => marker
                .parse()
                .map_err(|_| Error::invalid_input(format!("bad marker {}", marker)))?,
            None => 0,
        };
        let size = self.zone_page_size.min(page_size as usize);
        let end = (start + size).min(self.zones.len());

        let next = if self.repeat_zone_marker { start } else { end };
        Ok(ZonePage {
            zones: self.zones[start..end].to_vec(),
            next_marker: (end < self.zones.len()).then(|| next.to_string()),
        })
    }

    async fn list_record_sets(
        &self,
        zone_id: &str,
        start_name: &str,
        start_type: &str,
        start_identifier: Option<&str>,
        page_size: u32,
    ) -> Result<RecordSetPage> {
        self.record_list_calls.fetch_add(1, Ordering::SeqCst);

        let records = self.records.lock().unwrap();
        let sets = records.get(zone_id).cloned().unwrap_or_default();

        let start = sets
            .iter()
            .position(|s| listing_key(s) >= (start_name, start_type, start_identifier))
            .unwrap_or(sets.len());
        let size = self.record_page_size.min(page_size as usize);
        let end = (start + size).min(sets.len());

        let next = sets.get(end);
        Ok(RecordSetPage {
            records: sets[start..end].to_vec(),
            truncated: next.is_some(),
            next_name: next.map(|s| s.name.clone()),
            next_type: next.map(|s| s.record_type.clone()),
            next_identifier: next.and_then(|s| s.set_identifier.clone()),
        })
    }

    async fn upsert_record(&self, zone_id: &str, upsert: &RecordUpsert) -> Result<()> {
        if self.fail_upserts {
            return Err(Error::provider("memory", "upsert rejected"));
        }

        self.upserts
            .lock()
            .unwrap()
            .push((zone_id.to_string(), upsert.clone()));

        let mut records = self.records.lock().unwrap();
        let sets = records.entry(zone_id.to_string()).or_default();
        sets.retain(|s| !(s.name == upsert.name && s.record_type == upsert.record_type));
        sets.push(RecordSet::new(
            upsert.name.clone(),
            upsert.record_type.clone(),
            Some(upsert.ttl),
            upsert.values.clone(),
        ));
        sets.sort_by(|a, b| listing_key(a).cmp(&listing_key(b)));
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

/// Provider listing order: name, then type, then set identifier
fn listing_key(set: &RecordSet) -> (&str, &str, Option<&str>) {
    (
        set.name.as_str(),
        set.record_type.as_str(),
        set.set_identifier.as_deref(),
    )
}

/// A notifier that records every message
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<(String, String)>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose deliveries always fail (after being recorded)
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(&self, topic: &str, message: &str) -> Result<()> {
        self.messages
            .lock()
            .unwrap()
            .push((topic.to_string(), message.to_string()));

        if self.fail {
            Err(Error::notification("topic does not exist"))
        } else {
            Ok(())
        }
    }
}

/// Build a reconciler over the given doubles
pub fn reconciler(
    directory: &InMemoryDirectory,
    lookup: &ScriptedLookup,
    notifier: Option<&RecordingNotifier>,
    config: UpdaterConfig,
) -> Reconciler {
    Reconciler::new(
        Box::new(directory.clone()),
        Box::new(lookup.clone()),
        notifier.map(|n| Box::new(n.clone()) as Box<dyn Notifier>),
        config,
    )
    .expect("reconciler construction succeeds")
}
