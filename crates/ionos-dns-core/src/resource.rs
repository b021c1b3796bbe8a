//! Declared DNS record resources
//!
//! A [`DnsRecordResource`] is what a driver hands to the
//! [`SyncEngine`](crate::SyncEngine): the declaration ([`DnsRecordSpec`])
//! plus the status the driver keeps between passes ([`DnsRecordStatus`]).
//! The engine only reads the spec; updating the status is the driver's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::outcome::{OperationOutcome, RecordPhase};
use crate::record::{DEFAULT_TTL, DesiredRecord, RecordType};

/// Declaration of a single DNS record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsRecordSpec {
    /// Zone name (e.g., "example.com")
    pub root_name: String,
    /// Fully-qualified record name
    pub name: String,
    /// Record type
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Record value
    pub content: String,
    /// TTL in seconds (default: 3600)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    /// Priority for MX/SRV records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prio: Option<u32>,
    #[serde(default)]
    pub disabled: bool,
}

impl From<&DnsRecordSpec> for DesiredRecord {
    fn from(spec: &DnsRecordSpec) -> Self {
        DesiredRecord {
            root_name: spec.root_name.clone(),
            name: spec.name.clone(),
            record_type: spec.record_type,
            content: spec.content.clone(),
            ttl: spec.ttl.unwrap_or(DEFAULT_TTL),
            prio: spec.prio,
            disabled: spec.disabled,
        }
    }
}

/// Status a driver records after each pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsRecordStatus {
    /// Outcome of the most recent pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_record_status: Option<OperationOutcome>,
    #[serde(default)]
    pub phase: RecordPhase,
    /// Last time the provider state was actually changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_changed: Option<DateTime<Utc>>,
    /// Last time a pass completed, whatever its outcome
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reconciled: Option<DateTime<Utc>>,
}

impl DnsRecordStatus {
    /// Fold the outcome of an apply pass into the status
    pub fn record_apply(&mut self, outcome: OperationOutcome, now: DateTime<Utc>) {
        self.phase = self.phase.after_apply(outcome);
        self.record(outcome, now);
    }

    /// Fold the outcome of a delete pass into the status
    pub fn record_delete(&mut self, outcome: OperationOutcome, now: DateTime<Utc>) {
        self.phase = self.phase.after_delete(outcome);
        self.record(outcome, now);
    }

    fn record(&mut self, outcome: OperationOutcome, now: DateTime<Utc>) {
        self.dns_record_status = Some(outcome);
        self.last_reconciled = Some(now);
        if outcome.is_mutation() {
            self.last_changed = Some(now);
        }
    }
}

/// A named record declaration together with its status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsRecordResource {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub spec: DnsRecordSpec,
    #[serde(default)]
    pub status: DnsRecordStatus,
}

impl DnsRecordResource {
    pub fn new(name: impl Into<String>, spec: DnsRecordSpec) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            spec,
            status: DnsRecordStatus::default(),
        }
    }

    /// The record the engine should converge on
    pub fn desired(&self) -> DesiredRecord {
        DesiredRecord::from(&self.spec)
    }

    /// Replace the declaration, marking a converged record as converging
    pub fn update_spec(&mut self, spec: DnsRecordSpec) {
        if spec != self.spec {
            self.spec = spec;
            self.status.phase = self.status.phase.spec_changed();
        }
    }
}
