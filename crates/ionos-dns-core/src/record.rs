// # Record Model
//
// Provider-agnostic description of a DNS record, plus the shape of what
// the provider reports back.
//
// ## Identity
//
// A target record is identified by `(root_name, name, type)`. Name and
// type compare case-insensitively; everything else compares exactly.
//
// ## Equality
//
// `ObservedRecord::matches` is the single equality predicate the engine
// uses to decide between `Unchanged` and `Updated`. Content is compared
// byte-for-byte: `target.com` and `target.com.` are different values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// TTL applied when the declaration does not carry one
pub const DEFAULT_TTL: u32 = 3600;

/// DNS record types supported by the IONOS API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    A,
    Aaaa,
    Cname,
    Mx,
    Ns,
    Soa,
    Srv,
    Txt,
    Caa,
    Tlsa,
    Smimea,
    Sshfp,
    Ds,
    Https,
    Svcb,
    Cert,
    Uri,
    Rp,
    Loc,
    Openpgpkey,
    Unknown,
}

impl RecordType {
    /// Every known type, in declaration order
    pub const ALL: [RecordType; 21] = [
        RecordType::A,
        RecordType::Aaaa,
        RecordType::Cname,
        RecordType::Mx,
        RecordType::Ns,
        RecordType::Soa,
        RecordType::Srv,
        RecordType::Txt,
        RecordType::Caa,
        RecordType::Tlsa,
        RecordType::Smimea,
        RecordType::Sshfp,
        RecordType::Ds,
        RecordType::Https,
        RecordType::Svcb,
        RecordType::Cert,
        RecordType::Uri,
        RecordType::Rp,
        RecordType::Loc,
        RecordType::Openpgpkey,
        RecordType::Unknown,
    ];

    /// Wire name, as the provider spells it
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Mx => "MX",
            RecordType::Ns => "NS",
            RecordType::Soa => "SOA",
            RecordType::Srv => "SRV",
            RecordType::Txt => "TXT",
            RecordType::Caa => "CAA",
            RecordType::Tlsa => "TLSA",
            RecordType::Smimea => "SMIMEA",
            RecordType::Sshfp => "SSHFP",
            RecordType::Ds => "DS",
            RecordType::Https => "HTTPS",
            RecordType::Svcb => "SVCB",
            RecordType::Cert => "CERT",
            RecordType::Uri => "URI",
            RecordType::Rp => "RP",
            RecordType::Loc => "LOC",
            RecordType::Openpgpkey => "OPENPGPKEY",
            RecordType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::invalid_input(format!("Unknown record type: {}", s)))
    }
}

/// A DNS zone as resolved from the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// Opaque provider identifier
    pub id: String,
    /// Zone name (e.g., "example.com")
    pub name: String,
}

/// The record a caller wants to exist (or not exist) at the provider
///
/// Immutable input to the engine; it is borrowed, never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredRecord {
    /// Zone name (e.g., "example.com")
    pub root_name: String,
    /// Fully-qualified record name (e.g., "www.example.com")
    pub name: String,
    /// Record type
    pub record_type: RecordType,
    /// Record value (address, target hostname, text, ...)
    pub content: String,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Priority for MX and SRV records
    pub prio: Option<u32>,
    /// Whether the record is disabled at the provider
    pub disabled: bool,
}

impl DesiredRecord {
    /// Create a new desired record with the default TTL, no priority, enabled
    pub fn new(
        root_name: impl Into<String>,
        name: impl Into<String>,
        record_type: RecordType,
        content: impl Into<String>,
    ) -> Self {
        Self {
            root_name: root_name.into(),
            name: name.into(),
            record_type,
            content: content.into(),
            ttl: DEFAULT_TTL,
            prio: None,
            disabled: false,
        }
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the priority
    pub fn with_prio(mut self, prio: Option<u32>) -> Self {
        self.prio = prio;
        self
    }

    /// Set the content
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Enable or disable the record
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

/// Fields compared by the equality predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    Name,
    Type,
    Content,
    Ttl,
    Prio,
    Disabled,
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordField::Name => "name",
            RecordField::Type => "type",
            RecordField::Content => "content",
            RecordField::Ttl => "ttl",
            RecordField::Prio => "prio",
            RecordField::Disabled => "disabled",
        };
        f.write_str(name)
    }
}

/// The provider's current state for a record
///
/// Built per call from live provider data and dropped right after use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedRecord {
    /// Provider record identifier
    pub id: String,
    /// Zone name the record belongs to
    pub root_name: String,
    /// Fully-qualified record name
    pub name: String,
    /// Record type
    pub record_type: RecordType,
    /// Record value
    pub content: String,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Priority, if any
    pub prio: Option<u32>,
    /// Whether the record is disabled
    pub disabled: bool,
    /// Last modification time reported by the provider
    pub change_date: Option<chrono::DateTime<chrono::Utc>>,
}

impl ObservedRecord {
    /// Fields on which this record differs from `desired`
    ///
    /// Empty means the provider already matches the declaration.
    pub fn drift(&self, desired: &DesiredRecord) -> Vec<RecordField> {
        let mut fields = Vec::new();
        if !self.name.eq_ignore_ascii_case(&desired.name) {
            fields.push(RecordField::Name);
        }
        if self.record_type != desired.record_type {
            fields.push(RecordField::Type);
        }
        if self.content != desired.content {
            fields.push(RecordField::Content);
        }
        if self.ttl != desired.ttl {
            fields.push(RecordField::Ttl);
        }
        if self.prio != desired.prio {
            fields.push(RecordField::Prio);
        }
        if self.disabled != desired.disabled {
            fields.push(RecordField::Disabled);
        }
        fields
    }

    /// Equality predicate between provider state and declaration
    pub fn matches(&self, desired: &DesiredRecord) -> bool {
        self.drift(desired).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observed(desired: &DesiredRecord) -> ObservedRecord {
        ObservedRecord {
            id: "rec-1".to_string(),
            root_name: desired.root_name.clone(),
            name: desired.name.clone(),
            record_type: desired.record_type,
            content: desired.content.clone(),
            ttl: desired.ttl,
            prio: desired.prio,
            disabled: desired.disabled,
            change_date: None,
        }
    }

    fn cname() -> DesiredRecord {
        DesiredRecord::new("example.com", "test.example.com", RecordType::Cname, "target.com")
    }

    #[test]
    fn test_record_type_parse_is_case_insensitive() {
        assert_eq!("cname".parse::<RecordType>().unwrap(), RecordType::Cname);
        assert_eq!("Aaaa".parse::<RecordType>().unwrap(), RecordType::Aaaa);
        assert_eq!("OPENPGPKEY".parse::<RecordType>().unwrap(), RecordType::Openpgpkey);
        assert!("BOGUS".parse::<RecordType>().is_err());
    }

    #[test]
    fn test_record_type_wire_names_round_trip() {
        for t in RecordType::ALL {
            assert_eq!(t.as_str().parse::<RecordType>().unwrap(), t);
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
        }
    }

    #[test]
    fn test_identical_records_match() {
        let desired = cname();
        assert!(observed(&desired).matches(&desired));
    }

    #[test]
    fn test_name_compares_case_insensitively() {
        let desired = cname();
        let mut current = observed(&desired);
        current.name = "TEST.Example.COM".to_string();
        assert!(current.matches(&desired));
    }

    #[test]
    fn test_single_field_drift_is_detected() {
        let desired = cname();
        let base = observed(&desired);

        let cases: Vec<(ObservedRecord, RecordField)> = vec![
            (ObservedRecord { content: "Target.com".to_string(), ..base.clone() }, RecordField::Content),
            (ObservedRecord { ttl: 60, ..base.clone() }, RecordField::Ttl),
            (ObservedRecord { prio: Some(10), ..base.clone() }, RecordField::Prio),
            (ObservedRecord { disabled: true, ..base.clone() }, RecordField::Disabled),
        ];

        for (current, field) in cases {
            assert_eq!(current.drift(&desired), vec![field]);
            assert!(!current.matches(&desired));
        }
    }

    #[test]
    fn test_prio_set_to_unset_is_drift() {
        let desired = cname().with_prio(Some(10));
        let mut current = observed(&desired);
        current.prio = None;
        assert_eq!(current.drift(&desired), vec![RecordField::Prio]);
    }

    #[test]
    fn test_hostname_content_is_not_normalised() {
        // Trailing dots and letter case in hostname content are compared
        // verbatim; each variant below reads as drift.
        let desired = cname();
        for variant in ["target.com.", "TARGET.COM", "Target.Com.", " target.com"] {
            let mut current = observed(&desired);
            current.content = variant.to_string();
            assert_eq!(
                current.drift(&desired),
                vec![RecordField::Content],
                "content {:?} should differ from {:?}",
                variant,
                desired.content
            );
        }
    }

    #[test]
    fn test_builder_defaults() {
        let desired = cname();
        assert_eq!(desired.ttl, DEFAULT_TTL);
        assert_eq!(desired.prio, None);
        assert!(!desired.disabled);
    }
}
