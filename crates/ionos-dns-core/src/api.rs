// # IONOS DNS API v1 wire types
//
// JSON shapes exchanged with the provider. Field names follow the API
// (camelCase). Nothing outside the client and the in-memory fake should
// need these.
//
// | Call   | Path                             | Body                     |
// |--------|----------------------------------|--------------------------|
// | GET    | /zones                           |                          |
// | GET    | /zones/{id}?suffix=&recordType=  |                          |
// | POST   | /zones/{id}/records              | [RecordCreateRequest]    |
// | PUT    | /zones/{id}/records/{recordId}   | RecordUpdateRequest      |
// | DELETE | /zones/{id}/records/{recordId}   |                          |

use serde::{Deserialize, Serialize};

use crate::record::{DesiredRecord, ObservedRecord, RecordType, Zone};

/// Entry of the `GET /zones` list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub zone_type: String,
}

impl From<ZoneSummary> for Zone {
    fn from(zone: ZoneSummary) -> Self {
        Zone {
            id: zone.id,
            name: zone.name,
        }
    }
}

/// Body of `GET /zones/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneDetail {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub zone_type: String,
    #[serde(default)]
    pub records: Vec<RecordResponse>,
}

/// A record as embedded in zone detail
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub root_name: String,
    #[serde(rename = "type", default)]
    pub record_type: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub ttl: u32,
    #[serde(default)]
    pub prio: Option<u32>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub change_date: Option<String>,
}

impl RecordResponse {
    /// Convert into the provider-agnostic observed record
    ///
    /// Returns `None` when the provider reports a type this crate does not know.
    pub fn into_observed(self) -> Option<ObservedRecord> {
        let record_type = self.record_type.parse::<RecordType>().ok()?;
        let change_date = self
            .change_date
            .as_deref()
            .and_then(|raw| chrono::DateTime::parse_from_rfc3339(raw).ok())
            .map(|date| date.with_timezone(&chrono::Utc));

        Some(ObservedRecord {
            id: self.id,
            root_name: self.root_name,
            name: self.name,
            record_type,
            content: self.content,
            ttl: self.ttl,
            prio: self.prio,
            disabled: self.disabled,
            change_date,
        })
    }
}

/// One element of the `POST /zones/{id}/records` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordCreateRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub content: String,
    #[serde(default)]
    pub ttl: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prio: Option<u32>,
    #[serde(default)]
    pub disabled: bool,
}

impl From<&DesiredRecord> for RecordCreateRequest {
    fn from(record: &DesiredRecord) -> Self {
        Self {
            name: record.name.clone(),
            record_type: record.record_type.as_str().to_string(),
            content: record.content.clone(),
            ttl: record.ttl,
            prio: record.prio,
            disabled: record.disabled,
        }
    }
}

/// Body of `PUT /zones/{id}/records/{recordId}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordUpdateRequest {
    pub content: String,
    #[serde(default)]
    pub ttl: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prio: Option<u32>,
    #[serde(default)]
    pub disabled: bool,
}

impl From<&DesiredRecord> for RecordUpdateRequest {
    fn from(record: &DesiredRecord) -> Self {
        Self {
            content: record.content.clone(),
            ttl: record.ttl,
            prio: record.prio,
            disabled: record.disabled,
        }
    }
}

/// One entry of the error list returned with non-2xx statuses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorEntry {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

/// Render an error body for a fault message
///
/// Decodes `[{code, message}]` when possible, otherwise keeps the raw body.
pub fn describe_error_body(body: &str) -> String {
    match serde_json::from_str::<Vec<ApiErrorEntry>>(body) {
        Ok(entries) if !entries.is_empty() => entries
            .iter()
            .map(|e| match &e.message {
                Some(message) => format!("{}: {}", e.code, message),
                None => e.code.clone(),
            })
            .collect::<Vec<_>>()
            .join("; "),
        _ if body.trim().is_empty() => "<empty body>".to_string(),
        _ => body.to_string(),
    }
}
