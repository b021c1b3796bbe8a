// # In-memory IONOS DNS API
//
// A stateful `Transport` that behaves like the IONOS DNS API v1 without
// any network. Requests are routed, validated and applied to in-memory
// zones, and answered with the same status codes and JSON bodies the
// provider uses.
//
// ## Endpoints
//
// | Call   | Path                             | Success             |
// |--------|----------------------------------|---------------------|
// | GET    | /zones                           | 200 zone list       |
// | GET    | /zones/{id}?suffix=&recordType=  | 200 zone + records  |
// | POST   | /zones/{id}/records              | 201 created records |
// | PUT    | /zones/{id}/records/{rid}        | 200 record          |
// | DELETE | /zones/{id}/records/{rid}        | 204                 |
//
// Anything else is `404 NOT_FOUND`. A missing or wrong `X-API-Key` is
// `401 UNAUTHORIZED` before routing.
//
// ## Test hooks
//
// - Every request is logged (`requests()`, `mutation_count()`)
// - `inject_response()` answers the next request with a given method
//   with a canned status and body, without touching state
// - `seed_record()` / `remove_record()` change state behind the client's
//   back, to simulate drift and concurrent deletion

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::api::{ApiErrorEntry, RecordResponse, ZoneDetail, ZoneSummary};
use crate::config::API_KEY_HEADER;
use crate::error::Result;
use crate::record::DEFAULT_TTL;
use crate::traits::{ApiRequest, ApiResponse, Method, Transport};

/// API key accepted by `MemoryIonosApi::default()`
pub const TEST_API_KEY: &str = "test-api-key";

const HOSTNAME_PATTERN: &str =
    r"^([a-zA-Z0-9]([a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,}\.?$";

/// A record as stored by the fake
#[derive(Debug, Clone)]
struct StoredRecord {
    seq: u64,
    id: String,
    name: String,
    root_name: String,
    record_type: String,
    content: String,
    ttl: u32,
    prio: Option<u32>,
    disabled: bool,
    change_date: String,
}

impl StoredRecord {
    fn to_response(&self) -> RecordResponse {
        RecordResponse {
            id: self.id.clone(),
            name: self.name.clone(),
            root_name: self.root_name.clone(),
            record_type: self.record_type.clone(),
            content: self.content.clone(),
            ttl: self.ttl,
            prio: self.prio,
            disabled: self.disabled,
            change_date: Some(self.change_date.clone()),
        }
    }
}

#[derive(Debug)]
struct StoredZone {
    id: String,
    name: String,
    zone_type: String,
    records: RwLock<HashMap<String, StoredRecord>>,
}

impl StoredZone {
    /// Records in creation order
    async fn sorted_records(&self) -> Vec<StoredRecord> {
        let guard = self.records.read().await;
        let mut records: Vec<StoredRecord> = guard.values().cloned().collect();
        records.sort_by_key(|r| r.seq);
        records
    }
}

/// Record body as sent by callers; every field optional so missing ones
/// can be reported instead of failing to decode.
#[derive(Debug, Default, Deserialize, Serialize)]
struct IncomingRecord {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type", default)]
    record_type: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    ttl: Option<u32>,
    #[serde(default)]
    prio: Option<u32>,
    #[serde(default)]
    disabled: Option<bool>,
}

#[derive(Debug)]
struct Inner {
    api_key: String,
    zones: RwLock<HashMap<String, Arc<StoredZone>>>,
    requests: Mutex<Vec<ApiRequest>>,
    injected: Mutex<VecDeque<(Method, ApiResponse)>>,
    next_seq: AtomicU64,
}

/// In-memory IONOS DNS API
///
/// Cloning yields another handle to the same state, so a test can keep one
/// handle for inspection while the client owns another.
///
/// # Example
///
/// ```rust,no_run
/// use ionos_dns_core::transport::MemoryIonosApi;
/// use ionos_dns_core::{DesiredRecord, DnsProvider, IonosClient, RecordType};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let api = MemoryIonosApi::new("prefix.secret");
///     api.add_zone("zone-1", "example.com").await;
///
///     let client = IonosClient::new(api.clone(), "prefix.secret");
///     let record = DesiredRecord::new("example.com", "www.example.com", RecordType::A, "192.0.2.10");
///     client.ensure_matches(&record, false).await?;
///
///     assert_eq!(api.mutation_count().await, 1);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryIonosApi {
    inner: Arc<Inner>,
}

impl MemoryIonosApi {
    /// Create an empty API that accepts `api_key`
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                api_key: api_key.into(),
                zones: RwLock::new(HashMap::new()),
                requests: Mutex::new(Vec::new()),
                injected: Mutex::new(VecDeque::new()),
                next_seq: AtomicU64::new(0),
            }),
        }
    }

    /// Add an empty zone of type `NATIVE`
    pub async fn add_zone(&self, id: impl Into<String>, name: impl Into<String>) {
        let id = id.into();
        let zone = StoredZone {
            id: id.clone(),
            name: name.into(),
            zone_type: "NATIVE".to_string(),
            records: RwLock::new(HashMap::new()),
        };
        self.inner.zones.write().await.insert(id, Arc::new(zone));
    }

    /// Remove a zone and all of its records
    pub async fn remove_zone(&self, id: &str) -> bool {
        self.inner.zones.write().await.remove(id).is_some()
    }

    /// Put a record straight into a zone, bypassing the request log
    ///
    /// Returns the new record id, or `None` when the zone does not exist.
    pub async fn seed_record(
        &self,
        zone_id: &str,
        name: &str,
        record_type: &str,
        content: &str,
        ttl: u32,
        prio: Option<u32>,
    ) -> Option<String> {
        let zone = self.zone(zone_id).await?;
        let record = self.new_record(&zone, name, record_type, content, ttl, prio, false);
        let id = record.id.clone();
        zone.records.write().await.insert(id.clone(), record);
        Some(id)
    }

    /// Remove a record straight from a zone, bypassing the request log
    pub async fn remove_record(&self, zone_id: &str, record_id: &str) -> bool {
        match self.zone(zone_id).await {
            Some(zone) => zone.records.write().await.remove(record_id).is_some(),
            None => false,
        }
    }

    /// All records of a zone, in creation order
    pub async fn records(&self, zone_id: &str) -> Vec<RecordResponse> {
        match self.zone(zone_id).await {
            Some(zone) => zone
                .sorted_records()
                .await
                .iter()
                .map(StoredRecord::to_response)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Answer the next `method` request with `status` and `body`
    ///
    /// Injected responses are one-shot and consumed in order.
    pub async fn inject_response(&self, method: Method, status: u16, body: impl Into<String>) {
        self.inner
            .injected
            .lock()
            .await
            .push_back((method, ApiResponse::new(status, body)));
    }

    /// Every request received so far
    pub async fn requests(&self) -> Vec<ApiRequest> {
        self.inner.requests.lock().await.clone()
    }

    /// Number of POST/PUT/DELETE requests received so far
    pub async fn mutation_count(&self) -> usize {
        self.inner
            .requests
            .lock()
            .await
            .iter()
            .filter(|r| r.method.is_mutating())
            .count()
    }

    async fn zone(&self, id: &str) -> Option<Arc<StoredZone>> {
        self.inner.zones.read().await.get(id).cloned()
    }

    #[allow(clippy::too_many_arguments)]
    fn new_record(
        &self,
        zone: &StoredZone,
        name: &str,
        record_type: &str,
        content: &str,
        ttl: u32,
        prio: Option<u32>,
        disabled: bool,
    ) -> StoredRecord {
        StoredRecord {
            seq: self.inner.next_seq.fetch_add(1, Ordering::SeqCst),
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            root_name: zone.name.clone(),
            record_type: record_type.to_uppercase(),
            content: content.to_string(),
            ttl: if ttl > 0 { ttl } else { DEFAULT_TTL },
            prio,
            disabled,
            change_date: now(),
        }
    }

    async fn take_injected(&self, method: Method) -> Option<ApiResponse> {
        let mut queue = self.inner.injected.lock().await;
        let index = queue.iter().position(|(m, _)| *m == method)?;
        queue.remove(index).map(|(_, response)| response)
    }

    async fn handle(&self, request: &ApiRequest) -> ApiResponse {
        if request.header(API_KEY_HEADER) != Some(self.inner.api_key.as_str()) {
            return error_response(
                401,
                "UNAUTHORIZED",
                "The customer is not authorized to do this operation.",
                None,
            );
        }

        let segments: Vec<&str> = request
            .path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();

        match (request.method, segments.as_slice()) {
            (Method::Get, ["zones"]) => self.list_zones().await,
            (Method::Get, ["zones", zone_id]) => self.get_zone(zone_id, request).await,
            (Method::Post, ["zones", zone_id, "records"]) => {
                self.create_records(zone_id, request).await
            }
            (Method::Put, ["zones", zone_id, "records", record_id]) => {
                self.update_record(zone_id, record_id, request).await
            }
            (Method::Delete, ["zones", zone_id, "records", record_id]) => {
                self.delete_record(zone_id, record_id).await
            }
            _ => error_response(404, "NOT_FOUND", "Endpoint not found.", None),
        }
    }

    async fn list_zones(&self) -> ApiResponse {
        let guard = self.inner.zones.read().await;
        let mut zones: Vec<ZoneSummary> = guard
            .values()
            .map(|zone| ZoneSummary {
                id: zone.id.clone(),
                name: zone.name.clone(),
                zone_type: zone.zone_type.clone(),
            })
            .collect();
        zones.sort_by(|a, b| a.name.cmp(&b.name));
        json_response(200, &zones)
    }

    async fn get_zone(&self, zone_id: &str, request: &ApiRequest) -> ApiResponse {
        let Some(zone) = self.zone(zone_id).await else {
            return zone_not_found();
        };

        let suffix = request.query_param("suffix").filter(|s| !s.is_empty());
        let record_type = request.query_param("recordType").filter(|s| !s.is_empty());

        let records = zone
            .sorted_records()
            .await
            .into_iter()
            .filter(|r| suffix.is_none_or(|s| ends_with_ignore_case(&r.name, s)))
            .filter(|r| record_type.is_none_or(|t| r.record_type.eq_ignore_ascii_case(t)))
            .map(|r| r.to_response())
            .collect();

        json_response(
            200,
            &ZoneDetail {
                id: zone.id.clone(),
                name: zone.name.clone(),
                zone_type: zone.zone_type.clone(),
                records,
            },
        )
    }

    async fn create_records(&self, zone_id: &str, request: &ApiRequest) -> ApiResponse {
        let Some(zone) = self.zone(zone_id).await else {
            return zone_not_found();
        };

        let incoming: Vec<IncomingRecord> = match request
            .body
            .clone()
            .map(serde_json::from_value::<Vec<IncomingRecord>>)
        {
            Some(Ok(records)) if !records.is_empty() => records,
            _ => return invalid_body(),
        };

        // Validate the whole batch before storing any of it
        for record in &incoming {
            let missing: Vec<&str> = [
                ("name", &record.name),
                ("type", &record.record_type),
                ("content", &record.content),
            ]
            .into_iter()
            .filter(|(_, value)| value.as_deref().is_none_or(str::is_empty))
            .map(|(field, _)| field)
            .collect();

            if !missing.is_empty() {
                return error_response(
                    400,
                    "INVALID_RECORD",
                    "Record is invalid.",
                    Some(serde_json::json!({ "requiredFields": missing })),
                );
            }

            let record_type = record.record_type.as_deref().unwrap_or_default().to_uppercase();
            let content = record.content.as_deref().unwrap_or_default();
            if !valid_content(&record_type, content, record.prio) {
                return invalid_content(&record_type);
            }
        }

        let mut created = Vec::with_capacity(incoming.len());
        let mut guard = zone.records.write().await;
        for record in incoming {
            let stored = self.new_record(
                &zone,
                record.name.as_deref().unwrap_or_default(),
                record.record_type.as_deref().unwrap_or_default(),
                record.content.as_deref().unwrap_or_default(),
                record.ttl.unwrap_or(0),
                record.prio,
                record.disabled.unwrap_or(false),
            );
            debug!("Fake API created record {} ({})", stored.name, stored.id);
            created.push(stored.to_response());
            guard.insert(stored.id.clone(), stored);
        }

        json_response(201, &created)
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        request: &ApiRequest,
    ) -> ApiResponse {
        let Some(zone) = self.zone(zone_id).await else {
            return zone_not_found();
        };

        let update = match request.body.clone().map(serde_json::from_value::<IncomingRecord>) {
            Some(Ok(update)) => update,
            _ => return invalid_body(),
        };

        let mut guard = zone.records.write().await;
        let Some(record) = guard.get_mut(record_id) else {
            return record_not_found();
        };

        let content = update.content.unwrap_or_default();
        if !valid_content(&record.record_type, &content, update.prio) {
            return invalid_content(&record.record_type);
        }

        record.content = content;
        if let Some(ttl) = update.ttl.filter(|ttl| *ttl > 0) {
            record.ttl = ttl;
        }
        record.prio = update.prio;
        record.disabled = update.disabled.unwrap_or(false);
        record.change_date = now();

        json_response(200, &record.to_response())
    }

    async fn delete_record(&self, zone_id: &str, record_id: &str) -> ApiResponse {
        let Some(zone) = self.zone(zone_id).await else {
            return zone_not_found();
        };
        match zone.records.write().await.remove(record_id) {
            Some(_) => ApiResponse::new(204, ""),
            None => record_not_found(),
        }
    }
}

impl Default for MemoryIonosApi {
    fn default() -> Self {
        Self::new(TEST_API_KEY)
    }
}

#[async_trait]
impl Transport for MemoryIonosApi {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.inner.requests.lock().await.push(request.clone());

        if let Some(response) = self.take_injected(request.method).await {
            debug!(
                "Fake API answering {} {} with injected HTTP {}",
                request.method, request.path, response.status
            );
            return Ok(response);
        }

        Ok(self.handle(&request).await)
    }
}

/// Content format check per record type, mirroring the provider's rules
fn valid_content(record_type: &str, content: &str, prio: Option<u32>) -> bool {
    let pattern = match record_type {
        "A" => r"^(\d{1,3}\.){3}\d{1,3}$",
        "AAAA" => r"^([0-9a-fA-F]{0,4}:){2,7}[0-9a-fA-F]{0,4}$",
        "CNAME" | "NS" | "MX" => HOSTNAME_PATTERN,
        "CAA" => r#"^\d+\s+\w+\s+"[^"]+"$"#,
        "SRV" => r"^\d+\s+\d+\s+\d+\s+\S+$",
        _ => return true,
    };

    if matches!(record_type, "MX" | "SRV") && prio.is_none() {
        return false;
    }

    match Regex::new(pattern) {
        Ok(re) => re.is_match(content),
        Err(_) => false,
    }
}

fn ends_with_ignore_case(value: &str, suffix: &str) -> bool {
    value.len() >= suffix.len()
        && value
            .get(value.len() - suffix.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix))
}

fn now() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

fn json_response<T: Serialize>(status: u16, body: &T) -> ApiResponse {
    match serde_json::to_string(body) {
        Ok(json) => ApiResponse::new(status, json),
        Err(e) => error_response(500, "INTERNAL_SERVER_ERROR", &e.to_string(), None),
    }
}

fn error_response(
    status: u16,
    code: &str,
    message: &str,
    parameters: Option<serde_json::Value>,
) -> ApiResponse {
    let errors = [ApiErrorEntry {
        code: code.to_string(),
        message: Some(message.to_string()),
        parameters,
    }];
    let body = serde_json::to_string(&errors).unwrap_or_else(|_| "[]".to_string());
    ApiResponse::new(status, body)
}

fn zone_not_found() -> ApiResponse {
    error_response(404, "ZONE_NOT_FOUND", "Zone does not exist.", None)
}

fn record_not_found() -> ApiResponse {
    error_response(404, "RECORD_NOT_FOUND", "Record does not exist.", None)
}

fn invalid_body() -> ApiResponse {
    error_response(
        400,
        "INVALID_DATA",
        "The request body is invalid or not supported by the endpoint.",
        None,
    )
}

fn invalid_content(record_type: &str) -> ApiResponse {
    error_response(
        400,
        "INVALID_DATA",
        &format!("Invalid content format for {} record.", record_type),
        None,
    )
}
