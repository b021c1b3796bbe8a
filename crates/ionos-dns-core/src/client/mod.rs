// # IONOS DNS Client
//
// Provider client for the IONOS DNS API v1, generic over a `Transport`.
//
// ## Pipeline
//
// Every `ensure_*` call is a short, strictly ordered chain:
//
// ```text
// resolve zone ──▶ fetch record ──▶ compare ──▶ [re-resolve id ──▶ mutate]
// ```
//
// - Zones are resolved fresh on every call (no cache)
// - The record id used for PUT/DELETE is looked up again right before the
//   mutating call, never reused from the comparison step
// - Dry-run stops before the bracketed part
// - Unchanged records never reach the bracketed part
//
// ## Status classification
//
// Mutating calls:
//
// | Status  | Result                                  |
// |---------|-----------------------------------------|
// | 2xx     | nominal outcome (Created/Updated/Deleted) |
// | 401     | `Unauthorized`                          |
// | 404     | `NotFound`                              |
// | 409     | `Conflict`                              |
// | other   | `Error::Api` fault                      |
//
// Reads: 2xx → parse, 401 → `Unauthorized`, 404 → absent, other → fault.
//
// ## Security
//
// The API key is attached as `X-API-Key` to every request and never logged.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::api::{
    self, RecordCreateRequest, RecordResponse, RecordUpdateRequest, ZoneDetail, ZoneSummary,
};
use crate::config::{API_KEY_HEADER, ClientConfig};
use crate::error::{Error, Result};
use crate::outcome::OperationOutcome;
use crate::record::{DesiredRecord, ObservedRecord, RecordType, Zone};
use crate::traits::{ApiRequest, ApiResponse, DnsProvider, Lookup, Transport};

/// Provider name used in logs
const PROVIDER_NAME: &str = "ionos";

/// How a read response should be treated
#[derive(Debug, PartialEq, Eq)]
enum ReadStatus {
    /// 2xx: decode the body
    Body,
    /// 404: the thing asked for does not exist
    Absent,
    /// The provider refused the read
    Refused(OperationOutcome),
}

/// Classify the response of a read request
fn classify_read(response: &ApiResponse) -> Result<ReadStatus> {
    if response.is_success() {
        return Ok(ReadStatus::Body);
    }

    match response.status {
        401 => Ok(ReadStatus::Refused(OperationOutcome::Unauthorized)),
        404 => Ok(ReadStatus::Absent),
        status => Err(Error::api(status, api::describe_error_body(&response.body))),
    }
}

/// Map the response of a mutating request to an outcome
///
/// `nominal` is what a 2xx means for this call.
pub fn classify_mutation(
    response: &ApiResponse,
    nominal: OperationOutcome,
) -> Result<OperationOutcome> {
    if response.is_success() {
        return Ok(nominal);
    }

    match response.status {
        401 => Ok(OperationOutcome::Unauthorized),
        404 => Ok(OperationOutcome::NotFound),
        409 => Ok(OperationOutcome::Conflict),
        status => Err(Error::api(status, api::describe_error_body(&response.body))),
    }
}

/// IONOS DNS provider client
///
/// Holds no state besides the transport and the API key; every call
/// starts from a fresh zone lookup.
pub struct IonosClient<T> {
    /// Transport used for every request
    transport: T,

    /// IONOS API key
    /// ⚠️ NEVER log this value
    api_key: String,
}

// Custom Debug implementation that hides the API key
impl<T> std::fmt::Debug for IonosClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IonosClient")
            .field("api_key", &"<REDACTED>")
            .finish_non_exhaustive()
    }
}

impl<T: Transport> IonosClient<T> {
    /// Create a client over `transport`, authenticating with `api_key`
    pub fn new(transport: T, api_key: impl Into<String>) -> Self {
        Self {
            transport,
            api_key: api_key.into(),
        }
    }

    /// Create a client from a validated configuration
    pub fn from_config(transport: T, config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(transport, config.api_key.clone()))
    }

    /// Borrow the underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Attach credentials and send one request
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        debug!("{} {}", request.method, request.path);
        let request = request.with_header(API_KEY_HEADER, self.api_key.as_str());
        let response = self.transport.send(request).await?;
        debug!("Response status: {}", response.status);
        Ok(response)
    }

    /// Look up a record by zone name, without mutating anything
    ///
    /// Convenience for callers that want to inspect provider state directly.
    pub async fn lookup_record(
        &self,
        root_name: &str,
        name: &str,
        record_type: RecordType,
    ) -> Result<Lookup<ObservedRecord>> {
        match self.resolve_zone(root_name).await? {
            Lookup::Found(zone) => self.fetch_record(&zone.id, name, record_type).await,
            Lookup::Absent => Ok(Lookup::Absent),
            Lookup::Refused(outcome) => Ok(Lookup::Refused(outcome)),
        }
    }

    /// `POST /zones/{id}/records` with a single record
    async fn create_record(&self, zone: &Zone, desired: &DesiredRecord) -> Result<OperationOutcome> {
        let body = vec![RecordCreateRequest::from(desired)];
        let request = ApiRequest::post(format!("/zones/{}/records", zone.id)).with_json(&body)?;

        let response = self.send(request).await?;
        let outcome = classify_mutation(&response, OperationOutcome::Created)?;

        if outcome == OperationOutcome::Created && !response.body.trim().is_empty() {
            let created: Vec<RecordResponse> = response.json()?;
            let id = created.first().map(|r| r.id.as_str()).unwrap_or("<unknown>");
            info!(
                "Created {} record {} -> {} (id: {})",
                desired.record_type, desired.name, desired.content, id
            );
        }

        Ok(outcome)
    }

    /// `PUT /zones/{id}/records/{recordId}` with the desired mutable fields
    ///
    /// Zone and record id are resolved again here so the id is as fresh as
    /// possible when the call goes out.
    async fn update_record(&self, desired: &DesiredRecord) -> Result<OperationOutcome> {
        let zone = match self.resolve_zone(&desired.root_name).await? {
            Lookup::Found(zone) => zone,
            Lookup::Absent => return Ok(OperationOutcome::NotFound),
            Lookup::Refused(outcome) => return Ok(outcome),
        };
        let current = match self
            .fetch_record(&zone.id, &desired.name, desired.record_type)
            .await?
        {
            Lookup::Found(record) => record,
            Lookup::Absent => return Ok(OperationOutcome::NotFound),
            Lookup::Refused(outcome) => return Ok(outcome),
        };

        let request = ApiRequest::put(format!("/zones/{}/records/{}", zone.id, current.id))
            .with_json(&RecordUpdateRequest::from(desired))?;

        let response = self.send(request).await?;
        let outcome = classify_mutation(&response, OperationOutcome::Updated)?;

        if outcome == OperationOutcome::Updated && !response.body.trim().is_empty() {
            let _: RecordResponse = response.json()?;
        }

        Ok(outcome)
    }

    /// `DELETE /zones/{id}/records/{recordId}`
    async fn delete_record(&self, desired: &DesiredRecord) -> Result<OperationOutcome> {
        let zone = match self.resolve_zone(&desired.root_name).await? {
            Lookup::Found(zone) => zone,
            Lookup::Absent => return Ok(OperationOutcome::NotFound),
            Lookup::Refused(outcome) => return Ok(outcome),
        };
        let current = match self
            .fetch_record(&zone.id, &desired.name, desired.record_type)
            .await?
        {
            Lookup::Found(record) => record,
            Lookup::Absent => return Ok(OperationOutcome::AlreadyAbsent),
            Lookup::Refused(outcome) => return Ok(outcome),
        };

        let request = ApiRequest::delete(format!("/zones/{}/records/{}", zone.id, current.id));
        let response = self.send(request).await?;
        classify_mutation(&response, OperationOutcome::Deleted)
    }

    fn log_failure(&self, verb: &str, desired: &DesiredRecord, outcome: OperationOutcome) {
        if outcome.is_failure() {
            warn!(
                "{} {} {} ended with {}",
                verb, desired.record_type, desired.name, outcome
            );
        }
    }
}

#[async_trait]
impl<T: Transport> DnsProvider for IonosClient<T> {
    async fn resolve_zone(&self, root_name: &str) -> Result<Lookup<Zone>> {
        debug!("Resolving zone: {}", root_name);

        let response = self.send(ApiRequest::get("/zones")).await?;
        match classify_read(&response)? {
            ReadStatus::Body => {}
            ReadStatus::Absent => return Ok(Lookup::Absent),
            ReadStatus::Refused(outcome) => return Ok(Lookup::Refused(outcome)),
        }

        let zones: Vec<ZoneSummary> = response.json()?;
        let zone = zones
            .into_iter()
            .find(|zone| zone.name.eq_ignore_ascii_case(root_name))
            .map(Zone::from);

        match zone {
            Some(zone) => {
                debug!("Found zone {} (id: {})", zone.name, zone.id);
                Ok(Lookup::Found(zone))
            }
            None => {
                debug!("No zone named {}", root_name);
                Ok(Lookup::Absent)
            }
        }
    }

    async fn fetch_record(
        &self,
        zone_id: &str,
        name: &str,
        record_type: RecordType,
    ) -> Result<Lookup<ObservedRecord>> {
        debug!("Looking up record: {} (type: {})", name, record_type);

        let request = ApiRequest::get(format!("/zones/{}", zone_id))
            .with_query("suffix", name)
            .with_query("recordType", record_type.as_str());

        let response = self.send(request).await?;
        match classify_read(&response)? {
            ReadStatus::Body => {}
            ReadStatus::Absent => return Ok(Lookup::Absent),
            ReadStatus::Refused(outcome) => return Ok(Lookup::Refused(outcome)),
        }

        let zone: ZoneDetail = response.json()?;
        let record = zone
            .records
            .into_iter()
            .filter(|r| {
                r.name.eq_ignore_ascii_case(name)
                    && r.record_type.eq_ignore_ascii_case(record_type.as_str())
            })
            .find_map(RecordResponse::into_observed);

        match record {
            Some(record) => {
                debug!("Found record id: {}", record.id);
                Ok(Lookup::Found(record))
            }
            None => Ok(Lookup::Absent),
        }
    }

    async fn ensure_matches(
        &self,
        desired: &DesiredRecord,
        dry_run: bool,
    ) -> Result<OperationOutcome> {
        info!(
            "Ensuring {} record {} -> {} [mode: {}]",
            desired.record_type,
            desired.name,
            desired.content,
            if dry_run { "DRY-RUN" } else { "LIVE" }
        );

        // Step 1: Resolve zone
        let zone = match self.resolve_zone(&desired.root_name).await? {
            Lookup::Found(zone) => zone,
            Lookup::Absent => {
                warn!("Zone {} not found", desired.root_name);
                return Ok(OperationOutcome::NotFound);
            }
            Lookup::Refused(outcome) => return Ok(outcome),
        };

        // Step 2: Fetch the current record, creating it when missing
        let existing = match self
            .fetch_record(&zone.id, &desired.name, desired.record_type)
            .await?
        {
            Lookup::Found(existing) => existing,
            Lookup::Absent => {
                if dry_run {
                    info!(
                        "[DRY-RUN] Would create {} record {}",
                        desired.record_type, desired.name
                    );
                    return Ok(OperationOutcome::Created);
                }
                let outcome = self.create_record(&zone, desired).await?;
                self.log_failure("Create", desired, outcome);
                return Ok(outcome);
            }
            Lookup::Refused(outcome) => return Ok(outcome),
        };

        // Step 3: Compare, then update when drifted
        let drift = existing.drift(desired);
        if drift.is_empty() {
            debug!("Record {} already matches", desired.name);
            return Ok(OperationOutcome::Unchanged);
        }

        let fields = drift.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
        if dry_run {
            info!(
                "[DRY-RUN] Would update {} record {} (drifted: {})",
                desired.record_type, desired.name, fields
            );
            return Ok(OperationOutcome::Updated);
        }

        info!(
            "Updating {} record {} (drifted: {}, was: {})",
            desired.record_type, desired.name, fields, existing.content
        );
        let outcome = self.update_record(desired).await?;
        self.log_failure("Update", desired, outcome);
        Ok(outcome)
    }

    async fn ensure_absent(
        &self,
        desired: &DesiredRecord,
        dry_run: bool,
    ) -> Result<OperationOutcome> {
        info!(
            "Ensuring {} record {} is absent [mode: {}]",
            desired.record_type,
            desired.name,
            if dry_run { "DRY-RUN" } else { "LIVE" }
        );

        let zone = match self.resolve_zone(&desired.root_name).await? {
            Lookup::Found(zone) => zone,
            Lookup::Absent => {
                warn!("Zone {} not found", desired.root_name);
                return Ok(OperationOutcome::NotFound);
            }
            Lookup::Refused(outcome) => return Ok(outcome),
        };

        let existing = match self
            .fetch_record(&zone.id, &desired.name, desired.record_type)
            .await?
        {
            Lookup::Found(existing) => existing,
            Lookup::Absent => {
                debug!("Record {} already absent", desired.name);
                return Ok(OperationOutcome::AlreadyAbsent);
            }
            Lookup::Refused(outcome) => return Ok(outcome),
        };

        if dry_run {
            info!(
                "[DRY-RUN] Would delete {} record {} (id: {})",
                desired.record_type, desired.name, existing.id
            );
            return Ok(OperationOutcome::Deleted);
        }

        let outcome = self.delete_record(desired).await?;
        match outcome {
            OperationOutcome::Deleted => {
                info!("Deleted {} record {}", desired.record_type, desired.name)
            }
            other => self.log_failure("Delete", desired, other),
        }
        Ok(outcome)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
