// # DNS Provider Trait
//
// Defines the convergence interface the `SyncEngine` drives.
//
// ## Implementations
//
// - IONOS: `crate::client::IonosClient`, generic over a `Transport`
//
// ## Usage
//
// ```rust,ignore
// use ionos_dns_core::{DesiredRecord, DnsProvider, RecordType};
//
// let record = DesiredRecord::new("example.com", "www.example.com", RecordType::A, "192.0.2.10");
//
// // Create or update until the provider matches
// let outcome = provider.ensure_matches(&record, false).await?;
//
// // Remove it again
// let outcome = provider.ensure_absent(&record, false).await?;
// ```

use async_trait::async_trait;

use crate::error::Result;
use crate::outcome::OperationOutcome;
use crate::record::{DesiredRecord, ObservedRecord, RecordType, Zone};

/// Result of a read that can be short-circuited by the provider
///
/// Reads can end in an actionable outcome (today only `Unauthorized`)
/// before any mutating call is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// The zone or record exists
    Found(T),
    /// Nothing matches
    Absent,
    /// The provider refused the read
    Refused(OperationOutcome),
}

/// Trait for DNS provider implementations
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Contract
///
/// - Reads (`resolve_zone`, `fetch_record`) never change provider state
/// - `ensure_*` issue at most one mutating call, and none in dry-run mode
/// - Zones and records are looked up fresh on every call; nothing is cached
/// - Expected results come back as [`OperationOutcome`]; `Err` is reserved
///   for faults the caller cannot act on structurally
/// - No retries and no backoff; the caller re-invokes on its next pass
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Find a zone by exact, case-insensitive name
    ///
    /// # Returns
    ///
    /// - `Ok(Lookup::Found(zone))`: the zone exists
    /// - `Ok(Lookup::Absent)`: no zone with that name
    /// - `Ok(Lookup::Refused(outcome))`: the read was refused (e.g. `Unauthorized`)
    /// - `Err(Error)`: transport failure or unclassifiable response
    async fn resolve_zone(&self, root_name: &str) -> Result<Lookup<Zone>>;

    /// Fetch the first record in `zone_id` matching `(name, record_type)`
    ///
    /// Name and type compare case-insensitively.
    async fn fetch_record(
        &self,
        zone_id: &str,
        name: &str,
        record_type: RecordType,
    ) -> Result<Lookup<ObservedRecord>>;

    /// Create or update the record until the provider matches `desired`
    ///
    /// # Returns
    ///
    /// `Created`, `Updated`, `Unchanged`, `Unauthorized`, `NotFound` or `Conflict`.
    async fn ensure_matches(&self, desired: &DesiredRecord, dry_run: bool)
    -> Result<OperationOutcome>;

    /// Delete the record if it exists
    ///
    /// # Returns
    ///
    /// `Deleted`, `AlreadyAbsent`, `Unauthorized`, `NotFound` or `Conflict`.
    async fn ensure_absent(&self, desired: &DesiredRecord, dry_run: bool)
    -> Result<OperationOutcome>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
