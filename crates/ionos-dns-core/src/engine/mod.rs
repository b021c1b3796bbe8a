//! Convergence façade used by reconciliation drivers
//!
//! The SyncEngine is responsible for:
//! - Turning a declared resource into a [`DesiredRecord`]
//! - Delegating to the [`DnsProvider`] for the requested verb
//! - Handing the outcome back unchanged
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │      Driver      │ (apply / delete, once per resource per pass)
//! └──────────────────┘
//!          │ DnsRecordResource, dry_run
//!          ▼
//! ┌──────────────────┐
//! │    SyncEngine    │ ensure_created → ensure_matches
//! │                  │ ensure_deleted → ensure_absent
//! └──────────────────┘
//!          │ DesiredRecord
//!          ▼
//! ┌──────────────────┐        ┌─────────────┐
//! │   DnsProvider    │──────▶ │  Transport  │
//! └──────────────────┘        └─────────────┘
//! ```
//!
//! The engine holds no state besides the provider, never retries and never
//! caches. Retry timing and status bookkeeping belong to the driver.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::outcome::OperationOutcome;
use crate::record::DesiredRecord;
use crate::resource::DnsRecordResource;
use crate::traits::DnsProvider;

/// Which verb a pass ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncAction {
    Apply,
    Delete,
}

/// Result of one engine call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub action: SyncAction,
    pub outcome: OperationOutcome,
}

impl SyncResult {
    /// Whether the driver may treat the pass as done
    ///
    /// Apply passes converge on `Created`/`Updated`/`Unchanged`, delete
    /// passes on `Deleted`/`AlreadyAbsent`. Anything else means retry later.
    pub fn is_converged(&self) -> bool {
        match self.action {
            SyncAction::Apply => self.outcome.converges_apply(),
            SyncAction::Delete => self.outcome.converges_delete(),
        }
    }
}

/// IONOS DNS sync engine
///
/// ## Threading
///
/// `&self` methods only; concurrent calls for different records need no
/// coordination. Calls for the same record are not serialized here; the
/// provider is the only synchronization point and a lost race shows up as
/// `Conflict`.
pub struct SyncEngine {
    provider: Box<dyn DnsProvider>,
}

impl SyncEngine {
    /// Create a new engine over `provider`
    pub fn new(provider: Box<dyn DnsProvider>) -> Self {
        Self { provider }
    }

    /// Name of the provider the engine drives
    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Converge the provider onto the resource's declaration
    pub async fn ensure_created(
        &self,
        resource: &DnsRecordResource,
        dry_run: bool,
    ) -> Result<SyncResult> {
        debug!("Apply pass for {}", resource.name);
        let outcome = self.ensure_matches(&resource.desired(), dry_run).await?;
        Ok(self.finish(resource, SyncAction::Apply, outcome))
    }

    /// Remove the resource's record from the provider
    pub async fn ensure_deleted(
        &self,
        resource: &DnsRecordResource,
        dry_run: bool,
    ) -> Result<SyncResult> {
        debug!("Delete pass for {}", resource.name);
        let outcome = self.ensure_absent(&resource.desired(), dry_run).await?;
        Ok(self.finish(resource, SyncAction::Delete, outcome))
    }

    /// Converge on a bare desired record
    pub async fn ensure_matches(
        &self,
        desired: &DesiredRecord,
        dry_run: bool,
    ) -> Result<OperationOutcome> {
        self.provider.ensure_matches(desired, dry_run).await
    }

    /// Ensure a bare desired record is absent
    pub async fn ensure_absent(
        &self,
        desired: &DesiredRecord,
        dry_run: bool,
    ) -> Result<OperationOutcome> {
        self.provider.ensure_absent(desired, dry_run).await
    }

    fn finish(
        &self,
        resource: &DnsRecordResource,
        action: SyncAction,
        outcome: OperationOutcome,
    ) -> SyncResult {
        let result = SyncResult { action, outcome };
        if !result.is_converged() {
            warn!(
                "{} did not converge ({:?}): {}",
                resource.name, action, outcome
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ObservedRecord, RecordType, Zone};
    use crate::resource::DnsRecordSpec;
    use crate::traits::Lookup;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Provider that records what it was asked and replies with a fixed outcome
    struct MockProvider {
        outcome: OperationOutcome,
        calls: Arc<Mutex<Vec<(&'static str, DesiredRecord, bool)>>>,
    }

    #[async_trait]
    impl DnsProvider for MockProvider {
        async fn resolve_zone(&self, _root_name: &str) -> Result<Lookup<Zone>> {
            Ok(Lookup::Absent)
        }

        async fn fetch_record(
            &self,
            _zone_id: &str,
            _name: &str,
            _record_type: RecordType,
        ) -> Result<Lookup<ObservedRecord>> {
            Ok(Lookup::Absent)
        }

        async fn ensure_matches(
            &self,
            desired: &DesiredRecord,
            dry_run: bool,
        ) -> Result<OperationOutcome> {
            self.calls
                .lock()
                .unwrap()
                .push(("matches", desired.clone(), dry_run));
            Ok(self.outcome)
        }

        async fn ensure_absent(
            &self,
            desired: &DesiredRecord,
            dry_run: bool,
        ) -> Result<OperationOutcome> {
            self.calls
                .lock()
                .unwrap()
                .push(("absent", desired.clone(), dry_run));
            Ok(self.outcome)
        }

        fn provider_name(&self) -> &'static str {
            "mock"
        }
    }

    fn engine(
        outcome: OperationOutcome,
    ) -> (SyncEngine, Arc<Mutex<Vec<(&'static str, DesiredRecord, bool)>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let provider = MockProvider {
            outcome,
            calls: calls.clone(),
        };
        (SyncEngine::new(Box::new(provider)), calls)
    }

    fn resource() -> DnsRecordResource {
        DnsRecordResource::new(
            "mail",
            DnsRecordSpec {
                root_name: "example.com".to_string(),
                name: "example.com".to_string(),
                record_type: RecordType::Mx,
                content: "mx.example.com".to_string(),
                ttl: None,
                prio: Some(10),
                disabled: false,
            },
        )
    }

    #[tokio::test]
    async fn test_ensure_created_delegates_mapped_record() {
        let (engine, calls) = engine(OperationOutcome::Created);

        let result = engine.ensure_created(&resource(), true).await.unwrap();
        assert_eq!(result.outcome, OperationOutcome::Created);
        assert!(result.is_converged());

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (verb, desired, dry_run) = &calls[0];
        assert_eq!(*verb, "matches");
        assert!(*dry_run);
        assert_eq!(desired.ttl, 3600);
        assert_eq!(desired.prio, Some(10));
        assert_eq!(desired.record_type, RecordType::Mx);
    }

    #[tokio::test]
    async fn test_ensure_deleted_delegates_to_absent() {
        let (engine, calls) = engine(OperationOutcome::AlreadyAbsent);

        let result = engine.ensure_deleted(&resource(), false).await.unwrap();
        assert_eq!(result.action, SyncAction::Delete);
        assert!(result.is_converged());
        assert_eq!(calls.lock().unwrap()[0].0, "absent");
    }

    #[tokio::test]
    async fn test_outcome_passes_through_unchanged() {
        for outcome in [
            OperationOutcome::Unauthorized,
            OperationOutcome::NotFound,
            OperationOutcome::Conflict,
        ] {
            let (engine, _) = engine(outcome);
            let result = engine.ensure_created(&resource(), false).await.unwrap();
            assert_eq!(result.outcome, outcome);
            assert!(!result.is_converged());
        }
    }

    #[test]
    fn test_convergence_depends_on_verb() {
        let apply = SyncResult {
            action: SyncAction::Apply,
            outcome: OperationOutcome::Deleted,
        };
        assert!(!apply.is_converged());

        let delete = SyncResult {
            action: SyncAction::Delete,
            outcome: OperationOutcome::Unchanged,
        };
        assert!(!delete.is_converged());
    }
}
