//! Operation outcomes and the per-record convergence phase
//!
//! [`OperationOutcome`] is the engine's only channel for expected results.
//! [`RecordPhase`] is the state a declared record is in from the point of
//! view of whoever drives the engine; it only moves when the driver feeds
//! an outcome back in.
//!
//! ```text
//! Absent ──Created──▶ Converged ◀──Updated── Converging
//!                        │  ▲                     ▲
//!                        │  └──Unchanged──┘       │
//!                        └──── spec change ───────┘
//!
//! (any) ──finalize──▶ Deleting ──Deleted|AlreadyAbsent──▶ Gone
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of a single `ensure_*` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationOutcome {
    /// Record was created
    Created,
    /// Record existed and was changed to match
    Updated,
    /// Record already matched; nothing was sent
    Unchanged,
    /// Record was deleted
    Deleted,
    /// Record did not exist; nothing was sent
    AlreadyAbsent,
    /// The provider rejected the API key
    Unauthorized,
    /// The zone (or the record, at mutation time) does not exist
    NotFound,
    /// The provider refused the change because of concurrent state
    Conflict,
}

impl OperationOutcome {
    /// Outcome name as it appears in status and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationOutcome::Created => "Created",
            OperationOutcome::Updated => "Updated",
            OperationOutcome::Unchanged => "Unchanged",
            OperationOutcome::Deleted => "Deleted",
            OperationOutcome::AlreadyAbsent => "AlreadyAbsent",
            OperationOutcome::Unauthorized => "Unauthorized",
            OperationOutcome::NotFound => "NotFound",
            OperationOutcome::Conflict => "Conflict",
        }
    }

    /// Outcomes the caller should act on by retrying on a later pass
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            OperationOutcome::Unauthorized | OperationOutcome::NotFound | OperationOutcome::Conflict
        )
    }

    /// Outcomes that mean provider state was (or in dry-run, would be) changed
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            OperationOutcome::Created | OperationOutcome::Updated | OperationOutcome::Deleted
        )
    }

    /// Whether this outcome completes an apply pass
    pub fn converges_apply(&self) -> bool {
        matches!(
            self,
            OperationOutcome::Created | OperationOutcome::Updated | OperationOutcome::Unchanged
        )
    }

    /// Whether this outcome completes a delete pass
    pub fn converges_delete(&self) -> bool {
        matches!(
            self,
            OperationOutcome::Deleted | OperationOutcome::AlreadyAbsent
        )
    }
}

impl fmt::Display for OperationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Convergence phase of one declared record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecordPhase {
    /// Nothing has been applied yet
    #[default]
    Absent,
    /// The declaration changed since the record last converged
    Converging,
    /// Provider state matches the declaration
    Converged,
    /// Finalization started; removal not yet confirmed
    Deleting,
    /// Removal confirmed
    Gone,
}

impl RecordPhase {
    /// The declaration was edited; a converged record must converge again
    pub fn spec_changed(self) -> Self {
        match self {
            RecordPhase::Converged => RecordPhase::Converging,
            other => other,
        }
    }

    /// Advance after an apply pass returned `outcome`
    ///
    /// Failure outcomes leave the phase where it was.
    pub fn after_apply(self, outcome: OperationOutcome) -> Self {
        match (self, outcome) {
            (RecordPhase::Deleting | RecordPhase::Gone, _) => self,
            (_, o) if o.converges_apply() => RecordPhase::Converged,
            _ => self,
        }
    }

    /// Advance after a delete pass returned `outcome`
    pub fn after_delete(self, outcome: OperationOutcome) -> Self {
        if outcome.converges_delete() {
            RecordPhase::Gone
        } else {
            RecordPhase::Deleting
        }
    }
}
