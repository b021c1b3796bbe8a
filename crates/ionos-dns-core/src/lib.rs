// # ionos-dns-core
//
// Core library for idempotent IONOS DNS record convergence.
//
// ## Architecture Overview
//
// - **DnsProvider**: convergence verbs (`ensure_matches` / `ensure_absent`)
//   plus the reads they are built from
// - **IonosClient**: the IONOS implementation of `DnsProvider`
// - **Transport**: one HTTP request in, status and body out
// - **SyncEngine**: façade drivers call once per resource per pass
// - **OperationOutcome**: the closed set of expected results
//
// ## Design Principles
//
// 1. **Level-triggered**: every call observes provider state fresh; nothing is cached
// 2. **Idempotent**: repeating a call against a converged record sends no mutation
// 3. **Outcomes, not exceptions**: 401/404/409 are values, other failures are `Error`
// 4. **Library-First**: the binary is a thin driver over this crate

pub mod api;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod outcome;
pub mod record;
pub mod resource;
pub mod traits;
pub mod transport;

// Re-export core types for convenience
pub use client::IonosClient;
pub use config::{ClientConfig, SyncConfig};
pub use engine::{SyncAction, SyncEngine, SyncResult};
pub use error::{Error, Result};
pub use outcome::{OperationOutcome, RecordPhase};
pub use record::{DEFAULT_TTL, DesiredRecord, ObservedRecord, RecordField, RecordType, Zone};
pub use resource::{DnsRecordResource, DnsRecordSpec, DnsRecordStatus};
pub use traits::{ApiRequest, ApiResponse, DnsProvider, Lookup, Method, Transport};
