//! Core traits for IONOS DNS synchronisation
//!
//! - [`Transport`]: Send one API request, return the raw response
//! - [`DnsProvider`]: Resolve zones/records and converge a single record

pub mod transport;
pub mod dns_provider;

pub use transport::{ApiRequest, ApiResponse, Method, Transport};
pub use dns_provider::{DnsProvider, Lookup};
