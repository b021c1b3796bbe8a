//! Transports that live inside the core crate
//!
//! The reqwest-backed transport is in the `ionos-dns-http` crate.

pub mod memory;

pub use memory::{MemoryIonosApi, TEST_API_KEY};
