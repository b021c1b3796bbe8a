//! Test doubles and common utilities for convergence contract tests
//!
//! The in-memory API provides provider semantics; the wrappers here add
//! counting and stalling on top of any transport.

#![allow(dead_code)]

use async_trait::async_trait;
use ionos_dns_core::error::Result;
use ionos_dns_core::transport::{MemoryIonosApi, TEST_API_KEY};
use ionos_dns_core::{ApiRequest, ApiResponse, DesiredRecord, IonosClient, RecordType, Transport};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

pub const ZONE_ID: &str = "zone-1";
pub const ZONE: &str = "example.com";

/// Fresh API with an empty `example.com` zone, and a client authenticated
/// against it
pub async fn setup() -> (MemoryIonosApi, IonosClient<MemoryIonosApi>) {
    let api = MemoryIonosApi::default();
    api.add_zone(ZONE_ID, ZONE).await;
    let client = IonosClient::new(api.clone(), TEST_API_KEY);
    (api, client)
}

/// The record used throughout the contract tests
pub fn cname() -> DesiredRecord {
    DesiredRecord::new(ZONE, "test.example.com", RecordType::Cname, "target.com")
}

/// Transport wrapper that counts requests by kind
pub struct CountingTransport<T> {
    inner: T,
    reads: Arc<AtomicUsize>,
    mutations: Arc<AtomicUsize>,
}

impl<T: Transport> CountingTransport<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            reads: Arc::new(AtomicUsize::new(0)),
            mutations: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of GET requests sent
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of POST/PUT/DELETE requests sent
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T: Transport> Transport for CountingTransport<T> {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        if request.method.is_mutating() {
            self.mutations.fetch_add(1, Ordering::SeqCst);
        } else {
            self.reads.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.send(request).await
    }
}

/// Transport wrapper that never completes mutating requests
///
/// Reads pass through. The first mutating request signals `reached` and
/// then waits forever, so a test can cancel the caller mid-flight.
pub struct StallingTransport<T> {
    inner: T,
    pub reached: Arc<Notify>,
}

impl<T: Transport> StallingTransport<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            reached: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl<T: Transport> Transport for StallingTransport<T> {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        if request.method.is_mutating() {
            self.reached.notify_one();
            std::future::pending::<()>().await;
        }
        self.inner.send(request).await
    }
}
