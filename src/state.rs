/*
 * Responsibility
 * - Shared context bound to the Router (AppState)
 * - Clone is cheap (Arc inside)
 */
use std::sync::Arc;

use crate::middleware::request_gate::RequestGate;
use crate::services::service_ids::InMemoryServiceIdCache;

#[derive(Clone, Debug)]
pub struct AppState {
    pub gate: Arc<RequestGate>,
    // Same snapshot the gate reads; kept here for /health.
    pub service_ids: Arc<InMemoryServiceIdCache>,
}

impl AppState {
    pub fn new(gate: Arc<RequestGate>, service_ids: Arc<InMemoryServiceIdCache>) -> Self {
        Self { gate, service_ids }
    }
}
