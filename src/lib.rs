// ============================================================================
// Order Service
// ============================================================================
//
// Accepts or rejects book orders against the catalog, records them, announces
// accepted orders on the bus and marks them dispatched when fulfillment says so.
//
// - domain/    - Order model, events, errors and the OrderService orchestrator
// - catalog/   - Catalog lookup port + HTTP client
// - store/     - Order store port + ScyllaDB and in-memory implementations
// - messaging/ - Event publisher port + Redpanda producer and dispatch consumer
// - http/      - REST endpoints, /metrics and /health
//
// ============================================================================

pub mod catalog;
pub mod config;
pub mod domain;
pub mod http;
pub mod messaging;
pub mod metrics;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;
