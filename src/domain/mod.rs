// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Domain types and the order lifecycle orchestration. Adapters for the
// catalog, the order store and the message bus live outside this layer and
// are reached only through their port traits.
//
// ============================================================================

pub mod order;
