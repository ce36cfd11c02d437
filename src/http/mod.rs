// ============================================================================
// HTTP Surface - order submission, listing, metrics and health
// ============================================================================

mod handlers;
mod server;

pub use handlers::{AppState, OrderRequest};
pub use server::{configure, start_server};
