//! Configuration loaded from environment variables with defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub store: StoreConfig,
    pub redpanda: RedpandaConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Base URI of the catalog service
    pub uri: String,
    /// Per-lookup timeout in milliseconds
    pub timeout_ms: u64,
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreKind {
    Scylla,
    Memory,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scylla" => Ok(StoreKind::Scylla),
            "memory" => Ok(StoreKind::Memory),
            other => Err(format!("unknown order store: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub kind: StoreKind,
    /// Comma-separated ScyllaDB contact points
    pub scylla_nodes: String,
    pub keyspace: String,
}

impl StoreConfig {
    pub fn nodes(&self) -> Vec<&str> {
        self.scylla_nodes
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedpandaConfig {
    pub brokers: String,
    pub consumer_group: String,
    /// Outbound channel for order accepted events
    pub order_accepted_topic: String,
    /// Inbound channel for dispatch notifications
    pub order_dispatched_topic: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment value, keeping the default when missing or invalid
fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|s| s.parse().ok()).unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            catalog: CatalogConfig {
                uri: var_or("CATALOG_SERVICE_URI", "http://localhost:9001"),
                timeout_ms: parse_or(env::var("CATALOG_TIMEOUT_MS").ok(), 3000),
            },
            store: StoreConfig {
                kind: parse_or(env::var("ORDER_STORE").ok(), StoreKind::Scylla),
                scylla_nodes: var_or("SCYLLA_NODES", "127.0.0.1:9042"),
                keyspace: var_or("SCYLLA_KEYSPACE", "order_ks"),
            },
            redpanda: RedpandaConfig {
                brokers: var_or("REDPANDA_BROKERS", "localhost:9092"),
                consumer_group: var_or("CONSUMER_GROUP", "order-service"),
                order_accepted_topic: var_or("ORDER_ACCEPTED_TOPIC", "order-accepted"),
                order_dispatched_topic: var_or("ORDER_DISPATCHED_TOPIC", "order-dispatched"),
            },
            server: ServerConfig {
                host: var_or("HOST", "0.0.0.0"),
                port: parse_or(env::var("PORT").ok(), 9002),
            },
        }
    }
}
