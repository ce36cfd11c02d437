use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
};

// ============================================================================
// Metrics Module - Prometheus metrics for the order lifecycle
// ============================================================================
//
// Provides metrics for:
// - Submissions by resulting status
// - Catalog lookup latency
// - Outcome of order-accepted publishes
// - Dispatch reconciliation (applied, dropped, failed)
//
// All metrics are registered with one Registry, scraped via GET /metrics
// ============================================================================

pub struct OrderMetrics {
    registry: Registry,

    pub orders_submitted: IntCounterVec,
    pub catalog_lookup_duration: Histogram,
    pub events_published: IntCounterVec,
    pub orders_dispatched: IntCounter,
    pub dispatch_dropped: IntCounterVec,
    pub dispatch_failed: IntCounter,
}

impl OrderMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let orders_submitted = IntCounterVec::new(
            Opts::new("orders_submitted_total", "Total orders submitted, by resulting status"),
            &["status"],
        )?;
        registry.register(Box::new(orders_submitted.clone()))?;

        let catalog_lookup_duration = Histogram::with_opts(
            HistogramOpts::new("catalog_lookup_duration_seconds", "Catalog lookup duration")
                .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 3.0, 5.0]),
        )?;
        registry.register(Box::new(catalog_lookup_duration.clone()))?;

        let events_published = IntCounterVec::new(
            Opts::new("order_events_published_total", "Order accepted events handed to the bus"),
            &["outcome"],
        )?;
        registry.register(Box::new(events_published.clone()))?;

        let orders_dispatched = IntCounter::new(
            "orders_dispatched_total",
            "Orders moved to DISPATCHED",
        )?;
        registry.register(Box::new(orders_dispatched.clone()))?;

        let dispatch_dropped = IntCounterVec::new(
            Opts::new("dispatch_events_dropped_total", "Dispatch notifications dropped without a write"),
            &["reason"],
        )?;
        registry.register(Box::new(dispatch_dropped.clone()))?;

        let dispatch_failed = IntCounter::new(
            "dispatch_events_failed_total",
            "Dispatch notifications that failed to apply",
        )?;
        registry.register(Box::new(dispatch_failed.clone()))?;

        Ok(Self {
            registry,
            orders_submitted,
            catalog_lookup_duration,
            events_published,
            orders_dispatched,
            dispatch_dropped,
            dispatch_failed,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_submission(&self, status: &str) {
        self.orders_submitted.with_label_values(&[status]).inc();
    }

    pub fn record_catalog_lookup(&self, duration_secs: f64) {
        self.catalog_lookup_duration.observe(duration_secs);
    }

    /// `outcome` is one of "sent", "refused", "failed"
    pub fn record_publish(&self, outcome: &str) {
        self.events_published.with_label_values(&[outcome]).inc();
    }

    pub fn record_dispatched(&self) {
        self.orders_dispatched.inc();
    }

    pub fn record_dispatch_dropped(&self, reason: &str) {
        self.dispatch_dropped.with_label_values(&[reason]).inc();
    }

    pub fn record_dispatch_failed(&self) {
        self.dispatch_failed.inc();
    }
}
