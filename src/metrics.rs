//! Observability hooks.
//!
//! With the `metrics` feature, [`METRICS`] counts every statement round trip and every
//! reconciliation pass and exposes them through a Prometheus exporter. With the `tracing`
//! feature, [`tracing_helpers`] provides the spans the driver and reconciler enter.

#[cfg(feature = "metrics")]
pub use self::otel::{SchemaguardMetrics, METRICS};

#[cfg(feature = "metrics")]
mod otel {
    use once_cell::sync::Lazy;
    use opentelemetry::{
        metrics::{Counter, Histogram, MeterProvider},
        KeyValue,
    };
    use opentelemetry_sdk::metrics::SdkMeterProvider;
    use prometheus::{Encoder, Registry, TextEncoder};
    use std::time::Duration;

    pub static METRICS: Lazy<SchemaguardMetrics> = Lazy::new(SchemaguardMetrics::init);

    pub struct SchemaguardMetrics {
        pub registry: Registry,
        pub provider: SdkMeterProvider,
        pub statements_total: Counter<u64>,
        pub statement_errors_total: Counter<u64>,
        pub statement_duration: Histogram<f64>,
        pub reconcile_passes_total: Counter<u64>,
    }

    impl SchemaguardMetrics {
        pub fn init() -> Self {
            let registry = Registry::new();
            let exporter = opentelemetry_prometheus::exporter()
                .with_registry(registry.clone())
                .build()
                .expect("failed to build prometheus exporter");
            let provider = SdkMeterProvider::builder().with_reader(exporter).build();
            let meter = provider.meter("schemaguard");

            let statements_total = meter.u64_counter("schemaguard_statements_total")
                .with_description("Statements and catalog queries sent to PostgreSQL").build();

            let statement_errors_total = meter.u64_counter("schemaguard_statement_errors_total")
                .with_description("Statements rejected by PostgreSQL").build();

            let statement_duration = meter.f64_histogram("schemaguard_statement_duration_seconds")
                .with_description("Round-trip duration of a single statement").build();

            let reconcile_passes_total = meter.u64_counter("schemaguard_reconcile_passes_total")
                .with_description("Table reconciliation passes by outcome").build();

            Self {
                registry,
                provider,
                statements_total,
                statement_errors_total,
                statement_duration,
                reconcile_passes_total,
            }
        }

        pub fn record_statement(&self, elapsed: Duration) {
            self.statements_total.add(1, &[]);
            self.statement_duration.record(elapsed.as_secs_f64(), &[]);
        }

        pub fn record_statement_error(&self) {
            self.statement_errors_total.add(1, &[]);
        }

        pub fn record_pass(&self, outcome: &'static str) {
            self.reconcile_passes_total.add(1, &[KeyValue::new("outcome", outcome)]);
        }

        /// Current values in the Prometheus text exposition format.
        pub fn render(&self) -> String {
            let mut buffer = Vec::new();
            if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buffer) {
                log::warn!("Failed to encode metrics: {}", e);
            }
            String::from_utf8_lossy(&buffer).into_owned()
        }
    }

}

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::{info_span, Span};

    pub fn connect_span() -> Span {
        info_span!("schemaguard.connect")
    }

    pub fn begin_transaction_span() -> Span {
        info_span!("schemaguard.transaction.begin")
    }

    pub fn commit_transaction_span() -> Span {
        info_span!("schemaguard.transaction.commit")
    }

    pub fn rollback_transaction_span() -> Span {
        info_span!("schemaguard.transaction.rollback")
    }

    pub fn execute_statement_span(statement: &str) -> Span {
        info_span!("schemaguard.statement", sql = statement)
    }

    pub fn reconcile_table_span(schema: &str, table: &str) -> Span {
        info_span!("schemaguard.reconcile", schema = schema, table = table)
    }
}
