use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// Metrics
pub static PREVIEW_LOADS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static CHAT_QUERIES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static UPLOADS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static OBJECT_URLS_LIVE: OnceLock<IntGauge> = OnceLock::new();

pub fn init_metrics() -> Result<(), prometheus::Error> {
    if REGISTRY.get().is_some() {
        return Ok(());
    }

    let registry = Registry::new();

    let preview_loads = IntCounterVec::new(
        Opts::new("preview_loads_total", "Document preview loads by outcome"),
        &["outcome"],
    )?;
    let chat_queries = IntCounterVec::new(
        Opts::new("chat_queries_total", "Chat queries by outcome"),
        &["outcome"],
    )?;
    let uploads = IntCounterVec::new(
        Opts::new("uploads_total", "Document uploads by outcome"),
        &["outcome"],
    )?;
    let object_urls = IntGauge::new("object_urls_live", "Object URLs currently alive")?;

    registry.register(Box::new(preview_loads.clone()))?;
    registry.register(Box::new(chat_queries.clone()))?;
    registry.register(Box::new(uploads.clone()))?;
    registry.register(Box::new(object_urls.clone()))?;

    // Initialize globals
    let _ = REGISTRY.set(registry);
    let _ = PREVIEW_LOADS_TOTAL.set(preview_loads);
    let _ = CHAT_QUERIES_TOTAL.set(chat_queries);
    let _ = UPLOADS_TOTAL.set(uploads);
    let _ = OBJECT_URLS_LIVE.set(object_urls);

    Ok(())
}

pub fn record_preview_load(outcome: &str) {
    if let Some(counter) = PREVIEW_LOADS_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

pub fn record_chat_query(outcome: &str) {
    if let Some(counter) = CHAT_QUERIES_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

pub fn record_upload(outcome: &str) {
    if let Some(counter) = UPLOADS_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

pub fn object_url_created() {
    if let Some(gauge) = OBJECT_URLS_LIVE.get() {
        gauge.inc();
    }
}

pub fn object_url_revoked() {
    if let Some(gauge) = OBJECT_URLS_LIVE.get() {
        gauge.dec();
    }
}

/// Text exposition of every registered metric; empty before `init_metrics`.
pub fn get_metrics() -> String {
    let Some(registry) = REGISTRY.get() else {
        return String::new();
    };

    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
