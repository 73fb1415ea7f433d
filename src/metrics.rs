//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("gompa_http_requests_total", "Total number of HTTP requests"),
        &["method", "endpoint", "status"]
    ).expect("metric can be created");
    pub static ref HTTP_REQUEST_DURATION_SECONDS: prometheus::HistogramVec = prometheus::HistogramVec::new(
        HistogramOpts::new(
            "gompa_http_request_duration_seconds",
            "HTTP request duration in seconds"
        ).buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["method", "endpoint"]
    ).expect("metric can be created");

    // Domain Metrics
    pub static ref ITINERARIES_GENERATED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("gompa_itineraries_generated_total", "Total number of generated itineraries"),
        &["budget_category"]
    ).expect("metric can be created");
    pub static ref STORIES_CREATED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("gompa_stories_created_total", "Total number of submitted stories"),
        &["media_type", "initial_status"]
    ).expect("metric can be created");
    pub static ref STORIES_MODERATED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("gompa_stories_moderated_total", "Total number of moderation decisions"),
        &["status"]
    ).expect("metric can be created");
    pub static ref MONK_POSTS_CREATED_TOTAL: IntCounter = IntCounter::new(
        "gompa_monk_posts_created_total",
        "Total number of monk posts created"
    ).expect("metric can be created");

    // Outbound Metrics
    pub static ref CHAT_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("gompa_chat_requests_total", "Chat requests by outcome"),
        &["outcome"]
    ).expect("metric can be created");
    pub static ref PRESERVATION_COMPARISONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("gompa_preservation_comparisons_total", "Image comparisons by severity"),
        &["severity"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("gompa_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

static INIT: Once = Once::new();

/// Initialize metrics registry.
///
/// Safe to call more than once; only the first call registers.
pub fn init_metrics() {
    INIT.call_once(|| {
        REGISTRY
            .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
            .expect("HTTP_REQUESTS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
            .expect("HTTP_REQUEST_DURATION_SECONDS can be registered");
        REGISTRY
            .register(Box::new(ITINERARIES_GENERATED_TOTAL.clone()))
            .expect("ITINERARIES_GENERATED_TOTAL can be registered");
        REGISTRY
            .register(Box::new(STORIES_CREATED_TOTAL.clone()))
            .expect("STORIES_CREATED_TOTAL can be registered");
        REGISTRY
            .register(Box::new(STORIES_MODERATED_TOTAL.clone()))
            .expect("STORIES_MODERATED_TOTAL can be registered");
        REGISTRY
            .register(Box::new(MONK_POSTS_CREATED_TOTAL.clone()))
            .expect("MONK_POSTS_CREATED_TOTAL can be registered");
        REGISTRY
            .register(Box::new(CHAT_REQUESTS_TOTAL.clone()))
            .expect("CHAT_REQUESTS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(PRESERVATION_COMPARISONS_TOTAL.clone()))
            .expect("PRESERVATION_COMPARISONS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(ERRORS_TOTAL.clone()))
            .expect("ERRORS_TOTAL can be registered");

        tracing::info!("Metrics registry initialized");
    });
}
