//! Metrics for the tournament engine
//!
//! This module provides Prometheus metrics collection for match processing,
//! pairing and engine performance.

pub mod collector;

pub use collector::{
    MatchMetrics, MetricsCollector, MetricsTimer, PairingMetrics, PerformanceMetrics,
};
