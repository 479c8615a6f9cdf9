// Copyright 2026 the fxgov Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON projection of governor state for debug overlays.
//!
//! The object is the serde form of [`GovernorMetrics`]:
//!
//! ```json
//! {
//!   "tier": "medium",
//!   "fps": 48,
//!   "frame_time_ms": 20.8,
//!   "capabilities": { "webgl": true, "is_high_performance": true, ... }
//! }
//! ```
//!
//! `fps` and `frame_time_ms` are `null` until the first metrics report.

use std::io::{self, Write};

use fxgov_core::GovernorMetrics;
use serde_json::Value;

/// Builds the overlay object for `metrics`.
///
/// # Errors
///
/// Fails only if serialization itself fails, which the metric types never
/// trigger.
pub fn metrics_json(metrics: &GovernorMetrics) -> serde_json::Result<Value> {
    serde_json::to_value(metrics)
}

/// [`metrics_json`] as a compact string.
///
/// # Errors
///
/// See [`metrics_json`].
pub fn metrics_string(metrics: &GovernorMetrics) -> serde_json::Result<String> {
    serde_json::to_string(metrics)
}

/// Writes the overlay object to `writer`, followed by a newline.
pub fn write_metrics(metrics: &GovernorMetrics, writer: &mut dyn Write) -> io::Result<()> {
    serde_json::to_writer(&mut *writer, metrics)?;
    writer.write_all(b"\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxgov_core::capability::{CapabilitySnapshot, HostProbe};
    use fxgov_core::time::Duration;
    use fxgov_core::{GovernorConfig, OptimizationTier};

    fn snapshot() -> CapabilitySnapshot {
        CapabilitySnapshot::from_probe(&HostProbe {
            webgl: true,
            backdrop_filter: false,
            transform_3d: true,
            hardware_concurrency: Some(8),
            memory_limit_mb: Some(4096.0),
            prefers_reduced_motion: false,
            user_agent: None,
            viewport_width: Some(1920.0),
        })
    }

    #[test]
    fn fresh_governor_has_null_frame_stats() {
        let value = metrics_json(&GovernorMetrics {
            capabilities: snapshot(),
            tier: OptimizationTier::High,
            fps: None,
            frame_time_ms: None,
        })
        .unwrap();
        assert_eq!(value["tier"], "high");
        assert!(value["fps"].is_null());
        assert!(value["frame_time_ms"].is_null());
        assert_eq!(value["capabilities"]["is_high_performance"], true);
        assert_eq!(value["capabilities"]["backdrop_filter"], false);
        assert_eq!(value["capabilities"]["hardware_concurrency"], 8);
    }

    #[test]
    fn reported_stats_are_numbers() {
        let value = metrics_json(&GovernorMetrics {
            capabilities: snapshot(),
            tier: OptimizationTier::Medium,
            fps: Some(48),
            frame_time_ms: Some(20.5),
        })
        .unwrap();
        assert_eq!(value["tier"], "medium");
        assert_eq!(value["fps"], 48);
        assert_eq!(value["frame_time_ms"], 20.5);
    }

    #[test]
    fn written_output_is_one_json_line() {
        let metrics = GovernorMetrics {
            capabilities: snapshot(),
            tier: OptimizationTier::Low,
            fps: Some(12),
            frame_time_ms: Some(83.25),
        };
        let mut out = Vec::new();
        write_metrics(&metrics, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.ends_with('\n'));

        let parsed: Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(parsed, metrics_json(&metrics).unwrap());
        assert_eq!(metrics_string(&metrics).unwrap(), text.trim_end());
    }

    #[test]
    fn overlay_json_reads_back_as_metrics() {
        let metrics = GovernorMetrics {
            capabilities: snapshot(),
            tier: OptimizationTier::Medium,
            fps: Some(51),
            frame_time_ms: Some(19.5),
        };
        let text = metrics_string(&metrics).unwrap();
        let back: GovernorMetrics = serde_json::from_str(&text).unwrap();
        assert_eq!(back, metrics);
    }

    #[test]
    fn config_json_reads_back() {
        let mut config = GovernorConfig::default();
        config.monitor.report_window = Duration::from_millis(750);
        config.degradation_threshold = 4;

        let text = serde_json::to_string(&config).unwrap();
        assert!(text.contains("\"report_window_ms\":750"), "got: {text}");
        let back: GovernorConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
