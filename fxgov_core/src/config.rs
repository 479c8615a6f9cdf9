// Copyright 2026 the fxgov Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Governor configuration.
//!
//! [`GovernorConfig`] groups the tunables of each component. The defaults
//! are the production values: a 1000 ms reporting window over a 60-sample
//! frame ring, a 55 fps / 18 ms budget, a 1000 ms hint-retraction delay,
//! and a three-strike degradation watcher.
//!
//! With the `serde` feature every field may be omitted when deserializing;
//! missing fields take their default. Durations are written in whole
//! milliseconds under `*_ms` keys.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use thiserror::Error;

use crate::time::Duration;

/// Selectors whose elements are promoted to their own compositing layer.
pub const DEFAULT_ACCELERATED_SELECTORS: &[&str] = &[
    ".animate-fade-in",
    ".animate-slide-up",
    ".animate-slide-in",
    ".animate-scale-in",
    ".card-hover",
    ".glass-card",
    ".modal-content",
    ".dropdown-menu",
    ".parallax-layer",
];

/// Attributes that mark an element for promotion regardless of its classes.
pub const DEFAULT_MARKER_ATTRIBUTES: &[&str] = &["data-animate", "data-parallax"];

/// Selector picking the elements a fallback sweep inspects.
pub const DEFAULT_FALLBACK_SCAN_SELECTOR: &str = "[class*=\"animate-\"]";

/// Reasons a [`GovernorConfig`] cannot be used.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The frame-time ring must hold at least one sample.
    #[error("frame ring capacity must be at least 1")]
    ZeroRingCapacity,
    /// The reporting window must be a positive duration.
    #[error("metrics reporting window must be non-zero")]
    ZeroReportWindow,
    /// The frame-time budget must be a finite, positive number of ms.
    #[error("frame time budget must be finite and positive")]
    InvalidFrameTimeBudget,
    /// The degradation watcher needs at least one strike to trigger.
    #[error("degradation threshold must be at least 1")]
    ZeroDegradationThreshold,
    /// At least one selector or marker attribute is required.
    #[error("acceleration needs at least one selector or marker attribute")]
    NoAccelerationTargets,
    /// A selector or attribute entry is blank.
    #[error("blank acceleration target: {0:?}")]
    BlankAccelerationTarget(String),
    /// The fallback sweep selector is blank.
    #[error("fallback scan selector must not be blank")]
    BlankFallbackSelector,
}

/// Tunables for the [`PerformanceMonitor`](crate::monitor::PerformanceMonitor).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MonitorConfig {
    /// How long frames are aggregated before a metrics report. Serialized
    /// as `report_window_ms`.
    #[cfg_attr(
        feature = "serde",
        serde(rename = "report_window_ms", with = "crate::time::serde_millis")
    )]
    pub report_window: Duration,
    /// Number of frame deltas kept for the mean frame time.
    pub ring_capacity: usize,
    /// Minimum fps for a window to count as optimized.
    pub target_fps: u32,
    /// Maximum mean frame time (ms) for a window to count as optimized.
    pub max_frame_time_ms: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            report_window: Duration::from_millis(1000),
            ring_capacity: 60,
            target_fps: 55,
            max_frame_time_ms: 18.0,
        }
    }
}

impl MonitorConfig {
    /// Returns whether a window with these figures counts as optimized.
    #[must_use]
    pub fn is_within_budget(&self, fps: u32, frame_time_ms: f64) -> bool {
        fps >= self.target_fps && frame_time_ms <= self.max_frame_time_ms
    }
}

/// Tunables for the [`AccelerationManager`](crate::acceleration::AccelerationManager).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AccelerationConfig {
    /// CSS selectors whose matches are promoted.
    pub selectors: Vec<String>,
    /// Attribute names whose presence marks an element for promotion.
    pub marker_attributes: Vec<String>,
    /// Delay between an animation ending and its promotion hint being reset.
    /// Serialized as `retraction_delay_ms`.
    #[cfg_attr(
        feature = "serde",
        serde(rename = "retraction_delay_ms", with = "crate::time::serde_millis")
    )]
    pub retraction_delay: Duration,
    /// Value written to the `perspective` property of promoted elements.
    pub perspective: String,
}

impl Default for AccelerationConfig {
    fn default() -> Self {
        Self {
            selectors: DEFAULT_ACCELERATED_SELECTORS
                .iter()
                .map(ToString::to_string)
                .collect(),
            marker_attributes: DEFAULT_MARKER_ATTRIBUTES
                .iter()
                .map(ToString::to_string)
                .collect(),
            retraction_delay: Duration::from_millis(1000),
            perspective: "1000px".to_string(),
        }
    }
}

/// Tunables for the [`FallbackSystem`](crate::fallback::FallbackSystem).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FallbackConfig {
    /// Selector for the elements a sweep inspects.
    pub scan_selector: String,
    /// Extra complex → simple pairs registered on top of the built-in table.
    pub extra: Vec<(String, String)>,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            scan_selector: DEFAULT_FALLBACK_SCAN_SELECTOR.to_string(),
            extra: Vec::new(),
        }
    }
}

/// Configuration for the [`Governor`](crate::governor::Governor).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GovernorConfig {
    /// Frame sampling and metrics thresholds.
    pub monitor: MonitorConfig,
    /// Compositing-hint targets and retraction timing.
    pub acceleration: AccelerationConfig,
    /// Effect substitution sweep.
    pub fallback: FallbackConfig,
    /// Consecutive-ish unoptimized reports before a fallback sweep.
    pub degradation_threshold: u32,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            acceleration: AccelerationConfig::default(),
            fallback: FallbackConfig::default(),
            degradation_threshold: 3,
        }
    }
}

impl GovernorConfig {
    /// Checks that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.monitor.ring_capacity == 0 {
            return Err(ConfigError::ZeroRingCapacity);
        }
        if self.monitor.report_window == Duration::ZERO {
            return Err(ConfigError::ZeroReportWindow);
        }
        let budget = self.monitor.max_frame_time_ms;
        if !budget.is_finite() || budget <= 0.0 {
            return Err(ConfigError::InvalidFrameTimeBudget);
        }
        if self.degradation_threshold == 0 {
            return Err(ConfigError::ZeroDegradationThreshold);
        }
        let accel = &self.acceleration;
        if accel.selectors.is_empty() && accel.marker_attributes.is_empty() {
            return Err(ConfigError::NoAccelerationTargets);
        }
        if let Some(blank) = accel
            .selectors
            .iter()
            .chain(&accel.marker_attributes)
            .find(|s| s.trim().is_empty())
        {
            return Err(ConfigError::BlankAccelerationTarget(blank.clone()));
        }
        if self.fallback.scan_selector.trim().is_empty() {
            return Err(ConfigError::BlankFallbackSelector);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(GovernorConfig::default().validate(), Ok(()));
    }

    #[test]
    fn defaults_match_production_constants() {
        let config = GovernorConfig::default();
        assert_eq!(config.monitor.report_window, Duration::from_millis(1000));
        assert_eq!(config.monitor.ring_capacity, 60);
        assert_eq!(config.monitor.target_fps, 55);
        assert_eq!(config.monitor.max_frame_time_ms, 18.0);
        assert_eq!(config.acceleration.retraction_delay, Duration::from_millis(1000));
        assert_eq!(config.degradation_threshold, 3);
    }

    #[test]
    fn rejects_degenerate_values() {
        let mut config = GovernorConfig::default();
        config.monitor.ring_capacity = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroRingCapacity));

        let mut config = GovernorConfig::default();
        config.monitor.max_frame_time_ms = f64::NAN;
        assert_eq!(config.validate(), Err(ConfigError::InvalidFrameTimeBudget));

        let mut config = GovernorConfig::default();
        config.degradation_threshold = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroDegradationThreshold));

        let mut config = GovernorConfig::default();
        config.acceleration.selectors.clear();
        config.acceleration.marker_attributes.clear();
        assert_eq!(config.validate(), Err(ConfigError::NoAccelerationTargets));

        let mut config = GovernorConfig::default();
        config.acceleration.selectors.push("  ".to_string());
        assert_eq!(
            config.validate(),
            Err(ConfigError::BlankAccelerationTarget("  ".to_string()))
        );

        let mut config = GovernorConfig::default();
        config.fallback.scan_selector = String::new();
        assert_eq!(config.validate(), Err(ConfigError::BlankFallbackSelector));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_json_config_reads_milliseconds() {
        let config: GovernorConfig = serde_json::from_str(
            r#"{"monitor":{"report_window_ms":500},"degradation_threshold":5}"#,
        )
        .unwrap();
        assert_eq!(config.monitor.report_window, Duration::from_millis(500));
        assert_eq!(config.monitor.ring_capacity, 60);
        assert_eq!(config.acceleration.retraction_delay, Duration::from_millis(1000));
        assert_eq!(config.degradation_threshold, 5);
        assert_eq!(config.validate(), Ok(()));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_json_round_trips() {
        let mut config = GovernorConfig::default();
        config.acceleration.retraction_delay = Duration::from_millis(250);
        config.fallback.extra.push(("fancy".to_string(), "plain".to_string()));

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["monitor"]["report_window_ms"], 1000);
        assert_eq!(value["acceleration"]["retraction_delay_ms"], 250);

        let back: GovernorConfig = serde_json::from_value(value).unwrap();
        assert_eq!(back, config);
    }
}
