// Copyright 2026 the fxgov Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host capability detection.
//!
//! A [`HostProbe`] carries the raw answers a host gives to its feature
//! queries. [`CapabilitySnapshot::from_probe`] classifies them once into the
//! immutable snapshot the optimizer and governor decide on.
//!
//! The snapshot is never re-probed, so a viewport resize or a change of the
//! reduced-motion preference during the session is not picked up.

use alloc::string::String;

/// Concurrency assumed when the host does not report it.
pub const DEFAULT_HARDWARE_CONCURRENCY: u32 = 1;

/// Minimum logical cores for the high-performance class.
pub const HIGH_PERFORMANCE_MIN_CORES: u32 = 4;

/// Heap ceiling (MB) that must be exceeded for the high-performance class.
pub const HIGH_PERFORMANCE_MIN_MEMORY_MB: f64 = 1000.0;

/// Viewports narrower than this (CSS px) count as mobile.
pub const MOBILE_VIEWPORT_MAX_WIDTH: f64 = 768.0;

const MOBILE_UA_TOKENS: &[&str] = &[
    "android",
    "webos",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
];

/// Raw feature-query answers from a [`Host`](crate::host::Host).
///
/// `None` means the host could not answer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HostProbe {
    /// A WebGL (or equivalent) graphics context could be created.
    pub webgl: bool,
    /// `backdrop-filter: blur(..)` is supported.
    pub backdrop_filter: bool,
    /// 3D transforms are supported.
    pub transform_3d: bool,
    /// Logical core count.
    pub hardware_concurrency: Option<u32>,
    /// Heap size ceiling in megabytes.
    pub memory_limit_mb: Option<f64>,
    /// The user asked for reduced motion.
    pub prefers_reduced_motion: bool,
    /// User-agent string.
    pub user_agent: Option<String>,
    /// Viewport width in CSS pixels.
    pub viewport_width: Option<f64>,
}

/// Immutable classification of the host, computed once.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CapabilitySnapshot {
    /// Graphics acceleration is available.
    pub webgl: bool,
    /// Compositing blur (`backdrop-filter`) is available.
    pub backdrop_filter: bool,
    /// 3D transforms are available.
    pub transform_3d: bool,
    /// At least four cores and more than 1000 MB of heap ceiling.
    pub is_high_performance: bool,
    /// Coarse mobile device class.
    pub is_mobile: bool,
    /// The user prefers reduced motion.
    pub prefers_reduced_motion: bool,
    /// Logical core count (defaulted when unknown).
    pub hardware_concurrency: u32,
    /// Heap ceiling in megabytes (zero when unknown).
    pub memory_limit_mb: f64,
}

impl CapabilitySnapshot {
    /// Classifies a host probe.
    #[must_use]
    pub fn from_probe(probe: &HostProbe) -> Self {
        let hardware_concurrency = probe
            .hardware_concurrency
            .unwrap_or(DEFAULT_HARDWARE_CONCURRENCY);
        let memory_limit_mb = probe
            .memory_limit_mb
            .filter(|mb| mb.is_finite() && *mb >= 0.0)
            .unwrap_or(0.0);

        Self {
            webgl: probe.webgl,
            backdrop_filter: probe.backdrop_filter,
            transform_3d: probe.transform_3d,
            is_high_performance: hardware_concurrency >= HIGH_PERFORMANCE_MIN_CORES
                && memory_limit_mb > HIGH_PERFORMANCE_MIN_MEMORY_MB,
            is_mobile: is_mobile(probe.user_agent.as_deref(), probe.viewport_width),
            prefers_reduced_motion: probe.prefers_reduced_motion,
            hardware_concurrency,
            memory_limit_mb,
        }
    }

    /// Returns `true` for hosts outside the high-performance class.
    #[must_use]
    pub const fn is_low_end(&self) -> bool {
        !self.is_high_performance
    }
}

/// Coarse mobile classification from the user agent and viewport width.
#[must_use]
pub fn is_mobile(user_agent: Option<&str>, viewport_width: Option<f64>) -> bool {
    let ua_match = user_agent.is_some_and(|ua| {
        let ua = ua.to_ascii_lowercase();
        MOBILE_UA_TOKENS.iter().any(|token| ua.contains(token))
    });
    let narrow = viewport_width.is_some_and(|w| w > 0.0 && w < MOBILE_VIEWPORT_MAX_WIDTH);
    ua_match || narrow
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    fn desktop_probe(cores: u32, memory_mb: f64) -> HostProbe {
        HostProbe {
            webgl: true,
            backdrop_filter: true,
            transform_3d: true,
            hardware_concurrency: Some(cores),
            memory_limit_mb: Some(memory_mb),
            prefers_reduced_motion: false,
            user_agent: Some("Mozilla/5.0 (X11; Linux x86_64) Firefox/130.0".to_string()),
            viewport_width: Some(1440.0),
        }
    }

    #[test]
    fn high_performance_needs_cores_and_memory() {
        assert!(CapabilitySnapshot::from_probe(&desktop_probe(8, 2000.0)).is_high_performance);
        assert!(CapabilitySnapshot::from_probe(&desktop_probe(4, 1000.5)).is_high_performance);
        // The memory bound is strict.
        assert!(!CapabilitySnapshot::from_probe(&desktop_probe(8, 1000.0)).is_high_performance);
        assert!(!CapabilitySnapshot::from_probe(&desktop_probe(2, 4000.0)).is_high_performance);
    }

    #[test]
    fn missing_answers_degrade_to_conservative_values() {
        let snapshot = CapabilitySnapshot::from_probe(&HostProbe::default());
        assert_eq!(snapshot.hardware_concurrency, DEFAULT_HARDWARE_CONCURRENCY);
        assert_eq!(snapshot.memory_limit_mb, 0.0);
        assert!(!snapshot.is_high_performance);
        assert!(snapshot.is_low_end());
        assert!(!snapshot.is_mobile);
        assert!(!snapshot.webgl);
    }

    #[test]
    fn mobile_from_user_agent_or_viewport() {
        let iphone = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)";
        assert!(is_mobile(Some(iphone), Some(1024.0)));
        assert!(is_mobile(Some("Opera Mini/8.0"), None));
        assert!(is_mobile(None, Some(390.0)));
        assert!(!is_mobile(Some("Mozilla/5.0 (Windows NT 10.0)"), Some(1920.0)));
        assert!(!is_mobile(None, Some(0.0)));
    }
}
