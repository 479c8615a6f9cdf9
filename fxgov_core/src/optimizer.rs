// Copyright 2026 the fxgov Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tier selection and application.
//!
//! The [`Optimizer`] picks an initial [`OptimizationTier`] from the
//! [`CapabilitySnapshot`], writes it to the document root, and (once
//! feedback is enabled) reacts to metrics reports. The only automatic
//! transition is High → Medium on an unoptimized report; there is no path to
//! Low and no upgrade.

use crate::acceleration::AccelerationManager;
use crate::capability::CapabilitySnapshot;
use crate::host::Host;
use crate::monitor::PerformanceMetrics;
use crate::tier::{OptimizationTier, apply_feature_classes};
use crate::trace::TierChangeReason;

/// Chooses the initial tier.
///
/// Reduced motion wins over everything; otherwise any host outside the
/// high-performance class, or any mobile host, gets Medium.
#[must_use]
pub fn determine_tier(capabilities: &CapabilitySnapshot) -> OptimizationTier {
    if capabilities.prefers_reduced_motion {
        OptimizationTier::Low
    } else if !capabilities.is_high_performance || capabilities.is_mobile {
        OptimizationTier::Medium
    } else {
        OptimizationTier::High
    }
}

/// A tier that was just applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TierChange {
    /// Previously applied tier, if any.
    pub from: Option<OptimizationTier>,
    /// Tier now in effect.
    pub to: OptimizationTier,
    /// What caused the change.
    pub reason: TierChangeReason,
}

/// Owns the current tier.
#[derive(Clone, Debug)]
pub struct Optimizer {
    capabilities: CapabilitySnapshot,
    tier: OptimizationTier,
    applied: bool,
    feedback: bool,
}

impl Optimizer {
    /// Creates an optimizer whose tier is chosen from `capabilities`.
    #[must_use]
    pub fn new(capabilities: CapabilitySnapshot) -> Self {
        Self {
            tier: determine_tier(&capabilities),
            capabilities,
            applied: false,
            feedback: false,
        }
    }

    /// The tier currently in effect.
    #[must_use]
    pub fn tier(&self) -> OptimizationTier {
        self.tier
    }

    /// The snapshot the tier was chosen from.
    #[must_use]
    pub fn capabilities(&self) -> &CapabilitySnapshot {
        &self.capabilities
    }

    /// Writes the current tier and the feature classes to the root. Unless
    /// the tier is Low, also initializes the acceleration manager.
    pub fn apply_optimizations<H: Host>(
        &mut self,
        host: &mut H,
        acceleration: &mut AccelerationManager<H::Element>,
    ) -> TierChange {
        let from = self.applied.then_some(self.tier);
        self.tier.apply(host);
        apply_feature_classes(host, &self.capabilities);
        self.applied = true;
        log::info!("applied {} optimization tier", self.tier);

        if self.tier != OptimizationTier::Low {
            let promoted = acceleration.init(host);
            log::debug!("promoted {promoted} elements for hardware acceleration");
        }
        TierChange {
            from,
            to: self.tier,
            reason: TierChangeReason::Initial,
        }
    }

    /// Enables the metrics feedback path. Idempotent.
    pub fn start_monitoring(&mut self) {
        self.feedback = true;
    }

    /// Disables the metrics feedback path. Idempotent.
    pub fn stop_monitoring(&mut self) {
        self.feedback = false;
    }

    /// Returns `true` while feedback is enabled.
    #[must_use]
    pub fn is_monitoring(&self) -> bool {
        self.feedback
    }

    /// Reacts to a metrics report.
    ///
    /// An unoptimized report at the high tier downgrades to Medium and
    /// reapplies the root styles. Every other report is ignored.
    pub fn observe<H: Host>(&mut self, host: &mut H, metrics: &PerformanceMetrics) -> Option<TierChange> {
        if !self.feedback || metrics.is_optimized || self.tier != OptimizationTier::High {
            return None;
        }
        log::warn!(
            "performance degraded ({} fps, {:.1} ms per frame), reducing to medium tier",
            metrics.fps,
            metrics.frame_time_ms
        );
        let from = self.tier;
        self.tier = OptimizationTier::Medium;
        self.tier.apply(host);
        Some(TierChange {
            from: Some(from),
            to: self.tier,
            reason: TierChangeReason::Degraded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::HostProbe;
    use crate::config::AccelerationConfig;
    use crate::memory::{ElementId, MemoryHost};
    use crate::tier::{CLASS_HIGH_PERFORMANCE, CLASS_NO_WEBGL};
    use crate::time::HostTime;
    use alloc::string::ToString;

    fn snapshot(cores: u32, memory_mb: f64, mobile: bool, reduced_motion: bool) -> CapabilitySnapshot {
        CapabilitySnapshot::from_probe(&HostProbe {
            webgl: true,
            backdrop_filter: true,
            transform_3d: true,
            hardware_concurrency: Some(cores),
            memory_limit_mb: Some(memory_mb),
            prefers_reduced_motion: reduced_motion,
            user_agent: Some(if mobile { "Android 14" } else { "X11; Linux" }.to_string()),
            viewport_width: Some(1280.0),
        })
    }

    fn report(is_optimized: bool) -> PerformanceMetrics {
        PerformanceMetrics {
            fps: if is_optimized { 60 } else { 30 },
            frame_time_ms: if is_optimized { 16.7 } else { 33.3 },
            memory_usage_mb: None,
            animation_count: 0,
            is_optimized,
            timestamp: HostTime(1_000_000),
        }
    }

    fn accel() -> AccelerationManager<ElementId> {
        AccelerationManager::new(AccelerationConfig::default())
    }

    #[test]
    fn tier_selection() {
        assert_eq!(determine_tier(&snapshot(8, 2000.0, false, false)), OptimizationTier::High);
        assert_eq!(determine_tier(&snapshot(8, 2000.0, true, false)), OptimizationTier::Medium);
        assert_eq!(determine_tier(&snapshot(2, 2000.0, false, false)), OptimizationTier::Medium);
        assert_eq!(determine_tier(&snapshot(8, 512.0, false, false)), OptimizationTier::Medium);
        // Reduced motion wins regardless of hardware.
        assert_eq!(determine_tier(&snapshot(16, 8000.0, false, true)), OptimizationTier::Low);
        assert_eq!(determine_tier(&snapshot(1, 0.0, true, true)), OptimizationTier::Low);
    }

    #[test]
    fn apply_writes_root_and_initializes_acceleration() {
        let mut host = MemoryHost::new();
        let card = host.append(None, "glass-card");
        let mut caps = snapshot(8, 2000.0, false, false);
        caps.webgl = false;
        let mut optimizer = Optimizer::new(caps);
        let mut accel = accel();

        let change = optimizer.apply_optimizations(&mut host, &mut accel);
        assert_eq!(
            change,
            TierChange {
                from: None,
                to: OptimizationTier::High,
                reason: TierChangeReason::Initial,
            }
        );
        assert!(host.has_root_class(CLASS_HIGH_PERFORMANCE));
        assert!(host.has_root_class(CLASS_NO_WEBGL));
        assert!(accel.is_accelerated(&card));
    }

    #[test]
    fn low_tier_skips_acceleration() {
        let mut host = MemoryHost::new();
        host.append(None, "glass-card");
        let mut optimizer = Optimizer::new(snapshot(8, 2000.0, false, true));
        let mut accel = accel();

        optimizer.apply_optimizations(&mut host, &mut accel);
        assert_eq!(optimizer.tier(), OptimizationTier::Low);
        assert!(!accel.is_initialized());
        assert_eq!(accel.accelerated_count(), 0);
    }

    #[test]
    fn unoptimized_report_downgrades_high_once() {
        let mut host = MemoryHost::new();
        let mut optimizer = Optimizer::new(snapshot(8, 2000.0, false, false));
        optimizer.apply_optimizations(&mut host, &mut accel());

        // Feedback is off until monitoring starts.
        assert_eq!(optimizer.observe(&mut host, &report(false)), None);
        optimizer.start_monitoring();
        assert_eq!(optimizer.observe(&mut host, &report(true)), None);

        let change = optimizer.observe(&mut host, &report(false));
        assert_eq!(
            change,
            Some(TierChange {
                from: Some(OptimizationTier::High),
                to: OptimizationTier::Medium,
                reason: TierChangeReason::Degraded,
            })
        );
        assert!(!host.has_root_class(CLASS_HIGH_PERFORMANCE));
        assert_eq!(host.root_token("--duration-fast"), Some("150ms"));

        // Medium never drops further and never climbs back.
        assert_eq!(optimizer.observe(&mut host, &report(false)), None);
        assert_eq!(optimizer.observe(&mut host, &report(true)), None);
        assert_eq!(optimizer.tier(), OptimizationTier::Medium);
    }

    #[test]
    fn reapplying_reports_previous_tier() {
        let mut host = MemoryHost::new();
        let mut optimizer = Optimizer::new(snapshot(2, 512.0, false, false));
        let mut accel = accel();
        optimizer.apply_optimizations(&mut host, &mut accel);
        let change = optimizer.apply_optimizations(&mut host, &mut accel);
        assert_eq!(change.from, Some(OptimizationTier::Medium));
    }
}
