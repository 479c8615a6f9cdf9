// Copyright 2026 the fxgov Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Top-level orchestration.
//!
//! A [`Governor`] owns its [`Host`] and every component. The embedding
//! application creates it once, calls [`init`](Governor::init), and feeds it
//! the callbacks the host arranged via [`handle_event`](Governor::handle_event).
//!
//! ```text
//!   HostEvent::Frame ──► PerformanceMonitor ──► PerformanceMetrics
//!                                                   │
//!                    ┌──────────────────────────────┼──────────────────────┐
//!                    ▼                              ▼                      ▼
//!           Optimizer::observe         DegradationWatcher        TraceSink::on_metrics
//!           (High → Medium)            (3 strikes → sweep)
//!
//!   HostEvent::Inserted / Removed / AnimationEnded / Timeout ──► AccelerationManager
//! ```
//!
//! After [`destroy`](Governor::destroy) every event is ignored until the next
//! `init`.

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

use crate::acceleration::AccelerationManager;
use crate::capability::CapabilitySnapshot;
use crate::config::{ConfigError, GovernorConfig};
use crate::fallback::FallbackSystem;
use crate::host::{Host, HostEvent};
use crate::monitor::{PerformanceMetrics, PerformanceMonitor};
use crate::optimizer::{Optimizer, TierChange};
use crate::tier::OptimizationTier;
use crate::trace::{
    AccelerationEvent, AccelerationKind, FallbackSweepEvent, LifecycleEvent, LifecyclePhase,
    MetricsEvent, SweepTrigger, TierChangeEvent, TraceSink, Tracer, count_u32,
};

/// Read-only projection of the governor's state.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GovernorMetrics {
    /// The capability snapshot taken at construction.
    pub capabilities: CapabilitySnapshot,
    /// The tier currently in effect.
    pub tier: OptimizationTier,
    /// Frames per second from the latest report.
    pub fps: Option<u32>,
    /// Mean frame time from the latest report.
    pub frame_time_ms: Option<f64>,
}

/// Slow hysteresis counter guarding fallback sweeps.
///
/// Each unoptimized report adds a strike; each optimized report removes one
/// (never below zero). Reaching the threshold requests a sweep and resets
/// the count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DegradationWatcher {
    threshold: u32,
    strikes: u32,
}

impl DegradationWatcher {
    /// Creates a watcher that fires after `threshold` net strikes.
    #[must_use]
    pub const fn new(threshold: u32) -> Self {
        Self {
            threshold,
            strikes: 0,
        }
    }

    /// Feeds one report. Returns `true` when a sweep is due.
    pub fn observe(&mut self, is_optimized: bool) -> bool {
        if is_optimized {
            self.strikes = self.strikes.saturating_sub(1);
            return false;
        }
        self.strikes = self.strikes.saturating_add(1);
        if self.strikes >= self.threshold {
            self.strikes = 0;
            return true;
        }
        false
    }

    /// Current strike count.
    #[must_use]
    pub const fn strikes(&self) -> u32 {
        self.strikes
    }

    /// Clears all strikes.
    pub fn reset(&mut self) {
        self.strikes = 0;
    }
}

/// The adaptive rendering-performance governor.
pub struct Governor<H: Host> {
    host: H,
    monitor: PerformanceMonitor,
    acceleration: AccelerationManager<H::Element>,
    fallbacks: FallbackSystem,
    optimizer: Optimizer,
    watcher: DegradationWatcher,
    initialized: bool,
    sink: Option<Box<dyn TraceSink>>,
}

impl<H: Host + fmt::Debug> fmt::Debug for Governor<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Governor")
            .field("host", &self.host)
            .field("tier", &self.optimizer.tier())
            .field("initialized", &self.initialized)
            .field("monitor", &self.monitor)
            .field("accelerated", &self.acceleration.accelerated_count())
            .field("watcher", &self.watcher)
            .field("traced", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

fn tracer(sink: &mut Option<Box<dyn TraceSink>>) -> Tracer<'_> {
    match sink {
        Some(s) => Tracer::new(s.as_mut()),
        None => Tracer::none(),
    }
}

impl<H: Host> Governor<H> {
    /// Probes the host and builds every component. Nothing is written to the
    /// document until [`init`](Self::init).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `config` fails validation.
    pub fn new(host: H, config: GovernorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let capabilities = CapabilitySnapshot::from_probe(&host.probe());
        log::debug!("capabilities: {capabilities:?}");
        Ok(Self {
            host,
            monitor: PerformanceMonitor::new(config.monitor),
            acceleration: AccelerationManager::new(config.acceleration),
            fallbacks: FallbackSystem::new(&config.fallback),
            optimizer: Optimizer::new(capabilities),
            watcher: DegradationWatcher::new(config.degradation_threshold),
            initialized: false,
            sink: None,
        })
    }

    /// Applies optimizations and starts monitoring. No-op if already
    /// initialized.
    ///
    /// Hosts outside the high-performance class, and users preferring
    /// reduced motion, also get an immediate fallback sweep.
    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        let now = self.host.now();

        let change = self
            .optimizer
            .apply_optimizations(&mut self.host, &mut self.acceleration);
        self.trace_tier_change(change);
        if self.acceleration.accelerated_count() > 0 {
            self.trace_acceleration(AccelerationKind::Promoted);
        }

        self.optimizer.start_monitoring();
        self.monitor.start(&mut self.host);

        let capabilities = *self.optimizer.capabilities();
        if capabilities.is_low_end() || capabilities.prefers_reduced_motion {
            self.sweep(SweepTrigger::Startup);
        }

        tracer(&mut self.sink).lifecycle(&LifecycleEvent {
            timestamp: now,
            phase: LifecyclePhase::Init,
        });
        log::debug!("governor initialized at {} tier", self.optimizer.tier());
    }

    /// Returns `true` between [`init`](Self::init) and
    /// [`destroy`](Self::destroy).
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Delivers a host callback. Ignored while not initialized.
    pub fn handle_event(&mut self, event: HostEvent<H::Element>) {
        if !self.initialized {
            return;
        }
        match event {
            HostEvent::Frame(now) => {
                if let Some(metrics) = self.monitor.on_frame(&mut self.host, now) {
                    self.on_metrics(&metrics);
                }
            }
            HostEvent::Inserted(roots) => {
                if self.acceleration.on_insertions(&mut self.host, &roots) > 0 {
                    self.trace_acceleration(AccelerationKind::Promoted);
                }
            }
            HostEvent::Removed(_) => {
                if self.acceleration.on_removals(&mut self.host) > 0 {
                    self.trace_acceleration(AccelerationKind::Pruned);
                }
            }
            HostEvent::AnimationEnded(element) => {
                self.acceleration.on_animation_ended(&mut self.host, &element);
            }
            HostEvent::Timeout(timer) => {
                if self.acceleration.on_timeout(&mut self.host, timer) {
                    self.trace_acceleration(AccelerationKind::Retracted);
                }
            }
        }
    }

    fn on_metrics(&mut self, metrics: &PerformanceMetrics) {
        tracer(&mut self.sink).metrics(&MetricsEvent {
            timestamp: metrics.timestamp,
            fps: metrics.fps,
            frame_time_ms: metrics.frame_time_ms,
            is_optimized: metrics.is_optimized,
            animation_count: count_u32(metrics.animation_count),
        });

        if let Some(change) = self.optimizer.observe(&mut self.host, metrics) {
            self.trace_tier_change(change);
        }

        if self.watcher.observe(metrics.is_optimized) {
            log::warn!("sustained performance degradation, applying effect fallbacks");
            self.sweep(SweepTrigger::SustainedDegradation);
        }
    }

    fn sweep(&mut self, trigger: SweepTrigger) -> usize {
        let substitutions = self.fallbacks.apply_to_document(&mut self.host);
        let timestamp = self.host.now();
        tracer(&mut self.sink).fallback_sweep(&FallbackSweepEvent {
            timestamp,
            trigger,
            substitutions: count_u32(substitutions),
        });
        substitutions
    }

    fn trace_tier_change(&mut self, change: TierChange) {
        let timestamp = self.host.now();
        tracer(&mut self.sink).tier_change(&TierChangeEvent {
            timestamp,
            from: change.from,
            to: change.to,
            reason: change.reason,
        });
    }

    fn trace_acceleration(&mut self, kind: AccelerationKind) {
        let timestamp = self.host.now();
        let registry_len = count_u32(self.acceleration.accelerated_count());
        tracer(&mut self.sink).acceleration(&AccelerationEvent {
            timestamp,
            kind,
            registry_len,
        });
    }

    /// Stops monitoring, tears down acceleration, disables feedback and
    /// resets the watcher. `init` may be called again afterwards.
    pub fn destroy(&mut self) {
        if !self.initialized {
            return;
        }
        self.monitor.stop(&mut self.host);
        let released = self.acceleration.destroy(&mut self.host);
        self.optimizer.stop_monitoring();
        self.watcher.reset();
        self.initialized = false;

        let timestamp = self.host.now();
        let mut trace = tracer(&mut self.sink);
        trace.acceleration(&AccelerationEvent {
            timestamp,
            kind: AccelerationKind::Released,
            registry_len: 0,
        });
        trace.lifecycle(&LifecycleEvent {
            timestamp,
            phase: LifecyclePhase::Destroy,
        });
        log::debug!("governor destroyed, released {released} accelerated elements");
    }

    /// Current state projection. `fps` and `frame_time_ms` are `None` until
    /// the first report.
    #[must_use]
    pub fn metrics(&self) -> GovernorMetrics {
        let latest = self.monitor.latest();
        GovernorMetrics {
            capabilities: *self.optimizer.capabilities(),
            tier: self.optimizer.tier(),
            fps: latest.map(|m| m.fps),
            frame_time_ms: latest.map(|m| m.frame_time_ms),
        }
    }

    /// The most recent full metrics report.
    #[must_use]
    pub fn latest_metrics(&self) -> Option<&PerformanceMetrics> {
        self.monitor.latest()
    }

    /// Registers a subscriber for every future metrics report.
    pub fn on_metrics_update(&mut self, callback: impl FnMut(&PerformanceMetrics) + 'static) {
        self.monitor.on_metrics_update(callback);
    }

    /// Adds an active-animation token.
    pub fn track_animation(&mut self, id: impl Into<String>) {
        self.monitor.track_animation(id);
    }

    /// Removes an active-animation token.
    pub fn untrack_animation(&mut self, id: &str) {
        self.monitor.untrack_animation(id);
    }

    /// Registers (or replaces) an effect fallback.
    pub fn add_fallback(&mut self, complex: impl Into<String>, simple: impl Into<String>) {
        self.fallbacks.add_fallback(complex, simple);
    }

    /// Runs a fallback sweep now. Returns the number of substitutions.
    pub fn apply_fallbacks(&mut self) -> usize {
        self.sweep(SweepTrigger::Manual)
    }

    /// Installs a trace sink, returning the previous one.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) -> Option<Box<dyn TraceSink>> {
        self.sink.replace(sink)
    }

    /// The tier currently in effect.
    #[must_use]
    pub fn tier(&self) -> OptimizationTier {
        self.optimizer.tier()
    }

    /// The capability snapshot taken at construction.
    #[must_use]
    pub fn capabilities(&self) -> &CapabilitySnapshot {
        self.optimizer.capabilities()
    }

    /// The acceleration manager.
    #[must_use]
    pub fn acceleration(&self) -> &AccelerationManager<H::Element> {
        &self.acceleration
    }

    /// The degradation watcher.
    #[must_use]
    pub fn watcher(&self) -> &DegradationWatcher {
        &self.watcher
    }

    /// The host.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The host, mutably.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

impl<H: Host> Drop for Governor<H> {
    fn drop(&mut self) {
        self.destroy();
    }
}
