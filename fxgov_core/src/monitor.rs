// Copyright 2026 the fxgov Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-clock sampling and periodic performance metrics.
//!
//! The [`PerformanceMonitor`] is driven by the host frame clock. Each tick
//! records the delta since the previous tick into a bounded [`FrameRing`] and
//! counts the frame. Once a full reporting window has elapsed it produces a
//! [`PerformanceMetrics`] snapshot, hands it to every subscriber, and starts
//! a new window.
//!
//! ```text
//!   start() ──► request_frame ──► on_frame(now) ──► request_frame ──► ...
//!                                     │
//!                        elapsed ≥ window?
//!                                     │
//!                                     ▼
//!                  PerformanceMetrics ──► subscribers
//! ```
//!
//! Subscribers live as long as the monitor; there is no way to unsubscribe.

use alloc::boxed::Box;
use alloc::collections::{BTreeSet, VecDeque};
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::config::MonitorConfig;
use crate::host::{FrameRequest, Host};
use crate::time::{Duration, HostTime};

/// One metrics report, superseded by the next.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PerformanceMetrics {
    /// Frames per second over the last window, rounded.
    pub fps: u32,
    /// Mean of the recorded frame deltas, in milliseconds.
    pub frame_time_ms: f64,
    /// Heap usage in megabytes, if the host reports it.
    pub memory_usage_mb: Option<f64>,
    /// Number of tracked active animations.
    pub animation_count: usize,
    /// `fps` and `frame_time_ms` are both within budget.
    pub is_optimized: bool,
    /// Host time at which the window closed.
    pub timestamp: HostTime,
}

/// Fixed-capacity FIFO of frame deltas.
///
/// Pushing beyond capacity evicts the oldest sample, so `len()` never
/// exceeds the capacity given to [`new`](Self::new).
#[derive(Clone, Debug)]
pub struct FrameRing {
    samples: VecDeque<Duration>,
    capacity: usize,
}

impl FrameRing {
    /// Creates an empty ring. A zero capacity is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a sample, evicting the oldest when full.
    pub fn push(&mut self, delta: Duration) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(delta);
    }

    /// Number of samples held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if no samples are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples oldest → newest.
    pub fn iter(&self) -> impl Iterator<Item = Duration> + '_ {
        self.samples.iter().copied()
    }

    /// Mean sample in milliseconds, or zero when empty.
    #[must_use]
    pub fn mean_ms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let total: u64 = self.samples.iter().map(|d| d.ticks()).sum();
        total as f64 / self.samples.len() as f64 / 1000.0
    }

    /// Drops all samples.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Rounds `frames * 1000 / elapsed_ms` to the nearest integer (halves up).
fn frames_per_second(frames: u32, elapsed: Duration) -> u32 {
    let elapsed_us = u128::from(elapsed.ticks().max(1));
    let scaled = u128::from(frames) * 1_000_000;
    let rounded = (2 * scaled + elapsed_us) / (2 * elapsed_us);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

/// A metrics subscriber.
pub type MetricsCallback = Box<dyn FnMut(&PerformanceMetrics)>;

/// Samples the frame clock and emits a [`PerformanceMetrics`] per window.
pub struct PerformanceMonitor {
    config: MonitorConfig,
    monitoring: bool,
    pending: Option<FrameRequest>,
    last_frame: HostTime,
    last_report: HostTime,
    frame_count: u32,
    ring: FrameRing,
    active_animations: BTreeSet<String>,
    subscribers: Vec<MetricsCallback>,
    latest: Option<PerformanceMetrics>,
}

impl fmt::Debug for PerformanceMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerformanceMonitor")
            .field("monitoring", &self.monitoring)
            .field("pending", &self.pending)
            .field("frame_count", &self.frame_count)
            .field("ring_len", &self.ring.len())
            .field("active_animations", &self.active_animations.len())
            .field("subscribers", &self.subscribers.len())
            .field("latest", &self.latest)
            .finish_non_exhaustive()
    }
}

impl PerformanceMonitor {
    /// Creates a stopped monitor.
    #[must_use]
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            ring: FrameRing::new(config.ring_capacity),
            config,
            monitoring: false,
            pending: None,
            last_frame: HostTime::default(),
            last_report: HostTime::default(),
            frame_count: 0,
            active_animations: BTreeSet::new(),
            subscribers: Vec::new(),
            latest: None,
        }
    }

    /// Starts sampling. No-op if already running.
    ///
    /// The current host time becomes both the previous-frame time and the
    /// start of the first reporting window.
    pub fn start<H: Host>(&mut self, host: &mut H) {
        if self.monitoring {
            return;
        }
        self.monitoring = true;
        let now = host.now();
        self.last_frame = now;
        self.last_report = now;
        self.frame_count = 0;
        self.ring.clear();
        self.pending = Some(host.request_frame());
    }

    /// Stops sampling and cancels the outstanding frame request. No-op if
    /// not running.
    pub fn stop<H: Host>(&mut self, host: &mut H) {
        if !self.monitoring {
            return;
        }
        self.monitoring = false;
        if let Some(request) = self.pending.take() {
            host.cancel_frame(request);
        }
    }

    /// Returns `true` while sampling.
    #[must_use]
    pub fn is_monitoring(&self) -> bool {
        self.monitoring
    }

    /// Handles one frame-clock tick.
    ///
    /// Returns the metrics emitted by this tick, if it closed a window.
    /// Ticks that arrive after [`stop`](Self::stop) are ignored.
    pub fn on_frame<H: Host>(&mut self, host: &mut H, now: HostTime) -> Option<PerformanceMetrics> {
        if !self.monitoring {
            return None;
        }
        self.pending = None;

        self.ring.push(now.saturating_duration_since(self.last_frame));
        self.frame_count = self.frame_count.saturating_add(1);
        self.last_frame = now;

        let elapsed = now.saturating_duration_since(self.last_report);
        let emitted = if elapsed >= self.config.report_window {
            let metrics = self.measure(host, now, elapsed);
            for subscriber in &mut self.subscribers {
                subscriber(&metrics);
            }
            self.latest = Some(metrics);
            self.frame_count = 0;
            self.last_report = now;
            Some(metrics)
        } else {
            None
        };

        if self.monitoring {
            self.pending = Some(host.request_frame());
        }
        emitted
    }

    fn measure<H: Host>(&self, host: &H, now: HostTime, elapsed: Duration) -> PerformanceMetrics {
        let fps = frames_per_second(self.frame_count, elapsed);
        let frame_time_ms = self.ring.mean_ms();
        PerformanceMetrics {
            fps,
            frame_time_ms,
            memory_usage_mb: host.heap_used_mb(),
            animation_count: self.active_animations.len(),
            is_optimized: self.config.is_within_budget(fps, frame_time_ms),
            timestamp: now,
        }
    }

    /// Registers a subscriber for every future metrics report.
    pub fn on_metrics_update(&mut self, callback: impl FnMut(&PerformanceMetrics) + 'static) {
        self.subscribers.push(Box::new(callback));
    }

    /// Adds an active-animation token. Only affects `animation_count`.
    pub fn track_animation(&mut self, id: impl Into<String>) {
        self.active_animations.insert(id.into());
    }

    /// Removes an active-animation token.
    pub fn untrack_animation(&mut self, id: &str) {
        self.active_animations.remove(id);
    }

    /// Number of tracked active animations.
    #[must_use]
    pub fn animation_count(&self) -> usize {
        self.active_animations.len()
    }

    /// The most recent report, if a window has closed since construction.
    #[must_use]
    pub fn latest(&self) -> Option<&PerformanceMetrics> {
        self.latest.as_ref()
    }

    /// The frame-time ring.
    #[must_use]
    pub fn ring(&self) -> &FrameRing {
        &self.ring
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryHost;
    use alloc::rc::Rc;
    use core::cell::RefCell;

    /// Starts a monitor at t=0 and feeds ticks at the given millisecond deltas.
    fn run(deltas_ms: &[u64]) -> (PerformanceMonitor, MemoryHost, Vec<PerformanceMetrics>) {
        let mut host = MemoryHost::new();
        let mut monitor = PerformanceMonitor::new(MonitorConfig::default());
        monitor.start(&mut host);
        let mut out = Vec::new();
        let mut now = host.now();
        for &delta in deltas_ms {
            now = now + Duration::from_millis(delta);
            host.set_now(now);
            if let Some(m) = monitor.on_frame(&mut host, now) {
                out.push(m);
            }
        }
        (monitor, host, out)
    }

    #[test]
    fn ring_evicts_oldest_beyond_capacity() {
        let mut ring = FrameRing::new(60);
        for i in 0..100_u64 {
            ring.push(Duration(i));
            assert!(ring.len() <= 60);
        }
        assert_eq!(ring.len(), 60);
        let kept: Vec<u64> = ring.iter().map(Duration::ticks).collect();
        let expected: Vec<u64> = (40..100).collect();
        assert_eq!(kept, expected);
    }

    #[test]
    fn fps_rounds_to_nearest() {
        assert_eq!(frames_per_second(60, Duration::from_millis(1000)), 60);
        // 59 * 1000 / 1010 = 58.41…
        assert_eq!(frames_per_second(59, Duration::from_millis(1010)), 58);
        // 61 * 1000 / 1016 = 60.03…
        assert_eq!(frames_per_second(61, Duration::from_millis(1016)), 60);
        // 11 * 1000 / 1100 = 10.0 exactly.
        assert_eq!(frames_per_second(11, Duration::from_millis(1100)), 10);
        // 1 * 1000 / 400 = 2.5 rounds up.
        assert_eq!(frames_per_second(1, Duration::from_millis(400)), 3);
    }

    #[test]
    fn no_metrics_before_first_full_window() {
        let (_, _, reports) = run(&[16; 62]);
        // 62 * 16 = 992 ms < 1000 ms.
        assert!(reports.is_empty());
    }

    #[test]
    fn reports_fps_and_mean_frame_time() {
        // 50 frames of 20 ms = exactly 1000 ms.
        let (monitor, _, reports) = run(&[20; 50]);
        assert_eq!(reports.len(), 1);
        let m = reports[0];
        assert_eq!(m.fps, 50);
        assert!((m.frame_time_ms - 20.0).abs() < 1e-9);
        assert!(!m.is_optimized);
        assert_eq!(m.memory_usage_mb, None);
        assert_eq!(monitor.latest(), Some(&m));
    }

    #[test]
    fn reports_heap_usage_when_host_supports_it() {
        let mut host = MemoryHost::new();
        host.set_heap_used_mb(Some(48.5));
        let mut monitor = PerformanceMonitor::new(MonitorConfig::default());
        monitor.start(&mut host);

        let mut now = host.now();
        let mut reports = Vec::new();
        for _ in 0..50 {
            now = now + Duration::from_millis(20);
            reports.extend(monitor.on_frame(&mut host, now));
        }
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].memory_usage_mb, Some(48.5));

        host.set_heap_used_mb(None);
        for _ in 0..50 {
            now = now + Duration::from_millis(20);
            reports.extend(monitor.on_frame(&mut host, now));
        }
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[1].memory_usage_mb, None);
    }

    #[test]
    fn frame_time_uses_last_sixty_deltas() {
        // 100 frames of 10 ms close the window at exactly 1000 ms.
        let (monitor, _, reports) = run(&[10; 100]);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].fps, 100);
        assert_eq!(monitor.ring().len(), 60);

        // Mixed deltas: only the newest 60 count toward the mean.
        let mut deltas = alloc::vec![40_u64; 10];
        deltas.extend([10_u64; 60]);
        let (_, _, reports) = run(&deltas);
        assert_eq!(reports.len(), 1);
        assert!((reports[0].frame_time_ms - 10.0).abs() < 1e-9);
        // 70 frames over 1000 ms.
        assert_eq!(reports[0].fps, 70);
    }

    #[test]
    fn budget_boundaries() {
        let config = MonitorConfig::default();
        assert!(config.is_within_budget(55, 18.0));
        assert!(config.is_within_budget(60, 16.7));
        assert!(!config.is_within_budget(54, 10.0));
        assert!(!config.is_within_budget(60, 18.01));
    }

    #[test]
    fn optimized_flag_follows_window() {
        // 55 frames: 54 of 18 ms and a final one that closes the window at
        // 1000 ms. Mean = 1000 / 55 = 18.18… > 18, so not optimized.
        let mut deltas = alloc::vec![18_u64; 54];
        deltas.push(28);
        let (_, _, reports) = run(&deltas);
        assert_eq!(reports[0].fps, 55);
        assert!(!reports[0].is_optimized);

        // 60 frames of 16 ms plus 40 ms: fps 61 (1000/1000), mean over ring.
        let mut deltas = alloc::vec![16_u64; 60];
        deltas.push(40);
        let (_, _, reports) = run(&deltas);
        assert_eq!(reports[0].fps, 61);
        assert!(reports[0].frame_time_ms <= 18.0);
        assert!(reports[0].is_optimized);
    }

    #[test]
    fn subscribers_receive_every_report() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut host = MemoryHost::new();
        let mut monitor = PerformanceMonitor::new(MonitorConfig::default());
        let sink = Rc::clone(&seen);
        monitor.on_metrics_update(move |m| sink.borrow_mut().push(m.fps));
        monitor.start(&mut host);

        let mut now = host.now();
        for _ in 0..120 {
            now = now + Duration::from_millis(20);
            let _ = monitor.on_frame(&mut host, now);
        }
        // 2400 ms of frames close two windows.
        assert_eq!(*seen.borrow(), alloc::vec![50, 50]);
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let mut host = MemoryHost::new();
        let mut monitor = PerformanceMonitor::new(MonitorConfig::default());
        monitor.start(&mut host);
        monitor.start(&mut host);
        assert_eq!(host.pending_frames(), 1);

        monitor.stop(&mut host);
        monitor.stop(&mut host);
        assert_eq!(host.pending_frames(), 0);
        assert!(!monitor.is_monitoring());
    }

    #[test]
    fn ticks_after_stop_are_ignored() {
        let count = Rc::new(RefCell::new(0_u32));
        let mut host = MemoryHost::new();
        let mut monitor = PerformanceMonitor::new(MonitorConfig::default());
        let sink = Rc::clone(&count);
        monitor.on_metrics_update(move |_| *sink.borrow_mut() += 1);
        monitor.start(&mut host);
        monitor.stop(&mut host);

        let mut now = host.now();
        for _ in 0..200 {
            now = now + Duration::from_millis(16);
            assert_eq!(monitor.on_frame(&mut host, now), None);
        }
        assert_eq!(*count.borrow(), 0);
        assert_eq!(host.pending_frames(), 0);
        assert!(monitor.ring().is_empty());
    }

    #[test]
    fn animation_tokens_only_feed_the_count() {
        let mut monitor = PerformanceMonitor::new(MonitorConfig::default());
        monitor.track_animation("hero");
        monitor.track_animation("hero");
        monitor.track_animation(String::from("toast"));
        assert_eq!(monitor.animation_count(), 2);
        monitor.untrack_animation("hero");
        monitor.untrack_animation("missing");
        assert_eq!(monitor.animation_count(), 1);
    }
}
