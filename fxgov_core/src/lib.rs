// Copyright 2026 the fxgov Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adaptive rendering-performance governor.
//!
//! `fxgov_core` measures live frame-rendering performance, classifies the
//! host's capability once, and throttles the intensity of visual effects to
//! keep an interface responsive. It is `no_std` compatible (with `alloc`)
//! and talks to its environment only through the [`Host`](host::Host) trait.
//!
//! # Architecture
//!
//! The crate is a closed control loop driven by the host frame clock:
//!
//! ```text
//!   Host::probe() ──► CapabilitySnapshot ──► Optimizer (initial tier)
//!                                                │
//!                        ┌───────────────────────┴──────────────┐
//!                        ▼                                      ▼
//!          root tokens + marker classes          AccelerationManager::init()
//!
//!   HostEvent::Frame ──► PerformanceMonitor ──► PerformanceMetrics
//!                                                   │
//!                          ┌────────────────────────┴─────────┐
//!                          ▼                                  ▼
//!          Optimizer::observe() (High → Medium)   DegradationWatcher ──► FallbackSystem
//! ```
//!
//! **[`governor`]**: [`Governor`](governor::Governor) owns the host and every
//! component, routes [`HostEvent`](host::HostEvent)s, and runs the slow
//! hysteresis watcher that triggers fallback sweeps.
//!
//! **[`monitor`]**: frame-delta ring and periodic
//! [`PerformanceMetrics`](monitor::PerformanceMetrics) with subscriber fan-out.
//!
//! **[`capability`]**: one-shot classification of the host's feature probe.
//!
//! **[`optimizer`]** and **[`tier`]**: tier selection, the one-way
//! High → Medium downgrade, and the root tokens and classes of each tier.
//!
//! **[`acceleration`]**: compositing hints on matching elements, their
//! timed retraction, and a registry bounded by document lifetime.
//!
//! **[`fallback`]**: complex → simple effect class substitution.
//!
//! **[`host`]**: the environment contract. **[`memory`]** implements it in
//! memory for tests and headless use.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types with
//! a zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `serde` (disabled by default): `Serialize`/`Deserialize` for
//!   configuration and reported values.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod acceleration;
pub mod capability;
pub mod config;
pub mod fallback;
pub mod governor;
pub mod host;
pub mod memory;
pub mod monitor;
pub mod optimizer;
pub mod tier;
pub mod time;
pub mod trace;

pub use config::{ConfigError, GovernorConfig};
pub use governor::{Governor, GovernorMetrics};
pub use host::{Host, HostEvent};
pub use tier::OptimizationTier;
