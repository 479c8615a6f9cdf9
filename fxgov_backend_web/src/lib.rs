// Copyright 2026 the fxgov Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser host for fxgov.
//!
//! This crate binds the governor to the page it runs in:
//!
//! - [`WebHost`]: the [`Host`](fxgov_core::host::Host) implementation.
//!   `requestAnimationFrame` is the frame clock, `setTimeout` drives hint
//!   retraction, a `MutationObserver` reports insertions and removals, and
//!   style tokens and marker classes are written to `<html>`.
//! - [`WebGovernor`]: owns a [`Governor`](fxgov_core::Governor) over a
//!   [`WebHost`] and routes browser callbacks into it. [`WebGovernor::install`]
//!   initializes it as soon as the document is ready.
//!
//! ```ignore
//! let governor = fxgov_backend_web::WebGovernor::install(Default::default())?;
//! governor.on_metrics_update(|m| log::info!("{} fps", m.fps));
//! ```

#![no_std]

extern crate alloc;

mod dispatch;
mod governor;
mod host;
mod probe;
mod scheduling;

pub use governor::WebGovernor;
pub use host::{WebHost, WebHostError};
