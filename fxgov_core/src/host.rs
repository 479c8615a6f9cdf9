// Copyright 2026 the fxgov Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host contract for environment integrations.
//!
//! Everything the governor needs from its environment goes through the
//! [`Host`] trait:
//!
//! - **Clock and probes**: `now()`, a one-shot [`HostProbe`], and optional
//!   heap-usage introspection.
//! - **Scheduling**: frame callbacks (the frame clock) and one-shot timers.
//!   Requests return handles so they can be cancelled.
//! - **Document**: element queries and matching, insertion/removal
//!   observation, inline style and class-list mutation, animation-end
//!   listeners, and root style tokens and marker classes.
//!
//! Hosts never call back into the governor synchronously. Instead, the
//! callbacks they arrange (a frame firing, a mutation batch, an
//! `animationend` event, a timer) are delivered later as [`HostEvent`] values
//! to [`Governor::handle_event`](crate::governor::Governor::handle_event).
//! This keeps every piece of shared state mutated only inside its owning
//! component's handler.
//!
//! # Crate boundaries
//!
//! `fxgov_core` owns the decision logic and this contract. The browser
//! adapter lives in `fxgov_backend_web`; [`MemoryHost`](crate::memory::MemoryHost)
//! is an in-memory implementation for tests and headless runs.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::capability::HostProbe;
use crate::time::{Duration, HostTime};

/// Handle for an outstanding frame callback request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameRequest(pub u32);

/// Handle for an outstanding one-shot timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u32);

/// A callback the host arranged earlier, delivered back to the governor.
#[derive(Clone, Debug, PartialEq)]
pub enum HostEvent<E> {
    /// The frame clock fired at the given time.
    Frame(HostTime),
    /// A batch of subtree roots was inserted into the document.
    Inserted(Vec<E>),
    /// A batch of subtree roots was removed from the document.
    Removed(Vec<E>),
    /// An element finished an animation or a transition.
    AnimationEnded(E),
    /// A timer scheduled with [`Host::schedule_timeout`] elapsed.
    Timeout(TimerId),
}

/// The environment the governor runs in.
///
/// All queries degrade gracefully: an unsupported feature answers `false`,
/// `None`, or an empty list rather than failing. Mutations on elements that
/// are no longer attached are silently accepted.
pub trait Host {
    /// Handle to a document element.
    ///
    /// Handles compare equal when they refer to the same element.
    type Element: Clone + PartialEq + fmt::Debug;

    /// Returns the current monotonic time.
    fn now(&self) -> HostTime;

    /// Probes host features once. Called at governor construction.
    fn probe(&self) -> HostProbe;

    /// Returns the current heap usage in megabytes, if the host exposes it.
    fn heap_used_mb(&self) -> Option<f64>;

    /// Requests a callback on the next rendered frame.
    fn request_frame(&mut self) -> FrameRequest;

    /// Cancels a pending frame request. Unknown handles are ignored.
    fn cancel_frame(&mut self, request: FrameRequest);

    /// Schedules a one-shot timer that fires after `delay`.
    fn schedule_timeout(&mut self, delay: Duration) -> TimerId;

    /// Cancels a pending timer. Unknown handles are ignored.
    fn cancel_timeout(&mut self, timer: TimerId);

    /// Starts reporting subtree insertions and removals in batches.
    fn observe_mutations(&mut self);

    /// Stops reporting insertions and removals.
    fn disconnect_mutations(&mut self);

    /// Returns the elements matching `selector`, in document order.
    ///
    /// With a `scope`, only descendants of that element are searched (the
    /// scope itself is not tested).
    fn query_all(&self, scope: Option<&Self::Element>, selector: &str) -> Vec<Self::Element>;

    /// Returns whether `element` matches `selector`.
    fn matches(&self, element: &Self::Element, selector: &str) -> bool;

    /// Returns whether `element` is still attached to the document.
    fn is_connected(&self, element: &Self::Element) -> bool;

    /// Reads an inline style property. Empty values read as `None`.
    fn style_property(&self, element: &Self::Element, name: &str) -> Option<String>;

    /// Writes an inline style property.
    fn set_style_property(&mut self, element: &Self::Element, name: &str, value: &str);

    /// Returns the element's class list.
    fn class_names(&self, element: &Self::Element) -> Vec<String>;

    /// Adds (`enabled`) or removes a class on the element.
    fn set_class(&mut self, element: &Self::Element, class: &str, enabled: bool);

    /// Starts delivering [`HostEvent::AnimationEnded`] for the element's
    /// `animationend` and `transitionend` events.
    fn listen_animation_end(&mut self, element: &Self::Element);

    /// Stops delivering animation-end events for the element.
    fn unlisten_animation_end(&mut self, element: &Self::Element);

    /// Sets (`Some`) or removes (`None`) a custom property on the document
    /// root.
    fn set_root_token(&mut self, name: &str, value: Option<&str>);

    /// Adds (`enabled`) or removes a marker class on the document root.
    fn set_root_class(&mut self, class: &str, enabled: bool);
}
