// Copyright 2026 the fxgov Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositing-hint management.
//!
//! The [`AccelerationManager`] promotes elements matching its selector set
//! (or carrying one of its marker attributes) to their own compositing layer
//! and keeps a registry of every element it touched.
//!
//! Promotion writes four inline properties:
//!
//! | property              | value                          |
//! |-----------------------|--------------------------------|
//! | `transform`           | `translateZ(0)` (only if unset) |
//! | `backface-visibility` | `hidden`                       |
//! | `perspective`         | configured, `1000px` default   |
//! | `will-change`         | `transform, opacity`           |
//!
//! When a promoted element finishes an animation or transition, a timer is
//! armed; when it fires, only `will-change` is reset to `auto`. The element
//! stays registered and keeps its other properties.
//!
//! The registry is bounded by document lifetime: when the host reports
//! removals, registered elements that are no longer connected are dropped
//! along with their listeners and pending retractions.

use alloc::string::String;
use alloc::vec::Vec;

use crate::config::AccelerationConfig;
use crate::host::{Host, TimerId};

const WILL_CHANGE: &str = "will-change";
const PROMOTED_WILL_CHANGE: &str = "transform, opacity";

/// Applies and retracts compositing hints.
#[derive(Clone, Debug)]
pub struct AccelerationManager<E> {
    config: AccelerationConfig,
    target_selector: String,
    initialized: bool,
    registry: Vec<E>,
    retractions: Vec<(TimerId, E)>,
}

impl<E: Clone + PartialEq> AccelerationManager<E> {
    /// Creates an idle manager.
    #[must_use]
    pub fn new(config: AccelerationConfig) -> Self {
        let target_selector = target_selector(&config);
        Self {
            config,
            target_selector,
            initialized: false,
            registry: Vec::new(),
            retractions: Vec::new(),
        }
    }

    /// Combined selector for the selector set and marker attributes.
    #[must_use]
    pub fn target_selector(&self) -> &str {
        &self.target_selector
    }

    /// Returns `true` between [`init`](Self::init) and
    /// [`destroy`](Self::destroy).
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Promotes every matching element in the document, then starts
    /// observing insertions. No-op if already initialized.
    ///
    /// Returns the number of newly promoted elements.
    pub fn init<H: Host<Element = E>>(&mut self, host: &mut H) -> usize {
        if self.initialized {
            return 0;
        }
        self.initialized = true;
        let mut promoted = 0;
        for element in host.query_all(None, &self.target_selector) {
            if self.accelerate_element(host, &element) {
                promoted += 1;
            }
        }
        host.observe_mutations();
        promoted
    }

    /// Promotes one element. Returns `false` if it was already registered.
    pub fn accelerate_element<H: Host<Element = E>>(&mut self, host: &mut H, element: &E) -> bool {
        if self.registry.contains(element) {
            return false;
        }
        if host.style_property(element, "transform").is_none() {
            host.set_style_property(element, "transform", "translateZ(0)");
        }
        host.set_style_property(element, "backface-visibility", "hidden");
        host.set_style_property(element, "perspective", &self.config.perspective);
        host.set_style_property(element, WILL_CHANGE, PROMOTED_WILL_CHANGE);
        host.listen_animation_end(element);
        self.registry.push(element.clone());
        true
    }

    /// Handles a batch of inserted subtree roots. Each root and all of its
    /// descendants are tested against the targets.
    ///
    /// Returns the number of newly promoted elements.
    pub fn on_insertions<H: Host<Element = E>>(&mut self, host: &mut H, roots: &[E]) -> usize {
        if !self.initialized {
            return 0;
        }
        let mut promoted = 0;
        for root in roots {
            if host.matches(root, &self.target_selector) && self.accelerate_element(host, root) {
                promoted += 1;
            }
            for descendant in host.query_all(Some(root), &self.target_selector) {
                if self.accelerate_element(host, &descendant) {
                    promoted += 1;
                }
            }
        }
        promoted
    }

    /// Arms the hint-retraction timer for a registered element.
    pub fn on_animation_ended<H: Host<Element = E>>(&mut self, host: &mut H, element: &E) {
        if !self.initialized || !self.registry.contains(element) {
            return;
        }
        let timer = host.schedule_timeout(self.config.retraction_delay);
        self.retractions.push((timer, element.clone()));
    }

    /// Handles a fired timer. Returns `true` if it was one of ours and the
    /// hint was reset.
    pub fn on_timeout<H: Host<Element = E>>(&mut self, host: &mut H, timer: TimerId) -> bool {
        let Some(index) = self.retractions.iter().position(|(id, _)| *id == timer) else {
            return false;
        };
        let (_, element) = self.retractions.swap_remove(index);
        if !self.registry.contains(&element) {
            return false;
        }
        host.set_style_property(&element, WILL_CHANGE, "auto");
        true
    }

    /// Drops registered elements that are no longer attached.
    ///
    /// Returns the number of elements pruned.
    pub fn on_removals<H: Host<Element = E>>(&mut self, host: &mut H) -> usize {
        if !self.initialized {
            return 0;
        }
        let before = self.registry.len();
        let (kept, detached): (Vec<E>, Vec<E>) = core::mem::take(&mut self.registry)
            .into_iter()
            .partition(|el| host.is_connected(el));
        self.registry = kept;
        for element in &detached {
            host.unlisten_animation_end(element);
        }
        self.retractions.retain(|(timer, el)| {
            let stale = detached.contains(el);
            if stale {
                host.cancel_timeout(*timer);
            }
            !stale
        });
        before - self.registry.len()
    }

    /// Stops observing, cancels pending retractions, resets `will-change` on
    /// every registered element, detaches listeners and empties the registry.
    ///
    /// Returns the number of elements released.
    pub fn destroy<H: Host<Element = E>>(&mut self, host: &mut H) -> usize {
        if self.initialized {
            host.disconnect_mutations();
            self.initialized = false;
        }
        for (timer, _) in core::mem::take(&mut self.retractions) {
            host.cancel_timeout(timer);
        }
        let registry = core::mem::take(&mut self.registry);
        for element in &registry {
            host.set_style_property(element, WILL_CHANGE, "auto");
            host.unlisten_animation_end(element);
        }
        registry.len()
    }

    /// Number of registered elements.
    #[must_use]
    pub fn accelerated_count(&self) -> usize {
        self.registry.len()
    }

    /// Returns whether the element is registered.
    #[must_use]
    pub fn is_accelerated(&self, element: &E) -> bool {
        self.registry.contains(element)
    }

    /// Number of armed retraction timers.
    #[must_use]
    pub fn pending_retractions(&self) -> usize {
        self.retractions.len()
    }
}

fn target_selector(config: &AccelerationConfig) -> String {
    let mut parts: Vec<String> = config.selectors.iter().map(|s| s.trim().into()).collect();
    parts.extend(
        config
            .marker_attributes
            .iter()
            .map(|attr| alloc::format!("[{}]", attr.trim())),
    );
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{ElementId, MemoryHost};
    use crate::time::Duration;

    fn manager() -> AccelerationManager<ElementId> {
        AccelerationManager::new(AccelerationConfig::default())
    }

    #[test]
    fn target_selector_includes_marker_attributes() {
        let accel = manager();
        let selector = accel.target_selector();
        assert!(selector.starts_with(".animate-fade-in, "));
        assert!(selector.ends_with("[data-animate], [data-parallax]"));
    }

    #[test]
    fn init_scans_document_and_observes() {
        let mut host = MemoryHost::new();
        let card = host.append(None, "glass-card");
        let plain = host.append(None, "plain");
        let marked = host.append(Some(plain), "");
        host.set_attribute(marked, "data-parallax", "0.5");

        let mut accel = manager();
        assert_eq!(accel.init(&mut host), 2);
        assert!(host.is_observing());
        assert!(accel.is_accelerated(&card));
        assert!(accel.is_accelerated(&marked));
        assert!(!accel.is_accelerated(&plain));

        assert_eq!(host.style(card, "transform"), Some("translateZ(0)"));
        assert_eq!(host.style(card, "backface-visibility"), Some("hidden"));
        assert_eq!(host.style(card, "perspective"), Some("1000px"));
        assert_eq!(host.style(card, "will-change"), Some("transform, opacity"));
        assert!(host.is_listening(card));

        assert_eq!(accel.init(&mut host), 0);
    }

    #[test]
    fn accelerate_element_is_idempotent() {
        let mut host = MemoryHost::new();
        let el = host.append(None, "card-hover");
        let mut accel = manager();

        assert!(accel.accelerate_element(&mut host, &el));

        // Disturb what the first call wrote; a repeat must not restore it.
        host.set_style_property(&el, "will-change", "auto");
        host.set_style_property(&el, "backface-visibility", "visible");
        host.unlisten_animation_end(&el);

        assert!(!accel.accelerate_element(&mut host, &el));
        assert_eq!(accel.accelerated_count(), 1);
        assert_eq!(host.style(el, "will-change"), Some("auto"));
        assert_eq!(host.style(el, "backface-visibility"), Some("visible"));
        assert!(!host.is_listening(el));
    }

    #[test]
    fn existing_transform_is_preserved() {
        let mut host = MemoryHost::new();
        let el = host.append(None, "modal-content");
        host.set_style_property(&el, "transform", "scale(0.9)");
        let mut accel = manager();
        accel.accelerate_element(&mut host, &el);
        assert_eq!(host.style(el, "transform"), Some("scale(0.9)"));
    }

    #[test]
    fn insertions_test_root_and_descendants() {
        let mut host = MemoryHost::new();
        let mut accel = manager();
        accel.init(&mut host);

        let root = host.append(None, "dropdown-menu");
        let child = host.append(Some(root), "animate-scale-in");
        let other = host.append(Some(root), "label");
        let events = host.take_mutations();
        let [crate::host::HostEvent::Inserted(roots)] = events.as_slice() else {
            panic!("expected one insertion batch, got {events:?}");
        };

        assert_eq!(accel.on_insertions(&mut host, roots), 2);
        assert!(accel.is_accelerated(&root));
        assert!(accel.is_accelerated(&child));
        assert!(!accel.is_accelerated(&other));
    }

    #[test]
    fn animation_end_retracts_only_will_change_after_delay() {
        let mut host = MemoryHost::new();
        let el = host.append(None, "animate-fade-in");
        let mut accel = manager();
        accel.init(&mut host);

        accel.on_animation_ended(&mut host, &el);
        assert_eq!(accel.pending_retractions(), 1);
        assert!(host.advance(Duration::from_millis(999)).is_empty());

        let events = host.advance(Duration::from_millis(1));
        let [crate::host::HostEvent::Timeout(timer)] = events.as_slice() else {
            panic!("expected the retraction timer, got {events:?}");
        };
        assert!(accel.on_timeout(&mut host, *timer));
        assert_eq!(host.style(el, "will-change"), Some("auto"));
        assert_eq!(host.style(el, "transform"), Some("translateZ(0)"));
        assert!(accel.is_accelerated(&el));
        assert_eq!(accel.pending_retractions(), 0);
    }

    #[test]
    fn removals_prune_detached_elements() {
        let mut host = MemoryHost::new();
        let kept = host.append(None, "glass-card");
        let gone = host.append(None, "glass-card");
        let mut accel = manager();
        accel.init(&mut host);
        accel.on_animation_ended(&mut host, &gone);

        host.remove(gone);
        assert_eq!(accel.on_removals(&mut host), 1);
        assert!(accel.is_accelerated(&kept));
        assert!(!accel.is_accelerated(&gone));
        assert!(!host.is_listening(gone));
        assert_eq!(accel.pending_retractions(), 0);
        assert_eq!(host.pending_timers(), 0);
    }

    #[test]
    fn destroy_releases_everything() {
        let mut host = MemoryHost::new();
        let a = host.append(None, "glass-card");
        let b = host.append(None, "parallax-layer");
        let mut accel = manager();
        accel.init(&mut host);
        accel.on_animation_ended(&mut host, &a);
        host.remove(b);

        assert_eq!(accel.destroy(&mut host), 2);
        assert_eq!(accel.accelerated_count(), 0);
        assert!(!accel.is_initialized());
        assert!(!host.is_observing());
        assert_eq!(host.pending_timers(), 0);
        assert_eq!(host.style(a, "will-change"), Some("auto"));
        assert_eq!(host.style(b, "will-change"), Some("auto"));
        assert!(!host.is_listening(a));

        // Re-init after destroy works from a clean slate.
        assert_eq!(accel.init(&mut host), 1);
    }
}
