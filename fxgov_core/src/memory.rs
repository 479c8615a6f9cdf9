// Copyright 2026 the fxgov Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory [`Host`] implementation.
//!
//! [`MemoryHost`] models just enough of a document to drive the governor
//! without a browser: a manual clock, an element tree with classes,
//! attributes and inline styles, root tokens and classes, and bookkeeping for
//! frame requests, timers, mutation observation and animation listeners.
//!
//! Nothing fires on its own. Callers advance the clock with
//! [`advance`](MemoryHost::advance) and collect mutation batches with
//! [`take_mutations`](MemoryHost::take_mutations), then hand the returned
//! [`HostEvent`]s to the governor, the same way a real host would deliver
//! its callbacks.
//!
//! Selector support is limited to comma-separated compounds of tag names,
//! `.class`, `[attr]`, `[attr="v"]` and `[attr*="v"]`.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::capability::HostProbe;
use crate::host::{FrameRequest, Host, HostEvent, TimerId};
use crate::time::{Duration, HostTime};

/// Element handle for [`MemoryHost`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub u32);

impl ElementId {
    const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, Default)]
struct Node {
    tag: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    styles: BTreeMap<String, String>,
    connected: bool,
}

impl Node {
    fn attribute(&self, name: &str) -> Option<String> {
        if name == "class" {
            return (!self.classes.is_empty()).then(|| self.classes.join(" "));
        }
        self.attributes.get(name).cloned()
    }

    fn matches_attribute(&self, expr: &str) -> bool {
        if let Some((name, value)) = expr.split_once("*=") {
            let value = value.trim().trim_matches('"');
            return self
                .attribute(name.trim())
                .is_some_and(|v| v.contains(value));
        }
        if let Some((name, value)) = expr.split_once('=') {
            let value = value.trim().trim_matches('"');
            return self.attribute(name.trim()).is_some_and(|v| v == value);
        }
        self.attribute(expr.trim()).is_some()
    }

    fn matches_compound(&self, compound: &str) -> bool {
        let mut rest = compound;
        while !rest.is_empty() {
            if let Some(tail) = rest.strip_prefix('.') {
                let end = tail.find(['.', '[']).unwrap_or(tail.len());
                if !self.classes.iter().any(|c| *c == tail[..end]) {
                    return false;
                }
                rest = &tail[end..];
            } else if let Some(tail) = rest.strip_prefix('[') {
                let Some(close) = tail.find(']') else {
                    return false;
                };
                if !self.matches_attribute(&tail[..close]) {
                    return false;
                }
                rest = &tail[close + 1..];
            } else {
                let end = rest.find(['.', '[']).unwrap_or(rest.len());
                if !self.tag.eq_ignore_ascii_case(&rest[..end]) {
                    return false;
                }
                rest = &rest[end..];
            }
        }
        true
    }

    fn matches(&self, selector: &str) -> bool {
        selector
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .any(|compound| self.matches_compound(compound))
    }
}

/// A headless document and scheduler.
#[derive(Clone, Debug, Default)]
pub struct MemoryHost {
    now: HostTime,
    probe: HostProbe,
    heap_used_mb: Option<f64>,
    nodes: Vec<Node>,
    roots: Vec<ElementId>,
    root_tokens: BTreeMap<String, String>,
    root_classes: BTreeSet<String>,
    next_handle: u32,
    frame_requests: BTreeSet<FrameRequest>,
    timers: BTreeMap<TimerId, HostTime>,
    observing: bool,
    inserted: Vec<ElementId>,
    removed: Vec<ElementId>,
    listening: BTreeSet<ElementId>,
}

impl MemoryHost {
    /// Creates an empty host at time zero with an all-`None` probe.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a host answering feature queries with `probe`.
    #[must_use]
    pub fn with_probe(probe: HostProbe) -> Self {
        Self {
            probe,
            ..Self::default()
        }
    }

    /// Sets the heap usage reported in metrics.
    pub fn set_heap_used_mb(&mut self, mb: Option<f64>) {
        self.heap_used_mb = mb;
    }

    /// Moves the clock to `now` without firing anything.
    pub fn set_now(&mut self, now: HostTime) {
        self.now = now;
    }

    /// Advances the clock by `dt` and returns the callbacks that became due:
    /// elapsed timers in due order, then one frame if any was requested.
    pub fn advance(&mut self, dt: Duration) -> Vec<HostEvent<ElementId>> {
        self.now = self.now + dt;
        let mut due: Vec<(HostTime, TimerId)> = self
            .timers
            .iter()
            .filter(|(_, at)| **at <= self.now)
            .map(|(id, at)| (*at, *id))
            .collect();
        due.sort();
        let mut events: Vec<HostEvent<ElementId>> = due
            .into_iter()
            .map(|(_, id)| {
                self.timers.remove(&id);
                HostEvent::Timeout(id)
            })
            .collect();
        if !self.frame_requests.is_empty() {
            self.frame_requests.clear();
            events.push(HostEvent::Frame(self.now));
        }
        events
    }

    /// Appends a new element under `parent` (or at the document top level)
    /// with a space-separated class list.
    pub fn append(&mut self, parent: Option<ElementId>, classes: &str) -> ElementId {
        self.append_tagged(parent, "div", classes)
    }

    /// Appends a new element with an explicit tag name.
    pub fn append_tagged(
        &mut self,
        parent: Option<ElementId>,
        tag: &str,
        classes: &str,
    ) -> ElementId {
        let id = ElementId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        let connected = match parent {
            Some(p) => self.node(p).is_some_and(|n| n.connected),
            None => true,
        };
        self.nodes.push(Node {
            tag: tag.to_string(),
            parent,
            classes: classes.split_whitespace().map(ToString::to_string).collect(),
            connected,
            ..Node::default()
        });
        match parent {
            Some(p) => {
                if let Some(node) = self.nodes.get_mut(p.index()) {
                    node.children.push(id);
                }
            }
            None => self.roots.push(id),
        }
        if self.observing && connected {
            self.inserted.push(id);
        }
        id
    }

    /// Sets an attribute on an element.
    pub fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) {
        if let Some(node) = self.nodes.get_mut(element.index()) {
            node.attributes.insert(name.to_string(), value.to_string());
        }
    }

    /// Detaches an element and its subtree from the document.
    pub fn remove(&mut self, element: ElementId) {
        let Some(node) = self.node(element) else {
            return;
        };
        if !node.connected {
            return;
        }
        match node.parent {
            Some(p) => {
                if let Some(parent) = self.nodes.get_mut(p.index()) {
                    parent.children.retain(|c| *c != element);
                }
            }
            None => self.roots.retain(|r| *r != element),
        }
        let mut stack = alloc::vec![element];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(id.index()) {
                node.connected = false;
                stack.extend(node.children.iter().copied());
            }
        }
        if self.observing {
            self.removed.push(element);
        }
    }

    /// Returns the batched insertion and removal notifications accumulated
    /// since the last call.
    pub fn take_mutations(&mut self) -> Vec<HostEvent<ElementId>> {
        let mut events = Vec::new();
        if !self.inserted.is_empty() {
            events.push(HostEvent::Inserted(core::mem::take(&mut self.inserted)));
        }
        if !self.removed.is_empty() {
            events.push(HostEvent::Removed(core::mem::take(&mut self.removed)));
        }
        events
    }

    /// Simulates an element finishing an animation.
    ///
    /// Returns the event only if a listener is attached.
    #[must_use]
    pub fn end_animation(&self, element: ElementId) -> Option<HostEvent<ElementId>> {
        self.listening
            .contains(&element)
            .then_some(HostEvent::AnimationEnded(element))
    }

    /// Reads an inline style property.
    #[must_use]
    pub fn style(&self, element: ElementId, name: &str) -> Option<&str> {
        self.node(element)?.styles.get(name).map(String::as_str)
    }

    /// Returns whether the element carries `class`.
    #[must_use]
    pub fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.node(element)
            .is_some_and(|n| n.classes.iter().any(|c| c == class))
    }

    /// Reads a custom property on the document root.
    #[must_use]
    pub fn root_token(&self, name: &str) -> Option<&str> {
        self.root_tokens.get(name).map(String::as_str)
    }

    /// Returns whether the document root carries `class`.
    #[must_use]
    pub fn has_root_class(&self, class: &str) -> bool {
        self.root_classes.contains(class)
    }

    /// Number of outstanding frame requests.
    #[must_use]
    pub fn pending_frames(&self) -> usize {
        self.frame_requests.len()
    }

    /// Number of outstanding timers.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Returns whether mutation observation is active.
    #[must_use]
    pub fn is_observing(&self) -> bool {
        self.observing
    }

    /// Returns whether animation-end events are delivered for the element.
    #[must_use]
    pub fn is_listening(&self, element: ElementId) -> bool {
        self.listening.contains(&element)
    }

    fn node(&self, element: ElementId) -> Option<&Node> {
        self.nodes.get(element.index())
    }

    fn next_handle(&mut self) -> u32 {
        self.next_handle = self.next_handle.wrapping_add(1);
        self.next_handle
    }

    fn collect_matching(&self, from: &[ElementId], selector: &str, out: &mut Vec<ElementId>) {
        for &id in from {
            let Some(node) = self.node(id) else {
                continue;
            };
            if node.matches(selector) {
                out.push(id);
            }
            self.collect_matching(&node.children, selector, out);
        }
    }
}

impl Host for MemoryHost {
    type Element = ElementId;

    fn now(&self) -> HostTime {
        self.now
    }

    fn probe(&self) -> HostProbe {
        self.probe.clone()
    }

    fn heap_used_mb(&self) -> Option<f64> {
        self.heap_used_mb
    }

    fn request_frame(&mut self) -> FrameRequest {
        let request = FrameRequest(self.next_handle());
        self.frame_requests.insert(request);
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        self.frame_requests.remove(&request);
    }

    fn schedule_timeout(&mut self, delay: Duration) -> TimerId {
        let timer = TimerId(self.next_handle());
        self.timers.insert(timer, self.now + delay);
        timer
    }

    fn cancel_timeout(&mut self, timer: TimerId) {
        self.timers.remove(&timer);
    }

    fn observe_mutations(&mut self) {
        self.observing = true;
    }

    fn disconnect_mutations(&mut self) {
        self.observing = false;
        self.inserted.clear();
        self.removed.clear();
    }

    fn query_all(&self, scope: Option<&ElementId>, selector: &str) -> Vec<ElementId> {
        let mut out = Vec::new();
        match scope {
            Some(scope) => {
                if let Some(node) = self.node(*scope) {
                    self.collect_matching(&node.children, selector, &mut out);
                }
            }
            None => self.collect_matching(&self.roots, selector, &mut out),
        }
        out
    }

    fn matches(&self, element: &ElementId, selector: &str) -> bool {
        self.node(*element).is_some_and(|n| n.matches(selector))
    }

    fn is_connected(&self, element: &ElementId) -> bool {
        self.node(*element).is_some_and(|n| n.connected)
    }

    fn style_property(&self, element: &ElementId, name: &str) -> Option<String> {
        self.style(*element, name)
            .filter(|v| !v.is_empty())
            .map(ToString::to_string)
    }

    fn set_style_property(&mut self, element: &ElementId, name: &str, value: &str) {
        if let Some(node) = self.nodes.get_mut(element.index()) {
            node.styles.insert(name.to_string(), value.to_string());
        }
    }

    fn class_names(&self, element: &ElementId) -> Vec<String> {
        self.node(*element)
            .map(|n| n.classes.clone())
            .unwrap_or_default()
    }

    fn set_class(&mut self, element: &ElementId, class: &str, enabled: bool) {
        let Some(node) = self.nodes.get_mut(element.index()) else {
            return;
        };
        let present = node.classes.iter().any(|c| c == class);
        if enabled && !present {
            node.classes.push(class.to_string());
        } else if !enabled && present {
            node.classes.retain(|c| c != class);
        }
    }

    fn listen_animation_end(&mut self, element: &ElementId) {
        self.listening.insert(*element);
    }

    fn unlisten_animation_end(&mut self, element: &ElementId) {
        self.listening.remove(element);
    }

    fn set_root_token(&mut self, name: &str, value: Option<&str>) {
        match value {
            Some(value) => {
                self.root_tokens.insert(name.to_string(), value.to_string());
            }
            None => {
                self.root_tokens.remove(name);
            }
        }
    }

    fn set_root_class(&mut self, class: &str, enabled: bool) {
        if enabled {
            self.root_classes.insert(class.to_string());
        } else {
            self.root_classes.remove(class);
        }
    }
}
