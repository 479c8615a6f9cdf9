// Copyright 2026 the fxgov Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The browser [`Host`].

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use fxgov_core::ConfigError;
use fxgov_core::capability::HostProbe;
use fxgov_core::host::{FrameRequest, Host, HostEvent, TimerId};
use fxgov_core::time::{Duration, HostTime};
use thiserror::Error;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use web_sys::{
    Document, Element, Event, HtmlElement, MutationObserver, MutationObserverInit,
    MutationRecord, NodeList, Window,
};

use crate::dispatch::DispatchSlot;
use crate::probe;
use crate::scheduling::{self, FrameClock, Timers};

const END_EVENTS: [&str; 2] = ["animationend", "transitionend"];

/// Reasons the browser host cannot be set up.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum WebHostError {
    /// No global `window` (not running in a browser main thread).
    #[error("no global window")]
    NoWindow,
    /// The window has no document.
    #[error("window has no document")]
    NoDocument,
    /// The document has no root element, or it is not an HTML element.
    #[error("document has no HTML root element")]
    NoRootElement,
    /// The governor configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

type ObserverClosure = Closure<dyn FnMut(js_sys::Array, MutationObserver)>;
type EndClosure = Closure<dyn FnMut(Event)>;

/// [`Host`] backed by the DOM of the current window.
pub struct WebHost {
    window: Window,
    document: Document,
    root: HtmlElement,
    dispatch: DispatchSlot,
    frames: FrameClock,
    timers: Timers,
    observer: Option<(MutationObserver, ObserverClosure)>,
    end_listeners: Vec<(Element, EndClosure)>,
}

impl core::fmt::Debug for WebHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebHost")
            .field("dispatch", &self.dispatch)
            .field("timers", &self.timers)
            .field("observing", &self.observer.is_some())
            .field("end_listeners", &self.end_listeners.len())
            .finish_non_exhaustive()
    }
}

impl WebHost {
    /// Binds to the current window's document.
    ///
    /// # Errors
    ///
    /// Returns a [`WebHostError`] if the window, the document, or its HTML
    /// root element is missing.
    pub fn new() -> Result<Self, WebHostError> {
        let window = web_sys::window().ok_or(WebHostError::NoWindow)?;
        let document = window.document().ok_or(WebHostError::NoDocument)?;
        let root = document
            .document_element()
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            .ok_or(WebHostError::NoRootElement)?;
        let dispatch = DispatchSlot::default();
        Ok(Self {
            frames: FrameClock::new(dispatch.clone()),
            timers: Timers::new(dispatch.clone()),
            window,
            document,
            root,
            dispatch,
            observer: None,
            end_listeners: Vec::new(),
        })
    }

    /// The document this host mutates.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub(crate) fn dispatch(&self) -> &DispatchSlot {
        &self.dispatch
    }

    fn create_observer(&self) -> Option<(MutationObserver, ObserverClosure)> {
        let dispatch = self.dispatch.clone();
        let closure: ObserverClosure = Closure::wrap(Box::new(
            move |records: js_sys::Array, _observer: MutationObserver| {
                let mut inserted = Vec::new();
                let mut removed = Vec::new();
                for record in records.iter() {
                    let Ok(record) = record.dyn_into::<MutationRecord>() else {
                        continue;
                    };
                    collect_elements(&record.added_nodes(), &mut inserted);
                    collect_elements(&record.removed_nodes(), &mut removed);
                }
                if !inserted.is_empty() {
                    dispatch.deliver(HostEvent::Inserted(inserted));
                }
                if !removed.is_empty() {
                    dispatch.deliver(HostEvent::Removed(removed));
                }
            },
        )
            as Box<dyn FnMut(js_sys::Array, MutationObserver)>);

        let observer = match MutationObserver::new(closure.as_ref().unchecked_ref()) {
            Ok(observer) => observer,
            Err(err) => {
                log::debug!("MutationObserver unavailable: {err:?}");
                return None;
            }
        };
        let options = MutationObserverInit::new();
        options.set_child_list(true);
        options.set_subtree(true);
        if let Err(err) = observer.observe_with_options(&self.root, &options) {
            log::debug!("failed to observe document: {err:?}");
            return None;
        }
        Some((observer, closure))
    }
}

fn collect_elements(nodes: &NodeList, out: &mut Vec<Element>) {
    for i in 0..nodes.length() {
        if let Some(element) = nodes.item(i).and_then(|n| n.dyn_into::<Element>().ok()) {
            out.push(element);
        }
    }
}

impl Host for WebHost {
    type Element = Element;

    fn now(&self) -> HostTime {
        scheduling::now()
    }

    fn probe(&self) -> HostProbe {
        probe::probe(&self.window, &self.document)
    }

    fn heap_used_mb(&self) -> Option<f64> {
        probe::heap_field(&self.window, "usedJSHeapSize")
    }

    fn request_frame(&mut self) -> FrameRequest {
        self.frames.request()
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        FrameClock::cancel(request);
    }

    fn schedule_timeout(&mut self, delay: Duration) -> TimerId {
        self.timers.schedule(delay)
    }

    fn cancel_timeout(&mut self, timer: TimerId) {
        self.timers.cancel(timer);
    }

    fn observe_mutations(&mut self) {
        if self.observer.is_none() {
            self.observer = self.create_observer();
        }
    }

    fn disconnect_mutations(&mut self) {
        if let Some((observer, _closure)) = self.observer.take() {
            observer.disconnect();
        }
    }

    fn query_all(&self, scope: Option<&Element>, selector: &str) -> Vec<Element> {
        let result = match scope {
            Some(scope) => scope.query_selector_all(selector),
            None => self.document.query_selector_all(selector),
        };
        let mut out = Vec::new();
        match result {
            Ok(nodes) => collect_elements(&nodes, &mut out),
            Err(err) => log::debug!("query_selector_all({selector:?}) failed: {err:?}"),
        }
        out
    }

    fn matches(&self, element: &Element, selector: &str) -> bool {
        element.matches(selector).unwrap_or(false)
    }

    fn is_connected(&self, element: &Element) -> bool {
        element.is_connected()
    }

    fn style_property(&self, element: &Element, name: &str) -> Option<String> {
        element
            .dyn_ref::<HtmlElement>()?
            .style()
            .get_property_value(name)
            .ok()
            .filter(|value| !value.is_empty())
    }

    fn set_style_property(&mut self, element: &Element, name: &str, value: &str) {
        let Some(element) = element.dyn_ref::<HtmlElement>() else {
            return;
        };
        if let Err(err) = element.style().set_property(name, value) {
            log::debug!("failed to set {name}: {err:?}");
        }
    }

    fn class_names(&self, element: &Element) -> Vec<String> {
        let list = element.class_list();
        (0..list.length()).filter_map(|i| list.item(i)).collect()
    }

    fn set_class(&mut self, element: &Element, class: &str, enabled: bool) {
        if let Err(err) = element.class_list().toggle_with_force(class, enabled) {
            log::debug!("failed to toggle class {class}: {err:?}");
        }
    }

    fn listen_animation_end(&mut self, element: &Element) {
        if self.end_listeners.iter().any(|(el, _)| el == element) {
            return;
        }
        let dispatch = self.dispatch.clone();
        let target = element.clone();
        let closure: EndClosure = Closure::wrap(Box::new(move |_event: Event| {
            dispatch.deliver(HostEvent::AnimationEnded(target.clone()));
        }) as Box<dyn FnMut(Event)>);
        for name in END_EVENTS {
            if let Err(err) =
                element.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
            {
                log::debug!("failed to listen for {name}: {err:?}");
            }
        }
        self.end_listeners.push((element.clone(), closure));
    }

    fn unlisten_animation_end(&mut self, element: &Element) {
        let Some(index) = self.end_listeners.iter().position(|(el, _)| el == element) else {
            return;
        };
        let (element, closure) = self.end_listeners.swap_remove(index);
        detach(&element, &closure);
    }

    fn set_root_token(&mut self, name: &str, value: Option<&str>) {
        let style = self.root.style();
        let result = match value {
            Some(value) => style.set_property(name, value),
            None => style.remove_property(name).map(drop),
        };
        if let Err(err) = result {
            log::debug!("failed to write root token {name}: {err:?}");
        }
    }

    fn set_root_class(&mut self, class: &str, enabled: bool) {
        if let Err(err) = self.root.class_list().toggle_with_force(class, enabled) {
            log::debug!("failed to toggle root class {class}: {err:?}");
        }
    }
}

fn detach(element: &Element, closure: &EndClosure) {
    for name in END_EVENTS {
        let _ = element.remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
    }
}

impl Drop for WebHost {
    fn drop(&mut self) {
        self.disconnect_mutations();
        for (element, closure) in self.end_listeners.drain(..) {
            detach(&element, &closure);
        }
    }
}
