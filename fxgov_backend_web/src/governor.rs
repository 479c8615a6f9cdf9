// Copyright 2026 the fxgov Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser-owned governor handle.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::string::String;
use core::cell::RefCell;

use fxgov_core::config::GovernorConfig;
use fxgov_core::governor::{Governor, GovernorMetrics};
use fxgov_core::monitor::PerformanceMetrics;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use web_sys::Document;

use crate::host::{WebHost, WebHostError};

const READY_EVENT: &str = "DOMContentLoaded";

type Shared = Rc<RefCell<Governor<WebHost>>>;

/// A [`Governor`] wired to the current page.
///
/// Browser callbacks reach the governor through a weak reference, so
/// dropping the handle tears everything down and late callbacks become
/// no-ops.
///
/// Metrics subscribers run while the governor is borrowed; they must not
/// call back into this handle.
pub struct WebGovernor {
    inner: Shared,
    ready_listener: Option<(Document, Closure<dyn FnMut()>)>,
}

impl core::fmt::Debug for WebGovernor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebGovernor")
            .field("governor", &self.inner)
            .field("awaiting_ready", &self.ready_listener.is_some())
            .finish()
    }
}

impl WebGovernor {
    /// Creates a governor with the default configuration.
    ///
    /// # Errors
    ///
    /// See [`with_config`](Self::with_config).
    pub fn new() -> Result<Self, WebHostError> {
        Self::with_config(GovernorConfig::default())
    }

    /// Creates a governor bound to the current document. Nothing is written
    /// to the page until [`init`](Self::init).
    ///
    /// # Errors
    ///
    /// Returns a [`WebHostError`] if the browser globals are missing or the
    /// configuration is invalid.
    pub fn with_config(config: GovernorConfig) -> Result<Self, WebHostError> {
        let host = WebHost::new()?;
        let dispatch = host.dispatch().clone();
        let inner: Shared = Rc::new(RefCell::new(Governor::new(host, config)?));
        let weak = Rc::downgrade(&inner);
        dispatch.install(move |event| {
            let Some(governor) = weak.upgrade() else {
                return;
            };
            match governor.try_borrow_mut() {
                Ok(mut governor) => governor.handle_event(event),
                Err(_) => log::debug!("governor busy, dropping re-entrant host event"),
            }
        });
        Ok(Self {
            inner,
            ready_listener: None,
        })
    }

    /// Creates a governor and initializes it once the document is ready.
    ///
    /// # Errors
    ///
    /// See [`with_config`](Self::with_config).
    pub fn install(config: GovernorConfig) -> Result<Self, WebHostError> {
        let mut governor = Self::with_config(config)?;
        governor.init_when_ready();
        Ok(governor)
    }

    /// Initializes now if the document has finished parsing, otherwise on
    /// `DOMContentLoaded`.
    pub fn init_when_ready(&mut self) {
        let document = self.inner.borrow().host().document().clone();
        if document.ready_state() != "loading" {
            self.init();
            return;
        }
        if self.ready_listener.is_some() {
            return;
        }
        let weak: Weak<RefCell<Governor<WebHost>>> = Rc::downgrade(&self.inner);
        let closure = Closure::wrap(Box::new(move || {
            if let Some(governor) = weak.upgrade() {
                governor.borrow_mut().init();
            }
        }) as Box<dyn FnMut()>);
        if let Err(err) =
            document.add_event_listener_with_callback(READY_EVENT, closure.as_ref().unchecked_ref())
        {
            log::debug!("failed to defer init: {err:?}");
            self.init();
            return;
        }
        self.ready_listener = Some((document, closure));
    }

    /// Applies optimizations and starts monitoring. No-op if already
    /// initialized.
    pub fn init(&self) {
        self.inner.borrow_mut().init();
    }

    /// Tears down monitoring and acceleration. [`init`](Self::init) may be
    /// called again afterwards.
    pub fn destroy(&self) {
        self.inner.borrow_mut().destroy();
    }

    /// Current state projection.
    #[must_use]
    pub fn metrics(&self) -> GovernorMetrics {
        self.inner.borrow().metrics()
    }

    /// The most recent full metrics report.
    #[must_use]
    pub fn latest_metrics(&self) -> Option<PerformanceMetrics> {
        self.inner.borrow().latest_metrics().copied()
    }

    /// Registers a subscriber for every future metrics report.
    pub fn on_metrics_update(&self, callback: impl FnMut(&PerformanceMetrics) + 'static) {
        self.inner.borrow_mut().on_metrics_update(callback);
    }

    /// Adds an active-animation token.
    pub fn track_animation(&self, id: impl Into<String>) {
        self.inner.borrow_mut().track_animation(id);
    }

    /// Removes an active-animation token.
    pub fn untrack_animation(&self, id: &str) {
        self.inner.borrow_mut().untrack_animation(id);
    }

    /// Registers (or replaces) an effect fallback.
    pub fn add_fallback(&self, complex: impl Into<String>, simple: impl Into<String>) {
        self.inner.borrow_mut().add_fallback(complex, simple);
    }

    /// Runs a fallback sweep now. Returns the number of substitutions.
    pub fn apply_fallbacks(&self) -> usize {
        self.inner.borrow_mut().apply_fallbacks()
    }
}

impl Drop for WebGovernor {
    fn drop(&mut self) {
        if let Some((document, closure)) = self.ready_listener.take() {
            let _ = document
                .remove_event_listener_with_callback(READY_EVENT, closure.as_ref().unchecked_ref());
        }
        if let Ok(mut governor) = self.inner.try_borrow_mut() {
            governor.host().dispatch().clear();
            governor.destroy();
        }
    }
}
