// Copyright 2026 the fxgov Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Routing of browser callbacks back into the governor.
//!
//! Every closure handed to the browser holds a clone of the same
//! [`DispatchSlot`]. The slot holds a handler installed by
//! [`WebGovernor`](crate::WebGovernor) that only keeps a weak reference to
//! the governor, so pending browser callbacks never keep it alive. Once the
//! slot is cleared, late callbacks are dropped.

use alloc::rc::Rc;
use core::cell::RefCell;

use fxgov_core::host::HostEvent;
use web_sys::Element;

type Handler = Rc<dyn Fn(HostEvent<Element>)>;

/// Shared, clearable handler for host events.
#[derive(Clone, Default)]
pub(crate) struct DispatchSlot(Rc<RefCell<Option<Handler>>>);

impl DispatchSlot {
    pub(crate) fn install(&self, handler: impl Fn(HostEvent<Element>) + 'static) {
        *self.0.borrow_mut() = Some(Rc::new(handler));
    }

    pub(crate) fn clear(&self) {
        self.0.borrow_mut().take();
    }

    /// Hands the event to the installed handler, if any. The slot is not
    /// borrowed while the handler runs.
    pub(crate) fn deliver(&self, event: HostEvent<Element>) {
        let handler = self.0.borrow().clone();
        match handler {
            Some(handler) => handler(event),
            None => log::debug!("dropping host event with no governor attached"),
        }
    }
}

impl core::fmt::Debug for DispatchSlot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DispatchSlot")
            .field("attached", &self.0.borrow().is_some())
            .finish()
    }
}
