// Copyright 2026 the fxgov Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame clock and timers.
//!
//! The frame clock is `requestAnimationFrame`. Each callback receives a
//! [`DOMHighResTimeStamp`][mdn] in milliseconds, converted to microsecond
//! [`HostTime`] before it reaches the governor. Timers are `setTimeout`
//! one-shots whose callbacks are held until they fire or are cancelled.
//!
//! [mdn]: https://developer.mozilla.org/en-US/docs/Web/API/DOMHighResTimeStamp

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;

use fxgov_core::host::{FrameRequest, HostEvent, TimerId};
use fxgov_core::time::{Duration, HostTime};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use crate::dispatch::DispatchSlot;

// Direct global bindings instead of `web_sys::Window` methods, so the hot
// per-frame path does not go through the Window object.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);

    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(callback: &JsValue, delay_ms: i32) -> i32;

    #[wasm_bindgen(js_name = "clearTimeout")]
    fn clear_timeout(id: i32);
}

/// Current host time from `performance.now()`.
pub(crate) fn now() -> HostTime {
    HostTime::from_millis_f64(performance_now())
}

type FrameClosure = Closure<dyn FnMut(f64)>;

/// Re-usable `requestAnimationFrame` callback that forwards each frame as
/// [`HostEvent::Frame`].
pub(crate) struct FrameClock {
    closure: FrameClosure,
}

impl FrameClock {
    pub(crate) fn new(dispatch: DispatchSlot) -> Self {
        let closure = Closure::wrap(Box::new(move |timestamp_ms: f64| {
            dispatch.deliver(HostEvent::Frame(HostTime::from_millis_f64(timestamp_ms)));
        }) as Box<dyn FnMut(f64)>);
        Self { closure }
    }

    pub(crate) fn request(&self) -> FrameRequest {
        let id = request_animation_frame(self.closure.as_ref().unchecked_ref());
        FrameRequest(id.cast_unsigned())
    }

    pub(crate) fn cancel(request: FrameRequest) {
        cancel_animation_frame(request.0.cast_signed());
    }
}

impl core::fmt::Debug for FrameClock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameClock").finish_non_exhaustive()
    }
}

/// Lifecycle of one armed timer, shared with its browser callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TimerState {
    Armed,
    Running,
    Done,
}

/// Keeps each timer's callback alive until it has fired or been cancelled.
///
/// A callback is only released once it is [`Done`](TimerState::Done), so a
/// timer cancelled from inside its own callback is dropped after the callback
/// returns, on the next [`insert`](Self::insert) or [`cancel`](Self::cancel).
pub(crate) struct TimerTable<C> {
    entries: Vec<(TimerId, Rc<Cell<TimerState>>, C)>,
}

impl<C> TimerTable<C> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, id: TimerId, state: Rc<Cell<TimerState>>, callback: C) {
        self.prune();
        self.entries.push((id, state, callback));
    }

    /// Marks the timer finished if it has not started, then releases every
    /// finished callback.
    pub(crate) fn cancel(&mut self, id: TimerId) {
        for (_, state, _) in self.entries.iter().filter(|(timer, _, _)| *timer == id) {
            if state.get() == TimerState::Armed {
                state.set(TimerState::Done);
            }
        }
        self.prune();
    }

    /// Ids of timers whose callbacks have not started.
    pub(crate) fn armed(&self) -> impl Iterator<Item = TimerId> + '_ {
        self.entries
            .iter()
            .filter(|(_, state, _)| state.get() == TimerState::Armed)
            .map(|(id, _, _)| *id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    fn prune(&mut self) {
        self.entries
            .retain(|(_, state, _)| state.get() != TimerState::Done);
    }
}

type TimerClosure = Closure<dyn FnMut()>;

/// One-shot `setTimeout` timers that deliver [`HostEvent::Timeout`] with the
/// browser's own handle as the [`TimerId`].
pub(crate) struct Timers {
    dispatch: DispatchSlot,
    table: TimerTable<TimerClosure>,
}

impl Timers {
    pub(crate) fn new(dispatch: DispatchSlot) -> Self {
        Self {
            dispatch,
            table: TimerTable::new(),
        }
    }

    pub(crate) fn schedule(&mut self, delay: Duration) -> TimerId {
        let handle = Rc::new(Cell::new(0_i32));
        let state = Rc::new(Cell::new(TimerState::Armed));
        let closure = {
            let dispatch = self.dispatch.clone();
            let handle = Rc::clone(&handle);
            let state = Rc::clone(&state);
            Closure::wrap(Box::new(move || {
                state.set(TimerState::Running);
                dispatch.deliver(HostEvent::Timeout(TimerId(handle.get().cast_unsigned())));
                state.set(TimerState::Done);
            }) as Box<dyn FnMut()>)
        };
        let delay_ms = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        let raw = set_timeout(closure.as_ref().unchecked_ref(), delay_ms);
        handle.set(raw);
        let id = TimerId(raw.cast_unsigned());
        self.table.insert(id, state, closure);
        id
    }

    pub(crate) fn cancel(&mut self, timer: TimerId) {
        clear_timeout(timer.0.cast_signed());
        self.table.cancel(timer);
    }
}

impl core::fmt::Debug for Timers {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Timers")
            .field("held", &self.table.len())
            .finish_non_exhaustive()
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        // The browser must not call into a dropped closure.
        for timer in self.table.armed() {
            clear_timeout(timer.0.cast_signed());
        }
    }
}
