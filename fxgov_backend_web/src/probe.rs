// Copyright 2026 the fxgov Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser feature queries.

use alloc::string::String;

use fxgov_core::capability::HostProbe;
use wasm_bindgen::{JsCast as _, JsValue};
use web_sys::{Document, HtmlCanvasElement, Window};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Answers every feature query the capability detector needs. Queries the
/// browser cannot answer come back as `false` or `None`.
pub(crate) fn probe(window: &Window, document: &Document) -> HostProbe {
    let navigator = window.navigator();
    let concurrency = navigator.hardware_concurrency();
    HostProbe {
        webgl: supports_webgl(document),
        backdrop_filter: supports("backdrop-filter", "blur(1px)")
            || supports("-webkit-backdrop-filter", "blur(1px)"),
        transform_3d: supports("transform", "translateZ(0)"),
        hardware_concurrency: (concurrency.is_finite() && concurrency >= 1.0).then(|| {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "navigator.hardwareConcurrency is a small positive integer"
            )]
            let cores = concurrency as u32;
            cores
        }),
        memory_limit_mb: heap_field(window, "jsHeapSizeLimit"),
        prefers_reduced_motion: prefers_reduced_motion(window),
        user_agent: navigator.user_agent().ok().filter(|ua: &String| !ua.is_empty()),
        viewport_width: window.inner_width().ok().and_then(|w| w.as_f64()),
    }
}

fn supports(property: &str, value: &str) -> bool {
    web_sys::css::supports_with_value(property, value).unwrap_or(false)
}

fn supports_webgl(document: &Document) -> bool {
    let Some(canvas) = document
        .create_element("canvas")
        .ok()
        .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
    else {
        return false;
    };
    ["webgl", "experimental-webgl"]
        .iter()
        .any(|kind| matches!(canvas.get_context(kind), Ok(Some(_))))
}

fn prefers_reduced_motion(window: &Window) -> bool {
    matches!(
        window.match_media("(prefers-reduced-motion: reduce)"),
        Ok(Some(query)) if query.matches()
    )
}

/// Reads a field of the non-standard `performance.memory` object, in MB.
pub(crate) fn heap_field(window: &Window, field: &str) -> Option<f64> {
    let performance = window.performance()?;
    let memory = js_sys::Reflect::get(&performance, &JsValue::from_str("memory")).ok()?;
    if memory.is_undefined() || memory.is_null() {
        return None;
    }
    let bytes = js_sys::Reflect::get(&memory, &JsValue::from_str(field))
        .ok()?
        .as_f64()?;
    (bytes.is_finite() && bytes >= 0.0).then_some(bytes / BYTES_PER_MB)
}
