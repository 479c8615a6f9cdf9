// Copyright 2026 the fxgov Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Effect substitution.
//!
//! The [`FallbackSystem`] maps expensive effect classes to cheaper ones. A
//! sweep visits every element matching the scan selector and, for each
//! registered complex class on the element, swaps it for its simple
//! counterpart. Substitutions on one element are independent of each other.

use alloc::collections::BTreeMap;
use alloc::string::String;

use crate::config::FallbackConfig;
use crate::host::Host;

/// Built-in complex → simple pairs.
pub const DEFAULT_FALLBACKS: &[(&str, &str)] = &[
    ("animate-blur-in", "animate-fade-in"),
    ("animate-bounce-in", "animate-fade-in"),
    ("animate-float", "animate-none"),
    ("animate-glass-shimmer", "animate-none"),
    ("animate-parallax", "animate-none"),
    ("animate-pulse-glow", "animate-pulse"),
    ("animate-scale-rotate", "animate-scale-in"),
    ("animate-slide-up-stagger", "animate-fade-in"),
];

/// Registry of effect fallbacks plus the document sweep.
#[derive(Clone, Debug)]
pub struct FallbackSystem {
    scan_selector: String,
    map: BTreeMap<String, String>,
}

impl FallbackSystem {
    /// Creates a system seeded with [`DEFAULT_FALLBACKS`] and the configured
    /// extras. Extras override built-in entries with the same key.
    #[must_use]
    pub fn new(config: &FallbackConfig) -> Self {
        let mut system = Self {
            scan_selector: config.scan_selector.clone(),
            map: BTreeMap::new(),
        };
        for (complex, simple) in DEFAULT_FALLBACKS {
            system.add_fallback(*complex, *simple);
        }
        for (complex, simple) in &config.extra {
            system.add_fallback(complex.as_str(), simple.as_str());
        }
        system
    }

    /// Registers (or replaces) a fallback.
    pub fn add_fallback(&mut self, complex: impl Into<String>, simple: impl Into<String>) {
        self.map.insert(complex.into(), simple.into());
    }

    /// Returns the registered substitute for a class.
    #[must_use]
    pub fn fallback_for(&self, complex: &str) -> Option<&str> {
        self.map.get(complex).map(String::as_str)
    }

    /// Number of registered pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Substitutes registered classes across the document.
    ///
    /// Returns the number of substitutions made.
    pub fn apply_to_document<H: Host>(&self, host: &mut H) -> usize {
        let mut substitutions = 0;
        for element in host.query_all(None, &self.scan_selector) {
            let present = host.class_names(&element);
            for class in &present {
                if let Some(simple) = self.map.get(class) {
                    host.set_class(&element, class, false);
                    host.set_class(&element, simple, true);
                    substitutions += 1;
                }
            }
        }
        if substitutions > 0 {
            log::debug!("fallback sweep substituted {substitutions} classes");
        }
        substitutions
    }
}

impl Default for FallbackSystem {
    fn default() -> Self {
        Self::new(&FallbackConfig::default())
    }
}
