// Copyright 2026 the fxgov Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Optimization tiers and the root tokens and classes each one writes.
//!
//! Applying a tier rewrites every token and marker class in the tables
//! below, so switching tiers never leaves another tier's values behind.
//! Feature classes are orthogonal to the tier and follow the
//! [`CapabilitySnapshot`] alone.

use core::fmt;

use crate::capability::CapabilitySnapshot;
use crate::host::Host;

/// Animation and transition duration tokens.
pub const DURATION_TOKENS: [&str; 4] = [
    "--duration-fast",
    "--duration-normal",
    "--duration-slow",
    "--transition-duration",
];

/// Blur radius tokens.
pub const BLUR_TOKENS: [&str; 3] = ["--blur-sm", "--blur-md", "--blur-lg"];

/// Stagger-delay increment tokens.
pub const STAGGER_TOKENS: [&str; 3] = ["--stagger-1", "--stagger-2", "--stagger-3"];

const MEDIUM_DURATIONS: [&str; 4] = ["150ms", "200ms", "300ms", "200ms"];
const MEDIUM_BLURS: [&str; 3] = ["4px", "8px", "12px"];
const MEDIUM_STAGGERS: [&str; 3] = ["50ms", "100ms", "150ms"];

/// Root class marking reduced motion.
pub const CLASS_REDUCED_MOTION: &str = "reduced-motion";
/// Root class suppressing glass effects.
pub const CLASS_NO_GLASS: &str = "no-glass-effects";
/// Root class suppressing parallax.
pub const CLASS_NO_PARALLAX: &str = "no-parallax";
/// Root class marking the high tier.
pub const CLASS_HIGH_PERFORMANCE: &str = "high-performance";

const TIER_CLASSES: [&str; 4] = [
    CLASS_REDUCED_MOTION,
    CLASS_NO_GLASS,
    CLASS_NO_PARALLAX,
    CLASS_HIGH_PERFORMANCE,
];

/// Root class set when compositing blur is unsupported.
pub const CLASS_NO_BACKDROP_FILTER: &str = "no-backdrop-filter";
/// Root class set when graphics acceleration is unavailable.
pub const CLASS_NO_WEBGL: &str = "no-webgl";
/// Root class set when 3D transforms are unsupported.
pub const CLASS_NO_3D_TRANSFORMS: &str = "no-3d-transforms";

/// How much visual effect is permitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OptimizationTier {
    /// Motion suppressed.
    Low,
    /// Shortened durations, reduced blur, capped stagger.
    Medium,
    /// Full effects.
    High,
}

impl OptimizationTier {
    /// Lowercase name, as used in logs and exports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Marker classes present on the root while this tier is applied.
    #[must_use]
    pub const fn root_classes(self) -> &'static [&'static str] {
        match self {
            Self::Low => &[CLASS_REDUCED_MOTION, CLASS_NO_GLASS, CLASS_NO_PARALLAX],
            Self::Medium => &[],
            Self::High => &[CLASS_HIGH_PERFORMANCE],
        }
    }

    /// Value of a root token under this tier. `None` means the override is
    /// removed and the stylesheet default applies.
    #[must_use]
    pub fn token_value(self, token: &str) -> Option<&'static str> {
        match self {
            Self::Low => DURATION_TOKENS.contains(&token).then_some("0ms"),
            Self::Medium => lookup(&DURATION_TOKENS, &MEDIUM_DURATIONS, token)
                .or_else(|| lookup(&BLUR_TOKENS, &MEDIUM_BLURS, token))
                .or_else(|| lookup(&STAGGER_TOKENS, &MEDIUM_STAGGERS, token)),
            Self::High => None,
        }
    }

    /// Writes this tier's tokens and marker classes to the document root.
    pub fn apply<H: Host>(self, host: &mut H) {
        for token in DURATION_TOKENS.iter().chain(&BLUR_TOKENS).chain(&STAGGER_TOKENS) {
            host.set_root_token(token, self.token_value(token));
        }
        let active = self.root_classes();
        for class in TIER_CLASSES {
            host.set_root_class(class, active.contains(&class));
        }
    }
}

impl fmt::Display for OptimizationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn lookup(names: &[&str], values: &[&'static str], token: &str) -> Option<&'static str> {
    names
        .iter()
        .position(|name| *name == token)
        .and_then(|i| values.get(i).copied())
}

/// Toggles the no-support marker classes from the snapshot.
pub fn apply_feature_classes<H: Host>(host: &mut H, capabilities: &CapabilitySnapshot) {
    host.set_root_class(CLASS_NO_BACKDROP_FILTER, !capabilities.backdrop_filter);
    host.set_root_class(CLASS_NO_WEBGL, !capabilities.webgl);
    host.set_root_class(CLASS_NO_3D_TRANSFORMS, !capabilities.transform_3d);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::HostProbe;
    use crate::memory::MemoryHost;

    #[test]
    fn low_zeroes_durations_and_suppresses_effects() {
        let mut host = MemoryHost::new();
        OptimizationTier::Low.apply(&mut host);

        for token in DURATION_TOKENS {
            assert_eq!(host.root_token(token), Some("0ms"));
        }
        assert_eq!(host.root_token("--blur-md"), None);
        assert!(host.has_root_class(CLASS_REDUCED_MOTION));
        assert!(host.has_root_class(CLASS_NO_GLASS));
        assert!(host.has_root_class(CLASS_NO_PARALLAX));
        assert!(!host.has_root_class(CLASS_HIGH_PERFORMANCE));
    }

    #[test]
    fn medium_shortens_and_caps() {
        let mut host = MemoryHost::new();
        OptimizationTier::Medium.apply(&mut host);

        assert_eq!(host.root_token("--duration-fast"), Some("150ms"));
        assert_eq!(host.root_token("--duration-slow"), Some("300ms"));
        assert_eq!(host.root_token("--transition-duration"), Some("200ms"));
        assert_eq!(host.root_token("--blur-lg"), Some("12px"));
        assert_eq!(host.root_token("--stagger-1"), Some("50ms"));
        assert!(!host.has_root_class(CLASS_REDUCED_MOTION));
        assert!(!host.has_root_class(CLASS_HIGH_PERFORMANCE));
    }

    #[test]
    fn switching_tiers_clears_previous_values() {
        let mut host = MemoryHost::new();
        OptimizationTier::Medium.apply(&mut host);
        OptimizationTier::High.apply(&mut host);

        assert!(host.has_root_class(CLASS_HIGH_PERFORMANCE));
        for token in DURATION_TOKENS.iter().chain(&BLUR_TOKENS).chain(&STAGGER_TOKENS) {
            assert_eq!(host.root_token(token), None, "{token} left behind");
        }

        OptimizationTier::Low.apply(&mut host);
        assert!(!host.has_root_class(CLASS_HIGH_PERFORMANCE));
    }

    #[test]
    fn feature_classes_follow_snapshot() {
        let mut host = MemoryHost::new();
        let snapshot = CapabilitySnapshot::from_probe(&HostProbe {
            webgl: true,
            backdrop_filter: false,
            transform_3d: true,
            ..HostProbe::default()
        });
        apply_feature_classes(&mut host, &snapshot);

        assert!(host.has_root_class(CLASS_NO_BACKDROP_FILTER));
        assert!(!host.has_root_class(CLASS_NO_WEBGL));
        assert!(!host.has_root_class(CLASS_NO_3D_TRANSFORMS));
    }
}
