// Copyright 2026 the fxgov Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, Chrome trace export, and overlay JSON for
//! fxgov diagnostics.
//!
//! This crate provides [`TraceSink`](fxgov_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: compact binary recording with
//!   [`recorder::decode`] for playback. [`recorder::SharedRecorder`] keeps
//!   the bytes reachable while the governor owns the sink.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from recorded
//!   bytes.
//!
//! [`overlay`] turns [`GovernorMetrics`](fxgov_core::GovernorMetrics) into
//! JSON for on-page debug displays.
//!
//! ```ignore
//! let recorder = SharedRecorder::new();
//! governor.set_trace_sink(Box::new(recorder.clone()));
//! // ... run ...
//! chrome::export(&recorder.snapshot(), &mut std::fs::File::create("trace.json")?)?;
//! ```

pub mod chrome;
pub mod overlay;
pub mod pretty;
pub mod recorder;

#[cfg(test)]
mod tests {
    use fxgov_core::capability::HostProbe;
    use fxgov_core::config::GovernorConfig;
    use fxgov_core::memory::MemoryHost;
    use fxgov_core::time::Duration;
    use fxgov_core::trace::{LifecyclePhase, SweepTrigger};
    use fxgov_core::{Governor, OptimizationTier};

    use crate::recorder::{RecordedEvent, SharedRecorder, decode};

    fn desktop() -> HostProbe {
        HostProbe {
            webgl: true,
            backdrop_filter: true,
            transform_3d: true,
            hardware_concurrency: Some(8),
            memory_limit_mb: Some(2048.0),
            prefers_reduced_motion: false,
            user_agent: Some(String::from("Mozilla/5.0 (X11; Linux x86_64)")),
            viewport_width: Some(1440.0),
        }
    }

    #[test]
    fn records_a_degrading_session() {
        let recorder = SharedRecorder::new();
        let mut gov = Governor::new(MemoryHost::with_probe(desktop()), GovernorConfig::default())
            .unwrap();
        gov.set_trace_sink(Box::new(recorder.clone()));
        gov.init();

        // Three windows at 25 fps.
        for _ in 0..75 {
            for event in gov.host_mut().advance(Duration::from_millis(40)) {
                gov.handle_event(event);
            }
        }
        gov.destroy();

        let events: Vec<_> = decode(&recorder.snapshot()).collect();

        let tiers: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                RecordedEvent::TierChange(t) => Some((t.from, t.to)),
                _ => None,
            })
            .collect();
        assert_eq!(
            tiers,
            [
                (None, OptimizationTier::High),
                (Some(OptimizationTier::High), OptimizationTier::Medium),
            ]
        );

        let metrics = events
            .iter()
            .filter(|e| matches!(e, RecordedEvent::Metrics(m) if !m.is_optimized))
            .count();
        assert_eq!(metrics, 3);

        assert!(events.iter().any(|e| matches!(
            e,
            RecordedEvent::FallbackSweep(s) if s.trigger == SweepTrigger::SustainedDegradation
        )));
        assert!(matches!(
            events.last(),
            Some(RecordedEvent::Lifecycle(l)) if l.phase == LifecyclePhase::Destroy
        ));

        let mut json = Vec::new();
        crate::chrome::export(&recorder.snapshot(), &mut json).unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_slice(&json).unwrap();
        assert!(parsed.len() > events.len());
    }
}
