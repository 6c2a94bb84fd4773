//! Headless replay engine.
//!
//! One [`Engine`] exclusively owns one trace and its state store. Deltas
//! are applied synchronously; timing belongs to the caller.

use crate::event::EngineEvent;
use crate::handlers::Cue;
use crate::interpreter::{DeltaInterpreter, StepReport};
use crate::overlay::OverlayLayer;
use crate::store::{Snapshot, StateStore};
use serde::{Deserialize, Serialize};
use svl_core::{AuxiliaryView, CoreResult, Frame, Trace};
use tokio::sync::broadcast;

/// Event channel capacity; slow subscribers past this lag and skip events
const EVENT_CAPACITY: usize = 1024;

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Drop delta-scoped overlays when the next delta begins
    pub transient_overlays_per_delta: bool,
    /// Log unknown operation names at warn level
    pub log_unknown_ops: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            transient_overlays_per_delta: true,
            log_unknown_ops: true,
        }
    }
}

#[derive(Debug)]
struct Loaded {
    trace: Trace,
    store: StateStore,
    current_frame: usize,
}

/// Replay engine over a single trace
#[derive(Debug)]
pub struct Engine {
    interpreter: DeltaInterpreter,
    loaded: Option<Loaded>,
    events: broadcast::Sender<EngineEvent>,
}

impl Engine {
    /// Create an engine with no trace loaded
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            interpreter: DeltaInterpreter::new(config),
            loaded: None,
            events,
        }
    }

    /// Subscribe to engine events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: EngineEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Replace the current trace and start from its initial frame
    pub fn load_trace(&mut self, trace: Trace) {
        tracing::info!(
            algorithm = %trace.algorithm.name,
            kind = %trace.kind(),
            deltas = trace.len(),
            "trace loaded"
        );
        let store = StateStore::new(&trace.initial_frame);
        self.loaded = Some(Loaded {
            trace,
            store,
            current_frame: 0,
        });
        self.announce_initial();
    }

    /// Parse, validate, and load a JSON document
    ///
    /// # Errors
    ///
    /// Returns error if the document fails validation; the current trace
    /// is left untouched
    pub fn load_json(&mut self, text: &str) -> CoreResult<()> {
        let trace = Trace::from_json_str(text)?;
        self.load_trace(trace);
        Ok(())
    }

    fn announce_initial(&self) {
        let Some(loaded) = &self.loaded else {
            return;
        };
        let frame = loaded.store.current_state();
        self.emit(EngineEvent::StateInitialized { frame: frame.clone() });
        if let Some(line) = frame.code_highlight {
            self.emit(EngineEvent::CodeHighlightChanged { line: Some(line) });
        }
    }

    /// Apply the delta at the current frame
    ///
    /// Returns `None` without a trace or at the end.
    pub fn step(&mut self) -> Option<StepReport> {
        let loaded = self.loaded.as_mut()?;
        let index = loaded.current_frame;
        let delta = loaded.trace.deltas.get(index)?;

        let mut report = self.interpreter.apply(&mut loaded.store, index, delta);
        loaded.current_frame += 1;

        let total = loaded.trace.len();
        let at_end = loaded.current_frame == total;
        let highlight = delta.code_highlight.map(|_| loaded.store.code_highlight());
        if at_end {
            report.cues.push(Cue::Complete);
        }

        for skipped in &report.skipped {
            self.emit(EngineEvent::OperationSkipped {
                delta: index,
                name: skipped.name.clone(),
                reason: skipped.reason.clone(),
            });
        }
        for cue in &report.cues {
            self.emit(EngineEvent::Cue { cue: cue.clone() });
        }
        if let Some(line) = highlight {
            self.emit(EngineEvent::CodeHighlightChanged { line });
        }
        self.emit(EngineEvent::FrameAdvanced {
            index: index + 1,
            total,
        });
        if at_end {
            tracing::info!(total, "reached end of trace");
        }
        Some(report)
    }

    /// Move to frame `target`, clamped to `[0, total]`
    ///
    /// Moving backward restores the initial frame and replays forward.
    /// Returns the frame reached.
    pub fn seek(&mut self, target: usize) -> usize {
        let target = target.min(self.total_frames());
        if target < self.current_frame() {
            self.reset();
        }
        while self.current_frame() < target {
            if self.step().is_none() {
                break;
            }
        }
        self.current_frame()
    }

    /// Apply every remaining delta with no delay
    pub fn run_to_end(&mut self) -> Vec<StepReport> {
        std::iter::from_fn(|| self.step()).collect()
    }

    /// Restore the initial frame and clear every overlay
    ///
    /// Idempotent; a no-op without a trace.
    pub fn reset(&mut self) {
        let Some(loaded) = self.loaded.as_mut() else {
            return;
        };
        loaded.store.restore(&loaded.trace.initial_frame);
        loaded.current_frame = 0;
        tracing::info!("engine reset");
        self.announce_initial();
    }

    /// Whether a trace is loaded
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Number of deltas applied
    #[must_use]
    pub fn current_frame(&self) -> usize {
        self.loaded.as_ref().map_or(0, |l| l.current_frame)
    }

    /// Number of deltas in the trace
    #[must_use]
    pub fn total_frames(&self) -> usize {
        self.loaded.as_ref().map_or(0, |l| l.trace.len())
    }

    /// Whether every delta has been applied
    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.loaded
            .as_ref()
            .is_some_and(|l| l.current_frame == l.trace.len())
    }

    /// Current frame
    #[must_use]
    pub fn current_state(&self) -> Option<&Frame> {
        self.loaded.as_ref().map(|l| l.store.current_state())
    }

    /// Current auxiliary views
    #[must_use]
    pub fn aux_views(&self) -> &[AuxiliaryView] {
        self.loaded
            .as_ref()
            .map(|l| l.store.current_aux_views())
            .unwrap_or_default()
    }

    /// Live overlays
    #[must_use]
    pub fn overlays(&self) -> Option<&OverlayLayer> {
        self.loaded.as_ref().map(|l| l.store.overlays())
    }

    /// Deep copy of the current frame and overlays
    #[must_use]
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.loaded
            .as_ref()
            .map(|l| l.store.snapshot(l.current_frame))
    }

    /// Loaded trace
    #[must_use]
    pub fn trace(&self) -> Option<&Trace> {
        self.loaded.as_ref().map(|l| &l.trace)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Value};
    use svl_core::Structure;
    use tokio::sync::broadcast::error::TryRecvError;

    fn sort_trace() -> Value {
        json!({
            "algorithm": {"name": "bubble", "pseudocode": ["compare", "swap"]},
            "initial_frame": {
                "data_state": {
                    "type": "array",
                    "structure": [{"value": 5, "styleKey": "idle"}, {"value": 3, "styleKey": "idle"}]
                },
                "code_highlight": 0
            },
            "deltas": [
                {
                    "code_highlight": 0,
                    "operations": [{"op": "updateStyle", "params": {"indices": [0, 1], "styleKey": "comparing"}}]
                },
                {
                    "code_highlight": 1,
                    "operations": [
                        {"op": "moveElements", "params": {"pairs": [{"fromIndex": 0, "toIndex": 1}, {"fromIndex": 1, "toIndex": 0}]}},
                        {"op": "updateBoundary", "params": {"type": "sorted", "range": [1, 1]}}
                    ]
                }
            ]
        })
    }

    fn engine() -> Engine {
        let mut engine = Engine::default();
        engine.load_json(&sort_trace().to_string()).unwrap();
        engine
    }

    fn values(engine: &Engine) -> Vec<Value> {
        match &engine.current_state().unwrap().data_state.structure {
            Structure::Array(items) => items.iter().map(|e| e.value.clone()).collect(),
            _ => panic!("expected array"),
        }
    }

    #[test]
    fn test_step_through_scenario() {
        let mut engine = engine();
        assert_eq!(engine.total_frames(), 2);

        let report = engine.step().unwrap();
        assert_eq!(report.delta, 0);
        assert_eq!(report.applied, 1);
        assert_eq!(values(&engine), vec![json!(5), json!(3)]);

        engine.step().unwrap();
        assert_eq!(values(&engine), vec![json!(3), json!(5)]);
        assert!(engine.is_at_end());
        assert_eq!(engine.current_state().unwrap().code_highlight, Some(1));
        assert!(engine.step().is_none());
    }

    #[test]
    fn test_without_trace() {
        let mut engine = Engine::default();
        assert!(engine.step().is_none());
        engine.reset();
        assert_eq!(engine.seek(5), 0);
        assert!(!engine.is_at_end());
        assert!(engine.aux_views().is_empty());
        assert!(engine.snapshot().is_none());
    }

    #[test]
    fn test_failed_load_keeps_current_trace() {
        let mut engine = engine();
        engine.step();
        let before = engine.snapshot();
        assert!(engine.load_json(r#"{"algorithm": {}, "deltas": []}"#).is_err());
        assert_eq!(engine.snapshot(), before);
        assert_eq!(engine.current_frame(), 1);
    }

    #[test]
    fn test_seek_clamps_and_rewinds() {
        let mut engine = engine();
        assert_eq!(engine.seek(10), 2);
        assert_eq!(values(&engine), vec![json!(3), json!(5)]);
        assert_eq!(engine.seek(1), 1);
        assert_eq!(values(&engine), vec![json!(5), json!(3)]);
        assert_eq!(engine.overlays().unwrap().len(), 0);
        assert_eq!(engine.seek(0), 0);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut engine = engine();
        let initial = engine.snapshot();
        engine.run_to_end();
        engine.reset();
        engine.reset();
        assert_eq!(engine.snapshot(), initial);
        assert_eq!(engine.current_state().unwrap().code_highlight, Some(0));
    }

    #[test]
    fn test_events() {
        let mut engine = Engine::default();
        let mut rx = engine.subscribe();
        engine.load_json(&sort_trace().to_string()).unwrap();
        engine.run_to_end();

        let mut events = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => break,
                Err(other) => panic!("unexpected {:?}", other),
            }
        }

        assert!(matches!(events[0], EngineEvent::StateInitialized { .. }));
        assert_eq!(events[1], EngineEvent::CodeHighlightChanged { line: Some(0) });
        assert!(events.contains(&EngineEvent::FrameAdvanced { index: 2, total: 2 }));
        assert!(events.contains(&EngineEvent::Cue { cue: Cue::Compare }));
        assert_eq!(
            events.last(),
            Some(&EngineEvent::FrameAdvanced { index: 2, total: 2 })
        );
        assert!(events.contains(&EngineEvent::Cue { cue: Cue::Complete }));
    }

    #[test]
    fn test_skips_are_published() {
        let mut doc = sort_trace();
        doc["deltas"][0]["operations"] = json!([{"op": "removeBoundary", "params": {"type": "none"}}]);
        let mut engine = Engine::default();
        engine.load_json(&doc.to_string()).unwrap();
        let mut rx = engine.subscribe();
        engine.step();

        let skipped = std::iter::from_fn(|| rx.try_recv().ok())
            .find(|e| matches!(e, EngineEvent::OperationSkipped { .. }));
        assert!(matches!(
            skipped,
            Some(EngineEvent::OperationSkipped { delta: 0, ref name, .. }) if name == "removeBoundary"
        ));
    }

    fn array_op() -> impl Strategy<Value = Value> {
        prop_oneof![
            (prop::collection::vec(-1i64..6, 0..4), "[a-z]{1,6}")
                .prop_map(|(indices, style)| json!({"op": "updateStyle", "params": {"indices": indices, "styleKey": style}})),
            (-1i64..6, -20i64..20)
                .prop_map(|(index, value)| json!({"op": "updateValues", "params": {"updates": [{"index": index, "value": value}]}})),
            (0i64..6, 0i64..6)
                .prop_map(|(a, b)| json!({"op": "moveElements", "params": {"pairs": [{"fromIndex": a, "toIndex": b}, {"fromIndex": b, "toIndex": a}]}})),
            (0i64..6, 0i64..6)
                .prop_map(|(a, b)| json!({"op": "updateBoundary", "params": {"type": "w", "range": [a.min(b), a.max(b)]}})),
            Just(json!({"op": "removeBoundary", "params": {"type": "w"}})),
            (-1i64..3).prop_map(|v| json!({"op": "appendToList", "params": {"view_id": "seen", "value": v}})),
            Just(json!({"op": "popFromList", "params": {"view_id": "seen", "from": "head"}})),
        ]
    }

    fn array_trace() -> impl Strategy<Value = Value> {
        (
            prop::collection::vec(-20i64..20, 0..6),
            prop::collection::vec(prop::collection::vec(array_op(), 0..4), 0..8),
        )
            .prop_map(|(values, deltas)| {
                let structure: Vec<Value> = values.iter().map(|v| json!({"value": v, "styleKey": "idle"})).collect();
                let deltas: Vec<Value> = deltas
                    .into_iter()
                    .enumerate()
                    .map(|(i, ops)| json!({"code_highlight": i, "operations": ops}))
                    .collect();
                json!({
                    "algorithm": {"name": "generated"},
                    "initial_frame": {"data_state": {"type": "array", "structure": structure}},
                    "deltas": deltas
                })
            })
    }

    proptest! {
        #[test]
        fn prop_reset_then_replay_matches_fresh_load(doc in array_trace()) {
            let text = doc.to_string();

            let mut fresh = Engine::default();
            fresh.load_json(&text).unwrap();
            fresh.run_to_end();

            let mut replayed = Engine::default();
            replayed.load_json(&text).unwrap();
            replayed.run_to_end();
            replayed.reset();
            replayed.run_to_end();

            prop_assert_eq!(fresh.snapshot(), replayed.snapshot());
            prop_assert!(fresh.is_at_end());
        }

        #[test]
        fn prop_stepwise_and_seek_agree(doc in array_trace()) {
            let text = doc.to_string();

            let mut stepped = Engine::default();
            stepped.load_json(&text).unwrap();
            while stepped.step().is_some() {}

            let mut sought = Engine::default();
            sought.load_json(&text).unwrap();
            let total = sought.total_frames();
            sought.seek(total / 2);
            sought.seek(total);

            prop_assert_eq!(stepped.current_frame(), total);
            prop_assert_eq!(stepped.snapshot(), sought.snapshot());
        }
    }
}
