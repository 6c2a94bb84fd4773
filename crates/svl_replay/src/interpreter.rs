//! Delta interpreter.
//!
//! Applies one delta at a time: code highlight first, then every
//! operation in document order. Each handler commits before the next one
//! runs, so a delta is either fully applied or not started.

use crate::engine::EngineConfig;
use crate::handlers::{self, Cue, OpOutcome, SkipReason};
use crate::overlay::OverlayScope;
use crate::store::StateStore;
use serde::Serialize;
use svl_core::Delta;

/// An operation that changed nothing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedOp {
    /// Position of the operation in the flattened delta
    pub position: usize,
    /// Operation name
    pub name: String,
    /// Why it was skipped
    pub reason: String,
}

/// What one delta did once it was committed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// Index of the applied delta
    pub delta: usize,
    /// Operations that changed state or overlays
    pub applied: usize,
    /// Known operations that changed nothing
    pub skipped: Vec<SkippedOp>,
    /// Names outside the vocabulary
    pub unknown: Vec<String>,
    /// Presentation cues in operation order
    pub cues: Vec<Cue>,
}

impl StepReport {
    /// Total operations visited
    #[must_use]
    pub fn total(&self) -> usize {
        self.applied + self.skipped.len() + self.unknown.len()
    }
}

/// Applies deltas to a state store
#[derive(Debug, Clone, Default)]
pub struct DeltaInterpreter {
    config: EngineConfig,
}

impl DeltaInterpreter {
    /// Create an interpreter
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Apply delta number `index`
    pub fn apply(&self, store: &mut StateStore, index: usize, delta: &Delta) -> StepReport {
        if self.config.transient_overlays_per_delta {
            let dropped = store.overlays_mut().clear_scope(OverlayScope::Delta);
            if dropped > 0 {
                tracing::trace!(dropped, "cleared delta-scoped overlays");
            }
        }

        if let Some(meta) = &delta.meta {
            tracing::trace!(delta = index, keys = meta.len(), "delta meta");
        }
        if let Some(line) = delta.code_highlight {
            store.set_code_highlight(Some(line));
        }

        let mut report = StepReport {
            delta: index,
            ..StepReport::default()
        };

        for (position, op) in delta.ops().enumerate() {
            match handlers::apply(store, op) {
                OpOutcome::Applied(cue) => {
                    report.applied += 1;
                    report.cues.extend(cue);
                }
                OpOutcome::Skipped(SkipReason::Unknown(name)) => {
                    if self.config.log_unknown_ops {
                        tracing::warn!(delta = index, position, op = %name, "unknown operation skipped");
                    }
                    report.unknown.push(name);
                }
                OpOutcome::Skipped(reason) => {
                    tracing::debug!(delta = index, position, op = op.name(), %reason, "operation skipped");
                    report.skipped.push(SkippedOp {
                        position,
                        name: op.name().to_string(),
                        reason: reason.to_string(),
                    });
                }
            }
        }

        tracing::debug!(
            delta = index,
            applied = report.applied,
            skipped = report.skipped.len(),
            unknown = report.unknown.len(),
            "delta applied"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::OverlayCategory;
    use serde_json::json;
    use svl_core::{DataState, Frame, Operation};

    fn op(name: &str, params: serde_json::Value) -> Operation {
        Operation::decode(name, params).unwrap()
    }

    fn hash_store() -> StateStore {
        let state: DataState = serde_json::from_value(json!({
            "type": "hashtable",
            "structure": {"buckets": [{"items": []}, {"items": []}]}
        }))
        .unwrap();
        StateStore::new(&Frame::new(state))
    }

    #[test]
    fn test_report_counts() {
        let mut store = hash_store();
        let delta = Delta::from_ops([
            op("insertIntoBucket", json!({"bucket_index": 0, "element": {"key": "a", "value": 1}})),
            op("insertIntoBucket", json!({"bucket_index": 5, "element": {"key": "b"}})),
            op("teleport", json!({})),
        ])
        .with_code_highlight(3);

        let report = DeltaInterpreter::default().apply(&mut store, 0, &delta);
        assert_eq!(report.applied, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].position, 1);
        assert_eq!(report.unknown, vec!["teleport".to_string()]);
        assert_eq!(report.cues, vec![Cue::Add]);
        assert_eq!(report.total(), 3);
        assert_eq!(store.code_highlight(), Some(3));
    }

    #[test]
    fn test_groups_run_in_document_order() {
        let state: DataState = serde_json::from_value(json!({
            "type": "array",
            "structure": [{"value": 1}]
        }))
        .unwrap();
        let mut store = StateStore::new(&Frame::new(state));
        let delta = Delta::default().with_group(vec![
            op("updateValues", json!({"updates": [{"index": 0, "value": 2}]})),
            op("updateValues", json!({"updates": [{"index": 0, "value": 3}]})),
        ]);
        DeltaInterpreter::default().apply(&mut store, 0, &delta);
        let svl_core::Structure::Array(items) = &store.data_state().structure else {
            panic!("expected array");
        };
        assert_eq!(items[0].value, json!(3));
    }

    #[test]
    fn test_delta_scoped_overlays_are_dropped() {
        let mut store = hash_store();
        let interpreter = DeltaInterpreter::default();
        let first = Delta::from_ops([op("highlightBucket", json!({"bucket_index": 1}))]);
        interpreter.apply(&mut store, 0, &first);
        assert_eq!(store.overlays().count(OverlayCategory::BucketHighlight), 1);

        interpreter.apply(&mut store, 1, &Delta::default());
        assert_eq!(store.overlays().count(OverlayCategory::BucketHighlight), 0);
    }

    #[test]
    fn test_delta_scoped_overlays_kept_when_disabled() {
        let mut store = hash_store();
        let interpreter = DeltaInterpreter::new(EngineConfig {
            transient_overlays_per_delta: false,
            ..EngineConfig::default()
        });
        interpreter.apply(&mut store, 0, &Delta::from_ops([op("highlightCollision", json!({"bucket_index": 0}))]));
        interpreter.apply(&mut store, 1, &Delta::default());
        assert_eq!(store.overlays().count(OverlayCategory::Collision), 1);
    }
}
