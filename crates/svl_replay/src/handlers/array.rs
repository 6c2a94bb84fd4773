//! Array handlers.

use super::{Cue, OpOutcome, SkipReason};
use crate::overlay::{Overlay, OverlayCategory, OverlayShape};
use crate::store::StateStore;
use svl_core::op::{MoveElements, RemoveBoundary, UpdateBoundary, UpdateStyle, UpdateValues};
use svl_core::{slot, Structure};

macro_rules! elements {
    ($store:expr) => {{
        let found = $store.data_state().kind();
        match &mut $store.data_state_mut().structure {
            Structure::Array(items) => items,
            _ => return OpOutcome::wrong_structure("array", found),
        }
    }};
}

pub(super) fn update_style(store: &mut StateStore, p: &UpdateStyle) -> OpOutcome {
    let items = elements!(store);
    let len = items.len();
    for &index in &p.indices {
        match slot(len, index) {
            Some(i) => items[i].style_key = Some(p.style_key.clone()),
            None => tracing::debug!(index, len, "updateStyle: index out of range"),
        }
    }
    OpOutcome::cue(Cue::for_style(&p.style_key))
}

pub(super) fn update_values(store: &mut StateStore, p: &UpdateValues) -> OpOutcome {
    let items = elements!(store);
    let len = items.len();
    for update in &p.updates {
        match slot(len, update.index) {
            Some(i) => items[i].value = update.value.clone(),
            None => tracing::debug!(index = update.index, len, "updateValues: index out of range"),
        }
    }
    OpOutcome::DONE
}

pub(super) fn move_elements(store: &mut StateStore, p: &MoveElements) -> OpOutcome {
    let items = elements!(store);
    // Every pair reads from the array as it was before the first write
    let before = items.clone();
    let len = before.len();
    let mut moved = 0;
    for pair in &p.pairs {
        match (slot(len, pair.from_index), slot(len, pair.to_index)) {
            (Some(from), Some(to)) => {
                items[to] = before[from].clone();
                moved += 1;
            }
            _ => tracing::debug!(
                from = pair.from_index,
                to = pair.to_index,
                len,
                "moveElements: pair out of range"
            ),
        }
    }
    if moved == 0 {
        return OpOutcome::Skipped(SkipReason::Empty("no pair in range"));
    }
    OpOutcome::cue(Cue::Swap)
}

pub(super) fn update_boundary(store: &mut StateStore, p: &UpdateBoundary) -> OpOutcome {
    let len = elements!(store).len();
    let &[start, end, ..] = p.range.as_slice() else {
        return OpOutcome::Skipped(SkipReason::Empty("boundary range needs a start and an end"));
    };
    let (Some(start), Some(end)) = (slot(len, start), slot(len, end)) else {
        let index = if slot(len, start).is_none() { start } else { end };
        return OpOutcome::Skipped(SkipReason::OutOfRange {
            what: "boundary",
            index,
            len,
        });
    };
    if start > end {
        return OpOutcome::Skipped(SkipReason::Empty("boundary range is reversed"));
    }

    store.overlays_mut().push(Overlay::new(
        OverlayCategory::Boundary,
        OverlayShape::Boundary {
            key: p.kind.clone(),
            start,
            end,
            style_key: p.style_key.clone(),
            label: p.label.clone(),
        },
    ));
    OpOutcome::DONE
}

pub(super) fn remove_boundary(store: &mut StateStore, p: &RemoveBoundary) -> OpOutcome {
    let removed = store.overlays_mut().retain(|o| {
        !matches!(&o.shape, OverlayShape::Boundary { key, .. } if *key == p.kind)
    });
    if removed == 0 {
        return OpOutcome::not_found("boundary", &p.kind);
    }
    OpOutcome::DONE
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{run, store};
    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn array(values: &[i64]) -> Value {
        let items: Vec<Value> = values
            .iter()
            .map(|v| json!({"value": v, "styleKey": "idle"}))
            .collect();
        json!({"type": "array", "structure": items})
    }

    fn elements(s: &StateStore) -> Vec<(Value, Option<String>)> {
        match &s.data_state().structure {
            Structure::Array(items) => items
                .iter()
                .map(|e| (e.value.clone(), e.style_key.clone()))
                .collect(),
            _ => panic!("expected array"),
        }
    }

    #[test]
    fn test_update_style_then_swap() {
        let mut s = store(array(&[5, 3]));
        let outcome = run(&mut s, "updateStyle", json!({"indices": [0, 1], "styleKey": "comparing"}));
        assert_eq!(outcome, OpOutcome::Applied(Some(Cue::Compare)));
        assert_eq!(
            elements(&s),
            vec![
                (json!(5), Some("comparing".to_string())),
                (json!(3), Some("comparing".to_string())),
            ]
        );

        run(
            &mut s,
            "moveElements",
            json!({"pairs": [{"fromIndex": 0, "toIndex": 1}, {"fromIndex": 1, "toIndex": 0}]}),
        );
        let values: Vec<Value> = elements(&s).into_iter().map(|(v, _)| v).collect();
        assert_eq!(values, vec![json!(3), json!(5)]);
    }

    #[test]
    fn test_update_style_ignores_out_of_range() {
        let mut s = store(array(&[1, 2]));
        run(&mut s, "updateStyle", json!({"indices": [-1, 1, 7], "styleKey": "sorted"}));
        let styles: Vec<Option<String>> = elements(&s).into_iter().map(|(_, k)| k).collect();
        assert_eq!(styles, vec![Some("idle".to_string()), Some("sorted".to_string())]);
    }

    #[test]
    fn test_update_values() {
        let mut s = store(array(&[1, 2, 3]));
        run(&mut s, "updateValues", json!({"updates": [{"index": 2, "value": 9}, {"index": 3, "value": 0}]}));
        let values: Vec<Value> = elements(&s).into_iter().map(|(v, _)| v).collect();
        assert_eq!(values, vec![json!(1), json!(2), json!(9)]);
    }

    #[test]
    fn test_move_rotation_uses_pre_move_array() {
        let mut s = store(array(&[1, 2, 3]));
        run(
            &mut s,
            "moveElements",
            json!({"pairs": [{"from": 0, "to": 1}, {"from": 1, "to": 2}, {"from": 2, "to": 0}]}),
        );
        let values: Vec<Value> = elements(&s).into_iter().map(|(v, _)| v).collect();
        assert_eq!(values, vec![json!(3), json!(1), json!(2)]);
    }

    #[test]
    fn test_boundary_lifecycle() {
        let mut s = store(array(&[1, 2, 3, 4]));
        assert!(run(&mut s, "updateBoundary", json!({"type": "window", "range": [0, 2], "label": "lo"})).is_applied());
        assert!(run(&mut s, "updateBoundary", json!({"type": "window", "range": [1, 3]})).is_applied());
        assert!(run(&mut s, "updateBoundary", json!({"type": "pivot", "range": [3, 3]})).is_applied());
        // Same key does not replace the earlier box
        assert_eq!(s.overlays().count(OverlayCategory::Boundary), 3);

        assert!(run(&mut s, "removeBoundary", json!({"type": "window"})).is_applied());
        assert_eq!(s.overlays().count(OverlayCategory::Boundary), 1);
        assert!(!run(&mut s, "removeBoundary", json!({"type": "window"})).is_applied());
    }

    #[test]
    fn test_boundary_rejects_bad_ranges() {
        let mut s = store(array(&[1, 2, 3]));
        assert!(!run(&mut s, "updateBoundary", json!({"type": "w", "range": [0]})).is_applied());
        assert!(!run(&mut s, "updateBoundary", json!({"type": "w", "range": [0, 3]})).is_applied());
        assert!(!run(&mut s, "updateBoundary", json!({"type": "w", "range": [-1, 1]})).is_applied());
        assert!(!run(&mut s, "updateBoundary", json!({"type": "w", "range": [2, 1]})).is_applied());
        assert!(s.overlays().is_empty());
    }

    proptest! {
        #[test]
        fn prop_update_style_idempotent(
            values in prop::collection::vec(-50i64..50, 0..12),
            indices in prop::collection::vec(-3i64..15, 0..8),
        ) {
            let params = json!({"indices": indices, "styleKey": "comparing"});
            let mut once = store(array(&values));
            run(&mut once, "updateStyle", params.clone());
            let mut twice = once.clone();
            run(&mut twice, "updateStyle", params);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_swap_pairs_exchange_values(values in prop::collection::vec(-50i64..50, 2..12), a in 0usize..12, b in 0usize..12) {
            let a = a % values.len();
            let b = b % values.len();
            let mut s = store(array(&values));
            run(&mut s, "moveElements", json!({"pairs": [{"fromIndex": a, "toIndex": b}, {"fromIndex": b, "toIndex": a}]}));
            let mut expected = values.clone();
            expected.swap(a, b);
            let got: Vec<Value> = elements(&s).into_iter().map(|(v, _)| v).collect();
            let expected: Vec<Value> = expected.into_iter().map(|v| json!(v)).collect();
            prop_assert_eq!(got, expected);
        }
    }
}
