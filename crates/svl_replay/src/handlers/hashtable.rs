//! Hash table handlers.

use super::{Cue, OpOutcome, SkipReason};
use crate::overlay::{Overlay, OverlayCategory, OverlayShape};
use crate::store::StateStore;
use svl_core::op::{BucketTarget, InsertIntoBucket, RemoveFromBucket, ShowHash, UpdateInBucket};
use svl_core::{slot, Bucket, Structure};

fn bucket(store: &mut StateStore, index: i64) -> Result<(usize, &mut Bucket), OpOutcome> {
    let found = store.data_state().kind();
    let Structure::Hashtable(h) = &mut store.data_state_mut().structure else {
        return Err(OpOutcome::wrong_structure("hashtable", found));
    };
    let len = h.buckets.len();
    match slot(len, index) {
        Some(i) => Ok((i, &mut h.buckets[i])),
        None => Err(OpOutcome::Skipped(SkipReason::OutOfRange {
            what: "bucket",
            index,
            len,
        })),
    }
}

pub(super) fn insert_into_bucket(store: &mut StateStore, p: &InsertIntoBucket) -> OpOutcome {
    match bucket(store, p.bucket_index) {
        Ok((_, b)) => {
            b.items.push(p.element.clone());
            OpOutcome::cue(Cue::Add)
        }
        Err(outcome) => outcome,
    }
}

pub(super) fn update_in_bucket(store: &mut StateStore, p: &UpdateInBucket) -> OpOutcome {
    let b = match bucket(store, p.bucket_index) {
        Ok((_, b)) => b,
        Err(outcome) => return outcome,
    };
    match b.items.iter_mut().find(|item| item.key == p.key) {
        Some(item) => {
            item.value = p.value.clone();
            OpOutcome::DONE
        }
        None => OpOutcome::not_found("key", &p.key),
    }
}

pub(super) fn remove_from_bucket(store: &mut StateStore, p: &RemoveFromBucket) -> OpOutcome {
    let b = match bucket(store, p.bucket_index) {
        Ok((_, b)) => b,
        Err(outcome) => return outcome,
    };
    let before = b.items.len();
    b.items.retain(|item| item.key != p.key);
    if b.items.len() == before {
        return OpOutcome::not_found("key", &p.key);
    }
    OpOutcome::cue(Cue::Remove)
}

fn annotate(
    store: &mut StateStore,
    index: i64,
    category: OverlayCategory,
    shape: impl FnOnce(usize) -> OverlayShape,
) -> OpOutcome {
    let i = match bucket(store, index) {
        Ok((i, _)) => i,
        Err(outcome) => return outcome,
    };
    store.overlays_mut().push(Overlay::new(category, shape(i)));
    OpOutcome::cue(Cue::Highlight)
}

pub(super) fn show_hash(store: &mut StateStore, p: &ShowHash) -> OpOutcome {
    annotate(store, p.bucket_index, OverlayCategory::HashAnnotation, |bucket| OverlayShape::Hash {
        bucket,
        input_key: p.input_key.clone(),
        output_hash: p.output_hash.clone(),
    })
}

pub(super) fn highlight_collision(store: &mut StateStore, p: &BucketTarget) -> OpOutcome {
    annotate(store, p.bucket_index, OverlayCategory::Collision, |bucket| OverlayShape::Bucket { bucket })
}

pub(super) fn highlight_bucket(store: &mut StateStore, p: &BucketTarget) -> OpOutcome {
    annotate(store, p.bucket_index, OverlayCategory::BucketHighlight, |bucket| OverlayShape::Bucket { bucket })
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{run, store};
    use super::*;
    use serde_json::{json, Value};
    use svl_core::HashStructure;

    fn sample() -> Value {
        json!({
            "type": "hashtable",
            "structure": {"buckets": [
                {"items": [{"key": "apple", "value": 1}]},
                {"items": []},
                {"items": [{"key": 7, "value": "x"}, {"key": "pear", "value": 2}]}
            ]}
        })
    }

    fn table_of(s: &StateStore) -> &HashStructure {
        match &s.data_state().structure {
            Structure::Hashtable(h) => h,
            _ => panic!("expected hashtable"),
        }
    }

    #[test]
    fn test_insert_update_remove() {
        let mut s = store(sample());
        run(&mut s, "insertIntoBucket", json!({"bucket_index": 1, "element": {"key": "fig", "value": 5}}));
        run(&mut s, "updateInBucket", json!({"bucket_index": 0, "key": "apple", "value": 10}));
        run(&mut s, "removeFromBucket", json!({"bucket_index": 2, "key": 7}));

        let h = table_of(&s);
        assert_eq!(h.buckets[1].items[0].key, json!("fig"));
        assert_eq!(h.buckets[0].items[0].value, json!(10));
        assert_eq!(h.buckets[2].items.len(), 1);
        assert_eq!(h.buckets[2].items[0].key, json!("pear"));
    }

    #[test]
    fn test_missing_bucket_or_key() {
        let mut s = store(sample());
        let before = s.clone();
        assert!(matches!(
            run(&mut s, "insertIntoBucket", json!({"bucket_index": 3, "element": {"key": "x"}})),
            OpOutcome::Skipped(SkipReason::OutOfRange { what: "bucket", index: 3, len: 3 })
        ));
        assert!(!run(&mut s, "updateInBucket", json!({"bucket_index": 1, "key": "apple", "value": 0})).is_applied());
        assert!(!run(&mut s, "removeFromBucket", json!({"bucket_index": -1, "key": "apple"})).is_applied());
        assert_eq!(s, before);
    }

    #[test]
    fn test_annotations_leave_buckets_alone() {
        let mut s = store(sample());
        let buckets = table_of(&s).clone();
        run(&mut s, "showHash", json!({"bucket_index": 2, "input_key": "pear", "output_hash": 2}));
        run(&mut s, "highlightCollision", json!({"bucket_index": 2}));
        run(&mut s, "highlightBucket", json!({"bucket_index": 0}));
        assert!(!run(&mut s, "highlightBucket", json!({"bucket_index": 8})).is_applied());

        assert_eq!(table_of(&s), &buckets);
        assert_eq!(s.overlays().count(OverlayCategory::HashAnnotation), 1);
        assert_eq!(s.overlays().count(OverlayCategory::Collision), 1);
        assert_eq!(s.overlays().count(OverlayCategory::BucketHighlight), 1);
    }
}
