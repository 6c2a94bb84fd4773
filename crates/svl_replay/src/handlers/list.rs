//! Auxiliary list handlers.

use super::{Cue, OpOutcome, SkipReason};
use crate::store::StateStore;
use crate::view::ViewResolver;
use svl_core::op::{AppendToList, ClearList, ListEnd, PopFromList};

const LIST_KIND: &str = "list";

pub(super) fn append_to_list(store: &mut StateStore, p: &AppendToList) -> OpOutcome {
    let view = ViewResolver::find_or_create_aux(store.aux_views_mut(), &p.view_id, LIST_KIND);
    view.data.push(p.value.clone());
    OpOutcome::cue(Cue::Add)
}

pub(super) fn pop_from_list(store: &mut StateStore, p: &PopFromList) -> OpOutcome {
    let Some(view) = ViewResolver::find_aux_mut(store.aux_views_mut(), &p.view_id) else {
        return OpOutcome::not_found("view", &p.view_id);
    };

    let removed = match (&p.value, p.from) {
        (Some(value), _) if !value.is_null() => view
            .data
            .iter()
            .position(|entry| entry == value)
            .map(|i| view.data.remove(i)),
        (_, Some(ListEnd::Head)) if !view.data.is_empty() => Some(view.data.remove(0)),
        (_, Some(ListEnd::Tail)) => view.data.pop(),
        _ => None,
    };

    match removed {
        Some(entry) => {
            tracing::trace!(view_id = %p.view_id, %entry, "popped");
            OpOutcome::cue(Cue::Remove)
        }
        None => OpOutcome::Skipped(SkipReason::Empty("nothing to pop")),
    }
}

pub(super) fn clear_list(store: &mut StateStore, p: &ClearList) -> OpOutcome {
    match ViewResolver::find_aux_mut(store.aux_views_mut(), &p.view_id) {
        Some(view) => {
            view.data.clear();
            OpOutcome::DONE
        }
        None => OpOutcome::not_found("view", &p.view_id),
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{run, store};
    use super::*;
    use serde_json::{json, Value};

    fn entries(store: &StateStore, view_id: &str) -> Option<Vec<Value>> {
        ViewResolver::find_aux(store.current_aux_views(), view_id).map(|v| v.data.clone())
    }

    fn empty() -> StateStore {
        store(json!({"type": "array", "structure": []}))
    }

    #[test]
    fn test_append_creates_view() {
        let mut s = empty();
        run(&mut s, "appendToList", json!({"view_id": "queue", "value": "a"}));
        run(&mut s, "appendToList", json!({"view_id": "queue", "value": "b"}));
        assert_eq!(entries(&s, "queue"), Some(vec![json!("a"), json!("b")]));
        assert_eq!(s.current_aux_views().len(), 1);
        assert_eq!(s.current_aux_views()[0].kind, "list");
    }

    #[test]
    fn test_pop_by_value_then_ends() {
        let mut s = empty();
        for v in [1, 2, 3, 2] {
            run(&mut s, "appendToList", json!({"view_id": "q", "value": v}));
        }
        run(&mut s, "popFromList", json!({"view_id": "q", "value": 2}));
        assert_eq!(entries(&s, "q"), Some(vec![json!(1), json!(3), json!(2)]));

        run(&mut s, "popFromList", json!({"view_id": "q", "from": "head"}));
        assert_eq!(entries(&s, "q"), Some(vec![json!(3), json!(2)]));

        run(&mut s, "popFromList", json!({"view_id": "q", "from": "tail"}));
        assert_eq!(entries(&s, "q"), Some(vec![json!(3)]));
    }

    #[test]
    fn test_pop_noops() {
        let mut s = empty();
        assert!(!run(&mut s, "popFromList", json!({"view_id": "q", "from": "head"})).is_applied());
        assert!(s.current_aux_views().is_empty());

        run(&mut s, "appendToList", json!({"view_id": "q", "value": 1}));
        assert!(!run(&mut s, "popFromList", json!({"view_id": "q", "value": 9})).is_applied());
        assert!(!run(&mut s, "popFromList", json!({"view_id": "q", "from": "middle"})).is_applied());
        assert!(!run(&mut s, "popFromList", json!({"view_id": "q"})).is_applied());
        assert_eq!(entries(&s, "q"), Some(vec![json!(1)]));
    }

    #[test]
    fn test_clear_keeps_view() {
        let mut s = empty();
        run(&mut s, "appendToList", json!({"view_id": "stack", "value": 1}));
        run(&mut s, "clearList", json!({"view_id": "stack"}));
        assert_eq!(entries(&s, "stack"), Some(vec![]));
        assert!(!run(&mut s, "clearList", json!({"view_id": "other"})).is_applied());
    }
}
