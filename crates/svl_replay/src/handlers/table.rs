//! Table handlers.
//!
//! Every table operation first checks that its `view_id` resolves to the
//! primary view.

use super::{Cue, OpOutcome, SkipReason};
use crate::overlay::{CellStyle, Overlay, OverlayCategory, OverlayShape};
use crate::store::StateStore;
use crate::view::ViewResolver;
use serde_json::Value;
use svl_core::op::{HighlightTableCell, ShowDependency, UpdateTableCell};
use svl_core::{slot, CellRef, Structure};

fn check_view(store: &StateStore, target: Option<&str>) -> Result<(), OpOutcome> {
    let primary = store.primary_view_id();
    if ViewResolver::resolve(target, primary) {
        Ok(())
    } else {
        Err(OpOutcome::Skipped(SkipReason::ForeignView {
            target: target.unwrap_or_default().to_string(),
            primary: primary.to_string(),
        }))
    }
}

fn rows(store: &StateStore) -> Result<&[Vec<Value>], OpOutcome> {
    match &store.data_state().structure {
        Structure::Table(rows) => Ok(rows),
        other => Err(OpOutcome::wrong_structure("table", other.kind())),
    }
}

fn in_bounds(rows: &[Vec<Value>], cell: CellRef) -> bool {
    slot(rows.len(), cell.row).is_some_and(|r| slot(rows[r].len(), cell.col).is_some())
}

pub(super) fn update_table_cell(store: &mut StateStore, p: &UpdateTableCell) -> OpOutcome {
    if let Err(outcome) = check_view(store, p.view_id.as_deref()) {
        return outcome;
    }
    let found = store.data_state().kind();
    let Structure::Table(rows) = &mut store.data_state_mut().structure else {
        return OpOutcome::wrong_structure("table", found);
    };
    for update in &p.updates {
        let Some(r) = slot(rows.len(), update.row) else {
            tracing::debug!(row = update.row, col = update.col, "updateTableCell: row out of range");
            continue;
        };
        match slot(rows[r].len(), update.col) {
            Some(c) => rows[r][c] = update.value.clone(),
            None => tracing::debug!(row = update.row, col = update.col, "updateTableCell: col out of range"),
        }
    }
    OpOutcome::DONE
}

pub(super) fn highlight_table_cell(store: &mut StateStore, p: &HighlightTableCell) -> OpOutcome {
    if let Err(outcome) = check_view(store, p.view_id.as_deref()) {
        return outcome;
    }
    let cells: Vec<CellRef> = match rows(store) {
        Ok(rows) => p.cells.iter().copied().filter(|&c| in_bounds(rows, c)).collect(),
        Err(outcome) => return outcome,
    };
    if cells.is_empty() {
        return OpOutcome::Skipped(SkipReason::Empty("no cell in range"));
    }

    let style = CellStyle::from_key(p.style_key.as_deref());
    let overlays = store.overlays_mut();
    for cell in cells {
        overlays.push(Overlay::new(
            OverlayCategory::CellHighlight,
            OverlayShape::Cell {
                cell,
                style,
                color: style.color(),
                opacity: style.opacity(),
            },
        ));
    }
    OpOutcome::cue(Cue::Highlight)
}

pub(super) fn show_dependency(store: &mut StateStore, p: &ShowDependency) -> OpOutcome {
    if let Err(outcome) = check_view(store, p.view_id.as_deref()) {
        return outcome;
    }
    let (to, sources) = match rows(store) {
        Ok(rows) => (
            p.to_cell.filter(|&c| in_bounds(rows, c)),
            p.from_cells
                .iter()
                .copied()
                .filter(|&c| in_bounds(rows, c))
                .collect::<Vec<_>>(),
        ),
        Err(outcome) => return outcome,
    };

    let overlays = store.overlays_mut();
    // Clear before draw, so a repeated call never stacks connectors
    let cleared = overlays.clear_category(OverlayCategory::DependencyArrow);

    let Some(to) = to else {
        tracing::debug!(cleared, "showDependency: no target cell");
        return OpOutcome::DONE;
    };
    for from in sources {
        overlays.push(Overlay::new(
            OverlayCategory::DependencyArrow,
            OverlayShape::Connector {
                from,
                to,
                style_key: p.style_key.clone(),
            },
        ));
    }
    OpOutcome::DONE
}
