//! View resolution.
//!
//! The primary table view answers to several historical names. Auxiliary
//! views are keyed by their own id and are created on first reference.

use svl_core::AuxiliaryView;

/// Names that all refer to the primary table view
pub const PRIMARY_ALIASES: [&str; 5] = ["dp_table", "data_state", "main_table", "dp", "dp_edit_distance"];

/// Primary view id when the data state does not name one
pub const DEFAULT_PRIMARY_VIEW: &str = "data_state";

/// Maps requested view ids onto the views a frame actually holds
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewResolver;

impl ViewResolver {
    /// Whether `id` is one of the primary view aliases
    #[must_use]
    pub fn is_primary_alias(id: &str) -> bool {
        PRIMARY_ALIASES.contains(&id)
    }

    /// Whether an operation addressed to `target` applies to the primary
    /// view currently named `current`
    ///
    /// An absent target always applies.
    #[must_use]
    pub fn resolve(target: Option<&str>, current: &str) -> bool {
        match target {
            None => true,
            Some(target) if target == current => true,
            Some(target) => Self::is_primary_alias(target) && Self::is_primary_alias(current),
        }
    }

    /// Find an auxiliary view by id
    #[must_use]
    pub fn find_aux<'a>(views: &'a [AuxiliaryView], view_id: &str) -> Option<&'a AuxiliaryView> {
        views.iter().find(|v| v.view_id == view_id)
    }

    /// Find an auxiliary view by id for mutation
    pub fn find_aux_mut<'a>(views: &'a mut [AuxiliaryView], view_id: &str) -> Option<&'a mut AuxiliaryView> {
        views.iter_mut().find(|v| v.view_id == view_id)
    }

    /// Return the auxiliary view with this id, creating an empty one if needed
    pub fn find_or_create_aux<'a>(
        views: &'a mut Vec<AuxiliaryView>,
        view_id: &str,
        kind: &str,
    ) -> &'a mut AuxiliaryView {
        let pos = match views.iter().position(|v| v.view_id == view_id) {
            Some(pos) => pos,
            None => {
                tracing::debug!(view_id, kind, "creating auxiliary view");
                views.push(AuxiliaryView::new(view_id, kind));
                views.len() - 1
            }
        };
        &mut views[pos]
    }
}
