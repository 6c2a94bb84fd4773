//! Static summary of a trace.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use svl_core::{DataKind, Operation, Trace};

/// Trace summary computed without applying anything
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceDigest {
    /// Algorithm name
    pub algorithm: String,
    /// Primary structure kind
    pub kind: DataKind,
    /// Number of deltas
    pub deltas: usize,
    /// Number of operations across every delta
    pub operations: usize,
    /// Operations that sit inside co-occurring groups
    pub grouped_operations: usize,
    /// Operation count per name, in order of first appearance
    pub histogram: IndexMap<String, usize>,
    /// Names outside the vocabulary, in order of first appearance
    pub unknown: IndexSet<String>,
    /// Auxiliary views declared up front or referenced by list operations
    pub aux_views: IndexSet<String>,
    /// Lowest and highest pseudocode line highlighted
    pub code_highlight_range: Option<(i64, i64)>,
    /// Pseudocode lines
    pub pseudocode_lines: usize,
}

impl TraceDigest {
    /// Summarize a trace
    #[must_use]
    pub fn from_trace(trace: &Trace) -> Self {
        let mut histogram: IndexMap<String, usize> = IndexMap::new();
        let mut unknown = IndexSet::new();
        let mut aux_views: IndexSet<String> = trace
            .initial_frame
            .auxiliary_views
            .iter()
            .map(|v| v.view_id.clone())
            .collect();
        let mut grouped = 0;

        let mut lines: Vec<i64> = trace.initial_frame.code_highlight.into_iter().collect();
        for delta in &trace.deltas {
            lines.extend(delta.code_highlight);
            for group in &delta.operations {
                if matches!(group, svl_core::OpGroup::Group(_)) {
                    grouped += group.ops().len();
                }
                for op in group.ops() {
                    *histogram.entry(op.name().to_string()).or_default() += 1;
                    match op {
                        Operation::Unknown { name, .. } => {
                            unknown.insert(name.clone());
                        }
                        Operation::AppendToList(p) => {
                            aux_views.insert(p.view_id.clone());
                        }
                        Operation::PopFromList(p) => {
                            aux_views.insert(p.view_id.clone());
                        }
                        Operation::ClearList(p) => {
                            aux_views.insert(p.view_id.clone());
                        }
                        _ => {}
                    }
                }
            }
        }

        let code_highlight_range = lines
            .iter()
            .min()
            .zip(lines.iter().max())
            .map(|(lo, hi)| (*lo, *hi));

        Self {
            algorithm: trace.algorithm.name.clone(),
            kind: trace.kind(),
            deltas: trace.len(),
            operations: histogram.values().sum(),
            grouped_operations: grouped,
            histogram,
            unknown,
            aux_views,
            code_highlight_range,
            pseudocode_lines: trace.pseudocode().len(),
        }
    }
}
