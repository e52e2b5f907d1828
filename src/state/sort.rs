// Sidebar ordering for workspace lists
//
// The ordered visible list produced here is what range selection spans
// over, so the order has to be total and stable across calls.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::entry::WorkspaceEntry;

/// Compare two workspaces for sidebar order: pinned before unpinned,
/// non-hidden before hidden, then case-insensitive name, then key.
pub fn compare_workspaces(
    a: &WorkspaceEntry,
    b: &WorkspaceEntry,
    pinned: &HashSet<String>,
    hidden: &HashSet<String>,
) -> Ordering {
    let a_pinned = pinned.contains(&a.key);
    let b_pinned = pinned.contains(&b.key);
    if a_pinned != b_pinned {
        return b_pinned.cmp(&a_pinned);
    }

    let a_hidden = hidden.contains(&a.key);
    let b_hidden = hidden.contains(&b.key);
    if a_hidden != b_hidden {
        return a_hidden.cmp(&b_hidden);
    }

    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.key.cmp(&b.key))
}

/// Sort a workspace list in sidebar order.
pub fn sort_workspaces(
    entries: &mut [WorkspaceEntry],
    pinned: &HashSet<String>,
    hidden: &HashSet<String>,
) {
    entries.sort_by(|a, b| compare_workspaces(a, b, pinned, hidden));
}

/// Partition a workspace list into the sidebar's visible and hidden
/// halves. The visible half comes back sorted; the hidden half keeps its
/// input order (it is rendered collapsed).
pub fn split_by_visibility(
    entries: &[WorkspaceEntry],
    pinned: &HashSet<String>,
    hidden: &HashSet<String>,
) -> (Vec<WorkspaceEntry>, Vec<WorkspaceEntry>) {
    let (mut visible, hidden_entries): (Vec<_>, Vec<_>) = entries
        .iter()
        .cloned()
        .partition(|e| !hidden.contains(&e.key));
    sort_workspaces(&mut visible, pinned, hidden);
    (visible, hidden_entries)
}
