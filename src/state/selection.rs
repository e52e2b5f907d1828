// Selection toggling for the workspace sidebar
//
// Pure functions only. The caller owns the selection set and the range
// anchor; every call builds a fresh result from the inputs.

use log::warn;

/// How a click should change the selection, derived from modifier keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleAction {
    /// Plain click: toggle the one item.
    Single,
    /// Shift-click: toggle the contiguous span between the anchor and the
    /// clicked item.
    Range,
    /// Ctrl/Cmd-click: the clicked item becomes the entire selection.
    ClearOthers,
}

/// Modifier flags of the pointer event that produced a toggle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClickModifiers {
    pub ctrl: bool,
    pub shift: bool,
    /// macOS command key, treated like ctrl.
    pub command: bool,
}

impl ToggleAction {
    /// Map click modifiers to an action. Ctrl/Cmd wins over Shift when both
    /// are held.
    pub fn from_modifiers(modifiers: ClickModifiers) -> Self {
        if modifiers.ctrl || modifiers.command {
            ToggleAction::ClearOthers
        } else if modifiers.shift {
            ToggleAction::Range
        } else {
            ToggleAction::Single
        }
    }
}

/// What happened to the toggled item.
///
/// For `Single` and `ClearOthers` this is the applied change. For `Range`
/// it reports the state of the toggled item *before* the call: a range
/// removal comes back as `Selected` and a range addition as `Deselected`.
/// Callers advance their range anchor only on `Selected`, so the flag has
/// to keep meaning "the clicked item was the selected endpoint".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleType {
    Selected,
    Deselected,
}

/// Outcome of a toggle: the action that was actually applied (a `Range`
/// with no usable anchor degrades to `Single`), the toggle flag, and the
/// full new selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionResult {
    pub action: ToggleAction,
    pub toggle: ToggleType,
    pub all_selected: Vec<String>,
}

/// Compute the next selection after the user toggles `toggled`.
///
/// `items` is the currently visible, ordered list of workspace keys; range
/// spans are computed over it. `selected_keys` is the current selection
/// (caller-deduplicated), `last_selected_key` the anchor left by the
/// previous toggle. A `None` action falls back to `Single`.
///
/// Returns `None` when `toggled` is not in `items` (a stale or foreign
/// item list). Callers treat that as a no-op.
pub fn toggle_selection_item(
    items: &[String],
    toggled: &str,
    selected_keys: &[String],
    last_selected_key: Option<&str>,
    action: Option<ToggleAction>,
) -> Option<SelectionResult> {
    let toggled_index = match items.iter().position(|k| k == toggled) {
        Some(index) => index,
        None => {
            warn!("toggled item {toggled:?} is not in the visible item list");
            return None;
        }
    };

    let action = action.unwrap_or(ToggleAction::Single);
    let result = match action {
        ToggleAction::Single => toggle_single(toggled, selected_keys),
        ToggleAction::Range => {
            let anchor = last_selected_key.and_then(|k| items.iter().position(|i| i == k));
            match anchor {
                Some(anchor_index) => {
                    toggle_range(items, toggled, toggled_index, anchor_index, selected_keys)
                }
                // No anchor to span from; fall back to a single toggle.
                None => toggle_single(toggled, selected_keys),
            }
        }
        ToggleAction::ClearOthers => SelectionResult {
            action: ToggleAction::ClearOthers,
            toggle: ToggleType::Selected,
            all_selected: vec![toggled.to_string()],
        },
    };
    Some(result)
}

fn toggle_single(toggled: &str, selected_keys: &[String]) -> SelectionResult {
    let mut all_selected = selected_keys.to_vec();
    let toggle = match all_selected.iter().position(|k| k == toggled) {
        Some(index) => {
            all_selected.remove(index);
            ToggleType::Deselected
        }
        None => {
            all_selected.push(toggled.to_string());
            ToggleType::Selected
        }
    };
    SelectionResult {
        action: ToggleAction::Single,
        toggle,
        all_selected,
    }
}

fn toggle_range(
    items: &[String],
    toggled: &str,
    toggled_index: usize,
    anchor_index: usize,
    selected_keys: &[String],
) -> SelectionResult {
    let lo = anchor_index.min(toggled_index);
    let hi = anchor_index.max(toggled_index);
    let span = &items[lo..=hi];

    let was_selected = selected_keys.iter().any(|k| k == toggled);
    if was_selected {
        // The clicked endpoint was selected: drop the whole span.
        let all_selected = selected_keys
            .iter()
            .filter(|k| !span.contains(k))
            .cloned()
            .collect();
        SelectionResult {
            action: ToggleAction::Range,
            toggle: ToggleType::Selected,
            all_selected,
        }
    } else {
        // Union the span in, keeping existing order and skipping duplicates.
        let mut all_selected = selected_keys.to_vec();
        for key in span {
            if !all_selected.contains(key) {
                all_selected.push(key.clone());
            }
        }
        SelectionResult {
            action: ToggleAction::Range,
            toggle: ToggleType::Deselected,
            all_selected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<String> {
        ["a", "b", "c", "d", "e"].map(String::from).to_vec()
    }

    fn keys(selected: &[&str]) -> Vec<String> {
        selected.iter().map(|k| k.to_string()).collect()
    }

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    #[test]
    fn test_single_selects_unselected_item() {
        let r = toggle_selection_item(&items(), "c", &[], None, Some(ToggleAction::Single))
            .expect("item is present");
        assert_eq!(r.action, ToggleAction::Single);
        assert_eq!(r.toggle, ToggleType::Selected);
        assert_eq!(r.all_selected, keys(&["c"]));
    }

    #[test]
    fn test_single_deselects_selected_item() {
        let selected = keys(&["a", "c"]);
        let r = toggle_selection_item(&items(), "c", &selected, None, Some(ToggleAction::Single))
            .expect("item is present");
        assert_eq!(r.toggle, ToggleType::Deselected);
        assert_eq!(r.all_selected, keys(&["a"]));
    }

    #[test]
    fn test_single_is_self_inverse() {
        let selected = keys(&["b", "e"]);
        let first = toggle_selection_item(&items(), "c", &selected, None, None).unwrap();
        let second =
            toggle_selection_item(&items(), "c", &first.all_selected, None, None).unwrap();
        assert_eq!(sorted(second.all_selected), sorted(selected));
    }

    #[test]
    fn test_missing_action_defaults_to_single() {
        let r = toggle_selection_item(&items(), "b", &[], None, None).unwrap();
        assert_eq!(r.action, ToggleAction::Single);
        assert_eq!(r.all_selected, keys(&["b"]));
    }

    #[test]
    fn test_range_covers_contiguous_span() {
        let r = toggle_selection_item(&items(), "d", &[], Some("b"), Some(ToggleAction::Range))
            .expect("item is present");
        assert_eq!(r.action, ToggleAction::Range);
        assert_eq!(sorted(r.all_selected), keys(&["b", "c", "d"]));
    }

    #[test]
    fn test_range_is_order_independent() {
        let r = toggle_selection_item(&items(), "b", &[], Some("d"), Some(ToggleAction::Range))
            .unwrap();
        assert_eq!(sorted(r.all_selected), keys(&["b", "c", "d"]));
    }

    #[test]
    fn test_range_union_keeps_existing_selection() {
        let selected = keys(&["a"]);
        let r =
            toggle_selection_item(&items(), "d", &selected, Some("c"), Some(ToggleAction::Range))
                .unwrap();
        assert_eq!(sorted(r.all_selected), keys(&["a", "c", "d"]));
        // Added items are deduplicated against what was already selected.
        let selected = keys(&["c"]);
        let r =
            toggle_selection_item(&items(), "d", &selected, Some("c"), Some(ToggleAction::Range))
                .unwrap();
        assert_eq!(sorted(r.all_selected), keys(&["c", "d"]));
    }

    #[test]
    fn test_range_removal_drops_whole_span() {
        let selected = keys(&["a", "b", "c", "d"]);
        let r =
            toggle_selection_item(&items(), "d", &selected, Some("b"), Some(ToggleAction::Range))
                .unwrap();
        // Removal reports Selected: the flag is the prior state of the
        // clicked endpoint.
        assert_eq!(r.toggle, ToggleType::Selected);
        assert_eq!(r.all_selected, keys(&["a"]));
    }

    #[test]
    fn test_range_addition_reports_deselected() {
        let r = toggle_selection_item(&items(), "d", &[], Some("b"), Some(ToggleAction::Range))
            .unwrap();
        assert_eq!(r.toggle, ToggleType::Deselected);
    }

    #[test]
    fn test_range_without_anchor_degrades_to_single() {
        let r = toggle_selection_item(&items(), "d", &[], None, Some(ToggleAction::Range))
            .unwrap();
        assert_eq!(r.action, ToggleAction::Single);
        assert_eq!(r.all_selected, keys(&["d"]));
    }

    #[test]
    fn test_range_with_stale_anchor_degrades_to_single() {
        let r = toggle_selection_item(&items(), "d", &[], Some("z"), Some(ToggleAction::Range))
            .unwrap();
        assert_eq!(r.action, ToggleAction::Single);
        assert_eq!(r.all_selected, keys(&["d"]));
    }

    #[test]
    fn test_clear_others_always_yields_singleton() {
        for selected in [keys(&[]), keys(&["a", "b", "e"]), keys(&["c"])] {
            let r = toggle_selection_item(
                &items(),
                "c",
                &selected,
                Some("a"),
                Some(ToggleAction::ClearOthers),
            )
            .unwrap();
            assert_eq!(r.action, ToggleAction::ClearOthers);
            assert_eq!(r.toggle, ToggleType::Selected);
            assert_eq!(r.all_selected, keys(&["c"]));
        }
    }

    #[test]
    fn test_missing_item_is_a_no_op() {
        let r = toggle_selection_item(
            &keys(&["a", "b"]),
            "z",
            &[],
            None,
            Some(ToggleAction::Single),
        );
        assert!(r.is_none());
    }

    #[test]
    fn test_ctrl_wins_over_shift() {
        let action = ToggleAction::from_modifiers(ClickModifiers {
            ctrl: true,
            shift: true,
            command: false,
        });
        assert_eq!(action, ToggleAction::ClearOthers);
    }

    #[test]
    fn test_modifier_mapping() {
        assert_eq!(
            ToggleAction::from_modifiers(ClickModifiers::default()),
            ToggleAction::Single
        );
        assert_eq!(
            ToggleAction::from_modifiers(ClickModifiers {
                shift: true,
                ..Default::default()
            }),
            ToggleAction::Range
        );
        assert_eq!(
            ToggleAction::from_modifiers(ClickModifiers {
                command: true,
                ..Default::default()
            }),
            ToggleAction::ClearOthers
        );
    }
}
