pub mod selection;
pub mod sort;

pub use selection::{
    toggle_selection_item, ClickModifiers, SelectionResult, ToggleAction, ToggleType,
};
pub use sort::{compare_workspaces, sort_workspaces, split_by_visibility};
