//! Client-state core for a collaborative workspace app.
//!
//! Two independent mechanisms, both UI-toolkit agnostic:
//!
//! - [`state::selection`]: pure multi-selection toggling for the workspace
//!   sidebar (plain click, shift-range, ctrl-clear-others), plus the
//!   [`state::sort`] ordering that produces the list ranges span over.
//! - [`history`]: an in-process navigation history with the
//!   [`history::query`] manager on top, which keeps application values
//!   synchronized with query-string parameters: debounced, coalesced
//!   writes one way, change notifications the other.
//!
//! Everything runs on a single thread. The only deferred work is the
//! query-write debounce, which the host drives from its update loop:
//!
//! ```
//! use boardstate::config::Config;
//! use boardstate::history::{History, Location};
//! use boardstate::history::query::QueryStringManager;
//!
//! let config = Config::default();
//! let history = History::with_config(Location::new("/"), &config.history);
//! let manager = QueryStringManager::with_config(history.clone(), &config.query);
//!
//! let selected = manager.manage::<Vec<String>>("selectedWorkspaces");
//! selected.set(vec!["w1".to_string(), "w2".to_string()]);
//! // ...later, from the update loop:
//! manager.flush_now();
//! assert_eq!(history.location().search, "selectedWorkspaces=w1%2Cw2");
//! ```

pub mod config;
pub mod entry;
pub mod history;
pub mod state;

pub use config::Config;
pub use entry::WorkspaceEntry;
pub use history::{History, Location};
pub use state::{
    toggle_selection_item, ClickModifiers, SelectionResult, ToggleAction, ToggleType,
};
