// Navigation history - location entries, cursor, and change listeners
//
// The in-process stand-in for the browser history the app runs against.
// Cloning a `History` hands out another handle to the same entry list;
// listeners fire synchronously on every navigation, including our own
// query-string writes.

pub mod query;
pub mod route;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::debug;

use crate::config::HistoryConfig;
use route::{Route, RouteError, RouteParams};

/// Default cap on retained history entries.
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// A point in the app's navigation space: a pathname plus the query
/// string. `search` is stored without a leading `?`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    pub pathname: String,
    pub search: String,
}

impl Location {
    pub fn new(pathname: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            search: String::new(),
        }
    }

    pub fn with_search(pathname: impl Into<String>, search: &str) -> Self {
        Self {
            pathname: pathname.into(),
            search: normalize_search(search),
        }
    }
}

fn normalize_search(search: &str) -> String {
    search.strip_prefix('?').unwrap_or(search).to_string()
}

type ListenerRc = Rc<dyn Fn(&Location)>;
type ListenerWeak = Weak<dyn Fn(&Location)>;

struct HistoryState {
    entries: Vec<Location>,
    index: usize,
    max_entries: usize,
    /// Listeners held weakly; the strong end lives in the subscription
    /// guard. Dead entries are pruned on notify.
    listeners: Vec<ListenerWeak>,
}

/// Cloneable handle over a shared navigation history.
#[derive(Clone)]
pub struct History {
    state: Rc<RefCell<HistoryState>>,
}

impl History {
    pub fn new(initial: Location) -> Self {
        Self::with_limit(initial, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_config(initial: Location, config: &HistoryConfig) -> Self {
        Self::with_limit(initial, config.max_entries)
    }

    pub fn with_limit(initial: Location, max_entries: usize) -> Self {
        Self {
            state: Rc::new(RefCell::new(HistoryState {
                entries: vec![initial],
                index: 0,
                max_entries: max_entries.max(1),
                listeners: Vec::new(),
            })),
        }
    }

    /// The current location.
    pub fn location(&self) -> Location {
        let state = self.state.borrow();
        state.entries[state.index].clone()
    }

    pub fn can_go_back(&self) -> bool {
        self.state.borrow().index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        let state = self.state.borrow();
        state.index + 1 < state.entries.len()
    }

    /// Navigate to a new location. Forward history is discarded, and the
    /// oldest entries are evicted once the cap is reached.
    pub fn push(&self, location: Location) {
        {
            let mut state = self.state.borrow_mut();
            let index = state.index;
            state.entries.truncate(index + 1);
            state.entries.push(location);
            if state.entries.len() > state.max_entries {
                let excess = state.entries.len() - state.max_entries;
                state.entries.drain(..excess);
            }
            state.index = state.entries.len() - 1;
        }
        self.notify();
    }

    /// Navigate to the current pathname with a new query string.
    pub fn push_search(&self, search: &str) {
        let pathname = {
            let state = self.state.borrow();
            state.entries[state.index].pathname.clone()
        };
        self.push(Location::with_search(pathname, search));
    }

    /// Build a route URL and navigate to it.
    pub fn push_route(&self, route: &Route, params: &RouteParams) -> Result<(), RouteError> {
        let data = route.build(params)?;
        debug!("navigating to route {} ({})", data.name, data.url);
        self.push(Location::new(data.url));
        Ok(())
    }

    /// Replace the current entry without touching the cursor.
    pub fn replace(&self, location: Location) {
        {
            let mut state = self.state.borrow_mut();
            let index = state.index;
            state.entries[index] = location;
        }
        self.notify();
    }

    /// Move the cursor one entry back. Returns false at the oldest entry.
    pub fn back(&self) -> bool {
        {
            let mut state = self.state.borrow_mut();
            if state.index == 0 {
                return false;
            }
            state.index -= 1;
        }
        self.notify();
        true
    }

    /// Move the cursor one entry forward. Returns false at the newest
    /// entry.
    pub fn forward(&self) -> bool {
        {
            let mut state = self.state.borrow_mut();
            if state.index + 1 >= state.entries.len() {
                return false;
            }
            state.index += 1;
        }
        self.notify();
        true
    }

    /// Subscribe to navigation changes. The callback runs synchronously on
    /// every push/replace/back/forward; dropping the returned guard
    /// unsubscribes it.
    pub fn listen(&self, callback: impl Fn(&Location) + 'static) -> HistorySubscription {
        let strong: ListenerRc = Rc::new(callback);
        self.state.borrow_mut().listeners.push(Rc::downgrade(&strong));
        HistorySubscription { _guard: strong }
    }

    fn notify(&self) {
        // Snapshot live callbacks before calling out, so a listener may
        // itself navigate or (un)subscribe without tripping the borrow.
        let callbacks: Vec<ListenerRc> = {
            let mut state = self.state.borrow_mut();
            state.listeners.retain(|weak| weak.strong_count() > 0);
            state.listeners.iter().filter_map(Weak::upgrade).collect()
        };
        if callbacks.is_empty() {
            return;
        }
        let current = self.location();
        for callback in &callbacks {
            callback(&current);
        }
    }
}

/// Keeps a history listener alive. Dropping it unsubscribes the callback.
#[must_use]
pub struct HistorySubscription {
    _guard: ListenerRc,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_push_discards_forward_entries() {
        let history = History::new(Location::new("/"));
        history.push(Location::new("/settings"));
        history.push(Location::new("/board"));
        assert!(history.back());
        assert!(history.back());
        assert_eq!(history.location().pathname, "/");

        history.push(Location::new("/notes"));
        assert!(!history.can_go_forward());
        assert_eq!(history.location().pathname, "/notes");
    }

    #[test]
    fn test_back_and_forward_stop_at_the_ends() {
        let history = History::new(Location::new("/"));
        assert!(!history.back());
        history.push(Location::new("/board"));
        assert!(history.back());
        assert!(!history.back());
        assert!(history.forward());
        assert!(!history.forward());
        assert_eq!(history.location().pathname, "/board");
    }

    #[test]
    fn test_oldest_entries_are_evicted_at_the_cap() {
        let history = History::with_limit(Location::new("/0"), 3);
        for i in 1..=5 {
            history.push(Location::new(format!("/{i}")));
        }
        assert_eq!(history.location().pathname, "/5");
        assert!(history.back());
        assert!(history.back());
        assert_eq!(history.location().pathname, "/3");
        assert!(!history.back());
    }

    #[test]
    fn test_search_is_normalized() {
        let location = Location::with_search("/", "?tab=settings");
        assert_eq!(location.search, "tab=settings");
    }

    #[test]
    fn test_push_search_keeps_the_pathname() {
        let history = History::new(Location::new("/board"));
        history.push_search("ws=a,b");
        let location = history.location();
        assert_eq!(location.pathname, "/board");
        assert_eq!(location.search, "ws=a,b");
    }

    #[test]
    fn test_listeners_fire_on_every_navigation() {
        let history = History::new(Location::new("/"));
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let _sub = history.listen(move |_| count_clone.set(count_clone.get() + 1));

        history.push(Location::new("/a"));
        history.push(Location::new("/b"));
        history.back();
        history.forward();
        history.replace(Location::with_search("/b", "x=1"));
        assert_eq!(count.get(), 5);
    }

    #[test]
    fn test_dropping_the_subscription_unsubscribes() {
        let history = History::new(Location::new("/"));
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let sub = history.listen(move |_| count_clone.set(count_clone.get() + 1));

        history.push(Location::new("/a"));
        assert_eq!(count.get(), 1);
        drop(sub);
        history.push(Location::new("/b"));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_listener_sees_the_new_location() {
        let history = History::new(Location::new("/"));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let _sub = history.listen(move |l| seen_clone.borrow_mut().push(l.pathname.clone()));

        history.push(Location::new("/a"));
        history.back();
        assert_eq!(*seen.borrow(), vec!["/a".to_string(), "/".to_string()]);
    }

    #[test]
    fn test_push_route_navigates_to_the_built_url() {
        let history = History::new(Location::new("/"));
        let route = Route::new("workspace", "/w/:workspaceId", "workspace");
        let mut params = RouteParams::new();
        params.insert("workspaceId".to_string(), "w1".to_string());
        history.push_route(&route, &params).expect("param supplied");
        assert_eq!(history.location().pathname, "/w/w1");
        assert!(history.can_go_back());
    }

    #[test]
    fn test_clones_share_the_same_history() {
        let history = History::new(Location::new("/"));
        let other = history.clone();
        other.push(Location::new("/shared"));
        assert_eq!(history.location().pathname, "/shared");
    }
}
