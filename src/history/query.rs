// Query-string synchronization - mirrors pieces of app state into the URL
//
// Each managed key owns one query-string parameter. Writes are coalesced:
// any number of `set` calls across any number of keys inside the debounce
// window collapse into a single history push. External navigation (back/
// forward, route changes) flows the other way, re-parsing the query string
// and notifying the listeners of every key whose value changed.
//
// All coordination state lives on the manager instance; two managers in
// the same process never interfere.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use log::debug;
use url::form_urlencoded;

use super::{History, HistorySubscription, Location};
use crate::config::QueryConfig;

/// How long a write batch waits for further `set` calls before flushing.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(10);

/// Ordered view over a query string with URLSearchParams-style accessors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryPairs {
    pairs: Vec<(String, String)>,
}

impl QueryPairs {
    /// Parse a search string. A leading `?` is tolerated.
    pub fn parse(search: &str) -> Self {
        let search = search.strip_prefix('?').unwrap_or(search);
        Self {
            pairs: form_urlencoded::parse(search.as_bytes())
                .into_owned()
                .collect(),
        }
    }

    /// Value of the first pair with this key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Replace the first pair with this key in place, dropping any later
    /// duplicates; appends when the key is new.
    pub fn set(&mut self, key: &str, value: &str) {
        match self.pairs.iter().position(|(k, _)| k == key) {
            Some(index) => {
                self.pairs[index].1 = value.to_string();
                let mut i = index + 1;
                while i < self.pairs.len() {
                    if self.pairs[i].0 == key {
                        self.pairs.remove(i);
                    } else {
                        i += 1;
                    }
                }
            }
            None => self.pairs.push((key.to_string(), value.to_string())),
        }
    }

    /// Remove every pair with this key.
    pub fn delete(&mut self, key: &str) {
        self.pairs.retain(|(k, _)| k != key);
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Serialize back to a search string (no leading `?`).
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .finish()
    }
}

/// A value that can live in a single query-string parameter.
///
/// `format` returning `None` means "absent": the parameter is deleted from
/// the URL rather than written as an empty string, which keeps URLs clean.
pub trait QueryValue: Clone + 'static {
    fn parse(raw: &str) -> Self;
    fn format(&self) -> Option<String>;
}

/// Scalar parameter; the string passes through untouched.
impl QueryValue for String {
    fn parse(raw: &str) -> Self {
        raw.to_string()
    }

    fn format(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.clone())
        }
    }
}

/// List parameter, serialized comma-joined. An absent parameter parses to
/// an empty list.
impl QueryValue for Vec<String> {
    fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            Vec::new()
        } else {
            raw.split(',').map(str::to_string).collect()
        }
    }

    fn format(&self) -> Option<String> {
        let joined = self.join(",");
        if joined.is_empty() {
            None
        } else {
            Some(joined)
        }
    }
}

type ParamListener<V> = Rc<RefCell<dyn FnMut(&V)>>;

struct ParamState<V> {
    key: String,
    /// Outer `None`: the URL has not been read yet. Inner `None`: the
    /// parameter is absent from the URL.
    current: Option<Option<String>>,
    listeners: Vec<(u64, ParamListener<V>)>,
    next_listener_id: u64,
}

/// Type-erased notification entry point into a `ParamState<V>`, so the
/// manager can fan out external changes without knowing each key's value
/// type.
trait RawNotify {
    fn notify_raw(&self, raw: Option<String>);
}

struct ParamNotifier<V: QueryValue>(Rc<RefCell<ParamState<V>>>);

impl<V: QueryValue> RawNotify for ParamNotifier<V> {
    fn notify_raw(&self, raw: Option<String>) {
        let (callbacks, value) = {
            let mut state = self.0.borrow_mut();
            if state.current.as_ref() == Some(&raw) {
                return;
            }
            state.current = Some(raw.clone());
            let value = V::parse(raw.as_deref().unwrap_or(""));
            let callbacks: Vec<ParamListener<V>> = state
                .listeners
                .iter()
                .map(|(_, listener)| Rc::clone(listener))
                .collect();
            (callbacks, value)
        };
        // Borrow released: listeners may call back into the manager.
        for callback in callbacks {
            (&mut *callback.borrow_mut())(&value);
        }
    }
}

struct PendingUpdate {
    key: String,
    value: Option<String>,
}

struct ManagerRecord {
    listener_count: usize,
    /// When set, external-change notifications for this key are only
    /// delivered while the current pathname matches.
    route: Option<String>,
    notify: Rc<dyn RawNotify>,
}

struct Shared {
    managers: HashMap<String, ManagerRecord>,
    total_listener_count: usize,
    history_subscription: Option<HistorySubscription>,
    /// True from the first queued write until the flush completes;
    /// suppresses reacting to our own history push.
    is_modifying_query: bool,
    pending: Vec<PendingUpdate>,
    flush_deadline: Option<Instant>,
    debounce: Duration,
}

/// Registry of managed query-string parameters over one [`History`].
pub struct QueryStringManager {
    shared: Rc<RefCell<Shared>>,
    history: History,
}

impl QueryStringManager {
    pub fn new(history: History) -> Self {
        Self::with_debounce(history, DEFAULT_DEBOUNCE)
    }

    pub fn with_config(history: History, config: &QueryConfig) -> Self {
        Self::with_debounce(history, Duration::from_millis(config.debounce_ms))
    }

    pub fn with_debounce(history: History, debounce: Duration) -> Self {
        Self {
            shared: Rc::new(RefCell::new(Shared {
                managers: HashMap::new(),
                total_listener_count: 0,
                history_subscription: None,
                is_modifying_query: false,
                pending: Vec::new(),
                flush_deadline: None,
                debounce,
            })),
            history,
        }
    }

    /// Register a scalar or list parameter under `key`.
    ///
    /// # Panics
    ///
    /// Panics if `key` is already managed by this instance. Registering
    /// the same key twice is a programmer error; dispose the existing
    /// handle first.
    pub fn manage<V: QueryValue>(&self, key: &str) -> QueryParam<V> {
        self.manage_inner(key, None)
    }

    /// Like [`manage`](Self::manage), but external-change notifications
    /// are only delivered while the current pathname equals `route`.
    /// Writes are not route-filtered.
    ///
    /// # Panics
    ///
    /// Panics if `key` is already managed by this instance.
    pub fn manage_scoped<V: QueryValue>(&self, key: &str, route: &str) -> QueryParam<V> {
        self.manage_inner(key, Some(route.to_string()))
    }

    fn manage_inner<V: QueryValue>(&self, key: &str, route: Option<String>) -> QueryParam<V> {
        let state = Rc::new(RefCell::new(ParamState::<V> {
            key: key.to_string(),
            current: None,
            listeners: Vec::new(),
            next_listener_id: 0,
        }));
        {
            let mut shared = self.shared.borrow_mut();
            if shared.managers.contains_key(key) {
                panic!("query parameter manager for key `{key}` already exists");
            }
            shared.managers.insert(
                key.to_string(),
                ManagerRecord {
                    listener_count: 0,
                    route,
                    notify: Rc::new(ParamNotifier(Rc::clone(&state))),
                },
            );
        }
        QueryParam {
            state,
            shared: Rc::clone(&self.shared),
            history: self.history.clone(),
        }
    }

    /// Flush the pending write batch if its deadline has passed. Hosts
    /// call this from their update loop. Returns whether a flush ran.
    pub fn flush_due(&self) -> bool {
        let due = {
            let shared = self.shared.borrow();
            matches!(shared.flush_deadline, Some(deadline) if Instant::now() >= deadline)
        };
        if due {
            flush(&self.shared, &self.history);
        }
        due
    }

    /// Flush the pending write batch immediately.
    pub fn flush_now(&self) {
        flush(&self.shared, &self.history);
    }

    /// Deadline of the pending write batch, if any. Lets a host schedule
    /// its next [`flush_due`](Self::flush_due) call instead of polling.
    pub fn next_flush_at(&self) -> Option<Instant> {
        self.shared.borrow().flush_deadline
    }

    /// Listeners registered for `key`. Zero for unknown keys.
    pub fn listener_count(&self, key: &str) -> usize {
        self.shared
            .borrow()
            .managers
            .get(key)
            .map(|record| record.listener_count)
            .unwrap_or(0)
    }

    /// Listeners registered across all keys. The manager is only attached
    /// to history change events while this is non-zero.
    pub fn total_listener_count(&self) -> usize {
        self.shared.borrow().total_listener_count
    }

    /// Detach from history change events.
    pub fn dispose(&self) {
        self.shared.borrow_mut().history_subscription = None;
    }
}

fn flush(shared: &Rc<RefCell<Shared>>, history: &History) {
    let (new_search, changed) = {
        let mut sh = shared.borrow_mut();
        sh.flush_deadline = None;
        if sh.pending.is_empty() {
            sh.is_modifying_query = false;
            return;
        }
        // Read the search string at write time; other parameters may have
        // changed since the updates were queued.
        let current = history.location();
        let mut pairs = QueryPairs::parse(&current.search);
        for update in sh.pending.drain(..) {
            match update.value {
                Some(value) => pairs.set(&update.key, &value),
                None => pairs.delete(&update.key),
            }
        }
        let new_search = pairs.to_query_string();
        let changed = new_search != current.search;
        (new_search, changed)
    };
    // The push below re-enters our own history listener; is_modifying_query
    // stays true until after it returns.
    if changed {
        debug!("flushing query updates: ?{new_search}");
        history.push_search(&new_search);
    }
    shared.borrow_mut().is_modifying_query = false;
}

fn set_query_param(
    shared: &Rc<RefCell<Shared>>,
    history: &History,
    key: &str,
    value: Option<String>,
) {
    let on_url = QueryPairs::parse(&history.location().search)
        .get(key)
        .map(str::to_string);
    // Only a present-and-equal value suppresses the write; deletes always
    // queue so a batch that nets out to no change is decided at flush time.
    if on_url.is_some() && on_url == value {
        return;
    }
    let mut sh = shared.borrow_mut();
    sh.is_modifying_query = true;
    sh.pending.push(PendingUpdate {
        key: key.to_string(),
        value,
    });
    sh.flush_deadline = Some(Instant::now() + sh.debounce);
}

fn request_listen(shared: &Rc<RefCell<Shared>>, history: &History, key: &str) {
    let attach = {
        let mut sh = shared.borrow_mut();
        if let Some(record) = sh.managers.get_mut(key) {
            record.listener_count += 1;
        }
        sh.total_listener_count += 1;
        sh.total_listener_count == 1
    };
    if attach {
        debug!("attaching to history change events");
        let weak = Rc::downgrade(shared);
        let subscription = history.listen(move |location| {
            if let Some(shared) = weak.upgrade() {
                on_search_changed(&shared, location);
            }
        });
        shared.borrow_mut().history_subscription = Some(subscription);
    }
}

fn request_unlisten(shared: &Rc<RefCell<Shared>>, key: &str) {
    let mut sh = shared.borrow_mut();
    if let Some(record) = sh.managers.get_mut(key) {
        record.listener_count = record.listener_count.saturating_sub(1);
    }
    sh.total_listener_count = sh.total_listener_count.saturating_sub(1);
    if sh.total_listener_count == 0 && sh.history_subscription.take().is_some() {
        debug!("detaching from history change events");
    }
}

fn on_search_changed(shared: &Rc<RefCell<Shared>>, location: &Location) {
    let notifications: Vec<(Rc<dyn RawNotify>, Option<String>)> = {
        let sh = shared.borrow();
        if sh.is_modifying_query {
            return;
        }
        let pairs = QueryPairs::parse(&location.search);
        sh.managers
            .iter()
            .filter(|(_, record)| match &record.route {
                Some(route) => route == &location.pathname,
                None => true,
            })
            .map(|(key, record)| (Rc::clone(&record.notify), pairs.get(key).map(str::to_string)))
            .collect()
    };
    for (notify, raw) in notifications {
        notify.notify_raw(raw);
    }
}

/// Handle for one managed query-string parameter.
pub struct QueryParam<V: QueryValue> {
    state: Rc<RefCell<ParamState<V>>>,
    shared: Rc<RefCell<Shared>>,
    history: History,
}

impl<V: QueryValue> QueryParam<V> {
    pub fn key(&self) -> String {
        self.state.borrow().key.clone()
    }

    /// Subscribe to value changes.
    ///
    /// The first listen (or any listen while the cache holds no usable
    /// value) reads the parameter's raw value out of the current URL
    /// before anything else; the new subscriber then hears the current
    /// parsed value in one immediate, synchronous callback. Dropping the
    /// returned guard removes exactly this listener.
    pub fn listen(&self, callback: impl FnMut(&V) + 'static) -> QuerySubscription {
        let listener: ParamListener<V> = Rc::new(RefCell::new(callback));
        let (id, key, value) = {
            let mut state = self.state.borrow_mut();
            let has_cached = matches!(&state.current, Some(Some(v)) if !v.is_empty());
            if !has_cached {
                let raw = QueryPairs::parse(&self.history.location().search)
                    .get(&state.key)
                    .map(str::to_string);
                state.current = Some(raw);
            }
            let id = state.next_listener_id;
            state.next_listener_id += 1;
            state.listeners.push((id, Rc::clone(&listener)));
            let raw = state.current.clone().flatten();
            (
                id,
                state.key.clone(),
                V::parse(raw.as_deref().unwrap_or("")),
            )
        };
        request_listen(&self.shared, &self.history, &key);
        (&mut *listener.borrow_mut())(&value);

        let state = Rc::downgrade(&self.state);
        let shared = Rc::downgrade(&self.shared);
        QuerySubscription {
            cancel: Some(Box::new(move || {
                if let Some(shared) = shared.upgrade() {
                    request_unlisten(&shared, &key);
                }
                if let Some(state) = state.upgrade() {
                    state
                        .borrow_mut()
                        .listeners
                        .retain(|(listener_id, _)| *listener_id != id);
                }
            })),
        }
    }

    /// Queue a new value for this parameter.
    ///
    /// A no-op when the serialized form equals the cached current value.
    /// Otherwise the cache is updated immediately (later `set` calls in
    /// the same batch see it) and the URL write is deferred to the next
    /// flush, which folds all queued updates into one history push.
    pub fn set(&self, value: V) {
        let formatted = value.format();
        let key = {
            let mut state = self.state.borrow_mut();
            if state.current.as_ref() == Some(&formatted) {
                return;
            }
            state.current = Some(formatted.clone());
            state.key.clone()
        };
        set_query_param(&self.shared, &self.history, &key, formatted);
    }

    /// Clear this parameter from the URL and release the registration so
    /// the key can be managed again.
    pub fn dispose(self) {
        let key = self.state.borrow().key.clone();
        set_query_param(&self.shared, &self.history, &key, None);
        self.shared.borrow_mut().managers.remove(&key);
    }
}

/// Keeps a parameter listener registered. Dropping it (or calling
/// [`unsubscribe`](Self::unsubscribe)) removes exactly that listener and
/// releases its reference count; the manager detaches from history change
/// events when the last listener across all keys goes away.
#[must_use]
pub struct QuerySubscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl QuerySubscription {
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for QuerySubscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}
