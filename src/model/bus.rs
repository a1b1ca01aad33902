//! Change Bus - property change signals and topic-keyed handler registries.
//!
//! Two notification paths, both released through RAII [`Subscription`]s:
//!
//! - [`ChangeBus`] carries property changes (model fields, element change
//!   signals, view attribute notifications) on spark-signals: one version
//!   signal per property, one effect per subscriber.
//! - [`Topics`] carries payload events (element and window events, component
//!   outputs). Handlers are stored with an id so that a [`Subscription`] can
//!   remove exactly its own entry. Publishing snapshots the handler list
//!   before invoking it, so a handler may subscribe, unsubscribe or publish
//!   again without invalidating the loop.
//!
//! # Example
//!
//! ```ignore
//! let bus = ChangeBus::default();
//! let sub = bus.subscribe("user.name", || println!("user changed"));
//! bus.emit("user");   // fires: keyed by root segment
//! drop(sub);          // handler removed
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use spark_signals::{AnyReaction, AnySource, Signal, effect_sync, signal, with_context};

use crate::types::{Cleanup, split_root};

// =============================================================================
// Subscription
// =============================================================================

/// Handle to a registered handler. Dropping it removes the handler.
#[must_use = "dropping a Subscription immediately removes its handler"]
pub struct Subscription {
    release: Option<Cleanup>,
}

impl Subscription {
    /// Wrap a release function.
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A subscription with nothing to release (inert bindings).
    pub fn empty() -> Self {
        Self { release: None }
    }

    /// Remove the handler now.
    pub fn release(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    /// Convert into a plain cleanup function so another owner can hold it.
    pub fn into_cleanup(mut self) -> Cleanup {
        self.release.take().unwrap_or_else(|| Box::new(|| {}))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

// =============================================================================
// Topics
// =============================================================================

type Handler<A> = Rc<dyn Fn(&A)>;

struct TopicTable<A> {
    next_id: usize,
    topics: HashMap<String, Vec<(usize, Handler<A>)>>,
}

/// Shared registry of handlers grouped by topic name.
pub struct Topics<A: 'static>(Rc<RefCell<TopicTable<A>>>);

impl<A: 'static> Topics<A> {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(TopicTable {
            next_id: 0,
            topics: HashMap::new(),
        })))
    }

    /// Register a handler for `topic`.
    pub fn subscribe(&self, topic: &str, handler: impl Fn(&A) + 'static) -> Subscription {
        let id = {
            let mut table = self.0.borrow_mut();
            let id = table.next_id;
            table.next_id += 1;
            table
                .topics
                .entry(topic.to_string())
                .or_default()
                .push((id, Rc::new(handler)));
            id
        };

        let table = Rc::downgrade(&self.0);
        let topic = topic.to_string();
        Subscription::new(move || {
            let Some(table) = table.upgrade() else {
                return;
            };
            let mut table = table.borrow_mut();
            let emptied = match table.topics.get_mut(&topic) {
                Some(handlers) => {
                    handlers.retain(|(handler_id, _)| *handler_id != id);
                    handlers.is_empty()
                }
                None => false,
            };
            if emptied {
                table.topics.remove(&topic);
            }
        })
    }

    /// Invoke every handler registered for `topic`. Returns how many ran.
    pub fn publish(&self, topic: &str, arg: &A) -> usize {
        let handlers: Vec<Handler<A>> = self
            .0
            .borrow()
            .topics
            .get(topic)
            .map(|handlers| handlers.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default();

        for handler in &handlers {
            handler(arg);
        }
        handlers.len()
    }

    /// Number of handlers currently registered for `topic`.
    pub fn count(&self, topic: &str) -> usize {
        self.0.borrow().topics.get(topic).map_or(0, Vec::len)
    }

    /// Total number of handlers across all topics.
    pub fn total(&self) -> usize {
        self.0.borrow().topics.values().map(Vec::len).sum()
    }
}

impl<A: 'static> Default for Topics<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: 'static> Clone for Topics<A> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

// =============================================================================
// ChangeBus
// =============================================================================

/// Topic that receives every emission of a [`ChangeBus`].
const ANY: &str = "*";

#[derive(Default)]
struct Versions {
    signals: HashMap<String, Signal<u64>>,
    watchers: HashMap<String, usize>,
}

/// Property change notifications, keyed by the root segment of a path.
///
/// Each topic is a version [`Signal`]. Emitting bumps the version, and every
/// subscription is a sync effect watching it, so propagation is the signal
/// graph's: handlers run before the outermost emit returns, and an emit made
/// from inside a handler is flushed right after that handler.
///
/// Subscribing to `items.length` and emitting `items` reaches the same
/// handler: nested reads re-evaluate whenever their root property changes.
/// [`ChangeBus::subscribe_all`] handlers run after the property's own.
#[derive(Clone, Default)]
pub struct ChangeBus {
    versions: Rc<RefCell<Versions>>,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to changes of `property` (or of its root segment).
    pub fn subscribe(&self, property: &str, handler: impl Fn() + 'static) -> Subscription {
        let (root, _) = split_root(property);
        self.watch(root, handler)
    }

    /// Subscribe to every change, whatever the property.
    pub fn subscribe_all(&self, handler: impl Fn() + 'static) -> Subscription {
        self.watch(ANY, handler)
    }

    /// Notify subscribers of `property`. Returns how many were notified.
    pub fn emit(&self, property: &str) -> usize {
        let (root, _) = split_root(property);
        self.bump(root) + self.bump(ANY)
    }

    pub fn subscriber_count(&self, property: &str) -> usize {
        let (root, _) = split_root(property);
        self.versions.borrow().watchers.get(root).copied().unwrap_or(0)
    }

    pub fn total_subscribers(&self) -> usize {
        self.versions.borrow().watchers.values().sum()
    }

    /// Topics that currently have subscribers, excluding catch-all ones.
    pub fn topics(&self) -> Vec<String> {
        self.versions
            .borrow()
            .watchers
            .keys()
            .filter(|topic| topic.as_str() != ANY)
            .cloned()
            .collect()
    }

    fn bump(&self, topic: &str) -> usize {
        let (version, watchers) = {
            let versions = self.versions.borrow();
            let Some(version) = versions.signals.get(topic) else {
                return 0;
            };
            (version.clone(), versions.watchers.get(topic).copied().unwrap_or(0))
        };
        version.update(|v| *v = v.wrapping_add(1));
        watchers
    }

    fn watch(&self, topic: &str, handler: impl Fn() + 'static) -> Subscription {
        let version = {
            let mut versions = self.versions.borrow_mut();
            *versions.watchers.entry(topic.to_string()).or_default() += 1;
            versions
                .signals
                .entry(topic.to_string())
                .or_insert_with(|| signal(0u64))
                .clone()
        };

        let watcher = Rc::new(Watcher::default());
        let state = Rc::downgrade(&watcher);
        let primed = Cell::new(false);
        let dispose = detached(|| {
            effect_sync(move || {
                version.get();
                if primed.replace(true) {
                    if let Some(watcher) = state.upgrade() {
                        watcher.run(&handler);
                    }
                }
            })
        });
        *watcher.dispose.borrow_mut() = Some(Box::new(dispose));

        let versions = Rc::downgrade(&self.versions);
        let topic = topic.to_string();
        Subscription::new(move || {
            watcher.release();
            let Some(versions) = versions.upgrade() else {
                return;
            };
            let mut versions = versions.borrow_mut();
            let remaining = match versions.watchers.get_mut(&topic) {
                Some(count) => {
                    *count = count.saturating_sub(1);
                    *count
                }
                None => return,
            };
            if remaining == 0 {
                versions.watchers.remove(&topic);
                versions.signals.remove(&topic);
            }
        })
    }
}

/// One subscription's effect.
#[derive(Default)]
struct Watcher {
    running: Cell<bool>,
    released: Cell<bool>,
    dispose: RefCell<Option<Cleanup>>,
}

impl Watcher {
    fn run(&self, handler: &dyn Fn()) {
        if self.released.get() {
            return;
        }
        self.running.set(true);
        detached(handler);
        self.running.set(false);
    }

    /// An effect cannot be destroyed from inside its own run. A watcher
    /// released by its own handler drops its effect handle instead; the
    /// effect is freed when the run ends and never fires again.
    fn release(&self) {
        self.released.set(true);
        let dispose = self.dispose.borrow_mut().take();
        if !self.running.get() {
            if let Some(dispose) = dispose {
                dispose();
            }
        }
    }
}

/// Run `f` outside any running effect. Reads inside are not tracked, and
/// effects created inside are roots rather than children of the running one,
/// so a re-run of the outer effect does not dispose them. The outer effect's
/// collected dependencies are set aside and restored afterwards.
fn detached<R>(f: impl FnOnce() -> R) -> R {
    struct Saved {
        reaction: Option<Weak<dyn AnyReaction>>,
        effect: Option<Weak<dyn AnyReaction>>,
        deps: Vec<Rc<dyn AnySource>>,
        skipped: usize,
    }

    impl Drop for Saved {
        fn drop(&mut self) {
            let reaction = self.reaction.take();
            let effect = self.effect.take();
            let deps = std::mem::take(&mut self.deps);
            with_context(|ctx| {
                ctx.set_active_reaction(reaction);
                ctx.set_active_effect(effect);
                ctx.swap_new_deps(deps);
                ctx.set_skipped_deps(self.skipped);
            });
        }
    }

    let _saved = with_context(|ctx| Saved {
        reaction: ctx.set_active_reaction(None),
        effect: ctx.set_active_effect(None),
        deps: ctx.swap_new_deps(Vec::new()),
        skipped: ctx.get_skipped_deps(),
    });
    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_subscription_drop_removes_handler() {
        let bus = ChangeBus::new();
        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();

        let sub = bus.subscribe("name", move || count_clone.set(count_clone.get() + 1));
        assert_eq!(bus.emit("name"), 1);
        assert_eq!(count.get(), 1);

        drop(sub);
        assert_eq!(bus.emit("name"), 0);
        assert_eq!(count.get(), 1, "Released handler should not run");
        assert_eq!(bus.subscriber_count("name"), 0);
    }

    #[test]
    fn test_nested_path_keyed_by_root() {
        let bus = ChangeBus::new();
        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();

        let _sub = bus.subscribe("items.length", move || count_clone.set(count_clone.get() + 1));
        bus.emit("items");
        bus.emit("other");
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_subscribe_all_sees_every_property() {
        let bus = ChangeBus::new();
        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();

        let _sub = bus.subscribe_all(move || count_clone.set(count_clone.get() + 1));
        bus.emit("first");
        bus.emit("last.name");
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_emit_from_handler_settles_before_return() {
        let bus = ChangeBus::new();
        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();
        let relay = bus.clone();

        let _a = bus.subscribe("first", move || {
            relay.emit("second");
        });
        let _b = bus.subscribe("second", move || count_clone.set(count_clone.get() + 1));

        bus.emit("first");
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_subscription_made_in_handler_outlives_rerun() {
        let bus = ChangeBus::new();
        let count = Rc::new(Cell::new(0));
        let held: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));

        let inner_bus = bus.clone();
        let held_clone = held.clone();
        let count_clone = count.clone();
        let _outer = bus.subscribe("open", move || {
            let count = count_clone.clone();
            let sub = inner_bus.subscribe("tick", move || count.set(count.get() + 1));
            held_clone.borrow_mut().push(sub);
        });

        bus.emit("open");
        bus.emit("open");
        assert_eq!(bus.subscriber_count("tick"), 2);

        bus.emit("tick");
        assert_eq!(count.get(), 2, "Inner subscriptions survive the outer re-run");
    }

    #[test]
    fn test_change_handler_may_release_itself() {
        let bus = ChangeBus::new();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let slot_clone = slot.clone();
        let seen = Rc::new(Cell::new(0));
        let seen_clone = seen.clone();

        let sub = bus.subscribe("tick", move || {
            seen_clone.set(seen_clone.get() + 1);
            let own = slot_clone.borrow_mut().take();
            drop(own);
        });
        *slot.borrow_mut() = Some(sub);

        bus.emit("tick");
        bus.emit("tick");
        assert_eq!(seen.get(), 1);
        assert_eq!(bus.total_subscribers(), 0);
    }

    #[test]
    fn test_topics_lists_subscribed_properties() {
        let bus = ChangeBus::new();
        let _a = bus.subscribe("title.text", || {});
        let _all = bus.subscribe_all(|| {});
        assert_eq!(bus.topics(), vec!["title".to_string()]);
    }

    #[test]
    fn test_handler_may_unsubscribe_during_publish() {
        let topics: Topics<u32> = Topics::new();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let slot_clone = slot.clone();
        let seen = Rc::new(Cell::new(0));
        let seen_clone = seen.clone();

        let sub = topics.subscribe("tick", move |n| {
            seen_clone.set(seen_clone.get() + *n);
            slot_clone.borrow_mut().take();
        });
        *slot.borrow_mut() = Some(sub);

        topics.publish("tick", &5);
        topics.publish("tick", &5);
        assert_eq!(seen.get(), 5, "Handler removed itself after first publish");
        assert_eq!(topics.total(), 0);
    }

    #[test]
    fn test_into_cleanup_defers_release() {
        let bus = ChangeBus::new();
        let cleanup = bus.subscribe("a", || {}).into_cleanup();
        assert_eq!(bus.subscriber_count("a"), 1);
        cleanup();
        assert_eq!(bus.subscriber_count("a"), 0);
    }
}
