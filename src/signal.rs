//! Per-storage signal sinks: `on_construct`, `on_update`, `on_destroy`.
//!
//! Each storage owns three of these. They are the mechanism groups use to
//! stay in sync with component churn (see `group.rs`), and are equally
//! available to external observers via `Registry::on_construct` and
//! friends. Callbacks fire synchronously, in registration order, with
//! `(&mut Registry, Entity)`.

use crate::registry::Registry;
use crate::entity::Entity;

/// A callback subscribed to a [`Signal`].
pub type Listener = Box<dyn FnMut(&mut Registry, Entity)>;

/// An ordered multicast sink.
///
/// `Signal` holds no lock and performs no reentrancy checks: firing a
/// signal while another fire for the *same* storage and entity is already
/// in progress is the subscriber's responsibility to avoid (see §4.D).
/// What `Signal` does guarantee is safe concurrent-with-firing
/// *registration*: a listener that subscribes a new callback from inside
/// its own invocation does not observe a panic or a lost callback: the new
/// listener is simply appended and picked up on the next fire, not the one
/// in progress.
#[derive(Default)]
pub struct Signal {
    listeners: Vec<Listener>,
}

impl Signal {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Signal {
            listeners: Vec::new(),
        }
    }

    /// Appends a listener, to be called after every previously-registered
    /// one.
    pub fn connect<F>(&mut self, f: F)
    where
        F: FnMut(&mut Registry, Entity) + 'static,
    {
        self.listeners.push(Box::new(f));
    }

    /// Removes every listener.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    /// Whether any listener is currently registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Takes the current listener list out, leaving the sink empty. Used
    /// by `Registry::fire` to invoke callbacks without holding a live
    /// borrow of the storage that owns this sink, then restores them
    /// (with any listeners added mid-fire appended at the end).
    pub(crate) fn take(&mut self) -> Vec<Listener> {
        std::mem::take(&mut self.listeners)
    }

    /// Restores a previously-taken listener list, preserving registration
    /// order and keeping anything added while the sink was empty.
    pub(crate) fn restore(&mut self, mut taken: Vec<Listener>) {
        taken.append(&mut self.listeners);
        self.listeners = taken;
    }
}

impl std::fmt::Debug for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Which of a storage's three signals fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// Fired after a component is constructed (by `emplace`/`insert`), but
    /// before the call that triggered it returns.
    Construct,
    /// Fired after `patch` runs the user closures against a component.
    Update,
    /// Fired before a component is destroyed.
    Destroy,
}
