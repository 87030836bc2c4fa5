//! Typed component storage: a [`SparseSet`] plus a lock-step [`PagedVec`] of
//! values, with the three signal sinks (`on_construct`/`on_update`/
//! `on_destroy`) a `Registry` wires groups and observers into.

use std::any::Any;

use log::trace;

use crate::entity::Entity;
use crate::paged_vec::PagedVec;
use crate::signal::{Listener, Signal, SignalKind};
use crate::sparse_set::{DeletionPolicy, Erased, SortAlgorithm, SparseSet};

/// Implemented by every type usable as a component.
///
/// `POLICY` selects the storage's deletion behavior (see
/// [`DeletionPolicy`]); `PAGE_SIZE` is the per-type page size of the value
/// array. Both have sensible defaults and are ordinarily left alone;
/// `#[derive(Component)]` (feature `derive`) sets `POLICY` from a
/// `#[component(in_place_delete)]` attribute.
pub trait Component: 'static + Sized {
    /// The deletion policy this component's storage uses.
    const POLICY: DeletionPolicy = DeletionPolicy::SwapAndPop;
    /// The page size of this component's value array.
    const PAGE_SIZE: usize = 1024;
}

/// Type-erased entry point into a [`Storage<T>`], keyed by `TypeId` in the
/// registry's storage map.
///
/// This is the minimum surface the registry needs without knowing `T`:
/// dropping a whole entity has to be able to erase its component from
/// every storage it appears in without the caller naming every type.
pub trait AnyStorage: Any {
    /// Erases the component belonging to `e`, if any. Returns whether a
    /// component was actually present (and thus removed).
    fn remove_any(&mut self, e: Entity) -> bool;
    /// Whether `e` has a component in this storage.
    fn contains_any(&self, e: Entity) -> bool;
    /// Number of live components in this storage.
    fn len_any(&self) -> usize;
    /// Destroys every component, firing `on_destroy` for none of them —
    /// used only when the owning registry itself is being torn down and
    /// no further signal dispatch makes sense. Regular `clear` (which does
    /// fire signals) lives on `Storage<T>` directly.
    fn clear_any(&mut self);
    /// Frees unused page capacity.
    fn shrink_to_fit_any(&mut self);

    /// The dense-array position of `e`, if present. Used by groups to
    /// maintain the owned prefix without knowing the concrete component
    /// type.
    fn index_of_any(&self, e: Entity) -> Option<usize>;
    /// Exchanges the dense-array entries (and values) at `i` and `j`.
    fn swap_any(&mut self, i: usize, j: usize);
    /// The untyped sparse set backing this storage.
    fn sparse_any(&self) -> &SparseSet;

    /// Takes this storage's listener list for `kind` out, leaving it
    /// empty, so `Registry::fire` can invoke callbacks without holding a
    /// live borrow of the storage. See [`Signal::take`].
    fn take_signal_any(&mut self, kind: SignalKind) -> Vec<Listener>;
    /// Restores a listener list previously taken via `take_signal_any`.
    fn restore_signal_any(&mut self, kind: SignalKind, listeners: Vec<Listener>);

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A paged sparse-set storage holding every live `T`, indexed by entity.
pub struct Storage<T: Component> {
    sparse: SparseSet,
    values: PagedVec<T>,
    pub(crate) on_construct: Signal,
    pub(crate) on_update: Signal,
    pub(crate) on_destroy: Signal,
}

impl<T: Component> Default for Storage<T> {
    fn default() -> Self {
        Storage::new()
    }
}

impl<T: Component> Storage<T> {
    /// Creates an empty storage using `T::POLICY` and `T::PAGE_SIZE`.
    pub fn new() -> Self {
        Storage {
            sparse: SparseSet::new(T::POLICY),
            values: PagedVec::new(T::PAGE_SIZE),
            on_construct: Signal::new(),
            on_update: Signal::new(),
            on_destroy: Signal::new(),
        }
    }

    /// The untyped sparse set backing this storage. Used by views and
    /// groups, which only need entity membership and dense-order, not `T`.
    pub fn sparse(&self) -> &SparseSet {
        &self.sparse
    }

    /// Number of live components.
    pub fn len(&self) -> usize {
        self.sparse.len()
    }

    /// Whether this storage holds no live components.
    pub fn is_empty(&self) -> bool {
        self.sparse.is_empty()
    }

    /// Whether `e` has a component here.
    pub fn contains(&self, e: Entity) -> bool {
        self.sparse.contains(e)
    }

    /// A reference to `e`'s component.
    ///
    /// Precondition: `self.contains(e)`.
    pub fn get(&self, e: Entity) -> &T {
        let pos = self.sparse.index_of(e).expect("get of a missing component");
        // SAFETY: `pos` was just looked up as live.
        unsafe { self.values.get(pos) }
    }

    /// A mutable reference to `e`'s component.
    ///
    /// Precondition: `self.contains(e)`.
    pub fn get_mut(&mut self, e: Entity) -> &mut T {
        let pos = self.sparse.index_of(e).expect("get_mut of a missing component");
        // SAFETY: `pos` was just looked up as live.
        unsafe { self.values.get_mut(pos) }
    }

    /// A reference to `e`'s component, or `None` if it has none.
    pub fn get_if(&self, e: Entity) -> Option<&T> {
        let pos = self.sparse.index_of(e)?;
        // SAFETY: `pos` came from a successful lookup.
        Some(unsafe { self.values.get(pos) })
    }

    /// A mutable reference to `e`'s component, or `None` if it has none.
    pub fn get_mut_if(&mut self, e: Entity) -> Option<&mut T> {
        let pos = self.sparse.index_of(e)?;
        // SAFETY: `pos` came from a successful lookup.
        Some(unsafe { self.values.get_mut(pos) })
    }

    /// Inserts `value` for `e`, *without* firing `on_construct`. The
    /// registry calls this and then fires the signal itself, since firing
    /// needs a `&mut Registry` this method deliberately doesn't have.
    ///
    /// Precondition: `!self.contains(e)`.
    pub(crate) fn insert_raw(&mut self, e: Entity, value: T) {
        let pos = self.sparse.push(e);
        self.values.write(pos, value);
        trace!("inserted {} for {:?}", std::any::type_name::<T>(), e);
    }

    /// Removes `e`'s component and returns it, *without* firing
    /// `on_destroy`.
    ///
    /// Precondition: `self.contains(e)`.
    pub(crate) fn remove_raw(&mut self, e: Entity) -> T {
        trace!("removed {} for {:?}", std::any::type_name::<T>(), e);
        match self.sparse.erase(e) {
            Erased::Swapped { pos, .. } => {
                let last = self.values.len() - 1;
                let value = unsafe { self.values.take(pos) };
                if pos != last {
                    self.values.swap(pos, last);
                }
                self.values.truncate_len(last);
                value
            }
            Erased::Removed { pos } => {
                let value = unsafe { self.values.take(pos) };
                self.values.truncate_len(pos);
                value
            }
            Erased::Tombstoned { pos } => unsafe { self.values.take(pos) },
        }
    }

    /// Destroys every component without firing any signal. Used when
    /// tearing down a whole registry.
    pub fn clear_silent(&mut self) {
        for e in self.sparse.iter().collect::<Vec<_>>() {
            self.remove_raw(e);
        }
        self.sparse.clear();
        self.values.clear();
    }

    /// Live entities, most-recently-inserted first (see
    /// [`SparseSet::iter`]).
    pub fn entities(&self) -> impl DoubleEndedIterator<Item = Entity> + '_ {
        self.sparse.iter()
    }

    /// Live entities paired with their component, most-recently-inserted
    /// first, tombstones skipped.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (Entity, &T)> + '_ {
        let is_in_place = matches!(self.sparse.policy(), DeletionPolicy::InPlaceDelete);
        self.sparse
            .dense()
            .iter()
            .enumerate()
            .rev()
            .filter(move |(_, e)| !(is_in_place && e.is_tombstone()))
            .map(move |(pos, &e)| (e, unsafe { self.values.get(pos) }))
    }

    /// Exchanges the dense-array entries (and their values) at `i` and `j`.
    pub fn swap(&mut self, i: usize, j: usize) {
        self.sparse.swap(i, j);
        self.values.swap(i, j);
    }

    /// Reorders this storage's dense array (and its values in lock-step)
    /// so shared entities appear in `other`'s relative order.
    pub fn sort_as(&mut self, other: &SparseSet) {
        // `sort_as` is expressed in terms of `SparseSet::swap`, which does
        // not know about `values`; redo it here so both arrays move
        // together. Walks `other`'s raw physical order, not its `iter()`
        // presentation order, since the positional invariant this is meant
        // to establish is defined on raw index comparisons.
        let mut next = 0usize;
        for e in other.forward_positions() {
            if let Some(pos) = self.sparse.index_of(e) {
                self.swap(next, pos);
                next += 1;
            }
        }
    }

    /// Sorts live components by `cmp`, keeping the value array in
    /// lock-step with the entity dense array.
    pub fn sort_by<F>(&mut self, cmp: F, algo: SortAlgorithm)
    where
        F: FnMut(Entity, Entity) -> std::cmp::Ordering,
    {
        let values = &mut self.values;
        self.sparse.sort_by(cmp, algo, |i, j| values.swap(i, j));
    }

    /// Invokes `f` against `e`'s component, fires no signal (the registry
    /// fires `on_update` after calling this).
    pub(crate) fn patch_raw<F>(&mut self, e: Entity, f: F)
    where
        F: FnOnce(&mut T),
    {
        f(self.get_mut(e));
    }

    pub(crate) fn signal(&mut self, kind: SignalKind) -> &mut Signal {
        match kind {
            SignalKind::Construct => &mut self.on_construct,
            SignalKind::Update => &mut self.on_update,
            SignalKind::Destroy => &mut self.on_destroy,
        }
    }
}

impl<T: Component> AnyStorage for Storage<T> {
    fn remove_any(&mut self, e: Entity) -> bool {
        if self.contains(e) {
            self.remove_raw(e);
            true
        } else {
            false
        }
    }

    fn contains_any(&self, e: Entity) -> bool {
        self.contains(e)
    }

    fn len_any(&self) -> usize {
        self.len()
    }

    fn clear_any(&mut self) {
        self.clear_silent();
    }

    fn shrink_to_fit_any(&mut self) {
        self.sparse.shrink_to_fit();
        self.values.shrink_to_fit();
    }

    fn index_of_any(&self, e: Entity) -> Option<usize> {
        self.sparse.index_of(e)
    }

    fn swap_any(&mut self, i: usize, j: usize) {
        self.swap(i, j);
    }

    fn sparse_any(&self) -> &SparseSet {
        &self.sparse
    }

    fn take_signal_any(&mut self, kind: SignalKind) -> Vec<Listener> {
        self.signal(kind).take()
    }

    fn restore_signal_any(&mut self, kind: SignalKind, listeners: Vec<Listener>) {
        self.signal(kind).restore(listeners);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Clone, Copy)]
    struct Pos(i32);
    impl Component for Pos {}

    fn e(i: u32) -> Entity {
        Entity::new(i, 0)
    }

    #[test]
    fn insert_and_get() {
        let mut s = Storage::<Pos>::new();
        s.insert_raw(e(1), Pos(10));
        assert_eq!(*s.get(e(1)), Pos(10));
    }

    #[test]
    fn remove_returns_value() {
        let mut s = Storage::<Pos>::new();
        s.insert_raw(e(1), Pos(10));
        s.insert_raw(e(2), Pos(20));
        let removed = s.remove_raw(e(1));
        assert_eq!(removed, Pos(10));
        assert_eq!(*s.get(e(2)), Pos(20));
        assert!(!s.contains(e(1)));
    }

    #[test]
    fn zero_sized_component_roundtrips() {
        #[derive(Debug, PartialEq, Clone, Copy)]
        struct Tag;
        impl Component for Tag {}

        let mut s = Storage::<Tag>::new();
        s.insert_raw(e(5), Tag);
        assert!(s.contains(e(5)));
        assert_eq!(*s.get(e(5)), Tag);
    }
}
