//! The registry: entity lifecycle, component storage map, signal dispatch,
//! groups, and the `ctx()` side channel. This is the crate's single
//! stateful object; everything else (`View`, `Group`, `Storage<T>`) borrows
//! from it.

use std::any::TypeId;
use std::cmp::Ordering;

use ahash::AHashMap;
use log::{trace, warn};

use crate::context::Context;
use crate::entity::{next_version, Entity, Index, NULL_INDEX, TOMBSTONE_VERSION};
use crate::error::Error;
use crate::group::{self, ExcludedHooks, Group, GroupId, GroupState, RequiredHooks};
use crate::signal::SignalKind;
use crate::sparse_set::{SortAlgorithm, SparseSet};
use crate::storage::{AnyStorage, Component, Storage};
use crate::view::{Fetch, TypeList, View};

/// The entity-component-system core: owns every entity, every component
/// storage, every registered group, and the `ctx()` side channel.
#[derive(Default)]
pub struct Registry {
    /// Slot array. A live slot holds the entity currently occupying it; a
    /// free slot's index field is repurposed as a pointer to the next free
    /// slot (an intrusive singly-linked free list), with its version field
    /// already bumped to what the *next* occupant of the slot will get.
    entities: Vec<Entity>,
    /// Parallel to `entities`; `alive[i]` avoids an O(n) free-list walk to
    /// answer "is slot i currently live".
    alive: Vec<bool>,
    free_head: Index,
    storages: AHashMap<TypeId, Box<dyn AnyStorage>>,
    groups: Vec<GroupState>,
    context: Context,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Registry {
            entities: Vec::new(),
            alive: Vec::new(),
            free_head: NULL_INDEX,
            storages: AHashMap::default(),
            groups: Vec::new(),
            context: Context::new(),
        }
    }

    // ---------------------------------------------------------------
    // Entity lifecycle
    // ---------------------------------------------------------------

    /// Creates a new entity, recycling a released slot if one is free.
    pub fn create(&mut self) -> Entity {
        if self.free_head != NULL_INDEX {
            let idx = self.free_head;
            let slot = self.entities[idx as usize];
            self.free_head = slot.index();
            let e = Entity::new(idx, slot.version());
            self.entities[idx as usize] = e;
            self.alive[idx as usize] = true;
            trace!("recycled {:?}", e);
            e
        } else {
            let idx = self.entities.len() as Index;
            debug_assert!(idx < NULL_INDEX, "entity index space exhausted");
            let e = Entity::new(idx, 0);
            self.entities.push(e);
            self.alive.push(true);
            trace!("created {:?}", e);
            e
        }
    }

    fn push_new_free_slot(&mut self) {
        let idx = self.entities.len() as Index;
        self.entities.push(Entity::new(self.free_head, 0));
        self.alive.push(false);
        self.free_head = idx;
    }

    fn unlink_free(&mut self, idx: Index) {
        if self.free_head == idx {
            self.free_head = self.entities[idx as usize].index();
            return;
        }
        let mut cur = self.free_head;
        loop {
            debug_assert!(cur != NULL_INDEX, "slot not found on the free list");
            let next = self.entities[cur as usize].index();
            if next == idx {
                let after = self.entities[idx as usize].index();
                let version = self.entities[cur as usize].version();
                self.entities[cur as usize] = Entity::new(after, version);
                return;
            }
            cur = next;
        }
    }

    /// Creates an entity reusing `hint`'s index, recycling the slot early
    /// (splicing it out of the free list) or extending the entity array
    /// with intermediate free slots as needed so `hint.index()` becomes
    /// valid. If the slot named by `hint` is currently live, falls back to
    /// [`Registry::create`].
    ///
    /// Precondition: `hint.version() != TOMBSTONE_VERSION`.
    pub fn create_with_hint(&mut self, hint: Entity) -> Entity {
        debug_assert!(
            hint.version() != TOMBSTONE_VERSION,
            "hint carries the tombstone version"
        );
        let idx = hint.index();
        if (idx as usize) < self.entities.len() {
            if !self.alive[idx as usize] {
                self.unlink_free(idx);
                let e = Entity::new(idx, hint.version());
                self.entities[idx as usize] = e;
                self.alive[idx as usize] = true;
                trace!("recycled {:?} via hint", e);
                e
            } else {
                self.create()
            }
        } else {
            while (self.entities.len() as Index) < idx {
                self.push_new_free_slot();
            }
            let e = Entity::new(idx, hint.version());
            self.entities.push(e);
            self.alive.push(true);
            trace!("created {:?} via hint", e);
            e
        }
    }

    /// Releases `e`'s slot, bumping its version so stale copies of `e`
    /// become distinguishable from whatever is created next in the same
    /// slot, and returning the slot to the free list.
    ///
    /// Precondition: `self.valid(e)` and `e` has no remaining components
    /// (destroying a populated entity is `Registry::destroy`).
    pub fn release(&mut self, e: Entity) {
        self.release_as(e, next_version(e.version()));
    }

    /// Like [`Registry::release`], but sets the slot's next version
    /// explicitly. Passing [`crate::entity::TOMBSTONE_VERSION`] retires the
    /// slot permanently: it is marked dead but never linked back onto the
    /// free list, so its index is never reissued.
    pub fn release_as(&mut self, e: Entity, version: Index) {
        debug_assert!(self.valid(e), "release of an invalid entity");
        let idx = e.index();
        self.alive[idx as usize] = false;
        if version == TOMBSTONE_VERSION {
            self.entities[idx as usize] = Entity::new(NULL_INDEX, version);
        } else {
            self.entities[idx as usize] = Entity::new(self.free_head, version);
            self.free_head = idx;
        }
        trace!("released {:?}", e);
    }

    /// Erases every component `e` has, firing each storage's `on_destroy`
    /// before the component is actually removed, then releases `e`.
    pub fn destroy(&mut self, e: Entity) {
        debug_assert!(self.valid(e), "destroy of an invalid entity");
        let owners: Vec<TypeId> = self
            .storages
            .iter()
            .filter(|(_, s)| s.contains_any(e))
            .map(|(t, _)| *t)
            .collect();
        for t in owners {
            self.erase_dyn(t, e);
        }
        self.release(e);
    }

    /// Whether `e` currently names a live slot (matching index *and*
    /// version).
    pub fn valid(&self, e: Entity) -> bool {
        if e.is_null() {
            return false;
        }
        let idx = e.index() as usize;
        idx < self.entities.len() && self.alive[idx] && self.entities[idx] == e
    }

    /// The version currently assigned to `index`'s slot (0 if the slot has
    /// never been used).
    pub fn current_version(&self, index: Index) -> Index {
        self.entities.get(index as usize).map_or(0, |e| e.version())
    }

    /// Visits every currently-live entity.
    pub fn each(&self, mut f: impl FnMut(Entity)) {
        for (idx, &alive) in self.alive.iter().enumerate() {
            if alive {
                f(self.entities[idx]);
            }
        }
    }

    /// Visits every currently-live entity with no components at all.
    pub fn orphans(&self, mut f: impl FnMut(Entity)) {
        self.each(|e| {
            if !self.storages.values().any(|s| s.contains_any(e)) {
                f(e);
            }
        });
    }

    // ---------------------------------------------------------------
    // Component access
    // ---------------------------------------------------------------

    /// The storage for `T`, if it has ever been touched.
    pub fn storage<T: Component>(&self) -> Option<&Storage<T>> {
        self.storages
            .get(&TypeId::of::<T>())
            .map(|b| b.as_any().downcast_ref::<Storage<T>>().expect("TypeId-keyed"))
    }

    /// The storage for `T`, creating an empty one on first touch.
    pub fn storage_mut<T: Component>(&mut self) -> &mut Storage<T> {
        self.storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Storage::<T>::new()))
            .as_any_mut()
            .downcast_mut::<Storage<T>>()
            .expect("TypeId-keyed")
    }

    pub(crate) fn storage_dyn(&self, t: &TypeId) -> Option<&dyn AnyStorage> {
        self.storages.get(t).map(|b| b.as_ref())
    }

    pub(crate) fn storage_dyn_mut(&mut self, t: &TypeId) -> Option<&mut (dyn AnyStorage + 'static)> {
        self.storages.get_mut(t).map(|b| b.as_mut())
    }

    fn fire(&mut self, type_id: TypeId, kind: SignalKind, e: Entity) {
        let mut listeners = match self.storages.get_mut(&type_id) {
            Some(s) => s.take_signal_any(kind),
            None => return,
        };
        for l in listeners.iter_mut() {
            l(self, e);
        }
        if let Some(s) = self.storages.get_mut(&type_id) {
            s.restore_signal_any(kind, listeners);
        }
    }

    /// Constructs a `T` for `e` and fires `on_construct`.
    ///
    /// Precondition: `self.valid(e)` and `e` has no existing `T`.
    pub fn emplace<T: Component>(&mut self, e: Entity, value: T) -> &mut T {
        debug_assert!(self.valid(e), "emplace on an invalid entity");
        debug_assert!(
            !self.storage::<T>().map_or(false, |s| s.contains(e)),
            "emplace of a component that's already present"
        );
        self.storage_mut::<T>().insert_raw(e, value);
        self.fire(TypeId::of::<T>(), SignalKind::Construct, e);
        self.storage_mut::<T>().get_mut(e)
    }

    /// Returns `e`'s existing `T` if present, otherwise constructs one from
    /// `value` (firing `on_construct`).
    pub fn get_or_emplace<T: Component>(&mut self, e: Entity, value: T) -> &mut T {
        if self.storage::<T>().map_or(false, |s| s.contains(e)) {
            self.storage_mut::<T>().get_mut(e)
        } else {
            self.emplace(e, value)
        }
    }

    /// Constructs a `T` for `e` if absent (firing `on_construct`), or
    /// overwrites the existing one (firing `on_update`).
    pub fn emplace_or_replace<T: Component>(&mut self, e: Entity, value: T) -> &mut T {
        if self.storage::<T>().map_or(false, |s| s.contains(e)) {
            self.replace(e, value)
        } else {
            self.emplace(e, value)
        }
    }

    /// Overwrites `e`'s existing `T` and fires `on_update`.
    ///
    /// Precondition: `e` already has a `T`.
    pub fn replace<T: Component>(&mut self, e: Entity, value: T) -> &mut T {
        debug_assert!(
            self.storage::<T>().map_or(false, |s| s.contains(e)),
            "replace of a missing component"
        );
        *self.storage_mut::<T>().get_mut(e) = value;
        self.fire(TypeId::of::<T>(), SignalKind::Update, e);
        self.storage_mut::<T>().get_mut(e)
    }

    /// Invokes `f` against `e`'s stored `T`, then fires `on_update` once.
    ///
    /// Precondition: `e` already has a `T`.
    pub fn patch<T: Component>(&mut self, e: Entity, f: impl FnOnce(&mut T)) -> &mut T {
        debug_assert!(
            self.storage::<T>().map_or(false, |s| s.contains(e)),
            "patch of a missing component"
        );
        self.storage_mut::<T>().patch_raw(e, f);
        self.fire(TypeId::of::<T>(), SignalKind::Update, e);
        self.storage_mut::<T>().get_mut(e)
    }

    fn erase_dyn(&mut self, type_id: TypeId, e: Entity) {
        self.fire(type_id, SignalKind::Destroy, e);
        if let Some(s) = self.storages.get_mut(&type_id) {
            s.remove_any(e);
        }
    }

    /// Destroys `e`'s `T`, firing `on_destroy` first.
    ///
    /// Precondition: `e` has a `T`.
    pub fn erase<T: Component>(&mut self, e: Entity) {
        debug_assert!(
            self.storage::<T>().map_or(false, |s| s.contains(e)),
            "erase of a missing component"
        );
        self.erase_dyn(TypeId::of::<T>(), e);
    }

    /// Destroys `e`'s `T` if present, firing `on_destroy` first. Returns
    /// `1` if a component was removed, `0` if `e` had none.
    pub fn remove<T: Component>(&mut self, e: Entity) -> usize {
        if self.storage::<T>().map_or(false, |s| s.contains(e)) {
            self.erase_dyn(TypeId::of::<T>(), e);
            1
        } else {
            0
        }
    }

    /// Destroys every live `T`, firing `on_destroy` for each.
    pub fn clear_component<T: Component>(&mut self) {
        let entities: Vec<Entity> = self
            .storage::<T>()
            .map(|s| s.entities().collect())
            .unwrap_or_default();
        for e in entities {
            self.erase_dyn(TypeId::of::<T>(), e);
        }
    }

    /// A reference to `e`'s component(s). `Q` is a single component type or
    /// a tuple of up to six distinct ones.
    ///
    /// Precondition: `e` has every type in `Q`.
    pub fn get<Q: Fetch>(&mut self, e: Entity) -> Q::Item<'_> {
        debug_assert!(Q::contains_all(self, e), "get of a missing component");
        unsafe { Q::get_unchecked(self, e) }
    }

    /// Like [`Registry::get`], returning `None` instead of asserting if `e`
    /// is missing any of `Q`'s types.
    pub fn try_get<Q: Fetch>(&mut self, e: Entity) -> Option<Q::Item<'_>> {
        if Q::contains_all(self, e) {
            Some(unsafe { Q::get_unchecked(self, e) })
        } else {
            None
        }
    }

    /// Whether `e` has every component type in `Q`.
    pub fn all_of<Q: TypeList>(&self, e: Entity) -> bool {
        Q::type_ids()
            .iter()
            .all(|t| self.storage_dyn(t).map_or(false, |s| s.contains_any(e)))
    }

    /// Whether `e` has at least one component type in `Q`.
    pub fn any_of<Q: TypeList>(&self, e: Entity) -> bool {
        Q::type_ids()
            .iter()
            .any(|t| self.storage_dyn(t).map_or(false, |s| s.contains_any(e)))
    }

    // ---------------------------------------------------------------
    // Signals
    // ---------------------------------------------------------------

    /// Subscribes `f` to `T`'s `on_construct` signal.
    pub fn on_construct<T: Component>(&mut self, f: impl FnMut(&mut Registry, Entity) + 'static) {
        self.storage_mut::<T>().signal(SignalKind::Construct).connect(f);
    }

    /// Subscribes `f` to `T`'s `on_update` signal.
    pub fn on_update<T: Component>(&mut self, f: impl FnMut(&mut Registry, Entity) + 'static) {
        self.storage_mut::<T>().signal(SignalKind::Update).connect(f);
    }

    /// Subscribes `f` to `T`'s `on_destroy` signal.
    pub fn on_destroy<T: Component>(&mut self, f: impl FnMut(&mut Registry, Entity) + 'static) {
        self.storage_mut::<T>().signal(SignalKind::Destroy).connect(f);
    }

    // ---------------------------------------------------------------
    // Sorting
    // ---------------------------------------------------------------

    /// Whether `T` may currently be sorted — `false` if some active group
    /// owns it (an owning group's partition invariant would be destroyed
    /// by an arbitrary reorder).
    pub fn sortable<T: Component>(&self) -> bool {
        let id = TypeId::of::<T>();
        !self.groups.iter().any(|g| g.owned.contains(&id))
    }

    /// Sorts `T`'s live components by `cmp`.
    ///
    /// Fails with [`Error::SortOwned`] if `T` is owned by an active group.
    pub fn sort<T: Component>(
        &mut self,
        cmp: impl FnMut(Entity, Entity) -> Ordering,
        algo: SortAlgorithm,
    ) -> Result<(), Error> {
        if !self.sortable::<T>() {
            let component = std::any::type_name::<T>();
            warn!("refusing to sort `{}`: owned by an active group", component);
            return Err(Error::SortOwned { component });
        }
        self.storage_mut::<T>().sort_by(cmp, algo);
        Ok(())
    }

    /// Reorders `To`'s storage so that entities it shares with `From`
    /// appear in `From`'s relative order.
    ///
    /// Fails with [`Error::SortOwned`] if `To` is owned by an active group.
    pub fn sort_as<To: Component, From: Component>(&mut self) -> Result<(), Error> {
        if !self.sortable::<To>() {
            let component = std::any::type_name::<To>();
            warn!("refusing to sort `{}`: owned by an active group", component);
            return Err(Error::SortOwned { component });
        }
        let from_sparse: SparseSet = self
            .storage::<From>()
            .map(|s| s.sparse().clone())
            .unwrap_or_else(|| SparseSet::new(crate::sparse_set::DeletionPolicy::SwapAndPop));
        self.storage_mut::<To>().sort_as(&from_sparse);
        Ok(())
    }

    // ---------------------------------------------------------------
    // Views
    // ---------------------------------------------------------------

    /// A stateless query over every entity holding one component of each
    /// type in `Q`.
    pub fn view<Q: Fetch>(&mut self) -> View<'_, Q> {
        View::new(self, Vec::new())
    }

    /// Like [`Registry::view`], additionally excluding any entity holding a
    /// component of a type in `Ex`.
    pub fn view_excluding<Q: Fetch, Ex: TypeList>(&mut self) -> View<'_, Q> {
        let exclude = Ex::type_ids();
        View::new(self, exclude)
    }

    // ---------------------------------------------------------------
    // Groups
    // ---------------------------------------------------------------

    fn register_group<Owned, Get, Exclude>(&mut self) -> Result<Group<Owned, Get, Exclude>, Error>
    where
        Owned: TypeList + RequiredHooks,
        Get: TypeList + RequiredHooks,
        Exclude: TypeList + ExcludedHooks,
    {
        let owned = Owned::type_ids();
        let owned_names = Owned::type_names();
        let get = Get::type_ids();
        let exclude = Exclude::type_ids();

        if let Some(id) = group::find_existing(&self.groups, &owned, &get, &exclude) {
            return Ok(Group {
                id,
                _marker: std::marker::PhantomData,
            });
        }

        group::check_conflicts(&self.groups, &owned, &owned_names, &get, &exclude)?;

        Owned::ensure_storages(self);
        Get::ensure_storages(self);
        Exclude::ensure_storages(self);

        let mut state = group::new_state(owned, owned_names, get, exclude);
        group::populate(&mut state, self);

        let id = GroupId(self.groups.len());
        self.groups.push(state);
        trace!("registered group {:?}", id);

        Owned::connect(self, id);
        Get::connect(self, id);
        Exclude::connect(self, id);

        Ok(Group {
            id,
            _marker: std::marker::PhantomData,
        })
    }

    /// Registers (or looks up) a group owning every type in `Owned`.
    pub fn group<Owned: TypeList + RequiredHooks>(&mut self) -> Result<Group<Owned, (), ()>, Error> {
        self.register_group::<Owned, (), ()>()
    }

    /// Registers (or looks up) a group owning `Owned` and additionally
    /// requiring (without rearranging) every type in `Get`.
    pub fn group_get<Owned, Get>(&mut self) -> Result<Group<Owned, Get, ()>, Error>
    where
        Owned: TypeList + RequiredHooks,
        Get: TypeList + RequiredHooks,
    {
        self.register_group::<Owned, Get, ()>()
    }

    /// Registers (or looks up) a group owning `Owned` and excluding any
    /// entity holding a component of a type in `Exclude`.
    pub fn group_excluding<Owned, Exclude>(&mut self) -> Result<Group<Owned, (), Exclude>, Error>
    where
        Owned: TypeList + RequiredHooks,
        Exclude: TypeList + ExcludedHooks,
    {
        self.register_group::<Owned, (), Exclude>()
    }

    /// Registers (or looks up) a group owning `Owned`, requiring `Get`, and
    /// excluding `Exclude`.
    pub fn group_full<Owned, Get, Exclude>(&mut self) -> Result<Group<Owned, Get, Exclude>, Error>
    where
        Owned: TypeList + RequiredHooks,
        Get: TypeList + RequiredHooks,
        Exclude: TypeList + ExcludedHooks,
    {
        self.register_group::<Owned, Get, Exclude>()
    }

    pub(crate) fn group_try_add(&mut self, id: GroupId, e: Entity, ignore_exclude: Option<TypeId>) {
        let mut state = std::mem::take(&mut self.groups[id.0]);
        state.try_add(self, e, ignore_exclude);
        self.groups[id.0] = state;
    }

    pub(crate) fn group_try_remove(&mut self, id: GroupId, e: Entity) {
        let mut state = std::mem::take(&mut self.groups[id.0]);
        state.try_remove(self, e);
        self.groups[id.0] = state;
    }

    pub(crate) fn group_len(&self, id: GroupId) -> usize {
        self.groups[id.0].len()
    }

    pub(crate) fn group_entities(&self, id: GroupId) -> Vec<Entity> {
        self.groups[id.0].entities(self)
    }

    pub(crate) fn group_contains(&self, id: GroupId, e: Entity) -> bool {
        self.groups[id.0].contains(self, e)
    }

    pub(crate) fn group_sort(&mut self, id: GroupId, cmp: impl FnMut(Entity, Entity) -> Ordering) {
        let mut state = std::mem::take(&mut self.groups[id.0]);
        state.sort(self, cmp);
        self.groups[id.0] = state;
    }

    // ---------------------------------------------------------------
    // Context
    // ---------------------------------------------------------------

    /// The registry's type-keyed side channel, for values that don't
    /// belong to any one entity.
    pub fn ctx(&mut self) -> &mut Context {
        &mut self.context
    }

    // ---------------------------------------------------------------
    // Registry lifecycle
    // ---------------------------------------------------------------

    /// Destroys every entity, every component, and every group, without
    /// firing any signal — a hard reset, not an ordered teardown.
    pub fn clear(&mut self) {
        for s in self.storages.values_mut() {
            s.clear_any();
        }
        self.storages.clear();
        self.groups.clear();
        self.entities.clear();
        self.alive.clear();
        self.free_head = NULL_INDEX;
        self.context = Context::new();
    }

    /// Reserves capacity for at least `additional` more entities.
    pub fn reserve(&mut self, additional: usize) {
        self.entities.reserve(additional);
        self.alive.reserve(additional);
    }

    /// Shrinks the entity array and every storage's backing pages to fit
    /// their current contents.
    pub fn shrink_to_fit(&mut self) {
        self.entities.shrink_to_fit();
        self.alive.shrink_to_fit();
        for s in self.storages.values_mut() {
            s.shrink_to_fit_any();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Clone, Copy)]
    struct Pos(i32, i32);
    impl Component for Pos {}

    #[derive(Debug, PartialEq, Clone, Copy)]
    struct Vel(i32, i32);
    impl Component for Vel {}

    #[test]
    fn create_and_destroy_recycles_with_bumped_version() {
        let mut r = Registry::new();
        let e0 = r.create();
        assert!(r.valid(e0));
        r.destroy(e0);
        assert!(!r.valid(e0));

        let e1 = r.create();
        assert_eq!(e1.index(), e0.index());
        assert_eq!(e1.version(), e0.version() + 1);
    }

    #[test]
    fn emplace_get_erase() {
        let mut r = Registry::new();
        let e = r.create();
        r.emplace(e, Pos(1, 2));
        assert_eq!(*r.get::<(Pos,)>(e).0, Pos(1, 2));
        r.erase::<Pos>(e);
        assert!(!r.all_of::<(Pos,)>(e));
    }

    #[test]
    fn remove_is_a_noop_when_absent() {
        let mut r = Registry::new();
        let e = r.create();
        assert_eq!(r.remove::<Pos>(e), 0);
        r.emplace(e, Pos(0, 0));
        assert_eq!(r.remove::<Pos>(e), 1);
        assert_eq!(r.remove::<Pos>(e), 0);
    }

    #[test]
    fn signals_fire_in_order() {
        let mut r = Registry::new();
        r.ctx().emplace(Vec::<&'static str>::new());
        r.on_construct::<Pos>(|r, _| r.ctx().get_mut::<Vec<&'static str>>().unwrap().push("construct"));
        r.on_destroy::<Pos>(|r, _| r.ctx().get_mut::<Vec<&'static str>>().unwrap().push("destroy"));
        let e = r.create();
        r.emplace(e, Pos(0, 0));
        r.erase::<Pos>(e);
        assert_eq!(
            r.ctx().get::<Vec<&'static str>>().unwrap().as_slice(),
            &["construct", "destroy"]
        );
    }

    #[test]
    fn view_iterates_entities_with_both_components() {
        let mut r = Registry::new();
        let a = r.create();
        r.emplace(a, Pos(1, 1));
        r.emplace(a, Vel(1, 0));
        let b = r.create();
        r.emplace(b, Pos(2, 2));

        let mut seen = Vec::new();
        r.view::<(Pos, Vel)>().each(|e, (pos, _vel)| {
            seen.push((e, *pos));
        });
        assert_eq!(seen, vec![(a, Pos(1, 1))]);
    }

    #[test]
    fn owning_group_tracks_membership_through_churn() {
        let mut r = Registry::new();
        let g = r.group::<(Pos,)>().unwrap();
        let a = r.create();
        r.emplace(a, Pos(1, 1));
        assert_eq!(g.len(&r), 1);
        assert!(g.contains(&r, a));

        r.erase::<Pos>(a);
        assert_eq!(g.len(&r), 0);

        r.emplace(a, Pos(3, 3));
        assert_eq!(g.len(&r), 1);
    }

    #[test]
    fn create_with_hint_splices_out_of_free_list() {
        let mut r = Registry::new();
        let a = r.create();
        let b = r.create();
        r.destroy(a);
        r.destroy(b);
        let hint = Entity::new(b.index(), b.version() + 1);
        let recreated = r.create_with_hint(hint);
        assert_eq!(recreated, hint);
        assert!(r.valid(recreated));
    }
}
