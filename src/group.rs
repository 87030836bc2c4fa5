//! Groups: persistent, incrementally-maintained query results.
//!
//! Where a [`View`](crate::View) recomputes its matches on every iteration,
//! a group keeps a running answer up to date as components come and go, by
//! subscribing to the relevant storages' signals (see `signal.rs`). Two
//! flavors:
//!
//! * **Owning** groups (`owned` non-empty) physically partition every owned
//!   pool's dense array so the first `length` entries are exactly the
//!   group's members, in identical relative order across every owned pool.
//!   Iterating is then a plain slice walk with no membership test at all.
//! * **Non-owning** groups (`owned` empty, built from `get`/`exclude` only)
//!   keep a private [`SparseSet`] of matching entities instead, since they
//!   have no pool of their own to rearrange.
//!
//! Two groups are compatible iff their owned sets are disjoint, or one
//! group's owned/get/exclude sets each nest inside (are supersets of) the
//! other's — see [`compatible`]. Registration fails with
//! [`Error::GroupConflict`] otherwise.

use std::any::TypeId;
use std::cmp::Ordering;
use std::marker::PhantomData;

use log::{trace, warn};

use crate::entity::Entity;
use crate::error::{Error, GroupConflict};
use crate::registry::Registry;
use crate::sparse_set::{DeletionPolicy, SparseSet};
use crate::view::TypeList;

/// Opaque handle into `Registry`'s group table. `Group<Owned, Get, Exclude>`
/// wraps one of these with the type information needed to check that a
/// caller asks a group for the query it actually was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupId(pub(crate) usize);

/// The registry-internal, fully type-erased state of one registered group.
/// Everything here is addressed by `TypeId`, looked up dynamically against
/// the registry's storage map — the static `Owned`/`Get`/`Exclude` types
/// only exist at the call sites that build and read a [`Group`] handle.
#[derive(Default)]
pub(crate) struct GroupState {
    pub(crate) owned: Vec<TypeId>,
    pub(crate) owned_names: Vec<&'static str>,
    pub(crate) get: Vec<TypeId>,
    pub(crate) exclude: Vec<TypeId>,
    length: usize,
    non_owning: Option<SparseSet>,
}

fn is_superset(a: &[TypeId], b: &[TypeId]) -> bool {
    b.iter().all(|t| a.contains(t))
}

fn is_disjoint(a: &[TypeId], b: &[TypeId]) -> bool {
    !a.iter().any(|t| b.contains(t))
}

fn same_set(a: &[TypeId], b: &[TypeId]) -> bool {
    a.len() == b.len() && is_superset(a, b)
}

/// Whether two group specifications may coexist. Either their owned sets
/// don't overlap at all, or one specification's owned/get/exclude sets are
/// each a superset of the other's (the narrower group nests inside the
/// broader one).
fn compatible(
    a_owned: &[TypeId],
    a_get: &[TypeId],
    a_exclude: &[TypeId],
    b_owned: &[TypeId],
    b_get: &[TypeId],
    b_exclude: &[TypeId],
) -> bool {
    if is_disjoint(a_owned, b_owned) {
        return true;
    }
    let a_nests_b = is_superset(a_owned, b_owned)
        && is_superset(a_get, b_get)
        && is_superset(a_exclude, b_exclude);
    let b_nests_a = is_superset(b_owned, a_owned)
        && is_superset(b_get, a_get)
        && is_superset(b_exclude, a_exclude);
    a_nests_b || b_nests_a
}

/// Whether registering `new` now, after `existing` is already in the group
/// table, would violate the required table order: broader groups (fewer
/// `get`/`exclude` constraints) must precede narrower ones that share an
/// owned type, because a shared owned type's `on_construct` signal reaches
/// each group's `try_add` in group-table order. If `existing`'s sets nest
/// inside `new`'s (existing is the narrower group) but not the other way
/// around, `new` is strictly broader and arrived too late: `existing`'s
/// hook would run first and could swap an entity past `new`'s not-yet-
/// advanced partition boundary, corrupting it. Two groups with disjoint
/// owned sets never share a dense array, so no order is required between
/// them.
fn order_violation(
    new_owned: &[TypeId],
    new_get: &[TypeId],
    new_exclude: &[TypeId],
    existing_owned: &[TypeId],
    existing_get: &[TypeId],
    existing_exclude: &[TypeId],
) -> bool {
    if is_disjoint(new_owned, existing_owned) {
        return false;
    }
    let new_nests_existing = is_superset(new_owned, existing_owned)
        && is_superset(new_get, existing_get)
        && is_superset(new_exclude, existing_exclude);
    let existing_nests_new = is_superset(existing_owned, new_owned)
        && is_superset(existing_get, new_get)
        && is_superset(existing_exclude, new_exclude);
    existing_nests_new && !new_nests_existing
}

/// Names the first owned type shared between two specifications, for a
/// diagnostic. Falls back to a placeholder only if the sets turn out not to
/// overlap at all (should not happen at the call sites here, which only
/// reach this after establishing an owned-type overlap).
fn shared_owned_name(
    a_owned: &[TypeId],
    a_names: &[&'static str],
    b_owned: &[TypeId],
    b_names: &[&'static str],
) -> &'static str {
    for (t, name) in a_owned.iter().zip(a_names) {
        if b_owned.contains(t) {
            return name;
        }
    }
    for (t, name) in b_owned.iter().zip(b_names) {
        if a_owned.contains(t) {
            return name;
        }
    }
    "<component>"
}

impl GroupState {
    fn is_owning(&self) -> bool {
        !self.owned.is_empty()
    }

    /// Whether `e` currently satisfies this group's owned/get/exclude sets.
    /// `ignore_exclude`, when set, is a type that is about to be destroyed
    /// but whose storage still reports it present — the `on_destroy`
    /// signal for an excluded type fires before the removal actually
    /// happens, so without this the entity would look permanently
    /// ineligible at exactly the moment it becomes eligible.
    fn matches(&self, registry: &Registry, e: Entity, ignore_exclude: Option<TypeId>) -> bool {
        self.owned
            .iter()
            .chain(self.get.iter())
            .all(|t| registry.storage_dyn(t).map_or(false, |s| s.contains_any(e)))
            && self.exclude.iter().all(|t| {
                Some(*t) == ignore_exclude
                    || !registry.storage_dyn(t).map_or(false, |s| s.contains_any(e))
            })
    }

    /// Called when a signal suggests `e` might have just become eligible.
    pub(crate) fn try_add(&mut self, registry: &mut Registry, e: Entity, ignore_exclude: Option<TypeId>) {
        if !self.matches(registry, e, ignore_exclude) {
            return;
        }
        if self.is_owning() {
            let first = self.owned[0];
            let pos = match registry.storage_dyn(&first).and_then(|s| s.index_of_any(e)) {
                Some(p) => p,
                None => return,
            };
            if pos < self.length {
                return;
            }
            for t in &self.owned {
                let storage = registry
                    .storage_dyn_mut(t)
                    .expect("owned storage exists for a registered group");
                let p = storage
                    .index_of_any(e)
                    .expect("owned component present, checked by matches()");
                storage.swap_any(p, self.length);
            }
            self.length += 1;
            trace!("group partition grew to {} (added {:?})", self.length, e);
        } else {
            let index = self.non_owning.get_or_insert_with(|| SparseSet::new(DeletionPolicy::SwapAndPop));
            if !index.contains(e) {
                index.push(e);
            }
        }
    }

    /// Called when a signal suggests `e` might have just become ineligible.
    pub(crate) fn try_remove(&mut self, registry: &mut Registry, e: Entity) {
        if self.is_owning() {
            let first = self.owned[0];
            let pos = match registry.storage_dyn(&first).and_then(|s| s.index_of_any(e)) {
                Some(p) => p,
                None => return,
            };
            if pos >= self.length {
                return;
            }
            self.length -= 1;
            for t in &self.owned {
                let storage = registry
                    .storage_dyn_mut(t)
                    .expect("owned storage exists for a registered group");
                if let Some(p) = storage.index_of_any(e) {
                    storage.swap_any(p, self.length);
                }
            }
            trace!("group partition shrank to {} (removed {:?})", self.length, e);
        } else if let Some(index) = self.non_owning.as_mut() {
            if index.contains(e) {
                index.erase(e);
            }
        }
    }

    fn populate(&mut self, registry: &mut Registry) {
        if self.is_owning() {
            let first = self.owned[0];
            let candidates: Vec<Entity> = registry
                .storage_dyn(&first)
                .map(|s| s.sparse_any().iter().collect())
                .unwrap_or_default();
            for e in candidates {
                self.try_add(registry, e, None);
            }
        } else {
            let pivot = smallest_storage(registry, &self.get).or_else(|| self.get.first().copied());
            let candidates: Vec<Entity> = match pivot {
                Some(t) => registry
                    .storage_dyn(&t)
                    .map(|s| s.sparse_any().iter().collect())
                    .unwrap_or_default(),
                None => Vec::new(),
            };
            for e in candidates {
                self.try_add(registry, e, None);
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        if self.is_owning() {
            self.length
        } else {
            self.non_owning.as_ref().map_or(0, SparseSet::len)
        }
    }

    pub(crate) fn entities(&self, registry: &Registry) -> Vec<Entity> {
        if self.is_owning() {
            registry
                .storage_dyn(&self.owned[0])
                .map(|s| s.sparse_any().dense()[0..self.length].to_vec())
                .unwrap_or_default()
        } else {
            self.non_owning.as_ref().map_or_else(Vec::new, |idx| idx.iter().collect())
        }
    }

    pub(crate) fn contains(&self, registry: &Registry, e: Entity) -> bool {
        if self.is_owning() {
            registry
                .storage_dyn(&self.owned[0])
                .and_then(|s| s.index_of_any(e))
                .map_or(false, |p| p < self.length)
        } else {
            self.non_owning.as_ref().map_or(false, |idx| idx.contains(e))
        }
    }

    /// Reorders the group's members by `cmp`. For an owning group this
    /// physically reorders the owned prefix of every owned pool, in
    /// lock-step, via one swap sequence computed from the first owned
    /// pool's current order (all owned pools already share that order,
    /// by invariant) and replayed identically on each. For a non-owning
    /// group it reorders only the private index.
    pub(crate) fn sort(&mut self, registry: &mut Registry, mut cmp: impl FnMut(Entity, Entity) -> Ordering) {
        if self.is_owning() {
            if self.length < 2 {
                return;
            }
            let first = self.owned[0];
            let prefix: Vec<Entity> = registry
                .storage_dyn(&first)
                .expect("owned storage exists")
                .sparse_any()
                .dense()[0..self.length]
                .to_vec();

            let mut order: Vec<usize> = (0..self.length).collect();
            order.sort_by(|&a, &b| cmp(prefix[a], prefix[b]));

            let mut pos_to_orig: Vec<usize> = (0..self.length).collect();
            let mut orig_to_pos: Vec<usize> = (0..self.length).collect();
            let mut swaps = Vec::new();
            for target in 0..self.length {
                let want_original = order[target];
                let cur = orig_to_pos[want_original];
                if cur != target {
                    swaps.push((target, cur));
                    let moved_original = pos_to_orig[target];
                    pos_to_orig[target] = want_original;
                    pos_to_orig[cur] = moved_original;
                    orig_to_pos[want_original] = target;
                    orig_to_pos[moved_original] = cur;
                }
            }

            for t in &self.owned {
                let storage = registry.storage_dyn_mut(t).expect("owned storage exists");
                for &(i, j) in &swaps {
                    storage.swap_any(i, j);
                }
            }
        } else if let Some(index) = self.non_owning.as_mut() {
            index.sort_by(&mut cmp, crate::sparse_set::SortAlgorithm::Introspective, |_, _| {});
        }
    }
}

fn smallest_storage(registry: &Registry, types: &[TypeId]) -> Option<TypeId> {
    types
        .iter()
        .copied()
        .min_by_key(|t| registry.storage_dyn(t).map_or(usize::MAX, |s| s.len_any()))
}

/// For each type in the tuple, connects `on_construct` to "try to add" and
/// `on_destroy` to "try to remove" — the wiring shared by a group's owned
/// and get sets, whose presence (not absence) is required.
pub(crate) trait RequiredHooks: TypeList {
    fn connect(registry: &mut Registry, group: GroupId);
}

impl RequiredHooks for () {
    fn connect(_registry: &mut Registry, _group: GroupId) {}
}

/// For each type in the tuple, connects `on_construct` to "try to remove"
/// and `on_destroy` to "try to add" — the inverted wiring for a group's
/// exclude set, whose *absence* is required.
pub(crate) trait ExcludedHooks: TypeList {
    fn connect(registry: &mut Registry, group: GroupId);
}

impl ExcludedHooks for () {
    fn connect(_registry: &mut Registry, _group: GroupId) {}
}

macro_rules! impl_group_hooks {
    ($($t:ident),+) => {
        impl<$($t: crate::storage::Component),+> RequiredHooks for ($($t,)+) {
            fn connect(registry: &mut Registry, group: GroupId) {
                $(
                    registry.storage_mut::<$t>().on_construct.connect(move |r, e| {
                        r.group_try_add(group, e, None);
                    });
                    registry.storage_mut::<$t>().on_destroy.connect(move |r, e| {
                        r.group_try_remove(group, e);
                    });
                )+
            }
        }

        impl<$($t: crate::storage::Component),+> ExcludedHooks for ($($t,)+) {
            fn connect(registry: &mut Registry, group: GroupId) {
                $(
                    registry.storage_mut::<$t>().on_construct.connect(move |r, e| {
                        r.group_try_remove(group, e);
                    });
                    let ty = TypeId::of::<$t>();
                    registry.storage_mut::<$t>().on_destroy.connect(move |r, e| {
                        r.group_try_add(group, e, Some(ty));
                    });
                )+
            }
        }
    };
}

impl_group_hooks!(A);
impl_group_hooks!(A, B);
impl_group_hooks!(A, B, C);
impl_group_hooks!(A, B, C, D);
impl_group_hooks!(A, B, C, D, E);
impl_group_hooks!(A, B, C, D, E, F);

/// A typed handle to a registered group.
///
/// `Owned` are the component types this group physically owns and
/// rearranges; `Get` are types the group requires but doesn't rearrange;
/// `Exclude` are types that disqualify an entity. `Get`/`Exclude` default
/// to `()` via [`Registry::group`]/[`Registry::group_get`]/
/// [`Registry::group_excluding`].
pub struct Group<Owned, Get = (), Exclude = ()> {
    pub(crate) id: GroupId,
    pub(crate) _marker: PhantomData<(Owned, Get, Exclude)>,
}

impl<Owned, Get, Exclude> Clone for Group<Owned, Get, Exclude> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<Owned, Get, Exclude> Copy for Group<Owned, Get, Exclude> {}

impl<Owned: TypeList, Get: TypeList, Exclude: TypeList> Group<Owned, Get, Exclude> {
    /// Number of entities currently in this group.
    pub fn len(&self, registry: &Registry) -> usize {
        registry.group_len(self.id)
    }

    /// Whether this group currently has no members.
    pub fn is_empty(&self, registry: &Registry) -> bool {
        self.len(registry) == 0
    }

    /// Whether `e` is currently a member of this group.
    pub fn contains(&self, registry: &Registry, e: Entity) -> bool {
        registry.group_contains(self.id, e)
    }

    /// Visits every member entity. For an owning group this is a direct
    /// slice walk of the owned prefix; for a non-owning group, a walk of
    /// the private index. Fetch components for `e` with
    /// `registry.get::<(...)>(e)` inside `f`.
    pub fn each(&self, registry: &Registry, mut f: impl FnMut(Entity)) {
        for e in registry.group_entities(self.id) {
            f(e);
        }
    }

    /// Reorders this group's members by `cmp`.
    pub fn sort(&self, registry: &mut Registry, cmp: impl FnMut(Entity, Entity) -> Ordering) {
        registry.group_sort(self.id, cmp);
    }

    /// Visits every member entity in parallel, via `rayon`. Like
    /// [`each`](Group::each), hands back only the entity; fetch components
    /// inside `f` with `registry.get::<(...)>(e)`.
    #[cfg(feature = "parallel")]
    pub fn par_each(&self, registry: &Registry, f: impl Fn(Entity) + Sync + Send) {
        use rayon::prelude::*;
        registry.group_entities(self.id).into_par_iter().for_each(f);
    }
}

pub(crate) fn check_conflicts(
    groups: &[GroupState],
    owned: &[TypeId],
    owned_names: &[&'static str],
    get: &[TypeId],
    exclude: &[TypeId],
) -> Result<(), Error> {
    for g in groups {
        if !compatible(owned, get, exclude, &g.owned, &g.get, &g.exclude) {
            let name = shared_owned_name(owned, owned_names, &g.owned, &g.owned_names);
            warn!("group conflict: `{}` already owned by an incompatible group", name);
            return Err(Error::GroupConflict(GroupConflict { owned_type: name }));
        }
        if order_violation(owned, get, exclude, &g.owned, &g.get, &g.exclude) {
            let name = shared_owned_name(owned, owned_names, &g.owned, &g.owned_names);
            warn!(
                "group conflict: a broader group over `{}` was registered after a narrower one; \
                 register broader groups first",
                name
            );
            return Err(Error::GroupConflict(GroupConflict { owned_type: name }));
        }
    }
    Ok(())
}

pub(crate) fn find_existing(
    groups: &[GroupState],
    owned: &[TypeId],
    get: &[TypeId],
    exclude: &[TypeId],
) -> Option<GroupId> {
    groups.iter().enumerate().find_map(|(i, g)| {
        if same_set(&g.owned, owned) && same_set(&g.get, get) && same_set(&g.exclude, exclude) {
            Some(GroupId(i))
        } else {
            None
        }
    })
}

pub(crate) fn new_state(
    owned: Vec<TypeId>,
    owned_names: Vec<&'static str>,
    get: Vec<TypeId>,
    exclude: Vec<TypeId>,
) -> GroupState {
    let is_owning = !owned.is_empty();
    GroupState {
        owned,
        owned_names,
        get,
        exclude,
        length: 0,
        non_owning: if is_owning {
            None
        } else {
            Some(SparseSet::new(DeletionPolicy::SwapAndPop))
        },
    }
}

pub(crate) fn populate(state: &mut GroupState, registry: &mut Registry) {
    state.populate(registry);
}
