//! Stateless multi-type queries.
//!
//! A [`View`] borrows a [`Registry`](crate::Registry) and, for as long as it
//! lives, lets the caller iterate every entity holding one component of each
//! named type (minus anything in its exclusion list). Unlike a group, a view
//! keeps no persistent state: construction picks whichever required
//! storage currently holds the fewest entities as the pivot and walks it,
//! testing the rest for membership — the classic sparse-set join.

use std::any::TypeId;
use std::marker::PhantomData;

use crate::entity::Entity;
use crate::registry::Registry;
use crate::storage::Component;

/// Implemented for tuples of up to six distinct [`Component`] types.
///
/// This is the machinery behind [`View`] and behind
/// [`Registry::get`](crate::Registry::get)/[`Registry::try_get`](crate::Registry::try_get):
/// given a tuple `(A, B, ...)`, it knows how to find the smallest candidate
/// pool, test an entity for membership across every pool, and hand back a
/// tuple of mutable references. Built by [`impl_fetch`], one impl per arity.
pub trait Fetch {
    /// The tuple of mutable component references this query yields.
    type Item<'a>;
    /// The tuple of shared component references [`View::par_each`] yields.
    /// A separate GAT from [`Item`](Fetch::Item) because read-only parallel
    /// iteration only ever needs `&T`, never `&mut T`.
    type ItemRef<'a>;

    /// `TypeId` of every type in the tuple, in declaration order.
    fn type_ids() -> Vec<TypeId>;

    /// Number of entities in whichever required pool is currently smallest.
    /// An upper bound on how many entities a full iteration can visit.
    fn pivot_len(registry: &Registry) -> usize;

    /// Entities in the smallest required pool, in that pool's dense order.
    fn pivot_entities(registry: &Registry) -> Vec<Entity>;

    /// Whether `e` has a component of every type in the tuple.
    fn contains_all(registry: &Registry, e: Entity) -> bool;

    /// Fetches a mutable reference to each type's component for `e`.
    ///
    /// # Safety
    /// `contains_all(registry, e)` must hold. The types in the tuple must
    /// be pairwise distinct (debug-asserted by [`View::new`]); this is what
    /// makes the simultaneous mutable borrows below sound even though they
    /// all originate from one `&mut Registry`.
    unsafe fn get_unchecked<'a>(registry: &'a mut Registry, e: Entity) -> Self::Item<'a>;

    /// Fetches a shared reference to each type's component for `e`.
    ///
    /// Precondition: `contains_all(registry, e)`. Unlike
    /// [`get_unchecked`](Fetch::get_unchecked) this needs no unsafe code:
    /// every borrow here is shared, so they can all come from one `&Registry`
    /// without aliasing concerns.
    fn get_ref<'a>(registry: &'a Registry, e: Entity) -> Self::ItemRef<'a>;
}

macro_rules! impl_fetch {
    ($($t:ident),+) => {
        impl<$($t: Component),+> Fetch for ($($t,)+) {
            type Item<'a> = ($(&'a mut $t,)+);
            type ItemRef<'a> = ($(&'a $t,)+);

            fn type_ids() -> Vec<TypeId> {
                vec![$(TypeId::of::<$t>()),+]
            }

            fn pivot_len(registry: &Registry) -> usize {
                let lens = [$(registry.storage::<$t>().map_or(0, |s| s.len())),+];
                lens.into_iter().min().unwrap_or(0)
            }

            fn pivot_entities(registry: &Registry) -> Vec<Entity> {
                let lens = [$(registry.storage::<$t>().map_or(usize::MAX, |s| s.len())),+];
                let min_idx = lens
                    .iter()
                    .enumerate()
                    .min_by_key(|&(_, &l)| l)
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                let mut idx = 0usize;
                $(
                    if min_idx == idx {
                        return registry
                            .storage::<$t>()
                            .map_or_else(Vec::new, |s| s.entities().collect());
                    }
                    #[allow(unused_assignments)]
                    { idx += 1; }
                )+
                Vec::new()
            }

            fn contains_all(registry: &Registry, e: Entity) -> bool {
                $(registry.storage::<$t>().map_or(false, |s| s.contains(e)))&&+
            }

            unsafe fn get_unchecked<'a>(registry: &'a mut Registry, e: Entity) -> Self::Item<'a> {
                let ptr: *mut Registry = registry;
                unsafe {
                    ($(
                        &mut *((*ptr).storage_mut::<$t>().get_mut(e) as *mut $t),
                    )+)
                }
            }

            fn get_ref<'a>(registry: &'a Registry, e: Entity) -> Self::ItemRef<'a> {
                ($(
                    registry.storage::<$t>().expect("checked by contains_all").get(e),
                )+)
            }
        }
    };
}

impl_fetch!(A);
impl_fetch!(A, B);
impl_fetch!(A, B, C);
impl_fetch!(A, B, C, D);
impl_fetch!(A, B, C, D, E);
impl_fetch!(A, B, C, D, E, F);

/// Implemented for tuples of up to six distinct [`Component`] types, used
/// wherever only membership (not mutable access) matters: `all_of`/`any_of`,
/// a view's exclusion list, and a group's owned/get/exclude declarations.
pub trait TypeList {
    /// `TypeId` of every type in the tuple.
    fn type_ids() -> Vec<TypeId>;
    /// `std::any::type_name` of every type in the tuple, in the same order
    /// as [`type_ids`](TypeList::type_ids) — used to name a type in a
    /// diagnostic without the caller having to thread it through by hand.
    fn type_names() -> Vec<&'static str>;
    /// Creates an (empty) storage for every type in the tuple that doesn't
    /// already have one.
    fn ensure_storages(registry: &mut Registry);
}

impl TypeList for () {
    fn type_ids() -> Vec<TypeId> {
        Vec::new()
    }
    fn type_names() -> Vec<&'static str> {
        Vec::new()
    }
    fn ensure_storages(_registry: &mut Registry) {}
}

macro_rules! impl_type_list {
    ($($t:ident),+) => {
        impl<$($t: Component),+> TypeList for ($($t,)+) {
            fn type_ids() -> Vec<TypeId> {
                vec![$(TypeId::of::<$t>()),+]
            }

            fn type_names() -> Vec<&'static str> {
                vec![$(std::any::type_name::<$t>()),+]
            }

            fn ensure_storages(registry: &mut Registry) {
                $( registry.storage_mut::<$t>(); )+
            }
        }
    };
}

impl_type_list!(A);
impl_type_list!(A, B);
impl_type_list!(A, B, C);
impl_type_list!(A, B, C, D);
impl_type_list!(A, B, C, D, E);
impl_type_list!(A, B, C, D, E, F);

fn has_duplicates(ids: &[TypeId]) -> bool {
    for i in 0..ids.len() {
        for j in (i + 1)..ids.len() {
            if ids[i] == ids[j] {
                return true;
            }
        }
    }
    false
}

/// A stateless query over every entity holding one component of each type
/// in `Q`, minus any entity holding a component of a type in its exclusion
/// list.
///
/// Borrows the registry for its whole lifetime, so nothing else can touch
/// the registry while a `View` is alive — that borrow is exactly what makes
/// the unsafe simultaneous-mutable-access inside [`Fetch::get_unchecked`]
/// sound.
pub struct View<'a, Q: Fetch> {
    registry: &'a mut Registry,
    exclude: Vec<TypeId>,
    _marker: PhantomData<Q>,
}

impl<'a, Q: Fetch> View<'a, Q> {
    pub(crate) fn new(registry: &'a mut Registry, exclude: Vec<TypeId>) -> Self {
        debug_assert!(
            !has_duplicates(&Q::type_ids()),
            "view over a tuple with a repeated component type"
        );
        View {
            registry,
            exclude,
            _marker: PhantomData,
        }
    }

    /// Upper bound on the number of entities this view can visit.
    pub fn size_hint(&self) -> usize {
        Q::pivot_len(self.registry)
    }

    fn excluded(&self, e: Entity) -> bool {
        self.exclude
            .iter()
            .any(|t| self.registry.storage_dyn(t).map_or(false, |s| s.contains_any(e)))
    }

    fn matches(&self, e: Entity) -> bool {
        !self.excluded(e) && Q::contains_all(self.registry, e)
    }

    /// Visits every matching entity, in pivot order (most-recently-inserted
    /// first, per [`SparseSet::iter`](crate::sparse_set::SparseSet::iter)).
    ///
    /// This order is what makes it safe for `f` to erase the just-visited
    /// entity's pivot-typed component: doing so can only affect entities
    /// this call has already visited (via swap-and-pop moving the pool's
    /// last element into the erased slot), never one still ahead of the
    /// cursor.
    pub fn each(&mut self, mut f: impl FnMut(Entity, Q::Item<'_>)) {
        let entities = Q::pivot_entities(self.registry);
        for e in entities {
            if !self.matches(e) {
                continue;
            }
            let item = unsafe { Q::get_unchecked(self.registry, e) };
            f(e, item);
        }
    }

    /// Fetches the matching components for one specific entity, or `None`
    /// if `e` doesn't match this view's query.
    pub fn find(&mut self, e: Entity) -> Option<Q::Item<'_>> {
        if !self.matches(e) {
            return None;
        }
        Some(unsafe { Q::get_unchecked(self.registry, e) })
    }

    /// The earliest-inserted matching entity.
    pub fn front(&self) -> Option<Entity> {
        Q::pivot_entities(self.registry)
            .into_iter()
            .rev()
            .find(|&e| self.matches(e))
    }

    /// The most-recently-inserted matching entity — the first one
    /// [`each`](View::each) would visit.
    pub fn back(&self) -> Option<Entity> {
        Q::pivot_entities(self.registry)
            .into_iter()
            .find(|&e| self.matches(e))
    }

    /// Visits every matching entity in parallel, via `rayon`, with shared
    /// (read-only) access to its components.
    ///
    /// `f` takes `&T` rather than `&mut T` for every type in the query:
    /// unlike [`each`](View::each), there is no ordering between
    /// invocations, so there is no safe way to hand out a mutable borrow.
    /// Collects the matching entity list up front, then splits it across
    /// rayon's thread pool.
    #[cfg(feature = "parallel")]
    pub fn par_each(&self, f: impl Fn(Entity, Q::ItemRef<'_>) + Sync + Send)
    where
        for<'b> Q::ItemRef<'b>: Send,
    {
        use rayon::prelude::*;

        let registry: &Registry = self.registry;
        let entities: Vec<Entity> = Q::pivot_entities(registry)
            .into_iter()
            .filter(|&e| self.matches(e))
            .collect();
        entities.into_par_iter().for_each(|e| {
            f(e, Q::get_ref(registry, e));
        });
    }
}
