//! The untyped paged sparse set: the core of every storage and of every
//! non-owning group's private index.
//!
//! A sparse set pairs a contiguous `dense` array of entities with a `sparse`
//! table mapping `entity.index() -> position in dense`. The sparse table is
//! paged (allocated in fixed-size chunks, lazily, on first write) so that
//! a world with a handful of very high entity indices doesn't force one
//! giant contiguous allocation, and so that existing pages are never moved
//! by further growth — any code holding a page reference keeps a stable
//! address, mirroring the paged value arrays built on top in `storage.rs`.

use crate::entity::{Entity, Index};

/// Number of entity-index slots held by one sparse-table page.
pub const PAGE_SIZE: usize = 4096;

const NOT_PRESENT: Index = Index::MAX;

/// How a storage (or a non-owning group's private index) reacts to removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionPolicy {
    /// `erase` swaps the last dense element into the erased slot and pops
    /// the back. Cheapest; default for most component types. Invalidates
    /// the reference to whatever value previously lived in the last slot.
    SwapAndPop,
    /// `erase` destroys the slot in place and marks it a tombstone; a
    /// later `push` prefers reusing a tombstoned slot over growing. More
    /// expensive to iterate (tombstones are skipped at the iterator level)
    /// but never moves a surviving element, so outstanding references to
    /// other entities' components stay valid across an erase.
    InPlaceDelete,
}

/// Sort algorithm tag for [`SparseSet::sort_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortAlgorithm {
    /// Delegates to the standard library's pattern-defeating quicksort.
    /// The right default for arbitrary workloads.
    Introspective,
    /// A textbook insertion sort. Faster than introspective sort on
    /// already-nearly-sorted data (e.g. re-sorting after one element moved).
    Insertion,
}

/// Outcome of [`SparseSet::erase`], telling the typed storage layered on
/// top which of its value-array slots (if any) needs to mirror the move.
#[derive(Debug, Clone, Copy)]
pub enum Erased {
    /// `swap_and_pop`: the element that used to be last is now at `pos`.
    Swapped {
        /// The position the erased entity used to occupy.
        pos: usize,
        /// The entity that was moved into `pos`.
        moved: Entity,
    },
    /// `swap_and_pop`: the erased element was already last; nothing moved.
    Removed {
        /// The position the erased entity used to occupy.
        pos: usize,
    },
    /// `in_place_delete`: the slot at `pos` is now a tombstone.
    Tombstoned {
        /// The position that was tombstoned.
        pos: usize,
    },
}

impl Erased {
    /// The position the erase took place at, regardless of policy.
    pub fn pos(&self) -> usize {
        match *self {
            Erased::Swapped { pos, .. } | Erased::Removed { pos } | Erased::Tombstoned { pos } => {
                pos
            }
        }
    }
}

#[derive(Debug, Clone)]
struct Page(Box<[Index; PAGE_SIZE]>);

impl Page {
    fn new() -> Self {
        Page(Box::new([NOT_PRESENT; PAGE_SIZE]))
    }
}

/// The paged sparse set itself.
#[derive(Debug, Clone)]
pub struct SparseSet {
    sparse: Vec<Option<Page>>,
    dense: Vec<Entity>,
    policy: DeletionPolicy,
    free_positions: Vec<usize>,
}

impl SparseSet {
    /// Creates an empty sparse set using the given deletion policy.
    pub fn new(policy: DeletionPolicy) -> Self {
        SparseSet {
            sparse: Vec::new(),
            dense: Vec::new(),
            policy,
            free_positions: Vec::new(),
        }
    }

    /// The deletion policy this set was created with.
    pub fn policy(&self) -> DeletionPolicy {
        self.policy
    }

    /// Number of entities currently stored, live tombstones excluded.
    pub fn len(&self) -> usize {
        self.dense.len() - self.free_positions.len()
    }

    /// Whether this set holds no live entities.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length of the backing dense array, tombstones included. Used by
    /// typed storage to size its parallel value array.
    pub fn raw_len(&self) -> usize {
        self.dense.len()
    }

    /// The dense array, tombstones included. Typed storage uses this to
    /// keep its value array addressed by the same positions.
    pub fn dense(&self) -> &[Entity] {
        &self.dense
    }

    fn page_of(index: Index) -> (usize, usize) {
        (index as usize / PAGE_SIZE, index as usize % PAGE_SIZE)
    }

    fn sparse_get(&self, index: Index) -> Option<Index> {
        let (page, offset) = Self::page_of(index);
        match self.sparse.get(page) {
            Some(Some(p)) => {
                let v = p.0[offset];
                if v == NOT_PRESENT {
                    None
                } else {
                    Some(v)
                }
            }
            _ => None,
        }
    }

    fn sparse_set(&mut self, index: Index, pos: Index) {
        let (page, offset) = Self::page_of(index);
        if self.sparse.len() <= page {
            self.sparse.resize_with(page + 1, || None);
        }
        let slot = self.sparse[page].get_or_insert_with(Page::new);
        slot.0[offset] = pos;
    }

    fn sparse_clear(&mut self, index: Index) {
        let (page, offset) = Self::page_of(index);
        if let Some(Some(p)) = self.sparse.get_mut(page) {
            p.0[offset] = NOT_PRESENT;
        }
    }

    /// Whether `e` (index *and* version) is currently stored here.
    pub fn contains(&self, e: Entity) -> bool {
        self.index_of(e).is_some()
    }

    /// The dense-array position of `e`, if it is currently stored here.
    pub fn index_of(&self, e: Entity) -> Option<usize> {
        let pos = self.sparse_get(e.index())?;
        if self.dense[pos as usize] == e {
            Some(pos as usize)
        } else {
            None
        }
    }

    /// Appends `e`, returning the dense-array position it now occupies.
    ///
    /// Precondition: `!self.contains(e)`.
    pub fn push(&mut self, e: Entity) -> usize {
        debug_assert!(!self.contains(e), "push of an entity already present");

        let pos = if matches!(self.policy, DeletionPolicy::InPlaceDelete) {
            if let Some(p) = self.free_positions.pop() {
                self.dense[p] = e;
                p
            } else {
                self.dense.push(e);
                self.dense.len() - 1
            }
        } else {
            self.dense.push(e);
            self.dense.len() - 1
        };

        self.sparse_set(e.index(), pos as Index);
        pos
    }

    /// Removes `e`. See [`Erased`] for what the caller needs to mirror in
    /// a parallel value array.
    ///
    /// Precondition: `self.contains(e)`.
    pub fn erase(&mut self, e: Entity) -> Erased {
        debug_assert!(self.contains(e), "erase of an entity not present");
        let pos = self.index_of(e).unwrap();
        self.sparse_clear(e.index());

        match self.policy {
            DeletionPolicy::SwapAndPop => {
                let last = self.dense.len() - 1;
                if pos != last {
                    self.dense.swap(pos, last);
                    let moved = self.dense[pos];
                    self.sparse_set(moved.index(), pos as Index);
                    self.dense.pop();
                    Erased::Swapped { pos, moved }
                } else {
                    self.dense.pop();
                    Erased::Removed { pos }
                }
            }
            DeletionPolicy::InPlaceDelete => {
                self.dense[pos] = Entity::tombstone();
                self.free_positions.push(pos);
                Erased::Tombstoned { pos }
            }
        }
    }

    /// Exchanges the dense-array entries at `i` and `j`, keeping the
    /// sparse table in sync. Typed storage overrides this conceptually by
    /// calling this *and* swapping its own value array at the same two
    /// positions.
    pub fn swap(&mut self, i: usize, j: usize) {
        if i == j {
            return;
        }
        self.dense.swap(i, j);
        self.sparse_set(self.dense[i].index(), i as Index);
        self.sparse_set(self.dense[j].index(), j as Index);
    }

    /// Entities currently stored, in reverse dense (most-recently-inserted
    /// first) order, tombstones skipped.
    ///
    /// Reverse of physical insertion order, matching the reference
    /// implementation: the most recent `push` is seen first. This also
    /// means a caller walking this sequence and erasing the entity it just
    /// visited is always safe — a `swap_and_pop` erase can only move an
    /// entity from further back in the dense array (not yet visited under
    /// forward physical order, already visited here) into the erased slot.
    /// Per the resolved "iteration order under in_place_delete" design
    /// question, tombstones are filtered here, at the iterator boundary,
    /// rather than leaking a "not present" marker to callers.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Entity> + '_ {
        let is_in_place = matches!(self.policy, DeletionPolicy::InPlaceDelete);
        self.dense
            .iter()
            .rev()
            .copied()
            .filter(move |e| !(is_in_place && e.is_tombstone()))
    }

    /// Entities in raw physical (insertion) dense order, tombstones
    /// skipped. Used internally wherever an algorithm needs to reason about
    /// actual array positions rather than [`iter`](SparseSet::iter)'s
    /// presentation order — notably [`sort_as`](SparseSet::sort_as), which
    /// must walk `other`'s positions in the order they physically occur.
    pub(crate) fn forward_positions(&self) -> impl Iterator<Item = Entity> + '_ {
        let is_in_place = matches!(self.policy, DeletionPolicy::InPlaceDelete);
        self.dense
            .iter()
            .copied()
            .filter(move |e| !(is_in_place && e.is_tombstone()))
    }

    /// Reorders this set's dense array so that entities shared with `other`
    /// appear in `other`'s relative order; entities unique to `self` are
    /// left after them, in their previous relative order.
    pub fn sort_as(&mut self, other: &SparseSet) {
        let mut next = 0usize;
        for e in other.forward_positions() {
            if let Some(pos) = self.index_of(e) {
                self.swap(next, pos);
                next += 1;
            }
        }
    }

    /// Sorts the live entities by `cmp`, applying the permutation via a
    /// sequence of [`SparseSet::swap`] calls; `on_swap(i, j)` is invoked for
    /// every physical swap performed, so a typed storage can mirror the
    /// same exchange in its value array.
    ///
    /// `cmp`-ascending order here means ascending as seen through
    /// [`iter`](SparseSet::iter) (most-recent-first), so the physical dense
    /// array ends up holding `cmp`'s order reversed.
    pub fn sort_by<F, S>(&mut self, mut cmp: F, algo: SortAlgorithm, mut on_swap: S)
    where
        F: FnMut(Entity, Entity) -> std::cmp::Ordering,
        S: FnMut(usize, usize),
    {
        let is_in_place = matches!(self.policy, DeletionPolicy::InPlaceDelete);
        let live_slots: Vec<usize> = (0..self.dense.len())
            .filter(|&p| !(is_in_place && self.dense[p].is_tombstone()))
            .collect();

        let mut desired = live_slots.clone();
        match algo {
            SortAlgorithm::Introspective => {
                desired.sort_by(|&a, &b| cmp(self.dense[a], self.dense[b]))
            }
            SortAlgorithm::Insertion => insertion_sort_by(&mut desired, |&a, &b| {
                cmp(self.dense[a], self.dense[b])
            }),
        }

        let n = self.dense.len();
        let mut pos_to_orig: Vec<usize> = (0..n).collect();
        let mut orig_to_pos: Vec<usize> = (0..n).collect();

        let live_count = live_slots.len();
        for (i, &want_original) in desired.iter().enumerate() {
            let target_slot = live_slots[live_count - 1 - i];
            let cur = orig_to_pos[want_original];
            if cur != target_slot {
                self.swap(target_slot, cur);
                on_swap(target_slot, cur);

                let moved_original = pos_to_orig[target_slot];
                pos_to_orig[target_slot] = want_original;
                pos_to_orig[cur] = moved_original;
                orig_to_pos[want_original] = target_slot;
                orig_to_pos[moved_original] = cur;
            }
        }
    }

    /// Drops every page and clears the dense array. `free_positions` is
    /// also cleared since there is nothing left to recycle.
    pub fn clear(&mut self) {
        self.sparse.clear();
        self.dense.clear();
        self.free_positions.clear();
    }

    /// Frees sparse pages that contain no live entries. Existing live
    /// pages are never moved, only absent ones are dropped.
    pub fn shrink_to_fit(&mut self) {
        self.dense.shrink_to_fit();
        while matches!(self.sparse.last(), Some(None)) {
            self.sparse.pop();
        }
        self.sparse.shrink_to_fit();
    }
}

/// A plain insertion sort over indices, used when the caller expects
/// nearly-sorted input and wants to avoid quicksort's partitioning
/// overhead.
fn insertion_sort_by<T, F>(slice: &mut [T], mut cmp: F)
where
    F: FnMut(&T, &T) -> std::cmp::Ordering,
{
    for i in 1..slice.len() {
        let mut j = i;
        while j > 0 && cmp(&slice[j - 1], &slice[j]) == std::cmp::Ordering::Greater {
            slice.swap(j - 1, j);
            j -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(index: Index) -> Entity {
        Entity::new(index, 0)
    }

    #[test]
    fn push_and_contains() {
        let mut s = SparseSet::new(DeletionPolicy::SwapAndPop);
        s.push(e(3));
        s.push(e(12));
        s.push(e(42));
        assert!(s.contains(e(3)));
        assert!(s.contains(e(12)));
        assert!(!s.contains(e(7)));
    }

    #[test]
    fn swap_and_pop_erase_moves_last() {
        let mut s = SparseSet::new(DeletionPolicy::SwapAndPop);
        s.push(e(3));
        s.push(e(12));
        s.push(e(42));
        let out = s.erase(e(12));
        match out {
            Erased::Swapped { pos, moved } => {
                assert_eq!(pos, 1);
                assert_eq!(moved, e(42));
            }
            other => panic!("expected Swapped, got {:?}", other),
        }
        assert!(!s.contains(e(12)));
        assert_eq!(s.iter().collect::<Vec<_>>(), vec![e(42), e(3)]);
    }

    #[test]
    fn iter_visits_in_reverse_insertion_order() {
        let mut s = SparseSet::new(DeletionPolicy::SwapAndPop);
        s.push(e(3));
        s.push(e(12));
        s.push(e(42));
        assert_eq!(s.iter().collect::<Vec<_>>(), vec![e(42), e(12), e(3)]);
        s.erase(e(12));
        assert_eq!(s.iter().collect::<Vec<_>>(), vec![e(42), e(3)]);
    }

    #[test]
    fn in_place_delete_reuses_tombstoned_slot() {
        let mut s = SparseSet::new(DeletionPolicy::InPlaceDelete);
        s.push(e(1));
        s.push(e(2));
        s.push(e(3));
        s.erase(e(2));
        assert_eq!(s.iter().collect::<Vec<_>>(), vec![e(3), e(1)]);
        assert_eq!(s.raw_len(), 3);

        s.push(e(9));
        assert_eq!(s.raw_len(), 3, "push should reuse the tombstoned slot");
        assert!(s.contains(e(9)));
    }

    #[test]
    fn sort_as_orders_shared_entities_like_other() {
        let mut a = SparseSet::new(DeletionPolicy::SwapAndPop);
        for i in [1, 2, 3, 4] {
            a.push(e(i));
        }
        let mut b = SparseSet::new(DeletionPolicy::SwapAndPop);
        for i in [4, 2, 1] {
            b.push(e(i));
        }

        a.sort_as(&b);

        // Property 7: for any two entities present in both, A's relative
        // position order matches B's, regardless of either's `iter()`
        // presentation direction.
        for &x in &[1u32, 2, 4] {
            for &y in &[1u32, 2, 4] {
                if x == y {
                    continue;
                }
                let a_order = a.index_of(e(x)) < a.index_of(e(y));
                let b_order = b.index_of(e(x)) < b.index_of(e(y));
                assert_eq!(a_order, b_order, "x={x} y={y}");
            }
        }
    }

    #[test]
    fn sort_by_orders_dense_array() {
        let mut s = SparseSet::new(DeletionPolicy::SwapAndPop);
        for i in [5, 1, 4, 2, 3] {
            s.push(e(i));
        }
        s.sort_by(
            |a, b| a.index().cmp(&b.index()),
            SortAlgorithm::Introspective,
            |_, _| {},
        );
        let ordered: Vec<_> = s.iter().map(|ent| ent.index()).collect();
        assert_eq!(ordered, vec![1, 2, 3, 4, 5]);
    }
}
