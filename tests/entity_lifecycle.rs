//! S1 (identifier recycling) and S6 (recycling with an explicit hint),
//! plus the version-monotonicity and null/tombstone-safety invariants.

use ecs_core::{Entity, Registry};

#[test]
fn s1_identifier_recycling() {
    let mut r = Registry::new();
    let e1 = r.create();
    let e2 = r.create();
    let e3 = r.create();

    r.destroy(e2);
    let e4 = r.create();

    assert_eq!(e4.index(), e2.index());
    assert_eq!(e4.version(), e2.version() + 1);
    assert!(!r.valid(e2));
    assert!(r.valid(e4));

    // e1/e3 are untouched by the recycle.
    assert!(r.valid(e1));
    assert!(r.valid(e3));
}

#[test]
fn s6_recycling_with_hint() {
    let mut r = Registry::new();
    // Force index 5 to exist by creating six entities, then destroy it.
    let mut entities = Vec::new();
    for _ in 0..6 {
        entities.push(r.create());
    }
    let target = entities[5];
    assert_eq!(target.index(), 5);
    r.destroy(target);

    let hint = Entity::new(5, 7);
    let recreated = r.create_with_hint(hint);
    assert_eq!(recreated.index(), 5);
    assert_eq!(recreated.version(), 7);
    assert!(r.valid(recreated));
}

#[test]
fn version_bumps_by_exactly_one_on_plain_recycle() {
    let mut r = Registry::new();
    let e = r.create();
    let before = e.version();
    r.destroy(e);
    let recycled = r.create();
    assert_eq!(recycled.index(), e.index());
    assert_eq!(recycled.version(), before + 1);
}

#[test]
fn null_and_tombstone_are_never_valid() {
    let r = Registry::new();
    assert!(!r.valid(Entity::null()));
    assert!(!r.valid(Entity::tombstone()));
}

#[test]
fn create_never_returns_null_or_tombstone() {
    let mut r = Registry::new();
    for _ in 0..64 {
        let e = r.create();
        assert!(!e.is_null());
        assert!(!e.is_tombstone());
    }
}

#[test]
fn free_list_recycles_most_recently_destroyed_first() {
    // A LIFO free list: destroying b then a hands a's slot back on the
    // *next* create, since a was unlinked last.
    let mut r = Registry::new();
    let a = r.create();
    let b = r.create();
    r.destroy(b);
    r.destroy(a);

    let first_recycled = r.create();
    assert_eq!(first_recycled.index(), a.index());
    let second_recycled = r.create();
    assert_eq!(second_recycled.index(), b.index());
}
