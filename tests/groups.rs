//! S4 (owning group partitioning), S5 (nested group compatibility), and S9
//! (`sortable`/`sort` refusal for an owned type).

use ecs_core::{Component, Registry, SortAlgorithm};

#[derive(Debug, Clone, Copy)]
struct A;
impl Component for A {}

#[derive(Debug, Clone, Copy)]
struct B;
impl Component for B {}

#[test]
fn s4_owning_group_partitioning_survives_churn() {
    let mut r = Registry::new();

    let entities: Vec<_> = (0..10).map(|_| r.create()).collect();
    for &e in &entities {
        r.emplace(e, A);
    }
    for &e in entities.iter().step_by(2) {
        r.emplace(e, B);
    }

    let group_ab = r.group_get::<(A,), (B,)>().unwrap();
    assert_eq!(group_ab.len(&r), 5);

    // Invariant 4: the owned prefix (raw positions [0, length)) of A's
    // dense array, as a set, equals the owned-with-B subset.
    let a_prefix: std::collections::HashSet<_> =
        r.storage::<A>().unwrap().sparse().dense()[0..5].iter().copied().collect();
    let expected: std::collections::HashSet<_> = entities.iter().step_by(2).copied().collect();
    assert_eq!(a_prefix, expected);

    r.erase::<B>(entities[2]);
    assert_eq!(group_ab.len(&r), 4);
    assert!(!group_ab.contains(&r, entities[2]));

    let a_prefix_after: std::collections::HashSet<_> =
        r.storage::<A>().unwrap().sparse().dense()[0..4].iter().copied().collect();
    let expected_after: std::collections::HashSet<_> = entities
        .iter()
        .step_by(2)
        .copied()
        .filter(|&e| e != entities[2])
        .collect();
    assert_eq!(a_prefix_after, expected_after);
}

#[test]
fn s5_nested_groups_accept_subsets_and_reject_non_nesting() {
    let mut r = Registry::new();
    let broad = r
        .group_get::<(i32_component::I32Wrap,), (char_component::CharWrap,)>()
        .expect("first registration always succeeds");
    let narrow = r
        .group_get::<(i32_component::I32Wrap,), (char_component::CharWrap, double_component::F64Wrap)>()
        .expect("nested get-superset group is compatible");

    let conflict = r.group_get::<(i32_component::I32Wrap,), (float_component::F32Wrap,)>();
    assert!(conflict.is_err(), "non-nesting get set on an already-owned type must conflict");

    // Churn both groups' shared owned type (`I32Wrap`) through an order
    // that fires the narrower group's `on_construct` hook before the
    // broader one has a chance to register the entity: `e1` only ever
    // satisfies `broad`, `e2` satisfies both.
    let e1 = r.create();
    r.emplace(e1, i32_component::I32Wrap(1));
    r.emplace(e1, char_component::CharWrap('a'));
    assert_eq!(broad.len(&r), 1);
    assert!(broad.contains(&r, e1));

    let e2 = r.create();
    r.emplace(e2, i32_component::I32Wrap(2));
    r.emplace(e2, double_component::F64Wrap(2.0));
    r.emplace(e2, char_component::CharWrap('b'));

    assert_eq!(broad.len(&r), 2, "e1 must stay a member of the broader group once e2 joins the narrower one");
    assert!(broad.contains(&r, e1));
    assert!(broad.contains(&r, e2));
    let mut broad_members = Vec::new();
    broad.each(&r, |e| broad_members.push(e));
    assert_eq!(broad_members.len(), 2);
    assert!(broad_members.contains(&e1));
    assert!(broad_members.contains(&e2));

    assert_eq!(narrow.len(&r), 1);
    assert!(narrow.contains(&r, e2));
    assert!(!narrow.contains(&r, e1));
}

#[test]
fn s5_registering_a_broader_group_after_a_narrower_sibling_is_rejected() {
    // The mirror image of the accepted order above: the narrower group
    // (more `get` constraints) is registered first, then an attempt to
    // register a broader group (fewer constraints) sharing its owned type.
    // Accepting this would let the already-registered narrower group's
    // `on_construct` hook run before the new, broader group's — on a
    // signal both groups must react to — corrupting the broader group's
    // partition the moment an entity satisfies only it.
    let mut r = Registry::new();
    r.group_get::<(i32_component::I32Wrap,), (char_component::CharWrap, double_component::F64Wrap)>()
        .expect("first registration always succeeds");

    let result = r.group_get::<(i32_component::I32Wrap,), (char_component::CharWrap,)>();
    assert!(
        result.is_err(),
        "a broader group registered after a narrower sibling sharing an owned type must be rejected"
    );
}

mod i32_component {
    use ecs_core::Component;
    #[derive(Debug, Clone, Copy)]
    pub struct I32Wrap(pub i32);
    impl Component for I32Wrap {}
}
mod char_component {
    use ecs_core::Component;
    #[derive(Debug, Clone, Copy)]
    pub struct CharWrap(pub char);
    impl Component for CharWrap {}
}
mod double_component {
    use ecs_core::Component;
    #[derive(Debug, Clone, Copy)]
    pub struct F64Wrap(pub f64);
    impl Component for F64Wrap {}
}
mod float_component {
    use ecs_core::Component;
    #[derive(Debug, Clone, Copy)]
    pub struct F32Wrap(pub f32);
    impl Component for F32Wrap {}
}

#[test]
fn s9_owned_component_refuses_external_sort() {
    let mut r = Registry::new();
    assert!(r.sortable::<A>());

    let _group = r.group::<(A,)>().unwrap();
    assert!(!r.sortable::<A>());

    let result = r.sort::<A>(|_, _| std::cmp::Ordering::Equal, SortAlgorithm::Introspective);
    assert!(matches!(result, Err(ecs_core::Error::SortOwned { .. })));

    // An unrelated, un-owned type remains sortable.
    assert!(r.sortable::<B>());
    assert!(r
        .sort::<B>(|_, _| std::cmp::Ordering::Equal, SortAlgorithm::Introspective)
        .is_ok());
}
