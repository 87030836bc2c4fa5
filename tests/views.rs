//! S3 (view pivot sizing and exclusion) and the view-idempotence property.

use ecs_core::{Component, Registry};

#[derive(Debug, Clone, Copy)]
struct Position(f32);
impl Component for Position {}

#[derive(Debug, Clone, Copy)]
struct Velocity(f32);
impl Component for Velocity {}

#[derive(Debug, Clone, Copy)]
struct Frozen;
impl Component for Frozen {}

#[test]
fn s3_view_pivot_and_exclusion() {
    let mut r = Registry::new();
    let mut with_position = Vec::new();
    for _ in 0..100 {
        let e = r.create();
        r.emplace(e, Position(0.0));
        with_position.push(e);
    }
    for &e in with_position.iter().take(50) {
        r.emplace(e, Velocity(1.0));
    }

    assert_eq!(r.view::<(Position, Velocity)>().size_hint(), 50);

    let mut visited = 0;
    r.view::<(Position, Velocity)>().each(|_, _| visited += 1);
    assert_eq!(visited, 50);

    for &e in with_position.iter().take(10) {
        r.emplace(e, Frozen);
    }

    let mut visited_excluding = 0;
    r.view_excluding::<(Position, Velocity), (Frozen,)>()
        .each(|_, _| visited_excluding += 1);
    assert_eq!(visited_excluding, 40);
}

#[test]
fn property6_view_iteration_is_idempotent_without_mutation() {
    let mut r = Registry::new();
    for i in 0..20 {
        let e = r.create();
        r.emplace(e, Position(i as f32));
        if i % 2 == 0 {
            r.emplace(e, Velocity(1.0));
        }
    }

    let mut first = Vec::new();
    r.view::<(Position, Velocity)>().each(|e, _| first.push(e));
    let mut second = Vec::new();
    r.view::<(Position, Velocity)>().each(|e, _| second.push(e));
    assert_eq!(first, second);
}

#[test]
fn front_and_back_report_extremes_of_insertion_order() {
    let mut r = Registry::new();
    let a = r.create();
    let b = r.create();
    let c = r.create();
    r.emplace(a, Position(1.0));
    r.emplace(b, Position(2.0));
    r.emplace(c, Position(3.0));

    let view = r.view::<(Position,)>();
    assert_eq!(view.front(), Some(a));
    assert_eq!(view.back(), Some(c));
}
