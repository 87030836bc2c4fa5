use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ecs_core::{Component, Registry};
use rand::Rng;

#[derive(Debug, Clone, Copy)]
struct Position(f32, f32);
impl Component for Position {}

#[derive(Debug, Clone, Copy)]
struct Velocity(f32, f32);
impl Component for Velocity {}

#[derive(Debug, Clone, Copy)]
struct Health(i32);
impl Component for Health {}

fn build_registry(n: u32, velocity_ratio: f64) -> Registry {
    let mut r = Registry::new();
    let mut rng = rand::thread_rng();
    for _ in 0..n {
        let e = r.create();
        r.emplace(e, Position(0.0, 0.0));
        if rng.gen_bool(velocity_ratio) {
            r.emplace(e, Velocity(1.0, 1.0));
        }
        if rng.gen_bool(0.5) {
            r.emplace(e, Health(100));
        }
    }
    r
}

fn view_single_component(c: &mut Criterion) {
    let mut group = c.benchmark_group("view_single_component");
    for &n in &[1_000u32, 10_000, 100_000] {
        let mut r = build_registry(n, 1.0);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                r.view::<(Position,)>().each(|_, (pos,)| {
                    black_box(pos.0);
                });
            });
        });
    }
    group.finish();
}

fn view_two_component_intersection(c: &mut Criterion) {
    let mut group = c.benchmark_group("view_two_component_intersection");
    for &n in &[1_000u32, 10_000, 100_000] {
        let mut r = build_registry(n, 0.3);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                r.view::<(Position, Velocity)>().each(|_, (pos, vel)| {
                    pos.0 += vel.0;
                    pos.1 += vel.1;
                });
            });
        });
    }
    group.finish();
}

fn owning_group_vs_view(c: &mut Criterion) {
    let mut group = c.benchmark_group("owning_group_vs_view");
    let n = 50_000u32;

    let mut r_view = build_registry(n, 1.0);
    group.bench_function("view", |b| {
        b.iter(|| {
            r_view.view::<(Position, Health)>().each(|_, (pos, hp)| {
                pos.0 += hp.0 as f32 * 0.0001;
            });
        });
    });

    let mut r_grouped = build_registry(n, 1.0);
    r_grouped
        .group_get::<(Position,), (Health,)>()
        .expect("first registration always succeeds");
    group.bench_function("owning_group", |b| {
        b.iter(|| {
            r_grouped.view::<(Position, Health)>().each(|_, (pos, hp)| {
                pos.0 += hp.0 as f32 * 0.0001;
            });
        });
    });

    group.finish();
}

fn entity_create_destroy_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("entity_create_destroy_churn");
    group.bench_function("create_then_destroy", |b| {
        let mut r = Registry::new();
        b.iter(|| {
            let e = r.create();
            r.emplace(e, Position(0.0, 0.0));
            black_box(e);
            r.destroy(e);
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    view_single_component,
    view_two_component_intersection,
    owning_group_vs_view,
    entity_create_destroy_churn,
);
criterion_main!(benches);
