//! A data-oriented entity-component-system core.
//!
//! [`Entity`] identifiers are versioned integer handles recycled from a
//! free list. Components live in [`Storage<T>`], a paged sparse set plus a
//! lock-step paged value array, reached through a [`Registry`]. Queries
//! come in two flavors: a [`View`] recomputes its matches on every
//! iteration; a [`Group`] keeps a persistent answer up to date by
//! subscribing to storage signals, optionally taking physical ownership of
//! its component pools' layout for branch-free iteration.
//!
//! ```
//! use ecs_core::{Component, Registry};
//!
//! #[derive(Debug, Clone, Copy)]
//! struct Position(f32, f32);
//! impl Component for Position {}
//!
//! #[derive(Debug, Clone, Copy)]
//! struct Velocity(f32, f32);
//! impl Component for Velocity {}
//!
//! let mut registry = Registry::new();
//! let e = registry.create();
//! registry.emplace(e, Position(0.0, 0.0));
//! registry.emplace(e, Velocity(1.0, 0.0));
//!
//! registry.view::<(Position, Velocity)>().each(|_entity, (pos, vel)| {
//!     pos.0 += vel.0;
//!     pos.1 += vel.1;
//! });
//! ```

mod context;
mod entity;
mod error;
mod group;
mod paged_vec;
mod registry;
mod signal;
mod sparse_set;
mod storage;
mod view;

pub use context::Context;
pub use entity::{Entity, Index, INDEX_BITS, VERSION_BITS};
pub use error::{Error, GroupConflict};
pub use group::{Group, GroupId};
pub use registry::Registry;
pub use signal::SignalKind;
pub use sparse_set::{DeletionPolicy, SortAlgorithm};
pub use storage::{AnyStorage, Component, Storage};
pub use view::{Fetch, TypeList, View};

/// Re-exports [`Component`](derive@Component), enabled by the `derive`
/// feature.
#[cfg(feature = "derive")]
pub use ecs_core_derive::Component;
