//! # Cindra Core Engine
//!
//! A sparse-set Entity Component System (ECS) with a deterministic phase
//! scheduler, designed for:
//! - O(1) component insert/remove/lookup
//! - Cache-friendly iteration over arbitrary component combinations
//! - Stable entity identity across create/destroy cycles
//! - Reproducible single-threaded frame execution
//!
//! ## Architecture Rules
//!
//! 1. **No per-entity heap allocation in the hot path** - component pools
//!    grow geometrically and are reused across frames
//! 2. **Data-oriented design** - components live in packed dense arrays
//! 3. **Deterministic dispatch** - phases run in declared order, systems in
//!    registration order, every frame
//!
//! ## Example
//!
//! ```rust
//! use cindra_core::{Registry, EcsResult};
//!
//! struct Position { x: f32, y: f32 }
//! struct Health(u32);
//!
//! fn main() -> EcsResult<()> {
//!     let mut registry = Registry::new();
//!     let player = registry.create();
//!     registry.insert(player, Position { x: 0.0, y: 0.0 })?;
//!     registry.insert(player, Health(100))?;
//!
//!     registry.view::<(&Position, &Health)>()?.each(|entity, (pos, hp)| {
//!         let _ = (entity, pos.x, hp.0);
//!     });
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod ecs;
pub mod resources;
pub mod schedule;

pub use ecs::{
    Component, ComponentRef, ComponentSet, EcsError, EcsResult, Entities, Entity, ErasedPool,
    Query, Registry, SparseSet, View, ViewPart,
};
pub use resources::{Res, ResMut, Resource, Resources, Time};
pub use schedule::{Context, FailurePolicy, Schedule, Scheduler};
