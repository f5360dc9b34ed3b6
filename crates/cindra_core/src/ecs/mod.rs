//! # Entity Component System
//!
//! Sparse-set ECS storage and query engine.
//!
//! ## Design Philosophy
//!
//! - Entities are plain (index, generation) identifiers with no behavior
//! - Each component type lives in its own [`SparseSet`] pool, created lazily
//! - Views iterate the smallest pool and probe the rest, cheapest first
//! - Structural mutation during iteration is rejected, not silently corrupted

mod entity;
mod error;
mod registry;
mod sparse_set;
mod view;

pub use entity::Entity;
pub use error::{EcsError, EcsResult};
pub use registry::{Component, ComponentRef, ComponentSet, Registry};
pub use sparse_set::{ErasedPool, SparseSet};
pub use view::{Entities, Query, View, ViewPart};
