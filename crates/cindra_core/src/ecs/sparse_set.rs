//! # Sparse-Set Component Storage
//!
//! One [`SparseSet`] holds every instance of a single component type.
//!
//! The storage uses two parallel layers:
//! - `sparse`: entity index -> dense slot, with an absent sentinel
//! - `dense` + `data`: packed (entity, value) pairs, no holes
//!
//! Removal swaps the last element into the freed slot and truncates, so all
//! operations except growth are O(1) and iteration walks contiguous memory.
//! The cost is that dense order is not stable across removals; callers must
//! not depend on iteration order surviving mutation.

use std::any::Any;
use std::cmp::Ordering;

use crate::ecs::Entity;

/// Sentinel in the sparse layer marking an entity index with no component.
const ABSENT: u32 = u32::MAX;

/// Type-erased pool operations.
///
/// The registry owns one pool per component type behind this trait so it can
/// sweep an entity out of every pool on destroy without knowing the concrete
/// component types. Typed access goes through the `Any` downcasts.
pub trait ErasedPool {
    /// Removes the entity's component, returning whether it was present.
    fn remove(&mut self, entity: Entity) -> bool;

    /// Checks whether the entity holds a component in this pool.
    fn contains(&self, entity: Entity) -> bool;

    /// Number of components stored.
    fn len(&self) -> usize;

    /// Checks whether the pool is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every component in the pool.
    fn clear(&mut self);

    /// Upcast for typed downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for typed downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Dense storage for a single component type.
///
/// Invariant: `dense[sparse[e.index()]] == e` for every present entity `e`,
/// and `dense`/`data` have no holes. Containment compares the full handle,
/// so a stale generation never aliases a live component.
pub struct SparseSet<T> {
    /// Entity index -> dense slot, or [`ABSENT`].
    sparse: Vec<u32>,
    /// Dense slot -> entity handle.
    dense: Vec<Entity>,
    /// Dense slot -> component value, parallel to `dense`.
    data: Vec<T>,
}

impl<T> Default for SparseSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SparseSet<T> {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sparse: Vec::new(),
            dense: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Returns the dense slot for an entity, verifying the full handle.
    #[inline]
    fn slot_of(&self, entity: Entity) -> Option<usize> {
        let slot = *self.sparse.get(entity.index() as usize)?;
        if slot == ABSENT {
            return None;
        }
        let slot = slot as usize;
        (self.dense[slot] == entity).then_some(slot)
    }

    /// Checks whether the entity holds a component in this set.
    #[inline]
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.slot_of(entity).is_some()
    }

    /// Number of components stored.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Checks whether the set is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Inserts a component for the entity, returning a reference to it.
    ///
    /// If the entity's index already occupies a slot, the value is written
    /// in place and the stored handle refreshed - the dense array must not
    /// grow, or the old slot would leak. Last write wins.
    ///
    /// The returned reference is invalidated by any later insert or remove
    /// on this set; callers must re-fetch rather than retain it.
    pub fn insert(&mut self, entity: Entity, value: T) -> &mut T {
        let index = entity.index() as usize;
        if index >= self.sparse.len() {
            self.sparse.resize(index + 1, ABSENT);
        }

        let slot = self.sparse[index];
        if slot == ABSENT {
            let slot = self.dense.len() as u32;
            self.sparse[index] = slot;
            self.dense.push(entity);
            self.data.push(value);
            self.data.last_mut().unwrap_or_else(|| unreachable!())
        } else {
            // Slot reuse: overwrite in place, refresh the handle in case the
            // occupant was a stale generation of the same index.
            let slot = slot as usize;
            self.dense[slot] = entity;
            self.data[slot] = value;
            &mut self.data[slot]
        }
    }

    /// Removes the entity's component, returning whether it was present.
    ///
    /// Swap-removal: the last dense element moves into the freed slot and
    /// its sparse entry is re-pointed, keeping the dense arrays hole-free.
    pub fn remove(&mut self, entity: Entity) -> bool {
        let Some(slot) = self.slot_of(entity) else {
            return false;
        };

        self.dense.swap_remove(slot);
        self.data.swap_remove(slot);
        self.sparse[entity.index() as usize] = ABSENT;

        // If something was swapped into the freed slot, fix its mapping.
        if let Some(moved) = self.dense.get(slot) {
            self.sparse[moved.index() as usize] = slot as u32;
        }
        true
    }

    /// Returns the component for the entity, if present.
    #[inline]
    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&T> {
        let slot = self.slot_of(entity)?;
        Some(&self.data[slot])
    }

    /// Returns the component for the entity mutably, if present.
    #[inline]
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        let slot = self.slot_of(entity)?;
        Some(&mut self.data[slot])
    }

    /// Packed entity handles in dense order.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.dense
    }

    /// Iterates `(entity, &component)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.dense.iter().copied().zip(self.data.iter())
    }

    /// Iterates `(entity, &mut component)` pairs in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.dense.iter().copied().zip(self.data.iter_mut())
    }

    /// Drops every component, keeping allocated capacity.
    pub fn clear(&mut self) {
        self.sparse.clear();
        self.dense.clear();
        self.data.clear();
    }

    /// Reorders the dense arrays by a comparator over component values.
    ///
    /// The sparse mapping is rebuilt afterwards, so the set invariant holds
    /// for every entity. O(n log n) with a scratch allocation; intended for
    /// occasional passes such as draw-order sorting, not the per-frame path.
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let mut order: Vec<usize> = (0..self.dense.len()).collect();
        order.sort_by(|&a, &b| compare(&self.data[a], &self.data[b]));

        // Apply the permutation in place by following cycles with swaps.
        for target in 0..order.len() {
            let mut source = order[target];
            while source < target {
                source = order[source];
            }
            self.dense.swap(target, source);
            self.data.swap(target, source);
        }
        for (slot, entity) in self.dense.iter().enumerate() {
            self.sparse[entity.index() as usize] = slot as u32;
        }
    }
}

impl<T: 'static> ErasedPool for SparseSet<T> {
    fn remove(&mut self, entity: Entity) -> bool {
        SparseSet::remove(self, entity)
    }

    fn contains(&self, entity: Entity) -> bool {
        SparseSet::contains(self, entity)
    }

    fn len(&self) -> usize {
        SparseSet::len(self)
    }

    fn clear(&mut self) {
        SparseSet::clear(self);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
