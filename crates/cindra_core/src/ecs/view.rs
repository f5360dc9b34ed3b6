//! # Multi-Component Views
//!
//! A [`View`] iterates every entity that holds all components named by a
//! query tuple, e.g. `registry.view::<(&Position, &mut Velocity)>()`.
//!
//! The view borrows each requested pool once up front (shared for `&T`,
//! exclusive for `&mut T`) and holds the borrows until dropped. The smallest
//! pool drives iteration; the remaining pools are probed for membership in
//! ascending size order so mismatches are rejected as cheaply as possible.
//!
//! While a view is alive the registry is only reachable through `&Registry`,
//! so structural mutation cannot compile. Overlapping borrow requests that
//! slip past the type system (two live views wanting `&mut` of the same
//! pool) surface as [`EcsError::ConcurrentModification`].

use std::any::TypeId;
use std::cell::{Ref, RefMut};
use std::marker::PhantomData;

use crate::ecs::registry::Component;
use crate::ecs::sparse_set::SparseSet;
use crate::ecs::{EcsError, EcsResult, Entity, Registry};

/// One element of a query tuple: `&T` for shared or `&mut T` for exclusive
/// access to a component type.
pub trait ViewPart<'r>: 'static {
    /// Borrow guard over the component pool.
    type Guard;

    /// Per-entity item handed to iteration callbacks.
    type Item<'g>
    where
        Self: 'g;

    /// Borrows the pool from the registry.
    ///
    /// `None` means no component of this type was ever inserted; the view
    /// treats that as an empty pool.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ConcurrentModification`] if the pool is already
    /// borrowed incompatibly.
    fn borrow(registry: &'r Registry) -> EcsResult<Option<Self::Guard>>;

    /// Number of components in the borrowed pool.
    fn pool_len(guard: &Option<Self::Guard>) -> usize;

    /// Checks whether the entity is present in the borrowed pool.
    fn pool_contains(guard: &Option<Self::Guard>, entity: Entity) -> bool;

    /// Snapshot of the pool's entities in dense order.
    fn pool_entities(guard: &Option<Self::Guard>) -> Vec<Entity>;

    /// Fetches the entity's component out of the guard.
    fn fetch<'g>(guard: &'g mut Option<Self::Guard>, entity: Entity) -> Option<Self::Item<'g>>;
}

impl<'r, T: Component> ViewPart<'r> for &'static T {
    type Guard = Ref<'r, SparseSet<T>>;

    type Item<'g>
        = &'g T
    where
        Self: 'g;

    fn borrow(registry: &'r Registry) -> EcsResult<Option<Self::Guard>> {
        let Some(cell) = registry.pool_cell(TypeId::of::<T>()) else {
            return Ok(None);
        };
        let pool = cell.try_borrow().map_err(|_| EcsError::concurrent::<T>())?;
        Ok(Some(Ref::map(pool, |p| {
            p.as_any()
                .downcast_ref()
                .expect("pool type matches its TypeId key")
        })))
    }

    fn pool_len(guard: &Option<Self::Guard>) -> usize {
        guard.as_ref().map_or(0, |g| g.len())
    }

    fn pool_contains(guard: &Option<Self::Guard>, entity: Entity) -> bool {
        guard.as_ref().is_some_and(|g| g.contains(entity))
    }

    fn pool_entities(guard: &Option<Self::Guard>) -> Vec<Entity> {
        guard.as_ref().map_or_else(Vec::new, |g| g.entities().to_vec())
    }

    fn fetch<'g>(guard: &'g mut Option<Self::Guard>, entity: Entity) -> Option<&'g T> {
        guard.as_ref()?.get(entity)
    }
}

impl<'r, T: Component> ViewPart<'r> for &'static mut T {
    type Guard = RefMut<'r, SparseSet<T>>;

    type Item<'g>
        = &'g mut T
    where
        Self: 'g;

    fn borrow(registry: &'r Registry) -> EcsResult<Option<Self::Guard>> {
        let Some(cell) = registry.pool_cell(TypeId::of::<T>()) else {
            return Ok(None);
        };
        let pool = cell
            .try_borrow_mut()
            .map_err(|_| EcsError::concurrent::<T>())?;
        Ok(Some(RefMut::map(pool, |p| {
            p.as_any_mut()
                .downcast_mut()
                .expect("pool type matches its TypeId key")
        })))
    }

    fn pool_len(guard: &Option<Self::Guard>) -> usize {
        guard.as_ref().map_or(0, |g| g.len())
    }

    fn pool_contains(guard: &Option<Self::Guard>, entity: Entity) -> bool {
        guard.as_ref().is_some_and(|g| g.contains(entity))
    }

    fn pool_entities(guard: &Option<Self::Guard>) -> Vec<Entity> {
        guard.as_ref().map_or_else(Vec::new, |g| g.entities().to_vec())
    }

    fn fetch<'g>(guard: &'g mut Option<Self::Guard>, entity: Entity) -> Option<&'g mut T> {
        guard.as_mut()?.get_mut(entity)
    }
}

/// A tuple of [`ViewPart`]s describing what a view borrows and yields.
///
/// Implemented for tuples of one to four parts.
pub trait Query<'r>: 'static {
    /// Borrow guards for every part, in tuple order.
    type Guards;

    /// Tuple of per-entity items, in tuple order.
    type Item<'g>
    where
        Self: 'g;

    /// Number of parts in the tuple.
    const ARITY: usize;

    /// Borrows every part's pool from the registry.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ConcurrentModification`] on the first pool that
    /// is already borrowed incompatibly.
    fn borrow(registry: &'r Registry) -> EcsResult<Self::Guards>;

    /// Pool length of the part at `part` (tuple position).
    fn part_len(guards: &Self::Guards, part: usize) -> usize;

    /// Membership check against the part at `part`.
    fn part_contains(guards: &Self::Guards, part: usize, entity: Entity) -> bool;

    /// Dense-order entity snapshot of the part at `part`.
    fn part_entities(guards: &Self::Guards, part: usize) -> Vec<Entity>;

    /// Fetches the full item tuple, `None` if any part lacks the entity.
    fn fetch<'g>(guards: &'g mut Self::Guards, entity: Entity) -> Option<Self::Item<'g>>;
}

macro_rules! impl_query {
    (@count) => { 0 };
    (@count $head:ident $($rest:ident)*) => { 1 + impl_query!(@count $($rest)*) };

    ($(($part:ident, $idx:tt)),+) => {
        impl<'r, $($part: ViewPart<'r>),+> Query<'r> for ($($part,)+) {
            type Guards = ($(Option<$part::Guard>,)+);

            type Item<'g>
                = ($($part::Item<'g>,)+)
            where
                Self: 'g;

            const ARITY: usize = impl_query!(@count $($part)+);

            fn borrow(registry: &'r Registry) -> EcsResult<Self::Guards> {
                Ok(($($part::borrow(registry)?,)+))
            }

            fn part_len(guards: &Self::Guards, part: usize) -> usize {
                match part {
                    $($idx => $part::pool_len(&guards.$idx),)+
                    _ => usize::MAX,
                }
            }

            fn part_contains(guards: &Self::Guards, part: usize, entity: Entity) -> bool {
                match part {
                    $($idx => $part::pool_contains(&guards.$idx, entity),)+
                    _ => false,
                }
            }

            fn part_entities(guards: &Self::Guards, part: usize) -> Vec<Entity> {
                match part {
                    $($idx => $part::pool_entities(&guards.$idx),)+
                    _ => Vec::new(),
                }
            }

            fn fetch<'g>(guards: &'g mut Self::Guards, entity: Entity) -> Option<Self::Item<'g>> {
                Some(($($part::fetch(&mut guards.$idx, entity)?,)+))
            }
        }
    };
}

impl_query!((A, 0));
impl_query!((A, 0), (B, 1));
impl_query!((A, 0), (B, 1), (C, 2));
impl_query!((A, 0), (B, 1), (C, 2), (D, 3));

/// Borrowed iteration handle over every entity matching a query.
///
/// Built by [`Registry::view`]. Dropping the view releases the pool borrows.
pub struct View<'r, Q: Query<'r>> {
    guards: Q::Guards,
    /// Driver pool's entities in dense order, snapshotted at construction.
    /// Valid for the view's lifetime because the pools stay borrowed.
    order: Vec<Entity>,
    /// Non-driver tuple positions, ascending pool size.
    probe: Vec<usize>,
    _registry: PhantomData<&'r Registry>,
}

impl<'r, Q: Query<'r>> View<'r, Q> {
    pub(crate) fn new(registry: &'r Registry) -> EcsResult<Self> {
        let guards = Q::borrow(registry)?;

        let mut parts: Vec<usize> = (0..Q::ARITY).collect();
        parts.sort_by_key(|&p| Q::part_len(&guards, p));
        let order = Q::part_entities(&guards, parts[0]);
        let probe = parts[1..].to_vec();

        Ok(Self {
            guards,
            order,
            probe,
            _registry: PhantomData,
        })
    }

    /// Calls `f` once per matching entity with its component tuple.
    ///
    /// Entities are visited in the driver pool's dense order.
    pub fn each<F>(&mut self, mut f: F)
    where
        F: FnMut(Entity, Q::Item<'_>),
    {
        for &entity in &self.order {
            let matches = self
                .probe
                .iter()
                .all(|&p| Q::part_contains(&self.guards, p, entity));
            if !matches {
                continue;
            }
            if let Some(item) = Q::fetch(&mut self.guards, entity) {
                f(entity, item);
            }
        }
    }

    /// Iterates the handles of matching entities.
    pub fn iter(&self) -> Entities<'_, 'r, Q> {
        Entities {
            guards: &self.guards,
            order: &self.order,
            probe: &self.probe,
            cursor: 0,
        }
    }

    /// Random access to one entity's component tuple, `None` if the entity
    /// does not match the query.
    pub fn get(&mut self, entity: Entity) -> Option<Q::Item<'_>> {
        Q::fetch(&mut self.guards, entity)
    }

    /// Checks whether the entity holds every component in the query.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        (0..Q::ARITY).all(|p| Q::part_contains(&self.guards, p, entity))
    }

    /// Upper bound on the number of matching entities (the driver pool's
    /// size). The exact count requires a full probe pass.
    #[must_use]
    pub fn size_hint(&self) -> usize {
        self.order.len()
    }

    /// Checks whether no entity matches the query.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.order.iter().any(|&entity| {
            self.probe
                .iter()
                .all(|&p| Q::part_contains(&self.guards, p, entity))
        })
    }
}

/// Iterator over the entity handles matched by a [`View`].
///
/// Yields plain [`Entity`] values, so it can run alongside [`View::get`]
/// calls on the same view.
pub struct Entities<'v, 'r, Q: Query<'r>> {
    guards: &'v Q::Guards,
    order: &'v [Entity],
    probe: &'v [usize],
    cursor: usize,
}

impl<'v, 'r, Q: Query<'r>> Iterator for Entities<'v, 'r, Q> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        while self.cursor < self.order.len() {
            let entity = self.order[self.cursor];
            self.cursor += 1;
            let matches = self
                .probe
                .iter()
                .all(|&p| Q::part_contains(self.guards, p, entity));
            if matches {
                return Some(entity);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.order.len() - self.cursor))
    }
}
