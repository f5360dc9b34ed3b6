//! # Entity Registry
//!
//! The [`Registry`] owns entity identity and every component pool.
//!
//! Identity is slot-based: each entity index has a generation counter that is
//! bumped when the entity is destroyed, so handles held past a destroy are
//! detected as stale instead of aliasing a recycled slot. Destroyed indices
//! go on a free list and are reused before the tables grow.
//!
//! Pools are created lazily on first insert of a component type and stored
//! behind [`RefCell`] so that views can hold per-pool borrows while the
//! registry itself stays shared. Structural mutation (create, destroy,
//! insert, remove) takes `&mut self` and therefore cannot overlap a live
//! view at compile time.

use std::any::TypeId;
use std::cell::{Ref, RefCell};
use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::{debug, trace};

use crate::ecs::sparse_set::{ErasedPool, SparseSet};
use crate::ecs::view::{Query, View};
use crate::ecs::{EcsError, EcsResult, Entity};

/// Marker trait for component types.
///
/// Blanket-implemented for every `'static` type; a component is just plain
/// data the registry can store in a pool.
pub trait Component: 'static {}

impl<T: 'static> Component for T {}

/// Shared borrow of a single component, tied to its pool's borrow flag.
///
/// Holding one keeps the pool read-locked; a view requesting `&mut` access
/// to the same component type will fail with
/// [`EcsError::ConcurrentModification`] until it is dropped.
pub type ComponentRef<'a, T> = Ref<'a, T>;

/// A tuple of component types usable with [`Registry::has_all`] and
/// [`Registry::has_any`].
pub trait ComponentSet {
    /// Checks whether the entity holds every component in the set.
    fn all_present(registry: &Registry, entity: Entity) -> bool;

    /// Checks whether the entity holds at least one component in the set.
    fn any_present(registry: &Registry, entity: Entity) -> bool;
}

macro_rules! impl_component_set {
    ($($part:ident),+) => {
        impl<$($part: Component),+> ComponentSet for ($($part,)+) {
            fn all_present(registry: &Registry, entity: Entity) -> bool {
                $(registry.has::<$part>(entity))&&+
            }

            fn any_present(registry: &Registry, entity: Entity) -> bool {
                $(registry.has::<$part>(entity))||+
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);

/// Owner of entity identity and component storage.
#[derive(Default)]
pub struct Registry {
    /// Per-index generation counters, including dead slots.
    generations: Vec<u32>,
    /// Per-index liveness flags.
    alive: Vec<bool>,
    /// Destroyed indices available for reuse, popped LIFO.
    free: Vec<u32>,
    /// Live entity count, maintained incrementally.
    alive_count: usize,
    /// One pool per component type, created lazily.
    pools: HashMap<TypeId, RefCell<Box<dyn ErasedPool>>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Entity lifecycle
    // =========================================================================

    /// Creates a new entity with no components.
    ///
    /// Reuses a destroyed index when one is available; the handle carries
    /// that slot's current generation, so stale handles to the previous
    /// occupant remain invalid.
    pub fn create(&mut self) -> Entity {
        let entity = if let Some(index) = self.free.pop() {
            self.alive[index as usize] = true;
            Entity::new(index, self.generations[index as usize])
        } else {
            let index = u32::try_from(self.generations.len())
                .expect("entity index space exhausted");
            self.generations.push(0);
            self.alive.push(true);
            Entity::new(index, 0)
        };
        self.alive_count += 1;
        trace!(?entity, "created entity");
        entity
    }

    /// Creates `count` entities at once, returned in creation order.
    pub fn create_many(&mut self, count: usize) -> Vec<Entity> {
        (0..count).map(|_| self.create()).collect()
    }

    /// Destroys an entity, removing all of its components.
    ///
    /// The slot's generation is bumped immediately, so every outstanding
    /// handle to this entity becomes stale. Destroying an invalid handle is
    /// a silent no-op.
    pub fn destroy(&mut self, entity: Entity) {
        if !self.valid(entity) {
            return;
        }
        for pool in self.pools.values_mut() {
            pool.get_mut().remove(entity);
        }
        let index = entity.index() as usize;
        self.generations[index] = self.generations[index].wrapping_add(1);
        self.alive[index] = false;
        self.free.push(entity.index());
        self.alive_count -= 1;
        trace!(?entity, "destroyed entity");
    }

    /// Checks whether a handle refers to a live entity.
    #[inline]
    #[must_use]
    pub fn valid(&self, entity: Entity) -> bool {
        let index = entity.index() as usize;
        index < self.generations.len()
            && self.alive[index]
            && self.generations[index] == entity.generation()
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.alive_count
    }

    /// Destroys every entity and drops every component.
    ///
    /// Generations of live slots are bumped, so handles created before the
    /// clear stay invalid even after their indices are reused.
    pub fn clear(&mut self) {
        for pool in self.pools.values_mut() {
            pool.get_mut().clear();
        }
        for (index, alive) in self.alive.iter_mut().enumerate() {
            if *alive {
                self.generations[index] = self.generations[index].wrapping_add(1);
                *alive = false;
                self.free.push(index as u32);
            }
        }
        self.alive_count = 0;
        trace!("cleared registry");
    }

    // =========================================================================
    // Component access
    // =========================================================================

    /// Attaches a component to an entity, returning a reference to the
    /// stored value. Overwrites any existing component of the same type.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidEntity`] if the handle is stale or was
    /// never created.
    pub fn insert<T: Component>(&mut self, entity: Entity, value: T) -> EcsResult<&mut T> {
        if !self.valid(entity) {
            return Err(EcsError::InvalidEntity { entity });
        }
        Ok(self.assure_pool::<T>().insert(entity, value))
    }

    /// Detaches a component from an entity, returning whether it was present.
    ///
    /// Missing component or invalid handle are both reported as `false`.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> bool {
        if !self.valid(entity) {
            return false;
        }
        self.pool_mut::<T>()
            .is_some_and(|pool| pool.remove(entity))
    }

    /// Returns a shared borrow of the entity's component.
    ///
    /// # Errors
    ///
    /// - [`EcsError::InvalidEntity`] if the handle is stale
    /// - [`EcsError::MissingComponent`] if the entity lacks the component
    /// - [`EcsError::ConcurrentModification`] if a live view holds the pool
    ///   mutably
    pub fn get<T: Component>(&self, entity: Entity) -> EcsResult<ComponentRef<'_, T>> {
        if !self.valid(entity) {
            return Err(EcsError::InvalidEntity { entity });
        }
        let Some(cell) = self.pools.get(&TypeId::of::<T>()) else {
            return Err(EcsError::missing::<T>(entity));
        };
        let pool = cell.try_borrow().map_err(|_| EcsError::concurrent::<T>())?;
        let pool = Ref::map(pool, |p| {
            p.as_any()
                .downcast_ref::<SparseSet<T>>()
                .expect("pool type matches its TypeId key")
        });
        Ref::filter_map(pool, |p| p.get(entity)).map_err(|_| EcsError::missing::<T>(entity))
    }

    /// Returns a mutable borrow of the entity's component.
    ///
    /// Taking `&mut self` guarantees no view is alive, so unlike [`get`]
    /// this can never observe a borrow conflict.
    ///
    /// # Errors
    ///
    /// - [`EcsError::InvalidEntity`] if the handle is stale
    /// - [`EcsError::MissingComponent`] if the entity lacks the component
    ///
    /// [`get`]: Registry::get
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> EcsResult<&mut T> {
        if !self.valid(entity) {
            return Err(EcsError::InvalidEntity { entity });
        }
        self.pool_mut::<T>()
            .and_then(|pool| pool.get_mut(entity))
            .ok_or_else(|| EcsError::missing::<T>(entity))
    }

    /// Like [`get`](Registry::get), but reports every failure as `None`.
    #[must_use]
    pub fn try_get<T: Component>(&self, entity: Entity) -> Option<ComponentRef<'_, T>> {
        if !self.valid(entity) {
            return None;
        }
        let cell = self.pools.get(&TypeId::of::<T>())?;
        let pool = cell.try_borrow().ok()?;
        let pool = Ref::map(pool, |p| {
            p.as_any()
                .downcast_ref::<SparseSet<T>>()
                .expect("pool type matches its TypeId key")
        });
        Ref::filter_map(pool, |p| p.get(entity)).ok()
    }

    /// Like [`get_mut`](Registry::get_mut), but reports every failure as
    /// `None`.
    pub fn try_get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.valid(entity) {
            return None;
        }
        self.pool_mut::<T>().and_then(|pool| pool.get_mut(entity))
    }

    /// Returns the entity's component, inserting one built by `init` if it
    /// is absent.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidEntity`] if the handle is stale.
    pub fn get_or_insert_with<T, F>(&mut self, entity: Entity, init: F) -> EcsResult<&mut T>
    where
        T: Component,
        F: FnOnce() -> T,
    {
        if !self.valid(entity) {
            return Err(EcsError::InvalidEntity { entity });
        }
        let pool = self.assure_pool::<T>();
        if !pool.contains(entity) {
            pool.insert(entity, init());
        }
        Ok(pool.get_mut(entity).expect("present or just inserted"))
    }

    /// Checks whether the entity holds a component of type `T`.
    ///
    /// A stale handle or a type with no pool yet both report `false`.
    #[must_use]
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        if !self.valid(entity) {
            return false;
        }
        let Some(cell) = self.pools.get(&TypeId::of::<T>()) else {
            return false;
        };
        match cell.try_borrow() {
            Ok(pool) => pool.contains(entity),
            // A live view holds this pool mutably. Presence cannot be read
            // without racing the view, so report absence in release builds.
            Err(_) => {
                debug_assert!(
                    false,
                    "has::<{}> called while the pool is mutably borrowed",
                    std::any::type_name::<T>()
                );
                false
            }
        }
    }

    /// Checks whether the entity holds every component in the tuple `S`.
    #[must_use]
    pub fn has_all<S: ComponentSet>(&self, entity: Entity) -> bool {
        self.valid(entity) && S::all_present(self, entity)
    }

    /// Checks whether the entity holds at least one component in the tuple
    /// `S`.
    #[must_use]
    pub fn has_any<S: ComponentSet>(&self, entity: Entity) -> bool {
        self.valid(entity) && S::any_present(self, entity)
    }

    /// Reorders the pool for `T` by a comparator over component values.
    ///
    /// No-op if no component of type `T` was ever inserted.
    pub fn sort_by<T, F>(&mut self, compare: F)
    where
        T: Component,
        F: FnMut(&T, &T) -> Ordering,
    {
        if let Some(pool) = self.pool_mut::<T>() {
            pool.sort_by(compare);
        }
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Builds a view over every entity holding all components in `Q`.
    ///
    /// `Q` is a tuple of `&T` and `&mut T` parts, e.g.
    /// `registry.view::<(&Position, &mut Velocity)>()`. The view holds the
    /// matching pools borrowed until it is dropped; structural mutation in
    /// the meantime is rejected by the borrow checker because it needs
    /// `&mut Registry`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ConcurrentModification`] if a requested pool is
    /// already borrowed incompatibly, e.g. two live views both taking
    /// `&mut` of the same component type.
    pub fn view<'r, Q: Query<'r>>(&'r self) -> EcsResult<View<'r, Q>> {
        View::new(self)
    }

    // =========================================================================
    // Pool plumbing
    // =========================================================================

    /// Returns the pool for `T`, creating it if this is the first use.
    fn assure_pool<T: Component>(&mut self) -> &mut SparseSet<T> {
        let cell = self.pools.entry(TypeId::of::<T>()).or_insert_with(|| {
            debug!(component = std::any::type_name::<T>(), "creating component pool");
            RefCell::new(Box::new(SparseSet::<T>::new()))
        });
        cell.get_mut()
            .as_any_mut()
            .downcast_mut()
            .expect("pool type matches its TypeId key")
    }

    /// Returns the pool for `T` if it exists.
    fn pool_mut<T: Component>(&mut self) -> Option<&mut SparseSet<T>> {
        self.pools.get_mut(&TypeId::of::<T>()).map(|cell| {
            cell.get_mut()
                .as_any_mut()
                .downcast_mut()
                .expect("pool type matches its TypeId key")
        })
    }

    /// Raw pool cell lookup for view construction.
    pub(crate) fn pool_cell(&self, type_id: TypeId) -> Option<&RefCell<Box<dyn ErasedPool>>> {
        self.pools.get(&type_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, PartialEq)]
    struct Health(u32);

    struct Tag;

    #[test]
    fn test_create_and_valid() {
        let mut registry = Registry::new();
        let a = registry.create();
        let b = registry.create();

        assert_ne!(a, b);
        assert!(registry.valid(a));
        assert!(registry.valid(b));
        assert_eq!(registry.entity_count(), 2);
        assert!(!registry.valid(Entity::NULL));
    }

    #[test]
    fn test_destroy_invalidates_handle() {
        let mut registry = Registry::new();
        let e = registry.create();
        registry.destroy(e);

        assert!(!registry.valid(e));
        assert_eq!(registry.entity_count(), 0);
        // Destroying again is a no-op.
        registry.destroy(e);
        assert_eq!(registry.entity_count(), 0);
    }

    #[test]
    fn test_index_reuse_bumps_generation() {
        let mut registry = Registry::new();
        let old = registry.create();
        registry.destroy(old);
        let new = registry.create();

        assert_eq!(new.index(), old.index());
        assert_eq!(new.generation(), old.generation() + 1);
        assert!(!registry.valid(old));
        assert!(registry.valid(new));
    }

    #[test]
    fn test_stale_handle_cannot_reach_successor_components() {
        let mut registry = Registry::new();
        let old = registry.create();
        registry.insert(old, Health(10)).unwrap();
        registry.destroy(old);

        let new = registry.create();
        registry.insert(new, Health(99)).unwrap();

        assert!(!registry.has::<Health>(old));
        assert_eq!(
            registry.get::<Health>(old).err(),
            Some(EcsError::InvalidEntity { entity: old })
        );
        assert_eq!(registry.get::<Health>(new).unwrap().0, 99);
    }

    #[test]
    fn test_insert_get_remove_roundtrip() {
        let mut registry = Registry::new();
        let e = registry.create();

        registry.insert(e, Position { x: 1.0, y: 2.0 }).unwrap();
        assert!(registry.has::<Position>(e));
        assert_eq!(*registry.get::<Position>(e).unwrap(), Position { x: 1.0, y: 2.0 });

        registry.get_mut::<Position>(e).unwrap().x = 5.0;
        assert_eq!(registry.get::<Position>(e).unwrap().x, 5.0);
        assert_eq!(registry.get::<Position>(e).unwrap().y, 2.0);

        assert!(registry.remove::<Position>(e));
        assert!(!registry.has::<Position>(e));
        assert!(!registry.remove::<Position>(e));
    }

    #[test]
    fn test_insert_on_invalid_entity_fails() {
        let mut registry = Registry::new();
        let e = registry.create();
        registry.destroy(e);

        assert_eq!(
            registry.insert(e, Health(1)),
            Err(EcsError::InvalidEntity { entity: e })
        );
    }

    #[test]
    fn test_get_missing_component() {
        let mut registry = Registry::new();
        let e = registry.create();
        registry.insert(e, Health(1)).unwrap();

        // Pool exists but this entity is not in it.
        let other = registry.create();
        assert!(matches!(
            registry.get::<Health>(other),
            Err(EcsError::MissingComponent { .. })
        ));
        // No pool for this type at all.
        assert!(matches!(
            registry.get::<Position>(e),
            Err(EcsError::MissingComponent { .. })
        ));
        assert!(registry.try_get::<Position>(e).is_none());
    }

    #[test]
    fn test_get_or_insert_with() {
        let mut registry = Registry::new();
        let e = registry.create();

        let hp = registry.get_or_insert_with(e, || Health(50)).unwrap();
        assert_eq!(hp.0, 50);
        hp.0 = 40;

        // Present now, so the closure must not run.
        let hp = registry
            .get_or_insert_with::<Health, _>(e, || panic!("component already present"))
            .unwrap();
        assert_eq!(hp.0, 40);
    }

    #[test]
    fn test_has_all_and_has_any() {
        let mut registry = Registry::new();
        let e = registry.create();
        registry.insert(e, Position { x: 0.0, y: 0.0 }).unwrap();
        registry.insert(e, Health(1)).unwrap();

        assert!(registry.has_all::<(Position, Health)>(e));
        assert!(!registry.has_all::<(Position, Health, Tag)>(e));
        assert!(registry.has_any::<(Tag, Health)>(e));
        assert!(!registry.has_any::<(Tag,)>(e));
    }

    #[test]
    fn test_destroy_sweeps_all_pools() {
        let mut registry = Registry::new();
        let e = registry.create();
        registry.insert(e, Position { x: 0.0, y: 0.0 }).unwrap();
        registry.insert(e, Health(1)).unwrap();

        registry.destroy(e);
        let reborn = registry.create();
        assert_eq!(reborn.index(), e.index());
        // The reused index must start with no components.
        assert!(!registry.has::<Position>(reborn));
        assert!(!registry.has::<Health>(reborn));
    }

    #[test]
    fn test_clear_invalidates_prior_handles() {
        let mut registry = Registry::new();
        let a = registry.create();
        let b = registry.create();
        registry.insert(a, Health(1)).unwrap();

        registry.clear();
        assert_eq!(registry.entity_count(), 0);
        assert!(!registry.valid(a));
        assert!(!registry.valid(b));

        let reborn = registry.create();
        assert!(registry.valid(reborn));
        assert!(!registry.has::<Health>(reborn));
        assert!(!registry.valid(a));
    }

    #[test]
    fn test_create_many() {
        let mut registry = Registry::new();
        let entities = registry.create_many(10);
        assert_eq!(entities.len(), 10);
        assert_eq!(registry.entity_count(), 10);
        for e in &entities {
            assert!(registry.valid(*e));
        }
    }

    #[test]
    fn test_sort_by_reorders_pool() {
        let mut registry = Registry::new();
        for hp in [30u32, 10, 20] {
            let e = registry.create();
            registry.insert(e, Health(hp)).unwrap();
        }

        registry.sort_by::<Health, _>(|a, b| a.0.cmp(&b.0));

        let mut seen = Vec::new();
        registry
            .view::<(&Health,)>()
            .unwrap()
            .each(|_, (hp,)| seen.push(hp.0));
        assert_eq!(seen, vec![10, 20, 30]);
    }
}
