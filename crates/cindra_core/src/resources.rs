//! # Shared Resources
//!
//! Singleton values shared across systems, keyed by type. One slot per type;
//! inserting again replaces the previous value.
//!
//! Access goes through per-slot borrow guards ([`Res`]/[`ResMut`]) so a
//! resource can be read by many systems or written by one, with conflicts
//! reported as errors rather than corrupting state.

use std::any::{Any, TypeId};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;

use crate::ecs::{EcsError, EcsResult};

/// Marker trait for resource types, blanket-implemented for every `'static`
/// type.
pub trait Resource: 'static {}

impl<T: 'static> Resource for T {}

/// Shared borrow of a resource.
pub type Res<'a, T> = Ref<'a, T>;

/// Exclusive borrow of a resource.
pub type ResMut<'a, T> = RefMut<'a, T>;

/// Type-keyed store of singleton values.
#[derive(Default)]
pub struct Resources {
    slots: HashMap<TypeId, RefCell<Box<dyn Any>>>,
}

impl Resources {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a resource, returning the previous value of the same type if
    /// one was present.
    pub fn insert<T: Resource>(&mut self, value: T) -> Option<T> {
        self.slots
            .insert(TypeId::of::<T>(), RefCell::new(Box::new(value)))
            .map(|cell| {
                *cell
                    .into_inner()
                    .downcast()
                    .expect("slot type matches its TypeId key")
            })
    }

    /// Removes and returns the resource of type `T`.
    pub fn remove<T: Resource>(&mut self) -> Option<T> {
        self.slots.remove(&TypeId::of::<T>()).map(|cell| {
            *cell
                .into_inner()
                .downcast()
                .expect("slot type matches its TypeId key")
        })
    }

    /// Checks whether a resource of type `T` is present.
    #[must_use]
    pub fn contains<T: Resource>(&self) -> bool {
        self.slots.contains_key(&TypeId::of::<T>())
    }

    /// Returns a shared borrow of the resource.
    ///
    /// # Errors
    ///
    /// - [`EcsError::MissingResource`] if no value of type `T` was inserted
    /// - [`EcsError::ConcurrentModification`] if the slot is borrowed
    ///   mutably
    pub fn get<T: Resource>(&self) -> EcsResult<Res<'_, T>> {
        let cell = self
            .slots
            .get(&TypeId::of::<T>())
            .ok_or_else(EcsError::missing_resource::<T>)?;
        let slot = cell.try_borrow().map_err(|_| EcsError::concurrent::<T>())?;
        Ok(Ref::map(slot, |boxed| {
            boxed
                .downcast_ref()
                .expect("slot type matches its TypeId key")
        }))
    }

    /// Returns an exclusive borrow of the resource.
    ///
    /// # Errors
    ///
    /// - [`EcsError::MissingResource`] if no value of type `T` was inserted
    /// - [`EcsError::ConcurrentModification`] if the slot is borrowed at all
    pub fn get_mut<T: Resource>(&self) -> EcsResult<ResMut<'_, T>> {
        let cell = self
            .slots
            .get(&TypeId::of::<T>())
            .ok_or_else(EcsError::missing_resource::<T>)?;
        let slot = cell
            .try_borrow_mut()
            .map_err(|_| EcsError::concurrent::<T>())?;
        Ok(RefMut::map(slot, |boxed| {
            boxed
                .downcast_mut()
                .expect("slot type matches its TypeId key")
        }))
    }

    /// Like [`get`](Resources::get), but reports every failure as `None`.
    #[must_use]
    pub fn try_get<T: Resource>(&self) -> Option<Res<'_, T>> {
        self.get().ok()
    }
}

/// Frame clock, maintained by the scheduler and read by systems.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Time {
    /// Seconds since the previous frame, after clamping.
    pub delta: f32,
    /// Total seconds accumulated across all frames.
    pub elapsed: f64,
    /// Number of completed `run_frame` calls.
    pub frame: u64,
}

impl Time {
    pub(crate) fn advance(&mut self, delta: f32) {
        self.delta = delta;
        self.elapsed += f64::from(delta);
        self.frame += 1;
    }
}
