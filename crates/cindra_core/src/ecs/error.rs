//! # ECS Error Types
//!
//! All errors that can occur in the storage and scheduling core.
//!
//! Presence checks (`valid`, `has`, `try_get`) never construct these; they
//! report absence through their return value. The error path is reserved for
//! required-access calls on invalid inputs and for borrow conflicts detected
//! while a view is active.

use crate::ecs::Entity;
use crate::schedule::Schedule;
use thiserror::Error;

/// Errors that can occur in the ECS core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// Operation on a destroyed or out-of-range entity handle.
    #[error("entity {entity:?} is stale or was never created")]
    InvalidEntity {
        /// The offending handle.
        entity: Entity,
    },

    /// Required-get on a component the entity does not hold.
    #[error("entity {entity:?} has no {component} component")]
    MissingComponent {
        /// The entity that was queried.
        entity: Entity,
        /// Type name of the absent component.
        component: &'static str,
    },

    /// Lookup of a resource that was never inserted.
    #[error("no resource of type {resource} has been inserted")]
    MissingResource {
        /// Type name of the absent resource.
        resource: &'static str,
    },

    /// A pool or resource is already borrowed by an active view or accessor.
    ///
    /// Surfaces when a second borrow would conflict with one a live [`View`]
    /// or guard already holds, e.g. two overlapping `&mut` queries of the
    /// same component type.
    ///
    /// [`View`]: crate::ecs::View
    #[error("{type_name} is already borrowed by an active view or accessor")]
    ConcurrentModification {
        /// Type name of the contested pool or resource.
        type_name: &'static str,
    },

    /// A system returned an error and the scheduler's policy is to abort.
    #[error("system '{system}' failed during {phase:?} phase: {source}")]
    SystemFailed {
        /// Registered name of the failing system.
        system: &'static str,
        /// Phase that was being dispatched.
        phase: Schedule,
        /// The error the system returned.
        source: Box<EcsError>,
    },
}

impl EcsError {
    /// Shorthand for [`EcsError::MissingComponent`] with the type name of `T`.
    pub(crate) fn missing<T>(entity: Entity) -> Self {
        Self::MissingComponent {
            entity,
            component: std::any::type_name::<T>(),
        }
    }

    /// Shorthand for [`EcsError::MissingResource`] with the type name of `T`.
    pub(crate) fn missing_resource<T>() -> Self {
        Self::MissingResource {
            resource: std::any::type_name::<T>(),
        }
    }

    /// Shorthand for [`EcsError::ConcurrentModification`] with the type name of `T`.
    pub(crate) fn concurrent<T>() -> Self {
        Self::ConcurrentModification {
            type_name: std::any::type_name::<T>(),
        }
    }
}

/// Result type for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;
