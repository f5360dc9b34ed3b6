//! # Cindra Engine
//!
//! Game-facing layer over [`cindra_core`]: math and component vocabulary,
//! TOML configuration, plugins, and the frame-driving [`App`].
//!
//! The platform loop stays outside the engine. A host creates an [`App`],
//! installs plugins and systems, then calls [`App::run_frame`] from its own
//! event loop:
//!
//! ```rust
//! use cindra::{App, MovementPlugin, Transform, Velocity, Vec3};
//!
//! fn main() -> cindra::EcsResult<()> {
//!     let mut app = App::new();
//!     app.add_plugin(MovementPlugin);
//!
//!     let player = app.registry_mut().create();
//!     app.registry_mut().insert(player, Transform::IDENTITY)?;
//!     app.registry_mut()
//!         .insert(player, Velocity::linear(Vec3::X))?;
//!
//!     app.step(0.016)
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod app;
pub mod components;
pub mod math;

pub use app::{movement_system, App, AppConfig, ConfigError, MovementPlugin, Plugin};
pub use components::{Camera, Sprite, Transform, Velocity};
pub use math::{Vec2, Vec3};

pub use cindra_core::{
    Component, Context, EcsError, EcsResult, Entity, FailurePolicy, Registry, Res, ResMut,
    Resources, Schedule, Scheduler, Time,
};
