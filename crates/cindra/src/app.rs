//! Application shell: configuration, plugin registration, and the frame
//! entry point.
//!
//! [`App`] owns the registry, the resource store, and the scheduler. The
//! platform layer (window, input pump, renderer) stays outside the engine
//! and drives [`App::run_frame`] once per iteration of its own loop.

use std::path::Path;
use std::time::Instant;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use cindra_core::{Context, EcsResult, FailurePolicy, Registry, Resources, Schedule, Scheduler};

use crate::components::{Transform, Velocity};

/// Errors from loading an [`AppConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML for [`AppConfig`].
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Startup configuration, loaded once from TOML.
///
/// Every field has a default, so a partial (or empty) file is valid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Window title.
    pub title: String,
    /// Window width in pixels.
    pub width: u32,
    /// Window height in pixels.
    pub height: u32,
    /// Whether presentation waits for vblank.
    pub vsync: bool,
    /// When true, a failing system logs and the frame continues; when
    /// false, the first failure aborts the phase.
    pub continue_on_system_failure: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Cindra".to_owned(),
            width: 1280,
            height: 720,
            vsync: true,
            continue_on_system_failure: false,
        }
    }
}

impl AppConfig {
    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML or wrongly typed
    /// fields.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if its contents are invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    fn failure_policy(&self) -> FailurePolicy {
        if self.continue_on_system_failure {
            FailurePolicy::LogAndContinue
        } else {
            FailurePolicy::AbortPhase
        }
    }
}

/// A bundle of systems and resources installed as one unit.
pub trait Plugin {
    /// Name used in startup logs.
    fn name(&self) -> &'static str;

    /// Registers the plugin's systems and resources on the app.
    fn build(&self, app: &mut App);
}

/// Owner of the world and the frame loop's engine side.
pub struct App {
    config: AppConfig,
    registry: Registry,
    resources: Resources,
    scheduler: Scheduler,
    last_frame: Option<Instant>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Creates an app with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Creates an app from an explicit configuration.
    ///
    /// The config is also inserted as a resource so systems can read it.
    #[must_use]
    pub fn with_config(config: AppConfig) -> Self {
        info!(title = %config.title, width = config.width, height = config.height, "initializing app");
        let mut resources = Resources::new();
        resources.insert(config.clone());
        Self {
            scheduler: Scheduler::with_policy(config.failure_policy()),
            config,
            registry: Registry::new(),
            resources,
            last_frame: None,
        }
    }

    /// Installs a plugin.
    pub fn add_plugin(&mut self, plugin: impl Plugin) -> &mut Self {
        info!(plugin = plugin.name(), "installing plugin");
        plugin.build(self);
        self
    }

    /// Registers a system in a phase; see [`Scheduler::add_system`].
    pub fn add_system<F>(&mut self, phase: Schedule, name: &'static str, system: F) -> &mut Self
    where
        F: FnMut(&mut Context<'_>) -> EcsResult<()> + 'static,
    {
        self.scheduler.add_system(phase, name, system);
        self
    }

    /// Registers a system in the one-shot `Startup` phase.
    pub fn add_startup_system<F>(&mut self, name: &'static str, system: F) -> &mut Self
    where
        F: FnMut(&mut Context<'_>) -> EcsResult<()> + 'static,
    {
        self.add_system(Schedule::Startup, name, system)
    }

    /// Inserts a resource, replacing any previous value of the same type.
    pub fn insert_resource<T: 'static>(&mut self, value: T) -> &mut Self {
        self.resources.insert(value);
        self
    }

    /// The configuration the app was built with.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Shared access to the world.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Mutable access to the world, for setup and tools.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Shared access to the resource store.
    #[must_use]
    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    /// Mutable access to the resource store.
    pub fn resources_mut(&mut self) -> &mut Resources {
        &mut self.resources
    }

    /// Runs one frame with a wall-clock delta.
    ///
    /// The first frame sees a delta of zero; the scheduler clamps later
    /// deltas before they reach the [`Time`] resource.
    ///
    /// # Errors
    ///
    /// Propagates the first aborted phase's
    /// [`SystemFailed`](cindra_core::EcsError::SystemFailed) under
    /// [`FailurePolicy::AbortPhase`].
    ///
    /// [`Time`]: cindra_core::Time
    pub fn run_frame(&mut self) -> EcsResult<()> {
        let now = Instant::now();
        let delta = self
            .last_frame
            .map_or(0.0, |prev| now.duration_since(prev).as_secs_f32());
        self.last_frame = Some(now);
        self.step(delta)
    }

    /// Runs one frame with an explicit delta, for tests and fixed-step
    /// drivers.
    ///
    /// # Errors
    ///
    /// Same as [`run_frame`](App::run_frame).
    pub fn step(&mut self, delta: f32) -> EcsResult<()> {
        self.scheduler
            .run_frame(&mut self.registry, &mut self.resources, delta)
    }
}

/// Integrates [`Velocity`] into [`Transform`] over the frame delta.
///
/// # Errors
///
/// Returns [`ConcurrentModification`](cindra_core::EcsError::ConcurrentModification)
/// if another live view holds either pool incompatibly.
pub fn movement_system(ctx: &mut Context<'_>) -> EcsResult<()> {
    let delta = ctx.delta;
    ctx.registry
        .view::<(&Velocity, &mut Transform)>()?
        .each(|_, (vel, transform)| {
            transform.position += vel.linear * delta;
            transform.rotation += vel.angular * delta;
        });
    Ok(())
}

/// Installs [`movement_system`] in the `Update` phase.
pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn name(&self) -> &'static str {
        "movement"
    }

    fn build(&self, app: &mut App) {
        app.add_system(Schedule::Update, "movement", movement_system);
    }
}
