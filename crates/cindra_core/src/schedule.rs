//! # Phase Scheduler
//!
//! Deterministic single-threaded dispatch of systems across fixed frame
//! phases. Phases run in declared order, and within a phase systems run in
//! registration order, every frame. `Startup` is dispatched exactly once,
//! at the beginning of the first frame, until explicitly reset.
//!
//! A system is a named closure over [`Context`], which hands it exclusive
//! access to the registry and the resource store for the duration of its
//! call.

use tracing::{error, trace, warn};

use crate::ecs::{EcsError, EcsResult, Registry};
use crate::resources::{Resources, Time};

/// Largest frame delta fed into [`Time`], in seconds.
///
/// A stall (debugger pause, window drag) otherwise produces one giant step
/// that physics and animation systems cannot integrate stably.
pub const MAX_DELTA: f32 = 0.1;

/// Execution phases of a frame, in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Schedule {
    /// Runs once, before the first frame's `PreUpdate`.
    Startup,
    /// Input handling and frame setup.
    PreUpdate,
    /// Main simulation logic.
    Update,
    /// Reactions to the simulation step.
    PostUpdate,
    /// Render preparation (culling, sorting, transform propagation).
    PreRender,
    /// Draw submission.
    Render,
    /// Frame cleanup.
    PostRender,
}

impl Schedule {
    /// Number of phases.
    pub const COUNT: usize = 7;

    /// Per-frame phases in dispatch order, `Startup` excluded.
    pub const FRAME_ORDER: [Self; 6] = [
        Self::PreUpdate,
        Self::Update,
        Self::PostUpdate,
        Self::PreRender,
        Self::Render,
        Self::PostRender,
    ];

    #[inline]
    const fn slot(self) -> usize {
        self as usize
    }
}

/// What the scheduler does when a system returns an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the current phase and surface [`EcsError::SystemFailed`].
    #[default]
    AbortPhase,
    /// Log the error and keep dispatching.
    LogAndContinue,
}

/// Mutable world access handed to each system for the duration of its call.
pub struct Context<'a> {
    /// Entity and component storage.
    pub registry: &'a mut Registry,
    /// Shared singleton values, including [`Time`].
    pub resources: &'a mut Resources,
    /// Clamped seconds since the previous frame.
    pub delta: f32,
}

impl Context<'_> {
    /// Copy of the frame clock, zeroed if the scheduler has not run yet.
    #[must_use]
    pub fn time(&self) -> Time {
        self.resources.try_get::<Time>().map_or_else(Time::default, |t| *t)
    }
}

type SystemFn = Box<dyn FnMut(&mut Context<'_>) -> EcsResult<()>>;

struct System {
    name: &'static str,
    run: SystemFn,
}

/// Owner of the per-phase system lists and the startup latch.
pub struct Scheduler {
    phases: [Vec<System>; Schedule::COUNT],
    policy: FailurePolicy,
    startup_ran: bool,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Creates an empty scheduler with the default [`FailurePolicy`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(FailurePolicy::default())
    }

    /// Creates an empty scheduler with an explicit failure policy.
    #[must_use]
    pub fn with_policy(policy: FailurePolicy) -> Self {
        Self {
            phases: std::array::from_fn(|_| Vec::new()),
            policy,
            startup_ran: false,
        }
    }

    /// Changes the failure policy for subsequent dispatches.
    pub fn set_policy(&mut self, policy: FailurePolicy) {
        self.policy = policy;
    }

    /// Registers a system at the end of a phase's list.
    ///
    /// The name appears in logs and in [`EcsError::SystemFailed`].
    pub fn add_system<F>(&mut self, phase: Schedule, name: &'static str, system: F) -> &mut Self
    where
        F: FnMut(&mut Context<'_>) -> EcsResult<()> + 'static,
    {
        trace!(system = name, ?phase, "registered system");
        self.phases[phase.slot()].push(System {
            name,
            run: Box::new(system),
        });
        self
    }

    /// Registers a system in the one-shot `Startup` phase.
    pub fn add_startup_system<F>(&mut self, name: &'static str, system: F) -> &mut Self
    where
        F: FnMut(&mut Context<'_>) -> EcsResult<()> + 'static,
    {
        self.add_system(Schedule::Startup, name, system)
    }

    /// Dispatches every system registered for one phase, in registration
    /// order.
    ///
    /// # Errors
    ///
    /// Under [`FailurePolicy::AbortPhase`], the first system error stops the
    /// phase and is returned as [`EcsError::SystemFailed`]. Under
    /// [`FailurePolicy::LogAndContinue`] this never fails.
    pub fn run_phase(
        &mut self,
        phase: Schedule,
        registry: &mut Registry,
        resources: &mut Resources,
        delta: f32,
    ) -> EcsResult<()> {
        let mut ctx = Context {
            registry,
            resources,
            delta,
        };
        for system in &mut self.phases[phase.slot()] {
            if let Err(err) = (system.run)(&mut ctx) {
                match self.policy {
                    FailurePolicy::AbortPhase => {
                        error!(system = system.name, ?phase, %err, "system failed, aborting phase");
                        return Err(EcsError::SystemFailed {
                            system: system.name,
                            phase,
                            source: Box::new(err),
                        });
                    }
                    FailurePolicy::LogAndContinue => {
                        warn!(system = system.name, ?phase, %err, "system failed, continuing");
                    }
                }
            }
        }
        Ok(())
    }

    /// Runs one full frame: advances [`Time`], dispatches `Startup` if it
    /// has not run yet, then every phase in [`Schedule::FRAME_ORDER`].
    ///
    /// `delta` is clamped to `0.0..=`[`MAX_DELTA`] before it reaches the
    /// clock. The startup latch is set before dispatch, so a failing startup
    /// system still counts as having run.
    ///
    /// # Errors
    ///
    /// Propagates [`EcsError::SystemFailed`] from the first aborted phase;
    /// later phases of the frame are skipped.
    pub fn run_frame(
        &mut self,
        registry: &mut Registry,
        resources: &mut Resources,
        delta: f32,
    ) -> EcsResult<()> {
        let delta = delta.clamp(0.0, MAX_DELTA);
        if !resources.contains::<Time>() {
            resources.insert(Time::default());
        }
        resources.get_mut::<Time>()?.advance(delta);

        if !self.startup_ran {
            self.startup_ran = true;
            self.run_phase(Schedule::Startup, registry, resources, delta)?;
        }
        for phase in Schedule::FRAME_ORDER {
            self.run_phase(phase, registry, resources, delta)?;
        }
        Ok(())
    }

    /// Re-arms the startup latch so the next frame dispatches `Startup`
    /// again, e.g. after a scene reload.
    pub fn reset_startup(&mut self) {
        self.startup_ran = false;
    }
}
