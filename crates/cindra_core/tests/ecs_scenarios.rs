//! End-to-end storage and scheduling scenarios, exercised through the public
//! API only.

use cindra_core::{
    EcsError, EcsResult, Entity, FailurePolicy, Registry, Resources, Schedule, Scheduler,
};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Velocity {
    dx: f32,
    dy: f32,
}

#[derive(Debug, PartialEq)]
struct Label(&'static str);

/// Lifecycle walkthrough: two entities trade a slot, and every handle epoch
/// observes the right world.
#[test]
fn test_slot_reuse_lifecycle() {
    let mut registry = Registry::new();

    let a = registry.create();
    let b = registry.create();
    registry.insert(a, Label("a")).unwrap();
    registry.insert(b, Label("b")).unwrap();

    registry.destroy(a);
    let c = registry.create();
    assert_eq!(c.index(), a.index(), "freed index is reused LIFO");
    assert_ne!(c, a);

    // The reborn slot starts clean.
    assert!(!registry.has::<Label>(c));
    registry.insert(c, Label("c")).unwrap();

    // Old handle: invalid everywhere, and cannot disturb the successor.
    assert!(!registry.valid(a));
    assert!(registry.get::<Label>(a).is_err());
    assert!(!registry.remove::<Label>(a));
    registry.destroy(a);
    assert!(registry.valid(c));
    assert_eq!(registry.get::<Label>(c).unwrap().0, "c");

    // Untouched bystander is unaffected by the churn.
    assert_eq!(registry.get::<Label>(b).unwrap().0, "b");

    let d = registry.create();
    assert_ne!(d.index(), c.index(), "no free slot, tables grow");
    assert_eq!(registry.entity_count(), 3);
}

/// Heavy churn with interleaved component removal; cross-checks every view
/// against a brute-force membership scan after each wave.
#[test]
fn test_view_matches_brute_force_under_churn() {
    let mut registry = Registry::new();
    let mut live: Vec<Entity> = Vec::new();

    for wave in 0u32..5 {
        // Spawn a wave.
        for i in 0..20 {
            let e = registry.create();
            let f = (wave * 20 + i) as f32;
            registry.insert(e, Position { x: f, y: -f }).unwrap();
            if i % 3 == 0 {
                registry.insert(e, Velocity { dx: 1.0, dy: 0.0 }).unwrap();
            }
            live.push(e);
        }
        // Cull every fourth survivor and strip velocity from every fifth.
        let mut index = 0;
        live.retain(|&e| {
            index += 1;
            if index % 4 == 0 {
                registry.destroy(e);
                false
            } else {
                if index % 5 == 0 {
                    registry.remove::<Velocity>(e);
                }
                true
            }
        });

        let mut expected: Vec<Entity> = live
            .iter()
            .copied()
            .filter(|&e| registry.has::<Position>(e) && registry.has::<Velocity>(e))
            .collect();
        expected.sort();

        let mut actual = Vec::new();
        registry
            .view::<(&Position, &Velocity)>()
            .unwrap()
            .each(|e, (_, _)| actual.push(e));
        actual.sort();

        assert_eq!(actual, expected, "wave {wave} diverged");
        assert_eq!(registry.entity_count(), live.len());

        // Every surviving position still belongs to its own entity.
        for &e in &live {
            assert!(registry.valid(e));
            assert!(registry.has::<Position>(e));
        }
    }
}

/// A full frame loop: startup spawns, update integrates motion using the
/// frame clock, and results accumulate across frames.
#[test]
fn test_frame_loop_integrates_motion() -> EcsResult<()> {
    let mut scheduler = Scheduler::new();
    scheduler.add_system(Schedule::Startup, "spawn_mover", |ctx| {
        let e = ctx.registry.create();
        ctx.registry.insert(e, Position { x: 0.0, y: 0.0 })?;
        ctx.registry.insert(e, Velocity { dx: 10.0, dy: 0.0 })?;
        Ok(())
    });
    scheduler.add_system(Schedule::Update, "movement", |ctx| {
        let delta = ctx.time().delta;
        ctx.registry
            .view::<(&Velocity, &mut Position)>()?
            .each(|_, (vel, pos)| {
                pos.x += vel.dx * delta;
                pos.y += vel.dy * delta;
            });
        Ok(())
    });

    let mut registry = Registry::new();
    let mut resources = Resources::new();
    for _ in 0..10 {
        scheduler.run_frame(&mut registry, &mut resources, 0.1)?;
    }

    let mut positions = Vec::new();
    registry
        .view::<(&Position,)>()?
        .each(|_, (pos,)| positions.push(*pos));
    assert_eq!(positions.len(), 1);
    assert!((positions[0].x - 10.0).abs() < 1e-4);
    Ok(())
}

/// An aborted phase skips the rest of the frame; a continuing policy does
/// not.
#[test]
fn test_frame_abort_skips_later_phases() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let run = |policy: FailurePolicy| {
        let rendered = Rc::new(RefCell::new(0u32));
        let counter = Rc::clone(&rendered);

        let mut scheduler = Scheduler::with_policy(policy);
        scheduler.add_system(Schedule::Update, "broken", |_| {
            Err(EcsError::MissingResource { resource: "Assets" })
        });
        scheduler.add_system(Schedule::Render, "render", move |_| {
            *counter.borrow_mut() += 1;
            Ok(())
        });

        let mut registry = Registry::new();
        let mut resources = Resources::new();
        let result = scheduler.run_frame(&mut registry, &mut resources, 0.016);
        let count = *rendered.borrow();
        (result, count)
    };

    let (result, rendered) = run(FailurePolicy::AbortPhase);
    assert!(result.is_err());
    assert_eq!(rendered, 0, "render phase must not run after an abort");

    let (result, rendered) = run(FailurePolicy::LogAndContinue);
    assert!(result.is_ok());
    assert_eq!(rendered, 1);
}

/// Destroying inside `each` cannot compile (the view holds the registry
/// shared), so the supported pattern is deferring structural changes.
#[test]
fn test_deferred_destruction_after_iteration() {
    let mut registry = Registry::new();
    for i in 0..10u32 {
        let e = registry.create();
        registry.insert(e, i).unwrap();
    }

    let mut doomed = Vec::new();
    registry.view::<(&u32,)>().unwrap().each(|e, (n,)| {
        if *n % 2 == 0 {
            doomed.push(e);
        }
    });
    for e in doomed {
        registry.destroy(e);
    }

    assert_eq!(registry.entity_count(), 5);
    registry
        .view::<(&u32,)>()
        .unwrap()
        .each(|_, (n,)| assert_eq!(*n % 2, 1));
}

/// Generation counters survive `clear`, so pre-clear handles stay dead even
/// after their indices come back into use.
#[test]
fn test_clear_then_respawn() {
    let mut registry = Registry::new();
    let before: Vec<Entity> = registry.create_many(8);
    for &e in &before {
        registry.insert(e, Position { x: 1.0, y: 1.0 }).unwrap();
    }

    registry.clear();
    let after = registry.create_many(8);

    for (&old, &new) in before.iter().zip(&after) {
        assert!(!registry.valid(old));
        assert!(registry.valid(new));
        assert!(!registry.has::<Position>(new));
        assert!(registry.get::<Position>(old).is_err());
    }
}
