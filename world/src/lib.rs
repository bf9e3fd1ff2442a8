#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative simulation state for Barrage.
//!
//! The world owns the spawner, every live projectile, the current target and
//! the random source. All mutation flows through [`apply`]; adapters read the
//! state back through the [`query`] module.

use barrage_core::{
    clamp_step, Command, Event, Impactable, KindCatalog, KindId, ProjectileConfig,
    ProjectileKind, SeededRandom, TargetId, RANDOM_BATCH_SIZE,
};
use barrage_system_projectile::Projectile;
use barrage_system_spawner::{Spawner, SpawnerConfig};
use barrage_system_target::{DamageTuning, Target};
use glam::{Quat, Vec3};

const DEFAULT_SEED: u64 = 0x5eed_ba44_a6e0_0001;
const DEFAULT_KIND_NAME: &str = "stone";

/// Settings used to build a [`World`].
#[derive(Clone, Debug)]
pub struct WorldConfig {
    /// Seed of the random source every system draws from.
    pub seed: u64,
    /// Batching parameters of the spawner.
    pub spawner: SpawnerConfig,
    /// World position projectiles are spawned around.
    pub spawner_position: Vec3,
    /// Orientation given to freshly spawned projectiles.
    pub spawner_orientation: Quat,
    /// Damage parameters applied to every target the world installs.
    pub tuning: DamageTuning,
    /// Projectile kinds available for spawning.
    pub catalog: KindCatalog,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            spawner: SpawnerConfig::default(),
            spawner_position: Vec3::ZERO,
            spawner_orientation: Quat::IDENTITY,
            tuning: DamageTuning::default(),
            catalog: KindCatalog::new(vec![ProjectileKind {
                name: DEFAULT_KIND_NAME.to_owned(),
                config: ProjectileConfig::default(),
            }]),
        }
    }
}

/// Represents the authoritative Barrage world state.
#[derive(Debug)]
pub struct World {
    spawner: Spawner,
    projectiles: Vec<Projectile>,
    target: Option<Target>,
    tuning: DamageTuning,
    rng: SeededRandom,
    next_target: u32,
    tick_index: u64,
}

impl World {
    /// Creates a world with no target and an empty backlog.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        Self {
            spawner: Spawner::new(
                config.spawner,
                config.catalog,
                config.spawner_position,
                config.spawner_orientation,
            ),
            projectiles: Vec::new(),
            target: None,
            tuning: config.tuning.sanitized(),
            rng: SeededRandom::new(config.seed),
            next_target: 0,
            tick_index: 0,
        }
    }

    fn enqueue(
        &mut self,
        amount: i32,
        kind: Option<KindId>,
        out_events: &mut Vec<Event>,
    ) -> bool {
        match self.spawner.enqueue(amount, kind, &mut self.rng) {
            Ok(depth) => {
                if let Some(item) = self.spawner.backlog().back() {
                    out_events.push(Event::ProjectileQueued {
                        kind: item.kind(),
                        amount: item.remaining(),
                        depth,
                    });
                }
                true
            }
            Err(reason) => {
                log::warn!("enqueue of {amount} projectiles rejected: {reason}");
                out_events.push(Event::EnqueueRejected { reason });
                false
            }
        }
    }

    fn advance(&mut self, step: f32, out_events: &mut Vec<Event>) {
        if let Some(target) = self.target.as_mut() {
            target.tick(step);
        }

        for projectile in &mut self.projectiles {
            let target = self
                .target
                .as_mut()
                .map(|target| target as &mut dyn Impactable);
            projectile.tick(step, target, &mut self.rng, out_events);
        }
        self.projectiles
            .retain(|projectile| !projectile.is_terminated());

        let target = self.target.as_ref().map(|target| target as &dyn Impactable);
        self.spawner.tick(
            step,
            target,
            &mut self.rng,
            &mut self.projectiles,
            out_events,
        );
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
            world.advance(clamp_step(dt), out_events);
        }
        Command::Enqueue { amount, kind } => {
            let _ = world.enqueue(amount, kind, out_events);
        }
        Command::EnqueueRandomBatches { batches } => {
            for _ in 0..batches {
                if !world.enqueue(RANDOM_BATCH_SIZE, None, out_events) {
                    break;
                }
            }
        }
        Command::AssignTarget { geometry } => {
            let id = TargetId::new(world.next_target);
            world.next_target = world.next_target.wrapping_add(1);
            world.target = Some(Target::new(id, world.tuning, geometry));
            log::debug!("assigned target {id:?}");
            out_events.push(Event::TargetAssigned { target: id });
        }
        Command::ClearTarget => {
            if world.target.take().is_some() {
                out_events.push(Event::TargetCleared);
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::collections::VecDeque;

    use super::World;
    use barrage_core::KindCatalog;
    use barrage_system_projectile::Projectile;
    use barrage_system_spawner::{QueueItem, Spawner};
    use barrage_system_target::Target;

    /// Number of ticks applied so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Provides read-only access to the current target, if any.
    #[must_use]
    pub fn target(world: &World) -> Option<&Target> {
        world.target.as_ref()
    }

    /// Accumulated damage of the current target, or zero without one.
    #[must_use]
    pub fn damage(world: &World) -> f32 {
        world.target.as_ref().map_or(0.0, Target::damage)
    }

    /// Projectiles that have been launched and are still in flight or bouncing.
    #[must_use]
    pub fn projectiles(world: &World) -> &[Projectile] {
        &world.projectiles
    }

    /// Provides read-only access to the spawner.
    #[must_use]
    pub fn spawner(world: &World) -> &Spawner {
        &world.spawner
    }

    /// Items waiting in the spawner backlog, oldest first.
    #[must_use]
    pub fn backlog(world: &World) -> &VecDeque<QueueItem> {
        world.spawner.backlog()
    }

    /// Total projectiles still to be spawned.
    #[must_use]
    pub fn pending(world: &World) -> u64 {
        world.spawner.pending()
    }

    /// Projectile kinds the world can spawn.
    #[must_use]
    pub fn catalog(world: &World) -> &KindCatalog {
        world.spawner.catalog()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use barrage_core::{EnqueueError, TargetGeometry};

    fn geometry() -> TargetGeometry {
        TargetGeometry::new(
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::ONE,
            vec![
                Vec3::new(0.0, 1.5, 0.0),
                Vec3::new(0.3, 0.2, 0.0),
                Vec3::new(0.0, -1.5, 0.0),
            ],
        )
    }

    fn tick(world: &mut World, millis: u64) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::Tick {
                dt: Duration::from_millis(millis),
            },
            &mut events,
        );
        events
    }

    #[test]
    fn tick_reports_elapsed_time() {
        let mut world = World::default();

        let events = tick(&mut world, 16);

        assert_eq!(
            events,
            vec![Event::TimeAdvanced {
                dt: Duration::from_millis(16)
            }]
        );
        assert_eq!(query::tick_index(&world), 1);
    }

    #[test]
    fn enqueue_confirms_kind_and_depth() {
        let mut world = World::default();
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::Enqueue {
                amount: -2,
                kind: Some(KindId::new(0)),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::ProjectileQueued {
                kind: KindId::new(0),
                amount: 1,
                depth: 1,
            }]
        );
    }

    #[test]
    fn unknown_kind_is_rejected_without_touching_the_backlog() {
        let mut world = World::default();
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::Enqueue {
                amount: 3,
                kind: Some(KindId::new(4)),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::EnqueueRejected {
                reason: EnqueueError::UnknownKind(KindId::new(4))
            }]
        );
        assert!(query::backlog(&world).is_empty());
    }

    #[test]
    fn random_batches_stop_at_the_first_rejection() {
        let mut world = World::new(WorldConfig {
            catalog: KindCatalog::default(),
            ..WorldConfig::default()
        });
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::EnqueueRandomBatches { batches: 4 },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::EnqueueRejected {
                reason: EnqueueError::EmptyCatalog
            }]
        );
        assert_eq!(query::pending(&world), 0);
    }

    #[test]
    fn random_batches_queue_five_each() {
        let mut world = World::default();
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::EnqueueRandomBatches { batches: 3 },
            &mut events,
        );

        assert_eq!(query::backlog(&world).len(), 3);
        assert_eq!(query::pending(&world), 15);
    }

    #[test]
    fn assigning_targets_allocates_fresh_ids() {
        let mut world = World::default();
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::AssignTarget { geometry: None },
            &mut events,
        );
        apply(
            &mut world,
            Command::AssignTarget {
                geometry: Some(geometry()),
            },
            &mut events,
        );
        apply(&mut world, Command::ClearTarget, &mut events);
        apply(&mut world, Command::ClearTarget, &mut events);

        assert_eq!(
            events,
            vec![
                Event::TargetAssigned {
                    target: TargetId::new(0)
                },
                Event::TargetAssigned {
                    target: TargetId::new(1)
                },
                Event::TargetCleared,
            ]
        );
        assert!(query::target(&world).is_none());
    }

    #[test]
    fn long_frames_are_clamped() {
        let mut world = World::default();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Enqueue {
                amount: 2,
                kind: None,
            },
            &mut events,
        );

        let _ = tick(&mut world, 5_000);

        let batch_time = query::spawner(&world).batch_time();
        assert!((batch_time - barrage_core::MAX_STEP_SECONDS).abs() < 1.0e-6);
    }

    #[test]
    fn volley_damages_the_target_and_cleans_up() {
        let mut world = World::new(WorldConfig {
            spawner: SpawnerConfig {
                maximum_spawns: 3,
                ..SpawnerConfig::default()
            },
            ..WorldConfig::default()
        });
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AssignTarget {
                geometry: Some(geometry()),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::Enqueue {
                amount: 3,
                kind: None,
            },
            &mut events,
        );

        let mut impacts = 0;
        let mut expired = 0;
        let mut peak_damage: f32 = 0.0;
        for _ in 0..300 {
            for event in tick(&mut world, 20) {
                match event {
                    Event::ImpactDelivered { .. } => impacts += 1,
                    Event::ProjectileExpired { .. } => expired += 1,
                    _ => {}
                }
            }
            peak_damage = peak_damage.max(query::damage(&world));
        }

        assert_eq!(impacts, 3);
        assert_eq!(expired, 3);
        assert!(peak_damage > 0.0);
        assert!(query::projectiles(&world).is_empty());
    }

    #[test]
    fn clearing_the_target_discards_inbound_projectiles() {
        let mut world = World::new(WorldConfig {
            spawner: SpawnerConfig {
                maximum_spawns: 2,
                ..SpawnerConfig::default()
            },
            ..WorldConfig::default()
        });
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AssignTarget {
                geometry: Some(geometry()),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::Enqueue {
                amount: 2,
                kind: None,
            },
            &mut events,
        );
        let _ = tick(&mut world, 20);
        assert_eq!(query::projectiles(&world).len(), 2);

        events.clear();
        apply(&mut world, Command::ClearTarget, &mut events);
        events.extend(tick(&mut world, 20));

        let discarded = events
            .iter()
            .filter(|event| matches!(event, Event::ProjectileDiscarded { .. }))
            .count();
        assert_eq!(discarded, 2);
        assert!(query::projectiles(&world).is_empty());
    }
}
