#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Batching controller that turns queued volley requests into launches.
//!
//! Requests wait in a first-in-first-out backlog. Each tick a bounded number
//! of projectiles is drawn from it into the current batch; once the batch is
//! full or has waited long enough, every held projectile is launched at the
//! target in spawn order and the spawner cools down before drawing again.

use std::collections::VecDeque;

use barrage_core::{
    EnqueueError, Event, Impactable, KindCatalog, KindId, ProjectileId, RandomSource,
};
use barrage_system_projectile::Projectile;
use glam::{Quat, Vec3};
use serde::Deserialize;

/// Configuration parameters of the spawner.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    /// Most projectiles a batch may hold before it is launched.
    pub maximum_spawns: usize,
    /// Seconds a started batch waits before it is launched regardless of size.
    pub maximum_wait_time: f32,
    /// Seconds after a launch before drawing resumes.
    pub cooldown_period: f32,
    /// Most projectiles created in a single tick.
    pub maximum_spawn_per_frame: usize,
    /// Radius of the random offset applied to spawn positions.
    pub spawn_spread: f32,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            maximum_spawns: 1_000,
            maximum_wait_time: 3.0,
            cooldown_period: 3.0,
            maximum_spawn_per_frame: 10,
            spawn_spread: 0.2,
        }
    }
}

impl SpawnerConfig {
    /// Returns a copy with every value clamped to a sane minimum.
    #[must_use]
    pub fn sanitized(self) -> Self {
        Self {
            maximum_spawns: self.maximum_spawns.max(1),
            maximum_wait_time: self.maximum_wait_time.max(0.0),
            cooldown_period: self.cooldown_period.max(0.0),
            maximum_spawn_per_frame: self.maximum_spawn_per_frame.max(1),
            spawn_spread: self.spawn_spread.max(0.0),
        }
    }
}

/// Backlog entry describing projectiles still to be spawned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct QueueItem {
    remaining: u32,
    kind: KindId,
}

impl QueueItem {
    /// Projectiles left to spawn from this item; always at least one.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Kind every projectile of the item is created from.
    #[must_use]
    pub const fn kind(&self) -> KindId {
        self.kind
    }
}

/// Stateful batching controller.
#[derive(Debug)]
pub struct Spawner {
    config: SpawnerConfig,
    catalog: KindCatalog,
    position: Vec3,
    orientation: Quat,
    backlog: VecDeque<QueueItem>,
    current: Option<QueueItem>,
    batch: Vec<Projectile>,
    batch_active: bool,
    batch_time: f32,
    cooling_down: bool,
    cooldown_time: f32,
    next_projectile: u32,
}

impl Spawner {
    /// Creates an idle spawner at the given pose drawing from `catalog`.
    #[must_use]
    pub fn new(
        config: SpawnerConfig,
        catalog: KindCatalog,
        position: Vec3,
        orientation: Quat,
    ) -> Self {
        let config = config.sanitized();
        Self {
            batch: Vec::with_capacity(config.maximum_spawns.min(1_024)),
            config,
            catalog,
            position,
            orientation,
            backlog: VecDeque::new(),
            current: None,
            batch_active: false,
            batch_time: 0.0,
            cooling_down: false,
            cooldown_time: 0.0,
            next_projectile: 0,
        }
    }

    /// Configuration in effect after clamping.
    #[must_use]
    pub const fn config(&self) -> &SpawnerConfig {
        &self.config
    }

    /// Projectile kinds available to the spawner.
    #[must_use]
    pub const fn catalog(&self) -> &KindCatalog {
        &self.catalog
    }

    /// World position projectiles are spawned around.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Items waiting in the backlog, oldest first.
    #[must_use]
    pub const fn backlog(&self) -> &VecDeque<QueueItem> {
        &self.backlog
    }

    /// Partially drawn item carried across ticks, if any.
    #[must_use]
    pub const fn current_item(&self) -> Option<&QueueItem> {
        self.current.as_ref()
    }

    /// Total projectiles still to be spawned.
    #[must_use]
    pub fn pending(&self) -> u64 {
        self.current
            .iter()
            .chain(self.backlog.iter())
            .map(|item| u64::from(item.remaining))
            .sum()
    }

    /// Spawned projectiles waiting for the batch to close.
    #[must_use]
    pub fn batch(&self) -> &[Projectile] {
        &self.batch
    }

    /// Reports whether a batch has started accumulating.
    #[must_use]
    pub const fn is_batch_active(&self) -> bool {
        self.batch_active
    }

    /// Seconds the current batch has been accumulating.
    #[must_use]
    pub const fn batch_time(&self) -> f32 {
        self.batch_time
    }

    /// Reports whether the post-launch cooldown is running.
    #[must_use]
    pub const fn is_cooling_down(&self) -> bool {
        self.cooling_down
    }

    /// Appends a request for `amount` projectiles to the backlog.
    ///
    /// Amounts below one are coerced to one. Without a kind, one is picked at
    /// random from the catalog. Returns the backlog depth after the append.
    pub fn enqueue(
        &mut self,
        amount: i32,
        kind: Option<KindId>,
        rng: &mut dyn RandomSource,
    ) -> Result<usize, EnqueueError> {
        let kind = match kind {
            Some(kind) if self.catalog.get(kind).is_some() => kind,
            Some(kind) => return Err(EnqueueError::UnknownKind(kind)),
            None => self.catalog.pick(rng).ok_or(EnqueueError::EmptyCatalog)?,
        };

        self.backlog.push_back(QueueItem {
            remaining: amount.max(1).unsigned_abs(),
            kind,
        });
        Ok(self.backlog.len())
    }

    /// Advances the spawner by `dt` seconds.
    ///
    /// A tick either runs the cooldown or draws from the backlog and, when the
    /// batch closes, launches it at `target`. Launched projectiles that are
    /// still alive are appended to `launched`.
    pub fn tick(
        &mut self,
        dt: f32,
        target: Option<&dyn Impactable>,
        rng: &mut dyn RandomSource,
        launched: &mut Vec<Projectile>,
        out: &mut Vec<Event>,
    ) {
        if self.cooling_down {
            self.cooldown_time += dt;
            if self.cooldown_time > self.config.cooldown_period {
                self.cooling_down = false;
                out.push(Event::CooldownElapsed);
            }
            return;
        }

        self.draw(rng, out);

        if self.batch_active {
            self.batch_time += dt;
            if self.batch.len() >= self.config.maximum_spawns
                || self.batch_time > self.config.maximum_wait_time
            {
                self.close_batch(target, rng, launched, out);
            }
        }
    }

    fn draw(&mut self, rng: &mut dyn RandomSource, out: &mut Vec<Event>) {
        let mut spawned_this_tick = 0;
        while spawned_this_tick < self.config.maximum_spawn_per_frame
            && self.batch.len() < self.config.maximum_spawns
        {
            let Some(mut item) = self.current.take().or_else(|| self.backlog.pop_front()) else {
                break;
            };
            self.batch_active = true;

            let Some(projectile) = self.spawn(item.kind, rng, out) else {
                log::warn!("dropping backlog item for unknown kind {:?}", item.kind);
                continue;
            };

            item.remaining -= 1;
            if item.remaining > 0 {
                self.current = Some(item);
            }
            self.batch.push(projectile);
            spawned_this_tick += 1;
        }
    }

    fn spawn(
        &mut self,
        kind: KindId,
        rng: &mut dyn RandomSource,
        out: &mut Vec<Event>,
    ) -> Option<Projectile> {
        let config = self.catalog.get(kind)?.config;
        let spread = self.config.spawn_spread;
        let scatter = rng.range(-spread, spread);
        let x = rng.range(-1.0, 1.0);
        let y = rng.range(-1.0, 1.0);
        let position = self.position + scatter * Vec3::new(x, y, 0.0);

        let id = ProjectileId::new(self.next_projectile);
        self.next_projectile = self.next_projectile.wrapping_add(1);
        log::trace!("spawned projectile {id:?} of kind {kind:?}");
        out.push(Event::ProjectileSpawned {
            projectile: id,
            kind,
            position,
            orientation: self.orientation,
        });

        Some(Projectile::new(id, kind, config, position, self.orientation))
    }

    fn close_batch(
        &mut self,
        target: Option<&dyn Impactable>,
        rng: &mut dyn RandomSource,
        launched: &mut Vec<Projectile>,
        out: &mut Vec<Event>,
    ) {
        let count = self.batch.len();
        log::debug!(
            "launching batch of {count} projectiles after {:.2}s",
            self.batch_time
        );
        out.push(Event::BatchLaunched { count });

        for mut projectile in self.batch.drain(..) {
            projectile.launch(target, rng, out);
            if !projectile.is_terminated() {
                launched.push(projectile);
            }
        }

        self.batch_active = false;
        self.batch_time = 0.0;
        self.cooling_down = true;
        self.cooldown_time = 0.0;
    }
}
