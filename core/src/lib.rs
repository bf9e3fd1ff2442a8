#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Barrage simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and the simulation systems. Adapters submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! that adapters use to drive renderables and feedback. Systems share the
//! [`Impactable`] contract for targets and draw all of their variance from an
//! injected [`RandomSource`].

use std::time::Duration;

use glam::{Quat, Vec3};
use serde::Deserialize;
use thiserror::Error;

pub mod math;
pub mod random;

pub use random::{RandomSource, SeededRandom};

/// Longest step, in seconds, that any component integrates within one tick.
pub const MAX_STEP_SECONDS: f32 = 0.2;

/// Number of projectiles queued per batch by [`Command::EnqueueRandomBatches`].
pub const RANDOM_BATCH_SIZE: i32 = 5;

/// Converts a tick duration into seconds, capped at [`MAX_STEP_SECONDS`].
///
/// Capping bounds the integration error after a stalled frame.
#[must_use]
pub fn clamp_step(dt: Duration) -> f32 {
    dt.as_secs_f32().min(MAX_STEP_SECONDS)
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that projectiles be appended to the spawner backlog.
    Enqueue {
        /// Number of projectiles requested. Values below one are coerced to one.
        amount: i32,
        /// Kind to spawn, or `None` to pick one at random from the catalog.
        kind: Option<KindId>,
    },
    /// Queues several batches of randomly chosen projectiles.
    EnqueueRandomBatches {
        /// Number of backlog items to append.
        batches: u32,
    },
    /// Installs a fresh target built from the provided geometry.
    AssignTarget {
        /// Reference geometry, or `None` for a partially configured target.
        geometry: Option<TargetGeometry>,
    },
    /// Removes the current target so that later launches are invalid.
    ClearTarget,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that projectiles were appended to the backlog.
    ProjectileQueued {
        /// Kind selected for the backlog item.
        kind: KindId,
        /// Number of projectiles the item will spawn.
        amount: u32,
        /// Backlog depth after the item was appended.
        depth: usize,
    },
    /// Reports that an enqueue request was refused and the backlog is unchanged.
    EnqueueRejected {
        /// Specific reason the request failed.
        reason: EnqueueError,
    },
    /// Announces that a projectile instance was created and awaits launch.
    ProjectileSpawned {
        /// Identifier assigned to the new projectile.
        projectile: ProjectileId,
        /// Kind the projectile was created from.
        kind: KindId,
        /// World position of the instance.
        position: Vec3,
        /// Initial orientation of the instance.
        orientation: Quat,
    },
    /// Announces that the held batch was fired at the target.
    BatchLaunched {
        /// Number of projectiles contained in the batch.
        count: usize,
    },
    /// Announces that the post-launch cooldown finished.
    CooldownElapsed,
    /// Reports that a projectile was destroyed because it had no valid target.
    ProjectileDiscarded {
        /// Identifier of the discarded projectile.
        projectile: ProjectileId,
    },
    /// Reports that a projectile reached its target and transferred damage.
    ImpactDelivered {
        /// Identifier of the projectile that struck.
        projectile: ProjectileId,
        /// Target that received the impact.
        target: TargetId,
        /// Weight of the projectile.
        weight: u32,
        /// Velocity of the projectile at the moment of impact.
        impact: Vec3,
    },
    /// Carries the opacity a bouncing projectile should be rendered with.
    ProjectileFaded {
        /// Identifier of the fading projectile.
        projectile: ProjectileId,
        /// Opacity in the range `0.0..=1.0`.
        opacity: f32,
    },
    /// Reports that a projectile finished its bounce and was removed.
    ProjectileExpired {
        /// Identifier of the expired projectile.
        projectile: ProjectileId,
    },
    /// Confirms that a new target was installed.
    TargetAssigned {
        /// Identifier allocated to the target.
        target: TargetId,
    },
    /// Confirms that the target was removed.
    TargetCleared,
}

/// Reasons an enqueue request may be rejected.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum EnqueueError {
    /// A random kind was requested but the catalog holds no kinds.
    #[error("no projectile kinds are configured for random selection")]
    EmptyCatalog,
    /// The requested kind does not exist in the catalog.
    #[error("projectile kind {0:?} is not present in the catalog")]
    UnknownKind(KindId),
}

/// Unique identifier assigned to a projectile instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index of a projectile kind within a [`KindCatalog`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KindId(u32);

impl KindId {
    /// Creates a new kind identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a target each time one is installed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(u32);

impl TargetId {
    /// Creates a new target identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Authored flight and bounce parameters of a projectile type.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    /// Impact mass; heavier projectiles transfer more damage.
    pub weight: u32,
    /// Launch speed in units per second.
    pub velocity: f32,
    /// Maximum deviation applied to the launch speed.
    pub velocity_variance: f32,
    /// Radius of the random XY offset applied to the aim point.
    pub spread: f32,
    /// Rotation speed in degrees per second.
    pub rotation_speed: f32,
    /// Fractional variance applied to the rotation rate.
    pub rotation_variance: f32,
    /// Allows the spin axis to point anywhere instead of along Z.
    pub rotation_3d: bool,
    /// Speed of the projectile after it bounces off the target.
    pub bounce_velocity: f32,
    /// Maximum deviation applied to the bounce speed.
    pub bounce_velocity_variance: f32,
    /// Fraction of the way from straight reversal toward a random XY direction.
    pub bounce_spread_angle: f32,
    /// Downward acceleration applied while bouncing.
    pub bounce_gravity: f32,
    /// Seconds a projectile survives after bouncing.
    pub bounce_lifespan: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            weight: 5,
            velocity: 20.0,
            velocity_variance: 8.0,
            spread: 0.5,
            rotation_speed: 100.0,
            rotation_variance: 0.3,
            rotation_3d: false,
            bounce_velocity: 6.0,
            bounce_velocity_variance: 2.0,
            bounce_spread_angle: 0.5,
            bounce_gravity: 5.0,
            bounce_lifespan: 2.0,
        }
    }
}

/// Named projectile type available for selection.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ProjectileKind {
    /// Human readable name of the kind.
    pub name: String,
    /// Flight parameters shared by every projectile of the kind.
    #[serde(default)]
    pub config: ProjectileConfig,
}

/// Ordered list of projectile kinds, addressed by [`KindId`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KindCatalog {
    kinds: Vec<ProjectileKind>,
}

impl KindCatalog {
    /// Creates a catalog from the provided kinds, preserving their order.
    #[must_use]
    pub fn new(kinds: Vec<ProjectileKind>) -> Self {
        Self { kinds }
    }

    /// Retrieves the kind registered under the provided identifier.
    #[must_use]
    pub fn get(&self, kind: KindId) -> Option<&ProjectileKind> {
        usize::try_from(kind.get())
            .ok()
            .and_then(|index| self.kinds.get(index))
    }

    /// Looks up a kind by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<KindId> {
        self.kinds
            .iter()
            .position(|kind| kind.name == name)
            .and_then(|index| u32::try_from(index).ok())
            .map(KindId::new)
    }

    /// Picks a kind uniformly at random, or `None` when the catalog is empty.
    pub fn pick(&self, rng: &mut dyn RandomSource) -> Option<KindId> {
        if self.kinds.is_empty() {
            return None;
        }
        u32::try_from(rng.index(self.kinds.len()))
            .ok()
            .map(KindId::new)
    }

    /// Number of kinds contained in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Reports whether the catalog holds no kinds.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Iterator over the kinds in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectileKind> {
        self.kinds.iter()
    }
}

/// Reference geometry supplied by the host for a target.
#[derive(Clone, Debug, PartialEq)]
pub struct TargetGeometry {
    position: Vec3,
    local_scale: Vec3,
    vertices: Vec<Vec3>,
}

impl TargetGeometry {
    /// Creates a geometry description from a world position, local scale and
    /// the mesh's reference points in local space.
    #[must_use]
    pub fn new(position: Vec3, local_scale: Vec3, vertices: Vec<Vec3>) -> Self {
        Self {
            position,
            local_scale,
            vertices,
        }
    }

    /// World position of the mesh origin.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Local scale applied to the reference points.
    #[must_use]
    pub const fn local_scale(&self) -> Vec3 {
        self.local_scale
    }

    /// Reference points in local space.
    #[must_use]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }
}

/// Contract exposed by anything projectiles can be thrown at.
pub trait Impactable {
    /// Identifier of the target instance.
    fn id(&self) -> TargetId;

    /// World-space point projectiles aim for.
    fn target_position(&self) -> Vec3;

    /// Records an impact of the given weight travelling along `impact`.
    fn add_damage(&mut self, weight: u32, impact: Vec3);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_step_caps_long_frames() {
        assert_eq!(clamp_step(Duration::from_millis(100)), 0.1);
        assert_eq!(clamp_step(Duration::from_secs(3)), MAX_STEP_SECONDS);
    }

    #[test]
    fn catalog_lookup_by_name_and_id() {
        let catalog = KindCatalog::new(vec![
            ProjectileKind {
                name: "pebble".to_owned(),
                config: ProjectileConfig::default(),
            },
            ProjectileKind {
                name: "brick".to_owned(),
                config: ProjectileConfig {
                    weight: 40,
                    ..ProjectileConfig::default()
                },
            },
        ]);

        let brick = catalog.find("brick").expect("brick is registered");
        assert_eq!(brick, KindId::new(1));
        assert_eq!(catalog.get(brick).map(|kind| kind.config.weight), Some(40));
        assert!(catalog.get(KindId::new(2)).is_none());
        assert!(catalog.find("anvil").is_none());
    }

    #[test]
    fn empty_catalog_picks_nothing() {
        let catalog = KindCatalog::default();
        let mut rng = SeededRandom::new(7);
        assert!(catalog.pick(&mut rng).is_none());
    }

    #[test]
    fn projectile_config_fills_missing_fields_with_defaults() {
        let config: ProjectileConfig =
            toml::from_str("weight = 12\nrotation_3d = true").expect("parse config");

        assert_eq!(config.weight, 12);
        assert!(config.rotation_3d);
        assert_eq!(config.velocity, ProjectileConfig::default().velocity);
        assert_eq!(config.bounce_lifespan, 2.0);
    }
}
