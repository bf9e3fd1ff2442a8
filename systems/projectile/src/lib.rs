#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Flight and bounce state machine for a single thrown projectile.
//!
//! Flight toward the target is a straight line at constant speed; the
//! projectile "arrives" once its flight time passes an arrival estimate made
//! at launch. It then hands its velocity to the target as an impact and
//! bounces away under simple gravity until its bounce lifespan runs out.

use barrage_core::{
    math::{random_xy_direction, rotate_about, slerp_directions},
    Event, Impactable, KindId, ProjectileConfig, ProjectileId, RandomSource, TargetId,
};
use glam::{Quat, Vec3};

/// Slowest launch speed a projectile may be given.
const MINIMUM_LAUNCH_SPEED: f32 = 0.01;

/// Lifecycle stage of a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Created and held by a batch; ticking has no effect.
    Unlaunched,
    /// Flying toward the target.
    Inbound,
    /// Bouncing away after the impact.
    Bouncing,
    /// Finished; the owner should drop the instance.
    Terminated,
}

/// A projectile instance and its flight state.
#[derive(Clone, Debug)]
pub struct Projectile {
    id: ProjectileId,
    kind: KindId,
    config: ProjectileConfig,
    position: Vec3,
    orientation: Quat,
    velocity: Vec3,
    spin_axis: Vec3,
    phase: Phase,
    flight_time: f32,
    bounce_duration: f32,
    eta: f32,
    target: Option<TargetId>,
}

impl Projectile {
    /// Creates an inert, unlaunched projectile.
    #[must_use]
    pub fn new(
        id: ProjectileId,
        kind: KindId,
        config: ProjectileConfig,
        position: Vec3,
        orientation: Quat,
    ) -> Self {
        Self {
            id,
            kind,
            config,
            position,
            orientation,
            velocity: Vec3::ZERO,
            spin_axis: Vec3::ZERO,
            phase: Phase::Unlaunched,
            flight_time: 0.0,
            bounce_duration: 0.0,
            eta: 0.0,
            target: None,
        }
    }

    /// Identifier of the projectile.
    #[must_use]
    pub const fn id(&self) -> ProjectileId {
        self.id
    }

    /// Kind the projectile was created from.
    #[must_use]
    pub const fn kind(&self) -> KindId {
        self.kind
    }

    /// Flight parameters of the projectile.
    #[must_use]
    pub const fn config(&self) -> &ProjectileConfig {
        &self.config
    }

    /// Current world position.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Current orientation.
    #[must_use]
    pub const fn orientation(&self) -> Quat {
        self.orientation
    }

    /// Current velocity.
    #[must_use]
    pub const fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Axis the projectile spins about. Its length carries the drawn rotation
    /// variance.
    #[must_use]
    pub const fn spin_axis(&self) -> Vec3 {
        self.spin_axis
    }

    /// Current lifecycle stage.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Seconds the projectile has been flying.
    #[must_use]
    pub const fn flight_time(&self) -> f32 {
        self.flight_time
    }

    /// Seconds since the projectile bounced.
    #[must_use]
    pub const fn bounce_duration(&self) -> f32 {
        self.bounce_duration
    }

    /// Estimated seconds from launch to impact.
    #[must_use]
    pub const fn eta(&self) -> f32 {
        self.eta
    }

    /// Target the projectile was launched at.
    #[must_use]
    pub const fn target(&self) -> Option<TargetId> {
        self.target
    }

    /// Reports whether the owner should drop the projectile.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.phase == Phase::Terminated
    }

    /// Fires the projectile at `target`.
    ///
    /// Without a target the projectile terminates immediately and no damage is
    /// ever recorded. Launching anything but an unlaunched projectile is a
    /// no-op.
    pub fn launch(
        &mut self,
        target: Option<&dyn Impactable>,
        rng: &mut dyn RandomSource,
        out: &mut Vec<Event>,
    ) {
        if self.phase != Phase::Unlaunched {
            return;
        }

        let Some(target) = target else {
            self.discard(out);
            return;
        };

        let spread = self.config.spread;
        let offset = Vec3::new(rng.range(-spread, spread), rng.range(-spread, spread), 0.0);
        let aim = target.target_position() - self.position + offset;

        let variance = self.config.velocity_variance;
        let speed =
            (self.config.velocity + rng.range(-variance, variance)).max(MINIMUM_LAUNCH_SPEED);
        self.velocity = aim.normalize_or_zero() * speed;

        let variance = self.config.rotation_variance;
        self.spin_axis =
            draw_spin_axis(&self.config, rng) * rng.range(1.0 - variance, 1.0 + variance);

        let travel_speed = self.velocity.length();
        self.eta = if travel_speed > 0.0 {
            aim.length() / travel_speed
        } else {
            0.0
        };
        self.target = Some(target.id());
        self.phase = Phase::Inbound;
    }

    /// Advances the projectile by `dt` seconds.
    ///
    /// `target` must be the target the projectile was launched at; an inbound
    /// projectile whose target has gone away is discarded. Bouncing projectiles
    /// no longer need their target.
    pub fn tick(
        &mut self,
        dt: f32,
        target: Option<&mut dyn Impactable>,
        rng: &mut dyn RandomSource,
        out: &mut Vec<Event>,
    ) {
        match self.phase {
            Phase::Unlaunched | Phase::Terminated => return,
            Phase::Inbound | Phase::Bouncing => {}
        }

        let target = target.filter(|target| Some(target.id()) == self.target);
        if self.phase == Phase::Inbound && target.is_none() {
            log::warn!("projectile {:?} lost its target in flight", self.id);
            self.discard(out);
            return;
        }

        self.orientation = rotate_about(
            self.orientation,
            self.spin_axis,
            self.config.rotation_speed * dt,
        );
        self.position += self.velocity * dt;
        self.flight_time += dt;

        if self.phase == Phase::Inbound && self.flight_time > self.eta {
            if let Some(target) = target {
                self.strike(target, out);
                self.bounce(rng);
            }
        }

        if self.phase == Phase::Bouncing {
            self.bounce_duration += dt;
            self.velocity.y -= self.config.bounce_gravity * dt;

            let lifespan = self.config.bounce_lifespan;
            if self.bounce_duration > lifespan {
                self.phase = Phase::Terminated;
                out.push(Event::ProjectileExpired {
                    projectile: self.id,
                });
            } else if self.bounce_duration > lifespan / 2.0 {
                out.push(Event::ProjectileFaded {
                    projectile: self.id,
                    opacity: fade_opacity(self.bounce_duration, lifespan),
                });
            }
        }
    }

    fn discard(&mut self, out: &mut Vec<Event>) {
        self.phase = Phase::Terminated;
        out.push(Event::ProjectileDiscarded {
            projectile: self.id,
        });
    }

    fn strike(&mut self, target: &mut dyn Impactable, out: &mut Vec<Event>) {
        let weight = self.config.weight;
        target.add_damage(weight, self.velocity);
        log::debug!(
            "projectile {:?} struck target {:?} at {:.2} u/s",
            self.id,
            target.id(),
            self.velocity.length()
        );
        out.push(Event::ImpactDelivered {
            projectile: self.id,
            target: target.id(),
            weight,
            impact: self.velocity,
        });
    }

    fn bounce(&mut self, rng: &mut dyn RandomSource) {
        let reversed = -self.velocity.normalize_or_zero();
        let sideways = random_xy_direction(rng);
        let spread = self.config.bounce_spread_angle;
        let blend = rng.range(spread / 2.0, spread);
        let direction = slerp_directions(reversed, sideways, blend);

        let variance = self.config.bounce_velocity_variance;
        self.velocity = direction * (self.config.bounce_velocity + rng.range(-variance, variance));
        self.spin_axis = draw_spin_axis(&self.config, rng);
        self.bounce_duration = 0.0;
        self.phase = Phase::Bouncing;
    }
}

fn draw_spin_axis(config: &ProjectileConfig, rng: &mut dyn RandomSource) -> Vec3 {
    if config.rotation_3d {
        rng.unit_sphere()
    } else {
        Vec3::new(0.0, 0.0, rng.range(-1.0, 1.0))
    }
}

/// Opacity for the back half of a bounce: 1 at half-life, 0 at the end.
fn fade_opacity(bounce_duration: f32, lifespan: f32) -> f32 {
    ((lifespan - bounce_duration) * 2.0 / lifespan).clamp(0.0, 1.0)
}
