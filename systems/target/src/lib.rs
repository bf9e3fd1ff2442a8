#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Damage model for the object projectiles are thrown at.
//!
//! A [`Target`] folds every impact into a scalar damage value, a slowly
//! settling persistent displacement and a fast transient jitter. Damage decays
//! every tick; the combined displacement is projected onto externally owned
//! pose channels during a late blend pass.

use std::f32::consts::PI;

use barrage_core::{Impactable, TargetGeometry, TargetId};
use glam::Vec3;
use serde::Deserialize;

mod pose;

pub use pose::{Parameter, PoseChannel, PoseRig};

/// Calibration constants of the damage model.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DamageTuning {
    /// Converts raw impact magnitude into damage; larger values soften every hit.
    pub resistance: f32,
    /// Seconds needed to shed one unit of damage while below one unit.
    pub recovery_time: f32,
    /// Strength, from 0 to 1, of the kick-back when a channel would leave its bounds.
    pub schizo_level: f32,
    /// Divisor applied to the transient jitter produced by a hit.
    pub temp_damage_dampen: f32,
    /// Rate at which the transient jitter fades.
    pub temp_damage_recovery: f32,
}

impl Default for DamageTuning {
    fn default() -> Self {
        Self {
            resistance: 10_000.0,
            recovery_time: 2.0,
            schizo_level: 0.25,
            temp_damage_dampen: 3.0,
            temp_damage_recovery: 10.0,
        }
    }
}

impl DamageTuning {
    /// Returns a copy with every constant clamped into a usable range.
    #[must_use]
    pub fn sanitized(self) -> Self {
        Self {
            resistance: self.resistance.max(1.0),
            recovery_time: self.recovery_time.max(f32::EPSILON),
            schizo_level: self.schizo_level.clamp(0.0, 1.0),
            temp_damage_dampen: self.temp_damage_dampen.max(f32::EPSILON),
            temp_damage_recovery: self.temp_damage_recovery.max(0.0),
        }
    }
}

/// Accumulates impacts and decays them over time.
#[derive(Clone, Debug)]
pub struct Target {
    id: TargetId,
    tuning: DamageTuning,
    geometry: Option<TargetGeometry>,
    anchors: Option<Anchors>,
    damage: f32,
    persistent: Vec3,
    temporary: Vec3,
}

impl Target {
    /// Creates an undamaged target, caching its top and bottom reference points.
    ///
    /// A target without geometry still absorbs damage but aims projectiles at
    /// the world origin.
    #[must_use]
    pub fn new(id: TargetId, tuning: DamageTuning, geometry: Option<TargetGeometry>) -> Self {
        let anchors = geometry
            .as_ref()
            .and_then(|geometry| Anchors::from_vertices(geometry.vertices()));
        if anchors.is_none() {
            log::error!("target {id:?} has no reference geometry; aiming at the origin");
        }

        Self {
            id,
            tuning: tuning.sanitized(),
            geometry,
            anchors,
            damage: 0.0,
            persistent: Vec3::ZERO,
            temporary: Vec3::ZERO,
        }
    }

    /// Identifier assigned when the target was installed.
    #[must_use]
    pub const fn id(&self) -> TargetId {
        self.id
    }

    /// Calibration constants in effect.
    #[must_use]
    pub const fn tuning(&self) -> &DamageTuning {
        &self.tuning
    }

    /// Current scalar damage.
    #[must_use]
    pub const fn damage(&self) -> f32 {
        self.damage
    }

    /// Settled, direction-weighted displacement.
    #[must_use]
    pub const fn persistent_vector(&self) -> Vec3 {
        self.persistent
    }

    /// Fast-decaying recoil displacement.
    #[must_use]
    pub const fn temporary_vector(&self) -> Vec3 {
        self.temporary
    }

    /// Records an impact of `weight` travelling along `impact`.
    ///
    /// Damage grows by `|impact| * weight / resistance`. The displacement
    /// vectors use a folded direction whose Z component is derived from the
    /// X and Y components, so flat trajectories still lean the pose.
    pub fn add_damage(&mut self, weight: u32, impact: Vec3) {
        let impact_damage = impact.length() * weight as f32 / self.tuning.resistance;
        let folded = fold_depth(impact);
        let direction = match folded.try_normalize() {
            Some(direction) => direction,
            None => impact.normalize_or_zero(),
        };

        self.temporary = if impact_damage > 0.0 {
            direction / self.tuning.temp_damage_dampen
        } else {
            Vec3::ZERO
        };
        self.persistent += direction * impact_damage;
        self.damage += impact_damage;
    }

    /// Decays damage and both displacement vectors by `dt` seconds.
    ///
    /// Above one unit of damage recovery speeds up in proportion to the damage
    /// held; below it damage drains linearly. The persistent vector is then
    /// rescaled to the decayed damage.
    pub fn tick(&mut self, dt: f32) {
        let rate = if self.damage > 1.0 { self.damage } else { 1.0 };
        self.damage = (self.damage - dt / self.tuning.recovery_time * rate).max(0.0);
        self.persistent = self.persistent.normalize_or_zero() * self.damage;
        self.temporary *= (1.0 - dt * self.tuning.temp_damage_recovery).max(0.5);
    }

    /// World-space point halfway between the highest and lowest reference
    /// points, or the origin when no geometry is available.
    #[must_use]
    pub fn target_position(&self) -> Vec3 {
        let (Some(geometry), Some(anchors)) = (&self.geometry, self.anchors) else {
            return Vec3::ZERO;
        };
        let vertices = geometry.vertices();
        let top = vertices[anchors.top];
        let bottom = vertices[anchors.bottom];
        geometry.position() + top.lerp(bottom, 0.5) * geometry.local_scale()
    }

    /// Blends the current displacement and damage onto the rig's channels.
    ///
    /// Intended to run once per frame after animation and before rendering.
    /// Only the channels are mutated; missing channels are skipped.
    pub fn blend_pose<C: PoseChannel>(&self, rig: &mut PoseRig<C>) {
        if self.persistent.length() + self.temporary.length() > 0.0 {
            let displacement = self.persistent + self.temporary;
            let schizo = self.tuning.schizo_level;
            blend_axis_group(&mut rig.x, Vec3::X, displacement, schizo);
            blend_axis_group(&mut rig.y, Vec3::Y, displacement, schizo);
            blend_axis_group(&mut rig.z, Vec3::Z, displacement, schizo);
        }

        if self.damage > 0.0 {
            for channel in rig.increasing.iter_mut().filter_map(Option::as_mut) {
                let amount = self.damage * channel.maximum();
                channel.blend_additive(amount);
            }
            for channel in rig.decreasing.iter_mut().filter_map(Option::as_mut) {
                let amount = -self.damage * channel.maximum();
                channel.blend_additive(amount);
            }
        }
    }
}

impl Impactable for Target {
    fn id(&self) -> TargetId {
        self.id
    }

    fn target_position(&self) -> Vec3 {
        Target::target_position(self)
    }

    fn add_damage(&mut self, weight: u32, impact: Vec3) {
        Target::add_damage(self, weight, impact);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Anchors {
    top: usize,
    bottom: usize,
}

impl Anchors {
    fn from_vertices(vertices: &[Vec3]) -> Option<Self> {
        let first = vertices.first()?;
        let mut highest = first.y;
        let mut lowest = first.y;
        let mut anchors = Self { top: 0, bottom: 0 };

        for (index, vertex) in vertices.iter().enumerate().skip(1) {
            if vertex.y > highest {
                highest = vertex.y;
                anchors.top = index;
            } else if vertex.y < lowest {
                lowest = vertex.y;
                anchors.bottom = index;
            }
        }

        Some(anchors)
    }
}

fn fold_depth(impact: Vec3) -> Vec3 {
    let lean = if impact.x > 0.0 {
        impact.y.abs()
    } else {
        -impact.y.abs()
    };
    Vec3::new(impact.x, impact.y, impact.x + lean)
}

fn blend_axis_group<C: PoseChannel>(
    channels: &mut [Option<C>],
    axis: Vec3,
    displacement: Vec3,
    schizo: f32,
) {
    for channel in channels.iter_mut().filter_map(Option::as_mut) {
        blend_axis(channel, axis, displacement, schizo);
    }
}

fn blend_axis<C: PoseChannel>(channel: &mut C, axis: Vec3, displacement: Vec3, schizo: f32) {
    let minimum = channel.minimum();
    let maximum = channel.maximum();
    let range = maximum - minimum;
    if range <= 0.0 {
        return;
    }

    let center = (maximum + minimum) / 2.0;
    let current = channel.value();
    let projected = displacement.dot(axis);
    let mut blended = current + range * projected + center;

    // Bounce back off the bound instead of pinning to it.
    let reach = blended + current;
    if reach > maximum {
        blended = maximum - (reach * PI / range).cos().abs() * range * schizo;
    } else if reach < minimum {
        blended = minimum + (reach * PI / range).cos().abs() * range * schizo;
    }

    channel.blend_additive(blended);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_target() -> Target {
        Target::new(TargetId::new(1), DamageTuning::default(), None)
    }

    fn angle(id: &str) -> Parameter {
        Parameter::new(id, -30.0, 30.0, 0.0)
    }

    #[test]
    fn anchors_track_extreme_heights() {
        let vertices = [
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 5.0, 0.0),
            Vec3::new(0.0, -2.0, 0.0),
            Vec3::new(0.0, 3.0, 0.0),
        ];
        assert_eq!(
            Anchors::from_vertices(&vertices),
            Some(Anchors { top: 1, bottom: 2 })
        );
        assert_eq!(Anchors::from_vertices(&[]), None);
    }

    #[test]
    fn fold_depth_leans_with_horizontal_sign() {
        assert_eq!(
            fold_depth(Vec3::new(2.0, -3.0, 9.0)),
            Vec3::new(2.0, -3.0, 5.0)
        );
        assert_eq!(
            fold_depth(Vec3::new(-2.0, 3.0, 0.0)),
            Vec3::new(-2.0, 3.0, -5.0)
        );
    }

    #[test]
    fn axis_blend_moves_toward_displacement() {
        let mut target = bare_target();
        target.persistent = Vec3::new(0.1, 0.0, 0.0);
        let mut rig = PoseRig::default();
        rig.x.push(Some(angle("ParamAngleX")));
        rig.y.push(Some(angle("ParamAngleY")));

        target.blend_pose(&mut rig);

        let x = rig.x[0].as_ref().map(Parameter::value).unwrap_or_default();
        let y = rig.y[0].as_ref().map(Parameter::value).unwrap_or_default();
        assert!((x - 6.0).abs() < 1.0e-4, "unexpected x {x}");
        assert_eq!(y, 0.0);
    }

    #[test]
    fn axis_blend_kicks_back_from_bounds() {
        let mut target = bare_target();
        target.persistent = Vec3::new(1.0, 0.0, 0.0);
        let mut rig = PoseRig::default();
        rig.x.push(Some(angle("ParamAngleX")));

        target.blend_pose(&mut rig);

        let x = rig.x[0].as_ref().map(Parameter::value).unwrap_or_default();
        assert!((x - 15.0).abs() < 1.0e-3, "unexpected x {x}");
    }

    #[test]
    fn axis_blend_kicks_back_from_lower_bound() {
        let mut target = bare_target();
        target.persistent = Vec3::new(-1.0, 0.0, 0.0);
        let mut rig = PoseRig::default();
        rig.x.push(Some(angle("ParamAngleX")));

        target.blend_pose(&mut rig);

        let x = rig.x[0].as_ref().map(Parameter::value).unwrap_or_default();
        assert!((x + 15.0).abs() < 1.0e-3, "unexpected x {x}");
    }

    #[test]
    fn z_group_follows_depth_displacement() {
        let mut target = bare_target();
        target.persistent = Vec3::new(0.0, 0.0, 0.1);
        let mut rig = PoseRig::default();
        rig.x.push(Some(angle("ParamAngleX")));
        rig.z.push(Some(angle("ParamAngleZ")));
        rig.z
            .push(Some(Parameter::new("ParamBodyAngleZ", -10.0, 10.0, 0.0)));

        target.blend_pose(&mut rig);

        let value = |slot: &Option<Parameter>| slot.as_ref().map(Parameter::value);
        assert_eq!(value(&rig.x[0]), Some(0.0));
        let head = value(&rig.z[0]).unwrap_or_default();
        let body = value(&rig.z[1]).unwrap_or_default();
        assert!((head - 6.0).abs() < 1.0e-4, "unexpected head z {head}");
        assert!((body - 2.0).abs() < 1.0e-4, "unexpected body z {body}");
    }

    #[test]
    fn missing_channels_are_skipped() {
        let mut target = bare_target();
        target.persistent = Vec3::new(0.0, 0.0, 0.2);
        target.damage = 0.2;
        let mut rig: PoseRig<Parameter> = PoseRig::default();
        rig.z.push(None);
        rig.increasing.push(None);

        target.blend_pose(&mut rig);

        assert_eq!(rig.missing(), 2);
    }

    #[test]
    fn degenerate_channel_range_is_left_alone() {
        let mut target = bare_target();
        target.persistent = Vec3::X;
        let mut rig = PoseRig::default();
        rig.x.push(Some(Parameter::new("Flat", 1.0, 1.0, 1.0)));

        target.blend_pose(&mut rig);

        assert_eq!(rig.x[0].as_ref().map(Parameter::value), Some(1.0));
    }

    #[test]
    fn expressions_follow_damage() {
        let mut target = bare_target();
        target.damage = 0.5;
        let mut rig = PoseRig::default();
        rig.increasing
            .push(Some(Parameter::new("Cry", 0.0, 1.0, 0.0)));
        rig.decreasing
            .push(Some(Parameter::new("Smile", 0.0, 2.0, 2.0)));

        target.blend_pose(&mut rig);

        assert_eq!(rig.increasing[0].as_ref().map(Parameter::value), Some(0.5));
        assert_eq!(rig.decreasing[0].as_ref().map(Parameter::value), Some(1.0));
    }

    #[test]
    fn undisturbed_target_leaves_rig_untouched() {
        let target = bare_target();
        let mut rig = PoseRig::default();
        rig.x.push(Some(angle("ParamAngleX")));
        rig.increasing
            .push(Some(Parameter::new("Cry", 0.0, 1.0, 0.0)));

        target.blend_pose(&mut rig);

        assert_eq!(rig.x[0].as_ref().map(Parameter::value), Some(0.0));
        assert_eq!(rig.increasing[0].as_ref().map(Parameter::value), Some(0.0));
    }
}
