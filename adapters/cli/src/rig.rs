//! Stand-in for the animation host's parameter model.

use barrage_system_target::{Parameter, PoseRig};

const HEAD_RANGE: f32 = 30.0;
const BODY_RANGE: f32 = 10.0;

/// Builds the head and body angle rig plus one expression in each direction.
#[must_use]
pub(crate) fn standard_rig() -> PoseRig<Parameter> {
    let angle = |id: &str, range: f32| Some(Parameter::new(id, -range, range, 0.0));
    PoseRig {
        x: vec![
            angle("ParamAngleX", HEAD_RANGE),
            angle("ParamBodyAngleX", BODY_RANGE),
        ],
        y: vec![
            angle("ParamAngleY", HEAD_RANGE),
            angle("ParamBodyAngleY", BODY_RANGE),
        ],
        z: vec![
            angle("ParamAngleZ", HEAD_RANGE),
            angle("ParamBodyAngleZ", BODY_RANGE),
        ],
        increasing: vec![Some(Parameter::new("ParamBrowLForm", 0.0, 1.0, 0.0))],
        decreasing: vec![Some(Parameter::new("ParamMouthForm", 0.0, 1.0, 1.0))],
    }
}

/// Restores every channel to its default, as the host does at frame start.
pub(crate) fn reset(rig: &mut PoseRig<Parameter>) {
    for channel in rig.channels_mut() {
        channel.reset();
    }
}

/// Values of the head angle channels, or zero for a missing channel.
#[must_use]
pub(crate) fn head_angles(rig: &PoseRig<Parameter>) -> [f32; 3] {
    [first_value(&rig.x), first_value(&rig.y), first_value(&rig.z)]
}

fn first_value(group: &[Option<Parameter>]) -> f32 {
    group
        .first()
        .and_then(Option::as_ref)
        .map_or(0.0, Parameter::value)
}
