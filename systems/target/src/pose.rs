//! Externally owned pose and expression channels.

/// A host-owned animation parameter the damage model can nudge.
pub trait PoseChannel {
    /// Current value of the channel.
    fn value(&self) -> f32;

    /// Lowest value the channel accepts.
    fn minimum(&self) -> f32;

    /// Highest value the channel accepts.
    fn maximum(&self) -> f32;

    /// Adds `amount` on top of the channel's current value.
    fn blend_additive(&mut self, amount: f32);
}

/// Plain parameter channel with a default it can be reset to each frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    id: String,
    value: f32,
    minimum: f32,
    maximum: f32,
    default: f32,
}

impl Parameter {
    /// Creates a parameter whose value starts at `default`.
    #[must_use]
    pub fn new(id: impl Into<String>, minimum: f32, maximum: f32, default: f32) -> Self {
        Self {
            id: id.into(),
            value: default,
            minimum,
            maximum,
            default,
        }
    }

    /// Identifier of the parameter on the host model.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current value of the parameter.
    #[must_use]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Restores the default value, as an animation host does before blending.
    pub fn reset(&mut self) {
        self.value = self.default;
    }
}

impl PoseChannel for Parameter {
    fn value(&self) -> f32 {
        self.value
    }

    fn minimum(&self) -> f32 {
        self.minimum
    }

    fn maximum(&self) -> f32 {
        self.maximum
    }

    fn blend_additive(&mut self, amount: f32) {
        self.value += amount;
    }
}

/// Channel groups driven by the damage model.
///
/// A `None` slot stands for a channel the host failed to provide.
#[derive(Clone, Debug)]
pub struct PoseRig<C> {
    /// Channels leaning along the X axis (head and body yaw).
    pub x: Vec<Option<C>>,
    /// Channels leaning along the Y axis (head and body pitch).
    pub y: Vec<Option<C>>,
    /// Channels leaning along the Z axis (head and body roll).
    pub z: Vec<Option<C>>,
    /// Expressions pushed toward their maximum as damage grows.
    pub increasing: Vec<Option<C>>,
    /// Expressions pulled away from their maximum as damage grows.
    pub decreasing: Vec<Option<C>>,
}

impl<C> Default for PoseRig<C> {
    fn default() -> Self {
        Self {
            x: Vec::new(),
            y: Vec::new(),
            z: Vec::new(),
            increasing: Vec::new(),
            decreasing: Vec::new(),
        }
    }
}

impl<C> PoseRig<C> {
    /// Iterator over every channel that is present, group by group.
    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut C> {
        self.x
            .iter_mut()
            .chain(self.y.iter_mut())
            .chain(self.z.iter_mut())
            .chain(self.increasing.iter_mut())
            .chain(self.decreasing.iter_mut())
            .filter_map(Option::as_mut)
    }

    /// Number of slots whose channel is missing.
    #[must_use]
    pub fn missing(&self) -> usize {
        [
            &self.x,
            &self.y,
            &self.z,
            &self.increasing,
            &self.decreasing,
        ]
        .iter()
        .map(|group| group.iter().filter(|slot| slot.is_none()).count())
        .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_restores_default() {
        let mut parameter = Parameter::new("ParamAngleX", -30.0, 30.0, 2.0);
        parameter.blend_additive(5.0);
        assert_eq!(parameter.value(), 7.0);
        parameter.reset();
        assert_eq!(parameter.value(), 2.0);
    }

    #[test]
    fn channels_mut_skips_missing_slots() {
        let mut rig = PoseRig::default();
        rig.x.push(Some(Parameter::new("A", 0.0, 1.0, 0.0)));
        rig.y.push(None);
        rig.decreasing
            .push(Some(Parameter::new("B", 0.0, 1.0, 1.0)));

        let ids: Vec<String> = rig
            .channels_mut()
            .map(|channel| channel.id().to_owned())
            .collect();

        assert_eq!(ids, vec!["A".to_owned(), "B".to_owned()]);
        assert_eq!(rig.missing(), 1);
    }
}
