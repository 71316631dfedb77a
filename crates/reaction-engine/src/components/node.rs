use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::api::types::NodeId;
use crate::extensions::easing::{lerp, lerp_vec3};
use crate::plan::palette::Color;

/// Which light a `Light` node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Ambient,
    Key,
}

/// What a node draws as. Primitives are unit-sized; `scale` carries the size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Transform-only container (a molecule instance).
    Group,
    /// Unit sphere.
    Atom,
    /// Unit cylinder along +Y, centred on its position.
    Bond,
    Bubble,
    Precipitate,
    Flash,
    Shockwave,
    EnergyRing,
    Solution,
    AmbientField,
    Camera,
    Light(LightKind),
}

impl NodeKind {
    /// Numeric code written into each render instance.
    pub fn code(self) -> f32 {
        match self {
            NodeKind::Group => 0.0,
            NodeKind::Atom => 1.0,
            NodeKind::Bond => 2.0,
            NodeKind::Bubble => 3.0,
            NodeKind::Precipitate => 4.0,
            NodeKind::Flash => 5.0,
            NodeKind::Shockwave => 6.0,
            NodeKind::EnergyRing => 7.0,
            NodeKind::Solution => 8.0,
            NodeKind::AmbientField => 9.0,
            NodeKind::Camera => 10.0,
            NodeKind::Light(LightKind::Ambient) => 11.0,
            NodeKind::Light(LightKind::Key) => 12.0,
        }
    }

    /// Whether the node produces a render instance at all.
    pub fn is_drawable(self) -> bool {
        !matches!(self, NodeKind::Group | NodeKind::Camera | NodeKind::Light(_))
    }

    /// Drawn with additive blending after every opaque/alpha instance.
    pub fn is_additive(self) -> bool {
        matches!(
            self,
            NodeKind::Bubble
                | NodeKind::Flash
                | NodeKind::Shockwave
                | NodeKind::EnergyRing
                | NodeKind::AmbientField
        )
    }
}

/// Animatable node property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    Position,
    PositionX,
    PositionY,
    PositionZ,
    /// Euler XYZ, radians.
    Rotation,
    RotationZ,
    Scale,
    Opacity,
    Color,
    Emissive,
    Intensity,
    Shake,
    Visible,
}

/// A property value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Scalar(f32),
    Vec3(Vec3),
    Flag(bool),
}

impl Value {
    /// Interpolate towards `to`. Flags switch once `t` reaches 1.
    /// Mismatched variants snap to `to`.
    pub fn lerp(self, to: Value, t: f32) -> Value {
        match (self, to) {
            (Value::Scalar(a), Value::Scalar(b)) => Value::Scalar(lerp(a, b, t)),
            (Value::Vec3(a), Value::Vec3(b)) => Value::Vec3(lerp_vec3(a, b, t)),
            (Value::Flag(a), Value::Flag(b)) => Value::Flag(if t >= 1.0 { b } else { a }),
            (_, to) => to,
        }
    }

    /// `self + delta` for relative tweens. Flags take the delta.
    pub fn offset(self, delta: Value) -> Value {
        match (self, delta) {
            (Value::Scalar(a), Value::Scalar(d)) => Value::Scalar(a + d),
            (Value::Vec3(a), Value::Vec3(d)) => Value::Vec3(a + d),
            (_, delta) => delta,
        }
    }

    pub fn as_scalar(self) -> Option<f32> {
        match self {
            Value::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_vec3(self) -> Option<Vec3> {
        match self {
            Value::Vec3(v) => Some(v),
            _ => None,
        }
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Scalar(v)
    }
}

impl From<Vec3> for Value {
    fn from(v: Vec3) -> Self {
        Value::Vec3(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Flag(v)
    }
}

/// Fat scene node: transform, material and kind in one struct.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Element symbol for atoms; empty otherwise.
    pub tag: String,
    pub parent: Option<NodeId>,
    /// Local to the parent (world for root nodes).
    pub position: Vec3,
    /// Euler XYZ, radians, local.
    pub rotation: Vec3,
    pub scale: Vec3,
    pub color: Vec3,
    pub emissive: Vec3,
    pub opacity: f32,
    /// Lights only.
    pub intensity: f32,
    /// Camera only: jitter amplitude.
    pub shake: f32,
    pub visible: bool,
}

impl Node {
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            tag: String::new(),
            parent: None,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            color: Vec3::ONE,
            emissive: Vec3::ZERO,
            opacity: 1.0,
            intensity: 0.0,
            shake: 0.0,
            visible: true,
        }
    }

    // -- Builder pattern --

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_parent(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_uniform_scale(self, scale: f32) -> Self {
        self.with_scale(Vec3::splat(scale))
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color.to_vec3();
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Local rotation as a quaternion.
    pub fn orientation(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// Local transform matrix (scale, then rotate, then translate).
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.orientation(), self.position)
    }

    pub fn get(&self, property: Property) -> Value {
        match property {
            Property::Position => Value::Vec3(self.position),
            Property::PositionX => Value::Scalar(self.position.x),
            Property::PositionY => Value::Scalar(self.position.y),
            Property::PositionZ => Value::Scalar(self.position.z),
            Property::Rotation => Value::Vec3(self.rotation),
            Property::RotationZ => Value::Scalar(self.rotation.z),
            Property::Scale => Value::Vec3(self.scale),
            Property::Opacity => Value::Scalar(self.opacity),
            Property::Color => Value::Vec3(self.color),
            Property::Emissive => Value::Vec3(self.emissive),
            Property::Intensity => Value::Scalar(self.intensity),
            Property::Shake => Value::Scalar(self.shake),
            Property::Visible => Value::Flag(self.visible),
        }
    }

    /// Write a property. Returns false when the value has the wrong shape.
    pub fn set(&mut self, property: Property, value: Value) -> bool {
        match (property, value) {
            (Property::Position, Value::Vec3(v)) => self.position = v,
            (Property::PositionX, Value::Scalar(v)) => self.position.x = v,
            (Property::PositionY, Value::Scalar(v)) => self.position.y = v,
            (Property::PositionZ, Value::Scalar(v)) => self.position.z = v,
            (Property::Rotation, Value::Vec3(v)) => self.rotation = v,
            (Property::RotationZ, Value::Scalar(v)) => self.rotation.z = v,
            (Property::Scale, Value::Vec3(v)) => self.scale = v,
            (Property::Scale, Value::Scalar(v)) => self.scale = Vec3::splat(v),
            (Property::Opacity, Value::Scalar(v)) => self.opacity = v,
            (Property::Color, Value::Vec3(v)) => self.color = v,
            (Property::Emissive, Value::Vec3(v)) => self.emissive = v,
            (Property::Intensity, Value::Scalar(v)) => self.intensity = v,
            (Property::Shake, Value::Scalar(v)) => self.shake = v,
            (Property::Visible, Value::Flag(v)) => self.visible = v,
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_checks_value_shape() {
        let mut node = Node::new(NodeId(1), NodeKind::Atom);
        assert!(node.set(Property::PositionY, Value::Scalar(3.0)));
        assert_eq!(node.position, Vec3::new(0.0, 3.0, 0.0));
        assert!(!node.set(Property::Opacity, Value::Vec3(Vec3::ONE)));
        assert_eq!(node.opacity, 1.0);
    }

    #[test]
    fn flags_switch_at_the_end() {
        let off = Value::Flag(false);
        assert_eq!(off.lerp(Value::Flag(true), 0.99), Value::Flag(false));
        assert_eq!(off.lerp(Value::Flag(true), 1.0), Value::Flag(true));
    }

    #[test]
    fn relative_offset() {
        let r = Value::Vec3(Vec3::new(1.0, 2.0, 0.0)).offset(Value::Vec3(Vec3::new(6.0, 6.0, 0.0)));
        assert_eq!(r, Value::Vec3(Vec3::new(7.0, 8.0, 0.0)));
    }

    #[test]
    fn only_visuals_are_drawable() {
        assert!(NodeKind::Atom.is_drawable());
        assert!(!NodeKind::Group.is_drawable());
        assert!(!NodeKind::Light(LightKind::Key).is_drawable());
        assert!(NodeKind::Flash.is_additive());
        assert!(!NodeKind::Bond.is_additive());
    }
}
