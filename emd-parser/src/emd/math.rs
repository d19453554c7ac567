//! Value types that fields read and write
//!
//! Vectors and matrices come from `glam`. The remaining types are small plain
//! structs that carry exactly what their text form holds, so writing them out
//! reproduces what was read.

pub use glam::{IVec2, IVec3, IVec4, Mat2, Mat3, Mat4, Quat, UVec2, UVec3, UVec4, Vec2, Vec3, Vec4};

/// RGBA color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Color { r, g, b, a }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Builds a color from four components, treating them as `0..=255`
    /// values if any of them exceeds 1.
    pub fn from_components(mut c: [f32; 4]) -> Self {
        if c.iter().any(|v| *v > 1.0) {
            for v in c.iter_mut() {
                *v /= 255.0;
            }
        }
        Color::new(c[0], c[1], c[2], c[3])
    }

    /// Parses `#RRGGBB` or `#RRGGBBAA`. Returns `None` for anything else.
    pub fn from_hex_string(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if !(hex.len() == 6 || hex.len() == 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        let alpha = if hex.len() == 8 { byte(6)? } else { 255 };
        Some(Color::new(
            f32::from(byte(0)?) / 255.0,
            f32::from(byte(2)?) / 255.0,
            f32::from(byte(4)?) / 255.0,
            f32::from(alpha) / 255.0,
        ))
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// An angle stored in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Anglef {
    degrees: f32,
}

impl Anglef {
    pub fn from_degrees(degrees: f32) -> Self {
        Anglef { degrees }
    }

    pub fn from_radians(radians: f32) -> Self {
        Anglef {
            degrees: radians.to_degrees(),
        }
    }

    pub fn degrees(self) -> f32 {
        self.degrees
    }

    pub fn radians(self) -> f32 {
        self.degrees.to_radians()
    }
}

/// A rotation kept as axis and angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotationf {
    pub axis: Vec3,
    pub angle: Anglef,
}

impl Rotationf {
    pub fn from_axis_angle(axis: Vec3, angle: Anglef) -> Self {
        Rotationf { axis, angle }
    }

    pub fn identity() -> Self {
        Rotationf::from_axis_angle(Vec3::Z, Anglef::default())
    }

    pub fn is_identity(&self) -> bool {
        self.angle.degrees() == 0.0
    }

    pub fn to_quat(&self) -> Quat {
        Quat::from_axis_angle(self.axis.normalize_or_zero(), self.angle.radians())
    }
}

impl Default for Rotationf {
    fn default() -> Self {
        Rotationf::identity()
    }
}

/// Plane given by a unit normal and signed distance from the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Plane { normal, distance }
    }

    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.distance
    }
}

impl Default for Plane {
    fn default() -> Self {
        Plane::new(Vec3::Z, 0.0)
    }
}

/// Arc of a circle: where it starts and how far it sweeps.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CircleArc {
    pub start_angle: Anglef,
    pub arc_angle: Anglef,
}

impl CircleArc {
    pub fn new(start_angle: Anglef, arc_angle: Anglef) -> Self {
        CircleArc {
            start_angle,
            arc_angle,
        }
    }
}
