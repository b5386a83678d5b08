/// 2D vector utilities for the arena floor.
/// Components are world X and Z; the vertical axis is never part of the simulation.

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub z: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, z: 0.0 };

    pub fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.z.is_finite()
    }
}

/// Shorthand constructor
pub fn vec2(x: f64, z: f64) -> Vec2 {
    Vec2::new(x, z)
}

/// Dot product
pub fn dot(a: Vec2, b: Vec2) -> f64 {
    a.x * b.x + a.z * b.z
}

/// Z component of the 3D cross product of (a, 0) and (b, 0).
pub fn cross(a: Vec2, b: Vec2) -> f64 {
    a.x * b.z - a.z * b.x
}

/// Vector length
pub fn length(v: Vec2) -> f64 {
    (v.x * v.x + v.z * v.z).sqrt()
}

/// Euclidean distance between two points
pub fn distance(a: Vec2, b: Vec2) -> f64 {
    length(sub(a, b))
}

/// Normalize to unit length. Returns None for vectors too short to carry a direction.
pub fn try_normalize(v: Vec2, min_len: f64) -> Option<Vec2> {
    let len = length(v);
    if !len.is_finite() || len <= min_len {
        return None;
    }
    Some(Vec2::new(v.x / len, v.z / len))
}

/// Scale vector by scalar
pub fn scale(v: Vec2, s: f64) -> Vec2 {
    Vec2::new(v.x * s, v.z * s)
}

/// Add two vectors
pub fn add(a: Vec2, b: Vec2) -> Vec2 {
    Vec2::new(a.x + b.x, a.z + b.z)
}

/// Subtract vectors (a - b)
pub fn sub(a: Vec2, b: Vec2) -> Vec2 {
    Vec2::new(a.x - b.x, a.z - b.z)
}

/// Linear interpolation. t=0 returns a, t=1 returns b.
pub fn lerp(a: Vec2, b: Vec2, t: f64) -> Vec2 {
    Vec2::new(a.x + (b.x - a.x) * t, a.z + (b.z - a.z) * t)
}
