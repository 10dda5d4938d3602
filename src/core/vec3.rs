//! 3D Vector
//!
//! Float vector used for ball and paddle kinematics. The arena floor is the
//! XZ plane and Y points up, so most collision math works on the horizontal
//! projection via the `*_xz` helpers.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};
use serde::{Serialize, Deserialize};

/// Lengths below this are treated as zero when normalizing.
pub const NORMAL_EPSILON: f32 = 1e-6;

/// 3D vector with `f32` components.
#[derive(Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component (Left/Right axis)
    pub x: f32,
    /// Y component (height)
    pub y: f32,
    /// Z component (Top/Bottom axis)
    pub z: f32,
}

impl Vec3 {
    /// Zero vector
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };

    /// Unit vector pointing toward the Right paddle (+X)
    pub const RIGHT: Self = Self { x: 1.0, y: 0.0, z: 0.0 };

    /// Unit vector pointing toward the Bottom paddle (+Z)
    pub const BACK: Self = Self { x: 0.0, y: 0.0, z: 1.0 };

    /// Create a new vector.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Create a vector on the floor plane.
    #[inline]
    pub const fn horizontal(x: f32, z: f32) -> Self {
        Self { x, y: 0.0, z }
    }

    /// Same vector with the height dropped.
    #[inline]
    pub fn xz(self) -> Self {
        Self::horizontal(self.x, self.z)
    }

    /// Scale by a scalar.
    #[inline]
    pub fn scale(self, s: f32) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }

    /// Dot product.
    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Squared length.
    #[inline]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Length (magnitude).
    #[inline]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Length of the horizontal projection.
    #[inline]
    pub fn length_xz(self) -> f32 {
        (self.x * self.x + self.z * self.z).sqrt()
    }

    /// Horizontal distance to another point.
    #[inline]
    pub fn distance_xz(self, other: Self) -> f32 {
        (self - other).length_xz()
    }

    /// Normalize to unit length, or `fallback` when the length is
    /// effectively zero.
    #[inline]
    pub fn normalize_or(self, fallback: Self) -> Self {
        let len = self.length();
        if len < NORMAL_EPSILON {
            return fallback;
        }
        self.scale(1.0 / len)
    }

    /// Reflect about a unit normal: `v - 2(v·n)n`.
    #[inline]
    pub fn reflect(self, normal: Self) -> Self {
        self - normal.scale(2.0 * self.dot(normal))
    }

    /// Clamp the horizontal speed to `max`, preserving direction and height.
    pub fn clamp_length_xz(self, max: f32) -> Self {
        let len = self.length_xz();
        if len <= max || len < NORMAL_EPSILON {
            return self;
        }
        let k = max / len;
        Self::new(self.x * k, self.y, self.z * k)
    }

    /// Component array, used on the wire.
    #[inline]
    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Build from a component array.
    #[inline]
    pub fn from_array(a: [f32; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }
}

impl Add for Vec3 {
    type Output = Self;
    #[inline]
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl AddAssign for Vec3 {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Vec3 {
    type Output = Self;
    #[inline]
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;
    #[inline]
    fn mul(self, s: f32) -> Self {
        self.scale(s)
    }
}

impl fmt::Debug for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vec3({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from(a: [f32; 3]) -> Self {
        Self::from_array(a)
    }
}

// =============================================================================
// TESTS
// =============================================================================
