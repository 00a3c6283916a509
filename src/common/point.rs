use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// A 3D landmark coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointF3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl PointF3D {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Midpoint of two points.
    pub fn average(a: PointF3D, b: PointF3D) -> Self {
        Self::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5, (a.z + b.z) * 0.5)
    }

    /// Component-wise product, used to apply per-axis weights.
    pub fn scale_axes(self, weights: PointF3D) -> Self {
        Self::new(self.x * weights.x, self.y * weights.y, self.z * weights.z)
    }

    /// Euclidean length on the x/y plane only.
    pub fn l2_norm_2d(self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn max_abs(self) -> f32 {
        self.x.abs().max(self.y.abs()).max(self.z.abs())
    }

    pub fn sum_abs(self) -> f32 {
        self.x.abs() + self.y.abs() + self.z.abs()
    }

    /// Horizontal mirror image.
    pub fn mirrored(self) -> Self {
        Self::new(-self.x, self.y, self.z)
    }
}

impl Add for PointF3D {
    type Output = PointF3D;

    fn add(self, rhs: PointF3D) -> PointF3D {
        PointF3D::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for PointF3D {
    type Output = PointF3D;

    fn sub(self, rhs: PointF3D) -> PointF3D {
        PointF3D::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for PointF3D {
    type Output = PointF3D;

    fn mul(self, rhs: f32) -> PointF3D {
        PointF3D::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl From<[f32; 3]> for PointF3D {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self::new(x, y, z)
    }
}
