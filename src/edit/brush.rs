//! Spherical density brush

use glam::Vec3;

use crate::math::Aabb;

/// A spherical edit: every field node within `radius` nodes of the node under
/// `center` receives `magnitude`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    /// World-space hit point
    pub center: Vec3,
    /// Radius in field-index units
    pub radius: u32,
    /// Added to every affected isovalue; positive opens, negative fills
    pub magnitude: f32,
}

impl Brush {
    pub fn new(center: Vec3, radius: u32, magnitude: f32) -> Self {
        Self { center, radius, magnitude }
    }

    /// Brush that adds or removes one edit step
    pub fn stroke(center: Vec3, radius: u32, step: f32, add: bool) -> Self {
        let magnitude = if add { step } else { -step };
        Self::new(center, radius, magnitude)
    }

    /// Inverse brush; applying both restores unclamped values
    pub fn inverted(&self) -> Self {
        Self { magnitude: -self.magnitude, ..*self }
    }

    /// Conservative world-space bounds for nodes `pitch` apart
    pub fn bounds(&self, pitch: f32) -> Aabb {
        let reach = (self.radius as f32 + 1.0) * pitch;
        Aabb::from_center_half_extent(self.center, Vec3::splat(reach))
    }
}
