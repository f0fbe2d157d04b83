//! Dense scalar field holding one isovalue per global node.

use glam::UVec3;

use crate::core::{Error, Result};

/// Dense 3D array of isovalues indexed by global node coordinates.
///
/// Storage is x-fastest: `x + dims.x * (y + dims.y * z)`.
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseField {
    dims: UVec3,
    values: Vec<f32>,
}

impl NoiseField {
    /// Create a field of the given shape filled with `value`
    pub fn filled(dims: UVec3, value: f32) -> Result<Self> {
        if dims.x == 0 || dims.y == 0 || dims.z == 0 {
            return Err(Error::invalid(format!("field shape must be positive, got {:?}", dims)));
        }
        let len = dims.x as usize * dims.y as usize * dims.z as usize;
        Ok(Self { dims, values: vec![value; len] })
    }

    /// Shape of the field (nodes per axis)
    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether `index` addresses a node of this field
    pub fn contains(&self, index: UVec3) -> bool {
        index.x < self.dims.x && index.y < self.dims.y && index.z < self.dims.z
    }

    #[inline]
    fn linear(&self, index: UVec3) -> usize {
        debug_assert!(self.contains(index), "field index {:?} outside {:?}", index, self.dims);
        index.x as usize
            + self.dims.x as usize * (index.y as usize + self.dims.y as usize * index.z as usize)
    }

    /// Bounds-checked linear index
    pub fn checked_linear(&self, index: UVec3) -> Result<usize> {
        if self.contains(index) {
            Ok(self.linear(index))
        } else {
            Err(Error::IndexOutOfRange {
                index: index.to_array(),
                dims: self.dims.to_array(),
            })
        }
    }

    /// Isovalue at `index`. Panics when out of range; callers index through
    /// geometry that was validated at configuration time.
    #[inline]
    pub fn get(&self, index: UVec3) -> f32 {
        self.values[self.linear(index)]
    }

    #[inline]
    pub fn set(&mut self, index: UVec3, value: f32) {
        let i = self.linear(index);
        self.values[i] = value;
    }

    /// Add `delta` to a node and clamp the result to [0, 1]; returns the new value
    pub fn add_clamped(&mut self, index: UVec3, delta: f32) -> Result<f32> {
        let i = self.checked_linear(index)?;
        let value = (self.values[i] + delta).clamp(0.0, 1.0);
        self.values[i] = value;
        Ok(value)
    }

    /// Raw values in storage order
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    /// Smallest and largest value in the field
    pub fn min_max(&self) -> (f32, f32) {
        self.values.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_rejects_empty_shape() {
        assert!(NoiseField::filled(UVec3::new(4, 0, 4), 0.0).is_err());
        let field = NoiseField::filled(UVec3::new(2, 3, 4), 0.5).unwrap();
        assert_eq!(field.len(), 24);
        assert!(field.values().iter().all(|&v| v == 0.5));
    }

    #[test]
    fn test_get_set_layout() {
        let mut field = NoiseField::filled(UVec3::new(3, 4, 5), 0.0).unwrap();
        field.set(UVec3::new(2, 1, 3), 0.75);
        assert_eq!(field.get(UVec3::new(2, 1, 3)), 0.75);
        assert_eq!(field.values()[2 + 3 * (1 + 4 * 3)], 0.75);
        assert_eq!(field.get(UVec3::new(1, 1, 3)), 0.0);
    }

    #[test]
    fn test_add_clamped() {
        let mut field = NoiseField::filled(UVec3::splat(2), 0.9).unwrap();
        let idx = UVec3::new(1, 0, 1);
        assert_eq!(field.add_clamped(idx, 0.5).unwrap(), 1.0);
        assert_eq!(field.add_clamped(idx, -0.25).unwrap(), 0.75);
        assert_eq!(field.add_clamped(idx, -2.0).unwrap(), 0.0);
    }

    #[test]
    fn test_checked_linear_out_of_range() {
        let mut field = NoiseField::filled(UVec3::splat(2), 0.0).unwrap();
        let err = field.add_clamped(UVec3::new(2, 0, 0), 0.1).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: [2, 0, 0], dims: [2, 2, 2] }));
    }

    #[test]
    fn test_min_max() {
        let mut field = NoiseField::filled(UVec3::splat(2), 0.5).unwrap();
        field.set(UVec3::ZERO, 0.1);
        field.set(UVec3::ONE, 0.9);
        assert_eq!(field.min_max(), (0.1, 0.9));
    }
}
