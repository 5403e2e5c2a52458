//! # Mesh Math
//!
//! Pure functions over vertex positions: bounding boxes, centroids, and
//! in-place translation. Nothing here touches the GPU, so the recentering
//! step of the import pipeline can be unit tested headless.

use cgmath::{Vector3, Zero};

/// Axis-aligned bounding box over a set of vertex positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    /// Computes the bounding box of the given positions.
    ///
    /// Returns `None` when the iterator yields no positions, since an empty
    /// set has no meaningful bounds.
    pub fn from_positions<I>(positions: I) -> Option<Self>
    where
        I: IntoIterator<Item = [f32; 3]>,
    {
        let mut iter = positions.into_iter();
        let first = Vector3::from(iter.next()?);
        let mut bounds = Aabb {
            min: first,
            max: first,
        };

        for position in iter {
            let p = Vector3::from(position);
            bounds.min.x = bounds.min.x.min(p.x);
            bounds.min.y = bounds.min.y.min(p.y);
            bounds.min.z = bounds.min.z.min(p.z);
            bounds.max.x = bounds.max.x.max(p.x);
            bounds.max.y = bounds.max.y.max(p.y);
            bounds.max.z = bounds.max.z.max(p.z);
        }

        Some(bounds)
    }

    /// Geometric center of the box.
    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) * 0.5
    }

    /// Edge lengths along each axis.
    pub fn extents(&self) -> Vector3<f32> {
        self.max - self.min
    }
}

/// Arithmetic mean of the vertex positions.
///
/// Returns the zero vector for an empty set, so recentering an empty mesh is
/// a no-op rather than a division by zero.
pub fn centroid<I>(positions: I) -> Vector3<f32>
where
    I: IntoIterator<Item = [f32; 3]>,
{
    let mut sum = Vector3::zero();
    let mut count = 0u32;

    for position in positions {
        sum += Vector3::from(position);
        count += 1;
    }

    if count == 0 {
        Vector3::zero()
    } else {
        sum / count as f32
    }
}

/// Translates every position by `offset`, in place.
pub fn translate<'a, I>(positions: I, offset: Vector3<f32>)
where
    I: IntoIterator<Item = &'a mut [f32; 3]>,
{
    for position in positions {
        position[0] += offset.x;
        position[1] += offset.y;
        position[2] += offset.z;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f32 = 1e-6;

    fn corner_triangle() -> Vec<[f32; 3]> {
        vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]]
    }

    #[test]
    fn test_centroid_of_corner_triangle() {
        let c = centroid(corner_triangle());
        assert!((c.x - 2.0 / 3.0).abs() < TOLERANCE);
        assert!((c.y - 2.0 / 3.0).abs() < TOLERANCE);
        assert!(c.z.abs() < TOLERANCE);
    }

    #[test]
    fn test_centroid_of_empty_set_is_zero() {
        assert_eq!(centroid(Vec::new()), Vector3::zero());
    }

    #[test]
    fn test_translate_by_negated_centroid_centers_positions() {
        let mut positions = corner_triangle();
        let offset = -centroid(positions.iter().copied());
        translate(positions.iter_mut(), offset);

        let recentered = centroid(positions.iter().copied());
        assert!(recentered.x.abs() < TOLERANCE);
        assert!(recentered.y.abs() < TOLERANCE);
        assert!(recentered.z.abs() < TOLERANCE);
    }

    #[test]
    fn test_recentering_twice_moves_by_nothing() {
        let mut positions = corner_triangle();
        let offset = -centroid(positions.iter().copied());
        translate(positions.iter_mut(), offset);

        // Already centered; the second offset must be approximately zero.
        let second_offset = -centroid(positions.iter().copied());
        assert!(second_offset.x.abs() < TOLERANCE);
        assert!(second_offset.y.abs() < TOLERANCE);
        assert!(second_offset.z.abs() < TOLERANCE);
    }

    #[test]
    fn test_aabb_center_and_extents() {
        let bounds = Aabb::from_positions(corner_triangle()).unwrap();
        assert_eq!(bounds.min, Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(bounds.max, Vector3::new(2.0, 2.0, 0.0));
        assert_eq!(bounds.center(), Vector3::new(1.0, 1.0, 0.0));
        assert_eq!(bounds.extents(), Vector3::new(2.0, 2.0, 0.0));
    }

    #[test]
    fn test_aabb_of_empty_set_is_none() {
        assert!(Aabb::from_positions(Vec::new()).is_none());
    }
}
