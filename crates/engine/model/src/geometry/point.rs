use glam::{IVec3, Mat4, Vec2, Vec3};
use std::hash::{Hash, Hasher};

/// A position with texture coordinates
///
/// Identity is the position only: two points at the same location compare
/// equal and hash identically regardless of their UV payload. Sets of points
/// therefore deduplicate by location and keep the first UV inserted.
#[derive(Debug, Clone, Copy, Default)]
pub struct Point {
    pub position: Vec3,
    pub uv: Vec2,
}

impl Point {
    pub fn new(position: Vec3, uv: Vec2) -> Self {
        Self { position, uv }
    }

    /// Point without texture coordinates
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            uv: Vec2::ZERO,
        }
    }

    /// Copy of this point after applying a transformation matrix
    #[inline]
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self {
            position: matrix.transform_point3(self.position),
            uv: self.uv,
        }
    }

    #[inline]
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            position: self.position + offset,
            uv: self.uv,
        }
    }

    /// Integer voxel coordinate containing this point (floor on every axis)
    #[inline]
    pub fn voxel(&self) -> IVec3 {
        self.position.floor().as_ivec3()
    }

    /// This point moved onto its voxel's integer corner, UV preserved
    #[inline]
    pub fn snapped(&self) -> Self {
        Self {
            position: self.position.floor(),
            uv: self.uv,
        }
    }

    /// Sample points along the segment from `self` to `end`
    ///
    /// Samples are spaced `1 / precision` units apart starting at `self`, with
    /// position and UV interpolated linearly; `end` is always the last sample.
    /// A zero-length (or non-finite) segment yields just `end`.
    pub fn line_to(self, end: Point, precision: f32) -> impl Iterator<Item = Point> {
        let delta = end.position - self.position;
        let delta_uv = end.uv - self.uv;
        let distance = delta.length();

        let steps_per_unit = distance * precision;
        let count = if distance > 0.0 && steps_per_unit.is_finite() && steps_per_unit > 0.0 {
            steps_per_unit.ceil() as usize
        } else {
            0
        };

        (0..count)
            .map(move |k| {
                let t = k as f32 / steps_per_unit;
                Point {
                    position: self.position + delta * t,
                    uv: self.uv + delta_uv * t,
                }
            })
            .chain(std::iter::once(end))
    }

    /// Position bits with `-0.0` folded onto `0.0`
    #[inline]
    fn key(&self) -> [u32; 3] {
        let canonical = |v: f32| (v + 0.0).to_bits();
        [
            canonical(self.position.x),
            canonical(self.position.y),
            canonical(self.position.z),
        ]
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Point {}

impl Hash for Point {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_ignores_uv() {
        let a = Point::new(Vec3::new(1.0, 2.0, 3.0), Vec2::new(0.1, 0.2));
        let b = Point::new(Vec3::new(1.0, 2.0, 3.0), Vec2::new(0.9, 0.8));
        assert_eq!(a, b);

        let mut set = HashSet::new();
        assert!(set.insert(a));
        assert!(!set.insert(b));
        // First insertion wins
        assert_eq!(set.iter().next().map(|p| p.uv), Some(Vec2::new(0.1, 0.2)));
    }

    #[test]
    fn test_negative_zero_is_same_point() {
        assert_eq!(Point::at(0.0, -0.0, 0.0), Point::at(-0.0, 0.0, 0.0));
    }

    #[test]
    fn test_voxel_floors_negative_coordinates() {
        assert_eq!(Point::at(-0.5, 0.5, -1.0).voxel(), IVec3::new(-1, 0, -1));
        assert_eq!(Point::at(2.999, -2.001, 0.0).voxel(), IVec3::new(2, -3, 0));
    }

    #[test]
    fn test_line_includes_both_endpoints() {
        let start = Point::new(Vec3::ZERO, Vec2::ZERO);
        let end = Point::new(Vec3::new(2.0, 0.0, 0.0), Vec2::new(1.0, 0.0));
        let samples: Vec<Point> = start.line_to(end, 1.5).collect();

        // distance 2 at 1.5 samples per unit: k in 0..3, plus the endpoint
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0].position, Vec3::ZERO);
        assert_eq!(samples[3].position, end.position);
        assert!((samples[1].position.x - 2.0 / 3.0).abs() < 1e-6);
        assert!((samples[1].uv.x - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_line_exact_multiple_of_step() {
        // distance 2 at precision 1.0: samples at 0 and 1, then the endpoint
        let start = Point::at(0.0, 0.0, 0.0);
        let end = Point::at(0.0, 2.0, 0.0);
        let ys: Vec<f32> = start.line_to(end, 1.0).map(|p| p.position.y).collect();
        assert_eq!(ys, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_zero_length_line_is_single_point() {
        let p = Point::at(1.0, 1.0, 1.0);
        let samples: Vec<Point> = p.line_to(p, 1.5).collect();
        assert_eq!(samples, vec![p]);
    }

    #[test]
    fn test_non_finite_line_does_not_loop() {
        let start = Point::at(0.0, 0.0, 0.0);
        let end = Point::at(f32::INFINITY, 0.0, 0.0);
        assert_eq!(start.line_to(end, 1.5).count(), 1);
    }

    #[test]
    fn test_transformed_keeps_uv() {
        let p = Point::new(Vec3::X, Vec2::new(0.25, 0.75));
        let moved = p.transformed(&Mat4::from_scale(Vec3::splat(2.0)));
        assert_eq!(moved.position, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(moved.uv, Vec2::new(0.25, 0.75));
    }
}
