use super::Point;
use glam::{Mat4, Vec3};
use std::collections::HashSet;

/// Three ordered points defining one mesh face
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [Point; 3],
}

impl Triangle {
    pub fn new(v1: Point, v2: Point, v3: Point) -> Self {
        Self {
            vertices: [v1, v2, v3],
        }
    }

    /// Copy of this triangle after applying a transformation matrix
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self {
            vertices: self.vertices.map(|v| v.transformed(matrix)),
        }
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            vertices: self.vertices.map(|v| v.translated(offset)),
        }
    }

    /// Twice the area is zero: collinear or coincident vertices
    pub fn is_degenerate(&self) -> bool {
        let [a, b, c] = self.vertices.map(|v| v.position);
        (b - a).cross(c - a).length_squared() <= f32::EPSILON * f32::EPSILON
    }

    /// Voxel corners covered by this triangle
    ///
    /// Samples the edge `v1 → v2`, and for every sample `p` samples `p → v3`,
    /// snapping each result onto its integer voxel corner. This oversamples
    /// the interior, so the set deduplicates by position and keeps the UV of
    /// the first sample that reached each voxel. Needle triangles thinner than
    /// the step may leave gaps; a degenerate triangle collapses to a single
    /// point or a line.
    pub fn voxel_points(&self, precision: f32) -> HashSet<Point> {
        let [v1, v2, v3] = self.vertices;
        let mut points = HashSet::new();
        for p in v1.line_to(v2, precision) {
            for q in p.line_to(v3, precision) {
                points.insert(q.snapped());
            }
        }
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{IVec3, Quat, Vec2};

    fn unit_triangle() -> Triangle {
        Triangle::new(
            Point::at(0.0, 0.0, 0.0),
            Point::at(1.0, 0.0, 0.0),
            Point::at(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn test_unit_triangle_covers_origin() {
        let voxels: HashSet<IVec3> = unit_triangle()
            .voxel_points(1.5)
            .iter()
            .map(Point::voxel)
            .collect();
        assert!(voxels.contains(&IVec3::ZERO));
        // Vertices on the unit boundary land in the neighbouring voxels
        assert!(voxels.contains(&IVec3::new(1, 0, 0)));
        assert!(voxels.contains(&IVec3::new(0, 1, 0)));
    }

    #[test]
    fn test_degenerate_triangle_is_single_point() {
        let p = Point::at(3.5, -2.5, 0.25);
        let triangle = Triangle::new(p, p, p);
        assert!(triangle.is_degenerate());
        let points = triangle.voxel_points(1.5);
        assert_eq!(points.len(), 1);
        assert_eq!(points.iter().next().map(Point::voxel), Some(IVec3::new(3, -3, 0)));
    }

    #[test]
    fn test_large_triangle_fills_interior() {
        let triangle = Triangle::new(
            Point::at(0.0, 0.0, 0.0),
            Point::at(8.0, 0.0, 0.0),
            Point::at(0.0, 8.0, 0.0),
        );
        let voxels: HashSet<IVec3> = triangle.voxel_points(1.5).iter().map(Point::voxel).collect();
        for (x, y) in [(1, 1), (3, 2), (2, 4), (5, 1)] {
            assert!(voxels.contains(&IVec3::new(x, y, 0)), "missing ({x}, {y})");
        }
        // Nothing strictly outside the hypotenuse corner region
        assert!(!voxels.contains(&IVec3::new(7, 7, 0)));
        assert!(voxels.iter().all(|v| v.z == 0));
    }

    #[test]
    fn test_uv_travels_with_samples() {
        let triangle = Triangle::new(
            Point::new(Vec3::new(0.0, 0.0, 0.0), Vec2::new(0.0, 0.0)),
            Point::new(Vec3::new(4.0, 0.0, 0.0), Vec2::new(1.0, 0.0)),
            Point::new(Vec3::new(0.0, 4.0, 0.0), Vec2::new(0.0, 1.0)),
        );
        for point in triangle.voxel_points(1.5) {
            assert!((0.0..=1.0).contains(&point.uv.x));
            assert!((0.0..=1.0).contains(&point.uv.y));
        }
    }

    #[test]
    fn test_transformed_rotates_vertices() {
        let rotated = unit_triangle().transformed(&Mat4::from_quat(Quat::from_rotation_z(
            std::f32::consts::FRAC_PI_2,
        )));
        let v = rotated.vertices[1].position;
        assert!((v - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-6);
    }
}
