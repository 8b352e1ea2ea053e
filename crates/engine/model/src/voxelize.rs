//! Triangle mesh → voxel footprint

use crate::geometry::Point;
use crate::mesh::{MaterialTable, Mesh};
use crate::palette::Palette;
use crate::symbol::Symbol;
use glam::{IVec3, Mat4};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Samples per unit of distance along each triangle edge
pub const DEFAULT_PRECISION: f32 = 1.5;

/// Voxel coordinates a mesh occupies, each with its resolved symbol
///
/// `None` marks a coordinate that resolved to empty (a transparent texel);
/// it is still part of the footprint and is written as empty on placement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Footprint {
    cells: HashMap<IVec3, Option<Symbol>>,
}

impl Footprint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, coordinate: IVec3) -> bool {
        self.cells.contains_key(&coordinate)
    }

    /// Symbol at `coordinate`; outer `None` when the coordinate is not covered
    pub fn get(&self, coordinate: IVec3) -> Option<Option<&Symbol>> {
        self.cells.get(&coordinate).map(Option::as_ref)
    }

    pub fn insert(&mut self, coordinate: IVec3, symbol: Option<Symbol>) {
        self.cells.insert(coordinate, symbol);
    }

    pub fn iter(&self) -> impl Iterator<Item = (IVec3, Option<&Symbol>)> {
        self.cells.iter().map(|(c, s)| (*c, s.as_ref()))
    }

    /// Cells sorted by coordinate (x, then y, then z)
    pub fn sorted(&self) -> Vec<(IVec3, Option<&Symbol>)> {
        let mut cells: Vec<_> = self.iter().collect();
        cells.sort_by_key(|(c, _)| c.to_array());
        cells
    }

    /// Number of coordinates resolved to empty
    pub fn empty_count(&self) -> usize {
        self.cells.values().filter(|s| s.is_none()).count()
    }
}

/// Voxel footprint of `mesh` under `matrix`, with symbols resolved
///
/// Meshes whose format carries color look each voxel's material color up in
/// the palette (the texture sampled at the voxel's UV when the material has
/// one); the rest take the palette's default symbol. Groups are visited in
/// declaration order and a later triangle overwrites the symbol of a voxel an
/// earlier one reached.
pub fn voxelize(
    mesh: &Mesh,
    materials: &MaterialTable,
    matrix: &Mat4,
    precision: f32,
    palette: &Palette,
) -> Footprint {
    let mut footprint = Footprint::new();
    let colored = mesh.format.carries_color();

    for group in &mesh.groups {
        let material = materials.get_or_default(&group.material);
        for triangle in &group.triangles {
            for point in triangle.transformed(matrix).voxel_points(precision) {
                let symbol = if colored {
                    palette.lookup(material.color_at(point.uv))
                } else {
                    Some(palette.default_symbol().clone())
                };
                footprint.insert(point.voxel(), symbol);
            }
        }
    }

    debug!(
        "Voxelized {} triangles into {} voxels ({} empty)",
        mesh.triangle_count(),
        footprint.len(),
        footprint.empty_count()
    );
    footprint
}

/// Voxel coordinates of `mesh` under `matrix`, without symbol resolution
pub fn voxel_coordinates(mesh: &Mesh, matrix: &Mat4, precision: f32) -> HashSet<IVec3> {
    mesh.triangles()
        .flat_map(|triangle| triangle.transformed(matrix).voxel_points(precision))
        .map(|point: Point| point.voxel())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Argb;
    use crate::geometry::Triangle;
    use crate::mesh::MeshFormat;
    use crate::texture::Texture;
    use glam::{Vec2, Vec3};
    use image::{Rgba, RgbaImage};

    fn unit_triangle() -> Triangle {
        Triangle::new(
            Point::new(Vec3::ZERO, Vec2::new(0.5, 0.5)),
            Point::new(Vec3::X, Vec2::new(0.5, 0.5)),
            Point::new(Vec3::Y, Vec2::new(0.5, 0.5)),
        )
    }

    fn palette() -> Palette {
        let mut palette = Palette::new(20, "stone").expect("palette");
        palette.insert(Argb::opaque(240, 0, 0), Symbol::new("redstone"));
        palette
    }

    #[test]
    fn test_unit_triangle_footprint_contains_origin() {
        let mut mesh = Mesh::new(MeshFormat::StlAscii);
        mesh.push(MaterialTable::DEFAULT_MATERIAL, unit_triangle());
        let footprint = voxelize(
            &mesh,
            &MaterialTable::new(),
            &Mat4::IDENTITY,
            DEFAULT_PRECISION,
            &palette(),
        );
        assert!(footprint.contains(IVec3::ZERO));
        // Colorless formats take the default symbol everywhere
        assert!(footprint.iter().all(|(_, s)| s.map(Symbol::as_str) == Some("stone")));
    }

    #[test]
    fn test_colored_mesh_resolves_through_palette() {
        let mut materials = MaterialTable::new();
        materials.declare("red").base_color = Some(Argb::opaque(250, 5, 5));
        let mut mesh = Mesh::new(MeshFormat::Obj);
        mesh.push("red", unit_triangle());

        let footprint = voxelize(&mesh, &materials, &Mat4::IDENTITY, 1.5, &palette());
        assert_eq!(
            footprint.get(IVec3::ZERO),
            Some(Some(&Symbol::new("redstone")))
        );
    }

    #[test]
    fn test_transparent_texels_resolve_to_empty() {
        let mut materials = MaterialTable::new();
        materials.declare("glass").texture =
            Some(Texture::from_image(RgbaImage::from_pixel(1, 1, Rgba([9, 9, 9, 128]))));
        let mut mesh = Mesh::new(MeshFormat::Obj);
        mesh.push("glass", unit_triangle());

        let footprint = voxelize(&mesh, &materials, &Mat4::IDENTITY, 1.5, &palette());
        assert!(!footprint.is_empty());
        assert_eq!(footprint.empty_count(), footprint.len());
        assert_eq!(footprint.get(IVec3::ZERO), Some(None));
    }

    #[test]
    fn test_later_groups_overwrite_symbols() {
        let mut materials = MaterialTable::new();
        materials.declare("red").base_color = Some(Argb::opaque(240, 0, 0));
        let mut mesh = Mesh::new(MeshFormat::Obj);
        mesh.push(MaterialTable::DEFAULT_MATERIAL, unit_triangle());
        mesh.push("red", unit_triangle());

        let footprint = voxelize(&mesh, &materials, &Mat4::IDENTITY, 1.5, &palette());
        assert!(footprint
            .iter()
            .all(|(_, s)| s.map(Symbol::as_str) == Some("redstone")));
    }

    #[test]
    fn test_matrix_is_applied() {
        let mut mesh = Mesh::new(MeshFormat::StlBinary);
        mesh.push(MaterialTable::DEFAULT_MATERIAL, unit_triangle());
        let scaled = voxel_coordinates(&mesh, &Mat4::from_scale(Vec3::splat(4.0)), 1.5);
        let plain = voxel_coordinates(&mesh, &Mat4::IDENTITY, 1.5);
        assert!(scaled.len() > plain.len());
        assert!(scaled.contains(&IVec3::new(4, 0, 0)));
        assert!(scaled.contains(&IVec3::new(1, 1, 0)));
    }

    #[test]
    fn test_zero_scale_collapses_to_origin() {
        let mut mesh = Mesh::new(MeshFormat::StlBinary);
        mesh.push(MaterialTable::DEFAULT_MATERIAL, unit_triangle());
        let coords = voxel_coordinates(&mesh, &Mat4::from_scale(Vec3::ZERO), 1.5);
        assert_eq!(coords, HashSet::from([IVec3::ZERO]));
    }
}
