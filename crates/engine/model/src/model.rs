//! The loaded model aggregate

use crate::error::Result;
use crate::geometry::BoundingBox;
use crate::io;
use crate::ledger::{LedgerReport, PlacementLedger};
use crate::mesh::{MaterialTable, Mesh};
use crate::palette::Palette;
use crate::preview::{PreviewCache, PreviewHandle, ViewMode};
use crate::target::VoxelTarget;
use crate::transform::{Axis, Transform};
use crate::voxelize::{voxel_coordinates, voxelize, Footprint};
use glam::Vec3;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A centered mesh with its materials, live transform, preview and undo ledger
#[derive(Debug)]
pub struct Model {
    path: PathBuf,
    mesh: Mesh,
    materials: MaterialTable,
    transform: Transform,
    precision: f32,
    /// Transformed bounds, refreshed on every rotation or scale change
    transformed_bounds: BoundingBox,
    view_mode: ViewMode,
    preview: PreviewCache,
    ledger: PlacementLedger,
}

impl Model {
    /// Wrap a parsed mesh, centering it about the origin
    pub fn new(
        path: impl Into<PathBuf>,
        mut mesh: Mesh,
        materials: MaterialTable,
        precision: f32,
        view_mode: ViewMode,
    ) -> Self {
        mesh.center();
        let transform = Transform::new();
        let mut model = Self {
            path: path.into(),
            transformed_bounds: transform.transformed_bounds(&mesh.bounds),
            mesh,
            materials,
            transform,
            precision,
            view_mode,
            preview: PreviewCache::new(),
            ledger: PlacementLedger::new(),
        };
        if view_mode == ViewMode::Voxels {
            model.refresh_preview();
        }
        model
    }

    /// Read, parse and wrap the mesh at `path`
    pub fn load(
        path: &Path,
        texture_roots: &[PathBuf],
        precision: f32,
        view_mode: ViewMode,
    ) -> Result<Self> {
        let (mesh, materials) = io::load_file(path, texture_roots)?;
        Ok(Self::new(path, mesh, materials, precision, view_mode))
    }

    /// Parse and wrap a mesh from bytes already read from `path`
    pub fn from_bytes(
        path: &Path,
        bytes: &[u8],
        texture_roots: &[PathBuf],
        precision: f32,
        view_mode: ViewMode,
    ) -> Result<Self> {
        let (mesh, materials) = io::load_bytes(path, bytes, texture_roots)?;
        Ok(Self::new(path, mesh, materials, precision, view_mode))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn materials(&self) -> &MaterialTable {
        &self.materials
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Bounds of the centered, untransformed mesh
    pub fn bounds(&self) -> BoundingBox {
        self.mesh.bounds
    }

    /// Bounds under the current rotation and scale, before world position
    pub fn transformed_bounds(&self) -> BoundingBox {
        self.transformed_bounds
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn preview(&self) -> PreviewHandle {
        self.preview.handle()
    }

    pub fn ledger(&self) -> &PlacementLedger {
        &self.ledger
    }

    pub fn apply_rotation(&mut self, degrees: Vec3) {
        self.transform.apply_rotation(degrees);
        self.geometry_changed();
    }

    pub fn set_rotation(&mut self, degrees: Vec3) {
        self.transform.set_rotation(degrees);
        self.geometry_changed();
    }

    pub fn rotate_axis(&mut self, axis: Axis, degrees: f32) {
        self.transform.rotate_axis(axis, degrees);
        self.geometry_changed();
    }

    pub fn apply_scale(&mut self, factors: Vec3) {
        self.transform.apply_scale(factors);
        self.geometry_changed();
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.transform.set_scale(scale);
        self.geometry_changed();
    }

    /// Move the world position; local geometry and the preview are unaffected
    pub fn translate(&mut self, direction: Vec3, distance: f32) {
        self.transform.translate(direction, distance);
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.transform.set_position(position);
    }

    /// Switch preview mode; entering voxel mode recomputes the preview
    pub fn set_view_mode(&mut self, mode: ViewMode) {
        let entering = mode == ViewMode::Voxels && self.view_mode != ViewMode::Voxels;
        self.view_mode = mode;
        if entering {
            self.refresh_preview();
        } else if mode == ViewMode::Box {
            self.preview.clear();
        }
    }

    fn geometry_changed(&mut self) {
        self.transformed_bounds = self.transform.transformed_bounds(&self.mesh.bounds);
        if self.view_mode == ViewMode::Voxels {
            self.refresh_preview();
        }
    }

    /// Recompute and publish the culled voxel preview
    pub fn refresh_preview(&mut self) {
        let voxels = voxel_coordinates(&self.mesh, &self.transform.matrix(), self.precision);
        let snapshot = self.preview.publish(&voxels);
        debug!(
            "Preview generation {}: {} voxels",
            snapshot.generation(),
            snapshot.len()
        );
    }

    /// Full-fidelity footprint in model-local voxel coordinates
    pub fn footprint(&self, palette: &Palette) -> Footprint {
        voxelize(
            &self.mesh,
            &self.materials,
            &self.transform.matrix(),
            self.precision,
            palette,
        )
    }

    /// Write the footprint at the floored world position, replacing the ledger
    pub fn place<T: VoxelTarget + ?Sized>(&mut self, target: &mut T, palette: &Palette) -> LedgerReport {
        let footprint = self.footprint(palette);
        self.ledger
            .commit(target, &footprint, self.transform.world_offset())
    }

    /// Restore the cells the last placement overwrote
    pub fn undo<T: VoxelTarget + ?Sized>(&self, target: &mut T) -> LedgerReport {
        self.ledger.undo(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Triangle};
    use crate::mesh::MeshFormat;
    use crate::symbol::Symbol;
    use crate::target::MemoryWorld;
    use glam::IVec3;

    /// A right triangle spanning 0..4 on X and Y, offset so centering moves it
    fn model(view_mode: ViewMode) -> Model {
        let mut mesh = Mesh::new(MeshFormat::StlAscii);
        let t = Triangle::new(
            Point::at(10.0, 10.0, 10.0),
            Point::at(14.0, 10.0, 10.0),
            Point::at(10.0, 14.0, 10.0),
        );
        for v in t.vertices {
            mesh.extend_bounds(v.position);
        }
        mesh.push(MaterialTable::DEFAULT_MATERIAL, t);
        Model::new("tri.stl", mesh, MaterialTable::new(), 1.5, view_mode)
    }

    #[test]
    fn test_new_centers_mesh() {
        let model = model(ViewMode::Box);
        assert_eq!(model.bounds().min, Vec3::new(-2.0, -2.0, 0.0));
        assert_eq!(model.bounds().max, Vec3::new(2.0, 2.0, 0.0));
        assert_eq!(model.transform().scale(), Vec3::ONE);
    }

    #[test]
    fn test_preview_follows_view_mode() {
        let mut model = model(ViewMode::Box);
        let preview = model.preview();
        assert!(preview.snapshot().is_empty());

        model.set_view_mode(ViewMode::Voxels);
        let first = preview.snapshot();
        assert!(!first.is_empty());

        // Moving never recomputes
        model.translate(Vec3::X, 5.0);
        assert_eq!(preview.snapshot().generation(), first.generation());

        model.set_scale(Vec3::splat(2.0));
        let scaled = preview.snapshot();
        assert!(scaled.generation() > first.generation());
        assert!(scaled.len() > first.len());

        model.set_view_mode(ViewMode::Box);
        assert!(preview.snapshot().is_empty());
    }

    #[test]
    fn test_box_mode_skips_preview_work() {
        let mut model = model(ViewMode::Box);
        model.rotate_axis(Axis::Y, 45.0);
        assert_eq!(model.preview().snapshot().generation(), 0);
    }

    #[test]
    fn test_transformed_bounds_cached_on_scale() {
        let mut model = model(ViewMode::Box);
        model.set_scale(Vec3::new(3.0, 1.0, 1.0));
        assert_eq!(model.transformed_bounds().max, Vec3::new(6.0, 2.0, 0.0));
        // Position does not enter the bounds
        model.translate(Vec3::Y, 100.0);
        assert_eq!(model.transformed_bounds().max, Vec3::new(6.0, 2.0, 0.0));
    }

    #[test]
    fn test_place_offsets_by_floored_position() {
        let mut model = model(ViewMode::Box);
        let palette = Palette::empty("stone");
        let local = model.footprint(&palette);

        model.set_position(Vec3::new(100.7, -0.5, 3.0));
        let mut world = MemoryWorld::new();
        let report = model.place(&mut world, &palette);
        assert_eq!(report.written, local.len());

        let offset = IVec3::new(100, -1, 3);
        for (coordinate, _) in local.iter() {
            assert_eq!(world.get(coordinate + offset), Some(Symbol::new("stone")));
        }

        model.undo(&mut world);
        assert!(world.is_empty());
    }
}
