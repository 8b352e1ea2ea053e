//! Parsed triangle meshes and their materials

use crate::color::Argb;
use crate::geometry::{BoundingBox, Triangle};
use crate::texture::Texture;
use glam::{Vec2, Vec3};
use std::path::PathBuf;

/// Source format a mesh was parsed from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    /// Wavefront OBJ, optionally with an MTL sidecar
    Obj,
    /// ASCII STL
    StlAscii,
    /// Binary STL
    StlBinary,
}

impl MeshFormat {
    pub fn name(self) -> &'static str {
        match self {
            MeshFormat::Obj => "obj",
            MeshFormat::StlAscii => "stl (ascii)",
            MeshFormat::StlBinary => "stl (binary)",
        }
    }

    /// Whether voxels of this format resolve symbols from colors.
    /// STL carries no color, so its voxels all take the default symbol.
    pub fn carries_color(self) -> bool {
        matches!(self, MeshFormat::Obj)
    }
}

/// A named color/texture binding
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    /// Resolved texture file, if one was declared and exists on disk
    pub texture_path: Option<PathBuf>,
    /// Decoded texture (populated when the model is loaded)
    pub texture: Option<Texture>,
    /// Flat diffuse color
    pub base_color: Option<Argb>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            texture_path: None,
            texture: None,
            base_color: None,
        }
    }

    /// Color at texture coordinate `uv`: texture sample, else flat color,
    /// else opaque mid-gray
    pub fn color_at(&self, uv: Vec2) -> Argb {
        match (&self.texture, self.base_color) {
            (Some(texture), _) => texture.sample(uv),
            (None, Some(color)) => color,
            (None, None) => Argb::DEFAULT_GRAY,
        }
    }
}

/// Materials by name, in declaration order
///
/// The default material is always present at index 0.
#[derive(Debug, Clone)]
pub struct MaterialTable {
    materials: Vec<Material>,
}

impl Default for MaterialTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialTable {
    /// Name of the material faces use when none (or an unknown one) is selected
    pub const DEFAULT_MATERIAL: &'static str = "default";

    pub fn new() -> Self {
        Self {
            materials: vec![Material::new(Self::DEFAULT_MATERIAL)],
        }
    }

    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn default_material(&self) -> &Material {
        &self.materials[0]
    }

    /// Material by name, falling back to the default material
    pub fn get_or_default(&self, name: &str) -> &Material {
        self.get(name).unwrap_or_else(|| self.default_material())
    }

    /// Declare a material, returning it for further configuration.
    /// Redeclaring an existing name returns the existing entry.
    pub fn declare(&mut self, name: &str) -> &mut Material {
        let index = match self.materials.iter().position(|m| m.name == name) {
            Some(index) => index,
            None => {
                self.materials.push(Material::new(name));
                self.materials.len() - 1
            }
        };
        &mut self.materials[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Material> {
        self.materials.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

/// Triangles sharing one material
#[derive(Debug, Clone)]
pub struct MaterialGroup {
    pub material: String,
    pub triangles: Vec<Triangle>,
}

/// An ordered triangle list partitioned into material groups
#[derive(Debug, Clone)]
pub struct Mesh {
    pub format: MeshFormat,
    pub groups: Vec<MaterialGroup>,
    /// Bounds of every vertex read, before centering; symmetric about the
    /// origin afterwards
    pub bounds: BoundingBox,
}

impl Mesh {
    pub fn new(format: MeshFormat) -> Self {
        Self {
            format,
            groups: Vec::new(),
            bounds: BoundingBox::empty(),
        }
    }

    pub fn extend_bounds(&mut self, point: Vec3) {
        self.bounds.extend(point);
    }

    /// Append a triangle to the group for `material`, creating the group on
    /// first use
    pub fn push(&mut self, material: &str, triangle: Triangle) {
        match self.groups.iter_mut().find(|g| g.material == material) {
            Some(group) => group.triangles.push(triangle),
            None => self.groups.push(MaterialGroup {
                material: material.to_string(),
                triangles: vec![triangle],
            }),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.groups.iter().map(|g| g.triangles.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.triangle_count() == 0
    }

    pub fn triangles(&self) -> impl Iterator<Item = &Triangle> {
        self.groups.iter().flat_map(|g| g.triangles.iter())
    }

    /// Translate every vertex so the bounding box is symmetric about the origin
    ///
    /// Idempotent: a centered mesh has a zero center and is left untouched.
    pub fn center(&mut self) {
        if self.bounds.is_empty() {
            return;
        }
        let center = self.bounds.center();
        let half_extent = self.bounds.half_extent();
        if center != Vec3::ZERO {
            for group in &mut self.groups {
                for triangle in &mut group.triangles {
                    *triangle = triangle.translated(-center);
                }
            }
        }
        self.bounds = BoundingBox::symmetric(half_extent);
    }
}
