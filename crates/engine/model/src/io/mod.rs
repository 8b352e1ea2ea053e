//! Mesh file loading
//!
//! Format is chosen by file extension; `.stl` files are further sniffed to
//! pick the ASCII or binary reader. OBJ files pull their materials from an MTL
//! sidecar when one can be found.

pub mod mtl;
pub mod obj;
pub mod stl;

use crate::error::{ModelError, Result};
use crate::mesh::{MaterialTable, Mesh, MeshFormat};
use crate::texture::Texture;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Pick the reader for `path`, sniffing `bytes` for STL
pub fn detect_format(path: &Path, bytes: &[u8]) -> Result<MeshFormat> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "obj" => Ok(MeshFormat::Obj),
        "stl" if stl::is_ascii(bytes) => Ok(MeshFormat::StlAscii),
        "stl" => Ok(MeshFormat::StlBinary),
        _ => Err(ModelError::UnsupportedFormat { extension }),
    }
}

/// Read and load the mesh at `path`
pub fn load_file(path: &Path, texture_roots: &[PathBuf]) -> Result<(Mesh, MaterialTable)> {
    let bytes = fs::read(path)?;
    load_bytes(path, &bytes, texture_roots)
}

/// Load a mesh from bytes already read from `path`
///
/// The path selects the format and locates the material sidecar. Textures
/// named by the sidecar are decoded here; one that fails to decode is logged
/// and dropped so its material falls back to the flat color.
pub fn load_bytes(
    path: &Path,
    bytes: &[u8],
    texture_roots: &[PathBuf],
) -> Result<(Mesh, MaterialTable)> {
    let (mesh, mut materials) = parse_mesh(path, bytes, texture_roots)?;
    decode_textures(&mut materials);
    Ok((mesh, materials))
}

/// Parse geometry and materials without decoding textures
pub fn parse_mesh(
    path: &Path,
    bytes: &[u8],
    texture_roots: &[PathBuf],
) -> Result<(Mesh, MaterialTable)> {
    let format = detect_format(path, bytes)?;
    let (mesh, materials) = match format {
        MeshFormat::Obj => {
            let text = String::from_utf8_lossy(bytes);
            let materials = match find_sidecar(path, &text) {
                Some(sidecar) => {
                    debug!("Reading materials from {}", sidecar.display());
                    let sidecar_bytes = fs::read(&sidecar)?;
                    mtl::parse_mtl(&String::from_utf8_lossy(&sidecar_bytes), texture_roots)
                }
                None => MaterialTable::new(),
            };
            let mesh = obj::parse_obj(&text, &materials);
            (mesh, materials)
        }
        MeshFormat::StlAscii => (
            stl::parse_ascii(&String::from_utf8_lossy(bytes)),
            MaterialTable::new(),
        ),
        MeshFormat::StlBinary => (stl::parse_binary(bytes)?, MaterialTable::new()),
    };

    if mesh.is_empty() {
        return Err(ModelError::MalformedGeometry(format!(
            "{} contains no triangles",
            path.display()
        )));
    }
    let degenerate = mesh.triangles().filter(|t| t.is_degenerate()).count();
    debug!(
        "Parsed {} as {}: {} triangles ({} degenerate) in {} groups, bounds {:?}..{:?}",
        path.display(),
        format.name(),
        mesh.triangle_count(),
        degenerate,
        mesh.groups.len(),
        mesh.bounds.min,
        mesh.bounds.max
    );
    Ok((mesh, materials))
}

/// The MTL file for an OBJ: the first `mtllib` that exists next to the mesh,
/// else `<stem>.mtl`
fn find_sidecar(path: &Path, text: &str) -> Option<PathBuf> {
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    obj::material_libraries(text)
        .into_iter()
        .map(|name| dir.join(name))
        .chain(std::iter::once(path.with_extension("mtl")))
        .find(|candidate| candidate.is_file())
}

/// Decode every resolved texture, dropping those that fail
pub fn decode_textures(materials: &mut MaterialTable) {
    for material in materials.iter_mut() {
        let Some(path) = &material.texture_path else {
            continue;
        };
        match Texture::open(path) {
            Ok(texture) => {
                debug!(
                    "Loaded texture {} ({}x{}) for '{}'",
                    path.display(),
                    texture.width(),
                    texture.height(),
                    material.name
                );
                material.texture = Some(texture);
            }
            Err(err) => {
                warn!("Dropping texture {} for '{}': {}", path.display(), material.name, err);
                material.texture = None;
            }
        }
    }
}
