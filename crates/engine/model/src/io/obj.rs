//! Wavefront OBJ reader
//!
//! Recognizes `v`, `vt`, `usemtl` and `f` records; everything else is ignored.
//! A record that fails to parse is logged and skipped, never fatal.

use crate::error::RecordError;
use crate::geometry::{Point, Triangle};
use crate::mesh::{MaterialTable, Mesh, MeshFormat};
use glam::{Vec2, Vec3};
use tracing::warn;

/// Parse OBJ text into a mesh grouped by the materials declared in `materials`
///
/// `usemtl` naming a material missing from the table selects the default
/// material. Faces with more than three vertices are fan-triangulated around
/// their first vertex.
pub fn parse_obj(text: &str, materials: &MaterialTable) -> Mesh {
    let mut reader = ObjReader::new(materials);
    for (index, line) in text.lines().enumerate() {
        if let Err(err) = reader.read_line(index + 1, line) {
            warn!("Skipping OBJ record: {}", err);
        }
    }
    reader.mesh
}

/// Material libraries named by `mtllib` records, in file order
pub fn material_libraries(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            let rest = line.strip_prefix("mtllib")?;
            if !rest.starts_with(char::is_whitespace) {
                return None;
            }
            let name = rest.trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

struct ObjReader<'a> {
    materials: &'a MaterialTable,
    positions: Vec<Vec3>,
    uvs: Vec<Vec2>,
    current_material: String,
    mesh: Mesh,
}

impl<'a> ObjReader<'a> {
    fn new(materials: &'a MaterialTable) -> Self {
        Self {
            materials,
            positions: Vec::new(),
            uvs: Vec::new(),
            current_material: MaterialTable::DEFAULT_MATERIAL.to_string(),
            mesh: Mesh::new(MeshFormat::Obj),
        }
    }

    fn read_line(&mut self, line_no: usize, line: &str) -> Result<(), RecordError> {
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            return Ok(());
        };
        let args: Vec<&str> = tokens.collect();
        match keyword {
            "v" => {
                let [x, y, z] = parse_floats::<3>(line_no, &args)?;
                let position = Vec3::new(x, y, z);
                self.mesh.extend_bounds(position);
                self.positions.push(position);
            }
            "vt" => {
                let [u, v] = parse_floats::<2>(line_no, &args)?;
                self.uvs.push(Vec2::new(u, v));
            }
            "usemtl" => {
                self.current_material = match args.first() {
                    Some(name) if self.materials.contains(name) => name.to_string(),
                    _ => MaterialTable::DEFAULT_MATERIAL.to_string(),
                };
            }
            "f" => self.read_face(line_no, &args)?,
            _ => {}
        }
        Ok(())
    }

    fn read_face(&mut self, line_no: usize, args: &[&str]) -> Result<(), RecordError> {
        if args.len() < 3 {
            return Err(RecordError::new(
                line_no,
                format!("face needs at least 3 vertices, found {}", args.len()),
            ));
        }

        let mut corners = Vec::with_capacity(args.len());
        for token in args {
            corners.push(self.parse_corner(line_no, token)?);
        }

        // Only textured when every corner references a UV
        let textured = corners.iter().all(|(_, uv)| uv.is_some());
        let points: Vec<Point> = corners
            .into_iter()
            .map(|(position, uv)| {
                let uv = if textured { uv.unwrap_or(Vec2::ZERO) } else { Vec2::ZERO };
                Point::new(position, uv)
            })
            .collect();

        let first = points[0];
        for pair in points[1..].windows(2) {
            self.mesh
                .push(&self.current_material, Triangle::new(first, pair[0], pair[1]));
        }
        Ok(())
    }

    /// One `v`, `v/vt`, `v//vn` or `v/vt/vn` face token
    fn parse_corner(&self, line_no: usize, token: &str) -> Result<(Vec3, Option<Vec2>), RecordError> {
        let mut parts = token.split('/');
        let vertex = parts.next().unwrap_or_default();
        let vertex = resolve_index(line_no, vertex, self.positions.len())?;
        let position = self.positions[vertex];

        let uv = match parts.next() {
            Some(uv) if !uv.is_empty() => {
                let index = resolve_index(line_no, uv, self.uvs.len())?;
                Some(self.uvs[index])
            }
            _ => None,
        };
        Ok((position, uv))
    }
}

/// Resolve a 1-based (or negative, relative-to-end) index into `0..len`
fn resolve_index(line_no: usize, token: &str, len: usize) -> Result<usize, RecordError> {
    let raw: i64 = token
        .parse()
        .map_err(|_| RecordError::new(line_no, format!("invalid index {token:?}")))?;
    let resolved = if raw < 0 { len as i64 + raw } else { raw - 1 };
    if raw == 0 || resolved < 0 || resolved >= len as i64 {
        return Err(RecordError::new(
            line_no,
            format!("index {raw} out of range (have {len})"),
        ));
    }
    Ok(resolved as usize)
}

/// Parse the first `N` arguments as floats; extra arguments are ignored
pub(crate) fn parse_floats<const N: usize>(
    line_no: usize,
    args: &[&str],
) -> Result<[f32; N], RecordError> {
    if args.len() < N {
        return Err(RecordError::new(
            line_no,
            format!("expected {N} numbers, found {}", args.len()),
        ));
    }
    let mut out = [0.0; N];
    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = arg
            .parse()
            .map_err(|_| RecordError::new(line_no, format!("invalid number {arg:?}")))?;
    }
    Ok(out)
}
