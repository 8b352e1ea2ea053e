//! STL readers, ASCII and binary
//!
//! STL is Z-up; both readers swap the file's Y and Z axes so models come in
//! Y-up. Neither format carries color, so every triangle lands in the default
//! material group.

use crate::error::RecordError;
use crate::geometry::{Point, Triangle};
use crate::mesh::{MaterialTable, Mesh, MeshFormat};
use glam::Vec3;
use std::io;
use tracing::warn;

const HEADER_LEN: usize = 80;
const PREAMBLE_LEN: usize = HEADER_LEN + 4;
const RECORD_LEN: usize = 50;

/// Whether `bytes` look like ASCII STL
///
/// ASCII files open with `solid`; some binary exporters also write `solid`
/// into the header, so a file whose length exactly matches its declared
/// triangle count is still treated as binary.
pub fn is_ascii(bytes: &[u8]) -> bool {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    if !bytes[start..].starts_with(b"solid") {
        return false;
    }
    declared_binary_len(bytes) != Some(bytes.len())
}

/// Total byte length implied by the triangle count in a binary header
fn declared_binary_len(bytes: &[u8]) -> Option<usize> {
    let count = bytes.get(HEADER_LEN..PREAMBLE_LEN)?;
    let count = u32::from_le_bytes(count.try_into().ok()?) as usize;
    count.checked_mul(RECORD_LEN)?.checked_add(PREAMBLE_LEN)
}

/// Parse ASCII STL text
///
/// Each `facet` line is followed by one skipped line (`outer loop`) and three
/// vertex lines read as `x z y`. A facet with an unreadable vertex is skipped
/// whole.
pub fn parse_ascii(text: &str) -> Mesh {
    let mut mesh = Mesh::new(MeshFormat::StlAscii);
    let mut lines = text.lines().enumerate().map(|(i, line)| (i + 1, line));

    while let Some((line_no, line)) = lines.next() {
        if line.split_whitespace().next() != Some("facet") {
            continue;
        }
        lines.next();
        match read_facet(line_no, &mut lines) {
            Ok(triangle) => {
                for vertex in triangle.vertices {
                    mesh.extend_bounds(vertex.position);
                }
                mesh.push(MaterialTable::DEFAULT_MATERIAL, triangle);
            }
            Err(err) => warn!("Skipping STL facet: {}", err),
        }
    }
    mesh
}

fn read_facet<'a>(
    facet_line: usize,
    lines: &mut impl Iterator<Item = (usize, &'a str)>,
) -> Result<Triangle, RecordError> {
    let mut corners = [Point::default(); 3];
    for corner in &mut corners {
        let (line_no, line) = lines
            .next()
            .ok_or_else(|| RecordError::new(facet_line, "facet ends before three vertices"))?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.first() != Some(&"vertex") || tokens.len() < 4 {
            return Err(RecordError::new(line_no, format!("expected vertex, found {:?}", line.trim())));
        }
        let mut values = [0.0f32; 3];
        for (value, token) in values.iter_mut().zip(&tokens[1..4]) {
            *value = token
                .parse()
                .map_err(|_| RecordError::new(line_no, format!("invalid number {token:?}")))?;
        }
        let [x, y, z] = values;
        *corner = Point::at(x, z, y);
    }
    let [a, b, c] = corners;
    Ok(Triangle::new(a, b, c))
}

/// Parse binary STL
///
/// Layout: 80-byte header, little-endian `u32` triangle count, then per
/// triangle a normal and three vertices (twelve `f32`) plus a 2-byte attribute
/// word. The normal and attribute are ignored.
pub fn parse_binary(bytes: &[u8]) -> io::Result<Mesh> {
    let expected = declared_binary_len(bytes).ok_or_else(|| {
        io::Error::new(io::ErrorKind::UnexpectedEof, "binary STL shorter than its header")
    })?;
    if bytes.len() < expected {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!(
                "binary STL truncated: {} bytes, header declares {}",
                bytes.len(),
                expected
            ),
        ));
    }

    let mut mesh = Mesh::new(MeshFormat::StlBinary);
    for record in bytes[PREAMBLE_LEN..expected].chunks_exact(RECORD_LEN) {
        let float = |index: usize| {
            let offset = 12 + index * 4;
            f32::from_le_bytes([
                record[offset],
                record[offset + 1],
                record[offset + 2],
                record[offset + 3],
            ])
        };
        let corner = |v: usize| Vec3::new(float(v * 3), float(v * 3 + 2), float(v * 3 + 1));
        let triangle = Triangle::new(
            Point::new(corner(0), Default::default()),
            Point::new(corner(1), Default::default()),
            Point::new(corner(2), Default::default()),
        );
        for vertex in triangle.vertices {
            mesh.extend_bounds(vertex.position);
        }
        mesh.push(MaterialTable::DEFAULT_MATERIAL, triangle);
    }
    Ok(mesh)
}
