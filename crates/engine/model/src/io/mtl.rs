//! Wavefront MTL reader

use super::obj::parse_floats;
use crate::color::Argb;
use crate::error::RecordError;
use crate::mesh::MaterialTable;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Parse MTL text into a material table
///
/// Recognizes `newmtl`, `map_Kd` and `Kd`. Texture paths are resolved against
/// each of `texture_roots` in order and the first existing file wins; a path
/// that exists under no root leaves the material untextured. Records that
/// precede the first `newmtl` configure the default material.
pub fn parse_mtl(text: &str, texture_roots: &[PathBuf]) -> MaterialTable {
    let mut table = MaterialTable::new();
    let mut current = MaterialTable::DEFAULT_MATERIAL.to_string();

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = line.trim();
        let (keyword, rest) = match line.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (line, ""),
        };

        let result = match keyword {
            "newmtl" => {
                if rest.is_empty() {
                    Err(RecordError::new(line_no, "newmtl without a name"))
                } else {
                    table.declare(rest);
                    current = rest.to_string();
                    Ok(())
                }
            }
            "map_Kd" => texture_argument(line_no, rest).map(|path| {
                match resolve_texture(path, texture_roots) {
                    Some(resolved) => table.declare(&current).texture_path = Some(resolved),
                    None => warn!("Texture {:?} for material '{}' not found", path, current),
                }
            }),
            "Kd" => {
                let args: Vec<&str> = rest.split_whitespace().collect();
                parse_floats::<3>(line_no, &args).map(|[r, g, b]| {
                    table.declare(&current).base_color = Some(Argb::from_unit_rgb(r, g, b));
                })
            }
            _ => Ok(()),
        };

        if let Err(err) = result {
            warn!("Skipping MTL record: {}", err);
        }
    }

    debug!("Parsed {} materials", table.len());
    table
}

/// The file name of a `map_Kd` record, skipping any leading `-option value` pairs
fn texture_argument(line_no: usize, rest: &str) -> Result<&str, RecordError> {
    if rest.is_empty() {
        return Err(RecordError::new(line_no, "map_Kd without a path"));
    }
    if rest.starts_with('-') {
        // Options precede the file name, which is then the last token
        return rest
            .split_whitespace()
            .last()
            .ok_or_else(|| RecordError::new(line_no, "map_Kd without a path"));
    }
    Ok(rest)
}

/// First root under which `path` names an existing file
pub fn resolve_texture(path: &str, roots: &[PathBuf]) -> Option<PathBuf> {
    roots
        .iter()
        .map(|root| root.join(Path::new(path)))
        .find(|candidate| candidate.is_file())
}
