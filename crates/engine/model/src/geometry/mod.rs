//! Geometric primitives shared by the parsers and the voxelizer

mod bounds;
mod point;
mod triangle;

pub use bounds::BoundingBox;
pub use point::Point;
pub use triangle::Triangle;

use glam::{IVec3, Vec3};

/// Smallest and one past the largest world coordinate that floors to an
/// `i32` cell
const CELL_RANGE: (f32, f32) = (i32::MIN as f32, -(i32::MIN as f32));

/// `cell + offset`, or `None` when any component leaves the `i32` range
pub fn offset_cell(cell: IVec3, offset: IVec3) -> Option<IVec3> {
    Some(IVec3::new(
        cell.x.checked_add(offset.x)?,
        cell.y.checked_add(offset.y)?,
        cell.z.checked_add(offset.z)?,
    ))
}

/// Whether `position` floors to a cell every axis of which fits an `i32`
pub fn is_addressable(position: Vec3) -> bool {
    let (min, end) = CELL_RANGE;
    position.cmpge(Vec3::splat(min)).all() && position.cmplt(Vec3::splat(end)).all()
}
