//! Exposed-face culling for voxel previews

use crate::geometry::offset_cell;
use glam::IVec3;
use std::collections::{HashMap, HashSet};

/// Six-bit set of exposed faces, one bit per axis direction
///
/// Bit order: −x = 1, +x = 2, −y = 4, +y = 8, −z = 16, +z = 32.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FaceMask(u8);

impl FaceMask {
    pub const NONE: FaceMask = FaceMask(0);
    pub const ALL: FaceMask = FaceMask(0b11_1111);

    /// Neighbor offsets in bit order
    pub const OFFSETS: [IVec3; 6] = [
        IVec3::new(-1, 0, 0),
        IVec3::new(1, 0, 0),
        IVec3::new(0, -1, 0),
        IVec3::new(0, 1, 0),
        IVec3::new(0, 0, -1),
        IVec3::new(0, 0, 1),
    ];

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether the face toward `OFFSETS[index]` is exposed
    pub fn is_exposed(self, index: usize) -> bool {
        index < 6 && self.0 & (1 << index) != 0
    }

    pub fn is_hidden(self) -> bool {
        self.0 == 0
    }

    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    fn clear(&mut self, index: usize) {
        self.0 &= !(1 << index);
    }
}

/// A voxel and the faces of it a preview should draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoxelFace {
    pub coordinate: IVec3,
    pub visibility: FaceMask,
}

/// Exposed faces of every voxel in `voxels`
///
/// Each mask starts full and loses one bit per occupied axis neighbor.
pub fn compute_visibility(voxels: &HashSet<IVec3>) -> HashMap<IVec3, FaceMask> {
    voxels
        .iter()
        .map(|&coordinate| (coordinate, mask_for(voxels, coordinate)))
        .collect()
}

/// Exposed faces of a single voxel against `voxels`
pub fn mask_for(voxels: &HashSet<IVec3>, coordinate: IVec3) -> FaceMask {
    let mut mask = FaceMask::ALL;
    for (index, offset) in FaceMask::OFFSETS.iter().enumerate() {
        // A neighbor past the i32 range cannot be occupied
        if offset_cell(coordinate, *offset).is_some_and(|n| voxels.contains(&n)) {
            mask.clear(index);
        }
    }
    mask
}
