//! Published voxel preview snapshots
//!
//! The writer builds a complete snapshot off to the side and swaps it in; a
//! renderer holding a [`PreviewHandle`] clones the current `Arc` and reads it
//! without further locking, so it never sees a half-built set.

use crate::visibility::{compute_visibility, FaceMask, VoxelFace};
use glam::IVec3;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

/// How a loaded model is previewed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Bounding box outline only; no voxel preview is kept
    #[default]
    Box,
    /// Culled voxel faces
    Voxels,
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "box" => Ok(ViewMode::Box),
            "voxels" | "blocks" => Ok(ViewMode::Voxels),
            _ => Err(format!("unknown view mode '{s}', expected box or voxels")),
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ViewMode::Box => "box",
            ViewMode::Voxels => "voxels",
        })
    }
}

/// An immutable voxel set with per-voxel exposed faces
#[derive(Debug, Default)]
pub struct PreviewSnapshot {
    generation: u64,
    faces: HashMap<IVec3, FaceMask>,
}

impl PreviewSnapshot {
    /// Increases by one with every publish
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn mask(&self, coordinate: IVec3) -> Option<FaceMask> {
        self.faces.get(&coordinate).copied()
    }

    /// Voxels with at least one exposed face
    pub fn visible_faces(&self) -> impl Iterator<Item = VoxelFace> + '_ {
        self.faces
            .iter()
            .filter(|(_, mask)| !mask.is_hidden())
            .map(|(&coordinate, &visibility)| VoxelFace {
                coordinate,
                visibility,
            })
    }
}

type Shared = Arc<RwLock<Arc<PreviewSnapshot>>>;

/// Read side of a [`PreviewCache`]
#[derive(Debug, Clone)]
pub struct PreviewHandle {
    current: Shared,
}

impl PreviewHandle {
    /// The most recently published snapshot
    pub fn snapshot(&self) -> Arc<PreviewSnapshot> {
        load(&self.current)
    }
}

/// Write side: recomputes and publishes snapshots
#[derive(Debug)]
pub struct PreviewCache {
    current: Shared,
    generation: u64,
}

impl Default for PreviewCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewCache {
    pub fn new() -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(PreviewSnapshot::default()))),
            generation: 0,
        }
    }

    pub fn handle(&self) -> PreviewHandle {
        PreviewHandle {
            current: Arc::clone(&self.current),
        }
    }

    pub fn snapshot(&self) -> Arc<PreviewSnapshot> {
        load(&self.current)
    }

    /// Compute visibility for `voxels` and publish it as the new snapshot
    pub fn publish(&mut self, voxels: &HashSet<IVec3>) -> Arc<PreviewSnapshot> {
        let faces = compute_visibility(voxels);
        self.swap(faces)
    }

    /// Publish an empty snapshot
    pub fn clear(&mut self) -> Arc<PreviewSnapshot> {
        self.swap(HashMap::new())
    }

    fn swap(&mut self, faces: HashMap<IVec3, FaceMask>) -> Arc<PreviewSnapshot> {
        self.generation += 1;
        let snapshot = Arc::new(PreviewSnapshot {
            generation: self.generation,
            faces,
        });
        // The lock only guards the pointer swap
        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Arc::clone(&snapshot);
        snapshot
    }
}

fn load(current: &Shared) -> Arc<PreviewSnapshot> {
    let slot = current.read().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(&*slot)
}
