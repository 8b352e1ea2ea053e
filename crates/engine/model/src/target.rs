//! Voxel targets that placements write into

use crate::ledger::PlacementLedger;
use crate::symbol::Symbol;
use glam::IVec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// A write the target refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("coordinate {coordinate} is outside the world")]
    OutOfBounds { coordinate: IVec3 },
    #[error("write rejected: {0}")]
    Rejected(String),
}

/// Errors emitted while persisting a world.
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),
    #[error("world file missing")]
    NotFound,
}

/// An addressable voxel environment
///
/// `None` is the empty cell. Both operations must be immediately consistent:
/// a `get` after a successful `set` returns what was written.
pub trait VoxelTarget {
    fn get(&self, coordinate: IVec3) -> Option<Symbol>;
    fn set(&mut self, coordinate: IVec3, symbol: Option<Symbol>) -> Result<(), TargetError>;
}

/// Sparse in-memory world, optionally limited to an inclusive box
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryWorld {
    cells: HashMap<IVec3, Symbol>,
    bounds: Option<(IVec3, IVec3)>,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// World that rejects writes outside `min..=max`
    pub fn with_bounds(min: IVec3, max: IVec3) -> Self {
        Self {
            cells: HashMap::new(),
            bounds: Some((min.min(max), min.max(max))),
        }
    }

    pub fn bounds(&self) -> Option<(IVec3, IVec3)> {
        self.bounds
    }

    pub fn in_bounds(&self, coordinate: IVec3) -> bool {
        match self.bounds {
            Some((min, max)) => coordinate.cmpge(min).all() && coordinate.cmple(max).all(),
            None => true,
        }
    }

    /// Number of non-empty cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (IVec3, &Symbol)> {
        self.cells.iter().map(|(c, s)| (*c, s))
    }

    /// Count of cells holding each symbol, sorted by symbol
    pub fn census(&self) -> Vec<(Symbol, usize)> {
        let mut counts: HashMap<&Symbol, usize> = HashMap::new();
        for symbol in self.cells.values() {
            *counts.entry(symbol).or_default() += 1;
        }
        let mut counts: Vec<_> = counts.into_iter().map(|(s, n)| (s.clone(), n)).collect();
        counts.sort();
        counts
    }
}

impl VoxelTarget for MemoryWorld {
    fn get(&self, coordinate: IVec3) -> Option<Symbol> {
        self.cells.get(&coordinate).cloned()
    }

    fn set(&mut self, coordinate: IVec3, symbol: Option<Symbol>) -> Result<(), TargetError> {
        if !self.in_bounds(coordinate) {
            return Err(TargetError::OutOfBounds { coordinate });
        }
        match symbol {
            Some(symbol) => {
                self.cells.insert(coordinate, symbol);
            }
            None => {
                self.cells.remove(&coordinate);
            }
        }
        Ok(())
    }
}

/// A world and the ledger of the last placement into it, persisted together
/// so a later run can undo
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    pub world: MemoryWorld,
    pub ledger: PlacementLedger,
}

impl WorldState {
    pub fn load(path: &Path) -> Result<Self, WorldError> {
        match fs::read(path) {
            Ok(bytes) => Ok(bincode::deserialize(&bytes)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(WorldError::NotFound),
            Err(err) => Err(WorldError::Io(err)),
        }
    }

    /// Load `path`, starting from an empty world when it does not exist yet
    pub fn load_or_default(path: &Path) -> Result<Self, WorldError> {
        match Self::load(path) {
            Err(WorldError::NotFound) => Ok(Self::default()),
            other => other,
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), WorldError> {
        let data = bincode::serialize(self)?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, data)?;
        fs::rename(tmp, path)?;
        Ok(())
    }
}
