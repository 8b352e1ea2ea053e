//! Single-level undo for placements

use crate::geometry::offset_cell;
use crate::symbol::Symbol;
use crate::target::{TargetError, VoxelTarget};
use crate::voxelize::Footprint;
use glam::IVec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{info, warn};

/// Outcome of writing a batch of cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerReport {
    pub written: usize,
    pub failed: usize,
}

impl LedgerReport {
    pub fn total(&self) -> usize {
        self.written + self.failed
    }

    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }

    fn record<E: fmt::Display>(&mut self, coordinate: IVec3, result: Result<(), E>) {
        match result {
            Ok(()) => self.written += 1,
            Err(err) => {
                self.failed += 1;
                warn!("Write to {} failed: {}", coordinate, err);
            }
        }
    }
}

/// Prior content of every cell the last commit touched
///
/// A commit replaces the ledger wholesale. Undo writes the snapshot back and
/// keeps it, so undoing twice restores the same state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacementLedger {
    entries: HashMap<IVec3, Option<Symbol>>,
}

impl PlacementLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshotted content of `coordinate`; outer `None` if it was not touched
    pub fn get(&self, coordinate: IVec3) -> Option<Option<&Symbol>> {
        self.entries.get(&coordinate).map(Option::as_ref)
    }

    /// Write `footprint`, shifted by `offset`, into `target`
    ///
    /// Every destination cell is snapshotted before the first write. Empty
    /// cells in the footprint are written as empty too.
    pub fn commit<T: VoxelTarget + ?Sized>(
        &mut self,
        target: &mut T,
        footprint: &Footprint,
        offset: IVec3,
    ) -> LedgerReport {
        self.entries = footprint
            .iter()
            .filter_map(|(coordinate, _)| offset_cell(coordinate, offset))
            .map(|cell| (cell, target.get(cell)))
            .collect();

        let mut report = LedgerReport::default();
        for (coordinate, symbol) in footprint.iter() {
            match offset_cell(coordinate, offset) {
                Some(cell) => report.record(cell, target.set(cell, symbol.cloned())),
                None => report.record(
                    coordinate,
                    Err(TargetError::Rejected(format!(
                        "offset {offset} moves the cell past the coordinate range"
                    ))),
                ),
            }
        }
        info!(
            "Committed {} cells at offset {} ({} failed)",
            report.written, offset, report.failed
        );
        report
    }

    /// Restore every snapshotted cell; a no-op on an empty ledger
    pub fn undo<T: VoxelTarget + ?Sized>(&self, target: &mut T) -> LedgerReport {
        let mut report = LedgerReport::default();
        for (coordinate, previous) in &self.entries {
            report.record(*coordinate, target.set(*coordinate, previous.clone()));
        }
        if !self.is_empty() {
            info!(
                "Restored {} cells ({} failed)",
                report.written, report.failed
            );
        }
        report
    }
}
