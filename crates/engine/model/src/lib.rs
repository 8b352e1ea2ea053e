//! Model import, transform and voxelization for Crossworld
//!
//! This crate turns externally authored triangle meshes (OBJ with an optional
//! MTL sidecar, ASCII STL and binary STL) into sets of integer voxel
//! coordinates, keeps a live rigid transform over the loaded mesh and writes
//! the voxelized result into any voxel-addressable target with single-level
//! undo.
//!
//! # Pipeline
//!
//! 1. [`io::load_file`] picks a parser by extension (and sniffs STL flavour),
//!    producing a [`Mesh`] whose material groups reference a [`MaterialTable`].
//! 2. The mesh is centered once so its bounding box is symmetric about the origin.
//! 3. A [`Model`] holds the mesh, a [`Transform`] and a world position.
//! 4. [`voxelize`] rasterizes the transformed triangles into a [`Footprint`],
//!    resolving each voxel to a [`Symbol`] through the [`Palette`].
//! 5. [`PlacementLedger`] snapshots every target cell before a commit so the
//!    last commit can be undone.
//!
//! # Example
//!
//! ```no_run
//! use model::{MemoryWorld, ModelConfig, Session, ScaleMode};
//!
//! let mut session = Session::new(ModelConfig::default());
//! let status = session.load("teapot.obj");
//! println!("{}", status.message);
//!
//! session.rotate(0.0, 90.0, 0.0);
//! session.scale_uniform(ScaleMode::Set, 4.0);
//!
//! let mut world = MemoryWorld::new();
//! println!("{}", session.place(&mut world).message);
//! println!("{}", session.undo(&mut world).message);
//! ```

pub mod color;
pub mod config;
pub mod error;
pub mod geometry;
pub mod io;
pub mod ledger;
pub mod mesh;
pub mod model;
pub mod palette;
pub mod preview;
pub mod session;
pub mod symbol;
pub mod target;
pub mod texture;
pub mod transform;
pub mod visibility;
pub mod voxelize;

pub use color::Argb;
pub use config::{ConfigError, ModelConfig};
pub use error::{ModelError, RecordError, Result};
pub use geometry::{BoundingBox, Point, Triangle};
pub use ledger::{LedgerReport, PlacementLedger};
pub use mesh::{Material, MaterialGroup, MaterialTable, Mesh, MeshFormat};
pub use model::Model;
pub use palette::{Palette, PaletteError, SymbolColor};
pub use preview::{PreviewCache, PreviewHandle, PreviewSnapshot, ViewMode};
pub use session::{CommandStatus, ScaleMode, Session};
pub use symbol::Symbol;
pub use target::{MemoryWorld, TargetError, VoxelTarget, WorldError, WorldState};
pub use transform::{Axis, Direction, Transform};
pub use visibility::{compute_visibility, FaceMask, VoxelFace};
pub use voxelize::{voxel_coordinates, voxelize, Footprint, DEFAULT_PRECISION};

// Re-export glam for convenience
pub use glam;
