//! Command surface over the single live model
//!
//! Every command runs to completion and reports a [`CommandStatus`]. A command
//! that fails validation leaves the session untouched.

use crate::config::ModelConfig;
use crate::geometry::is_addressable;
use crate::model::Model;
use crate::palette::Palette;
use crate::preview::ViewMode;
use crate::target::VoxelTarget;
use crate::transform::{Axis, Direction};
use glam::Vec3;
use std::fmt;
use std::path::Path;
use tracing::{error, info};

const NO_MODEL: &str = "No model is loaded.";
const OUT_OF_RANGE: &str = "That would move the model outside the world.";

/// Outcome of a session command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandStatus {
    pub success: bool,
    pub message: String,
}

impl CommandStatus {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Whether a scale command multiplies the current scale or replaces it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleMode {
    Apply,
    Set,
}

/// Configuration, palette and at most one loaded model
#[derive(Debug)]
pub struct Session {
    config: ModelConfig,
    palette: Palette,
    model: Option<Model>,
}

impl Session {
    /// Start a session, loading the configured palette
    ///
    /// A palette that cannot be read is logged and replaced by an empty one,
    /// so every opaque color falls back to the default symbol.
    pub fn new(config: ModelConfig) -> Self {
        let palette = config.load_palette().unwrap_or_else(|err| {
            error!("Failed to load palette {}: {}", config.palette_path.display(), err);
            Palette::empty(config.default_symbol.as_str())
        });
        Self::with_palette(config, palette)
    }

    pub fn with_palette(config: ModelConfig, palette: Palette) -> Self {
        Self {
            config,
            palette,
            model: None,
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    /// Load a model, replacing the current one only on success
    pub fn load(&mut self, path: impl AsRef<Path>) -> CommandStatus {
        let path = self.config.resolve_model_path(path.as_ref());
        let result = Model::load(
            &path,
            &self.config.texture_roots(),
            self.config.precision,
            self.config.view_mode,
        );
        self.finish_load(&path, result)
    }

    /// Load a model from bytes already read from `path`
    pub fn load_bytes(&mut self, path: impl AsRef<Path>, bytes: &[u8]) -> CommandStatus {
        let path = path.as_ref();
        let result = Model::from_bytes(
            path,
            bytes,
            &self.config.texture_roots(),
            self.config.precision,
            self.config.view_mode,
        );
        self.finish_load(path, result)
    }

    fn finish_load(&mut self, path: &Path, result: crate::Result<Model>) -> CommandStatus {
        match result {
            Ok(model) => {
                let status = CommandStatus::ok(format!(
                    "Loaded {} ({}, {} triangles).",
                    path.display(),
                    model.mesh().format.name(),
                    model.mesh().triangle_count()
                ));
                info!("{}", status.message);
                self.model = Some(model);
                status
            }
            Err(err) => {
                error!("Failed to load {}: {}", path.display(), err);
                CommandStatus::failed(format!("Failed to load {}: {}", path.display(), err))
            }
        }
    }

    /// Compose a rotation in degrees about X, then Y, then Z
    pub fn rotate(&mut self, x: f32, y: f32, z: f32) -> CommandStatus {
        let degrees = Vec3::new(x, y, z);
        self.with_model(&[x, y, z], |model| {
            model.apply_rotation(degrees);
            format!("Rotated by ({x}, {y}, {z}) degrees.")
        })
    }

    /// Replace the rotation with one of `(x, y, z)` degrees
    pub fn set_rotation(&mut self, x: f32, y: f32, z: f32) -> CommandStatus {
        let degrees = Vec3::new(x, y, z);
        self.with_model(&[x, y, z], |model| {
            model.set_rotation(degrees);
            format!("Rotation set to ({x}, {y}, {z}) degrees.")
        })
    }

    pub fn rotate_axis(&mut self, axis: Axis, degrees: f32) -> CommandStatus {
        self.with_model(&[degrees], |model| {
            model.rotate_axis(axis, degrees);
            format!("Rotated {degrees} degrees about {axis}.")
        })
    }

    pub fn scale(&mut self, mode: ScaleMode, x: f32, y: f32, z: f32) -> CommandStatus {
        let factors = Vec3::new(x, y, z);
        self.with_model(&[x, y, z], |model| {
            match mode {
                ScaleMode::Apply => model.apply_scale(factors),
                ScaleMode::Set => model.set_scale(factors),
            }
            let s = model.transform().scale();
            format!("Scale is now ({}, {}, {}).", s.x, s.y, s.z)
        })
    }

    pub fn scale_uniform(&mut self, mode: ScaleMode, factor: f32) -> CommandStatus {
        self.scale(mode, factor, factor, factor)
    }

    /// Scale one axis, leaving the others as they are
    pub fn scale_axis(&mut self, mode: ScaleMode, axis: Axis, factor: f32) -> CommandStatus {
        let Some(model) = &self.model else {
            return CommandStatus::failed(NO_MODEL);
        };
        let mut factors = match mode {
            ScaleMode::Apply => Vec3::ONE,
            ScaleMode::Set => model.transform().scale(),
        };
        match axis {
            Axis::X => factors.x = factor,
            Axis::Y => factors.y = factor,
            Axis::Z => factors.z = factor,
        }
        if !factor.is_finite() {
            return CommandStatus::failed("Arguments must be finite numbers.");
        }
        self.scale(mode, factors.x, factors.y, factors.z)
    }

    pub fn move_direction(&mut self, direction: Direction, distance: f32) -> CommandStatus {
        let step = direction.step().as_vec3();
        if let Some(status) = self.reject_destination(step, distance) {
            return status;
        }
        self.with_model(&[distance], |model| {
            model.translate(step, distance);
            format!("Moved {distance} {direction}.")
        })
    }

    /// Move `distance` units along `direction` (normalized)
    pub fn move_vector(&mut self, direction: Vec3, distance: f32) -> CommandStatus {
        if direction.length_squared() == 0.0 {
            return CommandStatus::failed("Direction must not be zero.");
        }
        if let Some(status) = self.reject_destination(direction, distance) {
            return status;
        }
        self.with_model(&[direction.x, direction.y, direction.z, distance], |model| {
            model.translate(direction, distance);
            let p = model.transform().position();
            format!("Moved to ({}, {}, {}).", p.x, p.y, p.z)
        })
    }

    pub fn move_axis(&mut self, axis: Axis, distance: f32) -> CommandStatus {
        if let Some(status) = self.reject_destination(axis.unit(), distance) {
            return status;
        }
        self.with_model(&[distance], |model| {
            model.translate(axis.unit(), distance);
            format!("Moved {distance} along {axis}.")
        })
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) -> CommandStatus {
        self.with_model(&[], |model| {
            model.set_view_mode(mode);
            format!("View mode is now {mode}.")
        })
    }

    /// Commit the model's footprint into `target` at its world position
    pub fn place<T: VoxelTarget + ?Sized>(&mut self, target: &mut T) -> CommandStatus {
        let Some(model) = self.model.as_mut() else {
            return CommandStatus::failed(NO_MODEL);
        };
        let report = model.place(target, &self.palette);
        let message = format!("Placed {} voxels.", report.written);
        if report.is_complete() {
            CommandStatus::ok(message)
        } else {
            CommandStatus::failed(format!("{message} {} writes failed.", report.failed))
        }
    }

    /// Undo the last placement into `target`
    pub fn undo<T: VoxelTarget + ?Sized>(&mut self, target: &mut T) -> CommandStatus {
        let Some(model) = self.model.as_ref() else {
            return CommandStatus::failed(NO_MODEL);
        };
        if model.ledger().is_empty() {
            return CommandStatus::ok("Nothing to undo.");
        }
        let report = model.undo(target);
        let message = format!("Restored {} voxels.", report.written);
        if report.is_complete() {
            CommandStatus::ok(message)
        } else {
            CommandStatus::failed(format!("{message} {} writes failed.", report.failed))
        }
    }

    /// A failed status when a finite move would leave the cell range
    fn reject_destination(&self, direction: Vec3, distance: f32) -> Option<CommandStatus> {
        let model = self.model.as_ref()?;
        if !(direction.is_finite() && distance.is_finite()) {
            return None;
        }
        let destination = model.transform().translated(direction, distance);
        (!is_addressable(destination)).then(|| CommandStatus::failed(OUT_OF_RANGE))
    }

    /// Run `command` on the model after checking `args` are finite
    fn with_model(
        &mut self,
        args: &[f32],
        command: impl FnOnce(&mut Model) -> String,
    ) -> CommandStatus {
        let Some(model) = self.model.as_mut() else {
            return CommandStatus::failed(NO_MODEL);
        };
        if args.iter().any(|a| !a.is_finite()) {
            return CommandStatus::failed("Arguments must be finite numbers.");
        }
        CommandStatus::ok(command(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::MemoryWorld;
    use crate::transform::Transform;

    const TRIANGLE_STL: &str = "\
solid tri
facet normal 0 0 1
outer loop
vertex 0 0 0
vertex 4 0 0
vertex 0 0 4
endloop
endfacet
endsolid tri
";

    fn session() -> Session {
        Session::with_palette(ModelConfig::default(), Palette::empty("stone"))
    }

    fn loaded() -> Session {
        let mut session = session();
        let status = session.load_bytes("tri.stl", TRIANGLE_STL.as_bytes());
        assert!(status.success, "{}", status.message);
        session
    }

    #[test]
    fn test_commands_without_model() {
        let mut session = session();
        let mut world = MemoryWorld::new();
        for status in [
            session.rotate(1.0, 2.0, 3.0),
            session.scale_uniform(ScaleMode::Set, 2.0),
            session.scale_axis(ScaleMode::Apply, Axis::X, 2.0),
            session.move_axis(Axis::Y, 1.0),
            session.move_direction(Direction::Up, 1.0),
            session.set_view_mode(ViewMode::Voxels),
            session.place(&mut world),
            session.undo(&mut world),
        ] {
            assert!(!status.success);
            assert_eq!(status.message, "No model is loaded.");
        }
    }

    #[test]
    fn test_failed_load_keeps_previous_model() {
        let mut session = loaded();
        let status = session.load_bytes("scene.fbx", b"whatever");
        assert!(!status.success);
        assert!(status.message.contains("unsupported"));
        assert_eq!(
            session.model().map(|m| m.path().to_path_buf()),
            Some("tri.stl".into())
        );
    }

    #[test]
    fn test_non_finite_arguments_are_rejected() {
        let mut session = loaded();
        let before = *session.model().map(Model::transform).expect("model");
        assert!(!session.rotate(f32::NAN, 0.0, 0.0).success);
        assert!(!session.scale(ScaleMode::Set, 1.0, f32::INFINITY, 1.0).success);
        assert!(!session.scale_axis(ScaleMode::Set, Axis::Z, f32::NAN).success);
        assert!(!session.move_vector(Vec3::X, f32::NEG_INFINITY).success);
        assert!(!session.move_vector(Vec3::ZERO, 1.0).success);
        assert_eq!(session.model().map(Model::transform), Some(&before));
    }

    #[test]
    fn test_scale_commands() {
        let mut session = loaded();
        assert!(session.scale_uniform(ScaleMode::Set, 2.0).success);
        assert!(session.scale_axis(ScaleMode::Apply, Axis::Y, 3.0).success);
        assert!(session.scale_axis(ScaleMode::Set, Axis::Z, -1.0).success);
        let scale = session.model().map(|m| m.transform().scale());
        assert_eq!(scale, Some(Vec3::new(2.0, 6.0, 0.0)));
    }

    #[test]
    fn test_move_commands() {
        let mut session = loaded();
        session.move_direction(Direction::North, 2.0);
        session.move_axis(Axis::X, -1.5);
        session.move_vector(Vec3::new(0.0, 10.0, 0.0), 3.0);
        let position = session.model().map(|m| m.transform().position());
        assert_eq!(position, Some(Vec3::new(-1.5, 3.0, -2.0)));
    }

    #[test]
    fn test_moves_past_the_cell_range_are_rejected() {
        let mut session = loaded();
        let before = *session.model().map(Model::transform).expect("model");
        for status in [
            session.move_axis(Axis::X, 3.0e9),
            session.move_direction(Direction::Down, 3.0e9),
            session.move_vector(Vec3::new(1.0, 0.0, 1.0), -1.0e10),
        ] {
            assert!(!status.success);
            assert_eq!(status.message, OUT_OF_RANGE);
        }
        assert_eq!(session.model().map(Model::transform), Some(&before));
    }

    #[test]
    fn test_place_near_the_edge_of_the_cell_range() {
        let mut session = loaded();
        // 2^31 - 128, exactly representable
        assert!(session.move_axis(Axis::X, 2_147_483_520.0).success);
        assert!(session.scale_uniform(ScaleMode::Set, 100.0).success);

        let mut world = MemoryWorld::new();
        let status = session.place(&mut world);
        assert!(!status.success);
        assert!(status.message.contains("writes failed"), "{}", status.message);
        assert!(!world.is_empty());

        assert!(session.undo(&mut world).success);
        assert!(world.is_empty());
    }

    #[test]
    fn test_set_rotation_replaces_rotation() {
        let mut session = loaded();
        assert!(session.rotate(0.0, 45.0, 0.0).success);
        assert!(session.set_rotation(0.0, 90.0, 0.0).success);
        let mut expected = Transform::new();
        expected.apply_rotation(Vec3::new(0.0, 90.0, 0.0));
        let rotation = session.model().map(|m| m.transform().rotation());
        assert_eq!(rotation, Some(expected.rotation()));
        assert!(!session.set_rotation(0.0, f32::NAN, 0.0).success);
    }

    #[test]
    fn test_place_and_undo() {
        let mut session = loaded();
        let mut world = MemoryWorld::new();
        assert_eq!(session.undo(&mut world).message, "Nothing to undo.");

        let status = session.place(&mut world);
        assert!(status.success, "{}", status.message);
        assert!(!world.is_empty());

        let status = session.undo(&mut world);
        assert!(status.success);
        assert!(world.is_empty());
    }

    #[test]
    fn test_partial_place_is_reported() {
        let mut session = loaded();
        let mut world = MemoryWorld::with_bounds(glam::IVec3::ZERO, glam::IVec3::splat(100));
        let status = session.place(&mut world);
        assert!(!status.success);
        assert!(status.message.contains("writes failed"));
    }
}
