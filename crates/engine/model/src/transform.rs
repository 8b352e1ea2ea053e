//! Rigid transform applied to a loaded model
//!
//! Rotation and scale form the local matrix; position is kept apart as a
//! world-space offset applied only when voxels are placed, so local geometry
//! and the voxel cache never depend on where the model sits.

use crate::geometry::BoundingBox;
use glam::{IVec3, Mat4, Quat, Vec3};
use std::fmt;
use std::str::FromStr;

/// A principal axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }
}

impl FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            _ => Err(format!("unknown axis '{s}', expected x, y or z")),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        })
    }
}

/// A named world direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
    East,
    West,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::Up,
        Direction::Down,
    ];

    /// Unit step; north is -Z and east is +X
    pub fn step(self) -> IVec3 {
        match self {
            Direction::North => IVec3::new(0, 0, -1),
            Direction::South => IVec3::new(0, 0, 1),
            Direction::East => IVec3::new(1, 0, 0),
            Direction::West => IVec3::new(-1, 0, 0),
            Direction::Up => IVec3::new(0, 1, 0),
            Direction::Down => IVec3::new(0, -1, 0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Direction::ALL
            .into_iter()
            .find(|d| d.name() == lower)
            .ok_or_else(|| format!("unknown direction '{s}'"))
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Position, rotation and non-negative per-axis scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// `Rotation · Scale`; position is not included
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_quat(self.rotation) * Mat4::from_scale(self.scale)
    }

    /// Integer voxel offset of the world position
    pub fn world_offset(&self) -> IVec3 {
        self.position.floor().as_ivec3()
    }

    /// Compose a rotation of `degrees` about X, then Y, then Z onto the
    /// current rotation
    ///
    /// Each angle is negated before composing, so positive angles turn the
    /// model clockwise when viewed down the axis.
    pub fn apply_rotation(&mut self, degrees: Vec3) {
        let radians = -degrees * (std::f32::consts::PI / 180.0);
        self.rotation = (self.rotation
            * Quat::from_rotation_x(radians.x)
            * Quat::from_rotation_y(radians.y)
            * Quat::from_rotation_z(radians.z))
        .normalize();
    }

    /// Replace the rotation with one built from `degrees` alone
    pub fn set_rotation(&mut self, degrees: Vec3) {
        self.rotation = Quat::IDENTITY;
        self.apply_rotation(degrees);
    }

    pub fn rotate_axis(&mut self, axis: Axis, degrees: f32) {
        self.apply_rotation(axis.unit() * degrees);
    }

    /// Multiply the current scale per component, clamping at zero
    pub fn apply_scale(&mut self, factors: Vec3) {
        self.scale = (self.scale * factors).max(Vec3::ZERO);
    }

    /// Replace the scale, clamping each component at zero
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale.max(Vec3::ZERO);
    }

    /// Move `distance` units along `direction` (normalized first)
    pub fn translate(&mut self, direction: Vec3, distance: f32) {
        self.position = self.translated(direction, distance);
    }

    /// Position `translate` would move to
    pub fn translated(&self, direction: Vec3, distance: f32) -> Vec3 {
        self.position + direction.normalize_or_zero() * distance
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Axis-aligned box around `bounds` after rotation and scale
    pub fn transformed_bounds(&self, bounds: &BoundingBox) -> BoundingBox {
        bounds.transformed(&self.matrix())
    }
}
