//! Geometry primitives: positions, snap points, and item descriptors.
//!
//! These are pure value types — structural equality, no I/O, no behavior
//! beyond the derived properties a caller needs to place and measure items.

use serde::{Deserialize, Serialize};

/// A point in bin-local coordinates. `x` is the width axis, `y` the length
/// axis, `z` the height axis. `rotation` is preserved for interop with
/// downstream consumers but the engine itself never rotates an item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i64,
    pub y: i64,
    pub z: i64,
    #[serde(default)]
    pub rotation: i32,
}

impl Position {
    pub fn new(x: i64, y: i64, z: i64) -> Self {
        Self {
            x,
            y,
            z,
            rotation: 0,
        }
    }

    pub fn offset(&self, dx: i64, dy: i64, dz: i64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
            rotation: self.rotation,
        }
    }
}

/// Which edge of the prospective item the snap point anchors.
///
/// `Right` anchors the item's left edge at `x` (the item extends to the
/// right); `Left` anchors the item's right edge at `x` (the item extends to
/// the left).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapDirection {
    Left,
    Right,
}

impl SnapDirection {
    pub fn toggle(self) -> Self {
        match self {
            SnapDirection::Left => SnapDirection::Right,
            SnapDirection::Right => SnapDirection::Left,
        }
    }
}

/// A candidate anchor point for placing the next item, computed from a
/// bin's heightmap. See [`crate::bin::Bin::get_snappoints`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Snappoint {
    pub x: i64,
    pub y: i64,
    pub z: i64,
    pub direction: SnapDirection,
}

impl Snappoint {
    pub fn new(x: i64, y: i64, z: i64, direction: SnapDirection) -> Self {
        Self { x, y, z, direction }
    }

    /// Translate this snap point into the corner position of an item of the
    /// given width anchored here.
    pub fn anchor_position(&self, item_width: i64) -> Position {
        match self.direction {
            SnapDirection::Right => Position::new(self.x, self.y, self.z),
            SnapDirection::Left => Position::new(self.x - item_width, self.y, self.z),
        }
    }
}

/// An input descriptor: dimensions, weight, and a requested count. Articles
/// are expanded into `amount` [`crate::item::Item::Single`] instances before
/// packing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub id: String,
    pub width: i64,
    pub length: i64,
    pub height: i64,
    #[serde(default)]
    pub weight: f64,
    pub amount: u32,
}

impl Article {
    /// `(w, l, h)` must all be positive and `amount` must be at least 1.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.length > 0 && self.height > 0 && self.amount >= 1 && self.weight >= 0.0
    }
}
