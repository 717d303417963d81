//! Geometry helpers for dirty-region tracking and display rotation.

use std::fmt;

use crate::error::SurfaceError;

/// Axis-aligned rectangle in buffer pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Horizontal position of the top-left corner
    pub x: i32,
    /// Vertical position of the top-left corner
    pub y: i32,
    /// Width of the rectangle
    pub w: i32,
    /// Height of the rectangle
    pub h: i32,
}

impl Rect {
    /// Create a new rectangle from its top-left corner and size.
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Rect {
        Rect { x, y, w, h }
    }

    /// Create a rectangle of the given size anchored at the origin.
    pub fn from_size(w: i32, h: i32) -> Rect {
        Rect { x: 0, y: 0, w, h }
    }

    /// Returns true if the rectangle covers no pixels.
    pub fn is_empty(self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// Smallest rectangle covering both `self` and `other`.
    ///
    /// An empty rectangle does not contribute to the result.
    pub fn merge(self, other: Rect) -> Rect {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.w).max(other.x + other.w);
        let bottom = (self.y + self.h).max(other.y + other.h);
        Rect {
            x,
            y,
            w: right - x,
            h: bottom - y,
        }
    }

    /// Returns true if `other` lies entirely within `self`.
    ///
    /// An empty rectangle is contained in everything.
    pub fn contains(self, other: Rect) -> bool {
        if other.is_empty() {
            return true;
        }
        !self.is_empty()
            && other.x >= self.x
            && other.y >= self.y
            && other.x + other.w <= self.x + self.w
            && other.y + other.h <= self.y + self.h
    }
}

/// Clockwise rotation of a display relative to its natural orientation.
///
/// Only the four quarter-turn steps exist; window management refers to them
/// by their raw step index on the wire, convertible via [`TryFrom<u32>`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    /// Natural orientation of the display
    #[default]
    Rotation0,
    /// 90 degree rotation
    Rotation90,
    /// 180 degree rotation
    Rotation180,
    /// 270 degree rotation
    Rotation270,
}

impl Rotation {
    /// Symbolic name of this rotation step.
    pub fn name(self) -> &'static str {
        match self {
            Rotation::Rotation0 => "ROTATION_0",
            Rotation::Rotation90 => "ROTATION_90",
            Rotation::Rotation180 => "ROTATION_180",
            Rotation::Rotation270 => "ROTATION_270",
        }
    }

    /// The rotation angle in degrees.
    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Rotation0 => 0,
            Rotation::Rotation90 => 90,
            Rotation::Rotation180 => 180,
            Rotation::Rotation270 => 270,
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u32> for Rotation {
    type Error = SurfaceError;

    fn try_from(raw: u32) -> Result<Rotation, SurfaceError> {
        match raw {
            0 => Ok(Rotation::Rotation0),
            1 => Ok(Rotation::Rotation90),
            2 => Ok(Rotation::Rotation180),
            3 => Ok(Rotation::Rotation270),
            _ => Err(SurfaceError::InvalidArgument("invalid rotation step")),
        }
    }
}
