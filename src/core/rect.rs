//! Axis-Aligned Boxes
//!
//! Hitboxes and hurtboxes. A [`Rect`] lives in world space and is rebuilt
//! every tick from the fighter's anchor and a [`LocalBox`] taken from the
//! move table.
//!
//! ```text
//!        y ▲
//!          │   ┌──────────┐ top = y + height
//!          │   │   Rect   │
//!          │   └──────────┘ y
//!          │   x          right = x + width
//!   ───────┼──────────────────────▶ x   (ground: y = 0)
//! ```

use std::fmt;
use serde::{Serialize, Deserialize};

use super::fixed::{Fixed, from_int, to_float};
use super::vec2::FixedVec2;

/// Horizontal facing of a fighter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Facing {
    /// Looking toward -X
    Left = 0,
    /// Looking toward +X
    Right = 1,
}

impl Facing {
    /// -1 for left, +1 for right.
    #[inline]
    pub fn sign(self) -> i32 {
        match self {
            Facing::Left => -1,
            Facing::Right => 1,
        }
    }
}

/// Axis-aligned rectangle in world space.
///
/// `(x, y)` is the minimum corner. Width and height are never negative.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: Fixed,
    /// Bottom edge
    pub y: Fixed,
    /// Extent along X (>= 0)
    pub width: Fixed,
    /// Extent along Y (>= 0)
    pub height: Fixed,
}

impl Rect {
    /// Create a rectangle. Negative extents collapse to zero.
    #[inline]
    pub fn new(x: Fixed, y: Fixed, width: Fixed, height: Fixed) -> Self {
        Self {
            x,
            y,
            width: width.max(0),
            height: height.max(0),
        }
    }

    /// Place a local box relative to an anchor, mirroring it for left-facing fighters.
    pub fn from_local(anchor: FixedVec2, local: &LocalBox, facing: Facing) -> Self {
        let width = from_int(local.width);
        let offset_x = from_int(local.x);
        let x = match facing {
            Facing::Right => anchor.x.wrapping_add(offset_x),
            // Mirror around the anchor: the box's right edge lands at anchor - offset.
            Facing::Left => anchor.x.wrapping_sub(offset_x).wrapping_sub(width),
        };
        Self::new(
            x,
            anchor.y.wrapping_add(from_int(local.y)),
            width,
            from_int(local.height),
        )
    }

    /// Right edge.
    #[inline]
    pub fn right(&self) -> Fixed {
        self.x.wrapping_add(self.width)
    }

    /// Top edge.
    #[inline]
    pub fn top(&self) -> Fixed {
        self.y.wrapping_add(self.height)
    }

    /// Horizontal centre.
    #[inline]
    pub fn center_x(&self) -> Fixed {
        self.x.wrapping_add(self.width >> 1)
    }

    /// Width of the shared span along X (0 when disjoint or touching).
    #[inline]
    pub fn overlap_width(&self, other: &Rect) -> Fixed {
        (self.right().min(other.right()) - self.x.max(other.x)).max(0)
    }

    /// Height of the shared span along Y (0 when disjoint or touching).
    #[inline]
    pub fn overlap_height(&self, other: &Rect) -> Fixed {
        (self.top().min(other.top()) - self.y.max(other.y)).max(0)
    }
}

impl fmt::Debug for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rect({:.1}, {:.1}, {:.1}x{:.1})",
            to_float(self.x),
            to_float(self.y),
            to_float(self.width),
            to_float(self.height)
        )
    }
}

/// Exact overlap test.
///
/// True only when the rectangles share positive area: boxes that touch along
/// an edge or at a corner do not overlap, and zero-area boxes never overlap
/// anything.
#[inline]
pub fn overlaps(a: &Rect, b: &Rect) -> bool {
    a.overlap_width(b) > 0 && a.overlap_height(b) > 0
}

/// A box authored relative to a fighter's anchor (feet centre), for a fighter
/// facing right. Whole world units; this is what move tables contain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LocalBox {
    /// Left edge offset from the anchor
    pub x: i32,
    /// Bottom edge offset from the anchor
    pub y: i32,
    /// Width (>= 0)
    pub width: i32,
    /// Height (>= 0)
    pub height: i32,
}

impl LocalBox {
    /// Create a local box.
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// A box of the given size standing on the anchor, centred horizontally.
    pub const fn centered(width: i32, height: i32) -> Self {
        Self {
            x: -(width / 2),
            y: 0,
            width,
            height,
        }
    }
}
