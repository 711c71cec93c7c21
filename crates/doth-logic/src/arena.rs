//! Arena layout: named safe spots and the stack spots pairs start from.
//!
//! Safe spots are the eight places players run to after reassignment:
//! four corners plus an inner and outer spot on each of the east and west
//! walls. Pairs stand closer in, one flexible spot on each diagonal with
//! its static partner pushed outward along the x axis.
//!
//! ```
//! use doth_logic::arena::{ArenaLayout, SafeSpot};
//! use doth_logic::geometry::Quadrant;
//!
//! let layout = ArenaLayout::default();
//! let nw = layout.spot(SafeSpot::NorthWest);
//! assert!(nw.x < 0.0 && nw.y > 0.0);
//! assert!(layout.static_spot(Quadrant::NorthEast).x > layout.flex_spot(Quadrant::NorthEast).x);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{Quadrant, Vec2};

/// A named safe spot on the arena edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SafeSpot {
    NorthWest,
    SouthWest,
    NorthEast,
    SouthEast,
    WestOuter,
    WestInner,
    EastOuter,
    EastInner,
}

impl SafeSpot {
    pub const ALL: [SafeSpot; 8] = [
        SafeSpot::NorthWest,
        SafeSpot::SouthWest,
        SafeSpot::NorthEast,
        SafeSpot::SouthEast,
        SafeSpot::WestOuter,
        SafeSpot::WestInner,
        SafeSpot::EastOuter,
        SafeSpot::EastInner,
    ];

    pub fn short_name(self) -> &'static str {
        match self {
            SafeSpot::NorthWest => "NW",
            SafeSpot::SouthWest => "SW",
            SafeSpot::NorthEast => "NE",
            SafeSpot::SouthEast => "SE",
            SafeSpot::WestOuter => "W_OUTER",
            SafeSpot::WestInner => "W_INNER",
            SafeSpot::EastOuter => "E_OUTER",
            SafeSpot::EastInner => "E_INNER",
        }
    }
}

impl fmt::Display for SafeSpot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Distances that define the arena's spot coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaLayout {
    /// |x| of the inner east/west spots.
    pub inner: f32,
    /// |x| of the outer east/west spots.
    pub outer: f32,
    /// |x| of the corner spots.
    pub corner_x: f32,
    /// |y| of the corner spots.
    pub corner_y: f32,
    /// Distance of a flexible stack spot from centre along each axis.
    pub flex_offset: f32,
    /// Outward x offset of a static spot from its flexible partner.
    pub static_offset: f32,
}

impl Default for ArenaLayout {
    fn default() -> Self {
        Self {
            inner: 4.25,
            outer: 6.62,
            corner_x: 4.40,
            corner_y: 5.05,
            flex_offset: std::f32::consts::SQRT_2,
            static_offset: std::f32::consts::FRAC_1_SQRT_2,
        }
    }
}

impl ArenaLayout {
    /// Coordinates of a named safe spot.
    pub fn spot(&self, spot: SafeSpot) -> Vec2 {
        match spot {
            SafeSpot::NorthWest => Vec2::new(-self.corner_x, self.corner_y),
            SafeSpot::SouthWest => Vec2::new(-self.corner_x, -self.corner_y),
            SafeSpot::NorthEast => Vec2::new(self.corner_x, self.corner_y),
            SafeSpot::SouthEast => Vec2::new(self.corner_x, -self.corner_y),
            SafeSpot::WestOuter => Vec2::new(-self.outer, 0.0),
            SafeSpot::WestInner => Vec2::new(-self.inner, 0.0),
            SafeSpot::EastOuter => Vec2::new(self.outer, 0.0),
            SafeSpot::EastInner => Vec2::new(self.inner, 0.0),
        }
    }

    /// Starting spot of a pair's flexible member.
    pub fn flex_spot(&self, quadrant: Quadrant) -> Vec2 {
        self.flex_offset * quadrant.signs()
    }

    /// Starting spot of a pair's static member.
    pub fn static_spot(&self, quadrant: Quadrant) -> Vec2 {
        let signs = quadrant.signs();
        self.flex_spot(quadrant) + Vec2::new(self.static_offset * signs.x, 0.0)
    }
}
