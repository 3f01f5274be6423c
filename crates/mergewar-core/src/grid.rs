//! The fixed rectangular arena grid.
//!
//! Rows `0..GRID_ROWS / 2` are enemy territory (upper half), the rest belong
//! to the player. Grid cells convert to continuous coordinates one-to-one:
//! cell `(x, y)` sits at position `(x, y)`.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Number of columns.
pub const GRID_COLS: i32 = 7;

/// Number of rows.
pub const GRID_ROWS: i32 = 8;

/// First row of the player half.
pub const PLAYER_FIRST_ROW: i32 = GRID_ROWS / 2;

/// Last row of the enemy half.
pub const ENEMY_LAST_ROW: i32 = PLAYER_FIRST_ROW - 1;

/// An integer grid coordinate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridCell {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl GridCell {
    /// Creates a cell.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns `true` if the cell lies on the grid.
    #[must_use]
    pub const fn in_bounds(self) -> bool {
        self.x >= 0 && self.x < GRID_COLS && self.y >= 0 && self.y < GRID_ROWS
    }

    /// Returns `true` if the row belongs to the enemy half.
    #[must_use]
    pub const fn is_enemy_half(self) -> bool {
        self.y < PLAYER_FIRST_ROW
    }

    /// Continuous position at the cell's origin.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_position(self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }

    /// Player-half cells in recruitment fill order: bottom row first, left to
    /// right within a row.
    pub fn player_fill_order() -> impl Iterator<Item = Self> {
        (PLAYER_FIRST_ROW..GRID_ROWS)
            .rev()
            .flat_map(|y| (0..GRID_COLS).map(move |x| Self::new(x, y)))
    }
}

impl fmt::Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halves_split_at_middle_row() {
        assert!(GridCell::new(0, 0).is_enemy_half());
        assert!(GridCell::new(6, 3).is_enemy_half());
        assert!(!GridCell::new(0, 4).is_enemy_half());
        assert!(!GridCell::new(6, 7).is_enemy_half());
    }

    #[test]
    fn bounds_check() {
        assert!(GridCell::new(0, 0).in_bounds());
        assert!(GridCell::new(6, 7).in_bounds());
        assert!(!GridCell::new(7, 7).in_bounds());
        assert!(!GridCell::new(0, 8).in_bounds());
        assert!(!GridCell::new(-1, 5).in_bounds());
    }

    #[test]
    fn fill_order_starts_bottom_left() {
        let cells: Vec<_> = GridCell::player_fill_order().collect();
        assert_eq!(cells.len(), 28);
        assert_eq!(cells[0], GridCell::new(0, 7));
        assert_eq!(cells[1], GridCell::new(1, 7));
        assert_eq!(cells[7], GridCell::new(0, 6));
        assert_eq!(*cells.last().unwrap(), GridCell::new(6, 4));
    }

    #[test]
    fn position_matches_cell() {
        assert_eq!(GridCell::new(3, 5).to_position(), Vec2::new(3.0, 5.0));
    }
}
