//! Cells of the 3×3 grid.

use serde::{Deserialize, Serialize};

/// A cell of the grid, indexed 0–8 in row-major order.
///
/// The variant order here is the enumeration order of
/// [`rules`](crate::rules) and therefore the tie-break order of the search
/// engine — it must stay row-major, top-left first.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
)]
#[serde(into = "u8", try_from = "u8")]
pub enum Cell {
    /// Index 0.
    TopLeft,
    /// Index 1.
    TopCenter,
    /// Index 2.
    TopRight,
    /// Index 3.
    MiddleLeft,
    /// Index 4.
    Center,
    /// Index 5.
    MiddleRight,
    /// Index 6.
    BottomLeft,
    /// Index 7.
    BottomCenter,
    /// Index 8.
    BottomRight,
}

impl Cell {
    /// Row-major board index (0–8).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Creates a cell from a row-major index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::all().get(index).copied()
    }

    /// All nine cells in row-major order.
    pub fn all() -> &'static [Cell; 9] {
        const ALL: [Cell; 9] = [
            Cell::TopLeft,
            Cell::TopCenter,
            Cell::TopRight,
            Cell::MiddleLeft,
            Cell::Center,
            Cell::MiddleRight,
            Cell::BottomLeft,
            Cell::BottomCenter,
            Cell::BottomRight,
        ];
        &ALL
    }
}

impl From<Cell> for u8 {
    fn from(cell: Cell) -> u8 {
        cell.index() as u8
    }
}

impl TryFrom<u8> for Cell {
    type Error = parlor_core::IllegalMove;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Cell::from_index(value as usize).ok_or(parlor_core::IllegalMove::CellOutOfRange(value))
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.index())
    }
}
