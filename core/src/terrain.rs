//! Static terrain grid shared read-only by the world, its entities and renderers.

use std::{error::Error, fmt};

use serde::{Deserialize, Serialize};

use crate::{Direction, Position};

/// Kind of terrain occupying a single grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainCell {
    /// Open air that provides no support.
    #[default]
    Empty,
    /// Solid block that supports rabbits standing above it and blocks walking.
    Solid,
    /// Slope rising from the bottom-left corner to the top-right corner (`/`).
    SlopeUpRight,
    /// Slope rising from the bottom-right corner to the top-left corner (`\`).
    SlopeUpLeft,
}

impl TerrainCell {
    /// Resolves the terrain represented by a level glyph, if any.
    #[must_use]
    pub const fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            ' ' => Some(Self::Empty),
            '#' => Some(Self::Solid),
            '/' => Some(Self::SlopeUpRight),
            '\\' => Some(Self::SlopeUpLeft),
            _ => None,
        }
    }

    /// Glyph used for the cell in level text and rendered frames.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Empty => ' ',
            Self::Solid => '#',
            Self::SlopeUpRight => '/',
            Self::SlopeUpLeft => '\\',
        }
    }

    /// Reports whether the cell is a solid block.
    #[must_use]
    pub const fn is_solid(self) -> bool {
        matches!(self, Self::Solid)
    }

    /// Reports whether the cell is either slope orientation.
    #[must_use]
    pub const fn is_slope(self) -> bool {
        self.rise().is_some()
    }

    /// Horizontal direction in which a slope rises, `None` for non-slopes.
    #[must_use]
    pub const fn rise(self) -> Option<Direction> {
        match self {
            Self::SlopeUpRight => Some(Direction::Right),
            Self::SlopeUpLeft => Some(Direction::Left),
            Self::Empty | Self::Solid => None,
        }
    }

    /// Reports whether the cell is a slope a rabbit facing `facing` would climb.
    #[must_use]
    pub fn rises_towards(self, facing: Direction) -> bool {
        self.rise() == Some(facing)
    }

    /// Reports whether the cell stops a rabbit walking into it while facing `facing`.
    ///
    /// Solid blocks always stop a rabbit. A slope stops it when its raised side
    /// faces the rabbit, which makes the slope behave like a wall.
    #[must_use]
    pub fn blocks(self, facing: Direction) -> bool {
        self.is_solid() || self.rise() == Some(facing.opposite())
    }
}

/// Dense, row-major grid of terrain cells.
///
/// Lookups outside the grid read as [`TerrainCell::Empty`], so levels are open
/// at their edges.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Terrain {
    columns: u32,
    rows: u32,
    cells: Vec<TerrainCell>,
}

impl Terrain {
    /// Builds a terrain grid from rows of cells, rejecting empty or ragged input.
    pub fn from_rows(rows: Vec<Vec<TerrainCell>>) -> Result<Self, TerrainError> {
        let expected = rows.first().map_or(0, Vec::len);
        if expected == 0 {
            return Err(TerrainError::Empty);
        }

        let mut cells = Vec::with_capacity(expected * rows.len());
        for (row, cells_in_row) in rows.iter().enumerate() {
            if cells_in_row.len() != expected {
                return Err(TerrainError::RaggedRow {
                    row,
                    expected,
                    found: cells_in_row.len(),
                });
            }
            cells.extend_from_slice(cells_in_row);
        }

        let columns = u32::try_from(expected).map_err(|_| TerrainError::TooLarge)?;
        let rows = u32::try_from(rows.len()).map_err(|_| TerrainError::TooLarge)?;
        Ok(Self {
            columns,
            rows,
            cells,
        })
    }

    /// Creates a grid of the provided dimensions filled with a single cell kind.
    pub fn filled(columns: u32, rows: u32, cell: TerrainCell) -> Result<Self, TerrainError> {
        if columns == 0 || rows == 0 {
            return Err(TerrainError::Empty);
        }
        let width = usize::try_from(columns).map_err(|_| TerrainError::TooLarge)?;
        let height = usize::try_from(rows).map_err(|_| TerrainError::TooLarge)?;
        let capacity = width.checked_mul(height).ok_or(TerrainError::TooLarge)?;
        Ok(Self {
            columns,
            rows,
            cells: vec![cell; capacity],
        })
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Reports whether the position lies inside the grid.
    #[must_use]
    pub const fn contains(&self, position: Position) -> bool {
        position.column() < self.columns && position.row() < self.rows
    }

    /// Terrain at the provided position, [`TerrainCell::Empty`] outside the grid.
    #[must_use]
    pub fn cell(&self, position: Position) -> TerrainCell {
        self.index(position)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or_default()
    }

    /// Terrain at an optional position; a missing position reads as empty.
    #[must_use]
    pub fn cell_at(&self, position: Option<Position>) -> TerrainCell {
        position.map_or(TerrainCell::Empty, |position| self.cell(position))
    }

    /// Iterator over the grid rows from top to bottom.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[TerrainCell]> {
        let width = usize::try_from(self.columns).unwrap_or(0).max(1);
        self.cells.chunks(width)
    }

    fn index(&self, position: Position) -> Option<usize> {
        if !self.contains(position) {
            return None;
        }
        let row = usize::try_from(position.row()).ok()?;
        let column = usize::try_from(position.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        Some(row * width + column)
    }
}

/// Reasons a terrain grid cannot be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerrainError {
    /// The grid has no rows or its first row has no cells.
    Empty,
    /// A row's length differs from the first row's length.
    RaggedRow {
        /// Zero-based index of the offending row.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },
    /// The grid dimensions do not fit the coordinate type.
    TooLarge,
}

impl fmt::Display for TerrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "terrain grid is empty"),
            Self::RaggedRow {
                row,
                expected,
                found,
            } => write!(
                f,
                "terrain row {row} has {found} cells but the first row has {expected}"
            ),
            Self::TooLarge => write!(f, "terrain grid is too large"),
        }
    }
}

impl Error for TerrainError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&str]) -> Terrain {
        Terrain::from_rows(
            rows.iter()
                .map(|row| {
                    row.chars()
                        .map(|glyph| TerrainCell::from_glyph(glyph).expect("terrain glyph"))
                        .collect()
                })
                .collect(),
        )
        .expect("valid terrain")
    }

    #[test]
    fn lookups_outside_grid_read_as_empty() {
        let terrain = grid(&["##", "##"]);

        assert_eq!(terrain.cell(Position::new(1, 1)), TerrainCell::Solid);
        assert_eq!(terrain.cell(Position::new(2, 0)), TerrainCell::Empty);
        assert_eq!(terrain.cell(Position::new(0, 2)), TerrainCell::Empty);
        assert_eq!(terrain.cell_at(None), TerrainCell::Empty);
    }

    #[test]
    fn filled_grid_covers_every_cell() {
        let terrain = Terrain::filled(2, 3, TerrainCell::Solid).expect("valid terrain");

        assert_eq!(terrain.columns(), 2);
        assert_eq!(terrain.rows(), 3);
        assert_eq!(terrain.iter_rows().count(), 3);
        assert!(terrain
            .iter_rows()
            .all(|row| row == [TerrainCell::Solid, TerrainCell::Solid]));
        assert_eq!(terrain.cell(Position::new(1, 2)), TerrainCell::Solid);
    }

    #[test]
    fn filled_grid_needs_both_dimensions() {
        assert_eq!(
            Terrain::filled(0, 3, TerrainCell::Empty),
            Err(TerrainError::Empty)
        );
        assert_eq!(
            Terrain::filled(3, 0, TerrainCell::Empty),
            Err(TerrainError::Empty)
        );
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let error = Terrain::from_rows(vec![
            vec![TerrainCell::Empty; 3],
            vec![TerrainCell::Empty; 2],
        ])
        .expect_err("ragged rows must be rejected");

        assert_eq!(
            error,
            TerrainError::RaggedRow {
                row: 1,
                expected: 3,
                found: 2,
            }
        );
    }

    #[test]
    fn empty_grid_is_rejected() {
        assert_eq!(Terrain::from_rows(Vec::new()), Err(TerrainError::Empty));
        assert_eq!(
            Terrain::from_rows(vec![Vec::new()]),
            Err(TerrainError::Empty)
        );
    }

    #[test]
    fn slopes_block_only_from_their_raised_side() {
        assert!(TerrainCell::SlopeUpLeft.blocks(Direction::Right));
        assert!(!TerrainCell::SlopeUpLeft.blocks(Direction::Left));
        assert!(TerrainCell::SlopeUpRight.blocks(Direction::Left));
        assert!(!TerrainCell::SlopeUpRight.blocks(Direction::Right));
        assert!(TerrainCell::Solid.blocks(Direction::Left));
        assert!(!TerrainCell::Empty.blocks(Direction::Right));
    }

    #[test]
    fn rows_iterate_top_to_bottom() {
        let terrain = grid(&["# ", " /"]);
        let rows: Vec<String> = terrain
            .iter_rows()
            .map(|row| row.iter().map(|cell| cell.glyph()).collect())
            .collect();

        assert_eq!(rows, vec!["# ".to_owned(), " /".to_owned()]);
    }
}
