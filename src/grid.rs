use anyhow::{bail, ensure, Result};

use crate::piece::{Piece, ShapeKind};

/// Largest row or column count. Coordinates are `i16`.
pub const MAX_DIMENSION: usize = i16::MAX as usize;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cell {
    Empty,
    Filled(ShapeKind),
}

impl Cell {
    pub fn is_filled(self) -> bool {
        self != Cell::Empty
    }
}

/// Locked blocks, indexed `cells[y][x]` with row 0 at the top.
///
/// Dimensions are fixed at construction. Rows above the grid (`y < 0`) are
/// open space a piece may occupy while it spawns.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Grid {
    cells: Vec<Vec<Cell>>,
    cols: usize,
}

impl Grid {
    /// Empty grid. Dimensions above `MAX_DIMENSION` are clamped to it.
    pub fn new(rows: usize, cols: usize) -> Self {
        let (rows, cols) = (rows.min(MAX_DIMENSION), cols.min(MAX_DIMENSION));
        Self {
            cells: vec![vec![Cell::Empty; cols]; rows],
            cols,
        }
    }

    /// Builds a grid from explicit rows. Fails on ragged rows or on a side
    /// longer than `MAX_DIMENSION`.
    pub fn from_rows(cells: Vec<Vec<Cell>>) -> Result<Self> {
        let cols = cells.first().map_or(0, Vec::len);
        ensure!(
            cells.len() <= MAX_DIMENSION && cols <= MAX_DIMENSION,
            "grid of {}x{} exceeds {} cells per side",
            cells.len(),
            cols,
            MAX_DIMENSION
        );
        if let Some(y) = cells.iter().position(|row| row.len() != cols) {
            bail!("row {} has {} cells, expected {}", y, cells[y].len(), cols);
        }
        Ok(Self { cells, cols })
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cells(&self) -> &[Vec<Cell>] {
        &self.cells
    }

    /// Cell at `(x, y)`, or `None` outside the grid.
    pub fn get(&self, x: i16, y: i16) -> Option<Cell> {
        let (x, y) = self.index(x, y)?;
        Some(self.cells[y][x])
    }

    /// Writes `cell` at `(x, y)`. Returns false and leaves the grid untouched
    /// when the coordinates are outside the grid.
    pub fn set(&mut self, x: i16, y: i16, cell: Cell) -> bool {
        match self.index(x, y) {
            Some((x, y)) => {
                self.cells[y][x] = cell;
                true
            }
            None => false,
        }
    }

    fn index(&self, x: i16, y: i16) -> Option<(usize, usize)> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        (x < self.cols && y < self.rows()).then_some((x, y))
    }

    /// True for walls, the floor, and filled cells. Space above row 0 is open.
    pub fn is_occupied(&self, x: i16, y: i16) -> bool {
        if x < 0 || x as usize >= self.cols || (y >= 0 && y as usize >= self.rows()) {
            return true;
        }
        if y < 0 {
            return false;
        }
        self.cells[y as usize][x as usize].is_filled()
    }

    /// Writes the piece's blocks into the grid. Blocks above row 0 are dropped.
    pub fn lock(&mut self, piece: &Piece) {
        let cell = Cell::Filled(piece.kind);
        for block in piece.blocks() {
            if block.y >= 0 {
                self.set(block.x, block.y, cell);
            }
        }
    }

    pub fn is_row_complete(&self, y: usize) -> bool {
        self.cells
            .get(y)
            .is_some_and(|row| row.iter().all(|cell| cell.is_filled()))
    }

    /// Removes every complete row and pushes the same number of empty rows in
    /// at the top. Surviving rows keep their order and contents.
    pub fn clear_full_rows(&mut self) -> usize {
        let rows = self.rows();
        self.cells.retain(|row| !row.iter().all(|cell| cell.is_filled()));
        let cleared = rows - self.cells.len();
        if cleared > 0 {
            let mut compacted = vec![vec![Cell::Empty; self.cols]; cleared];
            compacted.append(&mut self.cells);
            self.cells = compacted;
        }
        cleared
    }

    pub fn filled_count_in_row(&self, y: usize) -> usize {
        self.cells
            .get(y)
            .map_or(0, |row| row.iter().filter(|cell| cell.is_filled()).count())
    }

    pub fn total_filled_cells(&self) -> usize {
        self.cells.iter().flatten().filter(|cell| cell.is_filled()).count()
    }

    pub fn clear(&mut self) {
        for row in &mut self.cells {
            row.fill(Cell::Empty);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walls_and_floor_are_occupied() {
        let grid = Grid::new(20, 10);
        assert!(grid.is_occupied(-1, 5));
        assert!(grid.is_occupied(10, 5));
        assert!(grid.is_occupied(3, 20));
        assert!(!grid.is_occupied(0, 0));
        assert!(!grid.is_occupied(9, 19));
    }

    #[test]
    fn space_above_top_is_open() {
        let grid = Grid::new(20, 10);
        assert!(!grid.is_occupied(4, -1));
        assert!(!grid.is_occupied(4, -3));
        // walls still extend upwards
        assert!(grid.is_occupied(-1, -1));
    }

    #[test]
    fn from_rows_rejects_ragged_rows() {
        let rows = vec![vec![Cell::Empty; 10], vec![Cell::Empty; 3]];
        assert!(Grid::from_rows(rows).is_err());

        let grid = Grid::from_rows(vec![vec![Cell::Empty; 4]; 6]).unwrap();
        assert_eq!((grid.rows(), grid.cols()), (6, 4));
        assert!(grid.is_occupied(4, 1));
        assert!(!grid.is_occupied(3, 5));
    }

    #[test]
    fn oversized_grid_is_clamped() {
        let grid = Grid::new(40_000, 10);
        assert_eq!(grid.rows(), MAX_DIMENSION);
        assert!(!grid.is_occupied(0, 0));
        assert!(!grid.is_occupied(9, i16::MAX - 1));

        let wide = vec![vec![Cell::Empty; MAX_DIMENSION + 1]];
        assert!(Grid::from_rows(wide).is_err());
    }

    #[test]
    fn set_rejects_out_of_range() {
        let mut grid = Grid::new(4, 4);
        assert!(!grid.set(4, 0, Cell::Filled(ShapeKind::T)));
        assert!(!grid.set(0, -1, Cell::Filled(ShapeKind::T)));
        assert_eq!(grid.total_filled_cells(), 0);
    }

    #[test]
    fn lock_skips_blocks_above_grid() {
        let mut grid = Grid::new(20, 10);
        // I spans rows -1..=2 at this anchor
        let piece = Piece::new_at(ShapeKind::I, 3, 0);
        grid.lock(&piece);
        assert_eq!(grid.total_filled_cells(), 3);
        assert_eq!(grid.get(3, 0), Some(Cell::Filled(ShapeKind::I)));
    }

    #[test]
    fn clear_keeps_order_of_survivors() {
        let mut grid = Grid::new(5, 4);
        grid.set(0, 1, Cell::Filled(ShapeKind::J));
        for x in 0..4 {
            grid.set(x, 2, Cell::Filled(ShapeKind::T));
            grid.set(x, 4, Cell::Filled(ShapeKind::T));
        }
        grid.set(1, 3, Cell::Filled(ShapeKind::L));

        assert_eq!(grid.clear_full_rows(), 2);
        assert_eq!(grid.rows(), 5);
        assert_eq!(grid.total_filled_cells(), 2);
        assert_eq!(grid.get(0, 3), Some(Cell::Filled(ShapeKind::J)));
        assert_eq!(grid.get(1, 4), Some(Cell::Filled(ShapeKind::L)));
        assert_eq!(grid.filled_count_in_row(0), 0);
        assert_eq!(grid.filled_count_in_row(1), 0);
    }
}
