use std::mem;

use super::piece::{Mino, PieceGrid, PieceKind};

/// Number of columns on the board.
pub const WIDTH: usize = 10;
/// Number of rows on the board, hidden rows included.
pub const HEIGHT: usize = 22;
/// Rows above the visible playing field. They are never drawn but take part in collision.
pub const HIDDEN_ROWS: usize = 2;
/// Number of rows that are drawn.
pub const VISIBLE_HEIGHT: usize = HEIGHT - HIDDEN_ROWS;

#[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub(crate) const COLUMNS: i32 = WIDTH as i32;

/// Board column of grid column `dx` for a piece at column offset `x`, if it is
/// on the board.
pub(crate) fn board_column(x: i32, dx: usize) -> Option<usize> {
    let dx = i32::try_from(dx).ok()?;
    usize::try_from(x + dx).ok().filter(|&col| col < WIDTH)
}

/// A single row of the board.
pub type MatrixRow = [Option<Mino>; WIDTH];

/// Error returned when a board dump cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum AsciiParseError {
    #[display("expected {} rows, got {found}", HEIGHT)]
    RowCount { found: usize },
    #[display("row {row}: expected {} cells, got {found}", WIDTH)]
    RowWidth { row: usize, found: usize },
    #[display("row {row}, column {col}: unexpected character {ch:?}")]
    InvalidCell { row: usize, col: usize, ch: char },
}

/// The board buffer: a 10×22 grid of owned cells.
///
/// Row 0 is the top hidden row, row 21 is the bottom row. Cells outside the
/// grid horizontally or below it count as occupied for collision purposes.
///
/// # Example
///
/// ```
/// use blockfall_engine::{Matrix, Piece, PieceKind};
///
/// let board = Matrix::new();
/// let piece = Piece::new(PieceKind::O);
///
/// assert!(!board.has_collision(piece.grid(), 3, 2));
/// // The O piece occupies the two leftmost grid columns.
/// assert!(board.has_collision(piece.grid(), -1, 2));
/// assert!(board.has_collision(piece.grid(), 3, 21));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matrix {
    rows: [MatrixRow; HEIGHT],
}

impl Matrix {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn cell(&self, col: usize, row: usize) -> Option<&Mino> {
        self.rows[row][col].as_ref()
    }

    #[must_use]
    pub fn is_occupied(&self, col: usize, row: usize) -> bool {
        self.rows[row][col].is_some()
    }

    #[must_use]
    pub fn row(&self, row: usize) -> &MatrixRow {
        &self.rows[row]
    }

    /// Returns an iterator over the drawn rows (hidden rows excluded).
    pub fn visible_rows(&self) -> impl Iterator<Item = &MatrixRow> {
        self.rows[HIDDEN_ROWS..].iter()
    }

    /// Puts a mino into a cell, returning the mino that occupied it before.
    pub fn place(&mut self, col: usize, row: usize, mino: Mino) -> Option<Mino> {
        self.rows[row][col].replace(mino)
    }

    /// Checks whether `grid` placed with its origin at `(x, y)` overlaps
    /// anything.
    ///
    /// Grid cells left of column 0, right of the last column or below the last
    /// row collide. At least one grid column must stay on the board
    /// (`-4 < x < WIDTH`) and `y` must be a board row.
    #[must_use]
    pub fn has_collision(&self, grid: &PieceGrid, x: i32, y: usize) -> bool {
        debug_assert!(x + 3 >= 0 && x < COLUMNS, "column offset {x} off the board");
        debug_assert!(y < HEIGHT, "row offset {y} off the board");

        for (row, grid_row) in (y..).zip(grid) {
            for (col, cell) in (x..).zip(grid_row) {
                if cell.is_some() && self.is_blocked(col, row) {
                    return true;
                }
            }
        }
        false
    }

    fn is_blocked(&self, col: i32, row: usize) -> bool {
        let Ok(col) = usize::try_from(col) else {
            return true;
        };
        if col >= WIDTH || row >= HEIGHT {
            return true;
        }
        self.is_occupied(col, row)
    }

    #[must_use]
    pub fn is_row_filled(&self, row: usize) -> bool {
        self.rows[row].iter().all(Option::is_some)
    }

    /// Empties every cell of a row in place, without moving other rows.
    pub fn clear_row(&mut self, row: usize) {
        self.rows[row] = MatrixRow::default();
    }

    /// Removes the given rows and lets everything above them fall into the gap.
    ///
    /// Rows are processed from the bottom up; each kept row moves down by the
    /// number of removed rows below it, and the top is refilled with empty rows.
    pub fn remove_rows(&mut self, removed: &[usize]) {
        let mut count = 0;
        for y in (0..HEIGHT).rev() {
            if removed.contains(&y) {
                count += 1;
                continue;
            }
            if count > 0 {
                self.rows[y + count] = mem::take(&mut self.rows[y]);
            }
        }
        self.rows[..count].fill_with(MatrixRow::default);
    }

    /// Parses a board dump: one line per row, one character per cell,
    /// `.` for an empty cell and a piece letter for a filled one.
    pub fn from_ascii(text: &str) -> Result<Self, AsciiParseError> {
        let lines: Vec<&str> = text.lines().collect();
        if lines.len() != HEIGHT {
            return Err(AsciiParseError::RowCount { found: lines.len() });
        }

        let mut matrix = Self::new();
        for (row, line) in lines.iter().enumerate() {
            let found = line.chars().count();
            if found != WIDTH {
                return Err(AsciiParseError::RowWidth { row, found });
            }
            for (col, ch) in line.chars().enumerate() {
                if ch == '.' {
                    continue;
                }
                let kind =
                    PieceKind::from_char(ch).ok_or(AsciiParseError::InvalidCell { row, col, ch })?;
                matrix.place(col, row, Mino::new(kind));
            }
        }
        Ok(matrix)
    }

    /// Writes the board in the format accepted by [`Self::from_ascii`].
    #[must_use]
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(HEIGHT * (WIDTH + 1));
        for row in &self.rows {
            for cell in row {
                out.push(cell.as_ref().map_or('.', Mino::as_char));
            }
            out.push('\n');
        }
        out
    }
}
