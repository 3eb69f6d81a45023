use std::mem;

use serde::{Deserialize, Serialize};

/// Enum representing the type of piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[repr(u8)]
pub enum PieceKind {
    /// I-piece.
    I = 0,
    /// O-piece.
    O = 1,
    /// S-piece.
    S = 2,
    /// Z-piece.
    Z = 3,
    /// J-piece.
    J = 4,
    /// L-piece.
    L = 5,
    /// T-piece.
    T = 6,
}

impl PieceKind {
    /// Number of piece types (7).
    pub const LEN: usize = 7;

    /// All piece kinds, in declaration order.
    pub const ALL: [Self; Self::LEN] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
        PieceKind::T,
    ];

    /// Returns the single character representation of this piece kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockfall_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::I.as_char(), 'I');
    /// assert_eq!(PieceKind::T.as_char(), 'T');
    /// ```
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            PieceKind::I => 'I',
            PieceKind::O => 'O',
            PieceKind::S => 'S',
            PieceKind::Z => 'Z',
            PieceKind::J => 'J',
            PieceKind::L => 'L',
            PieceKind::T => 'T',
        }
    }

    /// Parses a piece kind from a single character.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockfall_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_char('I'), Some(PieceKind::I));
    /// assert_eq!(PieceKind::from_char('X'), None);
    /// ```
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'I' => Some(PieceKind::I),
            'O' => Some(PieceKind::O),
            'S' => Some(PieceKind::S),
            'Z' => Some(PieceKind::Z),
            'J' => Some(PieceKind::J),
            'L' => Some(PieceKind::L),
            'T' => Some(PieceKind::T),
            _ => None,
        }
    }

    /// Side of the square the piece rotates in (4 for I, 2 for O, 3 otherwise).
    const fn rotation_size(self) -> usize {
        match self {
            PieceKind::I => 4,
            PieceKind::O => 2,
            _ => 3,
        }
    }
}

/// A single filled cell.
///
/// Minos are owned values: a piece owns four of them while it falls and hands
/// each one over to the board when it locks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mino {
    kind: PieceKind,
}

impl Mino {
    #[must_use]
    pub const fn new(kind: PieceKind) -> Self {
        Self { kind }
    }

    #[must_use]
    pub const fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub const fn as_char(&self) -> char {
        self.kind.as_char()
    }
}

/// 4×4 occupancy grid of a piece at its current rotation.
pub type PieceGrid = [[Option<Mino>; 4]; 4];

/// Rotation state of a piece.
///
/// - `0`: spawn orientation
/// - `1`: 90° clockwise
/// - `2`: 180°
/// - `3`: 270° clockwise (90° counterclockwise)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PieceRotation(u8);

impl PieceRotation {
    #[must_use]
    pub fn rotated_cw(self) -> Self {
        PieceRotation((self.0 + 1) % 4)
    }

    #[must_use]
    pub fn rotated_ccw(self) -> Self {
        PieceRotation((self.0 + 3) % 4)
    }

    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }
}

/// A falling piece: its kind, rotation state and the minos it owns.
///
/// The grid is rotated in place, so the same four minos travel with the piece
/// from spawn to lock.
///
/// # Example
///
/// ```
/// use blockfall_engine::{Piece, PieceKind};
///
/// let mut piece = Piece::new(PieceKind::T);
/// piece.rotate_cw();
/// assert_eq!(piece.occupied_cells().count(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    kind: PieceKind,
    rotation: PieceRotation,
    grid: PieceGrid,
}

impl Piece {
    #[must_use]
    pub fn new(kind: PieceKind) -> Self {
        let shape = SPAWN_SHAPES[kind as usize];
        let grid = shape.map(|row| row.map(|filled| filled.then(|| Mino::new(kind))));
        Self {
            kind,
            rotation: PieceRotation::default(),
            grid,
        }
    }

    #[must_use]
    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub fn rotation(&self) -> PieceRotation {
        self.rotation
    }

    #[must_use]
    pub fn grid(&self) -> &PieceGrid {
        &self.grid
    }

    /// Returns the `(dx, dy)` grid coordinates of the occupied cells.
    pub fn occupied_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.grid.iter().enumerate().flat_map(|(dy, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(dx, cell)| cell.as_ref().map(|_| (dx, dy)))
        })
    }

    pub fn rotate_cw(&mut self) {
        let size = self.kind.rotation_size();
        let mut rotated = PieceGrid::default();
        for (y, row) in rotated.iter_mut().enumerate().take(size) {
            for (x, cell) in row.iter_mut().enumerate().take(size) {
                *cell = mem::take(&mut self.grid[size - 1 - x][y]);
            }
        }
        self.grid = rotated;
        self.rotation = self.rotation.rotated_cw();
    }

    pub fn rotate_ccw(&mut self) {
        let size = self.kind.rotation_size();
        let mut rotated = PieceGrid::default();
        for (y, row) in rotated.iter_mut().enumerate().take(size) {
            for (x, cell) in row.iter_mut().enumerate().take(size) {
                *cell = mem::take(&mut self.grid[x][size - 1 - y]);
            }
        }
        self.grid = rotated;
        self.rotation = self.rotation.rotated_ccw();
    }

    /// Consumes the piece, yielding each mino with its `(dx, dy)` grid coordinates.
    pub fn into_minos(self) -> impl Iterator<Item = (usize, usize, Mino)> {
        self.grid.into_iter().enumerate().flat_map(|(dy, row)| {
            row.into_iter()
                .enumerate()
                .filter_map(move |(dx, cell)| cell.map(|mino| (dx, dy, mino)))
        })
    }
}

/// Spawn orientation of each piece inside its 4×4 grid.
const SPAWN_SHAPES: [[[bool; 4]; 4]; PieceKind::LEN] = {
    const C: bool = true;
    const E: bool = false;
    const EEEE: [bool; 4] = [E; 4];
    [
        // I-piece
        [EEEE, [C, C, C, C], EEEE, EEEE],
        // O-piece
        [[C, C, E, E], [C, C, E, E], EEEE, EEEE],
        // S-piece
        [[E, C, C, E], [C, C, E, E], EEEE, EEEE],
        // Z-piece
        [[C, C, E, E], [E, C, C, E], EEEE, EEEE],
        // J-piece
        [[C, E, E, E], [C, C, C, E], EEEE, EEEE],
        // L-piece
        [[E, E, C, E], [C, C, C, E], EEEE, EEEE],
        // T-piece
        [[E, C, E, E], [C, C, C, E], EEEE, EEEE],
    ]
};

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(piece: &Piece) -> Vec<(usize, usize)> {
        piece.occupied_cells().collect()
    }

    #[test]
    fn test_piece_area_is_invariant_under_rotation() {
        for kind in PieceKind::ALL {
            let mut piece = Piece::new(kind);
            for _ in 0..4 {
                assert_eq!(piece.occupied_cells().count(), 4, "{kind:?}");
                piece.rotate_cw();
            }
            for _ in 0..4 {
                assert_eq!(piece.occupied_cells().count(), 4, "{kind:?}");
                piece.rotate_ccw();
            }
        }
    }

    #[test]
    fn test_four_rotations_return_to_spawn() {
        for kind in PieceKind::ALL {
            let spawn = Piece::new(kind);
            let mut piece = spawn.clone();
            for _ in 0..4 {
                piece.rotate_cw();
            }
            assert_eq!(piece, spawn);
        }
    }

    #[test]
    fn test_ccw_undoes_cw() {
        for kind in PieceKind::ALL {
            let spawn = Piece::new(kind);
            let mut piece = spawn.clone();
            piece.rotate_cw();
            piece.rotate_ccw();
            assert_eq!(piece, spawn);
        }
    }

    #[test]
    fn test_i_piece_vertical_column() {
        let mut piece = Piece::new(PieceKind::I);
        piece.rotate_cw();
        assert_eq!(piece.rotation().as_u8(), 1);
        assert_eq!(cells(&piece), vec![(2, 0), (2, 1), (2, 2), (2, 3)]);

        let mut piece = Piece::new(PieceKind::I);
        piece.rotate_ccw();
        assert_eq!(piece.rotation().as_u8(), 3);
        assert_eq!(cells(&piece), vec![(1, 0), (1, 1), (1, 2), (1, 3)]);
    }

    #[test]
    fn test_o_piece_rotation_is_identity() {
        let spawn = Piece::new(PieceKind::O);
        let mut piece = spawn.clone();
        piece.rotate_cw();
        assert_eq!(cells(&piece), cells(&spawn));
    }

    #[test]
    fn test_into_minos_moves_every_cell() {
        let piece = Piece::new(PieceKind::T);
        let minos: Vec<_> = piece.into_minos().collect();
        assert_eq!(minos.len(), 4);
        assert!(minos.iter().all(|(_, _, m)| m.kind() == PieceKind::T));
        assert_eq!(
            minos.iter().map(|&(dx, dy, _)| (dx, dy)).collect::<Vec<_>>(),
            vec![(1, 0), (0, 1), (1, 1), (2, 1)]
        );
    }

    #[test]
    fn test_piece_kind_char_conversion() {
        for kind in PieceKind::ALL {
            assert_eq!(PieceKind::from_char(kind.as_char()), Some(kind));
        }
        assert_eq!(PieceKind::from_char('x'), None);
        assert_eq!(PieceKind::from_char('g'), None);
    }
}
