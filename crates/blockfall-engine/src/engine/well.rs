use std::{mem, ops::ControlFlow, time::Duration};

use arrayvec::ArrayVec;

use crate::core::{
    matrix::{
        AsciiParseError, COLUMNS, HEIGHT, HIDDEN_ROWS, Matrix, MatrixRow, WIDTH, board_column,
    },
    piece::{Piece, PieceKind},
};

use super::{
    animation::WellAnimation,
    config::WellConfig,
    event::{Observers, WellEvent, WellEventType},
    input::{Button, ButtonStates, InputEvent},
    timer::{Accumulator, AutoRepeat, Cooldown, Countdown, FRAME_DURATION, GRAVITY_20G},
};

const SPAWN_COLUMN: i32 = 3;
/// Spawn rows in the order they are tried: the default row first, then upward.
const SPAWN_ROWS: [usize; 3] = [2, 1, 0];
/// At most four rows can fill at once.
const MAX_CLEARED_ROWS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::IsVariant)]
pub enum WellState {
    #[display("no piece")]
    NoPiece,
    #[display("piece falling")]
    PieceFalling,
    #[display("line clear pending")]
    LineClearPending,
    #[display("game over")]
    GameOver,
}

/// Tag returned by the lock countdown when it runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LockRequest;

#[derive(Debug, Clone)]
struct ActivePiece {
    piece: Piece,
    x: i32,
    y: usize,
    ghost_y: usize,
}

/// The playfield: board, active piece, timers and the rules tying them together.
///
/// A `Well` is advanced one frame at a time with [`Well::update`]. It never
/// picks its own pieces; when it needs one it emits
/// [`WellEvent::NextRequested`] and waits for [`Well::add_piece`].
///
/// # Example
///
/// ```
/// use blockfall_engine::{Button, InputEvent, PieceKind, Well, WellConfig, WellEvent};
///
/// let mut well = Well::new(WellConfig::default());
/// well.add_piece(PieceKind::O);
/// assert_eq!(well.active_position(), Some((3, 2)));
///
/// well.update(&[InputEvent::press(Button::HardDrop)]);
/// assert!(well.active_piece().is_none());
/// assert_eq!(
///     well.take_events(),
///     vec![WellEvent::PieceLocked, WellEvent::NextRequested]
/// );
/// ```
#[derive(Debug)]
pub struct Well {
    config: WellConfig,
    matrix: Matrix,
    state: WellState,
    active: Option<ActivePiece>,

    keys: ButtonStates,
    previous_keys: ButtonStates,
    skip_gravity: bool,

    gravity: Accumulator,
    horizontal: AutoRepeat,
    softdrop: Cooldown,
    rotation: Cooldown,
    lock_countdown: Countdown<LockRequest>,

    pending_cleared_rows: ArrayVec<usize, MAX_CLEARED_ROWS>,
    animations: Vec<WellAnimation>,
    blocking_animations: Vec<WellAnimation>,

    observers: Observers,
    emitted: Vec<WellEvent>,
}

impl Default for Well {
    fn default() -> Self {
        Self::new(WellConfig::default())
    }
}

fn is_valid_column(x: i32) -> bool {
    x > -4 && x < COLUMNS
}

/// Searches for a nearby position where a freshly rotated piece fits.
///
/// Each floor (the current row, then one row up, then two for I) tries one
/// column right, one column left and, for I only, two columns either way.
fn find_wall_kick(matrix: &Matrix, piece: &Piece, x: i32, y: usize) -> Option<(i32, usize)> {
    let is_i = piece.kind() == PieceKind::I;
    let floors = if is_i { 3 } else { 2 };
    for floor in 0..floors {
        let Some(row) = y.checked_sub(floor) else {
            break;
        };
        let mut columns = ArrayVec::<i32, 4>::new();
        columns.push(x + 1);
        columns.push(x - 1);
        if is_i {
            if x + 2 < COLUMNS {
                columns.push(x + 2);
            }
            if x - 2 >= 0 {
                columns.push(x - 2);
            }
        }
        let found = columns
            .into_iter()
            .filter(|&col| is_valid_column(col))
            .find(|&col| !matrix.has_collision(piece.grid(), col, row));
        if let Some(col) = found {
            return Some((col, row));
        }
    }
    None
}

impl ActivePiece {
    fn new(piece: Piece, x: i32, y: usize, matrix: &Matrix) -> Self {
        let mut active = Self {
            piece,
            x,
            y,
            ghost_y: y,
        };
        active.calculate_ghost_offset(matrix);
        active
    }

    fn calculate_ghost_offset(&mut self, matrix: &Matrix) {
        let mut ghost_y = self.y;
        while ghost_y + 1 < HEIGHT && !matrix.has_collision(self.piece.grid(), self.x, ghost_y + 1)
        {
            ghost_y += 1;
        }
        self.ghost_y = ghost_y;
    }

    fn is_on_ground(&self, matrix: &Matrix) -> bool {
        self.y + 1 >= HEIGHT || matrix.has_collision(self.piece.grid(), self.x, self.y + 1)
    }
}

impl Well {
    #[must_use]
    pub fn new(config: WellConfig) -> Self {
        let gravity_delay = config.gravity_delay.max(GRAVITY_20G);
        Self {
            matrix: Matrix::new(),
            state: WellState::NoPiece,
            active: None,
            keys: ButtonStates::default(),
            previous_keys: ButtonStates::default(),
            skip_gravity: false,
            gravity: Accumulator::new(gravity_delay),
            horizontal: AutoRepeat::new(config.das_normal_delay, config.das_turbo_delay),
            softdrop: Cooldown::new(gravity_delay / 20),
            rotation: Cooldown::new(config.rotation_delay),
            lock_countdown: Countdown::new(config.lock_delay, LockRequest),
            pending_cleared_rows: ArrayVec::new(),
            animations: Vec::new(),
            blocking_animations: Vec::new(),
            observers: Observers::default(),
            emitted: Vec::new(),
            config: WellConfig {
                gravity_delay,
                ..config
            },
        }
    }

    /// Builds an empty-handed playfield over a board read from its text dump.
    pub fn from_ascii(text: &str, config: WellConfig) -> Result<Self, AsciiParseError> {
        let matrix = Matrix::from_ascii(text)?;
        let mut well = Self::new(config);
        well.matrix = matrix;
        Ok(well)
    }

    /// Dumps the board with the active piece in lowercase and its ghost as `g`.
    #[must_use]
    pub fn as_ascii(&self) -> String {
        let mut layer = [['.'; WIDTH]; HEIGHT];
        for (row, cells) in layer.iter_mut().enumerate() {
            for (col, ch) in cells.iter_mut().enumerate() {
                if let Some(mino) = self.matrix.cell(col, row) {
                    *ch = mino.as_char();
                }
            }
        }

        if let Some(active) = &self.active {
            let piece_char = active.piece.kind().as_char().to_ascii_lowercase();
            // ghost first, the piece is drawn over it
            for (origin, ch) in [(active.ghost_y, 'g'), (active.y, piece_char)] {
                for (dx, dy) in active.piece.occupied_cells() {
                    let Some(col) = board_column(active.x, dx) else {
                        continue;
                    };
                    if let Some(cells) = layer.get_mut(origin + dy) {
                        cells[col] = ch;
                    }
                }
            }
        }

        layer
            .iter()
            .flat_map(|row| row.iter().copied().chain(['\n']))
            .collect()
    }

    #[must_use]
    pub fn config(&self) -> &WellConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> WellState {
        self.state
    }

    #[must_use]
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &MatrixRow> {
        self.matrix.visible_rows()
    }

    #[must_use]
    pub fn active_piece(&self) -> Option<&Piece> {
        self.active.as_ref().map(|active| &active.piece)
    }

    /// Column and row offset of the active piece's grid origin.
    #[must_use]
    pub fn active_position(&self) -> Option<(i32, usize)> {
        self.active.as_ref().map(|active| (active.x, active.y))
    }

    #[must_use]
    pub fn ghost_row(&self) -> Option<usize> {
        self.active.as_ref().map(|active| active.ghost_y)
    }

    #[must_use]
    pub fn animations(&self) -> &[WellAnimation] {
        &self.animations
    }

    #[must_use]
    pub fn blocking_animations(&self) -> &[WellAnimation] {
        &self.blocking_animations
    }

    #[must_use]
    pub fn pending_cleared_rows(&self) -> &[usize] {
        &self.pending_cleared_rows
    }

    pub fn subscribe<F>(&mut self, event_type: WellEventType, observer: F)
    where
        F: FnMut(&WellEvent) + 'static,
    {
        self.observers.subscribe(event_type, observer);
    }

    /// Returns every event emitted since the last call, oldest first.
    pub fn take_events(&mut self) -> Vec<WellEvent> {
        mem::take(&mut self.emitted)
    }

    /// Changes the gravity delay, clamped to 20G. The soft drop rate follows.
    pub fn set_gravity(&mut self, delay: Duration) {
        let delay = delay.max(GRAVITY_20G);
        self.config.gravity_delay = delay;
        self.gravity.set_interval(delay);
        self.softdrop.set_interval(delay / 20);
    }

    /// Spawns a piece of the given kind.
    ///
    /// The piece goes to column 3 and the first free row among rows 2, 1 and 0.
    /// When all of them are blocked the piece is locked where it stands and the
    /// game is over.
    pub fn add_piece(&mut self, kind: PieceKind) {
        debug_assert!(
            self.state.is_no_piece(),
            "piece should never be added in state {}",
            self.state
        );

        let piece = Piece::new(kind);
        let spawn_row = SPAWN_ROWS
            .into_iter()
            .find(|&y| !self.matrix.has_collision(piece.grid(), SPAWN_COLUMN, y));

        if let Some(y) = spawn_row {
            tracing::debug!(?kind, row = y, "piece spawned");
            self.active = Some(ActivePiece::new(piece, SPAWN_COLUMN, y, &self.matrix));
            self.state = WellState::PieceFalling;
            return;
        }

        self.active = Some(ActivePiece {
            piece,
            x: SPAWN_COLUMN,
            y: 0,
            ghost_y: 0,
        });
        self.lock_and_release_piece();
        self.state = WellState::GameOver;
        tracing::info!(?kind, "spawn blocked, game over");
    }

    /// Takes the active piece off the board without locking it.
    pub fn release_piece(&mut self) -> Option<PieceKind> {
        let active = self.active.take()?;
        self.lock_countdown.stop();
        self.state = WellState::NoPiece;
        Some(active.piece.kind())
    }

    /// Advances the playfield by one frame.
    pub fn update(&mut self, inputs: &[InputEvent]) {
        self.update_animations();

        match self.state {
            WellState::GameOver => return,
            WellState::LineClearPending => {
                if self.blocking_animations.is_empty() {
                    self.remove_empty_rows();
                    self.lock_countdown.stop();
                    self.state = WellState::NoPiece;
                    self.emit(WellEvent::NextRequested);
                }
                return;
            }
            WellState::NoPiece | WellState::PieceFalling => {}
        }

        self.update_keys(inputs);
        if self.handle_button_edges(inputs).is_break() {
            return;
        }
        self.handle_held_keys();

        if self.active.is_none() {
            return;
        }
        self.update_gravity();
        self.update_lock_delay();
    }

    fn update_animations(&mut self) {
        for anim in &mut self.animations {
            anim.update(FRAME_DURATION);
        }
        self.animations.retain(WellAnimation::is_active);

        for anim in &mut self.blocking_animations {
            anim.update(FRAME_DURATION);
        }
        self.blocking_animations.retain(WellAnimation::is_active);
    }

    fn update_keys(&mut self, inputs: &[InputEvent]) {
        self.previous_keys = self.keys;
        for input in inputs {
            self.keys[input.button] = input.pressed;
        }
    }

    /// Resets DAS on a Left/Right release, then handles presses in order.
    ///
    /// A hold press on a falling piece ends the frame: the controller swaps
    /// the piece before anything else acts on it.
    fn handle_button_edges(&mut self, inputs: &[InputEvent]) -> ControlFlow<()> {
        // only a continuously held DOWN replaces gravity
        self.skip_gravity = self.keys[Button::Down] && self.previous_keys[Button::Down];

        if inputs
            .iter()
            .any(|input| !input.pressed && matches!(input.button, Button::Left | Button::Right))
        {
            self.horizontal.reset();
        }

        for input in inputs.iter().filter(|input| input.pressed) {
            match input.button {
                Button::HardDrop | Button::Up => {
                    self.hard_drop();
                    self.skip_gravity = true;
                }
                Button::Hold => {
                    self.emit(WellEvent::HoldRequested);
                    self.skip_gravity = true;
                    if self.active.is_some() {
                        return ControlFlow::Break(());
                    }
                }
                _ => {}
            }
        }
        ControlFlow::Continue(())
    }

    fn handle_held_keys(&mut self) {
        self.rotation.tick(FRAME_DURATION);
        if self.keys[Button::RotateA] != self.keys[Button::RotateB] && self.rotation.is_ready() {
            if self.keys[Button::RotateA] {
                self.rotate_ccw_now();
            } else {
                self.rotate_cw_now();
            }
            self.rotation.rearm();
        }

        self.horizontal.tick(FRAME_DURATION);
        if self.keys[Button::Left] != self.keys[Button::Right] && self.horizontal.is_ready() {
            if self.keys[Button::Left] {
                self.move_left_now();
            } else {
                self.move_right_now();
            }
            self.horizontal.repeat();
        }

        self.softdrop.tick(FRAME_DURATION);
        if self.keys[Button::Down] && self.softdrop.is_ready() {
            self.move_down_now();
            self.skip_gravity = true;
            self.softdrop.rearm();
        }
    }

    fn update_gravity(&mut self) {
        let steps = self.gravity.tick(FRAME_DURATION);
        if self.skip_gravity {
            return;
        }
        for _ in 0..steps {
            self.move_down_now();
        }
    }

    fn update_lock_delay(&mut self) {
        // gravity may have locked the piece already
        let Some(active) = &self.active else {
            return;
        };
        if active.is_on_ground(&self.matrix) {
            self.lock_countdown.start();
        } else {
            self.lock_countdown.stop();
        }
        if let Some(LockRequest) = self.lock_countdown.update(FRAME_DURATION) {
            self.lock_then_request_next();
        }
    }

    fn reset_input(&mut self) {
        self.horizontal.reset();
        self.keys.release_all();
    }

    pub fn move_left_now(&mut self) {
        self.shift_now(-1);
    }

    pub fn move_right_now(&mut self) {
        self.shift_now(1);
    }

    fn shift_now(&mut self, dx: i32) {
        let Some(active) = &mut self.active else {
            return;
        };
        let x = active.x + dx;
        if !is_valid_column(x) || self.matrix.has_collision(active.piece.grid(), x, active.y) {
            return;
        }
        active.x = x;
        self.after_player_move();
    }

    pub fn rotate_cw_now(&mut self) {
        self.rotate_now(Piece::rotate_cw, Piece::rotate_ccw);
    }

    pub fn rotate_ccw_now(&mut self) {
        self.rotate_now(Piece::rotate_ccw, Piece::rotate_cw);
    }

    fn rotate_now(&mut self, rotate: fn(&mut Piece), undo: fn(&mut Piece)) {
        let Some(active) = &mut self.active else {
            return;
        };
        rotate(&mut active.piece);
        if self
            .matrix
            .has_collision(active.piece.grid(), active.x, active.y)
        {
            let Some((x, y)) = find_wall_kick(&self.matrix, &active.piece, active.x, active.y)
            else {
                undo(&mut active.piece);
                return;
            };
            active.x = x;
            active.y = y;
        }
        self.after_player_move();
    }

    fn after_player_move(&mut self) {
        if let Some(active) = &mut self.active {
            active.calculate_ghost_offset(&self.matrix);
        }
        if self.config.lock_infinity {
            self.lock_countdown.stop();
        }
    }

    /// Moves the piece one row down. A grounded piece whose lock delay is
    /// already running locks on the spot, unless hard drop locks instantly.
    pub fn move_down_now(&mut self) {
        let Some(active) = &mut self.active else {
            return;
        };
        if !active.is_on_ground(&self.matrix) {
            active.y += 1;
            active.calculate_ghost_offset(&self.matrix);
        } else if !self.config.harddrop_locks_instantly && self.lock_countdown.is_running() {
            self.lock_then_request_next();
        }
    }

    pub fn hard_drop(&mut self) {
        let Some(active) = &mut self.active else {
            return;
        };
        active.y = active.ghost_y;
        self.move_down_now();
        if self.config.harddrop_locks_instantly && self.active.is_some() {
            self.lock_then_request_next();
        }
    }

    fn lock_then_request_next(&mut self) {
        self.lock_and_release_piece();
        if self.state.is_no_piece() {
            self.emit(WellEvent::NextRequested);
        }
    }

    /// Moves every mino of the active piece into the board.
    fn lock_and_release_piece(&mut self) {
        let ActivePiece { piece, x, y, .. } = self
            .active
            .take()
            .expect("lock should never happen without an active piece");

        let kind = piece.kind();
        for (dx, dy, mino) in piece.into_minos() {
            let row = y + dy;
            let Some(col) = board_column(x, dx) else {
                continue;
            };
            if row >= HEIGHT {
                continue;
            }
            self.matrix.place(col, row, mino);
            if row >= HIDDEN_ROWS {
                self.animations
                    .push(WellAnimation::cell_lock(row - HIDDEN_ROWS, col));
            }
        }
        tracing::debug!(?kind, x, y, "piece locked");

        self.lock_countdown.stop();
        self.emit(WellEvent::PieceLocked);
        self.check_lineclear();
    }

    fn check_lineclear(&mut self) {
        debug_assert!(self.active.is_none());

        for row in 0..HEIGHT {
            if self.matrix.is_row_filled(row) {
                self.pending_cleared_rows
                    .try_push(row)
                    .expect("more than four rows should never fill at once");
            }
        }

        if self.pending_cleared_rows.is_empty() {
            self.state = WellState::NoPiece;
            return;
        }

        for &row in &self.pending_cleared_rows {
            self.matrix.clear_row(row);
            if row >= HIDDEN_ROWS {
                self.blocking_animations
                    .push(WellAnimation::line_clear(row - HIDDEN_ROWS));
            }
        }
        tracing::debug!(rows = ?self.pending_cleared_rows, "rows filled");

        self.reset_input();
        self.state = WellState::LineClearPending;
    }

    fn remove_empty_rows(&mut self) {
        debug_assert!(!self.pending_cleared_rows.is_empty());

        let count = self.pending_cleared_rows.len();
        self.emit(WellEvent::LineClear { count });
        self.matrix.remove_rows(&self.pending_cleared_rows);
        self.pending_cleared_rows.clear();
    }

    fn emit(&mut self, event: WellEvent) {
        self.observers.notify(&event);
        self.emitted.push(event);
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::{
        core::piece::Mino,
        engine::{animation::AnimationKind, timer::frames},
    };

    fn lines(rows: &[&str]) -> String {
        rows.iter().map(|row| format!("{row}\n")).collect()
    }

    /// Board dump with `rows` at the bottom and empty rows above.
    fn board(rows: &[&str]) -> String {
        let mut all = vec![".........."; HEIGHT - rows.len()];
        all.extend_from_slice(rows);
        lines(&all)
    }

    fn run(well: &mut Well, frames: usize) {
        for _ in 0..frames {
            well.update(&[]);
        }
    }

    fn no_instant_lock() -> WellConfig {
        WellConfig {
            harddrop_locks_instantly: false,
            ..WellConfig::default()
        }
    }

    #[test]
    fn test_spawn_on_empty_board_uses_default_row() {
        let mut well = Well::default();
        well.add_piece(PieceKind::O);

        assert_eq!(well.state(), WellState::PieceFalling);
        assert_eq!(well.active_position(), Some((3, 2)));
        assert_eq!(well.ghost_row(), Some(20));

        let mut rows = vec![".........."; HEIGHT];
        rows[2] = "...oo.....";
        rows[3] = "...oo.....";
        rows[20] = "...gg.....";
        rows[21] = "...gg.....";
        assert_eq!(well.as_ascii(), lines(&rows));
    }

    #[test]
    fn test_spawn_moves_up_when_default_row_blocked() {
        let mut rows = vec![".........."; HEIGHT];
        rows[3] = "....Z.....";
        let mut well = Well::from_ascii(&lines(&rows), WellConfig::default()).unwrap();
        well.add_piece(PieceKind::O);

        assert_eq!(well.active_position(), Some((3, 1)));
        assert_eq!(well.ghost_row(), Some(1));
    }

    #[test]
    fn test_blocked_spawn_is_game_over() {
        let mut rows = vec!["....Z....."; HEIGHT];
        rows[0] = "..........";
        let mut well = Well::from_ascii(&lines(&rows), WellConfig::default()).unwrap();
        well.add_piece(PieceKind::O);

        assert_eq!(well.state(), WellState::GameOver);
        assert!(well.active_piece().is_none());
        assert_eq!(well.matrix().cell(3, 0).map(Mino::kind), Some(PieceKind::O));
        assert_eq!(well.matrix().cell(4, 1).map(Mino::kind), Some(PieceKind::O));
        assert_eq!(well.take_events(), vec![WellEvent::PieceLocked]);

        let before = well.as_ascii();
        well.update(&[InputEvent::press(Button::HardDrop)]);
        run(&mut well, 100);
        assert_eq!(well.as_ascii(), before);
        assert!(well.take_events().is_empty());
    }

    #[test]
    fn test_line_clear_waits_for_animation() {
        let text = board(&[".ZZZZZZZZZ", ".SSSSSSSSS"]);
        let mut well = Well::from_ascii(&text, WellConfig::default()).unwrap();
        well.add_piece(PieceKind::I);
        well.rotate_cw_now();
        for _ in 0..5 {
            well.move_left_now();
        }
        assert_eq!(well.active_position(), Some((-2, 2)));
        well.hard_drop();

        assert_eq!(well.state(), WellState::LineClearPending);
        assert_eq!(well.pending_cleared_rows(), &[20, 21]);
        assert_eq!(well.blocking_animations().len(), 2);
        assert!(well.matrix().row(21).iter().all(Option::is_none));
        assert_eq!(well.take_events(), vec![WellEvent::PieceLocked]);

        run(&mut well, 39);
        assert_eq!(well.state(), WellState::LineClearPending);
        assert!(well.take_events().is_empty());

        run(&mut well, 1);
        assert_eq!(well.state(), WellState::NoPiece);
        assert!(well.pending_cleared_rows().is_empty());
        assert_eq!(
            well.take_events(),
            vec![WellEvent::LineClear { count: 2 }, WellEvent::NextRequested]
        );
        assert_eq!(well.as_ascii(), board(&["I.........", "I........."]));
    }

    #[test]
    fn test_four_row_clear_in_shaft() {
        let text = board(&["ZZZZ.ZZZZZ"; 18]);
        let mut well = Well::from_ascii(&text, WellConfig::default()).unwrap();
        well.add_piece(PieceKind::I);
        well.move_left_now();
        well.rotate_cw_now();
        assert_eq!(well.active_position(), Some((2, 2)));
        assert_eq!(well.ghost_row(), Some(18));

        well.hard_drop();
        assert_eq!(well.pending_cleared_rows(), &[18, 19, 20, 21]);
        run(&mut well, 40);
        assert_eq!(
            well.take_events(),
            vec![
                WellEvent::PieceLocked,
                WellEvent::LineClear { count: 4 },
                WellEvent::NextRequested
            ]
        );
        assert_eq!(well.as_ascii(), board(&["ZZZZ.ZZZZZ"; 14]));
    }

    #[test]
    fn test_cell_lock_animations_use_visible_rows() {
        let mut well = Well::default();
        well.add_piece(PieceKind::O);
        well.hard_drop();

        let cells: Vec<_> = well
            .animations()
            .iter()
            .map(WellAnimation::kind)
            .collect();
        assert_eq!(
            cells,
            vec![
                AnimationKind::CellLock { row: 18, col: 3 },
                AnimationKind::CellLock { row: 18, col: 4 },
                AnimationKind::CellLock { row: 19, col: 3 },
                AnimationKind::CellLock { row: 19, col: 4 },
            ]
        );
        assert!(well.blocking_animations().is_empty());

        run(&mut well, 10);
        assert!(well.animations().is_empty());
    }

    #[test]
    fn test_rotation_kicks_off_right_wall() {
        let mut well = Well::default();
        well.add_piece(PieceKind::I);
        well.rotate_cw_now();
        for _ in 0..6 {
            well.move_right_now();
        }
        assert_eq!(well.active_position(), Some((7, 2)));

        let mut rotated = well.active_piece().unwrap().clone();
        rotated.rotate_cw();
        assert!(well.matrix().has_collision(rotated.grid(), 7, 2));

        well.rotate_cw_now();
        assert_eq!(well.active_position(), Some((6, 2)));
        assert_eq!(well.active_piece().unwrap().rotation().as_u8(), 2);
    }

    #[test]
    fn test_failed_rotation_is_reverted() {
        let text = board(&["ZZZZ.ZZZZZ"; 18]);
        let mut well = Well::from_ascii(&text, WellConfig::default()).unwrap();
        well.add_piece(PieceKind::I);
        well.move_left_now();
        well.rotate_cw_now();
        for _ in 0..4 {
            well.move_down_now();
        }
        assert_eq!(well.active_position(), Some((2, 6)));

        let before = well.as_ascii();
        well.rotate_cw_now();
        assert_eq!(well.as_ascii(), before);
        assert_eq!(well.active_piece().unwrap().rotation().as_u8(), 1);

        // horizontal either way round: nothing fits in the shaft
        well.rotate_ccw_now();
        assert_eq!(well.active_position(), Some((2, 6)));
        assert_eq!(well.active_piece().unwrap().rotation().as_u8(), 1);
        assert_eq!(well.as_ascii(), before);
    }

    #[test]
    fn test_wall_kick_candidates() {
        let mut floor = Matrix::new();
        for col in 0..WIDTH {
            floor.place(col, 21, Mino::new(PieceKind::Z));
        }
        // every column collides on the current row, one row up is free
        let o = Piece::new(PieceKind::O);
        assert_eq!(find_wall_kick(&floor, &o, 3, 20), Some((4, 19)));

        let mut post = Matrix::new();
        post.place(5, 1, Mino::new(PieceKind::Z));
        let i = Piece::new(PieceKind::I);
        assert_eq!(find_wall_kick(&post, &i, 3, 0), Some((1, 0)));
        // no two-column kicks for T, and no room above row 0
        let t = Piece::new(PieceKind::T);
        assert_eq!(find_wall_kick(&post, &t, 4, 0), None);

        let mut ceiling = Matrix::new();
        for col in 0..WIDTH {
            ceiling.place(col, 1, Mino::new(PieceKind::Z));
        }
        assert_eq!(find_wall_kick(&ceiling, &o, 3, 0), None);
    }

    #[test]
    fn test_soft_drop_replaces_gravity() {
        let mut well = Well::default();
        well.add_piece(PieceKind::O);

        well.update(&[InputEvent::press(Button::Down)]);
        assert_eq!(well.active_position(), Some((3, 3)));
        run(&mut well, 19);
        // gravity / 20 is a little over three frames, so one row every fourth frame
        assert_eq!(well.active_position(), Some((3, 7)));

        well.update(&[InputEvent::release(Button::Down)]);
        run(&mut well, 10);
        assert_eq!(well.active_position(), Some((3, 7)));
    }

    #[test]
    fn test_gravity_steps() {
        let mut well = Well::default();
        well.add_piece(PieceKind::T);
        run(&mut well, 63);
        assert_eq!(well.active_position(), Some((3, 2)));
        run(&mut well, 1);
        assert_eq!(well.active_position(), Some((3, 3)));

        well.set_gravity(Duration::ZERO);
        assert_eq!(well.config().gravity_delay, GRAVITY_20G);
        run(&mut well, 1);
        assert_eq!(well.active_position(), Some((3, 20)));
        assert!(well.active_piece().is_some());
    }

    #[test]
    fn test_soft_drop_follows_gravity_change() {
        let mut well = Well::default();
        well.add_piece(PieceKind::O);
        well.set_gravity(frames(20));

        well.update(&[InputEvent::press(Button::Down)]);
        assert_eq!(well.active_position(), Some((3, 3)));
        for row in 4..=10 {
            well.update(&[]);
            assert_eq!(well.active_position(), Some((3, row)));
        }
    }

    #[test]
    fn test_hold_press_ends_frame() {
        let mut well = Well::new(no_instant_lock());
        well.add_piece(PieceKind::T);
        well.hard_drop();
        run(&mut well, 29);
        assert_eq!(well.lock_countdown.remaining(), FRAME_DURATION);

        // the lock delay would run out this frame
        well.update(&[
            InputEvent::press(Button::RotateB),
            InputEvent::press(Button::Hold),
            InputEvent::press(Button::Left),
        ]);
        assert_eq!(well.take_events(), vec![WellEvent::HoldRequested]);
        assert_eq!(well.active_position(), Some((3, 20)));
        assert_eq!(well.active_piece().unwrap().rotation().as_u8(), 0);

        assert_eq!(well.release_piece(), Some(PieceKind::T));
        well.add_piece(PieceKind::J);
        well.update(&[]);
        assert_eq!(well.active_position(), Some((2, 2)));
        assert_eq!(well.active_piece().unwrap().rotation().as_u8(), 1);
    }

    #[test]
    fn test_horizontal_auto_repeat() {
        let mut well = Well::default();
        well.add_piece(PieceKind::T);
        let mut columns = Vec::new();
        well.update(&[InputEvent::press(Button::Left)]);
        columns.push(well.active_position().unwrap().0);
        for _ in 1..20 {
            well.update(&[]);
            columns.push(well.active_position().unwrap().0);
        }
        assert_eq!(columns[0], 2);
        assert_eq!(columns[13], 2);
        assert_eq!(columns[14], 1);
        assert_eq!(columns[17], 1);
        assert_eq!(columns[18], 0);
        assert_eq!(columns[19], 0);

        // releasing resets the repeat, so the new direction moves at once
        well.update(&[
            InputEvent::release(Button::Left),
            InputEvent::press(Button::Right),
        ]);
        assert_eq!(well.active_position().unwrap().0, 1);
    }

    #[test]
    fn test_rotation_throttle() {
        let mut well = Well::default();
        well.add_piece(PieceKind::T);
        let mut rotations = Vec::new();
        well.update(&[InputEvent::press(Button::RotateB)]);
        rotations.push(well.active_piece().unwrap().rotation().as_u8());
        for _ in 1..25 {
            well.update(&[]);
            rotations.push(well.active_piece().unwrap().rotation().as_u8());
        }
        assert_eq!(rotations[0], 1);
        assert_eq!(rotations[11], 1);
        assert_eq!(rotations[12], 2);
        assert_eq!(rotations[24], 3);

        // both rotation buttons held: neither wins
        well.update(&[InputEvent::press(Button::RotateA)]);
        run(&mut well, 30);
        assert_eq!(well.active_piece().unwrap().rotation().as_u8(), 3);
    }

    #[test]
    fn test_lock_delay_expires() {
        let mut well = Well::new(no_instant_lock());
        well.add_piece(PieceKind::O);
        well.hard_drop();
        assert_eq!(well.active_position(), Some((3, 20)));
        assert!(well.take_events().is_empty());

        run(&mut well, 29);
        assert!(well.active_piece().is_some());
        run(&mut well, 1);
        assert!(well.active_piece().is_none());
        assert_eq!(
            well.take_events(),
            vec![WellEvent::PieceLocked, WellEvent::NextRequested]
        );
    }

    #[test]
    fn test_move_down_locks_once_lock_delay_runs() {
        let mut well = Well::new(no_instant_lock());
        well.add_piece(PieceKind::O);
        well.hard_drop();
        well.move_down_now();
        assert!(well.active_piece().is_some());

        run(&mut well, 1);
        well.move_down_now();
        assert!(well.active_piece().is_none());
        assert_eq!(well.state(), WellState::NoPiece);
    }

    #[test]
    fn test_lock_infinity_restarts_delay() {
        let mut well = Well::new(no_instant_lock());
        well.add_piece(PieceKind::O);
        well.hard_drop();
        run(&mut well, 20);
        well.move_left_now();
        run(&mut well, 20);
        assert!(well.active_piece().is_some());

        let mut well = Well::new(WellConfig {
            lock_infinity: false,
            ..no_instant_lock()
        });
        well.add_piece(PieceKind::O);
        well.hard_drop();
        run(&mut well, 20);
        well.move_left_now();
        run(&mut well, 10);
        assert!(well.active_piece().is_none());
    }

    #[test]
    fn test_locked_cells_collide() {
        let mut well = Well::default();
        well.add_piece(PieceKind::S);
        well.hard_drop();
        assert!(
            well.matrix()
                .has_collision(Piece::new(PieceKind::S).grid(), 3, 20)
        );
    }

    #[test]
    fn test_lock_without_clear_only_adds_piece() {
        let text = board(&["ZZZZ..ZZZZ"]);
        let mut well = Well::from_ascii(&text, WellConfig::default()).unwrap();
        well.add_piece(PieceKind::T);
        well.hard_drop();

        assert_eq!(well.state(), WellState::NoPiece);
        assert!(well.pending_cleared_rows().is_empty());
        assert_eq!(
            well.as_ascii(),
            board(&["....T.....", "...TTT....", "ZZZZ..ZZZZ"])
        );
    }

    #[test]
    fn test_hold_and_hard_drop_events() {
        let mut well = Well::default();
        well.add_piece(PieceKind::L);
        well.update(&[InputEvent::press(Button::Hold)]);
        assert_eq!(well.take_events(), vec![WellEvent::HoldRequested]);
        assert_eq!(well.release_piece(), Some(PieceKind::L));
        assert_eq!(well.state(), WellState::NoPiece);

        well.add_piece(PieceKind::J);
        well.update(&[InputEvent::press(Button::Up)]);
        assert_eq!(
            well.take_events(),
            vec![WellEvent::PieceLocked, WellEvent::NextRequested]
        );
    }

    #[test]
    fn test_primitives_without_piece_are_noops() {
        let mut well = Well::default();
        well.move_left_now();
        well.move_right_now();
        well.move_down_now();
        well.rotate_cw_now();
        well.rotate_ccw_now();
        well.hard_drop();

        assert_eq!(well.state(), WellState::NoPiece);
        assert_eq!(well.matrix(), &Matrix::new());
        assert!(well.take_events().is_empty());
    }

    #[test]
    fn test_observers_see_events_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let text = board(&["IIII.IIIII"]);
        let mut well = Well::from_ascii(&text, WellConfig::default()).unwrap();
        for event_type in [
            WellEventType::PieceLocked,
            WellEventType::LineClear,
            WellEventType::NextRequested,
        ] {
            let log = Rc::clone(&log);
            well.subscribe(event_type, move |event| log.borrow_mut().push(*event));
        }

        well.add_piece(PieceKind::T);
        well.rotate_ccw_now();
        well.hard_drop();
        run(&mut well, 40);

        assert_eq!(
            *log.borrow(),
            vec![
                WellEvent::PieceLocked,
                WellEvent::LineClear { count: 1 },
                WellEvent::NextRequested
            ]
        );
    }

    #[test]
    fn test_line_clear_resets_input() {
        let text = board(&["OOOO.OOOOO"]);
        let mut well = Well::from_ascii(&text, WellConfig::default()).unwrap();
        well.add_piece(PieceKind::I);
        well.rotate_ccw_now();
        assert_eq!(well.active_position(), Some((3, 2)));

        well.update(&[
            InputEvent::press(Button::Left),
            InputEvent::press(Button::HardDrop),
        ]);
        assert_eq!(well.state(), WellState::LineClearPending);
        assert!(!well.keys[Button::Left]);
        assert!(!well.keys[Button::HardDrop]);
    }

    #[test]
    fn test_hidden_row_clear_requests_next_once() {
        let mut rows = vec!["....Z....."; HEIGHT];
        rows[0] = "..........";
        rows[1] = "III...IIII";
        let mut well = Well::from_ascii(&lines(&rows), WellConfig::default()).unwrap();
        well.add_piece(PieceKind::T);
        assert_eq!(well.active_position(), Some((3, 0)));

        well.hard_drop();
        assert_eq!(well.pending_cleared_rows(), &[1]);
        assert!(well.blocking_animations().is_empty());
        assert_eq!(well.take_events(), vec![WellEvent::PieceLocked]);

        run(&mut well, 1);
        assert_eq!(
            well.take_events(),
            vec![WellEvent::LineClear { count: 1 }, WellEvent::NextRequested]
        );
        assert_eq!(well.matrix().cell(4, 1).map(Mino::kind), Some(PieceKind::T));
    }
}
