use std::time::Duration;

use rand::Rng as _;

use crate::{HoldError, core::piece::PieceKind};

use super::{
    config::WellConfig,
    event::{WellEvent, WellEventType},
    game_stats::GameStats,
    input::InputEvent,
    piece_queue::{PieceQueue, PieceSeed},
    timer::frames,
    well::Well,
};

/// A single game: a [`Well`] fed by a [`PieceQueue`], with hold and statistics.
///
/// The session reacts to the events the well emits during a frame once
/// [`Well::update`] has returned: it spawns the next piece, performs holds and
/// updates [`GameStats`].
///
/// # Example
///
/// ```
/// use blockfall_engine::{Button, GameSession, InputEvent, WellConfig};
///
/// let mut session = GameSession::new(WellConfig::default());
/// session.update(&[InputEvent::press(Button::HardDrop)]);
///
/// assert_eq!(session.stats().completed_pieces(), 1);
/// assert!(session.well().active_piece().is_some());
/// ```
#[derive(Debug)]
pub struct GameSession {
    well: Well,
    queue: PieceQueue,
    seed: PieceSeed,
    held_piece: Option<PieceKind>,
    hold_used: bool,
    stats: GameStats,
    total_frames: u64,
}

impl GameSession {
    #[must_use]
    pub fn new(config: WellConfig) -> Self {
        Self::with_seed(config, rand::rng().random())
    }

    #[must_use]
    pub fn with_seed(config: WellConfig, seed: PieceSeed) -> Self {
        let queue = PieceQueue::with_seed(config.preview_count, seed);
        let mut session = Self {
            well: Well::new(config),
            queue,
            seed,
            held_piece: None,
            hold_used: false,
            stats: GameStats::new(),
            total_frames: 0,
        };
        session.spawn_next();
        session
    }

    #[must_use]
    pub fn well(&self) -> &Well {
        &self.well
    }

    #[must_use]
    pub fn seed(&self) -> PieceSeed {
        self.seed
    }

    #[must_use]
    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    #[must_use]
    pub fn held_piece(&self) -> Option<PieceKind> {
        self.held_piece
    }

    pub fn preview(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.queue.preview()
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.well.state().is_game_over()
    }

    #[must_use]
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Play time, counting only frames before game over.
    #[must_use]
    pub fn duration(&self) -> Duration {
        frames(self.total_frames)
    }

    /// Registers an observer on the underlying well.
    pub fn subscribe<F>(&mut self, event_type: WellEventType, observer: F)
    where
        F: FnMut(&WellEvent) + 'static,
    {
        self.well.subscribe(event_type, observer);
    }

    /// Advances the game by one frame.
    pub fn update(&mut self, inputs: &[InputEvent]) {
        if !self.is_game_over() {
            self.total_frames += 1;
        }
        self.well.update(inputs);
        for event in self.well.take_events() {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: WellEvent) {
        match event {
            WellEvent::PieceLocked => self.stats.complete_piece(),
            WellEvent::LineClear { count } => self.stats.clear_lines(count),
            WellEvent::NextRequested => self.spawn_next(),
            WellEvent::HoldRequested => {
                if let Err(err) = self.try_hold() {
                    tracing::debug!(%err, "hold request ignored");
                }
            }
        }
    }

    fn spawn_next(&mut self) {
        let kind = self.queue.next();
        self.hold_used = false;
        self.well.add_piece(kind);
        if self.is_game_over() {
            tracing::info!(
                pieces = self.stats.completed_pieces(),
                lines = self.stats.total_cleared_lines(),
                "game over"
            );
        }
    }

    /// Swaps the active piece with the held one.
    ///
    /// The first hold stashes the active piece and spawns the next one from the
    /// queue. Holding is allowed once per piece.
    pub fn try_hold(&mut self) -> Result<(), HoldError> {
        if self.well.active_piece().is_none() {
            return Err(HoldError::NoActivePiece);
        }
        if self.hold_used {
            return Err(HoldError::AlreadyUsed);
        }
        let current = self
            .well
            .release_piece()
            .ok_or(HoldError::NoActivePiece)?;
        let next = self
            .held_piece
            .replace(current)
            .unwrap_or_else(|| self.queue.next());
        self.well.add_piece(next);
        self.hold_used = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::piece::Piece, engine::input::Button};

    const SEED: PieceSeed = PieceSeed::from_bytes([7; 16]);

    fn session() -> GameSession {
        GameSession::with_seed(WellConfig::default(), SEED)
    }

    #[test]
    fn test_first_piece_comes_from_queue() {
        let mut queue = PieceQueue::with_seed(5, SEED);
        let session = session();
        let first = queue.next();
        assert_eq!(session.well().active_piece().map(Piece::kind), Some(first));
        assert!(session.preview().eq(queue.preview()));
    }

    #[test]
    fn test_hard_drop_spawns_next() {
        let mut session = session();
        let upcoming = session.preview().next();
        session.update(&[InputEvent::press(Button::HardDrop)]);

        assert_eq!(session.stats().completed_pieces(), 1);
        assert_eq!(
            session.well().active_piece().map(Piece::kind),
            upcoming
        );
        assert_eq!(session.total_frames(), 1);
        assert_eq!(session.duration(), frames(1));
    }

    #[test]
    fn test_hold_once_per_piece() {
        let mut session = session();
        let first = session.well().active_piece().unwrap().kind();
        let second = session.preview().next().unwrap();

        session.update(&[InputEvent::press(Button::Hold)]);
        assert_eq!(session.held_piece(), Some(first));
        assert_eq!(session.well().active_piece().map(Piece::kind), Some(second));

        assert_eq!(session.try_hold(), Err(HoldError::AlreadyUsed));

        session.update(&[
            InputEvent::release(Button::Hold),
            InputEvent::press(Button::HardDrop),
        ]);
        let third = session.well().active_piece().unwrap().kind();
        assert_eq!(session.try_hold(), Ok(()));
        assert_eq!(session.held_piece(), Some(third));
        assert_eq!(session.well().active_piece().map(Piece::kind), Some(first));
    }

    #[test]
    fn test_hold_on_lock_delay_expiry() {
        let config = WellConfig {
            harddrop_locks_instantly: false,
            ..WellConfig::default()
        };
        let mut session = GameSession::with_seed(config, SEED);
        let first = session.well().active_piece().unwrap().kind();
        let second = session.preview().next();

        session.update(&[InputEvent::press(Button::HardDrop)]);
        for _ in 0..28 {
            session.update(&[]);
        }
        session.update(&[InputEvent::press(Button::Hold)]);

        assert_eq!(session.held_piece(), Some(first));
        assert_eq!(session.well().active_piece().map(Piece::kind), second);
        assert_eq!(session.stats().completed_pieces(), 0);
    }

    #[test]
    fn test_hold_without_piece() {
        let mut session = session();
        session.well.release_piece();
        assert_eq!(session.try_hold(), Err(HoldError::NoActivePiece));
    }

    #[test]
    fn test_session_runs_to_game_over() {
        let mut session = session();
        let mut frames_played = 0;
        while !session.is_game_over() {
            session.update(&[InputEvent::press(Button::HardDrop)]);
            session.update(&[InputEvent::release(Button::HardDrop)]);
            frames_played += 2;
            assert!(frames_played < 10_000, "game should end");
        }
        let stats = session.stats();
        assert!(stats.completed_pieces() > 5);
        assert_eq!(
            stats.line_cleared_counter().iter().sum::<usize>(),
            stats.completed_pieces()
        );

        let frames_at_end = session.total_frames();
        session.update(&[]);
        assert_eq!(session.total_frames(), frames_at_end);
    }
}
