use std::time::Duration;

use super::timer::frames;

pub const CELL_LOCK_DURATION: Duration = frames(10);
pub const LINE_CLEAR_DURATION: Duration = frames(40);

/// What an animation highlights. Rows are in visible coordinates: row 0 is
/// the topmost drawn row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum AnimationKind {
    CellLock { row: usize, col: usize },
    LineClear { row: usize },
}

/// A staged visual effect with a fixed lifetime.
///
/// The engine only advances and expires animations; drawing them is up to the
/// renderer, which reads [`WellAnimation::kind`] and
/// [`WellAnimation::progress`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WellAnimation {
    kind: AnimationKind,
    elapsed: Duration,
    duration: Duration,
}

impl WellAnimation {
    #[must_use]
    pub const fn cell_lock(row: usize, col: usize) -> Self {
        Self::new(AnimationKind::CellLock { row, col }, CELL_LOCK_DURATION)
    }

    #[must_use]
    pub const fn line_clear(row: usize) -> Self {
        Self::new(AnimationKind::LineClear { row }, LINE_CLEAR_DURATION)
    }

    const fn new(kind: AnimationKind, duration: Duration) -> Self {
        Self {
            kind,
            elapsed: Duration::ZERO,
            duration,
        }
    }

    #[must_use]
    pub fn kind(&self) -> AnimationKind {
        self.kind
    }

    pub fn update(&mut self, elapsed: Duration) {
        self.elapsed = (self.elapsed + elapsed).min(self.duration);
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.elapsed < self.duration
    }

    /// Fraction of the lifetime that has passed, from 0.0 to 1.0.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        self.elapsed.as_secs_f32() / self.duration.as_secs_f32()
    }
}
