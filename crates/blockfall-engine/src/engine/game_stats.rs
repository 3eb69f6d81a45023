use serde::Serialize;

/// Game statistics: locked pieces and cleared lines.
///
/// Tracks various metrics during a game session:
///
/// - **Completed pieces**: Total number of pieces locked
/// - **Total cleared lines**: Sum over all line clears
/// - **Line clear distribution**: Count of locks that cleared 0, 1, 2, 3 or 4 lines
///
/// A line clear is reported some frames after the lock that caused it, so a
/// lock first counts as clearing nothing and is moved to the right bucket when
/// its clear arrives.
///
/// # Example
///
/// ```
/// use blockfall_engine::GameStats;
///
/// let mut stats = GameStats::new();
/// stats.complete_piece();
/// stats.complete_piece();
/// stats.clear_lines(4);
///
/// assert_eq!(stats.completed_pieces(), 2);
/// assert_eq!(stats.total_cleared_lines(), 4);
/// assert_eq!(stats.line_cleared_counter(), &[1, 0, 0, 0, 1]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GameStats {
    completed_pieces: usize,
    total_cleared_lines: usize,
    line_cleared_counter: [usize; 5],
}

impl GameStats {
    /// Creates a new game statistics tracker with all counters at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            completed_pieces: 0,
            total_cleared_lines: 0,
            line_cleared_counter: [0; 5],
        }
    }

    /// Returns the total number of pieces that have been locked into place.
    #[must_use]
    pub const fn completed_pieces(&self) -> usize {
        self.completed_pieces
    }

    /// Returns the total number of lines cleared across all line clears.
    #[must_use]
    pub const fn total_cleared_lines(&self) -> usize {
        self.total_cleared_lines
    }

    /// Returns a histogram of locks by number of lines cleared.
    ///
    /// Array indices represent:
    /// - `[0]`: Number of locks with 0 lines cleared
    /// - `[1]`: Number of singles (1 line)
    /// - `[2]`: Number of doubles (2 lines)
    /// - `[3]`: Number of triples (3 lines)
    /// - `[4]`: Number of quads (4 lines)
    #[must_use]
    pub const fn line_cleared_counter(&self) -> &[usize; 5] {
        &self.line_cleared_counter
    }

    /// Records a piece lock.
    pub const fn complete_piece(&mut self) {
        self.completed_pieces += 1;
        self.line_cleared_counter[0] += 1;
    }

    /// Records the line clear caused by the most recent lock.
    pub fn clear_lines(&mut self, count: usize) {
        debug_assert!((1..self.line_cleared_counter.len()).contains(&count));
        self.total_cleared_lines += count;
        self.line_cleared_counter[0] = self.line_cleared_counter[0].saturating_sub(1);
        if let Some(bucket) = self.line_cleared_counter.get_mut(count) {
            *bucket += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locks_without_clears() {
        let mut stats = GameStats::new();
        for _ in 0..3 {
            stats.complete_piece();
        }
        assert_eq!(stats.completed_pieces(), 3);
        assert_eq!(stats.total_cleared_lines(), 0);
        assert_eq!(stats.line_cleared_counter(), &[3, 0, 0, 0, 0]);
    }

    #[test]
    fn test_clear_moves_lock_into_bucket() {
        let mut stats = GameStats::new();
        stats.complete_piece();
        stats.clear_lines(2);
        stats.complete_piece();
        stats.clear_lines(1);
        stats.complete_piece();
        assert_eq!(stats.total_cleared_lines(), 3);
        assert_eq!(stats.line_cleared_counter(), &[1, 1, 1, 0, 0]);
        assert_eq!(
            stats.line_cleared_counter().iter().sum::<usize>(),
            stats.completed_pieces()
        );
    }
}
