use serde::{Deserialize, Serialize};

use crate::core::LineIndex;

use super::combo_scorer::ComboResult;

/// Length of [`GameStats::line_cleared_counter`]: one slot for every possible
/// number of lines cleared by a single placement (0 through 16).
pub const LINE_HISTOGRAM_LEN: usize = LineIndex::COUNT + 1;

/// Game statistics tracking placements, line clears and combos.
///
/// Score itself lives in [`ComboScorer`](super::ComboScorer); these counters
/// describe how it was earned.
///
/// # Example
///
/// ```
/// use gridblast_engine::{ComboScorer, GameStats};
///
/// let mut scorer = ComboScorer::default();
/// let mut stats = GameStats::new();
///
/// let combo = scorer.process_placement(4, 2, false);
/// stats.complete_placement(2, &combo);
///
/// assert_eq!(stats.total_cleared_lines(), 2);
/// assert_eq!(stats.line_cleared_counter()[2], 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    placements: usize,
    total_cleared_lines: usize,
    line_cleared_counter: [usize; LINE_HISTOGRAM_LEN],
    field_clears: usize,
    best_streak: usize,
}

impl Default for GameStats {
    fn default() -> Self {
        Self::new()
    }
}

impl GameStats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            placements: 0,
            total_cleared_lines: 0,
            line_cleared_counter: [0; LINE_HISTOGRAM_LEN],
            field_clears: 0,
            best_streak: 0,
        }
    }

    /// Number of pieces placed on the board.
    #[must_use]
    pub const fn placements(&self) -> usize {
        self.placements
    }

    #[must_use]
    pub const fn total_cleared_lines(&self) -> usize {
        self.total_cleared_lines
    }

    /// Histogram of placements by number of lines cleared.
    ///
    /// `[0]` counts placements that cleared nothing.
    #[must_use]
    pub const fn line_cleared_counter(&self) -> &[usize; LINE_HISTOGRAM_LEN] {
        &self.line_cleared_counter
    }

    /// Number of clears that left the board empty.
    #[must_use]
    pub const fn field_clears(&self) -> usize {
        self.field_clears
    }

    /// Longest combo streak reached.
    #[must_use]
    pub const fn best_streak(&self) -> usize {
        self.best_streak
    }

    /// Updates statistics after a placement and its line clears.
    pub fn complete_placement(&mut self, cleared_lines: usize, combo: &ComboResult) {
        self.placements += 1;
        self.total_cleared_lines += cleared_lines;
        self.line_cleared_counter[cleared_lines.min(LINE_HISTOGRAM_LEN - 1)] += 1;
        if combo.is_field_clear {
            self.field_clears += 1;
        }
        self.best_streak = self.best_streak.max(combo.streak);
    }
}
