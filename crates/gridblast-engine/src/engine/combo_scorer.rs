use std::fmt;

use serde::{Deserialize, Serialize};

/// Score values for clearing 1-5 lines at once.
///
/// Index corresponds to the number of lines cleared; six or more lines score
/// 35 points per line.
const LINE_CLEAR_TABLE: [usize; 6] = [0, 10, 30, 60, 100, 150];

/// Moves within which a clear continues the previous clear's streak.
pub const COMBO_WINDOW: u64 = 3;

/// Flat bonus for a clear that leaves the board empty.
pub const FIELD_CLEAR_BONUS: usize = 300;

/// Points for clearing `lines` lines in one placement, before the combo
/// multiplier.
///
/// # Example
///
/// ```
/// use gridblast_engine::line_clear_points;
///
/// let points: Vec<_> = (1..=7).map(line_clear_points).collect();
/// assert_eq!(points, [10, 30, 60, 100, 150, 210, 245]);
/// ```
#[must_use]
pub fn line_clear_points(lines: usize) -> usize {
    LINE_CLEAR_TABLE
        .get(lines)
        .copied()
        .unwrap_or(lines * 35)
}

/// Persistence for the best score ever reached.
///
/// The scorer reads the stored value once on construction and writes through
/// whenever the running score exceeds it.
pub trait HighScoreStore: fmt::Debug {
    fn high_score(&self) -> u64;

    fn set_high_score(&mut self, score: u64);
}

/// Non-persistent [`HighScoreStore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryHighScoreStore(u64);

impl MemoryHighScoreStore {
    #[must_use]
    pub const fn new(high_score: u64) -> Self {
        Self(high_score)
    }
}

impl HighScoreStore for MemoryHighScoreStore {
    fn high_score(&self) -> u64 {
        self.0
    }

    fn set_high_score(&mut self, score: u64) {
        self.0 = score;
    }
}

/// Point breakdown for one placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboResult {
    /// One point per placed cell.
    pub base_points: usize,
    /// Line clear points before the multiplier.
    pub line_points: usize,
    /// 1 without a clear, otherwise `max(2, streak + 1)`.
    pub combo_multiplier: usize,
    pub total_points: usize,
    pub streak: usize,
    pub is_field_clear: bool,
    pub field_clear_bonus: usize,
}

/// Turns placements into points.
///
/// Clears that happen within [`COMBO_WINDOW`] moves of the previous clear
/// extend a streak which multiplies line points. A move that clears nothing
/// leaves the streak untouched: it is only reset by the next clear that falls
/// outside the window.
///
/// # Example
///
/// ```
/// use gridblast_engine::{ComboScorer, MemoryHighScoreStore};
///
/// let mut scorer = ComboScorer::new(MemoryHighScoreStore::default());
/// let first = scorer.process_placement(4, 1, false);
/// assert_eq!(first.total_points, 4 + 10 * 2);
///
/// scorer.process_placement(3, 0, false);
/// let second = scorer.process_placement(2, 1, false);
/// assert_eq!((second.streak, second.combo_multiplier), (2, 3));
/// ```
#[derive(Debug, Clone)]
pub struct ComboScorer<S = MemoryHighScoreStore> {
    score: u64,
    high_score: u64,
    move_index: u64,
    last_combo_move_index: u64,
    streak: usize,
    store: S,
}

impl Default for ComboScorer {
    fn default() -> Self {
        Self::new(MemoryHighScoreStore::default())
    }
}

impl<S> ComboScorer<S>
where
    S: HighScoreStore,
{
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            score: 0,
            high_score: store.high_score(),
            move_index: 0,
            last_combo_move_index: 0,
            streak: 0,
            store,
        }
    }

    /// Cumulative score of the current game.
    #[must_use]
    pub fn score(&self) -> u64 {
        self.score
    }

    #[must_use]
    pub fn high_score(&self) -> u64 {
        self.high_score
    }

    #[must_use]
    pub fn streak(&self) -> usize {
        self.streak
    }

    /// Number of placements processed in the current game.
    #[must_use]
    pub fn move_index(&self) -> u64 {
        self.move_index
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Starts a new game. The high score is kept.
    pub fn reset(&mut self) {
        self.score = 0;
        self.move_index = 0;
        self.last_combo_move_index = 0;
        self.streak = 0;
    }

    /// Scores one placement of `cells_placed` cells that cleared
    /// `lines_cleared` lines.
    ///
    /// `is_field_clear` should be true when the board is empty after the clear;
    /// it has no effect on a placement that cleared nothing.
    pub fn process_placement(
        &mut self,
        cells_placed: usize,
        lines_cleared: usize,
        is_field_clear: bool,
    ) -> ComboResult {
        self.move_index += 1;
        let base_points = cells_placed;

        let result = if lines_cleared == 0 {
            ComboResult {
                base_points,
                line_points: 0,
                combo_multiplier: 1,
                total_points: base_points,
                streak: self.streak,
                is_field_clear: false,
                field_clear_bonus: 0,
            }
        } else {
            if self.move_index - self.last_combo_move_index <= COMBO_WINDOW {
                self.streak += 1;
            } else {
                self.streak = 1;
            }
            self.last_combo_move_index = self.move_index;

            let line_points = line_clear_points(lines_cleared);
            let combo_multiplier = usize::max(2, self.streak + 1);
            let field_clear_bonus = if is_field_clear { FIELD_CLEAR_BONUS } else { 0 };
            ComboResult {
                base_points,
                line_points,
                combo_multiplier,
                total_points: base_points + line_points * combo_multiplier + field_clear_bonus,
                streak: self.streak,
                is_field_clear,
                field_clear_bonus,
            }
        };

        self.score += result.total_points as u64;
        if self.score > self.high_score {
            self.high_score = self.score;
            self.store.set_high_score(self.score);
        }
        result
    }
}
