//! Exhaustive placement search used by favorable generation.
//!
//! For each candidate shape every one of the 64 origins is tried against the
//! current board. Legal placements are scored from the lines they would
//! complete, their row and the shape size; a shape is represented by its single
//! best placement. The board is only read: completed lines come from
//! [`Board::simulate_placement`], which works on row/column fill counts instead
//! of a cloned grid.
//!
//! ```text
//! score = line_clear_points(lines) + 2 * (7 - origin_row) + cell_count
//! ```

use crate::core::{BOARD_SIZE, Board, Position, Shape, ShapeId};

use super::combo_scorer::line_clear_points;

/// Best placement found for one shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FavorableCandidate {
    pub shape: ShapeId,
    pub origin: Position,
    pub lines: usize,
    pub score: usize,
    pub cell_count: usize,
    pub weight: usize,
}

/// Heuristic value of placing a shape of `cell_count` cells at `origin_row`,
/// completing `lines` lines.
#[must_use]
pub fn placement_score(lines: usize, origin_row: usize, cell_count: usize) -> usize {
    line_clear_points(lines) + 2 * (BOARD_SIZE - 1 - origin_row) + cell_count
}

/// Highest-scoring legal placement of `shape`, or `None` if it fits nowhere.
///
/// Ties keep the first origin in row-major order.
#[must_use]
pub fn best_placement(board: &Board, shape: &Shape) -> Option<(Position, usize, usize)> {
    let mut best: Option<(Position, usize, usize)> = None;
    for origin in Position::all() {
        let Some(lines) = board.simulate_placement(shape, origin) else {
            continue;
        };
        let score = placement_score(lines.len(), origin.y, shape.cell_count());
        if best.is_none_or(|(_, _, best_score)| score > best_score) {
            best = Some((origin, lines.len(), score));
        }
    }
    best
}

/// Scores every `(shape, weight)` pair and sorts the ones that fit by
/// `(score, cell_count, weight)`, best first.
///
/// Equal keys keep their input order.
pub fn rank_candidates<'a, I>(board: &Board, shapes: I) -> Vec<FavorableCandidate>
where
    I: IntoIterator<Item = (&'a Shape, usize)>,
{
    let mut candidates: Vec<_> = shapes
        .into_iter()
        .filter_map(|(shape, weight)| {
            let (origin, lines, score) = best_placement(board, shape)?;
            Some(FavorableCandidate {
                shape: shape.id(),
                origin,
                lines,
                score,
                cell_count: shape.cell_count(),
                weight,
            })
        })
        .filter(|c| c.score > 0)
        .collect();
    candidates.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(b.cell_count.cmp(&a.cell_count))
            .then(b.weight.cmp(&a.weight))
    });
    candidates
}
