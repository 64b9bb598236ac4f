use gridblast_engine::{Board, Position, Shape};
use serde::Serialize;

/// Move selection strategy of the auto-play bot.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::FromStr)]
pub enum BotKind {
    /// Most completed lines, then lowest row, then largest piece
    #[default]
    Greedy,
    /// First legal placement in tray and row-major order
    Naive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub slot: usize,
    pub origin: Position,
}

/// Picks a placement for one of the tray pieces, given as `(slot, shape)`.
///
/// Returns `None` if no piece fits.
pub fn choose_move<'a, I>(kind: BotKind, board: &Board, tray: I) -> Option<Move>
where
    I: IntoIterator<Item = (usize, &'a Shape)>,
{
    let mut legal = tray.into_iter().flat_map(|(slot, shape)| {
        Position::all().filter_map(move |origin| {
            let lines = board.simulate_placement(shape, origin)?;
            let key = (lines.len(), origin.y, shape.cell_count());
            Some((Move { slot, origin }, key))
        })
    });

    match kind {
        BotKind::Naive => legal.next().map(|(mv, _)| mv),
        BotKind::Greedy => {
            let mut best: Option<(Move, (usize, usize, usize))> = None;
            for (mv, key) in legal {
                if best.is_none_or(|(_, best_key)| key > best_key) {
                    best = Some((mv, key));
                }
            }
            best.map(|(mv, _)| mv)
        }
    }
}
