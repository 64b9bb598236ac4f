use crate::{
    InvalidPlacementError,
    core::{
        Board, ClearedCell, LineList, Piece, PieceIdAllocator, PlacementResult, Position, Shape,
    },
};

use super::{
    GameStats, PieceGenerator,
    combo_scorer::{ComboResult, ComboScorer, HighScoreStore, MemoryHighScoreStore},
};

/// Number of pieces offered at once.
pub const TRAY_SIZE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum SessionState {
    Playing,
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum SessionError {
    #[display("tray slot {slot} holds no piece")]
    EmptySlot { slot: usize },
    #[display("{_0}")]
    InvalidPlacement(InvalidPlacementError),
    #[display("game is over")]
    GameOver,
    #[display("game is still in progress")]
    NotGameOver,
}

/// Everything that happened during one [`GameSession::place`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub piece: Piece,
    pub placement: PlacementResult,
    pub cleared_cells: Vec<ClearedCell>,
    pub combo: ComboResult,
    /// The tray was emptied by this placement and a new drop was dealt.
    pub refilled: bool,
    pub game_over: bool,
}

/// One game from the first drop to game over.
///
/// Owns the board, the generator, the scorer and a tray of [`TRAY_SIZE`]
/// pieces. Each [`Self::place`] runs a full turn: place, clear completed
/// lines, score, refill the tray once it is empty, and check whether any
/// remaining piece still fits.
#[derive(Debug, Clone)]
pub struct GameSession<S = MemoryHighScoreStore> {
    board: Board,
    generator: PieceGenerator,
    scorer: ComboScorer<S>,
    ids: PieceIdAllocator,
    stats: GameStats,
    tray: [Option<Piece>; TRAY_SIZE],
    state: SessionState,
    continues: usize,
}

impl<S> GameSession<S>
where
    S: HighScoreStore,
{
    /// Starts a game and deals the first drop.
    #[must_use]
    pub fn new(generator: PieceGenerator, store: S) -> Self {
        let mut this = Self {
            board: Board::EMPTY,
            generator,
            scorer: ComboScorer::new(store),
            ids: PieceIdAllocator::new(),
            stats: GameStats::new(),
            tray: [None; TRAY_SIZE],
            state: SessionState::Playing,
            continues: 0,
        };
        this.deal();
        this
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn generator(&self) -> &PieceGenerator {
        &self.generator
    }

    #[must_use]
    pub fn scorer(&self) -> &ComboScorer<S> {
        &self.scorer
    }

    #[must_use]
    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    #[must_use]
    pub fn tray(&self) -> &[Option<Piece>; TRAY_SIZE] {
        &self.tray
    }

    #[must_use]
    pub fn session_state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn score(&self) -> u64 {
        self.scorer.score()
    }

    #[must_use]
    pub fn drop_count(&self) -> usize {
        self.generator.drop_count()
    }

    /// Number of times [`Self::continue_game`] was used.
    #[must_use]
    pub fn continues(&self) -> usize {
        self.continues
    }

    /// Shape of the piece in `slot`, if any.
    #[must_use]
    pub fn slot_shape(&self, slot: usize) -> Option<&Shape> {
        let piece = self.tray.get(slot).copied().flatten()?;
        Some(self.generator.catalog().shape(piece.shape()))
    }

    /// Lines that placing the piece in `slot` at `origin` would complete.
    ///
    /// Empty when the slot is empty or the placement is illegal.
    #[must_use]
    pub fn completable_lines(&self, slot: usize, origin: Position) -> LineList {
        self.slot_shape(slot)
            .map(|shape| self.board.completable_lines(shape, origin))
            .unwrap_or_default()
    }

    /// Places the piece in `slot` with its bounding box at `origin`.
    ///
    /// On error nothing changes.
    pub fn place(&mut self, slot: usize, origin: Position) -> Result<TurnOutcome, SessionError> {
        if self.state.is_game_over() {
            return Err(SessionError::GameOver);
        }
        let piece = self
            .tray
            .get(slot)
            .copied()
            .flatten()
            .ok_or(SessionError::EmptySlot { slot })?;
        let shape = self.generator.catalog().shape(piece.shape());
        let placement = self
            .board
            .place(shape, origin, piece.color())
            .map_err(SessionError::InvalidPlacement)?;
        self.tray[slot] = None;

        let lines = placement.completed_lines().len();
        let cleared_cells = self.board.clear_lines(placement.completed_lines());
        let is_field_clear = lines > 0 && self.board.is_empty();
        let combo = self.scorer.process_placement(
            placement.points_from_placement(),
            lines,
            is_field_clear,
        );
        self.stats.complete_placement(lines, &combo);

        let refilled = self.tray.iter().all(Option::is_none);
        if refilled {
            self.deal();
        } else {
            self.update_game_over();
        }

        Ok(TurnOutcome {
            piece,
            placement,
            cleared_cells,
            combo,
            refilled,
            game_over: self.state.is_game_over(),
        })
    }

    /// Resumes a finished game with two single cells and one favorable piece.
    ///
    /// The board and score are kept and the drop count does not advance. The
    /// game is over again at once if not even a single cell fits.
    pub fn continue_game(&mut self) -> Result<(), SessionError> {
        if !self.state.is_game_over() {
            return Err(SessionError::NotGameOver);
        }
        self.continues += 1;
        self.generator.request_continue();
        self.tray = self
            .generator
            .generate_three(&self.board, &mut self.ids)
            .map(Some);
        self.state = SessionState::Playing;
        self.update_game_over();
        Ok(())
    }

    /// Starts a new game. The high score and random source carry over.
    pub fn restart(&mut self) {
        self.board = Board::EMPTY;
        self.generator.reset();
        self.scorer.reset();
        self.ids.reset();
        self.stats = GameStats::new();
        self.state = SessionState::Playing;
        self.continues = 0;
        self.deal();
    }

    /// Consumes the session, returning the high score store.
    pub fn into_store(self) -> S {
        self.scorer.into_store()
    }

    fn deal(&mut self) {
        self.generator.increment_drop();
        self.tray = self
            .generator
            .generate_three(&self.board, &mut self.ids)
            .map(Some);
        self.update_game_over();
    }

    fn update_game_over(&mut self) {
        let catalog = self.generator.catalog();
        let shapes = self
            .tray
            .iter()
            .flatten()
            .map(|piece| catalog.shape(piece.shape()));
        if !self.board.has_any_valid_move(shapes) {
            self.state = SessionState::GameOver;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        ColorTag, GeneratorConfig, GeneratorSeed, MemoryHighScoreStore, ShapeCatalog, ShapeId,
    };

    use super::*;

    fn seed() -> GeneratorSeed {
        GeneratorSeed::from([7; 16])
    }

    fn session_with(catalog: ShapeCatalog) -> GameSession {
        let config = GeneratorConfig::for_catalog(&catalog);
        let generator = PieceGenerator::with_seed(catalog, config, seed()).unwrap();
        GameSession::new(generator, MemoryHighScoreStore::default())
    }

    fn standard_session() -> GameSession {
        session_with(ShapeCatalog::standard().unwrap())
    }

    fn dot_session() -> GameSession {
        session_with(ShapeCatalog::new([("dot", &[(0, 0)][..])]).unwrap())
    }

    fn first_filled_slot(session: &GameSession) -> usize {
        session.tray().iter().position(Option::is_some).unwrap()
    }

    fn find_shape(session: &GameSession, name: &str) -> ShapeId {
        session
            .generator()
            .catalog()
            .shapes()
            .iter()
            .find(|s| s.name() == name)
            .unwrap()
            .id()
    }

    #[test]
    fn test_new_session_deals_first_drop() {
        let session = standard_session();
        assert_eq!(session.drop_count(), 1);
        assert!(session.tray().iter().all(Option::is_some));
        assert!(session.session_state().is_playing());
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn test_rejected_moves_change_nothing() {
        let mut session = standard_session();
        let tray = *session.tray();

        let err = session.place(0, Position::new(8, 8)).unwrap_err();
        assert_eq!(err, SessionError::InvalidPlacement(InvalidPlacementError));
        assert_eq!(
            session.place(0, Position::new(usize::MAX, usize::MAX)),
            Err(SessionError::InvalidPlacement(InvalidPlacementError))
        );
        assert_eq!(
            session.place(5, Position::new(0, 0)),
            Err(SessionError::EmptySlot { slot: 5 })
        );
        assert_eq!(session.tray(), &tray);
        assert!(session.board().is_empty());
        assert_eq!(session.continue_game(), Err(SessionError::NotGameOver));
    }

    #[test]
    fn test_tray_is_refilled_when_empty() {
        let mut session = dot_session();
        for (i, x) in (0..3).enumerate() {
            let outcome = session.place(i, Position::new(x, 0)).unwrap();
            assert_eq!(outcome.refilled, i == 2);
        }
        assert_eq!(
            session.place(0, Position::new(0, 0)).unwrap_err(),
            SessionError::InvalidPlacement(InvalidPlacementError)
        );
        assert_eq!(session.drop_count(), 2);
        assert!(session.tray().iter().all(Option::is_some));
        assert_eq!(session.stats().placements(), 3);
        assert_eq!(session.score(), 3);
    }

    #[test]
    fn test_row_clear_on_otherwise_empty_board_is_field_clear() {
        let mut session = dot_session();
        let mut last = None;
        for x in 0..8 {
            let slot = first_filled_slot(&session);
            last = Some(session.place(slot, Position::new(x, 3)).unwrap());
        }
        let outcome = last.unwrap();
        assert_eq!(outcome.placement.completed_lines().len(), 1);
        assert_eq!(outcome.cleared_cells.len(), 8);
        assert!(outcome.combo.is_field_clear);
        assert_eq!(outcome.combo.total_points, 1 + 10 * 2 + 300);
        assert_eq!(session.score(), 7 + 321);
        assert!(session.board().is_empty());
        assert_eq!(session.stats().field_clears(), 1);
        assert_eq!(session.scorer().high_score(), 328);
    }

    #[test]
    fn test_completable_lines_preview() {
        let mut session = dot_session();
        for x in 0..7 {
            let slot = first_filled_slot(&session);
            session.place(slot, Position::new(x, 5)).unwrap();
        }
        let slot = first_filled_slot(&session);
        let lines = session.completable_lines(slot, Position::new(7, 5));
        assert_eq!(lines.len(), 1);
        assert!(lines[0].is_row());
        assert!(session.completable_lines(slot, Position::new(0, 5)).is_empty());
        assert_eq!(session.board().occupied_cell_count(), 7);
    }

    #[test]
    fn test_game_over_and_continue() {
        let mut session = standard_session();
        let dot = find_shape(&session, "dot");
        let square = find_shape(&session, "square-2");
        let catalog = session.generator().catalog().clone();

        session.board = Board::EMPTY;
        for pos in Position::all().filter(|p| (p.x + p.y) % 2 == 0) {
            session
                .board
                .place(catalog.shape(dot), pos, ColorTag::Red)
                .unwrap();
        }
        session.tray = [
            Some(Piece::new(square, ColorTag::Blue, session.ids.allocate())),
            Some(Piece::new(square, ColorTag::Blue, session.ids.allocate())),
            Some(Piece::new(dot, ColorTag::Blue, session.ids.allocate())),
        ];

        let outcome = session.place(2, Position::new(1, 0)).unwrap();
        assert!(outcome.game_over);
        assert!(!outcome.refilled);
        assert!(session.session_state().is_game_over());
        assert_eq!(session.place(0, Position::new(1, 0)), Err(SessionError::GameOver));

        let drop = session.drop_count();
        session.continue_game().unwrap();
        assert!(session.session_state().is_playing());
        assert_eq!(session.continues(), 1);
        assert_eq!(session.drop_count(), drop);
        assert_eq!(session.tray()[0].unwrap().shape(), dot);
        assert_eq!(session.tray()[1].unwrap().shape(), dot);
    }

    #[test]
    fn test_restart_keeps_high_score() {
        let mut session = dot_session();
        for x in 0..8 {
            let slot = first_filled_slot(&session);
            session.place(slot, Position::new(x, 0)).unwrap();
        }
        let high = session.scorer().high_score();
        session.restart();
        assert_eq!(session.score(), 0);
        assert_eq!(session.drop_count(), 1);
        assert_eq!(session.stats().placements(), 0);
        assert_eq!(session.scorer().high_score(), high);
        assert_eq!(session.into_store().high_score(), high);
    }
}
