//! Game engine logic and state management.
//!
//! This module builds the game rules on top of the core data structures:
//!
//! - [`GeneratorConfig`] - Immutable generator tuning (unlock schedule, mode schedule, weights)
//! - [`PieceGenerator`] - Deals three pieces per drop in favorable, random or continue mode
//! - [`GeneratorSeed`] - Seed for deterministic piece generation
//! - [`ComboScorer`] - Placement scoring with combo streaks and a persisted high score
//! - [`GameStats`] - Placement and line clear statistics
//! - [`GameSession`] - One game: board, tray, generator and scorer wired together
//!
//! # Game Flow
//!
//! 1. Create a [`PieceGenerator`] from a catalog and a validated configuration
//! 2. [`GameSession::new`] deals the first drop of three pieces
//! 3. The player places a piece from the tray; completed lines are cleared and scored
//! 4. Once the tray is empty the next drop is dealt
//! 5. The game ends when no piece left in the tray fits anywhere
//!
//! # Example
//!
//! ```
//! use gridblast_engine::{
//!     GameSession, GeneratorConfig, MemoryHighScoreStore, PieceGenerator, Position,
//!     ShapeCatalog,
//! };
//!
//! let catalog = ShapeCatalog::standard().unwrap();
//! let config = GeneratorConfig::for_catalog(&catalog);
//! let generator = PieceGenerator::new(catalog, config).unwrap();
//! let mut session = GameSession::new(generator, MemoryHighScoreStore::default());
//!
//! // Place the first piece wherever it fits
//! let shape = session.slot_shape(0).unwrap().clone();
//! let origin = Position::all()
//!     .find(|&p| session.board().can_place(&shape, p))
//!     .unwrap();
//! let outcome = session.place(0, origin).unwrap();
//!
//! assert_eq!(outcome.combo.base_points, shape.cell_count());
//! ```

pub use self::{
    combo_scorer::*, game_session::*, game_stats::*, generator_config::*, piece_generator::*,
    placement_search::*,
};

mod combo_scorer;
mod game_session;
mod game_stats;
mod generator_config;
mod piece_generator;
mod placement_search;
