use std::{collections::VecDeque, fmt, str::FromStr};

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform, weighted::WeightedIndex},
    seq::IndexedRandom as _,
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::{Board, Piece, PieceIdAllocator, Shape, ShapeCatalog, ShapeId};

use super::{
    generator_config::{GenerationMode, GeneratorConfig, GeneratorConfigError},
    placement_search::rank_candidates,
};

/// Capacity of the recently generated shape list.
pub const RECENT_SHAPES: usize = 3;

/// Seed for deterministic piece generation.
///
/// A 128-bit value fed to the generator's PCG random source. Equal seeds,
/// configurations and moves give identical piece sequences, colours included.
/// The textual form (used by `Display`, `FromStr` and serde) is a 32-character
/// hex string.
///
/// # Example
///
/// ```
/// use gridblast_engine::GeneratorSeed;
/// use rand::Rng as _;
///
/// let seed: GeneratorSeed = rand::rng().random();
/// let parsed: GeneratorSeed = seed.to_string().parse().unwrap();
/// assert_eq!(parsed, seed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeneratorSeed([u8; 16]);

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum GeneratorSeedParseError {
    #[display("invalid hex: expected 32 characters, got {_0}")]
    Length(#[error(not(source))] usize),
    #[display("invalid hex: {_0:?}")]
    Digits(#[error(not(source))] String),
}

impl From<[u8; 16]> for GeneratorSeed {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for GeneratorSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", u128::from_be_bytes(self.0))
    }
}

impl FromStr for GeneratorSeed {
    type Err = GeneratorSeedParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 {
            return Err(GeneratorSeedParseError::Length(s.len()));
        }
        // from_str_radix would also accept a leading sign
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(GeneratorSeedParseError::Digits(s.to_owned()));
        }
        let num = u128::from_str_radix(s, 16)
            .map_err(|_| GeneratorSeedParseError::Digits(s.to_owned()))?;
        Ok(Self(num.to_be_bytes()))
    }
}

impl Serialize for GeneratorSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GeneratorSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        hex_str.parse().map_err(serde::de::Error::custom)
    }
}

/// Allows generating random seeds with `rng.random()`.
impl Distribution<GeneratorSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> GeneratorSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        GeneratorSeed(seed)
    }
}

/// Deals the pieces offered at each drop.
///
/// The generation mode depends only on the drop count (see
/// [`GeneratorConfig::mode_for_drop`]) unless a continue was requested. The
/// pool of shapes grows with the drop count, and the last
/// [`RECENT_SHAPES`] generated shapes are kept out of the next picks for as
/// long as anything else is available.
///
/// Generation never fails: every path ends in a fallback that yields a piece.
///
/// - Favorable picks fall back to random picks when no candidate scores.
/// - Random picks fall back to a uniform pick over the unlocked shapes when
///   no weighted candidate remains.
///
/// # Example
///
/// ```
/// use gridblast_engine::{
///     Board, GeneratorConfig, PieceGenerator, PieceIdAllocator, ShapeCatalog,
/// };
///
/// let catalog = ShapeCatalog::standard().unwrap();
/// let config = GeneratorConfig::for_catalog(&catalog);
/// let mut generator = PieceGenerator::new(catalog, config).unwrap();
/// let mut ids = PieceIdAllocator::new();
///
/// generator.increment_drop();
/// let pieces = generator.generate_three(&Board::EMPTY, &mut ids);
/// assert_eq!(pieces.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct PieceGenerator {
    catalog: ShapeCatalog,
    config: GeneratorConfig,
    rng: Pcg32,
    drop_count: usize,
    recent: VecDeque<ShapeId>,
    continue_requested: bool,
}

impl PieceGenerator {
    /// Creates a generator with a random seed.
    ///
    /// For reproducible sequences, use [`Self::with_seed`] instead.
    pub fn new(
        catalog: ShapeCatalog,
        config: GeneratorConfig,
    ) -> Result<Self, GeneratorConfigError> {
        Self::with_seed(catalog, config, rand::rng().random())
    }

    /// Like [`Self::new`], but with a specific seed.
    pub fn with_seed(
        catalog: ShapeCatalog,
        config: GeneratorConfig,
        seed: GeneratorSeed,
    ) -> Result<Self, GeneratorConfigError> {
        config.validate(&catalog)?;
        Ok(Self {
            catalog,
            config,
            rng: Pcg32::from_seed(seed.0),
            drop_count: 0,
            recent: VecDeque::with_capacity(RECENT_SHAPES),
            continue_requested: false,
        })
    }

    #[must_use]
    pub fn catalog(&self) -> &ShapeCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    #[must_use]
    pub fn drop_count(&self) -> usize {
        self.drop_count
    }

    /// Shapes generated most recently, oldest first.
    pub fn recent_shape_ids(&self) -> impl Iterator<Item = ShapeId> + '_ {
        self.recent.iter().copied()
    }

    /// Number of catalog shapes available at the current drop.
    #[must_use]
    pub fn unlocked_count(&self) -> usize {
        self.config.unlocked_count(self.drop_count, self.catalog.len())
    }

    #[must_use]
    pub fn current_mode(&self) -> GenerationMode {
        if self.continue_requested {
            GenerationMode::AdContinue
        } else {
            self.config.mode_for_drop(self.drop_count)
        }
    }

    pub fn increment_drop(&mut self) {
        self.drop_count += 1;
    }

    /// Makes the next [`Self::generate_three`] deal a continue triple.
    pub fn request_continue(&mut self) {
        self.continue_requested = true;
    }

    /// Restarts the drop count and forgets recent shapes. The random source
    /// keeps its state.
    pub fn reset(&mut self) {
        self.drop_count = 0;
        self.recent.clear();
        self.continue_requested = false;
    }

    /// Deals the three pieces of one drop according to [`Self::current_mode`].
    ///
    /// A pending continue request is consumed.
    pub fn generate_three(&mut self, board: &Board, ids: &mut PieceIdAllocator) -> [Piece; 3] {
        let mode = self.current_mode();
        self.continue_requested = false;
        match mode {
            GenerationMode::Favorable => {
                std::array::from_fn(|_| self.generate_favorable(board, ids))
            }
            GenerationMode::Random | GenerationMode::Standard => {
                std::array::from_fn(|_| self.generate_random(ids))
            }
            GenerationMode::AdContinue => {
                let trivial = self.catalog.trivial().id();
                [
                    self.make_piece(trivial, ids),
                    self.make_piece(trivial, ids),
                    self.generate_favorable(board, ids),
                ]
            }
        }
    }

    /// Picks a piece that fits the board well.
    ///
    /// Every unlocked, non-trivial, non-recent shape with a positive weight is
    /// ranked by its best placement; one of the
    /// [`favorable_top_k`](GeneratorConfig::favorable_top_k) best is drawn with
    /// probability proportional to its score. Degrades to
    /// [`Self::generate_random`] if nothing scores.
    pub fn generate_favorable(&mut self, board: &Board, ids: &mut PieceIdAllocator) -> Piece {
        let drop = self.drop_count;
        let unlocked = self.unlocked_count();
        let candidates = rank_candidates(
            board,
            self.catalog
                .prefix(unlocked)
                .iter()
                .filter(|shape| !shape.is_trivial() && !self.recent.contains(&shape.id()))
                .filter_map(|shape| {
                    let weight = self.config.weight(shape.id(), drop);
                    (weight > 0).then_some((shape, weight))
                }),
        );

        let top = &candidates[..candidates.len().min(self.config.favorable_top_k)];
        let Ok(dist) = WeightedIndex::new(top.iter().map(|c| c.score)) else {
            return self.generate_random(ids);
        };
        let shape = top[dist.sample(&mut self.rng)].shape;
        self.make_piece(shape, ids)
    }

    /// Picks a weighted random piece among the unlocked, non-recent shapes.
    ///
    /// Falls back to a uniform pick over all unlocked shapes, recent ones
    /// included, when no shape has a positive weight.
    pub fn generate_random(&mut self, ids: &mut PieceIdAllocator) -> Piece {
        let drop = self.drop_count;
        let unlocked = self.unlocked_count();
        let pool = self.catalog.prefix(unlocked);
        let candidates: Vec<(ShapeId, usize)> = pool
            .iter()
            .filter(|shape| !self.recent.contains(&shape.id()))
            .map(|shape| (shape.id(), self.config.weight(shape.id(), drop)))
            .filter(|&(_, weight)| weight > 0)
            .collect();

        let shape = match WeightedIndex::new(candidates.iter().map(|&(_, weight)| weight)) {
            Ok(dist) => candidates[dist.sample(&mut self.rng)].0,
            Err(_) => pool
                .choose(&mut self.rng)
                .map_or_else(|| self.catalog.trivial().id(), Shape::id),
        };
        self.make_piece(shape, ids)
    }

    fn make_piece(&mut self, shape: ShapeId, ids: &mut PieceIdAllocator) -> Piece {
        if self.recent.len() == RECENT_SHAPES {
            self.recent.pop_front();
        }
        self.recent.push_back(shape);
        Piece::new(shape, self.rng.random(), ids.allocate())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::{ColorTag, Position};

    use super::*;

    const SEED: GeneratorSeed = GeneratorSeed([
        0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77,
        0x88,
    ]);

    fn generator_with(edit: impl FnOnce(&mut GeneratorConfig)) -> PieceGenerator {
        let catalog = ShapeCatalog::standard().unwrap();
        let mut config = GeneratorConfig::for_catalog(&catalog);
        edit(&mut config);
        PieceGenerator::with_seed(catalog, config, SEED).unwrap()
    }

    fn generator() -> PieceGenerator {
        generator_with(|_| {})
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let catalog = ShapeCatalog::standard().unwrap();
        let mut config = GeneratorConfig::for_catalog(&catalog);
        config.weights.truncate(3);
        assert!(matches!(
            PieceGenerator::with_seed(catalog, config, SEED),
            Err(GeneratorConfigError::WeightRowCount { actual: 3, .. })
        ));
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = generator();
        let mut b = generator();
        let mut ids_a = PieceIdAllocator::new();
        let mut ids_b = PieceIdAllocator::new();
        let mut board = Board::EMPTY;
        for turn in 0..30 {
            a.increment_drop();
            b.increment_drop();
            let pieces = a.generate_three(&board, &mut ids_a);
            assert_eq!(pieces, b.generate_three(&board, &mut ids_b));

            let piece = pieces[0];
            let shape = a.catalog().shape(piece.shape());
            if let Some(origin) = Position::all().find(|&p| board.can_place(shape, p)) {
                let result = board.place(shape, origin, piece.color()).unwrap();
                board.clear_lines(result.completed_lines());
            } else {
                board = Board::EMPTY;
            }
            assert_eq!(a.drop_count(), turn + 1);
        }
    }

    #[test]
    fn test_recent_shapes_are_bounded_fifo() {
        let mut generator = generator();
        let mut ids = PieceIdAllocator::new();
        generator.increment_drop();
        let mut generated = vec![];
        for _ in 0..4 {
            generated.extend(
                generator
                    .generate_three(&Board::EMPTY, &mut ids)
                    .map(|p| p.shape()),
            );
            let recent: Vec<_> = generator.recent_shape_ids().collect();
            assert_eq!(recent, generated[generated.len() - RECENT_SHAPES..]);
        }
    }

    #[test]
    fn test_triple_has_no_repeats_when_pool_allows() {
        let mut generator = generator();
        let mut ids = PieceIdAllocator::new();
        for _ in 0..40 {
            generator.increment_drop();
            let [a, b, c] = generator
                .generate_three(&Board::EMPTY, &mut ids)
                .map(|p| p.shape());
            assert!(a != b && b != c && a != c);
        }
    }

    #[test]
    fn test_piece_ids_come_from_allocator() {
        let mut generator = generator();
        let mut ids = PieceIdAllocator::new();
        let first = generator.generate_three(&Board::EMPTY, &mut ids);
        let second = generator.generate_three(&Board::EMPTY, &mut ids);
        let all: Vec<_> = first.iter().chain(&second).map(|p| p.id().get()).collect();
        assert_eq!(all, [0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_random_with_all_weights_zero_still_yields_piece() {
        let mut generator = generator_with(|config| {
            for row in &mut config.weights {
                row.fill(0);
            }
        });
        let mut ids = PieceIdAllocator::new();
        let unlocked = generator.unlocked_count();
        for _ in 0..20 {
            let piece = generator.generate_random(&mut ids);
            assert!(piece.shape().index() < unlocked);
        }
    }

    #[test]
    fn test_single_unlocked_shape_in_recent_list() {
        let mut generator = generator_with(|config| {
            config.initial_unlocked = 1;
            config.unlock_start_drop = 1000;
        });
        let mut ids = PieceIdAllocator::new();
        let trivial = generator.catalog().trivial().id();
        assert_eq!(generator.generate_random(&mut ids).shape(), trivial);
        assert_eq!(generator.recent_shape_ids().collect::<Vec<_>>(), [trivial]);
        assert_eq!(generator.generate_random(&mut ids).shape(), trivial);

        // no non-trivial candidate: favorable degrades to random
        let pieces = generator.generate_three(&Board::EMPTY, &mut ids);
        assert!(pieces.iter().all(|p| p.shape() == trivial));
    }

    #[test]
    fn test_favorable_on_empty_board_is_never_trivial() {
        let mut generator = generator();
        let mut ids = PieceIdAllocator::new();
        let trivial = generator.catalog().trivial().id();
        for _ in 0..100 {
            let piece = generator.generate_favorable(&Board::EMPTY, &mut ids);
            assert_ne!(piece.shape(), trivial);
        }
    }

    #[test]
    fn test_favorable_top_one_takes_best_candidate() {
        let mut generator = generator_with(|config| config.favorable_top_k = 1);
        let mut ids = PieceIdAllocator::new();

        let mut board = Board::EMPTY;
        let line = generator
            .catalog()
            .shapes()
            .iter()
            .find(|s| s.name() == "tri-line-h")
            .unwrap();
        board.place(line, Position::new(0, 7), ColorTag::Red).unwrap();
        board.place(line, Position::new(3, 7), ColorTag::Red).unwrap();

        let expected = rank_candidates(
            &board,
            generator
                .catalog()
                .prefix(generator.unlocked_count())
                .iter()
                .filter(|s| !s.is_trivial())
                .map(|s| (s, generator.config().weight(s.id(), 0))),
        )[0];

        let piece = generator.generate_favorable(&board, &mut ids);
        assert_eq!(piece.shape(), expected.shape);
    }

    #[test]
    fn test_favorable_draws_among_top_candidates() {
        let mut generator = generator();
        let mut ids = PieceIdAllocator::new();
        assert_eq!(generator.config().favorable_top_k, 5);

        // Rows 0-3 are full except column 7: five shapes can clear rows there,
        // everything else scores far lower in rows 4-7.
        let mut board = Board::EMPTY;
        let dot = generator.catalog().trivial();
        for y in 0..4 {
            for x in 0..7 {
                board.place(dot, Position::new(x, y), ColorTag::Red).unwrap();
            }
        }

        let mut below_best = 0;
        let mut drawn = HashSet::new();
        for _ in 0..200 {
            let ranked = rank_candidates(
                &board,
                generator
                    .catalog()
                    .prefix(generator.unlocked_count())
                    .iter()
                    .filter(|s| !s.is_trivial())
                    .filter(|s| !generator.recent_shape_ids().any(|id| id == s.id()))
                    .map(|s| (s, generator.config().weight(s.id(), 0)))
                    .filter(|&(_, weight)| weight > 0),
            );
            assert!(ranked.len() > 5);
            assert!(ranked[0].score > ranked[4].score);
            let top: Vec<ShapeId> = ranked[..5].iter().map(|c| c.shape).collect();

            let piece = generator.generate_favorable(&board, &mut ids);
            assert!(top.contains(&piece.shape()), "{:?} not in {top:?}", piece.shape());
            if piece.shape() != top[0] {
                below_best += 1;
            }
            drawn.insert(piece.shape());
        }
        assert!(below_best > 0);
        assert!(drawn.len() > 1);
    }

    #[test]
    fn test_continue_request_deals_trivial_pair_once() {
        let mut generator = generator();
        let mut ids = PieceIdAllocator::new();
        let trivial = generator.catalog().trivial().id();
        for _ in 0..50 {
            generator.increment_drop();
        }
        assert_eq!(generator.current_mode(), GenerationMode::Standard);

        generator.request_continue();
        assert_eq!(generator.current_mode(), GenerationMode::AdContinue);
        let [a, b, c] = generator.generate_three(&Board::EMPTY, &mut ids);
        assert_eq!(a.shape(), trivial);
        assert_eq!(b.shape(), trivial);
        assert_ne!(c.shape(), trivial);
        assert_eq!(generator.current_mode(), GenerationMode::Standard);
    }

    #[test]
    fn test_reset_restarts_drop_count() {
        let mut generator = generator();
        let mut ids = PieceIdAllocator::new();
        for _ in 0..20 {
            generator.increment_drop();
        }
        generator.request_continue();
        generator.generate_random(&mut ids);
        assert_eq!(generator.unlocked_count(), 31);

        generator.reset();
        assert_eq!(generator.drop_count(), 0);
        assert_eq!(generator.recent_shape_ids().count(), 0);
        assert_eq!(generator.unlocked_count(), 19);
        assert_eq!(generator.current_mode(), GenerationMode::Favorable);
    }

    mod seed_serialization {
        use super::*;

        #[test]
        fn test_roundtrip_random_seed() {
            let seed: GeneratorSeed = rand::rng().random();
            let serialized = serde_json::to_string(&seed).unwrap();
            let deserialized: GeneratorSeed = serde_json::from_str(&serialized).unwrap();
            assert_eq!(seed, deserialized);
        }

        #[test]
        fn test_known_value_sequential_bytes() {
            let seed = GeneratorSeed([
                0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF, 0xFE, 0xDC, 0xBA, 0x98, 0x76, 0x54,
                0x32, 0x10,
            ]);
            let serialized = serde_json::to_string(&seed).unwrap();
            assert_eq!(serialized, "\"0123456789abcdeffedcba9876543210\"");
            assert_eq!(
                "0123456789ABCDEFFEDCBA9876543210".parse::<GeneratorSeed>(),
                Ok(seed)
            );
        }

        #[test]
        fn test_parse_errors() {
            assert_eq!(
                "0123".parse::<GeneratorSeed>(),
                Err(GeneratorSeedParseError::Length(4))
            );
            assert!(matches!(
                "+123456789abcdef0123456789abcdef".parse::<GeneratorSeed>(),
                Err(GeneratorSeedParseError::Digits(_))
            ));
            let result: Result<GeneratorSeed, _> =
                serde_json::from_str("\"ghijklmnopqrstuvwxyzghijklmnopqr\"");
            assert!(result.unwrap_err().to_string().contains("invalid hex"));
        }
    }
}
