use rand::{Rng, distr::StandardUniform, prelude::Distribution};
use serde::{Deserialize, Serialize};

use super::shape::ShapeId;

/// One of the seven fixed colours a piece can be painted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ColorTag {
    Red = 0,
    Orange = 1,
    Yellow = 2,
    Green = 3,
    Cyan = 4,
    Blue = 5,
    Purple = 6,
}

impl ColorTag {
    /// Number of colour tags (7).
    pub const LEN: usize = 7;

    pub const ALL: [Self; Self::LEN] = [
        Self::Red,
        Self::Orange,
        Self::Yellow,
        Self::Green,
        Self::Cyan,
        Self::Blue,
        Self::Purple,
    ];
}

/// Colour assignment is a pure function of the random source.
impl Distribution<ColorTag> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> ColorTag {
        ColorTag::ALL[rng.random_range(0..ColorTag::LEN)]
    }
}

/// Unique id of a generated piece within a session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    derive_more::Display,
)]
#[serde(transparent)]
pub struct PieceId(u64);

impl PieceId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Hands out monotonically increasing [`PieceId`]s.
///
/// Owned by whoever drives the game and passed into piece generation, so id
/// sequences restart with a fresh allocator.
#[derive(Debug, Clone, Default)]
pub struct PieceIdAllocator {
    next: u64,
}

impl PieceIdAllocator {
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    pub fn allocate(&mut self) -> PieceId {
        let id = PieceId(self.next);
        self.next += 1;
        id
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }
}

/// A live instance of a shape offered to the player for one drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    shape: ShapeId,
    color: ColorTag,
    id: PieceId,
}

impl Piece {
    #[must_use]
    pub const fn new(shape: ShapeId, color: ColorTag, id: PieceId) -> Self {
        Self { shape, color, id }
    }

    #[must_use]
    pub const fn shape(&self) -> ShapeId {
        self.shape
    }

    #[must_use]
    pub const fn color(&self) -> ColorTag {
        self.color
    }

    #[must_use]
    pub const fn id(&self) -> PieceId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_allocator_is_monotonic_and_resettable() {
        let mut ids = PieceIdAllocator::new();
        let a = ids.allocate();
        let b = ids.allocate();
        assert!(a < b);
        assert_eq!(b.get(), 1);

        ids.reset();
        assert_eq!(ids.allocate(), a);
    }

    #[test]
    fn test_color_sampling_covers_all_tags() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut seen = [false; ColorTag::LEN];
        for _ in 0..500 {
            let color: ColorTag = rng.random();
            seen[color as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_piece_serialization() {
        let piece = Piece::new(ShapeId::new(3), ColorTag::Cyan, PieceId(12));
        let json = serde_json::to_string(&piece).unwrap();
        assert_eq!(json, r#"{"shape":3,"color":"Cyan","id":12}"#);
        let back: Piece = serde_json::from_str(&json).unwrap();
        assert_eq!(back, piece);
    }
}
