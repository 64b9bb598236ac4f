pub use self::{board::*, piece::*, shape::*};

pub(crate) mod board;
pub(crate) mod piece;
pub(crate) mod shape;

/// Width and height of the square play field.
pub const BOARD_SIZE: usize = 8;
