use std::fmt;

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use crate::InvalidPlacementError;

use super::{
    BOARD_SIZE,
    piece::ColorTag,
    shape::{MAX_SHAPE_CELLS, Shape},
};

/// A single square of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Filled(ColorTag),
}

impl Cell {
    #[must_use]
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }

    #[must_use]
    pub fn is_occupied(self) -> bool {
        !self.is_empty()
    }

    #[must_use]
    pub fn color(self) -> Option<ColorTag> {
        match self {
            Cell::Empty => None,
            Cell::Filled(color) => Some(color),
        }
    }
}

/// Board coordinates: `x` is the column, `y` the row, `(0, 0)` is top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    #[must_use]
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// All 64 on-board positions in row-major order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..BOARD_SIZE).flat_map(|y| (0..BOARD_SIZE).map(move |x| Self::new(x, y)))
    }

    #[must_use]
    pub const fn is_on_board(self) -> bool {
        self.x < BOARD_SIZE && self.y < BOARD_SIZE
    }
}

/// A row or a column, decoded from a [`LineIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Row(usize),
    Column(usize),
}

impl Line {
    /// The eight positions covered by this line.
    pub fn positions(self) -> impl Iterator<Item = Position> {
        (0..BOARD_SIZE).map(move |i| match self {
            Line::Row(y) => Position::new(i, y),
            Line::Column(x) => Position::new(x, i),
        })
    }
}

/// Single integer namespace for rows and columns.
///
/// `0..=7` are rows, `8..=15` are columns (`index - 8` is the column). This is
/// the encoding exchanged with the presentation layer and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct LineIndex(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("line index {_0} out of range 0..16")]
pub struct LineIndexOutOfRange(#[error(not(source))] usize);

impl LineIndex {
    /// Number of distinct line indices (8 rows + 8 columns).
    pub const COUNT: usize = 2 * BOARD_SIZE;

    #[must_use]
    pub const fn new(index: usize) -> Option<Self> {
        if index < Self::COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn row(y: usize) -> Self {
        assert!(y < BOARD_SIZE);
        Self(y)
    }

    #[must_use]
    pub const fn column(x: usize) -> Self {
        assert!(x < BOARD_SIZE);
        Self(BOARD_SIZE + x)
    }

    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }

    #[must_use]
    pub const fn is_row(self) -> bool {
        self.0 < BOARD_SIZE
    }

    #[must_use]
    pub const fn decode(self) -> Line {
        if self.is_row() {
            Line::Row(self.0)
        } else {
            Line::Column(self.0 - BOARD_SIZE)
        }
    }
}

impl From<Line> for LineIndex {
    fn from(line: Line) -> Self {
        match line {
            Line::Row(y) => Self::row(y),
            Line::Column(x) => Self::column(x),
        }
    }
}

impl TryFrom<usize> for LineIndex {
    type Error = LineIndexOutOfRange;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Self::new(index).ok_or(LineIndexOutOfRange(index))
    }
}

impl From<LineIndex> for usize {
    fn from(index: LineIndex) -> Self {
        index.0
    }
}

/// Lines completed by one placement (at most every row and column).
pub type LineList = ArrayVec<LineIndex, { LineIndex::COUNT }>;

/// Set of board positions, one bit per cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellSet(u64);

impl CellSet {
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    const fn bit(pos: Position) -> u64 {
        1 << (pos.y * BOARD_SIZE + pos.x)
    }

    /// Adds `pos`, returning `false` if it was already present.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is off the board.
    pub fn insert(&mut self, pos: Position) -> bool {
        assert!(pos.is_on_board(), "{pos:?} is off the board");
        let bit = Self::bit(pos);
        let added = self.0 & bit == 0;
        self.0 |= bit;
        added
    }

    #[must_use]
    pub fn contains(&self, pos: Position) -> bool {
        pos.is_on_board() && self.0 & Self::bit(pos) != 0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Members in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = Position> + '_ {
        Position::all().filter(|pos| self.contains(*pos))
    }
}

impl FromIterator<Position> for CellSet {
    fn from_iter<T: IntoIterator<Item = Position>>(iter: T) -> Self {
        let mut set = Self::new();
        for pos in iter {
            set.insert(pos);
        }
        set
    }
}

/// A cell removed by [`Board::clear_lines`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearedCell {
    pub position: Position,
    pub color: ColorTag,
}

/// Outcome of a successful [`Board::place`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementResult {
    cells_placed: ArrayVec<Position, MAX_SHAPE_CELLS>,
    completed_lines: LineList,
}

impl PlacementResult {
    #[must_use]
    pub fn cells_placed(&self) -> &[Position] {
        &self.cells_placed
    }

    /// Rows first, then columns, each in ascending order.
    #[must_use]
    pub fn completed_lines(&self) -> &[LineIndex] {
        &self.completed_lines
    }

    /// One point per placed cell.
    #[must_use]
    pub fn points_from_placement(&self) -> usize {
        self.cells_placed.len()
    }
}

/// Per-line count of cells a hypothetical placement would add.
#[derive(Debug, Clone, Copy)]
struct LineDeltas {
    rows: [usize; BOARD_SIZE],
    cols: [usize; BOARD_SIZE],
}

/// The 8×8 play field.
///
/// Besides the cells themselves the board keeps, for every row and column, the
/// number of occupied cells in it. Every mutation updates those counters, so
/// "is this line full" is a single comparison and placement previews can be
/// computed from count deltas without touching the grid.
///
/// # Example
///
/// ```
/// use gridblast_engine::{Board, ColorTag, Position, ShapeCatalog};
///
/// let catalog = ShapeCatalog::standard().unwrap();
/// let line = catalog.shapes().iter().find(|s| s.name() == "line-4-h").unwrap();
///
/// let mut board = Board::EMPTY;
/// board.place(line, Position::new(0, 7), ColorTag::Red).unwrap();
/// let result = board.place(line, Position::new(4, 7), ColorTag::Blue).unwrap();
/// assert_eq!(result.completed_lines().len(), 1);
///
/// board.clear_lines(result.completed_lines());
/// assert!(board.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
    row_fill: [usize; BOARD_SIZE],
    col_fill: [usize; BOARD_SIZE],
}

impl Default for Board {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Board {
    pub const SIZE: usize = BOARD_SIZE;

    pub const EMPTY: Self = Self {
        cells: [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE],
        row_fill: [0; BOARD_SIZE],
        col_fill: [0; BOARD_SIZE],
    };

    /// Returns the cell at `(x, y)`, or `None` off the board.
    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> Option<Cell> {
        self.cells.get(y)?.get(x).copied()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell; BOARD_SIZE]> {
        self.cells.iter()
    }

    #[must_use]
    pub fn row_fill_count(&self, y: usize) -> Option<usize> {
        self.row_fill.get(y).copied()
    }

    #[must_use]
    pub fn col_fill_count(&self, x: usize) -> Option<usize> {
        self.col_fill.get(x).copied()
    }

    /// Absolute cells `shape` would cover at `origin`, or `None` if any of them
    /// is off the board or occupied.
    fn footprint(
        &self,
        shape: &Shape,
        origin: Position,
    ) -> Option<ArrayVec<Position, MAX_SHAPE_CELLS>> {
        shape
            .normalized_cells()
            .map(|(dx, dy)| {
                let pos = Position::new(origin.x.checked_add(dx)?, origin.y.checked_add(dy)?);
                let free = pos.is_on_board() && self.cells[pos.y][pos.x].is_empty();
                free.then_some(pos)
            })
            .collect()
    }

    fn line_deltas(footprint: &[Position]) -> LineDeltas {
        let mut deltas = LineDeltas {
            rows: [0; BOARD_SIZE],
            cols: [0; BOARD_SIZE],
        };
        for pos in footprint {
            deltas.rows[pos.y] += 1;
            deltas.cols[pos.x] += 1;
        }
        deltas
    }

    /// Lines touched by `deltas` whose count would reach the board size.
    fn lines_reaching_full(&self, deltas: &LineDeltas) -> LineList {
        let rows = (0..BOARD_SIZE)
            .filter(|&y| deltas.rows[y] > 0 && self.row_fill[y] + deltas.rows[y] == BOARD_SIZE)
            .map(LineIndex::row);
        let cols = (0..BOARD_SIZE)
            .filter(|&x| deltas.cols[x] > 0 && self.col_fill[x] + deltas.cols[x] == BOARD_SIZE)
            .map(LineIndex::column);
        rows.chain(cols).collect()
    }

    /// Checks whether `shape` fits with its bounding box anchored at `origin`.
    #[must_use]
    pub fn can_place(&self, shape: &Shape, origin: Position) -> bool {
        self.footprint(shape, origin).is_some()
    }

    /// Cells `shape` would cover at `origin`, for drag-preview highlighting.
    #[must_use]
    pub fn placement_cells(&self, shape: &Shape, origin: Position) -> Option<CellSet> {
        self.footprint(shape, origin).map(|cells| cells.into_iter().collect())
    }

    /// Lines that placing `shape` at `origin` would complete, without placing it.
    ///
    /// Returns `None` if the placement is illegal.
    #[must_use]
    pub fn simulate_placement(&self, shape: &Shape, origin: Position) -> Option<LineList> {
        let footprint = self.footprint(shape, origin)?;
        Some(self.lines_reaching_full(&Self::line_deltas(&footprint)))
    }

    /// Like [`Self::simulate_placement`], but empty for illegal placements.
    #[must_use]
    pub fn completable_lines(&self, shape: &Shape, origin: Position) -> LineList {
        self.simulate_placement(shape, origin).unwrap_or_default()
    }

    /// Locks `shape` onto the board.
    ///
    /// Fails without side effects when [`Self::can_place`] would return `false`.
    /// Completed lines are reported but not cleared; see [`Self::clear_lines`].
    pub fn place(
        &mut self,
        shape: &Shape,
        origin: Position,
        color: ColorTag,
    ) -> Result<PlacementResult, InvalidPlacementError> {
        let cells_placed = self.footprint(shape, origin).ok_or(InvalidPlacementError)?;
        let deltas = Self::line_deltas(&cells_placed);

        for pos in &cells_placed {
            self.cells[pos.y][pos.x] = Cell::Filled(color);
            self.row_fill[pos.y] += 1;
            self.col_fill[pos.x] += 1;
        }

        let rows = (0..BOARD_SIZE)
            .filter(|&y| deltas.rows[y] > 0 && self.row_fill[y] == BOARD_SIZE)
            .map(LineIndex::row);
        let cols = (0..BOARD_SIZE)
            .filter(|&x| deltas.cols[x] > 0 && self.col_fill[x] == BOARD_SIZE)
            .map(LineIndex::column);
        let completed_lines = rows.chain(cols).collect();

        Ok(PlacementResult {
            cells_placed,
            completed_lines,
        })
    }

    /// Empties every cell on the given lines.
    ///
    /// A cell at the intersection of a cleared row and a cleared column is
    /// removed (and reported) once. Already empty cells are skipped, so clearing
    /// a line that is not full only removes its occupied cells.
    pub fn clear_lines(&mut self, lines: &[LineIndex]) -> Vec<ClearedCell> {
        let targets: CellSet = lines
            .iter()
            .flat_map(|line| line.decode().positions())
            .collect();

        let mut cleared = Vec::with_capacity(targets.len());
        for pos in targets.iter() {
            let Cell::Filled(color) = self.cells[pos.y][pos.x] else {
                continue;
            };
            self.cells[pos.y][pos.x] = Cell::Empty;
            self.row_fill[pos.y] -= 1;
            self.col_fill[pos.x] -= 1;
            cleared.push(ClearedCell {
                position: pos,
                color,
            });
        }
        cleared
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.iter().flatten().all(|cell| cell.is_empty())
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.cells.iter().flatten().all(|cell| cell.is_occupied())
    }

    #[must_use]
    pub fn occupied_cell_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| cell.is_occupied())
            .count()
    }

    /// Checks whether at least one of `shapes` fits anywhere on the board.
    ///
    /// `false` means the game is over for that set of pieces.
    pub fn has_any_valid_move<'a, I>(&self, shapes: I) -> bool
    where
        I: IntoIterator<Item = &'a Shape>,
    {
        shapes
            .into_iter()
            .any(|shape| Position::all().any(|origin| self.can_place(shape, origin)))
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            for cell in row {
                f.write_str(if cell.is_occupied() { "#" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
