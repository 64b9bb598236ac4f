use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use super::BOARD_SIZE;

/// Maximum number of cells a single shape may occupy (a full 3×3 square).
pub const MAX_SHAPE_CELLS: usize = 9;

/// Index of a shape within its [`ShapeCatalog`].
///
/// Ids are dense: the `n`-th catalog entry has id `n`. The generator's unlock
/// schedule relies on this ordering, since it exposes catalog prefixes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    derive_more::Display,
)]
#[serde(transparent)]
#[display("#{_0}")]
pub struct ShapeId(usize);

impl ShapeId {
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ShapeError {
    #[display("shape has no cells")]
    EmptyShape,
    #[display("shape has {count} cells, at most {MAX_SHAPE_CELLS} allowed")]
    TooManyCells { count: usize },
    #[display("shape lists cell ({x}, {y}) more than once")]
    DuplicateCell { x: i8, y: i8 },
    #[display("shape spans {width}x{height} cells, larger than the board")]
    TooLarge { width: usize, height: usize },
}

/// Axis-aligned bounds of a shape's raw cell offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_x: i8,
    pub min_y: i8,
    pub width: usize,
    pub height: usize,
}

impl BoundingBox {
    /// Computes the bounds of a set of offsets.
    ///
    /// Returns `None` for an empty slice.
    #[must_use]
    pub fn of(cells: &[(i8, i8)]) -> Option<Self> {
        let (&(x0, y0), rest) = cells.split_first()?;
        let (mut min_x, mut max_x, mut min_y, mut max_y) = (x0, x0, y0, y0);
        for &(x, y) in rest {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
        Some(Self {
            min_x,
            min_y,
            width: usize::from(max_x.abs_diff(min_x)) + 1,
            height: usize::from(max_y.abs_diff(min_y)) + 1,
        })
    }
}

/// An immutable polyomino template.
///
/// Cells are stored as authored (offsets need not start at the origin) and,
/// additionally, normalized against the bounding-box minimum. Board operations
/// only ever use the normalized form, so a shape's footprint is anchored at the
/// origin passed to [`Board::can_place`](super::Board::can_place).
///
/// # Example
///
/// ```
/// use gridblast_engine::{Shape, ShapeId};
///
/// let t = Shape::new(ShapeId::new(0), "t", &[(-1, 0), (0, 0), (1, 0), (0, 1)]).unwrap();
/// assert_eq!(t.cell_count(), 4);
/// assert_eq!((t.bounds().width, t.bounds().height), (3, 2));
/// assert!(t.normalized_cells().any(|c| c == (0, 0)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    id: ShapeId,
    name: String,
    cells: ArrayVec<(i8, i8), MAX_SHAPE_CELLS>,
    normalized: ArrayVec<(usize, usize), MAX_SHAPE_CELLS>,
    bounds: BoundingBox,
}

impl Shape {
    pub fn new(
        id: ShapeId,
        name: impl Into<String>,
        cells: &[(i8, i8)],
    ) -> Result<Self, ShapeError> {
        let bounds = BoundingBox::of(cells).ok_or(ShapeError::EmptyShape)?;
        if cells.len() > MAX_SHAPE_CELLS {
            return Err(ShapeError::TooManyCells { count: cells.len() });
        }
        if bounds.width > BOARD_SIZE || bounds.height > BOARD_SIZE {
            return Err(ShapeError::TooLarge {
                width: bounds.width,
                height: bounds.height,
            });
        }
        for (i, &(x, y)) in cells.iter().enumerate() {
            if cells[..i].contains(&(x, y)) {
                return Err(ShapeError::DuplicateCell { x, y });
            }
        }

        let normalized = cells
            .iter()
            .map(|&(x, y)| {
                (
                    usize::from(x.abs_diff(bounds.min_x)),
                    usize::from(y.abs_diff(bounds.min_y)),
                )
            })
            .collect();

        Ok(Self {
            id,
            name: name.into(),
            cells: cells.iter().copied().collect(),
            normalized,
            bounds,
        })
    }

    #[must_use]
    pub fn id(&self) -> ShapeId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw offsets as authored.
    #[must_use]
    pub fn cells(&self) -> &[(i8, i8)] {
        &self.cells
    }

    /// Offsets shifted so the bounding box starts at `(0, 0)`.
    pub fn normalized_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.normalized.iter().copied()
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    #[must_use]
    pub fn is_trivial(&self) -> bool {
        self.cells.len() == 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum CatalogError {
    #[display("shape catalog is empty")]
    Empty,
    #[display("invalid shape #{index} ({name}): {source}")]
    InvalidShape {
        index: usize,
        name: String,
        source: ShapeError,
    },
    #[display("shape catalog has no single-cell shape")]
    MissingTrivialShape,
}

/// Registry of every shape the game can offer, in unlock order.
#[derive(Debug, Clone)]
pub struct ShapeCatalog {
    shapes: Vec<Shape>,
    trivial: ShapeId,
}

impl ShapeCatalog {
    /// Builds a catalog from `(name, cells)` definitions, assigning ids in order.
    ///
    /// Fails on the first malformed shape, or when no single-cell shape exists
    /// (the continue flow and generator fallbacks depend on it).
    pub fn new<'a, I, N>(definitions: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (N, &'a [(i8, i8)])>,
        N: Into<String>,
    {
        let shapes = definitions
            .into_iter()
            .enumerate()
            .map(|(index, (name, cells))| {
                let name: String = name.into();
                Shape::new(ShapeId::new(index), name.clone(), cells).map_err(|source| {
                    CatalogError::InvalidShape {
                        index,
                        name,
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if shapes.is_empty() {
            return Err(CatalogError::Empty);
        }
        let trivial = shapes
            .iter()
            .find(|shape| shape.is_trivial())
            .map(Shape::id)
            .ok_or(CatalogError::MissingTrivialShape)?;
        Ok(Self { shapes, trivial })
    }

    /// The built-in 37-shape catalog, simplest shapes first.
    pub fn standard() -> Result<Self, CatalogError> {
        Self::new(STANDARD_SHAPES.iter().copied())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(id.index())
    }

    /// Returns the shape for an id issued by this catalog.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range for this catalog.
    #[must_use]
    pub fn shape(&self, id: ShapeId) -> &Shape {
        &self.shapes[id.index()]
    }

    #[must_use]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// The first `count` shapes (clamped to the catalog size).
    #[must_use]
    pub fn prefix(&self, count: usize) -> &[Shape] {
        &self.shapes[..count.min(self.shapes.len())]
    }

    /// The single-cell shape used by the continue flow.
    #[must_use]
    pub fn trivial(&self) -> &Shape {
        self.shape(self.trivial)
    }
}

/// Number of shapes in [`ShapeCatalog::standard`].
pub const STANDARD_SHAPE_COUNT: usize = STANDARD_SHAPES.len();

const STANDARD_SHAPES: &[(&str, &[(i8, i8)])] = &[
    ("dot", &[(0, 0)]),
    ("domino-h", &[(0, 0), (1, 0)]),
    ("domino-v", &[(0, 0), (0, 1)]),
    ("tri-line-h", &[(-1, 0), (0, 0), (1, 0)]),
    ("tri-line-v", &[(0, -1), (0, 0), (0, 1)]),
    ("tri-corner-nw", &[(0, 0), (1, 0), (0, 1)]),
    ("tri-corner-ne", &[(0, 0), (1, 0), (1, 1)]),
    ("tri-corner-sw", &[(0, 0), (0, 1), (1, 1)]),
    ("tri-corner-se", &[(1, 0), (0, 1), (1, 1)]),
    ("square-2", &[(0, 0), (1, 0), (0, 1), (1, 1)]),
    ("line-4-h", &[(-2, 0), (-1, 0), (0, 0), (1, 0)]),
    ("line-4-v", &[(0, -2), (0, -1), (0, 0), (0, 1)]),
    ("t-up", &[(-1, 0), (0, 0), (1, 0), (0, -1)]),
    ("t-down", &[(-1, 0), (0, 0), (1, 0), (0, 1)]),
    ("t-left", &[(0, -1), (0, 0), (0, 1), (-1, 0)]),
    ("t-right", &[(0, -1), (0, 0), (0, 1), (1, 0)]),
    ("s-h", &[(1, 0), (2, 0), (0, 1), (1, 1)]),
    ("z-h", &[(0, 0), (1, 0), (1, 1), (2, 1)]),
    ("s-v", &[(0, 0), (0, 1), (1, 1), (1, 2)]),
    ("z-v", &[(1, 0), (1, 1), (0, 1), (0, 2)]),
    ("l-0", &[(0, 0), (0, 1), (0, 2), (1, 2)]),
    ("l-90", &[(0, 0), (1, 0), (2, 0), (0, 1)]),
    ("l-180", &[(0, 0), (1, 0), (1, 1), (1, 2)]),
    ("l-270", &[(2, 0), (0, 1), (1, 1), (2, 1)]),
    ("j-0", &[(1, 0), (1, 1), (1, 2), (0, 2)]),
    ("j-90", &[(0, 0), (0, 1), (1, 1), (2, 1)]),
    ("j-180", &[(0, 0), (1, 0), (0, 1), (0, 2)]),
    ("j-270", &[(0, 0), (1, 0), (2, 0), (2, 1)]),
    ("line-5-h", &[(0, 0), (1, 0), (2, 0), (3, 0), (4, 0)]),
    ("line-5-v", &[(0, 0), (0, 1), (0, 2), (0, 3), (0, 4)]),
    ("rect-3x2", &[(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]),
    ("rect-2x3", &[(0, 0), (1, 0), (0, 1), (1, 1), (0, 2), (1, 2)]),
    (
        "square-3",
        &[
            (-1, -1),
            (0, -1),
            (1, -1),
            (-1, 0),
            (0, 0),
            (1, 0),
            (-1, 1),
            (0, 1),
            (1, 1),
        ],
    ),
    ("corner-5-nw", &[(0, 0), (1, 0), (2, 0), (0, 1), (0, 2)]),
    ("corner-5-ne", &[(0, 0), (1, 0), (2, 0), (2, 1), (2, 2)]),
    ("corner-5-sw", &[(0, 0), (0, 1), (0, 2), (1, 2), (2, 2)]),
    ("corner-5-se", &[(2, 0), (2, 1), (2, 2), (1, 2), (0, 2)]),
];

const _: () = {
    assert!(!STANDARD_SHAPES.is_empty());
    assert!(STANDARD_SHAPES[0].1.len() == 1);
    let mut i = 0;
    while i < STANDARD_SHAPES.len() {
        let cells = STANDARD_SHAPES[i].1;
        assert!(!cells.is_empty() && cells.len() <= MAX_SHAPE_CELLS);
        i += 1;
    }
};
