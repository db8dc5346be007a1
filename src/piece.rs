use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ============================================================================
// Shapes
// ============================================================================

/// Offsets are stored in half-cell units. A block lands on
/// `anchor + ceil(offset / 2)`, which lets the O piece pivot around the corner
/// shared by its four cells while every other piece pivots on a cell.
pub type Offset = (i16, i16);

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum ShapeKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

/// RGB color token used by the renderer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rgb(pub u8, pub u8, pub u8);

struct ShapeDef {
    offsets: [Offset; 4],
    color: Rgb,
}

static SHAPES: [ShapeDef; 7] = [
    // I
    ShapeDef {
        offsets: [(0, -2), (0, 0), (0, 2), (0, 4)],
        color: Rgb(0, 255, 255),
    },
    // O
    ShapeDef {
        offsets: [(-1, -1), (1, -1), (-1, 1), (1, 1)],
        color: Rgb(255, 255, 0),
    },
    // T
    ShapeDef {
        offsets: [(-2, 0), (0, 0), (2, 0), (0, 2)],
        color: Rgb(128, 0, 128),
    },
    // S
    ShapeDef {
        offsets: [(-2, 0), (0, 0), (0, 2), (2, 2)],
        color: Rgb(0, 255, 0),
    },
    // Z
    ShapeDef {
        offsets: [(2, 0), (0, 0), (0, 2), (-2, 2)],
        color: Rgb(255, 0, 0),
    },
    // J
    ShapeDef {
        offsets: [(-2, 0), (0, 0), (2, 0), (-2, 2)],
        color: Rgb(0, 0, 255),
    },
    // L
    ShapeDef {
        offsets: [(-2, 0), (0, 0), (2, 0), (2, 2)],
        color: Rgb(255, 165, 0),
    },
];

impl ShapeKind {
    pub const ALL: [ShapeKind; 7] = [
        ShapeKind::I,
        ShapeKind::O,
        ShapeKind::T,
        ShapeKind::S,
        ShapeKind::Z,
        ShapeKind::J,
        ShapeKind::L,
    ];

    fn def(self) -> &'static ShapeDef {
        &SHAPES[self as usize]
    }

    /// Spawn-orientation offsets, in half-cell units.
    pub fn offsets(self) -> [Offset; 4] {
        self.def().offsets
    }

    pub fn color(self) -> Rgb {
        self.def().color
    }

    fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }
}

// ============================================================================
// Piece
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Position {
    pub x: i16,
    pub y: i16,
}

/// The falling piece: a shape kind, its current (possibly rotated) offsets and
/// an anchor in grid coordinates.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Piece {
    pub kind: ShapeKind,
    pub offsets: [Offset; 4],
    pub position: Position,
}

fn half_to_cell(v: i16) -> i16 {
    (v + 1).div_euclid(2)
}

impl Piece {
    /// Places `kind` at `spawn_column` with its topmost block on row 0.
    pub fn spawn(kind: ShapeKind, spawn_column: i16) -> Self {
        let offsets = kind.offsets();
        let min_dy = offsets.iter().map(|&(_, dy)| half_to_cell(dy)).min().unwrap_or(0);
        Self::new_at(kind, spawn_column, -min_dy)
    }

    pub fn new_at(kind: ShapeKind, x: i16, y: i16) -> Self {
        Self {
            kind,
            offsets: kind.offsets(),
            position: Position { x, y },
        }
    }

    pub fn color(&self) -> Rgb {
        self.kind.color()
    }

    /// Grid cells covered by the piece. May include rows above the grid.
    pub fn blocks(&self) -> [Position; 4] {
        self.offsets.map(|(dx, dy)| Position {
            x: self.position.x + half_to_cell(dx),
            y: self.position.y + half_to_cell(dy),
        })
    }

    /// Copy translated by `(dx, dy)` cells.
    pub fn moved(&self, dx: i16, dy: i16) -> Self {
        Self {
            position: Position {
                x: self.position.x + dx,
                y: self.position.y + dy,
            },
            ..*self
        }
    }

    /// Copy turned a quarter turn with `(x, y) -> (y, -x)`; the anchor stays put.
    pub fn rotated(&self) -> Self {
        Self {
            offsets: self.offsets.map(|(x, y)| (y, -x)),
            ..*self
        }
    }
}

// ============================================================================
// Piece Provider Trait
// ============================================================================

pub trait PieceProvider {
    fn next_piece(&mut self) -> ShapeKind;
}

/// Uniform choice over the seven kinds.
pub struct RandomPieceProvider {
    rng: StdRng,
}

impl RandomPieceProvider {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPieceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceProvider for RandomPieceProvider {
    fn next_piece(&mut self) -> ShapeKind {
        ShapeKind::from_index(self.rng.gen_range(0..ShapeKind::ALL.len()))
    }
}

/// Cycles through a fixed list. An empty list yields O pieces.
pub struct SequencePieceProvider {
    pieces: Vec<ShapeKind>,
    index: usize,
}

impl SequencePieceProvider {
    pub fn new(pieces: Vec<ShapeKind>) -> Self {
        Self { pieces, index: 0 }
    }
}

impl PieceProvider for SequencePieceProvider {
    fn next_piece(&mut self) -> ShapeKind {
        if self.pieces.is_empty() {
            return ShapeKind::O;
        }
        let piece = self.pieces[self.index % self.pieces.len()];
        self.index += 1;
        piece
    }
}
