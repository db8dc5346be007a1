//! Movement and rotation rules.
//!
//! Every change to the active piece is proposed as a new `Piece` value,
//! checked against the grid, and only then written back.

use crate::grid::Grid;
use crate::piece::Piece;

/// True if any block of `piece` hits a wall, the floor, or a locked block.
pub fn collides(grid: &Grid, piece: &Piece) -> bool {
    piece
        .blocks()
        .iter()
        .any(|block| grid.is_occupied(block.x, block.y))
}

pub fn can_move(grid: &Grid, piece: &Piece, dx: i16, dy: i16) -> bool {
    !collides(grid, &piece.moved(dx, dy))
}

/// Translates `piece` when the destination is free. Returns whether it moved.
pub fn try_move(grid: &Grid, piece: &mut Piece, dx: i16, dy: i16) -> bool {
    let candidate = piece.moved(dx, dy);
    if collides(grid, &candidate) {
        return false;
    }
    *piece = candidate;
    true
}

/// Quarter-turns `piece` in place when the result is free. No kicks are tried.
pub fn try_rotate(grid: &Grid, piece: &mut Piece) -> bool {
    let candidate = piece.rotated();
    if collides(grid, &candidate) {
        return false;
    }
    *piece = candidate;
    true
}
