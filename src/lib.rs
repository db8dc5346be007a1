//! Falling-block puzzle engine.
//!
//! The [`game::Game`] state machine owns the grid, the active piece and the
//! score. A host feeds it decoded [`game::Action`]s and a frame delta once per
//! frame through [`game::Game::tick`], then reads a [`game::Snapshot`] back to
//! draw. Rendering, audio and raw input stay on the host side.

pub mod config;
pub mod game;
pub mod grid;
pub mod piece;
pub mod rules;
pub mod scoring;

pub use config::GameConfig;
pub use game::{Action, Game, GameEvent, Mode, Snapshot};
pub use grid::{Cell, Grid};
pub use piece::{
    Piece, PieceProvider, Position, RandomPieceProvider, Rgb, SequencePieceProvider, ShapeKind,
};
