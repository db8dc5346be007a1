use anyhow::Result;
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::grid::{Cell, Grid};
use crate::piece::{Piece, PieceProvider, RandomPieceProvider};
use crate::rules::{collides, try_move, try_rotate};
use crate::scoring::ScoreState;

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    Menu,
    Playing,
    Credits,
}

/// Decoded input, fed to [`Game::tick`] in the order it was received.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    Left,
    Right,
    SoftDown,
    Rotate,
    Start,
    ShowCredits,
    BackToMenu,
    /// Handled by the host loop; the engine ignores it.
    Quit,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum GameEvent {
    PieceMoved,
    PieceRotated,
    PieceLocked,
    LinesCleared(u32),
    LevelUp(u32),
    GameStarted,
    CreditsShown,
    ReturnedToMenu,
    GameOver,
}

/// Read-only view of everything a renderer needs after a tick.
#[derive(Clone, Copy, Debug)]
pub struct Snapshot<'a> {
    pub mode: Mode,
    pub grid: &'a Grid,
    pub piece: Option<&'a Piece>,
    pub score: u32,
    pub lines: u32,
    pub level: u32,
    pub gravity_interval: f64,
}

// ============================================================================
// Game
// ============================================================================

pub struct Game {
    pub grid: Grid,
    pub current_piece: Option<Piece>,
    pub scoring: ScoreState,
    pub mode: Mode,
    config: GameConfig,
    drop_timer: f64,
    piece_provider: Box<dyn PieceProvider>,
    events: Vec<GameEvent>,
}

impl Game {
    pub fn new() -> Self {
        Self::with_provider(Box::new(RandomPieceProvider::new()))
    }

    /// Default rules with a caller-chosen piece source.
    pub fn with_provider(provider: Box<dyn PieceProvider>) -> Self {
        Self::build(GameConfig::default(), provider)
    }

    pub fn with_config(config: GameConfig, provider: Box<dyn PieceProvider>) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, provider))
    }

    /// A game already in `Playing` mode on a prepared grid, for tests and replays.
    /// The grid must pass the same size checks as `with_config`.
    pub fn with_grid(
        grid: Grid,
        current_piece: Piece,
        provider: Box<dyn PieceProvider>,
    ) -> Result<Self> {
        let config = GameConfig::with_size(grid.rows(), grid.cols());
        config.validate()?;
        let mut game = Self::build(config, provider);
        game.grid = grid;
        game.current_piece = Some(current_piece);
        game.mode = Mode::Playing;
        Ok(game)
    }

    fn build(config: GameConfig, provider: Box<dyn PieceProvider>) -> Self {
        Self {
            grid: Grid::new(config.rows, config.cols),
            current_piece: None,
            scoring: ScoreState::new(&config),
            mode: Mode::Menu,
            config,
            drop_timer: 0.0,
            piece_provider: provider,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn score(&self) -> u32 {
        self.scoring.score
    }

    pub fn lines(&self) -> u32 {
        self.scoring.lines
    }

    pub fn level(&self) -> u32 {
        self.scoring.level
    }

    pub fn gravity_interval(&self) -> f64 {
        self.scoring.gravity_interval
    }

    /// Advances the simulation by one frame: applies `actions` in order, then
    /// lets gravity fire at most once.
    pub fn tick(&mut self, delta_seconds: f64, actions: &[Action]) {
        for &action in actions {
            self.apply_action(action);
        }

        if self.mode != Mode::Playing {
            return;
        }

        // NaN and negative deltas count as no time passing.
        self.drop_timer += delta_seconds.max(0.0);
        if self.drop_timer >= self.scoring.gravity_interval {
            self.drop_timer = 0.0;
            self.gravity_step();
        }
    }

    /// Applies one action. Actions that don't belong to the current mode are
    /// ignored.
    pub fn apply_action(&mut self, action: Action) {
        match (self.mode, action) {
            (Mode::Menu, Action::Start) => self.start(),
            (Mode::Menu, Action::ShowCredits) => {
                self.mode = Mode::Credits;
                self.events.push(GameEvent::CreditsShown);
                debug!("showing credits");
            }
            (Mode::Credits, Action::BackToMenu) => {
                self.mode = Mode::Menu;
                self.events.push(GameEvent::ReturnedToMenu);
                debug!("back to menu");
            }
            (Mode::Playing, Action::Left) => {
                self.move_piece(-1, 0);
            }
            (Mode::Playing, Action::Right) => {
                self.move_piece(1, 0);
            }
            (Mode::Playing, Action::SoftDown) => {
                self.move_piece(0, 1);
            }
            (Mode::Playing, Action::Rotate) => {
                self.rotate_piece();
            }
            _ => {}
        }
    }

    /// Resets grid, score and timer, spawns the first piece and enters `Playing`.
    pub fn start(&mut self) {
        self.grid.clear();
        self.scoring = ScoreState::new(&self.config);
        self.drop_timer = 0.0;
        self.mode = Mode::Playing;
        self.events.clear();
        self.events.push(GameEvent::GameStarted);
        info!(rows = self.grid.rows(), cols = self.grid.cols(), "game started");
        self.spawn_next_piece();
    }

    pub fn move_piece(&mut self, dx: i16, dy: i16) -> bool {
        if self.mode != Mode::Playing {
            return false;
        }
        let Some(piece) = self.current_piece.as_mut() else {
            return false;
        };
        let moved = try_move(&self.grid, piece, dx, dy);
        if moved {
            self.events.push(GameEvent::PieceMoved);
        }
        moved
    }

    pub fn rotate_piece(&mut self) -> bool {
        if self.mode != Mode::Playing {
            return false;
        }
        let Some(piece) = self.current_piece.as_mut() else {
            return false;
        };
        let rotated = try_rotate(&self.grid, piece);
        if rotated {
            self.events.push(GameEvent::PieceRotated);
        }
        rotated
    }

    /// One automatic step: fall a row, or lock and bring in the next piece.
    pub fn gravity_step(&mut self) {
        if self.mode != Mode::Playing {
            return;
        }
        let Some(piece) = self.current_piece.as_mut() else {
            return;
        };
        if !try_move(&self.grid, piece, 0, 1) {
            self.lock_and_spawn();
        }
    }

    fn lock_and_spawn(&mut self) {
        let Some(piece) = self.current_piece.take() else {
            return;
        };
        self.grid.lock(&piece);
        self.events.push(GameEvent::PieceLocked);
        debug!(kind = ?piece.kind, x = piece.position.x, y = piece.position.y, "piece locked");

        let lines = self.grid.clear_full_rows() as u32;
        if lines > 0 {
            self.events.push(GameEvent::LinesCleared(lines));
            debug!(lines, "rows cleared");
            if self.scoring.apply_clear(lines, &self.config) {
                self.events.push(GameEvent::LevelUp(self.scoring.level));
                info!(
                    level = self.scoring.level,
                    interval = self.scoring.gravity_interval,
                    "level up"
                );
            }
        }

        self.spawn_next_piece();
    }

    /// Brings in the next piece. A blocked spawn ends the game and returns to
    /// the menu.
    pub fn spawn_next_piece(&mut self) {
        let kind = self.piece_provider.next_piece();
        let piece = Piece::spawn(kind, self.config.spawn_column);

        if collides(&self.grid, &piece) {
            self.current_piece = None;
            self.mode = Mode::Menu;
            self.events.push(GameEvent::GameOver);
            info!(
                score = self.scoring.score,
                lines = self.scoring.lines,
                level = self.scoring.level,
                "game over"
            );
            return;
        }

        self.current_piece = Some(piece);
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            mode: self.mode,
            grid: &self.grid,
            piece: self.current_piece.as_ref(),
            score: self.scoring.score,
            lines: self.scoring.lines,
            level: self.scoring.level,
            gravity_interval: self.scoring.gravity_interval,
        }
    }

    /// Returns the visual grid state with the current piece overlaid
    pub fn render_grid(&self) -> Vec<Vec<Cell>> {
        let mut visual_grid = self.grid.clone();

        if let Some(piece) = &self.current_piece {
            for block in piece.blocks() {
                visual_grid.set(block.x, block.y, Cell::Filled(piece.kind));
            }
        }

        visual_grid.cells().to_vec()
    }

    /// Takes and clears all pending events
    ///
    /// Events pile up until taken, so a host should drain them once per frame.
    /// Starting a new game discards whatever the previous one left behind.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

pub mod test_helpers {
    use super::*;
    use crate::piece::ShapeKind;

    pub fn empty_grid() -> Grid {
        let config = GameConfig::default();
        Grid::new(config.rows, config.cols)
    }

    pub fn fill_row(grid: &mut Grid, y: usize) {
        for x in 0..grid.cols() {
            grid.set(x as i16, y as i16, Cell::Filled(ShapeKind::T));
        }
    }

    pub fn fill_row_with_gap(grid: &mut Grid, y: usize, gap_x: usize) {
        for x in 0..grid.cols() {
            if x != gap_x {
                grid.set(x as i16, y as i16, Cell::Filled(ShapeKind::T));
            }
        }
    }
}
