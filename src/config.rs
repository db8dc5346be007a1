use anyhow::{ensure, Result};

use crate::grid::MAX_DIMENSION;

pub const DEFAULT_ROWS: usize = 20;
pub const DEFAULT_COLS: usize = 10;

// Timing (in seconds)
pub const INITIAL_GRAVITY_INTERVAL: f64 = 0.5;
pub const GRAVITY_DECAY: f64 = 0.9;
pub const LINES_PER_LEVEL: u32 = 10;

/// Tunables for one engine instance. Fixed for the lifetime of a `Game`.
#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    pub spawn_column: i16,
    /// Seconds per automatic one-row step at level 1.
    pub initial_gravity_interval: f64,
    /// Factor applied to the interval on each level-up.
    pub gravity_decay: f64,
    pub lines_per_level: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            spawn_column: (DEFAULT_COLS as i16 / 2) - 1,
            initial_gravity_interval: INITIAL_GRAVITY_INTERVAL,
            gravity_decay: GRAVITY_DECAY,
            lines_per_level: LINES_PER_LEVEL,
        }
    }
}

impl GameConfig {
    /// Default timing on a custom grid, spawning in the middle column.
    pub fn with_size(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            spawn_column: (cols as i16 / 2) - 1,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            (4..=MAX_DIMENSION).contains(&self.rows),
            "grid needs at least 4 rows, got {}",
            self.rows
        );
        ensure!(
            (4..=MAX_DIMENSION).contains(&self.cols),
            "grid needs at least 4 columns, got {}",
            self.cols
        );
        // Three-wide pieces reach one column either side of the anchor
        ensure!(
            self.spawn_column >= 1 && (self.spawn_column as usize) + 1 < self.cols,
            "spawn column {} leaves no room in a {}-column grid",
            self.spawn_column,
            self.cols
        );
        ensure!(
            self.initial_gravity_interval.is_finite() && self.initial_gravity_interval > 0.0,
            "gravity interval must be positive, got {}",
            self.initial_gravity_interval
        );
        ensure!(
            self.gravity_decay > 0.0 && self.gravity_decay <= 1.0,
            "gravity decay must be in (0, 1], got {}",
            self.gravity_decay
        );
        ensure!(self.lines_per_level > 0, "lines per level must be positive");
        Ok(())
    }
}
