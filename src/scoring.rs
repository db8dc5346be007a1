use crate::config::GameConfig;

// Scoring
pub const SCORE_SINGLE: u32 = 100;
pub const SCORE_DOUBLE: u32 = 300;
pub const SCORE_TRIPLE: u32 = 600;
pub const SCORE_TETRIS: u32 = 1000;

/// Points for clearing `lines` rows with one lock.
pub fn line_clear_score(lines: u32) -> u32 {
    match lines {
        0 => 0,
        1 => SCORE_SINGLE,
        2 => SCORE_DOUBLE,
        3 => SCORE_TRIPLE,
        _ => SCORE_TETRIS,
    }
}

/// Score, cleared lines, level and current gravity interval of one game.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreState {
    pub score: u32,
    pub lines: u32,
    pub level: u32,
    /// Seconds per automatic one-row step.
    pub gravity_interval: f64,
}

impl ScoreState {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            score: 0,
            lines: 0,
            level: 1,
            gravity_interval: config.initial_gravity_interval,
        }
    }

    /// Credits a clear of `lines` rows. Returns true if the level went up.
    pub fn apply_clear(&mut self, lines: u32, config: &GameConfig) -> bool {
        if lines == 0 {
            return false;
        }
        self.score = self.score.saturating_add(line_clear_score(lines));
        self.lines = self.lines.saturating_add(lines);

        // One step per threshold; with 10 lines per level a clear crosses at most one.
        let mut leveled_up = false;
        while self.lines / config.lines_per_level >= self.level {
            self.level += 1;
            self.gravity_interval = config.initial_gravity_interval
                * config.gravity_decay.powi(self.level as i32 - 1);
            leveled_up = true;
        }
        leveled_up
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_reward_multi_line_clears() {
        assert_eq!(line_clear_score(0), 0);
        assert_eq!(line_clear_score(1), 100);
        assert_eq!(line_clear_score(2), 300);
        assert_eq!(line_clear_score(3), 600);
        assert_eq!(line_clear_score(4), 1000);
    }

    #[test]
    fn tenth_line_levels_up() {
        let config = GameConfig::default();
        let mut state = ScoreState::new(&config);
        for _ in 0..9 {
            assert!(!state.apply_clear(1, &config));
        }
        assert_eq!(state.level, 1);
        assert!(state.apply_clear(1, &config));
        assert_eq!(state.level, 2);
        assert!((state.gravity_interval - 0.45).abs() < 1e-9);
    }

    #[test]
    fn level_matches_closed_form() {
        let config = GameConfig::default();
        let mut state = ScoreState::new(&config);
        for lines in [4, 3, 4, 2, 1, 4, 4, 3, 2, 4, 1, 4] {
            state.apply_clear(lines, &config);
            assert_eq!(state.level, 1 + state.lines / config.lines_per_level);
        }
    }

    #[test]
    fn short_levels_step_through_each_threshold() {
        let config = GameConfig {
            lines_per_level: 1,
            ..GameConfig::default()
        };
        let mut state = ScoreState::new(&config);
        assert!(state.apply_clear(3, &config));
        assert_eq!(state.level, 4);
        assert!((state.gravity_interval - 0.5 * 0.9f64.powi(3)).abs() < 1e-9);
    }

    #[test]
    fn zero_lines_changes_nothing() {
        let config = GameConfig::default();
        let mut state = ScoreState::new(&config);
        state.apply_clear(0, &config);
        assert_eq!(state, ScoreState::new(&config));
    }
}
