use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::config::{Difficulty, GameConfig};
use super::direction::Direction;
use super::state::{GameOverCause, GamePhase, GameState, Position, Snake};

/// Give up on rejection sampling after this many misses and scan instead
const MAX_FOOD_SAMPLES: usize = 128;

/// What a single tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Whether the snake advanced a cell
    pub moved: bool,
    /// Whether the snake ate food this tick
    pub ate_food: bool,
    /// Whether the high score improved this tick
    pub new_high_score: bool,
    /// Set when this tick ended the run
    pub game_over: Option<GameOverCause>,
}

/// The game engine: owns all mutable game state and exposes the update
/// algorithm. Rendering, input decoding and persistence live elsewhere.
pub struct GameEngine {
    config: GameConfig,
    state: GameState,
    /// Committed direction of travel; `None` until the first steer input
    direction: Option<Direction>,
    /// Latest requested direction, applied at the start of the next tick
    buffered: Option<Direction>,
    difficulty: Difficulty,
    high_score: u32,
    rng: StdRng,
}

impl GameEngine {
    /// Create a new engine with a randomly seeded RNG
    pub fn new(config: GameConfig, difficulty: Difficulty) -> Self {
        Self::with_rng(config, difficulty, StdRng::from_entropy())
    }

    /// Create an engine with a fixed seed for reproducible food placement
    pub fn with_seed(config: GameConfig, difficulty: Difficulty, seed: u64) -> Self {
        Self::with_rng(config, difficulty, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: GameConfig, difficulty: Difficulty, rng: StdRng) -> Self {
        let mut engine = Self {
            state: GameState::new(
                Snake::new(Position::new(0, 0), Direction::Right, 1),
                None,
                config.grid_width,
                config.grid_height,
            ),
            config,
            direction: None,
            buffered: None,
            difficulty,
            high_score: 0,
            rng,
        };
        engine.reset(difficulty);
        engine
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    /// Seed the high score from the persistent store at startup
    pub fn set_high_score(&mut self, high_score: u32) {
        self.high_score = self.high_score.max(high_score);
    }

    /// Buffer a requested direction for the next tick.
    ///
    /// A request opposite to the current direction of travel is ignored so
    /// the snake cannot fold onto its own neck within one step.
    pub fn set_direction(&mut self, requested: Direction) {
        if let Some(travel) = self.direction.or_else(|| self.state.snake.facing()) {
            if travel.is_opposite(requested) {
                return;
            }
        }
        self.buffered = Some(requested);
    }

    /// Begin the run; only meaningful from NotStarted
    pub fn start(&mut self) {
        if self.state.phase == GamePhase::NotStarted {
            self.state.phase = GamePhase::Running;
        }
    }

    /// Flip between Running and Paused
    pub fn toggle_pause(&mut self) {
        self.state.phase = match self.state.phase {
            GamePhase::Running => GamePhase::Paused,
            GamePhase::Paused => GamePhase::Running,
            other => other,
        };
    }

    /// Reinitialize everything except the high score and adopt a difficulty
    pub fn reset(&mut self, difficulty: Difficulty) {
        let center = Position::new(
            (self.config.grid_width / 2) as i32,
            (self.config.grid_height / 2) as i32,
        );
        self.state = GameState::new(
            Snake::new(center, Direction::Right, self.config.initial_snake_length),
            None,
            self.config.grid_width,
            self.config.grid_height,
        );
        self.direction = None;
        self.buffered = None;
        self.difficulty = difficulty;
        self.state.food = self.place_food();
    }

    /// Advance the simulation one step. No-op unless Running.
    pub fn tick(&mut self) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        if self.state.phase != GamePhase::Running {
            return outcome;
        }

        // Commit the buffered direction exactly once per tick
        if let Some(requested) = self.buffered.take() {
            self.direction = Some(requested);
        }

        // Nothing to do until the player steers for the first time
        let Some(direction) = self.direction else {
            return outcome;
        };

        let new_head = self.state.snake.head().moved_in_direction(direction);

        if !self.state.is_in_bounds(new_head) {
            return self.end_run(GameOverCause::WallCollision, outcome);
        }

        let ate_food = self.state.food == Some(new_head);

        // The tail cell is fair game when it vacates this tick
        if self.state.snake.hits_body(new_head, !ate_food) {
            return self.end_run(GameOverCause::SelfCollision, outcome);
        }

        self.state.snake.advance(new_head, ate_food);
        outcome.moved = true;

        if ate_food {
            outcome.ate_food = true;
            self.state.score += 1;
            if self.state.score > self.high_score {
                self.high_score = self.state.score;
                outcome.new_high_score = true;
            }
            match self.place_food() {
                Some(food) => self.state.food = Some(food),
                None => {
                    // Snake fills the board: nothing left to chase
                    self.state.food = None;
                    return self.end_run(GameOverCause::BoardFull, outcome);
                }
            }
        }

        outcome
    }

    /// Current interval between ticks: shrinks with the score, floored
    pub fn tick_interval(&self) -> Duration {
        self.difficulty
            .base_interval()
            .saturating_sub(self.config.speed_step * self.state.score)
            .max(self.config.min_interval)
    }

    fn end_run(&mut self, cause: GameOverCause, mut outcome: TickOutcome) -> TickOutcome {
        self.state.phase = GamePhase::GameOver(cause);
        outcome.game_over = Some(cause);
        outcome
    }

    /// Pick a free cell uniformly at random, or `None` when the board is full
    fn place_food(&mut self) -> Option<Position> {
        if self.state.free_cells() == 0 {
            return None;
        }

        // Rejection sampling covers the common sparse board
        for _ in 0..MAX_FOOD_SAMPLES {
            let pos = Position::new(
                self.rng.gen_range(0..self.state.grid_width as i32),
                self.rng.gen_range(0..self.state.grid_height as i32),
            );
            if !self.state.snake.occupies(pos) {
                return Some(pos);
            }
        }

        // Dense endgame board: pick among the free cells directly
        let free: Vec<Position> = (0..self.state.grid_height as i32)
            .flat_map(|y| (0..self.state.grid_width as i32).map(move |x| Position::new(x, y)))
            .filter(|pos| !self.state.snake.occupies(*pos))
            .collect();
        let index = self.rng.gen_range(0..free.len());
        Some(free[index])
    }
}
