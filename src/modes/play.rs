use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{Stdout, stdout};
use std::time::Duration;
use tokio::time::{interval, sleep, Instant};

use crate::game::{Difficulty, GameConfig, GameEngine, GamePhase};
use crate::input::{InputHandler, KeyAction};
use crate::metrics::GameMetrics;
use crate::render::Renderer;
use crate::store::HighScoreStore;

pub struct PlayMode {
    engine: GameEngine,
    store: HighScoreStore,
    metrics: GameMetrics,
    renderer: Renderer,
    input_handler: InputHandler,
    should_quit: bool,
}

impl PlayMode {
    pub fn new(config: GameConfig, difficulty: Difficulty, store: HighScoreStore) -> Self {
        let mut engine = GameEngine::new(config, difficulty);

        let best = store.load();
        if best > 0 {
            log::info!("loaded high score {best} from {}", store.path().display());
        }
        engine.set_high_score(best);

        Self {
            engine,
            store,
            metrics: GameMetrics::new(),
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        // Run game loop with cleanup
        let result = self.run_game_loop(&mut terminal).await;

        // Cleanup terminal
        self.cleanup_terminal(&mut terminal)?;

        result
    }

    async fn run_game_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();

        // Render at 30 FPS (33ms per frame)
        let render_interval = Duration::from_millis(33);
        let mut render_timer = interval(render_interval);

        // The tick timer is a one-shot sleep, re-armed with the engine's
        // current interval after every tick so speed-ups apply immediately.
        // A fixed-rate interval would keep the stale cadence.
        let tick_timer = sleep(self.engine.tick_interval());
        tokio::pin!(tick_timer);

        loop {
            tokio::select! {
                // Handle terminal events
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event);
                    }
                }

                // Game logic tick
                () = &mut tick_timer => {
                    self.on_tick();
                    tick_timer.as_mut().reset(Instant::now() + self.engine.tick_interval());
                }

                // Render frame
                _ = render_timer.tick() => {
                    self.metrics.update();
                    terminal.draw(|frame| {
                        self.renderer.render(
                            frame,
                            self.engine.state(),
                            self.engine.high_score(),
                            self.engine.difficulty(),
                            &self.metrics,
                        );
                    }).context("Failed to draw frame")?;
                }

                // Handle Ctrl+C
                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn on_tick(&mut self) {
        let outcome = self.engine.tick();

        if outcome.new_high_score {
            if let Err(err) = self.store.save(self.engine.high_score()) {
                log::warn!("failed to persist high score: {err:#}");
            }
        }

        if let Some(cause) = outcome.game_over {
            log::debug!(
                "game over ({cause:?}) at score {}",
                self.engine.state().score
            );
            self.metrics.on_game_over();
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => {
                // Only process key press events, not release
                if key.kind != KeyEventKind::Press {
                    return;
                }
                let action = self.input_handler.handle_key_event(key);
                self.apply_action(action);
            }
            // A resized terminal may clip the board; start the run over
            Event::Resize(_, _) => {
                if matches!(
                    self.engine.state().phase,
                    GamePhase::Running | GamePhase::Paused
                ) {
                    self.engine.reset(self.engine.difficulty());
                }
            }
            _ => {}
        }
    }

    fn apply_action(&mut self, action: KeyAction) {
        match action {
            KeyAction::Steer(direction) => {
                self.engine.set_direction(direction);
            }
            KeyAction::StartPause => match self.engine.state().phase {
                GamePhase::NotStarted => {
                    self.engine.start();
                    self.metrics.on_game_start();
                }
                GamePhase::Running | GamePhase::Paused => {
                    self.engine.toggle_pause();
                }
                GamePhase::GameOver(_) => {
                    self.engine.reset(self.engine.difficulty());
                }
            },
            KeyAction::SelectDifficulty(difficulty) => {
                self.engine.reset(difficulty);
            }
            KeyAction::Restart => {
                self.engine.reset(self.engine.difficulty());
            }
            KeyAction::Quit => {
                self.should_quit = true;
            }
            KeyAction::None => {}
        }
    }

    fn cleanup_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}
