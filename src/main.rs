use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use snake_tui::game::{Difficulty, GameConfig};
use snake_tui::modes::PlayMode;
use snake_tui::store::HighScoreStore;

#[derive(Parser)]
#[command(name = "snake-tui")]
#[command(version, about = "Grid-based snake game for the terminal")]
struct Cli {
    /// Grid width
    #[arg(long, default_value = "20")]
    width: usize,

    /// Grid height
    #[arg(long, default_value = "20")]
    height: usize,

    /// Starting difficulty
    #[arg(long, value_enum, default_value = "medium")]
    difficulty: Difficulty,

    /// Where to keep the best score between runs
    #[arg(long)]
    high_score_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; the board renders on stdout
    env_logger::init();

    let cli = Cli::parse();

    let config = GameConfig::new(cli.width, cli.height);
    let store = HighScoreStore::new(
        cli.high_score_file
            .unwrap_or_else(HighScoreStore::default_path),
    );

    let mut play_mode = PlayMode::new(config, cli.difficulty, store);
    play_mode.run().await?;

    Ok(())
}
