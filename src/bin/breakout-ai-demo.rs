use std::env;
use std::path::PathBuf;

use anyhow::{bail, Result};

use breakout_rl::environment::breakout::mechanics::{STANDARD_BOARD_HEIGHT, STANDARD_BOARD_WIDTH};
use breakout_rl::session::manager::{AdvanceRequest, SessionManager};
use breakout_rl::util;

/// upper bound for the demo game; a policy may keep the ball in a loop forever
const MAX_DEMO_TICKS: u64 = 50_000;

/// Trains a policy on the standard board, lets it play one game and stores it as checkpoint.
///
/// usage: `breakout-ai-demo [checkpoint-file]`
fn main() -> Result<()> {
    util::init_logging();

    let checkpoint_file = env::args().nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("breakout-policy.json"));

    let manager = SessionManager::default();
    let report = manager.train(STANDARD_BOARD_WIDTH, STANDARD_BOARD_HEIGHT)?;
    log::info!("{:?}", report);

    let mut snapshot = manager.start_or_reset(STANDARD_BOARD_WIDTH, STANDARD_BOARD_HEIGHT)?;
    while !snapshot.game_over && snapshot.elapsed_ticks < MAX_DEMO_TICKS {
        snapshot = manager.advance(&AdvanceRequest::agent())?;
    }
    match snapshot.outcome {
        Some(outcome) => log::info!("demo game: {:?} after {} ticks, score {}", outcome, snapshot.elapsed_ticks, snapshot.score),
        None => log::info!("demo game still running after {} ticks, score {}", snapshot.elapsed_ticks, snapshot.score),
    }

    let Some(policy) = manager.policy() else {
        bail!("no policy installed after training");
    };
    policy.write_checkpoint(&checkpoint_file)?;
    Ok(())
}
