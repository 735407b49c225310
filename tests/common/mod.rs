#![allow(dead_code)]

use std::time::Duration;

use log::LevelFilter;

use breakout_rl::ai::policy::Policy;
use breakout_rl::environment::breakout::mechanics::BoardConfig;
use breakout_rl::error::BreakoutError;
use breakout_rl::ql::learn::q_learner::{Parameter, TrainingBudget, TrainingReport};
use breakout_rl::ql::q_table::QTable;
use breakout_rl::session::manager::{AdvanceRequest, ManagerConfig, SessionManager};
use breakout_rl::session::snapshot::Snapshot;

#[ctor::ctor]
fn init_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .format_timestamp_secs()
        .filter_level(LevelFilter::Debug)
        .try_init();
}

/// a game can't last longer than that in these tests
pub const TICK_LIMIT: u64 = 100_000;

/// Advances with the same request until the game is over
pub fn play_until_over(manager: &SessionManager, request: &AdvanceRequest) -> Result<Snapshot, BreakoutError> {
    loop {
        let snapshot = manager.advance(request)?;
        assert!(snapshot.elapsed_ticks < TICK_LIMIT, "game does not end");
        if snapshot.game_over {
            return Ok(snapshot);
        }
    }
}

/// Policy without any knowledge; it always keeps the paddle where it is
pub fn blank_policy() -> Policy {
    Policy::new(BoardConfig::default(), QTable::new(3), TrainingReport {
        episodes: 0,
        steps: 0,
        running_reward: 0.0,
        best_episode_reward: 0.0,
        solved: false,
        elapsed: Duration::ZERO,
    })
}

pub fn quick_training_manager() -> SessionManager {
    SessionManager::new(ManagerConfig {
        learner: Parameter {
            stats_after_episodes: 5,
            ..Parameter::default()
        },
        budget: TrainingBudget {
            episodes: 10,
            max_steps: Some(5_000),
            max_duration: Some(Duration::from_secs(30)),
        },
    })
}
