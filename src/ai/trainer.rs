use num_format::ToFormattedString;

use crate::ai::policy::Policy;
use crate::environment::breakout::mechanics::BoardConfig;
use crate::environment::breakout_environment::BreakoutEnvironment;
use crate::error::BreakoutError;
use crate::ql::learn::q_learner::{Parameter, QLearner, TrainingBudget};
use crate::util::format::number_format;

/// Trains a fresh policy on a private environment of the given board.
/// Nothing outside of the returned policy is touched.
pub fn train(board: BoardConfig, budget: &TrainingBudget, param: Parameter) -> Result<Policy, BreakoutError> {
    if !budget.allows_work() {
        return Err(BreakoutError::invalid_configuration("training budget allows no single step"));
    }
    check_parameter(&param)?;
    log::info!("training on board {} with {:?}", board, budget);

    let mut learner = QLearner::new(BreakoutEnvironment::new(board), param);
    let report = learner.learn(budget);
    log::info!("training finished after {} episodes / {} steps in {:.1?}; running reward: {:.1}, best episode: {:.1}, solved: {}",
        report.episodes.to_formatted_string(&number_format()),
        report.steps.to_formatted_string(&number_format()),
        report.elapsed,
        report.running_reward,
        report.best_episode_reward,
        report.solved);

    Ok(Policy::new(board, learner.into_q_table(), report))
}

fn check_parameter(param: &Parameter) -> Result<(), BreakoutError> {
    if param.stats_after_episodes == 0 {
        return Err(BreakoutError::invalid_configuration("stats_after_episodes must be at least 1"));
    }
    if param.episode_reward_history_len == 0 {
        return Err(BreakoutError::invalid_configuration("episode_reward_history_len must be at least 1"));
    }
    if param.epsilon_greedy_steps.is_nan() || param.epsilon_greedy_steps <= 0.0 {
        return Err(BreakoutError::invalid_configuration("epsilon_greedy_steps must be positive"));
    }
    Ok(())
}
