use std::time::{Duration, Instant};

use num_format::ToFormattedString;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ql::learn::replay_buffer::ReplayBuffer;
use crate::ql::prelude::{Action, Discretize, Environment};
use crate::ql::q_table::QTable;
use crate::util::format::number_format;

#[derive(Clone, Debug)]
pub struct Parameter {
    /// Seed of the exploration randomness; same seed and environment => same learned table
    pub seed: u64,
    /// Learning rate
    pub alpha: f32,
    /// Discount factor for future rewards
    pub gamma: f32,
    /// Maximum epsilon greedy parameter
    pub epsilon_max: f32,
    /// Minimum epsilon greedy parameter
    pub epsilon_min: f32,
    /// Number of steps over which epsilon decays from max to min
    pub epsilon_greedy_steps: f32,
    pub max_steps_per_episode: usize,
    /// Number of recent episodes taken into account for the running reward
    pub episode_reward_history_len: usize,
    pub stats_after_episodes: usize,
    /// Finish early, once the running reward reaches the environment's reward goal
    pub stop_at_reward_goal: bool,
}

impl Parameter {
    fn epsilon_interval(&self) -> f32 {
        self.epsilon_max - self.epsilon_min
    }
}

impl Default for Parameter {
    fn default() -> Self {
        Self {
            seed: 42,
            alpha: 0.1,
            gamma: 0.99,
            epsilon_max: 1.0,
            epsilon_min: 0.05,
            epsilon_greedy_steps: 500_000.0,
            max_steps_per_episode: 10_000,
            episode_reward_history_len: 100,
            stats_after_episodes: 250,
            stop_at_reward_goal: true,
        }
    }
}

/// Limits of one training run. Whatever is exhausted first ends it.
///
/// Step and time limits are checked on every step, so the last episode may be cut short.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrainingBudget {
    pub episodes: usize,
    pub max_steps: Option<u64>,
    pub max_duration: Option<Duration>,
}

impl TrainingBudget {
    pub fn episodes(episodes: usize) -> Self {
        Self {
            episodes,
            max_steps: None,
            max_duration: None,
        }
    }

    /// false, if the budget does not allow a single step
    pub fn allows_work(&self) -> bool {
        self.episodes > 0
            && self.max_steps != Some(0)
            && self.max_duration != Some(Duration::ZERO)
    }
}

impl Default for TrainingBudget {
    fn default() -> Self {
        Self {
            episodes: 4_000,
            max_steps: Some(4_000_000),
            max_duration: Some(Duration::from_secs(120)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub episodes: usize,
    pub steps: u64,
    /// mean reward of the recent episodes
    pub running_reward: f32,
    pub best_episode_reward: f32,
    pub solved: bool,
    pub elapsed: Duration,
}

/**
    Tabular Q-learning with epsilon-greedy exploration.
    It's directly connected to an Environment and drives the steps in that environment.

    After every step the table is moved towards the temporal-difference target:
    `Q(s,a) += alpha * (reward + gamma * max_a' Q(s',a') - Q(s,a))`, where the future part is zero for a final step.
 */
pub struct QLearner<E>
where E: Environment,
      E::S: Discretize
{
    param: Parameter,
    environment: E,
    q_table: QTable<<E::S as Discretize>::Key>,
    rng: StdRng,
    step_count: u64,
    episode_count: usize,
    epsilon: f32,
    episode_rewards: ReplayBuffer<f32>,
    best_episode_reward: f32,
}

impl<E> QLearner<E>
where E: Environment,
      E::S: Discretize
{
    pub fn new(environment: E, param: Parameter) -> Self {
        Self {
            rng: StdRng::seed_from_u64(param.seed),
            epsilon: param.epsilon_max,
            episode_rewards: ReplayBuffer::new(param.episode_reward_history_len),
            param,
            environment,
            q_table: QTable::new(E::A::action_space()),
            step_count: 0,
            episode_count: 0,
            best_episode_reward: f32::NEG_INFINITY,
        }
    }

    pub fn q_table(&self) -> &QTable<<E::S as Discretize>::Key> { &self.q_table }

    pub fn into_q_table(self) -> QTable<<E::S as Discretize>::Key> { self.q_table }

    pub fn running_reward(&self) -> f32 { self.episode_rewards.avg() }

    pub fn solved(&self) -> bool {
        self.episode_rewards.is_full()
            && self.running_reward() >= self.environment.episode_reward_goal_mean()
    }

    /// Runs episodes until the budget is exhausted (or the task is solved, if configured so)
    pub fn learn(&mut self, budget: &TrainingBudget) -> TrainingReport {
        let started = Instant::now();
        let deadline = budget.max_duration.map(|d| started + d);
        let step_limit = budget.max_steps.map_or(u64::MAX, |s| self.step_count.saturating_add(s));
        let first_step = self.step_count;
        let mut episodes = 0;

        while episodes < budget.episodes
            && self.step_count < step_limit
            && !deadline.is_some_and(|d| Instant::now() >= d)
        {
            self.learn_episode(step_limit, deadline);
            episodes += 1;

            if self.episode_count % self.param.stats_after_episodes == 0 {
                log::info!("episode: {}, steps: {}, running reward: {:.2}, epsilon: {:.3}, known states: {}",
                    self.episode_count.to_formatted_string(&number_format()),
                    self.step_count.to_formatted_string(&number_format()),
                    self.running_reward(),
                    self.epsilon,
                    self.q_table.len());
            }
            if self.param.stop_at_reward_goal && self.solved() {
                log::info!("Solved at episode {}!", self.episode_count);
                break;
            }
        }

        TrainingReport {
            episodes,
            steps: self.step_count - first_step,
            running_reward: self.running_reward(),
            // stays finite (JSON friendly) even when no episode was played
            best_episode_reward: if self.best_episode_reward.is_finite() { self.best_episode_reward } else { 0.0 },
            solved: self.solved(),
            elapsed: started.elapsed(),
        }
    }

    /// Plays one episode from a fresh environment start, learning after every step.
    /// Returns the episode reward.
    pub fn learn_episode(&mut self, step_limit: u64, deadline: Option<Instant>) -> f32 {
        let mut key = self.environment.reset().discretize();
        let mut episode_reward: f32 = 0.0;

        for _ in 0..self.param.max_steps_per_episode {
            if self.step_count >= step_limit || deadline.is_some_and(|d| Instant::now() >= d) {
                break;
            }
            self.step_count += 1;

            let action = self.choose_action(&key);

            // Decay probability of taking random action
            self.epsilon = f32::max(
                self.epsilon - self.param.epsilon_interval() / self.param.epsilon_greedy_steps,
                self.param.epsilon_min,
            );

            let (state_next, reward, done) = self.environment.step(action);
            let key_next = state_next.discretize();
            let future_reward = match done {
                true => 0.0,
                false => self.q_table.max_value(&key_next),
            };
            self.q_table.update(&key, action.numeric() as usize, reward + self.param.gamma * future_reward, self.param.alpha);

            episode_reward += reward;
            key = key_next;
            if done {
                break;
            }
        }

        self.episode_count += 1;
        self.episode_rewards.add(episode_reward);
        self.best_episode_reward = self.best_episode_reward.max(episode_reward);
        episode_reward
    }

    /// epsilon-greedy; ties between equally valued actions are broken randomly
    fn choose_action(&mut self, key: &<E::S as Discretize>::Key) -> E::A {
        let idx = if self.epsilon > self.rng.gen::<f32>() {
            self.rng.gen_range(0..E::A::action_space())
        } else {
            let best = self.q_table.best_action_indices(key);
            best[self.rng.gen_range(0..best.len())]
        };
        E::A::ALL[idx]
    }
}

#[cfg(test)]
mod tests {
    use crate::ql::test_environment::{CatchAction, CatchTestEnvironment, FIELD_WIDTH};

    use super::*;

    fn catch_param() -> Parameter {
        Parameter {
            alpha: 0.5,
            gamma: 0.9,
            epsilon_greedy_steps: 20_000.0,
            stop_at_reward_goal: false,
            ..Parameter::default()
        }
    }

    #[test]
    fn test_learn_catch_game() {
        let mut learner = QLearner::new(CatchTestEnvironment::new(), catch_param());
        let report = learner.learn(&TrainingBudget::episodes(5_000));

        assert_eq!(report.episodes, 5_000);
        assert_eq!(report.steps, 20_000);
        assert_eq!(report.best_episode_reward, 10.0);

        let q_table = learner.into_q_table();
        for column in 0..FIELD_WIDTH {
            let mut env = CatchTestEnvironment::with_ball_column(column);
            let mut key = env.state().discretize();
            loop {
                let idx = q_table.greedy_action_index(&key).unwrap();
                let (state, reward, done) = env.step(CatchAction::ALL[idx]);
                key = state.discretize();
                if done {
                    assert!(reward > 0.0, "ball in column {column} not caught");
                    break;
                }
            }
        }
    }

    #[test]
    fn test_learning_is_reproducible() {
        let learn = || {
            let mut learner = QLearner::new(CatchTestEnvironment::new(), catch_param());
            learner.learn(&TrainingBudget::episodes(300));
            learner.into_q_table()
        };
        assert_eq!(learn(), learn());
    }

    #[test]
    fn test_step_budget_cuts_episode() {
        let mut learner = QLearner::new(CatchTestEnvironment::new(), catch_param());
        let report = learner.learn(&TrainingBudget {
            episodes: 100,
            max_steps: Some(10),
            max_duration: None,
        });
        assert_eq!(report.steps, 10);
        // 4 steps per episode: two full ones and a cut third one
        assert_eq!(report.episodes, 3);
    }

    #[test]
    fn test_budget_allows_work() {
        assert!(TrainingBudget::default().allows_work());
        assert!(!TrainingBudget::episodes(0).allows_work());
        assert!(!TrainingBudget { max_steps: Some(0), ..TrainingBudget::episodes(1) }.allows_work());
        assert!(!TrainingBudget { max_duration: Some(Duration::ZERO), ..TrainingBudget::episodes(1) }.allows_work());
    }
}
