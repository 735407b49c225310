use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Data type we use to encode an `Action` as index into the value table.
pub type ModelActionType = u8;

pub trait Action: Display + Debug + Sized + Clone + Copy + Hash + PartialEq + Eq + 'static {
    /// All possible actions, ordered by their numeric value
    const ALL: &'static [Self];

    /// Number of possible actions
    fn action_space() -> usize { Self::ALL.len() }

    /// Identifying the Action as a unique value in range (0..Self::action_space)
    fn numeric(&self) -> ModelActionType;
}

/// Learning environment, modeling the world of a learning agent
pub trait Environment {
    /// State representation - what the agent observes
    type S: Clone;
    type A: Action;

    /// Resets the environment to a defined starting point and returns the initial state
    fn reset(&mut self) -> &Self::S;

    /// Current state
    fn state(&self) -> &Self::S;

    /// Performs one time/action-step.
    ///
    /// Applies the given `action` to the environment and returns:
    ///   - next state
    ///   - immediate reward earned during performing that step
    ///   - done flag (e.g. game ended)
    ///
    fn step(
        &mut self,
        action: Self::A,
    ) -> (&Self::S, f32, bool);

    /// Average reward to reach over recent episodes to consider the task solved
    /// (expected to be a constant - not a moving target)
    fn episode_reward_goal_mean(&self) -> f32;
}

/// Maps a (continuous) state onto a finite key, usable for tabular learning
pub trait Discretize {
    type Key: Clone + Debug + Hash + Eq + Ord;

    fn discretize(&self) -> Self::Key;
}
