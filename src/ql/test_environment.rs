#![cfg(test)]

use std::fmt::{Display, Formatter};

use crate::ql::prelude::{Action, Discretize, Environment, ModelActionType};

pub const FIELD_WIDTH: u8 = 5;
pub const FIELD_HEIGHT: u8 = 5;
const PADDLE_START_COLUMN: u8 = 2;

/// Minimal catch game: a ball falls straight down one row per step,
/// a paddle on the bottom row has to be moved below it.
pub struct CatchTestEnvironment {
    next_ball_column: u8,
    state: CatchState,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CatchState {
    pub ball_column: u8,
    pub ball_row: u8,
    pub paddle_column: u8,
}

impl Discretize for CatchState {
    type Key = CatchState;

    fn discretize(&self) -> CatchState { *self }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CatchAction {
    Left,
    Stay,
    Right,
}

impl Action for CatchAction {
    const ALL: &'static [Self] = &[CatchAction::Left, CatchAction::Stay, CatchAction::Right];

    fn numeric(&self) -> ModelActionType {
        *self as ModelActionType
    }
}

impl Display for CatchAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl CatchTestEnvironment {
    /// Each reset drops the ball in the next column, cycling through all of them
    pub fn new() -> Self {
        Self::with_ball_column(0)
    }

    pub fn with_ball_column(column: u8) -> Self {
        Self {
            next_ball_column: (column + 1) % FIELD_WIDTH,
            state: CatchState {
                ball_column: column,
                ball_row: 0,
                paddle_column: PADDLE_START_COLUMN,
            },
        }
    }
}

impl Environment for CatchTestEnvironment {
    type S = CatchState;
    type A = CatchAction;

    fn reset(&mut self) -> &CatchState {
        *self = Self::with_ball_column(self.next_ball_column);
        &self.state
    }

    fn state(&self) -> &CatchState {
        &self.state
    }

    fn step(&mut self, action: CatchAction) -> (&CatchState, f32, bool) {
        let s = &mut self.state;
        if s.ball_row == FIELD_HEIGHT - 1 {
            return (&self.state, 0.0, true);
        }
        s.paddle_column = match action {
            CatchAction::Left => s.paddle_column.saturating_sub(1),
            CatchAction::Stay => s.paddle_column,
            CatchAction::Right => (s.paddle_column + 1).min(FIELD_WIDTH - 1),
        };
        s.ball_row += 1;

        if s.ball_row == FIELD_HEIGHT - 1 {
            let reward = if s.ball_column == s.paddle_column { 10.0 } else { -10.0 };
            (&self.state, reward, true)
        } else {
            (&self.state, 0.0, false)
        }
    }

    fn episode_reward_goal_mean(&self) -> f32 {
        9.99
    }
}
