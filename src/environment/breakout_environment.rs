use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::environment::breakout::mechanics::{BoardConfig, BRICK_VALUE, BreakoutMechanics, GameOutcome, PADDLE_WIDTH, PaddleControl};
use crate::ql::prelude::{Action, Discretize, Environment, ModelActionType};

pub const OBSERVATION_LEN: usize = 8;

pub const REWARD_BRICK: f32 = BRICK_VALUE as f32;
pub const WIN_BONUS: f32 = 100.0;
pub const LOSS_PENALTY: f32 = 100.0;
/// subtracted on every advancing tick
pub const TICK_PENALTY: f32 = 0.0;

/// bucket sizes of the discretized state
const REL_X_BUCKET_LEN: f32 = PADDLE_WIDTH / 4.0;
const VX_BUCKET_LEN: f32 = 2.0;
const HEIGHT_BUCKET_LEN: f32 = 40.0;

/// Fixed-length feature vector:
/// `[ball_x, ball_y, ball_vx, ball_vy, paddle_x, paddle_y, bricks_remaining, nearest_brick_offset_x]`
///
/// The shape is the same for every board configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation(pub [f32; OBSERVATION_LEN]);

impl Observation {
    pub fn of(mechanics: &BreakoutMechanics) -> Self {
        let ball = mechanics.ball();
        let paddle = mechanics.paddle();
        let ball_center = ball.shape.center;

        let nearest_brick_offset_x = mechanics.bricks().iter()
            .filter(|b| b.alive)
            .map(|b| b.shape.center() - ball_center)
            .min_by(|a, b| a.norm_squared().total_cmp(&b.norm_squared()))
            .map_or(0.0, |offset| offset.x);

        Observation([
            ball_center.x,
            ball_center.y,
            ball.velocity.x,
            ball.velocity.y,
            paddle.shape.min.x,
            paddle.shape.min.y,
            mechanics.alive_bricks() as f32,
            nearest_brick_offset_x,
        ])
    }

    pub fn ball_x(&self) -> f32 { self.0[0] }
    pub fn ball_y(&self) -> f32 { self.0[1] }
    pub fn ball_vx(&self) -> f32 { self.0[2] }
    pub fn ball_vy(&self) -> f32 { self.0[3] }
    pub fn paddle_x(&self) -> f32 { self.0[4] }
    pub fn paddle_y(&self) -> f32 { self.0[5] }
    pub fn bricks_remaining(&self) -> f32 { self.0[6] }
    pub fn nearest_brick_offset_x(&self) -> f32 { self.0[7] }
}

/// Board independent, discretized view of an [Observation]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateKey {
    /// ball x relative to the paddle center, in quarter paddle widths
    pub rel_x: i8,
    pub vx: i8,
    pub falling: bool,
    /// distance of the ball above the paddle
    pub height: u8,
}

impl Discretize for Observation {
    type Key = StateKey;

    fn discretize(&self) -> StateKey {
        let paddle_center_x = self.paddle_x() + PADDLE_WIDTH / 2.0;
        StateKey {
            rel_x: ((self.ball_x() - paddle_center_x) / REL_X_BUCKET_LEN).floor().clamp(-6.0, 5.0) as i8,
            vx: (self.ball_vx() / VX_BUCKET_LEN).round().clamp(-3.0, 3.0) as i8,
            falling: self.ball_vy() > 0.0,
            height: ((self.paddle_y() - self.ball_y()) / HEIGHT_BUCKET_LEN).floor().clamp(0.0, 9.0) as u8,
        }
    }
}

impl Action for PaddleControl {
    const ALL: &'static [Self] = &[PaddleControl::Left, PaddleControl::Stay, PaddleControl::Right];

    fn numeric(&self) -> ModelActionType {
        match self {
            PaddleControl::Left => 0,
            PaddleControl::Stay => 1,
            PaddleControl::Right => 2,
        }
    }
}

impl Display for PaddleControl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The Breakout game as learning environment
pub struct BreakoutEnvironment {
    mechanics: BreakoutMechanics,
    observation: Observation,
}

impl BreakoutEnvironment {
    pub fn new(board: BoardConfig) -> Self {
        Self::from_mechanics(BreakoutMechanics::new(board))
    }

    /// continues the given game
    pub(crate) fn from_mechanics(mechanics: BreakoutMechanics) -> Self {
        let observation = Observation::of(&mechanics);
        Self {
            mechanics,
            observation,
        }
    }

    /// Starts a fresh game on the given board
    pub fn reset_with(&mut self, board: BoardConfig) -> &Observation {
        *self = BreakoutEnvironment::new(board);
        &self.observation
    }

    pub fn mechanics(&self) -> &BreakoutMechanics { &self.mechanics }

    /// reward of a game cleared without loss
    pub fn max_episode_reward(&self) -> f32 {
        self.mechanics.board().brick_count() as f32 * REWARD_BRICK + WIN_BONUS
    }
}

impl Environment for BreakoutEnvironment {
    type S = Observation;
    type A = PaddleControl;

    fn reset(&mut self) -> &Observation {
        let board = *self.mechanics.board();
        self.reset_with(board)
    }

    fn state(&self) -> &Observation {
        &self.observation
    }

    fn step(&mut self, action: PaddleControl) -> (&Observation, f32, bool) {
        if self.mechanics.finished() {
            return (&self.observation, 0.0, true);
        }
        let prev_score = self.mechanics.score();
        self.mechanics.time_step(action);

        let destroyed_bricks = (self.mechanics.score() - prev_score) / BRICK_VALUE;
        let reward = destroyed_bricks as f32 * REWARD_BRICK - TICK_PENALTY + match self.mechanics.outcome() {
            Some(GameOutcome::Won) => WIN_BONUS,
            Some(GameOutcome::Lost) => -LOSS_PENALTY,
            None => 0.0,
        };
        self.observation = Observation::of(&self.mechanics);

        (&self.observation, reward, self.mechanics.finished())
    }

    fn episode_reward_goal_mean(&self) -> f32 {
        // hanging the goal a little lower than the exact value because of float calc / compare blur effects
        self.max_episode_reward() - 0.01
    }
}
