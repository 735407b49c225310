use serde::{Deserialize, Serialize};

use crate::environment::breakout::mechanics::{BoardConfig, BreakoutMechanics, GameOutcome};

/// Render-ready view of a session after a tick
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub board: BoardConfig,
    pub ball: BallView,
    pub paddle: PaddleView,
    pub bricks: Vec<BrickView>,
    pub score: u32,
    pub elapsed_ticks: u64,
    pub game_over: bool,
    pub outcome: Option<GameOutcome>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BallView {
    /// center
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaddleView {
    /// left edge
    pub x: f32,
    /// top edge
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BrickView {
    pub row: usize,
    pub column: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub alive: bool,
}

impl Snapshot {
    pub fn of(mechanics: &BreakoutMechanics) -> Self {
        let ball = mechanics.ball();
        let paddle = mechanics.paddle();
        Snapshot {
            board: *mechanics.board(),
            ball: BallView {
                x: ball.shape.center.x,
                y: ball.shape.center.y,
                radius: ball.shape.radius,
            },
            paddle: PaddleView {
                x: paddle.shape.min.x,
                y: paddle.shape.min.y,
                width: paddle.shape.width(),
                height: paddle.shape.height(),
            },
            bricks: mechanics.bricks().iter()
                .map(|b| BrickView {
                    row: b.row,
                    column: b.column,
                    x: b.shape.min.x,
                    y: b.shape.min.y,
                    width: b.shape.width(),
                    height: b.shape.height(),
                    alive: b.alive,
                })
                .collect(),
            score: mechanics.score(),
            elapsed_ticks: mechanics.elapsed_ticks(),
            game_over: mechanics.finished(),
            outcome: mechanics.outcome(),
        }
    }
}
