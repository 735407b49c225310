use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::environment::breakout::algebra_2d::{AaBB, Circle, contact_test_circle_aabb, ContactFace, Pos2, reflect_away, surface_normal, Vec2};
use crate::error::BreakoutError;

/// TOP / LEFT corner is 0/0; all lengths in pixels
pub const STANDARD_BOARD_WIDTH: u32 = 600;
pub const STANDARD_BOARD_HEIGHT: u32 = 400;

/// smallest board still fitting all brick rows (with a brick width >= MIN_BRICK_WIDTH) and the paddle
pub const MIN_BOARD_WIDTH: u32 = 140;
/// smallest board keeping the ball start position strictly between the lowest brick row and the paddle
pub const MIN_BOARD_HEIGHT: u32 = 240;

const CEILING_HEIGHT_Y: f32 = 0.0;

pub const BRICK_ROWS: usize = 3;
pub const BRICK_COLUMNS: usize = 5;
pub const BRICK_HEIGHT: f32 = 30.0;
/// distance of the brick grid to the left, right and top wall
pub const BRICK_MARGIN: f32 = 20.0;
const MIN_BRICK_WIDTH: f32 = 20.0;
pub const BRICK_VALUE: u32 = 10;

pub const PADDLE_WIDTH: f32 = 100.0;
pub const PADDLE_HEIGHT: f32 = 12.0;
pub const PADDLE_BOTTOM_OFFSET: f32 = 20.0;
pub const PADDLE_SPEED: f32 = 10.0;
/// max change of the ball's x speed, when hitting the outermost edge of the paddle
const PADDLE_DEFLECTION: f32 = 3.0;

pub const BALL_RADIUS: f32 = 8.0;
const BALL_INITIAL_VELOCITY: (f32, f32) = (3.0, 4.0);
pub const MAX_BALL_SPEED_X: f32 = 6.0;

/// Validated board dimensions. Immutable for the lifetime of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BoardDimensions")]
pub struct BoardConfig {
    width: u32,
    height: u32,
}

/// Unvalidated board dimensions as they arrive from outside
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardDimensions {
    pub width: u32,
    pub height: u32,
}

impl BoardConfig {
    pub fn new(width: u32, height: u32) -> Result<Self, BreakoutError> {
        if width < MIN_BOARD_WIDTH || height < MIN_BOARD_HEIGHT {
            return Err(BreakoutError::InvalidConfiguration(format!(
                "board {width}x{height} is below the minimum of {MIN_BOARD_WIDTH}x{MIN_BOARD_HEIGHT}"
            )));
        }
        let board = BoardConfig { width, height };
        debug_assert!(board.brick_width() >= MIN_BRICK_WIDTH);
        debug_assert!(board.ball_start().y - BALL_RADIUS > board.bricks_bottom_y());
        debug_assert!(board.ball_start().y + BALL_RADIUS < board.paddle_top_y());
        Ok(board)
    }

    pub fn width(&self) -> u32 { self.width }

    pub fn height(&self) -> u32 { self.height }

    pub fn len_x(&self) -> f32 { self.width as f32 }

    pub fn len_y(&self) -> f32 { self.height as f32 }

    pub fn brick_width(&self) -> f32 {
        (self.len_x() - 2.0 * BRICK_MARGIN) / BRICK_COLUMNS as f32
    }

    pub fn brick_count(&self) -> usize { BRICK_ROWS * BRICK_COLUMNS }

    fn bricks_bottom_y(&self) -> f32 {
        BRICK_MARGIN + BRICK_ROWS as f32 * BRICK_HEIGHT
    }

    pub fn paddle_top_y(&self) -> f32 {
        self.len_y() - PADDLE_BOTTOM_OFFSET - PADDLE_HEIGHT
    }

    fn ball_start(&self) -> Pos2 {
        Pos2::new(self.len_x() / 2.0, self.len_y() / 2.0)
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            width: STANDARD_BOARD_WIDTH,
            height: STANDARD_BOARD_HEIGHT,
        }
    }
}

impl TryFrom<BoardDimensions> for BoardConfig {
    type Error = BreakoutError;

    fn try_from(value: BoardDimensions) -> Result<Self, Self::Error> {
        BoardConfig::new(value.width, value.height)
    }
}

impl Display for BoardConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOutcome {
    Won,
    Lost,
}

/// Paddle direction for one tick
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PaddleControl {
    Left,
    Stay,
    Right,
}

impl PaddleControl {
    /// -1, 0 or 1
    pub fn direction(&self) -> i8 {
        match self {
            PaddleControl::Left => -1,
            PaddleControl::Stay => 0,
            PaddleControl::Right => 1,
        }
    }
}

impl TryFrom<i8> for PaddleControl {
    type Error = BreakoutError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(PaddleControl::Left),
            0 => Ok(PaddleControl::Stay),
            1 => Ok(PaddleControl::Right),
            _ => Err(BreakoutError::InvalidAction(value))
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Brick {
    pub row: usize,
    pub column: usize,
    pub shape: AaBB,
    pub alive: bool,
}

/// A ball is a perfect round 2D structure
#[derive(Clone, Debug, PartialEq)]
pub struct Ball {
    pub shape: Circle,
    /// move vector per tick
    pub velocity: Vec2,
}

impl Ball {
    fn proceed(&mut self) {
        self.shape.center += self.velocity;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Paddle {
    pub shape: AaBB,
}

impl Paddle {
    /// physically move one time step forward; stops at the walls
    fn proceed(&mut self, control: PaddleControl, board_len_x: f32) {
        let potential_pos = self.shape.translate(Vec2::new(control.direction() as f32 * PADDLE_SPEED, 0.0));

        self.shape = if potential_pos.min.x < 0.0 {
            potential_pos.translate(Vec2::new(-potential_pos.min.x, 0.0))
        } else if potential_pos.max.x > board_len_x {
            potential_pos.translate(Vec2::new(board_len_x - potential_pos.max.x, 0.0))
        } else {
            potential_pos
        };
    }
}

/// The full mutable state of one game. Mutated exclusively by [BreakoutMechanics::time_step].
#[derive(Clone, Debug, PartialEq)]
pub struct BreakoutMechanics {
    board: BoardConfig,
    bricks: Vec<Brick>,
    ball: Ball,
    paddle: Paddle,
    score: u32,
    elapsed_ticks: u64,
    outcome: Option<GameOutcome>,
}

impl BreakoutMechanics {
    pub fn new(board: BoardConfig) -> Self {
        Self {
            board,
            bricks: Self::initial_bricks(&board),
            ball: Self::initial_ball(&board),
            paddle: Self::initial_paddle(&board),
            score: 0,
            elapsed_ticks: 0,
            outcome: None,
        }
    }

    fn initial_bricks(board: &BoardConfig) -> Vec<Brick> {
        let brick_width = board.brick_width();
        let mut bricks = Vec::with_capacity(board.brick_count());
        for row in 0..BRICK_ROWS {
            for column in 0..BRICK_COLUMNS {
                bricks.push(Brick {
                    row,
                    column,
                    shape: AaBB::from_corner(
                        BRICK_MARGIN + column as f32 * brick_width,
                        BRICK_MARGIN + row as f32 * BRICK_HEIGHT,
                        brick_width,
                        BRICK_HEIGHT,
                    ),
                    alive: true,
                })
            }
        }
        bricks
    }

    fn initial_ball(board: &BoardConfig) -> Ball {
        Ball {
            shape: Circle {
                center: board.ball_start(),
                radius: BALL_RADIUS,
            },
            velocity: Vec2::new(BALL_INITIAL_VELOCITY.0, BALL_INITIAL_VELOCITY.1),
        }
    }

    fn initial_paddle(board: &BoardConfig) -> Paddle {
        Paddle {
            shape: AaBB::from_corner(
                (board.len_x() - PADDLE_WIDTH) / 2.0,
                board.paddle_top_y(),
                PADDLE_WIDTH,
                PADDLE_HEIGHT,
            )
        }
    }

    /// all bricks destroyed, except the middle one of the lowest row; the ball is right below it, moving up
    #[cfg(test)]
    pub(crate) fn test_state_last_brick_ahead() -> Self {
        let mut game = BreakoutMechanics::new(BoardConfig::default());
        for brick in game.bricks.iter_mut().filter(|b| !(b.row == BRICK_ROWS - 1 && b.column == BRICK_COLUMNS / 2)) {
            brick.alive = false;
        }
        // remaining brick: x 244..356, y 80..110
        game.ball.shape.center = Pos2::new(300.0, 125.0);
        game.ball.velocity = Vec2::new(0.0, -4.0);
        game
    }

    pub fn board(&self) -> &BoardConfig { &self.board }

    pub fn bricks(&self) -> &[Brick] { &self.bricks }

    pub fn ball(&self) -> &Ball { &self.ball }

    pub fn paddle(&self) -> &Paddle { &self.paddle }

    pub fn score(&self) -> u32 { self.score }

    pub fn elapsed_ticks(&self) -> u64 { self.elapsed_ticks }

    pub fn outcome(&self) -> Option<GameOutcome> { self.outcome }

    pub fn finished(&self) -> bool { self.outcome.is_some() }

    pub fn alive_bricks(&self) -> usize {
        self.bricks.iter().filter(|e| e.alive).count()
    }

    /// physically move one time step forward; a no-op once the game is finished
    pub fn time_step(&mut self, control: PaddleControl) {
        if self.finished() {
            return;
        }
        self.elapsed_ticks += 1;
        self.paddle.proceed(control, self.board.len_x());
        self.ball.proceed();

        self.resolve_wall_collisions();
        self.resolve_paddle_collision();
        self.resolve_brick_collision();
        self.check_game_end_situation();
    }

    fn resolve_wall_collisions(&mut self) {
        let len_x = self.board.len_x();
        let ball = &mut self.ball;
        let radius = ball.shape.radius;

        if ball.shape.center.x - radius < 0.0 {
            ball.shape.center.x = radius;
            ball.velocity.x = ball.velocity.x.abs();
        } else if ball.shape.center.x + radius > len_x {
            ball.shape.center.x = len_x - radius;
            ball.velocity.x = -ball.velocity.x.abs();
        }

        if ball.shape.center.y - radius < CEILING_HEIGHT_Y {
            ball.shape.center.y = CEILING_HEIGHT_Y + radius;
            ball.velocity.y = ball.velocity.y.abs();
        }
    }

    /// the paddle reflects a falling ball touching its top face
    fn resolve_paddle_collision(&mut self) {
        if self.ball.velocity.y <= 0.0 {
            return;
        }
        let Some(contact) = contact_test_circle_aabb(&self.ball.shape, &self.paddle.shape) else {
            return;
        };
        if surface_normal(&contact).y >= 0.0 {
            return;
        }

        let paddle_center_x = self.paddle.shape.center().x;
        let offset = ((self.ball.shape.center.x - paddle_center_x) / (self.paddle.shape.width() / 2.0)).clamp(-1.0, 1.0);
        let ball = &mut self.ball;
        ball.velocity.y = -ball.velocity.y;
        ball.velocity.x = (ball.velocity.x + offset * PADDLE_DEFLECTION).clamp(-MAX_BALL_SPEED_X, MAX_BALL_SPEED_X);
        log::trace!("paddle hit at offset {offset:.2}, ball velocity now {:?}", ball.velocity);
    }

    /// destroys at most one brick per tick - the first alive one in contact
    fn resolve_brick_collision(&mut self) {
        let ball_shape = self.ball.shape;
        let hit = self.bricks.iter()
            .enumerate()
            .filter(|(_, brick)| brick.alive)
            .find_map(|(idx, brick)| contact_test_circle_aabb(&ball_shape, &brick.shape).map(|c| (idx, c)));

        if let Some((idx, contact)) = hit {
            let brick = &mut self.bricks[idx];
            brick.alive = false;
            self.score += BRICK_VALUE;

            let normal = surface_normal(&contact);
            let velocity = &mut self.ball.velocity;
            match ContactFace::of(normal) {
                ContactFace::Side => velocity.x = reflect_away(velocity.x, normal.x),
                ContactFace::Cap => velocity.y = reflect_away(velocity.y, normal.y),
            }
            log::debug!("brick ({},{}) destroyed, score: {}", brick.row, brick.column, self.score);
        }
    }

    fn check_game_end_situation(&mut self) {
        if self.bricks.iter().all(|e| !e.alive) {
            self.outcome = Some(GameOutcome::Won);
        } else if self.ball.shape.center.y + self.ball.shape.radius >= self.board.len_y() {
            self.outcome = Some(GameOutcome::Lost);
        }
        if let Some(outcome) = self.outcome {
            log::debug!("game finished after {} ticks: {:?}, score: {}", self.elapsed_ticks, outcome, self.score);
        }
    }
}

pub trait Assert {
    fn assert(&self, board: &BoardConfig);
}

impl Assert for Paddle {
    fn assert(&self, board: &BoardConfig) {
        assert!(self.shape.min.x >= 0.0);
        assert!(self.shape.max.x <= board.len_x());
        assert!(self.shape.min.y >= 0.0);
        assert!(self.shape.max.y <= board.len_y());
    }
}

impl Assert for Ball {
    fn assert(&self, board: &BoardConfig) {
        assert!(self.shape.center.x - self.shape.radius >= 0.0);
        assert!(self.shape.center.x + self.shape.radius <= board.len_x());
        assert!(self.shape.center.y - self.shape.radius >= 0.0);
        assert!(self.shape.center.y + self.shape.radius <= board.len_y());
    }
}
