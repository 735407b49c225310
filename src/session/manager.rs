use std::path::Path;
use std::sync::Arc;

use parking_lot::{FairMutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::ai::policy::Policy;
use crate::ai::trainer;
use crate::environment::breakout::mechanics::{BoardConfig, BoardDimensions, PaddleControl};
use crate::environment::breakout_environment::BreakoutEnvironment;
use crate::error::BreakoutError;
use crate::ql::learn::q_learner::{Parameter, TrainingBudget, TrainingReport};
use crate::ql::prelude::Environment;
use crate::session::snapshot::Snapshot;
use crate::trajectory::{Trajectory, TrajectoryRecorder, TrajectoryStep};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayMode {
    Human,
    AiAgent,
}

/// One poll of the game loop, as it arrives from a client
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceRequest {
    pub mode: PlayMode,
    /// paddle direction -1, 0 or 1 in human mode; missing means 0
    #[serde(default)]
    pub action: Option<i8>,
    /// starts a session with that board, if there is none yet
    #[serde(default)]
    pub board: Option<BoardDimensions>,
}

impl AdvanceRequest {
    pub fn human(action: i8) -> Self {
        Self { mode: PlayMode::Human, action: Some(action), board: None }
    }

    pub fn agent() -> Self {
        Self { mode: PlayMode::AiAgent, action: None, board: None }
    }

    pub fn with_board(self, width: u32, height: u32) -> Self {
        Self { board: Some(BoardDimensions { width, height }), ..self }
    }
}

/// Who decides the paddle direction of a tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Human(PaddleControl),
    Agent,
}

impl TryFrom<&AdvanceRequest> for Control {
    type Error = BreakoutError;

    fn try_from(request: &AdvanceRequest) -> Result<Self, Self::Error> {
        match request.mode {
            PlayMode::Human => Ok(Control::Human(PaddleControl::try_from(request.action.unwrap_or(0))?)),
            PlayMode::AiAgent => Ok(Control::Agent),
        }
    }
}

/// Control with the resolved agent
enum Driver {
    Human(PaddleControl),
    Agent(Arc<Policy>),
}

#[derive(Clone, Debug, Default)]
pub struct ManagerConfig {
    pub learner: Parameter,
    pub budget: TrainingBudget,
}

struct LiveSession {
    environment: BreakoutEnvironment,
    recorder: TrajectoryRecorder,
}

impl LiveSession {
    fn new(board: BoardConfig) -> Self {
        Self {
            environment: BreakoutEnvironment::new(board),
            recorder: TrajectoryRecorder::new(),
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::of(self.environment.mechanics())
    }
}

/**
    Owner of the one live game session and the current policy.

    State advancing calls are serialized through a fair lock, so concurrent callers are
    served one after another in arrival order. Training works on a private environment
    and does not block the session.
    Meant to be shared via `Arc`.
 */
pub struct SessionManager {
    config: ManagerConfig,
    session: FairMutex<Option<LiveSession>>,
    policy: RwLock<Option<Arc<Policy>>>,
}

impl SessionManager {
    pub fn new(config: ManagerConfig) -> Self {
        Self {
            config,
            session: FairMutex::new(None),
            policy: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &ManagerConfig { &self.config }

    /// Discards the current session (and its trajectory) and starts a new game
    pub fn start_or_reset(&self, width: u32, height: u32) -> Result<Snapshot, BreakoutError> {
        let board = BoardConfig::new(width, height)?;
        let mut guard = self.session.lock();
        let snapshot = match guard.as_mut() {
            Some(session) => {
                session.environment.reset_with(board);
                session.recorder.clear();
                session.snapshot()
            }
            None => guard.insert(LiveSession::new(board)).snapshot(),
        };
        log::info!("new game on board {}", board);
        Ok(snapshot)
    }

    /// Advances the session by one tick.
    /// A finished game stays frozen; advancing it just returns the final state again.
    pub fn advance(&self, request: &AdvanceRequest) -> Result<Snapshot, BreakoutError> {
        let driver = match Control::try_from(request)? {
            Control::Human(action) => Driver::Human(action),
            Control::Agent => Driver::Agent(self.policy().ok_or(BreakoutError::AgentNotTrained)?),
        };

        let mut guard = self.session.lock();
        if guard.is_none() {
            // board dimensions only count when there is no session yet
            let board = BoardConfig::try_from(request.board.ok_or(BreakoutError::NoActiveSession)?)?;
            log::info!("new game on board {} (implicit start)", board);
            *guard = Some(LiveSession::new(board));
        }
        let Some(session) = guard.as_mut() else {
            return Err(BreakoutError::NoActiveSession);
        };

        if session.environment.mechanics().finished() {
            return Ok(session.snapshot());
        }

        let observation = *session.environment.state();
        let action = match &driver {
            Driver::Human(action) => *action,
            Driver::Agent(policy) => policy.choose(&observation),
        };
        let (_, reward, terminal) = session.environment.step(action);

        match driver {
            Driver::Human(_) => session.recorder.record(TrajectoryStep {
                tick: session.environment.mechanics().elapsed_ticks(),
                observation,
                action: action.direction(),
                reward,
                terminal,
            }),
            Driver::Agent(_) => session.recorder.mark_agent_tick(),
        }
        if terminal {
            let mechanics = session.environment.mechanics();
            log::info!("game over after {} ticks: {:?} with score {}",
                mechanics.elapsed_ticks(), mechanics.outcome(), mechanics.score());
        }
        Ok(session.snapshot())
    }

    /// Current state without advancing
    pub fn snapshot(&self) -> Result<Snapshot, BreakoutError> {
        self.session.lock().as_ref()
            .map(LiveSession::snapshot)
            .ok_or(BreakoutError::NoActiveSession)
    }

    /// Trains a new policy with the configured parameters and budget and installs it on success.
    /// The live session is neither locked nor touched meanwhile.
    pub fn train(&self, width: u32, height: u32) -> Result<TrainingReport, BreakoutError> {
        let board = BoardConfig::new(width, height)?;
        let policy = trainer::train(board, &self.config.budget, self.config.learner.clone())?;
        let report = policy.report().clone();
        self.install_policy(policy);
        Ok(report)
    }

    pub fn install_policy(&self, policy: Policy) {
        log::info!("installing policy with {} known states", policy.known_states());
        *self.policy.write() = Some(Arc::new(policy));
    }

    pub fn has_policy(&self) -> bool {
        self.policy.read().is_some()
    }

    pub fn policy(&self) -> Option<Arc<Policy>> {
        self.policy.read().clone()
    }

    /// Trajectory of the finished human game of the current session
    pub fn export_trajectory(&self) -> Result<Trajectory, BreakoutError> {
        let guard = self.session.lock();
        let session = guard.as_ref().ok_or_else(|| BreakoutError::no_trajectory("no session"))?;
        session.recorder.export(session.environment.mechanics())
    }

    pub fn export_trajectory_to(&self, file: &Path) -> anyhow::Result<Trajectory> {
        let trajectory = self.export_trajectory()?;
        trajectory.write_json(file)?;
        log::info!("trajectory with {} steps written to {}", trajectory.steps.len(), file.display());
        Ok(trajectory)
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        SessionManager::new(ManagerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::environment::breakout::mechanics::{BRICK_VALUE, BreakoutMechanics, GameOutcome};
    use crate::environment::breakout_environment::{REWARD_BRICK, WIN_BONUS};

    use super::*;

    #[test]
    fn test_request_json() {
        let request: AdvanceRequest = serde_json::from_str(r#"{"mode": "human", "action": -1}"#).unwrap();
        assert_eq!(request, AdvanceRequest::human(-1));

        let request: AdvanceRequest = serde_json::from_str(r#"{"mode": "ai_agent", "board": {"width": 600, "height": 400}}"#).unwrap();
        assert_eq!(request, AdvanceRequest::agent().with_board(600, 400));

        assert!(serde_json::from_str::<AdvanceRequest>(r#"{"mode": "robot"}"#).is_err());
    }

    #[rstest]
    #[case(AdvanceRequest::human(-1), Ok(Control::Human(PaddleControl::Left)))]
    #[case(AdvanceRequest::human(1), Ok(Control::Human(PaddleControl::Right)))]
    #[case(AdvanceRequest { action: None, ..AdvanceRequest::human(0) }, Ok(Control::Human(PaddleControl::Stay)))]
    #[case(AdvanceRequest::human(2), Err(BreakoutError::InvalidAction(2)))]
    #[case(AdvanceRequest::agent(), Ok(Control::Agent))]
    fn test_control(#[case] request: AdvanceRequest, #[case] expected: Result<Control, BreakoutError>) {
        assert_eq!(Control::try_from(&request), expected);
    }

    #[test]
    fn test_invalid_action_leaves_session_untouched() {
        let manager = SessionManager::default();
        let start = manager.start_or_reset(600, 400).unwrap();
        assert_eq!(manager.advance(&AdvanceRequest::human(-2)), Err(BreakoutError::InvalidAction(-2)));
        assert_eq!(manager.snapshot().unwrap(), start);
    }

    #[test]
    fn test_agent_without_policy() {
        let manager = SessionManager::default();
        assert_eq!(manager.advance(&AdvanceRequest::agent().with_board(600, 400)), Err(BreakoutError::AgentNotTrained));
        // no implicit start happened
        assert_eq!(manager.snapshot(), Err(BreakoutError::NoActiveSession));
    }

    #[test]
    fn test_board_of_running_session_is_not_checked() {
        let manager = SessionManager::default();
        manager.start_or_reset(600, 400).unwrap();
        let snapshot = manager.advance(&AdvanceRequest::human(0).with_board(10, 10)).unwrap();
        assert_eq!(snapshot.elapsed_ticks, 1);
        assert_eq!(snapshot.board, BoardConfig::default());
    }

    #[test]
    fn test_win_on_last_brick() {
        let manager = SessionManager::default();
        *manager.session.lock() = Some(LiveSession {
            environment: BreakoutEnvironment::from_mechanics(BreakoutMechanics::test_state_last_brick_ahead()),
            recorder: TrajectoryRecorder::new(),
        });

        let first = manager.advance(&AdvanceRequest::human(0)).unwrap();
        assert!(!first.game_over);
        assert_eq!(first.score, 0);

        let last = manager.advance(&AdvanceRequest::human(0)).unwrap();
        assert_eq!(last.elapsed_ticks, 2);
        assert!(last.game_over);
        assert_eq!(last.outcome, Some(GameOutcome::Won));
        assert_eq!(last.score, BRICK_VALUE);
        assert!(last.bricks.iter().all(|b| !b.alive));
        assert_eq!(manager.advance(&AdvanceRequest::human(1)).unwrap(), last);

        let trajectory = manager.export_trajectory().unwrap();
        assert_eq!(trajectory.outcome, GameOutcome::Won);
        assert_eq!(trajectory.steps.iter().map(|s| s.reward).collect::<Vec<_>>(), vec![0.0, REWARD_BRICK + WIN_BONUS]);
    }

    #[test]
    fn test_reset_discards_trajectory() {
        let manager = SessionManager::default();
        manager.start_or_reset(600, 400).unwrap();
        while !manager.advance(&AdvanceRequest::human(-1)).unwrap().game_over {}
        assert!(manager.export_trajectory().is_ok());

        let snapshot = manager.start_or_reset(800, 600).unwrap();
        assert_eq!(snapshot.elapsed_ticks, 0);
        assert_eq!(snapshot.board.width(), 800);
        assert!(matches!(manager.export_trajectory(), Err(BreakoutError::NoTrajectoryAvailable(_))));
    }

    #[test]
    fn test_implicit_start_with_invalid_board() {
        let manager = SessionManager::default();
        assert!(matches!(
            manager.advance(&AdvanceRequest::human(0).with_board(10, 10)),
            Err(BreakoutError::InvalidConfiguration(_))
        ));
        assert_eq!(manager.advance(&AdvanceRequest::human(0)), Err(BreakoutError::NoActiveSession));
    }
}
