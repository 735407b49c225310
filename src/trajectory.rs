use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::environment::breakout::mechanics::{BoardConfig, BreakoutMechanics, GameOutcome};
use crate::environment::breakout_environment::Observation;
use crate::error::BreakoutError;

/// One human decision: what was seen, what was done, what it earned
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryStep {
    /// tick number reached by this step, starting with 1
    pub tick: u64,
    /// observation before the action
    pub observation: Observation,
    /// paddle direction -1, 0 or 1
    pub action: i8,
    pub reward: f32,
    pub terminal: bool,
}

/// A finished human game
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub board: BoardConfig,
    pub outcome: GameOutcome,
    pub score: u32,
    pub steps: Vec<TrajectoryStep>,
}

impl Trajectory {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn write_json(&self, file: &Path) -> Result<()> {
        fs::write(file, self.to_json()?)
            .with_context(|| format!("writing trajectory {}", file.display()))
    }
}

/// Collects the steps of the human game in one session.
///
/// Once an agent played a tick of that game, the recording no longer
/// describes a human game and can't be exported.
#[derive(Debug, Default)]
pub struct TrajectoryRecorder {
    steps: Vec<TrajectoryStep>,
    interleaved: bool,
}

impl TrajectoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, step: TrajectoryStep) {
        debug_assert!(self.steps.last().map_or(true, |s| s.tick < step.tick && !s.terminal));
        self.steps.push(step);
    }

    pub fn mark_agent_tick(&mut self) {
        if !self.interleaved {
            log::debug!("agent played a tick; the human trajectory of this game is invalidated");
        }
        self.interleaved = true;
    }

    pub fn clear(&mut self) {
        self.steps.clear();
        self.interleaved = false;
    }

    /// Copy of the recorded game; available only once the game is over
    pub fn export(&self, mechanics: &BreakoutMechanics) -> Result<Trajectory, BreakoutError> {
        let outcome = mechanics.outcome()
            .ok_or_else(|| BreakoutError::no_trajectory("game is still running"))?;
        if self.interleaved {
            return Err(BreakoutError::no_trajectory("game was (partly) played by the agent"));
        }
        if self.steps.is_empty() {
            return Err(BreakoutError::no_trajectory("no human ticks recorded"));
        }
        Ok(Trajectory {
            board: *mechanics.board(),
            outcome,
            score: mechanics.score(),
            steps: self.steps.clone(),
        })
    }
}
