use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::environment::breakout::mechanics::{BoardConfig, PaddleControl};
use crate::environment::breakout_environment::{Observation, StateKey};
use crate::ql::learn::q_learner::TrainingReport;
use crate::ql::prelude::{Action, Discretize};
use crate::ql::q_table::QTable;

/// Trained mapping from observation to paddle direction; the artifact of a training run
#[derive(Clone, Debug, PartialEq)]
pub struct Policy {
    board: BoardConfig,
    q_table: QTable<StateKey>,
    report: TrainingReport,
}

/// Persisted form of a [Policy]
#[derive(Serialize, Deserialize)]
struct Checkpoint {
    board: BoardConfig,
    report: TrainingReport,
    action_space: usize,
    entries: Vec<(StateKey, Vec<f32>)>,
}

impl Policy {
    pub fn new(board: BoardConfig, q_table: QTable<StateKey>, report: TrainingReport) -> Self {
        assert_eq!(q_table.action_space(), PaddleControl::action_space());
        Self { board, q_table, report }
    }

    /// board the policy was trained on
    pub fn board(&self) -> &BoardConfig { &self.board }

    pub fn report(&self) -> &TrainingReport { &self.report }

    pub fn known_states(&self) -> usize { self.q_table.len() }

    /// Greedy decision; states never seen during training keep the paddle where it is
    pub fn choose(&self, observation: &Observation) -> PaddleControl {
        self.q_table.greedy_action_index(&observation.discretize())
            .map_or(PaddleControl::Stay, |idx| PaddleControl::ALL[idx])
    }

    pub fn write_checkpoint(&self, file: &Path) -> Result<()> {
        let checkpoint = Checkpoint {
            board: self.board,
            report: self.report.clone(),
            action_space: self.q_table.action_space(),
            entries: self.q_table.sorted_entries(),
        };
        let json = serde_json::to_string(&checkpoint)?;
        fs::write(file, json)
            .with_context(|| format!("writing policy checkpoint {}", file.display()))?;
        log::info!("policy checkpoint with {} states written to {}", self.known_states(), file.display());
        Ok(())
    }

    pub fn read_checkpoint(file: &Path) -> Result<Self> {
        let json = fs::read_to_string(file)
            .with_context(|| format!("reading policy checkpoint {}", file.display()))?;
        let checkpoint: Checkpoint = serde_json::from_str(&json)
            .with_context(|| format!("parsing policy checkpoint {}", file.display()))?;
        anyhow::ensure!(checkpoint.action_space == PaddleControl::action_space(),
            "checkpoint has an action space of {}, expected {}", checkpoint.action_space, PaddleControl::action_space());
        let q_table = QTable::from_entries(checkpoint.action_space, checkpoint.entries)?;
        Ok(Policy::new(checkpoint.board, q_table, checkpoint.report))
    }
}
