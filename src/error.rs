use std::fmt::{Display, Formatter};

/// Typed error signal of the simulation core.
///
/// All variants are recoverable: a rejected call leaves the live session untouched and
/// the caller may retry after fixing the precondition (reset, train, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakoutError {
    /// Board too small or otherwise malformed, or a training budget that allows no work
    InvalidConfiguration(String),
    /// `advance` (or a snapshot read) before any `start_or_reset`
    NoActiveSession,
    /// AI-agent mode requested while no policy is installed
    AgentNotTrained,
    /// Trajectory export before game-over, without human ticks or of an AI-interleaved game
    NoTrajectoryAvailable(String),
    /// Paddle direction outside of {-1, 0, 1}
    InvalidAction(i8),
}

impl BreakoutError {
    pub fn invalid_configuration(msg: &str) -> Self { BreakoutError::InvalidConfiguration(msg.to_string()) }

    pub fn no_trajectory(msg: &str) -> Self { BreakoutError::NoTrajectoryAvailable(msg.to_string()) }
}

impl Display for BreakoutError {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            BreakoutError::InvalidConfiguration(msg) => write!(f, "invalid configuration: {msg}"),
            BreakoutError::NoActiveSession => f.write_str("no active session - reset the game first"),
            BreakoutError::AgentNotTrained => f.write_str("agent not trained - run a training first"),
            BreakoutError::NoTrajectoryAvailable(msg) => write!(f, "no trajectory available: {msg}"),
            BreakoutError::InvalidAction(value) => write!(f, "invalid paddle action {value} (expected -1, 0 or 1)"),
        }
    }
}

impl std::error::Error for BreakoutError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(BreakoutError::InvalidAction(7).to_string(), "invalid paddle action 7 (expected -1, 0 or 1)");
        assert!(BreakoutError::invalid_configuration("board too small").to_string().contains("board too small"));

        let as_anyhow: anyhow::Error = BreakoutError::AgentNotTrained.into();
        assert_eq!(as_anyhow.downcast_ref::<BreakoutError>(), Some(&BreakoutError::AgentNotTrained));
    }
}
