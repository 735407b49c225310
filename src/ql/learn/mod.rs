pub mod q_learner;
pub mod replay_buffer;
