pub mod prelude;
pub mod q_table;
pub mod learn;
mod test_environment;
