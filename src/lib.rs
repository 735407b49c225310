pub mod ai;
pub mod environment;
pub mod error;
pub mod ql;
pub mod session;
pub mod trajectory;
pub mod util;
