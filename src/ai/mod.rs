pub mod policy;
pub mod trainer;
