pub mod core;
pub mod distribution;
pub mod overview;
pub mod performance;
pub mod students;
pub mod subjects;
