pub mod criteria;
pub mod job;
