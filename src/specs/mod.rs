pub mod filter;
pub mod jobs;
pub mod tags;

pub use filter::{fields, Attribute, FilterError, FilterExpr, Value};
pub use jobs::{find, find_zombies, zombie_cutoff};
