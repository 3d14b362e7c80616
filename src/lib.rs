//! Job search specifications
//!
//! Builds composable filters over submitted jobs: a search filter from
//! independently-optional criteria and a liveness filter that finds "zombie"
//! jobs stuck in an active state. Filters are plain values; the `db` module
//! lowers them to PostgreSQL and the reaper service acts on zombies.

pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod specs;
