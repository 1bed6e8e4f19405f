// src/core/mod.rs — Core iteration engine

pub mod extract;
pub mod orchestrator;
pub mod runner;
pub mod state;
pub mod types;
