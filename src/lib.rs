// src/lib.rs — Library root for autodraft

pub mod api;
pub mod cli;
pub mod core;
pub mod cover;
pub mod infra;
pub mod pipeline;
pub mod provider;
pub mod publish;
pub mod store;
pub mod util;
