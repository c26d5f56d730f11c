//! Task dependency graph engine.
//!
//! Typed precedence edges between tasks with a cycle guard on insert,
//! decorated read projections, and a Gantt schedule assembler, served over a
//! small JSON HTTP API. Storage is injected through the traits in [`store`];
//! [`db::Database`] is the SQLite implementation.

pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod graph;
pub mod logging;
pub mod store;
pub mod types;
