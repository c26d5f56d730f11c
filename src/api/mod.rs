//! HTTP API over the dependency graph.
//!
//! JSON in, JSON out. Every response uses the `{success, message, data,
//! error}` envelope from [`response`].

pub mod handlers;
pub mod response;
mod server;

use std::sync::Arc;

use crate::graph::DependencyGraph;

pub use server::{ServerHandle, build_router, start_server};

/// State shared across handlers.
#[derive(Clone)]
pub struct ApiState {
    pub graph: Arc<DependencyGraph>,
}

impl ApiState {
    pub fn new(graph: Arc<DependencyGraph>) -> Self {
        Self { graph }
    }
}
