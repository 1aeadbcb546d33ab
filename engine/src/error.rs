//! Error types.
//!
//! Queries fail with a `QueryError`, preprocessing with a `PreparationError`.
//! Everything touching the disk or configuration files goes through `Error`.

use crate::datastr::graph::NodeId;
use std::time::Duration;
use thiserror::Error;

/// Additional information on why no route exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Source and target are not even weakly connected.
    DifferentSubnetworks,
}

/// The budget a search ran out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchLimit {
    VisitedNodes(usize),
    Timeout(Duration),
}

impl std::fmt::Display for SearchLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchLimit::VisitedNodes(limit) => write!(f, "more than {} visited nodes", limit),
            SearchLimit::Timeout(timeout) => write!(f, "timeout of {}ms", timeout.as_millis()),
        }
    }
}

fn reason_suffix(reason: &Option<DisconnectReason>) -> &'static str {
    match reason {
        Some(DisconnectReason::DifferentSubnetworks) => " (different subnetworks)",
        None => "",
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("point {point_index} could not be mapped to the graph")]
    PointNotFound { point_index: usize },

    #[error("no connection from {from} to {to}{}", reason_suffix(.reason))]
    ConnectionNotFound {
        from: NodeId,
        to: NodeId,
        reason: Option<DisconnectReason>,
    },

    #[error("search aborted after {visited_nodes} visited nodes: {limit}")]
    SearchAborted { limit: SearchLimit, visited_nodes: usize },

    #[error("invalid preparation: {reason}")]
    InvalidPreparation { reason: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PreparationError {
    #[error("contraction stopped with {remaining} nodes left without a level")]
    DependencyCycle { remaining: usize },

    #[error("contraction invariant violated: {reason}")]
    InvariantViolation { reason: String },

    #[error("invalid node order: {reason}")]
    InvalidNodeOrder { reason: String },

    #[error("invalid parameters: {reason}")]
    InvalidParams { reason: String },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Preparation(#[from] PreparationError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
