//! Routing algorithms.
//!
//! All query servers implement `QueryServer`: a query returns the costs of the best route right away,
//! the route itself is reconstructed lazily through the `PathServer` in the result.

use crate::config::QueryParams;
use crate::datastr::graph::*;
use crate::error::{DisconnectReason, QueryError, SearchLimit};
use std::time::Instant;

pub mod a_star;
pub mod alt;
pub mod contraction_hierarchy;
pub mod dijkstra;
pub mod location_index;
pub mod matrix;
pub mod round_trip;
pub mod router;
pub mod subnetworks;
pub mod traversal;
pub mod weighting;

use self::traversal::TraversalGraph;

/// Simply a source-target pair of road nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Query {
    pub from: NodeId,
    pub to: NodeId,
}

/// A route through the road graph.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePath {
    /// road nodes, starting with the source and ending with the target
    pub nodes: Vec<NodeId>,
    /// road edges in travel order
    pub edges: Vec<EdgeId>,
    pub weight: Weight,
    pub distance: f64,
    pub millis: u64,
}

impl RoutePath {
    /// Route of a query where source and target coincide.
    pub fn trivial(node: NodeId) -> RoutePath {
        RoutePath {
            nodes: vec![node],
            edges: Vec::new(),
            weight: 0.0,
            distance: 0.0,
            millis: 0,
        }
    }

    /// Append `other`, which has to start where `self` ends.
    pub fn append(&mut self, other: RoutePath) {
        debug_assert_eq!(self.nodes.last(), other.nodes.first());
        self.nodes.extend(other.nodes.into_iter().skip(1));
        self.edges.extend(other.edges);
        self.weight += other.weight;
        self.distance += other.distance;
        self.millis = self.millis.saturating_add(other.millis);
    }
}

/// Result of a successful query.
/// Since queries modify the state of the algorithm, the path can only be retrieved until the next query.
/// Lifetimes enforce this through the method signatures.
#[derive(Debug)]
pub struct QueryResult<P> {
    costs: Label,
    path_server: P,
}

impl<P: PathServer> QueryResult<P> {
    pub fn new(costs: Label, path_server: P) -> Self {
        QueryResult { costs, path_server }
    }

    pub fn costs(&self) -> Label {
        self.costs
    }

    pub fn weight(&self) -> Weight {
        self.costs.weight
    }

    pub fn distance(&self) -> f64 {
        self.costs.distance
    }

    pub fn millis(&self) -> u64 {
        self.costs.millis
    }

    pub fn path(&mut self) -> RoutePath {
        self.path_server.reconstruct_path()
    }
}

pub trait QueryServer {
    type P<'s>: PathServer
    where
        Self: 's;

    fn query(&mut self, query: Query) -> Result<QueryResult<Self::P<'_>>, QueryError>;
}

pub trait PathServer {
    fn reconstruct_path(&mut self) -> RoutePath;
}

/// Tracks visited nodes and elapsed time of a single query.
#[derive(Debug, Clone)]
pub struct SearchBudget {
    max_visited_nodes: usize,
    timeout: Option<std::time::Duration>,
    start: Instant,
    visited_nodes: usize,
}

impl SearchBudget {
    pub fn new(params: &QueryParams) -> Self {
        SearchBudget {
            max_visited_nodes: params.max_visited_nodes,
            timeout: params.timeout(),
            start: Instant::now(),
            visited_nodes: 0,
        }
    }

    /// Call before settling another node.
    ///
    /// Only a search which needs more nodes or time than allowed aborts. A search which can prove
    /// its result within the budget succeeds, e.g. a bidirectional search between neighbors
    /// with a budget of one node.
    pub fn visit(&mut self) -> Result<(), QueryError> {
        if self.visited_nodes >= self.max_visited_nodes {
            return Err(QueryError::SearchAborted {
                limit: SearchLimit::VisitedNodes(self.max_visited_nodes),
                visited_nodes: self.visited_nodes,
            });
        }
        if let Some(timeout) = self.timeout {
            if self.visited_nodes % 64 == 0 && self.start.elapsed() >= timeout {
                return Err(QueryError::SearchAborted {
                    limit: SearchLimit::Timeout(timeout),
                    visited_nodes: self.visited_nodes,
                });
            }
        }
        self.visited_nodes += 1;
        Ok(())
    }

    pub fn visited_nodes(&self) -> usize {
        self.visited_nodes
    }
}

/// The error for a query which exhausted its search space without reaching the target.
pub fn connection_not_found(graph: &TraversalGraph, query: Query) -> QueryError {
    let reason = if graph.same_component(query.from, query.to) {
        None
    } else {
        Some(DisconnectReason::DifferentSubnetworks)
    };
    QueryError::ConnectionNotFound {
        from: query.from,
        to: query.to,
        reason,
    }
}

/// Fails with `PointNotFound` if a query node does not exist in the graph.
pub fn check_query(graph: &TraversalGraph, query: Query) -> Result<(), QueryError> {
    if query.from as usize >= graph.num_road_nodes() {
        return Err(QueryError::PointNotFound { point_index: 0 });
    }
    if query.to as usize >= graph.num_road_nodes() {
        return Err(QueryError::PointNotFound { point_index: 1 });
    }
    Ok(())
}
