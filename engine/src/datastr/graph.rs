//! Graph representations and the basic types shared by all algorithms.
//!
//! `RoadGraph` is the input graph with undirected edge storage, per direction access and opaque flags.
//! All searches run on `FirstOutGraph`s (adjacency arrays) derived from it.

use std::ops::Add;

pub mod first_out_graph;
pub mod road_graph;
pub mod turn_costs;

pub use self::first_out_graph::FirstOutGraph;
pub use self::road_graph::{Access, EdgeFlags, RoadGraph, RoadGraphBuilder};
pub use self::turn_costs::TurnCostTable;

/// Node ids are unsigned 32 bit integers.
pub type NodeId = u32;
/// Edge ids are unsigned 32 bit integers.
pub type EdgeId = u32;
/// Weights produced by a `Weighting`.
pub type Weight = f64;
/// Weight of unreachable things or forbidden maneuvers.
pub const INFINITY: Weight = f64::INFINITY;
/// Marks absent node or edge ids.
pub const INVALID_ID: u32 = u32::MAX;

/// Everything a search accumulates along a path.
/// Only `weight` decides about optimality, `distance` and `millis` are carried along.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Label {
    pub weight: Weight,
    /// meters
    pub distance: f64,
    pub millis: u64,
}

impl Label {
    pub const ZERO: Label = Label {
        weight: 0.0,
        distance: 0.0,
        millis: 0,
    };

    pub const UNREACHED: Label = Label {
        weight: INFINITY,
        distance: INFINITY,
        millis: u64::MAX,
    };

    pub fn is_reached(&self) -> bool {
        self.weight < INFINITY
    }

    /// Extend the path this label belongs to by `link`.
    pub fn link(&self, link: &Link) -> Label {
        Label {
            weight: self.weight + link.weight,
            distance: self.distance + link.distance,
            millis: self.millis.saturating_add(link.millis),
        }
    }
}

impl Add for Label {
    type Output = Label;

    fn add(self, other: Label) -> Label {
        Label {
            weight: self.weight + other.weight,
            distance: self.distance + other.distance,
            millis: self.millis.saturating_add(other.millis),
        }
    }
}

/// An outgoing (or, in reversed graphs, incoming) arc.
/// `id` refers to whatever the arc stands for in the graph it belongs to,
/// e.g. a road edge, a turn or a shortcut.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub node: NodeId,
    pub weight: Weight,
    pub distance: f64,
    pub millis: u64,
    pub id: EdgeId,
}

impl Link {
    pub fn costs(&self) -> Label {
        Label {
            weight: self.weight,
            distance: self.distance,
            millis: self.millis,
        }
    }
}

/// Base trait for graphs.
pub trait Graph {
    fn num_nodes(&self) -> usize;
    fn num_arcs(&self) -> usize;
    fn degree(&self, node: NodeId) -> usize;
}

/// Efficient iteration over the arcs of a node.
pub trait LinkIterable<L>: Graph {
    type Iter<'a>: Iterator<Item = L>
    where
        Self: 'a;

    fn link_iter(&self, node: NodeId) -> Self::Iter<'_>;
}

/// Build the reversed graph of something.
pub trait BuildReversed<G> {
    fn reversed(graph: &G) -> Self;
}
