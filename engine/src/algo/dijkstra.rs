//! Dijkstra's algorithm and the query servers built directly on it.
//!
//! `generic_dijkstra::DijkstraRun` is the single search routine all searches use.
//! It is parameterized by an edge predicate and a potential instead of being specialized per algorithm.
//! The mutable search state lives in `DijkstraData`, separate from the graph, so it can be
//! reused across queries on the same thread.

use crate::datastr::{graph::*, index_heap::*, timestamped_vector::*};
use std::cmp::Ordering;

pub mod generic_dijkstra;
pub mod query;

pub use self::generic_dijkstra::DijkstraRun;

/// Queue entry. `key` is the tentative weight plus the potential of `node`.
#[derive(Debug, Clone, Copy)]
pub struct State {
    pub key: Weight,
    pub node: NodeId,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.total_cmp(&other.key).then_with(|| self.node.cmp(&other.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Indexing for State {
    #[inline]
    fn as_index(&self) -> usize {
        self.node as usize
    }
}

/// Search tree of one query: labels, parent pointers and the queue.
/// Parent pointers are only meaningful for nodes reached since the last reset.
#[derive(Debug, Clone)]
pub struct DijkstraData {
    pub labels: TimestampedVector<Label>,
    /// parent node and id of the arc used to reach each node
    pub predecessors: Vec<(NodeId, EdgeId)>,
    pub queue: IndexdMinHeap<State>,
}

impl DijkstraData {
    pub fn new(n: usize) -> Self {
        DijkstraData {
            labels: TimestampedVector::new(n, Label::UNREACHED),
            predecessors: vec![(INVALID_ID, INVALID_ID); n],
            queue: IndexdMinHeap::new(n),
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.predecessors.len()
    }

    pub fn reset(&mut self) {
        self.queue.clear();
        self.labels.reset();
    }

    /// Ids of the arcs leading from a start node to `node` in travel order,
    /// together with the start node.
    pub fn arc_path(&self, node: NodeId) -> (NodeId, Vec<EdgeId>) {
        let (start, mut arcs) = self.arc_chain(node);
        arcs.reverse();
        (start, arcs)
    }

    /// Ids of the arcs along the parent pointers from `node` up to a start node, in that order.
    /// For backward searches this is the travel order.
    pub fn arc_chain(&self, node: NodeId) -> (NodeId, Vec<EdgeId>) {
        let mut arcs = Vec::new();
        let mut current = node;
        loop {
            let (parent, arc) = self.predecessors[current as usize];
            if arc == INVALID_ID {
                break;
            }
            arcs.push(arc);
            current = parent;
        }
        (current, arcs)
    }
}
