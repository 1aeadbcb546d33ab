//! Local searches deciding whether a shortcut is necessary.

use super::contraction_graph::ContractionGraph;
use super::*;
use crate::datastr::{float_heap::IntFloatBinaryHeap, timestamped_vector::TimestampedVector};

/// Dijkstra from one in-neighbor of the node being contracted, ignoring that node.
/// The search can be continued for several targets, it only settles as many nodes as necessary
/// for each one, and at most `max_settled_nodes` in total.
#[derive(Debug)]
pub struct WitnessSearch {
    heap: IntFloatBinaryHeap,
    weights: TimestampedVector<Weight>,
    avoid: NodeId,
    num_settled: usize,
}

impl WitnessSearch {
    pub fn new(n: usize) -> Self {
        WitnessSearch {
            heap: IntFloatBinaryHeap::default(),
            weights: TimestampedVector::new(n, INFINITY),
            avoid: INVALID_ID,
            num_settled: 0,
        }
    }

    pub fn init(&mut self, source: NodeId, avoid: NodeId) {
        self.heap.clear();
        self.weights.reset();
        self.avoid = avoid;
        self.num_settled = 0;
        self.weights.set(source as usize, 0.0);
        self.heap.insert(0.0, source);
    }

    /// Weight of the best path to `target` found so far, after searching on until
    /// it is proven to be the shortest path, the queue holds nothing cheaper than `accepted_weight`,
    /// or the settled node limit is hit. `INFINITY` if no path was found.
    pub fn find_upper_bound(&mut self, graph: &ContractionGraph, target: NodeId, accepted_weight: Weight, max_settled_nodes: usize) -> Weight {
        while let Some(key) = self.heap.peek_key() {
            let key = key as Weight;
            if self.weights[target as usize] <= key || key > accepted_weight || self.num_settled >= max_settled_nodes {
                break;
            }

            let node = match self.heap.extract_min() {
                Some(node) => node,
                None => break,
            };
            self.num_settled += 1;
            let weight = self.weights[node as usize];

            for edge in graph.outgoing(node) {
                if edge.node == self.avoid {
                    continue;
                }
                let next = weight + edge.costs.weight;
                if next < self.weights[edge.node as usize] {
                    self.weights.set(edge.node as usize, next);
                    self.heap.decrease_or_update(edge.node, next as f32);
                }
            }
        }

        self.weights[target as usize]
    }

    pub fn num_settled(&self) -> usize {
        self.num_settled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::{traversal::TraversalMode, weighting::ShortestWeighting};

    #[test]
    fn finds_witnesses_around_the_avoided_node() {
        // 0 -> 1 -> 2 (2 + 2) and 0 -> 3 -> 2 (1 + 2)
        let mut builder = RoadGraphBuilder::with_nodes(4);
        builder.add_edge(0, 1, 2.0, Access::Forward, EdgeFlags::with_speed(36.0));
        builder.add_edge(1, 2, 2.0, Access::Forward, EdgeFlags::with_speed(36.0));
        builder.add_edge(0, 3, 1.0, Access::Forward, EdgeFlags::with_speed(36.0));
        builder.add_edge(3, 2, 2.0, Access::Forward, EdgeFlags::with_speed(36.0));
        let traversal = TraversalGraph::new(&builder.build(), &ShortestWeighting::default(), TraversalMode::NodeBased);
        let graph = ContractionGraph::new(&traversal);

        let mut search = WitnessSearch::new(4);
        search.init(0, 1);
        assert_eq!(search.find_upper_bound(&graph, 2, 4.0, 100), 3.0);

        search.init(0, 3);
        assert_eq!(search.find_upper_bound(&graph, 2, 3.0, 100), 4.0);

        // the search gives up before finding anything
        search.init(0, 1);
        assert_eq!(search.find_upper_bound(&graph, 2, 4.0, 1), INFINITY);
        assert_eq!(search.num_settled(), 1);
    }
}
