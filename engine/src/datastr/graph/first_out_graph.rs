use super::*;
use std::ops::Range;

/// A directed graph in adjacency array representation.
/// The arcs of node `v` are stored at positions `first_out[v]..first_out[v + 1]` of the arc arrays.
/// Besides head and weight each arc carries a distance, a travel time and an id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FirstOutGraph {
    first_out: Vec<EdgeId>,
    head: Vec<NodeId>,
    weight: Vec<Weight>,
    distance: Vec<f64>,
    millis: Vec<u64>,
    link_id: Vec<EdgeId>,
}

impl FirstOutGraph {
    /// Build the graph from one list of arcs per node.
    pub fn from_adjacency_lists(adjacency_lists: Vec<Vec<Link>>) -> FirstOutGraph {
        let first_out = degrees_to_first_out(adjacency_lists.iter().map(|neighbors| neighbors.len() as EdgeId)).collect();
        let m = adjacency_lists.iter().map(Vec::len).sum();
        let mut graph = FirstOutGraph {
            first_out,
            head: Vec::with_capacity(m),
            weight: Vec::with_capacity(m),
            distance: Vec::with_capacity(m),
            millis: Vec::with_capacity(m),
            link_id: Vec::with_capacity(m),
        };
        for link in adjacency_lists.into_iter().flatten() {
            graph.head.push(link.node);
            graph.weight.push(link.weight);
            graph.distance.push(link.distance);
            graph.millis.push(link.millis);
            graph.link_id.push(link.id);
        }
        graph
    }

    pub fn first_out(&self) -> &[EdgeId] {
        &self.first_out
    }

    pub fn head(&self) -> &[NodeId] {
        &self.head
    }

    pub fn weight(&self) -> &[Weight] {
        &self.weight
    }

    pub fn link_ids(&self) -> &[EdgeId] {
        &self.link_id
    }

    /// Arc at the given position of the arc arrays.
    pub fn link(&self, edge: EdgeId) -> Link {
        let e = edge as usize;
        Link {
            node: self.head[e],
            weight: self.weight[e],
            distance: self.distance[e],
            millis: self.millis[e],
            id: self.link_id[e],
        }
    }

    /// Positions of the arcs of `node`.
    pub fn neighbor_edge_indices(&self, node: NodeId) -> Range<EdgeId> {
        self.first_out[node as usize]..self.first_out[node as usize + 1]
    }

    /// Positions of all arcs from `from` to `to`.
    pub fn edge_indices(&self, from: NodeId, to: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.neighbor_edge_indices(from).filter(move |&e| self.head[e as usize] == to)
    }
}

impl Graph for FirstOutGraph {
    fn num_nodes(&self) -> usize {
        self.first_out.len().saturating_sub(1)
    }

    fn num_arcs(&self) -> usize {
        self.head.len()
    }

    fn degree(&self, node: NodeId) -> usize {
        let range = self.neighbor_edge_indices(node);
        (range.end - range.start) as usize
    }
}

/// Iterator over the arcs of a single node of a `FirstOutGraph`.
#[derive(Debug, Clone)]
pub struct LinkIter<'a> {
    graph: &'a FirstOutGraph,
    range: Range<EdgeId>,
}

impl<'a> Iterator for LinkIter<'a> {
    type Item = Link;

    #[inline]
    fn next(&mut self) -> Option<Link> {
        self.range.next().map(|edge| self.graph.link(edge))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.range.size_hint()
    }
}

impl LinkIterable<Link> for FirstOutGraph {
    type Iter<'a> = LinkIter<'a>;

    #[inline]
    fn link_iter(&self, node: NodeId) -> Self::Iter<'_> {
        LinkIter {
            graph: self,
            range: self.neighbor_edge_indices(node),
        }
    }
}

impl BuildReversed<FirstOutGraph> for FirstOutGraph {
    /// Reversed arcs keep weight, distance, time and id of the original arc.
    fn reversed(graph: &FirstOutGraph) -> Self {
        let mut reversed: Vec<Vec<Link>> = (0..graph.num_nodes()).map(|_| Vec::new()).collect();

        for node in 0..graph.num_nodes() as NodeId {
            for link in graph.link_iter(node) {
                reversed[link.node as usize].push(Link { node, ..link });
            }
        }

        FirstOutGraph::from_adjacency_lists(reversed)
    }
}

/// Prefix sums over node degrees, starting at zero.
pub fn degrees_to_first_out<I: Iterator<Item = EdgeId>>(degrees: I) -> impl Iterator<Item = EdgeId> {
    std::iter::once(0).chain(degrees.scan(0, |state, degree| {
        *state += degree;
        Some(*state)
    }))
}
