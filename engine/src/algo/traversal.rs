//! The graphs searches actually run on.
//!
//! A `TraversalGraph` bakes a `Weighting` into adjacency arrays. In node based mode nodes are road
//! nodes and arcs are edge traversals, turn costs are ignored. In edge based mode the graph is turn
//! expanded: nodes are edge keys (`2 * edge` for base to adj, `2 * edge + 1` for adj to base) and an arc
//! from key `a` to key `b` stands for turning from `a` into `b` plus traversing `b`.
//! A search between road nodes `s` and `t` starts at `sources(s)` and ends at `targets(t)`.
//!
//! Every arc has an id which is its position in the forward adjacency array.
//! The backward graph contains the same arcs reversed with the same ids.

use super::subnetworks::weakly_connected_components;
use super::weighting::Weighting;
use super::RoutePath;
use crate::datastr::graph::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraversalMode {
    NodeBased,
    EdgeBased,
}

impl TraversalMode {
    pub fn is_edge_based(self) -> bool {
        self == TraversalMode::EdgeBased
    }
}

/// Edge key of traversing `edge` away from `node`.
pub fn key_from(graph: &RoadGraph, edge: EdgeId, node: NodeId) -> NodeId {
    if graph.base(edge) == node {
        2 * edge
    } else {
        2 * edge + 1
    }
}

#[derive(Debug, Clone)]
pub struct TraversalGraph {
    mode: TraversalMode,
    profile: String,
    num_road_nodes: usize,
    forward: FirstOutGraph,
    backward: FirstOutGraph,
    arc_tail: Vec<NodeId>,
    // road edge traversed by each arc
    arc_edge: Vec<EdgeId>,
    // edge based only
    key_tail: Vec<NodeId>,
    key_head: Vec<NodeId>,
    key_costs: Vec<Label>,
    first_out_key: Vec<EdgeId>,
    out_keys: Vec<NodeId>,
    first_in_key: Vec<EdgeId>,
    in_keys: Vec<NodeId>,
    // weakly connected component of each road node
    components: Vec<u32>,
}

impl TraversalGraph {
    pub fn new(graph: &RoadGraph, weighting: &dyn Weighting, mode: TraversalMode) -> TraversalGraph {
        match mode {
            TraversalMode::NodeBased => Self::node_based(graph, weighting),
            TraversalMode::EdgeBased => Self::edge_based(graph, weighting),
        }
    }

    fn node_based(graph: &RoadGraph, weighting: &dyn Weighting) -> TraversalGraph {
        let n = graph.num_nodes();
        let mut adjacency: Vec<Vec<Link>> = Vec::with_capacity(n);
        let mut arc_tail = Vec::new();
        let mut arc_edge = Vec::new();

        for node in 0..n as NodeId {
            let mut links = Vec::new();
            for &edge in graph.edges_of(node) {
                let head = graph.other_node(edge, node);
                if head == node {
                    continue;
                }
                let reverse = graph.base(edge) != node;
                let weight = weighting.edge_weight(graph, edge, reverse);
                if weight < INFINITY {
                    links.push(Link {
                        node: head,
                        weight,
                        distance: graph.distance(edge),
                        millis: weighting.edge_millis(graph, edge, reverse),
                        id: arc_edge.len() as EdgeId,
                    });
                    arc_tail.push(node);
                    arc_edge.push(edge);
                }
            }
            adjacency.push(links);
        }

        let forward = FirstOutGraph::from_adjacency_lists(adjacency);
        let backward = FirstOutGraph::reversed(&forward);
        let components = weakly_connected_components(n, &forward);

        TraversalGraph {
            mode: TraversalMode::NodeBased,
            profile: weighting.name(),
            num_road_nodes: n,
            forward,
            backward,
            arc_tail,
            arc_edge,
            key_tail: Vec::new(),
            key_head: Vec::new(),
            key_costs: Vec::new(),
            first_out_key: Vec::new(),
            out_keys: Vec::new(),
            first_in_key: Vec::new(),
            in_keys: Vec::new(),
            components,
        }
    }

    fn edge_based(graph: &RoadGraph, weighting: &dyn Weighting) -> TraversalGraph {
        let n = graph.num_nodes();
        let num_keys = 2 * graph.num_edges();

        let mut key_tail = Vec::with_capacity(num_keys);
        let mut key_head = Vec::with_capacity(num_keys);
        let mut key_costs = Vec::with_capacity(num_keys);
        for edge in 0..graph.num_edges() as EdgeId {
            for reverse in [false, true] {
                let (tail, head) = if reverse {
                    (graph.adj(edge), graph.base(edge))
                } else {
                    (graph.base(edge), graph.adj(edge))
                };
                key_tail.push(tail);
                key_head.push(head);
                let weight = if tail == head { INFINITY } else { weighting.edge_weight(graph, edge, reverse) };
                key_costs.push(if weight < INFINITY {
                    Label {
                        weight,
                        distance: graph.distance(edge),
                        millis: weighting.edge_millis(graph, edge, reverse),
                    }
                } else {
                    Label::UNREACHED
                });
            }
        }

        let mut adjacency: Vec<Vec<Link>> = Vec::with_capacity(num_keys);
        let mut arc_tail = Vec::new();
        let mut arc_edge = Vec::new();
        for key in 0..num_keys as NodeId {
            let mut links = Vec::new();
            if key_costs[key as usize].is_reached() {
                let in_edge = key / 2;
                let via = key_head[key as usize];
                for &out_edge in graph.edges_of(via) {
                    let next = key_from(graph, out_edge, via);
                    let next_costs = key_costs[next as usize];
                    if !next_costs.is_reached() {
                        continue;
                    }
                    let turn = weighting.turn_weight(graph, in_edge, via, out_edge);
                    if turn < INFINITY {
                        links.push(Link {
                            node: next,
                            weight: next_costs.weight + turn,
                            distance: next_costs.distance,
                            millis: next_costs.millis.saturating_add(weighting.turn_millis(graph, in_edge, via, out_edge)),
                            id: arc_edge.len() as EdgeId,
                        });
                        arc_tail.push(key);
                        arc_edge.push(out_edge);
                    }
                }
            }
            adjacency.push(links);
        }

        let mut out_lists: Vec<Vec<NodeId>> = vec![Vec::new(); n];
        let mut in_lists: Vec<Vec<NodeId>> = vec![Vec::new(); n];
        for key in 0..num_keys {
            if key_costs[key].is_reached() {
                out_lists[key_tail[key] as usize].push(key as NodeId);
                in_lists[key_head[key] as usize].push(key as NodeId);
            }
        }
        let (first_out_key, out_keys) = flatten(out_lists);
        let (first_in_key, in_keys) = flatten(in_lists);

        let forward = FirstOutGraph::from_adjacency_lists(adjacency);
        let backward = FirstOutGraph::reversed(&forward);

        // connectivity of road nodes ignoring turn restrictions
        let road_links: Vec<Vec<Link>> = (0..n as NodeId)
            .map(|node| {
                out_keys[first_out_key[node as usize] as usize..first_out_key[node as usize + 1] as usize]
                    .iter()
                    .map(|&key| Link {
                        node: key_head[key as usize],
                        weight: 0.0,
                        distance: 0.0,
                        millis: 0,
                        id: key,
                    })
                    .collect()
            })
            .collect();
        let components = weakly_connected_components(n, &FirstOutGraph::from_adjacency_lists(road_links));

        TraversalGraph {
            mode: TraversalMode::EdgeBased,
            profile: weighting.name(),
            num_road_nodes: n,
            forward,
            backward,
            arc_tail,
            arc_edge,
            key_tail,
            key_head,
            key_costs,
            first_out_key,
            out_keys,
            first_in_key,
            in_keys,
            components,
        }
    }

    pub fn mode(&self) -> TraversalMode {
        self.mode
    }

    /// Name of the weighting this graph was built with plus the mode.
    pub fn profile(&self) -> String {
        match self.mode {
            TraversalMode::NodeBased => format!("{}|node", self.profile),
            TraversalMode::EdgeBased => format!("{}|edge", self.profile),
        }
    }

    /// Number of search graph nodes, i.e. road nodes or edge keys.
    pub fn num_nodes(&self) -> usize {
        self.forward.num_nodes()
    }

    pub fn num_arcs(&self) -> usize {
        self.forward.num_arcs()
    }

    pub fn num_road_nodes(&self) -> usize {
        self.num_road_nodes
    }

    pub fn forward(&self) -> &FirstOutGraph {
        &self.forward
    }

    pub fn backward(&self) -> &FirstOutGraph {
        &self.backward
    }

    pub fn arc(&self, arc: EdgeId) -> Link {
        self.forward.link(arc)
    }

    pub fn arc_tail(&self, arc: EdgeId) -> NodeId {
        self.arc_tail[arc as usize]
    }

    /// Road edge an arc traverses.
    pub fn arc_edge(&self, arc: EdgeId) -> EdgeId {
        self.arc_edge[arc as usize]
    }

    /// Search graph nodes a search from road node `node` starts at, with their initial labels.
    pub fn sources(&self, node: NodeId) -> Vec<(NodeId, Label)> {
        match self.mode {
            TraversalMode::NodeBased => vec![(node, Label::ZERO)],
            TraversalMode::EdgeBased => self.out_keys[self.first_out_key[node as usize] as usize..self.first_out_key[node as usize + 1] as usize]
                .iter()
                .map(|&key| (key, self.key_costs[key as usize]))
                .collect(),
        }
    }

    /// Search graph nodes a search to road node `node` ends at.
    pub fn targets(&self, node: NodeId) -> Vec<NodeId> {
        match self.mode {
            TraversalMode::NodeBased => vec![node],
            TraversalMode::EdgeBased => self.in_keys[self.first_in_key[node as usize] as usize..self.first_in_key[node as usize + 1] as usize].to_vec(),
        }
    }

    /// Road node a search graph node ends at.
    pub fn road_node(&self, node: NodeId) -> NodeId {
        match self.mode {
            TraversalMode::NodeBased => node,
            TraversalMode::EdgeBased => self.key_head[node as usize],
        }
    }

    pub fn same_component(&self, a: NodeId, b: NodeId) -> bool {
        self.components[a as usize] == self.components[b as usize]
    }

    /// Assemble the route starting at search graph node `first` and following `arcs`.
    pub fn route(&self, first: NodeId, arcs: &[EdgeId], costs: Label) -> RoutePath {
        let mut nodes = Vec::with_capacity(arcs.len() + 2);
        let mut edges = Vec::with_capacity(arcs.len() + 1);
        match self.mode {
            TraversalMode::NodeBased => nodes.push(first),
            TraversalMode::EdgeBased => {
                nodes.push(self.key_tail[first as usize]);
                nodes.push(self.key_head[first as usize]);
                edges.push(first / 2);
            }
        }
        for &arc in arcs {
            debug_assert_eq!(*nodes.last().unwrap_or(&INVALID_ID), self.road_node(self.arc_tail(arc)));
            nodes.push(self.road_node(self.forward.head()[arc as usize]));
            edges.push(self.arc_edge(arc));
        }
        RoutePath {
            nodes,
            edges,
            weight: costs.weight,
            distance: costs.distance,
            millis: costs.millis,
        }
    }

    /// Length of each road edge of the route `route` assembles from `first` and `arcs`.
    pub fn route_distances(&self, first: NodeId, arcs: &[EdgeId]) -> Vec<f64> {
        let mut distances = Vec::with_capacity(arcs.len() + 1);
        if self.mode.is_edge_based() {
            distances.push(self.key_costs[first as usize].distance);
        }
        distances.extend(arcs.iter().map(|&arc| self.arc(arc).distance));
        distances
    }
}

fn flatten(lists: Vec<Vec<NodeId>>) -> (Vec<EdgeId>, Vec<NodeId>) {
    let first = crate::datastr::graph::first_out_graph::degrees_to_first_out(lists.iter().map(|l| l.len() as EdgeId)).collect();
    (first, lists.into_iter().flatten().collect())
}
