//! The input road network.
//!
//! Edges are stored once and can be traversed from `base` to `adj` (forward) and/or from `adj` to
//! `base` (backward) depending on their `Access`. Each node knows all edges it is an endpoint of,
//! regardless of direction. The graph is immutable once built, all writes go through `RoadGraphBuilder`.

use super::*;
use crate::io::*;
use serde::{Deserialize, Serialize};

/// In which directions an edge may be traversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Access {
    Forward,
    Backward,
    Both,
}

impl Access {
    /// May the edge be traversed from base to adj (`reverse == false`) or from adj to base?
    pub fn allows(self, reverse: bool) -> bool {
        match self {
            Access::Both => true,
            Access::Forward => !reverse,
            Access::Backward => reverse,
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            Access::Forward => 1,
            Access::Backward => 2,
            Access::Both => 3,
        }
    }

    fn from_u8(value: u8) -> Option<Access> {
        match value {
            1 => Some(Access::Forward),
            2 => Some(Access::Backward),
            3 => Some(Access::Both),
            _ => None,
        }
    }
}

/// Per edge payload which only weightings interpret.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EdgeFlags {
    /// km/h from base to adj
    pub forward_speed: f32,
    /// km/h from adj to base
    pub backward_speed: f32,
    pub road_class: u8,
}

impl EdgeFlags {
    pub fn with_speed(speed: f32) -> EdgeFlags {
        EdgeFlags {
            forward_speed: speed,
            backward_speed: speed,
            road_class: 0,
        }
    }

    pub fn speed(&self, reverse: bool) -> f32 {
        if reverse {
            self.backward_speed
        } else {
            self.forward_speed
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoadGraph {
    latitude: Vec<f32>,
    longitude: Vec<f32>,
    edge_base: Vec<NodeId>,
    edge_adj: Vec<NodeId>,
    edge_distance: Vec<f64>,
    edge_access: Vec<Access>,
    edge_flags: Vec<EdgeFlags>,
    // edges incident to each node, adjacency array style
    first_edge: Vec<EdgeId>,
    incident_edges: Vec<EdgeId>,
    turn_costs: TurnCostTable,
}

impl RoadGraph {
    pub fn num_nodes(&self) -> usize {
        self.latitude.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edge_base.len()
    }

    pub fn base(&self, edge: EdgeId) -> NodeId {
        self.edge_base[edge as usize]
    }

    pub fn adj(&self, edge: EdgeId) -> NodeId {
        self.edge_adj[edge as usize]
    }

    /// The endpoint of `edge` which is not `node`.
    pub fn other_node(&self, edge: EdgeId, node: NodeId) -> NodeId {
        let base = self.base(edge);
        if base == node {
            self.adj(edge)
        } else {
            debug_assert_eq!(self.adj(edge), node);
            base
        }
    }

    /// Meters.
    pub fn distance(&self, edge: EdgeId) -> f64 {
        self.edge_distance[edge as usize]
    }

    pub fn access(&self, edge: EdgeId) -> Access {
        self.edge_access[edge as usize]
    }

    pub fn flags(&self, edge: EdgeId) -> &EdgeFlags {
        &self.edge_flags[edge as usize]
    }

    /// All edges with `node` as base or adj.
    pub fn edges_of(&self, node: NodeId) -> &[EdgeId] {
        &self.incident_edges[self.first_edge[node as usize] as usize..self.first_edge[node as usize + 1] as usize]
    }

    pub fn degree(&self, node: NodeId) -> usize {
        self.edges_of(node).len()
    }

    pub fn latitude(&self, node: NodeId) -> f32 {
        self.latitude[node as usize]
    }

    pub fn longitude(&self, node: NodeId) -> f32 {
        self.longitude[node as usize]
    }

    pub fn turn_costs(&self) -> &TurnCostTable {
        &self.turn_costs
    }
}

/// Collects nodes, edges and turn costs and freezes them into a `RoadGraph`.
#[derive(Debug, Clone, Default)]
pub struct RoadGraphBuilder {
    latitude: Vec<f32>,
    longitude: Vec<f32>,
    edge_base: Vec<NodeId>,
    edge_adj: Vec<NodeId>,
    edge_distance: Vec<f64>,
    edge_access: Vec<Access>,
    edge_flags: Vec<EdgeFlags>,
    turn_costs: TurnCostTable,
}

impl RoadGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `n` nodes all located at (0, 0).
    pub fn with_nodes(n: usize) -> Self {
        RoadGraphBuilder {
            latitude: vec![0.0; n],
            longitude: vec![0.0; n],
            ..Self::default()
        }
    }

    pub fn add_node(&mut self, latitude: f32, longitude: f32) -> NodeId {
        self.latitude.push(latitude);
        self.longitude.push(longitude);
        (self.latitude.len() - 1) as NodeId
    }

    pub fn set_coordinates(&mut self, node: NodeId, latitude: f32, longitude: f32) {
        self.latitude[node as usize] = latitude;
        self.longitude[node as usize] = longitude;
    }

    /// Panics if an endpoint does not exist or the distance is negative.
    pub fn add_edge(&mut self, base: NodeId, adj: NodeId, distance: f64, access: Access, flags: EdgeFlags) -> EdgeId {
        assert!((base as usize) < self.latitude.len(), "unknown base node {}", base);
        assert!((adj as usize) < self.latitude.len(), "unknown adj node {}", adj);
        assert!(distance >= 0.0, "negative distance {}", distance);
        self.edge_base.push(base);
        self.edge_adj.push(adj);
        self.edge_distance.push(distance);
        self.edge_access.push(access);
        self.edge_flags.push(flags);
        (self.edge_base.len() - 1) as EdgeId
    }

    /// Cost in seconds for turning from `from_edge` over `via` into `to_edge`. `INFINITY` forbids the turn.
    pub fn add_turn_cost(&mut self, from_edge: EdgeId, via: NodeId, to_edge: EdgeId, cost: Weight) {
        self.turn_costs.insert(from_edge, via, to_edge, cost);
    }

    pub fn forbid_turn(&mut self, from_edge: EdgeId, via: NodeId, to_edge: EdgeId) {
        self.add_turn_cost(from_edge, via, to_edge, INFINITY);
    }

    pub fn build(self) -> RoadGraph {
        let n = self.latitude.len();
        let mut degrees = vec![0 as EdgeId; n];
        for (&base, &adj) in self.edge_base.iter().zip(self.edge_adj.iter()) {
            degrees[base as usize] += 1;
            if adj != base {
                degrees[adj as usize] += 1;
            }
        }
        let first_edge: Vec<EdgeId> = first_out_graph::degrees_to_first_out(degrees.into_iter()).collect();

        let mut next = first_edge.clone();
        let mut incident_edges = vec![INVALID_ID; first_edge[n] as usize];
        for (edge, (&base, &adj)) in self.edge_base.iter().zip(self.edge_adj.iter()).enumerate() {
            incident_edges[next[base as usize] as usize] = edge as EdgeId;
            next[base as usize] += 1;
            if adj != base {
                incident_edges[next[adj as usize] as usize] = edge as EdgeId;
                next[adj as usize] += 1;
            }
        }

        RoadGraph {
            latitude: self.latitude,
            longitude: self.longitude,
            edge_base: self.edge_base,
            edge_adj: self.edge_adj,
            edge_distance: self.edge_distance,
            edge_access: self.edge_access,
            edge_flags: self.edge_flags,
            first_edge,
            incident_edges,
            turn_costs: self.turn_costs,
        }
    }
}

impl Deconstruct for RoadGraph {
    fn store_each(&self, store: &dyn Fn(&str, &dyn Store) -> std::io::Result<()>) -> std::io::Result<()> {
        store("latitude", &self.latitude)?;
        store("longitude", &self.longitude)?;
        store("edge_base", &self.edge_base)?;
        store("edge_adj", &self.edge_adj)?;
        store("edge_distance", &self.edge_distance)?;
        store("edge_access", &self.edge_access.iter().map(|a| a.to_u8()).collect::<Vec<u8>>())?;
        store("edge_forward_speed", &self.edge_flags.iter().map(|f| f.forward_speed).collect::<Vec<f32>>())?;
        store("edge_backward_speed", &self.edge_flags.iter().map(|f| f.backward_speed).collect::<Vec<f32>>())?;
        store("edge_road_class", &self.edge_flags.iter().map(|f| f.road_class).collect::<Vec<u8>>())?;

        let entries = self.turn_costs.sorted_entries();
        store("turn_cost_from", &entries.iter().map(|&((from, _, _), _)| from).collect::<Vec<EdgeId>>())?;
        store("turn_cost_via", &entries.iter().map(|&((_, via, _), _)| via).collect::<Vec<NodeId>>())?;
        store("turn_cost_to", &entries.iter().map(|&((_, _, to), _)| to).collect::<Vec<EdgeId>>())?;
        store("turn_cost_weight", &entries.iter().map(|&(_, cost)| cost).collect::<Vec<Weight>>())
    }
}

impl Reconstruct for RoadGraph {
    fn reconstruct_with(loader: Loader) -> std::io::Result<Self> {
        use std::io::{Error, ErrorKind};
        let invalid = |msg: String| Error::new(ErrorKind::InvalidData, msg);

        let latitude: Vec<f32> = loader.load("latitude")?;
        let longitude: Vec<f32> = loader.load("longitude")?;
        let edge_base: Vec<NodeId> = loader.load("edge_base")?;
        let edge_adj: Vec<NodeId> = loader.load("edge_adj")?;
        let edge_distance: Vec<f64> = loader.load("edge_distance")?;
        let edge_access: Vec<u8> = loader.load("edge_access")?;
        let forward_speed: Vec<f32> = loader.load("edge_forward_speed")?;
        let backward_speed: Vec<f32> = loader.load("edge_backward_speed")?;
        let road_class: Vec<u8> = loader.load("edge_road_class")?;

        let n = latitude.len();
        let m = edge_base.len();
        if longitude.len() != n {
            return Err(invalid("coordinate arrays differ in length".to_string()));
        }
        if [edge_adj.len(), edge_distance.len(), edge_access.len(), forward_speed.len(), backward_speed.len(), road_class.len()]
            .iter()
            .any(|&len| len != m)
        {
            return Err(invalid("edge arrays differ in length".to_string()));
        }
        if let Some(&node) = edge_base.iter().chain(edge_adj.iter()).find(|&&node| node as usize >= n) {
            return Err(invalid(format!("edge endpoint {} out of range", node)));
        }
        // NaN fails every comparison, so these also catch it
        if let Some(e) = (0..m).find(|&e| !(edge_distance[e] >= 0.0)) {
            return Err(invalid(format!("invalid distance {} of edge {}", edge_distance[e], e)));
        }
        if let Some(e) = (0..m).find(|&e| !(forward_speed[e] >= 0.0 && backward_speed[e] >= 0.0)) {
            return Err(invalid(format!("invalid speed of edge {}", e)));
        }

        let mut builder = RoadGraphBuilder {
            latitude,
            longitude,
            ..RoadGraphBuilder::default()
        };
        for e in 0..m {
            let access = Access::from_u8(edge_access[e]).ok_or_else(|| invalid(format!("invalid access {} of edge {}", edge_access[e], e)))?;
            let flags = EdgeFlags {
                forward_speed: forward_speed[e],
                backward_speed: backward_speed[e],
                road_class: road_class[e],
            };
            builder.add_edge(edge_base[e], edge_adj[e], edge_distance[e], access, flags);
        }

        let from: Vec<EdgeId> = loader.load("turn_cost_from")?;
        let via: Vec<NodeId> = loader.load("turn_cost_via")?;
        let to: Vec<EdgeId> = loader.load("turn_cost_to")?;
        let cost: Vec<Weight> = loader.load("turn_cost_weight")?;
        if via.len() != from.len() || to.len() != from.len() || cost.len() != from.len() {
            return Err(invalid("turn cost arrays differ in length".to_string()));
        }
        for i in 0..from.len() {
            if from[i] as usize >= m || to[i] as usize >= m || via[i] as usize >= n {
                return Err(invalid(format!("turn cost entry {} references unknown edges or nodes", i)));
            }
            if !(cost[i] >= 0.0) {
                return Err(invalid(format!("invalid turn cost {} of entry {}", cost[i], i)));
            }
            builder.add_turn_cost(from[i], via[i], to[i], cost[i]);
        }

        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incident_edges_cover_both_endpoints() {
        let mut builder = RoadGraphBuilder::with_nodes(3);
        let a = builder.add_edge(0, 1, 100.0, Access::Both, EdgeFlags::with_speed(50.0));
        let b = builder.add_edge(1, 2, 50.0, Access::Forward, EdgeFlags::with_speed(30.0));
        let graph = builder.build();

        assert_eq!(graph.edges_of(0), &[a]);
        assert_eq!(graph.edges_of(1), &[a, b]);
        assert_eq!(graph.edges_of(2), &[b]);
        assert_eq!(graph.other_node(b, 2), 1);
        assert!(graph.access(b).allows(false));
        assert!(!graph.access(b).allows(true));
    }

    #[test]
    fn survives_a_round_trip_to_disk() {
        let mut builder = RoadGraphBuilder::new();
        for i in 0..3 {
            builder.add_node(49.0 + i as f32, 8.0);
        }
        let a = builder.add_edge(0, 1, 100.0, Access::Both, EdgeFlags::with_speed(50.0));
        let b = builder.add_edge(1, 2, 50.0, Access::Backward, EdgeFlags::with_speed(30.0));
        builder.forbid_turn(a, 1, b);
        builder.add_turn_cost(b, 1, a, 5.0);
        let graph = builder.build();

        let dir = tempfile::tempdir().unwrap();
        graph.deconstruct_to(&dir.path()).unwrap();
        let loaded = RoadGraph::reconstruct_from(&dir.path()).unwrap();

        assert_eq!(loaded.num_nodes(), 3);
        assert_eq!(loaded.num_edges(), 2);
        assert_eq!(loaded.access(b), Access::Backward);
        assert_eq!(loaded.latitude(2), 51.0);
        assert_eq!(loaded.turn_costs().get(a, 1, b), INFINITY);
        assert_eq!(loaded.turn_costs().get(b, 1, a), 5.0);
    }

    #[test]
    fn rejects_negative_or_nan_values_on_disk() {
        let mut builder = RoadGraphBuilder::with_nodes(3);
        let a = builder.add_edge(0, 1, 100.0, Access::Both, EdgeFlags::with_speed(50.0));
        let b = builder.add_edge(1, 2, 50.0, Access::Both, EdgeFlags::with_speed(30.0));
        builder.add_turn_cost(a, 1, b, 5.0);
        let graph = builder.build();
        let is_invalid_data = |result: std::io::Result<RoadGraph>| matches!(result, Err(e) if e.kind() == std::io::ErrorKind::InvalidData);

        let dir = tempfile::tempdir().unwrap();
        graph.deconstruct_to(&dir.path()).unwrap();
        vec![-5.0f64].write_to(&dir.path().join("turn_cost_weight")).unwrap();
        assert!(is_invalid_data(RoadGraph::reconstruct_from(&dir.path())));

        let dir = tempfile::tempdir().unwrap();
        graph.deconstruct_to(&dir.path()).unwrap();
        vec![100.0f64, f64::NAN].write_to(&dir.path().join("edge_distance")).unwrap();
        assert!(is_invalid_data(RoadGraph::reconstruct_from(&dir.path())));

        let dir = tempfile::tempdir().unwrap();
        graph.deconstruct_to(&dir.path()).unwrap();
        vec![-1.0f64, 50.0].write_to(&dir.path().join("edge_distance")).unwrap();
        assert!(is_invalid_data(RoadGraph::reconstruct_from(&dir.path())));

        let dir = tempfile::tempdir().unwrap();
        graph.deconstruct_to(&dir.path()).unwrap();
        vec![50.0f32, f32::NAN].write_to(&dir.path().join("edge_forward_speed")).unwrap();
        assert!(is_invalid_data(RoadGraph::reconstruct_from(&dir.path())));
    }
}
