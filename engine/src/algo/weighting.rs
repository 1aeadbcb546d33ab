//! Cost models.
//!
//! A `Weighting` turns the attributes of a road edge into a scalar weight per direction
//! and prices turns between edges. Algorithms never look at edge flags themselves.

use crate::config::TurnCostConfig;
use crate::datastr::graph::*;
use std::fmt::Debug;

/// Pluggable cost function. Weights must be non-negative and deterministic,
/// `INFINITY` marks edges or turns which may not be used.
pub trait Weighting: Debug + Send + Sync {
    /// Identifies the weighting including every parameter which changes weights.
    /// A contraction hierarchy is only valid for the weighting it was prepared with.
    fn name(&self) -> String;

    /// Weight of traversing `edge` from base to adj, or from adj to base if `reverse` is set.
    fn edge_weight(&self, graph: &RoadGraph, edge: EdgeId, reverse: bool) -> Weight;

    fn edge_millis(&self, graph: &RoadGraph, edge: EdgeId, reverse: bool) -> u64;

    /// Weight of turning from `from_edge` over `via` into `to_edge`.
    fn turn_weight(&self, _graph: &RoadGraph, _from_edge: EdgeId, _via: NodeId, _to_edge: EdgeId) -> Weight {
        0.0
    }

    fn turn_millis(&self, _graph: &RoadGraph, _from_edge: EdgeId, _via: NodeId, _to_edge: EdgeId) -> u64 {
        0
    }
}

/// Turn costs from the graph's turn cost table plus U-turn handling.
/// Costs are seconds, so they can be used as weight for fastest routing and as travel time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TurnCostProvider {
    config: TurnCostConfig,
}

impl TurnCostProvider {
    pub fn new(config: TurnCostConfig) -> Self {
        TurnCostProvider { config }
    }

    /// `base` extended by the turn cost parameters, e.g. `fastest(u_turn=40)`.
    pub fn qualify(&self, base: &str) -> String {
        match self.config.u_turn_costs {
            Some(costs) => format!("{}(u_turn={})", base, costs),
            None => base.to_string(),
        }
    }

    /// Cost of the maneuver in seconds or `INFINITY` if forbidden.
    pub fn turn_cost(&self, graph: &RoadGraph, from_edge: EdgeId, via: NodeId, to_edge: EdgeId) -> Weight {
        if from_edge == to_edge {
            // turning around at a dead end is always possible
            return match self.config.u_turn_costs {
                Some(costs) => costs,
                None if graph.degree(via) <= 1 => 0.0,
                None => INFINITY,
            };
        }
        graph.turn_costs().get(from_edge, via, to_edge)
    }

    fn turn_millis(&self, graph: &RoadGraph, from_edge: EdgeId, via: NodeId, to_edge: EdgeId) -> u64 {
        let cost = self.turn_cost(graph, from_edge, via, to_edge);
        if cost < INFINITY {
            (cost * 1000.0).round() as u64
        } else {
            0
        }
    }
}

fn travel_millis(graph: &RoadGraph, edge: EdgeId, reverse: bool) -> Option<u64> {
    let speed = graph.flags(edge).speed(reverse) as f64;
    if !graph.access(edge).allows(reverse) || speed <= 0.0 {
        return None;
    }
    Some((graph.distance(edge) / (speed / 3.6) * 1000.0).round() as u64)
}

/// Weight is the travel time in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FastestWeighting {
    turn_costs: TurnCostProvider,
}

impl FastestWeighting {
    pub fn new(turn_costs: TurnCostConfig) -> Self {
        FastestWeighting {
            turn_costs: TurnCostProvider::new(turn_costs),
        }
    }
}

impl Weighting for FastestWeighting {
    fn name(&self) -> String {
        self.turn_costs.qualify("fastest")
    }

    fn edge_weight(&self, graph: &RoadGraph, edge: EdgeId, reverse: bool) -> Weight {
        let speed = graph.flags(edge).speed(reverse) as f64;
        if !graph.access(edge).allows(reverse) || speed <= 0.0 {
            return INFINITY;
        }
        graph.distance(edge) / (speed / 3.6)
    }

    fn edge_millis(&self, graph: &RoadGraph, edge: EdgeId, reverse: bool) -> u64 {
        travel_millis(graph, edge, reverse).unwrap_or(u64::MAX)
    }

    fn turn_weight(&self, graph: &RoadGraph, from_edge: EdgeId, via: NodeId, to_edge: EdgeId) -> Weight {
        self.turn_costs.turn_cost(graph, from_edge, via, to_edge)
    }

    fn turn_millis(&self, graph: &RoadGraph, from_edge: EdgeId, via: NodeId, to_edge: EdgeId) -> u64 {
        self.turn_costs.turn_millis(graph, from_edge, via, to_edge)
    }
}

/// Weight is the distance in meters. Turn costs only matter as far as they forbid turns.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShortestWeighting {
    turn_costs: TurnCostProvider,
}

impl ShortestWeighting {
    pub fn new(turn_costs: TurnCostConfig) -> Self {
        ShortestWeighting {
            turn_costs: TurnCostProvider::new(turn_costs),
        }
    }
}

impl Weighting for ShortestWeighting {
    fn name(&self) -> String {
        self.turn_costs.qualify("shortest")
    }

    fn edge_weight(&self, graph: &RoadGraph, edge: EdgeId, reverse: bool) -> Weight {
        match travel_millis(graph, edge, reverse) {
            Some(_) => graph.distance(edge),
            None => INFINITY,
        }
    }

    fn edge_millis(&self, graph: &RoadGraph, edge: EdgeId, reverse: bool) -> u64 {
        travel_millis(graph, edge, reverse).unwrap_or(u64::MAX)
    }

    fn turn_weight(&self, graph: &RoadGraph, from_edge: EdgeId, via: NodeId, to_edge: EdgeId) -> Weight {
        if self.turn_costs.turn_cost(graph, from_edge, via, to_edge) < INFINITY {
            0.0
        } else {
            INFINITY
        }
    }

    fn turn_millis(&self, graph: &RoadGraph, from_edge: EdgeId, via: NodeId, to_edge: EdgeId) -> u64 {
        self.turn_costs.turn_millis(graph, from_edge, via, to_edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> RoadGraph {
        // 0 -- 1 -- 2, 1 -- 3 (one way towards 3)
        let mut builder = RoadGraphBuilder::with_nodes(4);
        builder.add_edge(0, 1, 1000.0, Access::Both, EdgeFlags::with_speed(36.0));
        builder.add_edge(1, 2, 500.0, Access::Both, EdgeFlags::with_speed(18.0));
        builder.add_edge(1, 3, 100.0, Access::Forward, EdgeFlags::with_speed(36.0));
        builder.add_turn_cost(0, 1, 1, 12.0);
        builder.forbid_turn(0, 1, 2);
        builder.build()
    }

    #[test]
    fn fastest_uses_speed_and_access() {
        let graph = graph();
        let weighting = FastestWeighting::default();
        assert_eq!(weighting.edge_weight(&graph, 0, false), 100.0);
        assert_eq!(weighting.edge_millis(&graph, 1, true), 100_000);
        assert_eq!(weighting.edge_weight(&graph, 2, true), INFINITY);
        assert_eq!(weighting.turn_weight(&graph, 0, 1, 1), 12.0);
        assert_eq!(weighting.turn_millis(&graph, 0, 1, 1), 12_000);
        assert_eq!(weighting.turn_weight(&graph, 0, 1, 2), INFINITY);
    }

    #[test]
    fn u_turns_are_configurable() {
        let graph = graph();
        let forbidden = FastestWeighting::new(TurnCostConfig { u_turn_costs: None });
        let penalized = FastestWeighting::new(TurnCostConfig { u_turn_costs: Some(30.0) });

        assert_eq!(forbidden.turn_weight(&graph, 1, 1, 1), INFINITY);
        assert_eq!(penalized.turn_weight(&graph, 1, 1, 1), 30.0);
        // node 2 is a dead end
        assert_eq!(forbidden.turn_weight(&graph, 1, 2, 1), 0.0);

        assert_eq!(forbidden.name(), "fastest");
        assert_eq!(penalized.name(), "fastest(u_turn=30)");
        assert_ne!(penalized.name(), FastestWeighting::new(TurnCostConfig { u_turn_costs: Some(500.0) }).name());
    }

    #[test]
    fn shortest_ignores_finite_turn_costs() {
        let graph = graph();
        let weighting = ShortestWeighting::default();
        assert_eq!(weighting.edge_weight(&graph, 1, false), 500.0);
        assert_eq!(weighting.turn_weight(&graph, 0, 1, 1), 0.0);
        assert_eq!(weighting.turn_weight(&graph, 0, 1, 2), INFINITY);
    }
}
