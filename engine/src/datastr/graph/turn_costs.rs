use super::*;
use std::collections::HashMap;

/// Costs for turning from one edge over a node into another edge.
/// Turns without an entry are free, an entry of `INFINITY` forbids the turn.
/// U-turn handling is not part of the table, weightings decide about it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnCostTable {
    costs: HashMap<(EdgeId, NodeId, EdgeId), Weight>,
}

impl TurnCostTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later entries for the same turn replace earlier ones.
    pub fn insert(&mut self, from_edge: EdgeId, via: NodeId, to_edge: EdgeId, cost: Weight) {
        assert!(cost >= 0.0, "negative turn cost {}", cost);
        self.costs.insert((from_edge, via, to_edge), cost);
    }

    pub fn get(&self, from_edge: EdgeId, via: NodeId, to_edge: EdgeId) -> Weight {
        self.costs.get(&(from_edge, via, to_edge)).copied().unwrap_or(0.0)
    }

    pub fn is_forbidden(&self, from_edge: EdgeId, via: NodeId, to_edge: EdgeId) -> bool {
        self.get(from_edge, via, to_edge) == INFINITY
    }

    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }

    /// All entries in a deterministic order.
    pub fn sorted_entries(&self) -> Vec<((EdgeId, NodeId, EdgeId), Weight)> {
        let mut entries: Vec<_> = self.costs.iter().map(|(&turn, &cost)| (turn, cost)).collect();
        entries.sort_unstable_by_key(|&(turn, _)| turn);
        entries
    }
}
