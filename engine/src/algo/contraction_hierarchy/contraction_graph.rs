//! The shrinking graph of not yet contracted nodes.

use super::*;

/// An arc between two remaining nodes, stored at both endpoints.
/// `node` is the other endpoint, `ch_id` the hierarchy arc it stands for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrepEdge {
    pub node: NodeId,
    pub costs: Label,
    pub ch_id: EdgeId,
    /// number of traversal arcs this edge stands for
    pub orig_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutInsertion {
    New,
    /// replaced a more expensive shortcut between the same nodes
    Improved,
    /// an arc which is at least as cheap already exists
    Dominated,
}

#[derive(Debug)]
pub struct ContractionGraph {
    outgoing: Vec<Vec<PrepEdge>>,
    incoming: Vec<Vec<PrepEdge>>,
    contracted: Vec<bool>,
    num_original_arcs: usize,
}

impl ContractionGraph {
    pub fn new(traversal: &TraversalGraph) -> ContractionGraph {
        let n = traversal.num_nodes();
        let mut outgoing = vec![Vec::new(); n];
        let mut incoming = vec![Vec::new(); n];

        for tail in 0..n as NodeId {
            for link in traversal.forward().link_iter(tail) {
                if link.node == tail {
                    continue;
                }
                outgoing[tail as usize].push(PrepEdge {
                    node: link.node,
                    costs: link.costs(),
                    ch_id: link.id,
                    orig_count: 1,
                });
                incoming[link.node as usize].push(PrepEdge {
                    node: tail,
                    costs: link.costs(),
                    ch_id: link.id,
                    orig_count: 1,
                });
            }
        }

        ContractionGraph {
            outgoing,
            incoming,
            contracted: vec![false; n],
            num_original_arcs: traversal.num_arcs(),
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.contracted.len()
    }

    pub fn num_original_arcs(&self) -> usize {
        self.num_original_arcs
    }

    pub fn is_contracted(&self, node: NodeId) -> bool {
        self.contracted[node as usize]
    }

    pub fn outgoing(&self, node: NodeId) -> &[PrepEdge] {
        &self.outgoing[node as usize]
    }

    pub fn incoming(&self, node: NodeId) -> &[PrepEdge] {
        &self.incoming[node as usize]
    }

    pub fn degree(&self, node: NodeId) -> usize {
        self.outgoing[node as usize].len() + self.incoming[node as usize].len()
    }

    /// Insert a shortcut from `from` to `to` unless a cheaper or equally expensive arc exists.
    /// A more expensive shortcut between the two nodes is replaced, original arcs are kept.
    pub fn insert_shortcut(&mut self, from: NodeId, to: NodeId, costs: Label, ch_id: EdgeId, orig_count: u32) -> ShortcutInsertion {
        debug_assert!(!self.is_contracted(from) && !self.is_contracted(to));
        let num_original_arcs = self.num_original_arcs;
        let parallel = self.outgoing[from as usize].iter().filter(|edge| edge.node == to);

        if parallel.clone().any(|edge| edge.costs.weight <= costs.weight) {
            return ShortcutInsertion::Dominated;
        }

        let replaced = parallel.map(|edge| edge.ch_id).find(|&id| id as usize >= num_original_arcs);
        let edge = |node| PrepEdge {
            node,
            costs,
            ch_id,
            orig_count,
        };

        match replaced {
            Some(old_id) => {
                for out in self.outgoing[from as usize].iter_mut().filter(|e| e.ch_id == old_id) {
                    *out = edge(to);
                }
                for inc in self.incoming[to as usize].iter_mut().filter(|e| e.ch_id == old_id) {
                    *inc = edge(from);
                }
                ShortcutInsertion::Improved
            }
            None => {
                self.outgoing[from as usize].push(edge(to));
                self.incoming[to as usize].push(edge(from));
                ShortcutInsertion::New
            }
        }
    }

    /// Remove `node` with all its arcs from the graph.
    /// Returns the remaining neighbors, each once.
    pub fn disconnect(&mut self, node: NodeId) -> Vec<NodeId> {
        let outgoing = std::mem::take(&mut self.outgoing[node as usize]);
        let incoming = std::mem::take(&mut self.incoming[node as usize]);
        self.contracted[node as usize] = true;

        for edge in &outgoing {
            self.incoming[edge.node as usize].retain(|e| e.node != node);
        }
        for edge in &incoming {
            self.outgoing[edge.node as usize].retain(|e| e.node != node);
        }

        let mut neighbors: Vec<NodeId> = outgoing.iter().chain(incoming.iter()).map(|edge| edge.node).collect();
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors
    }
}
