//! Building the hierarchy: node ordering and contraction.
//!
//! Nodes are ordered by a priority which combines the edge difference (shortcuts needed minus arcs removed),
//! the number of traversal arcs the new shortcuts would stand for, the number of already contracted
//! neighbors and the depth of the hierarchy below the node.
//! Priorities are estimated with cheaper witness searches than the actual contraction uses.
//! After each contraction the priorities of (a random sample of) the neighbors are recomputed,
//! for the last nodes priorities are also recomputed lazily right before contracting.

use super::contraction_graph::*;
use super::witness_search::WitnessSearch;
use super::*;
use crate::config::ContractionParams;
use crate::datastr::index_heap::*;
use crate::error::PreparationError;
use crate::report::*;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy)]
struct PriorityState {
    priority: f32,
    node: NodeId,
}

impl PartialEq for PriorityState {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PriorityState {}

impl Ord for PriorityState {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority.total_cmp(&other.priority).then_with(|| self.node.cmp(&other.node))
    }
}

impl PartialOrd for PriorityState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Indexing for PriorityState {
    fn as_index(&self) -> usize {
        self.node as usize
    }
}

/// Contract all nodes in an order determined by the priority heuristic.
pub fn prepare(traversal: &TraversalGraph, params: &ContractionParams) -> Result<ContractionHierarchy, PreparationError> {
    params.validate()?;
    let _ctx = push_context("preparation");
    report!("profile", traversal.profile());
    report!("num_nodes", traversal.num_nodes());
    report!("num_arcs", traversal.num_arcs());

    let mut contractor = Contractor::new(traversal, params);
    report_time_with_key("contraction", "contraction_ms", || contractor.contract_heuristically());
    contractor.finish()
}

/// Contract all nodes in the given order.
pub fn prepare_with_order(traversal: &TraversalGraph, order: &NodeOrder, params: &ContractionParams) -> Result<ContractionHierarchy, PreparationError> {
    params.validate()?;
    if order.len() != traversal.num_nodes() {
        return Err(PreparationError::InvalidNodeOrder {
            reason: format!("order contains {} nodes but the graph has {}", order.len(), traversal.num_nodes()),
        });
    }
    let _ctx = push_context("preparation");
    report!("profile", traversal.profile());
    report!("fixed_order", true);

    let mut contractor = Contractor::new(traversal, params);
    report_time_with_key("contraction with fixed order", "contraction_ms", || {
        for &node in order.order() {
            contractor.contract(node);
            contractor.log_progress(order.len() - contractor.num_contracted);
        }
    });
    contractor.finish()
}

/// Prepare hierarchies for several profiles at once, each on its own worker.
pub fn prepare_profiles(profiles: &[(&TraversalGraph, ContractionParams)]) -> Vec<Result<ContractionHierarchy, PreparationError>> {
    profiles.par_iter().map(|(traversal, params)| prepare(traversal, params)).collect()
}

struct Contractor<'g> {
    traversal: &'g TraversalGraph,
    params: ContractionParams,
    graph: ContractionGraph,
    witness_search: WitnessSearch,
    shortcuts: Vec<Shortcut>,
    levels: Vec<Level>,
    contracted_neighbors: Vec<u32>,
    depth: Vec<u32>,
    mean_degree: f64,
    num_contracted: usize,
    log_interval: usize,
    num_improved_shortcuts: usize,
    num_dominated_shortcuts: usize,
}

impl<'g> Contractor<'g> {
    fn new(traversal: &'g TraversalGraph, params: &ContractionParams) -> Self {
        let n = traversal.num_nodes();
        let log_interval = if params.log_messages_percentage == 0 {
            usize::MAX
        } else {
            (n * params.log_messages_percentage as usize / 100).max(1)
        };

        Contractor {
            traversal,
            params: *params,
            graph: ContractionGraph::new(traversal),
            witness_search: WitnessSearch::new(n),
            shortcuts: Vec::new(),
            levels: vec![INVALID_ID; n],
            contracted_neighbors: vec![0; n],
            depth: vec![0; n],
            mean_degree: traversal.num_arcs() as f64 / n.max(1) as f64,
            num_contracted: 0,
            log_interval,
            num_improved_shortcuts: 0,
            num_dominated_shortcuts: 0,
        }
    }

    fn max_settled_nodes(&self, poll_factor: f64) -> usize {
        ((self.mean_degree * poll_factor).ceil() as usize).max(1)
    }

    /// Call `shortcut` for every pair of arcs around `node` without a witness.
    fn find_shortcuts<F: FnMut(&PrepEdge, &PrepEdge)>(graph: &ContractionGraph, witness_search: &mut WitnessSearch, node: NodeId, max_settled_nodes: usize, mut shortcut: F) {
        for incoming in graph.incoming(node) {
            witness_search.init(incoming.node, node);
            for outgoing in graph.outgoing(node) {
                if outgoing.node == incoming.node {
                    continue;
                }
                let shortcut_weight = incoming.costs.weight + outgoing.costs.weight;
                if witness_search.find_upper_bound(graph, outgoing.node, shortcut_weight, max_settled_nodes) > shortcut_weight {
                    shortcut(incoming, outgoing);
                }
            }
        }
    }

    fn priority(&mut self, node: NodeId) -> f32 {
        let max_settled_nodes = self.max_settled_nodes(self.params.max_poll_factor_heuristic);
        let mut num_shortcuts = 0usize;
        let mut orig_count = 0u32;
        Self::find_shortcuts(&self.graph, &mut self.witness_search, node, max_settled_nodes, |incoming, outgoing| {
            num_shortcuts += 1;
            orig_count += incoming.orig_count + outgoing.orig_count;
        });

        let edge_difference = num_shortcuts as f32 - self.graph.degree(node) as f32;
        self.params.edge_difference_weight * edge_difference
            + self.params.original_edges_count_weight * orig_count as f32
            + self.params.contracted_neighbors_weight * self.contracted_neighbors[node as usize] as f32
            + self.params.neighbor_level_weight * self.depth[node as usize] as f32
    }

    /// Contract `node`, assign it the next level and return its remaining neighbors.
    fn contract(&mut self, node: NodeId) -> Vec<NodeId> {
        let max_settled_nodes = self.max_settled_nodes(self.params.max_poll_factor_contraction);
        let mut needed = Vec::new();
        Self::find_shortcuts(&self.graph, &mut self.witness_search, node, max_settled_nodes, |incoming, outgoing| {
            needed.push((*incoming, *outgoing))
        });

        for (incoming, outgoing) in needed {
            let costs = incoming.costs + outgoing.costs;
            let id = (self.traversal.num_arcs() + self.shortcuts.len()) as EdgeId;
            let insertion = self
                .graph
                .insert_shortcut(incoming.node, outgoing.node, costs, id, incoming.orig_count + outgoing.orig_count);
            match insertion {
                ShortcutInsertion::Dominated => {
                    self.num_dominated_shortcuts += 1;
                    continue;
                }
                ShortcutInsertion::Improved => self.num_improved_shortcuts += 1,
                ShortcutInsertion::New => (),
            }
            self.shortcuts.push(Shortcut {
                from: incoming.node,
                to: outgoing.node,
                weight: costs.weight,
                distance: costs.distance,
                millis: costs.millis,
                skipped: [incoming.ch_id, outgoing.ch_id],
            });
        }

        let degree = self.graph.degree(node);
        let neighbors = self.graph.disconnect(node);
        self.levels[node as usize] = self.num_contracted as Level;
        self.num_contracted += 1;
        self.mean_degree = (self.mean_degree * 2.0 + degree as f64) / 3.0;

        let depth = self.depth[node as usize] + 1;
        for &neighbor in &neighbors {
            self.contracted_neighbors[neighbor as usize] += 1;
            self.depth[neighbor as usize] = self.depth[neighbor as usize].max(depth);
        }

        neighbors
    }

    fn contract_heuristically(&mut self) {
        let n = self.traversal.num_nodes();
        let mut queue = IndexdMinHeap::new(n);
        for node in 0..n as NodeId {
            let priority = self.priority(node);
            queue.push(PriorityState { priority, node });
        }

        let periodic_interval = if self.params.periodic_updates_percentage == 0 {
            usize::MAX
        } else {
            (n * self.params.periodic_updates_percentage as usize / 100).max(1)
        };
        let lazy_start = n - n * self.params.last_nodes_lazy_updates_percentage as usize / 100;
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let mut num_periodic_updates = 0;
        let mut num_lazy_updates = 0;
        let mut last_periodic_update = 0;

        while let Some(PriorityState { node, .. }) = queue.pop() {
            if self.num_contracted - last_periodic_update >= periodic_interval {
                last_periodic_update = self.num_contracted;
                num_periodic_updates += 1;
                let priority = self.priority(node);
                queue.push(PriorityState { priority, node });
                for other in 0..n as NodeId {
                    if queue.contains_index(other as usize) && other != node {
                        let priority = self.priority(other);
                        queue.update_key(PriorityState { priority, node: other });
                    }
                }
                continue;
            }

            if self.num_contracted >= lazy_start {
                let priority = self.priority(node);
                if let Some(min) = queue.peek() {
                    if priority > min.priority {
                        num_lazy_updates += 1;
                        queue.push(PriorityState { priority, node });
                        continue;
                    }
                }
            }

            let neighbors = self.contract(node);
            for neighbor in neighbors {
                if rng.gen_range(0..100) < self.params.neighbor_updates_percentage {
                    let priority = self.priority(neighbor);
                    queue.update_key(PriorityState { priority, node: neighbor });
                }
            }

            self.log_progress(queue.len());
        }

        report!("num_periodic_updates", num_periodic_updates);
        report!("num_lazy_updates", num_lazy_updates);
    }

    fn log_progress(&self, remaining: usize) {
        if self.num_contracted % self.log_interval == 0 {
            log::info!(
                "{}: contracted {} nodes, {} remaining, {} shortcuts, mean degree {:.2}",
                self.traversal.profile(),
                self.num_contracted,
                remaining,
                self.shortcuts.len(),
                self.mean_degree
            );
        }
    }

    fn finish(self) -> Result<ContractionHierarchy, PreparationError> {
        let remaining = self.levels.iter().filter(|&&level| level == INVALID_ID).count();
        if remaining > 0 {
            return Err(PreparationError::DependencyCycle { remaining });
        }

        report!("num_shortcuts", self.shortcuts.len());
        report!("num_improved_shortcuts", self.num_improved_shortcuts);
        report!("num_dominated_shortcuts", self.num_dominated_shortcuts);
        log::info!(
            "{}: contraction finished with {} shortcuts for {} arcs",
            self.traversal.profile(),
            self.shortcuts.len(),
            self.traversal.num_arcs()
        );

        let order = NodeOrder::from_levels(self.levels)?;
        let ch = ContractionHierarchy::build(self.traversal, order, self.shortcuts);
        ch.validate().map_err(|reason| PreparationError::InvariantViolation { reason })?;
        Ok(ch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::weighting::ShortestWeighting;

    // a line 0 - 1 - 2 - 3 - 4 in both directions
    fn line() -> TraversalGraph {
        let mut builder = RoadGraphBuilder::with_nodes(5);
        for node in 0..4 {
            builder.add_edge(node, node + 1, 1.0, Access::Both, EdgeFlags::with_speed(36.0));
        }
        TraversalGraph::new(&builder.build(), &ShortestWeighting::default(), TraversalMode::NodeBased)
    }

    #[test]
    fn fixed_order_adds_the_expected_shortcuts() {
        let traversal = line();
        let order = NodeOrder::from_node_order(vec![1, 3, 0, 2, 4]).unwrap();
        let ch = prepare_with_order(&traversal, &order, &ContractionParams::default()).unwrap();
        // 0 <-> 2 over 1 and 2 <-> 4 over 3
        assert_eq!(ch.shortcuts().len(), 4);
        assert!(ch.shortcuts().iter().all(|s| s.weight == 2.0));
        assert_eq!(ch.order(), &order);
    }

    #[test]
    fn every_node_gets_a_level() {
        let traversal = line();
        let ch = prepare(&traversal, &ContractionParams::default()).unwrap();
        let mut levels = ch.order().levels().to_vec();
        levels.sort_unstable();
        assert_eq!(levels, vec![0, 1, 2, 3, 4]);
        assert!(ch.validate().is_ok());
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let params = ContractionParams {
            neighbor_updates_percentage: 120,
            ..ContractionParams::default()
        };
        assert!(matches!(prepare(&line(), &params), Err(PreparationError::InvalidParams { .. })));
        let order = NodeOrder::identity(3);
        assert!(matches!(
            prepare_with_order(&line(), &order, &ContractionParams::default()),
            Err(PreparationError::InvalidNodeOrder { .. })
        ));
    }
}
