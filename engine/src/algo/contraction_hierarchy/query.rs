//! Contraction Hierarchy query server.
//!
//! Actually not much more than a bidirectional dijkstra with a different stopping criterion.
//! And path unpacking.
//! The forward search only goes up, the backward search only goes down (in reverse),
//! so both only ever reach higher ranked nodes.
//! Each direction keeps going until its own queue minimum reaches the best route found,
//! the sum of both minima is not a valid bound here.

use super::*;
use crate::algo::dijkstra::{DijkstraData, DijkstraRun};
use crate::algo::*;
use crate::config::QueryParams;
use crate::report::*;

mod alternatives;

pub use self::alternatives::Alternative;

pub struct Server<'a> {
    ch: &'a ContractionHierarchy,
    traversal: &'a TraversalGraph,
    forward_data: DijkstraData,
    backward_data: DijkstraData,
    params: QueryParams,
    meeting_node: NodeId,
    // nodes settled by the last search, only collected while searching for alternatives
    record_settled: bool,
    forward_settled: Vec<NodeId>,
    backward_settled: Vec<NodeId>,
}

impl<'a> Server<'a> {
    /// Fails if `ch` was not prepared for `traversal`.
    pub fn new(ch: &'a ContractionHierarchy, traversal: &'a TraversalGraph, params: QueryParams) -> Result<Self, QueryError> {
        check_compatible(ch, traversal)?;
        let n = ch.num_nodes();
        Ok(Server {
            ch,
            traversal,
            forward_data: DijkstraData::new(n),
            backward_data: DijkstraData::new(n),
            params,
            meeting_node: INVALID_ID,
            record_settled: false,
            forward_settled: Vec::new(),
            backward_settled: Vec::new(),
        })
    }

    fn distance(&mut self, query: Query) -> Result<Label, QueryError> {
        check_query(self.traversal, query)?;
        self.meeting_node = INVALID_ID;
        if query.from == query.to {
            return Ok(Label::ZERO);
        }

        let sources = self.traversal.sources(query.from);
        let targets = zero_labels(self.traversal.targets(query.to));
        let stall_on_demand = self.params.stall_on_demand;
        self.search(&sources, &targets, 1.0, stall_on_demand)?
            .ok_or_else(|| connection_not_found(self.traversal, query))
    }

    // Bidirectional search between hierarchy nodes. `sources` are start nodes of the upward search with
    // their initial labels, `targets` those of the downward search. Each direction keeps going while its
    // queue minimum is below `slack` times the best weight found so far.
    fn search(&mut self, sources: &[(NodeId, Label)], targets: &[(NodeId, Label)], slack: Weight, stall_on_demand: bool) -> Result<Option<Label>, QueryError> {
        self.meeting_node = INVALID_ID;
        self.forward_settled.clear();
        self.backward_settled.clear();

        let ch = self.ch;
        let record_settled = self.record_settled;
        let mut budget = SearchBudget::new(&self.params);
        let mut forward = DijkstraRun::new(ch.forward(), &mut self.forward_data);
        let mut backward = DijkstraRun::new(ch.backward(), &mut self.backward_data);

        for &(node, label) in sources {
            forward.add_source(node, label, label.weight);
        }
        for &(node, label) in targets {
            backward.add_source(node, label, label.weight);
        }

        let mut best = Label::UNREACHED;
        let mut meeting_node = INVALID_ID;
        let mut num_stalled_nodes = 0;

        loop {
            let forward_min = forward.min_key().unwrap_or(INFINITY);
            let backward_min = backward.min_key().unwrap_or(INFINITY);
            let bound = best.weight * slack;
            let forward_active = forward_min < bound;
            let backward_active = backward_min < bound;
            if !forward_active && !backward_active {
                break;
            }
            if let Err(e) = budget.visit() {
                log::debug!("aborted ch search after settling {} nodes", budget.visited_nodes());
                return Err(e);
            }

            if forward_active && (!backward_active || forward_min <= backward_min) {
                let node = match forward.pop() {
                    Some(node) => node,
                    None => break,
                };
                if record_settled {
                    self.forward_settled.push(node);
                }
                let label = *forward.tentative_distance(node);
                let candidate = label + *backward.tentative_distance(node);
                if candidate.weight < best.weight {
                    best = candidate;
                    meeting_node = node;
                }

                // node can be reached cheaper from above
                if stall_on_demand
                    && ch
                        .backward()
                        .link_iter(node)
                        .any(|link| forward.tentative_distance(link.node).weight + link.weight < label.weight)
                {
                    num_stalled_nodes += 1;
                    continue;
                }
                forward.relax(node, |_| true, |_, _| (), |_| Some(0.0));
            } else {
                let node = match backward.pop() {
                    Some(node) => node,
                    None => break,
                };
                if record_settled {
                    self.backward_settled.push(node);
                }
                let label = *backward.tentative_distance(node);
                let candidate = *forward.tentative_distance(node) + label;
                if candidate.weight < best.weight {
                    best = candidate;
                    meeting_node = node;
                }

                if stall_on_demand
                    && ch
                        .forward()
                        .link_iter(node)
                        .any(|link| backward.tentative_distance(link.node).weight + link.weight < label.weight)
                {
                    num_stalled_nodes += 1;
                    continue;
                }
                backward.relax(node, |_| true, |_, _| (), |_| Some(0.0));
            }
        }

        report_silent!("num_settled_nodes", forward.num_settled_nodes() + backward.num_settled_nodes());
        report_silent!("num_relaxed_arcs", forward.num_relaxed_arcs() + backward.num_relaxed_arcs());
        report_silent!("num_stalled_nodes", num_stalled_nodes);

        if best.is_reached() {
            self.meeting_node = meeting_node;
            Ok(Some(best))
        } else {
            Ok(None)
        }
    }

    // Start node and original arcs of the route found by the last search.
    fn unpacked_arcs(&self) -> (NodeId, Vec<EdgeId>) {
        let (first, mut ch_arcs) = self.forward_data.arc_path(self.meeting_node);
        let (_, backward_arcs) = self.backward_data.arc_chain(self.meeting_node);
        ch_arcs.extend(backward_arcs);
        (first, self.ch.unpack(&ch_arcs))
    }

    fn path(&self, query: Query) -> RoutePath {
        if self.meeting_node == INVALID_ID {
            return RoutePath::trivial(query.from);
        }
        let (first, arcs) = self.unpacked_arcs();
        let costs = self.forward_data.labels[self.meeting_node as usize] + self.backward_data.labels[self.meeting_node as usize];
        self.traversal.route(first, &arcs, costs)
    }
}

fn zero_labels(nodes: Vec<NodeId>) -> Vec<(NodeId, Label)> {
    nodes.into_iter().map(|node| (node, Label::ZERO)).collect()
}

/// Fails with `InvalidPreparation` unless `ch` was prepared on `traversal`.
pub fn check_compatible(ch: &ContractionHierarchy, traversal: &TraversalGraph) -> Result<(), QueryError> {
    if ch.profile() != traversal.profile() {
        return Err(QueryError::InvalidPreparation {
            reason: format!("hierarchy of profile {} used with graph of profile {}", ch.profile(), traversal.profile()),
        });
    }
    if ch.num_nodes() != traversal.num_nodes() || ch.num_original_arcs() != traversal.num_arcs() {
        return Err(QueryError::InvalidPreparation {
            reason: "hierarchy and graph differ in size".to_string(),
        });
    }
    Ok(())
}

pub struct PathServerWrapper<'s, 'a>(&'s Server<'a>, Query);

impl<'s, 'a> PathServer for PathServerWrapper<'s, 'a> {
    fn reconstruct_path(&mut self) -> RoutePath {
        Server::path(self.0, self.1)
    }
}

impl<'a> QueryServer for Server<'a> {
    type P<'s> = PathServerWrapper<'s, 'a> where Self: 's;

    fn query(&mut self, query: Query) -> Result<QueryResult<Self::P<'_>>, QueryError> {
        let costs = self.distance(query)?;
        Ok(QueryResult::new(costs, PathServerWrapper(self, query)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::weighting::{FastestWeighting, ShortestWeighting};
    use crate::config::{ContractionParams, TurnCostConfig};

    #[test]
    fn stalling_does_not_change_results() {
        // a grid like graph where stalling actually happens
        let mut builder = RoadGraphBuilder::with_nodes(6);
        builder.add_edge(0, 1, 1.0, Access::Both, EdgeFlags::with_speed(36.0));
        builder.add_edge(1, 2, 1.0, Access::Both, EdgeFlags::with_speed(36.0));
        builder.add_edge(0, 3, 1.0, Access::Both, EdgeFlags::with_speed(36.0));
        builder.add_edge(3, 4, 1.0, Access::Both, EdgeFlags::with_speed(36.0));
        builder.add_edge(4, 5, 1.0, Access::Both, EdgeFlags::with_speed(36.0));
        builder.add_edge(2, 5, 1.0, Access::Both, EdgeFlags::with_speed(36.0));
        builder.add_edge(1, 4, 3.0, Access::Both, EdgeFlags::with_speed(36.0));
        let traversal = TraversalGraph::new(&builder.build(), &ShortestWeighting::default(), TraversalMode::NodeBased);
        let ch = prepare(&traversal, &ContractionParams::default()).unwrap();

        let stalling = QueryParams::default();
        let plain = QueryParams {
            stall_on_demand: false,
            ..QueryParams::default()
        };
        let mut with_stalling = Server::new(&ch, &traversal, stalling).unwrap();
        let mut without_stalling = Server::new(&ch, &traversal, plain).unwrap();

        for from in 0..6 {
            for to in 0..6 {
                let query = Query { from, to };
                let a = with_stalling.query(query).unwrap().weight();
                let b = without_stalling.query(query).unwrap().weight();
                assert_eq!(a, b, "{:?}", query);
            }
        }
    }

    #[test]
    fn rejects_hierarchies_of_other_profiles() {
        let mut builder = RoadGraphBuilder::with_nodes(2);
        builder.add_edge(0, 1, 1.0, Access::Both, EdgeFlags::with_speed(36.0));
        let graph = builder.build();
        let node_based = TraversalGraph::new(&graph, &ShortestWeighting::default(), TraversalMode::NodeBased);
        let edge_based = TraversalGraph::new(&graph, &ShortestWeighting::default(), TraversalMode::EdgeBased);
        let ch = prepare(&node_based, &ContractionParams::default()).unwrap();
        assert!(matches!(
            Server::new(&ch, &edge_based, QueryParams::default()),
            Err(QueryError::InvalidPreparation { .. })
        ));
    }

    #[test]
    fn rejects_hierarchies_of_other_u_turn_costs() {
        // 0 - 1 - 2 - 3 with a dead end 1 - 4
        let mut builder = RoadGraphBuilder::with_nodes(5);
        for (base, adj) in [(0, 1), (1, 2), (2, 3), (1, 4)] {
            builder.add_edge(base, adj, 10.0, Access::Both, EdgeFlags::with_speed(36.0));
        }
        let graph = builder.build();
        let cheap = FastestWeighting::new(TurnCostConfig { u_turn_costs: Some(10.0) });
        let expensive = FastestWeighting::new(TurnCostConfig { u_turn_costs: Some(500.0) });
        let prepared_on = TraversalGraph::new(&graph, &cheap, TraversalMode::EdgeBased);
        let queried_on = TraversalGraph::new(&graph, &expensive, TraversalMode::EdgeBased);
        let ch = prepare(&prepared_on, &ContractionParams::default()).unwrap();

        assert_ne!(prepared_on.profile(), queried_on.profile());
        assert!(matches!(
            Server::new(&ch, &queried_on, QueryParams::default()),
            Err(QueryError::InvalidPreparation { .. })
        ));
        assert!(Server::new(&ch, &prepared_on, QueryParams::default()).is_ok());
    }
}
