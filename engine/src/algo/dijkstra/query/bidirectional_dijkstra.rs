//! Bidirectional Dijkstra without any preprocessing.

use super::*;
use crate::report::*;

/// Alternates between a forward search from the source and a backward search from the target.
/// Whenever a search reaches a node the other one already labelled, the tentative best route is updated.
/// The search stops once the sum of both queue minima reaches the best route found.
pub struct Server<'g> {
    graph: &'g TraversalGraph,
    forward_data: DijkstraData,
    backward_data: DijkstraData,
    params: QueryParams,
    meeting_node: NodeId,
}

impl<'g> Server<'g> {
    pub fn new(graph: &'g TraversalGraph, params: QueryParams) -> Self {
        Server {
            graph,
            forward_data: DijkstraData::new(graph.num_nodes()),
            backward_data: DijkstraData::new(graph.num_nodes()),
            params,
            meeting_node: INVALID_ID,
        }
    }

    fn distance(&mut self, query: Query) -> Result<Label, QueryError> {
        check_query(self.graph, query)?;
        self.meeting_node = INVALID_ID;
        if query.from == query.to {
            return Ok(Label::ZERO);
        }

        let graph = self.graph;
        let mut budget = SearchBudget::new(&self.params);
        let mut forward = DijkstraRun::new(graph.forward(), &mut self.forward_data);
        let mut backward = DijkstraRun::new(graph.backward(), &mut self.backward_data);

        for (node, label) in graph.sources(query.from) {
            forward.add_source(node, label, label.weight);
        }
        for node in graph.targets(query.to) {
            backward.add_source(node, Label::ZERO, 0.0);
        }

        let mut best = Label::UNREACHED;
        let mut meeting_node = INVALID_ID;

        loop {
            let forward_min = forward.min_key().unwrap_or(INFINITY);
            let backward_min = backward.min_key().unwrap_or(INFINITY);
            if forward_min + backward_min >= best.weight {
                break;
            }
            if let Err(e) = budget.visit() {
                log::debug!("aborted bidirectional query {:?} after settling {} nodes", query, budget.visited_nodes());
                return Err(e);
            }

            if forward_min <= backward_min {
                let node = match forward.pop() {
                    Some(node) => node,
                    None => break,
                };
                let candidate = *forward.tentative_distance(node) + *backward.tentative_distance(node);
                if candidate.weight < best.weight {
                    best = candidate;
                    meeting_node = node;
                }
                forward.relax(
                    node,
                    |_| true,
                    |head, label| {
                        let candidate = *label + *backward.tentative_distance(head);
                        if candidate.weight < best.weight {
                            best = candidate;
                            meeting_node = head;
                        }
                    },
                    |_| Some(0.0),
                );
            } else {
                let node = match backward.pop() {
                    Some(node) => node,
                    None => break,
                };
                let candidate = *forward.tentative_distance(node) + *backward.tentative_distance(node);
                if candidate.weight < best.weight {
                    best = candidate;
                    meeting_node = node;
                }
                backward.relax(
                    node,
                    |_| true,
                    |head, label| {
                        let candidate = *forward.tentative_distance(head) + *label;
                        if candidate.weight < best.weight {
                            best = candidate;
                            meeting_node = head;
                        }
                    },
                    |_| Some(0.0),
                );
            }
        }

        report_silent!("num_settled_nodes", forward.num_settled_nodes() + backward.num_settled_nodes());
        report_silent!("num_relaxed_arcs", forward.num_relaxed_arcs() + backward.num_relaxed_arcs());

        if best.is_reached() {
            self.meeting_node = meeting_node;
            Ok(best)
        } else {
            Err(connection_not_found(graph, query))
        }
    }

    fn path(&self, query: Query) -> RoutePath {
        if self.meeting_node == INVALID_ID {
            return RoutePath::trivial(query.from);
        }
        let (first, mut arcs) = self.forward_data.arc_path(self.meeting_node);
        let (_, backward_arcs) = self.backward_data.arc_chain(self.meeting_node);
        arcs.extend(backward_arcs);
        let costs = self.forward_data.labels[self.meeting_node as usize] + self.backward_data.labels[self.meeting_node as usize];
        self.graph.route(first, &arcs, costs)
    }
}

pub struct PathServerWrapper<'s, 'g>(&'s Server<'g>, Query);

impl<'s, 'g> PathServer for PathServerWrapper<'s, 'g> {
    fn reconstruct_path(&mut self) -> RoutePath {
        Server::path(self.0, self.1)
    }
}

impl<'g> QueryServer for Server<'g> {
    type P<'s> = PathServerWrapper<'s, 'g> where Self: 's;

    fn query(&mut self, query: Query) -> Result<QueryResult<Self::P<'_>>, QueryError> {
        let costs = self.distance(query)?;
        Ok(QueryResult::new(costs, PathServerWrapper(self, query)))
    }
}
