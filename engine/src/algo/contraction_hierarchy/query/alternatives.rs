//! Alternative routes through via nodes.
//!
//! Both directions of the hierarchy search keep going until their queue minimum exceeds the best
//! weight times `max_weight_factor`. Nodes settled from both sides are via node candidates, cheapest first.
//! A candidate yields an alternative if the shortest route through it is not too much longer than the best route,
//! does not share too much distance with the routes accepted so far and is locally optimal around the via node.

use super::*;
use crate::config::AlternativeParams;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct Alternative {
    pub path: RoutePath,
    /// Fraction of the distance shared with the routes found before, 0 for the best route.
    pub share: f64,
}

struct ViaRoute {
    path: RoutePath,
    // length of each edge of `path`
    distances: Vec<f64>,
    // position of the via node in `path.nodes`
    via_index: usize,
}

impl ViaRoute {
    fn new(traversal: &TraversalGraph, first: NodeId, arcs: &[EdgeId], costs: Label, via_index: usize) -> Self {
        ViaRoute {
            path: traversal.route(first, arcs, costs),
            distances: traversal.route_distances(first, arcs),
            via_index,
        }
    }

    fn shared_distance(&self, edges: &HashSet<EdgeId>) -> f64 {
        self.path
            .edges
            .iter()
            .zip(&self.distances)
            .filter(|&(edge, _)| edges.contains(edge))
            .map(|(_, distance)| distance)
            .sum()
    }
}

fn edge_set<'r>(routes: impl IntoIterator<Item = &'r ViaRoute>) -> HashSet<EdgeId> {
    routes.into_iter().flat_map(|route| route.path.edges.iter().copied()).collect()
}

impl<'a> Server<'a> {
    /// The best route from `query.from` to `query.to` followed by up to `params.max_paths - 1` alternatives.
    ///
    /// Fails like a regular query if there is no route at all.
    pub fn alternatives(&mut self, query: Query, params: &AlternativeParams) -> Result<Vec<Alternative>, QueryError> {
        check_query(self.traversal, query)?;
        self.meeting_node = INVALID_ID;
        if query.from == query.to {
            return Ok(vec![Alternative {
                path: RoutePath::trivial(query.from),
                share: 0.0,
            }]);
        }

        let traversal = self.traversal;
        let sources = traversal.sources(query.from);
        let targets = zero_labels(traversal.targets(query.to));

        // stalled nodes would miss candidates
        self.record_settled = true;
        let best = self.search(&sources, &targets, params.max_weight_factor, false);
        self.record_settled = false;
        let best = best?.ok_or_else(|| connection_not_found(traversal, query))?;
        let (first, arcs) = self.unpacked_arcs();
        let max_weight = best.weight * params.max_weight_factor;

        let backward_settled: HashSet<NodeId> = self.backward_settled.iter().copied().collect();
        let mut candidates: Vec<(Weight, NodeId)> = self
            .forward_settled
            .iter()
            .filter(|&&node| backward_settled.contains(&node))
            .map(|&node| {
                let weight = self.forward_data.labels[node as usize].weight + self.backward_data.labels[node as usize].weight;
                (weight, node)
            })
            .filter(|&(weight, _)| weight <= max_weight)
            .collect();
        candidates.sort_by(|(a, a_node), (b, b_node)| a.total_cmp(b).then(a_node.cmp(b_node)));
        report_silent!("num_via_candidates", candidates.len());

        let mut routes = vec![ViaRoute::new(traversal, first, &arcs, best, 0)];
        let mut shares = vec![0.0];
        for (_, via) in candidates {
            if routes.len() >= params.max_paths {
                break;
            }
            let route = match self.via_route(query, via)? {
                Some(route) => route,
                None => continue,
            };
            if route.path.weight > max_weight || route.path.distance <= 0.0 {
                continue;
            }
            let share = route.shared_distance(&edge_set(&routes)) / route.path.distance;
            if share > params.max_share_factor {
                continue;
            }
            if !self.is_locally_optimal(&route, &routes[0], params.local_optimality_factor)? {
                continue;
            }
            routes.push(route);
            shares.push(share);
        }
        report_silent!("num_alternatives", routes.len() - 1);

        Ok(routes.into_iter().zip(shares).map(|(route, share)| Alternative { path: route.path, share }).collect())
    }

    // The shortest route from `query.from` to `query.to` through hierarchy node `via`.
    fn via_route(&mut self, query: Query, via: NodeId) -> Result<Option<ViaRoute>, QueryError> {
        let traversal = self.traversal;
        let stall_on_demand = self.params.stall_on_demand;

        let to_via = match self.search(&traversal.sources(query.from), &[(via, Label::ZERO)], 1.0, stall_on_demand)? {
            Some(costs) => costs,
            None => return Ok(None),
        };
        let (first, mut arcs) = self.unpacked_arcs();
        let via_index = if traversal.mode().is_edge_based() { arcs.len() + 1 } else { arcs.len() };

        let from_via = match self.search(&[(via, Label::ZERO)], &zero_labels(traversal.targets(query.to)), 1.0, stall_on_demand)? {
            Some(costs) => costs,
            None => return Ok(None),
        };
        let (_, onward_arcs) = self.unpacked_arcs();
        arcs.extend(onward_arcs);

        Ok(Some(ViaRoute::new(traversal, first, &arcs, to_via + from_via, via_index)))
    }

    // The section of `route` around the via node covering a share of the detour from `best`
    // has to be a shortest path itself.
    fn is_locally_optimal(&mut self, route: &ViaRoute, best: &ViaRoute, local_optimality_factor: f64) -> Result<bool, QueryError> {
        let detour = route.path.distance - route.shared_distance(&edge_set([best]));
        let reach = 0.5 * local_optimality_factor * detour;

        let mut start = route.via_index;
        let mut covered = 0.0;
        while start > 0 && covered < reach {
            start -= 1;
            covered += route.distances[start];
        }
        let mut end = route.via_index;
        covered = 0.0;
        while end < route.distances.len() && covered < reach {
            covered += route.distances[end];
            end += 1;
        }
        if start == end {
            return Ok(true);
        }

        let (from, to) = (route.path.nodes[start], route.path.nodes[end]);
        if from == to {
            // a loop through the via node
            return Ok(false);
        }
        let traversal = self.traversal;
        let stall_on_demand = self.params.stall_on_demand;
        let costs = match self.search(&traversal.sources(from), &zero_labels(traversal.targets(to)), 1.0, stall_on_demand)? {
            Some(costs) => costs,
            None => return Ok(false),
        };
        let (first, arcs) = self.unpacked_arcs();
        let via_node = route.path.nodes[route.via_index];
        Ok(traversal.route(first, &arcs, costs).nodes.contains(&via_node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::contraction_hierarchy::prepare_with_order;
    use crate::algo::weighting::ShortestWeighting;
    use crate::config::ContractionParams;
    use crate::datastr::node_order::NodeOrder;

    // two routes from 0 to 3: 0 - 1 - 2 - 3 of length 30 and 0 - 4 - 5 - 3 of length 33
    fn hierarchy_and_graph() -> (ContractionHierarchy, TraversalGraph) {
        let mut builder = RoadGraphBuilder::with_nodes(6);
        for (base, adj, distance) in [(0, 1, 10.0), (1, 2, 10.0), (2, 3, 10.0), (0, 4, 11.0), (4, 5, 11.0), (5, 3, 11.0)] {
            builder.add_edge(base, adj, distance, Access::Both, EdgeFlags::with_speed(36.0));
        }
        let traversal = TraversalGraph::new(&builder.build(), &ShortestWeighting::default(), TraversalMode::NodeBased);
        let order = NodeOrder::from_node_order(vec![1, 2, 5, 0, 3, 4]).unwrap();
        let ch = prepare_with_order(&traversal, &order, &ContractionParams::default()).unwrap();
        (ch, traversal)
    }

    #[test]
    fn finds_the_parallel_route() {
        let (ch, traversal) = hierarchy_and_graph();
        let mut server = Server::new(&ch, &traversal, QueryParams::default()).unwrap();

        let routes = server.alternatives(Query { from: 0, to: 3 }, &AlternativeParams::default()).unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].path.nodes, vec![0, 1, 2, 3]);
        assert_eq!(routes[0].path.weight, 30.0);
        assert_eq!(routes[1].path.nodes, vec![0, 4, 5, 3]);
        assert_eq!(routes[1].path.weight, 33.0);
        assert_eq!(routes[1].path.distance, 33.0);
        assert_eq!(routes[1].share, 0.0);

        // the regular query is not affected
        assert_eq!(server.query(Query { from: 0, to: 3 }).unwrap().path().nodes, vec![0, 1, 2, 3]);
    }

    #[test]
    fn respects_stretch_and_count_limits() {
        let (ch, traversal) = hierarchy_and_graph();
        let mut server = Server::new(&ch, &traversal, QueryParams::default()).unwrap();
        let query = Query { from: 0, to: 3 };

        let tight = AlternativeParams {
            max_weight_factor: 1.05,
            ..AlternativeParams::default()
        };
        assert_eq!(server.alternatives(query, &tight).unwrap().len(), 1);

        let single = AlternativeParams {
            max_paths: 1,
            ..AlternativeParams::default()
        };
        let routes = server.alternatives(query, &single).unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].path.weight, 30.0);
    }

    #[test]
    fn fails_like_a_regular_query() {
        let mut builder = RoadGraphBuilder::with_nodes(3);
        builder.add_edge(0, 1, 10.0, Access::Both, EdgeFlags::with_speed(36.0));
        let traversal = TraversalGraph::new(&builder.build(), &ShortestWeighting::default(), TraversalMode::NodeBased);
        let ch = prepare(&traversal, &ContractionParams::default()).unwrap();
        let mut server = Server::new(&ch, &traversal, QueryParams::default()).unwrap();

        assert!(matches!(
            server.alternatives(Query { from: 0, to: 2 }, &AlternativeParams::default()),
            Err(QueryError::ConnectionNotFound {
                reason: Some(DisconnectReason::DifferentSubnetworks),
                ..
            })
        ));
        assert_eq!(
            server.alternatives(Query { from: 0, to: 7 }, &AlternativeParams::default()),
            Err(QueryError::PointNotFound { point_index: 1 })
        );
        let budget = QueryParams {
            max_visited_nodes: 1,
            ..QueryParams::default()
        };
        let mut server = Server::new(&ch, &traversal, budget).unwrap();
        assert!(matches!(
            server.alternatives(Query { from: 0, to: 1 }, &AlternativeParams::default()),
            Err(QueryError::SearchAborted { .. })
        ));
    }
}
