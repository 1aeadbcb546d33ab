//! Routing between coordinates.
//!
//! The `Router` ties together a road graph, its search graph, an optional contraction hierarchy,
//! optional landmarks and a location index. Points are snapped to road nodes first,
//! routes through several points are the concatenation of the routes between consecutive points.

use super::alt::Landmarks;
use super::contraction_hierarchy::{
    query::{check_compatible, Alternative},
    ContractionHierarchy,
};
use super::dijkstra::query::{bidirectional_dijkstra, dijkstra};
use super::location_index::{Coordinate, LocationIndex, NearestNodeIndex};
use super::matrix::{self, DistanceMatrix};
use super::round_trip::round_trip;
use super::traversal::TraversalGraph;
use super::*;
use crate::config::{AlternativeParams, RoundTripParams};
use crate::report::block_reporting;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    Dijkstra,
    BidirectionalDijkstra,
    /// A* with landmark potentials
    Alt,
    ContractionHierarchy,
}

pub struct Router<'g> {
    road_graph: &'g RoadGraph,
    traversal: &'g TraversalGraph,
    index: Box<dyn LocationIndex + 'g>,
    ch: Option<&'g ContractionHierarchy>,
    landmarks: Option<&'g Landmarks>,
    params: QueryParams,
}

impl<'g> Router<'g> {
    pub fn new(road_graph: &'g RoadGraph, traversal: &'g TraversalGraph, params: QueryParams) -> Self {
        Router {
            road_graph,
            traversal,
            index: Box::new(NearestNodeIndex::new(road_graph)),
            ch: None,
            landmarks: None,
            params,
        }
    }

    /// Fails if `ch` was prepared for a different search graph.
    pub fn with_ch(mut self, ch: &'g ContractionHierarchy) -> Result<Self, QueryError> {
        check_compatible(ch, self.traversal)?;
        self.ch = Some(ch);
        Ok(self)
    }

    pub fn with_landmarks(mut self, landmarks: &'g Landmarks) -> Self {
        self.landmarks = Some(landmarks);
        self
    }

    pub fn with_location_index(mut self, index: Box<dyn LocationIndex + 'g>) -> Self {
        self.index = index;
        self
    }

    /// The best algorithm available with the prepared data.
    pub fn default_algorithm(&self) -> Algorithm {
        if self.ch.is_some() {
            Algorithm::ContractionHierarchy
        } else if self.landmarks.is_some() {
            Algorithm::Alt
        } else {
            Algorithm::BidirectionalDijkstra
        }
    }

    /// Route through all `points` in the given order.
    pub fn route(&self, points: &[Coordinate], algorithm: Algorithm) -> Result<RoutePath, QueryError> {
        let nodes = self.index.snap_all(points)?;
        self.route_nodes(&nodes, algorithm)
    }

    /// Route through all `nodes` in the given order.
    pub fn route_nodes(&self, nodes: &[NodeId], algorithm: Algorithm) -> Result<RoutePath, QueryError> {
        if nodes.is_empty() {
            return Err(QueryError::PointNotFound { point_index: 0 });
        }
        match algorithm {
            Algorithm::Dijkstra => route_via(&mut dijkstra::Server::new(self.traversal, self.params), nodes),
            Algorithm::BidirectionalDijkstra => route_via(&mut bidirectional_dijkstra::Server::new(self.traversal, self.params), nodes),
            Algorithm::Alt => {
                let landmarks = self.landmarks.ok_or_else(|| missing_preparation("landmarks"))?;
                route_via(&mut dijkstra::Server::with_potential(self.traversal, landmarks.potential(), self.params), nodes)
            }
            Algorithm::ContractionHierarchy => {
                let ch = self.ch.ok_or_else(|| missing_preparation("contraction hierarchy"))?;
                route_via(&mut contraction_hierarchy::query::Server::new(ch, self.traversal, self.params)?, nodes)
            }
        }
    }

    /// The best route between two points and up to `params.max_paths - 1` alternatives.
    /// Needs a contraction hierarchy.
    pub fn alternatives(&self, from: Coordinate, to: Coordinate, params: &AlternativeParams) -> Result<Vec<Alternative>, QueryError> {
        let nodes = self.index.snap_all(&[from, to])?;
        let ch = self.ch.ok_or_else(|| missing_preparation("contraction hierarchy"))?;
        contraction_hierarchy::query::Server::new(ch, self.traversal, self.params)?.alternatives(Query { from: nodes[0], to: nodes[1] }, params)
    }

    /// A tour starting and ending at `start`.
    pub fn round_trip(&self, start: Coordinate, params: &RoundTripParams, algorithm: Algorithm) -> Result<RoutePath, QueryError> {
        let start = self.index.snap(start).ok_or(QueryError::PointNotFound { point_index: 0 })?;
        let (graph, index) = (self.road_graph, self.index.as_ref());
        match algorithm {
            Algorithm::Dijkstra => round_trip(&mut dijkstra::Server::new(self.traversal, self.params), graph, index, start, params),
            Algorithm::BidirectionalDijkstra => round_trip(&mut bidirectional_dijkstra::Server::new(self.traversal, self.params), graph, index, start, params),
            Algorithm::Alt => {
                let landmarks = self.landmarks.ok_or_else(|| missing_preparation("landmarks"))?;
                round_trip(&mut dijkstra::Server::with_potential(self.traversal, landmarks.potential(), self.params), graph, index, start, params)
            }
            Algorithm::ContractionHierarchy => {
                let ch = self.ch.ok_or_else(|| missing_preparation("contraction hierarchy"))?;
                round_trip(&mut contraction_hierarchy::query::Server::new(ch, self.traversal, self.params)?, graph, index, start, params)
            }
        }
    }

    /// Costs between all pairs of `origins` and `destinations`.
    pub fn matrix(&self, origins: &[Coordinate], destinations: &[Coordinate], algorithm: Algorithm) -> Result<DistanceMatrix, QueryError> {
        let origin_nodes = self.index.snap_all(origins)?;
        let destination_nodes = self.index.snap_all(destinations).map_err(|e| match e {
            QueryError::PointNotFound { point_index } => QueryError::PointNotFound {
                point_index: origins.len() + point_index,
            },
            e => e,
        })?;
        self.matrix_nodes(&origin_nodes, &destination_nodes, algorithm)
    }

    pub fn matrix_nodes(&self, origins: &[NodeId], destinations: &[NodeId], algorithm: Algorithm) -> Result<DistanceMatrix, QueryError> {
        match algorithm {
            Algorithm::Dijkstra => matrix::one_to_many(self.traversal, &self.params, origins, destinations),
            Algorithm::BidirectionalDijkstra => {
                matrix::repeated_one_to_one(&mut bidirectional_dijkstra::Server::new(self.traversal, self.params), origins, destinations)
            }
            Algorithm::Alt => {
                let landmarks = self.landmarks.ok_or_else(|| missing_preparation("landmarks"))?;
                matrix::repeated_one_to_one(
                    &mut dijkstra::Server::with_potential(self.traversal, landmarks.potential(), self.params),
                    origins,
                    destinations,
                )
            }
            Algorithm::ContractionHierarchy => {
                let ch = self.ch.ok_or_else(|| missing_preparation("contraction hierarchy"))?;
                matrix::many_to_many(ch, self.traversal, &self.params, origins, destinations)
            }
        }
    }
}

fn missing_preparation(what: &str) -> QueryError {
    QueryError::InvalidPreparation {
        reason: format!("no {} loaded", what),
    }
}

/// Route through all `nodes` in the given order, which must not be empty.
pub(crate) fn route_via<S: QueryServer>(server: &mut S, nodes: &[NodeId]) -> Result<RoutePath, QueryError> {
    let _blocked = block_reporting();
    let mut route = RoutePath::trivial(nodes[0]);
    for (leg, pair) in nodes.windows(2).enumerate() {
        let mut result = server.query(Query { from: pair[0], to: pair[1] }).map_err(|e| match e {
            QueryError::PointNotFound { point_index } => QueryError::PointNotFound { point_index: leg + point_index },
            e => e,
        })?;
        route.append(result.path());
    }
    Ok(route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::{traversal::TraversalMode, weighting::ShortestWeighting};
    use crate::config::ContractionParams;

    // a square 0 - 1 - 2 - 3 - 0 with a one way diagonal 0 -> 2
    fn road_graph() -> RoadGraph {
        let mut builder = RoadGraphBuilder::new();
        builder.add_node(49.0, 8.40);
        builder.add_node(49.0, 8.41);
        builder.add_node(49.01, 8.41);
        builder.add_node(49.01, 8.40);
        builder.add_edge(0, 1, 730.0, Access::Both, EdgeFlags::with_speed(50.0));
        builder.add_edge(1, 2, 1110.0, Access::Both, EdgeFlags::with_speed(50.0));
        builder.add_edge(2, 3, 730.0, Access::Both, EdgeFlags::with_speed(50.0));
        builder.add_edge(3, 0, 1110.0, Access::Both, EdgeFlags::with_speed(50.0));
        builder.add_edge(0, 2, 1330.0, Access::Forward, EdgeFlags::with_speed(50.0));
        builder.build()
    }

    #[test]
    fn all_algorithms_route_through_via_points() {
        let road_graph = road_graph();
        let traversal = TraversalGraph::new(&road_graph, &ShortestWeighting::default(), TraversalMode::NodeBased);
        let ch = contraction_hierarchy::prepare(&traversal, &ContractionParams::default()).unwrap();
        let landmarks = Landmarks::farthest(traversal.forward(), 2, 0);
        let router = Router::new(&road_graph, &traversal, QueryParams::default())
            .with_ch(&ch)
            .unwrap()
            .with_landmarks(&landmarks);
        assert_eq!(router.default_algorithm(), Algorithm::ContractionHierarchy);

        let points = [
            Coordinate { latitude: 49.0, longitude: 8.4001 },
            Coordinate { latitude: 49.0101, longitude: 8.41 },
            Coordinate { latitude: 49.0, longitude: 8.41 },
        ];
        for algorithm in [Algorithm::Dijkstra, Algorithm::BidirectionalDijkstra, Algorithm::Alt, Algorithm::ContractionHierarchy] {
            let route = router.route(&points, algorithm).unwrap();
            assert_eq!(route.nodes, vec![0, 2, 1], "{:?}", algorithm);
            assert_eq!(route.edges, vec![4, 1], "{:?}", algorithm);
            assert_eq!(route.weight, 2440.0, "{:?}", algorithm);
        }
    }

    #[test]
    fn alternatives_and_round_trips() {
        let road_graph = road_graph();
        let traversal = TraversalGraph::new(&road_graph, &ShortestWeighting::default(), TraversalMode::NodeBased);
        let ch = contraction_hierarchy::prepare(&traversal, &ContractionParams::default()).unwrap();
        let router = Router::new(&road_graph, &traversal, QueryParams::default());
        let from = Coordinate { latitude: 49.0, longitude: 8.4001 };
        let to = Coordinate { latitude: 49.0101, longitude: 8.41 };
        assert!(matches!(
            router.alternatives(from, to, &AlternativeParams::default()),
            Err(QueryError::InvalidPreparation { .. })
        ));

        let router = router.with_ch(&ch).unwrap();
        let routes = router.alternatives(from, to, &AlternativeParams::default()).unwrap();
        assert_eq!(routes[0].path.nodes, vec![0, 2]);
        assert_eq!(routes[0].path.weight, 1330.0);
        assert!(routes.iter().skip(1).all(|route| route.path.weight <= 1330.0 * 1.25));

        let params = RoundTripParams {
            distance: 3000.0,
            max_retries: 20,
            ..RoundTripParams::default()
        };
        let tour = router.round_trip(from, &params, Algorithm::ContractionHierarchy).unwrap();
        assert_eq!(tour.nodes.first(), Some(&0));
        assert_eq!(tour.nodes.last(), Some(&0));
        assert!(!tour.edges.is_empty());
    }

    #[test]
    fn matrices_need_their_preparation() {
        let road_graph = road_graph();
        let traversal = TraversalGraph::new(&road_graph, &ShortestWeighting::default(), TraversalMode::NodeBased);
        let router = Router::new(&road_graph, &traversal, QueryParams::default());
        assert_eq!(router.default_algorithm(), Algorithm::BidirectionalDijkstra);

        let matrix = router.matrix_nodes(&[0, 2], &[2, 0], Algorithm::Dijkstra).unwrap();
        assert_eq!(matrix.weight(0, 0), Some(1330.0));
        assert_eq!(matrix.weight(1, 0), Some(0.0));
        assert_eq!(matrix.weight(1, 1), Some(1840.0));
        assert!(matches!(
            router.matrix_nodes(&[0], &[1], Algorithm::ContractionHierarchy),
            Err(QueryError::InvalidPreparation { .. })
        ));
    }
}
