//! Mapping coordinates to road nodes.

use crate::datastr::graph::*;
use crate::error::QueryError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f32,
    pub longitude: f32,
}

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

impl Coordinate {
    pub fn of_node(graph: &RoadGraph, node: NodeId) -> Coordinate {
        Coordinate {
            latitude: graph.latitude(node),
            longitude: graph.longitude(node),
        }
    }

    /// The point `meters` away in direction `bearing` (radians, clockwise from north).
    /// Only accurate for short distances.
    pub fn moved(self, bearing: f64, meters: f64) -> Coordinate {
        let latitude = (self.latitude as f64).to_radians();
        let angle = meters / EARTH_RADIUS_METERS;
        Coordinate {
            latitude: (latitude + angle * bearing.cos()).to_degrees() as f32,
            longitude: ((self.longitude as f64).to_radians() + angle * bearing.sin() / latitude.cos()).to_degrees() as f32,
        }
    }
}

pub trait LocationIndex {
    /// The road node closest to `point`, `None` if nothing is within reach.
    fn snap(&self, point: Coordinate) -> Option<NodeId>;

    /// Snap all points, failing with the index of the first one which could not be snapped.
    fn snap_all(&self, points: &[Coordinate]) -> Result<Vec<NodeId>, QueryError> {
        points
            .iter()
            .enumerate()
            .map(|(point_index, &point)| self.snap(point).ok_or(QueryError::PointNotFound { point_index }))
            .collect()
    }
}

/// Scans all nodes with at least one edge.
/// Distances are approximated on an equirectangular projection, good enough to find the closest node.
#[derive(Debug)]
pub struct NearestNodeIndex<'g> {
    graph: &'g RoadGraph,
    max_distance_meters: f64,
}


impl<'g> NearestNodeIndex<'g> {
    pub fn new(graph: &'g RoadGraph) -> Self {
        Self::with_max_distance(graph, f64::INFINITY)
    }

    /// Points further than `max_distance_meters` from every node can not be snapped.
    pub fn with_max_distance(graph: &'g RoadGraph, max_distance_meters: f64) -> Self {
        NearestNodeIndex { graph, max_distance_meters }
    }

    fn distance_meters(&self, node: NodeId, point: Coordinate) -> f64 {
        let lat = (self.graph.latitude(node) as f64).to_radians();
        let lon = (self.graph.longitude(node) as f64).to_radians();
        let point_lat = (point.latitude as f64).to_radians();
        let point_lon = (point.longitude as f64).to_radians();
        let x = (lon - point_lon) * ((lat + point_lat) / 2.0).cos();
        let y = lat - point_lat;
        (x * x + y * y).sqrt() * EARTH_RADIUS_METERS
    }
}

impl<'g> LocationIndex for NearestNodeIndex<'g> {
    fn snap(&self, point: Coordinate) -> Option<NodeId> {
        (0..self.graph.num_nodes() as NodeId)
            .filter(|&node| self.graph.degree(node) > 0)
            .map(|node| (self.distance_meters(node, point), node))
            .filter(|&(distance, _)| distance <= self.max_distance_meters)
            .min_by(|(a, _), (b, _)| a.total_cmp(b))
            .map(|(_, node)| node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> RoadGraph {
        let mut builder = RoadGraphBuilder::new();
        let a = builder.add_node(49.0, 8.40);
        let b = builder.add_node(49.0, 8.41);
        let c = builder.add_node(49.01, 8.40);
        builder.add_node(49.0, 8.405);
        builder.add_edge(a, b, 730.0, Access::Both, EdgeFlags::with_speed(50.0));
        builder.add_edge(a, c, 1110.0, Access::Both, EdgeFlags::with_speed(50.0));
        builder.build()
    }

    #[test]
    fn snaps_to_closest_connected_node() {
        let graph = graph();
        let index = NearestNodeIndex::new(&graph);
        let point = |latitude, longitude| Coordinate { latitude, longitude };

        assert_eq!(index.snap(point(49.0, 8.409)), Some(1));
        assert_eq!(index.snap(point(49.009, 8.4)), Some(2));
        // node 3 is closer but has no edges
        assert_eq!(index.snap(point(49.0, 8.4049)), Some(0));
    }

    #[test]
    fn moving_coordinates() {
        let origin = Coordinate { latitude: 49.0, longitude: 8.4 };
        let north = origin.moved(0.0, 1000.0);
        let east = origin.moved(std::f64::consts::FRAC_PI_2, 1000.0);
        assert!((north.latitude - 49.009).abs() < 1e-4);
        assert!((north.longitude - 8.4).abs() < 1e-6);
        assert!((east.latitude - 49.0).abs() < 1e-6);
        assert!((east.longitude - 8.4137).abs() < 1e-3);
    }

    #[test]
    fn far_away_points_are_not_found() {
        let graph = graph();
        let index = NearestNodeIndex::with_max_distance(&graph, 1000.0);
        let points = [
            Coordinate { latitude: 49.0, longitude: 8.4 },
            Coordinate { latitude: 52.5, longitude: 13.4 },
        ];
        assert_eq!(index.snap_all(&points), Err(QueryError::PointNotFound { point_index: 1 }));
    }
}
