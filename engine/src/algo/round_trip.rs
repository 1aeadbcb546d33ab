//! Round trips: tours which start and end at the same road node.
//!
//! The waypoints of a tour lie on a circle through the start, so the tour is about `distance` long
//! as the crow flies. They are snapped to the road network and connected with any `QueryServer`.
//! When a waypoint can not be snapped or reached, the circle is turned to another random heading
//! and the tour is tried again. After `max_retries` further attempts the error of the last one is returned.

use super::location_index::{Coordinate, LocationIndex};
use super::router::route_via;
use super::*;
use crate::config::RoundTripParams;
use rand::prelude::*;
use std::f64::consts::PI;

pub fn round_trip<S: QueryServer>(server: &mut S, graph: &RoadGraph, index: &dyn LocationIndex, start: NodeId, params: &RoundTripParams) -> Result<RoutePath, QueryError> {
    if start as usize >= graph.num_nodes() {
        return Err(QueryError::PointNotFound { point_index: 0 });
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut last_error = QueryError::ConnectionNotFound {
        from: start,
        to: start,
        reason: None,
    };
    for attempt in 0..=params.max_retries {
        let heading = rng.gen_range(0.0..2.0 * PI);
        match tour(server, graph, index, start, heading, params) {
            Ok(route) => {
                report!("round_trip_attempts", attempt + 1);
                return Ok(route);
            }
            Err(e @ (QueryError::PointNotFound { .. } | QueryError::ConnectionNotFound { .. })) => {
                log::debug!("round trip attempt {} from {} failed: {}", attempt, start, e);
                last_error = e;
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_error)
}

fn tour<S: QueryServer>(server: &mut S, graph: &RoadGraph, index: &dyn LocationIndex, start: NodeId, heading: f64, params: &RoundTripParams) -> Result<RoutePath, QueryError> {
    let num_waypoints = params.points.max(1);
    let radius = params.distance / (2.0 * PI);
    let center = Coordinate::of_node(graph, start).moved(heading, radius);

    let mut nodes = vec![start];
    for i in 1..=num_waypoints {
        let bearing = heading + PI + i as f64 * 2.0 * PI / (num_waypoints + 1) as f64;
        let node = index.snap(center.moved(bearing, radius)).ok_or(QueryError::PointNotFound { point_index: i })?;
        if nodes.last() != Some(&node) {
            nodes.push(node);
        }
    }
    if nodes.len() == 1 || (nodes.len() == 2 && nodes[1] == start) {
        // all waypoints collapsed onto the start
        return Err(QueryError::ConnectionNotFound {
            from: start,
            to: start,
            reason: None,
        });
    }
    if nodes.last() != Some(&start) {
        nodes.push(start);
    }

    route_via(server, &nodes)
}
