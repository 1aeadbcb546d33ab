use ch_road_router::{
    algo::{
        alt::Landmarks,
        contraction_hierarchy::{self, prepare, prepare_profiles, prepare_with_order},
        dijkstra::query::{bidirectional_dijkstra, dijkstra},
        matrix,
        traversal::{TraversalGraph, TraversalMode},
        weighting::{FastestWeighting, ShortestWeighting},
        *,
    },
    config::{ContractionParams, QueryParams},
    datastr::{graph::*, node_order::NodeOrder},
    error::{QueryError, SearchLimit},
};
use rayon::prelude::*;

fn graph() -> RoadGraph {
    // This is the directed graph we're going to use.
    // The node numbers correspond to the different states,
    // and the edge weights symbolize the cost of moving
    // from one node to another.
    // Note that the edges are one-way.
    //
    //                  7
    //          +-----------------+
    //          |                 |
    //          v   1        2    |  2
    //          0 -----> 1 -----> 3 ---> 4
    //          |        ^        ^      ^
    //          |        | 1      |      |
    //          |        |        | 3    | 1
    //          +------> 2 -------+      |
    //           10      |               |
    //                   +---------------+
    //
    let mut builder = RoadGraphBuilder::with_nodes(5);
    for &(base, adj, distance) in &[(0, 2, 10.0), (0, 1, 1.0), (1, 3, 2.0), (2, 1, 1.0), (2, 3, 3.0), (2, 4, 1.0), (3, 0, 7.0), (3, 4, 2.0)] {
        builder.add_edge(base, adj, distance, Access::Forward, EdgeFlags::with_speed(36.0));
    }
    builder.build()
}

fn traversal(graph: &RoadGraph) -> TraversalGraph {
    TraversalGraph::new(graph, &ShortestWeighting::default(), TraversalMode::NodeBased)
}

fn distance<S: QueryServer>(server: &mut S, from: NodeId, to: NodeId) -> Option<Weight> {
    match server.query(Query { from, to }) {
        Ok(result) => Some(result.weight()),
        Err(QueryError::ConnectionNotFound { .. }) => None,
        Err(e) => panic!("unexpected error {}", e),
    }
}

fn check_distances<S: QueryServer>(server: &mut S) {
    assert_eq!(distance(server, 0, 1), Some(1.0));
    assert_eq!(distance(server, 0, 3), Some(3.0));
    assert_eq!(distance(server, 3, 0), Some(7.0));
    assert_eq!(distance(server, 0, 4), Some(5.0));
    assert_eq!(distance(server, 4, 0), None);
    assert_eq!(distance(server, 4, 4), Some(0.0));
}

#[test]
fn simple_dijkstra_correct_distances() {
    let graph = graph();
    let traversal = traversal(&graph);
    check_distances(&mut dijkstra::Server::new(&traversal, QueryParams::default()));
}

#[test]
fn bidir_dijkstra_correct_distances() {
    let graph = graph();
    let traversal = traversal(&graph);
    check_distances(&mut bidirectional_dijkstra::Server::new(&traversal, QueryParams::default()));
}

#[test]
fn alt_correct_distances() {
    let graph = graph();
    let traversal = traversal(&graph);
    let landmarks = Landmarks::farthest(traversal.forward(), 2, 0);
    check_distances(&mut dijkstra::Server::with_potential(&traversal, landmarks.potential(), QueryParams::default()));
}

#[test]
fn ch_correct_distances() {
    let graph = graph();
    let traversal = traversal(&graph);
    let ch = prepare(&traversal, &ContractionParams::default()).unwrap();
    check_distances(&mut contraction_hierarchy::query::Server::new(&ch, &traversal, QueryParams::default()).unwrap());
}

#[test]
fn all_algorithms_return_the_same_path() {
    let graph = graph();
    let traversal = traversal(&graph);
    let ch = prepare(&traversal, &ContractionParams::default()).unwrap();
    let expected = RoutePath {
        nodes: vec![0, 1, 3, 4],
        edges: vec![1, 2, 7],
        weight: 5.0,
        distance: 5.0,
        millis: 500,
    };

    let query = Query { from: 0, to: 4 };
    let mut server = dijkstra::Server::new(&traversal, QueryParams::default());
    assert_eq!(server.query(query).unwrap().path(), expected);
    let mut server = bidirectional_dijkstra::Server::new(&traversal, QueryParams::default());
    assert_eq!(server.query(query).unwrap().path(), expected);
    let mut server = contraction_hierarchy::query::Server::new(&ch, &traversal, QueryParams::default()).unwrap();
    assert_eq!(server.query(query).unwrap().path(), expected);
}

#[test]
fn ch_never_worsens_results_on_cycle_with_chord() {
    let mut builder = RoadGraphBuilder::with_nodes(6);
    for node in 0..6 {
        builder.add_edge(node, (node + 1) % 6, 10.0, Access::Both, EdgeFlags::with_speed(36.0));
    }
    builder.add_edge(0, 3, 10.0, Access::Both, EdgeFlags::with_speed(36.0));
    let graph = builder.build();
    let traversal = traversal(&graph);

    let order = NodeOrder::from_node_order(vec![1, 2, 4, 5, 0, 3]).unwrap();
    let fixed = prepare_with_order(&traversal, &order, &ContractionParams::default()).unwrap();
    let heuristic = prepare(&traversal, &ContractionParams::default()).unwrap();

    let mut reference = dijkstra::Server::new(&traversal, QueryParams::default());
    for ch in [&fixed, &heuristic] {
        assert_eq!(ch.validate(), Ok(()));
        let mut server = contraction_hierarchy::query::Server::new(ch, &traversal, QueryParams::default()).unwrap();
        let mut result = server.query(Query { from: 0, to: 3 }).unwrap();
        assert_eq!(result.weight(), 10.0);
        assert_eq!(result.path().edges, vec![6]);

        for from in 0..6 {
            for to in 0..6 {
                assert_eq!(distance(&mut server, from, to), distance(&mut reference, from, to), "{} -> {}", from, to);
            }
        }
    }
}

#[test]
fn tiny_budget_aborts_search() {
    let graph = graph();
    let traversal = traversal(&graph);
    let ch = prepare(&traversal, &ContractionParams::default()).unwrap();
    let params = QueryParams {
        max_visited_nodes: 1,
        ..QueryParams::default()
    };
    let query = Query { from: 0, to: 4 };
    let aborted = |result: Result<Weight, QueryError>| {
        matches!(
            result,
            Err(QueryError::SearchAborted {
                limit: SearchLimit::VisitedNodes(1),
                ..
            })
        )
    };

    let mut server = dijkstra::Server::new(&traversal, params);
    assert!(aborted(server.query(query).map(|r| r.weight())));
    let mut server = bidirectional_dijkstra::Server::new(&traversal, params);
    assert!(aborted(server.query(query).map(|r| r.weight())));
    let mut server = contraction_hierarchy::query::Server::new(&ch, &traversal, params).unwrap();
    assert!(aborted(server.query(query).map(|r| r.weight())));

    // direct neighbors: the bidirectional search proves the distance after settling the source
    let neighbors = Query { from: 0, to: 1 };
    let mut server = dijkstra::Server::new(&traversal, params);
    assert!(aborted(server.query(neighbors).map(|r| r.weight())));
    let mut server = bidirectional_dijkstra::Server::new(&traversal, params);
    assert_eq!(server.query(neighbors).map(|r| r.weight()), Ok(1.0));
    let mut server = contraction_hierarchy::query::Server::new(&ch, &traversal, params).unwrap();
    assert!(aborted(server.query(neighbors).map(|r| r.weight())));
}

#[test]
fn zero_timeout_aborts_search() {
    let graph = graph();
    let traversal = traversal(&graph);
    let ch = prepare(&traversal, &ContractionParams::default()).unwrap();
    let landmarks = Landmarks::farthest(traversal.forward(), 2, 0);
    let params = QueryParams {
        timeout_ms: Some(0),
        ..QueryParams::default()
    };
    let query = Query { from: 0, to: 4 };
    let timed_out = |result: Result<Weight, QueryError>| {
        matches!(
            result,
            Err(QueryError::SearchAborted {
                limit: SearchLimit::Timeout(timeout),
                ..
            }) if timeout.as_millis() == 0
        )
    };

    let mut server = dijkstra::Server::new(&traversal, params);
    assert!(timed_out(server.query(query).map(|r| r.weight())));
    let mut server = dijkstra::Server::with_potential(&traversal, landmarks.potential(), params);
    assert!(timed_out(server.query(query).map(|r| r.weight())));
    let mut server = bidirectional_dijkstra::Server::new(&traversal, params);
    assert!(timed_out(server.query(query).map(|r| r.weight())));
    let mut server = contraction_hierarchy::query::Server::new(&ch, &traversal, params).unwrap();
    assert!(timed_out(server.query(query).map(|r| r.weight())));

    let matrix = matrix::many_to_many(&ch, &traversal, &params, &[0, 3], &[4]);
    assert!(matches!(matrix, Err(QueryError::SearchAborted { limit: SearchLimit::Timeout(_), .. })));
    let matrix = matrix::one_to_many(&traversal, &params, &[0, 3], &[4]);
    assert!(matches!(matrix, Err(QueryError::SearchAborted { limit: SearchLimit::Timeout(_), .. })));
}

#[test]
fn unknown_nodes_are_not_found() {
    let graph = graph();
    let traversal = traversal(&graph);
    let mut server = dijkstra::Server::new(&traversal, QueryParams::default());
    assert!(matches!(server.query(Query { from: 0, to: 5 }), Err(QueryError::PointNotFound { point_index: 1 })));
}

#[test]
fn forbidden_turns_force_detours() {
    // 0 - 1 - 2 with a detour 1 - 3 - 2, going straight at 1 is forbidden
    let mut builder = RoadGraphBuilder::with_nodes(4);
    let first = builder.add_edge(0, 1, 100.0, Access::Both, EdgeFlags::with_speed(36.0));
    let straight = builder.add_edge(1, 2, 100.0, Access::Both, EdgeFlags::with_speed(36.0));
    builder.add_edge(1, 3, 100.0, Access::Both, EdgeFlags::with_speed(36.0));
    builder.add_edge(3, 2, 100.0, Access::Both, EdgeFlags::with_speed(36.0));
    builder.forbid_turn(first, 1, straight);
    let graph = builder.build();

    let node_based = TraversalGraph::new(&graph, &ShortestWeighting::default(), TraversalMode::NodeBased);
    let edge_based = TraversalGraph::new(&graph, &ShortestWeighting::default(), TraversalMode::EdgeBased);
    let query = Query { from: 0, to: 2 };

    let mut server = dijkstra::Server::new(&node_based, QueryParams::default());
    assert_eq!(server.query(query).unwrap().path().edges, vec![0, 1]);

    let ch = prepare(&edge_based, &ContractionParams::default()).unwrap();
    let mut dijkstra_server = dijkstra::Server::new(&edge_based, QueryParams::default());
    let mut ch_server = contraction_hierarchy::query::Server::new(&ch, &edge_based, QueryParams::default()).unwrap();
    for path in [dijkstra_server.query(query).unwrap().path(), ch_server.query(query).unwrap().path()] {
        assert_eq!(path.nodes, vec![0, 1, 3, 2]);
        assert_eq!(path.edges, vec![0, 2, 3]);
        assert_eq!(path.weight, 300.0);
    }

    // the other way round nothing is forbidden
    let mut result = ch_server.query(Query { from: 2, to: 0 }).unwrap();
    assert_eq!(result.weight(), 200.0);
    assert_eq!(result.path().nodes, vec![2, 1, 0]);
}

#[test]
fn concurrent_queries_share_one_hierarchy() {
    let graph = graph();
    let traversal = traversal(&graph);
    let ch = prepare(&traversal, &ContractionParams::default()).unwrap();
    let queries: Vec<Query> = (0..5).flat_map(|from| (0..5).map(move |to| Query { from, to })).collect();

    let mut reference = dijkstra::Server::new(&traversal, QueryParams::default());
    let expected: Vec<Option<Weight>> = queries.iter().map(|q| distance(&mut reference, q.from, q.to)).collect();

    for _ in 0..10 {
        let results: Vec<Option<Weight>> = queries
            .par_iter()
            .map_init(
                || contraction_hierarchy::query::Server::new(&ch, &traversal, QueryParams::default()).unwrap(),
                |server, q| distance(server, q.from, q.to),
            )
            .collect();
        assert_eq!(results, expected);
    }
}

#[test]
fn several_profiles_prepare_in_parallel() {
    let mut builder = RoadGraphBuilder::with_nodes(4);
    builder.add_edge(0, 1, 1000.0, Access::Both, EdgeFlags::with_speed(30.0));
    builder.add_edge(1, 3, 1000.0, Access::Both, EdgeFlags::with_speed(30.0));
    builder.add_edge(0, 2, 1500.0, Access::Both, EdgeFlags::with_speed(90.0));
    builder.add_edge(2, 3, 1500.0, Access::Both, EdgeFlags::with_speed(90.0));
    let graph = builder.build();

    let shortest = TraversalGraph::new(&graph, &ShortestWeighting::default(), TraversalMode::NodeBased);
    let fastest = TraversalGraph::new(&graph, &FastestWeighting::default(), TraversalMode::EdgeBased);
    let results = prepare_profiles(&[(&shortest, ContractionParams::default()), (&fastest, ContractionParams::default())]);
    assert_eq!(results.len(), 2);

    let shortest_ch = results[0].as_ref().unwrap();
    let fastest_ch = results[1].as_ref().unwrap();
    assert_eq!(shortest_ch.profile(), "shortest|node");
    assert_eq!(fastest_ch.profile(), "fastest|edge");

    let query = Query { from: 0, to: 3 };
    let mut server = contraction_hierarchy::query::Server::new(shortest_ch, &shortest, QueryParams::default()).unwrap();
    assert_eq!(server.query(query).unwrap().path().nodes, vec![0, 1, 3]);
    let mut server = contraction_hierarchy::query::Server::new(fastest_ch, &fastest, QueryParams::default()).unwrap();
    assert_eq!(server.query(query).unwrap().path().nodes, vec![0, 2, 3]);

    // hierarchies only work with the graph they were prepared on
    assert!(contraction_hierarchy::query::Server::new(shortest_ch, &fastest, QueryParams::default()).is_err());
}
