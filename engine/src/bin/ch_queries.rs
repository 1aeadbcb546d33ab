// Random queries on a prepared contraction hierarchy, checked against bidirectional Dijkstra.
// Takes the graph directory, the hierarchy directory and the profile JSON file as arguments,
// optionally followed by the number of queries and a seed.

#[macro_use]
extern crate ch_road_router;

use ch_road_router::{
    algo::{contraction_hierarchy, dijkstra::query::bidirectional_dijkstra, traversal::TraversalGraph, *},
    cli::{next_arg, parse_arg_or, CliErr},
    config::{load_json, ProfileConfig},
    datastr::graph::*,
    error::QueryError,
    io::*,
    report::*,
};
use rand::prelude::*;
use std::{env, error::Error};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let _reporter = enable_reporting("ch_queries");

    let mut args = env::args().skip(1);
    let graph_dir = next_arg(&mut args, "No graph directory arg given")?;
    let ch_dir = next_arg(&mut args, "No hierarchy directory arg given")?;
    let profile: ProfileConfig = load_json(next_arg(&mut args, "No profile arg given")?)?;
    let num_queries: usize = parse_arg_or(&mut args, 1000, "Invalid number of queries")?;
    let seed: u64 = parse_arg_or(&mut args, 42, "Invalid seed")?;
    report!("num_queries", num_queries);
    report!("seed", seed);

    let graph = RoadGraph::reconstruct_from(&graph_dir)?;
    let traversal = TraversalGraph::new(&graph, &*profile.weighting.build(), profile.mode);
    let ch: contraction_hierarchy::ContractionHierarchy = (&traversal).reconstruct_from(&ch_dir)?;
    report!("profile", traversal.profile());
    report!("num_shortcuts", ch.shortcuts().len());
    if graph.num_nodes() == 0 {
        return Err(Box::new(CliErr("Graph has no nodes")));
    }

    let mut ch_server = contraction_hierarchy::query::Server::new(&ch, &traversal, profile.query)?;
    let mut dijkstra_server = bidirectional_dijkstra::Server::new(&traversal, profile.query);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut ch_time = std::time::Duration::ZERO;
    let mut dijkstra_time = std::time::Duration::ZERO;
    let mut num_mismatches = 0;
    let mut num_unreachable = 0;

    let mut queries_ctxt = push_collection_context("queries");
    for _ in 0..num_queries {
        let _item = queries_ctxt.push_collection_item();
        let query = Query {
            from: rng.gen_range(0..graph.num_nodes() as NodeId),
            to: rng.gen_range(0..graph.num_nodes() as NodeId),
        };
        report!("from", query.from);
        report!("to", query.to);

        let (ch_result, time) = {
            let _ctx = push_context("ch");
            measure(|| weight_of(ch_server.query(query)))
        };
        ch_time += time;
        report!("ch_running_time_ms", time.as_secs_f64() * 1000.0);
        let (dijkstra_result, time) = {
            let _ctx = push_context("dijkstra");
            measure(|| weight_of(dijkstra_server.query(query)))
        };
        dijkstra_time += time;

        let ch_weight = ch_result?;
        let dijkstra_weight = dijkstra_result?;
        report!("weight", ch_weight);
        if ch_weight.is_none() {
            num_unreachable += 1;
        }
        if ch_weight != dijkstra_weight {
            num_mismatches += 1;
            log::warn!("{:?}: hierarchy found {:?} but dijkstra found {:?}", query, ch_weight, dijkstra_weight);
        }
    }
    drop(queries_ctxt);

    report!("num_unreachable", num_unreachable);
    report!("num_mismatches", num_mismatches);
    if num_queries > 0 {
        report!("avg_ch_running_time_ms", ch_time.as_secs_f64() * 1000.0 / num_queries as f64);
        report!("avg_dijkstra_running_time_ms", dijkstra_time.as_secs_f64() * 1000.0 / num_queries as f64);
    }

    if num_mismatches > 0 {
        return Err(Box::new(CliErr("Hierarchy and dijkstra disagree")));
    }
    Ok(())
}

fn weight_of<P: PathServer>(result: Result<QueryResult<P>, QueryError>) -> Result<Option<Weight>, QueryError> {
    match result {
        Ok(result) => Ok(Some(result.weight())),
        Err(QueryError::ConnectionNotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}
