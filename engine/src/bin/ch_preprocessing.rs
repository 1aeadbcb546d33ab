// Prepare contraction hierarchies for one or more profiles.
// Takes the graph directory, an output directory and any number of profile JSON files as arguments.
// The hierarchy of each profile is stored in a subdirectory of the output directory named after the profile.

#[macro_use]
extern crate ch_road_router;

use ch_road_router::{
    algo::{contraction_hierarchy::prepare_profiles, traversal::TraversalGraph},
    cli::{next_arg, CliErr},
    config::{load_json, ProfileConfig},
    datastr::graph::*,
    io::*,
    report::*,
};
use std::{env, error::Error, path::Path};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let _reporter = enable_reporting("ch_preprocessing");

    let mut args = env::args().skip(1);
    let graph_dir = next_arg(&mut args, "No graph directory arg given")?;
    let out_dir = next_arg(&mut args, "No output directory arg given")?;
    let profiles = args.map(load_json::<ProfileConfig, _>).collect::<Result<Vec<_>, _>>()?;
    if profiles.is_empty() {
        return Err(Box::new(CliErr("No profile given")));
    }

    let graph = report_time_with_key("loading graph", "graph_loading_ms", || RoadGraph::reconstruct_from(&graph_dir))?;
    report!("graph", { "num_nodes": graph.num_nodes(), "num_edges": graph.num_edges() });

    let traversal_graphs: Vec<TraversalGraph> = profiles
        .iter()
        .map(|profile| TraversalGraph::new(&graph, &*profile.weighting.build(), profile.mode))
        .collect();
    let jobs: Vec<_> = traversal_graphs.iter().zip(&profiles).map(|(traversal, profile)| (traversal, profile.contraction)).collect();

    let results = report_time_with_key("preparing all profiles", "preparation_ms", || prepare_profiles(&jobs));

    let mut profiles_ctxt = push_collection_context("profiles");
    for (profile, result) in profiles.iter().zip(results) {
        let _item = profiles_ctxt.push_collection_item();
        report!("name", profile.name);
        let ch = result?;
        report!("num_shortcuts", ch.shortcuts().len());
        ch.deconstruct_to(&Path::new(&out_dir).join(&profile.name))?;
        log::info!("stored hierarchy of profile {} with {} shortcuts", profile.name, ch.shortcuts().len());
    }

    Ok(())
}
