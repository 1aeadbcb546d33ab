//! Distance matrices.
//!
//! Three strategies: repeated one to one queries with any `QueryServer`, one Dijkstra per origin
//! on the traversal graph, and the bucket based many to many algorithm on a contraction hierarchy.
//! Rows are independent, the latter two compute them on the rayon pool.
//!
//! Cells without a route are `None`, which is different from a zero weight route.
//! If any search runs out of budget, the whole matrix fails.
//! Points are numbered origins first, then destinations, for `PointNotFound`.

use super::contraction_hierarchy::{query::check_compatible, ContractionHierarchy};
use super::dijkstra::{DijkstraData, DijkstraRun};
use super::traversal::TraversalGraph;
use super::*;
use crate::report::*;
use rayon::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    num_destinations: usize,
    cells: Vec<Option<Label>>,
}

impl DistanceMatrix {
    fn from_rows(num_destinations: usize, rows: Vec<Vec<Option<Label>>>) -> Self {
        DistanceMatrix {
            num_destinations,
            cells: rows.into_iter().flatten().collect(),
        }
    }

    pub fn num_origins(&self) -> usize {
        if self.num_destinations == 0 {
            0
        } else {
            self.cells.len() / self.num_destinations
        }
    }

    pub fn num_destinations(&self) -> usize {
        self.num_destinations
    }

    /// Costs from origin `i` to destination `j`, `None` if there is no route.
    pub fn get(&self, i: usize, j: usize) -> Option<Label> {
        self.cells[i * self.num_destinations + j]
    }

    pub fn weight(&self, i: usize, j: usize) -> Option<Weight> {
        self.get(i, j).map(|label| label.weight)
    }

    pub fn row(&self, i: usize) -> &[Option<Label>] {
        &self.cells[i * self.num_destinations..(i + 1) * self.num_destinations]
    }
}

fn check_points(graph: &TraversalGraph, origins: &[NodeId], destinations: &[NodeId]) -> Result<(), QueryError> {
    match origins.iter().chain(destinations).position(|&node| node as usize >= graph.num_road_nodes()) {
        Some(point_index) => Err(QueryError::PointNotFound { point_index }),
        None => Ok(()),
    }
}

/// One query per cell.
pub fn repeated_one_to_one<S: QueryServer>(server: &mut S, origins: &[NodeId], destinations: &[NodeId]) -> Result<DistanceMatrix, QueryError> {
    let _blocked = block_reporting();
    let mut rows = Vec::with_capacity(origins.len());
    for (i, &from) in origins.iter().enumerate() {
        let mut row = Vec::with_capacity(destinations.len());
        for (j, &to) in destinations.iter().enumerate() {
            match server.query(Query { from, to }) {
                Ok(result) => row.push(Some(result.costs())),
                Err(QueryError::ConnectionNotFound { .. }) => row.push(None),
                Err(QueryError::PointNotFound { point_index }) => {
                    let point_index = if point_index == 0 { i } else { origins.len() + j };
                    return Err(QueryError::PointNotFound { point_index });
                }
                Err(e) => return Err(e),
            }
        }
        rows.push(row);
    }
    Ok(DistanceMatrix::from_rows(destinations.len(), rows))
}

/// One Dijkstra per origin, running until all destinations are settled.
pub fn one_to_many(graph: &TraversalGraph, params: &QueryParams, origins: &[NodeId], destinations: &[NodeId]) -> Result<DistanceMatrix, QueryError> {
    check_points(graph, origins, destinations)?;

    // search graph nodes ending at each destination, sorted for lookups
    let mut targets: Vec<(NodeId, usize)> = destinations
        .iter()
        .enumerate()
        .flat_map(|(j, &destination)| graph.targets(destination).into_iter().map(move |node| (node, j)))
        .collect();
    targets.sort_unstable();

    let rows = origins
        .par_iter()
        .map_init(
            || DijkstraData::new(graph.num_nodes()),
            |data, &origin| one_to_many_row(graph, params, data, &targets, origin, destinations),
        )
        .collect::<Result<Vec<_>, QueryError>>()?;

    Ok(DistanceMatrix::from_rows(destinations.len(), rows))
}

fn one_to_many_row(
    graph: &TraversalGraph,
    params: &QueryParams,
    data: &mut DijkstraData,
    targets: &[(NodeId, usize)],
    origin: NodeId,
    destinations: &[NodeId],
) -> Result<Vec<Option<Label>>, QueryError> {
    let mut row: Vec<Option<Label>> = destinations.iter().map(|&destination| (destination == origin).then_some(Label::ZERO)).collect();
    let mut remaining = row.iter().filter(|cell| cell.is_none()).count();
    let mut budget = SearchBudget::new(params);

    let mut run = DijkstraRun::new(graph.forward(), data);
    for (node, label) in graph.sources(origin) {
        run.add_source(node, label, label.weight);
    }

    while remaining > 0 && !run.queue_is_empty() {
        budget.visit()?;
        let node = match run.next_step() {
            Some(node) => node,
            None => break,
        };
        let first = targets.partition_point(|&(target, _)| target < node);
        for &(_, j) in targets[first..].iter().take_while(|&&(target, _)| target == node) {
            // the first settled target node of a destination is its closest one
            if row[j].is_none() {
                row[j] = Some(*run.tentative_distance(node));
                remaining -= 1;
            }
        }
    }

    Ok(row)
}

/// Bucket based many to many on a contraction hierarchy.
///
/// A backward search from each (distinct) destination stores its labels in buckets at the settled nodes.
/// A forward search from each origin then combines its labels with the buckets of every node it settles.
pub fn many_to_many(ch: &ContractionHierarchy, graph: &TraversalGraph, params: &QueryParams, origins: &[NodeId], destinations: &[NodeId]) -> Result<DistanceMatrix, QueryError> {
    check_compatible(ch, graph)?;
    check_points(graph, origins, destinations)?;
    let n = ch.num_nodes();

    let mut distinct_destinations = destinations.to_vec();
    distinct_destinations.sort_unstable();
    distinct_destinations.dedup();

    let backward_spaces = distinct_destinations
        .par_iter()
        .map_init(
            || DijkstraData::new(n),
            |data, &destination| {
                let starts: Vec<(NodeId, Label)> = graph.targets(destination).into_iter().map(|node| (node, Label::ZERO)).collect();
                search_space(ch.backward(), params, data, &starts)
            },
        )
        .collect::<Result<Vec<_>, QueryError>>()?;

    let mut buckets: Vec<Vec<(usize, Label)>> = vec![Vec::new(); n];
    for (k, space) in backward_spaces.into_iter().enumerate() {
        for (node, label) in space {
            buckets[node as usize].push((k, label));
        }
    }
    report!("num_bucket_entries", buckets.iter().map(Vec::len).sum::<usize>());

    let distinct_rows = origins
        .par_iter()
        .map_init(
            || DijkstraData::new(n),
            |data, &origin| -> Result<Vec<Option<Label>>, QueryError> {
                let mut row: Vec<Option<Label>> = vec![None; distinct_destinations.len()];
                for (node, forward_label) in search_space(ch.forward(), params, data, &graph.sources(origin))? {
                    for &(k, backward_label) in &buckets[node as usize] {
                        let candidate = forward_label + backward_label;
                        if row[k].map_or(true, |best| candidate.weight < best.weight) {
                            row[k] = Some(candidate);
                        }
                    }
                }
                Ok(row)
            },
        )
        .collect::<Result<Vec<_>, QueryError>>()?;

    let rows = distinct_rows
        .into_iter()
        .zip(origins)
        .map(|(distinct_row, &origin)| {
            destinations
                .iter()
                .map(|&destination| {
                    if destination == origin {
                        return Some(Label::ZERO);
                    }
                    distinct_destinations.binary_search(&destination).ok().and_then(|k| distinct_row[k])
                })
                .collect()
        })
        .collect();

    Ok(DistanceMatrix::from_rows(destinations.len(), rows))
}

// All nodes reachable from `starts` with their final labels.
fn search_space(graph: &FirstOutGraph, params: &QueryParams, data: &mut DijkstraData, starts: &[(NodeId, Label)]) -> Result<Vec<(NodeId, Label)>, QueryError> {
    let mut budget = SearchBudget::new(params);
    let mut run = DijkstraRun::new(graph, data);
    for &(node, label) in starts {
        run.add_source(node, label, label.weight);
    }

    let mut settled = Vec::new();
    while !run.queue_is_empty() {
        budget.visit()?;
        match run.next_step() {
            Some(node) => settled.push((node, *run.tentative_distance(node))),
            None => break,
        }
    }
    Ok(settled)
}
