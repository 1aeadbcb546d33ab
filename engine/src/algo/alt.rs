//! A* with landmarks and the triangle inequality.
//!
//! For each landmark `L` the weights from and to all road nodes are precomputed on the node based graph.
//! `max(d(L, t) - d(L, v), d(v, L) - d(t, L))` then is a lower bound of `d(v, t)`.
//! Turn costs are non-negative, so the bounds also hold for edge based searches.

use super::a_star::Potential;
use super::dijkstra::{query::dijkstra::one_to_all, DijkstraData, DijkstraRun};
use crate::datastr::graph::*;
use crate::report::*;
use rayon::prelude::*;

/// Precomputed landmark distances. Read only after construction, so one instance can back
/// the potentials of many concurrent queries.
#[derive(Debug, Clone)]
pub struct Landmarks {
    landmarks: Vec<NodeId>,
    from_landmark: Vec<Vec<Weight>>,
    to_landmark: Vec<Vec<Weight>>,
}

impl Landmarks {
    /// `graph` has to be the node based forward graph of the road network.
    pub fn new(graph: &FirstOutGraph, landmarks: Vec<NodeId>) -> Self {
        let reversed = FirstOutGraph::reversed(graph);
        let n = graph.num_nodes();

        let (from_landmark, to_landmark) = report_time_with_key("landmark distances", "landmark_distances_ms", || {
            landmarks
                .par_iter()
                .map_init(
                    || (DijkstraData::new(n), DijkstraData::new(n)),
                    |(forward_data, backward_data), &landmark| {
                        (one_to_all(graph, forward_data, landmark), one_to_all(&reversed, backward_data, landmark))
                    },
                )
                .unzip()
        });

        Landmarks {
            landmarks,
            from_landmark,
            to_landmark,
        }
    }

    /// Pick `num_landmarks` landmarks with the farthest heuristic.
    pub fn farthest(graph: &FirstOutGraph, num_landmarks: usize, initial: NodeId) -> Self {
        Self::new(graph, farthest_landmarks(graph, num_landmarks, initial))
    }

    pub fn landmarks(&self) -> &[NodeId] {
        &self.landmarks
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    pub fn potential(&self) -> ALTPotential<'_> {
        ALTPotential::new(self)
    }
}

/// Each landmark is the node settled last by a search from all previous landmarks.
/// The first search starts at `initial`. Searches ignore arc directions.
/// Stops early when no new node is found.
pub fn farthest_landmarks(graph: &FirstOutGraph, num_landmarks: usize, initial: NodeId) -> Vec<NodeId> {
    let reversed = FirstOutGraph::reversed(graph);
    let undirected = FirstOutGraph::from_adjacency_lists(
        (0..graph.num_nodes() as NodeId)
            .map(|node| graph.link_iter(node).chain(reversed.link_iter(node)).collect())
            .collect(),
    );
    let mut landmarks: Vec<NodeId> = Vec::with_capacity(num_landmarks);
    let mut data = DijkstraData::new(graph.num_nodes());

    while landmarks.len() < num_landmarks {
        let mut run = DijkstraRun::new(&undirected, &mut data);
        if landmarks.is_empty() {
            run.add_source(initial, Label::ZERO, 0.0);
        }
        for &landmark in &landmarks {
            run.add_source(landmark, Label::ZERO, 0.0);
        }

        let mut last_node = None;
        while let Some(node) = run.next_step() {
            last_node = Some(node);
        }

        match last_node {
            Some(node) if !landmarks.contains(&node) => landmarks.push(node),
            _ => break,
        }
    }

    landmarks
}

/// Per query state of the landmark potential.
#[derive(Debug, Clone)]
pub struct ALTPotential<'a> {
    landmarks: &'a Landmarks,
    target_from_landmark: Vec<Weight>,
    target_to_landmark: Vec<Weight>,
    num_pot_evals: usize,
}

impl<'a> ALTPotential<'a> {
    pub fn new(landmarks: &'a Landmarks) -> Self {
        ALTPotential {
            landmarks,
            target_from_landmark: vec![INFINITY; landmarks.len()],
            target_to_landmark: vec![INFINITY; landmarks.len()],
            num_pot_evals: 0,
        }
    }

    pub fn num_pot_evals(&self) -> usize {
        self.num_pot_evals
    }
}

impl<'a> Potential for ALTPotential<'a> {
    fn init(&mut self, target: NodeId) {
        for (i, (from, to)) in self.landmarks.from_landmark.iter().zip(&self.landmarks.to_landmark).enumerate() {
            self.target_from_landmark[i] = from[target as usize];
            self.target_to_landmark[i] = to[target as usize];
        }
        self.num_pot_evals = 0;
    }

    fn potential(&mut self, node: NodeId) -> Option<Weight> {
        self.num_pot_evals += 1;
        let mut max_pot: Weight = 0.0;

        for i in 0..self.landmarks.len() {
            let terms = [
                self.target_from_landmark[i] - self.landmarks.from_landmark[i][node as usize],
                self.landmarks.to_landmark[i][node as usize] - self.target_to_landmark[i],
            ];
            for term in terms {
                if term == INFINITY {
                    // the landmark proves that node can not reach the target
                    return None;
                }
                // NaN when both sides are unreachable, no information
                if term > max_pot {
                    max_pot = term;
                }
            }
        }

        Some(max_pot)
    }
}
