//! The one parameterized Dijkstra routine.

use super::*;

/// A single run of Dijkstra's algorithm on borrowed graph and search data.
///
/// Settling a node is split into `pop` and `relax`, so callers can inspect
/// (and e.g. stall) a node in between. `next_step` does both.
/// Edge filters and potentials are passed per relaxation, so the same routine serves plain Dijkstra,
/// A*, both directions of bidirectional searches and CH searches.
#[derive(Debug)]
pub struct DijkstraRun<'a, G> {
    graph: &'a G,
    data: &'a mut DijkstraData,
    num_settled_nodes: usize,
    num_relaxed_arcs: usize,
    num_queue_pushs: usize,
}

impl<'a, G: LinkIterable<Link>> DijkstraRun<'a, G> {
    /// Resets `data` and prepares a run without any start nodes.
    pub fn new(graph: &'a G, data: &'a mut DijkstraData) -> Self {
        debug_assert!(data.num_nodes() >= graph.num_nodes());
        data.reset();
        DijkstraRun {
            graph,
            data,
            num_settled_nodes: 0,
            num_relaxed_arcs: 0,
            num_queue_pushs: 0,
        }
    }

    /// Add a start node with an initial label. `key` is the label weight plus the potential of the node.
    pub fn add_source(&mut self, node: NodeId, label: Label, key: Weight) {
        if label.weight < self.data.labels[node as usize].weight {
            self.data.labels.set(node as usize, label);
            self.data.predecessors[node as usize] = (node, INVALID_ID);
            self.data.queue.update_key(State { key, node });
            self.num_queue_pushs += 1;
        }
    }

    /// Remove the node with the smallest key from the queue.
    pub fn pop(&mut self) -> Option<NodeId> {
        let State { node, .. } = self.data.queue.pop()?;
        self.num_settled_nodes += 1;
        Some(node)
    }

    /// Relax all arcs of `node` accepted by `edge_predicate`.
    /// `improve_callback` is called for each head whose label improved.
    /// Heads for which `potential` returns `None` can not reach the target and are not queued.
    pub fn relax<F, I, P>(&mut self, node: NodeId, mut edge_predicate: F, mut improve_callback: I, mut potential: P)
    where
        F: FnMut(&Link) -> bool,
        I: FnMut(NodeId, &Label),
        P: FnMut(NodeId) -> Option<Weight>,
    {
        let graph = self.graph;
        let label = self.data.labels[node as usize];

        for link in graph.link_iter(node) {
            if !edge_predicate(&link) {
                continue;
            }
            self.num_relaxed_arcs += 1;
            let linked = label.link(&link);

            if linked.weight < self.data.labels[link.node as usize].weight {
                self.data.labels.set(link.node as usize, linked);
                self.data.predecessors[link.node as usize] = (node, link.id);
                improve_callback(link.node, &linked);

                if let Some(pot) = potential(link.node) {
                    let next = State {
                        key: linked.weight + pot,
                        node: link.node,
                    };
                    if self.data.queue.contains_index(link.node as usize) {
                        self.data.queue.decrease_key(next);
                    } else {
                        self.num_queue_pushs += 1;
                        self.data.queue.push(next);
                    }
                }
            }
        }
    }

    /// Settle the next node relaxing all its arcs.
    pub fn next_step(&mut self) -> Option<NodeId> {
        self.next_step_with(|_| true, |_| Some(0.0))
    }

    pub fn next_step_with<F, P>(&mut self, edge_predicate: F, potential: P) -> Option<NodeId>
    where
        F: FnMut(&Link) -> bool,
        P: FnMut(NodeId) -> Option<Weight>,
    {
        let node = self.pop()?;
        self.relax(node, edge_predicate, |_, _| (), potential);
        Some(node)
    }

    pub fn tentative_distance(&self, node: NodeId) -> &Label {
        &self.data.labels[node as usize]
    }

    pub fn predecessor(&self, node: NodeId) -> (NodeId, EdgeId) {
        self.data.predecessors[node as usize]
    }

    /// Smallest key in the queue.
    pub fn min_key(&self) -> Option<Weight> {
        self.data.queue.peek().map(|state| state.key)
    }

    pub fn queue_is_empty(&self) -> bool {
        self.data.queue.is_empty()
    }

    pub fn data(&self) -> &DijkstraData {
        &*self.data
    }

    pub fn graph(&self) -> &G {
        self.graph
    }

    pub fn num_settled_nodes(&self) -> usize {
        self.num_settled_nodes
    }

    pub fn num_relaxed_arcs(&self) -> usize {
        self.num_relaxed_arcs
    }

    pub fn num_queue_pushs(&self) -> usize {
        self.num_queue_pushs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(node: NodeId, weight: Weight, id: EdgeId) -> Link {
        Link {
            node,
            weight,
            distance: 2.0 * weight,
            millis: 1,
            id,
        }
    }

    #[test]
    fn settles_in_order_and_tracks_parents() {
        // 0 -> 1 (1), 0 -> 2 (4), 1 -> 2 (2), 2 -> 3 (1)
        let graph = FirstOutGraph::from_adjacency_lists(vec![
            vec![link(1, 1.0, 0), link(2, 4.0, 1)],
            vec![link(2, 2.0, 2)],
            vec![link(3, 1.0, 3)],
            vec![],
        ]);
        let mut data = DijkstraData::new(4);
        let mut run = DijkstraRun::new(&graph, &mut data);
        run.add_source(0, Label::ZERO, 0.0);

        let mut settled = Vec::new();
        while let Some(node) = run.next_step() {
            settled.push(node);
        }
        assert_eq!(settled, vec![0, 1, 2, 3]);
        assert_eq!(
            *run.tentative_distance(3),
            Label {
                weight: 4.0,
                distance: 8.0,
                millis: 3
            }
        );
        assert_eq!(run.num_settled_nodes(), 4);
        assert_eq!(data.arc_path(3), (0, vec![0, 2, 3]));
    }

    #[test]
    fn edge_predicate_filters_arcs() {
        let graph = FirstOutGraph::from_adjacency_lists(vec![vec![link(1, 1.0, 0), link(2, 1.0, 1)], vec![], vec![]]);
        let mut data = DijkstraData::new(3);
        let mut run = DijkstraRun::new(&graph, &mut data);
        run.add_source(0, Label::ZERO, 0.0);
        while run.next_step_with(|link| link.id != 1, |_| Some(0.0)).is_some() {}
        assert!(run.tentative_distance(1).is_reached());
        assert!(!run.tentative_distance(2).is_reached());
    }
}
