//! Contraction hierarchies.
//!
//! Preprocessing contracts the nodes of a `TraversalGraph` one by one, least important first,
//! and inserts shortcuts so that distances between the remaining nodes are preserved.
//! The result is the original graph plus all shortcuts and the level of each node.
//!
//! Arcs of the hierarchy are identified by one id space: ids below the number of traversal arcs
//! refer to traversal arcs, shortcut `i` has id `num_original_arcs + i`.
//! A shortcut skips exactly two arcs which always have smaller ids, so unpacking terminates.
//!
//! Queries run on two views: the upward graph with all arcs from lower to higher levels
//! and the downward graph with all arcs from higher to lower levels, reversed.
//! Both are stored at the lower endpoint of each arc and pointing to the higher one.

use super::traversal::{TraversalGraph, TraversalMode};
use crate::datastr::{graph::*, node_order::*};
use crate::error::{Error, QueryError};
use crate::io::*;
use serde::{Deserialize, Serialize};

pub mod contraction_graph;
pub mod preparation;
pub mod query;
pub mod witness_search;

pub use self::preparation::{prepare, prepare_profiles, prepare_with_order};

/// Travel direction of a shortcut relative to its lower endpoint (`base`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutDirection {
    /// from base up to adj
    Forward,
    /// from adj down to base
    Backward,
}

impl ShortcutDirection {
    pub fn to_u8(self) -> u8 {
        match self {
            ShortcutDirection::Forward => 1,
            ShortcutDirection::Backward => 2,
        }
    }

    pub fn from_u8(flags: u8) -> Option<ShortcutDirection> {
        match flags {
            1 => Some(ShortcutDirection::Forward),
            2 => Some(ShortcutDirection::Backward),
            _ => None,
        }
    }
}

/// A shortcut in travel order. `skipped` are the arcs from `from` to the contracted node
/// and from the contracted node to `to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shortcut {
    pub from: NodeId,
    pub to: NodeId,
    pub weight: Weight,
    pub distance: f64,
    pub millis: u64,
    pub skipped: [EdgeId; 2],
}

impl Shortcut {
    pub fn costs(&self) -> Label {
        Label {
            weight: self.weight,
            distance: self.distance,
            millis: self.millis,
        }
    }

    /// Lower endpoint, higher endpoint and travel direction.
    pub fn base_adj_direction(&self, order: &NodeOrder) -> (NodeId, NodeId, ShortcutDirection) {
        if order.level(self.from) < order.level(self.to) {
            (self.from, self.to, ShortcutDirection::Forward)
        } else {
            (self.to, self.from, ShortcutDirection::Backward)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Metadata {
    profile: String,
    mode: TraversalMode,
    num_nodes: usize,
    num_original_arcs: usize,
    num_shortcuts: usize,
}

/// A complete hierarchy: every node has a level. Read only once built.
#[derive(Debug, Clone)]
pub struct ContractionHierarchy {
    profile: String,
    mode: TraversalMode,
    order: NodeOrder,
    num_original_arcs: usize,
    shortcuts: Vec<Shortcut>,
    // tail and head of every arc, original arcs first
    arc_tail: Vec<NodeId>,
    arc_head: Vec<NodeId>,
    forward: FirstOutGraph,
    backward: FirstOutGraph,
}

impl ContractionHierarchy {
    fn build(traversal: &TraversalGraph, order: NodeOrder, shortcuts: Vec<Shortcut>) -> ContractionHierarchy {
        let n = traversal.num_nodes();
        let m = traversal.num_arcs() + shortcuts.len();
        let mut upward: Vec<Vec<Link>> = vec![Vec::new(); n];
        let mut downward: Vec<Vec<Link>> = vec![Vec::new(); n];
        let mut arc_tail = Vec::with_capacity(m);
        let mut arc_head = Vec::with_capacity(m);

        let original_arcs = (0..traversal.num_arcs() as EdgeId).map(|arc| (traversal.arc_tail(arc), traversal.arc(arc)));
        let shortcut_arcs = shortcuts.iter().enumerate().map(|(i, shortcut)| {
            (
                shortcut.from,
                Link {
                    node: shortcut.to,
                    weight: shortcut.weight,
                    distance: shortcut.distance,
                    millis: shortcut.millis,
                    id: (traversal.num_arcs() + i) as EdgeId,
                },
            )
        });

        for (tail, link) in original_arcs.chain(shortcut_arcs) {
            arc_tail.push(tail);
            arc_head.push(link.node);
            if order.level(tail) < order.level(link.node) {
                upward[tail as usize].push(link);
            } else {
                downward[link.node as usize].push(Link { node: tail, ..link });
            }
        }

        ContractionHierarchy {
            profile: traversal.profile(),
            mode: traversal.mode(),
            order,
            num_original_arcs: traversal.num_arcs(),
            shortcuts,
            arc_tail,
            arc_head,
            forward: FirstOutGraph::from_adjacency_lists(upward),
            backward: FirstOutGraph::from_adjacency_lists(downward),
        }
    }

    /// Assemble a hierarchy for `traversal` and check that it is consistent.
    pub fn from_parts(traversal: &TraversalGraph, order: NodeOrder, shortcuts: Vec<Shortcut>) -> Result<ContractionHierarchy, QueryError> {
        if order.len() != traversal.num_nodes() {
            return Err(QueryError::InvalidPreparation {
                reason: format!("{} levels for {} nodes", order.len(), traversal.num_nodes()),
            });
        }
        let ch = Self::build(traversal, order, shortcuts);
        ch.validate().map_err(|reason| QueryError::InvalidPreparation { reason })?;
        Ok(ch)
    }

    /// Check the shortcut invariants: skipped arcs have smaller ids and form a path
    /// over a node below both endpoints, and the costs add up.
    pub fn validate(&self) -> Result<(), String> {
        for (i, shortcut) in self.shortcuts.iter().enumerate() {
            let id = (self.num_original_arcs + i) as EdgeId;
            let [first, second] = shortcut.skipped;
            if first >= id || second >= id {
                return Err(format!("shortcut {} skips arcs {} and {} which are not older", id, first, second));
            }
            if shortcut.from as usize >= self.num_nodes() || shortcut.to as usize >= self.num_nodes() || shortcut.from == shortcut.to {
                return Err(format!("shortcut {} has invalid endpoints {} -> {}", id, shortcut.from, shortcut.to));
            }
            let via = self.arc_head(first);
            if self.arc_tail(first) != shortcut.from || self.arc_tail(second) != via || self.arc_head(second) != shortcut.to {
                return Err(format!("skipped arcs of shortcut {} do not form a path from {} to {}", id, shortcut.from, shortcut.to));
            }
            if self.order.level(via) >= self.order.level(shortcut.from).min(self.order.level(shortcut.to)) {
                return Err(format!("shortcut {} skips node {} which is not below its endpoints", id, via));
            }
            let skipped_costs = self.arc_costs(first) + self.arc_costs(second);
            if skipped_costs.weight != shortcut.weight {
                return Err(format!(
                    "weight {} of shortcut {} differs from skipped weight {}",
                    shortcut.weight, id, skipped_costs.weight
                ));
            }
        }
        Ok(())
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn mode(&self) -> TraversalMode {
        self.mode
    }

    pub fn order(&self) -> &NodeOrder {
        &self.order
    }

    pub fn level(&self, node: NodeId) -> Level {
        self.order.level(node)
    }

    pub fn num_nodes(&self) -> usize {
        self.order.len()
    }

    pub fn num_original_arcs(&self) -> usize {
        self.num_original_arcs
    }

    pub fn num_arcs(&self) -> usize {
        self.arc_tail.len()
    }

    pub fn shortcuts(&self) -> &[Shortcut] {
        &self.shortcuts
    }

    /// Upward graph, arcs from lower to higher levels.
    pub fn forward(&self) -> &FirstOutGraph {
        &self.forward
    }

    /// Downward graph reversed, arcs from higher to lower levels stored at their head.
    pub fn backward(&self) -> &FirstOutGraph {
        &self.backward
    }

    pub fn is_shortcut(&self, arc: EdgeId) -> bool {
        arc as usize >= self.num_original_arcs
    }

    pub fn arc_tail(&self, arc: EdgeId) -> NodeId {
        self.arc_tail[arc as usize]
    }

    pub fn arc_head(&self, arc: EdgeId) -> NodeId {
        self.arc_head[arc as usize]
    }

    fn arc_costs(&self, arc: EdgeId) -> Label {
        let tail = self.arc_tail(arc);
        let head = self.arc_head(arc);
        let link = if self.order.level(tail) < self.order.level(head) {
            self.forward.link_iter(tail).find(|link| link.id == arc)
        } else {
            self.backward.link_iter(head).find(|link| link.id == arc)
        };
        link.map(|link| link.costs()).unwrap_or(Label::UNREACHED)
    }

    /// Append the traversal arcs `arc` stands for to `path`, in travel order.
    pub fn unpack_arc(&self, arc: EdgeId, path: &mut Vec<EdgeId>) {
        let mut stack = vec![arc];
        while let Some(arc) = stack.pop() {
            if self.is_shortcut(arc) {
                let [first, second] = self.shortcuts[arc as usize - self.num_original_arcs].skipped;
                stack.push(second);
                stack.push(first);
            } else {
                path.push(arc);
            }
        }
    }

    /// Hierarchy arcs to traversal arcs.
    pub fn unpack(&self, arcs: &[EdgeId]) -> Vec<EdgeId> {
        let mut path = Vec::with_capacity(arcs.len());
        for &arc in arcs {
            self.unpack_arc(arc, &mut path);
        }
        path
    }

    fn metadata(&self) -> Metadata {
        Metadata {
            profile: self.profile.clone(),
            mode: self.mode,
            num_nodes: self.num_nodes(),
            num_original_arcs: self.num_original_arcs,
            num_shortcuts: self.shortcuts.len(),
        }
    }
}

impl Deconstruct for ContractionHierarchy {
    fn store_each(&self, store: &dyn Fn(&str, &dyn Store) -> std::io::Result<()>) -> std::io::Result<()> {
        let metadata = serde_json::to_vec_pretty(&self.metadata()).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        store("ch_metadata.json", &metadata)?;
        self.order.store_each(store)?;

        let mut base = Vec::with_capacity(self.shortcuts.len());
        let mut adj = Vec::with_capacity(self.shortcuts.len());
        let mut direction = Vec::with_capacity(self.shortcuts.len());
        for shortcut in &self.shortcuts {
            let (b, a, d) = shortcut.base_adj_direction(&self.order);
            base.push(b);
            adj.push(a);
            direction.push(d.to_u8());
        }
        store("shortcut_base", &base)?;
        store("shortcut_adj", &adj)?;
        store("shortcut_direction", &direction)?;
        store("shortcut_weight", &self.shortcuts.iter().map(|s| s.weight).collect::<Vec<_>>())?;
        store("shortcut_distance", &self.shortcuts.iter().map(|s| s.distance).collect::<Vec<_>>())?;
        store("shortcut_millis", &self.shortcuts.iter().map(|s| s.millis).collect::<Vec<_>>())?;
        store("shortcut_skipped_first", &self.shortcuts.iter().map(|s| s.skipped[0]).collect::<Vec<_>>())?;
        store("shortcut_skipped_second", &self.shortcuts.iter().map(|s| s.skipped[1]).collect::<Vec<_>>())?;
        Ok(())
    }
}

fn invalid(reason: String) -> Error {
    Error::Query(QueryError::InvalidPreparation { reason })
}

impl<'g> ReconstructPrepared<ContractionHierarchy> for &'g TraversalGraph {
    type Error = Error;

    fn reconstruct_with(self, loader: Loader) -> Result<ContractionHierarchy, Error> {
        let metadata: Metadata = serde_json::from_slice(&loader.load::<Vec<u8>, _>("ch_metadata.json")?)?;
        if metadata.profile != self.profile() {
            return Err(invalid(format!(
                "hierarchy was prepared for profile {} but the graph is {}",
                metadata.profile,
                self.profile()
            )));
        }
        if metadata.num_nodes != self.num_nodes() || metadata.num_original_arcs != self.num_arcs() {
            return Err(invalid(format!(
                "hierarchy was prepared for {} nodes and {} arcs but the graph has {} and {}",
                metadata.num_nodes,
                metadata.num_original_arcs,
                self.num_nodes(),
                self.num_arcs()
            )));
        }

        let levels: Vec<Level> = loader.load("levels")?;
        let order = NodeOrder::from_levels(levels).map_err(|e| invalid(e.to_string()))?;

        let base: Vec<NodeId> = loader.load("shortcut_base")?;
        let adj: Vec<NodeId> = loader.load("shortcut_adj")?;
        let direction: Vec<u8> = loader.load("shortcut_direction")?;
        let weight: Vec<Weight> = loader.load("shortcut_weight")?;
        let distance: Vec<f64> = loader.load("shortcut_distance")?;
        let millis: Vec<u64> = loader.load("shortcut_millis")?;
        let skipped_first: Vec<EdgeId> = loader.load("shortcut_skipped_first")?;
        let skipped_second: Vec<EdgeId> = loader.load("shortcut_skipped_second")?;

        let m = metadata.num_shortcuts;
        let lengths = [
            base.len(),
            adj.len(),
            direction.len(),
            weight.len(),
            distance.len(),
            millis.len(),
            skipped_first.len(),
            skipped_second.len(),
        ];
        if lengths.iter().any(|&len| len != m) {
            return Err(invalid(format!("shortcut arrays do not all have {} entries", m)));
        }

        let mut shortcuts = Vec::with_capacity(m);
        for i in 0..m {
            if base[i] as usize >= order.len() || adj[i] as usize >= order.len() || order.level(base[i]) >= order.level(adj[i]) {
                return Err(invalid(format!("base of shortcut {} is not below its adj", i)));
            }
            let (from, to) = match ShortcutDirection::from_u8(direction[i]) {
                Some(ShortcutDirection::Forward) => (base[i], adj[i]),
                Some(ShortcutDirection::Backward) => (adj[i], base[i]),
                None => return Err(invalid(format!("invalid direction flags {} of shortcut {}", direction[i], i))),
            };
            shortcuts.push(Shortcut {
                from,
                to,
                weight: weight[i],
                distance: distance[i],
                millis: millis[i],
                skipped: [skipped_first[i], skipped_second[i]],
            });
        }

        let ch = ContractionHierarchy::from_parts(self, order, shortcuts)?;
        log::info!("loaded hierarchy for {} with {} shortcuts", ch.profile(), ch.shortcuts().len());
        Ok(ch)
    }
}
