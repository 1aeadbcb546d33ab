use crate::datastr::graph::*;
use crate::error::PreparationError;
use crate::io::*;

/// Position of a node in the contraction order. 0 is the least important node.
pub type Level = NodeId;

/// Contraction order of a graph. Allows efficiently retrieving both the level of a node
/// and the node at a given level, and makes it always clear in which direction the mapping goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeOrder {
    // nodes ascending by importance
    node_order: Vec<NodeId>,
    // level of each node
    levels: Vec<Level>,
}

impl NodeOrder {
    pub fn identity(n: usize) -> NodeOrder {
        NodeOrder {
            node_order: (0..n as NodeId).collect(),
            levels: (0..n as Level).collect(),
        }
    }

    /// Create from the nodes sorted by level.
    /// Fails unless every node in `[0, n)` occurs exactly once.
    pub fn from_node_order(node_order: Vec<NodeId>) -> Result<NodeOrder, PreparationError> {
        let n = node_order.len();
        let mut levels = vec![INVALID_ID; n];

        for (level, &node) in node_order.iter().enumerate() {
            match levels.get_mut(node as usize) {
                Some(entry) if *entry == INVALID_ID => *entry = level as Level,
                Some(_) => {
                    return Err(PreparationError::InvalidNodeOrder {
                        reason: format!("node {} occurs more than once", node),
                    })
                }
                None => {
                    return Err(PreparationError::InvalidNodeOrder {
                        reason: format!("node {} out of range for {} nodes", node, n),
                    })
                }
            }
        }

        Ok(NodeOrder { node_order, levels })
    }

    /// Create from the level of each node.
    /// Fails unless the levels are a permutation of `[0, n)`.
    pub fn from_levels(levels: Vec<Level>) -> Result<NodeOrder, PreparationError> {
        let n = levels.len();
        let mut node_order = vec![INVALID_ID; n];

        for (node, &level) in levels.iter().enumerate() {
            match node_order.get_mut(level as usize) {
                Some(entry) if *entry == INVALID_ID => *entry = node as NodeId,
                Some(_) => {
                    return Err(PreparationError::InvalidNodeOrder {
                        reason: format!("level {} assigned twice", level),
                    })
                }
                None => {
                    return Err(PreparationError::InvalidNodeOrder {
                        reason: format!("level {} of node {} out of range", level, node),
                    })
                }
            }
        }

        Ok(NodeOrder { node_order, levels })
    }

    /// Nodes sorted by level.
    pub fn order(&self) -> &[NodeId] {
        &self.node_order
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn level(&self, node: NodeId) -> Level {
        self.levels[node as usize]
    }

    pub fn node(&self, level: Level) -> NodeId {
        self.node_order[level as usize]
    }

    pub fn len(&self) -> usize {
        self.node_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_order.is_empty()
    }
}

impl Deconstruct for NodeOrder {
    fn store_each(&self, store: &dyn Fn(&str, &dyn Store) -> std::io::Result<()>) -> std::io::Result<()> {
        store("levels", &self.levels)
    }
}
