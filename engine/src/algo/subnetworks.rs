//! Weakly connected components.
//!
//! Nodes in different components can never be connected, no matter the direction.
//! Queries use this to tell "different subnetworks" apart from other reasons for missing routes.

use crate::datastr::graph::*;

/// Component id for each of the first `n` nodes of `graph`, ids are dense and start at 0.
pub fn weakly_connected_components(n: usize, graph: &FirstOutGraph) -> Vec<u32> {
    let mut parent: Vec<u32> = (0..n as u32).collect();

    for node in 0..graph.num_nodes().min(n) as NodeId {
        for link in graph.link_iter(node) {
            if (link.node as usize) < n {
                union(&mut parent, node, link.node);
            }
        }
    }

    let mut component_ids = vec![INVALID_ID; n];
    let mut num_components = 0;
    (0..n as u32)
        .map(|node| {
            let root = find(&mut parent, node) as usize;
            if component_ids[root] == INVALID_ID {
                component_ids[root] = num_components;
                num_components += 1;
            }
            component_ids[root]
        })
        .collect()
}

fn find(parent: &mut [u32], mut node: u32) -> u32 {
    while parent[node as usize] != node {
        // path halving
        let grand_parent = parent[parent[node as usize] as usize];
        parent[node as usize] = grand_parent;
        node = grand_parent;
    }
    node
}

fn union(parent: &mut [u32], a: u32, b: u32) {
    let a = find(parent, a);
    let b = find(parent, b);
    if a != b {
        parent[a.max(b) as usize] = a.min(b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_way_arcs_connect_weakly() {
        let link = |node| Link {
            node,
            weight: 1.0,
            distance: 1.0,
            millis: 1,
            id: 0,
        };
        // 0 -> 1, 2 -> 1, 3 isolated
        let graph = FirstOutGraph::from_adjacency_lists(vec![vec![link(1)], vec![], vec![link(1)], vec![]]);
        assert_eq!(weakly_connected_components(4, &graph), vec![0, 0, 0, 1]);
    }
}
