//! Goal directed search.
//!
//! A potential estimates the remaining weight from a road node to the current target.
//! Searches queue nodes by tentative weight plus potential.
//! Potentials have to be feasible, otherwise the first settled target is not necessarily the closest one.

use crate::datastr::graph::*;

pub trait Potential {
    /// Prepare estimates towards road node `target`.
    fn init(&mut self, target: NodeId);
    /// Lower bound of the weight from road node `node` to the target, `None` if the target can not be reached.
    fn potential(&mut self, node: NodeId) -> Option<Weight>;
}

/// No estimate at all, which turns A* into Dijkstra.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroPotential;

impl Potential for ZeroPotential {
    fn init(&mut self, _target: NodeId) {}

    fn potential(&mut self, _node: NodeId) -> Option<Weight> {
        Some(0.0)
    }
}

impl<P: Potential + ?Sized> Potential for Box<P> {
    fn init(&mut self, target: NodeId) {
        (**self).init(target)
    }

    fn potential(&mut self, node: NodeId) -> Option<Weight> {
        (**self).potential(node)
    }
}
