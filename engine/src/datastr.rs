//! Data structures shared by the routing algorithms.

pub mod float_heap;
pub mod graph;
pub mod index_heap;
pub mod node_order;
pub mod timestamped_vector;
