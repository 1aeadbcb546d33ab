//! A routing engine built around contraction hierarchies.
//!
//! The crate contains a static road graph store, pluggable weightings,
//! node and edge based (turn aware) search graphs, Dijkstra, bidirectional Dijkstra and A*
//! baselines, contraction hierarchy preprocessing and queries and distance matrices on top of all of those.
//!
//! Most of the interesting stuff lives in `algo`, the data structures are in `datastr`.

#[macro_use]
pub mod report;
pub mod algo;
pub mod cli;
pub mod config;
pub mod datastr;
pub mod error;
pub mod io;

#[allow(dead_code)]
mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub use crate::error::{Error, PreparationError, QueryError, Result};
