//! Query servers for the different Dijkstra variants

use super::*;
use crate::algo::{a_star::*, check_query, connection_not_found, traversal::TraversalGraph, *};
use crate::config::QueryParams;
use crate::error::QueryError;

pub mod bidirectional_dijkstra;
pub mod dijkstra;
