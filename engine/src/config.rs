//! Configuration of profiles, preprocessing and queries.
//!
//! All structs can be deserialized from JSON, missing fields take their defaults.
//!
//! ```
//! # use ch_road_router::config::*;
//! let profile: ProfileConfig = serde_json::from_str(r#"{ "name": "car", "mode": "EdgeBased", "weighting": { "kind": "fastest" } }"#).unwrap();
//! assert_eq!(profile.contraction, ContractionParams::default());
//! ```

use crate::algo::{traversal::TraversalMode, weighting::*};
use crate::error::{PreparationError, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path, sync::Arc, time::Duration};

/// Per query search budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryParams {
    /// Abort once this many nodes have been settled (summed over both directions for bidirectional searches).
    pub max_visited_nodes: usize,
    pub timeout_ms: Option<u64>,
    /// Prune nodes in CH queries which can be reached cheaper over a higher node.
    pub stall_on_demand: bool,
}

impl Default for QueryParams {
    fn default() -> Self {
        QueryParams {
            max_visited_nodes: usize::MAX,
            timeout_ms: None,
            stall_on_demand: true,
        }
    }
}

impl QueryParams {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Limits for alternative routes on a contraction hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlternativeParams {
    /// Alternatives weigh at most this times the weight of the best route.
    pub max_weight_factor: f64,
    /// Maximum fraction of an alternative's distance shared with the routes found before it.
    pub max_share_factor: f64,
    /// Around the via node, this fraction of the detour has to be a shortest path.
    pub local_optimality_factor: f64,
    /// Number of routes including the best one.
    pub max_paths: usize,
}

impl Default for AlternativeParams {
    fn default() -> Self {
        AlternativeParams {
            max_weight_factor: 1.25,
            max_share_factor: 0.8,
            local_optimality_factor: 0.25,
            max_paths: 3,
        }
    }
}

/// Shape of a round trip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundTripParams {
    /// Length of the tour in meters as the crow flies.
    pub distance: f64,
    /// Waypoints besides the start.
    pub points: usize,
    pub seed: u64,
    /// Further attempts with another heading after a tour could not be routed.
    pub max_retries: usize,
}

impl Default for RoundTripParams {
    fn default() -> Self {
        RoundTripParams {
            distance: 10_000.0,
            points: 2,
            seed: 0,
            max_retries: 3,
        }
    }
}

/// Parameters of the contraction order heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractionParams {
    pub edge_difference_weight: f32,
    pub original_edges_count_weight: f32,
    pub contracted_neighbors_weight: f32,
    /// Weight of the hierarchy depth, the highest level among already contracted neighbors plus one.
    pub neighbor_level_weight: f32,
    /// Witness searches while computing priorities settle at most `mean degree * factor` nodes.
    pub max_poll_factor_heuristic: f64,
    /// Witness searches while actually contracting settle at most `mean degree * factor` nodes.
    pub max_poll_factor_contraction: f64,
    /// Recompute all priorities every time this percentage of nodes has been contracted. 0 disables.
    pub periodic_updates_percentage: u8,
    /// For the last x% of nodes recompute the priority of a node before contracting it.
    pub last_nodes_lazy_updates_percentage: u8,
    /// Chance in % that a neighbor's priority gets recomputed after a contraction.
    pub neighbor_updates_percentage: u8,
    pub log_messages_percentage: u8,
    /// Seed for the neighbor update sampling.
    pub seed: u64,
}

impl Default for ContractionParams {
    fn default() -> Self {
        ContractionParams {
            edge_difference_weight: 10.0,
            original_edges_count_weight: 1.0,
            contracted_neighbors_weight: 1.0,
            neighbor_level_weight: 1.0,
            max_poll_factor_heuristic: 5.0,
            max_poll_factor_contraction: 200.0,
            periodic_updates_percentage: 0,
            last_nodes_lazy_updates_percentage: 10,
            neighbor_updates_percentage: 100,
            log_messages_percentage: 20,
            seed: 123,
        }
    }
}

impl ContractionParams {
    pub fn validate(&self) -> std::result::Result<(), PreparationError> {
        let percentages = [
            ("periodic_updates_percentage", self.periodic_updates_percentage),
            ("last_nodes_lazy_updates_percentage", self.last_nodes_lazy_updates_percentage),
            ("neighbor_updates_percentage", self.neighbor_updates_percentage),
            ("log_messages_percentage", self.log_messages_percentage),
        ];
        if let Some((name, value)) = percentages.iter().find(|(_, value)| *value > 100) {
            return Err(PreparationError::InvalidParams {
                reason: format!("{} must be in [0, 100] but was {}", name, value),
            });
        }
        if !(self.max_poll_factor_heuristic > 0.0 && self.max_poll_factor_contraction > 0.0) {
            return Err(PreparationError::InvalidParams {
                reason: "max poll factors must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// U-turn handling for edge based profiles.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnCostConfig {
    /// Penalty for U-turns in weight units. `None` forbids U-turns except at dead ends.
    pub u_turn_costs: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightingKind {
    Shortest,
    Fastest,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightingConfig {
    pub kind: WeightingKind,
    #[serde(default)]
    pub turn_costs: TurnCostConfig,
}

impl WeightingConfig {
    pub fn build(&self) -> Arc<dyn Weighting> {
        match self.kind {
            WeightingKind::Shortest => Arc::new(ShortestWeighting::new(self.turn_costs)),
            WeightingKind::Fastest => Arc::new(FastestWeighting::new(self.turn_costs)),
        }
    }
}

/// Everything needed to prepare a contraction hierarchy for one profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub name: String,
    pub weighting: WeightingConfig,
    #[serde(default = "default_mode")]
    pub mode: TraversalMode,
    #[serde(default)]
    pub contraction: ContractionParams,
    #[serde(default)]
    pub query: QueryParams,
}

fn default_mode() -> TraversalMode {
    TraversalMode::NodeBased
}

/// Read any configuration struct from a JSON file.
pub fn load_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let params: ContractionParams = serde_json::from_str(r#"{ "edge_difference_weight": 5.0 }"#).unwrap();
        assert_eq!(params.edge_difference_weight, 5.0);
        assert_eq!(params.seed, 123);

        let query: QueryParams = serde_json::from_str(r#"{ "timeout_ms": 100 }"#).unwrap();
        assert_eq!(query.timeout(), Some(Duration::from_millis(100)));
        assert!(query.stall_on_demand);
    }

    #[test]
    fn rejects_invalid_percentages() {
        let params = ContractionParams {
            neighbor_updates_percentage: 101,
            ..ContractionParams::default()
        };
        assert!(params.validate().is_err());
        assert!(ContractionParams::default().validate().is_ok());
    }

    #[test]
    fn profiles_build_their_weighting() {
        let profile: ProfileConfig =
            serde_json::from_str(r#"{ "name": "bike", "weighting": { "kind": "shortest", "turn_costs": { "u_turn_costs": 40.0 } } }"#).unwrap();
        assert_eq!(profile.mode, TraversalMode::NodeBased);
        assert_eq!(profile.weighting.turn_costs.u_turn_costs, Some(40.0));
        assert_eq!(profile.weighting.build().name(), "shortest(u_turn=40)");
    }
}
