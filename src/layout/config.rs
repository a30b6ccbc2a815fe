//! Configuration for the layout solver

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How rooms are scattered before alignment starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStrategy {
    /// Breadth-first walk from the anchor, placing each neighbour beside
    /// its parent
    #[default]
    BreadthFirst,
    /// Force-directed (Fruchterman–Reingold) embedding rescaled to room size
    Spring,
}

/// Tunables for a solver run.
///
/// Every field has a default, so a TOML file only needs the keys it
/// changes:
///
/// ```toml
/// max_iterations = 80
/// placement = "spring"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    /// Alignment passes before giving up
    pub max_iterations: usize,

    /// Largest per-room vertex move (m) in a pass that still counts as
    /// converged
    pub convergence_threshold: f64,

    /// Fractional slack on each room's target area (0.05 = ±5%)
    pub area_tolerance: f64,

    /// Wall lengths closer than this (m) are not resized
    pub length_tolerance: f64,

    /// Distance (m) under which two walls count as touching
    pub gap_tolerance: f64,

    /// Overlap area (m²) ignored by the overlap resolver
    pub overlap_tolerance: f64,

    /// Overlap push per pass, as a fraction of the room's minimum dimension
    pub overlap_step_factor: f64,

    /// Initial placement strategy
    pub placement: PlacementStrategy,

    /// Gap (m) between disconnected components in the initial placement
    pub component_gap: f64,

    /// Iterations of the force-directed embedding
    pub spring_iterations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            convergence_threshold: 0.01,
            area_tolerance: 0.05,
            length_tolerance: 0.05,
            gap_tolerance: 0.01,
            overlap_tolerance: 0.01,
            overlap_step_factor: 0.25,
            placement: PlacementStrategy::BreadthFirst,
            component_gap: 1.0,
            spring_iterations: 100,
        }
    }
}

impl SolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_convergence_threshold(mut self, threshold: f64) -> Self {
        self.convergence_threshold = threshold;
        self
    }

    pub fn with_area_tolerance(mut self, tolerance: f64) -> Self {
        self.area_tolerance = tolerance;
        self
    }

    pub fn with_length_tolerance(mut self, tolerance: f64) -> Self {
        self.length_tolerance = tolerance;
        self
    }

    pub fn with_placement(mut self, placement: PlacementStrategy) -> Self {
        self.placement = placement;
        self
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SolverConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("convergence_threshold", self.convergence_threshold),
            ("length_tolerance", self.length_tolerance),
            ("gap_tolerance", self.gap_tolerance),
            ("overlap_tolerance", self.overlap_tolerance),
            ("overlap_step_factor", self.overlap_step_factor),
        ];
        for (key, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::invalid(key, format!("must be positive, got {value}")));
            }
        }
        if !(0.0..1.0).contains(&self.area_tolerance) {
            return Err(ConfigError::invalid(
                "area_tolerance",
                format!("must be in [0, 1), got {}", self.area_tolerance),
            ));
        }
        if !(self.component_gap.is_finite() && self.component_gap >= 0.0) {
            return Err(ConfigError::invalid(
                "component_gap",
                format!("must be non-negative, got {}", self.component_gap),
            ));
        }
        Ok(())
    }
}
