//! Floorplan Solver - geometric layout of room adjacency graphs
//!
//! This library turns a graph of rooms (nodes labelled "Kitchen",
//! "Bedroom", ...) and adjacencies into a floor plan of non-overlapping
//! polygons in which adjacent rooms share a wall.
//!
//! # Example
//!
//! ```rust
//! use floorplan_solver::{solve, LayoutGraph, RoomSpec};
//!
//! let graph = LayoutGraph::new()
//!     .with_room(RoomSpec::new("entry", "Entrance", 4.0))
//!     .with_room(RoomSpec::new("kitchen", "Kitchen", 8.0))
//!     .with_edge("entry", "kitchen");
//!
//! let layout = solve(&graph).unwrap();
//! assert_eq!(layout.rooms.len(), 2);
//! ```

pub mod error;
pub mod graph;
pub mod layout;
pub mod shapes;
pub mod variation;

pub use error::{ConfigError, GraphError};
pub use graph::{AdjacencyEdge, LayoutGraph, MetaValue, Metadata, RoomGraph, RoomSpec};
pub use layout::{
    LayoutOptimizer, PlacedLayout, PlacedRoom, PlacementStrategy, Point, Signal, SolverConfig,
};
pub use shapes::{ShapeKind, ShapeLibrary, ShapeTemplate};
pub use variation::{
    generate_variations, generate_variations_parallel, VariationConfig, VariationGenerator,
};

use thiserror::Error;

/// Errors that can occur between reading input and producing a layout
#[derive(Debug, Error)]
pub enum SolveError {
    /// The graph is malformed
    #[error("invalid layout graph: {0}")]
    Graph(#[from] GraphError),

    /// A graph or configuration file could not be read
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The layout could not be serialized
    #[error("failed to serialize layout: {0}")]
    Json(#[from] serde_json::Error),
}

/// Solve a graph with the default configuration and shape library
pub fn solve(graph: &LayoutGraph) -> Result<PlacedLayout, SolveError> {
    solve_with_config(graph, &SolverConfig::default())
}

/// Solve a graph with a custom configuration
///
/// # Example
///
/// ```rust
/// use floorplan_solver::{solve_with_config, LayoutGraph, PlacementStrategy, RoomSpec, SolverConfig};
///
/// let graph = LayoutGraph::new()
///     .with_room(RoomSpec::new("a", "Bedroom", 12.0))
///     .with_room(RoomSpec::new("b", "Bathroom", 4.5))
///     .with_edge("a", "b");
/// let config = SolverConfig::new()
///     .with_max_iterations(80)
///     .with_placement(PlacementStrategy::Spring);
///
/// let layout = solve_with_config(&graph, &config).unwrap();
/// assert!(layout.room("b").is_some());
/// ```
pub fn solve_with_config(
    graph: &LayoutGraph,
    config: &SolverConfig,
) -> Result<PlacedLayout, SolveError> {
    let layout = LayoutOptimizer::new(config.clone()).optimize(graph)?;
    Ok(layout)
}
