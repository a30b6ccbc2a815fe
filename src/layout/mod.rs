//! Layout engine turning room graphs into placed polygons
//!
//! The optimizer drives everything else: initial placement scatters the
//! rooms, the edge aligner pulls adjacent rooms wall to wall, and the
//! overlap resolver pushes apart rooms that should not touch. `lint`
//! re-checks a finished layout independently of the solver.

pub mod alignment;
pub mod config;
pub mod geometry;
pub mod lint;
pub mod optimizer;
pub mod overlap;
pub mod placement;
pub mod solver;
pub mod transform;
pub mod types;

pub use alignment::{Alignment, EdgeAligner, EdgePair};
pub use config::{PlacementStrategy, SolverConfig};
pub use geometry::{Polygon, Segment};
pub use lint::{LintCategory, LintWarning};
pub use optimizer::{LayoutOptimizer, LayoutSnapshot, OptimizerRun, OptimizerState, PassReport};
pub use overlap::{Overlap, OverlapResolver};
pub use placement::{compute_initial_positions, Footprint};
pub use solver::SolverError;
pub use transform::RotationTransform;
pub use types::*;
