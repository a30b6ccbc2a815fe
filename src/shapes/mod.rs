//! Parametric room shapes and the label registry that selects them

pub mod registry;
pub mod template;

pub use registry::{
    normalize_label, RoomCategory, ShapeAssignment, ShapeLibrary, AREA_KEY, ASPECT_RATIO_KEY,
    MIN_DIMENSION_KEY,
};
pub use template::{Axis, ShapeKind, ShapeTemplate};
