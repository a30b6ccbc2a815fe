//! Core types for the layout solver

use std::collections::BTreeMap;
use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::graph::{AdjacencyEdge, Metadata, RoomSpec};
use crate::shapes::{ShapeKind, ShapeTemplate};

use super::geometry::Polygon;
use super::transform::{normalize_degrees, RotationTransform};

/// A 2D point (or vector) in plan coordinates, meters, y pointing up
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product
    pub fn cross(self, other: Point) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Point) -> f64 {
        (self - other).length()
    }

    /// Unit vector in the same direction, or zero for a zero vector
    pub fn normalized(self) -> Point {
        let len = self.length();
        if len < f64::EPSILON {
            Point::ORIGIN
        } else {
            Point::new(self.x / len, self.y / len)
        }
    }

    /// Rotate a direction vector 90° clockwise
    pub fn perp_cw(self) -> Point {
        Point::new(self.y, -self.x)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

/// Axis-aligned bounding box; `(x, y)` is the lower-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Box of the given size centered on `center`
    pub fn centered(center: Point, width: f64, height: f64) -> Self {
        Self::new(
            center.x - width / 2.0,
            center.y - height / 2.0,
            width,
            height,
        )
    }

    /// Smallest box containing every point; `None` for an empty slice
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut min, mut max) = (*first, *first);
        for p in &points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some(Self::new(min.x, min.y, max.x - min.x, max.y - min.y))
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Strict overlap test; touching boxes do not intersect
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.top()
            && self.top() > other.y
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let top = self.top().max(other.top());
        BoundingBox::new(x, y, right - x, top - y)
    }
}

/// Area and dimension limits a room's shape must respect while the
/// optimizer resizes it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShapeBounds {
    pub min_area: f64,
    pub max_area: f64,
    pub aspect_ratio_range: (f64, f64),
    pub min_dimension: f64,
}

impl ShapeBounds {
    /// Bounds around the room's target area, widened by `area_tolerance`
    /// (a fraction, 0.05 = ±5%)
    pub fn for_room(spec: &RoomSpec, area_tolerance: f64) -> Self {
        Self {
            min_area: spec.target_area * (1.0 - area_tolerance),
            max_area: spec.target_area * (1.0 + area_tolerance),
            aspect_ratio_range: spec.aspect_ratio_range,
            min_dimension: spec.min_dimension,
        }
    }

    pub fn contains_area(&self, area: f64) -> bool {
        area >= self.min_area - 1e-9 && area <= self.max_area + 1e-9
    }
}

/// A template placed in the plan.
///
/// Instances are never mutated in place: every transformation returns a new
/// instance whose polygon is regenerated from the template, anchor and
/// rotation, so the polygon can never drift from its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeInstance {
    pub room_id: String,
    pub template: ShapeTemplate,
    pub anchor: Point,
    /// Degrees counter-clockwise about the anchor, in (-180, 180]
    pub rotation: f64,
    pub fixed: bool,
    pub bounds: ShapeBounds,
    polygon: Polygon,
}

impl ShapeInstance {
    pub fn new(
        room_id: impl Into<String>,
        template: ShapeTemplate,
        anchor: Point,
        rotation: f64,
        bounds: ShapeBounds,
    ) -> Self {
        let rotation = normalize_degrees(rotation);
        let polygon = template.generate_polygon(anchor, rotation);
        Self {
            room_id: room_id.into(),
            template,
            anchor,
            rotation,
            fixed: false,
            bounds,
            polygon,
        }
    }

    /// Mark this instance as the immovable reference of the layout
    pub fn with_fixed(mut self, fixed: bool) -> Self {
        self.fixed = fixed;
        self
    }

    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    pub fn area(&self) -> f64 {
        self.polygon.area()
    }

    pub fn translated(&self, offset: Point) -> Self {
        self.rebuild(self.template.clone(), self.anchor + offset, self.rotation)
    }

    /// Rotate about the anchor by `delta` degrees counter-clockwise
    pub fn rotated_by(&self, delta: f64) -> Self {
        self.rebuild(self.template.clone(), self.anchor, self.rotation + delta)
    }

    /// Swap the template keeping anchor and rotation
    pub fn with_template(&self, template: ShapeTemplate) -> Self {
        self.rebuild(template, self.anchor, self.rotation)
    }

    /// Largest distance any vertex moved between `previous` and `self`.
    ///
    /// Vertex lists of different length (a template kind change) count as
    /// an unbounded move.
    pub fn displacement_from(&self, previous: &ShapeInstance) -> f64 {
        let now = self.polygon.vertices();
        let before = previous.polygon.vertices();
        if now.len() != before.len() {
            return f64::INFINITY;
        }
        now.iter()
            .zip(before)
            .map(|(a, b)| a.distance(*b))
            .fold(0.0, f64::max)
    }

    /// Transform carrying template-local coordinates into the plan
    pub fn rotation_transform(&self) -> RotationTransform {
        RotationTransform::new(self.rotation, self.anchor)
    }

    fn rebuild(&self, template: ShapeTemplate, anchor: Point, rotation: f64) -> Self {
        let mut next = ShapeInstance::new(
            self.room_id.clone(),
            template,
            anchor,
            rotation,
            self.bounds,
        );
        next.fixed = self.fixed;
        next
    }
}

/// Non-fatal conditions reported alongside a layout
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Signal {
    /// The label matched no known room category; a generic rectangle was used
    ShapeAssignmentFallback { room_id: String, label: String },
    /// Two adjacent rooms could not be fully aligned within their bounds
    InfeasibleConstraint {
        room_a: String,
        room_b: String,
        reason: Infeasibility,
    },
    /// The iteration budget ran out before the layout settled
    NonConvergence {
        iterations: usize,
        max_displacement: f64,
    },
}

/// Why an alignment could not be completed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "cause", rename_all = "snake_case")]
pub enum Infeasibility {
    /// Wall lengths still differ after resizing within area/aspect bounds
    LengthMismatch {
        reference_length: f64,
        movable_length: f64,
    },
    /// The movable wall is not parallel to a template axis, so it cannot be
    /// resized along a single dimension
    SlantedEdge { edge_index: usize },
    /// The constraint system for the resize had no solution
    Unsatisfiable { reason: String },
    /// No seat on any wall pair keeps the movable room off the reference
    ReferenceOverlap { area: f64 },
}

/// A translation the overlap resolver wants applied to one room
#[derive(Debug, Clone, PartialEq)]
pub struct Displacement {
    pub room_id: String,
    pub offset: Point,
}

/// One room of a finished layout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedRoom {
    pub id: String,
    pub label: String,
    pub shape: ShapeKind,
    /// Counter-clockwise outline in plan coordinates
    pub vertices: Vec<Point>,
    pub area: f64,
    pub target_area: f64,
    pub anchor: Point,
    pub rotation: f64,
    pub fixed: bool,
    pub metadata: Metadata,
}

impl PlacedRoom {
    pub fn polygon(&self) -> Polygon {
        Polygon::new(self.vertices.clone())
    }
}

/// Summary of a solver run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutMetadata {
    pub total_area: f64,
    pub room_count: usize,
    pub converged: bool,
    pub iterations_used: usize,
    pub signals: Vec<Signal>,
}

/// Final output: every room placed, with the adjacencies it was solved for
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedLayout {
    pub rooms: BTreeMap<String, PlacedRoom>,
    pub adjacencies: Vec<AdjacencyEdge>,
    pub metadata: LayoutMetadata,
}

impl PlacedLayout {
    pub fn room(&self, id: &str) -> Option<&PlacedRoom> {
        self.rooms.get(id)
    }

    /// Converged with no unmet alignment constraints
    pub fn is_fully_satisfied(&self) -> bool {
        self.metadata.converged
            && !self
                .metadata
                .signals
                .iter()
                .any(|s| matches!(s, Signal::InfeasibleConstraint { .. }))
    }

    /// Room pairs flagged as infeasible, in the order they were reported
    pub fn infeasible_pairs(&self) -> Vec<(&str, &str)> {
        self.metadata
            .signals
            .iter()
            .filter_map(|s| match s {
                Signal::InfeasibleConstraint { room_a, room_b, .. } => {
                    Some((room_a.as_str(), room_b.as_str()))
                }
                _ => None,
            })
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
