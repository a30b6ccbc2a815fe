//! Planar polygon geometry used by the solver.
//!
//! Polygons are simple rings stored without a closing vertex. Construction
//! normalises orientation to counter-clockwise, so outward normals and edge
//! indices are stable for a given template. Area, centroid and distance
//! queries go through `geo`; overlap area is a boolean intersection computed
//! with `i_overlay`.

use geo::{Area, Centroid, Coord, EuclideanDistance, LineString, Winding};
use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use serde::Serialize;

use crate::shapes::Axis;

use super::types::{BoundingBox, Point};

/// Tolerance for degenerate-geometry tests (lengths, areas, cross products)
pub const GEOMETRY_EPSILON: f64 = 1e-9;

/// Unit direction vectors whose cross product is below this are parallel
const PARALLEL_EPSILON: f64 = 1e-6;

/// A directed line segment; polygon edges run counter-clockwise
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    pub fn vector(&self) -> Point {
        self.end - self.start
    }

    pub fn length(&self) -> f64 {
        self.vector().length()
    }

    pub fn midpoint(&self) -> Point {
        (self.start + self.end) * 0.5
    }

    pub fn direction(&self) -> Point {
        self.vector().normalized()
    }

    /// Outward normal, assuming the segment is an edge of a CCW polygon
    pub fn outward_normal(&self) -> Point {
        self.direction().perp_cw()
    }

    /// Axis this segment runs along, if it is axis-aligned within
    /// `PARALLEL_EPSILON`
    pub fn axis(&self) -> Option<Axis> {
        let d = self.direction();
        if d.y.abs() < PARALLEL_EPSILON {
            Some(Axis::X)
        } else if d.x.abs() < PARALLEL_EPSILON {
            Some(Axis::Y)
        } else {
            None
        }
    }

    /// Length along which `other` lies on this segment's line, counting
    /// only when the two are parallel and within `tolerance` of each other
    pub fn collinear_overlap(&self, other: &Segment, tolerance: f64) -> f64 {
        let dir = self.direction();
        if dir.cross(other.direction()).abs() > PARALLEL_EPSILON {
            return 0.0;
        }
        let normal = dir.perp_cw();
        let off_start = (other.start - self.start).dot(normal).abs();
        let off_end = (other.end - self.start).dot(normal).abs();
        if off_start > tolerance || off_end > tolerance {
            return 0.0;
        }
        let t0 = (other.start - self.start).dot(dir);
        let t1 = (other.end - self.start).dot(dir);
        let overlap = self.length().min(t0.max(t1)) - t0.min(t1).max(0.0);
        overlap.max(0.0)
    }
}

fn to_coords(vertices: &[Point]) -> Vec<Coord<f64>> {
    vertices.iter().map(|p| Coord { x: p.x, y: p.y }).collect()
}

fn to_geo(vertices: &[Point]) -> geo::Polygon<f64> {
    geo::Polygon::new(LineString::from(to_coords(vertices)), vec![])
}

/// Unsigned area enclosed by a ring of vertices
pub fn ring_area(vertices: &[Point]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }
    to_geo(vertices).unsigned_area()
}

/// A simple polygon with counter-clockwise vertices
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Polygon {
    vertices: Vec<Point>,
    #[serde(skip)]
    shape: geo::Polygon<f64>,
}

impl Polygon {
    /// Build a polygon, reversing clockwise input
    pub fn new(mut vertices: Vec<Point>) -> Self {
        let mut shape = to_geo(&vertices);
        if shape.exterior().is_cw() {
            vertices.reverse();
            shape = to_geo(&vertices);
        }
        Self { vertices, shape }
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn is_counter_clockwise(&self) -> bool {
        self.shape.exterior().is_ccw()
    }

    pub fn area(&self) -> f64 {
        self.shape.unsigned_area()
    }

    /// Area-weighted centroid; the origin for an empty ring
    pub fn centroid(&self) -> Point {
        self.shape
            .centroid()
            .map(|c| Point::new(c.x(), c.y()))
            .unwrap_or(Point::ORIGIN)
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.vertices).unwrap_or(BoundingBox::new(0.0, 0.0, 0.0, 0.0))
    }

    /// Edge `i` runs from vertex `i` to vertex `i + 1`
    pub fn edge(&self, i: usize) -> Segment {
        let n = self.vertices.len();
        if n == 0 {
            return Segment::new(Point::ORIGIN, Point::ORIGIN);
        }
        Segment::new(self.vertices[i % n], self.vertices[(i + 1) % n])
    }

    pub fn edges(&self) -> impl Iterator<Item = Segment> + '_ {
        (0..self.vertices.len()).map(move |i| self.edge(i))
    }

    /// Smallest distance between the two boundaries; 0 when they touch or
    /// cross
    pub fn boundary_distance(&self, other: &Polygon) -> f64 {
        if self.is_empty() || other.is_empty() {
            return f64::INFINITY;
        }
        self.shape.exterior().euclidean_distance(other.shape.exterior())
    }

    /// Total length of wall the two polygons share, within `tolerance`
    pub fn shared_boundary_length(&self, other: &Polygon, tolerance: f64) -> f64 {
        self.edges()
            .flat_map(|e| other.edges().map(move |f| e.collinear_overlap(&f, tolerance)))
            .sum()
    }

    /// Area of the region covered by both polygons
    pub fn intersection_area(&self, other: &Polygon) -> f64 {
        if self.len() < 3 || other.len() < 3 {
            return 0.0;
        }
        if !self.bounding_box().intersects(&other.bounding_box()) {
            return 0.0;
        }
        let subject: Vec<[f64; 2]> = self.vertices.iter().map(|p| [p.x, p.y]).collect();
        let clip: Vec<[f64; 2]> = other.vertices.iter().map(|p| [p.x, p.y]).collect();
        let shapes = subject.overlay(&[clip], OverlayRule::Intersect, FillRule::NonZero);

        shapes
            .into_iter()
            .filter_map(|mut contours| {
                if contours.is_empty() {
                    return None;
                }
                let holes = contours
                    .split_off(1)
                    .into_iter()
                    .map(LineString::from)
                    .collect();
                let outer = contours.pop()?;
                Some(geo::Polygon::new(LineString::from(outer), holes).unsigned_area())
            })
            .sum()
    }
}
