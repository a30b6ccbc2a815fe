//! Parametric room outlines
//!
//! A template is resolution-independent: it knows its dimensions but not
//! where it sits. Outlines are produced in a local frame centered on the
//! template's bounding box, which is also the anchor a [`ShapeInstance`]
//! rotates about.
//!
//! [`ShapeInstance`]: crate::layout::ShapeInstance

use serde::{Deserialize, Serialize};

use crate::layout::geometry::{ring_area, Polygon, GEOMETRY_EPSILON};
use crate::layout::transform::RotationTransform;
use crate::layout::types::{BoundingBox, Point};

/// Template-local axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn other(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }
}

/// Discriminant of [`ShapeTemplate`], for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Rectangle,
    LShape,
    Polygon,
}

/// A room outline template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeTemplate {
    Rectangle {
        width: f64,
        height: f64,
    },
    /// Two rectangular arms sharing the corner at the local origin: arm 1
    /// runs along +x (`arm1_length` long, `arm1_width` deep), arm 2 along +y
    /// (`arm2_length` long, `arm2_width` deep)
    LShape {
        arm1_width: f64,
        arm1_length: f64,
        arm2_width: f64,
        arm2_length: f64,
    },
    /// Arbitrary simple outline; offsets are relative to any local origin
    Polygon { vertices: Vec<Point> },
}

impl ShapeTemplate {
    pub fn rectangle(width: f64, height: f64) -> Self {
        Self::Rectangle { width, height }
    }

    /// Rectangle of the given area whose width/height ratio is `aspect`
    pub fn rectangle_with_area(area: f64, aspect: f64) -> Self {
        let height = (area / aspect).sqrt();
        Self::Rectangle {
            width: aspect * height,
            height,
        }
    }

    pub fn l_shape(arm1_width: f64, arm1_length: f64, arm2_width: f64, arm2_length: f64) -> Self {
        Self::LShape {
            arm1_width,
            arm1_length,
            arm2_width,
            arm2_length,
        }
    }

    pub fn polygon(vertices: Vec<Point>) -> Self {
        Self::Polygon { vertices }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Rectangle { .. } => ShapeKind::Rectangle,
            Self::LShape { .. } => ShapeKind::LShape,
            Self::Polygon { .. } => ShapeKind::Polygon,
        }
    }

    /// Dimensions are positive and the outline encloses area
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Rectangle { width, height } => *width > 0.0 && *height > 0.0,
            Self::LShape {
                arm1_width,
                arm1_length,
                arm2_width,
                arm2_length,
            } => {
                *arm1_width > 0.0
                    && *arm2_width > 0.0
                    && arm1_length > arm2_width
                    && arm2_length > arm1_width
            }
            Self::Polygon { vertices } => {
                vertices.len() >= 3 && ring_area(vertices) > GEOMETRY_EPSILON
            }
        }
    }

    fn raw_outline(&self) -> Vec<Point> {
        match self {
            Self::Rectangle { width, height } => vec![
                Point::new(0.0, 0.0),
                Point::new(*width, 0.0),
                Point::new(*width, *height),
                Point::new(0.0, *height),
            ],
            Self::LShape {
                arm1_width,
                arm1_length,
                arm2_width,
                arm2_length,
            } => vec![
                Point::new(0.0, 0.0),
                Point::new(*arm1_length, 0.0),
                Point::new(*arm1_length, *arm1_width),
                Point::new(*arm2_width, *arm1_width),
                Point::new(*arm2_width, *arm2_length),
                Point::new(0.0, *arm2_length),
            ],
            Self::Polygon { vertices } => vertices.clone(),
        }
    }

    fn raw_bounds(&self) -> BoundingBox {
        BoundingBox::from_points(&self.raw_outline()).unwrap_or(BoundingBox::new(0.0, 0.0, 0.0, 0.0))
    }

    /// Counter-clockwise outline centered on the bounding box.
    ///
    /// Vertex order is deterministic, so edge `i` of this polygon is edge
    /// `i` of every polygon generated from the template.
    pub fn local_polygon(&self) -> Polygon {
        let center = self.raw_bounds().center();
        Polygon::new(self.raw_outline().into_iter().map(|p| p - center).collect())
    }

    /// Place the outline with its center at `anchor`, turned `rotation`
    /// degrees counter-clockwise
    pub fn generate_polygon(&self, anchor: Point, rotation: f64) -> Polygon {
        let local = self.local_polygon();
        Polygon::new(RotationTransform::new(rotation, anchor).place(local.vertices()))
    }

    pub fn area(&self) -> f64 {
        match self {
            Self::Rectangle { width, height } => width * height,
            Self::LShape {
                arm1_width,
                arm1_length,
                arm2_width,
                arm2_length,
            } => arm1_length * arm1_width + arm2_width * (arm2_length - arm1_width),
            Self::Polygon { vertices } => ring_area(vertices),
        }
    }

    /// Bounding-box width and height in the local frame
    pub fn extents(&self) -> (f64, f64) {
        let b = self.raw_bounds();
        (b.width, b.height)
    }

    pub fn extent(&self, axis: Axis) -> f64 {
        let (w, h) = self.extents();
        match axis {
            Axis::X => w,
            Axis::Y => h,
        }
    }

    /// Long side over short side of the bounding box; always ≥ 1
    pub fn aspect_ratio(&self) -> f64 {
        let (w, h) = self.extents();
        let (long, short) = if w >= h { (w, h) } else { (h, w) };
        if short <= 0.0 {
            f64::INFINITY
        } else {
            long / short
        }
    }

    /// Stretch independently along each local axis
    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        match self {
            Self::Rectangle { width, height } => Self::Rectangle {
                width: width * sx,
                height: height * sy,
            },
            Self::LShape {
                arm1_width,
                arm1_length,
                arm2_width,
                arm2_length,
            } => Self::LShape {
                arm1_width: arm1_width * sy,
                arm1_length: arm1_length * sx,
                arm2_width: arm2_width * sx,
                arm2_length: arm2_length * sy,
            },
            Self::Polygon { vertices } => Self::Polygon {
                vertices: vertices
                    .iter()
                    .map(|p| Point::new(p.x * sx, p.y * sy))
                    .collect(),
            },
        }
    }

    /// Uniformly rescale to `area`, keeping proportions
    pub fn with_area(&self, area: f64) -> Self {
        match self {
            Self::Rectangle { width, height } => {
                Self::rectangle_with_area(area, width / height)
            }
            _ => {
                let current = self.area();
                if current <= 0.0 || area <= 0.0 {
                    return self.clone();
                }
                let k = (area / current).sqrt();
                self.scaled(k, k)
            }
        }
    }

    /// Reshape to the given long/short ratio, preserving area.
    ///
    /// The currently longer axis stays the longer one (x on ties).
    pub fn with_aspect_ratio(&self, aspect: f64) -> Self {
        let (w, h) = self.extents();
        if w <= 0.0 || h <= 0.0 || aspect <= 0.0 {
            return self.clone();
        }
        let k = if w >= h {
            (aspect * h / w).sqrt()
        } else {
            (h / (aspect * w)).sqrt()
        };
        self.scaled(k, 1.0 / k)
    }

    /// Stretch one axis so its extent becomes `value`
    pub fn with_extent(&self, axis: Axis, value: f64) -> Self {
        let current = self.extent(axis);
        if current <= 0.0 {
            return self.clone();
        }
        let k = value / current;
        match axis {
            Axis::X => self.scaled(k, 1.0),
            Axis::Y => self.scaled(1.0, k),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_rectangle_with_area() {
        let r = ShapeTemplate::rectangle_with_area(12.0, 1.5);
        let (w, h) = r.extents();
        assert!(approx_eq(w * h, 12.0));
        assert!(approx_eq(w / h, 1.5));
        assert!(approx_eq(r.aspect_ratio(), 1.5));
    }

    #[test]
    fn test_l_shape_area_matches_polygon() {
        let l = ShapeTemplate::l_shape(3.0, 6.0, 3.0, 5.0);
        assert!((l.area() - 24.0).abs() < EPSILON);
        assert!((l.local_polygon().area() - 24.0).abs() < EPSILON);
    }

    #[test]
    fn test_local_polygon_is_centered() {
        let l = ShapeTemplate::l_shape(3.0, 6.0, 3.0, 5.0);
        let b = l.local_polygon().bounding_box();
        assert!(b.center().x.abs() < EPSILON);
        assert!(b.center().y.abs() < EPSILON);
    }

    #[test]
    fn test_clockwise_polygon_template_is_normalized() {
        let cw = ShapeTemplate::polygon(vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 2.0),
            Point::new(3.0, 2.0),
            Point::new(3.0, 0.0),
        ]);
        assert!(cw.local_polygon().is_counter_clockwise());
        assert!((cw.area() - 6.0).abs() < EPSILON);
    }

    #[test]
    fn test_generate_polygon_rotates_about_anchor() {
        let r = ShapeTemplate::rectangle(4.0, 2.0);
        let p = r.generate_polygon(Point::new(10.0, 5.0), 90.0);
        let b = p.bounding_box();
        assert!(approx_eq(b.width, 2.0));
        assert!(approx_eq(b.height, 4.0));
        assert!(approx_eq(b.center().x, 10.0));
        assert!(approx_eq(b.center().y, 5.0));
        assert!(approx_eq(p.area(), 8.0));
    }

    #[test]
    fn test_with_area_keeps_proportions() {
        let l = ShapeTemplate::l_shape(3.0, 6.0, 3.0, 5.0).with_area(20.0);
        assert!(approx_eq(l.area(), 20.0));
        assert!(approx_eq(l.aspect_ratio(), 6.0 / 5.0));
    }

    #[test]
    fn test_with_aspect_ratio_preserves_area() {
        let r = ShapeTemplate::rectangle(2.0, 4.0).with_aspect_ratio(1.0);
        assert!(approx_eq(r.area(), 8.0));
        assert!(approx_eq(r.aspect_ratio(), 1.0));

        let tall = ShapeTemplate::rectangle(2.0, 4.0).with_aspect_ratio(3.0);
        let (w, h) = tall.extents();
        assert!(h > w, "long axis must stay vertical");
        assert!(approx_eq(tall.aspect_ratio(), 3.0));
    }

    #[test]
    fn test_with_extent_is_linear_in_area() {
        let l = ShapeTemplate::l_shape(3.0, 6.0, 3.0, 5.0);
        let stretched = l.with_extent(Axis::Y, 7.5);
        assert!(approx_eq(stretched.extent(Axis::Y), 7.5));
        assert!(approx_eq(stretched.extent(Axis::X), 6.0));
        assert!(approx_eq(stretched.area(), 24.0 * 1.5));
    }

    #[test]
    fn test_validity() {
        assert!(ShapeTemplate::rectangle(1.0, 1.0).is_valid());
        assert!(!ShapeTemplate::rectangle(0.0, 1.0).is_valid());
        assert!(!ShapeTemplate::l_shape(3.0, 2.0, 3.0, 5.0).is_valid());
        assert!(!ShapeTemplate::polygon(vec![Point::ORIGIN, Point::new(1.0, 0.0)]).is_valid());
    }
}
