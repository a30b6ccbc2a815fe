//! Rotation utilities for placing templates in the plan.
//!
//! Templates are authored in a local frame centered on their bounding box.
//! A [`RotationTransform`] carries local vertices into plan coordinates by
//! rotating about the instance anchor.
//!
//! ## Rotation Convention
//!
//! Plan coordinates are y-up, so positive angles turn counter-clockwise,
//! in degrees:
//! - 0° = no rotation
//! - 90° = right becomes up
//! - 180° = upside down
//! - -90° = right becomes down

use super::types::{BoundingBox, Point};

/// Angles closer than this (degrees) are treated as equal
pub const ANGLE_EPSILON: f64 = 1e-9;

/// A 2D rotation about a center point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationTransform {
    /// Rotation angle in degrees (counter-clockwise positive)
    pub angle_degrees: f64,
    /// Center of rotation, normally the instance anchor
    pub center: Point,
}

impl RotationTransform {
    pub fn new(angle_degrees: f64, center: Point) -> Self {
        Self {
            angle_degrees,
            center,
        }
    }

    /// Rotation about the origin, for direction vectors
    pub fn about_origin(angle_degrees: f64) -> Self {
        Self::new(angle_degrees, Point::ORIGIN)
    }

    pub fn is_identity(&self) -> bool {
        normalize_degrees(self.angle_degrees).abs() < ANGLE_EPSILON
    }

    /// The transform that undoes this one
    pub fn inverse(&self) -> Self {
        Self::new(-self.angle_degrees, self.center)
    }

    /// Rotate a point around the center.
    ///
    /// ```text
    /// x' = cx + (x - cx) * cos(θ) - (y - cy) * sin(θ)
    /// y' = cy + (x - cx) * sin(θ) + (y - cy) * cos(θ)
    /// ```
    pub fn transform_point(&self, point: Point) -> Point {
        if self.is_identity() {
            return point;
        }

        let radians = self.angle_degrees.to_radians();
        let (sin_a, cos_a) = radians.sin_cos();

        let dx = point.x - self.center.x;
        let dy = point.y - self.center.y;

        Point {
            x: self.center.x + dx * cos_a - dy * sin_a,
            y: self.center.y + dx * sin_a + dy * cos_a,
        }
    }

    /// Rotate a direction vector, ignoring the center
    pub fn transform_vector(&self, vector: Point) -> Point {
        Self::about_origin(self.angle_degrees).transform_point(vector)
    }

    /// Map template-local vertices (relative to the anchor) into the plan
    pub fn place(&self, local: &[Point]) -> Vec<Point> {
        local
            .iter()
            .map(|&p| self.transform_point(self.center + p))
            .collect()
    }

    /// Axis-aligned box of the rotated corners of `bounds`
    pub fn transform_bounds(&self, bounds: &BoundingBox) -> BoundingBox {
        if self.is_identity() {
            return *bounds;
        }
        let corners = [
            Point::new(bounds.x, bounds.y),
            Point::new(bounds.right(), bounds.y),
            Point::new(bounds.right(), bounds.top()),
            Point::new(bounds.x, bounds.top()),
        ]
        .map(|c| self.transform_point(c));
        BoundingBox::from_points(&corners).unwrap_or(*bounds)
    }
}

/// Wrap an angle in degrees into (-180, 180]
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Direction of a vector in degrees, counter-clockwise from +x
pub fn direction_degrees(vector: Point) -> f64 {
    vector.y.atan2(vector.x).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < EPSILON && (a.y - b.y).abs() < EPSILON
    }

    #[test]
    fn test_identity_leaves_point() {
        let t = RotationTransform::new(0.0, Point::new(5.0, 5.0));
        assert!(t.is_identity());
        assert_eq!(t.transform_point(Point::new(1.0, 2.0)), Point::new(1.0, 2.0));
    }

    #[test]
    fn test_full_turn_is_identity() {
        assert!(RotationTransform::about_origin(360.0).is_identity());
        assert!(RotationTransform::about_origin(-720.0).is_identity());
    }

    #[test]
    fn test_quarter_turn_is_counter_clockwise() {
        let t = RotationTransform::about_origin(90.0);
        assert!(approx_eq(
            t.transform_point(Point::new(1.0, 0.0)),
            Point::new(0.0, 1.0)
        ));
    }

    #[test]
    fn test_rotation_about_center() {
        let t = RotationTransform::new(180.0, Point::new(1.0, 1.0));
        assert!(approx_eq(
            t.transform_point(Point::new(2.0, 1.0)),
            Point::new(0.0, 1.0)
        ));
    }

    #[test]
    fn test_inverse_round_trips() {
        let t = RotationTransform::new(37.0, Point::new(-2.0, 3.0));
        let p = Point::new(4.0, -1.5);
        assert!(approx_eq(t.inverse().transform_point(t.transform_point(p)), p));
    }

    #[test]
    fn test_place_offsets_from_anchor() {
        let t = RotationTransform::new(90.0, Point::new(10.0, 0.0));
        let placed = t.place(&[Point::new(1.0, 0.0)]);
        assert!(approx_eq(placed[0], Point::new(10.0, 1.0)));
    }

    #[test]
    fn test_transform_bounds_quarter_turn_swaps_extents() {
        let t = RotationTransform::new(90.0, Point::new(2.0, 1.0));
        let b = t.transform_bounds(&BoundingBox::new(0.0, 0.0, 4.0, 2.0));
        assert!((b.width - 2.0).abs() < EPSILON);
        assert!((b.height - 4.0).abs() < EPSILON);
        assert!(approx_eq(b.center(), Point::new(2.0, 1.0)));
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(180.0), 180.0);
        assert_eq!(normalize_degrees(-180.0), 180.0);
        assert_eq!(normalize_degrees(190.0), -170.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert_eq!(normalize_degrees(-90.0), -90.0);
    }

    #[test]
    fn test_direction_degrees() {
        assert!((direction_degrees(Point::new(0.0, 2.0)) - 90.0).abs() < EPSILON);
        assert!((direction_degrees(Point::new(-1.0, 0.0)) - 180.0).abs() < EPSILON);
    }
}
