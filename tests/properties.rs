//! Geometric properties checked over generated inputs

use floorplan_solver::layout::{EdgeAligner, Point, ShapeBounds, ShapeInstance, SolverConfig};
use floorplan_solver::ShapeTemplate;
use proptest::prelude::*;

fn bounds(area: f64) -> ShapeBounds {
    ShapeBounds {
        min_area: area * 0.5,
        max_area: area * 1.5,
        aspect_ratio_range: (1.0, 10.0),
        min_dimension: 0.5,
    }
}

fn template() -> impl Strategy<Value = ShapeTemplate> {
    prop_oneof![
        (1.0f64..8.0, 1.0f64..8.0).prop_map(|(w, h)| ShapeTemplate::rectangle(w, h)),
        (1.0f64..3.0, 4.0f64..8.0, 1.0f64..3.0, 4.0f64..8.0)
            .prop_map(|(w1, l1, w2, l2)| ShapeTemplate::l_shape(w1, l1, w2, l2)),
    ]
}

proptest! {
    #[test]
    fn rotation_preserves_area(
        shape in template(),
        angle in -360.0f64..360.0,
        x in -50.0f64..50.0,
        y in -50.0f64..50.0,
    ) {
        let placed = shape.generate_polygon(Point::new(x, y), angle);
        prop_assert!((placed.area() - shape.area()).abs() < 1e-6 * shape.area().max(1.0));
    }

    #[test]
    fn realignment_is_idempotent(
        (rw, rh) in (1.0f64..8.0, 1.0f64..8.0),
        (mw, mh) in (1.0f64..8.0, 1.0f64..8.0),
        x in -15.0f64..15.0,
        y in -15.0f64..15.0,
        angle in -180.0f64..180.0,
    ) {
        let config = SolverConfig::default();
        let aligner = EdgeAligner::new(&config);
        let reference = ShapeInstance::new(
            "ref",
            ShapeTemplate::rectangle(rw, rh),
            Point::ORIGIN,
            0.0,
            bounds(rw * rh),
        )
        .with_fixed(true);
        let movable = ShapeInstance::new(
            "mov",
            ShapeTemplate::rectangle(mw, mh),
            Point::new(x, y),
            angle,
            bounds(mw * mh),
        );

        let once = aligner.align(&reference, &movable).instance;
        let twice = aligner.align(&reference, &once).instance;
        prop_assert!(
            twice.displacement_from(&once) < config.convergence_threshold,
            "second alignment moved the room by {}",
            twice.displacement_from(&once)
        );
    }

    #[test]
    fn aligned_rooms_touch_without_overlap(
        (mw, mh) in (1.0f64..6.0, 1.0f64..6.0),
        x in -12.0f64..12.0,
        y in -12.0f64..12.0,
        angle in -180.0f64..180.0,
    ) {
        let aligner = EdgeAligner::new(&SolverConfig::default());
        let reference = ShapeInstance::new(
            "ref",
            ShapeTemplate::rectangle(4.0, 3.0),
            Point::ORIGIN,
            0.0,
            bounds(12.0),
        );
        let movable = ShapeInstance::new(
            "mov",
            ShapeTemplate::rectangle(mw, mh),
            Point::new(x, y),
            angle,
            bounds(mw * mh),
        );

        let aligned = aligner.align(&reference, &movable).instance;
        let (r, m) = (reference.polygon(), aligned.polygon());
        prop_assert!(r.boundary_distance(m) < 0.01);
        prop_assert!(r.intersection_area(m) < 0.01);
        prop_assert!(r.shared_boundary_length(m, 0.01) > 0.0);
    }
}
