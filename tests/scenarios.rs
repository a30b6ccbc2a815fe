//! End-to-end solver scenarios

use floorplan_solver::graph::LayoutGraph;
use floorplan_solver::layout::lint;
use floorplan_solver::{
    solve, solve_with_config, Metadata, PlacedLayout, PlacementStrategy, RoomSpec, ShapeKind,
    ShapeLibrary, Signal, SolverConfig,
};

const GAP: f64 = 0.01;
const OVERLAP: f64 = 0.01;

fn spec(id: &str, label: &str) -> RoomSpec {
    ShapeLibrary::new().room_spec(id, label, Metadata::new())
}

/// Adjacent rooms touch, and no two rooms overlap
fn assert_geometry_holds(layout: &PlacedLayout) {
    for edge in &layout.adjacencies {
        let a = layout.room(&edge.room_a).expect("room placed").polygon();
        let b = layout.room(&edge.room_b).expect("room placed").polygon();
        let gap = a.boundary_distance(&b);
        assert!(
            gap < GAP,
            "{} -- {} should touch, gap {gap}",
            edge.room_a,
            edge.room_b
        );
        assert!(a.shared_boundary_length(&b, GAP) > 0.0);
    }
    let rooms: Vec<_> = layout.rooms.values().collect();
    for (i, a) in rooms.iter().enumerate() {
        for b in &rooms[i + 1..] {
            let area = a.polygon().intersection_area(&b.polygon());
            assert!(area < OVERLAP, "{} and {} overlap by {area}", a.id, b.id);
        }
    }
}

fn apartment() -> LayoutGraph {
    LayoutGraph::from_toml_str(
        include_str!("fixtures/apartment.toml"),
        &ShapeLibrary::new(),
    )
    .expect("Fixture should parse")
}

#[test]
fn test_two_rooms_share_a_wall() {
    let graph = LayoutGraph::new()
        .with_room(RoomSpec::new("a", "Bedroom", 20.0).with_aspect_ratio(1.5))
        .with_room(RoomSpec::new("b", "Bathroom", 10.0).with_aspect_ratio(1.0))
        .with_edge("a", "b");
    let layout = solve(&graph).expect("Should solve");

    assert!(layout.metadata.converged);
    assert_geometry_holds(&layout);

    // A pinned square cannot stretch to the longer wall
    assert_eq!(layout.infeasible_pairs(), vec![("a", "b")]);
    assert!(!layout.is_fully_satisfied());
}

#[test]
fn test_entrance_kitchen_living_chain() {
    let graph = LayoutGraph::new()
        .with_room(spec("entrance", "Entrance"))
        .with_room(spec("kitchen", "Kitchen"))
        .with_room(spec("living", "Living_Dining"))
        .with_edge("entrance", "kitchen")
        .with_edge("kitchen", "living");
    let layout = solve(&graph).expect("Should solve");

    assert_eq!(layout.rooms.len(), 3);
    assert!(layout.metadata.converged);
    assert_geometry_holds(&layout);
    assert_eq!(layout.room("living").unwrap().shape, ShapeKind::LShape);

    let total = layout.metadata.total_area;
    assert!(
        (total - 32.0).abs() / 32.0 <= 0.05,
        "total area {total} should be within 5% of 32"
    );
}

#[test]
fn test_disconnected_components() {
    let graph = LayoutGraph::new()
        .with_room(RoomSpec::new("a1", "Bedroom", 12.0))
        .with_room(RoomSpec::new("a2", "Bedroom", 12.0))
        .with_room(RoomSpec::new("b1", "Bedroom", 12.0))
        .with_room(RoomSpec::new("b2", "Bedroom", 12.0))
        .with_edge("a1", "a2")
        .with_edge("b1", "b2");
    let layout = solve(&graph).expect("Disconnected graphs are valid");

    assert!(layout.metadata.converged);
    assert_geometry_holds(&layout);
    let fixed: Vec<_> = layout.rooms.values().filter(|r| r.fixed).map(|r| r.id.as_str()).collect();
    assert_eq!(fixed, vec!["a1"]);
}

#[test]
fn test_unknown_label_falls_back_to_generic_rectangle() {
    let graph = LayoutGraph::new()
        .with_room(spec("kitchen", "Kitchen"))
        .with_room(spec("mud", "Mudroom"))
        .with_edge("kitchen", "mud");
    let layout = solve(&graph).expect("Should solve");

    assert!(layout.metadata.converged);
    assert!(layout.metadata.signals.contains(&Signal::ShapeAssignmentFallback {
        room_id: "mud".to_string(),
        label: "Mudroom".to_string(),
    }));
    let mud = layout.room("mud").unwrap();
    assert_eq!(mud.shape, ShapeKind::Rectangle);
    assert!((mud.area - 10.0).abs() <= 0.5 + 1e-9, "area {}", mud.area);
    assert_geometry_holds(&layout);
}

#[test]
fn test_spring_placement_converges() {
    let graph = LayoutGraph::new()
        .with_room(RoomSpec::new("a", "Bedroom", 12.0))
        .with_room(RoomSpec::new("b", "Bedroom", 12.0))
        .with_edge("a", "b");
    let config = SolverConfig::default().with_placement(PlacementStrategy::Spring);
    let layout = solve_with_config(&graph, &config).expect("Should solve");

    assert!(layout.metadata.converged);
    assert_geometry_holds(&layout);
}

#[test]
fn test_apartment_fixture() {
    let graph = apartment();
    let config = SolverConfig::default();
    let layout = solve_with_config(&graph, &config).expect("Should solve");

    assert_eq!(layout.rooms.len(), 8);
    assert!(layout.metadata.converged);
    assert_geometry_holds(&layout);
    assert!(layout.room("entrance").unwrap().fixed);
    assert!(
        !layout
            .metadata
            .signals
            .iter()
            .any(|s| matches!(s, Signal::ShapeAssignmentFallback { .. })),
        "every fixture label has a category"
    );
    // Resizing never leaves the area tolerance
    let area_warnings: Vec<_> = lint::check(&layout, &config)
        .into_iter()
        .filter(|w| w.category == lint::LintCategory::Area)
        .collect();
    assert!(area_warnings.is_empty(), "{area_warnings:?}");
}

#[test]
fn test_spring_apartment_converges_cleanly() {
    // Overlap pushes must not be undone by re-seating on an occupied wall
    let graph = apartment();
    let config = SolverConfig::default().with_placement(PlacementStrategy::Spring);
    let layout = solve_with_config(&graph, &config).expect("Should solve");

    assert!(
        layout.metadata.converged,
        "stopped after {} iterations",
        layout.metadata.iterations_used
    );
    assert!(layout.metadata.iterations_used < config.max_iterations);
    assert_geometry_holds(&layout);
    let warnings = lint::check(&layout, &config);
    assert!(warnings.is_empty(), "{warnings:?}");
}

#[test]
fn test_iteration_budget_exhaustion_is_reported() {
    let graph = LayoutGraph::new()
        .with_room(spec("entrance", "Entrance"))
        .with_room(spec("kitchen", "Kitchen"))
        .with_room(spec("living", "Living_Dining"))
        .with_edge("entrance", "kitchen")
        .with_edge("kitchen", "living");
    let config = SolverConfig::default().with_max_iterations(1);
    let layout = solve_with_config(&graph, &config).expect("Should solve");

    assert!(!layout.metadata.converged);
    assert_eq!(layout.metadata.iterations_used, 1);
    assert!(layout
        .metadata
        .signals
        .iter()
        .any(|s| matches!(s, Signal::NonConvergence { iterations: 1, .. })));
}
