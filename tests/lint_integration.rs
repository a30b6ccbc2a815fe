//! Integration tests for the layout lint pass

use floorplan_solver::graph::LayoutGraph;
use floorplan_solver::layout::lint::{check, LintCategory};
use floorplan_solver::{solve, Point, RoomSpec, SolverConfig};

fn chain() -> LayoutGraph {
    LayoutGraph::new()
        .with_room(RoomSpec::new("a", "Bedroom", 12.0))
        .with_room(RoomSpec::new("b", "Bedroom", 12.0))
        .with_room(RoomSpec::new("c", "Bedroom", 12.0))
        .with_edge("a", "b")
        .with_edge("b", "c")
}

#[test]
fn test_converged_layout_is_clean() {
    let layout = solve(&chain()).expect("Should solve");
    let warnings = check(&layout, &SolverConfig::default());
    assert!(
        warnings.is_empty(),
        "Expected no warnings, got: {:?}",
        warnings.iter().map(|w| w.to_string()).collect::<Vec<_>>()
    );
}

#[test]
fn test_displaced_room_reports_gap() {
    let mut layout = solve(&chain()).expect("Should solve");
    let room = layout.rooms.get_mut("c").expect("room c");
    for v in &mut room.vertices {
        *v = *v + Point::new(0.0, 10.0);
    }

    let categories: Vec<LintCategory> = check(&layout, &SolverConfig::default())
        .iter()
        .map(|w| w.category)
        .collect();
    assert_eq!(categories, vec![LintCategory::Gap]);
}

#[test]
fn test_stacked_rooms_report_overlap() {
    let mut layout = solve(&chain()).expect("Should solve");
    let a = layout.rooms["a"].vertices.clone();
    let room = layout.rooms.get_mut("c").expect("room c");
    room.vertices = a;

    let warnings = check(&layout, &SolverConfig::default());
    let categories: Vec<String> = warnings.iter().map(|w| w.category.to_string()).collect();
    assert!(
        categories.contains(&"overlap".to_string()),
        "Expected overlap warning, got: {:?}",
        categories
    );
    // c now sits where a was, still against b
    assert!(!categories.contains(&"gap".to_string()));
}
