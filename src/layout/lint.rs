//! Lint pass for finished floor plans.
//!
//! Runs after optimization and re-checks the geometry independently of the
//! solver: adjacent rooms that do not touch, rooms that overlap (adjacent
//! or not), rooms whose area drifted out of tolerance, and runs that did
//! not converge.

use std::fmt;

use crate::graph::RoomGraph;

use super::config::SolverConfig;
use super::types::PlacedLayout;

/// A lint warning about a layout defect
#[derive(Debug, Clone, PartialEq)]
pub struct LintWarning {
    pub category: LintCategory,
    pub message: String,
}

/// Category of lint defect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintCategory {
    Gap,
    Overlap,
    Area,
    Convergence,
}

impl fmt::Display for LintCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintCategory::Gap => write!(f, "gap"),
            LintCategory::Overlap => write!(f, "overlap"),
            LintCategory::Area => write!(f, "area"),
            LintCategory::Convergence => write!(f, "convergence"),
        }
    }
}

impl fmt::Display for LintWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)
    }
}

/// Run all lint checks on a finished layout.
pub fn check(layout: &PlacedLayout, config: &SolverConfig) -> Vec<LintWarning> {
    let mut warnings = Vec::new();
    check_gaps(layout, config, &mut warnings);
    check_overlaps(layout, config, &mut warnings);
    check_areas(layout, config, &mut warnings);
    check_convergence(layout, &mut warnings);
    warnings
}

// ── Adjacent rooms must touch ─────────────────────────────────────

fn check_gaps(layout: &PlacedLayout, config: &SolverConfig, warnings: &mut Vec<LintWarning>) {
    for edge in &layout.adjacencies {
        let (Some(a), Some(b)) = (layout.room(&edge.room_a), layout.room(&edge.room_b)) else {
            continue;
        };
        let distance = a.polygon().boundary_distance(&b.polygon());
        if distance > config.gap_tolerance {
            warnings.push(LintWarning {
                category: LintCategory::Gap,
                message: format!(
                    "\"{}\" and \"{}\" are adjacent but {:.3}m apart",
                    a.id, b.id, distance
                ),
            });
        }
    }
}

// ── Rooms must not overlap ────────────────────────────────────────

fn check_overlaps(layout: &PlacedLayout, config: &SolverConfig, warnings: &mut Vec<LintWarning>) {
    let adjacency = RoomGraph::from_edges(&layout.adjacencies);
    let rooms: Vec<_> = layout.rooms.values().collect();
    for (i, a) in rooms.iter().enumerate() {
        let pa = a.polygon();
        for b in &rooms[i + 1..] {
            let area = pa.intersection_area(&b.polygon());
            if area <= config.overlap_tolerance {
                continue;
            }
            let message = if adjacency.contains(&a.id, &b.id) {
                format!(
                    "\"{}\" and \"{}\" are adjacent but overlap by {:.3}m²",
                    a.id, b.id, area
                )
            } else {
                format!("\"{}\" and \"{}\" overlap by {:.3}m²", a.id, b.id, area)
            };
            warnings.push(LintWarning {
                category: LintCategory::Overlap,
                message,
            });
        }
    }
}

// ── Areas within tolerance ────────────────────────────────────────

fn check_areas(layout: &PlacedLayout, config: &SolverConfig, warnings: &mut Vec<LintWarning>) {
    for room in layout.rooms.values() {
        if room.target_area <= 0.0 {
            continue;
        }
        let deviation = (room.area - room.target_area).abs() / room.target_area;
        if deviation > config.area_tolerance + 1e-9 {
            warnings.push(LintWarning {
                category: LintCategory::Area,
                message: format!(
                    "\"{}\" has area {:.2}m², target {:.2}m² ({:+.1}%)",
                    room.id,
                    room.area,
                    room.target_area,
                    (room.area / room.target_area - 1.0) * 100.0
                ),
            });
        }
    }
}

fn check_convergence(layout: &PlacedLayout, warnings: &mut Vec<LintWarning>) {
    if !layout.metadata.converged {
        warnings.push(LintWarning {
            category: LintCategory::Convergence,
            message: format!(
                "layout did not converge after {} iterations",
                layout.metadata.iterations_used
            ),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::graph::AdjacencyEdge;
    use crate::layout::types::{LayoutMetadata, PlacedRoom, Point};
    use crate::shapes::ShapeKind;

    fn make_room(id: &str, x: f64, y: f64, w: f64, h: f64) -> PlacedRoom {
        PlacedRoom {
            id: id.to_string(),
            label: "Room".to_string(),
            shape: ShapeKind::Rectangle,
            vertices: vec![
                Point::new(x, y),
                Point::new(x + w, y),
                Point::new(x + w, y + h),
                Point::new(x, y + h),
            ],
            area: w * h,
            target_area: w * h,
            anchor: Point::new(x + w / 2.0, y + h / 2.0),
            rotation: 0.0,
            fixed: false,
            metadata: BTreeMap::new(),
        }
    }

    fn make_layout(rooms: Vec<PlacedRoom>, edges: Vec<AdjacencyEdge>) -> PlacedLayout {
        PlacedLayout {
            metadata: LayoutMetadata {
                total_area: rooms.iter().map(|r| r.area).sum(),
                room_count: rooms.len(),
                converged: true,
                iterations_used: 3,
                signals: Vec::new(),
            },
            rooms: rooms.into_iter().map(|r| (r.id.clone(), r)).collect(),
            adjacencies: edges,
        }
    }

    #[test]
    fn test_clean_layout() {
        let layout = make_layout(
            vec![make_room("a", 0.0, 0.0, 3.0, 4.0), make_room("b", 3.0, 0.0, 2.0, 4.0)],
            vec![AdjacencyEdge::new("a", "b")],
        );
        assert!(check(&layout, &SolverConfig::default()).is_empty());
    }

    #[test]
    fn test_gap_detected() {
        let layout = make_layout(
            vec![make_room("a", 0.0, 0.0, 3.0, 4.0), make_room("b", 3.5, 0.0, 2.0, 4.0)],
            vec![AdjacencyEdge::new("a", "b")],
        );
        let warnings = check(&layout, &SolverConfig::default());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].category, LintCategory::Gap);
        assert!(warnings[0].message.contains("0.500m"));
    }

    #[test]
    fn test_overlap_detected_for_every_pair() {
        let rooms = vec![make_room("a", 0.0, 0.0, 3.0, 4.0), make_room("b", 2.0, 0.0, 2.0, 4.0)];
        let layout = make_layout(rooms.clone(), Vec::new());
        let warnings = check(&layout, &SolverConfig::default());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].category, LintCategory::Overlap);
        assert!(!warnings[0].message.contains("adjacent"));

        // sharing a wall does not license sharing floor
        let adjacent = make_layout(rooms, vec![AdjacencyEdge::new("b", "a")]);
        let warnings = check(&adjacent, &SolverConfig::default());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].category, LintCategory::Overlap);
        assert!(warnings[0].message.contains("adjacent but overlap by 4.000m²"));
    }

    #[test]
    fn test_area_drift_detected() {
        let mut room = make_room("a", 0.0, 0.0, 3.0, 4.0);
        room.target_area = 10.0;
        let warnings = check(&make_layout(vec![room], Vec::new()), &SolverConfig::default());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].category, LintCategory::Area);
        assert!(warnings[0].message.contains("+20.0%"));
    }

    #[test]
    fn test_non_convergence_reported() {
        let mut layout = make_layout(vec![make_room("a", 0.0, 0.0, 3.0, 4.0)], Vec::new());
        layout.metadata.converged = false;
        let warnings = check(&layout, &SolverConfig::default());
        assert_eq!(
            warnings[0].to_string(),
            "[convergence] layout did not converge after 3 iterations"
        );
    }
}
