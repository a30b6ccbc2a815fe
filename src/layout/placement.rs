//! Initial room positions
//!
//! Placement only needs to be good enough for the aligner to pick sensible
//! wall pairs: adjacent rooms should start near each other and on the side
//! they will end up on.

use std::collections::HashMap;
use std::f64::consts::TAU;

use petgraph::visit::{Bfs, EdgeRef};
use tracing::debug;

use crate::graph::LayoutGraph;
use crate::shapes::ShapeTemplate;

use super::config::{PlacementStrategy, SolverConfig};
use super::types::{BoundingBox, Point};

/// Axis-aligned size of a room before any rotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub width: f64,
    pub height: f64,
}

impl Footprint {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn of(template: &ShapeTemplate) -> Self {
        let (width, height) = template.extents();
        Self { width, height }
    }

    /// Side of the square with the same bounding area
    pub fn characteristic_size(&self) -> f64 {
        (self.width * self.height).sqrt()
    }

    fn half_extent(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Right | Direction::Left => self.width / 2.0,
            Direction::Up | Direction::Down => self.height / 2.0,
        }
    }
}

/// Side of a parent a child is placed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Right,
    Up,
    Left,
    Down,
}

impl Direction {
    fn next(self) -> Self {
        match self {
            Direction::Right => Direction::Up,
            Direction::Up => Direction::Left,
            Direction::Left => Direction::Down,
            Direction::Down => Direction::Right,
        }
    }

    fn opposite(self) -> Self {
        self.next().next()
    }

    fn unit(self) -> Point {
        match self {
            Direction::Right => Point::new(1.0, 0.0),
            Direction::Up => Point::new(0.0, 1.0),
            Direction::Left => Point::new(-1.0, 0.0),
            Direction::Down => Point::new(0.0, -1.0),
        }
    }
}

/// Compute a starting anchor for every room in `graph`.
///
/// The anchor room always starts at the origin. Rooms missing from
/// `footprints` are treated as 1 m squares.
pub fn compute_initial_positions(
    graph: &LayoutGraph,
    footprints: &HashMap<String, Footprint>,
    config: &SolverConfig,
) -> HashMap<String, Point> {
    let positions = match config.placement {
        PlacementStrategy::BreadthFirst => breadth_first(graph, footprints, config.component_gap),
        PlacementStrategy::Spring => spring(graph, footprints, config.spring_iterations),
    };
    debug!(strategy = ?config.placement, rooms = positions.len(), "initial placement");
    positions
}

fn footprint_of(footprints: &HashMap<String, Footprint>, id: &str) -> Footprint {
    footprints
        .get(id)
        .copied()
        .unwrap_or(Footprint::new(1.0, 1.0))
}

// ── Breadth-first ──

/// Each child continues outward in its parent's direction; further
/// children of the same parent rotate counter-clockwise through the
/// remaining sides, never back towards the grandparent. Children of a parent
/// are taken in edge order. Disconnected components are laid out left to
/// right.
fn breadth_first(
    graph: &LayoutGraph,
    footprints: &HashMap<String, Footprint>,
    component_gap: f64,
) -> HashMap<String, Point> {
    let rooms = graph.room_graph();
    let mut positions: HashMap<String, Point> = HashMap::new();
    let mut heading: HashMap<&str, Direction> = HashMap::new();
    let mut extent: Option<BoundingBox> = None;
    debug!(components = rooms.component_count(), "breadth-first placement");

    let seeds = graph.anchor_room_id().into_iter().chain(graph.room_ids());
    for seed in seeds {
        if positions.contains_key(seed) {
            continue;
        }
        let Some(start) = rooms.node(seed) else {
            continue;
        };

        let fp = footprint_of(footprints, seed);
        let origin = match extent {
            None => Point::ORIGIN,
            Some(b) => Point::new(b.right() + component_gap + fp.width / 2.0, 0.0),
        };
        positions.insert(seed.to_string(), origin);
        heading.insert(seed, Direction::Right);
        let mut component = BoundingBox::centered(origin, fp.width, fp.height);

        let mut bfs = Bfs::new(rooms.graph(), start);
        while let Some(node) = bfs.next(rooms.graph()) {
            let Some(parent) = rooms.room_id(node) else {
                continue;
            };
            let (Some(&parent_pos), Some(&incoming)) = (positions.get(parent), heading.get(parent))
            else {
                continue;
            };
            let parent_fp = footprint_of(footprints, parent);
            let back = (parent != seed).then(|| incoming.opposite());

            let mut dir = incoming;
            let mut first = true;
            for child in rooms.neighbors(parent) {
                if positions.contains_key(child) {
                    continue;
                }
                if !first {
                    dir = dir.next();
                }
                first = false;
                if Some(dir) == back {
                    dir = dir.next();
                }

                let child_fp = footprint_of(footprints, child);
                let offset = parent_fp.half_extent(dir) + child_fp.half_extent(dir);
                let pos = parent_pos + dir.unit() * offset;
                positions.insert(child.to_string(), pos);
                heading.insert(child, dir);
                component = component.union(&BoundingBox::centered(
                    pos,
                    child_fp.width,
                    child_fp.height,
                ));
            }
        }

        extent = Some(match extent {
            None => component,
            Some(b) => b.union(&component),
        });
    }
    positions
}

// ── Force-directed ──

/// Fruchterman–Reingold on a unit-scale frame, then rescaled so adjacent
/// rooms sit roughly one room-width apart
fn spring(
    graph: &LayoutGraph,
    footprints: &HashMap<String, Footprint>,
    iterations: usize,
) -> HashMap<String, Point> {
    let rooms = graph.room_graph();
    // node indices follow room order
    let ids: Vec<&str> = rooms.graph().node_weights().map(String::as_str).collect();
    let n = ids.len();
    if n == 0 {
        return HashMap::new();
    }

    let mut pos: Vec<Point> = (0..n)
        .map(|i| {
            let angle = TAU * i as f64 / n as f64;
            Point::new(angle.cos(), angle.sin())
        })
        .collect();

    if n > 1 {
        let k = (4.0 / n as f64).sqrt();
        let initial_temperature = 0.2;
        for iter in 0..iterations {
            let temperature = initial_temperature * (1.0 - iter as f64 / iterations as f64);
            let mut disp = vec![Point::ORIGIN; n];

            for i in 0..n {
                for j in (i + 1)..n {
                    let mut delta = pos[i] - pos[j];
                    if delta.length() < 1e-9 {
                        delta = Point::new(1e-4, 0.0);
                    }
                    let dist = delta.length().max(1e-4);
                    let push = delta * (k * k / dist / dist);
                    disp[i] = disp[i] + push;
                    disp[j] = disp[j] - push;
                }
            }

            for edge in rooms.graph().edge_references() {
                let (a, b) = (edge.source().index(), edge.target().index());
                let delta = pos[a] - pos[b];
                let dist = delta.length().max(1e-4);
                let pull = delta * (dist / k * *edge.weight());
                disp[a] = disp[a] - pull;
                disp[b] = disp[b] + pull;
            }

            for (p, d) in pos.iter_mut().zip(&disp) {
                let len = d.length();
                if len > 1e-12 {
                    *p = *p + *d * (len.min(temperature) / len);
                }
            }
        }
    }

    // Rescale: mean adjacent spacing should match mean room size
    let sizes: Vec<f64> = ids
        .iter()
        .map(|id| footprint_of(footprints, id).characteristic_size())
        .collect();
    let target = sizes.iter().sum::<f64>() / n as f64;
    let spacings: Vec<f64> = rooms
        .graph()
        .edge_references()
        .map(|e| pos[e.source().index()].distance(pos[e.target().index()]))
        .collect();
    let mean_spacing = if spacings.is_empty() {
        1.0
    } else {
        spacings.iter().sum::<f64>() / spacings.len() as f64
    };
    let scale = if mean_spacing > 1e-9 {
        target / mean_spacing
    } else {
        1.0
    };

    let anchor = graph
        .anchor_room_id()
        .and_then(|id| rooms.node(id))
        .map(|node| pos[node.index()])
        .unwrap_or(Point::ORIGIN);

    ids.iter()
        .zip(pos)
        .map(|(id, p)| (id.to_string(), (p - anchor) * scale))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RoomSpec;

    const EPSILON: f64 = 1e-9;

    fn square_footprints(ids: &[&str], side: f64) -> HashMap<String, Footprint> {
        ids.iter()
            .map(|id| (id.to_string(), Footprint::new(side, side)))
            .collect()
    }

    fn chain(ids: &[&str]) -> LayoutGraph {
        let mut graph = LayoutGraph::new();
        for id in ids {
            graph.add_room(RoomSpec::new(*id, "Bedroom", 4.0));
        }
        for pair in ids.windows(2) {
            graph = graph.with_edge(pair[0], pair[1]);
        }
        graph
    }

    #[test]
    fn test_anchor_starts_at_origin() {
        let graph = chain(&["a", "b"]).with_anchor("b");
        let pos = compute_initial_positions(
            &graph,
            &square_footprints(&["a", "b"], 2.0),
            &SolverConfig::default(),
        );
        assert_eq!(pos["b"], Point::ORIGIN);
        assert!((pos["a"].x - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_chain_continues_outward() {
        let graph = chain(&["a", "b", "c"]);
        let pos = compute_initial_positions(
            &graph,
            &square_footprints(&["a", "b", "c"], 2.0),
            &SolverConfig::default(),
        );
        assert_eq!(pos["b"], Point::new(2.0, 0.0));
        assert_eq!(pos["c"], Point::new(4.0, 0.0));
    }

    #[test]
    fn test_siblings_take_distinct_sides() {
        let graph = LayoutGraph::new()
            .with_room(RoomSpec::new("hub", "Corridor", 4.0))
            .with_room(RoomSpec::new("n1", "Bedroom", 4.0))
            .with_room(RoomSpec::new("n2", "Bedroom", 4.0))
            .with_room(RoomSpec::new("n3", "Bedroom", 4.0))
            .with_room(RoomSpec::new("n4", "Bedroom", 4.0))
            .with_edge("hub", "n1")
            .with_edge("hub", "n2")
            .with_edge("hub", "n3")
            .with_edge("hub", "n4");
        let fps = square_footprints(&["hub", "n1", "n2", "n3", "n4"], 2.0);
        let pos = compute_initial_positions(&graph, &fps, &SolverConfig::default());
        assert_eq!(pos["n1"], Point::new(2.0, 0.0));
        assert_eq!(pos["n2"], Point::new(0.0, 2.0));
        assert_eq!(pos["n3"], Point::new(-2.0, 0.0));
        assert_eq!(pos["n4"], Point::new(0.0, -2.0));
    }

    #[test]
    fn test_child_never_placed_back_towards_grandparent() {
        // b is right of a; b's second child would be "left" of b, onto a
        let graph = LayoutGraph::new()
            .with_room(RoomSpec::new("a", "A", 4.0))
            .with_room(RoomSpec::new("b", "B", 4.0))
            .with_room(RoomSpec::new("c", "C", 4.0))
            .with_room(RoomSpec::new("d", "D", 4.0))
            .with_room(RoomSpec::new("e", "E", 4.0))
            .with_edge("a", "b")
            .with_edge("b", "c")
            .with_edge("b", "d")
            .with_edge("b", "e");
        let fps = square_footprints(&["a", "b", "c", "d", "e"], 2.0);
        let pos = compute_initial_positions(&graph, &fps, &SolverConfig::default());
        assert_eq!(pos["c"], Point::new(4.0, 0.0));
        assert_eq!(pos["d"], Point::new(2.0, 2.0));
        assert_eq!(pos["e"], Point::new(2.0, -2.0));
    }

    #[test]
    fn test_components_laid_out_left_to_right() {
        let graph = chain(&["a1", "a2"])
            .with_room(RoomSpec::new("b1", "Bedroom", 4.0))
            .with_room(RoomSpec::new("b2", "Bedroom", 4.0))
            .with_edge("b1", "b2");
        let fps = square_footprints(&["a1", "a2", "b1", "b2"], 2.0);
        let pos = compute_initial_positions(&graph, &fps, &SolverConfig::default());
        // a-component spans x in [-1, 3]; b1 starts one gap further right
        assert_eq!(pos["b1"], Point::new(5.0, 0.0));
        assert_eq!(pos["b2"], Point::new(7.0, 0.0));
    }

    #[test]
    fn test_cycle_places_every_room_once() {
        let graph = chain(&["a", "b", "c", "d"]).with_edge("d", "a");
        let fps = square_footprints(&["a", "b", "c", "d"], 2.0);
        let pos = compute_initial_positions(&graph, &fps, &SolverConfig::default());
        assert_eq!(pos.len(), 4);
        assert_eq!(pos["b"], Point::new(2.0, 0.0));
        assert_eq!(pos["d"], Point::new(0.0, 2.0));
        let mut spots: Vec<_> = pos.values().map(|p| (p.x as i64, p.y as i64)).collect();
        spots.sort();
        spots.dedup();
        assert_eq!(spots.len(), 4, "no two rooms share a start");
    }

    #[test]
    fn test_spring_spacing_matches_room_size() {
        let graph = chain(&["a", "b"]);
        let config = SolverConfig::default().with_placement(PlacementStrategy::Spring);
        let pos = compute_initial_positions(&graph, &square_footprints(&["a", "b"], 3.0), &config);
        assert_eq!(pos["a"], Point::ORIGIN);
        assert!((pos["a"].distance(pos["b"]) - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_spring_is_deterministic() {
        let graph = chain(&["a", "b", "c", "d"]).with_edge("d", "a");
        let config = SolverConfig::default().with_placement(PlacementStrategy::Spring);
        let fps = square_footprints(&["a", "b", "c", "d"], 3.0);
        let first = compute_initial_positions(&graph, &fps, &config);
        let second = compute_initial_positions(&graph, &fps, &config);
        assert_eq!(first, second);
    }
}
