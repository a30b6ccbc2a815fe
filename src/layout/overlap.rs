//! Detection and separation of overlapping non-adjacent rooms
//!
//! Adjacent rooms are the aligner's business; this pass only pushes apart
//! rooms that should not be touching at all. Pushes are small per pass and
//! the optimizer iterates, so rooms drift apart instead of jumping.

use std::collections::HashMap;

use tracing::debug;

use crate::graph::RoomGraph;

use super::config::SolverConfig;
use super::types::{Displacement, Point, ShapeInstance};

/// Two non-adjacent rooms covering the same floor
#[derive(Debug, Clone, PartialEq)]
pub struct Overlap {
    pub room_a: String,
    pub room_b: String,
    pub area: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct OverlapResolver {
    tolerance: f64,
    step_factor: f64,
}

impl OverlapResolver {
    pub fn new(config: &SolverConfig) -> Self {
        Self {
            tolerance: config.overlap_tolerance,
            step_factor: config.overlap_step_factor,
        }
    }

    /// Every non-adjacent pair whose shared area exceeds the tolerance, in
    /// room order
    pub fn detect(&self, rooms: &[ShapeInstance], adjacency: &RoomGraph) -> Vec<Overlap> {
        let mut overlaps = Vec::new();
        for (i, a) in rooms.iter().enumerate() {
            for b in &rooms[i + 1..] {
                if adjacency.contains(&a.room_id, &b.room_id) {
                    continue;
                }
                let area = a.polygon().intersection_area(b.polygon());
                if area > self.tolerance {
                    overlaps.push(Overlap {
                        room_a: a.room_id.clone(),
                        room_b: b.room_id.clone(),
                        area,
                    });
                }
            }
        }
        overlaps
    }

    /// Displacements that push each overlapping pair apart along the line
    /// between their centroids.
    ///
    /// Each push is `step_factor` times the pushed room's minimum dimension.
    /// A fixed room never moves; its partner takes the whole push. Otherwise
    /// each room takes half. Offsets for the same room are summed.
    pub fn detect_and_resolve(
        &self,
        rooms: &[ShapeInstance],
        adjacency: &RoomGraph,
    ) -> Vec<Displacement> {
        let overlaps = self.detect(rooms, adjacency);
        self.resolve(rooms, &overlaps)
    }

    pub fn resolve(&self, rooms: &[ShapeInstance], overlaps: &[Overlap]) -> Vec<Displacement> {
        let by_id: HashMap<&str, &ShapeInstance> =
            rooms.iter().map(|r| (r.room_id.as_str(), r)).collect();
        let mut offsets: Vec<(String, Point)> = Vec::new();
        let mut push = |id: &str, offset: Point| {
            match offsets.iter_mut().find(|(room, _)| room.as_str() == id) {
                Some((_, total)) => *total = *total + offset,
                None => offsets.push((id.to_string(), offset)),
            }
        };

        for overlap in overlaps {
            let (Some(a), Some(b)) = (
                by_id.get(overlap.room_a.as_str()),
                by_id.get(overlap.room_b.as_str()),
            ) else {
                continue;
            };
            if a.fixed && b.fixed {
                continue;
            }

            let mut away = (b.polygon().centroid() - a.polygon().centroid()).normalized();
            if away == Point::ORIGIN {
                away = Point::new(1.0, 0.0);
            }
            debug!(
                room_a = %a.room_id,
                room_b = %b.room_id,
                area = overlap.area,
                "separating overlapping rooms"
            );

            let share = if a.fixed || b.fixed { 1.0 } else { 0.5 };
            if !a.fixed {
                push(&a.room_id, -away * (self.step(a) * share));
            }
            if !b.fixed {
                push(&b.room_id, away * (self.step(b) * share));
            }
        }

        offsets
            .into_iter()
            .map(|(room_id, offset)| Displacement { room_id, offset })
            .collect()
    }

    fn step(&self, room: &ShapeInstance) -> f64 {
        self.step_factor * room.bounds.min_dimension
    }
}
