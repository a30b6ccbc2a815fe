//! Iterative layout optimizer
//!
//! A run moves through the states
//! `Initializing → Aligning → Converged | Exhausted`:
//!
//! 1. **Initializing**: validate the graph, assign a shape template to every
//!    room, compute initial positions and build the first snapshot.
//! 2. **Aligning**: each pass sweeps the adjacency edges in insertion order,
//!    aligning the movable endpoint against the reference endpoint clear of
//!    the other rooms, then pushes apart overlapping non-adjacent rooms.
//! 3. **Converged**: the largest vertex move of a pass fell below the
//!    convergence threshold and no overlap needed correcting.
//! 4. **Exhausted**: the iteration budget ran out; the last snapshot is
//!    returned with `converged = false` and a non-convergence signal.
//!
//! Passes never mutate the previous snapshot, so convergence is a diff of
//! two immutable snapshots.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::error::GraphError;
use crate::graph::{LayoutGraph, RoomGraph};
use crate::shapes::ShapeLibrary;

use super::alignment::EdgeAligner;
use super::config::SolverConfig;
use super::overlap::OverlapResolver;
use super::placement::{compute_initial_positions, Footprint};
use super::types::{
    LayoutMetadata, PlacedLayout, PlacedRoom, Point, ShapeBounds, ShapeInstance, Signal,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizerState {
    Initializing,
    Aligning { iteration: usize },
    Converged,
    Exhausted,
}

/// Every room's shape at one point of the run
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSnapshot {
    instances: Vec<ShapeInstance>,
    index: HashMap<String, usize>,
}

impl LayoutSnapshot {
    pub fn new(instances: Vec<ShapeInstance>) -> Self {
        let index = instances
            .iter()
            .enumerate()
            .map(|(i, inst)| (inst.room_id.clone(), i))
            .collect();
        Self { instances, index }
    }

    pub fn get(&self, room_id: &str) -> Option<&ShapeInstance> {
        self.index.get(room_id).map(|&i| &self.instances[i])
    }

    pub fn instances(&self) -> &[ShapeInstance] {
        &self.instances
    }

    fn replace(&mut self, instance: ShapeInstance) {
        if let Some(&i) = self.index.get(&instance.room_id) {
            self.instances[i] = instance;
        }
    }

    fn translate(&mut self, room_id: &str, offset: Point) {
        if let Some(&i) = self.index.get(room_id) {
            self.instances[i] = self.instances[i].translated(offset);
        }
    }

    /// Largest vertex move of any room relative to `previous`
    pub fn max_displacement(&self, previous: &LayoutSnapshot) -> f64 {
        self.instances
            .iter()
            .filter_map(|inst| {
                previous
                    .get(&inst.room_id)
                    .map(|before| inst.displacement_from(before))
            })
            .fold(0.0, f64::max)
    }
}

/// What one alignment pass did
#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    pub iteration: usize,
    pub max_displacement: f64,
    pub overlaps: usize,
    /// Adjacencies the aligner could not fully satisfy in this pass
    pub infeasible: Vec<Signal>,
}

impl PassReport {
    pub fn is_settled(&self, threshold: f64) -> bool {
        self.max_displacement < threshold && self.overlaps == 0
    }
}

/// A finished run: the layout plus how it got there
#[derive(Debug, Clone)]
pub struct OptimizerRun {
    pub layout: PlacedLayout,
    pub state: OptimizerState,
    pub passes: Vec<PassReport>,
}

/// Turns a validated graph into a placed layout
#[derive(Debug, Clone, Default)]
pub struct LayoutOptimizer {
    config: SolverConfig,
    library: ShapeLibrary,
}

impl LayoutOptimizer {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            library: ShapeLibrary::new(),
        }
    }

    pub fn with_library(mut self, library: ShapeLibrary) -> Self {
        self.library = library;
        self
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn library(&self) -> &ShapeLibrary {
        &self.library
    }

    pub fn optimize(&self, graph: &LayoutGraph) -> Result<PlacedLayout, GraphError> {
        self.run(graph).map(|run| run.layout)
    }

    /// Optimize and keep the per-pass reports
    pub fn run(&self, graph: &LayoutGraph) -> Result<OptimizerRun, GraphError> {
        graph.validate()?;
        let anchor = graph.anchor_room_id().ok_or(GraphError::Empty)?;

        let mut state = OptimizerState::Initializing;
        let (mut snapshot, mut signals) = self.initialize(graph, anchor);
        let adjacency = graph.room_graph();
        let mut passes: Vec<PassReport> = Vec::new();

        for iteration in 1..=self.config.max_iterations {
            state = OptimizerState::Aligning { iteration };
            let (next, report) = self.run_pass(graph, anchor, &adjacency, &snapshot, iteration);
            debug!(
                iteration,
                max_displacement = report.max_displacement,
                overlaps = report.overlaps,
                infeasible = report.infeasible.len(),
                "alignment pass"
            );
            snapshot = next;
            let settled = report.is_settled(self.config.convergence_threshold);
            passes.push(report);
            if settled {
                state = OptimizerState::Converged;
                break;
            }
        }

        let max_displacement = passes.last().map_or(0.0, |p| p.max_displacement);
        if state == OptimizerState::Converged {
            info!(iterations = passes.len(), "layout converged");
        } else {
            state = OptimizerState::Exhausted;
            warn!(
                iterations = passes.len(),
                max_displacement, "iteration budget exhausted before convergence"
            );
            signals.push(Signal::NonConvergence {
                iterations: passes.len(),
                max_displacement,
            });
        }

        // only the final pass describes the returned geometry
        if let Some(last) = passes.last() {
            for signal in &last.infeasible {
                if let Signal::InfeasibleConstraint { room_a, room_b, reason } = signal {
                    warn!(%room_a, %room_b, ?reason, "adjacency could not be fully aligned");
                }
            }
            signals.extend(last.infeasible.iter().cloned());
        }

        let layout = self.finish(
            graph,
            &snapshot,
            signals,
            state == OptimizerState::Converged,
            passes.len(),
        );
        Ok(OptimizerRun {
            layout,
            state,
            passes,
        })
    }

    /// Assign templates, place rooms and build the first snapshot
    pub fn initialize(&self, graph: &LayoutGraph, anchor: &str) -> (LayoutSnapshot, Vec<Signal>) {
        let mut signals = Vec::new();
        let mut assigned = Vec::with_capacity(graph.rooms.len());
        for room in &graph.rooms {
            let assignment = self.library.assign_for_room(room);
            if assignment.fallback {
                warn!(room = %room.id, label = %room.label, "unknown room label, using generic rectangle");
                signals.push(Signal::ShapeAssignmentFallback {
                    room_id: room.id.clone(),
                    label: room.label.clone(),
                });
            }
            assigned.push((room, assignment.template));
        }

        let footprints: HashMap<String, Footprint> = assigned
            .iter()
            .map(|(room, template)| (room.id.clone(), Footprint::of(template)))
            .collect();
        let positions = compute_initial_positions(graph, &footprints, &self.config);

        let instances = assigned
            .into_iter()
            .map(|(room, template)| {
                let at = positions.get(&room.id).copied().unwrap_or(Point::ORIGIN);
                ShapeInstance::new(
                    room.id.clone(),
                    template,
                    at,
                    0.0,
                    ShapeBounds::for_room(room, self.config.area_tolerance),
                )
                .with_fixed(room.id == anchor)
            })
            .collect();
        (LayoutSnapshot::new(instances), signals)
    }

    /// One sweep over the edges followed by overlap separation.
    ///
    /// The reference of each edge is its fixed endpoint, else the endpoint
    /// already visited in this pass, else `room_a`. The movable endpoint is
    /// seated clear of every other room where a free wall allows it.
    pub fn run_pass(
        &self,
        graph: &LayoutGraph,
        anchor: &str,
        adjacency: &RoomGraph,
        before: &LayoutSnapshot,
        iteration: usize,
    ) -> (LayoutSnapshot, PassReport) {
        let aligner = EdgeAligner::new(&self.config);
        let resolver = OverlapResolver::new(&self.config);

        let mut current = before.clone();
        let mut visited: HashSet<&str> = HashSet::from([anchor]);
        let mut infeasible = Vec::new();

        for edge in &graph.edges {
            let (a, b) = (edge.room_a.as_str(), edge.room_b.as_str());
            let (Some(inst_a), Some(inst_b)) = (current.get(a), current.get(b)) else {
                continue;
            };
            let a_is_reference = if inst_a.fixed != inst_b.fixed {
                inst_a.fixed
            } else {
                visited.contains(a) || !visited.contains(b)
            };
            let (reference, movable) = if a_is_reference {
                (inst_a, inst_b)
            } else {
                (inst_b, inst_a)
            };
            visited.insert(a);
            visited.insert(b);
            if movable.fixed {
                continue;
            }

            let alignment = {
                let obstacles: Vec<&ShapeInstance> = current
                    .instances()
                    .iter()
                    .filter(|i| i.room_id != reference.room_id && i.room_id != movable.room_id)
                    .collect();
                aligner.align_clear_of(reference, movable, &obstacles)
            };
            if let Some(reason) = alignment.residual {
                infeasible.push(Signal::InfeasibleConstraint {
                    room_a: a.to_string(),
                    room_b: b.to_string(),
                    reason,
                });
            }
            current.replace(alignment.instance);
        }

        let overlaps = resolver.detect(current.instances(), adjacency);
        for displacement in resolver.resolve(current.instances(), &overlaps) {
            current.translate(&displacement.room_id, displacement.offset);
        }

        let report = PassReport {
            iteration,
            max_displacement: current.max_displacement(before),
            overlaps: overlaps.len(),
            infeasible,
        };
        (current, report)
    }

    fn finish(
        &self,
        graph: &LayoutGraph,
        snapshot: &LayoutSnapshot,
        signals: Vec<Signal>,
        converged: bool,
        iterations_used: usize,
    ) -> PlacedLayout {
        let rooms: BTreeMap<String, PlacedRoom> = graph
            .rooms
            .iter()
            .filter_map(|spec| {
                let inst = snapshot.get(&spec.id)?;
                let placed = PlacedRoom {
                    id: spec.id.clone(),
                    label: spec.label.clone(),
                    shape: inst.template.kind(),
                    vertices: inst.polygon().vertices().to_vec(),
                    area: inst.area(),
                    target_area: spec.target_area,
                    anchor: inst.anchor,
                    rotation: inst.rotation,
                    fixed: inst.fixed,
                    metadata: spec.metadata.clone(),
                };
                Some((spec.id.clone(), placed))
            })
            .collect();
        let total_area = rooms.values().map(|r| r.area).sum();
        PlacedLayout {
            metadata: LayoutMetadata {
                total_area,
                room_count: rooms.len(),
                converged,
                iterations_used,
                signals,
            },
            rooms,
            adjacencies: graph.edges.clone(),
        }
    }
}
