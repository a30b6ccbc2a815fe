//! Wall-to-wall alignment of adjacent rooms
//!
//! Given a reference room and a movable neighbour, the aligner picks the
//! pair of walls that should meet, then:
//!
//! 1. rotates the movable room so its wall is antiparallel to the reference
//!    wall (outward normals facing each other),
//! 2. stretches the movable room along one local axis, within its area and
//!    aspect bounds, so the two walls have the same length,
//! 3. translates it so the walls touch with the shorter one inside the
//!    span of the longer.
//!
//! When that seat lands on the reference or on another room, the aligner
//! slides to the ends of the span and then tries the next wall pair. The
//! reference room is never modified.

use tracing::{debug, trace};

use crate::shapes::Axis;

use super::config::SolverConfig;
use super::geometry::{Polygon, Segment};
use super::solver::{solve_extent, ConstraintSource, ExtentConstraint, ExtentVariable, SolverError};
use super::transform::{direction_degrees, normalize_degrees, RotationTransform, ANGLE_EPSILON};
use super::types::{Infeasibility, Point, ShapeInstance};

/// Walls selected to meet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgePair {
    pub reference_edge: usize,
    pub movable_edge: usize,
    pub midpoint_distance: f64,
    /// The walls already touch, antiparallel, with overlapping spans
    pub seated: bool,
}

/// Outcome of aligning one movable room against a reference
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    pub instance: ShapeInstance,
    pub edges: Option<EdgePair>,
    /// Set when the walls could not be made the same length
    pub residual: Option<Infeasibility>,
}

impl Alignment {
    pub fn is_feasible(&self) -> bool {
        self.residual.is_none()
    }
}

/// Stateless alignment operator
#[derive(Debug, Clone, Copy)]
pub struct EdgeAligner {
    length_tolerance: f64,
    gap_tolerance: f64,
    overlap_tolerance: f64,
}

/// A wall pair with the measures it is ranked by
#[derive(Debug, Clone, Copy)]
struct Candidate {
    pair: EdgePair,
    length_gap: f64,
    contact: f64,
}

/// A seated placement and the floor it shares with other rooms
#[derive(Debug, Clone)]
struct Seat {
    alignment: Alignment,
    on_reference: f64,
    total: f64,
}

impl EdgeAligner {
    pub fn new(config: &SolverConfig) -> Self {
        Self {
            length_tolerance: config.length_tolerance,
            gap_tolerance: config.gap_tolerance,
            overlap_tolerance: config.overlap_tolerance,
        }
    }

    /// Choose the walls to join: the best entry of [`Self::ranked_edges`]
    pub fn closest_edges(&self, reference: &Polygon, movable: &Polygon) -> Option<EdgePair> {
        self.ranked_edges(reference, movable).into_iter().next()
    }

    /// Every wall pair, best first.
    ///
    /// Wall pairs that are already seated rank first, longest contact first,
    /// so aligning an aligned pair again keeps the same walls. Otherwise the
    /// pair whose midpoints are closest wins, ties going to the pair whose
    /// lengths differ least. Equal pairs keep edge order.
    pub fn ranked_edges(&self, reference: &Polygon, movable: &Polygon) -> Vec<EdgePair> {
        let mut pending: Vec<Candidate> = reference
            .edges()
            .enumerate()
            .flat_map(|(i, r)| {
                movable
                    .edges()
                    .enumerate()
                    .map(move |(j, m)| self.candidate(i, &r, j, &m))
            })
            .collect();

        let mut ranked = Vec::with_capacity(pending.len());
        while !pending.is_empty() {
            let mut best = 0;
            for k in 1..pending.len() {
                if self.outranks(&pending[k], &pending[best]) {
                    best = k;
                }
            }
            ranked.push(pending.remove(best).pair);
        }
        ranked
    }

    fn candidate(&self, i: usize, r: &Segment, j: usize, m: &Segment) -> Candidate {
        let seated = self.is_seated(r, m);
        Candidate {
            pair: EdgePair {
                reference_edge: i,
                movable_edge: j,
                midpoint_distance: r.midpoint().distance(m.midpoint()),
                seated,
            },
            length_gap: (r.length() - m.length()).abs(),
            contact: if seated {
                r.collinear_overlap(m, self.gap_tolerance)
            } else {
                0.0
            },
        }
    }

    fn outranks(&self, candidate: &Candidate, current: &Candidate) -> bool {
        let (c, b) = (&candidate.pair, &current.pair);
        if c.seated != b.seated {
            c.seated
        } else if c.seated && (candidate.contact - current.contact).abs() > self.gap_tolerance {
            candidate.contact > current.contact
        } else if (c.midpoint_distance - b.midpoint_distance).abs() > 1e-9 {
            c.midpoint_distance < b.midpoint_distance
        } else {
            candidate.length_gap < current.length_gap - 1e-9
        }
    }

    fn is_seated(&self, reference: &Segment, movable: &Segment) -> bool {
        reference.direction().dot(movable.direction()) < -1.0 + 1e-9
            && reference.collinear_overlap(movable, self.gap_tolerance) > self.gap_tolerance
    }

    /// Align `movable` against `reference` alone
    pub fn align(&self, reference: &ShapeInstance, movable: &ShapeInstance) -> Alignment {
        self.align_clear_of(reference, movable, &[])
    }

    /// Align `movable` against `reference`, keeping it off the reference and
    /// off `obstacles`.
    ///
    /// Wall pairs are tried best first. On each pair the seat nearest the
    /// current position comes first, then the two ends of the slide range.
    /// The first seat whose total overlap is within tolerance wins; failing
    /// that, the seat with the least overlap. A seat still covering the
    /// reference is reported as [`Infeasibility::ReferenceOverlap`].
    pub fn align_clear_of(
        &self,
        reference: &ShapeInstance,
        movable: &ShapeInstance,
        obstacles: &[&ShapeInstance],
    ) -> Alignment {
        let mut best: Option<Seat> = None;
        for pair in self.ranked_edges(reference.polygon(), movable.polygon()) {
            let ref_edge = reference.polygon().edge(pair.reference_edge);
            let rotated = self.rotate_antiparallel(&ref_edge, movable, pair.movable_edge);
            let (resized, residual) = self.reconcile_length(&ref_edge, &rotated, pair.movable_edge);
            let mov_edge = resized.polygon().edge(pair.movable_edge);

            for offset in seat_offsets(&ref_edge, &mov_edge) {
                let instance = resized.translated(offset);
                let on_reference = instance.polygon().intersection_area(reference.polygon());
                let total = on_reference
                    + obstacles
                        .iter()
                        .map(|o| instance.polygon().intersection_area(o.polygon()))
                        .sum::<f64>();
                let seat = Seat {
                    alignment: Alignment {
                        instance,
                        edges: Some(pair),
                        residual: residual.clone(),
                    },
                    on_reference,
                    total,
                };
                if total <= self.overlap_tolerance {
                    trace!(
                        reference = %reference.room_id,
                        movable = %movable.room_id,
                        ref_edge = pair.reference_edge,
                        mov_edge = pair.movable_edge,
                        dx = offset.x,
                        dy = offset.y,
                        "aligned walls"
                    );
                    return seat.alignment;
                }
                if best.as_ref().map_or(true, |b| total < b.total) {
                    best = Some(seat);
                }
            }
        }

        let Some(mut seat) = best else {
            return Alignment {
                instance: movable.clone(),
                edges: None,
                residual: None,
            };
        };
        debug!(
            reference = %reference.room_id,
            movable = %movable.room_id,
            overlap = seat.total,
            "no clear seat, keeping the least overlapping one"
        );
        if seat.on_reference > self.overlap_tolerance {
            seat.alignment.residual = Some(Infeasibility::ReferenceOverlap {
                area: seat.on_reference,
            });
        }
        seat.alignment
    }

    /// Rotate so the movable wall runs opposite the reference wall
    fn rotate_antiparallel(
        &self,
        ref_edge: &Segment,
        movable: &ShapeInstance,
        edge_index: usize,
    ) -> ShapeInstance {
        let mov_edge = movable.polygon().edge(edge_index);
        let mut delta = direction_degrees(ref_edge.vector()) - direction_degrees(mov_edge.vector());
        let turned_normal =
            RotationTransform::about_origin(delta).transform_vector(mov_edge.outward_normal());
        if ref_edge.outward_normal().dot(turned_normal) > 0.0 {
            delta += 180.0;
        }
        let delta = normalize_degrees(delta);
        if delta.abs() < ANGLE_EPSILON {
            movable.clone()
        } else {
            movable.rotated_by(delta)
        }
    }

    /// Stretch the movable room along the local axis of its wall so the wall
    /// matches `ref_edge`, within area, aspect and minimum-dimension bounds
    fn reconcile_length(
        &self,
        ref_edge: &Segment,
        movable: &ShapeInstance,
        edge_index: usize,
    ) -> (ShapeInstance, Option<Infeasibility>) {
        let target_len = ref_edge.length();
        let local_edge = movable.template.local_polygon().edge(edge_index);
        let current_len = local_edge.length();
        if (target_len - current_len).abs() <= self.length_tolerance {
            return (movable.clone(), None);
        }

        let Some(axis) = local_edge.axis() else {
            return (
                movable.clone(),
                Some(Infeasibility::SlantedEdge { edge_index }),
            );
        };

        let d0 = movable.template.extent(axis);
        let preferred = d0 * target_len / current_len;
        match solve_resize(movable, axis, preferred) {
            Ok(d) => {
                let resized = if (d - d0).abs() > 1e-12 {
                    movable.with_template(movable.template.with_extent(axis, d))
                } else {
                    movable.clone()
                };
                let achieved = current_len * d / d0;
                let residual = ((target_len - achieved).abs() > self.length_tolerance).then(|| {
                    Infeasibility::LengthMismatch {
                        reference_length: target_len,
                        movable_length: achieved,
                    }
                });
                (resized, residual)
            }
            Err(e) => (
                movable.clone(),
                Some(Infeasibility::Unsatisfiable {
                    reason: e.to_string(),
                }),
            ),
        }
    }
}

/// Solve for the new extent `d` along `axis`.
///
/// Stretching one axis scales the area linearly, so every bound is a
/// simple interval on `d`. The aspect bound depends on whether `axis` ends
/// up as the long or the short side; both branches are solved and the one
/// landing closer to `preferred` wins.
fn solve_resize(movable: &ShapeInstance, axis: Axis, preferred: f64) -> Result<f64, SolverError> {
    let d0 = movable.template.extent(axis);
    let other = movable.template.extent(axis.other());
    let area_per_extent = movable.template.area() / d0;
    let bounds = movable.bounds;
    let (aspect_min, aspect_max) = bounds.aspect_ratio_range;
    let var = ExtentVariable::new(&movable.room_id, axis);

    let at_least = |value: f64, source: ConstraintSource| ExtentConstraint::AtLeast {
        variable: var.clone(),
        value,
        source,
    };
    let at_most = |value: f64, source: ConstraintSource| ExtentConstraint::AtMost {
        variable: var.clone(),
        value,
        source,
    };

    let shared = vec![
        at_least(
            bounds.min_dimension,
            ConstraintSource::min_dimension(format!("{} min dimension", movable.room_id)),
        ),
        at_least(
            bounds.min_area / area_per_extent,
            ConstraintSource::area(format!("{} min area", movable.room_id)),
        ),
        at_most(
            bounds.max_area / area_per_extent,
            ConstraintSource::area(format!("{} max area", movable.room_id)),
        ),
    ];

    let long_side = [
        at_least(
            aspect_min * other,
            ConstraintSource::aspect(format!("{} aspect (long side)", movable.room_id)),
        ),
        at_most(
            aspect_max * other,
            ConstraintSource::aspect(format!("{} aspect (long side)", movable.room_id)),
        ),
    ];
    let short_side = [
        at_least(
            other / aspect_max,
            ConstraintSource::aspect(format!("{} aspect (short side)", movable.room_id)),
        ),
        at_most(
            other / aspect_min,
            ConstraintSource::aspect(format!("{} aspect (short side)", movable.room_id)),
        ),
    ];

    let mut best: Option<f64> = None;
    let mut last_err = None;
    for branch in [long_side, short_side] {
        let mut constraints = shared.clone();
        constraints.extend(branch);
        match solve_extent(&var, constraints, preferred) {
            Ok(d) => {
                if best.map_or(true, |b| (d - preferred).abs() < (b - preferred).abs()) {
                    best = Some(d);
                }
            }
            Err(e) => last_err = Some(e),
        }
    }
    match (best, last_err) {
        (Some(d), _) => Ok(d),
        (None, Some(e)) => Err(e),
        (None, None) => Err(SolverError::Internal("no resize branch attempted".into())),
    }
}

/// Translations that close the gap between the walls and slide the
/// movable wall so it lies within the span of the reference wall (or covers
/// it, if longer). The least slide comes first, then both ends of the slide
/// range, nearest first.
fn seat_offsets(ref_edge: &Segment, mov_edge: &Segment) -> Vec<Point> {
    let dir = ref_edge.direction();
    let normal = ref_edge.outward_normal();
    let rel = mov_edge.midpoint() - ref_edge.midpoint();
    let normal_gap = rel.dot(normal);
    let tangential = rel.dot(dir);
    let slack = (ref_edge.length() - mov_edge.length()).abs() / 2.0;

    let mut slides = vec![tangential.clamp(-slack, slack)];
    let mut ends = [-slack, slack];
    ends.sort_by(|a, b| (a - tangential).abs().total_cmp(&(b - tangential).abs()));
    for end in ends {
        if slides.iter().all(|s| (s - end).abs() > 1e-9) {
            slides.push(end);
        }
    }
    slides
        .into_iter()
        .map(|slide| normal * (-normal_gap) + dir * (slide - tangential))
        .collect()
}
