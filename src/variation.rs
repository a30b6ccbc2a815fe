//! Seeded layout variations
//!
//! Each run jitters every room's target area and aspect ratio, then solves
//! the perturbed graph with the same optimizer. Runs share nothing but the
//! input graph, so the parallel form returns exactly what the sequential
//! form does, in run order.

use std::thread;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, GraphError};
use crate::graph::{LayoutGraph, MetaValue};
use crate::layout::{LayoutOptimizer, PlacedLayout};
use crate::shapes::ASPECT_RATIO_KEY;
use crate::SolveError;

/// Jitter applied per run, as fractions of the original value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VariationConfig {
    /// 0.10 samples areas in [0.9, 1.1] × target
    pub area_jitter: f64,
    /// 0.20 samples aspect ratios in [0.8, 1.2] × current
    pub aspect_jitter: f64,
}

impl VariationConfig {
    /// Both fractions must be finite and in `[0, 1)`, so every sampled scale
    /// stays positive
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("area_jitter", self.area_jitter),
            ("aspect_jitter", self.aspect_jitter),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::invalid(key, format!("must be finite, got {value}")));
            }
            if !(0.0..1.0).contains(&value) {
                return Err(ConfigError::invalid(
                    key,
                    format!("must be in [0, 1), got {value}"),
                ));
            }
        }
        Ok(())
    }
}

impl Default for VariationConfig {
    fn default() -> Self {
        Self {
            area_jitter: 0.10,
            aspect_jitter: 0.20,
        }
    }
}

/// Independent RNG for one run: `seed` picks the key, `run` the stream
pub fn run_rng(seed: u64, run: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(run as u64);
    rng
}

#[derive(Debug, Clone, Default)]
pub struct VariationGenerator {
    optimizer: LayoutOptimizer,
    config: VariationConfig,
}

impl VariationGenerator {
    pub fn new(optimizer: LayoutOptimizer) -> Self {
        Self {
            optimizer,
            config: VariationConfig::default(),
        }
    }

    pub fn with_config(mut self, config: VariationConfig) -> Self {
        self.config = config;
        self
    }

    /// Copy of `graph` with every room's area and aspect ratio jittered
    pub fn resample(&self, graph: &LayoutGraph, rng: &mut impl Rng) -> LayoutGraph {
        let library = self.optimizer.library();
        let mut varied = graph.clone();
        for room in &mut varied.rooms {
            let area_scale = jitter(rng, self.config.area_jitter);
            room.target_area *= area_scale;

            let aspect = room
                .metadata
                .get(ASPECT_RATIO_KEY)
                .and_then(MetaValue::as_f64)
                .unwrap_or_else(|| library.assign_for_room(room).template.aspect_ratio());
            let aspect = (aspect * jitter(rng, self.config.aspect_jitter)).max(1.0);
            room.metadata
                .insert(ASPECT_RATIO_KEY.to_string(), MetaValue::Number(aspect));
        }
        varied
    }

    /// Solve `count` jittered copies of `graph` one after another
    pub fn generate(
        &self,
        graph: &LayoutGraph,
        count: usize,
        seed: u64,
    ) -> Result<Vec<PlacedLayout>, SolveError> {
        self.config.validate()?;
        graph.validate()?;
        let layouts = (0..count)
            .map(|run| self.run(graph, seed, run))
            .collect::<Result<Vec<_>, GraphError>>()?;
        Ok(layouts)
    }

    /// Same result as [`generate`](Self::generate), one scoped thread per run
    pub fn generate_parallel(
        &self,
        graph: &LayoutGraph,
        count: usize,
        seed: u64,
    ) -> Result<Vec<PlacedLayout>, SolveError> {
        self.config.validate()?;
        graph.validate()?;
        let layouts = thread::scope(|scope| {
            let handles: Vec<_> = (0..count)
                .map(|run| scope.spawn(move || self.run(graph, seed, run)))
                .collect();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect::<Result<Vec<_>, GraphError>>()
        })?;
        Ok(layouts)
    }

    fn run(&self, graph: &LayoutGraph, seed: u64, run: usize) -> Result<PlacedLayout, GraphError> {
        let mut rng = run_rng(seed, run);
        let varied = self.resample(graph, &mut rng);
        let layout = self.optimizer.optimize(&varied)?;
        debug!(
            seed,
            run,
            converged = layout.metadata.converged,
            total_area = layout.metadata.total_area,
            "variation solved"
        );
        Ok(layout)
    }
}

fn jitter(rng: &mut impl Rng, fraction: f64) -> f64 {
    if fraction <= 0.0 {
        return 1.0;
    }
    rng.gen_range((1.0 - fraction)..=(1.0 + fraction))
}

/// `count` variations of `graph` with the default optimizer and jitter
pub fn generate_variations(
    graph: &LayoutGraph,
    count: usize,
    seed: u64,
) -> Result<Vec<PlacedLayout>, SolveError> {
    VariationGenerator::default().generate(graph, count, seed)
}

/// Parallel form of [`generate_variations`]; identical output
pub fn generate_variations_parallel(
    graph: &LayoutGraph,
    count: usize,
    seed: u64,
) -> Result<Vec<PlacedLayout>, SolveError> {
    VariationGenerator::default().generate_parallel(graph, count, seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RoomSpec;
    use pretty_assertions::assert_eq;

    fn graph() -> LayoutGraph {
        LayoutGraph::new()
            .with_room(RoomSpec::new("entrance", "Entrance", 4.0))
            .with_room(RoomSpec::new("kitchen", "Kitchen", 8.0))
            .with_edge("entrance", "kitchen")
    }

    #[test]
    fn test_same_seed_same_layouts() {
        let first = generate_variations(&graph(), 3, 7).unwrap();
        let second = generate_variations(&graph(), 3, 7).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_runs_and_seeds_differ() {
        let a = generate_variations(&graph(), 2, 1).unwrap();
        let b = generate_variations(&graph(), 1, 2).unwrap();
        assert_ne!(a[0].rooms, a[1].rooms);
        assert_ne!(a[0].rooms, b[0].rooms);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sequential = generate_variations(&graph(), 4, 99).unwrap();
        let parallel = generate_variations_parallel(&graph(), 4, 99).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_resample_stays_within_jitter() {
        let generator = VariationGenerator::default();
        let original = graph();
        for run in 0..10 {
            let varied = generator.resample(&original, &mut run_rng(3, run));
            for (before, after) in original.rooms.iter().zip(&varied.rooms) {
                let ratio = after.target_area / before.target_area;
                assert!((0.9 - 1e-12..=1.1 + 1e-12).contains(&ratio), "ratio {ratio}");
                let aspect = after.metadata[ASPECT_RATIO_KEY].as_f64().unwrap();
                assert!(aspect >= 1.0);
            }
        }
    }

    #[test]
    fn test_zero_jitter_keeps_areas() {
        let generator = VariationGenerator::default().with_config(VariationConfig {
            area_jitter: 0.0,
            aspect_jitter: 0.0,
        });
        let varied = generator.resample(&graph(), &mut run_rng(0, 0));
        assert_eq!(varied.rooms[1].target_area, 8.0);
    }

    #[test]
    fn test_invalid_graph_fails_before_any_run() {
        let broken = graph().with_edge("kitchen", "attic");
        assert!(generate_variations_parallel(&broken, 2, 0).is_err());
    }

    #[test]
    fn test_invalid_jitter_is_rejected() {
        for (area_jitter, aspect_jitter) in [
            (f64::NAN, 0.2),
            (0.1, f64::INFINITY),
            (1.0, 0.2),
            (0.1, 1.5),
            (-0.1, 0.2),
        ] {
            let config = VariationConfig {
                area_jitter,
                aspect_jitter,
            };
            assert!(config.validate().is_err(), "{config:?}");
            let generator = VariationGenerator::default().with_config(config);
            let err = generator.generate(&graph(), 2, 0).unwrap_err();
            assert!(matches!(err, SolveError::Config(ConfigError::Invalid { .. })));
            assert!(generator.generate_parallel(&graph(), 2, 0).is_err());
        }
        assert!(VariationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_nan_jitter_message_names_the_key() {
        let err = VariationConfig {
            area_jitter: f64::NAN,
            aspect_jitter: 0.2,
        }
        .validate()
        .unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"invalid setting 'area_jitter': must be finite, got NaN");
    }

    #[test]
    fn test_zero_count_is_empty() {
        assert!(generate_variations(&graph(), 0, 0).unwrap().is_empty());
    }
}
