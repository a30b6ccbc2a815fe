//! Constraint solver integration for room resizing
//!
//! This module wraps the kasuari Cassowary solver. Room extents become solver
//! variables bounded by hard (required) area, aspect and dimension limits,
//! and the extent the aligner would like is a strong edit suggestion, so the
//! solution is the feasible value closest to it.

use std::collections::HashMap;

use kasuari::{
    Solver as KasuariSolver, Strength, Variable as KasuariVariable, WeightedRelation::*,
};
use thiserror::Error;

use crate::shapes::Axis;

// ============================================================================
// Variables
// ============================================================================

/// One local-axis extent of one room
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtentVariable {
    pub room_id: String,
    pub axis: Axis,
}

impl ExtentVariable {
    pub fn new(room_id: impl Into<String>, axis: Axis) -> Self {
        Self {
            room_id: room_id.into(),
            axis,
        }
    }
}

// ============================================================================
// Constraint sources
// ============================================================================

/// What a constraint encodes (for error messages)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOrigin {
    /// Target area ± tolerance
    AreaBound,
    /// Long/short ratio range
    AspectBound,
    /// Minimum room dimension
    MinDimension,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintSource {
    pub description: String,
    pub origin: ConstraintOrigin,
}

impl ConstraintSource {
    pub fn area(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            origin: ConstraintOrigin::AreaBound,
        }
    }

    pub fn aspect(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            origin: ConstraintOrigin::AspectBound,
        }
    }

    pub fn min_dimension(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            origin: ConstraintOrigin::MinDimension,
        }
    }
}

/// A hard bound on an extent
#[derive(Debug, Clone)]
pub enum ExtentConstraint {
    AtLeast {
        variable: ExtentVariable,
        value: f64,
        source: ConstraintSource,
    },
    AtMost {
        variable: ExtentVariable,
        value: f64,
        source: ConstraintSource,
    },
}

impl ExtentConstraint {
    pub fn source(&self) -> &ConstraintSource {
        match self {
            Self::AtLeast { source, .. } | Self::AtMost { source, .. } => source,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, Error)]
pub enum SolverError {
    #[error("unsatisfiable constraints: {reason}")]
    Unsatisfiable {
        conflicting: Vec<ConstraintSource>,
        reason: String,
    },

    #[error("internal solver error: {0}")]
    Internal(String),
}

// ============================================================================
// Solver
// ============================================================================

/// Wrapper around the kasuari solver
pub struct ConstraintSolver {
    solver: KasuariSolver,
    variables: HashMap<ExtentVariable, KasuariVariable>,
    sources: Vec<ConstraintSource>,
}

impl Default for ConstraintSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstraintSolver {
    pub fn new() -> Self {
        Self {
            solver: KasuariSolver::new(),
            variables: HashMap::new(),
            sources: Vec::new(),
        }
    }

    fn get_or_create_var(&mut self, var: &ExtentVariable) -> KasuariVariable {
        if let Some(&kvar) = self.variables.get(var) {
            kvar
        } else {
            let kvar = KasuariVariable::new();
            self.variables.insert(var.clone(), kvar);
            kvar
        }
    }

    fn convert_kasuari_error(
        &self,
        e: kasuari::AddConstraintError,
        source: &ConstraintSource,
        constraint_desc: &str,
    ) -> SolverError {
        match e {
            kasuari::AddConstraintError::UnsatisfiableConstraint => {
                let mut conflicting = vec![source.clone()];
                conflicting.extend(self.sources.iter().cloned());
                SolverError::Unsatisfiable {
                    conflicting,
                    reason: format!(
                        "cannot satisfy {}: conflicts with existing bounds",
                        constraint_desc
                    ),
                }
            }
            kasuari::AddConstraintError::DuplicateConstraint => {
                SolverError::Internal(format!("duplicate constraint: {}", constraint_desc))
            }
            kasuari::AddConstraintError::InternalSolverError(msg) => {
                SolverError::Internal(format!("{}: {}", constraint_desc, msg))
            }
        }
    }

    /// Add a required bound
    pub fn add_constraint(&mut self, constraint: ExtentConstraint) -> Result<(), SolverError> {
        match &constraint {
            ExtentConstraint::AtLeast {
                variable,
                value,
                source,
            } => {
                let expr: kasuari::Expression = self.get_or_create_var(variable).into();
                let desc = format!("{}.{:?} >= {:.3}", variable.room_id, variable.axis, value);
                self.solver
                    .add_constraint(expr | GE(Strength::REQUIRED) | *value)
                    .map_err(|e| self.convert_kasuari_error(e, source, &desc))?;
                self.sources.push(source.clone());
            }
            ExtentConstraint::AtMost {
                variable,
                value,
                source,
            } => {
                let expr: kasuari::Expression = self.get_or_create_var(variable).into();
                let desc = format!("{}.{:?} <= {:.3}", variable.room_id, variable.axis, value);
                self.solver
                    .add_constraint(expr | LE(Strength::REQUIRED) | *value)
                    .map_err(|e| self.convert_kasuari_error(e, source, &desc))?;
                self.sources.push(source.clone());
            }
        }
        Ok(())
    }

    /// Pull a variable towards `value` without overriding required bounds
    pub fn suggest_value(&mut self, variable: &ExtentVariable, value: f64) -> Result<(), SolverError> {
        let kvar = self.get_or_create_var(variable);
        self.solver
            .add_edit_variable(kvar, Strength::STRONG)
            .map_err(|e| SolverError::Internal(format!("failed to add edit variable: {}", e)))?;
        self.solver
            .suggest_value(kvar, value)
            .map_err(|e| SolverError::Internal(format!("failed to suggest value: {}", e)))?;
        Ok(())
    }

    /// Read back every variable. Variables the solver never moved off zero
    /// are reported as zero.
    pub fn solve(&mut self) -> Solution {
        let mut values: HashMap<ExtentVariable, f64> = self
            .variables
            .keys()
            .map(|var| (var.clone(), 0.0))
            .collect();
        for (kvar, value) in self.solver.fetch_changes() {
            for (our_var, &k) in &self.variables {
                if k == *kvar {
                    values.insert(our_var.clone(), *value);
                }
            }
        }
        Solution { values }
    }
}

/// Values the solver settled on
#[derive(Debug, Clone)]
pub struct Solution {
    pub values: HashMap<ExtentVariable, f64>,
}

impl Solution {
    pub fn get(&self, var: &ExtentVariable) -> Option<f64> {
        self.values.get(var).copied()
    }
}

/// Solve a single bounded extent: the value within `constraints` closest to
/// `preferred`
pub fn solve_extent(
    variable: &ExtentVariable,
    constraints: Vec<ExtentConstraint>,
    preferred: f64,
) -> Result<f64, SolverError> {
    let mut solver = ConstraintSolver::new();
    for c in constraints {
        solver.add_constraint(c)?;
    }
    solver.suggest_value(variable, preferred)?;
    solver
        .solve()
        .get(variable)
        .ok_or_else(|| SolverError::Internal(format!("no value for {}", variable.room_id)))
}
