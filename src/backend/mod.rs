//Cvsp
//Copyright (C) 2022-2024 A. Dubray
//
//This program is free software: you can redistribute it and/or modify
//it under the terms of the GNU Affero General Public License as published by
//the Free Software Foundation, either version 3 of the License, or
//(at your option) any later version.
//
//This program is distributed in the hope that it will be useful,
//but WITHOUT ANY WARRANTY; without even the implied warranty of
//MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//GNU Affero General Public License for more details.
//
//You should have received a copy of the GNU Affero General Public License
//along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! This module provides the interface between the formulations and the 0-1 solvers.
//!
//! A backend receives a model made of binary variables, linear constraints and one linear
//! objective, solves it once and exposes the values of the variables. The bookkeeping shared by
//! every backend (names, normalization of the expressions, finalization) is done by the `Model`
//! structure; an implementation only has to provide the actual optimization in `solve`.
//!
//! Two implementations are available:
//!     1. `TrailBackend`, a depth-first branch and bound with bounds propagation whose domains
//!        are stored on a trail.
//!     2. `SimplexBackend`, a LP based branch and bound provided by the `microlp` crate.

use std::time::Duration;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::common::{Library, Status, FLOAT_CMP_THRESHOLD};
use crate::error::CvspError;

pub mod simplex;
pub mod trail;

pub use simplex::SimplexBackend;
pub use trail::TrailBackend;

/// Abstraction used as a typesafe way of retrieving a variable of a model
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VarIndex(pub usize);

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Relation {
    Le,
    Ge,
    Eq,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Sense {
    #[default]
    Minimize,
    Maximize,
}

/// Affine combination of the variables of a model
#[derive(Debug, Clone, Default)]
pub struct LinearExpr {
    terms: Vec<(VarIndex, f64)>,
    constant: f64,
}

impl LinearExpr {

    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of the given variables, each with coefficient 1
    pub fn sum<I: IntoIterator<Item = VarIndex>>(variables: I) -> Self {
        Self {
            terms: variables.into_iter().map(|v| (v, 1.0)).collect(),
            constant: 0.0,
        }
    }

    pub fn term(mut self, variable: VarIndex, coefficient: f64) -> Self {
        self.terms.push((variable, coefficient));
        self
    }

    pub fn constant(mut self, constant: f64) -> Self {
        self.constant += constant;
        self
    }

    pub fn add_term(&mut self, variable: VarIndex, coefficient: f64) {
        self.terms.push((variable, coefficient));
    }

    pub fn terms(&self) -> &[(VarIndex, f64)] {
        &self.terms
    }

    pub fn constant_value(&self) -> f64 {
        self.constant
    }
}

/// A linear constraint whose terms are merged and whose constant is moved to the right hand side
#[derive(Debug, Clone)]
pub struct Constraint {
    terms: Vec<(VarIndex, f64)>,
    relation: Relation,
    rhs: f64,
}

impl Constraint {

    pub fn terms(&self) -> &[(VarIndex, f64)] {
        &self.terms
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    pub fn rhs(&self) -> f64 {
        self.rhs
    }

    /// Returns true if the constraint holds for the given values
    pub fn is_satisfied(&self, values: &[f64]) -> bool {
        let activity = self.terms.iter().map(|(v, c)| c * values[v.0]).sum::<f64>();
        match self.relation {
            Relation::Le => activity <= self.rhs + FLOAT_CMP_THRESHOLD,
            Relation::Ge => activity >= self.rhs - FLOAT_CMP_THRESHOLD,
            Relation::Eq => (activity - self.rhs).abs() <= FLOAT_CMP_THRESHOLD,
        }
    }
}

/// Values found by a backend for an optimal solve
#[derive(Debug, Clone)]
pub struct Assignment {
    values: Vec<f64>,
    objective: f64,
}

impl Assignment {

    pub fn new(values: Vec<f64>, objective: f64) -> Self {
        Self { values, objective }
    }
}

/// Model state shared by all the backends
#[derive(Debug, Default)]
pub struct Model {
    /// Names of the variables
    names: Vec<String>,
    /// Names already used in the model
    used_names: FxHashSet<String>,
    constraints: Vec<Constraint>,
    /// Merged terms of the objective
    objective: Vec<(VarIndex, f64)>,
    objective_constant: f64,
    sense: Sense,
    /// True once the model has been solved
    finalized: bool,
}

impl Model {

    pub fn add_variable(&mut self, name: &str) -> Result<VarIndex, CvspError> {
        self.check_open()?;
        if !self.used_names.insert(name.to_string()) {
            return Err(CvspError::DuplicateVariable(name.to_string()));
        }
        self.names.push(name.to_string());
        Ok(VarIndex(self.names.len() - 1))
    }

    pub fn add_constraint(&mut self, expr: LinearExpr, relation: Relation, rhs: f64) -> Result<(), CvspError> {
        self.check_open()?;
        let terms = self.merge(&expr)?;
        self.constraints.push(Constraint {
            terms,
            relation,
            rhs: rhs - expr.constant,
        });
        Ok(())
    }

    pub fn set_objective(&mut self, expr: LinearExpr, sense: Sense) -> Result<(), CvspError> {
        self.check_open()?;
        self.objective = self.merge(&expr)?;
        self.objective_constant = expr.constant;
        self.sense = sense;
        Ok(())
    }

    /// Marks the model as solved. No modification is accepted afterwards.
    pub fn finalize(&mut self) {
        self.finalized = true;
    }

    fn check_open(&self) -> Result<(), CvspError> {
        if self.finalized {
            Err(CvspError::ModelFinalized)
        } else {
            Ok(())
        }
    }

    /// Merges the terms on the same variable and drops the null coefficients
    fn merge(&self, expr: &LinearExpr) -> Result<Vec<(VarIndex, f64)>, CvspError> {
        let mut coefficients: FxHashMap<VarIndex, f64> = FxHashMap::default();
        for (variable, coefficient) in expr.terms.iter().copied() {
            if variable.0 >= self.names.len() {
                return Err(CvspError::UnknownVariable(variable.0));
            }
            *coefficients.entry(variable).or_insert(0.0) += coefficient;
        }
        let mut terms = coefficients.into_iter().filter(|(_, c)| c.abs() > FLOAT_CMP_THRESHOLD).collect::<Vec<(VarIndex, f64)>>();
        terms.sort_by_key(|(v, _)| *v);
        Ok(terms)
    }

    pub fn number_variables(&self) -> usize {
        self.names.len()
    }

    pub fn number_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn name(&self, variable: VarIndex) -> &str {
        &self.names[variable.0]
    }

    pub fn constraints_iter(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter()
    }

    pub fn objective(&self) -> &[(VarIndex, f64)] {
        &self.objective
    }

    pub fn objective_constant(&self) -> f64 {
        self.objective_constant
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    /// Value of the objective for the given values of the variables
    pub fn evaluate_objective(&self, values: &[f64]) -> f64 {
        self.objective_constant + self.objective.iter().map(|(v, c)| c * values[v.0]).sum::<f64>()
    }
}

/// Interface of a 0-1 linear solver. A backend holds exactly one model and can be solved once.
pub trait Backend {

    fn model(&self) -> &Model;
    fn model_mut(&mut self) -> &mut Model;
    /// Values of the last optimal solve, if any
    fn assignment(&self) -> Option<&Assignment>;
    /// Solves the model with an optional time limit and finalizes it
    fn solve(&mut self, time_limit: Option<Duration>) -> Result<Status, CvspError>;

    fn create_binary_var(&mut self, name: &str) -> Result<VarIndex, CvspError> {
        self.model_mut().add_variable(name)
    }

    fn add_linear_constraint(&mut self, expr: LinearExpr, relation: Relation, rhs: f64) -> Result<(), CvspError> {
        self.model_mut().add_constraint(expr, relation, rhs)
    }

    fn set_objective(&mut self, expr: LinearExpr, sense: Sense) -> Result<(), CvspError> {
        self.model_mut().set_objective(expr, sense)
    }

    fn value_of(&self, variable: VarIndex) -> Result<f64, CvspError> {
        let assignment = self.assignment().ok_or(CvspError::NoSolution)?;
        assignment.values.get(variable.0).copied().ok_or(CvspError::UnknownVariable(variable.0))
    }

    fn objective_value(&self) -> Result<f64, CvspError> {
        self.assignment().map(|a| a.objective).ok_or(CvspError::NoSolution)
    }

    fn number_variables(&self) -> usize {
        self.model().number_variables()
    }

    fn number_constraints(&self) -> usize {
        self.model().number_constraints()
    }
}

impl Library {

    /// Creates an empty backend of this library
    pub fn new_backend(&self) -> Box<dyn Backend> {
        match self {
            Library::Simplex => Box::new(SimplexBackend::default()),
            Library::Trail => Box::new(TrailBackend::default()),
        }
    }
}
