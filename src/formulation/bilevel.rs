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

//! Models of the bilevel formulations.
//!
//! The master chooses a separator of minimum size that satisfies every cut generated so far. The
//! subproblem receives the separator and checks if the residual graph can be split into the
//! shores. When it can not, a cut removing the separator from the master is derived.
//! The master is rebuilt from scratch at each iteration, with all the accumulated cuts.

use std::time::Instant;

use super::*;
use crate::backend::Sense;
use crate::common::BINARY_THRESHOLD;

/// Constraint added to the master to remove rejected separators
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cut {
    /// At least one of the vertices must be in the separator
    Subset(Vec<VertexIndex>),
    /// The separator must differ from the given one on at least one vertex
    NoGood(Vec<bool>),
}

/// Separator proposed by an optimal master
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    in_separator: Vec<bool>,
    /// Objective of the master that proposed the candidate
    objective: f64,
}

impl Candidate {

    pub fn new(in_separator: Vec<bool>, objective: f64) -> Self {
        Self { in_separator, objective }
    }

    pub fn in_separator(&self) -> &[bool] {
        &self.in_separator
    }

    pub fn objective(&self) -> f64 {
        self.objective
    }

    pub fn size(&self) -> usize {
        self.in_separator.iter().filter(|s| **s).count()
    }

    /// Vertices that are not in the separator
    pub fn residual(&self) -> Vec<VertexIndex> {
        self.in_separator.iter().enumerate().filter(|(_, s)| !**s).map(|(v, _)| VertexIndex(v)).collect()
    }
}

/// Cuts known before the first master, valid for any shore policy. Returns `None` if the
/// deadline is reached during their enumeration.
pub fn seed_cuts(formulation: Formulation, graph: &Graph, parameters: &SolveParameters, deadline: Option<Instant>) -> Option<Vec<Cut>> {
    match formulation {
        // A connected set larger than the capacity can not be inside a single shore
        Formulation::ConnectedCuts => {
            let size = parameters.b().saturating_add(1);
            let sets = graph.connected_sets_before(size, deadline)?;
            Some(sets.into_iter().map(Cut::Subset).collect())
        },
        _ => Some(vec![]),
    }
}

/// Derives the cut removing a candidate rejected by the subproblem
pub fn cut_for(formulation: Formulation, parameters: &SolveParameters, candidate: &Candidate) -> Cut {
    let subset_cuts = matches!(formulation, Formulation::SubsetCuts | Formulation::ConnectedCuts);
    // Removing vertices from a packable residual only keeps it packable when shores may be empty
    if subset_cuts && parameters.shore_policy() == ShorePolicy::AllowEmpty {
        Cut::Subset(candidate.residual())
    } else {
        Cut::NoGood(candidate.in_separator().to_vec())
    }
}

pub struct MasterBuilder;

impl MasterBuilder {

    /// Builds the master with the seed cuts and the cuts accumulated so far. Returns the separator
    /// variables.
    pub fn build(&self, graph: &Graph, seeds: &[Cut], cuts: &[Cut], backend: &mut dyn Backend) -> Result<Vec<VarIndex>, CvspError> {
        let x = separator_variables(graph, backend)?;
        for cut in seeds.iter().chain(cuts.iter()) {
            match cut {
                Cut::Subset(vertices) => {
                    backend.add_linear_constraint(LinearExpr::sum(vertices.iter().map(|v| x[v.0])), Relation::Ge, 1.0)?;
                },
                Cut::NoGood(in_separator) => {
                    // sum_{v in S} (1 - x_v) + sum_{v not in S} x_v >= 1
                    let mut expr = LinearExpr::new();
                    let mut size = 0;
                    for (v, inside) in in_separator.iter().copied().enumerate() {
                        if inside {
                            expr.add_term(x[v], -1.0);
                            size += 1;
                        } else {
                            expr.add_term(x[v], 1.0);
                        }
                    }
                    backend.add_linear_constraint(expr.constant(size as f64), Relation::Ge, 1.0)?;
                },
            }
        }
        backend.set_objective(LinearExpr::sum(x.iter().copied()), Sense::Minimize)?;
        Ok(x)
    }

    /// Reads the candidate from a master solved to optimality
    pub fn candidate(&self, x: &[VarIndex], backend: &dyn Backend) -> Result<Candidate, CvspError> {
        let in_separator = x.iter().map(|v| backend.value_of(*v).map(|value| value > BINARY_THRESHOLD)).collect::<Result<Vec<bool>, CvspError>>()?;
        Ok(Candidate::new(in_separator, backend.objective_value()?))
    }
}

pub struct SubproblemBuilder;

impl SubproblemBuilder {

    /// Builds the feasibility model assigning each residual vertex of the candidate to a shore.
    /// Returns the shore variables; separator vertices have none.
    pub fn build(&self, graph: &Graph, candidate: &Candidate, parameters: &SolveParameters, backend: &mut dyn Backend) -> Result<Vec<Vec<Option<VarIndex>>>, CvspError> {
        let active = candidate.in_separator().iter().map(|s| !*s).collect::<Vec<bool>>();
        let shores = shore_variables(graph, &active, parameters.k(), backend)?;
        for v in graph.vertices_iter().filter(|v| active[v.0]) {
            let expr = LinearExpr::sum(shores.iter().filter_map(|shore| shore[v.0]));
            backend.add_linear_constraint(expr, Relation::Eq, 1.0)?;
        }
        add_edge_rule(graph, &shores, backend)?;
        add_shore_sizes(&shores, parameters, backend)?;
        add_symmetry_breaking(graph, &shores, backend)?;
        backend.set_objective(LinearExpr::new(), Sense::Minimize)?;
        Ok(shores)
    }
}
