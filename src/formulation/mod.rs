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

//! This module contains the 0-1 formulations of the CVSP and the registry mapping the
//! (library, index) pairs of the users to a formulation.
//!
//! A unilevel formulation builds one complete model through the `UnilevelBuilder` trait. A
//! bilevel formulation is driven by the coordinator, which uses the master and subproblem builders
//! of the `bilevel` module.
//! Each builder returns an `Encoding` telling the decoder where to read the partition from.

use crate::backend::{Backend, LinearExpr, Relation, VarIndex};
use crate::common::{Library, ShorePolicy};
use crate::core::graph::{Graph, VertexIndex};
use crate::error::CvspError;
use crate::parameters::SolveParameters;

pub mod assignment;
pub mod bilevel;
pub mod clique;
pub mod edge_rules;
pub mod subset;

pub use assignment::AssignmentBuilder;
pub use edge_rules::{PairwiseEdgesBuilder, ShoreSubsetEdgesBuilder};
pub use clique::CliqueCoverBuilder;
pub use subset::SubsetCoverBuilder;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Formulation {
    /// Separator and shore variables, edge rule on the shore variables
    Assignment,
    /// Shore variables linked to one shore variable per maximal clique, with symmetry breaking
    CliqueCover,
    /// Separator variables only, one covering constraint per non packable vertex subset
    SubsetCover,
    /// Bilevel, subset cuts generated from the rejected candidates
    SubsetCuts,
    /// Bilevel, seeded with the connected sets of size b + 1, subset cuts
    ConnectedCuts,
    /// Bilevel, no-good cuts generated from the rejected candidates
    NoGoodCuts,
    /// Assignment with one edge constraint per ordered pair of distinct shores
    PairwiseEdges,
    /// Assignment with one edge constraint per proper subset of the shores
    ShoreSubsetEdges,
}

static SIMPLEX_FORMULATIONS: [Formulation; 4] = [
    Formulation::Assignment,
    Formulation::CliqueCover,
    Formulation::SubsetCover,
    Formulation::ConnectedCuts,
];

static TRAIL_FORMULATIONS: [Formulation; 8] = [
    Formulation::Assignment,
    Formulation::CliqueCover,
    Formulation::SubsetCover,
    Formulation::SubsetCuts,
    Formulation::ConnectedCuts,
    Formulation::NoGoodCuts,
    Formulation::PairwiseEdges,
    Formulation::ShoreSubsetEdges,
];

/// Returns the formulations available for the library, in the order of their 1-based index
pub fn registry(library: Library) -> &'static [Formulation] {
    match library {
        Library::Simplex => &SIMPLEX_FORMULATIONS,
        Library::Trail => &TRAIL_FORMULATIONS,
    }
}

/// Returns the formulation with the given 1-based index for the library
pub fn lookup(library: Library, index: usize) -> Result<Formulation, CvspError> {
    let formulations = registry(library);
    if index == 0 || index > formulations.len() {
        return Err(CvspError::UnsupportedFormulation { library, index, max: formulations.len() });
    }
    Ok(formulations[index - 1])
}

impl Formulation {

    pub fn name(&self) -> &'static str {
        match self {
            Formulation::Assignment => "assignment",
            Formulation::CliqueCover => "clique-cover",
            Formulation::SubsetCover => "subset-cover",
            Formulation::SubsetCuts => "subset-cuts",
            Formulation::ConnectedCuts => "connected-cuts",
            Formulation::NoGoodCuts => "no-good-cuts",
            Formulation::PairwiseEdges => "pairwise-edges",
            Formulation::ShoreSubsetEdges => "shore-subset-edges",
        }
    }

    pub fn is_bilevel(&self) -> bool {
        matches!(self, Formulation::SubsetCuts | Formulation::ConnectedCuts | Formulation::NoGoodCuts)
    }

    /// Builder of a unilevel formulation, `None` for the bilevel ones
    pub fn unilevel_builder(&self) -> Option<Box<dyn UnilevelBuilder>> {
        match self {
            Formulation::Assignment => Some(Box::new(AssignmentBuilder)),
            Formulation::CliqueCover => Some(Box::new(CliqueCoverBuilder)),
            Formulation::SubsetCover => Some(Box::new(SubsetCoverBuilder)),
            Formulation::PairwiseEdges => Some(Box::new(PairwiseEdgesBuilder)),
            Formulation::ShoreSubsetEdges => Some(Box::new(ShoreSubsetEdgesBuilder)),
            _ => None,
        }
    }
}

impl std::fmt::Display for Formulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Where the partition can be read from once the model is solved
#[derive(Debug, Clone)]
pub enum Encoding {
    /// `e[i][v]` is the variable telling that vertex `v` is in shore `i` (0-based). Vertices that
    /// are not part of the model have no variable.
    Shores(Vec<Vec<Option<VarIndex>>>),
    /// `x[v]` is the variable telling that vertex `v` is in the separator
    Separator(Vec<VarIndex>),
}

/// A unilevel formulation emits the whole model in one go, before a single solve
pub trait UnilevelBuilder {
    /// Checks that the formulation can be built for the graph. Called before any backend exists.
    fn check(&self, _graph: &Graph, _parameters: &SolveParameters) -> Result<(), CvspError> {
        Ok(())
    }

    fn build(&self, graph: &Graph, parameters: &SolveParameters, backend: &mut dyn Backend) -> Result<Encoding, CvspError>;
}

// --- SHARED MODEL PIECES --- //

/// Creates one separator variable per vertex
pub(crate) fn separator_variables(graph: &Graph, backend: &mut dyn Backend) -> Result<Vec<VarIndex>, CvspError> {
    graph.vertices_iter().map(|v| backend.create_binary_var(&format!("x_{}", v.0))).collect()
}

/// Creates the shore variables `e[i][v]` of the active vertices
pub(crate) fn shore_variables(graph: &Graph, active: &[bool], k: usize, backend: &mut dyn Backend) -> Result<Vec<Vec<Option<VarIndex>>>, CvspError> {
    let mut shores = vec![vec![None; graph.number_vertices()]; k];
    for (i, shore) in shores.iter_mut().enumerate() {
        for v in graph.vertices_iter().filter(|v| active[v.0]) {
            shore[v.0] = Some(backend.create_binary_var(&format!("e_{}_{}", i + 1, v.0))?);
        }
    }
    Ok(shores)
}

/// Shore variables of a vertex, one per shore
fn vertex_shores(shores: &[Vec<Option<VarIndex>>], v: VertexIndex) -> impl Iterator<Item = VarIndex> + '_ {
    shores.iter().filter_map(move |shore| shore[v.0])
}

/// Adds, for each edge u-v with both endpoints in the model and each shore i, the constraint
/// `e[i][u] + sum_{j != i} e[j][v] <= 1`. A vertex being in at most one shore, this also covers
/// the case of v in shore i and u in another one.
pub(crate) fn add_edge_rule(graph: &Graph, shores: &[Vec<Option<VarIndex>>], backend: &mut dyn Backend) -> Result<(), CvspError> {
    for (u, v) in graph.edges_iter() {
        for i in 0..shores.len() {
            if let Some(e_iu) = shores[i][u.0] {
                let others = (0..shores.len()).filter(|j| *j != i).filter_map(|j| shores[j][v.0]).collect::<Vec<VarIndex>>();
                if !others.is_empty() {
                    backend.add_linear_constraint(LinearExpr::sum(others).term(e_iu, 1.0), Relation::Le, 1.0)?;
                }
            }
        }
    }
    Ok(())
}

/// Adds the capacity of the shores and, under the `NonEmpty` policy, forces each shore to be used
pub(crate) fn add_shore_sizes(shores: &[Vec<Option<VarIndex>>], parameters: &SolveParameters, backend: &mut dyn Backend) -> Result<(), CvspError> {
    for shore in shores.iter() {
        let members = shore.iter().filter_map(|e| *e).collect::<Vec<VarIndex>>();
        backend.add_linear_constraint(LinearExpr::sum(members.iter().copied()), Relation::Le, parameters.b() as f64)?;
        if parameters.shore_policy() == ShorePolicy::NonEmpty {
            backend.add_linear_constraint(LinearExpr::sum(members), Relation::Ge, 1.0)?;
        }
    }
    Ok(())
}

/// Shore `i > 0` may only contain vertex `v` if shore `i - 1` contains a vertex smaller than `v`.
/// Any partition can be relabelled to respect this ordering, by sorting the shores on their
/// smallest vertex.
pub(crate) fn add_symmetry_breaking(graph: &Graph, shores: &[Vec<Option<VarIndex>>], backend: &mut dyn Backend) -> Result<(), CvspError> {
    for i in 1..shores.len() {
        for v in graph.vertices_iter() {
            if let Some(e_iv) = shores[i][v.0] {
                let mut expr = LinearExpr::new().term(e_iv, 1.0);
                for u in (0..v.0).filter_map(|u| shores[i - 1][u]) {
                    expr.add_term(u, -1.0);
                }
                backend.add_linear_constraint(expr, Relation::Le, 0.0)?;
            }
        }
    }
    Ok(())
}

/// Each vertex is either in the separator or in exactly one shore
pub(crate) fn add_vertex_assignment(graph: &Graph, separator: &[VarIndex], shores: &[Vec<Option<VarIndex>>], backend: &mut dyn Backend) -> Result<(), CvspError> {
    for v in graph.vertices_iter() {
        let expr = LinearExpr::sum(vertex_shores(shores, v)).term(separator[v.0], 1.0);
        backend.add_linear_constraint(expr, Relation::Eq, 1.0)?;
    }
    Ok(())
}
