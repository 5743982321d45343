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

//! Translation of the values of a solved model into a partition of the vertices.
//!
//! The labelling is always validated again against the graph before being returned: a broken
//! partition means that a formulation is wrong, and it is reported as an `InvariantViolation`.

use crate::backend::{Backend, VarIndex};
use crate::common::{ShorePolicy, Solution, BINARY_THRESHOLD};
use crate::core::graph::{Graph, VertexIndex};
use crate::core::packing;
use crate::error::CvspError;
use crate::formulation::Encoding;
use crate::parameters::SolveParameters;

/// Decodes and validates the partition of a model solved to optimality
pub fn decode(graph: &Graph, encoding: &Encoding, backend: &dyn Backend, parameters: &SolveParameters) -> Result<Solution, CvspError> {
    let labels = match encoding {
        Encoding::Shores(shores) => labels_from_shores(graph, shores, backend)?,
        Encoding::Separator(x) => labels_from_separator(graph, x, backend, parameters)?,
    };
    validate(graph, labels, parameters, backend.objective_value()?)
}

/// Label of each vertex given its shore variables. A vertex without any shore is in the separator.
pub fn labels_from_shores(graph: &Graph, shores: &[Vec<Option<VarIndex>>], backend: &dyn Backend) -> Result<Vec<usize>, CvspError> {
    let mut labels = vec![0; graph.number_vertices()];
    for v in graph.vertices_iter() {
        for (i, shore) in shores.iter().enumerate() {
            if let Some(e) = shore[v.0] {
                if backend.value_of(e)? > BINARY_THRESHOLD {
                    if labels[v.0] != 0 {
                        return Err(CvspError::InvariantViolation(format!("vertex {} is in shores {} and {}", graph.name(v), labels[v.0], i + 1)));
                    }
                    labels[v.0] = i + 1;
                }
            }
        }
    }
    Ok(labels)
}

/// Label of each vertex given the separator variables, the shores being rebuilt by packing the
/// components of the residual graph
pub fn labels_from_separator(graph: &Graph, x: &[VarIndex], backend: &dyn Backend, parameters: &SolveParameters) -> Result<Vec<usize>, CvspError> {
    let in_separator = x.iter().map(|v| backend.value_of(*v).map(|value| value > BINARY_THRESHOLD)).collect::<Result<Vec<bool>, CvspError>>()?;
    packing::shores_from_separator(graph, &in_separator, parameters.k(), parameters.b(), parameters.shore_policy())
        .ok_or_else(|| CvspError::InvariantViolation("the residual graph can not be packed into the shores".to_string()))
}

/// Checks the partition against the graph and the parameters, and its separator size against the
/// objective reported by the backend
pub fn validate(graph: &Graph, labels: Vec<usize>, parameters: &SolveParameters, objective: f64) -> Result<Solution, CvspError> {
    if labels.len() != graph.number_vertices() {
        return Err(CvspError::InvariantViolation(format!("{} labels for {} vertices", labels.len(), graph.number_vertices())));
    }
    if let Some(v) = labels.iter().position(|l| *l > parameters.k()) {
        return Err(CvspError::InvariantViolation(format!("vertex {} has label {} but there are only {} shores", graph.name(VertexIndex(v)), labels[v], parameters.k())));
    }
    for (u, v) in graph.edges_iter() {
        let (lu, lv) = (labels[u.0], labels[v.0]);
        if lu != 0 && lv != 0 && lu != lv {
            return Err(CvspError::InvariantViolation(format!("edge {}-{} joins shores {} and {}", graph.name(u), graph.name(v), lu, lv)));
        }
    }
    let solution = Solution::from_labels(labels, parameters.k());
    for (i, shore) in solution.shores().iter().enumerate() {
        if shore.len() > parameters.b() {
            return Err(CvspError::InvariantViolation(format!("shore {} has {} vertices, capacity is {}", i + 1, shore.len(), parameters.b())));
        }
        if parameters.shore_policy() == ShorePolicy::NonEmpty && shore.is_empty() {
            return Err(CvspError::InvariantViolation(format!("shore {} is empty", i + 1)));
        }
    }
    if (solution.separator_size() as f64 - objective).abs() > BINARY_THRESHOLD {
        return Err(CvspError::InvariantViolation(format!("separator of size {} for an objective of {}", solution.separator_size(), objective)));
    }
    Ok(solution)
}
