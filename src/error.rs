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

//! Error type shared by the whole engine.
//!
//! Infeasibility and time limits are not errors: they are statuses carried by the
//! `SolveResult`. Everything in here is either a caller mistake (bad parameters, bad input
//! graph, unsupported formulation) or a contract violation that indicates a bug in a builder
//! or in a formulation.

use crate::common::Library;

#[derive(Debug, thiserror::Error)]
pub enum CvspError {
    /// The formulation index is not part of the registry for the library.
    #[error("formulation {index} is not supported by the {library} library (valid range: 1..={max})")]
    UnsupportedFormulation {
        library: Library,
        index: usize,
        max: usize,
    },

    /// One of the instance parameters is out of its valid range.
    #[error("parameter out of range: {name} = {value} (expected {expected})")]
    InvalidParameter {
        name: &'static str,
        value: usize,
        expected: &'static str,
    },

    /// The formulation enumerates every subset of the vertices (or of the shores) and there are
    /// too many of them.
    #[error("subsets of {vertices} elements can not be enumerated, the limit is {limit}")]
    EnumerationLimit {
        vertices: usize,
        limit: usize,
    },

    /// The graph breaks one of its structural rules (self loop, duplicate edge, ...).
    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    /// The graph file could not be parsed.
    #[error("line {line}: {message}")]
    Parse {
        line: usize,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A variable, constraint or objective was added after the model was solved.
    #[error("the model has already been solved and can not be modified")]
    ModelFinalized,

    /// A value was requested from a backend that has no optimal solution.
    #[error("no solution is available for this model")]
    NoSolution,

    /// Two variables of the same model share a name.
    #[error("a variable named {0} already exists in the model")]
    DuplicateVariable(String),

    /// An expression refers to a variable that does not belong to the model.
    #[error("variable {0} does not belong to the model")]
    UnknownVariable(usize),

    /// The decoded partition does not respect the CVSP invariants.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Failure reported by an optimization backend.
    #[error("backend error: {0}")]
    Backend(String),
}
