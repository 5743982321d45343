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
use clap::ValueEnum;

use crate::core::graph::{Graph, VertexIndex};

/// Threshold above which the value of a binary variable is read as 1
pub const BINARY_THRESHOLD: f64 = 0.5;

/// Tolerance used when comparing activities of linear constraints
pub const FLOAT_CMP_THRESHOLD: f64 = 1e-6;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum)]
pub enum Library {
    /// LP-based branch and bound (microlp)
    Simplex,
    /// Depth-first branch and bound with propagation on a trail
    Trail,
}

impl std::fmt::Display for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Library::Simplex => write!(f, "simplex"),
            Library::Trail => write!(f, "trail"),
        }
    }
}

/// How the `k` shores of a partition are counted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, ValueEnum)]
pub enum ShorePolicy {
    /// There are `k` shore slots, some of them may stay empty
    #[default]
    AllowEmpty,
    /// Each of the `k` shores must contain at least one vertex
    NonEmpty,
}

impl std::fmt::Display for ShorePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShorePolicy::AllowEmpty => write!(f, "allow-empty"),
            ShorePolicy::NonEmpty => write!(f, "non-empty"),
        }
    }
}

/// Final status of a solve call
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    Optimal,
    Infeasible,
    TimeLimit,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Optimal => write!(f, "optimal"),
            Status::Infeasible => write!(f, "infeasible"),
            Status::TimeLimit => write!(f, "time limit reached"),
        }
    }
}

/// A partition of the vertices into a separator and `k` shores. The label of a vertex is 0 if it
/// is in the separator and `i` if it is in the i-th shore (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    labels: Vec<usize>,
    separator: Vec<VertexIndex>,
    shores: Vec<Vec<VertexIndex>>,
}

impl Solution {

    /// Builds the solution from a labelling of the vertices. Labels must be in 0..=k.
    pub fn from_labels(labels: Vec<usize>, k: usize) -> Self {
        let mut separator = vec![];
        let mut shores: Vec<Vec<VertexIndex>> = (0..k).map(|_| vec![]).collect();
        for (v, label) in labels.iter().copied().enumerate() {
            if label == 0 {
                separator.push(VertexIndex(v));
            } else {
                shores[label - 1].push(VertexIndex(v));
            }
        }
        Self {
            labels,
            separator,
            shores,
        }
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn label(&self, vertex: VertexIndex) -> usize {
        self.labels[vertex.0]
    }

    pub fn separator(&self) -> &[VertexIndex] {
        &self.separator
    }

    pub fn shores(&self) -> &[Vec<VertexIndex>] {
        &self.shores
    }

    pub fn separator_size(&self) -> usize {
        self.separator.len()
    }

    /// Returns a textual representation of the solution using the names of the vertices
    pub fn to_text(&self, graph: &Graph) -> String {
        let names = |vertices: &[VertexIndex]| vertices.iter().map(|v| graph.name(*v)).collect::<Vec<&str>>().join(", ");
        let mut out = format!("S: {}\n", names(&self.separator));
        for (i, shore) in self.shores.iter().enumerate() {
            out.push_str(&format!("V{}: {}\n", i + 1, names(shore)));
        }
        out
    }
}

/// Outcome of a solve call. The solution is only present when the status is `Optimal`.
#[derive(Debug, Clone)]
pub struct SolveResult {
    status: Status,
    objective: Option<usize>,
    bound: Option<f64>,
    solution: Option<Solution>,
    formulation: &'static str,
}

impl SolveResult {

    pub fn optimal(solution: Solution, formulation: &'static str) -> Self {
        Self {
            status: Status::Optimal,
            objective: Some(solution.separator_size()),
            bound: Some(solution.separator_size() as f64),
            solution: Some(solution),
            formulation,
        }
    }

    pub fn infeasible(formulation: &'static str) -> Self {
        Self {
            status: Status::Infeasible,
            objective: None,
            bound: None,
            solution: None,
            formulation,
        }
    }

    pub fn time_limit(bound: Option<f64>, formulation: &'static str) -> Self {
        Self {
            status: Status::TimeLimit,
            objective: None,
            bound,
            solution: None,
            formulation,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Size of the separator, if the problem was solved to optimality
    pub fn objective(&self) -> Option<usize> {
        self.objective
    }

    /// Best known lower bound on the separator size
    pub fn bound(&self) -> Option<f64> {
        self.bound
    }

    pub fn solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }

    pub fn formulation(&self) -> &'static str {
        self.formulation
    }

    pub fn is_optimal(&self) -> bool {
        self.status == Status::Optimal
    }

    pub fn print(&self, graph: &Graph) {
        println!("{}", self.to_text(graph));
    }

    /// Textual form used both for the terminal and the solution files
    pub fn to_text(&self, graph: &Graph) -> String {
        let mut out = format!("status: {}\n", self.status);
        if let Some(objective) = self.objective {
            out.push_str(&format!("separator size: {}\n", objective));
        } else if let Some(bound) = self.bound {
            out.push_str(&format!("lower bound: {}\n", bound));
        }
        if let Some(solution) = &self.solution {
            out.push_str(&solution.to_text(graph));
        }
        out
    }
}
