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

// Re-export the modules
pub mod args;
pub mod backend;
pub mod common;
pub mod coordinator;
pub mod core;
pub mod decoder;
mod engine;
pub mod error;
pub mod formulation;
pub mod parameters;
pub mod parsers;
mod statistics;

use rayon::prelude::*;

pub use common::*;
pub use core::graph::{Graph, VertexIndex};
pub use engine::Engine;
pub use error::CvspError;
pub use parameters::SolveParameters;
pub use statistics::Statistics;

use peak_alloc::PeakAlloc;
#[global_allocator]
pub static PEAK_ALLOC: PeakAlloc = PeakAlloc;

pub type StatEngine<'a> = Engine<'a, true>;
pub type QuietEngine<'a> = Engine<'a, false>;

/// Solves the CVSP on the graph with the formulation of the given 1-based index in the registry
/// of the library
pub fn solve(graph: &Graph, library: Library, formulation_index: usize, parameters: &SolveParameters) -> Result<SolveResult, CvspError> {
    QuietEngine::new(graph, library, parameters).solve(formulation_index)
}

/// Same as `solve`, and prints the statistics collected during the solve
pub fn solve_with_statistics(graph: &Graph, library: Library, formulation_index: usize, parameters: &SolveParameters) -> Result<SolveResult, CvspError> {
    let mut engine = StatEngine::new(graph, library, parameters);
    let result = engine.solve(formulation_index);
    engine.statistics().print();
    result
}

/// An independent instance of a batch
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub graph: Graph,
    pub library: Library,
    pub formulation_index: usize,
    pub parameters: SolveParameters,
}

/// Solves the jobs in parallel. The results are in the order of the jobs.
pub fn solve_batch(jobs: &[BatchJob]) -> Vec<Result<SolveResult, CvspError>> {
    jobs.par_iter().map(|job| solve(&job.graph, job.library, job.formulation_index, &job.parameters)).collect()
}
