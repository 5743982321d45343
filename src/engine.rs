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

//! The engine ties the pieces of a solve together. It validates the request, selects the
//! formulation in the registry, then either builds and solves a single model (unilevel
//! formulations) or runs the coordinator (bilevel formulations). Every partition is decoded and
//! validated before being returned.

use std::time::Instant;

use tracing::info;

use crate::common::{Library, ShorePolicy, SolveResult, Status};
use crate::coordinator::{Coordinator, State};
use crate::core::graph::Graph;
use crate::decoder;
use crate::error::CvspError;
use crate::formulation::{self, Formulation, UnilevelBuilder};
use crate::parameters::SolveParameters;
use crate::statistics::Statistics;

pub struct Engine<'a, const S: bool> {
    graph: &'a Graph,
    library: Library,
    parameters: &'a SolveParameters,
    statistics: Statistics<S>,
}

impl<'a, const S: bool> Engine<'a, S> {

    pub fn new(graph: &'a Graph, library: Library, parameters: &'a SolveParameters) -> Self {
        Self {
            graph,
            library,
            parameters,
            statistics: Statistics::default(),
        }
    }

    pub fn statistics(&self) -> &Statistics<S> {
        &self.statistics
    }

    /// Parameters actually used by the models. A graph with `n` vertices has at most `n` non-empty
    /// shores: under `AllowEmpty` the extra shores are dropped, under `NonEmpty` there is no
    /// partition and `None` is returned.
    fn effective_parameters(&self) -> Option<SolveParameters> {
        let n = self.graph.number_vertices();
        if self.parameters.k() <= n.max(2) {
            return Some(self.parameters.clone());
        }
        match self.parameters.shore_policy() {
            ShorePolicy::AllowEmpty => Some(self.parameters.clone().with_shore_count(n.max(2))),
            ShorePolicy::NonEmpty => None,
        }
    }

    /// Solves the CVSP with the formulation of the given 1-based index
    pub fn solve(&mut self, formulation_index: usize) -> Result<SolveResult, CvspError> {
        let start = Instant::now();
        self.parameters.validate()?;
        let formulation = formulation::lookup(self.library, formulation_index)?;
        info!("solving with {} ({}), k = {}, b = {}, {} shores", formulation, self.library, self.parameters.k(), self.parameters.b(), self.parameters.shore_policy());
        let parameters = match self.effective_parameters() {
            Some(parameters) => parameters,
            None => {
                info!("{} non-empty shores for {} vertices", self.parameters.k(), self.graph.number_vertices());
                return Ok(SolveResult::infeasible(formulation.name()));
            },
        };
        let result = match formulation.unilevel_builder() {
            Some(builder) => self.solve_unilevel(formulation, builder.as_ref(), &parameters, start)?,
            None => self.solve_bilevel(formulation, &parameters, start)?,
        };
        match result.objective() {
            Some(objective) => info!("{}: separator of size {}", result.status(), objective),
            None => info!("{}", result.status()),
        }
        Ok(result)
    }

    fn solve_unilevel(&mut self, formulation: Formulation, builder: &dyn UnilevelBuilder, parameters: &SolveParameters, start: Instant) -> Result<SolveResult, CvspError> {
        builder.check(self.graph, parameters)?;
        let mut backend = self.library.new_backend();
        let encoding = builder.build(self.graph, parameters, backend.as_mut())?;
        self.statistics.model(backend.number_variables(), backend.number_constraints());
        let status = backend.solve(parameters.remaining(start))?;
        self.statistics.solve();
        Ok(match status {
            Status::Optimal => {
                let solution = decoder::decode(self.graph, &encoding, backend.as_ref(), parameters)?;
                SolveResult::optimal(solution, formulation.name())
            },
            Status::Infeasible => SolveResult::infeasible(formulation.name()),
            Status::TimeLimit => SolveResult::time_limit(None, formulation.name()),
        })
    }

    fn solve_bilevel(&mut self, formulation: Formulation, parameters: &SolveParameters, start: Instant) -> Result<SolveResult, CvspError> {
        let result = Coordinator::new(self.graph, self.library, formulation, parameters, &mut self.statistics, start).run()?;
        Ok(match result.state {
            State::Accept(candidate, labels) => {
                let solution = decoder::validate(self.graph, labels, parameters, candidate.objective())?;
                SolveResult::optimal(solution, formulation.name())
            },
            State::Exhausted => SolveResult::infeasible(formulation.name()),
            State::TimedOut => SolveResult::time_limit(result.bound, formulation.name()),
            state => return Err(CvspError::InvariantViolation(format!("coordinator stopped in state {:?}", state))),
        })
    }
}
