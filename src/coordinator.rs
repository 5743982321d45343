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

//! Coordination of the bilevel formulations.
//!
//! The coordinator alternates master and subproblem solves until the subproblem accepts a
//! candidate (which is then optimal, the master returning minimum candidates), the master becomes
//! infeasible, or the budget is spent. The loop is an explicit state machine: `transition` only
//! depends on the current state, the outcome of the work done in that state and the remaining
//! budget, and the `Coordinator` performs the solves.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::common::{Library, Status};
use crate::core::graph::Graph;
use crate::decoder;
use crate::error::CvspError;
use crate::formulation::bilevel::{cut_for, seed_cuts, Candidate, Cut, MasterBuilder, SubproblemBuilder};
use crate::formulation::Formulation;
use crate::parameters::SolveParameters;
use crate::statistics::Statistics;

#[derive(Debug, Clone, PartialEq)]
pub enum State {
    Init,
    SolveMaster,
    /// The candidate of the last master must be checked
    SolveSubproblem(Candidate),
    /// The candidate was rejected, a cut is derived from it
    AddCut(Candidate),
    /// The candidate admits the partition given by the labels
    Accept(Candidate, Vec<usize>),
    /// The master has no solution anymore
    Exhausted,
    /// The time or iteration budget is spent
    TimedOut,
}

impl State {

    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Accept(..) | State::Exhausted | State::TimedOut)
    }
}

/// Result of the work performed in a state
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// No solve was needed
    Done,
    /// The master proposed a candidate
    Candidate(Candidate),
    MasterInfeasible,
    /// The subproblem found a labelling of the vertices
    Partition(Vec<usize>),
    SubproblemInfeasible,
    /// A backend reached its time limit
    TimeLimit,
}

/// What is left of the budget after the work of a state
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Budget {
    /// At least one master can still be solved
    pub iterations_left: bool,
    pub time_left: bool,
}

/// Next state of the coordinator. The time budget stops any non-terminal state, the iteration
/// budget only stops a new master solve.
pub fn transition(state: State, outcome: Outcome, budget: Budget) -> Result<State, CvspError> {
    let next = match (state, outcome) {
        (State::Init, Outcome::Done) => State::SolveMaster,
        (State::Init, Outcome::TimeLimit) => State::TimedOut,
        (State::SolveMaster, Outcome::Candidate(candidate)) => State::SolveSubproblem(candidate),
        (State::SolveMaster, Outcome::MasterInfeasible) => State::Exhausted,
        (State::SolveMaster, Outcome::TimeLimit) => State::TimedOut,
        (State::SolveSubproblem(candidate), Outcome::Partition(labels)) => State::Accept(candidate, labels),
        (State::SolveSubproblem(candidate), Outcome::SubproblemInfeasible) => State::AddCut(candidate),
        (State::SolveSubproblem(_), Outcome::TimeLimit) => State::TimedOut,
        (State::AddCut(_), Outcome::Done) => State::SolveMaster,
        (state, Outcome::Done) if state.is_terminal() => state,
        (state, outcome) => {
            return Err(CvspError::InvariantViolation(format!("unexpected outcome {:?} in state {:?}", outcome, state)));
        },
    };
    if next.is_terminal() {
        return Ok(next);
    }
    if !budget.time_left || (next == State::SolveMaster && !budget.iterations_left) {
        return Ok(State::TimedOut);
    }
    Ok(next)
}

/// Terminal state of a bilevel solve, with the best known lower bound on the separator size
#[derive(Debug)]
pub struct CoordinatorResult {
    pub state: State,
    pub bound: Option<f64>,
}

pub struct Coordinator<'a, const S: bool> {
    graph: &'a Graph,
    library: Library,
    formulation: Formulation,
    parameters: &'a SolveParameters,
    statistics: &'a mut Statistics<S>,
    start: Instant,
    seeds: Vec<Cut>,
    cuts: Vec<Cut>,
    /// Objective of the last optimal master
    bound: Option<f64>,
    iterations: usize,
}

impl<'a, const S: bool> Coordinator<'a, S> {

    pub fn new(graph: &'a Graph, library: Library, formulation: Formulation, parameters: &'a SolveParameters, statistics: &'a mut Statistics<S>, start: Instant) -> Self {
        Self {
            graph,
            library,
            formulation,
            parameters,
            statistics,
            start,
            seeds: vec![],
            cuts: vec![],
            bound: None,
            iterations: 0,
        }
    }

    fn budget(&self) -> Budget {
        Budget {
            iterations_left: self.iterations < self.parameters.max_iterations(),
            time_left: self.parameters.remaining(self.start).map(|t| !t.is_zero()).unwrap_or(true),
        }
    }

    fn remaining(&self) -> Option<Duration> {
        self.parameters.remaining(self.start)
    }

    /// Enumerates the seed cuts, within the time budget
    fn seed(&mut self) -> Outcome {
        let deadline = self.parameters.time_limit().and_then(|limit| self.start.checked_add(limit));
        match seed_cuts(self.formulation, self.graph, self.parameters, deadline) {
            Some(seeds) => {
                debug!("{}: {} seed cuts", self.formulation, seeds.len());
                self.seeds = seeds;
                Outcome::Done
            },
            None => Outcome::TimeLimit,
        }
    }

    pub fn run(mut self) -> Result<CoordinatorResult, CvspError> {
        let mut state = State::Init;
        while !state.is_terminal() {
            let outcome = match &state {
                State::Init => self.seed(),
                State::SolveMaster => self.solve_master()?,
                State::SolveSubproblem(candidate) => self.solve_subproblem(candidate)?,
                State::AddCut(candidate) => {
                    let cut = cut_for(self.formulation, self.parameters, candidate);
                    self.statistics.cut();
                    self.cuts.push(cut);
                    Outcome::Done
                },
                State::Accept(..) | State::Exhausted | State::TimedOut => Outcome::Done,
            };
            state = transition(state, outcome, self.budget())?;
        }
        if state == State::TimedOut {
            warn!("{}: budget spent after {} iterations, lower bound {:?}", self.formulation, self.iterations, self.bound);
        }
        Ok(CoordinatorResult { state, bound: self.bound })
    }

    fn solve_master(&mut self) -> Result<Outcome, CvspError> {
        self.iterations += 1;
        self.statistics.master_iteration();
        let mut backend = self.library.new_backend();
        let x = MasterBuilder.build(self.graph, &self.seeds, &self.cuts, backend.as_mut())?;
        self.statistics.model(backend.number_variables(), backend.number_constraints());
        let status = backend.solve(self.remaining())?;
        self.statistics.solve();
        debug!("{}: master {} with {} cuts is {}", self.formulation, self.iterations, self.cuts.len(), status);
        Ok(match status {
            Status::Optimal => {
                let candidate = MasterBuilder.candidate(&x, backend.as_ref())?;
                self.bound = Some(candidate.objective());
                Outcome::Candidate(candidate)
            },
            Status::Infeasible => Outcome::MasterInfeasible,
            Status::TimeLimit => Outcome::TimeLimit,
        })
    }

    fn solve_subproblem(&mut self, candidate: &Candidate) -> Result<Outcome, CvspError> {
        let mut backend = self.library.new_backend();
        let shores = SubproblemBuilder.build(self.graph, candidate, self.parameters, backend.as_mut())?;
        self.statistics.model(backend.number_variables(), backend.number_constraints());
        let status = backend.solve(self.remaining())?;
        self.statistics.solve();
        debug!("{}: subproblem for a separator of size {} is {}", self.formulation, candidate.size(), status);
        Ok(match status {
            Status::Optimal => Outcome::Partition(decoder::labels_from_shores(self.graph, &shores, backend.as_ref())?),
            Status::Infeasible => Outcome::SubproblemInfeasible,
            Status::TimeLimit => Outcome::TimeLimit,
        })
    }
}

#[cfg(test)]
mod test_coordinator {

    use super::*;
    use crate::common::ShorePolicy;

    const FULL: Budget = Budget { iterations_left: true, time_left: true };

    fn candidate() -> Candidate {
        Candidate::new(vec![false, true, false], 1.0)
    }

    #[test]
    pub fn accept_path() {
        let state = transition(State::Init, Outcome::Done, FULL).unwrap();
        assert_eq!(State::SolveMaster, state);
        let state = transition(state, Outcome::Candidate(candidate()), FULL).unwrap();
        assert_eq!(State::SolveSubproblem(candidate()), state);
        let state = transition(state, Outcome::Partition(vec![1, 0, 2]), FULL).unwrap();
        assert_eq!(State::Accept(candidate(), vec![1, 0, 2]), state);
        assert!(state.is_terminal());
    }

    #[test]
    pub fn cut_path() {
        let state = transition(State::SolveSubproblem(candidate()), Outcome::SubproblemInfeasible, FULL).unwrap();
        assert_eq!(State::AddCut(candidate()), state);
        assert_eq!(State::SolveMaster, transition(state, Outcome::Done, FULL).unwrap());
    }

    #[test]
    pub fn exhaustion() {
        assert_eq!(State::Exhausted, transition(State::SolveMaster, Outcome::MasterInfeasible, FULL).unwrap());
    }

    #[test]
    pub fn backend_time_limit() {
        assert_eq!(State::TimedOut, transition(State::SolveMaster, Outcome::TimeLimit, FULL).unwrap());
        assert_eq!(State::TimedOut, transition(State::SolveSubproblem(candidate()), Outcome::TimeLimit, FULL).unwrap());
        assert_eq!(State::TimedOut, transition(State::Init, Outcome::TimeLimit, FULL).unwrap());
    }

    #[test]
    pub fn budget_spent() {
        let no_time = Budget { iterations_left: true, time_left: false };
        let no_iteration = Budget { iterations_left: false, time_left: true };
        assert_eq!(State::TimedOut, transition(State::Init, Outcome::Done, no_time).unwrap());
        assert_eq!(State::TimedOut, transition(State::AddCut(candidate()), Outcome::Done, no_iteration).unwrap());
        // The subproblem of the last master is still checked
        assert_eq!(State::SolveSubproblem(candidate()), transition(State::SolveMaster, Outcome::Candidate(candidate()), no_iteration).unwrap());
        // Terminal states are not affected by the budget
        assert_eq!(State::Exhausted, transition(State::SolveMaster, Outcome::MasterInfeasible, no_time).unwrap());
    }

    #[test]
    pub fn unexpected_outcome() {
        assert!(matches!(transition(State::Init, Outcome::MasterInfeasible, FULL), Err(CvspError::InvariantViolation(_))));
    }

    #[test]
    pub fn iterations_terminate() {
        // Each rejected candidate is cut, the loop always reaches a terminal state
        let graph = Graph::from_edges(4, &[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]).unwrap();
        let parameters = SolveParameters::new(2, 1);
        let mut statistics = Statistics::<true>::default();
        let result = Coordinator::new(&graph, Library::Trail, Formulation::NoGoodCuts, &parameters, &mut statistics, Instant::now()).run().unwrap();
        assert!(matches!(result.state, State::Accept(ref c, _) if c.size() == 3));
        assert_eq!(Some(3.0), result.bound);
        assert!(statistics.master_iterations() > 1);
    }

    #[test]
    pub fn non_empty_shores_exhaust() {
        let graph = Graph::from_edges(3, &[(0, 1), (1, 2), (0, 2)]).unwrap();
        let parameters = SolveParameters::new(2, 3).with_shore_policy(ShorePolicy::NonEmpty);
        let mut statistics = Statistics::<false>::default();
        let result = Coordinator::new(&graph, Library::Trail, Formulation::SubsetCuts, &parameters, &mut statistics, Instant::now()).run().unwrap();
        assert_eq!(State::Exhausted, result.state);
    }

    #[test]
    pub fn iteration_budget() {
        let graph = Graph::from_edges(4, &[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]).unwrap();
        let parameters = SolveParameters::new(2, 1).with_max_iterations(1);
        let mut statistics = Statistics::<false>::default();
        let result = Coordinator::new(&graph, Library::Trail, Formulation::NoGoodCuts, &parameters, &mut statistics, Instant::now()).run().unwrap();
        assert_eq!(State::TimedOut, result.state);
        assert_eq!(Some(0.0), result.bound);
    }

    #[test]
    pub fn seeding_respects_the_time_limit() {
        // Far too many connected sets of size 7 to enumerate them in a millisecond
        let graph = Graph::random(40, 0.3, 2);
        let parameters = SolveParameters::new(2, 6).with_time_limit(Duration::from_millis(1));
        let mut statistics = Statistics::<true>::default();
        let result = Coordinator::new(&graph, Library::Trail, Formulation::ConnectedCuts, &parameters, &mut statistics, Instant::now()).run().unwrap();
        assert_eq!(State::TimedOut, result.state);
        assert_eq!(None, result.bound);
        assert_eq!(0, statistics.master_iterations());
    }
}
