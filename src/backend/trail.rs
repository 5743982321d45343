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

//! Depth-first branch and bound for 0-1 linear models.
//!
//! The domain of each variable is a reversible optional boolean managed by a `StateManager`: a
//! branching decision saves the state, fixes a variable and propagates; backtracking restores
//! the state. Every constraint is rewritten as one or two `<=` rows and is propagated on its
//! minimum activity: a row whose minimum activity exceeds its right hand side fails, and a free
//! variable that would make it exceed is fixed. The objective is always minimized (a maximized
//! objective is negated) and a node is pruned as soon as the objective bound of its partial
//! assignment can not improve the incumbent.

use std::time::{Duration, Instant};

use search_trail::*;
use tracing::debug;

use super::{Assignment, Backend, Model, Relation, Sense};
use crate::common::{Status, FLOAT_CMP_THRESHOLD};
use crate::error::CvspError;

/// A constraint in the form sum(coefficient * variable) <= rhs
#[derive(Debug)]
struct Row {
    terms: Vec<(usize, f64)>,
    rhs: f64,
}

/// Best solution found so far, in the minimization form of the objective
struct Incumbent {
    values: Vec<bool>,
    objective: f64,
}

/// Search structures, built from the model when `solve` is called
struct Search {
    state: StateManager,
    domains: Vec<ReversibleOptionBool>,
    rows: Vec<Row>,
    /// For each variable, the rows in which it appears
    watchers: Vec<Vec<usize>>,
    /// Objective in its minimization form
    costs: Vec<f64>,
    constant: f64,
    /// Smallest improvement an incumbent can make
    step: f64,
    deadline: Option<Instant>,
    incumbent: Option<Incumbent>,
    timed_out: bool,
    nodes: usize,
}

impl Search {

    fn new(model: &Model, deadline: Option<Instant>) -> Self {
        let mut state = StateManager::default();
        let n = model.number_variables();
        let domains = (0..n).map(|_| state.manage_option_bool(None)).collect::<Vec<ReversibleOptionBool>>();
        let mut rows = vec![];
        for constraint in model.constraints_iter() {
            let terms = constraint.terms().iter().map(|(v, c)| (v.0, *c)).collect::<Vec<(usize, f64)>>();
            let negated = terms.iter().map(|(v, c)| (*v, -c)).collect::<Vec<(usize, f64)>>();
            match constraint.relation() {
                Relation::Le => rows.push(Row { terms, rhs: constraint.rhs() }),
                Relation::Ge => rows.push(Row { terms: negated, rhs: -constraint.rhs() }),
                Relation::Eq => {
                    rows.push(Row { terms, rhs: constraint.rhs() });
                    rows.push(Row { terms: negated, rhs: -constraint.rhs() });
                },
            }
        }
        let mut watchers = vec![vec![]; n];
        for (r, row) in rows.iter().enumerate() {
            for (v, _) in row.terms.iter() {
                watchers[*v].push(r);
            }
        }
        let sign = if model.sense() == Sense::Maximize { -1.0 } else { 1.0 };
        let mut costs = vec![0.0; n];
        for (v, c) in model.objective().iter() {
            costs[v.0] = sign * c;
        }
        let constant = sign * model.objective_constant();
        let integral = costs.iter().chain(std::iter::once(&constant)).all(|c| (c - c.round()).abs() <= FLOAT_CMP_THRESHOLD);
        Self {
            state,
            domains,
            rows,
            watchers,
            costs,
            constant,
            step: if integral { 1.0 } else { FLOAT_CMP_THRESHOLD },
            deadline,
            incumbent: None,
            timed_out: false,
            nodes: 0,
        }
    }

    fn value(&self, variable: usize) -> Option<bool> {
        self.state.get_option_bool(self.domains[variable])
    }

    fn row_min_activity(&self, row: &Row) -> f64 {
        row.terms.iter().map(|(v, c)| match self.value(*v) {
            Some(true) => *c,
            Some(false) => 0.0,
            None => c.min(0.0),
        }).sum()
    }

    /// Propagates the rows in the queue to a fix point. Returns false on a conflict.
    fn propagate(&mut self, mut queue: Vec<usize>) -> bool {
        let mut queued = vec![false; self.rows.len()];
        for r in queue.iter() {
            queued[*r] = true;
        }
        while let Some(r) = queue.pop() {
            queued[r] = false;
            let min_activity = self.row_min_activity(&self.rows[r]);
            let slack = self.rows[r].rhs - min_activity;
            if slack < -FLOAT_CMP_THRESHOLD {
                return false;
            }
            let mut fixed = vec![];
            for (v, c) in self.rows[r].terms.iter().copied() {
                if self.value(v).is_none() && c.abs() > slack + FLOAT_CMP_THRESHOLD {
                    // A positive coefficient can not be raised to one, a negative one can not be
                    // lowered to zero
                    fixed.push((v, c < 0.0));
                }
            }
            for (v, value) in fixed {
                self.state.set_option_bool(self.domains[v], value);
                for w in self.watchers[v].iter().copied() {
                    if !queued[w] {
                        queued[w] = true;
                        queue.push(w);
                    }
                }
            }
        }
        true
    }

    fn objective_bound(&self) -> f64 {
        self.constant + (0..self.costs.len()).map(|v| match self.value(v) {
            Some(true) => self.costs[v],
            Some(false) => 0.0,
            None => self.costs[v].min(0.0),
        }).sum::<f64>()
    }

    fn can_improve(&self, bound: f64) -> bool {
        match &self.incumbent {
            None => true,
            Some(incumbent) => bound + self.step <= incumbent.objective + FLOAT_CMP_THRESHOLD,
        }
    }

    fn expired(&self) -> bool {
        self.deadline.map(|d| Instant::now() >= d).unwrap_or(false)
    }

    fn run(&mut self) {
        let all_rows = (0..self.rows.len()).collect::<Vec<usize>>();
        if self.propagate(all_rows) {
            self.branch();
        }
    }

    fn branch(&mut self) {
        self.nodes += 1;
        if self.expired() {
            self.timed_out = true;
            return;
        }
        let bound = self.objective_bound();
        if !self.can_improve(bound) {
            return;
        }
        let free = (0..self.domains.len()).find(|v| self.value(*v).is_none());
        let variable = match free {
            Some(v) => v,
            None => {
                let values = (0..self.domains.len()).map(|v| self.value(v) == Some(true)).collect();
                self.incumbent = Some(Incumbent { values, objective: bound });
                return;
            },
        };
        let order = if self.costs[variable] > 0.0 { [false, true] } else { [true, false] };
        for value in order {
            self.state.save_state();
            self.state.set_option_bool(self.domains[variable], value);
            let queue = self.watchers[variable].clone();
            if self.propagate(queue) {
                self.branch();
            }
            self.state.restore_state();
            if self.timed_out {
                return;
            }
        }
    }
}

/// In-process 0-1 branch and bound with propagation on a trail
#[derive(Default)]
pub struct TrailBackend {
    model: Model,
    assignment: Option<Assignment>,
}

impl Backend for TrailBackend {

    fn model(&self) -> &Model {
        &self.model
    }

    fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    fn assignment(&self) -> Option<&Assignment> {
        self.assignment.as_ref()
    }

    fn solve(&mut self, time_limit: Option<Duration>) -> Result<Status, CvspError> {
        self.model.finalize();
        self.assignment = None;
        let deadline = time_limit.and_then(|limit| Instant::now().checked_add(limit));
        let mut search = Search::new(&self.model, deadline);
        search.run();
        debug!("trail search: {} variables, {} rows, {} nodes", self.model.number_variables(), search.rows.len(), search.nodes);
        if search.timed_out {
            return Ok(Status::TimeLimit);
        }
        match search.incumbent {
            None => Ok(Status::Infeasible),
            Some(incumbent) => {
                let values = incumbent.values.iter().map(|b| if *b { 1.0 } else { 0.0 }).collect::<Vec<f64>>();
                let objective = self.model.evaluate_objective(&values);
                self.assignment = Some(Assignment::new(values, objective));
                Ok(Status::Optimal)
            },
        }
    }
}
