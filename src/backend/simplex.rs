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

//! Backend delegating the optimization to the LP based branch and bound of `microlp`.
//! The solver can not be interrupted once started, so the time limit is only checked before the
//! model is handed over.

use std::time::Duration;

use microlp::{ComparisonOp, OptimizationDirection, Problem};
use tracing::debug;

use super::{Assignment, Backend, Model, Relation, Sense};
use crate::common::{Status, BINARY_THRESHOLD};
use crate::error::CvspError;

#[derive(Default)]
pub struct SimplexBackend {
    model: Model,
    assignment: Option<Assignment>,
}

impl SimplexBackend {

    fn record(&mut self, values: Vec<f64>) -> Status {
        let objective = self.model.evaluate_objective(&values);
        self.assignment = Some(Assignment::new(values, objective));
        Status::Optimal
    }
}

impl Backend for SimplexBackend {

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
        if time_limit.map(|limit| limit.is_zero()).unwrap_or(false) {
            return Ok(Status::TimeLimit);
        }
        // Constraints without variables are decided here, microlp only receives the others
        let trivially_violated = self.model.constraints_iter().any(|c| c.terms().is_empty() && !c.is_satisfied(&[]));
        if trivially_violated {
            return Ok(Status::Infeasible);
        }
        if self.model.number_variables() == 0 {
            return Ok(self.record(vec![]));
        }

        let direction = match self.model.sense() {
            Sense::Minimize => OptimizationDirection::Minimize,
            Sense::Maximize => OptimizationDirection::Maximize,
        };
        let mut problem = Problem::new(direction);
        let mut costs = vec![0.0; self.model.number_variables()];
        for (v, c) in self.model.objective().iter() {
            costs[v.0] = *c;
        }
        let variables = costs.iter().map(|c| problem.add_integer_var(*c, (0, 1))).collect::<Vec<microlp::Variable>>();
        for constraint in self.model.constraints_iter().filter(|c| !c.terms().is_empty()) {
            let mut expr = microlp::LinearExpr::empty();
            for (v, c) in constraint.terms().iter() {
                expr.add(variables[v.0], *c);
            }
            let op = match constraint.relation() {
                Relation::Le => ComparisonOp::Le,
                Relation::Ge => ComparisonOp::Ge,
                Relation::Eq => ComparisonOp::Eq,
            };
            problem.add_constraint(expr, op, constraint.rhs());
        }

        match problem.solve() {
            Ok(solution) => {
                let values = variables.iter().map(|v| if solution[*v] > BINARY_THRESHOLD { 1.0 } else { 0.0 }).collect::<Vec<f64>>();
                debug!("simplex: {} variables, {} constraints, objective {}", variables.len(), self.model.number_constraints(), solution.objective());
                if !self.model.constraints_iter().all(|c| c.is_satisfied(&values)) {
                    return Err(CvspError::Backend("rounded solution violates the model".to_string()));
                }
                Ok(self.record(values))
            },
            Err(microlp::Error::Infeasible) => Ok(Status::Infeasible),
            Err(error) => Err(CvspError::Backend(error.to_string())),
        }
    }
}

#[cfg(test)]
mod test_simplex_backend {

    use super::*;
    use crate::backend::{LinearExpr, VarIndex};

    #[test]
    pub fn knapsack() {
        let mut backend = SimplexBackend::default();
        let a = backend.create_binary_var("a").unwrap();
        let b = backend.create_binary_var("b").unwrap();
        let c = backend.create_binary_var("c").unwrap();
        backend.add_linear_constraint(LinearExpr::new().term(a, 2.0).term(b, 3.0).term(c, 1.0), Relation::Le, 4.0).unwrap();
        backend.set_objective(LinearExpr::new().term(a, 5.0).term(b, 4.0).term(c, 3.0), Sense::Maximize).unwrap();
        assert_eq!(Status::Optimal, backend.solve(None).unwrap());
        assert_eq!(8.0, backend.objective_value().unwrap());
        assert_eq!(0.0, backend.value_of(b).unwrap());
    }

    #[test]
    pub fn minimum_cover() {
        let mut backend = SimplexBackend::default();
        let x = (0..3).map(|i| backend.create_binary_var(&format!("x_{}", i)).unwrap()).collect::<Vec<VarIndex>>();
        for (u, v) in [(0, 1), (1, 2), (0, 2)] {
            backend.add_linear_constraint(LinearExpr::sum([x[u], x[v]]), Relation::Ge, 1.0).unwrap();
        }
        backend.set_objective(LinearExpr::sum(x.iter().copied()), Sense::Minimize).unwrap();
        assert_eq!(Status::Optimal, backend.solve(None).unwrap());
        assert_eq!(2.0, backend.objective_value().unwrap());
    }

    #[test]
    pub fn infeasible_model() {
        let mut backend = SimplexBackend::default();
        let x = backend.create_binary_var("x").unwrap();
        let y = backend.create_binary_var("y").unwrap();
        backend.add_linear_constraint(LinearExpr::sum([x, y]), Relation::Ge, 3.0).unwrap();
        assert_eq!(Status::Infeasible, backend.solve(None).unwrap());
        assert!(matches!(backend.value_of(x), Err(CvspError::NoSolution)));
    }

    #[test]
    pub fn constant_constraints() {
        let mut backend = SimplexBackend::default();
        backend.add_linear_constraint(LinearExpr::new().constant(2.0), Relation::Le, 1.0).unwrap();
        assert_eq!(Status::Infeasible, backend.solve(None).unwrap());

        let mut backend = SimplexBackend::default();
        backend.add_linear_constraint(LinearExpr::new().constant(1.0), Relation::Le, 1.0).unwrap();
        backend.set_objective(LinearExpr::new().constant(1.0), Sense::Minimize).unwrap();
        assert_eq!(Status::Optimal, backend.solve(None).unwrap());
        assert_eq!(1.0, backend.objective_value().unwrap());
    }

    #[test]
    pub fn zero_time_limit() {
        let mut backend = SimplexBackend::default();
        backend.create_binary_var("x").unwrap();
        assert_eq!(Status::TimeLimit, backend.solve(Some(Duration::ZERO)).unwrap());
        assert!(matches!(backend.create_binary_var("y"), Err(CvspError::ModelFinalized)));
    }
}
