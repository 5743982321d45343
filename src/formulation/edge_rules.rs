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

//! Variants of the assignment formulation that only differ by how the edge rule is written.
//!
//! `PairwiseEdgesBuilder` forbids each pair of distinct shores on the endpoints of an edge with
//! its own constraint: `e[i][w] + e[j][v] <= 1` for all `i != j`.
//! `ShoreSubsetEdgesBuilder` aggregates them: for each proper non-empty subset `L` of the shores,
//! `sum_{l in L} e[l][w] + sum_{l not in L} e[l][v] <= 1`. There are `2^k - 2` such subsets, so
//! the number of shores is bounded by the enumeration limit.

use tracing::debug;

use super::*;
use crate::backend::Sense;

fn build_assignment<F>(graph: &Graph, parameters: &SolveParameters, backend: &mut dyn Backend, edge_rule: F) -> Result<Encoding, CvspError>
    where F: Fn(&[Vec<Option<VarIndex>>], VertexIndex, VertexIndex, &mut dyn Backend) -> Result<(), CvspError>
{
    let separator = separator_variables(graph, backend)?;
    let active = vec![true; graph.number_vertices()];
    let shores = shore_variables(graph, &active, parameters.k(), backend)?;
    add_vertex_assignment(graph, &separator, &shores, backend)?;
    for (w, v) in graph.edges_iter() {
        edge_rule(&shores, w, v, &mut *backend)?;
    }
    add_shore_sizes(&shores, parameters, backend)?;
    backend.set_objective(LinearExpr::sum(separator), Sense::Minimize)?;
    Ok(Encoding::Shores(shores))
}

pub struct PairwiseEdgesBuilder;

impl UnilevelBuilder for PairwiseEdgesBuilder {

    fn build(&self, graph: &Graph, parameters: &SolveParameters, backend: &mut dyn Backend) -> Result<Encoding, CvspError> {
        let encoding = build_assignment(graph, parameters, backend, |shores, w, v, backend| {
            for i in 0..shores.len() {
                for j in (0..shores.len()).filter(|j| *j != i) {
                    if let (Some(e_iw), Some(e_jv)) = (shores[i][w.0], shores[j][v.0]) {
                        backend.add_linear_constraint(LinearExpr::sum([e_iw, e_jv]), Relation::Le, 1.0)?;
                    }
                }
            }
            Ok(())
        })?;
        debug!("pairwise edges model: {} variables, {} constraints", backend.number_variables(), backend.number_constraints());
        Ok(encoding)
    }
}

pub struct ShoreSubsetEdgesBuilder;

impl UnilevelBuilder for ShoreSubsetEdgesBuilder {

    fn check(&self, _graph: &Graph, parameters: &SolveParameters) -> Result<(), CvspError> {
        let limit = parameters.enumeration_limit().min(usize::BITS as usize - 1);
        if parameters.k() > limit {
            return Err(CvspError::EnumerationLimit { vertices: parameters.k(), limit });
        }
        Ok(())
    }

    fn build(&self, graph: &Graph, parameters: &SolveParameters, backend: &mut dyn Backend) -> Result<Encoding, CvspError> {
        self.check(graph, parameters)?;
        let k = parameters.k();
        let full = (1usize << k) - 1;
        let encoding = build_assignment(graph, parameters, backend, |shores, w, v, backend| {
            for subset in 1..full {
                let mut expr = LinearExpr::new();
                for (l, shore) in shores.iter().enumerate() {
                    let endpoint = if subset & (1 << l) != 0 { w } else { v };
                    if let Some(e) = shore[endpoint.0] {
                        expr.add_term(e, 1.0);
                    }
                }
                backend.add_linear_constraint(expr, Relation::Le, 1.0)?;
            }
            Ok(())
        })?;
        debug!("shore subset edges model: {} variables, {} constraints", backend.number_variables(), backend.number_constraints());
        Ok(encoding)
    }
}

#[cfg(test)]
mod test_edge_rules {

    use super::*;
    use crate::backend::TrailBackend;
    use crate::common::{ShorePolicy, Status};

    fn edge() -> Graph {
        Graph::from_edges(2, &[(0, 1)]).unwrap()
    }

    fn path5() -> Graph {
        Graph::from_edges(5, &[(0, 1), (1, 2), (2, 3), (3, 4)]).unwrap()
    }

    #[test]
    pub fn pairwise_model_size() {
        let mut backend = TrailBackend::default();
        PairwiseEdgesBuilder.build(&edge(), &SolveParameters::new(4, 1), &mut backend).unwrap();
        // 2 separator and 4 x 2 shore variables
        assert_eq!(10, backend.number_variables());
        // 2 assignments, 4 x 3 shore pairs, 4 capacities
        assert_eq!(18, backend.number_constraints());
    }

    #[test]
    pub fn shore_subset_model_size() {
        let mut backend = TrailBackend::default();
        ShoreSubsetEdgesBuilder.build(&edge(), &SolveParameters::new(4, 1), &mut backend).unwrap();
        assert_eq!(10, backend.number_variables());
        // 2 assignments, 2^4 - 2 shore subsets, 4 capacities
        assert_eq!(20, backend.number_constraints());
    }

    #[test]
    pub fn both_rules_cut_the_path() {
        let builders: [&dyn UnilevelBuilder; 2] = [&PairwiseEdgesBuilder, &ShoreSubsetEdgesBuilder];
        for builder in builders {
            let mut backend = TrailBackend::default();
            builder.build(&path5(), &SolveParameters::new(3, 2), &mut backend).unwrap();
            assert_eq!(Status::Optimal, backend.solve(None).unwrap());
            assert_eq!(1.0, backend.objective_value().unwrap());
        }
    }

    #[test]
    pub fn edge_can_not_be_split() {
        let non_empty = SolveParameters::new(2, 1).with_shore_policy(ShorePolicy::NonEmpty);
        let builders: [&dyn UnilevelBuilder; 2] = [&PairwiseEdgesBuilder, &ShoreSubsetEdgesBuilder];
        for builder in builders {
            let mut backend = TrailBackend::default();
            builder.build(&edge(), &non_empty, &mut backend).unwrap();
            assert_eq!(Status::Infeasible, backend.solve(None).unwrap());
        }
    }

    #[test]
    pub fn too_many_shores_to_enumerate() {
        let parameters = SolveParameters::new(5, 1).with_enumeration_limit(4);
        assert!(matches!(ShoreSubsetEdgesBuilder.check(&edge(), &parameters), Err(CvspError::EnumerationLimit { vertices: 5, limit: 4 })));
        assert!(PairwiseEdgesBuilder.check(&edge(), &parameters).is_ok());
    }
}
