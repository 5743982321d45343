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

//! Subset cover formulation, on the separator variables only.
//!
//! A vertex subset `W` is packable if the connected components of the sub-graph it induces can be
//! packed into the shores. Under the `AllowEmpty` policy packability is preserved when vertices
//! are removed, so the residual graph must not contain any non packable subset: for each minimal
//! non packable `W`, at least one vertex of `W` is in the separator. Under the `NonEmpty` policy
//! removing a vertex can break packability (a shore may become empty), and each non packable
//! residual is forbidden exactly instead.
//!
//! Every subset is enumerated, so the formulation is limited to small graphs.

use tracing::debug;

use super::*;
use crate::backend::Sense;
use crate::core::packing;

pub struct SubsetCoverBuilder;

impl SubsetCoverBuilder {

    /// For every subset of the vertices (as a bit mask), tells if it is packable
    fn packable_subsets(graph: &Graph, parameters: &SolveParameters) -> Vec<bool> {
        let n = graph.number_vertices();
        (0..(1usize << n)).map(|mask| {
            let active = (0..n).map(|v| mask & (1 << v) != 0).collect::<Vec<bool>>();
            let sizes = graph.components(&active).iter().map(|c| c.len()).collect::<Vec<usize>>();
            packing::fits(&sizes, parameters.k(), parameters.b(), parameters.shore_policy())
        }).collect()
    }
}

impl UnilevelBuilder for SubsetCoverBuilder {

    fn check(&self, graph: &Graph, parameters: &SolveParameters) -> Result<(), CvspError> {
        let limit = parameters.enumeration_limit().min(usize::BITS as usize - 1);
        if graph.number_vertices() > limit {
            return Err(CvspError::EnumerationLimit { vertices: graph.number_vertices(), limit });
        }
        Ok(())
    }

    fn build(&self, graph: &Graph, parameters: &SolveParameters, backend: &mut dyn Backend) -> Result<Encoding, CvspError> {
        self.check(graph, parameters)?;
        let n = graph.number_vertices();
        let x = separator_variables(graph, backend)?;
        let packable = Self::packable_subsets(graph, parameters);
        for (mask, is_packable) in packable.iter().copied().enumerate() {
            if is_packable {
                continue;
            }
            let inside = (0..n).filter(|v| mask & (1 << v) != 0).map(|v| x[v]).collect::<Vec<VarIndex>>();
            match parameters.shore_policy() {
                ShorePolicy::AllowEmpty => {
                    let minimal = (0..n).filter(|v| mask & (1 << v) != 0).all(|v| packable[mask ^ (1 << v)]);
                    if minimal {
                        backend.add_linear_constraint(LinearExpr::sum(inside), Relation::Ge, 1.0)?;
                    }
                },
                ShorePolicy::NonEmpty => {
                    // sum_{v in W} x_v + sum_{v not in W} (1 - x_v) >= 1
                    let mut expr = LinearExpr::sum(inside);
                    let mut outside = 0;
                    for v in (0..n).filter(|v| mask & (1 << v) == 0) {
                        expr.add_term(x[v], -1.0);
                        outside += 1;
                    }
                    backend.add_linear_constraint(expr.constant(outside as f64), Relation::Ge, 1.0)?;
                },
            }
        }
        backend.set_objective(LinearExpr::sum(x.iter().copied()), Sense::Minimize)?;
        debug!("subset cover model: {} variables, {} constraints", backend.number_variables(), backend.number_constraints());
        Ok(Encoding::Separator(x))
    }
}
