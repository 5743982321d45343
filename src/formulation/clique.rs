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

//! Clique cover formulation. Instead of one constraint per edge and shore, each maximal clique
//! `q` gets a variable `y[i][q]` per shore telling that the clique meets shore `i`. A clique can
//! meet at most one shore, and a vertex can only be in shore `i` if all its cliques are allowed
//! to meet it. Every edge being in a maximal clique, no edge joins two shores.

use tracing::debug;

use super::*;
use crate::backend::Sense;

pub struct CliqueCoverBuilder;

impl UnilevelBuilder for CliqueCoverBuilder {

    fn build(&self, graph: &Graph, parameters: &SolveParameters, backend: &mut dyn Backend) -> Result<Encoding, CvspError> {
        let separator = separator_variables(graph, backend)?;
        let active = vec![true; graph.number_vertices()];
        let shores = shore_variables(graph, &active, parameters.k(), backend)?;
        add_vertex_assignment(graph, &separator, &shores, backend)?;

        // Isolated vertices are cliques of size one and do not constrain anything
        let cliques = graph.maximal_cliques().into_iter().filter(|q| q.len() > 1).collect::<Vec<Vec<VertexIndex>>>();
        for (q, clique) in cliques.iter().enumerate() {
            let mut meets = vec![];
            for (i, shore) in shores.iter().enumerate() {
                let y = backend.create_binary_var(&format!("y_{}_{}", i + 1, q))?;
                for v in clique.iter().copied() {
                    if let Some(e) = shore[v.0] {
                        backend.add_linear_constraint(LinearExpr::new().term(e, 1.0).term(y, -1.0), Relation::Le, 0.0)?;
                    }
                }
                meets.push(y);
            }
            backend.add_linear_constraint(LinearExpr::sum(meets), Relation::Le, 1.0)?;
        }

        add_shore_sizes(&shores, parameters, backend)?;
        add_symmetry_breaking(graph, &shores, backend)?;
        backend.set_objective(LinearExpr::sum(separator), Sense::Minimize)?;
        debug!("clique cover model: {} cliques, {} variables, {} constraints", cliques.len(), backend.number_variables(), backend.number_constraints());
        Ok(Encoding::Shores(shores))
    }
}
