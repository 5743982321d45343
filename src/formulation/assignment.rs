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

//! Assignment formulation: each vertex is assigned to the separator or to one of the shores, and
//! the endpoints of an edge can not be assigned to two different shores.

use tracing::debug;

use super::*;
use crate::backend::Sense;

pub struct AssignmentBuilder;

impl UnilevelBuilder for AssignmentBuilder {

    fn build(&self, graph: &Graph, parameters: &SolveParameters, backend: &mut dyn Backend) -> Result<Encoding, CvspError> {
        let separator = separator_variables(graph, backend)?;
        let active = vec![true; graph.number_vertices()];
        let shores = shore_variables(graph, &active, parameters.k(), backend)?;
        add_vertex_assignment(graph, &separator, &shores, backend)?;
        add_edge_rule(graph, &shores, backend)?;
        add_shore_sizes(&shores, parameters, backend)?;
        backend.set_objective(LinearExpr::sum(separator), Sense::Minimize)?;
        debug!("assignment model: {} variables, {} constraints", backend.number_variables(), backend.number_constraints());
        Ok(Encoding::Shores(shores))
    }
}
