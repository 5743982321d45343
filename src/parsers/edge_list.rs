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

//! This module provides a parser and a writer for the edge list format of the graphs.
//! An example of valid file is given next
//!
//! 5, 4, 0
//! a, b
//! b, c
//! c, d
//! d, e
//!
//! The first line gives the number of vertices, the number of edges and whether the graph is
//! directed (only undirected graphs are accepted). Each following line is an edge given by the
//! names of its endpoints. A line with a single name declares a vertex without any edge.
//! The vertices and edges read must match the counts of the header.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use crate::core::graph::Graph;
use crate::error::CvspError;

fn parse_error(line: usize, message: impl Into<String>) -> CvspError {
    CvspError::Parse { line, message: message.into() }
}

fn parse_header(header: &str) -> Result<(usize, usize), CvspError> {
    let tokens = header.split(',').map(|t| t.trim()).collect::<Vec<&str>>();
    if tokens.len() != 3 {
        return Err(parse_error(1, format!("expected '<vertices>, <edges>, <directed>', found '{}'", header)));
    }
    let mut values = vec![];
    for token in tokens {
        values.push(token.parse::<usize>().map_err(|_| parse_error(1, format!("'{}' is not a number", token)))?);
    }
    if values[2] != 0 {
        return Err(parse_error(1, "directed graphs are not supported"));
    }
    Ok((values[0], values[1]))
}

fn graph_from_lines<I: Iterator<Item = Result<String, std::io::Error>>>(mut lines: I) -> Result<Graph, CvspError> {
    // Editors on Windows may leave a byte order mark
    let header = lines.next().ok_or_else(|| parse_error(1, "empty file"))??;
    let (number_vertices, number_edges) = parse_header(header.trim_start_matches('\u{feff}').trim())?;
    let mut graph = Graph::new();
    for (i, line) in lines.enumerate() {
        let line = line?;
        let line_number = i + 2;
        let tokens = line.split(',').map(|t| t.trim()).filter(|t| !t.is_empty()).collect::<Vec<&str>>();
        match tokens.len() {
            0 => continue,
            1 => {
                graph.add_vertex(tokens[0]);
            },
            2 => {
                let u = graph.add_vertex(tokens[0]);
                let v = graph.add_vertex(tokens[1]);
                graph.add_edge(u, v).map_err(|e| parse_error(line_number, e.to_string()))?;
            },
            _ => return Err(parse_error(line_number, format!("expected an edge '<u>, <v>', found '{}'", line))),
        }
    }
    if graph.number_vertices() != number_vertices {
        return Err(parse_error(1, format!("the header announces {} vertices but {} were read", number_vertices, graph.number_vertices())));
    }
    if graph.number_edges() != number_edges {
        return Err(parse_error(1, format!("the header announces {} edges but {} were read", number_edges, graph.number_edges())));
    }
    Ok(graph)
}

pub fn graph_from_file(filepath: &Path) -> Result<Graph, CvspError> {
    let file = File::open(filepath)?;
    graph_from_lines(BufReader::new(file).lines())
}

pub fn graph_from_str(content: &str) -> Result<Graph, CvspError> {
    graph_from_lines(content.lines().map(|l| Ok(l.to_string())))
}

/// Textual form of the graph. Edges come first, then the isolated vertices.
pub fn graph_to_string(graph: &Graph) -> String {
    let mut out = format!("{}, {}, 0\n", graph.number_vertices(), graph.number_edges());
    for (u, v) in graph.edges_iter() {
        out.push_str(&format!("{}, {}\n", graph.name(u), graph.name(v)));
    }
    for v in graph.vertices_iter().filter(|v| graph.degree(*v) == 0) {
        out.push_str(&format!("{}\n", graph.name(v)));
    }
    out
}

pub fn write_graph(graph: &Graph, filepath: &Path) -> Result<(), CvspError> {
    let mut file = File::create(filepath)?;
    file.write_all(graph_to_string(graph).as_bytes())?;
    Ok(())
}
