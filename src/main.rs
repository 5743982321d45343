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

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use cvsp::args::{App, Command, SolveArgs};
use cvsp::parsers::{graph_from_file, write_graph};
use cvsp::Graph;

fn run_solve(args: SolveArgs) -> Result<()> {
    let graph = graph_from_file(&args.input).with_context(|| format!("could not read the graph from {}", args.input.display()))?;
    let parameters = args.parameters();
    let result = if args.statistics {
        cvsp::solve_with_statistics(&graph, args.library, args.formulation, &parameters)?
    } else {
        cvsp::solve(&graph, args.library, args.formulation, &parameters)?
    };
    if !args.quiet {
        result.print(&graph);
    }
    if result.is_optimal() {
        let output = args.output_path(chrono::Local::now());
        let mut file = File::create(&output).with_context(|| format!("could not create {}", output.display()))?;
        file.write_all(result.to_text(&graph).as_bytes())?;
    } else if !args.quiet {
        println!("Solution not found");
    }
    Ok(())
}

fn run_generate(n: usize, p: f64, seed: u64, output: PathBuf) -> Result<()> {
    let graph = Graph::random(n, p, seed);
    write_graph(&graph, &output).with_context(|| format!("could not write the graph into {}", output.display()))?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let app = App::parse();
    match app.command {
        Command::Solve(args) => run_solve(args),
        Command::Generate { n, p, seed, output } => run_generate(n, p, seed, output),
    }
}
