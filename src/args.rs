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

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};

use crate::common::{Library, ShorePolicy};
use crate::parameters::SolveParameters;

#[derive(Debug, Parser)]
#[clap(name="cvsp", version, author, about)]
pub struct App {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Computes a minimum separator of a graph
    Solve(SolveArgs),
    /// Generates a random graph and writes it in the edge list format
    Generate {
        /// Number of vertices
        #[clap(short, long)]
        n: usize,
        /// Probability of each edge
        #[clap(short, long)]
        p: f64,
        /// Seed of the random generator
        #[clap(long, default_value_t=0)]
        seed: u64,
        /// The output file
        #[clap(short, long, value_parser)]
        output: PathBuf,
    },
}

#[derive(Debug, clap::Args)]
pub struct SolveArgs {
    /// The input file
    #[clap(short, long, value_parser)]
    pub input: PathBuf,
    /// Where to write the solution. Defaults to <input stem>_solution_<timestamp>.txt next to the input
    #[clap(short, long, value_parser)]
    pub output: Option<PathBuf>,
    /// The library solving the models
    #[clap(short, long, value_enum, default_value_t=Library::Simplex)]
    pub library: Library,
    /// Index of the formulation in the registry of the library, starting at 1
    #[clap(short, long, default_value_t=1)]
    pub formulation: usize,
    /// Number of shores
    #[clap(short, default_value_t=3)]
    pub k: usize,
    /// Capacity of the shores
    #[clap(short, default_value_t=3)]
    pub b: usize,
    /// Whether the shores may be empty
    #[clap(long, value_enum, default_value_t=ShorePolicy::AllowEmpty)]
    pub shores: ShorePolicy,
    /// Time limit of the solve, in seconds
    #[clap(short, long)]
    pub timeout: Option<u64>,
    /// Maximum number of master problems for the bilevel formulations
    #[clap(long)]
    pub max_iterations: Option<usize>,
    /// Collect stats during the solve
    #[clap(long, action)]
    pub statistics: bool,
    /// Do not print the solution
    #[clap(short, long, action)]
    pub quiet: bool,
}

impl SolveArgs {

    pub fn parameters(&self) -> SolveParameters {
        let mut parameters = SolveParameters::new(self.k, self.b).with_shore_policy(self.shores);
        if let Some(timeout) = self.timeout {
            parameters = parameters.with_time_limit(Duration::from_secs(timeout));
        }
        if let Some(iterations) = self.max_iterations {
            parameters = parameters.with_max_iterations(iterations);
        }
        parameters
    }

    /// The output file, or the default one derived from the input and the given time
    pub fn output_path(&self, now: DateTime<Local>) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => default_output(&self.input, now),
        }
    }
}

fn default_output(input: &Path, now: DateTime<Local>) -> PathBuf {
    let stem = input.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
    let name = format!("{}_solution_{}.txt", stem, now.format("%Y-%m-%d_%H-%M-%S"));
    input.with_file_name(name)
}

#[cfg(test)]
mod test_args {

    use super::*;
    use chrono::TimeZone;

    #[test]
    pub fn defaults() {
        let app = App::parse_from(["cvsp", "solve", "-i", "graph.txt"]);
        match app.command {
            Command::Solve(args) => {
                assert_eq!(Library::Simplex, args.library);
                assert_eq!(1, args.formulation);
                let parameters = args.parameters();
                assert_eq!(3, parameters.k());
                assert_eq!(3, parameters.b());
                assert_eq!(None, parameters.time_limit());
            },
            _ => panic!("expected the solve command"),
        }
    }

    #[test]
    pub fn solve_options() {
        let app = App::parse_from(["cvsp", "solve", "-i", "g.txt", "-l", "trail", "-f", "5", "-k", "2", "-b", "4", "--shores", "non-empty", "-t", "10"]);
        match app.command {
            Command::Solve(args) => {
                assert_eq!(Library::Trail, args.library);
                assert_eq!(5, args.formulation);
                let parameters = args.parameters();
                assert_eq!(2, parameters.k());
                assert_eq!(4, parameters.b());
                assert_eq!(ShorePolicy::NonEmpty, parameters.shore_policy());
                assert_eq!(Some(Duration::from_secs(10)), parameters.time_limit());
            },
            _ => panic!("expected the solve command"),
        }
    }

    #[test]
    pub fn default_output_next_to_input() {
        let now = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        let output = default_output(Path::new("data/graph1.txt"), now);
        assert_eq!(PathBuf::from("data/graph1_solution_2024-03-05_14-07-09.txt"), output);
    }
}
