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

use std::fmt;

use crate::PEAK_ALLOC;

/// Statistics collected while building and solving the models. Nothing is recorded when `B` is
/// false.
#[derive(Default)]
pub struct Statistics<const B: bool> {
    number_solves: usize,
    master_iterations: usize,
    number_cuts: usize,
    number_variables: usize,
    number_constraints: usize,
}

impl<const B: bool> Statistics<B> {

    pub fn solve(&mut self) {
        if B {
            self.number_solves += 1;
        }
    }

    pub fn master_iteration(&mut self) {
        if B {
            self.master_iterations += 1;
        }
    }

    pub fn cut(&mut self) {
        if B {
            self.number_cuts += 1;
        }
    }

    pub fn model(&mut self, variables: usize, constraints: usize) {
        if B {
            self.number_variables += variables;
            self.number_constraints += constraints;
        }
    }

    pub fn number_solves(&self) -> usize {
        self.number_solves
    }

    pub fn master_iterations(&self) -> usize {
        self.master_iterations
    }

    pub fn number_cuts(&self) -> usize {
        self.number_cuts
    }

    pub fn print(&self) {
        if B {
            println!("{}", self);
        }
    }
}

impl<const B: bool> fmt::Display for Statistics<B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if B {
            writeln!(f,
                "solves {} | master iterations {} | cuts {} | variables {} | constraints {} | peak memory {:.3} MB",
                self.number_solves,
                self.master_iterations,
                self.number_cuts,
                self.number_variables,
                self.number_constraints,
                PEAK_ALLOC.peak_usage_as_mb())
        } else {
            write!(f, "")
        }
    }
}

#[cfg(test)]
mod test_statistics {

    use super::*;

    #[test]
    pub fn quiet_statistics_do_not_count() {
        let mut statistics = Statistics::<false>::default();
        statistics.solve();
        statistics.cut();
        assert_eq!(0, statistics.number_solves());
        assert_eq!(0, statistics.number_cuts());
        assert_eq!("", format!("{}", statistics));
    }

    #[test]
    pub fn counters() {
        let mut statistics = Statistics::<true>::default();
        statistics.solve();
        statistics.solve();
        statistics.master_iteration();
        statistics.cut();
        statistics.model(10, 4);
        assert_eq!(2, statistics.number_solves());
        assert_eq!(1, statistics.master_iterations());
        assert_eq!(1, statistics.number_cuts());
        assert!(format!("{}", statistics).contains("variables 10 | constraints 4"));
    }
}
