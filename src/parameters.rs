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

use std::time::{Duration, Instant};

use crate::common::ShorePolicy;
use crate::error::CvspError;

/// Largest graph, in number of vertices, on which the subset formulation enumerates the subsets
pub const DEFAULT_ENUMERATION_LIMIT: usize = 16;

/// Parameters of one solve call
#[derive(Debug, Clone)]
pub struct SolveParameters {
    /// Number of shores
    k: usize,
    /// Capacity of each shore
    b: usize,
    /// How the shores are counted
    shore_policy: ShorePolicy,
    /// Global time budget of the solve, split among the backend calls
    time_limit: Option<Duration>,
    /// Maximum number of master problems solved by a bilevel formulation
    max_iterations: usize,
    /// Largest graph on which the subset formulation is allowed
    enumeration_limit: usize,
}

impl SolveParameters {

    pub fn new(k: usize, b: usize) -> Self {
        Self {
            k,
            b,
            shore_policy: ShorePolicy::default(),
            time_limit: None,
            max_iterations: usize::MAX,
            enumeration_limit: DEFAULT_ENUMERATION_LIMIT,
        }
    }

    pub fn with_shore_policy(mut self, policy: ShorePolicy) -> Self {
        self.shore_policy = policy;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Same parameters with another number of shores
    pub(crate) fn with_shore_count(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_enumeration_limit(mut self, limit: usize) -> Self {
        self.enumeration_limit = limit;
        self
    }

    /// Checks the instance parameters, before anything is built
    pub fn validate(&self) -> Result<(), CvspError> {
        if self.k < 2 {
            return Err(CvspError::InvalidParameter { name: "k", value: self.k, expected: "k >= 2" });
        }
        if self.b < 1 {
            return Err(CvspError::InvalidParameter { name: "b", value: self.b, expected: "b >= 1" });
        }
        Ok(())
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn b(&self) -> usize {
        self.b
    }

    pub fn shore_policy(&self) -> ShorePolicy {
        self.shore_policy
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn enumeration_limit(&self) -> usize {
        self.enumeration_limit
    }

    /// Time left from the global budget, given the instant at which the solve started
    pub fn remaining(&self, start: Instant) -> Option<Duration> {
        self.time_limit.map(|limit| limit.saturating_sub(start.elapsed()))
    }
}

impl Default for SolveParameters {
    fn default() -> Self {
        Self::new(3, 3)
    }
}
