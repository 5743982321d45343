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

//! Exact packing of connected components into shores.
//!
//! Once a separator is fixed, the residual graph splits into connected components. A component
//! can not be cut between two shores, so the residual graph admits a valid partition if and only
//! if the component sizes can be packed into `k` bins of capacity `b` (each bin being non-empty
//! under the `NonEmpty` policy). The number of components is small for the instances handled by
//! the separator-only formulations, so the packing is solved exactly by a depth-first search.

use crate::common::ShorePolicy;
use crate::core::graph::Graph;

/// Packs the items into `k` bins of the given capacity. Returns, for each item, the 0-based bin
/// it is packed in, or `None` if no packing exists.
pub fn pack(sizes: &[usize], k: usize, capacity: usize, policy: ShorePolicy) -> Option<Vec<usize>> {
    if sizes.iter().any(|s| *s > capacity) {
        return None;
    }
    if policy == ShorePolicy::NonEmpty && sizes.len() < k {
        return None;
    }
    // Bins beyond the number of items stay empty
    let k = k.min(sizes.len());
    if sizes.iter().sum::<usize>() > k.saturating_mul(capacity) {
        return None;
    }
    // Largest items first, the search fails much faster on them
    let mut order = (0..sizes.len()).collect::<Vec<usize>>();
    order.sort_by(|a, b| sizes[*b].cmp(&sizes[*a]));
    let mut loads = vec![0; k];
    let mut bins = vec![0; sizes.len()];
    if branch(sizes, &order, 0, capacity, policy, &mut loads, &mut bins) {
        Some(bins)
    } else {
        None
    }
}

/// Returns true if the items can be packed into `k` bins of the given capacity
pub fn fits(sizes: &[usize], k: usize, capacity: usize, policy: ShorePolicy) -> bool {
    pack(sizes, k, capacity, policy).is_some()
}

fn branch(sizes: &[usize], order: &[usize], depth: usize, capacity: usize, policy: ShorePolicy, loads: &mut Vec<usize>, bins: &mut Vec<usize>) -> bool {
    let empty_bins = loads.iter().filter(|l| **l == 0).count();
    if policy == ShorePolicy::NonEmpty && order.len() - depth < empty_bins {
        return false;
    }
    if depth == order.len() {
        return true;
    }
    let item = order[depth];
    for bin in 0..loads.len() {
        if loads[bin] + sizes[item] > capacity {
            continue;
        }
        // Two bins with the same load are interchangeable
        if loads[..bin].contains(&loads[bin]) {
            continue;
        }
        loads[bin] += sizes[item];
        bins[item] = bin;
        if branch(sizes, order, depth + 1, capacity, policy, loads, bins) {
            return true;
        }
        loads[bin] -= sizes[item];
    }
    false
}

/// Labels the vertices of the graph given a separator: separator vertices get label 0 and the
/// vertices of each residual component get the (1-based) shore their component is packed in.
/// Returns `None` if the residual graph can not be packed into the shores.
pub fn shores_from_separator(graph: &Graph, in_separator: &[bool], k: usize, capacity: usize, policy: ShorePolicy) -> Option<Vec<usize>> {
    let active = in_separator.iter().map(|s| !*s).collect::<Vec<bool>>();
    let components = graph.components(&active);
    let sizes = components.iter().map(|c| c.len()).collect::<Vec<usize>>();
    let bins = pack(&sizes, k, capacity, policy)?;
    let mut labels = vec![0; graph.number_vertices()];
    for (component, bin) in components.iter().zip(bins.iter().copied()) {
        for v in component.iter().copied() {
            labels[v.0] = bin + 1;
        }
    }
    Some(labels)
}
