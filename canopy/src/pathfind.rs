// Canopy: Comtree Control Plane for Overlay Multicast Networks
// Copyright (C) 2021  The Canopy Developers
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! # Capacity-Constrained Path Search
//!
//! Grows a comtree towards a router that wants to join: [`find_path`] runs Dijkstra's
//! algorithm over the router subgraph, weighted by link length, but only relaxes edges
//! whose residual capacity admits the required rate in the direction of travel. The
//! search stops at the first comtree member it pops, which is the nearest admissible
//! attachment point; [`add_path`] then records the found branch in the comtree, and
//! [`remove_path`] prunes it again when the member leaves.

use crate::comtree::Comtree;
use crate::error::Error;
use crate::network::Network;
use crate::rates::RateSpec;
use crate::types::{ComtreeError, LinkId, NodeId};
use log::*;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// One edge of a path found by [`find_path`]: the physical link, the endpoint that will
/// become the child side of the new comtree edge, and the rate to reserve on it. The
/// steps of a path are ordered from the attachment point on the comtree down towards the
/// joining router.
#[derive(Debug, Clone, PartialEq)]
pub struct PathStep {
    /// The physical link to turn into a comtree edge
    pub lnk: LinkId,
    /// The endpoint of `lnk` farther from the comtree
    pub child: NodeId,
    /// The rate to reserve, "up" pointing from child to parent
    pub rates: RateSpec,
}

/// Find an admissible path from `src` to the nearest router already on the comtree.
///
/// An edge may only be used if `required` fits the link's available rates, oriented in
/// the direction of travel. Among the admissible edges the path minimizes total link
/// length; the search terminates the instant any comtree member is popped, which on the
/// admissible subgraph is the nearest one. If `src` itself is already a member the
/// result is the empty path. If the frontier empties without reaching the comtree, no
/// admissible path exists and a typed failure is returned.
pub fn find_path(
    net: &Network,
    comtree: &Comtree,
    src: NodeId,
    required: RateSpec,
) -> Result<Vec<PathStep>, Error> {
    net.router(src)?;
    if comtree.is_comt_rtr(src) {
        return Ok(Vec::new());
    }

    let mut dist: HashMap<NodeId, u64> = HashMap::new();
    let mut parent: HashMap<NodeId, (NodeId, LinkId)> = HashMap::new();
    let mut done: HashSet<NodeId> = HashSet::new();
    let mut heap: BinaryHeap<Reverse<(u64, NodeId)>> = BinaryHeap::new();
    dist.insert(src, 0);
    heap.push(Reverse((0, src)));

    while let Some(Reverse((d, u))) = heap.pop() {
        if !done.insert(u) {
            continue;
        }
        if comtree.is_comt_rtr(u) {
            debug!("Reached comtree {:?} at {:?}, distance {}", comtree.comt(), u, d);
            let mut path = Vec::new();
            let mut cur = u;
            while cur != src {
                let (pred, lnk) = parent[&cur];
                path.push(PathStep { lnk, child: pred, rates: required });
                cur = pred;
            }
            return Ok(path);
        }
        for (lnk, v) in net.incident(u) {
            if !net.is_router(v) || done.contains(&v) {
                continue;
            }
            if !required.leq(&net.avail_from(lnk, u)?) {
                continue;
            }
            let nd = d + net.link(lnk)?.length() as u64;
            if nd < *dist.get(&v).unwrap_or(&u64::MAX) {
                dist.insert(v, nd);
                parent.insert(v, (u, lnk));
                heap.push(Reverse((nd, v)));
            }
        }
    }

    Err(ComtreeError::NoPath { comt: comtree.comt(), node: src }.into())
}

/// Record a path found by [`find_path`] in the comtree: every step's child router joins
/// the tree with the step's link as its parent link and the step's rates as the edge's
/// committed reservation. Recording only updates the comtree; reserving the rates
/// against the physical links is a separate
/// [`check_and_provision`](crate::provision::check_and_provision) call.
pub fn add_path(comtree: &mut Comtree, net: &Network, path: &[PathStep]) -> Result<(), Error> {
    for step in path {
        comtree.add_rtr(step.child);
        comtree.add_comt_link(net, step.lnk, step.child)?;
        comtree.set_comt_lnk_rates(step.lnk, step.rates)?;
    }
    Ok(())
}

/// Prune a previously added path from the comtree, outermost router first. Fails if a
/// router on the path has grown additional comtree links in the meantime; in that case
/// the routers removed so far stay removed, and the caller re-runs the removal once the
/// branch is clear.
pub fn remove_path(comtree: &mut Comtree, path: &[PathStep]) -> Result<(), Error> {
    for step in path.iter().rev() {
        comtree.remove_comt_link(step.lnk)?;
        comtree.remove_rtr(step.child)?;
    }
    Ok(())
}
