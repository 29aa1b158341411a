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

//! # Provisioning Engine
//!
//! Turns a comtree's recorded reservations into actual claims on the bandwidth ledger.
//! Every operation here is all-or-nothing: the edges are checked against the residual
//! capacity first, and only if every edge fits is anything subtracted, so a rejected
//! batch never leaves a partial reservation behind. All ledger mutation goes through
//! `&mut Network`; the exclusive borrow is what serializes concurrent provisioning
//! against the shared links.

use crate::autoconf;
use crate::comtree::Comtree;
use crate::error::Error;
use crate::network::Network;
use crate::rates::RateSpec;
use crate::types::{ComtreeError, LinkId, NodeId};
use log::*;
use std::collections::{HashMap, HashSet};

/// Reserve every comtree edge's committed rates against the underlying links. First every
/// edge is compared against the link's current availability; if any edge does not fit,
/// the operation fails naming the offending link and no link is modified. Only when all
/// edges pass is every reservation subtracted.
pub fn check_and_provision(net: &mut Network, comtree: &Comtree) -> Result<(), Error> {
    let comt = comtree.comt();
    let mut plan: Vec<(LinkId, RateSpec)> = Vec::new();
    for (lnk, e) in comtree.comt_links() {
        let oriented = net.orient_from(lnk, e.child, e.rates)?;
        let avail = net.avail_rates(lnk)?;
        if !oriented.leq(&avail) {
            debug!("Comtree {:?} does not fit on link {:?}: {} > {}", comt, lnk, oriented, avail);
            return Err(ComtreeError::InsufficientCapacity { comt, lnk }.into());
        }
        plan.push((lnk, avail.minus(&oriented)));
    }
    for (lnk, new_avail) in plan {
        net.set_available_rate(lnk, new_avail)?;
    }
    debug!("Provisioned comtree {:?} on {} links", comt, comtree.num_comt_links());
    Ok(())
}

/// Release every comtree edge's committed rates back to the underlying links, the inverse
/// of [`check_and_provision`]. Releasing cannot exceed a link's configured rate if the
/// reservations were tracked correctly; if it would, the availability is clamped and the
/// violation logged, since it indicates a bookkeeping bug elsewhere.
pub fn unprovision(net: &mut Network, comtree: &Comtree) -> Result<(), Error> {
    let comt = comtree.comt();
    for (lnk, e) in comtree.comt_links() {
        let oriented = net.orient_from(lnk, e.child, e.rates)?;
        let restored = net.avail_rates(lnk)?.plus(&oriented);
        let cap = net.link_rates(lnk)?;
        let clamped = restored.min(&cap);
        if clamped != restored {
            error!(
                "Releasing comtree {:?} overflowed link {:?} ({} > {}), clamping",
                comt, lnk, restored, cap
            );
        }
        net.set_available_rate(lnk, clamped)?;
    }
    debug!("Unprovisioned comtree {:?} from {} links", comt, comtree.num_comt_links());
    Ok(())
}

/// Compute the rate changes a recomputation of the comtree's parent-link rates would
/// commit, without mutating anything. The walk mirrors the top-down pass of
/// [`autoconf::set_auto_config_rates`]: for every unfrozen member router it takes the
/// difference between the newly required and the currently committed parent-link rates,
/// and checks every non-zero difference against the link's availability. Any shortfall
/// fails the whole walk. The returned plan pairs each link with its delta, oriented
/// child to parent, and is meant to be inspected or logged before a following
/// [`apply_deltas`] call commits it.
pub fn compute_deltas(
    net: &Network,
    comtree: &Comtree,
) -> Result<Vec<(LinkId, RateSpec)>, Error> {
    let comt = comtree.comt();
    let root = match comtree.root() {
        Some(r) if comtree.is_comt_rtr(r) => r,
        _ => return Err(ComtreeError::NoRoot(comt).into()),
    };
    let children = comtree.children_by_rtr();
    let mut visited: HashSet<NodeId> = HashSet::new();
    visited.insert(root);
    let mut plan: Vec<(LinkId, RateSpec)> = Vec::new();
    walk_deltas(net, comtree, &children, root, &mut visited, &mut plan)?;
    Ok(plan)
}

fn walk_deltas(
    net: &Network,
    comtree: &Comtree,
    children: &HashMap<NodeId, Vec<(LinkId, NodeId)>>,
    u: NodeId,
    visited: &mut HashSet<NodeId>,
    plan: &mut Vec<(LinkId, RateSpec)>,
) -> Result<(), Error> {
    let comt = comtree.comt();
    for &(lnk, v) in children.get(&u).into_iter().flatten() {
        if !comtree.is_comt_rtr(v) {
            continue;
        }
        if !visited.insert(v) {
            return Err(ComtreeError::ProbableCycle { comt, node: v }.into());
        }
        if !comtree.is_frozen(v) {
            if let Some(required) = autoconf::required_plnk_rates(comtree, v) {
                let committed = comtree.comt_lnk_rates(lnk).unwrap_or_default();
                let delta = required.minus(&committed);
                if !delta.is_zero() {
                    let oriented = net.orient_from(lnk, v, delta)?;
                    if !oriented.leq(&net.avail_rates(lnk)?) {
                        return Err(ComtreeError::InsufficientCapacity { comt, lnk }.into());
                    }
                    plan.push((lnk, delta));
                }
            }
        }
        walk_deltas(net, comtree, children, v, visited, plan)?;
    }
    Ok(())
}

/// Commit a plan produced by [`compute_deltas`]: subtract each delta from its link's
/// availability and fold it into the comtree edge's committed rates. The plan is assumed
/// to have been validated by [`compute_deltas`] against the same network state.
pub fn apply_deltas(
    net: &mut Network,
    comtree: &mut Comtree,
    deltas: &[(LinkId, RateSpec)],
) -> Result<(), Error> {
    for (lnk, delta) in deltas {
        let child = comtree
            .comt_lnk_child(*lnk)
            .ok_or(ComtreeError::NotAComtLink { comt: comtree.comt(), lnk: *lnk })?;
        let oriented = net.orient_from(*lnk, child, *delta)?;
        let new_avail = net.avail_rates(*lnk)?.minus(&oriented);
        net.set_available_rate(*lnk, new_avail)?;
        comtree.add_to_comt_lnk_rates(*lnk, delta)?;
    }
    debug!("Applied {} rate deltas to comtree {:?}", deltas.len(), comtree.comt());
    Ok(())
}
