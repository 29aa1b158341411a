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

//! # Bandwidth Auto-Configuration
//!
//! Two cooperating procedures, invoked whenever a comtree in automatic configuration mode
//! changes its membership or demand. The bottom-up half folds a new member's demand into
//! the subtree aggregate of every router on the path to the root; the top-down half
//! derives every unfrozen router's parent-link rates from its aggregate and the demand
//! flowing around it.
//!
//! Both walks carry a visited set; a revisited router means the parent pointers loop, and
//! the operation fails with a probable-cycle error before any state is modified.

use crate::comtree::Comtree;
use crate::rates::RateSpec;
use crate::types::{ComtreeError, LinkId, NodeId};
use log::*;
use std::collections::HashSet;

/// Fold a demand change into the subtree aggregates along the path from `rtr` up to the
/// root. The change is applied to `rtr` itself and to every router above it; a negative
/// delta (a leaving member) works the same way. If the parent chain revisits a router,
/// nothing is modified and a probable-cycle error is returned.
pub fn adjust_subtree_rates(
    comtree: &mut Comtree,
    rtr: NodeId,
    delta: &RateSpec,
) -> Result<(), ComtreeError> {
    let comt = comtree.comt();
    if !comtree.is_comt_rtr(rtr) {
        return Err(ComtreeError::NotAMember { comt, node: rtr });
    }
    // walk first, apply after, so a cycle leaves the aggregates untouched
    let mut chain: Vec<NodeId> = Vec::new();
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut cur = rtr;
    loop {
        if !visited.insert(cur) {
            return Err(ComtreeError::ProbableCycle { comt, node: cur });
        }
        chain.push(cur);
        match comtree.parent_of(cur) {
            Some(p) => cur = p,
            None => break,
        }
    }
    for node in chain {
        comtree.add_to_subtree_rates(node, delta);
    }
    Ok(())
}

/// The parent-link rates auto-configuration would assign to a member router, derived from
/// its subtree aggregate and the root's total demand. Core routers sit on the tree's
/// distribution backbone and reserve the full headroom in the downstream direction;
/// non-core routers only need the smaller of their own downstream demand and that
/// headroom. Returns `None` for the root, for non-members, and while no root is set.
pub fn required_plnk_rates(comtree: &Comtree, rtr: NodeId) -> Option<RateSpec> {
    comtree.plnk(rtr)?;
    let root_rates = comtree.subtree_rates(comtree.root()?)?;
    let demand = comtree.subtree_rates(rtr)?;
    let headroom = root_rates.minus(&demand);
    Some(if comtree.is_core(rtr) {
        RateSpec::new(
            demand.bit_rate_up,
            headroom.bit_rate_up,
            demand.pkt_rate_up,
            headroom.pkt_rate_up,
        )
    } else {
        RateSpec::new(
            demand.bit_rate_up,
            demand.bit_rate_down.min(headroom.bit_rate_up),
            demand.pkt_rate_up,
            demand.pkt_rate_down.min(headroom.pkt_rate_up),
        )
    })
}

/// Recompute the parent-link rates of every unfrozen member router from the current
/// subtree aggregates. Does nothing on a comtree in manual configuration mode. Frozen
/// routers keep their pinned rates but their subtrees are still descended into.
pub fn set_auto_config_rates(comtree: &mut Comtree) -> Result<(), ComtreeError> {
    let comt = comtree.comt();
    if !comtree.auto_config() {
        debug!("Comtree {:?} is in manual mode, leaving rates alone", comt);
        return Ok(());
    }
    let root = match comtree.root() {
        Some(r) if comtree.is_comt_rtr(r) => r,
        _ => return Err(ComtreeError::NoRoot(comt)),
    };
    let children = comtree.children_by_rtr();
    let mut visited: HashSet<NodeId> = HashSet::new();
    visited.insert(root);
    let mut stack: Vec<NodeId> = vec![root];
    let mut assignments: Vec<(LinkId, RateSpec)> = Vec::new();
    while let Some(u) = stack.pop() {
        for &(lnk, v) in children.get(&u).into_iter().flatten() {
            if !comtree.is_comt_rtr(v) {
                continue;
            }
            if !visited.insert(v) {
                return Err(ComtreeError::ProbableCycle { comt, node: v });
            }
            if !comtree.is_frozen(v) {
                if let Some(rates) = required_plnk_rates(comtree, v) {
                    assignments.push((lnk, rates));
                }
            }
            stack.push(v);
        }
    }
    for (lnk, rates) in assignments {
        comtree.set_comt_lnk_rates(lnk, rates)?;
    }
    Ok(())
}
