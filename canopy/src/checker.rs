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

//! # Tree-Consistency Checker
//!
//! Validates the structural and bandwidth invariants of comtrees: a single root, no
//! cycles, an ancestor-closed core set, zip-code contiguity, leaves attached to member
//! routers, and reservations that fit the underlying links. The check is read-only; it is
//! the mechanism by which higher layers get a "network is in a legal state" signal before
//! trusting auto-computed rates.

use crate::comtree::Comtree;
use crate::directory::ComtreeDirectory;
use crate::network::Network;
use crate::types::{ComtreeError, NodeId};
use log::*;
use std::collections::{HashMap, HashSet, VecDeque};

/// Check a single comtree against all of its invariants and collect every finding. An
/// empty result means the comtree is consistent.
///
/// The traversal is one breadth-first search from the comtree's root, following only the
/// recorded comtree edges (as opposed to all physical links at a node). A cycle aborts
/// the traversal immediately, since the downstream counts would be meaningless; all other
/// findings are collected while the traversal keeps going.
pub fn check_comtree(net: &Network, comtree: &Comtree) -> Vec<ComtreeError> {
    let comt = comtree.comt();
    let mut findings = Vec::new();

    let root = match comtree.root() {
        Some(r) if comtree.is_comt_rtr(r) => r,
        _ => return vec![ComtreeError::NoRoot(comt)],
    };

    // adjacency over recorded comtree edges, directed parent to child; access links to
    // leaves are validated separately below
    let mut adj: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for (_, e) in comtree.comt_links() {
        if comtree.is_comt_rtr(e.child) && comtree.is_comt_rtr(e.parent) {
            adj.entry(e.parent).or_default().push(e.child);
        }
    }

    let mut visited: HashSet<NodeId> = HashSet::new();
    visited.insert(root);
    let mut zip_seen: HashSet<u16> = HashSet::new();
    if let Ok(zip) = net.zip(root) {
        zip_seen.insert(zip);
    }
    let mut queue: VecDeque<NodeId> = VecDeque::new();
    queue.push_back(root);

    while let Some(u) = queue.pop_front() {
        for &v in adj.get(&u).into_iter().flatten() {
            if !visited.insert(v) {
                findings.push(ComtreeError::CycleDetected { comt, node: v });
                return findings;
            }
            if comtree.is_core(v) && !comtree.is_core(u) {
                findings.push(ComtreeError::CoreNotClosed { comt, node: v });
            }
            match (net.zip(u), net.zip(v)) {
                (Ok(zu), Ok(zv)) if zu != zv => {
                    if !zip_seen.insert(zv) {
                        findings.push(ComtreeError::ZipNotContiguous { comt, zip: zv, node: v });
                    }
                }
                _ => {}
            }
            queue.push_back(v);
        }
    }

    let rootless = comtree.rtrs().filter(|r| comtree.plnk(*r).is_none()).count();
    if rootless != 1 {
        findings.push(ComtreeError::RootCount { comt, count: rootless });
    }

    for (_, leaf) in comtree.comt_leaves() {
        let parent_ok = net
            .node_for_adr(leaf.parent_adr)
            .map(|p| comtree.is_comt_rtr(p))
            .unwrap_or(false);
        if !parent_ok {
            findings.push(ComtreeError::LeafParentMissing { comt, parent: leaf.parent_adr });
        }
    }

    if visited.len() != comtree.num_rtrs() {
        findings.push(ComtreeError::UnreachableRouters {
            comt,
            visited: visited.len(),
            members: comtree.num_rtrs(),
        });
    }

    // bandwidth invariant: every committed reservation must fit the underlying link
    for (lnk, e) in comtree.comt_links() {
        let fits = net
            .orient_from(lnk, e.child, e.rates)
            .and_then(|oriented| net.link_rates(lnk).map(|cap| oriented.leq(&cap)));
        if !fits.unwrap_or(false) {
            findings.push(ComtreeError::InsufficientCapacity { comt, lnk });
        }
    }

    findings
}

/// Check every comtree registered in the directory. Findings are logged per comtree and
/// the batch keeps going after a failed comtree; the return value tells whether all
/// comtrees passed.
pub fn check_all(net: &Network, dir: &ComtreeDirectory) -> bool {
    let mut ok = true;
    for cx in dir.indices() {
        let handle = match dir.comtree(cx) {
            Some(h) => h,
            None => continue,
        };
        let comtree = handle.lock();
        let findings = check_comtree(net, &comtree);
        for finding in findings.iter() {
            error!("Comtree check failed: {}", finding);
        }
        ok &= findings.is_empty();
    }
    ok
}
