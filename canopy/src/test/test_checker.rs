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

//! Test the tree-consistency checker.

use crate::checker::{check_all, check_comtree};
use crate::comtree::Comtree;
use crate::directory::ComtreeDirectory;
use crate::network::Network;
use crate::rates::RateSpec;
use crate::types::{ComtId, ComtreeError, Fadr, NodeId, NodeType};

/// Build a network of routers with the given zips and links; router `i` is named `r<i>`
/// and link locals are allocated in call order.
fn net_with_zips(zips: &[u16], links: &[(usize, usize)]) -> (Network, Vec<NodeId>) {
    let mut net = Network::new();
    let mut ids = Vec::new();
    for (i, zip) in zips.iter().enumerate() {
        let name = format!("r{}", i + 1);
        ids.push(net.add_router(name, Fadr::new(*zip, i as u16), (0.0, i as f64)).unwrap());
    }
    for (n, (u, v)) in links.iter().enumerate() {
        let lnk = net.add_link(ids[*u], ids[*v], (n + 1) as u32, (n + 10) as u32).unwrap();
        net.set_link_rates(lnk, RateSpec::new(1000, 1000, 500, 500)).unwrap();
    }
    (net, ids)
}

/// Overlay a comtree on every listed router, rooted at the first, with the given
/// (child, parent) comtree edges.
fn comtree_over(net: &Network, ids: &[NodeId], edges: &[(NodeId, NodeId)]) -> Comtree {
    let mut ct = Comtree::new(ComtId(1001));
    for id in ids {
        ct.add_rtr(*id);
    }
    ct.set_root(ids[0]).unwrap();
    ct.add_core(ids[0]).unwrap();
    for (child, parent) in edges {
        let (lnk, _) = net
            .incident(*child)
            .find(|(_, peer)| peer == parent)
            .expect("edge must exist in the topology");
        ct.add_comt_link(net, lnk, *child).unwrap();
    }
    ct
}

#[test]
fn test_consistent_tree() {
    let (net, ids) = net_with_zips(&[1, 2, 3, 4], &[(0, 1), (1, 2), (1, 3)]);
    let ct = comtree_over(&net, &ids, &[(ids[1], ids[0]), (ids[2], ids[1]), (ids[3], ids[1])]);
    assert_eq!(check_comtree(&net, &ct), vec![]);
}

#[test]
fn test_no_root() {
    let (net, ids) = net_with_zips(&[1, 2], &[(0, 1)]);
    let mut ct = Comtree::new(ComtId(1001));
    ct.add_rtr(ids[0]);
    assert_eq!(check_comtree(&net, &ct), vec![ComtreeError::NoRoot(ComtId(1001))]);
}

#[test]
fn test_cycle_detection() {
    // r1-r2, r2-r3 and r3-r1 all marked as comtree links
    let (net, ids) = net_with_zips(&[1, 2, 3], &[(0, 1), (1, 2), (2, 0)]);
    let ct = comtree_over(
        &net,
        &ids,
        &[(ids[1], ids[0]), (ids[2], ids[1]), (ids[0], ids[2])],
    );
    let findings = check_comtree(&net, &ct);
    assert!(findings.iter().any(|f| matches!(f, ComtreeError::CycleDetected { .. })));
}

#[test]
fn test_root_count() {
    // r3 is a recorded member but hangs nowhere: two parent-less routers
    let (net, ids) = net_with_zips(&[1, 2, 3], &[(0, 1), (1, 2)]);
    let ct = comtree_over(&net, &ids, &[(ids[1], ids[0])]);
    let findings = check_comtree(&net, &ct);
    assert!(findings.contains(&ComtreeError::RootCount { comt: ComtId(1001), count: 2 }));
    assert!(findings.contains(&ComtreeError::UnreachableRouters {
        comt: ComtId(1001),
        visited: 2,
        members: 3,
    }));
}

#[test]
fn test_core_ancestor_closure() {
    // root r1 (core), child r2 (non-core), grandchild r3 (core): violation at r3
    let (net, ids) = net_with_zips(&[1, 2, 3], &[(0, 1), (1, 2)]);
    let mut ct = comtree_over(&net, &ids, &[(ids[1], ids[0]), (ids[2], ids[1])]);
    ct.add_core(ids[2]).unwrap();
    let findings = check_comtree(&net, &ct);
    assert_eq!(
        findings,
        vec![ComtreeError::CoreNotClosed { comt: ComtId(1001), node: ids[2] }]
    );

    // making r2 core as well closes the set again
    ct.add_core(ids[1]).unwrap();
    assert_eq!(check_comtree(&net, &ct), vec![]);
}

#[test]
fn test_zip_contiguity_chain_passes() {
    // 1 - 2 - 2: zip 2 is entered once and stays contiguous
    let (net, ids) = net_with_zips(&[1, 2, 2], &[(0, 1), (1, 2)]);
    let ct = comtree_over(&net, &ids, &[(ids[1], ids[0]), (ids[2], ids[1])]);
    assert_eq!(check_comtree(&net, &ct), vec![]);
}

#[test]
fn test_zip_contiguity_disjoint_subtrees() {
    // r2 and r3 both carry zip 2 but hang below r1 on separate branches
    let (net, ids) = net_with_zips(&[1, 2, 2], &[(0, 1), (0, 2)]);
    let ct = comtree_over(&net, &ids, &[(ids[1], ids[0]), (ids[2], ids[0])]);
    let findings = check_comtree(&net, &ct);
    assert!(findings
        .iter()
        .any(|f| matches!(f, ComtreeError::ZipNotContiguous { zip: 2, .. })));
}

#[test]
fn test_zip_contiguity_reentry_on_one_branch() {
    // 1 - 2 - 1: the root's zip is re-entered below r2, splitting zip 1 in two
    let (net, ids) = net_with_zips(&[1, 2, 1], &[(0, 1), (1, 2)]);
    let ct = comtree_over(&net, &ids, &[(ids[1], ids[0]), (ids[2], ids[1])]);
    let findings = check_comtree(&net, &ct);
    assert!(findings
        .iter()
        .any(|f| matches!(f, ComtreeError::ZipNotContiguous { zip: 1, .. })));
}

#[test]
fn test_leaf_parent_check() {
    let (mut net, ids) = net_with_zips(&[1, 2], &[(0, 1)]);
    let c1 = net.add_leaf("c1", NodeType::Client, Fadr::new(2, 7), (0.0, 0.0)).unwrap();
    let access = net.add_link(ids[1], c1, 9, 0).unwrap();
    net.set_link_rates(access, RateSpec::new(1000, 1000, 500, 500)).unwrap();

    let mut ct = comtree_over(&net, &ids, &[(ids[1], ids[0])]);
    ct.add_comt_leaf(&net, c1, access).unwrap();
    assert_eq!(check_comtree(&net, &ct), vec![]);

    // drop the parent router from the comtree behind the leaf's back
    ct.remove_comt_link(ct.plnk(ids[1]).unwrap()).unwrap();
    ct.dec_lnk_cnt(ids[1]).unwrap();
    ct.remove_rtr(ids[1]).unwrap();
    let findings = check_comtree(&net, &ct);
    assert!(findings.contains(&ComtreeError::LeafParentMissing {
        comt: ComtId(1001),
        parent: Fadr::new(2, 1),
    }));
}

#[test]
fn test_reservation_exceeding_capacity() {
    let (net, ids) = net_with_zips(&[1, 2], &[(0, 1)]);
    let mut ct = comtree_over(&net, &ids, &[(ids[1], ids[0])]);
    let lnk = ct.plnk(ids[1]).unwrap();
    ct.set_comt_lnk_rates(lnk, RateSpec::new(2000, 100, 50, 50)).unwrap();
    let findings = check_comtree(&net, &ct);
    assert!(findings.contains(&ComtreeError::InsufficientCapacity { comt: ComtId(1001), lnk }));
}

#[test]
fn test_check_all() {
    let (net, ids) = net_with_zips(&[1, 2, 3], &[(0, 1), (1, 2), (2, 0)]);
    let dir = ComtreeDirectory::new();

    let good = dir.comtree(dir.add_comtree(ComtId(1)).unwrap()).unwrap();
    *good.lock() = comtree_over(&net, &ids[..2], &[(ids[1], ids[0])]);
    assert!(check_all(&net, &dir));

    let bad = dir.comtree(dir.add_comtree(ComtId(2)).unwrap()).unwrap();
    *bad.lock() = comtree_over(
        &net,
        &ids,
        &[(ids[1], ids[0]), (ids[2], ids[1]), (ids[0], ids[2])],
    );
    assert!(!check_all(&net, &dir));
}
