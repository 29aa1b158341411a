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

//! Test the capacity-constrained path search.

use crate::checker::check_comtree;
use crate::comtree::Comtree;
use crate::error::Error;
use crate::network::Network;
use crate::pathfind::{add_path, find_path, remove_path, PathStep};
use crate::rates::RateSpec;
use crate::types::{ComtId, ComtreeError, Fadr, LinkId, NodeId, NodeType};
use lazy_static::lazy_static;
use maplit::hashset;
use std::collections::HashSet;

lazy_static! {
    static ref R1: NodeId = 0.into();
    static ref R2: NodeId = 1.into();
    static ref R3: NodeId = 2.into();
    static ref R4: NodeId = 3.into();
    static ref L12: LinkId = LinkId::new(0);
    static ref L13: LinkId = LinkId::new(1);
    static ref L23: LinkId = LinkId::new(2);
    static ref L24: LinkId = LinkId::new(3);
    static ref L34: LinkId = LinkId::new(4);
}

/// # Test network
///
/// ```text
/// r1 --10-- r2
/// |      .-'|
/// 1   1-'   5
/// | -'      |
/// r3 --2--- r4
/// ```
///
/// All links carry `(1000,1000,500,500)`.
fn get_test_net() -> Network {
    let mut net = Network::new();
    assert_eq!(*R1, net.add_router("r1", Fadr::new(1, 0), (0.0, 0.0)).unwrap());
    assert_eq!(*R2, net.add_router("r2", Fadr::new(2, 0), (0.0, 1.0)).unwrap());
    assert_eq!(*R3, net.add_router("r3", Fadr::new(3, 0), (1.0, 0.0)).unwrap());
    assert_eq!(*R4, net.add_router("r4", Fadr::new(4, 0), (1.0, 1.0)).unwrap());
    let links = vec![
        (*L12, *R1, *R2, 1, 1, 10),
        (*L13, *R1, *R3, 2, 1, 1),
        (*L23, *R2, *R3, 2, 2, 1),
        (*L24, *R2, *R4, 3, 1, 5),
        (*L34, *R3, *R4, 3, 2, 2),
    ];
    for (lnk, u, v, lu, lv, len) in links {
        assert_eq!(lnk, net.add_link(u, v, lu, lv).unwrap());
        net.set_link_length(lnk, len).unwrap();
        net.set_link_rates(lnk, RateSpec::new(1000, 1000, 500, 500)).unwrap();
    }
    net
}

/// Comtree 1001 with r1 as its only member, rooted there.
fn get_test_comtree() -> Comtree {
    let mut ct = Comtree::new(ComtId(1001));
    ct.set_default_rates(RateSpec::new(100, 100, 50, 50), RateSpec::new(10, 10, 5, 5));
    ct.add_rtr(*R1);
    ct.set_root(*R1).unwrap();
    ct.add_core(*R1).unwrap();
    ct
}

#[test]
fn test_shortest_admissible_path() {
    let net = get_test_net();
    let ct = get_test_comtree();
    let required = RateSpec::new(100, 100, 50, 50);

    // r4 joins over r3: 2 + 1 beats both 5 + 10 and 2 + 1 + 10
    let path = find_path(&net, &ct, *R4, required).unwrap();
    assert_eq!(
        path,
        vec![
            PathStep { lnk: *L13, child: *R3, rates: required },
            PathStep { lnk: *L34, child: *R4, rates: required },
        ]
    );
}

#[test]
fn test_source_already_member() {
    let net = get_test_net();
    let ct = get_test_comtree();
    assert_eq!(find_path(&net, &ct, *R1, RateSpec::new(100, 100, 50, 50)), Ok(vec![]));
}

#[test]
fn test_capacity_steers_the_search() {
    let mut net = get_test_net();
    let ct = get_test_comtree();
    let required = RateSpec::new(100, 100, 50, 50);

    // starve the r1--r3 link: the cheap attachment is no longer admissible
    net.set_available_rate(*L13, RateSpec::new(50, 50, 25, 25)).unwrap();
    let path = find_path(&net, &ct, *R4, required).unwrap();

    // the path must end at the comtree and contain only admissible edges
    let first = &path[0];
    let attach = net.link(first.lnk).unwrap().peer(first.child).unwrap();
    assert!(ct.is_comt_rtr(attach));
    assert_eq!(path.last().unwrap().child, *R4);
    for step in path.iter() {
        assert!(step.rates.leq(&net.avail_from(step.lnk, step.child).unwrap()));
        assert_ne!(step.lnk, *L13);
    }
}

#[test]
fn test_no_admissible_path() {
    let net = get_test_net();
    let ct = get_test_comtree();
    let required = RateSpec::new(2000, 100, 50, 50);
    assert_eq!(
        find_path(&net, &ct, *R4, required),
        Err(Error::Comtree(ComtreeError::NoPath { comt: ComtId(1001), node: *R4 }))
    );
}

#[test]
fn test_source_must_be_router() {
    let mut net = get_test_net();
    let ct = get_test_comtree();
    let c1 = net.add_leaf("c1", NodeType::Client, Fadr::new(1, 1), (0.0, 0.0)).unwrap();
    net.add_link(*R1, c1, 9, 0).unwrap();
    find_path(&net, &ct, c1, RateSpec::zero()).unwrap_err();
}

#[test]
fn test_add_and_remove_path() {
    let net = get_test_net();
    let mut ct = get_test_comtree();
    let required = RateSpec::new(100, 100, 50, 50);

    let path = find_path(&net, &ct, *R4, required).unwrap();
    add_path(&mut ct, &net, &path).unwrap();

    let members: HashSet<NodeId> = ct.rtrs().collect();
    assert_eq!(members, hashset! {*R1, *R3, *R4});
    assert_eq!(ct.parent_of(*R4), Some(*R3));
    assert_eq!(ct.parent_of(*R3), Some(*R1));
    assert_eq!(ct.plnk_rates(*R4), Some(required));
    assert_eq!(check_comtree(&net, &ct), vec![]);

    remove_path(&mut ct, &path).unwrap();
    let members: HashSet<NodeId> = ct.rtrs().collect();
    assert_eq!(members, hashset! {*R1});
    assert!(!ct.is_comt_link(*L13));
    assert_eq!(check_comtree(&net, &ct), vec![]);
}

#[test]
fn test_remove_path_stops_at_busy_router() {
    let net = get_test_net();
    let mut ct = get_test_comtree();
    let required = RateSpec::new(100, 100, 50, 50);

    let path = find_path(&net, &ct, *R4, required).unwrap();
    add_path(&mut ct, &net, &path).unwrap();
    // a second branch grows off r3
    ct.add_rtr(*R2);
    let (lnk, _) = net.incident(*R2).find(|(_, peer)| *peer == *R3).unwrap();
    ct.add_comt_link(&net, lnk, *R2).unwrap();

    // pruning the r4 branch removes r4 but refuses to tear out the busy r3
    remove_path(&mut ct, &path).unwrap_err();
    assert!(!ct.is_comt_rtr(*R4));
    assert!(ct.is_comt_rtr(*R3));
    assert!(ct.is_comt_rtr(*R2));
}
