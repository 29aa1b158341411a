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

//! Test the bandwidth auto-configuration: bottom-up aggregation and top-down assignment.

use crate::autoconf::{adjust_subtree_rates, required_plnk_rates, set_auto_config_rates};
use crate::comtree::Comtree;
use crate::network::Network;
use crate::rates::RateSpec;
use crate::types::{ComtId, ComtreeError, Fadr, LinkId, NodeId};
use lazy_static::lazy_static;

lazy_static! {
    static ref R1: NodeId = 0.into();
    static ref R2: NodeId = 1.into();
    static ref R3: NodeId = 2.into();
}

/// Chain topology `r1 -- r2 -- r3`, returning the network and the two link ids.
fn get_chain_net() -> (Network, LinkId, LinkId) {
    let mut net = Network::new();
    assert_eq!(*R1, net.add_router("r1", Fadr::new(1, 0), (0.0, 0.0)).unwrap());
    assert_eq!(*R2, net.add_router("r2", Fadr::new(2, 0), (0.0, 1.0)).unwrap());
    assert_eq!(*R3, net.add_router("r3", Fadr::new(3, 0), (0.0, 2.0)).unwrap());
    let l12 = net.add_link(*R1, *R2, 1, 1).unwrap();
    let l23 = net.add_link(*R2, *R3, 2, 1).unwrap();
    net.set_link_rates(l12, RateSpec::new(1000, 1000, 500, 500)).unwrap();
    net.set_link_rates(l23, RateSpec::new(1000, 1000, 500, 500)).unwrap();
    (net, l12, l23)
}

/// Comtree `r1 (root) <- r2 <- r3` over the chain, in automatic mode.
fn get_chain_comtree(net: &Network, l12: LinkId, l23: LinkId) -> Comtree {
    let mut ct = Comtree::new(ComtId(1001));
    ct.set_auto_config(true);
    ct.add_rtr(*R1);
    ct.add_rtr(*R2);
    ct.add_rtr(*R3);
    ct.set_root(*R1).unwrap();
    ct.add_core(*R1).unwrap();
    ct.add_comt_link(net, l12, *R2).unwrap();
    ct.add_comt_link(net, l23, *R3).unwrap();
    ct
}

#[test]
fn test_aggregation() {
    let (net, l12, l23) = get_chain_net();
    let mut ct = get_chain_comtree(&net, l12, l23);

    // demand joining under r3 is propagated through r2 up to the root
    adjust_subtree_rates(&mut ct, *R3, &RateSpec::new(10, 2, 1, 1)).unwrap();
    assert_eq!(ct.subtree_rates(*R3), Some(RateSpec::new(10, 2, 1, 1)));
    assert_eq!(ct.subtree_rates(*R2), Some(RateSpec::new(10, 2, 1, 1)));
    assert_eq!(ct.subtree_rates(*R1), Some(RateSpec::new(10, 2, 1, 1)));

    // demand joining under r2 does not touch r3
    adjust_subtree_rates(&mut ct, *R2, &RateSpec::new(5, 1, 1, 1)).unwrap();
    assert_eq!(ct.subtree_rates(*R3), Some(RateSpec::new(10, 2, 1, 1)));
    assert_eq!(ct.subtree_rates(*R2), Some(RateSpec::new(15, 3, 2, 2)));
    assert_eq!(ct.subtree_rates(*R1), Some(RateSpec::new(15, 3, 2, 2)));

    // a leaving member folds in as a negative delta
    adjust_subtree_rates(&mut ct, *R3, &RateSpec::new(10, 2, 1, 1).negated()).unwrap();
    assert_eq!(ct.subtree_rates(*R3), Some(RateSpec::zero()));
    assert_eq!(ct.subtree_rates(*R1), Some(RateSpec::new(5, 1, 1, 1)));

    adjust_subtree_rates(&mut ct, 9.into(), &RateSpec::zero()).unwrap_err();
}

#[test]
fn test_aggregation_cycle_guard() {
    let (net, l12, l23) = get_chain_net();
    let mut ct = get_chain_comtree(&net, l12, l23);

    // close the loop: r1 becomes a child of r3
    let l31 = {
        let mut net = net.clone();
        let l = net.add_link(*R3, *R1, 9, 9).unwrap();
        ct.add_comt_link(&net, l, *R1).unwrap();
        l
    };
    assert!(ct.is_comt_link(l31));

    let before = ct.subtree_rates(*R2);
    assert!(matches!(
        adjust_subtree_rates(&mut ct, *R2, &RateSpec::new(1, 1, 1, 1)),
        Err(ComtreeError::ProbableCycle { .. })
    ));
    // the rejected operation left the aggregates untouched
    assert_eq!(ct.subtree_rates(*R2), before);
}

#[test]
fn test_required_rates_formula() {
    let (net, l12, l23) = get_chain_net();
    let mut ct = get_chain_comtree(&net, l12, l23);

    // r3 subtree (10,2,1,1); extra (5,1,1,1) under r2; extra (6,50,2,30) at the root
    adjust_subtree_rates(&mut ct, *R3, &RateSpec::new(10, 2, 1, 1)).unwrap();
    adjust_subtree_rates(&mut ct, *R2, &RateSpec::new(5, 1, 1, 1)).unwrap();
    adjust_subtree_rates(&mut ct, *R1, &RateSpec::new(6, 50, 2, 30)).unwrap();
    // aggregates: r3 (10,2,1,1), r2 (15,3,2,2), r1 (21,53,4,32)

    // non-core r2: headroom = (6,50,2,30); down takes min(demand.down, headroom.up)
    assert_eq!(required_plnk_rates(&ct, *R2), Some(RateSpec::new(15, 3, 2, 2)));
    // non-core r3: headroom = (11,51,3,31); demand.down = 2 stays the smaller one
    assert_eq!(required_plnk_rates(&ct, *R3), Some(RateSpec::new(10, 2, 1, 1)));
    // the root has no parent link
    assert_eq!(required_plnk_rates(&ct, *R1), None);

    // a core r2 reserves the full headroom downstream instead
    ct.add_core(*R2).unwrap();
    assert_eq!(required_plnk_rates(&ct, *R2), Some(RateSpec::new(15, 6, 2, 2)));
}

#[test]
fn test_set_auto_config_rates() {
    let (net, l12, l23) = get_chain_net();
    let mut ct = get_chain_comtree(&net, l12, l23);
    adjust_subtree_rates(&mut ct, *R3, &RateSpec::new(10, 2, 1, 1)).unwrap();
    adjust_subtree_rates(&mut ct, *R1, &RateSpec::new(6, 50, 2, 30)).unwrap();

    set_auto_config_rates(&mut ct).unwrap();
    assert_eq!(ct.plnk_rates(*R2), Some(RateSpec::new(10, 2, 1, 1)));
    assert_eq!(ct.plnk_rates(*R3), Some(RateSpec::new(10, 2, 1, 1)));

    // a frozen router keeps its pinned rates, its subtree is still descended into
    ct.freeze(*R2).unwrap();
    ct.set_comt_lnk_rates(l12, RateSpec::new(777, 777, 77, 77)).unwrap();
    adjust_subtree_rates(&mut ct, *R3, &RateSpec::new(2, 0, 1, 0)).unwrap();
    set_auto_config_rates(&mut ct).unwrap();
    assert_eq!(ct.plnk_rates(*R2), Some(RateSpec::new(777, 777, 77, 77)));
    assert_eq!(ct.plnk_rates(*R3), Some(RateSpec::new(12, 2, 2, 1)));
}

#[test]
fn test_manual_mode_is_left_alone() {
    let (net, l12, l23) = get_chain_net();
    let mut ct = get_chain_comtree(&net, l12, l23);
    ct.set_auto_config(false);
    ct.set_comt_lnk_rates(l12, RateSpec::new(123, 123, 12, 12)).unwrap();
    adjust_subtree_rates(&mut ct, *R2, &RateSpec::new(5, 5, 5, 5)).unwrap();

    set_auto_config_rates(&mut ct).unwrap();
    assert_eq!(ct.plnk_rates(*R2), Some(RateSpec::new(123, 123, 12, 12)));
}
