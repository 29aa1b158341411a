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

//! # Helper (printer) functions for the network and comtree state
//!
//! Module containing helper functions to get formatted strings about nodes, links and
//! comtrees, in the parenthesized, comma-separated block format the external loader and
//! console tools speak:
//!
//! - node: `(name,type,zip.local)`
//! - link: `(leftName.leftLnk,rightName.rightLnk,length,(configured),(available))`
//! - comtree: `(number,rootName,mode,(backboneRates),(accessRates),core=(...),links=(...))`
//!
//! Leaf endpoints print without a local link number, rate tuples print as
//! `(bitUp,bitDown,pktUp,pktDown)`. Core names and link blocks are emitted in sorted
//! order, so the output for a given state is stable.

use crate::comtree::Comtree;
use crate::network::Network;
use crate::types::{LinkId, NetNode, NetworkError, NodeId};

/// Return the formatted block for a node, with its name, kind and forest address.
pub fn node(net: &Network, id: NodeId) -> Result<String, NetworkError> {
    match net.node(id) {
        NetNode::Router(r) => Ok(format!("({},router,{})", r.name(), r.fadr())),
        NetNode::Leaf(l) => Ok(format!("({},{},{})", l.name(), l.ntype(), l.fadr())),
        NetNode::None => Err(NetworkError::NodeNotFound(id)),
    }
}

/// Return the formatted block for a link: both endpoints with their local link numbers,
/// the length, the configured rates and the available rates.
pub fn link(net: &Network, lnk: LinkId) -> Result<String, NetworkError> {
    let l = net.link(lnk)?;
    Ok(format!(
        "({},{},{},{},{})",
        endpoint(net, lnk, l.left())?,
        endpoint(net, lnk, l.right())?,
        l.length(),
        l.rates(),
        l.avail()
    ))
}

/// Return the formatted status block for a comtree: number, root, configuration mode,
/// default rates, the core set and every comtree edge with its committed reservation.
pub fn comtree_status(net: &Network, comtree: &Comtree) -> Result<String, NetworkError> {
    let root_name = match comtree.root() {
        Some(r) => net.node_name(r)?,
        None => "-",
    };
    let mode = if comtree.auto_config() { "auto" } else { "manual" };
    let mut cores = comtree
        .cores()
        .map(|c| net.node_name(c).map(|n| n.to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    cores.sort_unstable();
    let mut lnks = comtree
        .comt_links()
        .map(|(lnk, e)| {
            Ok(format!(
                "({},{},{})",
                endpoint(net, lnk, e.child)?,
                endpoint(net, lnk, e.parent)?,
                e.rates
            ))
        })
        .collect::<Result<Vec<_>, NetworkError>>()?;
    lnks.sort_unstable();
    Ok(format!(
        "({},{},{},{},{},core=({}),links=({}))",
        comtree.comt().0,
        root_name,
        mode,
        comtree.bb_rates(),
        comtree.leaf_rates(),
        cores.join(","),
        lnks.join(",")
    ))
}

/// Print the status block of a comtree.
pub fn print_comtree_status(net: &Network, comtree: &Comtree) -> Result<(), NetworkError> {
    println!("{}", comtree_status(net, comtree)?);
    Ok(())
}

/// Format one link endpoint as `name.localLnk` for routers and as the bare name for
/// leaves.
fn endpoint(net: &Network, lnk: LinkId, node: NodeId) -> Result<String, NetworkError> {
    let name = net.node_name(node)?;
    if net.is_router(node) {
        Ok(format!("{}.{}", name, net.local_link(node, lnk)?))
    } else {
        Ok(name.to_string())
    }
}
