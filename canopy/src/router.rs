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

//! Module defining an internal forwarding router.

use crate::rates::RateSpec;
use crate::types::{Fadr, LinkId, NodeId};
use std::collections::HashMap;
use std::net::Ipv4Addr;

/// One network interface of a router. Every local link number in the interface's assigned
/// range `[first_lnk, last_lnk]` shares the interface's capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct Interface {
    /// IP address the interface listens on
    pub ip: Ipv4Addr,
    /// Capacity of the interface
    pub rates: RateSpec,
    /// First local link number assigned to this interface
    pub first_lnk: u32,
    /// Last local link number assigned to this interface
    pub last_lnk: u32,
}

impl Interface {
    /// Returns true if and only if the local link number falls into this interface's
    /// assigned range.
    pub fn covers(&self, lnk: u32) -> bool {
        self.first_lnk <= lnk && lnk <= self.last_lnk
    }
}

/// A forwarding router in the overlay network. Routers carry an ordered interface list and
/// an assignable leaf address range whose zip code must equal the router's own.
#[derive(Debug, Clone)]
pub struct Router {
    /// Name of the router
    name: String,
    /// ID of the router
    node_id: NodeId,
    /// Forest address of the router
    fadr: Fadr,
    /// Geographic location (latitude, longitude)
    location: (f64, f64),
    /// Assignable leaf address range [first, last]
    leaf_range: (Fadr, Fadr),
    /// Ordered list of interfaces
    interfaces: Vec<Interface>,
    /// Map from local link number to the global link id
    links: HashMap<u32, LinkId>,
}

impl Router {
    pub(crate) fn new(name: String, node_id: NodeId, fadr: Fadr, location: (f64, f64)) -> Self {
        Self {
            name,
            node_id,
            fadr,
            location,
            leaf_range: (fadr, fadr),
            interfaces: Vec::new(),
            links: HashMap::new(),
        }
    }

    /// Return the name of the router
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    /// Return the id of the router
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Return the forest address of the router
    pub fn fadr(&self) -> Fadr {
        self.fadr
    }

    /// Return the geographic location (latitude, longitude) of the router
    pub fn location(&self) -> (f64, f64) {
        self.location
    }

    /// Return the assignable leaf address range `[first, last]`
    pub fn leaf_range(&self) -> (Fadr, Fadr) {
        self.leaf_range
    }

    /// Set the assignable leaf address range. The range is validated against the router's
    /// zip code by [`Network::validate`](crate::network::Network::validate), not here.
    pub fn set_leaf_range(&mut self, first: Fadr, last: Fadr) {
        self.leaf_range = (first, last);
    }

    /// Returns true if and only if the address falls into the assignable leaf range.
    pub fn in_leaf_range(&self, fadr: Fadr) -> bool {
        self.leaf_range.0 <= fadr && fadr <= self.leaf_range.1
    }

    /// Append an interface to the router's interface list.
    pub fn add_interface(&mut self, iface: Interface) {
        self.interfaces.push(iface);
    }

    /// Return the ordered interface list
    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }

    /// Return the interface whose assigned range covers the given local link number.
    pub fn iface_for(&self, lnk: u32) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.covers(lnk))
    }

    /// Record a link under the given local link number. Returns false (and leaves the
    /// table untouched) if the number is already taken.
    pub(crate) fn register_link(&mut self, local: u32, lnk: LinkId) -> bool {
        if self.links.contains_key(&local) {
            return false;
        }
        self.links.insert(local, lnk);
        true
    }

    pub(crate) fn unregister_link(&mut self, local: u32) {
        self.links.remove(&local);
    }

    /// Return the global link id registered under the given local link number.
    pub fn link_for(&self, local: u32) -> Option<LinkId> {
        self.links.get(&local).copied()
    }

    /// Return the local link number under which the given global link is registered.
    pub fn local_for(&self, lnk: LinkId) -> Option<u32> {
        self.links.iter().find(|(_, l)| **l == lnk).map(|(local, _)| *local)
    }

    /// Iterate over all (local link number, global link id) pairs of this router.
    pub fn links(&self) -> impl Iterator<Item = (u32, LinkId)> + '_ {
        self.links.iter().map(|(local, lnk)| (*local, *lnk))
    }
}
