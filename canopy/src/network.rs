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

//! # Top-level Network module
//!
//! This module represents the physical network topology: routers, leaf nodes, the links
//! between them, and the bandwidth ledger attached to every link. The comtree layer only
//! ever references links by id; all residual-capacity bookkeeping goes through the
//! accessors of [`Network`], so the ledger stays centralized.

use crate::leaf::Leaf;
use crate::rates::RateSpec;
use crate::router::{Interface, Router};
use crate::types::{Fadr, LinkId, NetGraph, NetNode, NetworkError, NodeId, NodeType};
use itertools::Itertools;
use log::*;
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet, VecDeque};

/// Smallest admissible bit rate of a link or interface (kb/s)
pub static MIN_BIT_RATE: i32 = 1;
/// Largest admissible bit rate of a link or interface (kb/s)
pub static MAX_BIT_RATE: i32 = 1_000_000;
/// Smallest admissible packet rate of a link or interface (packets/s)
pub static MIN_PKT_RATE: i32 = 1;
/// Largest admissible packet rate of a link or interface (packets/s)
pub static MAX_PKT_RATE: i32 = 1_000_000;

/// An undirected physical link. The two endpoints are arbitrarily labeled left and right;
/// the "up" direction of the stored rates runs from left to right. Each router endpoint
/// registers the link under a local link number distinct from the global [`LinkId`].
#[derive(Debug, Clone)]
pub struct Link {
    left: NodeId,
    right: NodeId,
    left_lnk: u32,
    right_lnk: u32,
    length: u32,
    rates: RateSpec,
    avail: RateSpec,
}

impl Link {
    fn new(left: NodeId, right: NodeId, left_lnk: u32, right_lnk: u32) -> Self {
        Self { left, right, left_lnk, right_lnk, length: 1, rates: RateSpec::zero(), avail: RateSpec::zero() }
    }

    /// Return the left endpoint
    pub fn left(&self) -> NodeId {
        self.left
    }

    /// Return the right endpoint
    pub fn right(&self) -> NodeId {
        self.right
    }

    /// Returns true if and only if the node is one of the two endpoints.
    pub fn is_end(&self, node: NodeId) -> bool {
        node == self.left || node == self.right
    }

    /// Return the endpoint opposite to the given one, or `None` if the node is not an
    /// endpoint of this link.
    pub fn peer(&self, node: NodeId) -> Option<NodeId> {
        if node == self.left {
            Some(self.right)
        } else if node == self.right {
            Some(self.left)
        } else {
            None
        }
    }

    /// Return the local link number under which the given endpoint registers this link
    /// (0 for leaf endpoints).
    pub fn lnk_at(&self, node: NodeId) -> Option<u32> {
        if node == self.left {
            Some(self.left_lnk)
        } else if node == self.right {
            Some(self.right_lnk)
        } else {
            None
        }
    }

    /// Return the length of the link, the cost metric used by the path search
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Return the configured rates (capacity) of the link, oriented left to right
    pub fn rates(&self) -> RateSpec {
        self.rates
    }

    /// Return the available (residual, unreserved) rates of the link, same orientation
    pub fn avail(&self) -> RateSpec {
        self.avail
    }
}

/// # Network struct
/// The struct contains all information about the underlying physical network: the
/// adjacency graph, all routers and leaf nodes, the link table with its bandwidth ledger,
/// and the name and address indices needed to go from names to ids to forest addresses.
///
/// Nodes and links are created by the explicit add operations during bootstrap; the
/// topology is assumed stable afterwards. Link capacity is mutated only by the
/// provisioning engine, through [`Network::set_available_rate`]. Since that mutation
/// requires `&mut Network`, the exclusive borrow serializes all ledger updates; deployments
/// that provision from several threads put the `Network` behind an outer lock.
#[derive(Debug, Clone, Default)]
pub struct Network {
    graph: NetGraph,
    routers: HashMap<NodeId, Router>,
    leaves: HashMap<NodeId, Leaf>,
    links: HashMap<LinkId, Link>,
    names: HashMap<String, NodeId>,
    adr_map: HashMap<Fadr, NodeId>,
}

impl Network {
    /// Generate an empty Network
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new router to the topology. Fails if the name or the forest address is
    /// already taken. This function returns the id of the router, which is used to
    /// reference it in all other calls.
    pub fn add_router<S: Into<String>>(
        &mut self,
        name: S,
        fadr: Fadr,
        location: (f64, f64),
    ) -> Result<NodeId, NetworkError> {
        let name = name.into();
        self.check_new_node(&name, fadr)?;
        let node_id = self.graph.add_node(());
        self.names.insert(name.clone(), node_id);
        self.adr_map.insert(fadr, node_id);
        self.routers.insert(node_id, Router::new(name, node_id, fadr, location));
        Ok(node_id)
    }

    /// Add a new leaf node (client, server or controller) to the topology. Fails if the
    /// name or the forest address is already taken. This function returns the id of the
    /// leaf, which is used to reference it in all other calls.
    pub fn add_leaf<S: Into<String>>(
        &mut self,
        name: S,
        ntype: NodeType,
        fadr: Fadr,
        location: (f64, f64),
    ) -> Result<NodeId, NetworkError> {
        let name = name.into();
        self.check_new_node(&name, fadr)?;
        let node_id = self.graph.add_node(());
        self.names.insert(name.clone(), node_id);
        self.adr_map.insert(fadr, node_id);
        self.leaves.insert(node_id, Leaf::new(name, node_id, ntype, fadr, location));
        Ok(node_id)
    }

    fn check_new_node(&self, name: &str, fadr: Fadr) -> Result<(), NetworkError> {
        if self.names.contains_key(name) {
            return Err(NetworkError::NameExists(name.to_string()));
        }
        if self.adr_map.contains_key(&fadr) {
            return Err(NetworkError::AdrExists(fadr));
        }
        Ok(())
    }

    /// Create a link between two nodes, registering it under the given local link numbers
    /// at the router endpoints (the local number of a leaf endpoint is ignored and stored
    /// as 0). At least one endpoint must be a router, and a leaf can take only a single
    /// link. Fails without touching any state if a local link number is already in use.
    ///
    /// The link starts out with length 1 and a zero rate; use
    /// [`Network::set_link_length`] and [`Network::set_link_rates`] to configure it.
    pub fn add_link(
        &mut self,
        u: NodeId,
        v: NodeId,
        local_u: u32,
        local_v: u32,
    ) -> Result<LinkId, NetworkError> {
        if !self.contains(u) {
            return Err(NetworkError::NodeNotFound(u));
        }
        if !self.contains(v) {
            return Err(NetworkError::NodeNotFound(v));
        }
        if self.leaves.contains_key(&u) && self.leaves.contains_key(&v) {
            return Err(NetworkError::BadEndpoints(u, v));
        }
        // check both endpoints before mutating either, so a failure leaves no trace
        for &(end, local) in [(u, local_u), (v, local_v)].iter() {
            if let Some(r) = self.routers.get(&end) {
                if r.link_for(local).is_some() {
                    return Err(NetworkError::LocalLinkInUse(end, local));
                }
            } else if self.graph.edges(end).next().is_some() {
                return Err(NetworkError::LeafLinkExists(end));
            }
        }
        let lnk = self.graph.add_edge(u, v, ());
        let left_lnk = if self.routers.contains_key(&u) { local_u } else { 0 };
        let right_lnk = if self.routers.contains_key(&v) { local_v } else { 0 };
        if let Some(r) = self.routers.get_mut(&u) {
            r.register_link(left_lnk, lnk);
        }
        if let Some(r) = self.routers.get_mut(&v) {
            r.register_link(right_lnk, lnk);
        }
        self.links.insert(lnk, Link::new(u, v, left_lnk, right_lnk));
        debug!("Added link {:?} between {:?} and {:?}", lnk, u, v);
        Ok(lnk)
    }

    /// Set the length (path cost) of a link.
    pub fn set_link_length(&mut self, lnk: LinkId, length: u32) -> Result<(), NetworkError> {
        self.link_mut(lnk)?.length = length;
        Ok(())
    }

    /// Set the configured rates of a link, oriented left to right. The available rates
    /// are reset to the full capacity; this is a bootstrap/administrative operation, not
    /// meant to race with provisioned reservations.
    pub fn set_link_rates(&mut self, lnk: LinkId, rates: RateSpec) -> Result<(), NetworkError> {
        let link = self.link_mut(lnk)?;
        link.rates = rates;
        link.avail = rates;
        Ok(())
    }

    /// Set the available rates of a link. This accessor is reserved for the provisioning
    /// engine: the new value is **not** clamped, the caller must already have validated
    /// that it lies between zero and the configured rate.
    pub fn set_available_rate(&mut self, lnk: LinkId, avail: RateSpec) -> Result<(), NetworkError> {
        self.link_mut(lnk)?.avail = avail;
        Ok(())
    }

    /// Get a reference to a link.
    pub fn link(&self, lnk: LinkId) -> Result<&Link, NetworkError> {
        self.links.get(&lnk).ok_or(NetworkError::LinkNotFound(lnk))
    }

    fn link_mut(&mut self, lnk: LinkId) -> Result<&mut Link, NetworkError> {
        self.links.get_mut(&lnk).ok_or(NetworkError::LinkNotFound(lnk))
    }

    /// Return the configured rates of a link, oriented left to right.
    pub fn link_rates(&self, lnk: LinkId) -> Result<RateSpec, NetworkError> {
        Ok(self.link(lnk)?.rates())
    }

    /// Return the available rates of a link, oriented left to right.
    pub fn avail_rates(&self, lnk: LinkId) -> Result<RateSpec, NetworkError> {
        Ok(self.link(lnk)?.avail())
    }

    /// Return the available rates of a link, oriented so that "up" points away from the
    /// given endpoint.
    pub fn avail_from(&self, lnk: LinkId, from: NodeId) -> Result<RateSpec, NetworkError> {
        let link = self.link(lnk)?;
        match link.lnk_at(from) {
            Some(_) if from == link.left() => Ok(link.avail()),
            Some(_) => Ok(link.avail().flipped()),
            None => Err(NetworkError::NotAnEndpoint(lnk, from)),
        }
    }

    /// Translate a rate whose "up" direction points away from the given endpoint into the
    /// link's stored left-to-right orientation (flip is an involution, so the same call
    /// translates back).
    pub fn orient_from(
        &self,
        lnk: LinkId,
        from: NodeId,
        rates: RateSpec,
    ) -> Result<RateSpec, NetworkError> {
        let link = self.link(lnk)?;
        match link.lnk_at(from) {
            Some(_) if from == link.left() => Ok(rates),
            Some(_) => Ok(rates.flipped()),
            None => Err(NetworkError::NotAnEndpoint(lnk, from)),
        }
    }

    /// Get the node with the given id, as a [`NetNode`].
    pub fn node(&self, id: NodeId) -> NetNode<'_> {
        if let Some(r) = self.routers.get(&id) {
            NetNode::Router(r)
        } else if let Some(l) = self.leaves.get(&id) {
            NetNode::Leaf(l)
        } else {
            NetNode::None
        }
    }

    /// Get a reference to the router with the given id.
    pub fn router(&self, id: NodeId) -> Result<&Router, NetworkError> {
        self.routers.get(&id).ok_or(NetworkError::NotARouter(id))
    }

    /// Get a reference to the leaf with the given id.
    pub fn leaf(&self, id: NodeId) -> Result<&Leaf, NetworkError> {
        self.leaves.get(&id).ok_or(NetworkError::NodeNotFound(id))
    }

    /// Returns true if and only if the id names a router.
    pub fn is_router(&self, id: NodeId) -> bool {
        self.routers.contains_key(&id)
    }

    /// Returns true if and only if the id names a leaf.
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.leaves.contains_key(&id)
    }

    /// Returns true if and only if the id names any node of the topology.
    pub fn contains(&self, id: NodeId) -> bool {
        self.routers.contains_key(&id) || self.leaves.contains_key(&id)
    }

    /// Resolve a node name to its id.
    pub fn node_id(&self, name: &str) -> Result<NodeId, NetworkError> {
        self.names.get(name).copied().ok_or_else(|| NetworkError::NameNotFound(name.to_string()))
    }

    /// Return the name of a node.
    pub fn node_name(&self, id: NodeId) -> Result<&str, NetworkError> {
        match self.node(id) {
            NetNode::Router(r) => Ok(r.name()),
            NetNode::Leaf(l) => Ok(l.name()),
            NetNode::None => Err(NetworkError::NodeNotFound(id)),
        }
    }

    /// Resolve a forest address to the node that carries it.
    pub fn node_for_adr(&self, fadr: Fadr) -> Option<NodeId> {
        self.adr_map.get(&fadr).copied()
    }

    /// Return the forest address of a node.
    pub fn node_adr(&self, id: NodeId) -> Result<Fadr, NetworkError> {
        match self.node(id) {
            NetNode::Router(r) => Ok(r.fadr()),
            NetNode::Leaf(l) => Ok(l.fadr()),
            NetNode::None => Err(NetworkError::NodeNotFound(id)),
        }
    }

    /// Return the zip code of a node's forest address.
    pub fn zip(&self, id: NodeId) -> Result<u16, NetworkError> {
        Ok(self.node_adr(id)?.zip())
    }

    /// Return the local link number under which the given router registers the link.
    pub fn local_link(&self, rtr: NodeId, lnk: LinkId) -> Result<u32, NetworkError> {
        self.link(lnk)?.lnk_at(rtr).ok_or(NetworkError::NotAnEndpoint(lnk, rtr))
    }

    /// Append an interface to a router's interface list.
    pub fn add_interface(&mut self, rtr: NodeId, iface: Interface) -> Result<(), NetworkError> {
        self.routers.get_mut(&rtr).ok_or(NetworkError::NotARouter(rtr))?.add_interface(iface);
        Ok(())
    }

    /// Set the assignable leaf address range of a router.
    pub fn set_leaf_range(
        &mut self,
        rtr: NodeId,
        first: Fadr,
        last: Fadr,
    ) -> Result<(), NetworkError> {
        self.routers.get_mut(&rtr).ok_or(NetworkError::NotARouter(rtr))?.set_leaf_range(first, last);
        Ok(())
    }

    /// Iterate over the ids of all routers.
    pub fn routers(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.routers.keys().copied()
    }

    /// Iterate over the ids of all leaf nodes.
    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.leaves.keys().copied()
    }

    /// Iterate over the ids of all links.
    pub fn links(&self) -> impl Iterator<Item = LinkId> + '_ {
        self.links.keys().copied()
    }

    /// The number of routers in the topology
    pub fn num_routers(&self) -> usize {
        self.routers.len()
    }

    /// The number of leaf nodes in the topology
    pub fn num_leaves(&self) -> usize {
        self.leaves.len()
    }

    /// The number of links in the topology
    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    /// Iterate over the links incident to a node, as (link id, peer node) pairs.
    pub fn incident(&self, node: NodeId) -> impl Iterator<Item = (LinkId, NodeId)> + '_ {
        self.graph.edges(node).map(move |e| {
            let peer = if e.source() == node { e.target() } else { e.source() };
            (e.id(), peer)
        })
    }

    /// Check the structural invariants of the loaded topology and collect all findings.
    /// An empty result means the network is in a legal state. Validation never mutates
    /// state and is expected to run once, after the configuration loader has finished.
    ///
    /// The checks: routers form a single connected component; no two nodes share a forest
    /// address; leaf address ranges stay within the owning router's zip code and are
    /// pairwise disjoint; every leaf has exactly one link, terminating at a router, with
    /// an address inside that router's advertised range; link and interface rates fall
    /// within the system-wide bounds; and no interface is oversubscribed by the links
    /// assigned to it.
    pub fn validate(&self) -> Vec<NetworkError> {
        let mut findings = Vec::new();
        self.validate_connectivity(&mut findings);
        self.validate_addresses(&mut findings);
        self.validate_leaf_ranges(&mut findings);
        self.validate_leaves(&mut findings);
        self.validate_rates(&mut findings);
        findings
    }

    fn validate_connectivity(&self, findings: &mut Vec<NetworkError>) {
        let start = match self.routers.keys().next() {
            Some(r) => *r,
            None => return,
        };
        let mut visited: HashSet<NodeId> = HashSet::new();
        visited.insert(start);
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        queue.push_back(start);
        while let Some(u) = queue.pop_front() {
            for (_, v) in self.incident(u) {
                if self.is_router(v) && visited.insert(v) {
                    queue.push_back(v);
                }
            }
        }
        if visited.len() != self.routers.len() {
            findings.push(NetworkError::RoutersPartitioned(visited.len(), self.routers.len()));
        }
    }

    fn validate_addresses(&self, findings: &mut Vec<NetworkError>) {
        let mut seen: HashMap<Fadr, &str> = HashMap::new();
        let all = self
            .routers
            .values()
            .map(|r| (r.fadr(), r.name()))
            .chain(self.leaves.values().map(|l| (l.fadr(), l.name())));
        for (fadr, name) in all {
            if let Some(first) = seen.insert(fadr, name) {
                findings.push(NetworkError::DuplicateAdr(fadr, first.to_string(), name.to_string()));
            }
        }
    }

    fn validate_leaf_ranges(&self, findings: &mut Vec<NetworkError>) {
        for r in self.routers.values() {
            let (lo, hi) = r.leaf_range();
            if lo.zip() != r.fadr().zip() || hi.zip() != r.fadr().zip() || hi < lo {
                findings.push(NetworkError::RangeOutsideZip(r.name().to_string()));
            }
        }
        for (a, b) in self
            .routers
            .values()
            .map(|r| (r.leaf_range(), r.name()))
            .sorted_by_key(|((lo, _), _)| *lo)
            .tuple_windows()
        {
            let ((_, hi_a), name_a) = a;
            let ((lo_b, _), name_b) = b;
            if lo_b <= hi_a {
                findings.push(NetworkError::RangeOverlap(name_a.to_string(), name_b.to_string()));
            }
        }
    }

    fn validate_leaves(&self, findings: &mut Vec<NetworkError>) {
        for l in self.leaves.values() {
            let mut inc = self.incident(l.node_id());
            match (inc.next(), inc.next()) {
                (Some((_, peer)), None) if self.is_router(peer) => {
                    if let Some(rtr) = self.routers.get(&peer) {
                        if !rtr.in_leaf_range(l.fadr()) {
                            findings.push(NetworkError::LeafOutsideRange(l.name().to_string()));
                        }
                    }
                }
                _ => findings.push(NetworkError::BadLeafAttachment(l.name().to_string())),
            }
        }
    }

    fn validate_rates(&self, findings: &mut Vec<NetworkError>) {
        for (lnk, link) in self.links.iter() {
            if !rate_in_bounds(&link.rates()) {
                findings.push(NetworkError::LinkRateBounds(*lnk));
            }
            if !link.avail().leq(&link.rates()) {
                findings.push(NetworkError::AvailExceedsRate(*lnk));
            }
        }
        for r in self.routers.values() {
            for (i, iface) in r.interfaces().iter().enumerate() {
                if !rate_in_bounds(&iface.rates) {
                    findings.push(NetworkError::IfaceRateBounds(r.name().to_string(), i));
                }
                let mut sum = RateSpec::zero();
                for (local, lnk) in r.links() {
                    if !iface.covers(local) {
                        continue;
                    }
                    if let Ok(rates) = self
                        .link_rates(lnk)
                        .and_then(|rs| self.orient_from(lnk, r.node_id(), rs))
                    {
                        sum.add(&rates);
                    }
                }
                if !sum.leq(&iface.rates) {
                    findings.push(NetworkError::IfaceOversubscribed(r.name().to_string(), i));
                }
            }
        }
    }
}

fn rate_in_bounds(rates: &RateSpec) -> bool {
    let bit = |r: i32| MIN_BIT_RATE <= r && r <= MAX_BIT_RATE;
    let pkt = |r: i32| MIN_PKT_RATE <= r && r <= MAX_PKT_RATE;
    bit(rates.bit_rate_up)
        && bit(rates.bit_rate_down)
        && pkt(rates.pkt_rate_up)
        && pkt(rates.pkt_rate_down)
}
