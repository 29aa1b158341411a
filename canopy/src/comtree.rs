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

//! # Comtree records
//!
//! A [`Comtree`] is one overlay multicast tree: a parent-pointer tree over a subset of the
//! topology's routers, the leaves hanging off them, the core-node set, and a rate
//! reservation for every tree edge. The record never owns a link; it references links of
//! the [`Network`](crate::network::Network) by id and keeps the committed reservation for
//! each of them, oriented so that "up" points from the child towards the parent.
//!
//! The membership mutators only manipulate this record; they do not touch the bandwidth
//! ledger. Reserving and releasing the recorded rates against the physical links is the
//! job of the [`provision`](crate::provision) module.

use crate::error::Error;
use crate::network::Network;
use crate::rates::RateSpec;
use crate::types::{ComtId, ComtreeError, Fadr, LinkId, NetworkError, NodeId};
use log::*;
use std::collections::{HashMap, HashSet};

/// Per-member state of a comtree router
#[derive(Debug, Clone, Default)]
struct ComtRtr {
    /// Link towards the parent, `None` at the root
    plnk: Option<LinkId>,
    /// Pinned by manual administrative action, excluded from rate recomputation
    frozen: bool,
    /// Number of comtree edges incident to this router
    lnk_cnt: u32,
    /// Rolled-up demand of the subtree hanging below this router
    subtree_rates: RateSpec,
}

/// Per-member state of a comtree leaf
#[derive(Debug, Clone)]
pub struct ComtLeaf {
    /// The access link connecting the leaf to its parent router
    pub lnk: LinkId,
    /// The parent router
    pub parent: NodeId,
    /// Forest address of the parent router
    pub parent_adr: Fadr,
    /// Local link number of the access link at the parent router
    pub llnk: u32,
}

/// One comtree edge: the referenced physical link, its child endpoint, and the committed
/// reservation, oriented child to parent
#[derive(Debug, Clone)]
pub struct ComtLnk {
    /// The endpoint farther from the root
    pub child: NodeId,
    /// The endpoint closer to the root
    pub parent: NodeId,
    /// Committed reservation, "up" pointing from child to parent
    pub rates: RateSpec,
}

/// # Comtree
/// One record per overlay tree. Comtrees are created empty and grow or shrink
/// incrementally; see [`pathfind`](crate::pathfind) for growing a tree towards a new
/// member and [`checker`](crate::checker) for the invariants every comtree must satisfy.
#[derive(Debug, Clone)]
pub struct Comtree {
    comt: ComtId,
    owner: Fadr,
    root: Option<NodeId>,
    auto_config: bool,
    bb_rates: RateSpec,
    leaf_rates: RateSpec,
    rtr_map: HashMap<NodeId, ComtRtr>,
    leaf_map: HashMap<NodeId, ComtLeaf>,
    lnk_map: HashMap<LinkId, ComtLnk>,
    core_set: HashSet<NodeId>,
}

impl Comtree {
    /// Create an empty comtree with the given number. Owner, root, mode and default rates
    /// are set through the corresponding setters while the tree is being configured.
    pub fn new(comt: ComtId) -> Self {
        Self {
            comt,
            owner: Fadr(0),
            root: None,
            auto_config: false,
            bb_rates: RateSpec::zero(),
            leaf_rates: RateSpec::zero(),
            rtr_map: HashMap::new(),
            leaf_map: HashMap::new(),
            lnk_map: HashMap::new(),
            core_set: HashSet::new(),
        }
    }

    /// Return the comtree number
    pub fn comt(&self) -> ComtId {
        self.comt
    }

    /// Return the owner's forest address
    pub fn owner(&self) -> Fadr {
        self.owner
    }

    /// Set the owner's forest address
    pub fn set_owner(&mut self, owner: Fadr) {
        self.owner = owner;
    }

    /// Return the root router, if one has been designated
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Designate the root router. The node must already be a member.
    pub fn set_root(&mut self, node: NodeId) -> Result<(), ComtreeError> {
        if !self.rtr_map.contains_key(&node) {
            return Err(ComtreeError::NotAMember { comt: self.comt, node });
        }
        self.root = Some(node);
        Ok(())
    }

    /// Returns true if and only if backbone rates are computed automatically from
    /// aggregated downstream demand.
    pub fn auto_config(&self) -> bool {
        self.auto_config
    }

    /// Switch between automatic and manual rate configuration.
    pub fn set_auto_config(&mut self, auto: bool) {
        self.auto_config = auto;
    }

    /// Return the default backbone rates for new comtree links
    pub fn bb_rates(&self) -> RateSpec {
        self.bb_rates
    }

    /// Return the default rates for new access links
    pub fn leaf_rates(&self) -> RateSpec {
        self.leaf_rates
    }

    /// Set the default backbone and access-link rates.
    pub fn set_default_rates(&mut self, bb_rates: RateSpec, leaf_rates: RateSpec) {
        self.bb_rates = bb_rates;
        self.leaf_rates = leaf_rates;
    }

    /// Add a router to the comtree. Adding a router that is already a member is a no-op;
    /// the return value tells whether the member is new.
    pub fn add_rtr(&mut self, node: NodeId) -> bool {
        if self.rtr_map.contains_key(&node) {
            return false;
        }
        self.rtr_map.insert(node, ComtRtr::default());
        true
    }

    /// Remove a router from the comtree. Fails while the router still has comtree links
    /// incident to it. Removing the root clears the root designation; removing a core
    /// node drops it from the core set.
    pub fn remove_rtr(&mut self, node: NodeId) -> Result<(), ComtreeError> {
        let info = self
            .rtr_map
            .get(&node)
            .ok_or(ComtreeError::NotAMember { comt: self.comt, node })?;
        if info.lnk_cnt != 0 {
            return Err(ComtreeError::RouterInUse { comt: self.comt, node });
        }
        self.rtr_map.remove(&node);
        self.core_set.remove(&node);
        if self.root == Some(node) {
            self.root = None;
        }
        Ok(())
    }

    /// Returns true if and only if the node is a member router.
    pub fn is_comt_rtr(&self, node: NodeId) -> bool {
        self.rtr_map.contains_key(&node)
    }

    /// Returns true if and only if the node is a member leaf.
    pub fn is_comt_leaf(&self, node: NodeId) -> bool {
        self.leaf_map.contains_key(&node)
    }

    /// Returns true if and only if the node is a member of the comtree.
    pub fn is_comt_node(&self, node: NodeId) -> bool {
        self.is_comt_rtr(node) || self.is_comt_leaf(node)
    }

    /// Returns true if and only if the link is recorded as a comtree edge.
    pub fn is_comt_link(&self, lnk: LinkId) -> bool {
        self.lnk_map.contains_key(&lnk)
    }

    /// Add a member router to the core set.
    pub fn add_core(&mut self, node: NodeId) -> Result<(), ComtreeError> {
        if !self.rtr_map.contains_key(&node) {
            return Err(ComtreeError::NotAMember { comt: self.comt, node });
        }
        self.core_set.insert(node);
        Ok(())
    }

    /// Drop a router from the core set.
    pub fn remove_core(&mut self, node: NodeId) -> Result<(), ComtreeError> {
        if !self.core_set.remove(&node) {
            return Err(ComtreeError::NotAMember { comt: self.comt, node });
        }
        Ok(())
    }

    /// Returns true if and only if the router belongs to the core set.
    pub fn is_core(&self, node: NodeId) -> bool {
        self.core_set.contains(&node)
    }

    /// Iterate over the core set.
    pub fn cores(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.core_set.iter().copied()
    }

    /// Record a comtree edge between two member routers: `child` gets `lnk` as its parent
    /// link. Recording the same (link, child) pair twice is a no-op. Fails if the child
    /// already has a different parent link, or if either endpoint is not a member router.
    pub fn add_comt_link(
        &mut self,
        net: &Network,
        lnk: LinkId,
        child: NodeId,
    ) -> Result<(), Error> {
        let link = net.link(lnk)?;
        let parent = link
            .peer(child)
            .ok_or(NetworkError::NotAnEndpoint(lnk, child))?;
        if let Some(entry) = self.lnk_map.get(&lnk) {
            if entry.child == child {
                return Ok(());
            }
            return Err(ComtreeError::ParentExists { comt: self.comt, node: entry.child }.into());
        }
        if !self.rtr_map.contains_key(&child) {
            return Err(ComtreeError::NotAMember { comt: self.comt, node: child }.into());
        }
        if !self.rtr_map.contains_key(&parent) {
            return Err(ComtreeError::NotAMember { comt: self.comt, node: parent }.into());
        }
        if self.rtr_map[&child].plnk.is_some() {
            return Err(ComtreeError::ParentExists { comt: self.comt, node: child }.into());
        }
        let bb_rates = self.bb_rates;
        if let Some(info) = self.rtr_map.get_mut(&child) {
            info.plnk = Some(lnk);
            info.lnk_cnt += 1;
        }
        if let Some(info) = self.rtr_map.get_mut(&parent) {
            info.lnk_cnt += 1;
        }
        self.lnk_map.insert(lnk, ComtLnk { child, parent, rates: bb_rates });
        Ok(())
    }

    /// Remove a comtree edge. The child's parent link is cleared and the link counts of
    /// both endpoints are decremented; a leaf child is dropped from the leaf map as well.
    pub fn remove_comt_link(&mut self, lnk: LinkId) -> Result<(), ComtreeError> {
        let entry = self
            .lnk_map
            .remove(&lnk)
            .ok_or(ComtreeError::NotAComtLink { comt: self.comt, lnk })?;
        if let Some(info) = self.rtr_map.get_mut(&entry.child) {
            info.plnk = None;
            info.lnk_cnt = info.lnk_cnt.saturating_sub(1);
        }
        self.leaf_map.remove(&entry.child);
        if let Some(info) = self.rtr_map.get_mut(&entry.parent) {
            info.lnk_cnt = info.lnk_cnt.saturating_sub(1);
        }
        Ok(())
    }

    /// Add a leaf member, attached over the given access link. The peer of the leaf on
    /// that link must be a member router. Adding a leaf that is already a member is a
    /// no-op; the return value tells whether the member is new. The access link enters
    /// the comtree edge set with the default access-link rates.
    pub fn add_comt_leaf(
        &mut self,
        net: &Network,
        leaf: NodeId,
        lnk: LinkId,
    ) -> Result<bool, Error> {
        if self.leaf_map.contains_key(&leaf) {
            return Ok(false);
        }
        let link = net.link(lnk)?;
        let parent = link
            .peer(leaf)
            .ok_or(NetworkError::NotAnEndpoint(lnk, leaf))?;
        if !self.rtr_map.contains_key(&parent) {
            return Err(ComtreeError::NotAMember { comt: self.comt, node: parent }.into());
        }
        let llnk = link
            .lnk_at(parent)
            .ok_or(NetworkError::NotAnEndpoint(lnk, parent))?;
        let parent_adr = net.node_adr(parent)?;
        let leaf_rates = self.leaf_rates;
        self.leaf_map.insert(leaf, ComtLeaf { lnk, parent, parent_adr, llnk });
        self.lnk_map.insert(lnk, ComtLnk { child: leaf, parent, rates: leaf_rates });
        if let Some(info) = self.rtr_map.get_mut(&parent) {
            info.lnk_cnt += 1;
        }
        Ok(true)
    }

    /// Remove a leaf member and its access link from the comtree.
    pub fn remove_comt_leaf(&mut self, leaf: NodeId) -> Result<(), ComtreeError> {
        let info = self
            .leaf_map
            .remove(&leaf)
            .ok_or(ComtreeError::NotAMember { comt: self.comt, node: leaf })?;
        self.lnk_map.remove(&info.lnk);
        if let Some(p) = self.rtr_map.get_mut(&info.parent) {
            p.lnk_cnt = p.lnk_cnt.saturating_sub(1);
        }
        Ok(())
    }

    /// Return the per-member state of a leaf.
    pub fn leaf_info(&self, leaf: NodeId) -> Option<&ComtLeaf> {
        self.leaf_map.get(&leaf)
    }

    /// Set the committed reservation of a comtree edge, oriented child to parent.
    pub fn set_comt_lnk_rates(&mut self, lnk: LinkId, rates: RateSpec) -> Result<(), ComtreeError> {
        self.lnk_map
            .get_mut(&lnk)
            .ok_or(ComtreeError::NotAComtLink { comt: self.comt, lnk })?
            .rates = rates;
        Ok(())
    }

    /// Return the committed reservation of a comtree edge, oriented child to parent.
    pub fn comt_lnk_rates(&self, lnk: LinkId) -> Option<RateSpec> {
        self.lnk_map.get(&lnk).map(|e| e.rates)
    }

    /// Return the child endpoint of a comtree edge.
    pub fn comt_lnk_child(&self, lnk: LinkId) -> Option<NodeId> {
        self.lnk_map.get(&lnk).map(|e| e.child)
    }

    pub(crate) fn add_to_comt_lnk_rates(
        &mut self,
        lnk: LinkId,
        delta: &RateSpec,
    ) -> Result<(), ComtreeError> {
        self.lnk_map
            .get_mut(&lnk)
            .ok_or(ComtreeError::NotAComtLink { comt: self.comt, lnk })?
            .rates
            .add(delta);
        Ok(())
    }

    /// Return the parent link of a member router (`None` at the root and for non-members).
    pub fn plnk(&self, node: NodeId) -> Option<LinkId> {
        self.rtr_map.get(&node).and_then(|r| r.plnk)
    }

    /// Return the parent router of a member router, resolved over its parent link.
    pub fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.plnk(node).and_then(|lnk| self.lnk_map.get(&lnk)).map(|e| e.parent)
    }

    /// Return the committed reservation towards the parent of a member router.
    pub fn plnk_rates(&self, node: NodeId) -> Option<RateSpec> {
        self.plnk(node).and_then(|lnk| self.comt_lnk_rates(lnk))
    }

    /// Pin the parent-link rates of a router, excluding it from rate recomputation.
    pub fn freeze(&mut self, node: NodeId) -> Result<(), ComtreeError> {
        self.rtr_map
            .get_mut(&node)
            .ok_or(ComtreeError::NotAMember { comt: self.comt, node })?
            .frozen = true;
        Ok(())
    }

    /// Release a previously frozen router.
    pub fn thaw(&mut self, node: NodeId) -> Result<(), ComtreeError> {
        self.rtr_map
            .get_mut(&node)
            .ok_or(ComtreeError::NotAMember { comt: self.comt, node })?
            .frozen = false;
        Ok(())
    }

    /// Returns true if and only if the router's parent-link rates are frozen.
    pub fn is_frozen(&self, node: NodeId) -> bool {
        self.rtr_map.get(&node).map(|r| r.frozen).unwrap_or(false)
    }

    /// Return the number of comtree edges incident to a member router.
    pub fn lnk_cnt(&self, node: NodeId) -> u32 {
        self.rtr_map.get(&node).map(|r| r.lnk_cnt).unwrap_or(0)
    }

    /// Increment the recorded comtree link count of a member router. Used by console
    /// tools that observe link-count deltas externally.
    pub fn inc_lnk_cnt(&mut self, node: NodeId) -> Result<(), ComtreeError> {
        self.rtr_map
            .get_mut(&node)
            .ok_or(ComtreeError::NotAMember { comt: self.comt, node })?
            .lnk_cnt += 1;
        Ok(())
    }

    /// Decrement the recorded comtree link count of a member router.
    pub fn dec_lnk_cnt(&mut self, node: NodeId) -> Result<(), ComtreeError> {
        let info = self
            .rtr_map
            .get_mut(&node)
            .ok_or(ComtreeError::NotAMember { comt: self.comt, node })?;
        if info.lnk_cnt == 0 {
            warn!("Link count of {:?} in comtree {:?} is already zero", node, self.comt);
        }
        info.lnk_cnt = info.lnk_cnt.saturating_sub(1);
        Ok(())
    }

    /// Return the rolled-up subtree demand of a member router.
    pub fn subtree_rates(&self, node: NodeId) -> Option<RateSpec> {
        self.rtr_map.get(&node).map(|r| r.subtree_rates)
    }

    pub(crate) fn add_to_subtree_rates(&mut self, node: NodeId, delta: &RateSpec) {
        if let Some(info) = self.rtr_map.get_mut(&node) {
            info.subtree_rates.add(delta);
        }
    }

    /// Iterate over the ids of all member routers.
    pub fn rtrs(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.rtr_map.keys().copied()
    }

    /// The number of member routers
    pub fn num_rtrs(&self) -> usize {
        self.rtr_map.len()
    }

    /// Iterate over all member leaves with their per-member state.
    pub fn comt_leaves(&self) -> impl Iterator<Item = (NodeId, &ComtLeaf)> + '_ {
        self.leaf_map.iter().map(|(n, l)| (*n, l))
    }

    /// The number of member leaves
    pub fn num_leaves(&self) -> usize {
        self.leaf_map.len()
    }

    /// Iterate over all comtree edges.
    pub fn comt_links(&self) -> impl Iterator<Item = (LinkId, &ComtLnk)> + '_ {
        self.lnk_map.iter().map(|(l, e)| (*l, e))
    }

    /// The number of comtree edges
    pub fn num_comt_links(&self) -> usize {
        self.lnk_map.len()
    }

    /// Child adjacency of the recorded tree: for every parent, the (link, child) pairs
    /// hanging below it.
    pub(crate) fn children_by_rtr(&self) -> HashMap<NodeId, Vec<(LinkId, NodeId)>> {
        let mut map: HashMap<NodeId, Vec<(LinkId, NodeId)>> = HashMap::new();
        for (lnk, e) in self.lnk_map.iter() {
            map.entry(e.parent).or_default().push((*lnk, e.child));
        }
        map
    }
}
