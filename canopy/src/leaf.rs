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

//! # Leaf nodes
//!
//! A leaf is a client, server or controller at the edge of the overlay network. Leaves
//! attach to exactly one router over a single access link; everything else about them is
//! managed by external components.

use crate::types::{Fadr, NodeId, NodeType};

/// Struct representing a leaf node
#[derive(Debug, Clone)]
pub struct Leaf {
    name: String,
    node_id: NodeId,
    ntype: NodeType,
    fadr: Fadr,
    location: (f64, f64),
}

impl Leaf {
    pub(crate) fn new(
        name: String,
        node_id: NodeId,
        ntype: NodeType,
        fadr: Fadr,
        location: (f64, f64),
    ) -> Self {
        Self { name, node_id, ntype, fadr, location }
    }

    /// Return the name of the leaf
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    /// Return the id of the leaf
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Return the kind of the leaf (client, server or controller)
    pub fn ntype(&self) -> NodeType {
        self.ntype
    }

    /// Return the forest address of the leaf
    pub fn fadr(&self) -> Fadr {
        self.fadr
    }

    /// Return the geographic location (latitude, longitude) of the leaf
    pub fn location(&self) -> (f64, f64) {
        self.location
    }
}
