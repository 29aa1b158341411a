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

//! Module containing all type definitions

use crate::leaf::Leaf;
use crate::router::Router;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::Undirected;
use std::fmt;
use thiserror::Error;

type IndexType = u32;
/// Node identification (and index into the topology graph)
pub type NodeId = NodeIndex<IndexType>;
/// Link identification (and index into the topology graph)
pub type LinkId = EdgeIndex<IndexType>;
/// Physical topology graph. Node and edge attributes live in the side tables of
/// [`Network`](crate::network::Network); the graph itself only stores adjacency.
pub type NetGraph = StableGraph<(), (), Undirected, IndexType>;

/// Comtree number, the stable external identifier assigned by clients
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct ComtId(pub u32);

/// Dense index into the comtree arena. The number to index mapping is guarded by the
/// directory lock, see [`ComtreeDirectory`](crate::directory::ComtreeDirectory).
pub type ComtIndex = usize;

/// # Forest address
///
/// A protocol-level node address. A positive value is a unicast address packing a 16-bit
/// zip code (region identifier) with a 16-bit local part; a negative value denotes a
/// multicast address.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct Fadr(pub i32);

impl Fadr {
    /// Build a unicast address from a zip code and a local part.
    pub fn new(zip: u16, local: u16) -> Self {
        Fadr(((zip as i32) << 16) | (local as i32))
    }

    /// The zip code (region identifier). Only meaningful for unicast addresses.
    pub fn zip(self) -> u16 {
        ((self.0 >> 16) & 0xffff) as u16
    }

    /// The local part within the zip code. Only meaningful for unicast addresses.
    pub fn local(self) -> u16 {
        (self.0 & 0xffff) as u16
    }

    /// Returns true if and only if the address denotes a multicast group.
    pub fn is_multicast(self) -> bool {
        self.0 < 0
    }

    /// Returns true if and only if the address is a valid unicast address.
    pub fn is_unicast(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Fadr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_multicast() {
            write!(f, "mc({})", self.0)
        } else {
            write!(f, "{}.{}", self.zip(), self.local())
        }
    }
}

/// The kind of a node in the topology
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum NodeType {
    /// A forwarding router
    Router,
    /// A client leaf node
    Client,
    /// A server leaf node
    Server,
    /// A controller leaf node
    Controller,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Router => write!(f, "router"),
            Self::Client => write!(f, "client"),
            Self::Server => write!(f, "server"),
            Self::Controller => write!(f, "controller"),
        }
    }
}

/// # Network Node (similar to `Option`)
/// Enumerates both kinds of network nodes. This struct behaves similar to an `Option`,
/// but it knows two different `Some` values, the `Router` and the `Leaf`. It provides
/// `unwrap_router` and `unwrap_leaf`, the mapping functions `router` and `leaf`, as well
/// as `router_or` and `leaf_or`.
#[derive(Debug)]
pub enum NetNode<'a> {
    /// An internal forwarding router
    Router(&'a Router),
    /// A leaf node (client, server or controller)
    Leaf(&'a Leaf),
    /// None was found
    None,
}

impl<'a> NetNode<'a> {
    /// Returns the router or **panics**, if the enum is not a `NetNode::Router`
    pub fn unwrap_router(self) -> &'a Router {
        match self {
            Self::Router(r) => r,
            Self::Leaf(_) => panic!("`unwrap_router()` called on a `NetNode::Leaf`"),
            Self::None => panic!("`unwrap_router()` called on a `NetNode::None`"),
        }
    }

    /// Returns the leaf or **panics**, if the enum is not a `NetNode::Leaf`
    pub fn unwrap_leaf(self) -> &'a Leaf {
        match self {
            Self::Router(_) => panic!("`unwrap_leaf()` called on a `NetNode::Router`"),
            Self::Leaf(l) => l,
            Self::None => panic!("`unwrap_leaf()` called on a `NetNode::None`"),
        }
    }

    /// Returns true if and only if self contains a router.
    pub fn is_router(&self) -> bool {
        matches!(self, Self::Router(_))
    }

    /// Returns true if and only if self contains a leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    /// Returns true if and only if self contains `NetNode::None`.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Maps the `NetNode` to an option, with `Some(r)` only if self is `Router`.
    pub fn router(self) -> Option<&'a Router> {
        match self {
            Self::Router(r) => Some(r),
            _ => None,
        }
    }

    /// Maps the `NetNode` to an option, with `Some(l)` only if self is `Leaf`.
    pub fn leaf(self) -> Option<&'a Leaf> {
        match self {
            Self::Leaf(l) => Some(l),
            _ => None,
        }
    }

    /// Maps the `NetNode` to a result, with the `Ok` case only if self is `Router`. If
    /// `self` is not `Router`, then the provided error is returned.
    pub fn router_or<E: std::error::Error>(self, error: E) -> Result<&'a Router, E> {
        match self {
            Self::Router(r) => Ok(r),
            _ => Err(error),
        }
    }

    /// Maps the `NetNode` to a result, with the `Ok` case only if self is `Leaf`. If
    /// `self` is not `Leaf`, then the provided error is returned.
    pub fn leaf_or<E: std::error::Error>(self, error: E) -> Result<&'a Leaf, E> {
        match self {
            Self::Leaf(l) => Ok(l),
            _ => Err(error),
        }
    }
}

/// Topology Errors
#[derive(Error, Debug, PartialEq)]
pub enum NetworkError {
    /// The node name is already taken
    #[error("Node name is already in use: {0}")]
    NameExists(String),
    /// The forest address is already assigned to another node
    #[error("Forest address {0} is already assigned")]
    AdrExists(Fadr),
    /// Node is not present in the topology
    #[error("Network node was not found in topology: {0:?}")]
    NodeNotFound(NodeId),
    /// Node name is not present in the topology
    #[error("Network node name was not found in topology: {0}")]
    NameNotFound(String),
    /// No node carries the given forest address
    #[error("No node is assigned the forest address {0}")]
    AdrNotFound(Fadr),
    /// Link is not present in the topology
    #[error("Network link was not found in topology: {0:?}")]
    LinkNotFound(LinkId),
    /// The node must be a router, but a leaf was passed
    #[error("Network node must be a router: {0:?}")]
    NotARouter(NodeId),
    /// The local link number is already assigned at the given router
    #[error("Local link number {1} is already in use at router {0:?}")]
    LocalLinkInUse(NodeId, u32),
    /// A leaf supports a single link, and it must terminate at a router
    #[error("Leaf {0:?} cannot take another link")]
    LeafLinkExists(NodeId),
    /// Both endpoints of the link are leaves
    #[error("A link must have at least one router endpoint: {0:?} -- {1:?}")]
    BadEndpoints(NodeId, NodeId),
    /// The given node is not an endpoint of the given link
    #[error("Node {1:?} is not an endpoint of link {0:?}")]
    NotAnEndpoint(LinkId, NodeId),
    /// Validation: the router subgraph is not connected
    #[error("Routers do not form a single connected component ({0} of {1} reachable)")]
    RoutersPartitioned(usize, usize),
    /// Validation: two nodes share a forest address
    #[error("Forest address {0} is assigned to both {1} and {2}")]
    DuplicateAdr(Fadr, String, String),
    /// Validation: a router's leaf address range leaves its own zip code
    #[error("Leaf address range of router {0} lies outside its zip code")]
    RangeOutsideZip(String),
    /// Validation: two routers advertise overlapping leaf address ranges
    #[error("Leaf address ranges of routers {0} and {1} overlap")]
    RangeOverlap(String, String),
    /// Validation: a leaf is not attached to exactly one router
    #[error("Leaf {0} must have exactly one link, terminating at a router")]
    BadLeafAttachment(String),
    /// Validation: a leaf address falls outside its router's advertised range
    #[error("Address of leaf {0} is outside the assignable range of its router")]
    LeafOutsideRange(String),
    /// Validation: a link rate violates the system-wide bounds
    #[error("Rate of link {0:?} is outside the allowed bounds")]
    LinkRateBounds(LinkId),
    /// Validation: the available rate of a link exceeds its configured rate
    #[error("Available rate of link {0:?} exceeds its configured rate")]
    AvailExceedsRate(LinkId),
    /// Validation: an interface rate violates the system-wide bounds
    #[error("Rate of interface {1} at router {0} is outside the allowed bounds")]
    IfaceRateBounds(String, usize),
    /// Validation: the links assigned to an interface outgrow the interface
    #[error("Links assigned to interface {1} at router {0} exceed the interface rate")]
    IfaceOversubscribed(String, usize),
}

/// Comtree Errors
#[derive(Error, Debug, PartialEq)]
pub enum ComtreeError {
    /// A comtree with the same number is already registered
    #[error("Comtree {0:?} already exists")]
    ComtreeExists(ComtId),
    /// The comtree number is not registered
    #[error("Comtree {0:?} is not known")]
    UnknownComtree(ComtId),
    /// The comtree has no root router
    #[error("Comtree {0:?} has no root router")]
    NoRoot(ComtId),
    /// The router is not a member of the comtree
    #[error("Router {node:?} is not a member of comtree {comt:?}")]
    NotAMember {
        /// The comtree number
        comt: ComtId,
        /// The node that is not a member
        node: NodeId,
    },
    /// The router still carries comtree links and cannot be removed
    #[error("Router {node:?} still has comtree links in comtree {comt:?}")]
    RouterInUse {
        /// The comtree number
        comt: ComtId,
        /// The router that is still in use
        node: NodeId,
    },
    /// The router already has a parent link in this comtree
    #[error("Router {node:?} already has a parent link in comtree {comt:?}")]
    ParentExists {
        /// The comtree number
        comt: ComtId,
        /// The router that already has a parent
        node: NodeId,
    },
    /// The link is not recorded as a comtree link
    #[error("Link {lnk:?} is not part of comtree {comt:?}")]
    NotAComtLink {
        /// The comtree number
        comt: ComtId,
        /// The link that is not part of the comtree
        lnk: LinkId,
    },
    /// The comtree link set contains a cycle
    #[error("Comtree {comt:?} contains a cycle through {node:?}")]
    CycleDetected {
        /// The comtree number
        comt: ComtId,
        /// The node at which the cycle closed
        node: NodeId,
    },
    /// The number of parent-less routers differs from one
    #[error("Comtree {comt:?} has {count} parent-less routers, expected exactly one")]
    RootCount {
        /// The comtree number
        comt: ComtId,
        /// The number of parent-less routers found
        count: usize,
    },
    /// A core node hangs below a non-core parent
    #[error("Comtree {comt:?}: core node {node:?} has a non-core parent")]
    CoreNotClosed {
        /// The comtree number
        comt: ComtId,
        /// The core node with a non-core parent
        node: NodeId,
    },
    /// A zip code region is split across disjoint subtrees
    #[error("Comtree {comt:?}: zip code {zip} re-entered at {node:?}")]
    ZipNotContiguous {
        /// The comtree number
        comt: ComtId,
        /// The zip code that was re-entered
        zip: u16,
        /// The node at which the zip was re-entered
        node: NodeId,
    },
    /// A member leaf names a parent that is not a comtree router
    #[error("Comtree {comt:?}: leaf parent {parent} is not a comtree router")]
    LeafParentMissing {
        /// The comtree number
        comt: ComtId,
        /// The parent address recorded at the leaf
        parent: Fadr,
    },
    /// Routers are recorded as members but not reachable from the root
    #[error("Comtree {comt:?}: only {visited} of {members} routers reachable from the root")]
    UnreachableRouters {
        /// The comtree number
        comt: ComtId,
        /// The number of routers reached by the traversal
        visited: usize,
        /// The number of recorded router members
        members: usize,
    },
    /// A requested reservation does not fit into the residual link capacity
    #[error("Insufficient capacity on link {lnk:?} for comtree {comt:?}")]
    InsufficientCapacity {
        /// The comtree number
        comt: ComtId,
        /// The link with insufficient residual capacity
        lnk: LinkId,
    },
    /// The parent chain revisited a router, the comtree state is probably cyclic
    #[error("Probable cycle in comtree {comt:?} while aggregating at {node:?}")]
    ProbableCycle {
        /// The comtree number
        comt: ComtId,
        /// The router at which the walk looped
        node: NodeId,
    },
    /// No admissible path connects the router to the comtree
    #[error("No admissible path from {node:?} to comtree {comt:?}")]
    NoPath {
        /// The comtree number
        comt: ComtId,
        /// The router that wanted to join
        node: NodeId,
    },
}
