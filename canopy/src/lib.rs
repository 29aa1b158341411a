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

#![deny(missing_docs, missing_debug_implementations)]

//! # Canopy: Comtree Control Plane for Overlay Multicast Networks
//!
//! This is a library implementing the control-plane data model of an overlay-multicast
//! network: the physical topology of routers, leaf nodes and capacity-carrying links, and
//! the *comtrees* overlaid on it, the per-application spanning trees that each carry a
//! reserved-bandwidth budget on every tree edge.
//!
//! ## Structure
//!
//! This library is structured in the following way:
//!
//! - **[`Network`](network::Network)**: the physical topology and its bandwidth ledger.
//!   Every link tracks a configured and an available (residual) [`RateSpec`](rates::RateSpec);
//!   all residual-capacity mutation funnels through the network's accessors.
//!
//! - **[`ComtreeDirectory`](directory::ComtreeDirectory)**: the indexed collection of
//!   [`Comtree`](comtree::Comtree) records. The directory lock guards the number-to-index
//!   mapping; each record carries its own lock, so different comtrees are operated on in
//!   parallel.
//!
//! - **[`checker`]**: validates every comtree's structural and bandwidth invariants with
//!   one breadth-first traversal per tree.
//!
//! - **[`autoconf`]**: aggregates downstream demand bottom-up and derives backbone rates
//!   top-down for comtrees in automatic configuration mode.
//!
//! - **[`pathfind`]**: capacity-constrained shortest-path search used to grow a comtree
//!   towards a router that wants to join.
//!
//! - **[`provision`]**: all-or-nothing reservation and release of comtree rates against
//!   the bandwidth ledger.
//!
//! - **[`printer`]**: renders nodes, links and comtree status snapshots in the textual
//!   block format the external loader and console tools consume.
//!
//! ## Example usage
//!
//! The following example builds a two-router topology, overlays a comtree on it, and
//! reserves the comtree's rates on the connecting link:
//!
//! ```rust
//! use canopy::{checker, provision};
//! use canopy::{ComtId, ComtreeDirectory, Fadr, Network, RateSpec};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut net = Network::new();
//!     let r1 = net.add_router("r1", Fadr::new(1, 0), (0.0, 0.0))?;
//!     let r2 = net.add_router("r2", Fadr::new(2, 0), (0.0, 1.0))?;
//!     let lnk = net.add_link(r1, r2, 1, 1)?;
//!     net.set_link_length(lnk, 10)?;
//!     net.set_link_rates(lnk, RateSpec::new(1000, 1000, 500, 500))?;
//!
//!     let dir = ComtreeDirectory::new();
//!     let cx = dir.add_comtree(ComtId(1001))?;
//!     let handle = dir.comtree(cx).unwrap();
//!     let mut ct = handle.lock();
//!     ct.add_rtr(r1);
//!     ct.set_root(r1)?;
//!     ct.add_core(r1)?;
//!     ct.add_rtr(r2);
//!     ct.add_comt_link(&net, lnk, r2)?;
//!     ct.set_comt_lnk_rates(lnk, RateSpec::new(100, 100, 50, 50))?;
//!
//!     assert!(checker::check_comtree(&net, &ct).is_empty());
//!
//!     provision::check_and_provision(&mut net, &ct)?;
//!     assert_eq!(net.avail_rates(lnk)?, RateSpec::new(900, 900, 450, 450));
//!     provision::unprovision(&mut net, &ct)?;
//!     assert_eq!(net.avail_rates(lnk)?, RateSpec::new(1000, 1000, 500, 500));
//!
//!     Ok(())
//! }
//! ```

pub mod autoconf;
pub mod checker;
pub mod comtree;
pub mod directory;
mod error;
pub mod leaf;
pub mod network;
pub mod pathfind;
pub mod printer;
pub mod provision;
pub mod rates;
pub mod router;
mod test;
pub(crate) mod types;

pub use comtree::{ComtLeaf, ComtLnk, Comtree};
pub use directory::{ComtreeDirectory, ComtreeHandle};
pub use error::Error;
pub use leaf::Leaf;
pub use network::{Link, Network};
pub use pathfind::PathStep;
pub use rates::RateSpec;
pub use router::{Interface, Router};
pub use types::{
    ComtId, ComtIndex, ComtreeError, Fadr, LinkId, NetGraph, NetNode, NetworkError, NodeId,
    NodeType,
};
