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

//! Module containing the main error type

use crate::types::{ComtreeError, NetworkError};
use thiserror::Error;

/// Main error type, for operations that span both the topology and the comtree layer
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// Error propagated from the topology layer
    #[error("Network Error: {0}")]
    Network(#[from] NetworkError),
    /// Error propagated from the comtree layer
    #[error("Comtree Error: {0}")]
    Comtree(#[from] ComtreeError),
}
