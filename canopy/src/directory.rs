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

//! # Comtree Directory
//!
//! The directory is the indexed collection of all comtree records. Records live in an
//! arena of slots addressed by a dense [`ComtIndex`]; freed slots are recycled through a
//! free list, so indices stay small and stable arrays keyed by them stay compact. The
//! external comtree number to index mapping, slot allocation and index iteration are
//! guarded by the single directory lock; each slot carries its own lock, so operations on
//! two different comtrees proceed fully in parallel.
//!
//! Handing out `Arc` handles keeps the directory lock off the per-comtree fast path: the
//! lock is held only while a handle is cloned out, never for the duration of a checker,
//! auto-configuration or provisioning run. A held handle stays valid even if the comtree
//! is concurrently removed from the directory; the slot is recycled, the record is not
//! pulled out from under the holder.

use crate::comtree::Comtree;
use crate::types::{ComtId, ComtIndex, ComtreeError};
use log::*;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// A shared, lockable handle to one comtree record
pub type ComtreeHandle = Arc<Mutex<Comtree>>;

#[derive(Debug, Default)]
struct DirState {
    index_of: HashMap<ComtId, ComtIndex>,
    slots: Vec<Option<ComtreeHandle>>,
    free: Vec<ComtIndex>,
}

/// # Comtree Directory
/// Arena of comtree records with number-to-index mapping and slot recycling. See the
/// module documentation for the locking discipline.
#[derive(Debug, Default)]
pub struct ComtreeDirectory {
    dir: Mutex<DirState>,
}

impl ComtreeDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new, empty comtree under the given number and return its arena index.
    /// Fails if the number is already registered.
    pub fn add_comtree(&self, comt: ComtId) -> Result<ComtIndex, ComtreeError> {
        let mut dir = self.dir.lock();
        if dir.index_of.contains_key(&comt) {
            return Err(ComtreeError::ComtreeExists(comt));
        }
        let handle = Arc::new(Mutex::new(Comtree::new(comt)));
        let cx = match dir.free.pop() {
            Some(cx) => {
                dir.slots[cx] = Some(handle);
                cx
            }
            None => {
                dir.slots.push(Some(handle));
                dir.slots.len() - 1
            }
        };
        dir.index_of.insert(comt, cx);
        debug!("Registered comtree {:?} at index {}", comt, cx);
        Ok(cx)
    }

    /// Drop a comtree from the directory and recycle its slot. The record itself is only
    /// deallocated once the last outstanding handle goes away. The caller is responsible
    /// for having released the comtree's capacity first; the directory does not
    /// unprovision on removal.
    pub fn remove_comtree(&self, comt: ComtId) -> Result<(), ComtreeError> {
        let mut dir = self.dir.lock();
        let cx = dir.index_of.remove(&comt).ok_or(ComtreeError::UnknownComtree(comt))?;
        dir.slots[cx] = None;
        dir.free.push(cx);
        debug!("Removed comtree {:?}, recycling index {}", comt, cx);
        Ok(())
    }

    /// Resolve a comtree number to its arena index.
    pub fn index_of(&self, comt: ComtId) -> Option<ComtIndex> {
        self.dir.lock().index_of.get(&comt).copied()
    }

    /// Get a handle to the comtree at the given arena index, or `None` if the index is
    /// out of range or its slot is currently free.
    pub fn comtree(&self, cx: ComtIndex) -> Option<ComtreeHandle> {
        self.dir.lock().slots.get(cx).and_then(|s| s.clone())
    }

    /// Get a handle to the comtree with the given number.
    pub fn comtree_for(&self, comt: ComtId) -> Option<ComtreeHandle> {
        let dir = self.dir.lock();
        dir.index_of.get(&comt).and_then(|cx| dir.slots.get(*cx)).and_then(|s| s.clone())
    }

    /// Snapshot the indices of all registered comtrees. Taken under the directory lock,
    /// so the snapshot never observes a mapping in flux; comtrees added or removed after
    /// the call are not reflected.
    pub fn indices(&self) -> Vec<ComtIndex> {
        let dir = self.dir.lock();
        (0..dir.slots.len()).filter(|cx| dir.slots[*cx].is_some()).collect()
    }

    /// The number of registered comtrees
    pub fn len(&self) -> usize {
        self.dir.lock().index_of.len()
    }

    /// Returns true if and only if no comtree is registered.
    pub fn is_empty(&self) -> bool {
        self.dir.lock().index_of.is_empty()
    }
}
