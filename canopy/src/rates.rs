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

//! # Rate Specifications
//!
//! A [`RateSpec`] is the directional bandwidth descriptor used everywhere capacity or
//! demand is represented: four signed fields, a bit rate and a packet rate for each of the
//! two directions of a link. The "up" direction of a rate attached to a physical link runs
//! from the left to the right endpoint; the "up" direction of a rate attached to a comtree
//! edge runs from the child towards the parent. [`RateSpec::flip`] translates between the
//! two perspectives.
//!
//! The type comes in two flavors at every call site: the in-place operations (`add`,
//! `subtract`, `flip`, ...) mutate the receiver and are meant for accumulators, while the
//! pure counterparts (`plus`, `minus`, `flipped`, ...) return a fresh value and never
//! alias their input.

use std::fmt;

/// A 4-tuple bandwidth descriptor: bit rate up/down (in kb/s) and packet rate up/down
/// (in packets/s). All operations are total; fields may go negative in intermediate
/// results (rate deltas are themselves rate specs).
#[derive(PartialEq, Eq, Debug, Default, Clone, Copy)]
pub struct RateSpec {
    /// Bit rate in the up direction (kb/s)
    pub bit_rate_up: i32,
    /// Bit rate in the down direction (kb/s)
    pub bit_rate_down: i32,
    /// Packet rate in the up direction (packets/s)
    pub pkt_rate_up: i32,
    /// Packet rate in the down direction (packets/s)
    pub pkt_rate_down: i32,
}

impl RateSpec {
    /// Build a rate spec from its four fields, in the order bit rate up, bit rate down,
    /// packet rate up, packet rate down.
    pub fn new(bit_rate_up: i32, bit_rate_down: i32, pkt_rate_up: i32, pkt_rate_down: i32) -> Self {
        Self { bit_rate_up, bit_rate_down, pkt_rate_up, pkt_rate_down }
    }

    /// The all-zero rate spec.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Add another rate spec, field by field, in place.
    pub fn add(&mut self, other: &RateSpec) {
        self.bit_rate_up += other.bit_rate_up;
        self.bit_rate_down += other.bit_rate_down;
        self.pkt_rate_up += other.pkt_rate_up;
        self.pkt_rate_down += other.pkt_rate_down;
    }

    /// Subtract another rate spec, field by field, in place.
    pub fn subtract(&mut self, other: &RateSpec) {
        self.bit_rate_up -= other.bit_rate_up;
        self.bit_rate_down -= other.bit_rate_down;
        self.pkt_rate_up -= other.pkt_rate_up;
        self.pkt_rate_down -= other.pkt_rate_down;
    }

    /// Swap the up/down pair within the bit rate and within the packet rate, in place.
    /// Used whenever a rate must be expressed from the other endpoint's perspective.
    pub fn flip(&mut self) {
        std::mem::swap(&mut self.bit_rate_up, &mut self.bit_rate_down);
        std::mem::swap(&mut self.pkt_rate_up, &mut self.pkt_rate_down);
    }

    /// Scale all four fields by the given factor, in place, truncating towards zero.
    pub fn scale(&mut self, factor: f64) {
        self.bit_rate_up = (self.bit_rate_up as f64 * factor) as i32;
        self.bit_rate_down = (self.bit_rate_down as f64 * factor) as i32;
        self.pkt_rate_up = (self.pkt_rate_up as f64 * factor) as i32;
        self.pkt_rate_down = (self.pkt_rate_down as f64 * factor) as i32;
    }

    /// Negate all four fields in place.
    pub fn negate(&mut self) {
        self.bit_rate_up = -self.bit_rate_up;
        self.bit_rate_down = -self.bit_rate_down;
        self.pkt_rate_up = -self.pkt_rate_up;
        self.pkt_rate_down = -self.pkt_rate_down;
    }

    /// Returns true if and only if all four fields are zero.
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    /// Pointwise comparison: true if and only if every field of `self` is less than or
    /// equal to the corresponding field of `other`.
    pub fn leq(&self, other: &RateSpec) -> bool {
        self.bit_rate_up <= other.bit_rate_up
            && self.bit_rate_down <= other.bit_rate_down
            && self.pkt_rate_up <= other.pkt_rate_up
            && self.pkt_rate_down <= other.pkt_rate_down
    }

    /// Pure variant of [`RateSpec::add`]: the pointwise sum as a new value.
    pub fn plus(mut self, other: &RateSpec) -> Self {
        self.add(other);
        self
    }

    /// Pure variant of [`RateSpec::subtract`]: the pointwise difference as a new value.
    pub fn minus(mut self, other: &RateSpec) -> Self {
        self.subtract(other);
        self
    }

    /// Pure variant of [`RateSpec::flip`]: the same rate seen from the other endpoint.
    pub fn flipped(mut self) -> Self {
        self.flip();
        self
    }

    /// Pure variant of [`RateSpec::negate`].
    pub fn negated(mut self) -> Self {
        self.negate();
        self
    }

    /// The pointwise minimum of two rate specs.
    pub fn min(&self, other: &RateSpec) -> Self {
        Self {
            bit_rate_up: self.bit_rate_up.min(other.bit_rate_up),
            bit_rate_down: self.bit_rate_down.min(other.bit_rate_down),
            pkt_rate_up: self.pkt_rate_up.min(other.pkt_rate_up),
            pkt_rate_down: self.pkt_rate_down.min(other.pkt_rate_down),
        }
    }
}

impl fmt::Display for RateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{},{},{})",
            self.bit_rate_up, self.bit_rate_down, self.pkt_rate_up, self.pkt_rate_down
        )
    }
}
