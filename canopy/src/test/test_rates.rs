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

//! Test the rate spec algebra.

use crate::rates::RateSpec;

#[test]
fn test_add_subtract_roundtrip() {
    let samples = vec![
        RateSpec::zero(),
        RateSpec::new(1, 2, 3, 4),
        RateSpec::new(-10, 20, -30, 40),
        RateSpec::new(1000, 1000, 500, 500),
    ];
    for a in samples.iter() {
        for b in samples.iter() {
            assert_eq!(a.plus(b).minus(b), *a);
            let mut acc = *a;
            acc.add(b);
            acc.subtract(b);
            assert_eq!(acc, *a);
        }
    }
}

#[test]
fn test_flip_involution() {
    let a = RateSpec::new(1, 2, 3, 4);
    assert_eq!(a.flipped(), RateSpec::new(2, 1, 4, 3));
    assert_eq!(a.flipped().flipped(), a);

    let mut b = a;
    b.flip();
    assert_eq!(b, RateSpec::new(2, 1, 4, 3));
    b.flip();
    assert_eq!(b, a);
}

#[test]
fn test_leq() {
    let a = RateSpec::new(100, 200, 50, 60);
    assert!(a.leq(&a));
    assert!(a.leq(&RateSpec::new(100, 201, 50, 60)));
    assert!(!a.leq(&RateSpec::new(99, 200, 50, 60)));
    assert!(!a.leq(&RateSpec::new(100, 200, 50, 59)));

    // a + b <= c if and only if the pointwise sums stay below c
    let b = RateSpec::new(10, 10, 10, 10);
    let c = RateSpec::new(110, 210, 60, 70);
    assert!(a.plus(&b).leq(&c));
    assert!(!a.plus(&b).leq(&RateSpec::new(109, 210, 60, 70)));
}

#[test]
fn test_negate_and_zero() {
    let a = RateSpec::new(1, -2, 3, -4);
    assert_eq!(a.negated(), RateSpec::new(-1, 2, -3, 4));
    assert_eq!(a.plus(&a.negated()), RateSpec::zero());
    assert!(RateSpec::zero().is_zero());
    assert!(!a.is_zero());

    let mut b = a;
    b.negate();
    assert_eq!(b, a.negated());
}

#[test]
fn test_scale() {
    let mut a = RateSpec::new(100, 200, 50, 60);
    a.scale(1.5);
    assert_eq!(a, RateSpec::new(150, 300, 75, 90));
    a.scale(0.0);
    assert_eq!(a, RateSpec::zero());
}

#[test]
fn test_min() {
    let a = RateSpec::new(100, 200, 50, 60);
    let b = RateSpec::new(150, 150, 40, 70);
    assert_eq!(a.min(&b), RateSpec::new(100, 150, 40, 60));
    assert_eq!(a.min(&a), a);
}

#[test]
fn test_display() {
    assert_eq!(RateSpec::new(1000, 1000, 500, 500).to_string(), "(1000,1000,500,500)");
    assert_eq!(RateSpec::new(-1, 0, 2, -3).to_string(), "(-1,0,2,-3)");
}
