/*
 * Copyright (C) 2023-2024 Nils Asmussen, Barkhausen Institut
 *
 * This file is part of mcugen, the project generator for RME-based
 * microcontroller systems.
 *
 * mcugen is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License version 2 as
 * published by the Free Software Foundation.
 *
 * mcugen is distributed in the hope that it will be useful, but
 * WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU
 * General Public License version 2 for more details.
 */

//! Contains math functions

use num_traits::PrimInt;

/// Rounds the given value up to the given alignment
///
/// # Examples
///
/// ```
/// assert_eq!(mcugen::math::round_up(0x123, 0x1000), 0x1000);
/// ```
pub fn round_up<T: PrimInt>(value: T, align: T) -> T {
    (value + align - T::one()) & !(align - T::one())
}

/// Rounds the given value down to the given alignment
///
/// # Examples
///
/// ```
/// assert_eq!(mcugen::math::round_dn(0x123, 0x1000), 0x0);
/// ```
pub fn round_dn<T: PrimInt>(value: T, align: T) -> T {
    value & !(align - T::one())
}

/// Returns true if `addr` is aligned to `align`
pub fn is_aligned<T: PrimInt>(addr: T, align: T) -> bool {
    (addr & (align - T::one())) == T::zero()
}

/// Returns the order of the smallest power of 2 that is not smaller than
/// `size`
///
/// # Examples
///
/// ```
/// assert_eq!(mcugen::math::next_log2(4), 2);
/// assert_eq!(mcugen::math::next_log2(5), 3);
/// ```
pub fn next_log2(size: u64) -> u32 {
    let mut order = 0;
    while (1u64 << order) < size {
        order += 1;
    }
    order
}

/// Returns the smallest power of 2 that is not smaller than `size`
pub fn next_pow2(size: u64) -> u64 {
    1u64 << next_log2(size)
}

/// Assuming that `startx` < `endx` and `endx` is not included (that means with
/// start=0 and end=10 0 .. 9 is used), the function determines whether the two
/// ranges overlap anywhere.
pub fn overlaps<T: Ord>(start1: T, end1: T, start2: T, end2: T) -> bool {
    (start1 >= start2 && start1 < end2) // start in range
    || (end1 > start2 && end1 <= end2)  // end in range
    || (start1 < start2 && end1 > end2) // complete overlapped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pow2() {
        assert_eq!(next_log2(1), 0);
        assert_eq!(next_log2(2), 1);
        assert_eq!(next_log2(0x1000), 12);
        assert_eq!(next_log2(0x1001), 13);
        assert_eq!(next_pow2(0x1300), 0x2000);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_up(0x20u64, 0x20), 0x20);
        assert_eq!(round_up(0x21u64, 0x20), 0x40);
        assert_eq!(round_dn(0x3fu64, 0x20), 0x20);
        assert!(is_aligned(0x0800_0000u64, 0x20));
        assert!(!is_aligned(0x0800_0010u64, 0x20));
    }

    #[test]
    fn range_overlap() {
        assert!(overlaps(0, 10, 5, 15));
        assert!(overlaps(5, 15, 0, 10));
        assert!(overlaps(0, 10, 2, 8));
        assert!(!overlaps(0, 10, 10, 20));
    }
}
