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

//! The occupancy map used for memory placement: one bitmap per chip segment
//! with one bit per 4-byte slot.

use crate::error::Error;
use crate::math;

const SLOT: u64 = 4;

pub(crate) struct BitVec {
    bits: usize,
    words: Vec<usize>,
}

fn word_bits() -> usize {
    std::mem::size_of::<usize>() * 8
}

fn idx(bit: usize) -> usize {
    bit / word_bits()
}

fn bitpos(bit: usize) -> usize {
    1 << (bit % word_bits())
}

impl BitVec {
    pub fn new(bits: usize) -> Self {
        let word_count = (bits + word_bits() - 1) / word_bits();
        BitVec {
            bits,
            words: vec![0; word_count],
        }
    }

    pub fn size(&self) -> usize {
        self.bits
    }

    pub fn is_set(&self, bit: usize) -> bool {
        self.words[idx(bit)] & bitpos(bit) != 0
    }

    pub fn set(&mut self, bit: usize) {
        self.words[idx(bit)] |= bitpos(bit);
    }

    pub fn range_clear(&self, start: usize, count: usize) -> bool {
        (start..start + count).all(|b| !self.is_set(b))
    }

    pub fn set_range(&mut self, start: usize, count: usize) {
        for b in start..start + count {
            self.set(b);
        }
    }
}

struct MapSeg {
    start: u64,
    size: u64,
    bitmap: BitVec,
}

impl MapSeg {
    fn end(&self) -> u64 {
        self.start + self.size
    }
}

/// The occupancy map of all chip segments of one memory kind
pub struct MemMap {
    segs: Vec<MapSeg>,
}

impl MemMap {
    /// Creates the map from the `(start, size)` pairs of the chip segments
    pub fn new(mut chip_segs: Vec<(u64, u64)>) -> Self {
        chip_segs.sort_by_key(|&(start, _)| start);
        let segs = chip_segs
            .into_iter()
            .map(|(start, size)| MapSeg {
                start,
                size,
                bitmap: BitVec::new(((size + SLOT - 1) / SLOT) as usize),
            })
            .collect();
        MemMap { segs }
    }

    /// Marks the fixed range `[start, start + size)` as occupied. The range
    /// has to lie completely within one chip segment and must not overlap
    /// anything marked before.
    pub fn populate(&mut self, start: u64, size: u64) -> Result<(), Error> {
        if size == 0 {
            return Ok(());
        }
        let seg = self
            .segs
            .iter_mut()
            .find(|s| start >= s.start && start < s.end());
        let seg = match seg {
            Some(s) if start + size <= s.end() => s,
            _ => {
                return Err(Error::Placement(format!(
                    "invalid address designated: {:#x}..{:#x}",
                    start,
                    start + size
                )))
            },
        };

        let first = ((start - seg.start) / SLOT) as usize;
        let count = ((start - seg.start + size + SLOT - 1) / SLOT) as usize - first;
        if !seg.bitmap.range_clear(first, count) {
            return Err(Error::Placement(format!(
                "invalid address designated: {:#x}..{:#x} overlaps an \
                 already-placed range",
                start,
                start + size
            )));
        }
        seg.bitmap.set_range(first, count);
        Ok(())
    }

    /// Finds the lowest free aligned spot for `size` bytes, marks it, and
    /// returns its address. Chip segments are scanned in address order and
    /// exact fits at a segment's end are accepted.
    pub fn fit(&mut self, size: u64, align: u64) -> Option<u64> {
        for seg in &mut self.segs {
            if size > seg.size {
                continue;
            }

            let mut addr = math::round_up(seg.start, align);
            while addr + size <= seg.end() {
                let first = ((addr - seg.start) / SLOT) as usize;
                let count = ((size + SLOT - 1) / SLOT) as usize;
                if seg.bitmap.range_clear(first, count) {
                    seg.bitmap.set_range(first, count);
                    return Some(addr);
                }
                addr += align;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitvec_ranges() {
        let mut b = BitVec::new(128);
        assert_eq!(b.size(), 128);
        assert!(b.range_clear(0, 128));
        b.set_range(10, 20);
        assert!(b.is_set(10));
        assert!(b.is_set(29));
        assert!(!b.is_set(30));
        assert!(!b.range_clear(29, 2));
        assert!(b.range_clear(30, 98));
    }

    #[test]
    fn populate_rejects_outside() {
        let mut map = MemMap::new(vec![(0x0800_0000, 0x1_0000)]);
        assert!(map.populate(0x0800_0000, 0x1000).is_ok());
        assert!(map.populate(0x0900_0000, 0x1000).is_err());
        assert!(map.populate(0x0800_ff00, 0x1000).is_err());
    }

    #[test]
    fn populate_rejects_overlap() {
        let mut map = MemMap::new(vec![(0x0800_0000, 0x1_0000)]);
        assert!(map.populate(0x0800_0000, 0x1000).is_ok());
        assert!(map.populate(0x0800_0ffc, 0x1000).is_err());
        assert!(map.populate(0x0800_1000, 0x1000).is_ok());
    }

    #[test]
    fn fit_first_free() {
        let mut map = MemMap::new(vec![(0x0800_0000, 0x1_0000)]);
        map.populate(0x0800_0000, 0x8000).unwrap();
        assert_eq!(map.fit(0x1000, 0x200), Some(0x0800_8000));
        assert_eq!(map.fit(0x1000, 0x200), Some(0x0800_9000));
    }

    #[test]
    fn fit_exact_fill() {
        let mut map = MemMap::new(vec![(0x2000_0000, 0x8000)]);
        assert_eq!(map.fit(0x8000, 0x1000), Some(0x2000_0000));
        assert_eq!(map.fit(4, 4), None);
    }
}
