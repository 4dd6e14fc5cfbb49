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

//! The architecture seam. Everything chip-family specific sits behind
//! [`ArchBackend`]: the per-segment alignment rules and the page-table
//! synthesizer. Adding another family means adding another implementation
//! here.

pub mod armv7m;

use std::path::{Path, PathBuf};

use crate::config::MemSegment;
use crate::error::Error;
use crate::parse::MemAttr;

/// A contiguous, attributed address range fed to the page-table synthesizer
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Span {
    pub start: u64,
    pub end: u64,
    pub attr: MemAttr,
}

impl Span {
    pub fn new(start: u64, end: u64, attr: MemAttr) -> Self {
        Span { start, end, attr }
    }
}

/// One node of a process's region tree: a naturally aligned power-of-two box
/// split into `2^num_order` subregions of `2^size_order` bytes each
#[derive(Debug)]
pub struct RegionNode {
    pub base: u64,
    pub size_order: u32,
    pub num_order: u32,
    pub subs: Vec<SubRegion>,
}

#[derive(Debug)]
pub enum SubRegion {
    /// Disabled; nothing mapped here
    Empty,
    /// Mapped with one attribute set
    Page(MemAttr),
    /// Refined by a child node
    Table(RegionNode),
}

impl RegionNode {
    pub fn total_order(&self) -> u32 {
        self.size_order + self.num_order
    }

    pub fn end(&self) -> u64 {
        self.base + (1u64 << self.total_order())
    }

    /// The number of nodes in this tree, which is the number of MPU regions
    /// the kernel will multiplex
    pub fn regions(&self) -> u64 {
        1 + self
            .subs
            .iter()
            .map(|s| match s {
                SubRegion::Table(t) => t.regions(),
                _ => 0,
            })
            .sum::<u64>()
    }

    /// Returns the attribute this tree maps at `addr`, if any
    pub fn attr_at(&self, addr: u64) -> Option<MemAttr> {
        if addr < self.base || addr >= self.end() {
            return None;
        }
        let idx = ((addr - self.base) >> self.size_order) as usize;
        match &self.subs[idx] {
            SubRegion::Empty => None,
            SubRegion::Page(attr) => Some(*attr),
            SubRegion::Table(t) => t.attr_at(addr),
        }
    }
}

/// The two injected callbacks plus the constants the generic pipeline needs
/// from the chip family
pub trait ArchBackend {
    /// The platform tag this backend serves, e.g. `A7M`
    fn name(&self) -> &'static str;

    /// Applies the family's alignment rules to one declared segment:
    /// validates fixed segments and computes `align` and the rounded size
    /// for `Auto` ones. `proc` names the owning process for error messages.
    fn align_seg(&self, seg: &mut MemSegment, proc: &str) -> Result<(), Error>;

    /// Builds the region tree covering `spans`, which are sorted by start
    /// address and pairwise disjoint
    fn pgtbl(&self, spans: &[Span], proc: &str) -> Result<RegionNode, Error>;

    /// The global capability ID of the first kernel-created vector endpoint
    fn vect_cap_base(&self) -> u64;

    /// The location of a chip description below the RME source root
    fn chip_xml(&self, rme_root: &Path, chip_class: &str) -> PathBuf {
        rme_root
            .join("MEukaron/Include/Platform")
            .join(self.name())
            .join("Chips")
            .join(chip_class)
            .join(format!("rme_platform_{}.xml", chip_class))
    }
}

/// Selects the backend for the project's platform tag
pub fn backend_for(plat: &str) -> Result<Box<dyn ArchBackend>, Error> {
    match plat {
        "A7M" => Ok(Box::new(armv7m::Armv7M)),
        _ => Err(Error::Semantic(format!(
            "platform '{}' is not supported",
            plat
        ))),
    }
}
