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

//! The ARMv7-M (A7M) backend. The MPU of this family allows only
//! power-of-two regions aligned to their own size, each split into eight
//! subregions that can be individually disabled; the synthesizer below covers
//! every process segment with a tree of such regions.

use log::debug;

use crate::arch::{ArchBackend, RegionNode, Span, SubRegion};
use crate::config::MemSegment;
use crate::error::Error;
use crate::math;

/// MPU regions are at least 32 bytes
const MIN_REGION_ORDER: u32 = 5;
/// A node covers at least 256 bytes so that all eight subregions exist
const MIN_TOTAL_ORDER: u32 = 8;
/// The root box may cover the whole 32-bit address space
const MAX_TOTAL_ORDER: u32 = 32;

/// Global capability IDs of kernel-created vector endpoints start here
const VECT_CAP_BASE: u64 = 0x100;

pub struct Armv7M;

impl ArchBackend for Armv7M {
    fn name(&self) -> &'static str {
        "A7M"
    }

    fn align_seg(&self, seg: &mut MemSegment, proc: &str) -> Result<(), Error> {
        match seg.start() {
            Some(start) => {
                // fixed segments have to obey the 32-byte granularity as
                // declared; we never adjust them
                if !math::is_aligned(start, 32) || !math::is_aligned(seg.size(), 32) {
                    return Err(Error::Placement(format!(
                        "the {} segment at {:#x} of process '{}' is not \
                         32-byte aligned in start and size",
                        seg.kind(),
                        start,
                        proc
                    )));
                }
                seg.align = 32;
            },
            None => {
                let pow = math::next_pow2(seg.size()).max(1 << MIN_REGION_ORDER);
                seg.align = pow / 8;
                let rounded = math::round_dn(seg.size(), seg.align);
                if rounded == 0 {
                    return Err(Error::Placement(format!(
                        "the {} segment of process '{}' is too small to \
                         cover a subregion",
                        seg.kind(),
                        proc
                    )));
                }
                seg.size = rounded;
            },
        }
        Ok(())
    }

    fn pgtbl(&self, spans: &[Span], proc: &str) -> Result<RegionNode, Error> {
        let node = synth(spans, MAX_TOTAL_ORDER, proc)?;
        debug!(
            "process '{}': region tree base {:#x}, {} regions",
            proc,
            node.base,
            node.regions()
        );
        Ok(node)
    }

    fn vect_cap_base(&self) -> u64 {
        VECT_CAP_BASE
    }
}

/// Recursively covers `spans` with one region node, refining subregions that
/// no single segment covers exactly
fn synth(spans: &[Span], max_total_order: u32, proc: &str) -> Result<RegionNode, Error> {
    assert!(!spans.is_empty());
    let start = spans.iter().map(|s| s.start).min().unwrap();
    let end = spans.iter().map(|s| s.end).max().unwrap();

    let total_order = match fit_order(start, end, max_total_order) {
        Some(t) => t,
        None => {
            return Err(Error::Placement(format!(
                "the region box for {:#x}..{:#x} of process '{}' exceeds \
                 the allowed order {}",
                start, end, proc, max_total_order
            )))
        },
    };
    let base = (start >> total_order) << total_order;

    // a uniformly attributed, subregion-granular set maps as one region
    let gran = 1u64 << (total_order - 3);
    let uniform = spans.iter().all(|s| s.attr == spans[0].attr);
    if uniform
        && spans
            .iter()
            .all(|s| math::is_aligned(s.start, gran) && math::is_aligned(s.end - s.start, gran))
    {
        let subs = (0..8)
            .map(|i| {
                let sub_start = base + i * gran;
                let covered = spans
                    .iter()
                    .any(|s| s.start <= sub_start && s.end >= sub_start + gran);
                if covered {
                    SubRegion::Page(spans[0].attr)
                }
                else {
                    SubRegion::Empty
                }
            })
            .collect();
        return Ok(RegionNode {
            base,
            size_order: total_order - 3,
            num_order: 3,
            subs,
        });
    }

    // prefer the finest split under which every segment stays whole; if all
    // splits cut some segment, take the coarsest and recurse
    let num_order = (1..=3u32)
        .rev()
        .find(|&n| {
            let sub = 1u64 << (total_order - n);
            spans
                .iter()
                .all(|s| math::round_dn(s.start, sub) + sub >= s.end)
        })
        .unwrap_or(1);

    let size_order = total_order - num_order;
    let sub_size = 1u64 << size_order;

    let mut subs = Vec::new();
    for i in 0..(1u64 << num_order) {
        let sub_start = base + i * sub_size;
        let sub_end = sub_start + sub_size;

        let inter: Vec<Span> = spans
            .iter()
            .filter(|s| s.start < sub_end && s.end > sub_start)
            .map(|s| Span::new(s.start.max(sub_start), s.end.min(sub_end), s.attr))
            .collect();

        if inter.is_empty() {
            subs.push(SubRegion::Empty);
        }
        else if inter.len() == 1 && inter[0].start == sub_start && inter[0].end == sub_end {
            subs.push(SubRegion::Page(inter[0].attr));
        }
        else {
            if size_order < MIN_TOTAL_ORDER {
                return Err(Error::Placement(format!(
                    "cannot refine the {:#x}..{:#x} subregion of process \
                     '{}' below the minimum region size",
                    sub_start, sub_end, proc
                )));
            }
            subs.push(SubRegion::Table(synth(&inter, size_order, proc)?));
        }
    }

    Ok(RegionNode {
        base,
        size_order,
        num_order,
        subs,
    })
}

/// The smallest order whose naturally aligned box around `start` still
/// contains `end`
fn fit_order(start: u64, end: u64, max_total_order: u32) -> Option<u32> {
    let mut order = MIN_TOTAL_ORDER.max(math::next_log2(end - start));
    while order <= max_total_order {
        let base = (start >> order) << order;
        if base + (1u64 << order) >= end {
            return Some(order);
        }
        order += 1;
    }
    None
}
