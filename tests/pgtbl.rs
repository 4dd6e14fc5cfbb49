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

mod common;

use mcugen::arch::{backend_for, RegionNode, Span, SubRegion};
use mcugen::parse::MemAttr;

fn rx() -> MemAttr {
    MemAttr::R | MemAttr::X
}

fn rws() -> MemAttr {
    MemAttr::R | MemAttr::W | MemAttr::S
}

fn synth(spans: &[Span]) -> RegionNode {
    backend_for("A7M")
        .unwrap()
        .pgtbl(spans, "test")
        .expect("synthesis failed")
}

/// Every byte of every span carries exactly the declared attributes
fn check_coverage(node: &RegionNode, spans: &[Span]) {
    for s in spans {
        let mut addr = s.start;
        while addr < s.end {
            assert_eq!(
                node.attr_at(addr),
                Some(s.attr),
                "wrong attributes at {:#x}",
                addr
            );
            addr += 32;
        }
    }
}

#[test]
fn single_region() {
    let spans = [Span::new(0x0801_0000, 0x0801_1000, rx())];
    let node = synth(&spans);
    assert_eq!(node.base, 0x0801_0000);
    assert_eq!(node.num_order, 3);
    assert_eq!(node.size_order, 9);
    assert_eq!(node.regions(), 1);
    check_coverage(&node, &spans);
    assert_eq!(node.attr_at(0x0800_ffff), None);
    assert_eq!(node.attr_at(0x0801_1000), None);
}

#[test]
fn straddle_picks_coarser_split() {
    // two 1 KiB segments of different attributes at offsets 0x0 and 0xc00 of
    // a 4 KiB box: eight 512-byte subregions would cut both segments, four
    // 1 KiB ones keep them whole
    let spans = [
        Span::new(0x0801_0000, 0x0801_0400, rx()),
        Span::new(0x0801_0c00, 0x0801_1000, rws()),
    ];
    let node = synth(&spans);
    assert_eq!(node.num_order, 2);
    assert_eq!(node.size_order, 10);
    assert_eq!(node.regions(), 1);
    assert!(matches!(node.subs[0], SubRegion::Page(a) if a == rx()));
    assert!(matches!(node.subs[1], SubRegion::Empty));
    assert!(matches!(node.subs[2], SubRegion::Empty));
    assert!(matches!(node.subs[3], SubRegion::Page(a) if a == rws()));
    check_coverage(&node, &spans);
}

#[test]
fn recursion_into_subregions() {
    // code and data sit far apart; the root box spans both and recurses
    // into one child per populated subregion
    let spans = [
        Span::new(0x0801_0000, 0x0801_1000, rx()),
        Span::new(0x2000_0400, 0x2000_0800, rws()),
    ];
    let node = synth(&spans);
    assert!(node.regions() >= 3);
    check_coverage(&node, &spans);
    assert_eq!(node.attr_at(0x0801_1000), None);
    assert_eq!(node.attr_at(0x2000_0000), None);
}

#[test]
fn uniform_but_sparse() {
    // same attributes, subregion-granular: one region with disabled holes
    let spans = [
        Span::new(0x0801_0000, 0x0801_0400, rx()),
        Span::new(0x0801_0c00, 0x0801_1000, rx()),
    ];
    let node = synth(&spans);
    assert_eq!(node.num_order, 3);
    assert_eq!(node.regions(), 1);
    check_coverage(&node, &spans);
    // the hole in the middle is unmapped
    assert_eq!(node.attr_at(0x0801_0800), None);
}

#[test]
fn mixed_attrs_fine_grained() {
    // 32-byte granular segments with different attributes force recursion
    // down to the minimum region size
    let spans = [
        Span::new(0x2000_0000, 0x2000_0100, rws()),
        Span::new(0x2000_0100, 0x2000_0200, rx()),
    ];
    let node = synth(&spans);
    check_coverage(&node, &spans);
}

#[test]
fn min_region_split() {
    // 32-byte segments of different attributes still map: a 256-byte region
    // with one 32-byte subregion each
    let spans = [
        Span::new(0x2000_0000, 0x2000_0020, rws()),
        Span::new(0x2000_0020, 0x2000_0040, rx()),
    ];
    let node = synth(&spans);
    assert_eq!(node.num_order, 3);
    assert_eq!(node.size_order, 5);
    check_coverage(&node, &spans);
}

#[test]
fn depth_is_bounded() {
    // differing attributes below the 32-byte subregion granularity cannot be
    // expressed and must be rejected, not looped on
    let spans = [
        Span::new(0x2000_0000, 0x2000_0010, rws()),
        Span::new(0x2000_0010, 0x2000_0020, rx()),
    ];
    let err = backend_for("A7M").unwrap().pgtbl(&spans, "test").unwrap_err();
    assert!(err.is_placement());
}

#[test]
fn whole_process_tree() {
    // the end-to-end shape: placed code, data, and a device window
    let spans = [
        Span::new(0x0801_0000, 0x0801_1000, rx()),
        Span::new(0x2000_0400, 0x2000_0800, rws()),
        Span::new(0x4000_0000, 0x4000_1000, MemAttr::R | MemAttr::W),
    ];
    let node = synth(&spans);
    check_coverage(&node, &spans);
}
