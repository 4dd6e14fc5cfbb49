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

//! mcugen consumes a project description and a chip description and emits a
//! complete, buildable project tree for an RME-based system: the memory
//! layout, the per-process memory protection trees, the capability IDs, and
//! the boot scripts that create and delegate every kernel object.
//!
//! The pipeline is strictly linear: command line, ingestion, validation,
//! alignment, placement, page-table synthesis, capability allocation,
//! emission. Every stage fails the whole run on the first violation.

#[macro_use]
extern crate bitflags;

pub mod arch;
pub mod caps;
pub mod config;
pub mod error;
pub mod gen;
pub mod math;
pub mod mem;
pub mod parse;
pub mod xml;

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::arch::Span;
use crate::error::Error;
use crate::gen::OutFormat;

/// The five command-line inputs of one generator run
pub struct Run {
    pub input: PathBuf,
    pub output: PathBuf,
    pub rme_root: PathBuf,
    pub rvm_root: PathBuf,
    pub format: OutFormat,
}

fn dir_empty(path: &Path) -> Result<bool, Error> {
    Ok(fs::read_dir(path)
        .map_err(|e| Error::CmdLine(format!("cannot read {}: {}", path.display(), e)))?
        .next()
        .is_none())
}

fn check_paths(run: &Run) -> Result<(), Error> {
    if !run.input.is_file() {
        return Err(Error::CmdLine(format!(
            "input file {} is not present",
            run.input.display()
        )));
    }
    if !run.output.is_dir() {
        return Err(Error::CmdLine(format!(
            "output path {} is not present",
            run.output.display()
        )));
    }
    if !dir_empty(&run.output)? {
        return Err(Error::CmdLine(format!(
            "output path {} is not empty",
            run.output.display()
        )));
    }
    for (root, what) in [(&run.rme_root, "RME"), (&run.rvm_root, "RVM")] {
        if !root.is_dir() {
            return Err(Error::CmdLine(format!(
                "{} root path {} is not present",
                what,
                root.display()
            )));
        }
        if dir_empty(root)? {
            return Err(Error::CmdLine(format!(
                "{} root path {} is empty, wrong path selected",
                what,
                root.display()
            )));
        }
    }
    Ok(())
}

fn read_to_string(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path)
        .map_err(|e| Error::XmlSyntax(format!("cannot read {}: {}", path.display(), e)))
}

/// Runs the whole pipeline once, end to end
pub fn generate(run: &Run) -> Result<(), Error> {
    check_paths(run)?;

    let proj_xml = xml::XmlNode::parse(&read_to_string(&run.input)?)?;
    let mut proj = config::project::parse(&proj_xml)?;
    info!("parsed project '{}' for platform {}", proj.name(), proj.plat());

    let backend = arch::backend_for(proj.plat())?;

    let chip_path = backend.chip_xml(&run.rme_root, proj.chip_class());
    let chip_xml = xml::XmlNode::parse(&read_to_string(&chip_path)?)?;
    let chip = config::chip::parse(&chip_xml)?;
    info!("parsed chip class '{}' of vendor {}", chip.class(), chip.vendor());

    config::validator::validate(&mut proj, &chip)?;

    mem::align(&mut proj, backend.as_ref())?;
    mem::place(&mut proj, &chip)?;

    // one region tree per process, over all of its placed segments
    let mut pgtbls = Vec::new();
    for p in proj.procs() {
        let mut spans: Vec<Span> = p
            .mems()
            .iter()
            .map(|m| Span::new(m.addr(), m.end(), m.attr()))
            .collect();
        spans.sort_by_key(|s| s.start);
        let tree = backend.pgtbl(&spans, p.name())?;
        if tree.regions() > chip.regions() {
            warn!(
                "process '{}' needs {} regions, chip has {}; the kernel will \
                 swap regions at runtime",
                p.name(),
                tree.regions(),
                chip.regions()
            );
        }
        pgtbls.push(tree);
    }

    let caps = caps::allocate(&mut proj, backend.vect_cap_base())?;

    let ctx = gen::GenCtx {
        proj: &proj,
        chip: &chip,
        pgtbls: &pgtbls,
        caps: &caps,
        rme_root: &run.rme_root,
        rvm_root: &run.rvm_root,
        out: &run.output,
        format: run.format,
    };
    gen::emit(&ctx)
}
