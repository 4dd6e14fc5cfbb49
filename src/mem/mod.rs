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

//! Memory alignment and placement: every declared process segment gets its
//! architecture alignment applied, fixed segments are marked in the chip's
//! occupancy maps, and `Auto` segments are fitted smallest-first.

pub mod map;

use log::{debug, info};

use crate::arch::ArchBackend;
use crate::config::{Chip, MemKind, Project};
use crate::error::Error;
use crate::math;
use crate::mem::map::MemMap;

/// Applies the architecture's alignment rules to every process segment
pub fn align(proj: &mut Project, backend: &dyn ArchBackend) -> Result<(), Error> {
    for p in &mut proj.procs {
        for m in &mut p.mems {
            backend.align_seg(m, &p.name)?;
        }
    }
    Ok(())
}

/// Places all code and data segments and resolves `Auto` stacks
pub fn place(proj: &mut Project, chip: &Chip) -> Result<(), Error> {
    place_kind(proj, chip, MemKind::Code)?;
    place_kind(proj, chip, MemKind::Data)?;
    resolve_stacks(proj)
}

fn place_kind(proj: &mut Project, chip: &Chip, kind: MemKind) -> Result<(), Error> {
    let mut map = MemMap::new(
        chip.mems_of(kind)
            .map(|m| (m.addr(), m.size()))
            .collect(),
    );

    // the kernel's section comes first, the user runtime's right behind it
    let (rme_start, rme_size, rvm_size) = match kind {
        MemKind::Code => (proj.rme.code_start, proj.rme.code_size, proj.rvm.code_size),
        _ => (proj.rme.data_start, proj.rme.data_size, proj.rvm.data_size),
    };
    map.populate(rme_start, rme_size)?;
    map.populate(rme_start + rme_size, rvm_size)?;

    for p in &proj.procs {
        for m in p.mems_of(kind) {
            if let Some(start) = m.start() {
                map.populate(start, m.size())?;
            }
        }
    }

    // fit the auto segments smallest-first, leaving the larger holes for the
    // more constrained allocations
    let mut autos = Vec::new();
    for (pi, p) in proj.procs.iter().enumerate() {
        for (mi, m) in p.mems.iter().enumerate() {
            if m.kind() == kind && m.start().is_none() {
                autos.push((pi, mi, m.size(), m.align()));
            }
        }
    }
    autos.sort_by_key(|&(_, _, size, _)| size);

    for (pi, mi, size, align) in autos {
        match map.fit(size, align) {
            Some(addr) => {
                debug!(
                    "placed {} segment of process '{}' at {:#x}..{:#x}",
                    kind,
                    proj.procs[pi].name(),
                    addr,
                    addr + size
                );
                proj.procs[pi].mems[mi].start = Some(addr);
            },
            None => {
                return Err(Error::Placement(format!(
                    "no fit for the {:#x} byte {} segment of process '{}'",
                    size,
                    kind,
                    proj.procs[pi].name()
                )))
            },
        }
    }

    info!("placed all {} segments", kind);
    Ok(())
}

/// Carves `Auto` thread and invocation stacks out of the top of each
/// process's first data segment, downwards in declaration order
fn resolve_stacks(proj: &mut Project) -> Result<(), Error> {
    for p in &mut proj.procs {
        let (base, mut top) = {
            let data = p
                .mems
                .iter()
                .find(|m| m.kind == MemKind::Data)
                .expect("validated process without data segment");
            (data.addr(), data.end())
        };

        let pname = p.name.clone();
        let mut carve = |name: &str, size: u64| -> Result<u64, Error> {
            if size > top || math::round_dn(top - size, 8) < base {
                return Err(Error::Placement(format!(
                    "stack of '{}' in process '{}' does not fit into the \
                     data segment",
                    name, pname
                )));
            }
            top = math::round_dn(top - size, 8);
            Ok(top)
        };

        for t in &mut p.threads {
            if t.stack_addr.is_none() {
                t.stack_addr = Some(carve(&t.name, t.stack_size)?);
            }
        }
        for i in &mut p.invs {
            if i.stack_addr.is_none() {
                i.stack_addr = Some(carve(&i.name, i.stack_size)?);
            }
        }
    }
    Ok(())
}
