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

//! Capability allocation: process-local slots first, then the global linear
//! IDs the RVM boot script mints from, then back-resolution of the symbolic
//! port and send references.

use std::collections::BTreeMap;

use log::info;

use crate::config::Project;
use crate::error::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CapKind {
    Captbl,
    Proc,
    Thd,
    Inv,
    Recv,
}

/// One entry of the global capability table, in mint order
#[derive(Debug)]
pub struct CapEntry {
    pub(crate) proc: usize,
    pub(crate) kind: CapKind,
    pub(crate) name: Option<String>,
}

impl CapEntry {
    pub fn proc(&self) -> usize {
        self.proc
    }

    pub fn kind(&self) -> CapKind {
        self.kind
    }

    /// The kernel object's name; `None` for the per-process captbl and
    /// process entries, which are named by their owner
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// The complete capability layout of a project
#[derive(Debug)]
pub struct CapTable {
    pub(crate) entries: Vec<CapEntry>,
    pub(crate) vect_base: u64,
    pub(crate) vect_count: u64,
}

impl CapTable {
    pub fn entries(&self) -> &[CapEntry] {
        &self.entries
    }

    /// The global-ID frontier; IDs form the dense range `0..frontier`
    pub fn frontier(&self) -> u64 {
        self.entries.len() as u64
    }

    /// The first global ID of the kernel-created vector endpoints
    pub fn vect_base(&self) -> u64 {
        self.vect_base
    }

    pub fn vect_count(&self) -> u64 {
        self.vect_count
    }
}

/// Assigns all local and global capability IDs and resolves every port and
/// send endpoint to its target object
pub fn allocate(proj: &mut Project, vect_base: u64) -> Result<CapTable, Error> {
    alloc_local(proj);
    let mut table = alloc_global(proj, vect_base);
    resolve(proj)?;

    table.vect_count = proj.procs.iter().map(|p| p.vects.len() as u64).sum();
    info!(
        "allocated {} global capabilities and {} vectors",
        table.frontier(),
        table.vect_count
    );
    Ok(table)
}

/// Local slots are handed out per process in the fixed class order threads,
/// invocations, ports, receives, sends, vectors
fn alloc_local(proj: &mut Project) {
    for p in &mut proj.procs {
        let mut next = 0u64;
        let mut take = || {
            let id = next;
            next += 1;
            id
        };

        for t in &mut p.threads {
            t.cap.loc = Some(take());
        }
        for i in &mut p.invs {
            i.cap.loc = Some(take());
        }
        for port in &mut p.ports {
            port.cap.loc = Some(take());
        }
        for r in &mut p.recvs {
            r.cap.loc = Some(take());
        }
        for s in &mut p.sends {
            s.cap.loc = Some(take());
        }
        for v in &mut p.vects {
            v.cap.loc = Some(take());
        }
        p.captbl_front = next;
    }
}

/// Global IDs are one dense range: all captbls, then all processes, then all
/// threads, invocations, and receives, each in process order
fn alloc_global(proj: &mut Project, vect_base: u64) -> CapTable {
    let mut entries = Vec::new();
    let mut next = 0u64;
    let mut take = |entries: &mut Vec<CapEntry>, proc, kind, name: Option<String>| {
        entries.push(CapEntry { proc, kind, name });
        let id = next;
        next += 1;
        id
    };

    for (pi, p) in proj.procs.iter_mut().enumerate() {
        p.captbl_cap.glob = Some(take(&mut entries, pi, CapKind::Captbl, None));
    }
    for (pi, p) in proj.procs.iter_mut().enumerate() {
        p.proc_cap.glob = Some(take(&mut entries, pi, CapKind::Proc, None));
    }
    for (pi, p) in proj.procs.iter_mut().enumerate() {
        for t in &mut p.threads {
            t.cap.glob = Some(take(&mut entries, pi, CapKind::Thd, Some(t.name.clone())));
        }
    }
    for (pi, p) in proj.procs.iter_mut().enumerate() {
        for i in &mut p.invs {
            i.cap.glob = Some(take(&mut entries, pi, CapKind::Inv, Some(i.name.clone())));
        }
    }
    for (pi, p) in proj.procs.iter_mut().enumerate() {
        for r in &mut p.recvs {
            r.cap.glob = Some(take(&mut entries, pi, CapKind::Recv, Some(r.name.clone())));
        }
    }

    // vectors are a separate, kernel-owned pool
    let mut vect_next = vect_base;
    for p in &mut proj.procs {
        for v in &mut p.vects {
            v.cap.glob = Some(vect_next);
            vect_next += 1;
        }
    }

    CapTable {
        entries,
        vect_base,
        vect_count: 0,
    }
}

fn lower(s: &str) -> String {
    s.to_ascii_lowercase()
}

/// Copies the global ID of the referenced invocation into every port and of
/// the referenced receive endpoint into every send endpoint
fn resolve(proj: &mut Project) -> Result<(), Error> {
    let mut invs = BTreeMap::new();
    let mut recvs = BTreeMap::new();
    for p in &proj.procs {
        for i in &p.invs {
            invs.insert((lower(&p.name), lower(&i.name)), i.cap.glob());
        }
        for r in &p.recvs {
            recvs.insert((lower(&p.name), lower(&r.name)), r.cap.glob());
        }
    }

    for p in &mut proj.procs {
        let pname = p.name.clone();
        for port in &mut p.ports {
            match invs.get(&(lower(&port.target), lower(&port.name))) {
                Some(&glob) => port.cap.glob = Some(glob),
                None => {
                    return Err(Error::Semantic(format!(
                        "port '{}' in process '{}' has no invocation '{}' in \
                         process '{}'",
                        port.name, pname, port.name, port.target
                    )))
                },
            }
        }
        for s in &mut p.sends {
            match recvs.get(&(lower(&s.target), lower(&s.name))) {
                Some(&glob) => s.cap.glob = Some(glob),
                None => {
                    return Err(Error::Semantic(format!(
                        "send endpoint '{}' in process '{}' has no receive \
                         endpoint '{}' in process '{}'",
                        s.name, pname, s.name, s.target
                    )))
                },
            }
        }
    }
    Ok(())
}
