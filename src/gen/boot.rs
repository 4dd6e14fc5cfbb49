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

//! The boot-time capability scripts. The kernel script creates the vector
//! endpoints; the RVM script creates every other kernel object in global-ID
//! order and then performs the port, send, and vector delegations. The order
//! is load-bearing: later objects reference earlier ones by their IDs.

use std::fmt::Write;

use crate::arch::{RegionNode, SubRegion};
use crate::caps::CapKind;
use crate::config::{Process, Recovery};
use crate::error::Error;
use crate::gen::{macroize, write_file, GenCtx};
use crate::parse::MemAttr;

pub fn emit(ctx: &GenCtx<'_>) -> Result<(), Error> {
    write_file(
        &ctx.rme_dir().join("MEukaron/Include/rme_boot.h"),
        &rme_boot_hdr(ctx),
    )?;
    write_file(
        &ctx.rme_dir().join("MEukaron/Kernel/rme_boot.c"),
        &rme_boot_src(ctx),
    )?;
    write_file(
        &ctx.rvm_dir().join("MAmmonite/Include/rvm_boot.h"),
        &rvm_boot_hdr(ctx),
    )?;
    write_file(
        &ctx.rvm_dir().join("MAmmonite/rvm_boot.c"),
        &rvm_boot_src(ctx),
    )
}

/// The macro fragment identifying one object of one process
fn obj(p: &Process, name: &str) -> String {
    format!("{}_{}", macroize(p.name()), macroize(name))
}

fn attr_flags(attr: MemAttr) -> String {
    let mut flags = Vec::new();
    if attr.contains(MemAttr::R) {
        flags.push("RVM_PGTBL_READ");
    }
    if attr.contains(MemAttr::W) {
        flags.push("RVM_PGTBL_WRITE");
    }
    if attr.contains(MemAttr::X) {
        flags.push("RVM_PGTBL_EXECUTE");
    }
    if attr.contains(MemAttr::B) {
        flags.push("RVM_PGTBL_BUFFERABLE");
    }
    if attr.contains(MemAttr::C) {
        flags.push("RVM_PGTBL_CACHEABLE");
    }
    if attr.contains(MemAttr::S) {
        flags.push("RVM_PGTBL_STATIC");
    }
    flags.join("|")
}

fn rme_boot_hdr(ctx: &GenCtx<'_>) -> String {
    let mut s = String::new();
    writeln!(s, "/* Vector endpoint capability IDs generated by mcugen */").unwrap();
    writeln!(s).unwrap();
    writeln!(
        s,
        "#define RME_VECT_CAP_BASE               ({:#X}U)",
        ctx.caps.vect_base()
    )
    .unwrap();
    writeln!(
        s,
        "#define RME_VECT_CAP_NUM                ({}U)",
        ctx.caps.vect_count()
    )
    .unwrap();
    writeln!(s).unwrap();
    for p in ctx.proj.procs() {
        for v in p.vects() {
            writeln!(
                s,
                "#define RME_VECT_{:<23} ({}U)",
                macroize(v.name()),
                v.cap().glob()
            )
            .unwrap();
            writeln!(
                s,
                "#define RME_VECT_{:<23} ({}U)",
                format!("{}_NUM", macroize(v.name())),
                v.num()
            )
            .unwrap();
        }
    }
    s
}

fn rme_boot_src(ctx: &GenCtx<'_>) -> String {
    let mut s = String::new();
    writeln!(s, "/* Vector endpoint creation generated by mcugen */").unwrap();
    writeln!(s).unwrap();
    writeln!(s, "#include \"rme_platform.h\"").unwrap();
    writeln!(s, "#include \"rme_boot.h\"").unwrap();
    writeln!(s).unwrap();
    writeln!(s, "/* Creates the vector endpoints at kernel boot */").unwrap();
    writeln!(s, "void RME_Boot_Vect_Crt(void)").unwrap();
    writeln!(s, "{{").unwrap();
    for p in ctx.proj.procs() {
        for v in p.vects() {
            writeln!(
                s,
                "    RME_ASSERT(RME_Vect_Crt(RME_VECT_{}, RME_VECT_{}_NUM)==0);",
                macroize(v.name()),
                macroize(v.name())
            )
            .unwrap();
        }
    }
    writeln!(s, "}}").unwrap();
    s
}

fn rvm_boot_hdr(ctx: &GenCtx<'_>) -> String {
    let mut s = String::new();
    writeln!(s, "/* Global capability IDs generated by mcugen */").unwrap();
    writeln!(s).unwrap();
    writeln!(
        s,
        "#define RVM_CAP_NUM                     ({}U)",
        ctx.caps.frontier()
    )
    .unwrap();
    writeln!(s).unwrap();

    for e in ctx.caps.entries() {
        let p = &ctx.proj.procs()[e.proc()];
        let (mac, id) = match e.kind() {
            CapKind::Captbl => (format!("RVM_CT_{}", macroize(p.name())), p.captbl_cap().glob()),
            CapKind::Proc => (format!("RVM_PROC_{}", macroize(p.name())), p.proc_cap().glob()),
            CapKind::Thd => {
                let name = e.name().expect("thread entry without name");
                let t = p
                    .threads()
                    .iter()
                    .find(|t| t.name() == name)
                    .expect("table entry without object");
                (format!("RVM_THD_{}", obj(p, name)), t.cap().glob())
            },
            CapKind::Inv => {
                let name = e.name().expect("invocation entry without name");
                let i = p
                    .invs()
                    .iter()
                    .find(|i| i.name() == name)
                    .expect("table entry without object");
                (format!("RVM_INV_{}", obj(p, name)), i.cap().glob())
            },
            CapKind::Recv => {
                let name = e.name().expect("receive entry without name");
                let r = p
                    .recvs()
                    .iter()
                    .find(|r| r.name() == name)
                    .expect("table entry without object");
                (format!("RVM_RECV_{}", obj(p, name)), r.cap().glob())
            },
        };
        writeln!(s, "#define {:<31} ({}U)", mac, id).unwrap();
    }

    writeln!(s).unwrap();
    // page-table capabilities sit right behind the global table
    writeln!(s, "#define {:<31} (RVM_CAP_NUM)", "RVM_PGTBL_BASE").unwrap();
    let mut pgtbl_total = 0;
    for (pi, p) in ctx.proj.procs().iter().enumerate() {
        let mac = format!("RVM_PGTBL_{}_NUM", macroize(p.name()));
        writeln!(s, "#define {:<31} ({}U)", mac, ctx.pgtbls[pi].regions()).unwrap();
        pgtbl_total += ctx.pgtbls[pi].regions();
    }

    writeln!(s).unwrap();
    writeln!(
        s,
        "#define {:<31} ({}U)",
        "RVM_BOOT_CAPTBL_SIZE",
        ctx.caps.frontier() + pgtbl_total + ctx.proj.rvm().extra_captbl()
    )
    .unwrap();
    let recovery = match ctx.proj.rvm().recovery() {
        Recovery::Thread => 0,
        Recovery::Process => 1,
        Recovery::System => 2,
    };
    writeln!(s, "#define {:<31} ({}U)", "RVM_RECOVERY_MODE", recovery).unwrap();
    s
}

/// Emits the creation calls of one process's region tree, preorder, and
/// returns the index of the node that was created first
fn emit_pgtbl(s: &mut String, pmac: &str, node: &RegionNode, next: &mut u64) -> u64 {
    let id = *next;
    *next += 1;
    writeln!(
        s,
        "    RVM_ASSERT(RVM_Pgtbl_Crt(RVM_BOOT_CAPTBL, RVM_BOOT_INIT_KMEM, \
         RVM_PGTBL_BASE+{}U, {:#010X}U, {}U, {}U)==0); /* {} */",
        id,
        node.base,
        node.size_order,
        node.num_order,
        pmac
    )
    .unwrap();

    for (idx, sub) in node.subs.iter().enumerate() {
        match sub {
            SubRegion::Empty => {},
            SubRegion::Page(attr) => {
                writeln!(
                    s,
                    "    RVM_ASSERT(RVM_Pgtbl_Add(RVM_PGTBL_BASE+{}U, {}U, \
                     {})==0);",
                    id,
                    idx,
                    attr_flags(*attr)
                )
                .unwrap();
            },
            SubRegion::Table(child) => {
                let cid = emit_pgtbl(s, pmac, child, next);
                writeln!(
                    s,
                    "    RVM_ASSERT(RVM_Pgtbl_Con(RVM_PGTBL_BASE+{}U, {}U, \
                     RVM_PGTBL_BASE+{}U)==0);",
                    id, idx, cid
                )
                .unwrap();
            },
        }
    }
    id
}

fn rvm_boot_src(ctx: &GenCtx<'_>) -> String {
    let procs = ctx.proj.procs();
    let mut s = String::new();
    writeln!(s, "/* Kernel object creation and delegation generated by mcugen */").unwrap();
    writeln!(s).unwrap();
    writeln!(s, "#include \"rvm_platform.h\"").unwrap();
    writeln!(s, "#include \"rvm_boot.h\"").unwrap();
    writeln!(s).unwrap();

    // capability tables come first; everything below stores into them
    writeln!(s, "/* Creates the boot-time capability tables */").unwrap();
    writeln!(s, "void RVM_Boot_Captbl_Crt(void)").unwrap();
    writeln!(s, "{{").unwrap();
    for e in ctx.caps.entries() {
        if e.kind() == CapKind::Captbl {
            let p = &procs[e.proc()];
            writeln!(
                s,
                "    RVM_ASSERT(RVM_Captbl_Crt(RVM_BOOT_CAPTBL, \
                 RVM_BOOT_INIT_KMEM, RVM_CT_{}, {}U)==0);",
                macroize(p.name()),
                p.captbl_size()
            )
            .unwrap();
        }
    }
    writeln!(s, "}}").unwrap();
    writeln!(s).unwrap();

    writeln!(s, "/* Creates the memory protection trees */").unwrap();
    writeln!(s, "void RVM_Boot_Pgtbl_Crt(void)").unwrap();
    writeln!(s, "{{").unwrap();
    let mut pgtbl_roots = Vec::new();
    let mut next = 0u64;
    for (pi, p) in procs.iter().enumerate() {
        pgtbl_roots.push(emit_pgtbl(&mut s, &macroize(p.name()), &ctx.pgtbls[pi], &mut next));
    }
    writeln!(s, "}}").unwrap();
    writeln!(s).unwrap();

    writeln!(s, "/* Creates the processes */").unwrap();
    writeln!(s, "void RVM_Boot_Proc_Crt(void)").unwrap();
    writeln!(s, "{{").unwrap();
    for e in ctx.caps.entries() {
        if e.kind() == CapKind::Proc {
            let p = &procs[e.proc()];
            writeln!(
                s,
                "    RVM_ASSERT(RVM_Proc_Crt(RVM_BOOT_CAPTBL, \
                 RVM_BOOT_INIT_KMEM, RVM_PROC_{}, RVM_CT_{}, \
                 RVM_PGTBL_BASE+{}U)==0);",
                macroize(p.name()),
                macroize(p.name()),
                pgtbl_roots[e.proc()]
            )
            .unwrap();
        }
    }
    writeln!(s, "}}").unwrap();
    writeln!(s).unwrap();

    writeln!(s, "/* Creates the threads */").unwrap();
    writeln!(s, "void RVM_Boot_Thd_Crt(void)").unwrap();
    writeln!(s, "{{").unwrap();
    for e in ctx.caps.entries() {
        if e.kind() == CapKind::Thd {
            let p = &procs[e.proc()];
            let t = p
                .threads()
                .iter()
                .find(|t| Some(t.name()) == e.name())
                .expect("table entry without object");
            writeln!(
                s,
                "    RVM_ASSERT(RVM_Thd_Crt(RVM_BOOT_CAPTBL, \
                 RVM_BOOT_INIT_KMEM, RVM_THD_{}, RVM_PROC_{}, {}U)==0); \
                 /* stack {:#010X}..{:#010X} */",
                obj(p, t.name()),
                macroize(p.name()),
                t.prio(),
                t.stack_addr().expect("stack not resolved"),
                t.stack_addr().expect("stack not resolved") + t.stack_size()
            )
            .unwrap();
        }
    }
    writeln!(s, "}}").unwrap();
    writeln!(s).unwrap();

    writeln!(s, "/* Creates the invocations */").unwrap();
    writeln!(s, "void RVM_Boot_Inv_Crt(void)").unwrap();
    writeln!(s, "{{").unwrap();
    for e in ctx.caps.entries() {
        if e.kind() == CapKind::Inv {
            let p = &procs[e.proc()];
            let i = p
                .invs()
                .iter()
                .find(|i| Some(i.name()) == e.name())
                .expect("table entry without object");
            writeln!(
                s,
                "    RVM_ASSERT(RVM_Inv_Crt(RVM_BOOT_CAPTBL, \
                 RVM_BOOT_INIT_KMEM, RVM_INV_{}, RVM_PROC_{})==0); \
                 /* stack {:#010X}..{:#010X} */",
                obj(p, i.name()),
                macroize(p.name()),
                i.stack_addr().expect("stack not resolved"),
                i.stack_addr().expect("stack not resolved") + i.stack_size()
            )
            .unwrap();
        }
    }
    writeln!(s, "}}").unwrap();
    writeln!(s).unwrap();

    writeln!(s, "/* Creates the receive endpoints */").unwrap();
    writeln!(s, "void RVM_Boot_Recv_Crt(void)").unwrap();
    writeln!(s, "{{").unwrap();
    for e in ctx.caps.entries() {
        if e.kind() == CapKind::Recv {
            let p = &procs[e.proc()];
            writeln!(
                s,
                "    RVM_ASSERT(RVM_Recv_Crt(RVM_BOOT_CAPTBL, \
                 RVM_BOOT_INIT_KMEM, RVM_RECV_{})==0);",
                obj(p, e.name().expect("receive entry without name"))
            )
            .unwrap();
        }
    }
    writeln!(s, "}}").unwrap();
    writeln!(s).unwrap();

    writeln!(s, "/* Creates all kernel objects, in global capability ID order */").unwrap();
    writeln!(s, "void RVM_Boot_Kobj_Crt(void)").unwrap();
    writeln!(s, "{{").unwrap();
    writeln!(s, "    RVM_Boot_Captbl_Crt();").unwrap();
    writeln!(s, "    RVM_Boot_Pgtbl_Crt();").unwrap();
    writeln!(s, "    RVM_Boot_Proc_Crt();").unwrap();
    writeln!(s, "    RVM_Boot_Thd_Crt();").unwrap();
    writeln!(s, "    RVM_Boot_Inv_Crt();").unwrap();
    writeln!(s, "    RVM_Boot_Recv_Crt();").unwrap();
    writeln!(s, "}}").unwrap();
    writeln!(s).unwrap();

    writeln!(s, "/* Delegates the ports, send endpoints, and vector endpoints */").unwrap();
    writeln!(s, "void RVM_Boot_Kobj_Init(void)").unwrap();
    writeln!(s, "{{").unwrap();
    for p in procs {
        for port in p.ports() {
            // macros carry the names as the target process declared them
            let (_, target) = ctx
                .proj
                .find_proc(port.target())
                .expect("resolved port without target");
            let inv = target
                .invs()
                .iter()
                .find(|i| i.name().eq_ignore_ascii_case(port.name()))
                .expect("resolved port without invocation");
            writeln!(
                s,
                "    RVM_ASSERT(RVM_Captbl_Add(RVM_CT_{}, {}U, \
                 RVM_BOOT_CAPTBL, RVM_INV_{}, RVM_INV_FLAG_ALL)==0); \
                 /* port '{}' */",
                macroize(p.name()),
                port.cap().loc(),
                obj(target, inv.name()),
                port.name()
            )
            .unwrap();
        }
        for snd in p.sends() {
            let (_, target) = ctx
                .proj
                .find_proc(snd.target())
                .expect("resolved send without target");
            let recv = target
                .recvs()
                .iter()
                .find(|r| r.name().eq_ignore_ascii_case(snd.name()))
                .expect("resolved send without receive");
            writeln!(
                s,
                "    RVM_ASSERT(RVM_Captbl_Add(RVM_CT_{}, {}U, \
                 RVM_BOOT_CAPTBL, RVM_RECV_{}, RVM_EVT_FLAG_SND)==0); \
                 /* send endpoint '{}' */",
                macroize(p.name()),
                snd.cap().loc(),
                obj(target, recv.name()),
                snd.name()
            )
            .unwrap();
        }
        for v in p.vects() {
            writeln!(
                s,
                "    RVM_ASSERT(RVM_Captbl_Add(RVM_CT_{}, {}U, \
                 RVM_BOOT_CAPTBL, RME_VECT_CAP_BASE+{}U, \
                 RVM_EVT_FLAG_RCV)==0); /* vector '{}' */",
                macroize(p.name()),
                v.cap().loc(),
                v.cap().glob() - ctx.caps.vect_base(),
                v.name()
            )
            .unwrap();
        }
    }
    writeln!(s, "}}").unwrap();
    s
}
