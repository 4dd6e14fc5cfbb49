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

//! Semantic validation of the parsed model: identifier rules, uniqueness,
//! structural rules, and project/chip cross-checks. All name comparisons are
//! case-insensitive.

use std::collections::BTreeSet;

use crate::config::{Chip, MemKind, OptionType, Process, Project};
use crate::error::Error;
use crate::parse;

pub fn validate(proj: &mut Project, chip: &Chip) -> Result<(), Error> {
    validate_idents(proj)?;
    validate_procs(proj)?;
    validate_endpoints(proj)?;
    validate_mems(proj, chip)?;
    validate_chip(proj, chip)?;
    resolve_vectors(proj, chip)
}

fn ident(what: &str, name: &str) -> Result<(), Error> {
    if !parse::is_ident(name) {
        Err(Error::Semantic(format!(
            "{} '{}' is not a valid identifier",
            what, name
        )))
    }
    else {
        Ok(())
    }
}

fn lower(s: &str) -> String {
    s.to_ascii_lowercase()
}

fn validate_idents(proj: &Project) -> Result<(), Error> {
    ident("project name", proj.name())?;
    for p in proj.procs() {
        ident("process name", p.name())?;
        for t in p.threads() {
            ident(&format!("thread name in process '{}'", p.name()), t.name())?;
        }
        for i in p.invs() {
            ident(
                &format!("invocation name in process '{}'", p.name()),
                i.name(),
            )?;
        }
        for port in p.ports() {
            ident(&format!("port name in process '{}'", p.name()), port.name())?;
            ident(
                &format!("port target in process '{}'", p.name()),
                port.target(),
            )?;
        }
        for r in p.recvs() {
            ident(
                &format!("receive endpoint name in process '{}'", p.name()),
                r.name(),
            )?;
        }
        for s in p.sends() {
            ident(
                &format!("send endpoint name in process '{}'", p.name()),
                s.name(),
            )?;
            ident(
                &format!("send target in process '{}'", p.name()),
                s.target(),
            )?;
        }
        for v in p.vects() {
            ident(
                &format!("vector endpoint name in process '{}'", p.name()),
                v.name(),
            )?;
        }
    }
    Ok(())
}

fn validate_procs(proj: &Project) -> Result<(), Error> {
    let mut names = BTreeSet::new();
    for p in proj.procs() {
        if !names.insert(lower(p.name())) {
            return Err(Error::Semantic(format!(
                "process '{}' does already exist",
                p.name()
            )));
        }
    }
    Ok(())
}

fn unique_in_proc<'n, I>(p: &Process, what: &str, names: I) -> Result<(), Error>
where
    I: Iterator<Item = &'n str>,
{
    let mut set = BTreeSet::new();
    for name in names {
        if !set.insert(lower(name)) {
            return Err(Error::Semantic(format!(
                "{} '{}' in process '{}' does already exist",
                what,
                name,
                p.name()
            )));
        }
    }
    Ok(())
}

fn validate_endpoints(proj: &Project) -> Result<(), Error> {
    for p in proj.procs() {
        unique_in_proc(p, "thread", p.threads().iter().map(|t| t.name()))?;
        unique_in_proc(p, "invocation", p.invs().iter().map(|i| i.name()))?;
        unique_in_proc(p, "receive endpoint", p.recvs().iter().map(|r| r.name()))?;

        let mut ports = BTreeSet::new();
        for port in p.ports() {
            if port.target().eq_ignore_ascii_case(p.name()) {
                return Err(Error::Semantic(format!(
                    "port '{}' in process '{}' targets its own process",
                    port.name(),
                    p.name()
                )));
            }
            if !ports.insert((lower(port.target()), lower(port.name()))) {
                return Err(Error::Semantic(format!(
                    "port '{}' for process '{}' in process '{}' does already exist",
                    port.name(),
                    port.target(),
                    p.name()
                )));
            }
        }

        let mut sends = BTreeSet::new();
        for s in p.sends() {
            if !sends.insert((lower(s.target()), lower(s.name()))) {
                return Err(Error::Semantic(format!(
                    "send endpoint '{}' for process '{}' in process '{}' does already exist",
                    s.name(),
                    s.target(),
                    p.name()
                )));
            }
        }
    }

    // vectors and receive endpoints share the handler-dispatch namespace, so
    // vector names must be unique against all of both, across all processes
    let mut handlers = BTreeSet::new();
    for p in proj.procs() {
        for r in p.recvs() {
            handlers.insert(lower(r.name()));
        }
    }
    for p in proj.procs() {
        for v in p.vects() {
            if !handlers.insert(lower(v.name())) {
                return Err(Error::Semantic(format!(
                    "vector endpoint '{}' in process '{}' clashes with another \
                     vector or receive endpoint",
                    v.name(),
                    p.name()
                )));
            }
        }
    }
    Ok(())
}

fn validate_mems(proj: &Project, chip: &Chip) -> Result<(), Error> {
    for p in proj.procs() {
        if p.mems_of(MemKind::Code).next().is_none() {
            return Err(Error::Semantic(format!(
                "process '{}' does not have a single code segment",
                p.name()
            )));
        }
        if p.mems_of(MemKind::Data).next().is_none() {
            return Err(Error::Semantic(format!(
                "process '{}' does not have a single data segment",
                p.name()
            )));
        }

        let devs: Vec<_> = p.mems_of(MemKind::Device).collect();
        for (idx, d) in devs.iter().enumerate() {
            let start = match d.start() {
                Some(s) => s,
                None => {
                    return Err(Error::Semantic(format!(
                        "device segment in process '{}' cannot have auto placement",
                        p.name()
                    )))
                },
            };

            let contained = chip.mems_of(MemKind::Device).any(|c| {
                c.addr() <= start && start + d.size() <= c.addr() + c.size()
            });
            if !contained {
                return Err(Error::Semantic(format!(
                    "device segment {:#x}..{:#x} in process '{}' is out of the \
                     chip's device memory",
                    start,
                    start + d.size(),
                    p.name()
                )));
            }

            for other in &devs[idx + 1..] {
                let ostart = match other.start() {
                    Some(s) => s,
                    None => continue,
                };
                if crate::math::overlaps(start, start + d.size(), ostart, ostart + other.size()) {
                    return Err(Error::Semantic(format!(
                        "device segments in process '{}' overlap at {:#x}",
                        p.name(),
                        ostart.max(start)
                    )));
                }
            }
        }
    }
    Ok(())
}

fn validate_chip(proj: &Project, chip: &Chip) -> Result<(), Error> {
    if !chip.plat().eq_ignore_ascii_case(proj.plat()) {
        return Err(Error::Semantic(format!(
            "the chip description is for platform '{}', the project for '{}'",
            chip.plat(),
            proj.plat()
        )));
    }
    if !chip.class().eq_ignore_ascii_case(proj.chip_class()) {
        return Err(Error::Semantic(format!(
            "the chip description is for class '{}', the project for '{}'",
            chip.class(),
            proj.chip_class()
        )));
    }
    if !chip
        .compat()
        .iter()
        .any(|c| c.eq_ignore_ascii_case(proj.chip_full()))
    {
        return Err(Error::Semantic(format!(
            "chip '{}' is not in the compatible list of class '{}'",
            proj.chip_full(),
            chip.class()
        )));
    }

    // every chip option needs a value from the project, and the value has to
    // be within the declared range
    for opt in chip.options() {
        let val = proj
            .rme()
            .chip_raw()
            .iter()
            .find(|r| r.tag().eq_ignore_ascii_case(opt.name()))
            .map(|r| r.val());
        let val = match val {
            Some(v) => v,
            None => {
                return Err(Error::Semantic(format!(
                    "chip option '{}' is not configured by the project",
                    opt.name()
                )))
            },
        };

        match opt.ty() {
            OptionType::Range => {
                let bounds: Vec<_> = opt.range().split(',').map(|s| s.trim()).collect();
                if bounds.len() != 2 {
                    return Err(Error::Semantic(format!(
                        "chip option '{}' has a malformed range '{}'",
                        opt.name(),
                        opt.range()
                    )));
                }
                let min = parse::uint("Chip.Option.Range", bounds[0])?;
                let max = parse::uint("Chip.Option.Range", bounds[1])?;
                let num = parse::uint("Chip.Option value", val).map_err(|_| {
                    Error::Semantic(format!(
                        "chip option '{}' value '{}' is not a number",
                        opt.name(),
                        val
                    ))
                })?;
                if num < min || num > max {
                    return Err(Error::Semantic(format!(
                        "chip option '{}' value '{}' is outside {}..{}",
                        opt.name(),
                        val,
                        min,
                        max
                    )));
                }
            },
            OptionType::Select => {
                if !opt.range().split(',').any(|c| c.trim() == val) {
                    return Err(Error::Semantic(format!(
                        "chip option '{}' value '{}' is not one of '{}'",
                        opt.name(),
                        val,
                        opt.range()
                    )));
                }
            },
        }
    }
    Ok(())
}

/// Binds every vector endpoint to its chip interrupt number
fn resolve_vectors(proj: &mut Project, chip: &Chip) -> Result<(), Error> {
    for p in &mut proj.procs {
        for v in &mut p.vects {
            match chip.find_vect(&v.name) {
                Some(cv) => v.num = Some(cv.num()),
                None => {
                    return Err(Error::Semantic(format!(
                        "vector endpoint '{}' in process '{}' has no interrupt \
                         on chip '{}'",
                        v.name,
                        p.name,
                        chip.class()
                    )))
                },
            }
        }
    }
    Ok(())
}
