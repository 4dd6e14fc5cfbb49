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

//! Turns the project description tree into the typed model

use crate::config::{
    child, child_value, CapSlots, CompInfo, Invocation, MemKind, MemSegment, OptLevel, OptPrio,
    Port, Process, Project, RawTag, Receive, Recovery, RmeConfig, RvmConfig, Send, Thread, Vector,
};
use crate::error::Error;
use crate::parse;
use crate::xml::XmlNode;

/// Parses a complete project description from its root element
pub fn parse(root: &XmlNode) -> Result<Project, Error> {
    if root.tag() != "Project" {
        return Err(Error::XmlSyntax(format!(
            "Project root expected, found '{}'",
            root.tag()
        )));
    }

    let name = child_value(root, "Project", "Name")?;
    let plat = child_value(root, "Project", "Platform")?;
    let chip_class = child_value(root, "Project", "Chip_Class")?;
    let chip_full = child_value(root, "Project", "Chip_Full")?;

    let rme = parse_rme(child(root, "Project", "RME")?)?;
    let rvm = parse_rvm(child(root, "Project", "RVM")?)?;

    let mut procs = Vec::new();
    for node in root.children_named("Process") {
        procs.push(parse_process(node)?);
    }

    Ok(Project {
        name,
        plat,
        chip_class,
        chip_full,
        rme,
        rvm,
        procs,
    })
}

pub(crate) fn parse_compiler(node: &XmlNode, path: &str) -> Result<CompInfo, Error> {
    let opt = match child_value(node, path, "Optimization")?.as_str() {
        "O0" => OptLevel::O0,
        "O1" => OptLevel::O1,
        "O2" => OptLevel::O2,
        "O3" => OptLevel::O3,
        "OS" => OptLevel::Os,
        _ => {
            return Err(Error::XmlSyntax(format!(
                "{}.Optimization is malformed",
                path
            )))
        },
    };
    let prio = match child_value(node, path, "Prioritization")?.as_str() {
        "Size" => OptPrio::Size,
        "Time" => OptPrio::Time,
        _ => {
            return Err(Error::XmlSyntax(format!(
                "{}.Prioritization is malformed",
                path
            )))
        },
    };
    Ok(CompInfo { opt, prio })
}

fn parse_raw(node: &XmlNode) -> Vec<RawTag> {
    node.children()
        .iter()
        .map(|c| RawTag {
            tag: c.tag().to_string(),
            val: c.value().to_string(),
        })
        .collect()
}

fn parse_rme(node: &XmlNode) -> Result<RmeConfig, Error> {
    let comp = parse_compiler(child(node, "Project.RME", "Compiler")?, "Project.RME.Compiler")?;
    let gen = child(node, "Project.RME", "General")?;
    let plat = child(node, "Project.RME", "Platform")?;
    let chip = child(node, "Project.RME", "Chip")?;

    let path = "Project.RME.General";
    let code_start = parse::hex(
        &format!("{}.Code_Start", path),
        &child_value(gen, path, "Code_Start")?,
    )?;
    let code_size = parse::hex(
        &format!("{}.Code_Size", path),
        &child_value(gen, path, "Code_Size")?,
    )?;
    let data_start = parse::hex(
        &format!("{}.Data_Start", path),
        &child_value(gen, path, "Data_Start")?,
    )?;
    let data_size = parse::hex(
        &format!("{}.Data_Size", path),
        &child_value(gen, path, "Data_Size")?,
    )?;
    let extra_kmem = parse::hex(
        &format!("{}.Extra_Kmem", path),
        &child_value(gen, path, "Extra_Kmem")?,
    )?;
    let kmem_order = parse::uint(
        &format!("{}.Kmem_Order", path),
        &child_value(gen, path, "Kmem_Order")?,
    )?;
    let kern_prios = parse::uint(
        &format!("{}.Kern_Prios", path),
        &child_value(gen, path, "Kern_Prios")?,
    )?;

    Ok(RmeConfig {
        comp,
        code_start,
        code_size,
        data_start,
        data_size,
        extra_kmem,
        kmem_order,
        kern_prios,
        plat_raw: parse_raw(plat),
        chip_raw: parse_raw(chip),
    })
}

fn parse_rvm(node: &XmlNode) -> Result<RvmConfig, Error> {
    let comp = parse_compiler(child(node, "Project.RVM", "Compiler")?, "Project.RVM.Compiler")?;
    let gen = child(node, "Project.RVM", "General")?;
    // the VMM section must be present but is currently unused
    child(node, "Project.RVM", "VMM")?;

    let path = "Project.RVM.General";
    let code_size = parse::hex(
        &format!("{}.Code_Size", path),
        &child_value(gen, path, "Code_Size")?,
    )?;
    let data_size = parse::hex(
        &format!("{}.Data_Size", path),
        &child_value(gen, path, "Data_Size")?,
    )?;
    let extra_captbl = parse::uint(
        &format!("{}.Extra_Captbl", path),
        &child_value(gen, path, "Extra_Captbl")?,
    )?;
    let recovery = match child_value(gen, path, "Recovery")?.as_str() {
        "Thread" => Recovery::Thread,
        "Process" => Recovery::Process,
        "System" => Recovery::System,
        _ => {
            return Err(Error::XmlSyntax(format!(
                "{}.Recovery is malformed",
                path
            )))
        },
    };

    Ok(RvmConfig {
        comp,
        code_size,
        data_size,
        extra_captbl,
        recovery,
    })
}

fn parse_process(node: &XmlNode) -> Result<Process, Error> {
    let gen = child(node, "Process", "General")?;
    let name = child_value(gen, "Process.General", "Name")?;
    let extra_captbl = parse::uint(
        "Process.General.Extra_Captbl",
        &child_value(gen, "Process.General", "Extra_Captbl")?,
    )?;

    // breadcrumbs below name the process to make duplicates findable
    let path = format!("Process '{}'", name);
    let comp = parse_compiler(child(node, &path, "Compiler")?, &format!("{}.Compiler", path))?;

    let mut mems = Vec::new();
    for trunk in node.children_named("Memory") {
        mems.push(parse_mem(trunk, &format!("{}.Memory", path))?);
    }

    let mut threads = Vec::new();
    for trunk in node.children_named("Thread") {
        threads.push(parse_thread(trunk, &format!("{}.Thread", path))?);
    }

    let mut invs = Vec::new();
    for trunk in node.children_named("Invocation") {
        invs.push(parse_inv(trunk, &format!("{}.Invocation", path))?);
    }

    let mut ports = Vec::new();
    for trunk in node.children_named("Port") {
        let p = format!("{}.Port", path);
        ports.push(Port {
            name: child_value(trunk, &p, "Name")?,
            target: child_value(trunk, &p, "Process")?,
            cap: CapSlots::default(),
        });
    }

    let mut recvs = Vec::new();
    for trunk in node.children_named("Receive") {
        recvs.push(Receive {
            name: child_value(trunk, &format!("{}.Receive", path), "Name")?,
            cap: CapSlots::default(),
        });
    }

    let mut sends = Vec::new();
    for trunk in node.children_named("Send") {
        let p = format!("{}.Send", path);
        sends.push(Send {
            name: child_value(trunk, &p, "Name")?,
            target: child_value(trunk, &p, "Process")?,
            cap: CapSlots::default(),
        });
    }

    let mut vects = Vec::new();
    for trunk in node.children_named("Vector") {
        vects.push(Vector {
            name: child_value(trunk, &format!("{}.Vector", path), "Name")?,
            num: None,
            cap: CapSlots::default(),
        });
    }

    Ok(Process {
        name,
        extra_captbl,
        comp,
        mems,
        threads,
        invs,
        ports,
        recvs,
        sends,
        vects,
        captbl_front: 0,
        captbl_cap: CapSlots::default(),
        proc_cap: CapSlots::default(),
    })
}

pub(crate) fn parse_mem(trunk: &XmlNode, path: &str) -> Result<MemSegment, Error> {
    let start = parse::hex_or_auto(
        &format!("{}.Start", path),
        &child_value(trunk, path, "Start")?,
    )?;
    let size = parse::hex(
        &format!("{}.Size", path),
        &child_value(trunk, path, "Size")?,
    )?;
    if size == 0 {
        return Err(Error::XmlSyntax(format!("{}.Size cannot be zero", path)));
    }
    if let Some(start) = start {
        if start + size > parse::ADDR_SPACE_END {
            return Err(Error::XmlSyntax(format!(
                "{}.Size is out of bounds",
                path
            )));
        }
    }

    let kind = match child_value(trunk, path, "Type")?.as_str() {
        "Code" => MemKind::Code,
        "Data" => MemKind::Data,
        "Device" => MemKind::Device,
        _ => return Err(Error::XmlSyntax(format!("{}.Type is malformed", path))),
    };

    let attr = parse::attr(
        &format!("{}.Attribute", path),
        &child_value(trunk, path, "Attribute")?,
    )?;

    Ok(MemSegment {
        start,
        size,
        kind,
        attr,
        align: 0,
    })
}

fn parse_thread(trunk: &XmlNode, path: &str) -> Result<Thread, Error> {
    let name = child_value(trunk, path, "Name")?;
    let entry = child_value(trunk, path, "Entry")?;
    let stack_addr = parse::hex_or_auto(
        &format!("{}.Stack_Addr", path),
        &child_value(trunk, path, "Stack_Addr")?,
    )?;
    let stack_size = parse::hex(
        &format!("{}.Stack_Size", path),
        &child_value(trunk, path, "Stack_Size")?,
    )?;
    let param = child_value(trunk, path, "Parameter")?;
    let prio = parse::uint(
        &format!("{}.Priority", path),
        &child_value(trunk, path, "Priority")?,
    )?;

    Ok(Thread {
        name,
        entry,
        stack_addr,
        stack_size,
        param,
        prio,
        cap: CapSlots::default(),
    })
}

fn parse_inv(trunk: &XmlNode, path: &str) -> Result<Invocation, Error> {
    let name = child_value(trunk, path, "Name")?;
    let entry = child_value(trunk, path, "Entry")?;
    let stack_addr = parse::hex_or_auto(
        &format!("{}.Stack_Addr", path),
        &child_value(trunk, path, "Stack_Addr")?,
    )?;
    let stack_size = parse::hex(
        &format!("{}.Stack_Size", path),
        &child_value(trunk, path, "Stack_Size")?,
    )?;

    Ok(Invocation {
        name,
        entry,
        stack_addr,
        stack_size,
        cap: CapSlots::default(),
    })
}
