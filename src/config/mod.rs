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

//! The typed model of a project and a chip description

pub mod chip;
pub mod project;
pub mod validator;

use std::fmt;

use crate::parse::MemAttr;
use crate::xml::XmlNode;

use crate::error::Error;

/// Returns the required child of `node`, with a breadcrumbed error if absent
pub(crate) fn child<'n>(node: &'n XmlNode, path: &str, tag: &str) -> Result<&'n XmlNode, Error> {
    node.child(tag).ok_or_else(|| {
        Error::XmlSyntax(format!("{}.{} section missing", path, tag))
    })
}

/// Returns the text value of the required child of `node`
pub(crate) fn child_value(node: &XmlNode, path: &str, tag: &str) -> Result<String, Error> {
    Ok(child(node, path, tag)?.value().to_string())
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OptLevel {
    O0,
    O1,
    O2,
    O3,
    Os,
}

impl OptLevel {
    /// The flag the compiler expects for this level
    pub fn flag(&self) -> &'static str {
        match self {
            OptLevel::O0 => "-O0",
            OptLevel::O1 => "-O1",
            OptLevel::O2 => "-O2",
            OptLevel::O3 => "-O3",
            OptLevel::Os => "-Os",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OptPrio {
    Size,
    Time,
}

/// Compiler settings shared by RME, RVM, and every process
#[derive(Clone, Copy, Debug)]
pub struct CompInfo {
    pub(crate) opt: OptLevel,
    pub(crate) prio: OptPrio,
}

impl CompInfo {
    pub fn opt(&self) -> OptLevel {
        self.opt
    }

    pub fn prio(&self) -> OptPrio {
        self.prio
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MemKind {
    Code,
    Data,
    Device,
}

impl fmt::Display for MemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemKind::Code => write!(f, "Code"),
            MemKind::Data => write!(f, "Data"),
            MemKind::Device => write!(f, "Device"),
        }
    }
}

/// One declared memory segment. Process segments may leave `start` empty
/// (`Auto`) until placement fills it; chip segments always carry one.
#[derive(Clone, Debug)]
pub struct MemSegment {
    pub(crate) start: Option<u64>,
    pub(crate) size: u64,
    pub(crate) kind: MemKind,
    pub(crate) attr: MemAttr,
    pub(crate) align: u64,
}

impl MemSegment {
    pub fn start(&self) -> Option<u64> {
        self.start
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn kind(&self) -> MemKind {
        self.kind
    }

    pub fn attr(&self) -> MemAttr {
        self.attr
    }

    pub fn align(&self) -> u64 {
        self.align
    }

    /// The placed start address; only valid after the placement stage
    pub fn addr(&self) -> u64 {
        self.start.expect("segment not placed")
    }

    pub fn end(&self) -> u64 {
        self.addr() + self.size
    }
}

/// A tag/value pair passed through to the architecture layer uninterpreted
#[derive(Clone, Debug)]
pub struct RawTag {
    pub(crate) tag: String,
    pub(crate) val: String,
}

impl RawTag {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn val(&self) -> &str {
        &self.val
    }
}

/// The capability identity of one kernel object: the process-local slot and,
/// for first-class objects, the global linear ID used by the RVM boot script
#[derive(Clone, Copy, Debug, Default)]
pub struct CapSlots {
    pub(crate) loc: Option<u64>,
    pub(crate) glob: Option<u64>,
}

impl CapSlots {
    pub fn loc(&self) -> u64 {
        self.loc.expect("local capid not allocated")
    }

    pub fn glob(&self) -> u64 {
        self.glob.expect("global capid not allocated")
    }
}

#[derive(Clone, Debug)]
pub struct Thread {
    pub(crate) name: String,
    pub(crate) entry: String,
    pub(crate) stack_addr: Option<u64>,
    pub(crate) stack_size: u64,
    pub(crate) param: String,
    pub(crate) prio: u64,
    pub(crate) cap: CapSlots,
}

impl Thread {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn stack_addr(&self) -> Option<u64> {
        self.stack_addr
    }

    pub fn stack_size(&self) -> u64 {
        self.stack_size
    }

    pub fn param(&self) -> &str {
        &self.param
    }

    pub fn prio(&self) -> u64 {
        self.prio
    }

    pub fn cap(&self) -> &CapSlots {
        &self.cap
    }
}

#[derive(Clone, Debug)]
pub struct Invocation {
    pub(crate) name: String,
    pub(crate) entry: String,
    pub(crate) stack_addr: Option<u64>,
    pub(crate) stack_size: u64,
    pub(crate) cap: CapSlots,
}

impl Invocation {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn stack_addr(&self) -> Option<u64> {
        self.stack_addr
    }

    pub fn stack_size(&self) -> u64 {
        self.stack_size
    }

    pub fn cap(&self) -> &CapSlots {
        &self.cap
    }
}

/// A client-side reference to an invocation in another process
#[derive(Clone, Debug)]
pub struct Port {
    pub(crate) name: String,
    pub(crate) target: String,
    pub(crate) cap: CapSlots,
}

impl Port {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn cap(&self) -> &CapSlots {
        &self.cap
    }
}

#[derive(Clone, Debug)]
pub struct Receive {
    pub(crate) name: String,
    pub(crate) cap: CapSlots,
}

impl Receive {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cap(&self) -> &CapSlots {
        &self.cap
    }
}

/// A sender-side reference to a receive endpoint in another process
#[derive(Clone, Debug)]
pub struct Send {
    pub(crate) name: String,
    pub(crate) target: String,
    pub(crate) cap: CapSlots,
}

impl Send {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn cap(&self) -> &CapSlots {
        &self.cap
    }
}

/// A receive endpoint bound to a hardware interrupt. The kernel creates it at
/// boot; the generator only assigns its ID and emits the delegation.
#[derive(Clone, Debug)]
pub struct Vector {
    pub(crate) name: String,
    pub(crate) num: Option<u64>,
    pub(crate) cap: CapSlots,
}

impl Vector {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The interrupt number; filled in by validation from the chip
    pub fn num(&self) -> u64 {
        self.num.expect("vector not resolved")
    }

    pub fn cap(&self) -> &CapSlots {
        &self.cap
    }
}

#[derive(Debug)]
pub struct Process {
    pub(crate) name: String,
    pub(crate) extra_captbl: u64,
    pub(crate) comp: CompInfo,
    pub(crate) mems: Vec<MemSegment>,
    pub(crate) threads: Vec<Thread>,
    pub(crate) invs: Vec<Invocation>,
    pub(crate) ports: Vec<Port>,
    pub(crate) recvs: Vec<Receive>,
    pub(crate) sends: Vec<Send>,
    pub(crate) vects: Vec<Vector>,
    /// The local capability-table frontier after local-ID allocation
    pub(crate) captbl_front: u64,
    /// The global IDs of the process's captbl and process objects
    pub(crate) captbl_cap: CapSlots,
    pub(crate) proc_cap: CapSlots,
}

impl Process {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extra_captbl(&self) -> u64 {
        self.extra_captbl
    }

    pub fn comp(&self) -> &CompInfo {
        &self.comp
    }

    pub fn mems(&self) -> &[MemSegment] {
        &self.mems
    }

    pub fn mems_of(&self, kind: MemKind) -> impl Iterator<Item = &MemSegment> {
        self.mems.iter().filter(move |m| m.kind == kind)
    }

    pub fn threads(&self) -> &[Thread] {
        &self.threads
    }

    pub fn invs(&self) -> &[Invocation] {
        &self.invs
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn recvs(&self) -> &[Receive] {
        &self.recvs
    }

    pub fn sends(&self) -> &[Send] {
        &self.sends
    }

    pub fn vects(&self) -> &[Vector] {
        &self.vects
    }

    pub fn captbl_front(&self) -> u64 {
        self.captbl_front
    }

    /// The number of slots the boot-time capability table needs
    pub fn captbl_size(&self) -> u64 {
        self.captbl_front + self.extra_captbl
    }

    pub fn captbl_cap(&self) -> &CapSlots {
        &self.captbl_cap
    }

    pub fn proc_cap(&self) -> &CapSlots {
        &self.proc_cap
    }
}

/// The RME kernel configuration of a project
#[derive(Debug)]
pub struct RmeConfig {
    pub(crate) comp: CompInfo,
    pub(crate) code_start: u64,
    pub(crate) code_size: u64,
    pub(crate) data_start: u64,
    pub(crate) data_size: u64,
    pub(crate) extra_kmem: u64,
    pub(crate) kmem_order: u64,
    pub(crate) kern_prios: u64,
    pub(crate) plat_raw: Vec<RawTag>,
    pub(crate) chip_raw: Vec<RawTag>,
}

impl RmeConfig {
    pub fn comp(&self) -> &CompInfo {
        &self.comp
    }

    pub fn code_start(&self) -> u64 {
        self.code_start
    }

    pub fn code_size(&self) -> u64 {
        self.code_size
    }

    pub fn data_start(&self) -> u64 {
        self.data_start
    }

    pub fn data_size(&self) -> u64 {
        self.data_size
    }

    pub fn extra_kmem(&self) -> u64 {
        self.extra_kmem
    }

    pub fn kmem_order(&self) -> u64 {
        self.kmem_order
    }

    pub fn kern_prios(&self) -> u64 {
        self.kern_prios
    }

    pub fn plat_raw(&self) -> &[RawTag] {
        &self.plat_raw
    }

    pub fn chip_raw(&self) -> &[RawTag] {
        &self.chip_raw
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Recovery {
    Thread,
    Process,
    System,
}

/// The RVM user-runtime configuration of a project
#[derive(Debug)]
pub struct RvmConfig {
    pub(crate) comp: CompInfo,
    pub(crate) code_size: u64,
    pub(crate) data_size: u64,
    pub(crate) extra_captbl: u64,
    pub(crate) recovery: Recovery,
}

impl RvmConfig {
    pub fn comp(&self) -> &CompInfo {
        &self.comp
    }

    pub fn code_size(&self) -> u64 {
        self.code_size
    }

    pub fn data_size(&self) -> u64 {
        self.data_size
    }

    pub fn extra_captbl(&self) -> u64 {
        self.extra_captbl
    }

    pub fn recovery(&self) -> Recovery {
        self.recovery
    }
}

/// The root of the model: everything the project XML describes
#[derive(Debug)]
pub struct Project {
    pub(crate) name: String,
    pub(crate) plat: String,
    pub(crate) chip_class: String,
    pub(crate) chip_full: String,
    pub(crate) rme: RmeConfig,
    pub(crate) rvm: RvmConfig,
    pub(crate) procs: Vec<Process>,
}

impl Project {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plat(&self) -> &str {
        &self.plat
    }

    pub fn chip_class(&self) -> &str {
        &self.chip_class
    }

    pub fn chip_full(&self) -> &str {
        &self.chip_full
    }

    pub fn rme(&self) -> &RmeConfig {
        &self.rme
    }

    pub fn rvm(&self) -> &RvmConfig {
        &self.rvm
    }

    pub fn procs(&self) -> &[Process] {
        &self.procs
    }

    /// Finds a process by name, ignoring case like all name comparisons
    pub fn find_proc(&self, name: &str) -> Option<(usize, &Process)> {
        self.procs
            .iter()
            .enumerate()
            .find(|(_, p)| p.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OptionType {
    Range,
    Select,
}

/// A configurable macro the chip exposes; the project supplies its value
#[derive(Clone, Debug)]
pub struct ChipOption {
    pub(crate) name: String,
    pub(crate) ty: OptionType,
    pub(crate) macro_name: String,
    pub(crate) range: String,
}

impl ChipOption {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> OptionType {
        self.ty
    }

    pub fn macro_name(&self) -> &str {
        &self.macro_name
    }

    pub fn range(&self) -> &str {
        &self.range
    }
}

#[derive(Clone, Debug)]
pub struct ChipVector {
    pub(crate) name: String,
    pub(crate) num: u64,
}

impl ChipVector {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num(&self) -> u64 {
        self.num
    }
}

/// Everything the chip XML describes
pub struct Chip {
    pub(crate) class: String,
    pub(crate) compat: Vec<String>,
    pub(crate) vendor: String,
    pub(crate) plat: String,
    pub(crate) cores: u64,
    pub(crate) regions: u64,
    pub(crate) attrs: Vec<RawTag>,
    pub(crate) mems: Vec<MemSegment>,
    pub(crate) options: Vec<ChipOption>,
    pub(crate) vects: Vec<ChipVector>,
}

impl Chip {
    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn compat(&self) -> &[String] {
        &self.compat
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn plat(&self) -> &str {
        &self.plat
    }

    pub fn cores(&self) -> u64 {
        self.cores
    }

    pub fn regions(&self) -> u64 {
        self.regions
    }

    pub fn attrs(&self) -> &[RawTag] {
        &self.attrs
    }

    pub fn mems(&self) -> &[MemSegment] {
        &self.mems
    }

    pub fn mems_of(&self, kind: MemKind) -> impl Iterator<Item = &MemSegment> {
        self.mems.iter().filter(move |m| m.kind == kind)
    }

    pub fn options(&self) -> &[ChipOption] {
        &self.options
    }

    pub fn vects(&self) -> &[ChipVector] {
        &self.vects
    }

    pub fn find_vect(&self, name: &str) -> Option<&ChipVector> {
        self.vects
            .iter()
            .find(|v| v.name.eq_ignore_ascii_case(name))
    }
}
