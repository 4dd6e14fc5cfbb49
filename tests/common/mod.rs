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

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use mcugen::config::{self, Chip, Project};
use mcugen::xml::XmlNode;

/// The default compiler section used all over the tests
pub const COMPILER: &str = "<Compiler><Optimization>O2</Optimization>\
                            <Prioritization>Size</Prioritization></Compiler>";

/// A project around the given process sections, matching [`CHIP`]
pub fn project_xml(procs: &str) -> String {
    format!(
        "<Project>\
           <Name>Test</Name>\
           <Platform>A7M</Platform>\
           <Chip_Class>TC1</Chip_Class>\
           <Chip_Full>TC1FULL</Chip_Full>\
           <RME>\
             {comp}\
             <General>\
               <Code_Start>0x08000000</Code_Start>\
               <Code_Size>0x8000</Code_Size>\
               <Data_Start>0x20000000</Data_Start>\
               <Data_Size>0x200</Data_Size>\
               <Extra_Kmem>0x0</Extra_Kmem>\
               <Kmem_Order>4</Kmem_Order>\
               <Kern_Prios>32</Kern_Prios>\
             </General>\
             <Platform></Platform>\
             <Chip></Chip>\
           </RME>\
           <RVM>\
             {comp}\
             <General>\
               <Code_Size>0x8000</Code_Size>\
               <Data_Size>0x200</Data_Size>\
               <Extra_Captbl>8</Extra_Captbl>\
               <Recovery>Thread</Recovery>\
             </General>\
             <VMM></VMM>\
           </RVM>\
           {procs}\
         </Project>",
        comp = COMPILER,
        procs = procs
    )
}

/// A chip with 128 KiB of code at 0x08000000, 32 KiB of data at 0x20000000,
/// a device window, and two interrupt vectors
pub const CHIP: &str = "<Chip>\
       <Class>TC1</Class>\
       <Compatible>TC1FULL,TC1OTHER</Compatible>\
       <Vendor>TestVendor</Vendor>\
       <Platform>A7M</Platform>\
       <Cores>1</Cores>\
       <Regions>8</Regions>\
       <Memory>\
         <Start>0x08000000</Start><Size>0x20000</Size><Type>Code</Type>\
       </Memory>\
       <Memory>\
         <Start>0x20000000</Start><Size>0x8000</Size><Type>Data</Type>\
       </Memory>\
       <Memory>\
         <Start>0x40000000</Start><Size>0x10000</Size><Type>Device</Type>\
       </Memory>\
       <Vector><Name>Timer</Name><Number>5</Number></Vector>\
       <Vector><Name>Uart</Name><Number>38</Number></Vector>\
     </Chip>";

/// A process with one auto code and one auto data segment and one thread
pub fn simple_proc(name: &str) -> String {
    proc_xml(
        name,
        "<Memory>\
           <Start>Auto</Start><Size>0x1000</Size><Type>Code</Type>\
           <Attribute>RX</Attribute>\
         </Memory>\
         <Memory>\
           <Start>Auto</Start><Size>0x400</Size><Type>Data</Type>\
           <Attribute>RWS</Attribute>\
         </Memory>\
         <Thread>\
           <Name>Main</Name><Entry>main</Entry>\
           <Stack_Addr>Auto</Stack_Addr><Stack_Size>0x100</Stack_Size>\
           <Parameter>0</Parameter><Priority>5</Priority>\
         </Thread>",
    )
}

/// A process section with the given body behind the General/Compiler parts
pub fn proc_xml(name: &str, body: &str) -> String {
    format!(
        "<Process>\
           <General><Name>{}</Name><Extra_Captbl>4</Extra_Captbl></General>\
           {}\
           {}\
         </Process>",
        name, COMPILER, body
    )
}

pub fn parse_project(xml: &str) -> Project {
    config::project::parse(&XmlNode::parse(xml).expect("malformed project XML"))
        .expect("invalid project")
}

pub fn parse_chip(xml: &str) -> Chip {
    config::chip::parse(&XmlNode::parse(xml).expect("malformed chip XML")).expect("invalid chip")
}

/// Parses, validates, aligns, and places a project against [`CHIP`]
pub fn placed_project(procs: &str) -> (Project, Chip) {
    let mut proj = parse_project(&project_xml(procs));
    let chip = parse_chip(CHIP);
    mcugen::config::validator::validate(&mut proj, &chip).expect("validation failed");
    let backend = mcugen::arch::backend_for("A7M").unwrap();
    mcugen::mem::align(&mut proj, backend.as_ref()).expect("alignment failed");
    mcugen::mem::place(&mut proj, &chip).expect("placement failed");
    (proj, chip)
}

static SCRATCH_ID: AtomicUsize = AtomicUsize::new(0);

/// A per-test scratch directory, removed on drop
pub struct Scratch {
    root: PathBuf,
}

impl Scratch {
    pub fn new(name: &str) -> Self {
        let id = SCRATCH_ID.fetch_add(1, Ordering::Relaxed);
        let root = std::env::temp_dir().join(format!(
            "mcugen-test-{}-{}-{}",
            name,
            std::process::id(),
            id
        ));
        fs::create_dir_all(&root).expect("cannot create scratch dir");
        Scratch { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, rel: &str) -> PathBuf {
        let path = self.root.join(rel);
        fs::create_dir_all(&path).expect("cannot create dir");
        path
    }

    pub fn file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).expect("cannot create dir");
        fs::write(&path, content).expect("cannot write file");
        path
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}
