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

use mcugen::config::{self, MemKind, OptLevel, OptPrio, Recovery};
use mcugen::parse::{self, MemAttr};
use mcugen::xml::XmlNode;

use common::{parse_chip, parse_project, proc_xml, project_xml, CHIP};

#[test]
fn hex_values() {
    assert_eq!(parse::hex("t", "0x1000").unwrap(), 0x1000);
    assert_eq!(parse::hex("t", "0X20").unwrap(), 0x20);
    assert_eq!(parse::hex("t", "DEADbeef").unwrap(), 0xDEAD_BEEF);
    // explicit values are interpreted mod 2^32
    assert_eq!(parse::hex("t", "0x100000001").unwrap(), 1);

    assert!(parse::hex("t", "").is_err());
    assert!(parse::hex("t", "0x").is_err());
    assert!(parse::hex("t", "0x10g0").is_err());
    assert!(parse::hex("t", "1000h").is_err());
    assert!(parse::hex("t", "Auto").is_err());
    assert!(parse::hex("t", "-4").is_err());

    assert_eq!(parse::hex_or_auto("t", "Auto").unwrap(), None);
    assert_eq!(parse::hex_or_auto("t", "0x40").unwrap(), Some(0x40));
    assert!(parse::hex_or_auto("t", "auto").is_err());
}

#[test]
fn uint_values() {
    assert_eq!(parse::uint("t", "0").unwrap(), 0);
    assert_eq!(parse::uint("t", "32").unwrap(), 32);
    assert!(parse::uint("t", "").is_err());
    assert!(parse::uint("t", "0x20").is_err());
    assert!(parse::uint("t", "12a").is_err());
    assert!(parse::uint("t", "-1").is_err());
    assert_eq!(parse::uint_or_auto("t", "Auto").unwrap(), None);
}

#[test]
fn attr_values() {
    assert_eq!(parse::attr("t", "R").unwrap(), MemAttr::R);
    assert_eq!(
        parse::attr("t", "RWX").unwrap(),
        MemAttr::R | MemAttr::W | MemAttr::X
    );
    assert_eq!(
        parse::attr("t", "RWCBS").unwrap(),
        MemAttr::R | MemAttr::W | MemAttr::C | MemAttr::B | MemAttr::S
    );

    // lower case letters and junk are rejected
    assert!(parse::attr("t", "r").is_err());
    assert!(parse::attr("t", "RQ").is_err());
    // at least one of R/W/X has to be there
    assert!(parse::attr("t", "").is_err());
    assert!(parse::attr("t", "CBS").is_err());
}

#[test]
fn idents() {
    assert!(parse::is_ident("Foo"));
    assert!(parse::is_ident("_f00_bar"));
    assert!(!parse::is_ident(""));
    assert!(!parse::is_ident("0foo"));
    assert!(!parse::is_ident("foo-bar"));
    assert!(!parse::is_ident("foo bar"));
}

#[test]
fn project_shape() {
    let proj = parse_project(&project_xml(&proc_xml(
        "Acc",
        "<Memory>\
           <Start>0x10000000</Start><Size>0x1000</Size><Type>Code</Type>\
           <Attribute>RXS</Attribute>\
         </Memory>\
         <Memory>\
           <Start>Auto</Start><Size>0x400</Size><Type>Data</Type>\
           <Attribute>RW</Attribute>\
         </Memory>\
         <Thread>\
           <Name>Worker</Name><Entry>worker</Entry>\
           <Stack_Addr>Auto</Stack_Addr><Stack_Size>0x200</Stack_Size>\
           <Parameter>1</Parameter><Priority>10</Priority>\
         </Thread>\
         <Invocation>\
           <Name>Handle</Name><Entry>handle</Entry>\
           <Stack_Addr>0x20001000</Stack_Addr><Stack_Size>0x100</Stack_Size>\
         </Invocation>\
         <Port><Name>Log</Name><Process>Logger</Process></Port>\
         <Receive><Name>Wakeup</Name></Receive>\
         <Send><Name>Event</Name><Process>Logger</Process></Send>\
         <Vector><Name>Timer</Name></Vector>",
    )));

    assert_eq!(proj.name(), "Test");
    assert_eq!(proj.plat(), "A7M");
    assert_eq!(proj.chip_class(), "TC1");
    assert_eq!(proj.chip_full(), "TC1FULL");

    let rme = proj.rme();
    assert_eq!(rme.comp().opt(), OptLevel::O2);
    assert_eq!(rme.comp().prio(), OptPrio::Size);
    assert_eq!(rme.code_start(), 0x0800_0000);
    assert_eq!(rme.code_size(), 0x8000);
    assert_eq!(rme.data_start(), 0x2000_0000);
    assert_eq!(rme.kmem_order(), 4);
    assert_eq!(rme.kern_prios(), 32);

    let rvm = proj.rvm();
    assert_eq!(rvm.code_size(), 0x8000);
    assert_eq!(rvm.extra_captbl(), 8);
    assert_eq!(rvm.recovery(), Recovery::Thread);

    assert_eq!(proj.procs().len(), 1);
    let p = &proj.procs()[0];
    assert_eq!(p.name(), "Acc");
    assert_eq!(p.extra_captbl(), 4);
    assert_eq!(p.mems().len(), 2);
    assert_eq!(p.mems()[0].kind(), MemKind::Code);
    assert_eq!(p.mems()[0].start(), Some(0x1000_0000));
    assert_eq!(p.mems()[0].attr(), MemAttr::R | MemAttr::X | MemAttr::S);
    assert_eq!(p.mems()[1].start(), None);

    assert_eq!(p.threads().len(), 1);
    assert_eq!(p.threads()[0].name(), "Worker");
    assert_eq!(p.threads()[0].entry(), "worker");
    assert_eq!(p.threads()[0].stack_addr(), None);
    assert_eq!(p.threads()[0].stack_size(), 0x200);
    assert_eq!(p.threads()[0].prio(), 10);

    assert_eq!(p.invs().len(), 1);
    assert_eq!(p.invs()[0].stack_addr(), Some(0x2000_1000));
    assert_eq!(p.ports()[0].target(), "Logger");
    assert_eq!(p.recvs()[0].name(), "Wakeup");
    assert_eq!(p.sends()[0].name(), "Event");
    assert_eq!(p.vects()[0].name(), "Timer");
}

#[test]
fn project_missing_sections() {
    // every required section is reported with its breadcrumb
    let no_name = "<Project><Platform>A7M</Platform></Project>";
    let err = config::project::parse(&XmlNode::parse(no_name).unwrap()).unwrap_err();
    assert!(format!("{:?}", err).contains("Project.Name"));

    let bad = project_xml("").replace("<Kern_Prios>32</Kern_Prios>", "");
    let err = config::project::parse(&XmlNode::parse(&bad).unwrap()).unwrap_err();
    assert!(format!("{:?}", err).contains("Kern_Prios"));

    let bad = project_xml("").replace("0x8000", "0xg000");
    let err = config::project::parse(&XmlNode::parse(&bad).unwrap()).unwrap_err();
    assert!(format!("{:?}", err).contains("not a valid hex number"));
}

#[test]
fn project_rejects_zero_size() {
    let bad = project_xml(&proc_xml(
        "P",
        "<Memory>\
           <Start>Auto</Start><Size>0x0</Size><Type>Code</Type>\
           <Attribute>RX</Attribute>\
         </Memory>",
    ));
    assert!(config::project::parse(&XmlNode::parse(&bad).unwrap()).is_err());
}

#[test]
fn project_rejects_out_of_bound() {
    let bad = project_xml(&proc_xml(
        "P",
        "<Memory>\
           <Start>0xFFFFFF00</Start><Size>0x200</Size><Type>Code</Type>\
           <Attribute>RX</Attribute>\
         </Memory>",
    ));
    assert!(config::project::parse(&XmlNode::parse(&bad).unwrap()).is_err());
}

#[test]
fn chip_shape() {
    let chip = parse_chip(CHIP);
    assert_eq!(chip.class(), "TC1");
    assert_eq!(chip.compat(), ["TC1FULL", "TC1OTHER"]);
    assert_eq!(chip.vendor(), "TestVendor");
    assert_eq!(chip.plat(), "A7M");
    assert_eq!(chip.cores(), 1);
    assert_eq!(chip.regions(), 8);
    assert_eq!(chip.mems().len(), 3);
    assert_eq!(chip.mems_of(MemKind::Code).count(), 1);
    assert_eq!(chip.mems_of(MemKind::Device).next().unwrap().size(), 0x10000);
    assert_eq!(chip.vects().len(), 2);
    assert_eq!(chip.find_vect("Uart").unwrap().num(), 38);
    assert_eq!(chip.find_vect("uart").unwrap().num(), 38);
    assert!(chip.find_vect("Spi").is_none());
}

#[test]
fn chip_options() {
    let xml = CHIP.replace(
        "</Chip>",
        "<Option>\
           <Name>Heap</Name><Type>Range</Type>\
           <Macro>TC1_HEAP_SIZE</Macro><Range>1,64</Range>\
         </Option>\
         </Chip>",
    );
    let chip = parse_chip(&xml);
    assert_eq!(chip.options().len(), 1);
    assert_eq!(chip.options()[0].macro_name(), "TC1_HEAP_SIZE");

    let bad = xml.replace("Range</Type>", "Slider</Type>");
    assert!(config::chip::parse(&XmlNode::parse(&bad).unwrap()).is_err());
}

#[test]
fn xml_errors() {
    assert!(XmlNode::parse("").is_err());
    assert!(XmlNode::parse("<").is_err());
    assert!(XmlNode::parse(">").is_err());
    assert!(XmlNode::parse("<Project").is_err());
    assert!(XmlNode::parse("<Project>").is_err());
    assert!(XmlNode::parse("</Project>").is_err());
    assert!(XmlNode::parse("<Project></Other>").is_err());
    assert!(XmlNode::parse("<A><B></B>").is_err());
}
