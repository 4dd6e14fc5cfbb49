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

use mcugen::config::validator;

use common::{parse_chip, parse_project, proc_xml, project_xml, simple_proc, CHIP};

fn validate(procs: &str) -> Result<(), mcugen::error::Error> {
    validate_against(procs, CHIP)
}

fn validate_against(procs: &str, chip: &str) -> Result<(), mcugen::error::Error> {
    let mut proj = parse_project(&project_xml(procs));
    let chip = parse_chip(chip);
    validator::validate(&mut proj, &chip)
}

#[test]
fn valid_minimal() {
    assert!(validate(&simple_proc("Acc")).is_ok());
}

#[test]
fn duplicate_process_names() {
    let procs = format!("{}{}", simple_proc("Acc"), simple_proc("acc"));
    let err = validate(&procs).unwrap_err();
    assert!(err.is_semantic());
    assert!(format!("{:?}", err).contains("acc"));
}

#[test]
fn invalid_identifiers() {
    let err = validate(&simple_proc("3acc")).unwrap_err();
    assert!(err.is_semantic());

    let body = simple_proc("Acc").replace("<Name>Main</Name>", "<Name>Ma in</Name>");
    assert!(validate(&body).is_err());
}

#[test]
fn duplicate_threads() {
    let body = proc_xml(
        "Acc",
        "<Memory>\
           <Start>Auto</Start><Size>0x1000</Size><Type>Code</Type>\
           <Attribute>RX</Attribute>\
         </Memory>\
         <Memory>\
           <Start>Auto</Start><Size>0x400</Size><Type>Data</Type>\
           <Attribute>RW</Attribute>\
         </Memory>\
         <Thread>\
           <Name>Main</Name><Entry>a</Entry><Stack_Addr>Auto</Stack_Addr>\
           <Stack_Size>0x100</Stack_Size><Parameter>0</Parameter>\
           <Priority>5</Priority>\
         </Thread>\
         <Thread>\
           <Name>MAIN</Name><Entry>b</Entry><Stack_Addr>Auto</Stack_Addr>\
           <Stack_Size>0x100</Stack_Size><Parameter>0</Parameter>\
           <Priority>6</Priority>\
         </Thread>",
    );
    let err = validate(&body).unwrap_err();
    assert!(err.is_semantic());
}

#[test]
fn port_rules() {
    // a port must not target its own process
    let own = simple_proc("Acc").replace(
        "</Process>",
        "<Port><Name>Foo</Name><Process>Acc</Process></Port></Process>",
    );
    assert!(validate(&own).is_err());

    // two ports with the same name for different targets are fine
    let two = format!(
        "{}{}{}",
        simple_proc("Log"),
        simple_proc("Net"),
        simple_proc("Acc").replace(
            "</Process>",
            "<Port><Name>Foo</Name><Process>Log</Process></Port>\
             <Port><Name>Foo</Name><Process>Net</Process></Port></Process>",
        )
    );
    assert!(validate(&two).is_ok());

    // the same (target, name) pair twice is not
    let dup = format!(
        "{}{}",
        simple_proc("Log"),
        simple_proc("Acc").replace(
            "</Process>",
            "<Port><Name>Foo</Name><Process>Log</Process></Port>\
             <Port><Name>foo</Name><Process>log</Process></Port></Process>",
        )
    );
    assert!(validate(&dup).is_err());
}

#[test]
fn vector_namespace() {
    // a vector and a receive endpoint of the same name collide even across
    // processes
    let procs = format!(
        "{}{}",
        simple_proc("Acc").replace(
            "</Process>",
            "<Vector><Name>Timer</Name></Vector></Process>"
        ),
        simple_proc("Log").replace(
            "</Process>",
            "<Receive><Name>Timer</Name></Receive></Process>"
        )
    );
    let err = validate(&procs).unwrap_err();
    assert!(err.is_semantic());
    assert!(format!("{:?}", err).contains("Timer"));

    // two vectors of the same name collide as well
    let procs = format!(
        "{}{}",
        simple_proc("Acc").replace(
            "</Process>",
            "<Vector><Name>Timer</Name></Vector></Process>"
        ),
        simple_proc("Log").replace(
            "</Process>",
            "<Vector><Name>timer</Name></Vector></Process>"
        )
    );
    assert!(validate(&procs).is_err());
}

#[test]
fn vector_needs_chip_interrupt() {
    let procs = simple_proc("Acc").replace(
        "</Process>",
        "<Vector><Name>Spi</Name></Vector></Process>",
    );
    let err = validate(&procs).unwrap_err();
    assert!(err.is_semantic());
    assert!(format!("{:?}", err).contains("Spi"));
}

#[test]
fn segments_required() {
    let no_code = proc_xml(
        "Acc",
        "<Memory>\
           <Start>Auto</Start><Size>0x400</Size><Type>Data</Type>\
           <Attribute>RW</Attribute>\
         </Memory>",
    );
    let err = validate(&no_code).unwrap_err();
    assert!(format!("{:?}", err).contains("code segment"));

    let no_data = proc_xml(
        "Acc",
        "<Memory>\
           <Start>Auto</Start><Size>0x400</Size><Type>Code</Type>\
           <Attribute>RX</Attribute>\
         </Memory>",
    );
    let err = validate(&no_data).unwrap_err();
    assert!(format!("{:?}", err).contains("data segment"));
}

#[test]
fn device_containment() {
    // inside the chip's device window
    let ok = simple_proc("Acc").replace(
        "</Process>",
        "<Memory>\
           <Start>0x40000000</Start><Size>0x1000</Size><Type>Device</Type>\
           <Attribute>RW</Attribute>\
         </Memory></Process>",
    );
    assert!(validate(&ok).is_ok());

    // crossing the end of the chip's device window
    let out = simple_proc("Acc").replace(
        "</Process>",
        "<Memory>\
           <Start>0x4000F000</Start><Size>0x2000</Size><Type>Device</Type>\
           <Attribute>RW</Attribute>\
         </Memory></Process>",
    );
    let err = validate(&out).unwrap_err();
    assert!(err.is_semantic());

    // completely outside any chip device segment
    let chip_small = CHIP.replace(
        "<Start>0x40000000</Start><Size>0x10000</Size>",
        "<Start>0x30000000</Start><Size>0x10000</Size>",
    );
    let outside = simple_proc("Acc").replace(
        "</Process>",
        "<Memory>\
           <Start>0x40000000</Start><Size>0x1000</Size><Type>Device</Type>\
           <Attribute>RW</Attribute>\
         </Memory></Process>",
    );
    assert!(validate_against(&outside, &chip_small).is_err());

    // device segments cannot be auto-placed
    let auto = simple_proc("Acc").replace(
        "</Process>",
        "<Memory>\
           <Start>Auto</Start><Size>0x1000</Size><Type>Device</Type>\
           <Attribute>RW</Attribute>\
         </Memory></Process>",
    );
    assert!(validate(&auto).is_err());
}

#[test]
fn chip_cross_checks() {
    // chip platform differs from the project platform
    let other_plat = CHIP.replace("<Platform>A7M</Platform>", "<Platform>R5F</Platform>");
    assert!(validate_against(&simple_proc("Acc"), &other_plat).is_err());

    // the full chip name has to be in the compatible list
    let other_compat = CHIP.replace("TC1FULL,", "");
    assert!(validate_against(&simple_proc("Acc"), &other_compat).is_err());
}

#[test]
fn chip_option_values() {
    let chip = CHIP.replace(
        "</Chip>",
        "<Option>\
           <Name>Heap</Name><Type>Range</Type>\
           <Macro>TC1_HEAP</Macro><Range>1,64</Range>\
         </Option></Chip>",
    );

    // not configured at all
    assert!(validate_against(&simple_proc("Acc"), &chip).is_err());

    // configured within the range
    let proj_ok = |v: &str| {
        project_xml(&simple_proc("Acc")).replace(
            "<Chip></Chip>",
            &format!("<Chip><Heap>{}</Heap></Chip>", v),
        )
    };
    let mut proj = parse_project(&proj_ok("16"));
    assert!(validator::validate(&mut proj, &parse_chip(&chip)).is_ok());

    let mut proj = parse_project(&proj_ok("65"));
    assert!(validator::validate(&mut proj, &parse_chip(&chip)).is_err());

    // select options check membership
    let sel = chip
        .replace("<Type>Range</Type>", "<Type>Select</Type>")
        .replace("<Range>1,64</Range>", "<Range>On,Off</Range>");
    let mut proj = parse_project(&proj_ok("On"));
    assert!(validator::validate(&mut proj, &parse_chip(&sel)).is_ok());
    let mut proj = parse_project(&proj_ok("Maybe"));
    assert!(validator::validate(&mut proj, &parse_chip(&sel)).is_err());
}
