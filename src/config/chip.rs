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

//! Turns the chip description tree into the typed model

use crate::config::{
    child, child_value, Chip, ChipOption, ChipVector, MemKind, MemSegment, OptionType, RawTag,
};
use crate::error::Error;
use crate::parse;
use crate::xml::XmlNode;

/// Parses a complete chip description from its root element
pub fn parse(root: &XmlNode) -> Result<Chip, Error> {
    if root.tag() != "Chip" {
        return Err(Error::XmlSyntax(format!(
            "Chip root expected, found '{}'",
            root.tag()
        )));
    }

    let class = child_value(root, "Chip", "Class")?;
    let compat = child_value(root, "Chip", "Compatible")?
        .split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    let vendor = child_value(root, "Chip", "Vendor")?;
    let plat = child_value(root, "Chip", "Platform")?;
    let cores = parse::uint("Chip.Cores", &child_value(root, "Chip", "Cores")?)?;
    let regions = parse::uint("Chip.Regions", &child_value(root, "Chip", "Regions")?)?;

    let mut attrs = Vec::new();
    for section in root.children_named("Attribute") {
        for c in section.children() {
            attrs.push(RawTag {
                tag: c.tag().to_string(),
                val: c.value().to_string(),
            });
        }
    }

    let mut mems = Vec::new();
    for trunk in root.children_named("Memory") {
        mems.push(parse_mem(trunk)?);
    }

    let mut options = Vec::new();
    for trunk in root.children_named("Option") {
        options.push(parse_option(trunk)?);
    }

    let mut vects = Vec::new();
    for trunk in root.children_named("Vector") {
        let path = "Chip.Vector";
        vects.push(ChipVector {
            name: child_value(trunk, path, "Name")?,
            num: parse::uint(
                &format!("{}.Number", path),
                &child_value(trunk, path, "Number")?,
            )?,
        });
    }

    Ok(Chip {
        class,
        compat,
        vendor,
        plat,
        cores,
        regions,
        attrs,
        mems,
        options,
        vects,
    })
}

fn parse_mem(trunk: &XmlNode) -> Result<MemSegment, Error> {
    let path = "Chip.Memory";
    let start = parse::hex(
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
    if start + size > parse::ADDR_SPACE_END {
        return Err(Error::XmlSyntax(format!("{}.Size is out of bounds", path)));
    }

    let kind = match child_value(trunk, path, "Type")?.as_str() {
        "Code" => MemKind::Code,
        "Data" => MemKind::Data,
        "Device" => MemKind::Device,
        _ => return Err(Error::XmlSyntax(format!("{}.Type is malformed", path))),
    };

    Ok(MemSegment {
        start: Some(start),
        size,
        kind,
        attr: crate::parse::MemAttr::empty(),
        align: 0,
    })
}

fn parse_option(trunk: &XmlNode) -> Result<ChipOption, Error> {
    let path = "Chip.Option";
    let name = child_value(trunk, path, "Name")?;
    let ty = match child_value(trunk, path, "Type")?.as_str() {
        "Range" => OptionType::Range,
        "Select" => OptionType::Select,
        _ => return Err(Error::XmlSyntax(format!("{}.Type is malformed", path))),
    };
    let macro_name = child_value(trunk, path, "Macro")?;
    let range = child_value(trunk, path, "Range")?;

    Ok(ChipOption {
        name,
        ty,
        macro_name,
        range,
    })
}
