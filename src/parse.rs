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

//! Contains utility functions for parsing values from XML text

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::Error;

/// One past the highest address on the 32-bit targets we generate for
pub const ADDR_SPACE_END: u64 = 0x1_0000_0000;

bitflags! {
    /// The attribute bitmap of a memory segment
    pub struct MemAttr: u32 {
        /// Readable
        const R = 1;
        /// Writable
        const W = 2;
        /// Executable
        const X = 4;
        /// Bufferable
        const B = 8;
        /// Cacheable
        const C = 16;
        /// Static (always mapped in)
        const S = 32;
    }
}

lazy_static! {
    static ref IDENT: Regex = Regex::new("^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Returns true if `s` is a valid object name
pub fn is_ident(s: &str) -> bool {
    IDENT.is_match(s)
}

/// Parses a hex number (`0x` or `0X` prefixed or bare) from the given string
///
/// Values are interpreted mod 2^32. `path` names the section for error
/// reporting.
pub fn hex(path: &str, s: &str) -> Result<u64, Error> {
    let digits = if let Some(rest) = s.strip_prefix("0x") {
        rest
    }
    else if let Some(rest) = s.strip_prefix("0X") {
        rest
    }
    else {
        s
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::XmlSyntax(format!(
            "{} is not a valid hex number",
            path
        )));
    }

    let mut val: u64 = 0;
    for c in digits.chars() {
        val = (val << 4) | c.to_digit(16).unwrap() as u64;
        val &= ADDR_SPACE_END - 1;
    }
    Ok(val)
}

/// Parses a hex number like [`hex`], additionally accepting the literal
/// `Auto`, which yields `None`
pub fn hex_or_auto(path: &str, s: &str) -> Result<Option<u64>, Error> {
    if s == "Auto" {
        Ok(None)
    }
    else {
        hex(path, s).map(Some)
    }
}

/// Parses an unsigned decimal integer from the given string
pub fn uint(path: &str, s: &str) -> Result<u64, Error> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::XmlSyntax(format!(
            "{} is not a valid unsigned integer",
            path
        )));
    }
    s.parse::<u64>().map_err(|_| {
        Error::XmlSyntax(format!("{} is not a valid unsigned integer", path))
    })
}

/// Parses an unsigned decimal integer like [`uint`], additionally accepting
/// the literal `Auto`, which yields `None`
pub fn uint_or_auto(path: &str, s: &str) -> Result<Option<u64>, Error> {
    if s == "Auto" {
        Ok(None)
    }
    else {
        uint(path, s).map(Some)
    }
}

/// Parses a memory attribute string
///
/// Expects arbitrary combinations of the letters 'R', 'W', 'X', 'B', 'C', and
/// 'S'; at least one of R/W/X must be present.
pub fn attr(path: &str, s: &str) -> Result<MemAttr, Error> {
    let mut attr = MemAttr::empty();
    for c in s.chars() {
        match c {
            'R' => attr |= MemAttr::R,
            'W' => attr |= MemAttr::W,
            'X' => attr |= MemAttr::X,
            'B' => attr |= MemAttr::B,
            'C' => attr |= MemAttr::C,
            'S' => attr |= MemAttr::S,
            _ => {
                return Err(Error::XmlSyntax(format!(
                    "{} contains the invalid attribute character '{}'",
                    path, c
                )))
            },
        }
    }

    if !attr.intersects(MemAttr::R | MemAttr::W | MemAttr::X) {
        return Err(Error::XmlSyntax(format!(
            "{} does not allow any access",
            path
        )));
    }
    Ok(attr)
}
