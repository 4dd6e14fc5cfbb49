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

//! Linker and scatter scripts: one per built image, with the addresses taken
//! bit-exact from the placement result.

use std::fmt::Write;
use std::path::PathBuf;

use crate::config::MemKind;
use crate::error::Error;
use crate::gen::{write_file, GenCtx, OutFormat};

/// One built image and its primary code/data windows
pub struct Image {
    pub name: String,
    pub code_start: u64,
    pub code_size: u64,
    pub data_start: u64,
    pub data_size: u64,
    dir: PathBuf,
    srcs: String,
}

impl Image {
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// The source globs of this image, relative to its project directory
    pub fn srcs(&self) -> &str {
        &self.srcs
    }
}

/// The images of a run in build order: RME, RVM, then every process
pub fn images(ctx: &GenCtx<'_>) -> Vec<Image> {
    let rme = ctx.proj.rme();
    let rvm = ctx.proj.rvm();
    let plat = ctx.proj.plat();
    let mut images = vec![
        Image {
            name: "RME".to_string(),
            code_start: rme.code_start(),
            code_size: rme.code_size(),
            data_start: rme.data_start(),
            data_size: rme.data_size(),
            dir: ctx.rme_dir().join("Project"),
            srcs: format!(
                "../MEukaron/Kernel/*.c ../MEukaron/Platform/{}/*.c",
                plat
            ),
        },
        Image {
            name: "RVM".to_string(),
            code_start: rme.code_start() + rme.code_size(),
            code_size: rvm.code_size(),
            data_start: rme.data_start() + rme.data_size(),
            data_size: rvm.data_size(),
            dir: ctx.rvm_dir().join("Project"),
            srcs: format!(
                "../MAmmonite/*.c ../MAmmonite/Platform/{}/*.c",
                plat
            ),
        },
    ];

    for p in ctx.proj.procs() {
        // the first code and data segments are the primary ones the image
        // links against
        let code = p.mems_of(MemKind::Code).next().expect("validated");
        let data = p.mems_of(MemKind::Data).next().expect("validated");
        images.push(Image {
            name: p.name().to_string(),
            code_start: code.addr(),
            code_size: code.size(),
            data_start: data.addr(),
            data_size: data.size(),
            dir: ctx.proc_dir(p.name()).join("Project"),
            srcs: "../Source/*.c".to_string(),
        });
    }
    images
}

pub fn emit(ctx: &GenCtx<'_>) -> Result<(), Error> {
    for img in images(ctx) {
        let (file, content) = match ctx.format {
            OutFormat::Keil => (
                img.dir.join(format!("{}.sct", img.name.to_ascii_lowercase())),
                scatter(&img),
            ),
            OutFormat::Eclipse | OutFormat::Makefile => (
                img.dir.join(format!("{}.ld", img.name.to_ascii_lowercase())),
                ldscript(&img),
            ),
        };
        write_file(&file, &content)?;
    }
    Ok(())
}

fn scatter(img: &Image) -> String {
    let mut s = String::new();
    writeln!(s, "; Scatter file of {}, generated by mcugen", img.name).unwrap();
    writeln!(s, "LR_IROM1 {:#010X} {:#010X}", img.code_start, img.code_size).unwrap();
    writeln!(s, "{{").unwrap();
    writeln!(s, "    ER_IROM1 {:#010X} {:#010X}", img.code_start, img.code_size).unwrap();
    writeln!(s, "    {{").unwrap();
    writeln!(s, "        *.o (RESET, +First)").unwrap();
    writeln!(s, "        *(InRoot$$Sections)").unwrap();
    writeln!(s, "        .ANY (+RO)").unwrap();
    writeln!(s, "    }}").unwrap();
    writeln!(s, "    RW_IRAM1 {:#010X} {:#010X}", img.data_start, img.data_size).unwrap();
    writeln!(s, "    {{").unwrap();
    writeln!(s, "        .ANY (+RW +ZI)").unwrap();
    writeln!(s, "    }}").unwrap();
    writeln!(s, "}}").unwrap();
    s
}

fn ldscript(img: &Image) -> String {
    let mut s = String::new();
    writeln!(s, "/* Linker script of {}, generated by mcugen */", img.name).unwrap();
    writeln!(s, "MEMORY").unwrap();
    writeln!(s, "{{").unwrap();
    writeln!(
        s,
        "    FLASH (rx)  : ORIGIN = {:#010X}, LENGTH = {:#X}",
        img.code_start, img.code_size
    )
    .unwrap();
    writeln!(
        s,
        "    RAM   (rwx) : ORIGIN = {:#010X}, LENGTH = {:#X}",
        img.data_start, img.data_size
    )
    .unwrap();
    writeln!(s, "}}").unwrap();
    writeln!(s).unwrap();
    writeln!(s, "SECTIONS").unwrap();
    writeln!(s, "{{").unwrap();
    writeln!(s, "    .text :").unwrap();
    writeln!(s, "    {{").unwrap();
    writeln!(s, "        KEEP(*(.isr_vector))").unwrap();
    writeln!(s, "        *(.text*)").unwrap();
    writeln!(s, "        *(.rodata*)").unwrap();
    writeln!(s, "    }} > FLASH").unwrap();
    writeln!(s).unwrap();
    writeln!(s, "    .data :").unwrap();
    writeln!(s, "    {{").unwrap();
    writeln!(s, "        *(.data*)").unwrap();
    writeln!(s, "    }} > RAM AT > FLASH").unwrap();
    writeln!(s).unwrap();
    writeln!(s, "    .bss :").unwrap();
    writeln!(s, "    {{").unwrap();
    writeln!(s, "        *(.bss*)").unwrap();
    writeln!(s, "        *(COMMON)").unwrap();
    writeln!(s, "    }} > RAM").unwrap();
    writeln!(s, "}}").unwrap();
    s
}
