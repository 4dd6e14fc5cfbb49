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

//! IDE and Makefile project files, plus the per-process headers and entry
//! stubs. All three output formats derive their compiler flags from the same
//! mapping, so they agree by construction.

use std::fmt::Write;

use crate::config::{CompInfo, OptPrio, Process};
use crate::error::Error;
use crate::gen::linker::{images, Image};
use crate::gen::{macroize, write_file, GenCtx, OutFormat};

pub fn emit(ctx: &GenCtx<'_>) -> Result<(), Error> {
    for p in ctx.proj.procs() {
        let dir = ctx.proc_dir(p.name());
        let lc = p.name().to_ascii_lowercase();
        write_file(
            &dir.join(format!("Include/proc_{}.h", lc)),
            &proc_hdr(p),
        )?;
        write_file(
            &dir.join(format!("Source/proc_{}.c", lc)),
            &proc_stubs(p),
        )?;
    }

    for img in images(ctx) {
        let comp = comp_of(ctx, &img.name);
        match ctx.format {
            OutFormat::Keil => write_file(
                &img.dir().join(format!("{}.uvprojx", img.name.to_ascii_lowercase())),
                &keil(ctx, &img, comp),
            )?,
            OutFormat::Eclipse => {
                write_file(&img.dir().join(".project"), &eclipse_project(&img))?;
                write_file(&img.dir().join(".cproject"), &eclipse_cproject(&img, comp))?;
            },
            OutFormat::Makefile => write_file(&img.dir().join("Makefile"), &makefile(&img, comp))?,
        }
    }
    Ok(())
}

fn comp_of<'p>(ctx: &GenCtx<'p>, image: &str) -> &'p CompInfo {
    match image {
        "RME" => ctx.proj.rme().comp(),
        "RVM" => ctx.proj.rvm().comp(),
        name => {
            let (_, p) = ctx.proj.find_proc(name).expect("image without process");
            p.comp()
        },
    }
}

/// The compiler flags every format agrees on
fn cflags(comp: &CompInfo) -> String {
    let prio = match comp.prio() {
        OptPrio::Size => "",
        OptPrio::Time => " -funroll-loops",
    };
    format!("-mthumb {}{}", comp.opt().flag(), prio)
}

fn proc_hdr(p: &Process) -> String {
    let mut s = String::new();
    writeln!(
        s,
        "/* Local capability IDs of process {}, generated by mcugen */",
        p.name()
    )
    .unwrap();
    writeln!(s).unwrap();
    let pmac = macroize(p.name());
    writeln!(s, "#define {:<31} ({}U)", format!("{}_CAPTBL_SIZE", pmac), p.captbl_size()).unwrap();
    writeln!(s).unwrap();

    for t in p.threads() {
        writeln!(
            s,
            "#define {:<31} ({}U)",
            format!("{}_THD_{}", pmac, macroize(t.name())),
            t.cap().loc()
        )
        .unwrap();
    }
    for i in p.invs() {
        writeln!(
            s,
            "#define {:<31} ({}U)",
            format!("{}_INV_{}", pmac, macroize(i.name())),
            i.cap().loc()
        )
        .unwrap();
    }
    for port in p.ports() {
        writeln!(
            s,
            "#define {:<31} ({}U)",
            format!("{}_PORT_{}", pmac, macroize(port.name())),
            port.cap().loc()
        )
        .unwrap();
    }
    for r in p.recvs() {
        writeln!(
            s,
            "#define {:<31} ({}U)",
            format!("{}_RECV_{}", pmac, macroize(r.name())),
            r.cap().loc()
        )
        .unwrap();
    }
    for snd in p.sends() {
        writeln!(
            s,
            "#define {:<31} ({}U)",
            format!("{}_SEND_{}", pmac, macroize(snd.name())),
            snd.cap().loc()
        )
        .unwrap();
    }
    for v in p.vects() {
        writeln!(
            s,
            "#define {:<31} ({}U)",
            format!("{}_VECT_{}", pmac, macroize(v.name())),
            v.cap().loc()
        )
        .unwrap();
    }
    s
}

/// One weak stub per distinct entry symbol so the project links out of the
/// box; the user replaces them with the real implementations
fn proc_stubs(p: &Process) -> String {
    let mut s = String::new();
    writeln!(s, "/* Entry stubs of process {}, generated by mcugen */", p.name()).unwrap();
    writeln!(s).unwrap();
    writeln!(s, "#include \"proc_{}.h\"", p.name().to_ascii_lowercase()).unwrap();
    writeln!(s).unwrap();

    let mut seen = Vec::new();
    for t in p.threads() {
        if seen.iter().any(|e: &String| e == t.entry()) {
            continue;
        }
        seen.push(t.entry().to_string());
        writeln!(s, "/* Thread '{}', parameter \"{}\" */", t.name(), t.param()).unwrap();
        writeln!(s, "void {}(void* Param)", t.entry()).unwrap();
        writeln!(s, "{{").unwrap();
        writeln!(s, "    while(1);").unwrap();
        writeln!(s, "}}").unwrap();
        writeln!(s).unwrap();
    }
    for i in p.invs() {
        if seen.iter().any(|e: &String| e == i.entry()) {
            continue;
        }
        seen.push(i.entry().to_string());
        writeln!(s, "/* Invocation '{}' */", i.name()).unwrap();
        writeln!(s, "int {}(unsigned int Param)", i.entry()).unwrap();
        writeln!(s, "{{").unwrap();
        writeln!(s, "    return 0;").unwrap();
        writeln!(s, "}}").unwrap();
        writeln!(s).unwrap();
    }
    s
}

fn keil(ctx: &GenCtx<'_>, img: &Image, comp: &CompInfo) -> String {
    let mut s = String::new();
    writeln!(s, "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\" ?>").unwrap();
    writeln!(s, "<Project xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">").unwrap();
    writeln!(s, "  <Targets>").unwrap();
    writeln!(s, "    <Target>").unwrap();
    writeln!(s, "      <TargetName>{}</TargetName>", img.name).unwrap();
    writeln!(s, "      <Device>{}</Device>", ctx.proj.chip_full()).unwrap();
    writeln!(s, "      <Vendor>{}</Vendor>", ctx.chip.vendor()).unwrap();
    writeln!(
        s,
        "      <OutputName>{}</OutputName>",
        img.name.to_ascii_lowercase()
    )
    .unwrap();
    writeln!(
        s,
        "      <ScatterFile>{}.sct</ScatterFile>",
        img.name.to_ascii_lowercase()
    )
    .unwrap();
    writeln!(s, "      <MiscControls>{}</MiscControls>", cflags(comp)).unwrap();
    writeln!(s, "    </Target>").unwrap();
    writeln!(s, "  </Targets>").unwrap();
    writeln!(s, "</Project>").unwrap();
    s
}

fn eclipse_project(img: &Image) -> String {
    let mut s = String::new();
    writeln!(s, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>").unwrap();
    writeln!(s, "<projectDescription>").unwrap();
    writeln!(s, "  <name>{}</name>", img.name).unwrap();
    writeln!(s, "  <buildSpec>").unwrap();
    writeln!(s, "    <buildCommand>").unwrap();
    writeln!(
        s,
        "      <name>org.eclipse.cdt.managedbuilder.core.genmakebuilder</name>"
    )
    .unwrap();
    writeln!(s, "    </buildCommand>").unwrap();
    writeln!(s, "  </buildSpec>").unwrap();
    writeln!(s, "  <natures>").unwrap();
    writeln!(s, "    <nature>org.eclipse.cdt.core.cnature</nature>").unwrap();
    writeln!(s, "  </natures>").unwrap();
    writeln!(s, "</projectDescription>").unwrap();
    s
}

fn eclipse_cproject(img: &Image, comp: &CompInfo) -> String {
    let mut s = String::new();
    writeln!(s, "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>").unwrap();
    writeln!(s, "<cproject>").unwrap();
    writeln!(s, "  <configuration name=\"{}\">", img.name).unwrap();
    writeln!(s, "    <compilerFlags>{}</compilerFlags>", cflags(comp)).unwrap();
    writeln!(
        s,
        "    <linkerScript>{}.ld</linkerScript>",
        img.name.to_ascii_lowercase()
    )
    .unwrap();
    writeln!(s, "  </configuration>").unwrap();
    writeln!(s, "</cproject>").unwrap();
    s
}

fn makefile(img: &Image, comp: &CompInfo) -> String {
    let lc = img.name.to_ascii_lowercase();
    let mut s = String::new();
    writeln!(s, "# Makefile of {}, generated by mcugen", img.name).unwrap();
    writeln!(s).unwrap();
    writeln!(s, "CC      := arm-none-eabi-gcc").unwrap();
    writeln!(s, "CFLAGS  := {}", cflags(comp)).unwrap();
    writeln!(s, "LDFLAGS := -T {}.ld -nostartfiles", lc).unwrap();
    writeln!(s, "SRCS    := $(wildcard {})", img.srcs()).unwrap();
    writeln!(s, "OBJS    := $(SRCS:.c=.o)").unwrap();
    writeln!(s).unwrap();
    writeln!(s, "all: {}.elf", lc).unwrap();
    writeln!(s).unwrap();
    writeln!(s, "{}.elf: $(OBJS)", lc).unwrap();
    writeln!(s, "\t$(CC) $(LDFLAGS) -o $@ $^").unwrap();
    writeln!(s).unwrap();
    writeln!(s, "%.o: %.c").unwrap();
    writeln!(s, "\t$(CC) $(CFLAGS) -c -o $@ $<").unwrap();
    writeln!(s).unwrap();
    writeln!(s, "clean:").unwrap();
    writeln!(s, "\trm -f $(OBJS) {}.elf", lc).unwrap();
    writeln!(s).unwrap();
    writeln!(s, ".PHONY: all clean").unwrap();
    s
}
