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

//! Emission: the output skeleton, the verbatim kernel/runtime copies, and
//! all generated headers, scripts, and project files. Output is byte-stable
//! across runs on the same inputs.

pub mod boot;
pub mod linker;
pub mod project;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::info;

use crate::arch::RegionNode;
use crate::caps::CapTable;
use crate::config::{Chip, Project};
use crate::error::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OutFormat {
    Keil,
    Eclipse,
    Makefile,
}

impl OutFormat {
    pub fn from_arg(s: &str) -> Result<OutFormat, Error> {
        match s {
            "keil" => Ok(OutFormat::Keil),
            "eclipse" => Ok(OutFormat::Eclipse),
            "makefile" => Ok(OutFormat::Makefile),
            _ => Err(Error::CmdLine(format!(
                "'{}' is not a supported output format",
                s
            ))),
        }
    }
}

/// Everything the emitters need, read-only
pub struct GenCtx<'c> {
    pub proj: &'c Project,
    pub chip: &'c Chip,
    pub pgtbls: &'c [RegionNode],
    pub caps: &'c CapTable,
    pub rme_root: &'c Path,
    pub rvm_root: &'c Path,
    pub out: &'c Path,
    pub format: OutFormat,
}

impl GenCtx<'_> {
    pub fn rme_dir(&self) -> PathBuf {
        self.out.join("M7M1_MuEukaron")
    }

    pub fn rvm_dir(&self) -> PathBuf {
        self.out.join("M7M2_MuAmmonite")
    }

    pub fn proc_dir(&self, name: &str) -> PathBuf {
        self.out.join(format!("Proc_{}", name))
    }
}

/// Emits the complete output tree
pub fn emit(ctx: &GenCtx<'_>) -> Result<(), Error> {
    make_skeleton(ctx)?;
    copy_static(ctx)?;
    write_headers(ctx)?;
    linker::emit(ctx)?;
    boot::emit(ctx)?;
    project::emit(ctx)?;
    info!("emitted the project tree to {}", ctx.out.display());
    Ok(())
}

pub(crate) fn make_dir(path: &Path) -> Result<(), Error> {
    fs::create_dir_all(path).map_err(|e| {
        Error::Emission(format!("cannot create {}: {}", path.display(), e))
    })
}

/// Opens a fresh output file below an already-created directory
pub(crate) fn create(path: &Path) -> Result<fs::File, Error> {
    fs::File::create(path).map_err(|e| {
        Error::Emission(format!("cannot create {}: {}", path.display(), e))
    })
}

pub(crate) fn write_file(path: &Path, content: &str) -> Result<(), Error> {
    let mut f = create(path)?;
    f.write_all(content.as_bytes())
        .map_err(|e| Error::Emission(format!("cannot write {}: {}", path.display(), e)))
}

fn make_skeleton(ctx: &GenCtx<'_>) -> Result<(), Error> {
    let plat = ctx.proj.plat();
    let class = ctx.proj.chip_class();

    let rme = ctx.rme_dir();
    make_dir(&rme.join("Documents"))?;
    make_dir(&rme.join("MEukaron/Include/Kernel"))?;
    make_dir(&rme.join(format!("MEukaron/Include/Platform/{}/Chips/{}", plat, class)))?;
    make_dir(&rme.join("MEukaron/Kernel"))?;
    make_dir(&rme.join(format!("MEukaron/Platform/{}", plat)))?;
    make_dir(&rme.join("Project"))?;

    let rvm = ctx.rvm_dir();
    make_dir(&rvm.join("Documents"))?;
    make_dir(&rvm.join(format!("MAmmonite/Include/Platform/{}/Chips/{}", plat, class)))?;
    make_dir(&rvm.join(format!("MAmmonite/Platform/{}", plat)))?;
    make_dir(&rvm.join("Project"))?;

    for p in ctx.proj.procs() {
        let dir = ctx.proc_dir(p.name());
        make_dir(&dir.join("Include"))?;
        make_dir(&dir.join("Source"))?;
        make_dir(&dir.join("Project"))?;
    }
    Ok(())
}

/// Copies the directory tree at `src` below `dst`, creating directories as
/// needed. Entries are visited in name order so runs are reproducible.
pub(crate) fn copy_tree(src: &Path, dst: &Path) -> Result<(), Error> {
    if !src.is_dir() {
        return Err(Error::Emission(format!(
            "source directory {} is missing",
            src.display()
        )));
    }
    make_dir(dst)?;

    let mut entries: Vec<_> = fs::read_dir(src)
        .map_err(|e| Error::Emission(format!("cannot read {}: {}", src.display(), e)))?
        .collect::<Result<_, _>>()
        .map_err(|e| Error::Emission(format!("cannot read {}: {}", src.display(), e)))?;
    entries.sort_by_key(|e| e.file_name());

    for e in entries {
        let from = e.path();
        let to = dst.join(e.file_name());
        if from.is_dir() {
            copy_tree(&from, &to)?;
        }
        else {
            fs::copy(&from, &to).map_err(|e| {
                Error::Emission(format!(
                    "cannot copy {} to {}: {}",
                    from.display(),
                    to.display(),
                    e
                ))
            })?;
        }
    }
    Ok(())
}

fn copy_static(ctx: &GenCtx<'_>) -> Result<(), Error> {
    let plat = ctx.proj.plat();
    let rme = ctx.rme_dir();
    let rvm = ctx.rvm_dir();

    copy_tree(
        &ctx.rme_root.join("MEukaron/Kernel"),
        &rme.join("MEukaron/Kernel"),
    )?;
    copy_tree(
        &ctx.rme_root.join("MEukaron/Include/Kernel"),
        &rme.join("MEukaron/Include/Kernel"),
    )?;
    copy_tree(
        &ctx.rme_root.join(format!("MEukaron/Include/Platform/{}", plat)),
        &rme.join(format!("MEukaron/Include/Platform/{}", plat)),
    )?;
    copy_tree(
        &ctx.rme_root.join(format!("MEukaron/Platform/{}", plat)),
        &rme.join(format!("MEukaron/Platform/{}", plat)),
    )?;

    copy_tree(
        &ctx.rvm_root.join("MAmmonite/Include"),
        &rvm.join("MAmmonite/Include"),
    )?;
    copy_tree(
        &ctx.rvm_root.join(format!("MAmmonite/Platform/{}", plat)),
        &rvm.join(format!("MAmmonite/Platform/{}", plat)),
    )?;

    // documentation is nice to carry along but not required to build
    for (root, dir) in [(ctx.rme_root, &rme), (ctx.rvm_root, &rvm)] {
        let docs = root.join("Documents");
        if docs.is_dir() {
            copy_tree(&docs, &dir.join("Documents"))?;
        }
    }
    Ok(())
}

/// A valid C macro fragment from an object name
pub(crate) fn macroize(name: &str) -> String {
    name.to_ascii_uppercase()
}

fn write_headers(ctx: &GenCtx<'_>) -> Result<(), Error> {
    let plat = ctx.proj.plat();
    let plat_lc = plat.to_ascii_lowercase();
    let class = ctx.proj.chip_class();

    // the selection headers the copied sources include first
    let rme_sel = format!(
        "/* Platform selection header generated by mcugen */\n\
         #include \"Platform/{}/rme_platform_{}.h\"\n\
         #include \"Platform/{}/Chips/{}/rme_platform_{}_conf.h\"\n",
        plat, plat_lc, plat, class, class
    );
    write_file(
        &ctx.rme_dir().join("MEukaron/Include/rme_platform.h"),
        &rme_sel,
    )?;

    let rvm_sel = format!(
        "/* Platform selection header generated by mcugen */\n\
         #include \"Platform/{}/rvm_platform_{}.h\"\n",
        plat, plat_lc
    );
    write_file(
        &ctx.rvm_dir().join("MAmmonite/Include/rvm_platform.h"),
        &rvm_sel,
    )?;

    // the chip configuration header: kernel layout plus the chip options
    // with the values the project chose
    let mut conf = String::new();
    conf.push_str(&format!(
        "/* Chip configuration for {} generated by mcugen */\n\n",
        ctx.proj.chip_full()
    ));
    let rme = ctx.proj.rme();
    conf.push_str(&format!(
        "#define RME_CODE_START                  {:#X}U\n\
         #define RME_CODE_SIZE                   {:#X}U\n\
         #define RME_DATA_START                  {:#X}U\n\
         #define RME_DATA_SIZE                   {:#X}U\n\
         #define RME_EXTRA_KMEM                  {:#X}U\n\
         #define RME_KMEM_SLOT_ORDER             {}U\n\
         #define RME_MAX_PREEMPT_PRIO            {}U\n\n",
        rme.code_start(),
        rme.code_size(),
        rme.data_start(),
        rme.data_size(),
        rme.extra_kmem(),
        rme.kmem_order(),
        rme.kern_prios()
    ));
    for opt in ctx.chip.options() {
        let val = ctx
            .proj
            .rme()
            .chip_raw()
            .iter()
            .find(|r| r.tag().eq_ignore_ascii_case(opt.name()))
            .map(|r| r.val())
            .expect("validated chip option without value");
        conf.push_str(&format!("#define {:<31} ({})\n", opt.macro_name(), val));
    }

    // the raw platform and chip attributes go through uninterpreted
    for r in ctx.proj.rme().plat_raw() {
        let mac = format!("RME_PLAT_{}", macroize(r.tag()));
        conf.push_str(&format!("#define {:<31} ({})\n", mac, r.val()));
    }
    for r in ctx.chip.attrs() {
        let mac = format!("RME_CHIP_{}", macroize(r.tag()));
        conf.push_str(&format!("#define {:<31} ({})\n", mac, r.val()));
    }
    write_file(
        &ctx.rme_dir().join(format!(
            "MEukaron/Include/Platform/{}/Chips/{}/rme_platform_{}_conf.h",
            plat, class, class
        )),
        &conf,
    )?;
    Ok(())
}
