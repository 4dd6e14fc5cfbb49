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

use log::{Level, Log, Metadata, Record};
use std::env;
use std::path::PathBuf;
use std::process::exit;
use std::str::FromStr;

use mcugen::error::Error;
use mcugen::gen::OutFormat;
use mcugen::Run;

struct Logger {
    level: Level,
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            let level_string = record.level().to_string();
            let target = if !record.target().is_empty() {
                record.target()
            }
            else {
                record.module_path().unwrap_or_default()
            };

            eprintln!("{:<5} [{}] {}", level_string, target, record.args());
        }
    }

    fn flush(&self) {
    }
}

fn usage(prog: &str) -> ! {
    eprintln!(
        "Usage: {} -i input.xml -o output_path -k rme_root -u rvm_root -f format",
        prog
    );
    eprintln!();
    eprintln!("  -i: project description file, with extension");
    eprintln!("  -o: output path; has to exist and be empty");
    eprintln!("  -k: RME root path; has to contain all necessary files");
    eprintln!("  -u: RVM root path; has to contain all necessary files");
    eprintln!("  -f: output format: keil, eclipse, or makefile");
    exit(1)
}

fn parse_args(args: &[String]) -> Result<Run, Error> {
    let mut input = None;
    let mut output = None;
    let mut rme_root = None;
    let mut rvm_root = None;
    let mut format = None;

    let mut i = 1;
    while i < args.len() {
        let slot = match args[i].as_str() {
            "-i" => &mut input,
            "-o" => &mut output,
            "-k" => &mut rme_root,
            "-u" => &mut rvm_root,
            "-f" => &mut format,
            a => {
                return Err(Error::CmdLine(format!(
                    "unrecognized argument '{}'",
                    a
                )))
            },
        };
        if slot.is_some() {
            return Err(Error::CmdLine(format!(
                "'{}' designated more than once",
                args[i]
            )));
        }
        let val = args.get(i + 1).ok_or_else(|| {
            Error::CmdLine(format!("'{}' is missing its value", args[i]))
        })?;
        *slot = Some(val.clone());
        i += 2;
    }

    let missing = |what| Error::CmdLine(format!("no {} specified", what));
    Ok(Run {
        input: PathBuf::from(input.ok_or_else(|| missing("input file"))?),
        output: PathBuf::from(output.ok_or_else(|| missing("output path"))?),
        rme_root: PathBuf::from(rme_root.ok_or_else(|| missing("RME root path"))?),
        rvm_root: PathBuf::from(rvm_root.ok_or_else(|| missing("RVM root path"))?),
        format: OutFormat::from_arg(&format.ok_or_else(|| missing("output format"))?)?,
    })
}

fn main() -> Result<(), Error> {
    let level = Level::from_str(&env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()))?;
    log::set_boxed_logger(Box::new(Logger { level }))?;
    log::set_max_level(level.to_level_filter());

    let args: Vec<String> = env::args().collect();
    if args.len() == 1 || args[1] == "-h" || args[1] == "--help" {
        usage(&args[0]);
    }
    if args.len() != 11 {
        eprintln!("error: too many or too few input parameters");
        usage(&args[0]);
    }

    let run = parse_args(&args)?;
    mcugen::generate(&run)
}
