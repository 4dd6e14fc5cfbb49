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

use std::fmt;
use std::io;

/// The error cases of the generator pipeline. Every stage aborts the run with
/// one of these; there is no local recovery and no partial output.
pub enum Error {
    /// Wrong argument count, unknown flag, or an unusable path
    CmdLine(String),
    /// Malformed XML document, missing section, or malformed value
    XmlSyntax(String),
    /// Invalid identifier, duplicate name, or dangling cross-reference
    Semantic(String),
    /// Overlapping or unfittable memory, or an unsatisfiable region tree
    Placement(String),
    /// Missing source file or output I/O failure
    Emission(String),
    Io(io::Error),
    LogLevel(log::ParseLevelError),
    SetLog(log::SetLoggerError),
}

macro_rules! impl_err {
    ($src:ty, $dst:tt) => {
        impl From<$src> for Error {
            fn from(error: $src) -> Self {
                Error::$dst(error)
            }
        }
    };
}

impl_err!(io::Error, Io);
impl_err!(log::ParseLevelError, LogLevel);
impl_err!(log::SetLoggerError, SetLog);

impl Error {
    pub fn is_cmdline(&self) -> bool {
        matches!(self, Error::CmdLine(_))
    }

    pub fn is_xml(&self) -> bool {
        matches!(self, Error::XmlSyntax(_))
    }

    pub fn is_semantic(&self) -> bool {
        matches!(self, Error::Semantic(_))
    }

    pub fn is_placement(&self) -> bool {
        matches!(self, Error::Placement(_))
    }

    pub fn is_emission(&self) -> bool {
        matches!(self, Error::Emission(_))
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Error::CmdLine(m) => write!(fmt, "command line: {}", m),
            Error::XmlSyntax(m) => write!(fmt, "XML: {}", m),
            Error::Semantic(m) => write!(fmt, "semantic: {}", m),
            Error::Placement(m) => write!(fmt, "placement: {}", m),
            Error::Emission(m) => write!(fmt, "emission: {}", m),
            Error::Io(e) => write!(fmt, "I/O error occurred: {}", e),
            Error::LogLevel(e) => write!(fmt, "Parsing log level failed: {}", e),
            Error::SetLog(e) => write!(fmt, "Setting logger failed: {}", e),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(fmt, "{:?}", self)
    }
}
