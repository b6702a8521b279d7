// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;
use std::io;
use thiserror::Error;

// Exit codes used throughout the application. These exit codes has specific
// meanings and are used when no OS error codes are available.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1; // Generic error ¯\_(ツ)_/¯.
pub const EXIT_INVALID_PROGRAM: i32 = 2;
pub const EXIT_PROGRAM_NOT_FOUND: i32 = 3;
pub const EXIT_TRACE_LOG_NOT_FOUND: i32 = 4;
pub const EXIT_RUNTIME_FAILURE: i32 = 101;

/// The address space an out of bounds access was attempted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Space {
    Memory,
    Register,
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Space::Memory => write!(f, "memory"),
            Space::Register => write!(f, "register"),
        }
    }
}

/// Everything that can go wrong while loading or running a program. Every
/// variant past the loader errors is fatal to the running machine.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LS8Error {
    #[error("program not found: {0}")]
    ProgramNotFound(String),

    #[error("i/o error: {0}")]
    Io(String),

    #[error("invalid instruction on line {line}: {text:?}")]
    InvalidProgram { line: usize, text: String },

    #[error("program is {0} bytes which does not fit in memory")]
    ProgramTooLarge(usize),

    #[error("{space} index {index:#X} is out of bounds")]
    OutOfBounds { space: Space, index: usize },

    #[error("unknown opcode {opcode:#04X} at {pc:#04X}")]
    UnknownOpcode { opcode: u8, pc: usize },

    #[error("division by zero")]
    DivisionByZero,

    #[error("modulo by zero")]
    ModuloByZero,

    #[error("unsupported ALU operation: {0}")]
    UnsupportedOperation(String),

    #[error("mismatched trace frames:\n    expected: {expected}\n    actual:   {actual}")]
    TraceMismatch { expected: String, actual: String },

    #[error("trace log not found: {0}")]
    TraceLogNotFound(String),
}

impl From<io::Error> for LS8Error {
    fn from(err: io::Error) -> LS8Error {
        LS8Error::Io(err.to_string())
    }
}

impl LS8Error {
    /// Maps an error to the exit code the process should terminate with.
    pub fn exit_code(&self) -> i32 {
        match *self {
            LS8Error::ProgramNotFound(_) => EXIT_PROGRAM_NOT_FOUND,
            LS8Error::TraceLogNotFound(_) => EXIT_TRACE_LOG_NOT_FOUND,
            LS8Error::InvalidProgram { .. } | LS8Error::ProgramTooLarge(_) => EXIT_INVALID_PROGRAM,
            LS8Error::Io(_) => EXIT_FAILURE,
            _ => EXIT_RUNTIME_FAILURE,
        }
    }

    /// Loader and setup errors happen before the machine runs and carry no
    /// interesting CPU state.
    pub fn is_runtime_fault(&self) -> bool {
        self.exit_code() == EXIT_RUNTIME_FAILURE
    }
}
