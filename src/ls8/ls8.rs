// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::io::errors::LS8Error;
use crate::io::log;
use crate::ls8::cpu::CPU;
use crate::ls8::instruction::{self, Flow, Instruction};
use crate::ls8::memory::Memory;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Write};

/// Options passed from the command-line that influence how the machine
/// behaves while it runs.
#[derive(Debug, Clone, Default)]
pub struct RuntimeOptions {
    // Log every executed instruction along with halts and faults.
    pub verbose: bool,

    // Print a trace line to stderr before every instruction is executed.
    pub trace: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum State {
    Running,
    Halted,
}

/// The LS-8 machine. Owns the processor, its memory and the console that PRN
/// and PRA write to.
pub struct LS8<W: Write> {
    pub runtime_options: RuntimeOptions,
    pub cpu: CPU,
    pub memory: Memory,
    state: State,
    console: W,
}

impl<W: Write> LS8<W> {
    pub fn new(runtime_options: RuntimeOptions, console: W) -> LS8<W> {
        LS8 {
            runtime_options: runtime_options,
            cpu: CPU::new(),
            memory: Memory::new(),
            state: State::Running,
            console: console,
        }
    }

    /// Copies a program into memory starting at address zero.
    pub fn load(&mut self, program: &[u8]) -> Result<(), LS8Error> {
        self.memory.memdump(0, program)?;
        log::log("ls8", format!("Loaded {} byte program", program.len()), &self.runtime_options);
        Ok(())
    }

    /// Compare execution against a trace recorded earlier with the trace
    /// option. Any difference is treated as a fatal error. Lines in the log
    /// that hold no frame are ignored, so a log captured together with the
    /// program's output still compares cleanly.
    pub fn compare_against<P: AsRef<std::path::Path>>(&mut self, path: P) -> Result<(), LS8Error> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(ref e) if e.kind() == ErrorKind::NotFound => {
                return Err(LS8Error::TraceLogNotFound(path.display().to_string()));
            },
            Err(e) => return Err(LS8Error::from(e)),
        };
        self.cpu.begin_testing(BufReader::new(file));
        Ok(())
    }

    /// Fetches, decodes and executes a single instruction. Any error halts
    /// the machine before it is returned; stepping a halted machine does
    /// nothing.
    pub fn step(&mut self) -> Result<State, LS8Error> {
        if self.state == State::Halted {
            return Ok(State::Halted);
        }

        match self.cycle() {
            Ok(Flow::Continue) => Ok(State::Running),
            Ok(Flow::Halt) => {
                log::log("ls8", format!("Halted at {:#04X}", self.cpu.pc), &self.runtime_options);
                self.state = State::Halted;
                Ok(State::Halted)
            },
            Err(e) => {
                log::log("ls8", format!("Fatal: {}", e), &self.runtime_options);
                self.state = State::Halted;
                Err(e)
            },
        }
    }

    /// Runs until the machine halts or faults.
    pub fn run(&mut self) -> Result<(), LS8Error> {
        while self.step()? == State::Running {}
        self.console.flush()?;
        Ok(())
    }

    /// Flushes the console once a session is over. A fault from the session
    /// takes priority over a failed flush.
    pub fn finish(&mut self, result: Result<(), LS8Error>) -> Result<(), LS8Error> {
        let flushed = self.console.flush().map_err(LS8Error::from);
        result.and(flushed)
    }

    pub fn is_halted(&self) -> bool {
        self.state == State::Halted
    }

    /// Formats a trace line for the current program counter without
    /// fetching. Bytes past the end of memory show as zero.
    pub fn trace_line(&self) -> String {
        let pc = self.cpu.pc;
        let mut bytes = [0; 3];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = self.memory.read_u8(pc + i).unwrap_or(0);
        }
        instruction::format_trace(&self.cpu, bytes)
    }

    #[cfg(test)]
    pub fn console(&self) -> &W {
        &self.console
    }

    fn cycle(&mut self) -> Result<Flow, LS8Error> {
        let instr = Instruction::parse(self.cpu.pc, &self.memory)?;

        if self.runtime_options.trace || self.cpu.is_testing() {
            let raw_fragment = instr.log(&self.cpu);
            if self.runtime_options.trace {
                eprintln!("{}", raw_fragment);
            }
            self.cpu.compare_frame(&raw_fragment)?;
        }
        log::log("cpu", instr.disassemble(), &self.runtime_options);

        instr.execute(&mut self.cpu, &mut self.memory, &mut self.console)
    }
}
