// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::io::errors::{LS8Error, Space};
use std::fmt;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::num::ParseIntError;

// Flag constants that allow easy bitwise getting and setting of flag values.
pub const EQUAL_FLAG  : u8 = 0x1;
pub const GREATER_FLAG: u8 = 0x2;
pub const LESS_FLAG   : u8 = 0x4;

pub const REGISTER_COUNT: usize = 8;

// Register 7 is reserved as the stack pointer.
pub const SP: usize = 7;

// The stack starts just below the area of memory reserved for the interrupt
// vector table and keyboard input, and grows downwards.
pub const STACK_START: u8 = 0xF4;

// Marks the start of a frame in a trace line.
pub const TRACE_TAG: &str = "TRACE:";

/// The LS-8 processor state. This holds no memory and has no behaviour
/// beyond keeping its own registers consistent; instructions are executed by
/// `Instruction::execute`.
pub struct CPU {
    // The program counter points to the next instruction to be executed. It
    // is advanced by the width of each instruction unless the instruction
    // redirected it (jumps, calls and returns).
    pub pc: usize,

    // Eight general purpose 8-bit registers. R7 doubles as the stack pointer
    // and holds the address of the current top of the stack.
    pub reg: [u8; REGISTER_COUNT],

    // The flags register holds the result of the last CMP instruction. Only
    // the low three bits are used:
    //
    // Equal:   Set when both compared registers hold the same value.
    // Greater: Set when the first register was greater than the second.
    // Less:    Set when the first register was less than the second.
    //
    // Exactly one of these is set after a comparison and every comparison
    // overwrites all three.
    pub fl: u8,

    // This will contain an open file if the CPU is comparing its execution
    // against a previously recorded trace.
    execution_log: Option<BufReader<File>>,
}

impl CPU {
    pub fn new() -> CPU {
        let mut reg = [0; REGISTER_COUNT];
        reg[SP] = STACK_START;

        CPU {
            pc: 0,
            reg: reg,
            fl: 0,
            execution_log: None,
        }
    }

    /// Reads a general purpose register.
    #[inline(always)]
    pub fn read_reg(&self, idx: u8) -> Result<u8, LS8Error> {
        match self.reg.get(idx as usize) {
            Some(value) => Ok(*value),
            None => Err(CPU::out_of_bounds(idx)),
        }
    }

    /// Writes a general purpose register.
    #[inline(always)]
    pub fn write_reg(&mut self, idx: u8, val: u8) -> Result<(), LS8Error> {
        match self.reg.get_mut(idx as usize) {
            Some(cell) => {
                *cell = val;
                Ok(())
            },
            None => Err(CPU::out_of_bounds(idx)),
        }
    }

    /// Moves the stack pointer down by one slot and returns the new top.
    #[inline(always)]
    pub fn decrement_sp(&mut self) -> u8 {
        self.reg[SP] = self.reg[SP].wrapping_sub(1);
        self.reg[SP]
    }

    /// Moves the stack pointer up by one slot and returns the old top.
    #[inline(always)]
    pub fn increment_sp(&mut self) -> u8 {
        let top = self.reg[SP];
        self.reg[SP] = top.wrapping_add(1);
        top
    }

    /// Stores the result of a comparison, clearing whatever a previous
    /// comparison left behind.
    #[inline(always)]
    pub fn set_comparison(&mut self, a: u8, b: u8) {
        self.fl = if a == b {
            EQUAL_FLAG
        } else if a > b {
            GREATER_FLAG
        } else {
            LESS_FLAG
        };
    }

    /// Returns true if the last comparison was equal.
    #[inline(always)]
    pub fn equal_flag_set(&self) -> bool {
        self.fl & EQUAL_FLAG == EQUAL_FLAG
    }

    /// Returns true if the last comparison was greater than.
    #[inline(always)]
    pub fn greater_flag_set(&self) -> bool {
        self.fl & GREATER_FLAG == GREATER_FLAG
    }

    /// Returns true if the last comparison was less than.
    #[inline(always)]
    pub fn less_flag_set(&self) -> bool {
        self.fl & LESS_FLAG == LESS_FLAG
    }

    /// Save the passed execution log which will be used to compare the CPU's
    /// execution to a previously recorded trace.
    pub fn begin_testing(&mut self, log: BufReader<File>) {
        self.execution_log = Some(log);
    }

    /// Returns true if a trace is being compared against.
    pub fn is_testing(&self) -> bool {
        self.execution_log.is_some()
    }

    /// Compares a freshly generated trace line against the next frame of the
    /// execution log. Lines without a frame, such as program output captured
    /// along with the trace, are skipped. Does nothing if no log was provided.
    pub fn compare_frame(&mut self, raw_fragment: &str) -> Result<(), LS8Error> {
        if let Some(ref mut execution_log) = self.execution_log {
            let mut line = String::new();
            loop {
                line.clear();
                if execution_log.read_line(&mut line)? == 0 || line.contains(TRACE_TAG) {
                    break;
                }
            }
            let log_fragment = match line.find(TRACE_TAG) {
                Some(at) => line[at..].trim_end(),
                None => "",
            };

            let matched = match (CPUFrame::parse(raw_fragment), CPUFrame::parse(log_fragment)) {
                (Ok(actual), Ok(expected)) => actual == expected,
                _ => false,
            };

            if !matched {
                return Err(LS8Error::TraceMismatch {
                    expected: String::from(log_fragment),
                    actual: String::from(raw_fragment),
                });
            }
        }
        Ok(())
    }

    /// Returns "SET" if the passed boolean is true, otherwise "UNSET". This
    /// function is used to display flags in the CPU state dump.
    fn fmt_flag(flag: bool) -> &'static str {
        if flag { "SET" } else { "UNSET" }
    }

    fn out_of_bounds(idx: u8) -> LS8Error {
        LS8Error::OutOfBounds { space: Space::Register, index: idx as usize }
    }
}

impl fmt::Display for CPU {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "\nCPU State:")?;
        writeln!(f, "    Program Counter: {:#X}", self.pc)?;
        writeln!(f, "    Stack Pointer:   {:#X}", self.reg[SP])?;
        for (i, value) in self.reg.iter().enumerate() {
            writeln!(f, "    R{}:              {:#X}", i, value)?;
        }
        writeln!(f, "")?;
        writeln!(f, "Flags Register: {:#X}", self.fl)?;
        writeln!(f, "    Equal:   {}", CPU::fmt_flag(self.equal_flag_set()))?;
        writeln!(f, "    Greater: {}", CPU::fmt_flag(self.greater_flag_set()))?;
        writeln!(f, "    Less:    {}", CPU::fmt_flag(self.less_flag_set()))
    }
}

/// CPU state for use during trace comparison. These values are contained in
/// the lines printed by the trace option and are compared field by field so
/// that spacing differences don't matter.
#[derive(Debug, PartialEq)]
pub struct CPUFrame {
    pc: u8,
    instruction: [u8; 3],
    reg: [u8; REGISTER_COUNT],
}

impl CPUFrame {
    /// Parses a trace line in the form
    /// `TRACE: PC | M0 M1 M2 | R0 R1 R2 R3 R4 R5 R6 R7`.
    pub fn parse(frame: &str) -> Result<CPUFrame, ParseIntError> {
        let body = frame.trim().trim_start_matches(TRACE_TAG);
        let mut sections = body.split('|');

        let pc = u8::from_str_radix(sections.next().unwrap_or("").trim(), 16)?;

        let mut instruction = [0; 3];
        CPUFrame::extract_words(sections.next().unwrap_or(""), &mut instruction)?;

        let mut reg = [0; REGISTER_COUNT];
        CPUFrame::extract_words(sections.next().unwrap_or(""), &mut reg)?;

        Ok(CPUFrame {
            pc: pc,
            instruction: instruction,
            reg: reg,
        })
    }

    /// Parses whitespace separated hex encoded 8-bit integers into `out`.
    /// Missing values are reported the same way as malformed ones.
    fn extract_words(section: &str, out: &mut [u8]) -> Result<(), ParseIntError> {
        let mut words = section.split_whitespace();
        for slot in out.iter_mut() {
            *slot = u8::from_str_radix(words.next().unwrap_or(""), 16)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_state() {
        let cpu = CPU::new();
        assert_eq!(cpu.pc, 0);
        assert_eq!(cpu.fl, 0);
        assert_eq!(cpu.reg, [0, 0, 0, 0, 0, 0, 0, 0xF4]);
        assert!(!cpu.is_testing());
    }

    #[test]
    fn register_bounds() {
        let mut cpu = CPU::new();
        cpu.write_reg(3, 42).unwrap();
        assert_eq!(cpu.read_reg(3), Ok(42));
        assert_eq!(cpu.read_reg(8), Err(LS8Error::OutOfBounds { space: Space::Register, index: 8 }));
        assert!(cpu.write_reg(200, 1).is_err());
    }

    #[test]
    fn stack_pointer_moves() {
        let mut cpu = CPU::new();
        assert_eq!(cpu.decrement_sp(), 0xF3);
        assert_eq!(cpu.increment_sp(), 0xF3);
        assert_eq!(cpu.reg[SP], 0xF4);

        cpu.reg[SP] = 0;
        assert_eq!(cpu.decrement_sp(), 0xFF);
    }

    #[test]
    fn comparison_overwrites_flags() {
        let mut cpu = CPU::new();

        cpu.set_comparison(5, 5);
        assert_eq!(cpu.fl, EQUAL_FLAG);
        assert!(cpu.equal_flag_set());

        cpu.set_comparison(6, 5);
        assert_eq!(cpu.fl, GREATER_FLAG);
        assert!(!cpu.equal_flag_set());
        assert!(cpu.greater_flag_set());

        cpu.set_comparison(4, 5);
        assert_eq!(cpu.fl, LESS_FLAG);
        assert!(cpu.less_flag_set());
        assert!(!cpu.greater_flag_set());
    }

    #[test]
    fn state_dump() {
        let mut cpu = CPU::new();
        cpu.set_comparison(1, 2);
        let state = cpu.to_string();
        assert!(state.starts_with("\nCPU State:\n"));
        assert!(state.contains("Stack Pointer:   0xF4"));
        assert!(state.contains("Less:    SET"));
        assert!(state.contains("Equal:   UNSET"));
    }

    #[test]
    fn parse_frame() {
        let frame = CPUFrame::parse("TRACE: 05 | 47 00 01 | 08 00 00 00 00 00 00 F4").unwrap();
        assert_eq!(frame.pc, 0x05);
        assert_eq!(frame.instruction, [0x47, 0x00, 0x01]);
        assert_eq!(frame.reg, [0x08, 0, 0, 0, 0, 0, 0, 0xF4]);

        // Spacing differences compare equal.
        let loose = CPUFrame::parse("TRACE:05|47 00 01|08 00 00 00 00 00 00 F4\n").unwrap();
        assert_eq!(frame, loose);
    }

    #[test]
    fn parse_bad_frame() {
        assert!(CPUFrame::parse("").is_err());
        assert!(CPUFrame::parse("TRACE: 05 | 47 00 | 08").is_err());
        assert!(CPUFrame::parse("TRACE: ZZ | 47 00 01 | 08 00 00 00 00 00 00 F4").is_err());
    }
}
