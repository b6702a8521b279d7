// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::io::errors::LS8Error;
use crate::ls8::cpu::{CPU, SP, TRACE_TAG};
use crate::ls8::memory::Memory;
use crate::ls8::opcode::{self, Opcode};
use std::io::Write;

/// What the machine should do after an instruction has executed.
#[derive(Debug, PartialEq)]
pub enum Flow {
    Continue,
    Halt,
}

/// All LS-8 instructions are a maximum size of 3 bytes. The first byte is the
/// opcode which determines the action of the instruction. The following 2
/// bytes are the operands and are present depending on the opcode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instruction(pub u8, pub u8, pub u8);

impl Instruction {
    /// Fetches the instruction at the given address. Both operand bytes are
    /// always read, even for instructions that don't use them.
    pub fn parse(addr: usize, memory: &Memory) -> Result<Instruction, LS8Error> {
        Ok(Instruction(
            memory.read_u8(addr)?,
            memory.read_u8(addr + 1)?,
            memory.read_u8(addr + 2)?))
    }

    /// Decodes the opcode byte. `pc` is the address the instruction was
    /// fetched from and is only used for error reporting.
    #[inline(always)]
    pub fn opcode(&self, pc: usize) -> Result<Opcode, LS8Error> {
        opcode::decode_opcode(self.0, pc)
    }

    /// Executes the instruction against the CPU and memory. PRN and PRA
    /// write to `out`.
    ///
    /// Instructions that transfer control set the program counter themselves;
    /// every other instruction advances it by its own width.
    pub fn execute<W: Write>(&self, cpu: &mut CPU, memory: &mut Memory, out: &mut W) -> Result<Flow, LS8Error> {
        use crate::ls8::opcode::Opcode::*;

        let opcode = self.opcode(cpu.pc)?;
        let Instruction(_, a, b) = *self;

        let jumped = match opcode {
            HLT => return Ok(Flow::Halt),
            NOP => false,

            LDI => {
                cpu.write_reg(a, b)?;
                false
            },
            LD => {
                let addr = cpu.read_reg(b)?;
                let value = memory.read_u8(addr as usize)?;
                cpu.write_reg(a, value)?;
                false
            },
            // ST addresses memory with the raw operand instead of a register
            // and stores the raw second operand. This mirrors the machine the
            // programs were written for, even though LD goes through
            // registers.
            ST => {
                memory.write_u8(a as usize, b)?;
                false
            },

            PRN => {
                writeln!(out, "{}", cpu.read_reg(a)?)?;
                false
            },
            // PRA advances past its operand like PRN does.
            PRA => {
                write!(out, "{}", cpu.read_reg(a)? as char)?;
                false
            },

            // The register is checked before SP moves. Reading it after the
            // decrement means PUSH R7 stores the new stack pointer.
            PUSH => {
                cpu.read_reg(a)?;
                let top = cpu.decrement_sp();
                memory.write_u8(top as usize, cpu.reg[a as usize])?;
                false
            },
            POP => {
                let value = memory.read_u8(cpu.reg[SP] as usize)?;
                cpu.write_reg(a, value)?;
                cpu.increment_sp();
                false
            },

            CALL => {
                cpu.read_reg(a)?;
                let top = cpu.decrement_sp();
                let ret = cpu.pc.wrapping_add(opcode::opcode_len(&opcode) as usize);
                memory.write_u8(top as usize, ret as u8)?;
                cpu.pc = cpu.reg[a as usize] as usize;
                true
            },
            RET => {
                cpu.pc = memory.read_u8(cpu.reg[SP] as usize)? as usize;
                cpu.increment_sp();
                true
            },

            JMP => {
                cpu.pc = cpu.read_reg(a)? as usize;
                true
            },
            JEQ | JNE | JGT | JLT | JGE | JLE => {
                let taken = match opcode {
                    JEQ => cpu.equal_flag_set(),
                    JNE => !cpu.equal_flag_set(),
                    JGT => cpu.greater_flag_set(),
                    JLT => cpu.less_flag_set(),
                    JGE => cpu.equal_flag_set() || cpu.greater_flag_set(),
                    _   => cpu.equal_flag_set() || cpu.less_flag_set(),
                };
                if taken {
                    cpu.pc = cpu.read_reg(a)? as usize;
                }
                taken
            },

            _ => {
                cpu.alu(opcode, a, b)?;
                false
            },
        };

        if !jumped {
            cpu.pc += opcode::opcode_len(&opcode) as usize;
        }

        Ok(Flow::Continue)
    }

    /// Disassembles the instruction into a human readable form such as
    /// `LDI R0,0x08`. Unknown opcodes disassemble to their raw byte.
    pub fn disassemble(&self) -> String {
        use crate::ls8::opcode::Opcode::*;

        let opcode = match opcode::decode_opcode(self.0, 0) {
            Ok(opcode) => opcode,
            Err(_) => return format!(".byte {:#04X}", self.0),
        };

        match opcode {
            NOP | HLT | RET => format!("{:?}", opcode),
            LDI => format!("LDI R{},{:#04X}", self.1, self.2),
            ST => format!("ST {:#04X},{:#04X}", self.1, self.2),
            LD => format!("LD R{},R{}", self.1, self.2),
            INC | DEC | NOT => format!("{:?} R{}", opcode, self.1),
            _ if opcode::is_alu(&opcode) => format!("{:?} R{},R{}", opcode, self.1, self.2),
            _ => format!("{:?} R{}", opcode, self.1),
        }
    }

    /// Formats the CPU state as a trace line for the instruction about to be
    /// executed at the program counter.
    pub fn log(&self, cpu: &CPU) -> String {
        format_trace(cpu, [self.0, self.1, self.2])
    }
}

/// Formats a trace line: the program counter, the next three bytes of memory
/// and all eight registers, each as two hex digits.
pub fn format_trace(cpu: &CPU, bytes: [u8; 3]) -> String {
    let mut line = format!("{} {:02X} | {:02X} {:02X} {:02X} |", TRACE_TAG, cpu.pc, bytes[0], bytes[1], bytes[2]);
    for value in cpu.reg.iter() {
        line.push_str(&format!(" {:02X}", value));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ls8::cpu::{EQUAL_FLAG, GREATER_FLAG, LESS_FLAG};

    fn exec(cpu: &mut CPU, memory: &mut Memory, instr: Instruction) -> Result<(Flow, String), LS8Error> {
        let mut out = Vec::new();
        let flow = instr.execute(cpu, memory, &mut out)?;
        Ok((flow, String::from_utf8(out).unwrap()))
    }

    #[test]
    fn fetches_all_operands() {
        let mut memory = Memory::new();
        memory.memdump(0x10, &[0x01, 0xAA, 0xBB]).unwrap();
        assert_eq!(Instruction::parse(0x10, &memory), Ok(Instruction(0x01, 0xAA, 0xBB)));
        assert!(Instruction::parse(0xFE, &memory).is_err());
    }

    #[test]
    fn halt_keeps_pc() {
        let (mut cpu, mut memory) = (CPU::new(), Memory::new());
        cpu.pc = 4;
        let (flow, _) = exec(&mut cpu, &mut memory, Instruction(0x01, 0, 0)).unwrap();
        assert_eq!(flow, Flow::Halt);
        assert_eq!(cpu.pc, 4);
    }

    #[test]
    fn unknown_opcode() {
        let (mut cpu, mut memory) = (CPU::new(), Memory::new());
        cpu.pc = 7;
        let err = exec(&mut cpu, &mut memory, Instruction(0xFF, 0, 0)).unwrap_err();
        assert_eq!(err, LS8Error::UnknownOpcode { opcode: 0xFF, pc: 7 });
        assert_eq!(cpu.pc, 7);
    }

    #[test]
    fn loads_and_stores() {
        let (mut cpu, mut memory) = (CPU::new(), Memory::new());

        exec(&mut cpu, &mut memory, Instruction(0x82, 1, 0x42)).unwrap();
        assert_eq!(cpu.reg[1], 0x42);
        assert_eq!(cpu.pc, 3);

        memory.write_u8(0x42, 99).unwrap();
        exec(&mut cpu, &mut memory, Instruction(0x83, 2, 1)).unwrap();
        assert_eq!(cpu.reg[2], 99);
        assert_eq!(cpu.pc, 6);

        // ST writes the raw second operand to the raw first operand.
        exec(&mut cpu, &mut memory, Instruction(0x84, 0x80, 0x07)).unwrap();
        assert_eq!(memory.read_u8(0x80), Ok(0x07));
        assert_eq!(cpu.pc, 9);
    }

    #[test]
    fn prints() {
        let (mut cpu, mut memory) = (CPU::new(), Memory::new());
        cpu.reg[0] = 65;

        let (_, out) = exec(&mut cpu, &mut memory, Instruction(0x47, 0, 0)).unwrap();
        assert_eq!(out, "65\n");
        assert_eq!(cpu.pc, 2);

        let (_, out) = exec(&mut cpu, &mut memory, Instruction(0x48, 0, 0)).unwrap();
        assert_eq!(out, "A");
        assert_eq!(cpu.pc, 4);
    }

    #[test]
    fn push_pop() {
        let (mut cpu, mut memory) = (CPU::new(), Memory::new());
        cpu.reg[0] = 5;

        exec(&mut cpu, &mut memory, Instruction(0x45, 0, 0)).unwrap();
        assert_eq!(cpu.reg[SP], 0xF3);
        assert_eq!(memory.read_u8(0xF3), Ok(5));
        assert_eq!(cpu.pc, 2);

        exec(&mut cpu, &mut memory, Instruction(0x46, 3, 0)).unwrap();
        assert_eq!(cpu.reg[3], 5);
        assert_eq!(cpu.reg[SP], 0xF4);
        assert_eq!(cpu.pc, 4);
    }

    #[test]
    fn bad_register_leaves_stack() {
        let (mut cpu, mut memory) = (CPU::new(), Memory::new());

        // PUSH R8
        assert!(exec(&mut cpu, &mut memory, Instruction(0x45, 8, 0)).is_err());
        assert_eq!(cpu.reg[SP], 0xF4);
        assert_eq!(memory.read_u8(0xF3), Ok(0));

        // CALL R8
        assert!(exec(&mut cpu, &mut memory, Instruction(0x50, 8, 0)).is_err());
        assert_eq!(cpu.reg[SP], 0xF4);
        assert_eq!(cpu.pc, 0);
    }

    #[test]
    fn push_stack_pointer() {
        let (mut cpu, mut memory) = (CPU::new(), Memory::new());
        exec(&mut cpu, &mut memory, Instruction(0x45, SP as u8, 0)).unwrap();
        assert_eq!(memory.read_u8(0xF3), Ok(0xF3));
    }

    #[test]
    fn call_ret() {
        let (mut cpu, mut memory) = (CPU::new(), Memory::new());
        cpu.pc = 0x10;
        cpu.reg[1] = 0x40;

        exec(&mut cpu, &mut memory, Instruction(0x50, 1, 0)).unwrap();
        assert_eq!(cpu.pc, 0x40);
        assert_eq!(cpu.reg[SP], 0xF3);
        assert_eq!(memory.read_u8(0xF3), Ok(0x12));

        exec(&mut cpu, &mut memory, Instruction(0x11, 0, 0)).unwrap();
        assert_eq!(cpu.pc, 0x12);
        assert_eq!(cpu.reg[SP], 0xF4);
    }

    #[test]
    fn jumps() {
        let (mut cpu, mut memory) = (CPU::new(), Memory::new());
        cpu.reg[2] = 0x30;

        exec(&mut cpu, &mut memory, Instruction(0x54, 2, 0)).unwrap();
        assert_eq!(cpu.pc, 0x30);

        // Conditional jumps taken/not taken for each flag.
        let cases = [
            (EQUAL_FLAG,   [true,  false, false, false, true,  true ]),
            (GREATER_FLAG, [false, true,  true,  false, true,  false]),
            (LESS_FLAG,    [false, true,  false, true,  false, true ]),
        ];
        let opcodes = [0x55, 0x56, 0x57, 0x58, 0x5A, 0x59]; // JEQ JNE JGT JLT JGE JLE

        for &(flag, expected) in cases.iter() {
            for (op, taken) in opcodes.iter().zip(expected.iter()) {
                cpu.pc = 0x08;
                cpu.fl = flag;
                exec(&mut cpu, &mut memory, Instruction(*op, 2, 0)).unwrap();
                let target = if *taken { 0x30 } else { 0x0A };
                assert_eq!(cpu.pc, target, "opcode {:#04X} flag {:#X}", op, flag);
            }
        }
    }

    #[test]
    fn alu_advances_three() {
        let (mut cpu, mut memory) = (CPU::new(), Memory::new());
        cpu.reg[0] = 2;
        cpu.reg[1] = 3;

        exec(&mut cpu, &mut memory, Instruction(0xA2, 0, 1)).unwrap();
        assert_eq!(cpu.reg[0], 6);
        assert_eq!(cpu.pc, 3);

        exec(&mut cpu, &mut memory, Instruction(0x65, 0, 0)).unwrap();
        assert_eq!(cpu.reg[0], 7);
        assert_eq!(cpu.pc, 6);

        exec(&mut cpu, &mut memory, Instruction(0x00, 0, 0)).unwrap();
        assert_eq!(cpu.pc, 7);
    }

    #[test]
    fn fault_propagates() {
        let (mut cpu, mut memory) = (CPU::new(), Memory::new());
        cpu.reg[0] = 1;
        let err = exec(&mut cpu, &mut memory, Instruction(0xA3, 0, 1)).unwrap_err();
        assert_eq!(err, LS8Error::DivisionByZero);
        assert_eq!(cpu.pc, 0);

        let err = exec(&mut cpu, &mut memory, Instruction(0x82, 8, 1)).unwrap_err();
        assert!(err.is_runtime_fault());
    }

    #[test]
    fn disassembly() {
        assert_eq!(Instruction(0x01, 0, 0).disassemble(), "HLT");
        assert_eq!(Instruction(0x82, 0, 8).disassemble(), "LDI R0,0x08");
        assert_eq!(Instruction(0x84, 0x10, 5).disassemble(), "ST 0x10,0x05");
        assert_eq!(Instruction(0xA0, 0, 1).disassemble(), "ADD R0,R1");
        assert_eq!(Instruction(0x83, 2, 3).disassemble(), "LD R2,R3");
        assert_eq!(Instruction(0x65, 4, 0).disassemble(), "INC R4");
        assert_eq!(Instruction(0x47, 0, 0).disassemble(), "PRN R0");
        assert_eq!(Instruction(0x50, 1, 0).disassemble(), "CALL R1");
        assert_eq!(Instruction(0xFF, 0, 0).disassemble(), ".byte 0xFF");
    }

    #[test]
    fn trace_line() {
        let mut cpu = CPU::new();
        cpu.pc = 5;
        cpu.reg[0] = 8;
        assert_eq!(Instruction(0x47, 0, 1).log(&cpu), "TRACE: 05 | 47 00 01 | 08 00 00 00 00 00 00 F4");
    }
}
