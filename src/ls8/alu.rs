// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::io::errors::LS8Error;
use crate::ls8::cpu::CPU;
use crate::ls8::opcode::Opcode;

impl CPU {
    /// Performs an arithmetic or logic operation on registers `reg_a` and
    /// `reg_b`. The result is stored in `reg_a` and wraps around at 8 bits;
    /// CMP only updates the flags register. Unary operations ignore `reg_b`.
    pub fn alu(&mut self, op: Opcode, reg_a: u8, reg_b: u8) -> Result<(), LS8Error> {
        use crate::ls8::opcode::Opcode::*;

        let a = self.read_reg(reg_a)?;

        let result = match op {
            INC => a.wrapping_add(1),
            DEC => a.wrapping_sub(1),

            // FIXME: NOT is a known defect carried over from the reference
            // machine. It compares the register against the second operand
            // and throws the result away instead of complementing it, so the
            // register is left untouched. Programs written against that
            // machine may rely on this.
            NOT => a,

            _ => {
                let b = self.read_reg(reg_b)?;
                match op {
                    ADD => a.wrapping_add(b),
                    SUB => a.wrapping_sub(b),
                    MUL => a.wrapping_mul(b),
                    DIV => a.checked_div(b).ok_or(LS8Error::DivisionByZero)?,
                    MOD => a.checked_rem(b).ok_or(LS8Error::ModuloByZero)?,
                    AND => a & b,
                    OR  => a | b,
                    XOR => a ^ b,
                    SHL => (a as u32).checked_shl(b as u32).unwrap_or(0) as u8,
                    SHR => a.checked_shr(b as u32).unwrap_or(0),
                    CMP => {
                        self.set_comparison(a, b);
                        return Ok(());
                    },
                    _ => return Err(LS8Error::UnsupportedOperation(format!("{:?}", op))),
                }
            },
        };

        self.write_reg(reg_a, result)
    }
}

#[cfg(test)]
mod tests {
    use crate::io::errors::LS8Error;
    use crate::ls8::cpu::{CPU, EQUAL_FLAG, GREATER_FLAG, LESS_FLAG};
    use crate::ls8::opcode::Opcode;

    fn cpu_with(a: u8, b: u8) -> CPU {
        let mut cpu = CPU::new();
        cpu.reg[0] = a;
        cpu.reg[1] = b;
        cpu
    }

    fn run(op: Opcode, a: u8, b: u8) -> Result<u8, LS8Error> {
        let mut cpu = cpu_with(a, b);
        cpu.alu(op, 0, 1)?;
        Ok(cpu.reg[0])
    }

    #[test]
    fn arithmetic() {
        assert_eq!(run(Opcode::ADD, 3, 4), Ok(7));
        assert_eq!(run(Opcode::SUB, 9, 4), Ok(5));
        assert_eq!(run(Opcode::MUL, 8, 9), Ok(72));
        assert_eq!(run(Opcode::DIV, 9, 4), Ok(2));
        assert_eq!(run(Opcode::MOD, 9, 4), Ok(1));
    }

    #[test]
    fn arithmetic_wraps() {
        assert_eq!(run(Opcode::ADD, 255, 1), Ok(0));
        assert_eq!(run(Opcode::SUB, 0, 1), Ok(255));
        assert_eq!(run(Opcode::MUL, 16, 17), Ok(16));
        assert_eq!(run(Opcode::INC, 255, 0), Ok(0));
        assert_eq!(run(Opcode::DEC, 0, 0), Ok(255));
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(run(Opcode::DIV, 1, 0), Err(LS8Error::DivisionByZero));
        assert_eq!(run(Opcode::MOD, 1, 0), Err(LS8Error::ModuloByZero));
    }

    #[test]
    fn bitwise() {
        assert_eq!(run(Opcode::AND, 0b1100, 0b1010), Ok(0b1000));
        assert_eq!(run(Opcode::OR, 0b1100, 0b1010), Ok(0b1110));
        assert_eq!(run(Opcode::XOR, 0b1100, 0b1010), Ok(0b0110));
        assert_eq!(run(Opcode::SHL, 0b1000_0001, 1), Ok(0b10));
        assert_eq!(run(Opcode::SHR, 0b1000_0001, 7), Ok(1));
        assert_eq!(run(Opcode::SHL, 1, 8), Ok(0));
        assert_eq!(run(Opcode::SHR, 0xFF, 200), Ok(0));
    }

    #[test]
    fn unary_ignores_second_operand() {
        let mut cpu = cpu_with(5, 0);
        cpu.alu(Opcode::INC, 0, 99).unwrap();
        assert_eq!(cpu.reg[0], 6);
        cpu.alu(Opcode::DEC, 0, 99).unwrap();
        assert_eq!(cpu.reg[0], 5);
    }

    #[test]
    fn not_leaves_register_unchanged() {
        assert_eq!(run(Opcode::NOT, 0b1010_1010, 0), Ok(0b1010_1010));
    }

    #[test]
    fn compare() {
        let mut cpu = cpu_with(7, 7);
        cpu.alu(Opcode::CMP, 0, 1).unwrap();
        assert_eq!(cpu.fl, EQUAL_FLAG);
        assert_eq!(cpu.reg[0], 7);

        cpu.reg[0] = 8;
        cpu.alu(Opcode::CMP, 0, 1).unwrap();
        assert_eq!(cpu.fl, GREATER_FLAG);

        cpu.reg[0] = 6;
        cpu.alu(Opcode::CMP, 0, 1).unwrap();
        assert_eq!(cpu.fl, LESS_FLAG);
    }

    #[test]
    fn unsupported() {
        assert_eq!(run(Opcode::LDI, 1, 1), Err(LS8Error::UnsupportedOperation(String::from("LDI"))));
    }

    #[test]
    fn bad_register() {
        let mut cpu = CPU::new();
        assert!(cpu.alu(Opcode::ADD, 8, 0).is_err());
        assert!(cpu.alu(Opcode::ADD, 0, 8).is_err());
    }
}
