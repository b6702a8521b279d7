// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use enum_primitive::FromPrimitive;
use crate::io::errors::LS8Error;

// Bit 5 of an opcode marks instructions that are handled by the ALU.
const ALU_BITMASK: u8 = 0b00100000;

enum_from_primitive! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Opcode {
        NOP  = 0x00,
        HLT  = 0x01,
        RET  = 0x11,

        PUSH = 0x45,
        POP  = 0x46,
        PRN  = 0x47,
        PRA  = 0x48,

        CALL = 0x50,
        JMP  = 0x54,
        JEQ  = 0x55,
        JNE  = 0x56,
        JGT  = 0x57,
        JLT  = 0x58,
        JLE  = 0x59,
        JGE  = 0x5A,

        INC  = 0x65,
        DEC  = 0x66,
        NOT  = 0x69,

        LDI  = 0x82,
        LD   = 0x83,
        ST   = 0x84,

        ADD  = 0xA0,
        SUB  = 0xA1,
        MUL  = 0xA2,
        DIV  = 0xA3,
        MOD  = 0xA4,
        CMP  = 0xA7,
        AND  = 0xA8,
        OR   = 0xAA,
        XOR  = 0xAB,
        SHL  = 0xAC,
        SHR  = 0xAD,
    }
}

/// Decodes an opcode by converting an opcode number to an enum value. The
/// program counter is only used to report where the bad byte was found.
pub fn decode_opcode(opcode: u8, pc: usize) -> Result<Opcode, LS8Error> {
    match Opcode::from_u8(opcode) {
        Some(opcode) => Ok(opcode),
        None => Err(LS8Error::UnknownOpcode { opcode: opcode, pc: pc }),
    }
}

/// Determine the length of an instruction with the given opcode, including
/// the opcode byte itself.
///
/// Instructions that always redirect the program counter still report the
/// bytes they occupy so they can be disassembled.
pub fn opcode_len(opcode: &Opcode) -> u8 {
    use self::Opcode::*;

    match *opcode {
        NOP  => 1,
        HLT  => 1,
        RET  => 1,

        PUSH => 2,
        POP  => 2,
        PRN  => 2,
        PRA  => 2,

        CALL => 2,
        JMP  => 2,
        JEQ  => 2,
        JNE  => 2,
        JGT  => 2,
        JLT  => 2,
        JLE  => 2,
        JGE  => 2,

        // Unary ALU instructions still occupy the unused second operand.
        INC  => 3,
        DEC  => 3,
        NOT  => 3,

        LDI  => 3,
        LD   => 3,
        ST   => 3,

        ADD  => 3,
        SUB  => 3,
        MUL  => 3,
        DIV  => 3,
        MOD  => 3,
        CMP  => 3,
        AND  => 3,
        OR   => 3,
        XOR  => 3,
        SHL  => 3,
        SHR  => 3,
    }
}

/// Returns true if the opcode is an arithmetic or logic operation.
#[inline(always)]
pub fn is_alu(opcode: &Opcode) -> bool {
    (*opcode as u8) & ALU_BITMASK == ALU_BITMASK
}
