// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::io::errors::{LS8Error, Space};

// The LS-8 has a flat 8-bit address space with no mapping or mirroring.
pub const RAM_SIZE: usize = 0x100;

/// Flat physical memory for the LS-8. Program code, data and the stack all
/// share the same 256 bytes.
pub struct Memory {
    ram: [u8; RAM_SIZE],
}

impl Memory {
    pub fn new() -> Memory {
        Memory {
            ram: [0; RAM_SIZE],
        }
    }

    /// Reads an unsigned 8-bit byte value located at the given address.
    #[inline(always)]
    pub fn read_u8(&self, addr: usize) -> Result<u8, LS8Error> {
        match self.ram.get(addr) {
            Some(value) => Ok(*value),
            None => Err(Memory::out_of_bounds(addr)),
        }
    }

    /// Writes an unsigned 8-bit byte value to the given address.
    #[inline(always)]
    pub fn write_u8(&mut self, addr: usize, val: u8) -> Result<(), LS8Error> {
        match self.ram.get_mut(addr) {
            Some(cell) => {
                *cell = val;
                Ok(())
            },
            None => Err(Memory::out_of_bounds(addr)),
        }
    }

    /// Dumps the contents of a slice starting at a given address.
    pub fn memdump(&mut self, addr: usize, buf: &[u8]) -> Result<(), LS8Error> {
        for (i, byte) in buf.iter().enumerate() {
            self.write_u8(addr + i, *byte)?;
        }
        Ok(())
    }

    /// Formats `len` bytes starting at `addr` as rows of sixteen hex bytes,
    /// each row prefixed with its address. Reading stops at the end of RAM.
    pub fn hexdump(&self, addr: usize, len: usize) -> String {
        let end = addr.saturating_add(len).min(RAM_SIZE);
        let mut out = String::new();
        if addr >= end {
            return out;
        }

        for (row, chunk) in self.ram[addr..end].chunks(16).enumerate() {
            out.push_str(&format!("{:02X}:", addr + row * 16));
            for byte in chunk {
                out.push_str(&format!(" {:02X}", byte));
            }
            out.push('\n');
        }
        out
    }

    fn out_of_bounds(addr: usize) -> LS8Error {
        LS8Error::OutOfBounds { space: Space::Memory, index: addr }
    }
}
