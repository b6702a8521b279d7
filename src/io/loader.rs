// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::io::errors::LS8Error;
use crate::ls8::memory::RAM_SIZE;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

// Everything after this character on a line is ignored.
const COMMENT_MARKER: char = '#';

/// Reads a program file at a given path and parses it into a vector of
/// bytes ready to be copied into memory.
pub fn read_program<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, LS8Error> {
    let path = path.as_ref();
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(ref e) if e.kind() == ErrorKind::NotFound => {
            return Err(LS8Error::ProgramNotFound(path.display().to_string()));
        },
        Err(e) => return Err(LS8Error::from(e)),
    };
    parse_program(&source)
}

/// Parses the text encoding of a program.
///
/// Each line holds a single byte written as a binary literal such as
/// `10000010`. A `#` starts a comment that runs to the end of the line, and
/// lines that are blank once comments are removed are skipped.
pub fn parse_program(source: &str) -> Result<Vec<u8>, LS8Error> {
    let mut program: Vec<u8> = Vec::new();

    for (idx, line) in source.lines().enumerate() {
        let instruction = match line.split(COMMENT_MARKER).next() {
            Some(text) => text.trim(),
            None => continue,
        };

        if instruction.is_empty() {
            continue;
        }

        match u8::from_str_radix(instruction, 2) {
            Ok(byte) => program.push(byte),
            Err(_) => {
                return Err(LS8Error::InvalidProgram {
                    line: idx + 1,
                    text: String::from(instruction),
                });
            },
        }
    }

    if program.len() > RAM_SIZE {
        return Err(LS8Error::ProgramTooLarge(program.len()));
    }

    Ok(program)
}
