// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::num::ParseIntError;

enum ParseState {
    ScanningForArguments,
    ScanningArgument,
    ScanningQuotedArgument,
}

/// Returns true if the character passed is a whitespace character. Both spaces
/// and tabs are considered whitespace characters.
fn is_whitespace(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Returns true if the character passed is a quote.
fn is_quote(c: char) -> bool {
    c == '"'
}

/// Parses raw debugger input into a list of separate arguments. Arguments
/// are separated by whitespace and can be quoted to include whitespace.
pub fn parse_raw_input(input: &str) -> Result<Vec<String>, &'static str> {
    let mut state = ParseState::ScanningForArguments;
    let mut args: Vec<String> = Vec::new();
    let mut arg = String::new();

    for c in input.trim_end_matches(|c: char| c == '\n' || c == '\r').chars() {
        match state {
            ParseState::ScanningForArguments => {
                if is_quote(c) {
                    state = ParseState::ScanningQuotedArgument;
                } else if !is_whitespace(c) {
                    state = ParseState::ScanningArgument;
                    arg.push(c);
                }
            },
            ParseState::ScanningArgument => {
                if is_whitespace(c) {
                    args.push(arg.clone());
                    arg.clear();
                    state = ParseState::ScanningForArguments;
                } else {
                    arg.push(c);
                }
            },
            ParseState::ScanningQuotedArgument => {
                if is_quote(c) {
                    args.push(arg.clone());
                    arg.clear();
                    state = ParseState::ScanningForArguments;
                } else {
                    arg.push(c);
                }
            },
        }
    }

    match state {
        ParseState::ScanningQuotedArgument => Err("quoted arg does not close"),
        ParseState::ScanningArgument => {
            args.push(arg);
            Ok(args)
        },
        ParseState::ScanningForArguments => Ok(args),
    }
}

/// Parses a number written in decimal, or in hex or binary with a `0x` or
/// `0b` prefix.
pub fn parse_number(arg: &str) -> Result<usize, ParseIntError> {
    let lower = arg.to_lowercase();
    if lower.starts_with("0x") {
        usize::from_str_radix(&lower[2..], 16)
    } else if lower.starts_with("0b") {
        usize::from_str_radix(&lower[2..], 2)
    } else {
        lower.parse::<usize>()
    }
}
