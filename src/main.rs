// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

#[macro_use]
extern crate enum_primitive;

mod debugger;
mod io;
mod ls8;

use debugger::debugger::Debugger;
use getopts::Options;
use io::errors::{self, LS8Error};
use io::loader;
use ls8::ls8::{RuntimeOptions, LS8};
use std::env;

/// Prints the usage of the program to stdout.
fn print_usage(program: &str, opts: &Options) {
    let brief = format!("Usage: {} [options] PROGRAM", program);
    print!("{}", opts.usage(&brief));
}

/// Loads the program and runs it, either directly or under the debugger.
fn execute(path: &str, compare: Option<String>, debug: bool, runtime_options: RuntimeOptions) -> Result<(), LS8Error> {
    let program = loader::read_program(path)?;

    let stdout = std::io::stdout();
    let mut ls8 = LS8::new(runtime_options, stdout.lock());
    ls8.load(&program)?;

    if let Some(compare) = compare {
        ls8.compare_against(compare)?;
    }

    let result = if debug {
        Debugger::new().run(&mut ls8)
    } else {
        ls8.run()
    };

    let result = ls8.finish(result);

    // The machine state is only interesting if the program itself faulted.
    if let Err(ref e) = result {
        if e.is_runtime_fault() {
            eprintln!("{}", ls8.cpu);
        }
    }
    result
}

/// Initializes and starts the emulator. Returns an exit code after which the
/// program unwinds and stops executing.
fn init() -> i32 {
    let args: Vec<String> = env::args().collect();
    let program = args.first().cloned().unwrap_or_else(|| String::from("ls8-rs"));

    let mut opts = Options::new();
    opts.optflag("v", "verbose", "log every instruction as it executes");
    opts.optflag("t", "trace", "print the machine state before every instruction");
    opts.optflag("d", "debug", "start the interactive debugger");
    opts.optopt("c", "compare", "compare execution against a recorded trace", "FILE");
    opts.optflag("h", "help", "print this help menu");

    let matches = match opts.parse(args.iter().skip(1)) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("ls8-rs: {}", e);
            return errors::EXIT_FAILURE;
        },
    };

    if matches.opt_present("h") {
        print_usage(&program, &opts);
        return errors::EXIT_SUCCESS;
    }

    let path = match matches.free.first() {
        Some(path) => path.clone(),
        None => {
            print_usage(&program, &opts);
            return errors::EXIT_FAILURE;
        },
    };

    let runtime_options = RuntimeOptions {
        verbose: matches.opt_present("v"),
        trace: matches.opt_present("t"),
    };

    match execute(&path, matches.opt_str("c"), matches.opt_present("d"), runtime_options) {
        Ok(()) => errors::EXIT_SUCCESS,
        Err(e) => {
            eprintln!("ls8-rs: {}", e);
            e.exit_code()
        },
    }
}

/// Entry point of the program and wrapper of init. Takes the exit code returned
/// from init and exits with it.
fn main() {
    let exit_code = init();
    std::process::exit(exit_code); // Unwinding done, safe to exit.
}
