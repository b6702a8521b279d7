// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::debugger::parser;
use crate::io::errors::LS8Error;
use crate::io::log;
use crate::ls8::ls8::{State, LS8};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::collections::BTreeSet;
use std::io::{self, Write};

const PROMPT: &str = "(ls8) ";

// Defaults for the dump command when no address or length is given.
const DEFAULT_DUMP_ADDR: usize = 0x00;
const DEFAULT_DUMP_LEN : usize = 0x10;

const HELP: &str = "\
step [n]         (s) execute n instructions, default 1
continue         (c) run until halt or breakpoint
break <addr>     (b) set a breakpoint
delete <addr>        remove a breakpoint
regs             (r) show registers and flags
dump [addr] [len](d) hex dump memory
trace            (t) show the trace line for the next instruction
help             (h) show this message
quit             (q) leave the debugger";

#[derive(Debug, PartialEq)]
enum Command {
    Step,
    Continue,
    Break,
    Delete,
    Regs,
    Dump,
    Trace,
    Help,
    Quit,
}

struct CommandWithArguments {
    command: Command,
    args: Vec<String>,
}

/// What the prompt loop should do after a command ran.
#[derive(Debug, PartialEq)]
pub enum Reply {
    Print(String),
    Quit,
}

/// Interactive step debugger. Reads commands from a line editor and drives
/// the machine one instruction at a time.
pub struct Debugger {
    breakpoints: BTreeSet<usize>,
}

impl Debugger {
    pub fn new() -> Self {
        Debugger {
            breakpoints: BTreeSet::new(),
        }
    }

    /// Runs the prompt loop until the user quits or input ends. Faults raised
    /// by the machine end the session and are returned.
    pub fn run<W: Write>(&mut self, ls8: &mut LS8<W>) -> Result<(), LS8Error> {
        let mut editor = DefaultEditor::new().map_err(|e| LS8Error::Io(e.to_string()))?;
        let mut stderr = io::stderr();

        log::log("debugger", "Starting debugger...", &ls8.runtime_options);
        println!("{}", ls8.trace_line());

        loop {
            let input = match editor.readline(PROMPT) {
                Ok(input) => input,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(()),
                Err(e) => return Err(LS8Error::Io(e.to_string())),
            };

            if input.trim().is_empty() {
                continue;
            }
            let _ = editor.add_history_entry(input.as_str());

            let command = match self.interpret(&input) {
                Ok(command) => command,
                Err(e) => {
                    writeln!(stderr, "ls8-rs: {}", e)?;
                    continue;
                },
            };

            match self.execute_command(command, ls8)? {
                Reply::Print(text) => {
                    if !text.is_empty() {
                        println!("{}", text);
                    }
                },
                Reply::Quit => return Ok(()),
            }
        }
    }

    /// Parse a raw input string into a list of arguments and a command. This
    /// function also maps command names to their respective enums.
    fn interpret(&self, input: &str) -> Result<CommandWithArguments, String> {
        let args = parser::parse_raw_input(input)?;

        let command = {
            let raw_command = match args.first() {
                Some(raw_command) => raw_command,
                None => return Err(String::from("no command specified")),
            };

            // Map command strings to the command enum type.
            match raw_command.to_lowercase().as_str() {
                // Full commands.
                "step"     => Command::Step,
                "continue" => Command::Continue,
                "break"    => Command::Break,
                "delete"   => Command::Delete,
                "regs"     => Command::Regs,
                "dump"     => Command::Dump,
                "trace"    => Command::Trace,
                "help"     => Command::Help,
                "quit"     => Command::Quit,
                // Aliases.
                "s" => Command::Step,
                "c" => Command::Continue,
                "b" => Command::Break,
                "r" => Command::Regs,
                "d" => Command::Dump,
                "t" => Command::Trace,
                "h" => Command::Help,
                "q" => Command::Quit,
                // Unknown command.
                _ => return Err(format!("unknown command: {}", raw_command)),
            }
        };

        Ok(CommandWithArguments {
            command: command,
            args: args,
        })
    }

    /// Executes the correct debugger command based on the enum passed.
    fn execute_command<W: Write>(&mut self, command: CommandWithArguments, ls8: &mut LS8<W>) -> Result<Reply, LS8Error> {
        let args = &command.args[1..];
        let text = match command.command {
            Command::Step => self.execute_step(ls8, args)?,
            Command::Continue => self.execute_continue(ls8)?,
            Command::Break => self.execute_break(args, true),
            Command::Delete => self.execute_break(args, false),
            Command::Regs => format!("{}", ls8.cpu),
            Command::Dump => Debugger::execute_dump(ls8, args),
            Command::Trace => ls8.trace_line(),
            Command::Help => String::from(HELP),
            Command::Quit => return Ok(Reply::Quit),
        };
        Ok(Reply::Print(text))
    }

    /// Executes a number of instructions, stopping early if the machine
    /// halts.
    fn execute_step<W: Write>(&mut self, ls8: &mut LS8<W>, args: &[String]) -> Result<String, LS8Error> {
        let count = match args.first().map(|arg| parser::parse_number(arg)) {
            None => 1,
            Some(Ok(count)) => count,
            Some(Err(e)) => return Ok(format!("invalid step count: {}", e)),
        };

        for _ in 0..count {
            if ls8.step()? == State::Halted {
                return Ok(String::from("machine halted"));
            }
        }
        Ok(ls8.trace_line())
    }

    /// Runs until the machine halts or the program counter lands on a
    /// breakpoint.
    fn execute_continue<W: Write>(&mut self, ls8: &mut LS8<W>) -> Result<String, LS8Error> {
        if ls8.is_halted() {
            return Ok(String::from("machine halted"));
        }

        log::log("debugger", "Starting execution now...", &ls8.runtime_options);
        loop {
            if ls8.step()? == State::Halted {
                return Ok(String::from("machine halted"));
            }
            if self.breakpoints.contains(&ls8.cpu.pc) {
                return Ok(format!("breakpoint at {:#04X}\n{}", ls8.cpu.pc, ls8.trace_line()));
            }
        }
    }

    /// Sets or removes a breakpoint at the given address.
    fn execute_break(&mut self, args: &[String], set: bool) -> String {
        let addr = match args.first().map(|arg| parser::parse_number(arg)) {
            Some(Ok(addr)) => addr,
            Some(Err(e)) => return format!("invalid address: {}", e),
            None => return String::from("an address is required"),
        };

        if set {
            self.breakpoints.insert(addr);
            format!("breakpoint set at {:#04X}", addr)
        } else if self.breakpoints.remove(&addr) {
            format!("breakpoint removed at {:#04X}", addr)
        } else {
            format!("no breakpoint at {:#04X}", addr)
        }
    }

    /// Allows dumping memory or program code at a specified memory address.
    fn execute_dump<W: Write>(ls8: &LS8<W>, args: &[String]) -> String {
        let mut numbers = args.iter().map(|arg| parser::parse_number(arg));
        let addr = match numbers.next() {
            Some(Ok(addr)) => addr,
            Some(Err(e)) => return format!("invalid address: {}", e),
            None => DEFAULT_DUMP_ADDR,
        };
        let len = match numbers.next() {
            Some(Ok(len)) => len,
            Some(Err(e)) => return format!("invalid length: {}", e),
            None => DEFAULT_DUMP_LEN,
        };
        ls8.memory.hexdump(addr, len).trim_end().to_string()
    }
}
