//! The pipeline glue the CLI binary wraps: read a source file, compile it,
//! optionally dump the generated code and/or run it, reporting statistics
//! and errors.

use accvm::{Instruction, Memory, Outcome, Processor};
use compiler::CompileError;
use std::fmt;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum DriverError {
    Io { path: PathBuf, source: io::Error },
    Compile(CompileError),
    InvalidInput { path: PathBuf, line: String },
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DriverError::Io { path, source } => {
                write!(f, "{}: {}", path.display(), source)
            }
            DriverError::Compile(err) => write!(f, "{}", err),
            DriverError::InvalidInput { path, line } => {
                write!(f, "{}: not an integer: {}", path.display(), line)
            }
        }
    }
}

impl std::error::Error for DriverError {}

impl From<CompileError> for DriverError {
    fn from(err: CompileError) -> DriverError {
        DriverError::Compile(err)
    }
}

/// Default, non-interactive source: once `values` is drained, substitute 0.
pub struct QueueSource {
    values: std::collections::VecDeque<i64>,
}

impl QueueSource {
    pub fn new(values: Vec<i64>) -> QueueSource {
        QueueSource {
            values: values.into_iter().collect(),
        }
    }
}

impl accvm::processor::Input for QueueSource {
    fn scan(&mut self) -> i64 {
        self.values.pop_front().unwrap_or(0)
    }
}

/// `--interactive` source: prompts on stdin once the input file is
/// exhausted.
pub struct InteractiveSource {
    values: std::collections::VecDeque<i64>,
}

impl InteractiveSource {
    pub fn new(values: Vec<i64>) -> InteractiveSource {
        InteractiveSource {
            values: values.into_iter().collect(),
        }
    }

    fn prompt(&self) -> i64 {
        loop {
            print!("input> ");
            let _ = io::stdout().flush();
            let mut line = String::new();
            if io::stdin().lock().read_line(&mut line).unwrap_or(0) == 0 {
                return 0;
            }
            match line.trim().parse() {
                Ok(v) => return v,
                Err(_) => eprintln!("not an integer, try again"),
            }
        }
    }
}

impl accvm::processor::Input for InteractiveSource {
    fn scan(&mut self) -> i64 {
        match self.values.pop_front() {
            Some(v) => v,
            None => self.prompt(),
        }
    }
}

/// Reads a source file and compiles it.
pub fn compile_file(path: &Path) -> Result<compiler::CompiledProgram, DriverError> {
    let source = read_to_string(path)?;
    log::info!("compiling {}", path.display());
    Ok(compiler::compile(&source)?)
}

/// Reads a newline-separated list of integers, per the `--input` format.
pub fn read_input_file(path: &Path) -> Result<Vec<i64>, DriverError> {
    let text = read_to_string(path)?;
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| {
            l.parse().map_err(|_| DriverError::InvalidInput {
                path: path.to_owned(),
                line: l.to_owned(),
            })
        })
        .collect()
}

fn read_to_string(path: &Path) -> Result<String, DriverError> {
    fs::read_to_string(path).map_err(|source| DriverError::Io {
        path: path.to_owned(),
        source,
    })
}

/// Executes a compiled program, routing `SCAN` through `source`.
pub fn run(code: &[Instruction], input: &mut dyn accvm::processor::Input) -> Outcome {
    let mut memory = Memory::new(accvm::constants::MEMORY_SIZE);
    log::info!("running");
    Processor::new().run(code, &mut memory, input)
}

#[cfg(test)]
mod test;
