use crate::constants;
use crate::instructions::{Instruction, Opcode};
use crate::memory::Storage;
use std::collections::VecDeque;

/// Why a run stopped.
///
/// Both variants are successful terminations from the VM's point of view
/// (see `4.2 Termination` in the design notes): a well-formed program always
/// ends in `HALT`, so `ProgramCounterOutOfRange` only ever fires against a
/// buggy generator, but the VM itself treats it the same way rather than
/// failing the run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExitCode {
    Halted,
    ProgramCounterOutOfRange,
}

/// The result of a completed run: the accumulated output stream plus the
/// two execution-cost counters the step-cost model tracks.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Outcome {
    pub exit_code: ExitCode,
    pub output: Vec<i64>,
    pub steps: u64,
    pub instructions_executed: u64,
}

/// Supplies the next value for a `SCAN` instruction once the backing input
/// is exhausted.
///
/// [`QueueInput`] is the default, non-interactive source the library uses:
/// it substitutes 0 once its queue runs dry, per the VM's contract that
/// `SCAN` past end-of-input never blocks or fails. A CLI or embedder wanting
/// interactive prompting on stdin instead supplies its own `Input`
/// implementation.
pub trait Input {
    fn scan(&mut self) -> i64;
}

/// A fully materialized, in-memory input stream that yields 0 once empty.
pub struct QueueInput {
    values: VecDeque<i64>,
}

impl QueueInput {
    pub fn new(values: impl IntoIterator<Item = i64>) -> QueueInput {
        QueueInput {
            values: values.into_iter().collect(),
        }
    }
}

impl Input for QueueInput {
    fn scan(&mut self) -> i64 {
        self.values.pop_front().unwrap_or(0)
    }
}

fn step_cost(op: Opcode, arg: Option<usize>) -> u64 {
    match op {
        Opcode::SCAN | Opcode::PRINT => constants::COST_FAR_MEMORY,
        Opcode::LOAD | Opcode::STORE | Opcode::ADD | Opcode::SUB => {
            let i = arg.expect("memory opcode without an address");
            if i < constants::NEAR_MEMORY_BOUND {
                constants::COST_NEAR_MEMORY
            } else {
                constants::COST_FAR_MEMORY
            }
        }
        Opcode::HALT => constants::COST_HALT,
        _ => constants::COST_CHEAP,
    }
}

/// The accumulator machine: a single register `A`, an instruction counter
/// `K`, and the step-cost accounting the VM's design is built around.
///
/// Memory and input are borrowed for the duration of a run rather than
/// owned by the processor, so the same `Processor` can be reused across
/// runs over different backing stores.
pub struct Processor {
    accumulator: i64,
    ip: usize,
    steps: u64,
    instructions_executed: u64,
}

impl Default for Processor {
    fn default() -> Processor {
        Processor {
            accumulator: 0,
            ip: 0,
            steps: 0,
            instructions_executed: 0,
        }
    }
}

impl Processor {
    pub fn new() -> Processor {
        Processor::default()
    }

    pub fn accumulator(&self) -> i64 {
        self.accumulator
    }

    pub fn instruction_pointer(&self) -> usize {
        self.ip
    }

    /// Runs `code` to completion against `memory`, pulling `SCAN` values from
    /// `input` and collecting `PRINT`ed values into the returned [`Outcome`].
    ///
    /// # Examples
    /// ```
    /// use accvm::instructions::{Instruction, Opcode};
    /// use accvm::memory::Memory;
    /// use accvm::processor::{Processor, QueueInput, ExitCode};
    ///
    /// let code = vec![Instruction::bare(Opcode::INC), Instruction::bare(Opcode::HALT)];
    /// let mut memory = Memory::new(8);
    /// let mut input = QueueInput::new(vec![]);
    /// let outcome = Processor::new().run(&code, &mut memory, &mut input);
    ///
    /// assert_eq!(outcome.exit_code, ExitCode::Halted);
    /// ```
    pub fn run(
        &mut self,
        code: &[Instruction],
        memory: &mut dyn Storage,
        input: &mut dyn Input,
    ) -> Outcome {
        let mut output = Vec::new();

        let exit_code = loop {
            if self.ip >= code.len() {
                break ExitCode::ProgramCounterOutOfRange;
            }

            let instr = &code[self.ip];
            self.instructions_executed += 1;
            self.steps += step_cost(instr.op, instr.resolved_arg());

            log::trace!(
                "K={} A={} {}",
                self.ip,
                self.accumulator,
                instr
            );

            match instr.op {
                Opcode::ZERO => {
                    self.accumulator = 0;
                    self.ip += 1;
                }
                Opcode::INC => {
                    self.accumulator += 1;
                    self.ip += 1;
                }
                Opcode::DEC => {
                    self.accumulator = (self.accumulator - 1).max(0);
                    self.ip += 1;
                }
                Opcode::SHL => {
                    self.accumulator *= 2;
                    self.ip += 1;
                }
                Opcode::SHR => {
                    self.accumulator /= 2;
                    self.ip += 1;
                }
                Opcode::LOAD => {
                    let i = instr.resolved_arg().unwrap();
                    self.accumulator = read_cell(memory, i);
                    self.ip += 1;
                }
                Opcode::STORE => {
                    let i = instr.resolved_arg().unwrap();
                    write_cell(memory, i, self.accumulator);
                    self.ip += 1;
                }
                Opcode::ADD => {
                    let i = instr.resolved_arg().unwrap();
                    self.accumulator += read_cell(memory, i);
                    self.ip += 1;
                }
                Opcode::SUB => {
                    let i = instr.resolved_arg().unwrap();
                    self.accumulator = (self.accumulator - read_cell(memory, i)).max(0);
                    self.ip += 1;
                }
                Opcode::SCAN => {
                    let i = instr.resolved_arg().unwrap();
                    write_cell(memory, i, input.scan());
                    self.ip += 1;
                }
                Opcode::PRINT => {
                    let i = instr.resolved_arg().unwrap();
                    output.push(read_cell(memory, i));
                    self.ip += 1;
                }
                Opcode::JUMP => {
                    self.ip = instr.resolved_arg().unwrap();
                }
                Opcode::JZ => {
                    self.ip = if self.accumulator == 0 {
                        instr.resolved_arg().unwrap()
                    } else {
                        self.ip + 1
                    };
                }
                Opcode::JG => {
                    self.ip = if self.accumulator > 0 {
                        instr.resolved_arg().unwrap()
                    } else {
                        self.ip + 1
                    };
                }
                Opcode::JODD => {
                    self.ip = if self.accumulator % 2 == 1 {
                        instr.resolved_arg().unwrap()
                    } else {
                        self.ip + 1
                    };
                }
                Opcode::HALT => break ExitCode::Halted,
            }
        };

        log::debug!(
            "run finished: {:?}, {} instructions, {} steps",
            exit_code,
            self.instructions_executed,
            self.steps
        );

        Outcome {
            exit_code,
            output,
            steps: self.steps,
            instructions_executed: self.instructions_executed,
        }
    }
}

fn read_cell(memory: &dyn Storage, address: usize) -> i64 {
    memory
        .read(address)
        .unwrap_or_else(|_| panic!("memory access out of range at address {}", address))
}

fn write_cell(memory: &mut dyn Storage, address: usize, value: i64) {
    memory
        .write(address, value)
        .unwrap_or_else(|_| panic!("memory access out of range at address {}", address))
}
