//! The code generator: the core of this crate.
//!
//! Lowers a validated AST into a flat [`accvm::Instruction`] stream. Emits
//! branches against symbolic labels as it walks the tree, then backpatches
//! them to concrete instruction indices in one final pass.

use crate::ast::*;
use crate::error::GeneratorError;
use crate::semantic::SemanticResult;
use accvm::{Arg, Instruction, Opcode};
use std::collections::{HashMap, HashSet};

/// The name→address bijection fixed by declaration order.
#[derive(Clone, Debug)]
pub struct MemoryMap {
    addresses: HashMap<String, usize>,
    /// First of the five scratch cells reserved past the last variable.
    pub temp_start: usize,
}

impl MemoryMap {
    fn build(semantic: &SemanticResult) -> MemoryMap {
        let mut addresses = HashMap::new();
        let mut next = 0usize;
        for (name, _) in &semantic.const_table {
            addresses.insert(name.clone(), next);
            next += 1;
        }
        for name in &semantic.var_table {
            addresses.insert(name.clone(), next);
            next += 1;
        }
        MemoryMap {
            addresses,
            temp_start: next,
        }
    }

    /// The address a declared name was assigned. Panics if `name` was never
    /// declared — the semantic analyzer guarantees that never happens for
    /// any name that survives to code generation.
    pub fn address(&self, name: &str) -> usize {
        *self
            .addresses
            .get(name)
            .unwrap_or_else(|| panic!("codegen referenced undeclared name \"{}\"", name))
    }

    /// One of the five reserved scratch cells, by offset `0..5`.
    fn scratch(&self, offset: usize) -> usize {
        debug_assert!(offset < 5);
        self.temp_start + offset
    }

    /// Total addressable cells this compilation actually uses.
    pub fn len(&self) -> usize {
        self.temp_start + 5
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// The finished output of a compilation: code plus the map that assigned it
/// its memory layout.
#[derive(Clone, Debug)]
pub struct CompiledProgram {
    pub code: Vec<Instruction>,
    pub memory_map: MemoryMap,
}

/// Which scratch-held quantity a division lowering should leave in `A`.
#[derive(Clone, Copy)]
enum DivisionOutput {
    Quotient,
    Remainder,
}

/// Owns the growing instruction buffer and the label table during one
/// `generate` call; nothing here outlives that call.
struct Emitter {
    code: Vec<Instruction>,
    labels: HashMap<String, usize>,
    label_counter: usize,
}

impl Emitter {
    fn new() -> Emitter {
        Emitter {
            code: Vec::new(),
            labels: HashMap::new(),
            label_counter: 0,
        }
    }

    fn fresh_label(&mut self, tag: &str) -> String {
        let label = format!("{}_{}", tag, self.label_counter);
        self.label_counter += 1;
        label
    }

    fn bind(&mut self, label: String) {
        self.labels.insert(label, self.code.len());
    }

    fn bare(&mut self, op: Opcode) {
        self.code.push(Instruction::bare(op));
    }

    fn addr(&mut self, op: Opcode, address: usize) {
        self.code.push(Instruction::with_address(op, address));
    }

    fn branch(&mut self, op: Opcode, label: String) {
        self.code.push(Instruction::with_label(op, label));
    }

    /// Resolves every symbolic label argument to a concrete instruction
    /// index. Warns about labels that were bound but never reached by any
    /// branch and fails if a branch references a label that was never
    /// bound.
    fn finish(mut self) -> Result<Vec<Instruction>, GeneratorError> {
        let mut referenced = HashSet::new();
        for instr in &self.code {
            if let Some(Arg::Label(name)) = &instr.arg {
                referenced.insert(name.clone());
            }
        }
        for label in self.labels.keys() {
            if !referenced.contains(label) {
                log::warn!("label \"{}\" was bound but never branched to", label);
            }
        }

        for instr in self.code.iter_mut() {
            if let Some(Arg::Label(name)) = &instr.arg {
                let resolved = *self
                    .labels
                    .get(name)
                    .ok_or_else(|| GeneratorError { label: name.clone() })?;
                instr.arg = Some(Arg::Resolved(resolved));
            }
        }
        Ok(self.code)
    }
}

/// Constant synthesis: the only mechanism for introducing a literal
/// into the code. `value` must be non-negative, per the data model.
fn emit_constant(emitter: &mut Emitter, value: i64) {
    debug_assert!(value >= 0);
    emitter.bare(Opcode::ZERO);
    if value == 0 {
        return;
    }
    emitter.bare(Opcode::INC);
    let bits = value as u64;
    let highest = 63 - bits.leading_zeros();
    for bit in (0..highest).rev() {
        emitter.bare(Opcode::SHL);
        if (bits >> bit) & 1 == 1 {
            emitter.bare(Opcode::INC);
        }
    }
}

fn emit_expr(emitter: &mut Emitter, memory: &MemoryMap, expr: &Expr) {
    match expr {
        Expr::Number(v) => emit_constant(emitter, *v),
        Expr::Identifier(name, _) => emitter.addr(Opcode::LOAD, memory.address(name)),
        Expr::BinOp {
            left, op, right, ..
        } => match op {
            BinOpKind::Add => {
                emitter.addr(Opcode::LOAD, memory.address(left));
                emitter.addr(Opcode::ADD, memory.address(right));
            }
            BinOpKind::Sub => {
                emitter.addr(Opcode::LOAD, memory.address(left));
                emitter.addr(Opcode::SUB, memory.address(right));
            }
            BinOpKind::Mul => emit_multiply(emitter, memory, left, right),
            BinOpKind::Div => emit_division(emitter, memory, left, right, DivisionOutput::Quotient),
            BinOpKind::Mod => {
                emit_division(emitter, memory, left, right, DivisionOutput::Remainder)
            }
        },
    }
}

/// Russian peasant multiplication, O(log b) in the multiplier.
fn emit_multiply(emitter: &mut Emitter, memory: &MemoryMap, left: &str, right: &str) {
    let r = memory.scratch(0);
    let a = memory.scratch(1);
    let b = memory.scratch(2);

    emitter.bare(Opcode::ZERO);
    emitter.addr(Opcode::STORE, r);
    emitter.addr(Opcode::LOAD, memory.address(left));
    emitter.addr(Opcode::STORE, a);
    emitter.addr(Opcode::LOAD, memory.address(right));
    emitter.addr(Opcode::STORE, b);

    let loop_label = emitter.fresh_label("mul_loop");
    let end_label = emitter.fresh_label("mul_end");
    let odd_label = emitter.fresh_label("mul_odd");
    let after_odd_label = emitter.fresh_label("mul_after_odd");

    emitter.bind(loop_label.clone());
    emitter.addr(Opcode::LOAD, b);
    emitter.branch(Opcode::JZ, end_label.clone());
    emitter.addr(Opcode::LOAD, b);
    emitter.branch(Opcode::JODD, odd_label.clone());
    emitter.branch(Opcode::JUMP, after_odd_label.clone());

    emitter.bind(odd_label);
    emitter.addr(Opcode::LOAD, r);
    emitter.addr(Opcode::ADD, a);
    emitter.addr(Opcode::STORE, r);

    emitter.bind(after_odd_label);
    emitter.addr(Opcode::LOAD, a);
    emitter.bare(Opcode::SHL);
    emitter.addr(Opcode::STORE, a);
    emitter.addr(Opcode::LOAD, b);
    emitter.bare(Opcode::SHR);
    emitter.addr(Opcode::STORE, b);
    emitter.branch(Opcode::JUMP, loop_label);

    emitter.bind(end_label);
    emitter.addr(Opcode::LOAD, r);
}

/// Binary long division, shared by `/` and `%` through a single
/// parameterized emitter rather than two duplicated subroutines. Divisor
/// zero yields 0 for both quotient and remainder.
///
/// The division phase's per-bit comparison is "is `D <= R`", which (unlike
/// a `==` test) a single saturating subtract answers unambiguously: `D-R`
/// saturates to exactly 0 iff `D <= R`. This is the same shape as the
/// already-sound `<=` relop lowering, just over scratch cells instead of
/// named operands.
fn emit_division(
    emitter: &mut Emitter,
    memory: &MemoryMap,
    left: &str,
    right: &str,
    output: DivisionOutput,
) {
    let q = memory.scratch(0);
    let r = memory.scratch(1);
    let d = memory.scratch(2);
    let t = memory.scratch(3);
    let c = memory.scratch(4);

    emitter.bare(Opcode::ZERO);
    emitter.addr(Opcode::STORE, q);
    emitter.addr(Opcode::LOAD, memory.address(left));
    emitter.addr(Opcode::STORE, r);
    emitter.addr(Opcode::LOAD, memory.address(right));
    emitter.addr(Opcode::STORE, d);
    emitter.bare(Opcode::ZERO);
    emitter.addr(Opcode::STORE, c);

    let zero_result_label = emitter.fresh_label("div_zero");
    let done_label = emitter.fresh_label("div_done");
    let shift_loop_label = emitter.fresh_label("div_shift_loop");
    let shift_end_label = emitter.fresh_label("div_shift_end");
    let division_loop_label = emitter.fresh_label("div_loop");
    let skip_bit_label = emitter.fresh_label("div_skip_bit");
    let after_bit_label = emitter.fresh_label("div_after_bit");
    let division_end_label = emitter.fresh_label("div_end");

    emitter.addr(Opcode::LOAD, memory.address(right));
    emitter.branch(Opcode::JZ, zero_result_label.clone());

    // Shift-up phase: grow D to the largest divisor * 2^C that is <= R.
    emitter.bind(shift_loop_label.clone());
    emitter.addr(Opcode::LOAD, d);
    emitter.bare(Opcode::SHL);
    emitter.addr(Opcode::STORE, t);
    emitter.addr(Opcode::LOAD, t);
    emitter.addr(Opcode::SUB, r);
    emitter.branch(Opcode::JG, shift_end_label.clone());
    emitter.addr(Opcode::LOAD, t);
    emitter.addr(Opcode::STORE, d);
    emitter.addr(Opcode::LOAD, c);
    emitter.bare(Opcode::INC);
    emitter.addr(Opcode::STORE, c);
    emitter.branch(Opcode::JUMP, shift_loop_label);
    emitter.bind(shift_end_label);

    // Division phase: exactly C+1 iterations, halving D each time.
    emitter.bind(division_loop_label.clone());
    emitter.addr(Opcode::LOAD, d);
    emitter.addr(Opcode::SUB, r);
    emitter.branch(Opcode::JG, skip_bit_label.clone());
    emitter.addr(Opcode::LOAD, r);
    emitter.addr(Opcode::SUB, d);
    emitter.addr(Opcode::STORE, r);
    emitter.addr(Opcode::LOAD, q);
    emitter.bare(Opcode::SHL);
    emitter.bare(Opcode::INC);
    emitter.addr(Opcode::STORE, q);
    emitter.branch(Opcode::JUMP, after_bit_label.clone());
    emitter.bind(skip_bit_label);
    emitter.addr(Opcode::LOAD, q);
    emitter.bare(Opcode::SHL);
    emitter.addr(Opcode::STORE, q);
    emitter.bind(after_bit_label);
    emitter.addr(Opcode::LOAD, d);
    emitter.bare(Opcode::SHR);
    emitter.addr(Opcode::STORE, d);
    emitter.addr(Opcode::LOAD, c);
    emitter.branch(Opcode::JZ, division_end_label.clone());
    emitter.addr(Opcode::LOAD, c);
    emitter.bare(Opcode::DEC);
    emitter.addr(Opcode::STORE, c);
    emitter.branch(Opcode::JUMP, division_loop_label);
    emitter.bind(division_end_label);
    emitter.branch(Opcode::JUMP, done_label.clone());

    emitter.bind(zero_result_label);
    emitter.bare(Opcode::ZERO);
    emitter.addr(Opcode::STORE, q);
    emitter.bare(Opcode::ZERO);
    emitter.addr(Opcode::STORE, r);

    emitter.bind(done_label);
    match output {
        DivisionOutput::Quotient => emitter.addr(Opcode::LOAD, q),
        DivisionOutput::Remainder => emitter.addr(Opcode::LOAD, r),
    }
}

/// Condition lowering: falls through when the relation holds, jumps to
/// `false_label` otherwise.
fn emit_condition(emitter: &mut Emitter, memory: &MemoryMap, cond: &Condition, false_label: String) {
    let left = memory.address(&cond.left);
    let right = memory.address(&cond.right);
    match cond.relop {
        RelOp::Eq => emit_robust_equal(emitter, left, right, false_label),
        RelOp::NotEq => emit_robust_not_equal(emitter, left, right, false_label),
        RelOp::Lt => {
            emitter.addr(Opcode::LOAD, left);
            emitter.bare(Opcode::INC);
            emitter.addr(Opcode::SUB, right);
            emitter.branch(Opcode::JG, false_label);
        }
        RelOp::Gt => {
            emitter.addr(Opcode::LOAD, right);
            emitter.bare(Opcode::INC);
            emitter.addr(Opcode::SUB, left);
            emitter.branch(Opcode::JG, false_label);
        }
        RelOp::Le => {
            emitter.addr(Opcode::LOAD, left);
            emitter.addr(Opcode::SUB, right);
            emitter.branch(Opcode::JG, false_label);
        }
        RelOp::Ge => {
            emitter.addr(Opcode::LOAD, right);
            emitter.addr(Opcode::SUB, left);
            emitter.branch(Opcode::JG, false_label);
        }
    }
}

fn emit_robust_equal(emitter: &mut Emitter, left: usize, right: usize, false_label: String) {
    let chk = emitter.fresh_label("eq_chk");
    let ok = emitter.fresh_label("eq_ok");

    emitter.addr(Opcode::LOAD, left);
    emitter.addr(Opcode::SUB, right);
    emitter.branch(Opcode::JZ, chk.clone());
    emitter.branch(Opcode::JUMP, false_label.clone());

    emitter.bind(chk);
    emitter.addr(Opcode::LOAD, right);
    emitter.addr(Opcode::SUB, left);
    emitter.branch(Opcode::JZ, ok.clone());
    emitter.branch(Opcode::JUMP, false_label);

    emitter.bind(ok);
}

fn emit_robust_not_equal(emitter: &mut Emitter, left: usize, right: usize, false_label: String) {
    let chk = emitter.fresh_label("ne_chk");
    let ok = emitter.fresh_label("ne_ok");
    let is_equal = emitter.fresh_label("ne_equal");

    emitter.addr(Opcode::LOAD, left);
    emitter.addr(Opcode::SUB, right);
    emitter.branch(Opcode::JZ, chk.clone());
    emitter.branch(Opcode::JUMP, ok.clone());

    emitter.bind(chk);
    emitter.addr(Opcode::LOAD, right);
    emitter.addr(Opcode::SUB, left);
    emitter.branch(Opcode::JZ, is_equal.clone());
    emitter.branch(Opcode::JUMP, ok.clone());

    emitter.bind(is_equal);
    emitter.branch(Opcode::JUMP, false_label);

    emitter.bind(ok);
}

fn emit_commands(emitter: &mut Emitter, memory: &MemoryMap, commands: &[Command]) {
    for command in commands {
        emit_command(emitter, memory, command);
    }
}

fn emit_command(emitter: &mut Emitter, memory: &MemoryMap, command: &Command) {
    match command {
        Command::Assignment { target, expr, .. } => {
            emit_expr(emitter, memory, expr);
            emitter.addr(Opcode::STORE, memory.address(target));
        }
        Command::Read { target, .. } => {
            emitter.addr(Opcode::SCAN, memory.address(target));
        }
        Command::Write { target, .. } => {
            emitter.addr(Opcode::PRINT, memory.address(target));
        }
        Command::IfElse {
            cond,
            then_branch,
            else_branch,
        } => {
            let else_label = emitter.fresh_label("if_else");
            let end_label = emitter.fresh_label("if_end");
            emit_condition(emitter, memory, cond, else_label.clone());
            emit_commands(emitter, memory, then_branch);
            emitter.branch(Opcode::JUMP, end_label.clone());
            emitter.bind(else_label);
            emit_commands(emitter, memory, else_branch);
            emitter.bind(end_label);
        }
        Command::While { cond, body } => {
            let start_label = emitter.fresh_label("while_start");
            let end_label = emitter.fresh_label("while_end");
            emitter.bind(start_label.clone());
            emit_condition(emitter, memory, cond, end_label.clone());
            emit_commands(emitter, memory, body);
            emitter.branch(Opcode::JUMP, start_label);
            emitter.bind(end_label);
        }
    }
}

/// Lowers a validated program into a finalized instruction stream and its
/// memory map. Fails only on an unresolved label,
/// which is always an internal bug, never a user-level one.
pub fn generate(
    semantic: &SemanticResult,
    program: &Program,
) -> Result<CompiledProgram, GeneratorError> {
    let memory = MemoryMap::build(semantic);
    let mut emitter = Emitter::new();

    for (name, value) in &semantic.const_table {
        emit_constant(&mut emitter, *value);
        emitter.addr(Opcode::STORE, memory.address(name));
    }

    emit_commands(&mut emitter, &memory, &program.commands);
    emitter.bare(Opcode::HALT);

    let code = emitter.finish()?;
    Ok(CompiledProgram {
        code,
        memory_map: memory,
    })
}
