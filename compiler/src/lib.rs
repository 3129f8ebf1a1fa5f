//! Lexes, parses, validates, and lowers source programs to [`accvm`]
//! instructions.
//!
//! The lexer, parser, and semantic analyzer are thin collaborators;
//! [`codegen`] is this crate's core, alongside the VM in [`accvm`] itself.
//! [`compile`] wires the whole pipeline together and is the one entry point
//! most callers need.

pub mod ast;
pub mod codegen;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod semantic;

pub use codegen::{CompiledProgram, MemoryMap};
pub use error::CompileError;
pub use semantic::SemanticResult;

use accvm::Instruction;

/// Runs the full pipeline: lex, parse, analyze, generate. Aborts at the
/// first lexical or syntax error; collects every semantic error before
/// giving up.
pub fn compile(source: &str) -> Result<CompiledProgram, CompileError> {
    log::debug!("lexing");
    let tokens = lexer::tokenize(source)?;

    log::debug!("parsing");
    let program = parser::parse(&tokens)?;

    log::debug!("analyzing");
    let semantic = semantic::analyze(&program)?;

    log::debug!("generating code");
    let compiled = codegen::generate(&semantic, &program)?;

    log::debug!(
        "compiled {} instructions over {} memory cells",
        compiled.code.len(),
        compiled.memory_map.len()
    );
    Ok(compiled)
}

/// Renders a finalized instruction stream as a textual dump: one `OP` or
/// `OP ARG` line per instruction, no header or footer. The VM's
/// [`accvm::Instruction`] `FromStr` impl reads the same format back.
pub fn dump_text(code: &[Instruction]) -> String {
    let mut out = String::new();
    for instr in code {
        out.push_str(&instr.to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod test;
