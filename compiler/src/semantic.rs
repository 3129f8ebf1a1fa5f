//! Semantic analyzer: validates identifier usage and builds the
//! `const_table`/`var_table` the code generator consumes.
//!
//! Unlike the lexer and parser, this stage accumulates every error it finds
//! rather than aborting on the first one.

use crate::ast::*;
use crate::error::{SemanticError, SemanticErrorKind};
use std::collections::HashMap;

/// `const_table` and `var_table`, in declaration order, plus lookup maps.
///
/// Declaration order is observable by the code generator: it fixes the
/// memory layout, so this keeps both the ordered list and the O(1)
/// lookup rather than just a `HashMap`.
#[derive(Clone, Debug, Default)]
pub struct SemanticResult {
    pub const_table: Vec<(String, i64)>,
    pub var_table: Vec<String>,
    const_index: HashMap<String, i64>,
    var_index: HashMap<String, usize>,
}

impl SemanticResult {
    pub fn is_const(&self, name: &str) -> bool {
        self.const_index.contains_key(name)
    }

    pub fn is_var(&self, name: &str) -> bool {
        self.var_index.contains_key(name)
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.is_const(name) || self.is_var(name)
    }
}

struct Analyzer {
    result: SemanticResult,
    errors: Vec<SemanticError>,
}

impl Analyzer {
    fn new() -> Analyzer {
        Analyzer {
            result: SemanticResult::default(),
            errors: Vec::new(),
        }
    }

    fn declared_anywhere(&self, name: &str) -> bool {
        self.result.const_index.contains_key(name) || self.result.var_index.contains_key(name)
    }

    fn declare_const(&mut self, name: &str, value: i64, line: usize) {
        if self.declared_anywhere(name) {
            self.errors.push(SemanticError {
                line,
                kind: SemanticErrorKind::DuplicateDeclaration(name.to_owned()),
            });
            return;
        }
        self.result.const_index.insert(name.to_owned(), value);
        self.result.const_table.push((name.to_owned(), value));
    }

    fn declare_var(&mut self, name: &str, line: usize) {
        if self.declared_anywhere(name) {
            self.errors.push(SemanticError {
                line,
                kind: SemanticErrorKind::DuplicateDeclaration(name.to_owned()),
            });
            return;
        }
        let ordinal = self.result.var_table.len();
        self.result.var_index.insert(name.to_owned(), ordinal);
        self.result.var_table.push(name.to_owned());
    }

    fn check_reference(&mut self, name: &str, line: usize) {
        if !self.declared_anywhere(name) {
            self.errors.push(SemanticError {
                line,
                kind: SemanticErrorKind::UndeclaredReference(name.to_owned()),
            });
        }
    }

    fn check_assignment_target(&mut self, name: &str, line: usize) {
        self.check_reference(name, line);
        if self.declared_anywhere(name) && !self.result.var_index.contains_key(name) {
            self.errors.push(SemanticError {
                line,
                kind: SemanticErrorKind::AssignmentTargetNotVariable(name.to_owned()),
            });
        }
    }

    fn check_read_target(&mut self, name: &str, line: usize) {
        self.check_reference(name, line);
        if self.declared_anywhere(name) && !self.result.var_index.contains_key(name) {
            self.errors.push(SemanticError {
                line,
                kind: SemanticErrorKind::ReadTargetNotVariable(name.to_owned()),
            });
        }
    }

    fn check_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Number(_) => {}
            Expr::Identifier(name, line) => self.check_reference(name, *line),
            Expr::BinOp {
                left, right, line, ..
            } => {
                self.check_reference(left, *line);
                self.check_reference(right, *line);
            }
        }
    }

    fn check_condition(&mut self, cond: &Condition) {
        self.check_reference(&cond.left, cond.line);
        self.check_reference(&cond.right, cond.line);
    }

    fn check_commands(&mut self, commands: &[Command]) {
        for command in commands {
            match command {
                Command::Assignment { target, line, expr } => {
                    self.check_assignment_target(target, *line);
                    self.check_expr(expr);
                }
                Command::IfElse {
                    cond,
                    then_branch,
                    else_branch,
                } => {
                    self.check_condition(cond);
                    self.check_commands(then_branch);
                    self.check_commands(else_branch);
                }
                Command::While { cond, body } => {
                    self.check_condition(cond);
                    self.check_commands(body);
                }
                Command::Read { target, line } => self.check_read_target(target, *line),
                Command::Write { target, line } => self.check_reference(target, *line),
            }
        }
    }

    fn analyze(mut self, program: &Program) -> Result<SemanticResult, Vec<SemanticError>> {
        for decl in &program.consts {
            self.declare_const(&decl.name, decl.value, decl.line);
        }
        for decl in &program.vars {
            self.declare_var(&decl.name, decl.line);
        }
        self.check_commands(&program.commands);

        if self.errors.is_empty() {
            Ok(self.result)
        } else {
            Err(self.errors)
        }
    }
}

/// Validates `program` and builds its semantic tables, or returns every
/// error found — this stage never stops at the first one.
pub fn analyze(program: &Program) -> Result<SemanticResult, Vec<SemanticError>> {
    Analyzer::new().analyze(program)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn analyze_source(source: &str) -> Result<SemanticResult, Vec<SemanticError>> {
        let program = parse(&tokenize(source).unwrap()).unwrap();
        analyze(&program)
    }

    #[test]
    fn well_formed_program_has_no_errors() {
        let result =
            analyze_source("CONST c := 1 VAR x y BEGIN x := c + y; WRITE x; END").unwrap();
        assert_eq!(result.const_table, vec![("c".to_owned(), 1)]);
        assert_eq!(result.var_table, vec!["x".to_owned(), "y".to_owned()]);
    }

    #[test]
    fn duplicate_declaration_across_tables_is_an_error() {
        let errs = analyze_source("CONST x := 1 VAR x BEGIN WRITE x; END").unwrap_err();
        assert_eq!(errs.len(), 1);
        assert!(matches!(
            errs[0].kind,
            SemanticErrorKind::DuplicateDeclaration(ref n) if n == "x"
        ));
    }

    #[test]
    fn undeclared_reference_is_an_error() {
        let errs = analyze_source("CONST VAR x BEGIN WRITE y; END").unwrap_err();
        assert_eq!(errs.len(), 1);
        assert!(matches!(
            errs[0].kind,
            SemanticErrorKind::UndeclaredReference(ref n) if n == "y"
        ));
    }

    #[test]
    fn assigning_to_a_constant_is_an_error() {
        let errs = analyze_source("CONST c := 1 VAR BEGIN c := 5; END").unwrap_err();
        assert!(errs
            .iter()
            .any(|e| matches!(e.kind, SemanticErrorKind::AssignmentTargetNotVariable(_))));
    }

    #[test]
    fn reading_into_a_constant_is_an_error() {
        let errs = analyze_source("CONST c := 1 VAR BEGIN READ c; END").unwrap_err();
        assert!(errs
            .iter()
            .any(|e| matches!(e.kind, SemanticErrorKind::ReadTargetNotVariable(_))));
    }

    #[test]
    fn writing_a_constant_is_allowed() {
        analyze_source("CONST c := 1 VAR BEGIN WRITE c; END").unwrap();
    }

    #[test]
    fn errors_from_independent_statements_all_accumulate() {
        let errs = analyze_source("CONST VAR x BEGIN WRITE y; WRITE z; END").unwrap_err();
        assert_eq!(errs.len(), 2);
    }
}
