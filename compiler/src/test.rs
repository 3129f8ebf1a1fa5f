use crate::ast::RelOp;
use crate::{compile, CompileError};
use accvm::{Memory, Outcome, Processor, QueueInput};
use proptest::prelude::*;

fn run(source: &str, input: Vec<i64>) -> Outcome {
    let compiled = compile(source).expect("compilation should succeed");
    let mut memory = Memory::new(accvm::constants::MEMORY_SIZE);
    let mut queue = QueueInput::new(input);
    Processor::new().run(&compiled.code, &mut memory, &mut queue)
}

#[test]
fn scenario_mixed_arithmetic() {
    let source = "CONST zero := 0 VAR x y z \
        BEGIN \
        x := 5; y := 10; \
        z := x + y; WRITE z; \
        z := y - x; WRITE z; \
        z := x * y; WRITE z; \
        z := y / x; WRITE z; \
        z := y % x; WRITE z; \
        END";
    assert_eq!(run(source, vec![]).output, vec![15, 5, 50, 2, 0]);
}

#[test]
fn scenario_while_loop_sums_one_through_five() {
    let source = "VAR i sum \
        BEGIN \
        i := 1; sum := 0; \
        WHILE i <= 5 DO sum := sum + i; i := i + 1; END \
        WRITE sum; \
        END";
    assert_eq!(run(source, vec![]).output, vec![15]);
}

#[test]
fn scenario_reads_and_adds_two_inputs() {
    let source = "VAR x y \
        BEGIN READ x; READ y; WRITE x; WRITE y; WRITE x+y; END";
    assert_eq!(run(source, vec![42, 58]).output, vec![42, 58, 100]);
}

#[test]
fn scenario_large_multiplication_stays_well_under_cost_budget() {
    let source = "VAR x y z BEGIN x:=12345; y:=67890; z:=x*y; WRITE z; END";
    let outcome = run(source, vec![]);
    assert_eq!(outcome.output, vec![838102050]);
    assert!(outcome.steps < 100_000);
}

#[test]
fn scenario_large_division_stays_well_under_cost_budget() {
    let source = "VAR x y z BEGIN x:=1234567; y:=89; z:=x/y; WRITE z; END";
    let outcome = run(source, vec![]);
    assert_eq!(outcome.output, vec![13871]);
    assert!(outcome.steps < 100_000);
}

#[test]
fn scenario_division_by_zero_yields_zero() {
    let source = "VAR a b c BEGIN a:=7; b:=0; c:=a/b; WRITE c; END";
    assert_eq!(run(source, vec![]).output, vec![0]);
}

#[test]
fn every_backpatched_branch_target_is_a_valid_instruction_index() {
    let source = "VAR i sum \
        BEGIN i := 1; sum := 0; \
        WHILE i <= 5 DO \
          IF i == 3 THEN sum := sum + i; ELSE sum := sum; END \
          i := i + 1; \
        END \
        WRITE sum; END";
    let compiled = compile(source).unwrap();
    for instr in &compiled.code {
        if let Some(target) = instr.resolved_arg() {
            if instr.op.is_branch() {
                assert!(target < compiled.code.len());
            }
        }
    }
}

#[test]
fn memory_map_is_a_bijection_and_scratch_is_disjoint_from_named_cells() {
    let source = "CONST a := 1 b := 2 VAR x y z BEGIN x := a; y := b; z := x + y; WRITE z; END";
    let compiled = compile(source).unwrap();
    let names = ["a", "b", "x", "y", "z"];
    let mut addresses = std::collections::HashSet::new();
    for name in names {
        let addr = compiled.memory_map.address(name);
        assert!(addresses.insert(addr), "address {} reused", addr);
        assert!(addr < compiled.memory_map.temp_start);
    }
    for offset in 0..5 {
        assert!(!addresses.contains(&(compiled.memory_map.temp_start + offset)));
    }
}

#[test]
fn duplicate_declaration_is_reported_as_a_semantic_error() {
    let err = compile("CONST x := 1 VAR x BEGIN WRITE x; END").unwrap_err();
    assert!(matches!(err, CompileError::Semantic(_)));
}

#[test]
fn unterminated_comment_is_reported_as_a_lex_error() {
    let err = compile("VAR x BEGIN WRITE x; (* oops").unwrap_err();
    assert!(matches!(err, CompileError::Lex(_)));
}

#[test]
fn missing_end_is_reported_as_a_parse_error() {
    let err = compile("VAR x BEGIN WRITE x;").unwrap_err();
    assert!(matches!(err, CompileError::Parse(_)));
}

#[test]
fn running_the_same_program_twice_is_deterministic() {
    let source = "VAR x y BEGIN READ x; READ y; WRITE x*y; END";
    let compiled = compile(source).unwrap();
    let run_once = || {
        let mut memory = Memory::new(accvm::constants::MEMORY_SIZE);
        let mut queue = QueueInput::new(vec![6, 7]);
        Processor::new().run(&compiled.code, &mut memory, &mut queue)
    };
    let first = run_once();
    let second = run_once();
    assert_eq!(first.output, second.output);
    assert_eq!(first.steps, second.steps);
}

/// Builds a tiny program computing `z := a/b; z := z*b;` over two variables
/// fed through stdin, so each relop/arithmetic property test only needs to
/// vary its input stream rather than regenerate source text.
fn round_trip_program() -> &'static str {
    "VAR a b z BEGIN READ a; READ b; z := a / b; z := z * b; WRITE z; END"
}

proptest! {
    #[test]
    fn round_trip_quotient_times_divisor_removes_the_remainder(a in 0i64..2000, b in 1i64..200) {
        let outcome = run(round_trip_program(), vec![a, b]);
        prop_assert_eq!(outcome.output, vec![a - (a % b)]);
    }

    #[test]
    fn constant_synthesis_cost_matches_the_budget(v in 0i64..100_000) {
        let source = format!("VAR z BEGIN z := {}; WRITE z; END", v);
        let compiled = compile(&source).unwrap();
        // find the constant-synthesis prefix: everything up to the first STORE.
        let synth_len = compiled
            .code
            .iter()
            .position(|i| i.op == accvm::Opcode::STORE)
            .unwrap();
        let bound = if v == 0 {
            1
        } else {
            2 * (64 - (v as u64).leading_zeros()) as usize + 2
        };
        prop_assert!(synth_len <= bound);
    }
}

fn relop_source(relop: &str) -> String {
    format!(
        "VAR a b result BEGIN READ a; READ b; \
         IF a {relop} b THEN result := 1; ELSE result := 0; END \
         WRITE result; END",
        relop = relop
    )
}

fn native_relop(relop: RelOp, a: i64, b: i64) -> bool {
    match relop {
        RelOp::Eq => a == b,
        RelOp::NotEq => a != b,
        RelOp::Lt => a < b,
        RelOp::Gt => a > b,
        RelOp::Le => a <= b,
        RelOp::Ge => a >= b,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn every_corrected_relop_lowering_agrees_with_native_comparison(
        a in 0i64..50,
        b in 0i64..50,
    ) {
        for (text, relop) in [
            ("==", RelOp::Eq),
            ("!=", RelOp::NotEq),
            ("<", RelOp::Lt),
            (">", RelOp::Gt),
            ("<=", RelOp::Le),
            (">=", RelOp::Ge),
        ] {
            let outcome = run(&relop_source(text), vec![a, b]);
            let expected = if native_relop(relop, a, b) { 1 } else { 0 };
            prop_assert_eq!(outcome.output, vec![expected], "relop {} with a={} b={}", text, a, b);
        }
    }
}
