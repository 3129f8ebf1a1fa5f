use crate::{compile_file, read_input_file, run, DriverError, QueueSource};
use std::io::Write;

fn write_temp(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

#[test]
fn compile_file_reads_and_compiles_a_source_program() {
    let file = write_temp("VAR x BEGIN x := 1 + 2; WRITE x; END");
    let compiled = compile_file(file.path()).expect("should compile");
    assert!(!compiled.code.is_empty());
}

#[test]
fn compile_file_reports_a_missing_path_as_an_io_error() {
    let missing = std::path::PathBuf::from("/nonexistent/does-not-exist.src");
    let err = compile_file(&missing).unwrap_err();
    assert!(matches!(err, DriverError::Io { .. }));
}

#[test]
fn compile_file_reports_a_syntax_error_as_a_compile_error() {
    let file = write_temp("VAR x BEGIN WRITE x;");
    let err = compile_file(file.path()).unwrap_err();
    assert!(matches!(err, DriverError::Compile(_)));
}

#[test]
fn read_input_file_parses_one_integer_per_line_and_skips_blanks() {
    let file = write_temp("1\n2\n\n3\n");
    let values = read_input_file(file.path()).expect("should parse");
    assert_eq!(values, vec![1, 2, 3]);
}

#[test]
fn read_input_file_reports_a_malformed_line_as_invalid_input() {
    let file = write_temp("1\nnot-a-number\n3\n");
    let err = read_input_file(file.path()).unwrap_err();
    assert!(matches!(err, DriverError::InvalidInput { .. }));
}

#[test]
fn running_a_compiled_program_with_queued_input_consumes_values_in_order() {
    let source = "VAR x y BEGIN READ x; READ y; WRITE x; WRITE y; WRITE x + y; END";
    let compiled = compile_file(write_temp(source).path()).expect("should compile");
    let mut input = QueueSource::new(vec![4, 5]);
    let outcome = run(&compiled.code, &mut input);
    assert_eq!(outcome.output, vec![4, 5, 9]);
}

#[test]
fn running_with_exhausted_queued_input_substitutes_zero() {
    let source = "VAR x BEGIN READ x; WRITE x; END";
    let compiled = compile_file(write_temp(source).path()).expect("should compile");
    let mut input = QueueSource::new(vec![]);
    let outcome = run(&compiled.code, &mut input);
    assert_eq!(outcome.output, vec![0]);
}
