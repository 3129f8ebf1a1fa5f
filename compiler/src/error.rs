//! Error types for each pipeline stage, composed upward into [`CompileError`].
//!
//! Each stage gets its own small enum; none of them borrow from the source
//! text, so a [`CompileError`] can outlive the string it was produced from.

use std::fmt;

/// A lexical error: an unrecognized character or an unterminated comment.
///
/// Lexing aborts on the first such error (see the crate's lexer module).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LexError {
    pub line: usize,
    pub kind: LexErrorKind,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LexErrorKind {
    UnrecognizedCharacter(char),
    UnterminatedComment,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            LexErrorKind::UnrecognizedCharacter(c) => {
                write!(f, "line {}: unrecognized character '{}'", self.line, c)
            }
            LexErrorKind::UnterminatedComment => {
                write!(f, "line {}: unterminated comment", self.line)
            }
        }
    }
}

impl std::error::Error for LexError {}

/// A syntax error: an unexpected token, or end of input where one was
/// expected. Parsing aborts on the first such error.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseErrorKind {
    UnexpectedToken { expected: String, found: String },
    UnexpectedEndOfInput { expected: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            ParseErrorKind::UnexpectedToken { expected, found } => write!(
                f,
                "line {}: expected {}, found {}",
                self.line, expected, found
            ),
            ParseErrorKind::UnexpectedEndOfInput { expected } => write!(
                f,
                "line {}: expected {}, found end of input",
                self.line, expected
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// A single semantic problem. Unlike lexing/parsing, the analyzer collects
/// every one of these it finds rather than stopping at the first.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SemanticError {
    pub line: usize,
    pub kind: SemanticErrorKind,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SemanticErrorKind {
    DuplicateDeclaration(String),
    UndeclaredReference(String),
    AssignmentTargetNotVariable(String),
    ReadTargetNotVariable(String),
}

impl fmt::Display for SemanticError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            SemanticErrorKind::DuplicateDeclaration(name) => {
                write!(f, "line {}: \"{}\" is already declared", self.line, name)
            }
            SemanticErrorKind::UndeclaredReference(name) => {
                write!(f, "line {}: \"{}\" is not declared", self.line, name)
            }
            SemanticErrorKind::AssignmentTargetNotVariable(name) => write!(
                f,
                "line {}: cannot assign to \"{}\", which is not a variable",
                self.line, name
            ),
            SemanticErrorKind::ReadTargetNotVariable(name) => write!(
                f,
                "line {}: cannot read into \"{}\", which is not a variable",
                self.line, name
            ),
        }
    }
}

impl std::error::Error for SemanticError {}

/// The one fatal bug class the code generator can surface: a branch whose
/// label was never bound by the time backpatching ran.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GeneratorError {
    pub label: String,
}

impl fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "internal error: unresolved label \"{}\"", self.label)
    }
}

impl std::error::Error for GeneratorError {}

/// The single error type the CLI driver (and any other embedder) deals
/// with; every stage's error composes into it via `From`.
#[derive(Clone, Debug, PartialEq)]
pub enum CompileError {
    Lex(LexError),
    Parse(ParseError),
    Semantic(Vec<SemanticError>),
    Generator(GeneratorError),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CompileError::Lex(err) => write!(f, "{}", err),
            CompileError::Parse(err) => write!(f, "{}", err),
            CompileError::Semantic(errs) => {
                for (i, err) in errs.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
            CompileError::Generator(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<LexError> for CompileError {
    fn from(err: LexError) -> CompileError {
        CompileError::Lex(err)
    }
}

impl From<ParseError> for CompileError {
    fn from(err: ParseError) -> CompileError {
        CompileError::Parse(err)
    }
}

impl From<Vec<SemanticError>> for CompileError {
    fn from(errs: Vec<SemanticError>) -> CompileError {
        CompileError::Semantic(errs)
    }
}

impl From<GeneratorError> for CompileError {
    fn from(err: GeneratorError) -> CompileError {
        CompileError::Generator(err)
    }
}
