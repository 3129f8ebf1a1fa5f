//! Hand-written lexer: source text in, a flat token stream out.
//!
//! No skip-and-continue recovery: the first unrecognized character or
//! unterminated comment aborts the whole scan.

use crate::error::{LexError, LexErrorKind};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Const,
    Var,
    Begin,
    End,
    If,
    Then,
    Else,
    While,
    Do,
    Read,
    Write,
    Identifier(String),
    Number(i64),
    Assign,
    Plus,
    Minus,
    Times,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Semicolon,
}

impl Token {
    /// A human-readable name for error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Identifier(name) => format!("identifier \"{}\"", name),
            Token::Number(v) => format!("number {}", v),
            other => format!("\"{}\"", other.spelling()),
        }
    }

    fn spelling(&self) -> &'static str {
        match self {
            Token::Const => "CONST",
            Token::Var => "VAR",
            Token::Begin => "BEGIN",
            Token::End => "END",
            Token::If => "IF",
            Token::Then => "THEN",
            Token::Else => "ELSE",
            Token::While => "WHILE",
            Token::Do => "DO",
            Token::Read => "READ",
            Token::Write => "WRITE",
            Token::Assign => ":=",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Times => "*",
            Token::Divide => "/",
            Token::Modulo => "%",
            Token::Equal => "==",
            Token::NotEqual => "!=",
            Token::Less => "<",
            Token::Greater => ">",
            Token::LessEqual => "<=",
            Token::GreaterEqual => ">=",
            Token::Semicolon => ";",
            Token::Identifier(_) | Token::Number(_) => unreachable!(),
        }
    }
}

/// A token plus the source line it started on, for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpannedToken {
    pub token: Token,
    pub line: usize,
}

fn keyword(word: &str) -> Option<Token> {
    match word.to_ascii_uppercase().as_str() {
        "CONST" => Some(Token::Const),
        "VAR" => Some(Token::Var),
        "BEGIN" => Some(Token::Begin),
        "END" => Some(Token::End),
        "IF" => Some(Token::If),
        "THEN" => Some(Token::Then),
        "ELSE" => Some(Token::Else),
        "WHILE" => Some(Token::While),
        "DO" => Some(Token::Do),
        "READ" => Some(Token::Read),
        "WRITE" => Some(Token::Write),
        _ => None,
    }
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Lexer<'a> {
        Lexer {
            chars: source.chars().peekable(),
            line: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c == Some('\n') {
            self.line += 1;
        }
        c
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek_second(&mut self) -> Option<char> {
        let mut clone = self.chars.clone();
        clone.next();
        clone.next()
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('(') if self.peek_second() == Some('*') => {
                    let start_line = self.line;
                    self.bump();
                    self.bump();
                    loop {
                        match self.peek() {
                            None => {
                                return Err(LexError {
                                    line: start_line,
                                    kind: LexErrorKind::UnterminatedComment,
                                })
                            }
                            Some('*') if self.peek_second() == Some(')') => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            Some(_) => {
                                self.bump();
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn lex_one(&mut self) -> Result<Option<SpannedToken>, LexError> {
        self.skip_whitespace_and_comments()?;
        let line = self.line;
        let c = match self.peek() {
            None => return Ok(None),
            Some(c) => c,
        };

        let token = if c.is_ascii_digit() {
            let mut digits = String::new();
            while let Some(d) = self.peek() {
                if d.is_ascii_digit() {
                    digits.push(d);
                    self.bump();
                } else {
                    break;
                }
            }
            Token::Number(digits.parse().expect("digit run must parse as i64"))
        } else if c.is_alphabetic() || c == '_' {
            let mut word = String::new();
            while let Some(d) = self.peek() {
                if d.is_alphanumeric() || d == '_' {
                    word.push(d);
                    self.bump();
                } else {
                    break;
                }
            }
            keyword(&word).unwrap_or(Token::Identifier(word))
        } else {
            match c {
                ':' if self.peek_second() == Some('=') => {
                    self.bump();
                    self.bump();
                    Token::Assign
                }
                '=' if self.peek_second() == Some('=') => {
                    self.bump();
                    self.bump();
                    Token::Equal
                }
                '!' if self.peek_second() == Some('=') => {
                    self.bump();
                    self.bump();
                    Token::NotEqual
                }
                '<' if self.peek_second() == Some('=') => {
                    self.bump();
                    self.bump();
                    Token::LessEqual
                }
                '>' if self.peek_second() == Some('=') => {
                    self.bump();
                    self.bump();
                    Token::GreaterEqual
                }
                '<' => {
                    self.bump();
                    Token::Less
                }
                '>' => {
                    self.bump();
                    Token::Greater
                }
                '+' => {
                    self.bump();
                    Token::Plus
                }
                '-' => {
                    self.bump();
                    Token::Minus
                }
                '*' => {
                    self.bump();
                    Token::Times
                }
                '/' => {
                    self.bump();
                    Token::Divide
                }
                '%' => {
                    self.bump();
                    Token::Modulo
                }
                ';' => {
                    self.bump();
                    Token::Semicolon
                }
                other => {
                    self.bump();
                    return Err(LexError {
                        line,
                        kind: LexErrorKind::UnrecognizedCharacter(other),
                    });
                }
            }
        };

        Ok(Some(SpannedToken { token, line }))
    }
}

/// Scans `source` into a flat token stream, aborting on the first error.
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, LexError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    while let Some(tok) = lexer.lex_one()? {
        tokens.push(tok);
    }
    Ok(tokens)
}

#[cfg(test)]
mod test {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(kinds("const Const CONST"), vec![Token::Const; 3]);
    }

    #[test]
    fn identifier_that_is_a_keyword_prefix_stays_an_identifier() {
        assert_eq!(
            kinds("constant"),
            vec![Token::Identifier("constant".to_owned())]
        );
    }

    #[test]
    fn two_character_operators_are_not_split() {
        assert_eq!(
            kinds(":= == != <= >="),
            vec![
                Token::Assign,
                Token::Equal,
                Token::NotEqual,
                Token::LessEqual,
                Token::GreaterEqual,
            ]
        );
    }

    #[test]
    fn comments_are_discarded_and_may_span_lines() {
        assert_eq!(
            kinds("x (* a\nb *) := 1;"),
            vec![
                Token::Identifier("x".to_owned()),
                Token::Assign,
                Token::Number(1),
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn unterminated_comment_is_a_lex_error() {
        let err = tokenize("x := 1; (* oops").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedComment);
    }

    #[test]
    fn unrecognized_character_is_a_lex_error() {
        let err = tokenize("x := 1 @ 2;").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnrecognizedCharacter('@'));
    }

    #[test]
    fn line_numbers_count_newlines() {
        let tokens = tokenize("x\ny\nz").unwrap();
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[2].line, 3);
    }
}
