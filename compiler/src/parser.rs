//! Recursive-descent parser, one token of lookahead.

use crate::ast::*;
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::{SpannedToken, Token};

struct Parser<'a> {
    tokens: &'a [SpannedToken],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [SpannedToken]) -> Parser<'a> {
        Parser { tokens, pos: 0 }
    }

    fn current_line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|t| t.line)
            .or_else(|| self.tokens.last().map(|t| t.line))
            .unwrap_or(1)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).map(|t| t.token.clone());
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn error(&self, expected: &str) -> ParseError {
        let line = self.current_line();
        match self.peek() {
            Some(tok) => ParseError {
                line,
                kind: ParseErrorKind::UnexpectedToken {
                    expected: expected.to_owned(),
                    found: tok.describe(),
                },
            },
            None => ParseError {
                line,
                kind: ParseErrorKind::UnexpectedEndOfInput {
                    expected: expected.to_owned(),
                },
            },
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<usize, ParseError> {
        let line = self.current_line();
        match self.peek() {
            Some(tok) if *tok == expected => {
                self.bump();
                Ok(line)
            }
            _ => Err(self.error(what)),
        }
    }

    fn expect_identifier(&mut self) -> Result<(String, usize), ParseError> {
        let line = self.current_line();
        match self.peek() {
            Some(Token::Identifier(_)) => {
                let name = match self.bump().unwrap() {
                    Token::Identifier(name) => name,
                    _ => unreachable!(),
                };
                Ok((name, line))
            }
            _ => Err(self.error("an identifier")),
        }
    }

    fn expect_number(&mut self) -> Result<i64, ParseError> {
        match self.peek() {
            Some(Token::Number(_)) => match self.bump().unwrap() {
                Token::Number(v) => Ok(v),
                _ => unreachable!(),
            },
            _ => Err(self.error("a number")),
        }
    }

    fn parse_program(&mut self) -> Result<Program, ParseError> {
        let consts = if matches!(self.peek(), Some(Token::Const)) {
            self.bump();
            self.parse_const_declarations()?
        } else {
            Vec::new()
        };
        self.expect(Token::Var, "\"VAR\"")?;
        let vars = self.parse_var_declarations()?;
        self.expect(Token::Begin, "\"BEGIN\"")?;
        let commands = self.parse_commands()?;
        self.expect(Token::End, "\"END\"")?;
        if self.peek().is_some() {
            return Err(self.error("end of input"));
        }
        Ok(Program {
            consts,
            vars,
            commands,
        })
    }

    fn parse_const_declarations(&mut self) -> Result<Vec<ConstDecl>, ParseError> {
        let mut decls = Vec::new();
        while let Some(Token::Identifier(_)) = self.peek() {
            let (name, line) = self.expect_identifier()?;
            self.expect(Token::Assign, "\":=\"")?;
            let value = self.expect_number()?;
            decls.push(ConstDecl { name, value, line });
        }
        Ok(decls)
    }

    fn parse_var_declarations(&mut self) -> Result<Vec<Decl>, ParseError> {
        let mut decls = Vec::new();
        while let Some(Token::Identifier(_)) = self.peek() {
            let (name, line) = self.expect_identifier()?;
            decls.push(Decl { name, line });
        }
        Ok(decls)
    }

    fn parse_commands(&mut self) -> Result<Vec<Command>, ParseError> {
        let mut commands = Vec::new();
        commands.push(self.parse_command()?);
        while !matches!(self.peek(), Some(Token::End) | Some(Token::Else) | None) {
            commands.push(self.parse_command()?);
        }
        Ok(commands)
    }

    fn parse_command(&mut self) -> Result<Command, ParseError> {
        match self.peek() {
            Some(Token::If) => self.parse_if_else(),
            Some(Token::While) => self.parse_while(),
            Some(Token::Read) => self.parse_read(),
            Some(Token::Write) => self.parse_write(),
            Some(Token::Identifier(_)) => self.parse_assignment(),
            _ => Err(self.error("a command")),
        }
    }

    fn parse_if_else(&mut self) -> Result<Command, ParseError> {
        self.expect(Token::If, "\"IF\"")?;
        let cond = self.parse_condition()?;
        self.expect(Token::Then, "\"THEN\"")?;
        let then_branch = self.parse_commands()?;
        self.expect(Token::Else, "\"ELSE\"")?;
        let else_branch = self.parse_commands()?;
        self.expect(Token::End, "\"END\"")?;
        Ok(Command::IfElse {
            cond,
            then_branch,
            else_branch,
        })
    }

    fn parse_while(&mut self) -> Result<Command, ParseError> {
        self.expect(Token::While, "\"WHILE\"")?;
        let cond = self.parse_condition()?;
        self.expect(Token::Do, "\"DO\"")?;
        let body = self.parse_commands()?;
        self.expect(Token::End, "\"END\"")?;
        Ok(Command::While { cond, body })
    }

    fn parse_read(&mut self) -> Result<Command, ParseError> {
        self.expect(Token::Read, "\"READ\"")?;
        let (target, line) = self.expect_identifier()?;
        self.expect(Token::Semicolon, "\";\"")?;
        Ok(Command::Read { target, line })
    }

    fn parse_write(&mut self) -> Result<Command, ParseError> {
        self.expect(Token::Write, "\"WRITE\"")?;
        let (target, line) = self.expect_identifier()?;
        self.expect(Token::Semicolon, "\";\"")?;
        Ok(Command::Write { target, line })
    }

    fn parse_assignment(&mut self) -> Result<Command, ParseError> {
        let (target, line) = self.expect_identifier()?;
        self.expect(Token::Assign, "\":=\"")?;
        let expr = self.parse_expr()?;
        self.expect(Token::Semicolon, "\";\"")?;
        Ok(Command::Assignment { target, line, expr })
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        match self.peek() {
            Some(Token::Number(_)) => Ok(Expr::Number(self.expect_number()?)),
            Some(Token::Identifier(_)) => {
                let (left, line) = self.expect_identifier()?;
                match self.peek().cloned() {
                    Some(op_tok) if binop_kind(&op_tok).is_some() => {
                        let op = binop_kind(&op_tok).unwrap();
                        self.bump();
                        let (right, _) = self.expect_identifier()?;
                        Ok(Expr::BinOp {
                            left,
                            op,
                            right,
                            line,
                        })
                    }
                    _ => Ok(Expr::Identifier(left, line)),
                }
            }
            _ => Err(self.error("an expression")),
        }
    }

    fn parse_condition(&mut self) -> Result<Condition, ParseError> {
        let (left, line) = self.expect_identifier()?;
        let relop_tok = self.peek().cloned();
        let relop = relop_tok
            .as_ref()
            .and_then(relop_kind)
            .ok_or_else(|| self.error("a relational operator"))?;
        self.bump();
        let (right, _) = self.expect_identifier()?;
        Ok(Condition {
            left,
            relop,
            right,
            line,
        })
    }
}

fn binop_kind(tok: &Token) -> Option<BinOpKind> {
    match tok {
        Token::Plus => Some(BinOpKind::Add),
        Token::Minus => Some(BinOpKind::Sub),
        Token::Times => Some(BinOpKind::Mul),
        Token::Divide => Some(BinOpKind::Div),
        Token::Modulo => Some(BinOpKind::Mod),
        _ => None,
    }
}

fn relop_kind(tok: &Token) -> Option<RelOp> {
    match tok {
        Token::Equal => Some(RelOp::Eq),
        Token::NotEqual => Some(RelOp::NotEq),
        Token::Less => Some(RelOp::Lt),
        Token::Greater => Some(RelOp::Gt),
        Token::LessEqual => Some(RelOp::Le),
        Token::GreaterEqual => Some(RelOp::Ge),
        _ => None,
    }
}

/// Parses a full program from a token stream produced by [`crate::lexer::tokenize`].
pub fn parse(tokens: &[SpannedToken]) -> Result<Program, ParseError> {
    Parser::new(tokens).parse_program()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_source(source: &str) -> Result<Program, ParseError> {
        parse(&tokenize(source).unwrap())
    }

    #[test]
    fn minimal_program() {
        let program = parse_source("CONST VAR x BEGIN READ x; WRITE x; END").unwrap();
        assert!(program.consts.is_empty());
        assert_eq!(program.vars.len(), 1);
        assert_eq!(program.commands.len(), 2);
    }

    #[test]
    fn const_section_is_optional() {
        let program = parse_source("VAR x BEGIN READ x; WRITE x; END").unwrap();
        assert!(program.consts.is_empty());
        assert_eq!(program.vars.len(), 1);
        assert_eq!(program.commands.len(), 2);
    }

    #[test]
    fn const_declarations_capture_name_and_value() {
        let program = parse_source("CONST zero := 0 five := 5 VAR x BEGIN WRITE x; END").unwrap();
        assert_eq!(program.consts[0].name, "zero");
        assert_eq!(program.consts[0].value, 0);
        assert_eq!(program.consts[1].name, "five");
        assert_eq!(program.consts[1].value, 5);
    }

    #[test]
    fn binop_expression() {
        let program =
            parse_source("CONST VAR x y z BEGIN z := x + y; WRITE z; END").unwrap();
        match &program.commands[0] {
            Command::Assignment { expr, .. } => assert_eq!(
                *expr,
                Expr::BinOp {
                    left: "x".to_owned(),
                    op: BinOpKind::Add,
                    right: "y".to_owned(),
                    line: 1,
                }
            ),
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn if_requires_else() {
        let err = parse_source("CONST VAR x BEGIN IF x == x THEN WRITE x; END END").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::UnexpectedToken { .. }));
    }

    #[test]
    fn while_loop_nests_commands() {
        let program =
            parse_source("CONST VAR i BEGIN WHILE i < i DO i := i + i; END END").unwrap();
        assert_eq!(program.commands.len(), 1);
        match &program.commands[0] {
            Command::While { body, .. } => assert_eq!(body.len(), 1),
            other => panic!("expected while, got {:?}", other),
        }
    }

    #[test]
    fn trailing_garbage_after_end_is_a_parse_error() {
        let err = parse_source("CONST VAR x BEGIN WRITE x; END garbage").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::UnexpectedToken { .. }));
    }

    #[test]
    fn end_of_input_mid_program_is_reported() {
        let err = parse_source("CONST VAR x BEGIN WRITE x;").unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::UnexpectedEndOfInput { .. }
        ));
    }
}
