use crate::expression::ast::Node;
use crate::expression::error::{ParseError, ParseErrorKind};
use crate::expression::lexer::{Lexer, Token, TokenKind};
use crate::expression::operator::{self, Associativity, GROUP, Operator, OperatorKind};

/// Parse `src` into an expression tree.
///
/// Empty or whitespace-only input is not an error and yields `Ok(None)`.
pub fn parse(src: &str) -> Result<Option<Node>, ParseError> {
    match parse_recovering(src) {
        (_, Some(err)) => Err(err),
        (node, None) => Ok(node),
    }
}

/// Parse `src`, returning the best-effort partial tree alongside any error.
///
/// Completed function arguments survive a failure in a later argument, so editors can keep
/// highlighting what did parse.
pub fn parse_recovering(src: &str) -> (Option<Node>, Option<ParseError>) {
    let mut parser = Parser {
        lexer: Lexer::new(src),
    };
    match parser.run() {
        Ok(node) => (node, None),
        Err(failure) => (failure.partial, Some(failure.error)),
    }
}

#[derive(Debug)]
struct Failure {
    error: ParseError,
    partial: Option<Node>,
}

impl From<ParseError> for Failure {
    fn from(error: ParseError) -> Self {
        Self {
            error,
            partial: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    op: &'static Operator,
    offset: usize,
    // Operand count when a group opened; used to reject `()`.
    operands_below: usize,
}

/// Operand and operator stacks for one argument or top-level expression.
#[derive(Default)]
struct Level {
    operands: Vec<Node>,
    operators: Vec<Pending>,
}

impl Level {
    fn reduce(&mut self, pending: Pending) -> Result<(), ParseError> {
        let missing = || {
            ParseError::new(
                ParseErrorKind::MissingOperand,
                pending.offset,
                Some(pending.op.symbol),
            )
        };
        let node = match pending.op.kind {
            OperatorKind::Unary(op) => {
                let operand = self.operands.pop().ok_or_else(missing)?;
                Node::Unary {
                    op,
                    operand: Box::new(operand),
                }
            }
            OperatorKind::Binary(op) => {
                if self.operands.len() < 2 {
                    return Err(missing());
                }
                let (Some(right), Some(left)) = (self.operands.pop(), self.operands.pop()) else {
                    return Err(missing());
                };
                Node::binary(op, left, right)
            }
            OperatorKind::Group => {
                return Err(ParseError::new(
                    ParseErrorKind::ClosingParenMissing,
                    pending.offset,
                    None,
                ));
            }
        };
        self.operands.push(node);
        Ok(())
    }

    fn has_open_group(&self) -> bool {
        self.operators
            .iter()
            .any(|p| p.op.kind == OperatorKind::Group)
    }

    /// Reduce back to the innermost open group and drop it. `Ok(false)` when no group is open.
    fn close_group(&mut self, close: Token<'_>) -> Result<bool, ParseError> {
        if !self.has_open_group() {
            return Ok(false);
        }
        while let Some(pending) = self.operators.pop() {
            if pending.op.kind == OperatorKind::Group {
                if self.operands.len() == pending.operands_below {
                    return Err(ParseError::new(
                        ParseErrorKind::MissingOperand,
                        close.offset,
                        Some("()"),
                    ));
                }
                return Ok(true);
            }
            self.reduce(pending)?;
        }
        Ok(false)
    }

    fn push_operator(&mut self, op: &'static Operator, offset: usize) -> Result<(), ParseError> {
        while let Some(&top) = self.operators.last() {
            let binds_tighter = top.op.precedence > op.precedence
                || (top.op.precedence == op.precedence && op.associativity == Associativity::Left);
            if top.op.kind == OperatorKind::Group || !binds_tighter {
                break;
            }
            self.operators.pop();
            self.reduce(top)?;
        }
        self.operators.push(Pending {
            op,
            offset,
            operands_below: self.operands.len(),
        });
        Ok(())
    }

    fn finish(mut self) -> Result<Option<Node>, Failure> {
        while let Some(pending) = self.operators.pop() {
            if let Err(error) = self.reduce(pending) {
                return Err(self.fail(error));
            }
        }
        debug_assert!(self.operands.len() <= 1);
        Ok(self.operands.pop())
    }

    fn fail(mut self, error: ParseError) -> Failure {
        Failure {
            error,
            partial: self.operands.pop(),
        }
    }
}

struct Parser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    fn run(&mut self) -> Result<Option<Node>, Failure> {
        let first = self.lexer.advance()?;
        if first.kind == TokenKind::End {
            return Ok(None);
        }
        match self.expression(false)? {
            Some(node) => Ok(Some(node)),
            None => Err(ParseError::new(
                ParseErrorKind::EndOfExpression,
                self.lexer.current().offset,
                None,
            )
            .into()),
        }
    }

    /// Parse until end of input, or (when `nested`) until a `,` or unmatched `)` which is left
    /// unconsumed for the caller.
    fn expression(&mut self, nested: bool) -> Result<Option<Node>, Failure> {
        let mut level = Level::default();
        match self.scan(&mut level, nested) {
            Ok(()) => level.finish(),
            Err(mut failure) => {
                if failure.partial.is_none() {
                    failure.partial = level.operands.pop();
                }
                Err(failure)
            }
        }
    }

    fn scan(&mut self, level: &mut Level, nested: bool) -> Result<(), Failure> {
        loop {
            let token = self.lexer.current();
            match token.kind {
                TokenKind::End => {
                    if nested {
                        return Err(ParseError::new(
                            ParseErrorKind::ClosingParenMissing,
                            token.offset,
                            None,
                        )
                        .into());
                    }
                    if self.lexer.previous() == Some(TokenKind::Operator) {
                        return Err(ParseError::new(
                            ParseErrorKind::EndOfExpression,
                            token.offset,
                            None,
                        )
                        .into());
                    }
                    return Ok(());
                }
                TokenKind::Number => {
                    self.expect_operand_position(token)?;
                    let value = token.text.parse::<f32>().map_err(|_| {
                        ParseError::new(ParseErrorKind::InvalidNumber, token.offset, Some(token.text))
                    })?;
                    level.operands.push(Node::Value(value));
                    self.lexer.advance()?;
                }
                TokenKind::Identifier => {
                    self.expect_operand_position(token)?;
                    let next = self.lexer.advance()?;
                    if next.kind == TokenKind::LeftParen {
                        self.lexer.advance()?;
                        let call = self.call(token.text)?;
                        level.operands.push(call);
                    } else {
                        level.operands.push(Node::variable(token.text));
                    }
                }
                TokenKind::LeftParen => {
                    self.expect_operand_position(token)?;
                    level.operators.push(Pending {
                        op: &GROUP,
                        offset: token.offset,
                        operands_below: level.operands.len(),
                    });
                    self.lexer.advance()?;
                }
                TokenKind::RightParen => {
                    if level.close_group(token)? {
                        self.lexer.advance()?;
                    } else if nested {
                        return Ok(());
                    } else {
                        return Err(ParseError::new(
                            ParseErrorKind::MismatchedParens,
                            token.offset,
                            None,
                        )
                        .into());
                    }
                }
                TokenKind::Comma => {
                    if nested && !level.has_open_group() {
                        return Ok(());
                    }
                    return Err(ParseError::new(
                        ParseErrorKind::TuplesNotSupported,
                        token.offset,
                        None,
                    )
                    .into());
                }
                TokenKind::Operator => {
                    let unary = matches!(
                        self.lexer.previous(),
                        None | Some(TokenKind::Operator | TokenKind::LeftParen | TokenKind::Comma)
                    );
                    let op = operator::find(token.text, unary).ok_or_else(|| {
                        let kind = if unary {
                            ParseErrorKind::UnknownUnaryOperator
                        } else {
                            ParseErrorKind::UnknownBinaryOperator
                        };
                        ParseError::new(kind, token.offset, Some(token.text))
                    })?;
                    level.push_operator(op, token.offset)?;
                    self.lexer.advance()?;
                }
            }
        }
    }

    /// Two operands in a row (`1 2`, `a (b)`) means a binary operator is missing.
    fn expect_operand_position(&self, token: Token<'_>) -> Result<(), ParseError> {
        match self.lexer.previous() {
            Some(TokenKind::Number | TokenKind::Identifier | TokenKind::RightParen) => {
                Err(ParseError::new(
                    ParseErrorKind::UnknownBinaryOperator,
                    token.offset,
                    Some(token.text),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Argument list after `name(`; consumes the closing `)`.
    fn call(&mut self, name: &str) -> Result<Node, Failure> {
        let mut args = Vec::new();
        if self.lexer.current().kind == TokenKind::RightParen {
            self.lexer.advance()?;
            return Ok(Node::call(name, args));
        }
        loop {
            match self.expression(true) {
                Ok(Some(arg)) => args.push(arg),
                Ok(None) => {
                    let at = self.lexer.current();
                    return Err(Failure {
                        error: ParseError::new(
                            ParseErrorKind::MissingOperand,
                            at.offset,
                            Some(at.text),
                        ),
                        partial: Some(Node::call(name, args)),
                    });
                }
                Err(failure) => {
                    args.extend(failure.partial);
                    return Err(Failure {
                        error: failure.error,
                        partial: Some(Node::call(name, args)),
                    });
                }
            }
            let separator = self.lexer.current();
            self.lexer.advance()?;
            if separator.kind == TokenKind::RightParen {
                return Ok(Node::call(name, args));
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/parser.rs"]
mod tests;
