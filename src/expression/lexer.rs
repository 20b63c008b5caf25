use crate::expression::error::{ParseError, ParseErrorKind};
use crate::expression::operator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Number,
    Identifier,
    Operator,
    LeftParen,
    RightParen,
    Comma,
    End,
}

/// A token borrowed from the source text. `offset` is a byte offset into the untrimmed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub offset: usize,
}

/// Pull lexer over a trimmed source string.
///
/// Tracks the kind of the previously consumed token so the parser can tell a prefix `-` from an
/// infix one. `previous() == None` means start of input.
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    end: usize,
    current: Option<Token<'a>>,
    previous: Option<TokenKind>,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        let start = src.len() - src.trim_start().len();
        let end = src.trim_end().len().max(start);
        Self {
            src,
            pos: start,
            end,
            current: None,
            previous: None,
        }
    }

    /// Token under the cursor. Before the first [`Lexer::advance`] this is `End`.
    pub fn current(&self) -> Token<'a> {
        self.current.unwrap_or(Token {
            kind: TokenKind::End,
            text: "",
            offset: self.pos,
        })
    }

    pub fn previous(&self) -> Option<TokenKind> {
        self.previous
    }

    pub fn advance(&mut self) -> Result<Token<'a>, ParseError> {
        self.previous = self.current.map(|t| t.kind);
        let token = self.read()?;
        self.current = Some(token);
        Ok(token)
    }

    fn read(&mut self) -> Result<Token<'a>, ParseError> {
        let start = self.pos;
        let rest = &self.src[start..self.end];
        let Some(c) = rest.chars().next() else {
            return Ok(Token {
                kind: TokenKind::End,
                text: "",
                offset: start,
            });
        };

        let (kind, len) = match c {
            '(' => (TokenKind::LeftParen, 1),
            ')' => (TokenKind::RightParen, 1),
            ',' => (TokenKind::Comma, 1),
            c if c.is_ascii_digit() || c == '.' => (TokenKind::Number, number_len(rest, start)?),
            _ => match operator::match_symbol(rest) {
                Some(symbol) => (TokenKind::Operator, symbol.len()),
                None => (TokenKind::Identifier, identifier_len(rest)),
            },
        };

        self.pos += len;
        let skipped = self.src[self.pos..self.end].len()
            - self.src[self.pos..self.end].trim_start().len();
        self.pos += skipped;

        Ok(Token {
            kind,
            text: &rest[..len],
            offset: start,
        })
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(t) if t.kind == TokenKind::End => None,
            other => Some(other),
        }
    }
}

fn number_len(rest: &str, offset: usize) -> Result<usize, ParseError> {
    let mut seen_point = false;
    let mut len = 0;
    for b in rest.bytes() {
        match b {
            b'0'..=b'9' => {}
            b'.' if !seen_point => seen_point = true,
            b'.' => {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidNumber,
                    offset,
                    Some(&rest[..=len]),
                ));
            }
            _ => break,
        }
        len += 1;
    }
    // Out-of-range literals would round to infinity, which has no source spelling.
    if !rest[..len].parse::<f32>().is_ok_and(f32::is_finite) {
        return Err(ParseError::new(
            ParseErrorKind::InvalidNumber,
            offset,
            Some(&rest[..len]),
        ));
    }
    Ok(len)
}

fn identifier_len(rest: &str) -> usize {
    rest.char_indices()
        .find(|&(i, c)| {
            i > 0
                && (c.is_whitespace()
                    || matches!(c, '(' | ')' | ',')
                    || operator::match_symbol(&rest[i..]).is_some())
        })
        .map_or(rest.len(), |(i, _)| i)
}

/// Tokenize the whole input, stopping at the first lexical error.
pub fn tokenize(src: &str) -> Result<Vec<Token<'_>>, ParseError> {
    Lexer::new(src).collect()
}

#[cfg(test)]
#[path = "../../tests/unit/expression/lexer.rs"]
mod tests;
