/// What went wrong while lexing or parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// A `(` was never closed.
    ClosingParenMissing,
    /// A `,` appeared outside of a function argument list.
    TuplesNotSupported,
    /// A `)` had no matching `(`.
    MismatchedParens,
    /// An operator (or an argument slot) had nothing to apply to.
    MissingOperand,
    /// The token cannot be used as a prefix operator.
    UnknownUnaryOperator,
    /// The token cannot be used as an infix operator.
    UnknownBinaryOperator,
    /// Input ended where an operand was expected.
    EndOfExpression,
    /// A numeric literal with more than one decimal point, or otherwise unparsable.
    InvalidNumber,
}

/// A syntax error with its byte offset into the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub offset: usize,
    /// Offending operator or token text, when there is one.
    pub token: Option<String>,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, offset: usize, token: Option<&str>) -> Self {
        Self {
            kind,
            offset,
            token: token.map(str::to_owned),
        }
    }

    fn token_text(&self) -> &str {
        self.token.as_deref().unwrap_or("")
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "At {}: ", self.offset)?;
        match self.kind {
            ParseErrorKind::ClosingParenMissing => f.write_str("Closing paren missing"),
            ParseErrorKind::TuplesNotSupported => f.write_str("Tuples not supported"),
            ParseErrorKind::MismatchedParens => f.write_str("Mismatched parens"),
            ParseErrorKind::MissingOperand => write!(
                f,
                "Missing operand for the {} operator in the expression",
                self.token_text()
            ),
            ParseErrorKind::UnknownUnaryOperator => {
                write!(f, "Cannot match unary operator '{}'", self.token_text())
            }
            ParseErrorKind::UnknownBinaryOperator => {
                write!(f, "Cannot match binary operator '{}'", self.token_text())
            }
            ParseErrorKind::EndOfExpression => f.write_str("No characters left to parse"),
            ParseErrorKind::InvalidNumber => write!(f, "Invalid number '{}'", self.token_text()),
        }
    }
}

impl std::error::Error for ParseError {}
