use crate::compile::translate::TranslateError;
use crate::eval::EvalError;
use crate::expression::error::ParseError;

/// Result alias used by the high-level entry points.
pub type FormulaResult<T> = Result<T, FormulaError>;

/// Crate-level error: any stage of turning text into a value.
#[derive(thiserror::Error, Debug)]
pub enum FormulaError {
    /// Lexical or syntax error, with source offset.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Name resolution, arity or sub-formula error.
    #[error("translation error: {0}")]
    Translate(#[from] TranslateError),

    /// Evaluation failed (bad parameter count or a broken program).
    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),

    /// Invalid caller-supplied configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Serialization of formula documents.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Anything else.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FormulaError {
    /// Build a [`FormulaError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FormulaError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Byte offset into the compiled input text, for parse failures of that text.
    ///
    /// Sub-formula parse failures carry their own offset on the wrapped [`ParseError`].
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Parse(e) => Some(e.offset),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FormulaError {
    fn from(e: serde_json::Error) -> Self {
        Self::serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
