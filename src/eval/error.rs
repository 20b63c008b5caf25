use crate::eval::bytecode::OpCode;

/// Evaluation failure.
///
/// Apart from [`EvalError::ParameterCount`] these mean the program itself is inconsistent, which
/// the compiler never produces.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("expected {expected} parameter vector(s), got {actual}")]
    ParameterCount { expected: usize, actual: usize },

    #[error("stack underflow")]
    StackUnderflow,

    #[error("stack overflow (capacity {capacity})")]
    StackOverflow { capacity: usize },

    #[error("{kind} index {index} out of range")]
    BadIndex { kind: &'static str, index: u16 },

    #[error("program left {actual} value(s) on the stack, expected {expected}")]
    FinalStack { expected: usize, actual: usize },

    #[error("unknown opcode {0}")]
    UnknownOpcode(OpCode),
}
