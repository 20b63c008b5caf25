//! vecexpr compiles small arithmetic formulas over 3-lane vectors to a compact stack bytecode
//! and evaluates them without per-call allocation.
//!
//! The pipeline is text → [`Node`] tree ([`parse`]) → bytecode ([`compile`]) →
//! [`evaluate`]. Along the way:
//!
//! - Names resolve to positional parameters, built-in constants, or a [`NamedValues`] registry
//!   whose sub-formulas are computed once and shared through stack slots.
//! - Constant subexpressions can be folded at compile time ([`TranslationOptions`]).
//! - The operator set is a chain of tables ([`Layered`]), so hosts add functions without
//!   touching the built-ins.
#![forbid(unsafe_code)]
// Some helpers are only reached from tests or behind the `alloc-track` feature.
#![allow(dead_code)]

mod foundation;
mod formula;

/// Bytecode generation: translation, folding, stack sizing.
pub mod compile;
/// Bytecode, operator tables and the evaluator.
pub mod eval;
/// Lexing, parsing and formatting of formula text.
pub mod expression;

pub use crate::foundation::error::{FormulaError, FormulaResult};
pub use crate::foundation::fingerprint::ProgramFingerprint;

pub use crate::compile::named::{NamedValue, NamedValueKind, NamedValues};
pub use crate::compile::program::{CompiledProgram, compile, compile_with};
pub use crate::compile::translate::{TranslateError, TranslationOptions, TranslationStats};
pub use crate::eval::builtins::{BaseOp, BaseOps, CONSTANTS, FUNCTIONS, FunctionInfo};
pub use crate::eval::bytecode::{Instruction, OpCode};
pub use crate::eval::error::EvalError;
pub use crate::eval::evaluator::{
    BatchEvaluator, BatchOptions, Evaluator, evaluate, evaluate_batch, evaluate_batch_par,
    evaluate_batch_with, evaluate_single, evaluate_with,
};
pub use crate::eval::interpret::{Context, Layered, Lookup, Operators};
pub use crate::expression::ast::{BinaryOp, Node, UnaryOp};
pub use crate::expression::error::{ParseError, ParseErrorKind};
pub use crate::expression::format::{Coloring, FormatOptions, Palette, format};
pub use crate::expression::parser::{parse, parse_recovering};
pub use crate::formula::{EditOutcome, Formula, LiveFormula};

pub use glam::Vec3;
