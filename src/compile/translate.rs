//! Lowering an expression tree to postfix bytecode.
//!
//! Operands are emitted right to left so the first pop in an operator yields its first
//! argument. Names resolve in this order: parameter, built-in constant, named value (created with
//! an inferred kind on first reference). A sub-formula that folds to one constant is inlined;
//! anything else gets a stack slot computed once at the start of the program and read back with
//! `Load`.

use crate::compile::fold::fold_constants;
use crate::compile::named::{NamedValueKind, NamedValues};
use crate::eval::builtins;
use crate::eval::bytecode::{Instruction, OpCode};
use crate::eval::error::EvalError;
use crate::eval::interpret::{Lookup, Operators};
use crate::expression::ast::{BinaryOp, Node, UnaryOp};
use crate::expression::error::ParseError;
use crate::expression::parser::parse;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Highest slot or parameter index an instruction can carry.
pub const MAX_INDEX: usize = u16::MAX as usize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranslationOptions {
    /// Evaluate constant subexpressions at compile time.
    pub fold_constants: bool,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TranslateError {
    #[error("unknown function '{name}'")]
    UnknownFunction { name: String },
    #[error("function '{name}' takes {} argument(s), got {got}", join_arities(.expected))]
    WrongArgumentCount {
        name: String,
        expected: Vec<usize>,
        got: usize,
    },
    #[error("'{name}' is defined in terms of itself")]
    RecursiveDefinition { name: String },
    #[error("in sub-formula '{name}': {source}")]
    SubFormula { name: String, source: ParseError },
    #[error("more than {max} sub-formula slots")]
    TooManySlots { max: usize },
    #[error("more than {max} parameters")]
    TooManyParameters { max: usize },
    #[error("internal: {0}")]
    Internal(#[from] EvalError),
}

fn join_arities(arities: &[usize]) -> String {
    arities
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" or ")
}

/// What a translation touched, for diagnostics and pruning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationStats {
    /// Sub-formula names by slot; slot `i` is `slots[i - 1]`.
    pub slots: Vec<String>,
    /// Sub-formulas that collapsed to a single constant.
    pub inlined: Vec<String>,
    /// Every named value referenced, directly or through sub-formulas.
    pub referenced: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy)]
enum Resolution {
    InProgress,
    Resolved(Instruction),
}

struct Translator<'a, P, O> {
    params: &'a [P],
    named: &'a mut NamedValues,
    options: TranslationOptions,
    ops: &'a O,
    resolved: HashMap<String, Resolution>,
    slot_blocks: Vec<Vec<Instruction>>,
    stats: TranslationStats,
}

/// Output of [`translate`]: the full stream (slot blocks first, then the main expression).
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub instructions: Vec<Instruction>,
    pub expected_final_stack_size: usize,
    pub stats: TranslationStats,
}

/// Translate `root` against `params` and the `named` registry.
///
/// `named` gains an entry for every unknown name referenced; nothing else in it changes.
pub fn translate<P: AsRef<str>, O: Operators>(
    root: Option<&Node>,
    params: &[P],
    named: &mut NamedValues,
    options: TranslationOptions,
    ops: &O,
) -> Result<Translation, TranslateError> {
    if params.len() > MAX_INDEX {
        return Err(TranslateError::TooManyParameters { max: MAX_INDEX });
    }
    let Some(root) = root else {
        return Ok(Translation {
            instructions: Vec::new(),
            expected_final_stack_size: 0,
            stats: TranslationStats::default(),
        });
    };

    let mut t = Translator {
        params,
        named,
        options,
        ops,
        resolved: HashMap::new(),
        slot_blocks: Vec::new(),
        stats: TranslationStats::default(),
    };
    let mut main = Vec::new();
    t.emit(root, &mut main)?;

    let expected_final_stack_size = t.slot_blocks.len() + 1;
    let mut instructions: Vec<Instruction> = t.slot_blocks.into_iter().flatten().collect();
    instructions.extend(main);
    if options.fold_constants {
        let before = instructions.len();
        instructions = fold_constants(&instructions, ops)?;
        if instructions.len() < before {
            tracing::debug!(before, after = instructions.len(), "folded constants");
        }
    }

    Ok(Translation {
        instructions,
        expected_final_stack_size,
        stats: t.stats,
    })
}

fn unary_name(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Neg => "minus",
    }
}

fn binary_name(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "add",
        BinaryOp::Sub => "sub",
        BinaryOp::Mul => "mul",
        BinaryOp::Div => "div",
        BinaryOp::Mod => "mod",
        BinaryOp::Gt => "gt",
        BinaryOp::Ge => "gte",
        BinaryOp::Lt => "lt",
        BinaryOp::Le => "lte",
    }
}

impl<P: AsRef<str>, O: Operators> Translator<'_, P, O> {
    fn emit(&mut self, node: &Node, out: &mut Vec<Instruction>) -> Result<(), TranslateError> {
        match node {
            Node::Value(x) => out.push(Instruction::splat(*x)),
            Node::Variable(name) => {
                let instruction = self.variable(name)?;
                out.push(instruction);
            }
            Node::Unary { op, operand } => {
                self.emit(operand, out)?;
                out.push(Instruction::Op(self.function(unary_name(*op), 1)?));
            }
            Node::Binary { op, left, right } => {
                self.emit(right, out)?;
                self.emit(left, out)?;
                out.push(Instruction::Op(self.function(binary_name(*op), 2)?));
            }
            Node::Call { name, args } => {
                for arg in args.iter().rev() {
                    self.emit(arg, out)?;
                }
                out.push(Instruction::Op(self.function(name, args.len())?));
            }
        }
        Ok(())
    }

    fn function(&self, name: &str, argc: usize) -> Result<OpCode, TranslateError> {
        match self.ops.lookup(name, argc) {
            Lookup::Found(op) => Ok(op),
            Lookup::WrongArity(expected) => Err(TranslateError::WrongArgumentCount {
                name: name.to_owned(),
                expected: expected.into_vec(),
                got: argc,
            }),
            Lookup::Unknown => Err(TranslateError::UnknownFunction {
                name: name.to_owned(),
            }),
        }
    }

    fn variable(&mut self, name: &str) -> Result<Instruction, TranslateError> {
        if let Some(i) = self.params.iter().position(|p| p.as_ref() == name) {
            // 1-based; `translate` already bounded the parameter count.
            return Ok(Instruction::Param(i as u16 + 1));
        }
        if let Some(c) = builtins::constant(name) {
            return Ok(Instruction::splat(c));
        }

        self.stats.referenced.insert(name.to_owned());
        match &self.named.get_or_insert_inferred(name).kind {
            NamedValueKind::Vector3(v) => Ok(Instruction::Const(*v)),
            NamedValueKind::Float(x) => Ok(Instruction::splat(*x)),
            NamedValueKind::SubFormula(text) => {
                let text = text.clone();
                self.sub_formula(name, &text)
            }
        }
    }

    fn sub_formula(&mut self, name: &str, text: &str) -> Result<Instruction, TranslateError> {
        match self.resolved.get(name) {
            Some(Resolution::InProgress) => {
                return Err(TranslateError::RecursiveDefinition {
                    name: name.to_owned(),
                });
            }
            Some(Resolution::Resolved(instruction)) => return Ok(*instruction),
            None => {}
        }
        self.resolved.insert(name.to_owned(), Resolution::InProgress);

        let ast = parse(text).map_err(|source| TranslateError::SubFormula {
            name: name.to_owned(),
            source,
        })?;
        let mut block = Vec::new();
        if let Some(ast) = &ast {
            self.emit(ast, &mut block)?;
        }
        if self.options.fold_constants {
            block = fold_constants(&block, self.ops)?;
        }

        let instruction = match block.as_slice() {
            [] => Instruction::Const(Vec3::ZERO),
            [single @ Instruction::Const(_)] => *single,
            _ => {
                // Dependencies finished first, so they already hold lower slots.
                let slot = self.slot_blocks.len() + 1;
                if slot > MAX_INDEX {
                    return Err(TranslateError::TooManySlots { max: MAX_INDEX });
                }
                self.slot_blocks.push(block);
                self.stats.slots.push(name.to_owned());
                Instruction::Load(slot as u16)
            }
        };
        if let Instruction::Const(_) = instruction {
            self.stats.inlined.push(name.to_owned());
        }
        tracing::debug!(name, %instruction, "resolved sub-formula");
        self.resolved
            .insert(name.to_owned(), Resolution::Resolved(instruction));
        Ok(instruction)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/translate.rs"]
mod tests;
