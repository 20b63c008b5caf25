use crate::compile::named::NamedValues;
use crate::compile::stack_depth;
use crate::compile::translate::{self, TranslateError, TranslationOptions, TranslationStats};
use crate::eval::builtins::BaseOps;
use crate::eval::bytecode::Instruction;
use crate::eval::error::EvalError;
use crate::eval::evaluator::disassemble;
use crate::eval::interpret::Operators;
use crate::expression::parser::parse;
use crate::foundation::error::FormulaResult;
use crate::foundation::fingerprint::{ProgramFingerprint, fingerprint_instructions};
use serde::Serialize;

/// Immutable, validated bytecode plus the sizes evaluation relies on.
///
/// Only built by [`compile`] or [`CompiledProgram::from_instructions`], both of which replay the
/// stream once, so `max_stack_size` is exact and loads are in range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledProgram {
    instructions: Box<[Instruction]>,
    expected_final_stack_size: usize,
    max_stack_size: usize,
    parameter_count: usize,
}

impl CompiledProgram {
    /// The program for empty input: no instructions, evaluates to zero.
    pub fn empty(parameter_count: usize) -> Self {
        Self {
            instructions: Box::default(),
            expected_final_stack_size: 0,
            max_stack_size: 0,
            parameter_count,
        }
    }

    /// Validate a hand-built stream against the built-in operators.
    pub fn from_instructions(
        instructions: Vec<Instruction>,
        expected_final_stack_size: usize,
        parameter_count: usize,
    ) -> Result<Self, EvalError> {
        Self::from_instructions_with(
            instructions,
            expected_final_stack_size,
            parameter_count,
            &BaseOps,
        )
    }

    pub fn from_instructions_with<O: Operators>(
        instructions: Vec<Instruction>,
        expected_final_stack_size: usize,
        parameter_count: usize,
        ops: &O,
    ) -> Result<Self, EvalError> {
        let depth = stack_depth::measure(&instructions, ops)?;
        if depth.final_depth != expected_final_stack_size {
            return Err(EvalError::FinalStack {
                expected: expected_final_stack_size,
                actual: depth.final_depth,
            });
        }
        if let Some(index) = instructions.iter().find_map(|i| match *i {
            Instruction::Param(p) if p == 0 || usize::from(p) > parameter_count => Some(p),
            _ => None,
        }) {
            return Err(EvalError::BadIndex {
                kind: "param",
                index,
            });
        }
        Ok(Self {
            instructions: instructions.into_boxed_slice(),
            expected_final_stack_size,
            max_stack_size: depth.max,
            parameter_count,
        })
    }

    /// Skips validation, for exercising the evaluator's own guards.
    #[cfg(test)]
    pub(crate) fn from_raw_parts(
        instructions: Vec<Instruction>,
        expected_final_stack_size: usize,
        max_stack_size: usize,
        parameter_count: usize,
    ) -> Self {
        Self {
            instructions: instructions.into_boxed_slice(),
            expected_final_stack_size,
            max_stack_size,
            parameter_count,
        }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Stack depth after a successful run: resident slots plus the result.
    pub fn expected_final_stack_size(&self) -> usize {
        self.expected_final_stack_size
    }

    pub fn max_stack_size(&self) -> usize {
        self.max_stack_size
    }

    pub fn parameter_count(&self) -> usize {
        self.parameter_count
    }

    /// Content hash of the bytecode and its sizes.
    pub fn fingerprint(&self) -> ProgramFingerprint {
        fingerprint_instructions(
            &self.instructions,
            self.expected_final_stack_size,
            self.parameter_count,
        )
    }

    /// Listing with operator names resolved through `ops`.
    pub fn listing<O: Operators>(&self, ops: &O) -> String {
        disassemble(&self.instructions, ops)
    }
}

impl std::fmt::Display for CompiledProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "; params={} max_stack={} final_stack={}",
            self.parameter_count, self.max_stack_size, self.expected_final_stack_size
        )?;
        f.write_str(&self.listing(&BaseOps))
    }
}

/// Compile `text` with the built-in operators.
///
/// `params` name the evaluation inputs in order; `named_values` gains an entry for every
/// unknown name the formula (or its sub-formulas) references.
pub fn compile<P: AsRef<str>>(
    text: &str,
    params: &[P],
    named_values: &mut NamedValues,
    options: TranslationOptions,
) -> FormulaResult<CompiledProgram> {
    compile_with(text, params, named_values, options, &BaseOps).map(|(program, _)| program)
}

/// [`compile`] against a custom operator chain, also returning what translation touched.
#[tracing::instrument(level = "debug", skip_all, fields(len = text.len(), params = params.len()))]
pub fn compile_with<P: AsRef<str>, O: Operators>(
    text: &str,
    params: &[P],
    named_values: &mut NamedValues,
    options: TranslationOptions,
    ops: &O,
) -> FormulaResult<(CompiledProgram, TranslationStats)> {
    let ast = parse(text)?;
    let translation = translate::translate(ast.as_ref(), params, named_values, options, ops)?;
    let program = CompiledProgram::from_instructions_with(
        translation.instructions,
        translation.expected_final_stack_size,
        params.len(),
        ops,
    )
    .map_err(TranslateError::Internal)?;
    tracing::debug!(
        instructions = program.len(),
        max_stack = program.max_stack_size(),
        slots = translation.stats.slots.len(),
        "compiled formula"
    );
    Ok((program, translation.stats))
}

#[cfg(test)]
#[path = "../../tests/unit/compile/program.rs"]
mod tests;
