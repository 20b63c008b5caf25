//! Host objects: a serializable [`Formula`] document and a [`LiveFormula`] that recompiles on
//! demand while evaluations keep using the last good program.

use crate::compile::named::NamedValues;
use crate::compile::program::{CompiledProgram, compile_with};
use crate::compile::translate::{TranslationOptions, TranslationStats};
use crate::eval::builtins::BaseOps;
use crate::eval::error::EvalError;
use crate::eval::evaluator::evaluate_with;
use crate::eval::interpret::Operators;
use crate::foundation::error::{FormulaError, FormulaResult};
use crate::foundation::fingerprint::ProgramFingerprint;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Formula text plus everything needed to compile it.
///
/// JSON form: `{"input": "...", "params": ["a"], "named_values": [...], "options": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Formula {
    pub input: String,
    pub params: Vec<String>,
    pub named_values: NamedValues,
    pub options: TranslationOptions,
}

impl Formula {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }

    pub fn from_json(text: &str) -> FormulaResult<Self> {
        let formula: Self = serde_json::from_str(text)?;
        formula.validate()?;
        Ok(formula)
    }

    pub fn to_json_pretty(&self) -> FormulaResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> FormulaResult<()> {
        let mut seen = BTreeSet::new();
        for name in &self.params {
            if name.is_empty() {
                return Err(FormulaError::validation("parameter names must be non-empty"));
            }
            if !seen.insert(name.as_str()) {
                return Err(FormulaError::validation(format!(
                    "duplicate parameter name '{name}'"
                )));
            }
        }
        Ok(())
    }

    /// Replace the positional parameter names.
    pub fn set_parameters<S: Into<String>>(
        &mut self,
        params: impl IntoIterator<Item = S>,
    ) -> FormulaResult<()> {
        let previous = std::mem::replace(
            &mut self.params,
            params.into_iter().map(Into::into).collect(),
        );
        if let Err(e) = self.validate() {
            self.params = previous;
            return Err(e);
        }
        Ok(())
    }

    pub fn compile(&mut self) -> FormulaResult<CompiledProgram> {
        self.compile_with(&BaseOps).map(|(program, _)| program)
    }

    pub fn compile_with<O: Operators>(
        &mut self,
        ops: &O,
    ) -> FormulaResult<(CompiledProgram, TranslationStats)> {
        compile_with(
            &self.input,
            self.params.as_slice(),
            &mut self.named_values,
            self.options,
            ops,
        )
    }

    /// Drop named values the formula no longer reaches, directly or through sub-formulas.
    ///
    /// Compiles first; on failure nothing is removed. Returns the removed names.
    pub fn prune_unused_named_values(&mut self) -> FormulaResult<Vec<String>> {
        let (_, stats) = self.compile_with(&BaseOps)?;
        let mut removed = Vec::new();
        self.named_values.retain(|v| {
            let keep = stats.referenced.contains(&v.name);
            if !keep {
                removed.push(v.name.clone());
            }
            keep
        });
        if !removed.is_empty() {
            tracing::debug!(?removed, "pruned unused named values");
        }
        Ok(removed)
    }
}

/// Result of [`LiveFormula::live_edit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// Nothing was edited since the last call.
    Clean,
    /// A new program is active; `changed` is false when it hashes the same as the old one.
    Recompiled { changed: bool },
    /// Compilation failed; the previous program stays active.
    Failed,
}

/// A formula being edited while other code evaluates it.
///
/// Readers take an `Arc` snapshot with [`LiveFormula::program`]; a replaced program is freed
/// once the last snapshot is dropped.
pub struct LiveFormula<O = BaseOps> {
    formula: Formula,
    ops: O,
    program: Arc<CompiledProgram>,
    fingerprint: ProgramFingerprint,
    dirty: bool,
    last_error: Option<FormulaError>,
}

impl LiveFormula<BaseOps> {
    pub fn new(formula: Formula) -> Self {
        Self::with_ops(formula, BaseOps)
    }
}

impl<O: Operators> LiveFormula<O> {
    /// Starts dirty with an empty program; call [`LiveFormula::live_edit`] to compile.
    pub fn with_ops(formula: Formula, ops: O) -> Self {
        let program = CompiledProgram::empty(formula.params.len());
        Self {
            fingerprint: program.fingerprint(),
            program: Arc::new(program),
            formula,
            ops,
            dirty: true,
            last_error: None,
        }
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    /// Mutable access; marks the formula dirty.
    pub fn edit(&mut self) -> &mut Formula {
        self.dirty = true;
        &mut self.formula
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.edit().input = input.into();
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn program(&self) -> Arc<CompiledProgram> {
        Arc::clone(&self.program)
    }

    /// Error from the most recent failed [`LiveFormula::live_edit`], cleared by a success.
    pub fn last_error(&self) -> Option<&FormulaError> {
        self.last_error.as_ref()
    }

    /// Recompile if dirty and publish the result.
    #[tracing::instrument(level = "debug", skip(self), fields(len = self.formula.input.len()))]
    pub fn live_edit(&mut self) -> EditOutcome {
        if !self.dirty {
            return EditOutcome::Clean;
        }
        self.dirty = false;

        match self.formula.compile_with(&self.ops) {
            Ok((program, _)) => {
                let fingerprint = program.fingerprint();
                let changed = fingerprint != self.fingerprint;
                if changed {
                    self.program = Arc::new(program);
                    self.fingerprint = fingerprint;
                }
                self.last_error = None;
                EditOutcome::Recompiled { changed }
            }
            Err(error) => {
                tracing::warn!(%error, "live edit failed; keeping previous program");
                self.last_error = Some(error);
                EditOutcome::Failed
            }
        }
    }

    /// Evaluate the active program.
    pub fn evaluate(&self, params: &[Vec3]) -> Result<Vec3, EvalError> {
        evaluate_with(&self.program, params, &self.ops)
    }
}

#[cfg(test)]
#[path = "../tests/unit/formula.rs"]
mod tests;
