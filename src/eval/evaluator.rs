use crate::compile::program::CompiledProgram;
use crate::eval::builtins::BaseOps;
use crate::eval::bytecode::Instruction;
use crate::eval::error::EvalError;
use crate::eval::interpret::{Context, Operators, interpret};
use crate::foundation::error::{FormulaError, FormulaResult};
use glam::Vec3;
use rayon::prelude::*;
use smallvec::SmallVec;

/// Stack depth served without touching the heap.
pub const INLINE_STACK: usize = 16;

type Scratch = SmallVec<[Vec3; INLINE_STACK]>;

/// Real evaluation context: a bounded stack plus the caller's parameters.
struct Machine<'s, 'p> {
    stack: &'s mut Scratch,
    capacity: usize,
    params: &'p [Vec3],
}

impl Context for Machine<'_, '_> {
    #[inline]
    fn push(&mut self, value: Vec3) -> Result<(), EvalError> {
        if self.stack.len() >= self.capacity {
            return Err(EvalError::StackOverflow {
                capacity: self.capacity,
            });
        }
        self.stack.push(value);
        Ok(())
    }

    #[inline]
    fn pop(&mut self) -> Result<Vec3, EvalError> {
        self.stack.pop().ok_or(EvalError::StackUnderflow)
    }

    fn param(&mut self, index: u16) -> Result<(), EvalError> {
        let v = usize::from(index)
            .checked_sub(1)
            .and_then(|i| self.params.get(i))
            .copied()
            .ok_or(EvalError::BadIndex {
                kind: "param",
                index,
            })?;
        self.push(v)
    }

    fn load(&mut self, index: u16) -> Result<(), EvalError> {
        let v = usize::from(index)
            .checked_sub(1)
            .and_then(|i| self.stack.get(i))
            .copied()
            .ok_or(EvalError::BadIndex {
                kind: "load",
                index,
            })?;
        self.push(v)
    }
}

fn run<O: Operators>(
    program: &CompiledProgram,
    params: &[Vec3],
    ops: &O,
    scratch: &mut Scratch,
) -> Result<Vec3, EvalError> {
    if params.len() != program.parameter_count() {
        return Err(EvalError::ParameterCount {
            expected: program.parameter_count(),
            actual: params.len(),
        });
    }
    if program.is_empty() {
        return Ok(Vec3::ZERO);
    }

    scratch.clear();
    scratch.reserve(program.max_stack_size());
    let mut machine = Machine {
        stack: scratch,
        capacity: program.max_stack_size(),
        params,
    };
    interpret(program.instructions(), ops, &mut machine)?;

    let expected = program.expected_final_stack_size();
    let actual = machine.stack.len();
    if actual != expected {
        tracing::error!(
            actual,
            expected,
            "stack discipline violated; refusing to return a value"
        );
        debug_assert_eq!(actual, expected, "stack discipline violated");
        return Err(EvalError::FinalStack { expected, actual });
    }
    machine.stack.last().copied().ok_or(EvalError::StackUnderflow)
}

/// Evaluate with the built-in operators. `params` must hold exactly
/// [`CompiledProgram::parameter_count`] vectors.
pub fn evaluate(program: &CompiledProgram, params: &[Vec3]) -> Result<Vec3, EvalError> {
    evaluate_with(program, params, &BaseOps)
}

/// Convenience form for single-parameter programs.
pub fn evaluate_single(program: &CompiledProgram, param: Vec3) -> Result<Vec3, EvalError> {
    evaluate(program, std::slice::from_ref(&param))
}

/// Evaluate with a custom operator chain (must be the chain the program was compiled against).
pub fn evaluate_with<O: Operators>(
    program: &CompiledProgram,
    params: &[Vec3],
    ops: &O,
) -> Result<Vec3, EvalError> {
    let mut scratch = Scratch::new();
    run(program, params, ops, &mut scratch)
}

/// Reusable evaluation state for hot loops: keeps its stack buffer between calls.
pub struct Evaluator<O = BaseOps> {
    ops: O,
    scratch: Scratch,
}

impl Default for Evaluator<BaseOps> {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator<BaseOps> {
    pub fn new() -> Self {
        Self::with_ops(BaseOps)
    }
}

impl<O: Operators> Evaluator<O> {
    pub fn with_ops(ops: O) -> Self {
        Self {
            ops,
            scratch: Scratch::new(),
        }
    }

    pub fn eval(&mut self, program: &CompiledProgram, params: &[Vec3]) -> Result<Vec3, EvalError> {
        run(program, params, &self.ops, &mut self.scratch)
    }
}

fn check_batch(
    program: &CompiledProgram,
    params: &[Vec3],
    out: &[Vec3],
) -> Result<usize, EvalError> {
    let per = program.parameter_count();
    if params.len() != per * out.len() {
        return Err(EvalError::ParameterCount {
            expected: per * out.len(),
            actual: params.len(),
        });
    }
    Ok(per)
}

/// One evaluation per element of `out`; element `i` reads
/// `params[i * parameter_count..(i + 1) * parameter_count]`.
pub fn evaluate_batch(
    program: &CompiledProgram,
    params: &[Vec3],
    out: &mut [Vec3],
) -> Result<(), EvalError> {
    evaluate_batch_with(program, params, out, &BaseOps)
}

pub fn evaluate_batch_with<O: Operators>(
    program: &CompiledProgram,
    params: &[Vec3],
    out: &mut [Vec3],
    ops: &O,
) -> Result<(), EvalError> {
    let per = check_batch(program, params, out)?;
    let mut scratch = Scratch::new();
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = run(program, &params[i * per..(i + 1) * per], ops, &mut scratch)?;
    }
    Ok(())
}

/// Parallel batch settings.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct BatchOptions {
    /// Dedicated worker count; `None` uses the global rayon pool.
    pub threads: Option<usize>,
    /// Elements handed to a worker at a time.
    pub chunk_size: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            threads: None,
            chunk_size: 1024,
        }
    }
}

/// [`evaluate_batch`] across rayon workers. Each worker keeps one stack buffer for all of its
/// elements; results are identical to the sequential form.
///
/// Builds a dedicated pool per call when `opts.threads` is set; hold a [`BatchEvaluator`] to
/// reuse it across batches.
pub fn evaluate_batch_par<O: Operators + Sync>(
    program: &CompiledProgram,
    params: &[Vec3],
    out: &mut [Vec3],
    opts: &BatchOptions,
    ops: &O,
) -> FormulaResult<()> {
    BatchEvaluator::with_ops(opts.clone(), ops)?.run(program, params, out)
}

/// Parallel batch runner that owns its worker pool, built once from [`BatchOptions`].
pub struct BatchEvaluator<O = BaseOps> {
    ops: O,
    chunk_size: usize,
    pool: Option<rayon::ThreadPool>,
}

impl BatchEvaluator<BaseOps> {
    pub fn new(opts: BatchOptions) -> FormulaResult<Self> {
        Self::with_ops(opts, BaseOps)
    }
}

impl<O: Operators + Sync> BatchEvaluator<O> {
    pub fn with_ops(opts: BatchOptions, ops: O) -> FormulaResult<Self> {
        if opts.chunk_size == 0 {
            return Err(FormulaError::validation("batch 'chunk_size' must be >= 1"));
        }
        let pool = match opts.threads {
            Some(_) => Some(build_thread_pool(opts.threads)?),
            None => None,
        };
        tracing::debug!(
            threads = opts.threads,
            chunk_size = opts.chunk_size,
            "batch evaluator ready"
        );
        Ok(Self {
            ops,
            chunk_size: opts.chunk_size,
            pool,
        })
    }

    /// Worker count batches run on.
    pub fn threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    pub fn run(
        &self,
        program: &CompiledProgram,
        params: &[Vec3],
        out: &mut [Vec3],
    ) -> FormulaResult<()> {
        let per = check_batch(program, params, out)?;
        let chunk = self.chunk_size;
        let ops = &self.ops;
        match &self.pool {
            Some(pool) => pool.install(|| par_chunks(program, params, out, per, chunk, ops))?,
            None => par_chunks(program, params, out, per, chunk, ops)?,
        }
        Ok(())
    }
}

fn par_chunks<O: Operators + Sync>(
    program: &CompiledProgram,
    params: &[Vec3],
    out: &mut [Vec3],
    per: usize,
    chunk: usize,
    ops: &O,
) -> Result<(), EvalError> {
    out.par_chunks_mut(chunk).enumerate().try_for_each_init(
        Scratch::new,
        |scratch, (c, results)| -> Result<(), EvalError> {
            let first = c * chunk;
            for (k, slot) in results.iter_mut().enumerate() {
                let i = first + k;
                *slot = run(program, &params[i * per..(i + 1) * per], ops, scratch)?;
            }
            Ok(())
        },
    )
}

fn build_thread_pool(threads: Option<usize>) -> FormulaResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(FormulaError::validation(
            "batch 'threads' must be >= 1 when set",
        ));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build rayon thread pool: {e}").into())
}

/// Human-readable listing, one instruction per line, with operator names from `ops`.
pub fn disassemble<O: Operators>(instructions: &[Instruction], ops: &O) -> String {
    let mut out = String::new();
    for (i, instruction) in instructions.iter().enumerate() {
        let line = match instruction {
            Instruction::Op(op) => match ops.name(*op) {
                Some(name) => format!("{i:4}  {name}"),
                None => format!("{i:4}  {instruction}"),
            },
            other => format!("{i:4}  {other}"),
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/eval/evaluator.rs"]
mod tests;
