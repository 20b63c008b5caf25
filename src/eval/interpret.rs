//! The single instruction loop shared by evaluation, constant folding and stack sizing.

use crate::eval::bytecode::{Instruction, OpCode};
use crate::eval::error::EvalError;
use glam::Vec3;
use smallvec::SmallVec;

/// Effects an instruction stream has on its environment.
///
/// The real evaluator, the folding pass and the depth pass each provide one of these; the
/// operator tables only ever talk to a `Context`.
pub trait Context {
    fn push(&mut self, value: Vec3) -> Result<(), EvalError>;
    fn pop(&mut self) -> Result<Vec3, EvalError>;
    /// Push parameter `index` (1-based).
    fn param(&mut self, index: u16) -> Result<(), EvalError>;
    /// Push the value at stack position `index` (1-based, from the bottom).
    fn load(&mut self, index: u16) -> Result<(), EvalError>;

    fn begin(&mut self, _at: usize) {}

    fn end(&mut self, _at: usize, _instruction: &Instruction) -> Result<(), EvalError> {
        Ok(())
    }
}

/// Outcome of looking a function up by name and argument count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(OpCode),
    /// The name exists, with these arities.
    WrongArity(SmallVec<[usize; 4]>),
    Unknown,
}

/// An operator table: resolves names to opcodes at compile time and executes them at run time.
pub trait Operators {
    fn lookup(&self, name: &str, argc: usize) -> Lookup;

    fn execute<C: Context>(&self, op: OpCode, ctx: &mut C) -> Result<(), EvalError>;

    /// Display name, for listings.
    fn name(&self, op: OpCode) -> Option<&'static str>;
}

impl<O: Operators> Operators for &O {
    fn lookup(&self, name: &str, argc: usize) -> Lookup {
        (**self).lookup(name, argc)
    }

    fn execute<C: Context>(&self, op: OpCode, ctx: &mut C) -> Result<(), EvalError> {
        (**self).execute(op, ctx)
    }

    fn name(&self, op: OpCode) -> Option<&'static str> {
        (**self).name(op)
    }
}

/// Run `instructions` against `ctx`, dispatching operators through `ops`.
pub fn interpret<O: Operators, C: Context>(
    instructions: &[Instruction],
    ops: &O,
    ctx: &mut C,
) -> Result<(), EvalError> {
    for (at, instruction) in instructions.iter().enumerate() {
        ctx.begin(at);
        match *instruction {
            Instruction::Const(v) => ctx.push(v)?,
            Instruction::Param(index) => ctx.param(index)?,
            Instruction::Load(index) => ctx.load(index)?,
            Instruction::Op(op) => ops.execute(op, ctx)?,
        }
        ctx.end(at, instruction)?;
    }
    Ok(())
}

/// Two operator tables chained: `base` owns layer 0, `next` sees everything above it with the
/// tag lowered by one.
///
/// Chains nest: `Layered<BaseOps, Layered<Mine, Theirs>>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Layered<B, N> {
    pub base: B,
    pub next: N,
}

impl<B, N> Layered<B, N> {
    pub fn new(base: B, next: N) -> Self {
        Self { base, next }
    }
}

impl<B: Operators, N: Operators> Operators for Layered<B, N> {
    fn lookup(&self, name: &str, argc: usize) -> Lookup {
        let own = self.base.lookup(name, argc);
        if let Lookup::Found(_) = own {
            return own;
        }
        match self.next.lookup(name, argc) {
            Lookup::Found(op) => op.lifted().map_or(Lookup::Unknown, Lookup::Found),
            Lookup::WrongArity(mut arities) => {
                if let Lookup::WrongArity(mine) = own {
                    arities.extend(mine);
                    arities.sort_unstable();
                    arities.dedup();
                }
                Lookup::WrongArity(arities)
            }
            Lookup::Unknown => own,
        }
    }

    fn execute<C: Context>(&self, op: OpCode, ctx: &mut C) -> Result<(), EvalError> {
        if op.layer() == 0 {
            self.base.execute(op, ctx)
        } else {
            self.next.execute(op.forwarded(), ctx)
        }
    }

    fn name(&self, op: OpCode) -> Option<&'static str> {
        if op.layer() == 0 {
            self.base.name(op)
        } else {
            self.next.name(op.forwarded())
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/eval/interpret.rs"]
mod tests;
