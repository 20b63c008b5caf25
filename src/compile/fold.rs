use crate::eval::bytecode::Instruction;
use crate::eval::error::EvalError;
use crate::eval::interpret::{Context, Operators, interpret};
use glam::Vec3;
use smallvec::SmallVec;

/// Shadow interpreter that evaluates what it can and rewrites the stream as it goes.
///
/// Invariant: every foldable value on the shadow stack was produced by exactly one trailing
/// `Const` in `out`, so folding an instruction means dropping its popped inputs from the tail.
#[derive(Default)]
struct FoldContext {
    stack: Vec<(Vec3, bool)>,
    out: Vec<Instruction>,
    foldable: bool,
    popped: usize,
    pushed: SmallVec<[Vec3; 2]>,
}

impl Context for FoldContext {
    fn push(&mut self, value: Vec3) -> Result<(), EvalError> {
        self.stack.push((value, self.foldable));
        self.pushed.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<Vec3, EvalError> {
        let (value, foldable) = self.stack.pop().ok_or(EvalError::StackUnderflow)?;
        self.popped += 1;
        self.foldable &= foldable;
        Ok(value)
    }

    fn param(&mut self, _index: u16) -> Result<(), EvalError> {
        self.foldable = false;
        self.push(Vec3::ZERO)
    }

    // Slot values only exist at run time; a sub-formula block may be folded before its slots
    // are laid out, so the index is not checked here.
    fn load(&mut self, _index: u16) -> Result<(), EvalError> {
        self.foldable = false;
        self.push(Vec3::ZERO)
    }

    fn begin(&mut self, _at: usize) {
        self.foldable = true;
        self.popped = 0;
        self.pushed.clear();
    }

    fn end(&mut self, _at: usize, instruction: &Instruction) -> Result<(), EvalError> {
        if !self.foldable {
            self.out.push(*instruction);
            return Ok(());
        }
        let keep = self
            .out
            .len()
            .checked_sub(self.popped)
            .ok_or(EvalError::StackUnderflow)?;
        self.out.truncate(keep);
        self.out
            .extend(self.pushed.iter().map(|&v| Instruction::Const(v)));
        Ok(())
    }
}

/// Replace every compile-time-computable run of instructions with a single constant.
pub fn fold_constants<O: Operators>(
    instructions: &[Instruction],
    ops: &O,
) -> Result<Vec<Instruction>, EvalError> {
    let mut ctx = FoldContext {
        out: Vec::with_capacity(instructions.len()),
        ..FoldContext::default()
    };
    interpret(instructions, ops, &mut ctx)?;
    Ok(ctx.out)
}

#[cfg(test)]
#[path = "../../tests/unit/compile/fold.rs"]
mod tests;
