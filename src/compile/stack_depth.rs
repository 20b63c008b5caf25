use crate::eval::bytecode::Instruction;
use crate::eval::error::EvalError;
use crate::eval::interpret::{Context, Operators, interpret};
use glam::Vec3;

/// Result of a depth-only replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackDepth {
    pub max: usize,
    pub final_depth: usize,
}

#[derive(Default)]
struct DepthContext {
    depth: usize,
    max: usize,
}

impl Context for DepthContext {
    fn push(&mut self, _value: Vec3) -> Result<(), EvalError> {
        self.depth += 1;
        self.max = self.max.max(self.depth);
        Ok(())
    }

    fn pop(&mut self) -> Result<Vec3, EvalError> {
        self.depth = self.depth.checked_sub(1).ok_or(EvalError::StackUnderflow)?;
        Ok(Vec3::ZERO)
    }

    fn param(&mut self, _index: u16) -> Result<(), EvalError> {
        self.push(Vec3::ZERO)
    }

    fn load(&mut self, index: u16) -> Result<(), EvalError> {
        if index == 0 || usize::from(index) > self.depth {
            return Err(EvalError::BadIndex {
                kind: "load",
                index,
            });
        }
        self.push(Vec3::ZERO)
    }
}

/// Replay `instructions` counting pushes and pops only.
///
/// Operators still run (on zero vectors) so every table's real arity is respected.
pub fn measure<O: Operators>(
    instructions: &[Instruction],
    ops: &O,
) -> Result<StackDepth, EvalError> {
    let mut ctx = DepthContext::default();
    interpret(instructions, ops, &mut ctx)?;
    Ok(StackDepth {
        max: ctx.max,
        final_depth: ctx.depth,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/compile/stack_depth.rs"]
mod tests;
