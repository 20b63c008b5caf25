use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Operator opcode: a 4-bit layer tag over a 12-bit code.
///
/// Layer 0 is the base operator table. Each [`Layered`](crate::eval::interpret::Layered) hop
/// strips one level, so an extension table never sees codes that belong to the tables before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpCode(u16);

impl OpCode {
    pub const LAYER_SHIFT: u16 = 12;
    pub const CODE_MASK: u16 = (1 << Self::LAYER_SHIFT) - 1;
    pub const MAX_LAYER: u8 = 0xf;

    pub const fn new(layer: u8, code: u16) -> Self {
        Self(((layer as u16 & 0xf) << Self::LAYER_SHIFT) | (code & Self::CODE_MASK))
    }

    pub const fn base(code: u16) -> Self {
        Self::new(0, code)
    }

    pub const fn layer(self) -> u8 {
        (self.0 >> Self::LAYER_SHIFT) as u8
    }

    pub const fn code(self) -> u16 {
        self.0 & Self::CODE_MASK
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Same code one layer down; what the next table in a chain receives.
    pub const fn forwarded(self) -> Self {
        Self::new(self.layer().saturating_sub(1), self.code())
    }

    /// Same code one layer up; `None` once the tag space is exhausted.
    pub const fn lifted(self) -> Option<Self> {
        if self.layer() >= Self::MAX_LAYER {
            None
        } else {
            Some(Self::new(self.layer() + 1, self.code()))
        }
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.layer(), self.code())
    }
}

/// One bytecode step. Pushes carry their operand inline; operators pop their arity and push one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instruction {
    Const(Vec3),
    /// 1-based index into the evaluation parameters.
    Param(u16),
    /// 1-based stack position of a resident slot value.
    Load(u16),
    Op(OpCode),
}

impl Instruction {
    pub fn splat(x: f32) -> Self {
        Self::Const(Vec3::splat(x))
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Const(v) if v.x == v.y && v.y == v.z => write!(f, "const {}", v.x),
            Self::Const(v) => write!(f, "const ({}, {}, {})", v.x, v.y, v.z),
            Self::Param(i) => write!(f, "param {i}"),
            Self::Load(i) => write!(f, "load {i}"),
            Self::Op(op) => write!(f, "op {op}"),
        }
    }
}
