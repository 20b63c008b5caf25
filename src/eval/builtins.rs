//! The base operator table: arithmetic, comparisons, vector helpers and noise.
//!
//! Every operator is also callable by name (`add(a, b)`, `gt(a, b)`, `minus(a)`), since the
//! parser's infix operators resolve through the same table.

use crate::eval::bytecode::OpCode;
use crate::eval::error::EvalError;
use crate::eval::interpret::{Context, Lookup, Operators};
use crate::eval::noise;
use glam::{Vec2, Vec3};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum BaseOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Neg,
    Gt,
    Gte,
    Lt,
    Lte,
    Pow,
    Sqrt,
    Abs,
    Saturate,
    Sin,
    Cos,
    Tan,
    X,
    Y,
    Z,
    Min,
    Max,
    Lerp,
    Clamp,
    Select,
    Dist,
    SqDist,
    V3,
    Box,
    CNoise,
    PNoise,
    SNoise,
    SrdNoise,
    Fbm1,
    Fbm4,
}

impl BaseOp {
    const ALL: [BaseOp; 35] = [
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::Div,
        Self::Mod,
        Self::Neg,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::Pow,
        Self::Sqrt,
        Self::Abs,
        Self::Saturate,
        Self::Sin,
        Self::Cos,
        Self::Tan,
        Self::X,
        Self::Y,
        Self::Z,
        Self::Min,
        Self::Max,
        Self::Lerp,
        Self::Clamp,
        Self::Select,
        Self::Dist,
        Self::SqDist,
        Self::V3,
        Self::Box,
        Self::CNoise,
        Self::PNoise,
        Self::SNoise,
        Self::SrdNoise,
        Self::Fbm1,
        Self::Fbm4,
    ];

    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    pub const fn opcode(self) -> OpCode {
        OpCode::base(self as u16)
    }

    pub fn info(self) -> &'static FunctionInfo {
        // Every variant has exactly one row; checked by the unit tests.
        FUNCTIONS
            .iter()
            .find(|f| f.op == self)
            .unwrap_or(&FUNCTIONS[0])
    }
}

/// Documentation row for one callable function.
#[derive(Debug, Clone, Copy)]
pub struct FunctionInfo {
    pub name: &'static str,
    pub op: BaseOp,
    pub arity: usize,
    pub signature: &'static str,
    pub description: &'static str,
}

const fn func(
    name: &'static str,
    op: BaseOp,
    arity: usize,
    signature: &'static str,
    description: &'static str,
) -> FunctionInfo {
    FunctionInfo {
        name,
        op,
        arity,
        signature,
        description,
    }
}

pub const FUNCTIONS: &[FunctionInfo] = &[
    func("add", BaseOp::Add, 2, "add(a, b)", "a + b per lane"),
    func("sub", BaseOp::Sub, 2, "sub(a, b)", "a - b per lane"),
    func("mul", BaseOp::Mul, 2, "mul(a, b)", "a * b per lane"),
    func("div", BaseOp::Div, 2, "div(a, b)", "a / b per lane"),
    func("mod", BaseOp::Mod, 2, "mod(a, b)", "Floating remainder per lane; sign follows a"),
    func("minus", BaseOp::Neg, 1, "minus(a)", "-a"),
    func("gt", BaseOp::Gt, 2, "gt(a, b)", "1 if a > b on every lane, else 0"),
    func("gte", BaseOp::Gte, 2, "gte(a, b)", "1 if a >= b on every lane, else 0"),
    func("lt", BaseOp::Lt, 2, "lt(a, b)", "1 if a < b on every lane, else 0"),
    func("lte", BaseOp::Lte, 2, "lte(a, b)", "1 if a <= b on every lane, else 0"),
    func("pow", BaseOp::Pow, 2, "pow(a, b)", "a raised to b per lane"),
    func("sqrt", BaseOp::Sqrt, 1, "sqrt(a)", "Square root per lane"),
    func("abs", BaseOp::Abs, 1, "abs(a)", "Absolute value per lane"),
    func("saturate", BaseOp::Saturate, 1, "saturate(a)", "Clamp each lane to [0, 1]"),
    func("sin", BaseOp::Sin, 1, "sin(a)", "Sine per lane"),
    func("cos", BaseOp::Cos, 1, "cos(a)", "Cosine per lane"),
    func("tan", BaseOp::Tan, 1, "tan(a)", "Tangent per lane"),
    func("x", BaseOp::X, 1, "x(v)", "First component, broadcast"),
    func("y", BaseOp::Y, 1, "y(v)", "Second component, broadcast"),
    func("z", BaseOp::Z, 1, "z(v)", "Third component, broadcast"),
    func("min", BaseOp::Min, 2, "min(a, b)", "Smaller value per lane"),
    func("max", BaseOp::Max, 2, "max(a, b)", "Larger value per lane"),
    func("lerp", BaseOp::Lerp, 3, "lerp(a, b, t)", "a + (b - a) * t per lane"),
    func("clamp", BaseOp::Clamp, 3, "clamp(x, lo, hi)", "max(lo, min(hi, x)) per lane"),
    func("select", BaseOp::Select, 3, "select(c, a, b)", "a where c is non-zero, else b, per lane"),
    func("dist", BaseOp::Dist, 2, "dist(a, b)", "Euclidean distance, broadcast"),
    func("sqdist", BaseOp::SqDist, 2, "sqdist(a, b)", "Squared distance, broadcast"),
    func("v3", BaseOp::V3, 3, "v3(x, y, z)", "Vector from the first lane of each argument"),
    func("box", BaseOp::Box, 2, "box(p, b)", "Signed distance from p to a box of half-extents b"),
    func("cnoise", BaseOp::CNoise, 1, "cnoise(p)", "Classic Perlin noise"),
    func("pnoise", BaseOp::PNoise, 2, "pnoise(p, period)", "Perlin noise tiling with period"),
    func("snoise", BaseOp::SNoise, 1, "snoise(p)", "Simplex noise"),
    func(
        "srdnoise",
        BaseOp::SrdNoise,
        1,
        "srdnoise(v)",
        "Rotating 2D simplex noise at v.xy, angle v.z; returns (n, dn/dx, dn/dy)",
    ),
    func("fbm", BaseOp::Fbm1, 1, "fbm(p)", "5 octaves of simplex fBm"),
    func(
        "fbm",
        BaseOp::Fbm4,
        4,
        "fbm(p, persistence, octaves, lacunarity)",
        "Simplex fBm with explicit parameters (first lane of each); at most 16 octaves",
    ),
];

/// Named constants resolved at compile time. Names are case-sensitive.
pub const CONSTANTS: &[(&str, f32, &str)] = &[
    ("PI", std::f32::consts::PI, "Ratio of a circle's circumference to its diameter"),
    ("E", std::f32::consts::E, "Euler's number"),
    ("SQRT2", std::f32::consts::SQRT_2, "Square root of two"),
];

pub fn constant(name: &str) -> Option<f32> {
    CONSTANTS
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|&(_, v, _)| v)
}

/// The built-in operator table (layer 0 of every chain).
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseOps;

impl Operators for BaseOps {
    fn lookup(&self, name: &str, argc: usize) -> Lookup {
        let mut arities = SmallVec::<[usize; 4]>::new();
        for f in FUNCTIONS.iter().filter(|f| f.name.eq_ignore_ascii_case(name)) {
            if f.arity == argc {
                return Lookup::Found(f.op.opcode());
            }
            arities.push(f.arity);
        }
        if arities.is_empty() {
            Lookup::Unknown
        } else {
            Lookup::WrongArity(arities)
        }
    }

    fn execute<C: Context>(&self, op: OpCode, ctx: &mut C) -> Result<(), EvalError> {
        let base = (op.layer() == 0)
            .then(|| BaseOp::from_code(op.code()))
            .flatten()
            .ok_or(EvalError::UnknownOpcode(op))?;
        let result = apply(base, ctx)?;
        ctx.push(result)
    }

    fn name(&self, op: OpCode) -> Option<&'static str> {
        if op.layer() != 0 {
            return None;
        }
        BaseOp::from_code(op.code()).map(|b| b.info().name)
    }
}

fn lanes(v: Vec3, f: impl Fn(f32) -> f32) -> Vec3 {
    Vec3::new(f(v.x), f(v.y), f(v.z))
}

fn truth(all: bool) -> Vec3 {
    if all { Vec3::ONE } else { Vec3::ZERO }
}

// Pop order is argument order: the first pop is the leftmost argument.
fn apply<C: Context>(op: BaseOp, ctx: &mut C) -> Result<Vec3, EvalError> {
    let v = match op {
        BaseOp::Add => ctx.pop()? + ctx.pop()?,
        BaseOp::Sub => ctx.pop()? - ctx.pop()?,
        BaseOp::Mul => ctx.pop()? * ctx.pop()?,
        BaseOp::Div => ctx.pop()? / ctx.pop()?,
        BaseOp::Mod => ctx.pop()? % ctx.pop()?,
        BaseOp::Neg => -ctx.pop()?,
        BaseOp::Gt => truth(ctx.pop()?.cmpgt(ctx.pop()?).all()),
        BaseOp::Gte => truth(ctx.pop()?.cmpge(ctx.pop()?).all()),
        BaseOp::Lt => truth(ctx.pop()?.cmplt(ctx.pop()?).all()),
        BaseOp::Lte => truth(ctx.pop()?.cmple(ctx.pop()?).all()),
        BaseOp::Pow => {
            let a = ctx.pop()?;
            let b = ctx.pop()?;
            Vec3::new(a.x.powf(b.x), a.y.powf(b.y), a.z.powf(b.z))
        }
        BaseOp::Sqrt => lanes(ctx.pop()?, f32::sqrt),
        BaseOp::Abs => ctx.pop()?.abs(),
        BaseOp::Saturate => ctx.pop()?.max(Vec3::ZERO).min(Vec3::ONE),
        BaseOp::Sin => lanes(ctx.pop()?, f32::sin),
        BaseOp::Cos => lanes(ctx.pop()?, f32::cos),
        BaseOp::Tan => lanes(ctx.pop()?, f32::tan),
        BaseOp::X => Vec3::splat(ctx.pop()?.x),
        BaseOp::Y => Vec3::splat(ctx.pop()?.y),
        BaseOp::Z => Vec3::splat(ctx.pop()?.z),
        BaseOp::Min => ctx.pop()?.min(ctx.pop()?),
        BaseOp::Max => ctx.pop()?.max(ctx.pop()?),
        BaseOp::Lerp => {
            let a = ctx.pop()?;
            let b = ctx.pop()?;
            let t = ctx.pop()?;
            a + (b - a) * t
        }
        BaseOp::Clamp => {
            let x = ctx.pop()?;
            let lo = ctx.pop()?;
            let hi = ctx.pop()?;
            // Not Vec3::clamp: inverted bounds must not panic.
            lo.max(hi.min(x))
        }
        BaseOp::Select => {
            let cond = ctx.pop()?;
            let a = ctx.pop()?;
            let b = ctx.pop()?;
            Vec3::select(cond.cmpne(Vec3::ZERO), a, b)
        }
        BaseOp::Dist => Vec3::splat(ctx.pop()?.distance(ctx.pop()?)),
        BaseOp::SqDist => Vec3::splat(ctx.pop()?.distance_squared(ctx.pop()?)),
        BaseOp::V3 => {
            let x = ctx.pop()?.x;
            let y = ctx.pop()?.x;
            let z = ctx.pop()?.x;
            Vec3::new(x, y, z)
        }
        BaseOp::Box => {
            let p = ctx.pop()?;
            let b = ctx.pop()?;
            let q = p.abs() - b;
            Vec3::splat(q.max(Vec3::ZERO).length() + q.max_element().min(0.0))
        }
        BaseOp::CNoise => Vec3::splat(noise::cnoise(ctx.pop()?)),
        BaseOp::PNoise => {
            let p = ctx.pop()?;
            let rep = ctx.pop()?;
            Vec3::splat(noise::pnoise(p, rep))
        }
        BaseOp::SNoise => Vec3::splat(noise::snoise(ctx.pop()?)),
        BaseOp::SrdNoise => {
            let v = ctx.pop()?;
            noise::srdnoise(Vec2::new(v.x, v.y), v.z)
        }
        BaseOp::Fbm1 => Vec3::splat(noise::fbm(ctx.pop()?, 1.0, 5, 0.4)),
        BaseOp::Fbm4 => {
            let pos = ctx.pop()?;
            let persistence = ctx.pop()?.x;
            let octaves = ctx.pop()?.x as i32;
            let lacunarity = ctx.pop()?.x;
            Vec3::splat(noise::fbm(pos, persistence, octaves, lacunarity))
        }
    };
    Ok(v)
}

#[cfg(test)]
#[path = "../../tests/unit/eval/builtins.rs"]
mod tests;
