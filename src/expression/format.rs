//! Render an expression tree back to source text.
//!
//! Output always re-parses to a structurally equal tree: parentheses are added wherever the
//! operator table would otherwise regroup operands, even when
//! [`FormatOptions::parenthesize_binary`] is off.

use crate::expression::ast::Node;
use crate::expression::operator;
use std::fmt::Write as _;

/// Per-kind palette used by [`Coloring::ByKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub variable: [u8; 3],
    pub value: [u8; 3],
    pub unary: [u8; 3],
    pub binary: [u8; 3],
    pub function: [u8; 3],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            variable: [193, 145, 255],
            value: [255, 255, 255],
            unary: [102, 195, 204],
            binary: [102, 195, 204],
            function: [56, 200, 140],
        }
    }
}

/// How nodes are wrapped in `<color=#RRGGBB>` tags for external highlighters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Coloring {
    #[default]
    None,
    ByKind(Palette),
    /// A distinct hue per node, drawn from a Halton sequence starting at `seed`.
    PerNode { seed: u32 },
}

#[derive(Debug, Clone, Default)]
pub struct FormatOptions {
    /// Wrap every binary operation in parentheses.
    pub parenthesize_binary: bool,
    /// Break operands and arguments onto indented lines.
    pub indent: bool,
    /// Prepended to every variable name (e.g. `"$"`).
    pub variable_prefix: &'static str,
    pub coloring: Coloring,
}

impl FormatOptions {
    pub fn parenthesized() -> Self {
        Self {
            parenthesize_binary: true,
            ..Self::default()
        }
    }
}

#[derive(Clone, Copy)]
enum Role {
    Variable,
    Value,
    Unary,
    Binary,
    Function,
}

struct Formatter<'o> {
    options: &'o FormatOptions,
    depth: usize,
    next_color: u32,
}

pub fn format(node: &Node, options: &FormatOptions) -> String {
    let next_color = match options.coloring {
        Coloring::PerNode { seed } => seed,
        _ => 0,
    };
    let mut f = Formatter {
        options,
        depth: 0,
        next_color,
    };
    f.node(node)
}

impl Formatter<'_> {
    fn node(&mut self, node: &Node) -> String {
        match node {
            Node::Value(x) => self.colorize(x.to_string(), Role::Value),
            Node::Variable(name) => {
                self.colorize(format!("{}{name}", self.options.variable_prefix), Role::Variable)
            }
            Node::Unary { op, operand } => {
                let inner = self.node(operand);
                let text = if matches!(**operand, Node::Binary { .. }) && !self.options.parenthesize_binary
                {
                    format!("{}({inner})", op.symbol())
                } else {
                    format!("{}{inner}", op.symbol())
                };
                self.colorize(text, Role::Unary)
            }
            Node::Binary { op, left, right } => {
                let parens = self.options.parenthesize_binary;
                let precedence = operator::binary_precedence(*op);

                if parens {
                    self.depth += 1;
                }
                let mut a = self.node(left);
                let mut b = self.node(right);
                if parens {
                    self.depth -= 1;
                } else {
                    // Left-associative table: equal precedence only regroups on the right.
                    if needs_group(left, |p| p < precedence) {
                        a = format!("({a})");
                    }
                    if needs_group(right, |p| p <= precedence) {
                        b = format!("({b})");
                    }
                }

                let mut text = String::new();
                if parens {
                    text.push('(');
                    self.depth += 1;
                    text.push_str(&self.line(&a, false));
                    self.depth -= 1;
                } else {
                    text.push_str(&a);
                }
                let _ = write!(text, " {} ", self.line(op.symbol(), true));
                if parens {
                    self.depth += 1;
                }
                text.push_str(&self.line(&b, true));
                if parens {
                    self.depth -= 1;
                    text.push_str(&self.line(")", true));
                }
                self.colorize(text, Role::Binary)
            }
            Node::Call { name, args } => {
                self.depth += 1;
                let mut joined = String::new();
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        joined.push_str(", ");
                    }
                    let arg = self.node(arg);
                    joined.push_str(&self.line(&arg, true));
                }
                self.depth -= 1;
                let close = self.line(")", !args.is_empty());
                self.colorize(format!("{name}({joined}{close})"), Role::Function)
            }
        }
    }

    fn line(&self, s: &str, newline: bool) -> String {
        if !self.options.indent {
            return s.to_owned();
        }
        let pad = " ".repeat(self.depth * 2);
        if newline {
            format!("\n{pad}{s}")
        } else {
            format!("{pad}{s}")
        }
    }

    fn colorize(&mut self, s: String, role: Role) -> String {
        let rgb = match self.options.coloring {
            Coloring::None => return s,
            Coloring::ByKind(palette) => match role {
                Role::Variable => palette.variable,
                Role::Value => palette.value,
                Role::Unary => palette.unary,
                Role::Binary => palette.binary,
                Role::Function => palette.function,
            },
            Coloring::PerNode { .. } => {
                let hue = halton(self.next_color, 3);
                self.next_color += 1;
                hsv_to_rgb(hue, 0.45, 1.0)
            }
        };
        format!(
            "<color=#{:02X}{:02X}{:02X}>{s}</color>",
            rgb[0], rgb[1], rgb[2]
        )
    }
}

fn needs_group(node: &Node, regroups: impl Fn(u16) -> bool) -> bool {
    match node {
        Node::Binary { op, .. } => regroups(operator::binary_precedence(*op)),
        _ => false,
    }
}

fn halton(mut index: u32, base: u32) -> f32 {
    let mut fraction = 1.0f64;
    let mut result = 0.0f64;
    while index > 0 {
        fraction /= f64::from(base);
        result += fraction * f64::from(index % base);
        index /= base;
    }
    result as f32
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let h6 = (h.fract() * 6.0).max(0.0);
    let sector = h6.floor();
    let f = h6 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match sector as u32 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    let to_u8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    [to_u8(r), to_u8(g), to_u8(b)]
}

#[cfg(test)]
#[path = "../../tests/unit/expression/format.rs"]
mod tests;
