use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use vecexpr::{
    BaseOps, CONSTANTS, Coloring, FUNCTIONS, FormatOptions, Formula, FormulaError, Palette, Vec3,
};

#[derive(Parser, Debug)]
#[command(name = "vecexpr", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse an expression and print it back formatted.
    Parse(ParseArgs),
    /// Compile a formula and print its bytecode.
    Compile(CompileArgs),
    /// Compile and evaluate a formula once.
    Eval(EvalArgs),
    /// List built-in functions and constants.
    Functions,
}

#[derive(Parser, Debug)]
struct ParseArgs {
    expr: String,

    /// Wrap every binary operation in parentheses.
    #[arg(long)]
    parens: bool,

    /// Break operands onto indented lines.
    #[arg(long)]
    indent: bool,

    /// Prefix variable names with `$`.
    #[arg(long)]
    dollar: bool,

    #[arg(long, value_enum, default_value_t = ColorChoice::None)]
    color: ColorChoice,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ColorChoice {
    None,
    Kind,
    Node,
}

#[derive(Parser, Debug)]
struct FormulaArgs {
    /// Formula text; ignored when `--in` is given.
    expr: Option<String>,

    /// Formula document JSON.
    #[arg(long = "in")]
    in_path: Option<PathBuf>,

    /// Fold constant subexpressions.
    #[arg(long)]
    fold: bool,
}

#[derive(Parser, Debug)]
struct CompileArgs {
    #[command(flatten)]
    formula: FormulaArgs,

    /// Parameter name, in order (repeatable).
    #[arg(long = "param")]
    params: Vec<String>,

    /// Print the program as JSON instead of a listing.
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct EvalArgs {
    #[command(flatten)]
    formula: FormulaArgs,

    /// `name=x,y,z` or `name=s` (repeatable, in parameter order).
    #[arg(long = "param")]
    params: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Parse(args) => cmd_parse(args),
        Command::Compile(args) => cmd_compile(args),
        Command::Eval(args) => cmd_eval(args),
        Command::Functions => {
            cmd_functions();
            Ok(())
        }
    }
}

fn read_formula_json(path: &Path) -> anyhow::Result<Formula> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read formula '{}'", path.display()))?;
    Formula::from_json(&text).with_context(|| format!("parse formula '{}'", path.display()))
}

fn load_formula(args: &FormulaArgs) -> anyhow::Result<Formula> {
    let mut formula = match (&args.in_path, &args.expr) {
        (Some(path), _) => read_formula_json(path)?,
        (None, Some(expr)) => Formula::new(expr.clone()),
        (None, None) => anyhow::bail!("pass a formula or --in <file>"),
    };
    if args.fold {
        formula.options.fold_constants = true;
    }
    Ok(formula)
}

/// Source line with a caret under the failing offset.
fn caret(src: &str, err: &FormulaError) -> Option<String> {
    let offset = err.offset()?;
    let col = src
        .get(..offset.min(src.len()))
        .map_or(offset, |prefix| prefix.chars().count());
    Some(format!("{src}\n{}^", " ".repeat(col)))
}

fn compile_reporting(formula: &mut Formula) -> anyhow::Result<vecexpr::CompiledProgram> {
    formula.compile().map_err(|err| {
        if let Some(marked) = caret(&formula.input, &err) {
            eprintln!("{marked}");
        }
        anyhow::Error::from(err)
    })
}

fn cmd_parse(args: ParseArgs) -> anyhow::Result<()> {
    let node = match vecexpr::parse(&args.expr) {
        Ok(node) => node,
        Err(err) => {
            let err = FormulaError::from(err);
            if let Some(marked) = caret(&args.expr, &err) {
                eprintln!("{marked}");
            }
            return Err(err.into());
        }
    };
    let Some(node) = node else {
        println!();
        return Ok(());
    };

    let opts = FormatOptions {
        parenthesize_binary: args.parens,
        indent: args.indent,
        variable_prefix: if args.dollar { "$" } else { "" },
        coloring: match args.color {
            ColorChoice::None => Coloring::None,
            ColorChoice::Kind => Coloring::ByKind(Palette::default()),
            ColorChoice::Node => Coloring::PerNode { seed: 1 },
        },
    };
    println!("{}", vecexpr::format(&node, &opts));
    Ok(())
}

fn cmd_compile(args: CompileArgs) -> anyhow::Result<()> {
    let mut formula = load_formula(&args.formula)?;
    if !args.params.is_empty() {
        formula.set_parameters(args.params)?;
    }
    let program = compile_reporting(&mut formula)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&program)?);
    } else {
        println!("; fingerprint={}", program.fingerprint());
        print!("{program}");
    }
    Ok(())
}

fn parse_param(spec: &str) -> anyhow::Result<(String, Vec3)> {
    let (name, value) = spec
        .split_once('=')
        .with_context(|| format!("param '{spec}' must look like name=x,y,z"))?;
    let lanes = value
        .split(',')
        .map(|s| s.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("param '{name}': invalid number in '{value}'"))?;
    let v = match lanes.as_slice() {
        [s] => Vec3::splat(*s),
        [x, y, z] => Vec3::new(*x, *y, *z),
        _ => anyhow::bail!("param '{name}' needs 1 or 3 components, got {}", lanes.len()),
    };
    Ok((name.trim().to_owned(), v))
}

fn cmd_eval(args: EvalArgs) -> anyhow::Result<()> {
    let mut formula = load_formula(&args.formula)?;
    let given = args
        .params
        .iter()
        .map(|p| parse_param(p))
        .collect::<anyhow::Result<Vec<_>>>()?;

    // A document fixes the parameter order; otherwise the command line does.
    if formula.params.is_empty() {
        formula.set_parameters(given.iter().map(|(name, _)| name.clone()))?;
    }
    let values = formula
        .params
        .iter()
        .map(|name| {
            given
                .iter()
                .find(|(n, _)| n == name)
                .map(|&(_, v)| v)
                .with_context(|| format!("missing --param {name}=..."))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let program = compile_reporting(&mut formula)?;
    let out = vecexpr::evaluate_with(&program, &values, &BaseOps)?;
    println!("{} {} {}", out.x, out.y, out.z);
    Ok(())
}

fn cmd_functions() {
    println!("Functions:");
    for f in FUNCTIONS {
        println!("  {:<42} {}", f.signature, f.description);
    }
    println!();
    println!("Constants:");
    for (name, value, description) in CONSTANTS {
        println!("  {name:<8} = {value:<12} {description}");
    }
    println!();
    println!("Operators, tightest first: unary -, then * / %, then + - > >= < <= (left to right)");
}
