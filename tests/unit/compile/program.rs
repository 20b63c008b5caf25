use super::*;
use crate::eval::builtins::BaseOp;
use crate::eval::evaluator::evaluate;
use crate::foundation::error::FormulaError;
use glam::Vec3;

fn no_params() -> &'static [&'static str] {
    &[]
}

#[test]
fn raw_programs_are_validated() {
    let program = CompiledProgram::from_instructions(
        vec![
            Instruction::splat(5.0),
            Instruction::splat(10.0),
            Instruction::Load(2),
            Instruction::Load(1),
            Instruction::Op(BaseOp::Div.opcode()),
        ],
        3,
        0,
    )
    .unwrap();
    assert_eq!(program.max_stack_size(), 4);

    let wrong_final = CompiledProgram::from_instructions(vec![Instruction::splat(1.0)], 2, 0);
    assert_eq!(
        wrong_final,
        Err(EvalError::FinalStack {
            expected: 2,
            actual: 1
        })
    );

    let bad_param = CompiledProgram::from_instructions(vec![Instruction::Param(2)], 1, 1);
    assert_eq!(
        bad_param,
        Err(EvalError::BadIndex {
            kind: "param",
            index: 2
        })
    );
}

#[test]
fn compile_reports_sizes() {
    let mut named = NamedValues::new();
    let program = compile(
        "lerp(a, b, 0.25) * 2",
        &["a", "b"],
        &mut named,
        TranslationOptions::default(),
    )
    .unwrap();
    assert_eq!(program.parameter_count(), 2);
    assert_eq!(program.expected_final_stack_size(), 1);
    assert_eq!(program.max_stack_size(), 4);
    assert_eq!(
        evaluate(&program, &[Vec3::ZERO, Vec3::splat(4.0)]).unwrap(),
        Vec3::splat(2.0)
    );
}

#[test]
fn empty_text_compiles_to_empty_program() {
    let mut named = NamedValues::new();
    let program = compile("   ", &["p"], &mut named, TranslationOptions::default()).unwrap();
    assert_eq!(program, CompiledProgram::empty(1));
    assert_eq!(evaluate(&program, &[Vec3::ONE]).unwrap(), Vec3::ZERO);
}

#[test]
fn errors_are_typed_by_stage() {
    let mut named = NamedValues::new();
    let parse = compile("1 +", no_params(), &mut named, TranslationOptions::default());
    assert!(matches!(parse, Err(FormulaError::Parse(_))));

    let translate = compile("nope(1)", no_params(), &mut named, TranslationOptions::default());
    assert!(matches!(translate, Err(FormulaError::Translate(_))));
}

#[test]
fn stats_come_back_with_the_program() {
    let mut named = NamedValues::new();
    named.set_sub_formula("s", "a * 3");
    let (program, stats) = compile_with(
        "s + s",
        &["a"],
        &mut named,
        TranslationOptions::default(),
        &BaseOps,
    )
    .unwrap();
    assert_eq!(stats.slots, ["s"]);
    assert_eq!(program.expected_final_stack_size(), 2);
    assert_eq!(evaluate(&program, &[Vec3::ONE]).unwrap(), Vec3::splat(6.0));
}

#[test]
fn display_lists_named_operators() {
    let mut named = NamedValues::new();
    let program = compile("a - 2", &["a"], &mut named, TranslationOptions::default()).unwrap();
    let text = program.to_string();
    assert!(text.starts_with("; params=1 max_stack=2 final_stack=1\n"));
    assert!(text.contains("const 2"));
    assert!(text.contains("param 1"));
    assert!(text.contains("sub"));
}

#[test]
fn fingerprint_follows_content() {
    let mut named = NamedValues::new();
    let opts = TranslationOptions::default();
    let a = compile("a * 2", &["a"], &mut named, opts).unwrap();
    let b = compile("a * 2", &["a"], &mut named, opts).unwrap();
    let c = compile("a * 3", &["a"], &mut named, opts).unwrap();
    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_ne!(a.fingerprint(), c.fingerprint());
}
