use super::*;
use crate::compile::named::NamedValueKind;

#[test]
fn json_document_round_trips() {
    let text = r#"{
        "input": "x + a",
        "params": ["a"],
        "named_values": [
            {"name": "x", "kind": "sub_formula", "value": "y * 2"},
            {"name": "y", "kind": "float", "value": 5.0}
        ],
        "options": {"fold_constants": true}
    }"#;
    let mut formula = Formula::from_json(text).unwrap();
    assert!(formula.options.fold_constants);
    let program = formula.compile().unwrap();
    assert_eq!(
        crate::eval::evaluator::evaluate(&program, &[Vec3::ONE]).unwrap(),
        Vec3::splat(11.0)
    );

    let back = Formula::from_json(&formula.to_json_pretty().unwrap()).unwrap();
    assert_eq!(back, formula);
}

#[test]
fn missing_fields_default_and_unknown_fields_fail() {
    let formula = Formula::from_json(r#"{"input": "1"}"#).unwrap();
    assert!(formula.params.is_empty());
    assert!(!formula.options.fold_constants);

    let err = Formula::from_json(r#"{"input": "1", "colour": 3}"#).unwrap_err();
    assert!(matches!(err, FormulaError::Serde(_)));
}

#[test]
fn parameter_names_are_validated() {
    let mut formula = Formula::new("a");
    formula.set_parameters(["a", "b"]).unwrap();
    let err = formula.set_parameters(["a", "a"]).unwrap_err();
    assert!(err.to_string().contains("duplicate parameter name 'a'"));
    assert_eq!(formula.params, ["a", "b"]);
    assert!(formula.set_parameters([""]).is_err());
}

#[test]
fn compile_registers_new_names() {
    let mut formula = Formula::new("pos * f_gain");
    formula.compile().unwrap();
    assert_eq!(
        formula.named_values.get("f_gain").map(|v| &v.kind),
        Some(&NamedValueKind::Float(0.0))
    );
    assert!(formula.named_values.get("pos").is_some());
}

#[test]
fn prune_keeps_transitive_references() {
    let mut formula = Formula::new("s1 + 1");
    formula.named_values.set_sub_formula("s1", "v * 2");
    formula.named_values.set_vector("v", Vec3::ONE);
    formula.named_values.set_float("f_stale", 3.0);
    formula.named_values.set_sub_formula("s_stale", "v");

    let removed = formula.prune_unused_named_values().unwrap();
    assert_eq!(removed, ["f_stale", "s_stale"]);
    let left: Vec<_> = formula.named_values.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(left, ["s1", "v"]);
}

#[test]
fn prune_is_a_no_op_when_compilation_fails() {
    let mut formula = Formula::new("1 +");
    formula.named_values.set_float("f", 1.0);
    assert!(formula.prune_unused_named_values().is_err());
    assert_eq!(formula.named_values.len(), 1);
}

#[test]
fn live_edit_swaps_programs() {
    let mut formula = Formula::new("a * 2");
    formula.set_parameters(["a"]).unwrap();
    let mut live = LiveFormula::new(formula);
    assert!(live.is_dirty());
    assert_eq!(live.live_edit(), EditOutcome::Recompiled { changed: true });
    assert_eq!(live.live_edit(), EditOutcome::Clean);

    let before = live.program();
    assert_eq!(live.evaluate(&[Vec3::ONE]).unwrap(), Vec3::splat(2.0));

    live.set_input("a * 3");
    assert_eq!(live.live_edit(), EditOutcome::Recompiled { changed: true });
    assert_eq!(live.evaluate(&[Vec3::ONE]).unwrap(), Vec3::splat(3.0));
    // snapshots taken earlier keep working
    assert_eq!(
        crate::eval::evaluator::evaluate(&before, &[Vec3::ONE]).unwrap(),
        Vec3::splat(2.0)
    );
}

#[test]
fn identical_recompile_keeps_the_same_program() {
    let mut live = LiveFormula::new(Formula::new("1 + 2"));
    live.live_edit();
    let first = live.program();
    live.set_input("1+2");
    assert_eq!(live.live_edit(), EditOutcome::Recompiled { changed: false });
    assert!(Arc::ptr_eq(&first, &live.program()));
}

#[test]
fn failed_edit_keeps_previous_program() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let mut live = LiveFormula::new(Formula::new("4"));
    live.live_edit();
    live.set_input("4 +");
    assert_eq!(live.live_edit(), EditOutcome::Failed);
    assert!(matches!(live.last_error(), Some(FormulaError::Parse(_))));
    assert_eq!(live.evaluate(&[]).unwrap(), Vec3::splat(4.0));

    live.set_input("5");
    live.live_edit();
    assert!(live.last_error().is_none());
    assert_eq!(live.evaluate(&[]).unwrap(), Vec3::splat(5.0));
}
