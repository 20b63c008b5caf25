use super::*;
use crate::expression::ast::{BinaryOp, UnaryOp};

fn v(x: f32) -> Node {
    Node::Value(x)
}

fn parsed(src: &str) -> Node {
    parse(src).unwrap().unwrap()
}

fn err(src: &str) -> ParseError {
    parse(src).unwrap_err()
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    assert_eq!(
        parsed("12+34*45"),
        Node::binary(
            BinaryOp::Add,
            v(12.0),
            Node::binary(BinaryOp::Mul, v(34.0), v(45.0))
        )
    );
}

#[test]
fn same_precedence_is_left_associative() {
    assert_eq!(
        parsed("12+34+45"),
        Node::binary(
            BinaryOp::Add,
            Node::binary(BinaryOp::Add, v(12.0), v(34.0)),
            v(45.0)
        )
    );
    assert_eq!(
        parsed("8/4/2"),
        Node::binary(
            BinaryOp::Div,
            Node::binary(BinaryOp::Div, v(8.0), v(4.0)),
            v(2.0)
        )
    );
}

#[test]
fn relational_shares_additive_level() {
    assert_eq!(
        parsed("a+1>b"),
        Node::binary(
            BinaryOp::Gt,
            Node::binary(BinaryOp::Add, Node::variable("a"), v(1.0)),
            Node::variable("b")
        )
    );
    assert_eq!(
        parsed("a>=b*2"),
        Node::binary(
            BinaryOp::Ge,
            Node::variable("a"),
            Node::binary(BinaryOp::Mul, Node::variable("b"), v(2.0))
        )
    );
}

#[test]
fn unary_minus_chains_and_binds_tightest() {
    assert_eq!(parsed("--1"), Node::neg(Node::neg(v(1.0))));
    assert_eq!(
        parsed("-(3+4)"),
        Node::neg(Node::binary(BinaryOp::Add, v(3.0), v(4.0)))
    );
    assert_eq!(
        parsed("-a*b"),
        Node::binary(
            BinaryOp::Mul,
            Node::neg(Node::variable("a")),
            Node::variable("b")
        )
    );
    assert_eq!(
        parsed("2*-3"),
        Node::binary(BinaryOp::Mul, v(2.0), Node::neg(v(3.0)))
    );
    assert_eq!(
        parsed("1 - -x"),
        Node::binary(BinaryOp::Sub, v(1.0), Node::neg(Node::variable("x")))
    );
}

#[test]
fn minus_after_operand_is_binary() {
    assert_eq!(
        parsed("(1)-2"),
        Node::binary(BinaryOp::Sub, v(1.0), v(2.0))
    );
    assert_eq!(
        parsed("f(1)-2"),
        Node::binary(BinaryOp::Sub, Node::call("f", vec![v(1.0)]), v(2.0))
    );
}

#[test]
fn function_calls_parse_arguments_recursively() {
    assert_eq!(
        parsed("sqrt(63+1)"),
        Node::call(
            "sqrt",
            vec![Node::binary(BinaryOp::Add, v(63.0), v(1.0))]
        )
    );
    assert_eq!(
        parsed("clamp(x, -1, min(a, (b)))"),
        Node::call(
            "clamp",
            vec![
                Node::variable("x"),
                Node::neg(v(1.0)),
                Node::call("min", vec![Node::variable("a"), Node::variable("b")]),
            ]
        )
    );
    assert_eq!(parsed("t()"), Node::call("t", vec![]));
}

#[test]
fn nested_groups_inside_arguments() {
    assert_eq!(
        parsed("f(((1)))*2"),
        Node::binary(BinaryOp::Mul, Node::call("f", vec![v(1.0)]), v(2.0))
    );
}

#[test]
fn empty_input_is_not_an_error() {
    assert_eq!(parse("").unwrap(), None);
    assert_eq!(parse("   ").unwrap(), None);
}

#[test]
fn unclosed_group_reports_closing_paren_missing() {
    let e = err("(1+2");
    assert_eq!(e.kind, ParseErrorKind::ClosingParenMissing);
    assert_eq!(e.offset, 0);
    assert_eq!(err("sin(1").kind, ParseErrorKind::ClosingParenMissing);
}

#[test]
fn stray_close_paren_is_mismatched() {
    let e = err("1+2)");
    assert_eq!(e.kind, ParseErrorKind::MismatchedParens);
    assert_eq!(e.offset, 3);
    assert_eq!(e.to_string(), "At 3: Mismatched parens");
}

#[test]
fn comma_outside_call_is_a_tuple() {
    assert_eq!(err("(1,2)").kind, ParseErrorKind::TuplesNotSupported);
    assert_eq!(err("1,2").kind, ParseErrorKind::TuplesNotSupported);
    assert_eq!(err("f((1,2))").kind, ParseErrorKind::TuplesNotSupported);
}

#[test]
fn missing_operand_names_the_operator() {
    let e = err("(1*)");
    assert_eq!(e.kind, ParseErrorKind::MissingOperand);
    assert_eq!(e.token.as_deref(), Some("*"));
    assert_eq!(e.offset, 2);
    assert_eq!(
        e.to_string(),
        "At 2: Missing operand for the * operator in the expression"
    );
    assert_eq!(err("()").kind, ParseErrorKind::MissingOperand);
    assert_eq!(err("f(1,)").kind, ParseErrorKind::MissingOperand);
}

#[test]
fn prefix_only_accepts_minus() {
    let e = err("+1");
    assert_eq!(e.kind, ParseErrorKind::UnknownUnaryOperator);
    assert_eq!(e.to_string(), "At 0: Cannot match unary operator '+'");
    assert_eq!(err("2*/3").kind, ParseErrorKind::UnknownUnaryOperator);
}

#[test]
fn adjacent_operands_need_an_operator() {
    let e = err("1 2");
    assert_eq!(e.kind, ParseErrorKind::UnknownBinaryOperator);
    assert_eq!(e.offset, 2);
}

#[test]
fn literal_beyond_f32_range_is_invalid() {
    let digits = "1".repeat(45);
    let e = err(&format!("2 * {digits}"));
    assert_eq!(e.kind, ParseErrorKind::InvalidNumber);
    assert_eq!(e.offset, 4);
    assert_eq!(e.token.as_deref(), Some(digits.as_str()));

    // largest finite values still parse
    assert_eq!(parsed("340282340000000000000000000000000000000"), v(f32::MAX));
}

#[test]
fn trailing_operator_runs_out_of_input() {
    let e = err("1 +");
    assert_eq!(e.kind, ParseErrorKind::EndOfExpression);
    assert_eq!(e.to_string(), "At 3: No characters left to parse");
}

#[test]
fn recovering_parse_keeps_completed_arguments() {
    let (node, error) = parse_recovering("v3(1, 2, 3 +");
    assert!(error.is_some());
    match node {
        Some(Node::Call { name, args }) => {
            assert_eq!(name, "v3");
            assert_eq!(args[0], v(1.0));
            assert_eq!(args[1], v(2.0));
        }
        other => panic!("expected partial call, got {other:?}"),
    }
}

#[test]
fn unary_op_kind_is_neg() {
    match parsed("-x") {
        Node::Unary { op, .. } => assert_eq!(op, UnaryOp::Neg),
        other => panic!("unexpected {other:?}"),
    }
}
