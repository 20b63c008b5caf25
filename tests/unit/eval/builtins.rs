use super::*;

#[derive(Default)]
struct Stack(Vec<Vec3>);

impl Context for Stack {
    fn push(&mut self, value: Vec3) -> Result<(), EvalError> {
        self.0.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<Vec3, EvalError> {
        self.0.pop().ok_or(EvalError::StackUnderflow)
    }

    fn param(&mut self, index: u16) -> Result<(), EvalError> {
        Err(EvalError::BadIndex {
            kind: "param",
            index,
        })
    }

    fn load(&mut self, index: u16) -> Result<(), EvalError> {
        Err(EvalError::BadIndex { kind: "load", index })
    }
}

/// Call `name` with `args` in source order.
fn call(name: &str, args: &[Vec3]) -> Vec3 {
    let Lookup::Found(op) = BaseOps.lookup(name, args.len()) else {
        panic!("{name}/{} not found", args.len());
    };
    let mut stack = Stack::default();
    for a in args.iter().rev() {
        stack.push(*a).unwrap();
    }
    BaseOps.execute(op, &mut stack).unwrap();
    assert_eq!(stack.0.len(), 1);
    stack.0[0]
}

fn s(x: f32) -> Vec3 {
    Vec3::splat(x)
}

#[test]
fn every_op_has_exactly_one_row() {
    for op in BaseOp::ALL {
        assert_eq!(
            FUNCTIONS.iter().filter(|f| f.op == op).count(),
            1,
            "{op:?}"
        );
        assert_eq!(BaseOp::from_code(op as u16), Some(op));
    }
    assert_eq!(BaseOp::from_code(BaseOp::ALL.len() as u16), None);
}

#[test]
fn arithmetic_keeps_argument_order() {
    assert_eq!(call("sub", &[s(5.0), s(3.0)]), s(2.0));
    assert_eq!(call("div", &[s(1.0), s(4.0)]), s(0.25));
    assert_eq!(call("pow", &[s(2.0), s(3.0)]), s(8.0));
    assert_eq!(call("mod", &[s(7.5), s(2.0)]), s(1.5));
    assert_eq!(call("mod", &[s(-7.5), s(2.0)]), s(-1.5));
    assert_eq!(call("minus", &[Vec3::new(1.0, -2.0, 0.5)]), Vec3::new(-1.0, 2.0, -0.5));
}

#[test]
fn comparisons_require_every_lane() {
    let a = Vec3::new(1.0, 2.0, 3.0);
    assert_eq!(call("gt", &[a, s(0.0)]), Vec3::ONE);
    assert_eq!(call("gt", &[a, s(1.0)]), Vec3::ZERO);
    assert_eq!(call("gte", &[a, s(1.0)]), Vec3::ONE);
    assert_eq!(call("lt", &[a, s(3.0)]), Vec3::ZERO);
    assert_eq!(call("lte", &[a, s(3.0)]), Vec3::ONE);
}

#[test]
fn component_extraction_broadcasts() {
    let a = Vec3::new(1.0, 2.0, 3.0);
    assert_eq!(call("x", &[a]), s(1.0));
    assert_eq!(call("y", &[a]), s(2.0));
    assert_eq!(call("z", &[a]), s(3.0));
    assert_eq!(call("v3", &[s(4.0), s(5.0), s(6.0)]), Vec3::new(4.0, 5.0, 6.0));
}

#[test]
fn clamp_select_and_lerp() {
    let x = Vec3::new(-1.0, 0.5, 9.0);
    assert_eq!(call("clamp", &[x, s(0.0), s(1.0)]), Vec3::new(0.0, 0.5, 1.0));
    assert_eq!(call("saturate", &[x]), Vec3::new(0.0, 0.5, 1.0));
    // Inverted bounds resolve to `lo`.
    assert_eq!(call("clamp", &[x, s(2.0), s(1.0)]), s(2.0));
    assert_eq!(
        call("select", &[Vec3::new(1.0, 0.0, -2.0), s(7.0), s(8.0)]),
        Vec3::new(7.0, 8.0, 7.0)
    );
    assert_eq!(call("lerp", &[s(2.0), s(4.0), s(0.25)]), s(2.5));
}

#[test]
fn distances_broadcast_scalars() {
    let a = Vec3::new(1.0, 2.0, 2.0);
    assert_eq!(call("dist", &[a, Vec3::ZERO]), s(3.0));
    assert_eq!(call("sqdist", &[a, Vec3::ZERO]), s(9.0));
}

#[test]
fn box_distance_inside_and_outside() {
    let half = s(1.0);
    assert_eq!(call("box", &[Vec3::new(3.0, 0.0, 0.0), half]), s(2.0));
    assert_eq!(call("box", &[Vec3::ZERO, half]), s(-1.0));
    let corner = call("box", &[Vec3::new(2.0, 2.0, 1.0), half]);
    assert!((corner.x - 2.0f32.sqrt()).abs() < 1e-6);
}

#[test]
fn noise_entries_route_to_noise_module() {
    let p = Vec3::new(0.3, 1.7, -2.1);
    assert_eq!(call("snoise", &[p]), s(noise::snoise(p)));
    assert_eq!(call("cnoise", &[p]), s(noise::cnoise(p)));
    assert_eq!(call("fbm", &[p]), s(noise::fbm(p, 1.0, 5, 0.4)));
    assert_eq!(
        call("fbm", &[p, s(0.5), s(3.0), s(2.0)]),
        s(noise::fbm(p, 0.5, 3, 2.0))
    );
    assert_eq!(
        call("srdnoise", &[p]),
        noise::srdnoise(Vec2::new(p.x, p.y), p.z)
    );
}

#[test]
fn lookup_is_case_insensitive_and_overloads_on_arity() {
    assert_eq!(BaseOps.lookup("SIN", 1), Lookup::Found(BaseOp::Sin.opcode()));
    assert_eq!(BaseOps.lookup("fbm", 1), Lookup::Found(BaseOp::Fbm1.opcode()));
    assert_eq!(BaseOps.lookup("Fbm", 4), Lookup::Found(BaseOp::Fbm4.opcode()));
    match BaseOps.lookup("fbm", 2) {
        Lookup::WrongArity(arities) => assert_eq!(arities.as_slice(), &[1, 4]),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(BaseOps.lookup("nope", 1), Lookup::Unknown);
}

#[test]
fn foreign_layers_are_rejected() {
    let mut stack = Stack::default();
    stack.push(Vec3::ONE).unwrap();
    let err = BaseOps
        .execute(OpCode::new(1, BaseOp::Neg as u16), &mut stack)
        .unwrap_err();
    assert!(matches!(err, EvalError::UnknownOpcode(_)));
    assert_eq!(BaseOps.name(OpCode::new(1, 0)), None);
    assert_eq!(BaseOps.name(BaseOp::Sqrt.opcode()), Some("sqrt"));
}

#[test]
fn constants_are_case_sensitive() {
    assert_eq!(constant("PI"), Some(std::f32::consts::PI));
    assert_eq!(constant("pi"), None);
    assert_eq!(constant("SQRT2"), Some(std::f32::consts::SQRT_2));
}
