use super::*;
use crate::eval::bytecode::OpCode;
use glam::Vec3;

#[test]
fn equal_streams_hash_equal() {
    let a = [
        Instruction::Const(Vec3::splat(2.0)),
        Instruction::Param(1),
        Instruction::Op(OpCode::base(0)),
    ];
    let b = a;
    assert_eq!(
        fingerprint_instructions(&a, 1, 1),
        fingerprint_instructions(&b, 1, 1)
    );
}

#[test]
fn any_change_moves_the_fingerprint() {
    let base = [Instruction::Const(Vec3::new(1.0, 2.0, 3.0))];
    let f0 = fingerprint_instructions(&base, 1, 0);

    let other_value = [Instruction::Const(Vec3::new(1.0, 2.0, 3.5))];
    assert_ne!(f0, fingerprint_instructions(&other_value, 1, 0));
    assert_ne!(f0, fingerprint_instructions(&base, 1, 1));
    assert_ne!(
        fingerprint_instructions(&[Instruction::Param(1)], 1, 1),
        fingerprint_instructions(&[Instruction::Load(1)], 1, 1)
    );
}

#[test]
fn display_is_32_hex_digits() {
    let f = fingerprint_instructions(&[], 1, 0);
    let s = f.to_string();
    assert_eq!(s.len(), 32);
    assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
}
