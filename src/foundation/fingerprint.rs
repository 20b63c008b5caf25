use crate::eval::bytecode::Instruction;
use xxhash_rust::xxh3::Xxh3;

const XXH3_SEED: u64 = 0x5f3c_91d2_7a0e_b46d;

/// Stable 128-bit identity of an instruction stream.
///
/// Two programs with equal fingerprints evaluate identically; used to tell whether a
/// recompilation actually changed anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ProgramFingerprint {
    /// High 64 bits of the digest.
    pub hi: u64,
    /// Low 64 bits of the digest.
    pub lo: u64,
}

impl std::fmt::Display for ProgramFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}{:016x}", self.hi, self.lo)
    }
}

pub(crate) fn fingerprint_instructions(
    instructions: &[Instruction],
    expected_final_stack_size: usize,
    parameter_count: usize,
) -> ProgramFingerprint {
    let mut h = StableHasher::new();
    h.write_u32(instructions.len() as u32);
    h.write_u32(expected_final_stack_size as u32);
    h.write_u32(parameter_count as u32);
    for instruction in instructions {
        match *instruction {
            Instruction::Const(v) => {
                h.write_u8(0);
                h.write_f32(v.x);
                h.write_f32(v.y);
                h.write_f32(v.z);
            }
            Instruction::Param(i) => {
                h.write_u8(1);
                h.write_u16(i);
            }
            Instruction::Load(i) => {
                h.write_u8(2);
                h.write_u16(i);
            }
            Instruction::Op(op) => {
                h.write_u8(3);
                h.write_u16(op.raw());
            }
        }
    }
    h.finish()
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    fn write_u16(&mut self, v: u16) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    // Hash bit patterns so -0.0 and NaN payloads stay distinguishable.
    fn write_f32(&mut self, v: f32) {
        self.write_u32(v.to_bits());
    }

    fn finish(self) -> ProgramFingerprint {
        let v = self.inner.digest128();
        ProgramFingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/fingerprint.rs"]
mod tests;
