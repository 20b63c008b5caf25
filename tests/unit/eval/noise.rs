use super::*;

fn samples() -> impl Iterator<Item = Vec3> {
    (0..400).map(|i| {
        let t = i as f32;
        Vec3::new(t * 0.173 - 13.0, t * 0.091 + 2.5, (t * 0.37).sin() * 9.0)
    })
}

#[test]
fn perlin_vanishes_on_lattice_points() {
    for p in [
        Vec3::ZERO,
        Vec3::new(1.0, 2.0, 3.0),
        Vec3::new(-4.0, 7.0, -1.0),
    ] {
        assert!(cnoise(p).abs() < 1e-6, "cnoise({p}) = {}", cnoise(p));
    }
}

#[test]
fn noise_stays_in_a_bounded_range() {
    for p in samples() {
        let c = cnoise(p);
        let s = snoise(p);
        assert!(c.is_finite() && c.abs() < 1.5, "cnoise({p}) = {c}");
        assert!(s.is_finite() && s.abs() < 1.5, "snoise({p}) = {s}");
    }
}

#[test]
fn noise_is_not_constant() {
    let values: Vec<f32> = samples().map(snoise).collect();
    let min = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    assert!(max - min > 0.5);
}

#[test]
fn periodic_noise_tiles() {
    let rep = Vec3::new(4.0, 4.0, 4.0);
    for p in samples().take(50) {
        let a = pnoise(p, rep);
        let b = pnoise(p + rep, rep);
        assert!((a - b).abs() < 1e-3, "{a} vs {b} at {p}");
    }
}

#[test]
fn srdnoise_derivative_matches_finite_difference() {
    let h = 1e-3;
    for &(x, y, rot) in &[(0.3f32, 0.2f32, 0.0f32), (1.7, -2.4, 0.5), (-3.1, 5.6, 2.0)] {
        let v = srdnoise(Vec2::new(x, y), rot);
        let dx = (srdnoise(Vec2::new(x + h, y), rot).x - srdnoise(Vec2::new(x - h, y), rot).x)
            / (2.0 * h);
        let dy = (srdnoise(Vec2::new(x, y + h), rot).x - srdnoise(Vec2::new(x, y - h), rot).x)
            / (2.0 * h);
        assert!((v.y - dx).abs() < 0.05, "d/dx {} vs {dx}", v.y);
        assert!((v.z - dy).abs() < 0.05, "d/dy {} vs {dy}", v.z);
    }
}

#[test]
fn fbm_single_octave_is_simplex() {
    let p = Vec3::new(0.4, -1.3, 2.2);
    assert_eq!(fbm(p, 1.0, 1, 2.0), snoise(p));
    assert_eq!(fbm(p, 1.0, 0, 2.0), 0.0);
    assert_eq!(fbm(p, 1.0, -3, 2.0), 0.0);
}

#[test]
fn fbm_octaves_are_clamped() {
    let p = Vec3::new(0.1, 0.2, 0.3);
    assert_eq!(
        fbm(p, 0.5, MAX_FBM_OCTAVES, 2.0),
        fbm(p, 0.5, i32::MAX, 2.0)
    );
}
