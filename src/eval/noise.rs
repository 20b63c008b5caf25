//! Gradient noise over `glam` vectors: classic and periodic Perlin, simplex, rotating simplex
//! with analytic derivatives, and simplex fBm.
//!
//! Ports of the Ashima Arts / Stefan Gustavson webgl-noise formulations (MIT), so results line
//! up with shader code using the same functions.

use glam::{Vec2, Vec3, Vec4};

/// Upper bound on fBm octaves; keeps every evaluation bounded regardless of inputs.
pub const MAX_FBM_OCTAVES: i32 = 16;

fn mod289_3(x: Vec3) -> Vec3 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn mod289_4(x: Vec4) -> Vec4 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn permute3(x: Vec3) -> Vec3 {
    mod289_3((x * 34.0 + Vec3::ONE) * x)
}

fn permute4(x: Vec4) -> Vec4 {
    mod289_4((x * 34.0 + Vec4::ONE) * x)
}

// First-order Taylor approximation of 1/sqrt(|g|^2), applied as in the reference shaders.
fn normalize_approx(g: Vec3) -> Vec3 {
    g * (1.792_842_9 - 0.853_734_7 * g.length_squared())
}

fn fade(t: Vec3) -> Vec3 {
    t * t * t * (t * (t * 6.0 - Vec3::splat(15.0)) + Vec3::splat(10.0))
}

fn fract4(v: Vec4) -> Vec4 {
    v - v.floor()
}

fn gl_mod(x: Vec3, y: Vec3) -> Vec3 {
    x - y * (x / y).floor()
}

/// Lattice gradients for the four xy corners sharing one z slice.
fn perlin_gradients(hash: Vec4) -> [Vec3; 4] {
    let gx = hash * (1.0 / 7.0);
    let gy = fract4(gx.floor() * (1.0 / 7.0)) - Vec4::splat(0.5);
    let gx = fract4(gx);
    let gz = Vec4::splat(0.5) - gx.abs() - gy.abs();

    let mut out = [Vec3::ZERO; 4];
    for (k, g) in out.iter_mut().enumerate() {
        let (mut x, mut y, z) = (gx[k], gy[k], gz[k]);
        if z <= 0.0 {
            x -= if x >= 0.0 { 0.5 } else { -0.5 };
            y -= if y >= 0.0 { 0.5 } else { -0.5 };
        }
        *g = normalize_approx(Vec3::new(x, y, z));
    }
    out
}

fn perlin(p: Vec3, period: Option<Vec3>) -> f32 {
    let mut pi0 = p.floor();
    let mut pi1 = pi0 + Vec3::ONE;
    if let Some(rep) = period {
        pi0 = gl_mod(pi0, rep);
        pi1 = gl_mod(pi1, rep);
    }
    let pi0 = mod289_3(pi0);
    let pi1 = mod289_3(pi1);
    let pf0 = p - p.floor();
    let pf1 = pf0 - Vec3::ONE;

    let ix = Vec4::new(pi0.x, pi1.x, pi0.x, pi1.x);
    let iy = Vec4::new(pi0.y, pi0.y, pi1.y, pi1.y);
    let ixy = permute4(permute4(ix) + iy);
    let g0 = perlin_gradients(permute4(ixy + Vec4::splat(pi0.z)));
    let g1 = perlin_gradients(permute4(ixy + Vec4::splat(pi1.z)));

    let mut n0 = [0.0f32; 4];
    let mut n1 = [0.0f32; 4];
    for k in 0..4 {
        let x = if k & 1 == 0 { pf0.x } else { pf1.x };
        let y = if k & 2 == 0 { pf0.y } else { pf1.y };
        n0[k] = g0[k].dot(Vec3::new(x, y, pf0.z));
        n1[k] = g1[k].dot(Vec3::new(x, y, pf1.z));
    }

    let f = fade(pf0);
    let n_z = Vec4::from(n0).lerp(Vec4::from(n1), f.z);
    let n_yz = Vec2::new(n_z.x, n_z.y).lerp(Vec2::new(n_z.z, n_z.w), f.y);
    2.2 * (n_yz.x + (n_yz.y - n_yz.x) * f.x)
}

/// Classic Perlin noise, roughly in `[-1, 1]`.
pub fn cnoise(p: Vec3) -> f32 {
    perlin(p, None)
}

/// Classic Perlin noise tiling with period `rep` on each axis.
pub fn pnoise(p: Vec3, rep: Vec3) -> f32 {
    perlin(p, Some(rep))
}

/// Simplex noise, roughly in `[-1, 1]`.
pub fn snoise(v: Vec3) -> f32 {
    const SKEW: f32 = 1.0 / 3.0;
    const UNSKEW: f32 = 1.0 / 6.0;

    let i = (v + Vec3::splat(v.dot(Vec3::splat(SKEW)))).floor();
    let x0 = v - i + Vec3::splat(i.dot(Vec3::splat(UNSKEW)));

    let step = |edge: f32, x: f32| if x >= edge { 1.0 } else { 0.0 };
    let g = Vec3::new(step(x0.y, x0.x), step(x0.z, x0.y), step(x0.x, x0.z));
    let l = Vec3::ONE - g;
    let l_zxy = Vec3::new(l.z, l.x, l.y);
    let i1 = g.min(l_zxy);
    let i2 = g.max(l_zxy);

    let corners = [
        x0,
        x0 - i1 + Vec3::splat(UNSKEW),
        x0 - i2 + Vec3::splat(SKEW),
        x0 - Vec3::splat(0.5),
    ];

    let i = mod289_3(i);
    let p = permute4(
        permute4(
            permute4(Vec4::splat(i.z) + Vec4::new(0.0, i1.z, i2.z, 1.0))
                + Vec4::splat(i.y)
                + Vec4::new(0.0, i1.y, i2.y, 1.0),
        ) + Vec4::splat(i.x)
            + Vec4::new(0.0, i1.x, i2.x, 1.0),
    );

    // Gradients on a 7x7 grid folded onto an octahedron.
    let ns = Vec3::new(2.0 / 7.0, 0.5 / 7.0 - 1.0, 1.0 / 7.0);
    let j = p - (p * ns.z * ns.z).floor() * 49.0;
    let x_ = (j * ns.z).floor();
    let y_ = (j - x_ * 7.0).floor();
    let x = x_ * ns.x + Vec4::splat(ns.y);
    let y = y_ * ns.x + Vec4::splat(ns.y);
    let h = Vec4::ONE - x.abs() - y.abs();

    let mut total = 0.0;
    for (k, corner) in corners.iter().enumerate() {
        let sh = if h[k] <= 0.0 { -1.0 } else { 0.0 };
        let gx = x[k] + (x[k].floor() * 2.0 + 1.0) * sh;
        let gy = y[k] + (y[k].floor() * 2.0 + 1.0) * sh;
        let grad = normalize_approx(Vec3::new(gx, gy, h[k]));

        let m = (0.6 - corner.length_squared()).max(0.0);
        let m2 = m * m;
        total += m2 * m2 * grad.dot(*corner);
    }
    42.0 * total
}

/// 2D simplex noise with rotating gradients.
///
/// Returns `(n, dn/dx, dn/dy)`; `rot` spins every gradient by the same angle, which animates the
/// pattern without translating it.
pub fn srdnoise(pos: Vec2, rot: f32) -> Vec3 {
    // Nudge off the lattice to hide rare artifacts on exact grid lines.
    let pos = Vec2::new(pos.x, pos.y + 0.001);

    let uv = Vec2::new(pos.x + pos.y * 0.5, pos.y);
    let i0 = uv.floor();
    let f0 = uv - i0;
    let i1 = if f0.x > f0.y { Vec2::X } else { Vec2::Y };

    let p0 = Vec2::new(i0.x - i0.y * 0.5, i0.y);
    let p1 = Vec2::new(p0.x + i1.x - i1.y * 0.5, p0.y + i1.y);
    let p2 = Vec2::new(p0.x + 0.5, p0.y + 1.0);
    let d = [pos - p0, pos - p1, pos - p2];

    let x = Vec3::new(p0.x, p1.x, p2.x);
    let y = Vec3::new(p0.y, p1.y, p2.y);
    let iuw = mod289_3(x + y * 0.5);
    let ivw = mod289_3(y);
    let hash = permute3(permute3(iuw) + ivw);
    let psi = hash * 0.07482 + Vec3::splat(rot);

    let mut n = 0.0;
    let mut grad = Vec2::ZERO;
    for (k, dk) in d.iter().enumerate() {
        let g = Vec2::new(psi[k].cos(), psi[k].sin());
        let w = (0.8 - dk.length_squared()).max(0.0);
        let w2 = w * w;
        let w4 = w2 * w2;
        let gdotx = g.dot(*dk);
        n += w4 * gdotx;
        grad += g * w4 + *dk * (-8.0 * w2 * w * gdotx);
    }
    Vec3::new(n, grad.x, grad.y) * 10.9
}

/// Fractal sum of [`snoise`] octaves. Octave count is clamped to `0..=MAX_FBM_OCTAVES`.
pub fn fbm(pos: Vec3, persistence: f32, octaves: i32, lacunarity: f32) -> f32 {
    let gain = (-persistence).exp2();
    let mut frequency = 1.0;
    let mut amplitude = 1.0;
    let mut total = 0.0;
    for _ in 0..octaves.clamp(0, MAX_FBM_OCTAVES) {
        total += amplitude * snoise(pos * frequency);
        frequency *= lacunarity;
        amplitude *= gain;
    }
    total
}

#[cfg(test)]
#[path = "../../tests/unit/eval/noise.rs"]
mod tests;
