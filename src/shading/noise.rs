//! Gradient noise and the small vector helpers the compositor is built on.
//!
//! `snoise` is a 2D simplex noise driven by the mod-289 permutation
//! polynomial, so it needs no lookup tables and is reproducible for any
//! input without per-instance state.

use std::ops::{Add, Mul, Neg, Sub};

/// Skew factor `(3 - sqrt(3)) / 6`.
const SKEW_G2: f32 = 0.211_324_87;
/// Unskew factor `(sqrt(3) - 1) / 2`.
const SKEW_F2: f32 = 0.366_025_4;
/// `-1 + 2 * G2`.
const SKEW_C: f32 = -0.577_350_26;
/// `1 / 41`, maps permutation output onto 41 gradient directions.
const GRAD_STEP: f32 = 0.024_390_243;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const fn splat(v: f32) -> Self {
        Self { x: v, y: v }
    }

    pub fn dot(self, o: Self) -> f32 {
        self.x * o.x + self.y * o.y
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, o: Self) -> Self {
        Self::new(self.x + o.x, self.y + o.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, o: Self) -> Self {
        Self::new(self.x - o.x, self.y - o.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, s: f32) -> Self {
        Self::new(self.x * s, self.y * s)
    }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

#[inline]
fn mod289(x: f32) -> f32 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

#[inline]
fn permute(x: f32) -> f32 {
    mod289((x * 34.0 + 1.0) * x)
}

#[inline]
fn fract(x: f32) -> f32 {
    x - x.floor()
}

/// 2D simplex gradient noise, output in [-1, 1].
///
/// Non-finite input returns 0 so a bad coordinate degrades to a flat sample
/// instead of poisoning the whole composite.
pub fn snoise(v: Vec2) -> f32 {
    if !v.is_finite() {
        return 0.0;
    }

    // First corner.
    let skew = (v.x + v.y) * SKEW_F2;
    let ix = (v.x + skew).floor();
    let iy = (v.y + skew).floor();
    let unskew = (ix + iy) * SKEW_G2;
    let x0 = Vec2::new(v.x - ix + unskew, v.y - iy + unskew);

    // Other corners.
    let (i1x, i1y) = if x0.x > x0.y { (1.0, 0.0) } else { (0.0, 1.0) };
    let x1 = Vec2::new(x0.x + SKEW_G2 - i1x, x0.y + SKEW_G2 - i1y);
    let x2 = Vec2::new(x0.x + SKEW_C, x0.y + SKEW_C);

    let ix = mod289(ix);
    let iy = mod289(iy);
    let p = [
        permute(permute(iy) + ix),
        permute(permute(iy + i1y) + ix + i1x),
        permute(permute(iy + 1.0) + ix + 1.0),
    ];

    let corners = [x0, x1, x2];
    let mut total = 0.0f32;
    for (corner, hash) in corners.iter().zip(p) {
        let falloff = (0.5 - corner.dot(*corner)).max(0.0);
        if falloff == 0.0 {
            continue;
        }
        let m = falloff * falloff * falloff * falloff;

        // Gradients are 41 points on a line, mapped onto a diamond.
        let gx = 2.0 * fract(hash * GRAD_STEP) - 1.0;
        let h = gx.abs() - 0.5;
        let a0 = gx - (gx + 0.5).floor();
        let norm = 1.792_842_9 - 0.853_734_7 * (a0 * a0 + h * h);

        total += m * norm * (a0 * corner.x + h * corner.y);
    }

    (130.0 * total).clamp(-1.0, 1.0)
}

/// One octave: `snoise(point * scale + offset)`.
pub fn noise2d(point: Vec2, scale: f32, offset: Vec2) -> f32 {
    snoise(point * scale + offset)
}

/// Rotates `v` by `angle` radians. Matches `mat2(c, -s, s, c) * v`.
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    let (s, c) = angle.sin_cos();
    Vec2::new(c * v.x + s * v.y, -s * v.x + c * v.y)
}

/// Saturating Hermite threshold. Reversed edges (`e0 > e1`) invert the ramp.
pub fn smoothstep(e0: f32, e1: f32, x: f32) -> f32 {
    let span = e1 - e0;
    if span == 0.0 {
        return if x < e0 { 0.0 } else { 1.0 };
    }
    let t = ((x - e0) / span).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[inline]
pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
