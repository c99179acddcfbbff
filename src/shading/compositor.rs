//! Blob mask, layered color blend and grain/edge post-processing.
//!
//! Every function here is pure: the same coordinate, time, seed and
//! parameters always give bit-identical output.

use crate::shading::noise::{Vec2, mix, noise2d, rotate, smoothstep};
use crate::shading::params::{ColorFamily, Rgb, ShaderParams, unit_to_u8};

/// Horizontal stretch applied to the surface coordinate.
pub const DEFAULT_ASPECT: f32 = 1.4;

/// Formula variants that shipped side by side. They are kept distinct
/// instead of being folded into one set of ranges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeFormula {
    /// Sphere warp and layer compression both active.
    Layered,
    /// No shape controls: sphere effect and compression are pinned at 0.
    Flat,
}

impl ShapeFormula {
    pub fn label(self) -> &'static str {
        match self {
            Self::Layered => "layered",
            Self::Flat => "flat",
        }
    }

    pub fn has_shape_controls(self) -> bool {
        matches!(self, Self::Layered)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub fn rgb(&self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }

    /// Straight-alpha composite over an opaque background.
    pub fn over(&self, bg: Rgb) -> Rgb {
        bg.mix(self.rgb(), self.a)
    }

    pub fn to_u8(&self) -> [u8; 4] {
        let [r, g, b] = self.rgb().to_u8();
        [r, g, b, unit_to_u8(self.a)]
    }
}

/// Intermediate values of one evaluation, exposed for inspection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Composite {
    pub distance: f32,
    pub modified_distance: f32,
    pub noise_sum: f32,
    pub mask: f32,
    pub grain: f32,
    pub edge_fade: f32,
    pub color: Rgba,
}

/// Maps a pixel centre to shape space: `[-1, 1]` on y, `[-aspect, aspect]` on x.
pub fn surface_coord(px: usize, py: usize, w: usize, h: usize, aspect: f32) -> Vec2 {
    let w = w.max(1) as f32;
    let h = h.max(1) as f32;
    let u = (px as f32 + 0.5) / w;
    // Texture space has v growing upwards.
    let v = 1.0 - (py as f32 + 0.5) / h;
    Vec2::new((u * 2.0 - 1.0) * aspect, v * 2.0 - 1.0)
}

/// Flat-to-spherical distance warp. `sphere = 0` returns `dist` unchanged.
pub fn sphere_distance(dist: f32, sphere: f32) -> f32 {
    if sphere == 0.0 {
        return dist;
    }
    mix(dist, dist.powf(2.0 - sphere), sphere)
}

pub fn shade(uv: Vec2, time: f32, seed: f32, params: &ShaderParams, formula: ShapeFormula) -> Rgba {
    composite(uv, time, seed, params, formula).color
}

pub fn composite(
    uv: Vec2,
    time: f32,
    seed: f32,
    params: &ShaderParams,
    formula: ShapeFormula,
) -> Composite {
    // Sanitized params already satisfy these bounds.
    let (sphere, compression) = if formula.has_shape_controls() {
        (
            finite_or(params.sphere_effect, 0.0).clamp(0.0, 1.0),
            finite_or(params.layer_compression, 0.0).clamp(0.0, 1.0),
        )
    } else {
        (0.0, 0.0)
    };
    let complexity = finite_or(params.complexity, 1.0).max(0.0);
    let intensity = finite_or(params.color_intensity, 1.0).max(0.0);
    let grain_amount = finite_or(params.grain_amount, 0.0).max(0.0);

    let t = time + seed;

    let dist = uv.length();
    let md = sphere_distance(dist, sphere);

    // Shape octaves on independently rotated domains.
    let rot1 = rotate(uv, t * 0.1);
    let rot2 = rotate(uv, -t * 0.15 + 1.0);
    let rot3 = rotate(uv, t * 0.08 - 0.5);

    let base = noise2d(
        Vec2::new(rot1.x * 0.8, rot1.y * 1.2),
        complexity,
        Vec2::new(t * 0.1, t * 0.15),
    ) * 0.7;
    let n2 = noise2d(
        Vec2::new(rot2.x * 1.5, rot2.y * 2.0),
        complexity,
        Vec2::new(t * 0.08, t * 0.12),
    ) * 0.4;
    let n3 = noise2d(
        Vec2::new(rot3.x * 2.2, rot3.y * 1.8),
        complexity,
        -Vec2::new(t * 0.05, t * 0.07),
    ) * 0.3;
    let n4 = noise2d(
        Vec2::new(uv.x * 2.5, uv.y * 2.3),
        complexity,
        Vec2::new((t * 0.2).sin(), (t * 0.2).cos()),
    ) * 0.25;

    let noise_sum = (base + n2 + n3 + n4) * (1.0 - compression * 0.5);
    let mask = smoothstep(1.1 - sphere * 0.5, 0.2 + sphere * 0.7, md + noise_sum);

    // Five color weights.
    let squeeze = 1.0 - compression * 0.3;
    let raw = [
        noise2d(rot1 * squeeze * 0.6, complexity, Vec2::splat(t * 0.07)),
        noise2d(rot2 * squeeze * 0.9, complexity, -Vec2::splat(t * 0.05)),
        noise2d(rot3 * squeeze * 1.2, complexity, Vec2::splat(t * 0.03)),
        noise2d(uv * (1.5 - compression * 0.5), complexity, -Vec2::splat(t * 0.04)),
        noise2d(rotate(uv, t * 0.05) * (1.8 - compression * 0.6), complexity, Vec2::ZERO),
    ];
    let sharp = 0.2 - compression * 0.1;
    let w = raw.map(|n| smoothstep(0.5 - sharp, 0.5 + sharp, n * 0.5 + 0.5));

    let p = &params.palette;
    let green = layer(&p.green, w[0], w[1], w[2]);
    let orange = layer(&p.orange, w[1], w[2], w[3]);
    let sand = layer(&p.sand, w[2], w[3], w[4]);

    let warm = orange.mix(sand, w[0] * 0.5 + w[1] * 0.3 + w[4] * 0.2);
    let mut color = warm.mix(green, w[2] * 0.4 + w[3] * 0.3 + w[4] * 0.3);

    color = Rgb::MID_GRAY.mix(color, intensity);

    // Multi-scale grain, fading outward.
    let fine = noise2d(uv, 400.0, Vec2::splat(t * 0.1)) * 0.12;
    let medium = noise2d(rot1, 200.0, -Vec2::splat(t * 0.05)) * 0.08;
    let large = noise2d(rot2, 100.0, Vec2::splat(t * 0.03)) * 0.05;
    let extra = noise2d(rot3, 150.0, -Vec2::splat(t * 0.04)) * 0.03;
    let grain_mask = smoothstep(1.2 - sphere * 0.2, 0.2 + sphere * 0.1, md);
    let grain = ((fine + medium + large + extra) * grain_amount).max(0.0) * grain_mask;
    color = color.add_scalar(grain);

    let edge_fade = smoothstep(0.4 - sphere * 0.3, 1.0, md);
    color = color.mix(Rgb::WHITE, edge_fade.powf(1.2 - sphere * 0.6));

    let alpha = mask * smoothstep(1.2 - sphere * 0.4, 0.0, md);

    Composite {
        distance: dist,
        modified_distance: md,
        noise_sum,
        mask,
        grain,
        edge_fade,
        color: fail_closed(color, alpha),
    }
}

/// darkest -> dark -> main -> light, one weight per step.
fn layer(family: &ColorFamily, w1: f32, w2: f32, w3: f32) -> Rgb {
    let [darkest, dark, main, light] = family.stops();
    darkest.mix(dark, w1).mix(main, w2).mix(light, w3)
}

fn finite_or(v: f32, fallback: f32) -> f32 {
    if v.is_finite() { v } else { fallback }
}

/// NaN color becomes white (the backdrop) and NaN alpha becomes transparent.
fn fail_closed(color: Rgb, alpha: f32) -> Rgba {
    let chan = |v: f32| if v.is_nan() { 1.0 } else { v.clamp(0.0, 1.0) };
    Rgba {
        r: chan(color.r),
        g: chan(color.g),
        b: chan(color.b),
        a: if alpha.is_nan() { 0.0 } else { alpha.clamp(0.0, 1.0) },
    }
}
