use crate::shading::compositor::ShapeFormula;
use crate::shading::params::{
    ColorFamily, Palette, ParamRange, ParamRanges, ShaderParams, parse_color_or_black,
};

/// A named variant: formula, starting values and the control ranges its
/// panel exposes.
#[derive(Clone, Debug, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub formula: ShapeFormula,
    pub params: ShaderParams,
    pub ranges: ParamRanges,
}

impl Preset {
    /// Default values for this preset, clamped into its own ranges.
    pub fn defaults(&self) -> ShaderParams {
        self.params.sanitized(&self.ranges)
    }
}

pub fn make_presets() -> Vec<Preset> {
    let mut v = Vec::new();

    v.push(Preset {
        name: "Meadow Blob",
        formula: ShapeFormula::Layered,
        params: ShaderParams::default(),
        ranges: ParamRanges::default(),
    });

    // Narrower sphere control: the warp saturates visibly past 0.5.
    let mut soft = ParamRanges::default();
    soft.sphere_effect = ParamRange::new(0.0, 0.5, 0.01);
    v.push(Preset {
        name: "Soft Sphere",
        formula: ShapeFormula::Layered,
        params: ShaderParams {
            sphere_effect: 0.25,
            layer_compression: 0.2,
            ..ShaderParams::default()
        },
        ranges: soft,
    });

    let mut flat = ParamRanges::default();
    flat.sphere_effect = ParamRange::new(0.0, 0.0, 0.0);
    flat.layer_compression = ParamRange::new(0.0, 0.0, 0.0);
    v.push(Preset {
        name: "Flat Blob",
        formula: ShapeFormula::Flat,
        params: ShaderParams::default(),
        ranges: flat,
    });

    v.push(Preset {
        name: "Ember Drift",
        formula: ShapeFormula::Layered,
        params: ShaderParams {
            speed: 1.6,
            complexity: 1.3,
            grain_amount: 0.6,
            sphere_effect: 0.4,
            layer_compression: 0.5,
            palette: Palette {
                green: ColorFamily::new(
                    parse_color_or_black("#5a1e0c"),
                    parse_color_or_black("#d2452a"),
                ),
                ..Palette::default()
            },
            ..ShaderParams::default()
        },
        ranges: ParamRanges::default(),
    });

    v
}

/// Resolves a preset by index or case-insensitive name substring.
pub fn select_preset(query: Option<&str>, presets: &[Preset]) -> Option<usize> {
    let q = query?.trim();
    if q.is_empty() {
        return None;
    }
    if let Ok(i) = q.parse::<usize>() {
        return (i < presets.len()).then_some(i);
    }
    let q = q.to_lowercase();
    presets
        .iter()
        .position(|p| p.name.to_lowercase().contains(&q))
}
