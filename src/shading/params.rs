//! Parameter snapshot consumed by the compositor, plus color parsing.

use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);
    pub const MID_GRAY: Self = Self::new(0.5, 0.5, 0.5);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn mix(self, o: Self, t: f32) -> Self {
        Self::new(
            self.r + (o.r - self.r) * t,
            self.g + (o.g - self.g) * t,
            self.b + (o.b - self.b) * t,
        )
    }

    pub fn add_scalar(self, v: f32) -> Self {
        Self::new(self.r + v, self.g + v, self.b + v)
    }

    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }

    pub fn to_u8(self) -> [u8; 3] {
        [unit_to_u8(self.r), unit_to_u8(self.g), unit_to_u8(self.b)]
    }

    pub fn to_hex(self) -> String {
        let [r, g, b] = self.to_u8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

pub(crate) fn unit_to_u8(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("invalid color format '{0}': expected #rrggbb")]
    InvalidColorFormat(String),
}

/// Parses `#rrggbb` or `rrggbb` (any case) into unit RGB.
pub fn parse_color(hex: &str) -> Result<Rgb, ColorError> {
    let raw = hex.trim();
    let digits = raw.strip_prefix('#').unwrap_or(raw);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ColorError::InvalidColorFormat(raw.to_string()));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .map(|v| v as f32 / 255.0)
            .map_err(|_| ColorError::InvalidColorFormat(raw.to_string()))
    };
    Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
}

/// Picker-facing variant: malformed input becomes black.
pub fn parse_color_or_black(hex: &str) -> Rgb {
    parse_color(hex).unwrap_or(Rgb::BLACK)
}

/// One hue family; only `darkest` and `main` are stored, the rest derive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorFamily {
    pub darkest: Rgb,
    pub main: Rgb,
}

impl ColorFamily {
    pub const STOP_RATIO: f32 = 0.3;

    pub const fn new(darkest: Rgb, main: Rgb) -> Self {
        Self { darkest, main }
    }

    pub fn dark(&self) -> Rgb {
        self.darkest.mix(self.main, Self::STOP_RATIO)
    }

    pub fn light(&self) -> Rgb {
        self.main.mix(Rgb::WHITE, Self::STOP_RATIO)
    }

    /// darkest -> dark -> main -> light
    pub fn stops(&self) -> [Rgb; 4] {
        [self.darkest, self.dark(), self.main, self.light()]
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    pub green: ColorFamily,
    pub orange: ColorFamily,
    pub sand: ColorFamily,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            green: ColorFamily::new(
                parse_color_or_black("#336622"),
                parse_color_or_black("#52cc38"),
            ),
            orange: ColorFamily::new(
                parse_color_or_black("#b26608"),
                parse_color_or_black("#ff8c19"),
            ),
            sand: ColorFamily::new(
                parse_color_or_black("#bfa659"),
                parse_color_or_black("#fad98c"),
            ),
        }
    }
}

impl Palette {
    pub fn get(&self, slot: ColorSlot) -> Rgb {
        match slot {
            ColorSlot::DarkestGreen => self.green.darkest,
            ColorSlot::MainGreen => self.green.main,
            ColorSlot::DarkestOrange => self.orange.darkest,
            ColorSlot::MainOrange => self.orange.main,
            ColorSlot::DarkestSand => self.sand.darkest,
            ColorSlot::MainSand => self.sand.main,
        }
    }

    pub fn set(&mut self, slot: ColorSlot, c: Rgb) {
        match slot {
            ColorSlot::DarkestGreen => self.green.darkest = c,
            ColorSlot::MainGreen => self.green.main = c,
            ColorSlot::DarkestOrange => self.orange.darkest = c,
            ColorSlot::MainOrange => self.orange.main = c,
            ColorSlot::DarkestSand => self.sand.darkest = c,
            ColorSlot::MainSand => self.sand.main = c,
        }
    }

    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        for slot in ColorSlot::all() {
            let c = self.get(slot);
            let fixed = if c.is_finite() {
                Rgb::new(c.r.clamp(0.0, 1.0), c.g.clamp(0.0, 1.0), c.b.clamp(0.0, 1.0))
            } else {
                defaults.get(slot)
            };
            self.set(slot, fixed);
        }
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorSlot {
    DarkestGreen,
    MainGreen,
    DarkestOrange,
    MainOrange,
    DarkestSand,
    MainSand,
}

impl ColorSlot {
    pub const fn all() -> [Self; 6] {
        [
            Self::DarkestGreen,
            Self::MainGreen,
            Self::DarkestOrange,
            Self::MainOrange,
            Self::DarkestSand,
            Self::MainSand,
        ]
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::DarkestGreen => "darkest_green",
            Self::MainGreen => "main_green",
            Self::DarkestOrange => "darkest_orange",
            Self::MainOrange => "main_orange",
            Self::DarkestSand => "darkest_sand",
            Self::MainSand => "main_sand",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::DarkestGreen => "Darkest Green",
            Self::MainGreen => "Main Green",
            Self::DarkestOrange => "Darkest Orange",
            Self::MainOrange => "Main Orange",
            Self::DarkestSand => "Darkest Sand",
            Self::MainSand => "Main Sand",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::all().into_iter().find(|s| s.key() == key)
    }

    pub fn next(self) -> Self {
        let all = Self::all();
        let idx = all.iter().position(|s| *s == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamId {
    Speed,
    Complexity,
    ColorIntensity,
    GrainAmount,
    SphereEffect,
    LayerCompression,
}

impl ParamId {
    pub const fn all() -> [Self; 6] {
        [
            Self::SphereEffect,
            Self::LayerCompression,
            Self::Speed,
            Self::Complexity,
            Self::ColorIntensity,
            Self::GrainAmount,
        ]
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Speed => "speed",
            Self::Complexity => "complexity",
            Self::ColorIntensity => "color_intensity",
            Self::GrainAmount => "grain_amount",
            Self::SphereEffect => "sphere_effect",
            Self::LayerCompression => "layer_compression",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Speed => "Speed",
            Self::Complexity => "Complexity",
            Self::ColorIntensity => "Color Intensity",
            Self::GrainAmount => "Grain",
            Self::SphereEffect => "Sphere Effect",
            Self::LayerCompression => "Layer Compression",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::all().into_iter().find(|p| p.key() == key)
    }

    pub fn next(self) -> Self {
        let all = Self::all();
        let idx = all.iter().position(|p| *p == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }

    pub fn prev(self) -> Self {
        let all = Self::all();
        let idx = all.iter().position(|p| *p == self).unwrap_or(0);
        all[(idx + all.len() - 1) % all.len()]
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl ParamRange {
    pub const fn new(min: f32, max: f32, step: f32) -> Self {
        Self { min, max, step }
    }

    pub fn clamp(&self, v: f32) -> f32 {
        v.clamp(self.min, self.max)
    }

    /// Locked ranges (`min == max`) have no control on the panel.
    pub fn is_locked(&self) -> bool {
        self.min >= self.max
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamRanges {
    pub speed: ParamRange,
    pub complexity: ParamRange,
    pub color_intensity: ParamRange,
    pub grain_amount: ParamRange,
    pub sphere_effect: ParamRange,
    pub layer_compression: ParamRange,
}

impl Default for ParamRanges {
    fn default() -> Self {
        Self {
            speed: ParamRange::new(0.1, 3.0, 0.05),
            complexity: ParamRange::new(0.1, 2.0, 0.05),
            color_intensity: ParamRange::new(0.1, 2.0, 0.05),
            grain_amount: ParamRange::new(0.0, 2.0, 0.05),
            sphere_effect: ParamRange::new(0.0, 1.0, 0.02),
            layer_compression: ParamRange::new(0.0, 1.0, 0.02),
        }
    }
}

impl ParamRanges {
    pub fn get(&self, id: ParamId) -> ParamRange {
        match id {
            ParamId::Speed => self.speed,
            ParamId::Complexity => self.complexity,
            ParamId::ColorIntensity => self.color_intensity,
            ParamId::GrainAmount => self.grain_amount,
            ParamId::SphereEffect => self.sphere_effect,
            ParamId::LayerCompression => self.layer_compression,
        }
    }
}

/// Immutable per-frame snapshot read by the compositor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShaderParams {
    pub speed: f32,
    pub complexity: f32,
    pub color_intensity: f32,
    pub grain_amount: f32,
    pub sphere_effect: f32,
    pub layer_compression: f32,
    pub palette: Palette,
}

impl Default for ShaderParams {
    fn default() -> Self {
        Self {
            speed: 1.0,
            complexity: 1.0,
            color_intensity: 1.0,
            grain_amount: 1.0,
            sphere_effect: 0.0,
            layer_compression: 0.0,
            palette: Palette::default(),
        }
    }
}

impl ShaderParams {
    pub fn get(&self, id: ParamId) -> f32 {
        match id {
            ParamId::Speed => self.speed,
            ParamId::Complexity => self.complexity,
            ParamId::ColorIntensity => self.color_intensity,
            ParamId::GrainAmount => self.grain_amount,
            ParamId::SphereEffect => self.sphere_effect,
            ParamId::LayerCompression => self.layer_compression,
        }
    }

    pub fn set(&mut self, id: ParamId, v: f32) {
        match id {
            ParamId::Speed => self.speed = v,
            ParamId::Complexity => self.complexity = v,
            ParamId::ColorIntensity => self.color_intensity = v,
            ParamId::GrainAmount => self.grain_amount = v,
            ParamId::SphereEffect => self.sphere_effect = v,
            ParamId::LayerCompression => self.layer_compression = v,
        }
    }

    /// Clamps every control into `ranges`; non-finite values fall back to
    /// the default clamped into range.
    pub fn sanitized(&self, ranges: &ParamRanges) -> Self {
        let defaults = Self::default();
        let mut out = *self;
        for id in ParamId::all() {
            let range = ranges.get(id);
            let v = self.get(id);
            let v = if v.is_finite() { v } else { defaults.get(id) };
            out.set(id, range.clamp(v));
        }
        out.palette = self.palette.sanitized();
        out
    }
}
