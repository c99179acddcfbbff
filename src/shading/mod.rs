mod compositor;
mod engine;
mod noise;
mod params;
mod presets;

pub use compositor::{
    Composite, DEFAULT_ASPECT, Rgba, ShapeFormula, composite, shade, sphere_distance, surface_coord,
};
pub use engine::{AnimationState, FrameInput, ParamStore, ShaderEngine, random_seed};
pub use noise::{Vec2, mix, noise2d, rotate, smoothstep, snoise};
pub use params::{
    ColorError, ColorFamily, ColorSlot, Palette, ParamId, ParamRange, ParamRanges, Rgb,
    ShaderParams, parse_color, parse_color_or_black,
};
pub use presets::{Preset, make_presets, select_preset};
