use crate::shading::ShaderParams;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "blob-visualizer",
    version,
    about = "Animated noise-blob shader rendered in the terminal"
)]
pub struct Config {
    #[arg(long, value_enum, default_value_t = RendererMode::HalfBlock)]
    pub renderer: RendererMode,

    #[arg(long, default_value_t = 30)]
    pub fps: u32,

    /// Print the preset names and exit.
    #[arg(long, default_value_t = false)]
    pub list_presets: bool,

    /// Preset index or name substring.
    #[arg(long)]
    pub preset: Option<String>,

    /// Fixed seed; random in [0, 1000) when omitted.
    #[arg(long)]
    pub seed: Option<f32>,

    /// Parameter file (key=value). Defaults to the per-user config path.
    #[arg(long, value_name = "FILE")]
    pub params: Option<PathBuf>,

    #[arg(long)]
    pub speed: Option<f32>,

    #[arg(long)]
    pub complexity: Option<f32>,

    #[arg(long)]
    pub color_intensity: Option<f32>,

    #[arg(long)]
    pub grain_amount: Option<f32>,

    #[arg(long)]
    pub sphere_effect: Option<f32>,

    #[arg(long)]
    pub layer_compression: Option<f32>,

    /// Shading worker threads; 0 uses all available cores.
    #[arg(long, default_value_t = 0)]
    pub threads: usize,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub adaptive_scale: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub aspect_correct: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub auto_probe: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub sync_updates: bool,

    /// Directory for HTML snapshots exported from the viewer.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub export_dir: PathBuf,

    /// Write logs here; the viewer discards them otherwise.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RendererMode {
    #[value(alias = "ansi", alias = "text")]
    Ascii,
    #[value(name = "half-block", alias = "halfblock", alias = "half_block", alias = "hb")]
    HalfBlock,
    Kitty,
}

impl Config {
    /// Command-line values win over preset and file values.
    pub fn apply_overrides(&self, params: &mut ShaderParams) {
        let overrides = [
            (self.speed, &mut params.speed),
            (self.complexity, &mut params.complexity),
            (self.color_intensity, &mut params.color_intensity),
            (self.grain_amount, &mut params.grain_amount),
            (self.sphere_effect, &mut params.sphere_effect),
            (self.layer_compression, &mut params.layer_compression),
        ];
        for (value, slot) in overrides {
            if let Some(v) = value {
                *slot = v;
            }
        }
    }
}
