use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use blob_visualizer::export::{HtmlSnapshot, export_html, write_frame};
use blob_visualizer::prefs::ParamFile;
use blob_visualizer::shading::{
    AnimationState, FrameInput, ParamStore, ShaderEngine, make_presets, select_preset,
};
use clap::Parser;

const DEFAULT_OUT_DIR: &str = "frames";
const DEFAULT_SEED: f32 = 42.0;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "export_frames",
    version,
    about = "Offline blob export (numbered PNG frames, optional HTML snapshot)"
)]
pub(crate) struct Cli {
    #[arg(long, value_name = "DIR", default_value = DEFAULT_OUT_DIR)]
    pub(crate) out: PathBuf,

    #[arg(long, default_value_t = 640)]
    pub(crate) width: usize,

    #[arg(long, default_value_t = 480)]
    pub(crate) height: usize,

    #[arg(long, default_value_t = 30)]
    pub(crate) fps: u32,

    #[arg(long, value_name = "SECONDS", default_value_t = 2.0)]
    pub(crate) duration: f32,

    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub(crate) seed: f32,

    #[arg(long, value_name = "INDEX_OR_SUBSTRING")]
    pub(crate) preset: Option<String>,

    /// Parameter file layered over the preset defaults.
    #[arg(long, value_name = "FILE")]
    pub(crate) params: Option<PathBuf>,

    /// Also write `snapshot.html` for the last frame.
    #[arg(long, default_value_t = false)]
    pub(crate) html: bool,

    #[arg(long, default_value_t = 0)]
    pub(crate) threads: usize,
}

pub(crate) fn compute_frame_count(duration_s: f32, fps: u32) -> usize {
    if !duration_s.is_finite() {
        return 1;
    }
    ((duration_s.max(0.0) * fps as f32).floor() as usize).max(1)
}

pub(crate) fn frame_file_name(index: usize) -> String {
    format!("frame_{index:05}.png")
}

pub(crate) fn validate_args(args: &Cli) -> Result<()> {
    if args.width == 0 {
        bail!("--width must be >= 1");
    }
    if args.height == 0 {
        bail!("--height must be >= 1");
    }
    if args.fps == 0 {
        bail!("--fps must be >= 1");
    }
    if !(args.duration.is_finite() && args.duration > 0.0) {
        bail!("--duration must be > 0 seconds");
    }
    if !args.seed.is_finite() {
        bail!("--seed must be finite");
    }
    Ok(())
}

fn main() -> Result<()> {
    blob_visualizer::telemetry::init_stderr()?;
    let args = Cli::parse();
    run(args)
}

fn run(args: Cli) -> Result<()> {
    validate_args(&args)?;

    let presets = make_presets();
    let active = match args.preset.as_deref() {
        None => 0,
        Some(q) => select_preset(Some(q), &presets)
            .with_context(|| format!("no preset matches {q:?}"))?,
    };
    let preset = &presets[active];
    let file = ParamFile::load(args.params.as_deref(), &preset.defaults())
        .context("load --params file")?;
    let store = ParamStore::new(file.params, preset.ranges);
    let params = *store.current();

    fs::create_dir_all(&args.out)
        .with_context(|| format!("create output directory {}", args.out.display()))?;

    let frame_count = compute_frame_count(args.duration, args.fps);
    let dt = 1.0 / args.fps as f32;
    let mut anim = AnimationState::new(args.seed);
    let mut engine = ShaderEngine::new(args.threads);
    engine.resize(args.width, args.height);
    tracing::info!(
        preset = preset.name,
        frames = frame_count,
        workers = engine.workers(),
        "export starting"
    );

    let started = Instant::now();
    let mut last = None;
    for i in 0..frame_count {
        let input = FrameInput {
            time: anim.elapsed(),
            seed: anim.seed(),
            params,
            formula: preset.formula,
            scale: 1,
        };
        let rgba = engine.render(&input);
        let path = args.out.join(frame_file_name(i));
        write_frame(&path, args.width, args.height, rgba)?;
        anim.advance(dt, params.speed);
        last = Some(input);
    }

    if args.html {
        if let Some(input) = last {
            let html = export_html(&HtmlSnapshot {
                preset: preset.name,
                formula: preset.formula.label(),
                seed: input.seed,
                time: input.time,
                params: &input.params,
                width: args.width,
                height: args.height,
                rgba: engine.straight(),
            })?;
            let path = args.out.join("snapshot.html");
            fs::write(&path, html).with_context(|| format!("write {}", path.display()))?;
        }
    }

    tracing::info!(elapsed_ms = started.elapsed().as_millis() as u64, "export finished");
    println!(
        "exported {} frames ({}x{}, preset {}) -> {}",
        frame_count,
        args.width,
        args.height,
        preset.name,
        args.out.display()
    );
    Ok(())
}
