use crate::capability::probe_runtime;
use crate::config::{Config, RendererMode};
use crate::control::{ControlAction, ControlPanel, InputThread, control_channel};
use crate::export::{HtmlSnapshot, export_html};
use crate::prefs::{ParamFile, params_storage_path};
use crate::render::{AsciiRenderer, Frame, HalfBlockRenderer, KittyRenderer, Renderer};
use crate::shading::{
    AnimationState, FrameInput, ParamStore, Preset, ShaderEngine, ShaderParams, make_presets,
    select_preset,
};
use crate::telemetry;
use crate::terminal::TerminalGuard;
use anyhow::{Context, bail};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

const HUD_LINES: u16 = 3;
/// HUD line showing the control under the cursor.
const HUD_SELECTED_LINE: usize = 1;
const MAX_SCALE: usize = 4;

/// What the frame loop must do after an action has been applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    None,
    Relayout,
    Resize(u16, u16),
    Export,
    Quit,
}

/// Driver state between frames: preset, parameter buffers, animation clock
/// and panel flags. Holds no pixels.
pub struct Viewer {
    presets: Vec<Preset>,
    active: usize,
    store: ParamStore,
    anim: AnimationState,
    panel: ControlPanel,
    paused: bool,
    show_hud: bool,
    show_help: bool,
    params_path: Option<PathBuf>,
    export_dir: PathBuf,
    status: String,
}

impl Viewer {
    pub fn new(
        presets: Vec<Preset>,
        active: usize,
        params: ShaderParams,
        seed: f32,
    ) -> anyhow::Result<Self> {
        let Some(preset) = presets.get(active) else {
            bail!("preset index {active} out of range ({} presets)", presets.len());
        };
        let store = ParamStore::new(params, preset.ranges);
        let mut panel = ControlPanel::default();
        panel.revalidate(store.ranges());
        Ok(Self {
            presets,
            active,
            store,
            anim: AnimationState::new(seed),
            panel,
            paused: false,
            show_hud: true,
            show_help: false,
            params_path: None,
            export_dir: PathBuf::from("."),
            status: String::from("? for help"),
        })
    }

    pub fn with_params_path(mut self, path: Option<PathBuf>) -> Self {
        self.params_path = path;
        self
    }

    pub fn with_export_dir(mut self, dir: PathBuf) -> Self {
        self.export_dir = dir;
        self
    }

    pub fn preset(&self) -> &Preset {
        &self.presets[self.active]
    }

    pub fn active_preset(&self) -> usize {
        self.active
    }

    pub fn params(&self) -> &ParamStore {
        &self.store
    }

    pub fn animation(&self) -> &AnimationState {
        &self.anim
    }

    pub fn panel(&self) -> &ControlPanel {
        &self.panel
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn show_hud(&self) -> bool {
        self.show_hud
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Applies one control action. Parameter edits land in the pending
    /// buffer and become visible at the next [`Viewer::begin_frame`].
    pub fn handle(&mut self, action: ControlAction) -> Outcome {
        let ranges = *self.store.ranges();
        if self.panel.apply(action, self.store.pending_mut(), &ranges) {
            if let ControlAction::SetColor(c) = action {
                self.status = format!("{} {}", self.panel.color_slot.label(), c.to_hex());
            }
            return Outcome::None;
        }

        match action {
            ControlAction::Regenerate => {
                let seed = self.anim.regenerate_seed();
                tracing::info!(seed, "seed regenerated");
                self.status = format!("new seed {seed:.1}");
            }
            ControlAction::ResetDefaults => {
                let defaults = self.preset().defaults();
                *self.store.pending_mut() = defaults;
                self.status = format!("reset {}", self.preset().name);
            }
            ControlAction::NextPreset => {
                self.switch_preset((self.active + 1) % self.presets.len());
            }
            ControlAction::PrevPreset => {
                self.switch_preset((self.active + self.presets.len() - 1) % self.presets.len());
            }
            ControlAction::TogglePause => {
                self.paused = !self.paused;
            }
            ControlAction::ToggleHud => {
                self.show_hud = !self.show_hud;
                return Outcome::Relayout;
            }
            ControlAction::ToggleHelp => {
                self.show_help = !self.show_help;
            }
            ControlAction::ColorEntry(Some(entry)) => {
                let slot = self.panel.color_slot.label();
                self.status = format!("{slot} #{}_ (enter to apply)", entry.as_str());
            }
            ControlAction::ColorEntry(None) => {
                self.status = String::from("color entry cancelled");
            }
            ControlAction::SaveParams => {
                self.status = match self.save_params() {
                    Ok(path) => format!("saved {}", path.display()),
                    Err(err) => {
                        tracing::warn!("save params failed: {err:#}");
                        format!("save failed: {err}")
                    }
                };
            }
            ControlAction::ExportHtml => return Outcome::Export,
            ControlAction::Resize(c, r) => return Outcome::Resize(c, r),
            ControlAction::Quit => return Outcome::Quit,
            _ => {}
        }
        Outcome::None
    }

    fn switch_preset(&mut self, idx: usize) {
        self.active = idx;
        let preset = &self.presets[idx];
        self.store.load(preset.defaults(), preset.ranges);
        self.panel.revalidate(&preset.ranges);
        tracing::info!(preset = preset.name, formula = preset.formula.label(), "preset selected");
        self.status = format!("preset {}", preset.name);
    }

    /// Commits pending edits and advances the clock by `dt` seconds.
    pub fn begin_frame(&mut self, dt: f32, scale: usize) -> FrameInput {
        self.store.commit();
        let params = *self.store.current();
        if !self.paused {
            self.anim.advance(dt, params.speed);
        }
        FrameInput {
            time: self.anim.elapsed(),
            seed: self.anim.seed(),
            params,
            formula: self.preset().formula,
            scale,
        }
    }

    pub fn save_params(&self) -> anyhow::Result<PathBuf> {
        let path = self
            .params_path
            .clone()
            .context("no parameter file path (set --params or HOME)")?;
        let file = ParamFile {
            preset: Some(self.preset().name.to_string()),
            params: self.store.pending().sanitized(self.store.ranges()),
        };
        file.save(&path)
            .with_context(|| format!("save params {}", path.display()))?;
        tracing::info!(path = %path.display(), "params saved");
        Ok(path)
    }

    /// Writes the last rendered frame and current values as a standalone page.
    pub fn export_snapshot(
        &mut self,
        engine: &ShaderEngine,
        input: &FrameInput,
    ) -> anyhow::Result<PathBuf> {
        let (w, h) = engine.size();
        let html = export_html(&HtmlSnapshot {
            preset: self.preset().name,
            formula: self.preset().formula.label(),
            seed: input.seed,
            time: input.time,
            params: &input.params,
            width: w,
            height: h,
            rgba: engine.straight(),
        })?;
        std::fs::create_dir_all(&self.export_dir)
            .with_context(|| format!("create export dir {}", self.export_dir.display()))?;
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let path = self
            .export_dir
            .join(format!("{}-{}.html", slug(self.preset().name), stamp));
        std::fs::write(&path, html).with_context(|| format!("write {}", path.display()))?;
        tracing::info!(path = %path.display(), "html snapshot exported");
        self.status = format!("exported {}", path.display());
        Ok(path)
    }

    pub fn hud_lines(&self, stats: &FrameStats) -> Vec<String> {
        let p = self.store.current();
        let range = self.store.ranges().get(self.panel.selected);
        let slot = self.panel.color_slot;
        vec![
            format!(
                "{} [{}] | seed {:.1} | t {:.1}s{} | {:.0} fps | shade {:.1} ms x{} | {}",
                self.preset().name,
                self.preset().formula.label(),
                self.anim.seed(),
                self.anim.elapsed(),
                if self.paused { " (paused)" } else { "" },
                stats.fps,
                stats.shade_ms,
                stats.scale,
                stats.renderer,
            ),
            format!(
                "> {}: {:.2} [{:.2}..{:.2}]   color {}: {}",
                self.panel.selected.label(),
                p.get(self.panel.selected),
                range.min,
                range.max,
                slot.label(),
                p.palette.get(slot).to_hex(),
            ),
            self.status.clone(),
        ]
    }
}

pub struct FrameStats {
    pub fps: f32,
    pub shade_ms: f32,
    pub scale: usize,
    pub renderer: &'static str,
}

fn slug(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect()
}

/// Resolves the starting preset and values: preset defaults, then the
/// parameter file, then command-line overrides.
pub fn resolve_startup(
    cfg: &Config,
    presets: &[Preset],
    params_path: Option<&Path>,
) -> anyhow::Result<(usize, ShaderParams)> {
    let explicit = cfg.params.is_some();
    let load = |base: &ShaderParams| -> anyhow::Result<ParamFile> {
        match ParamFile::load(params_path, base) {
            Ok(f) => Ok(f),
            Err(err) if !explicit => {
                tracing::warn!("ignoring saved params: {err}");
                Ok(ParamFile {
                    preset: None,
                    params: *base,
                })
            }
            Err(err) => Err(anyhow::Error::new(err).context("load --params file")),
        }
    };

    let probe = load(&ShaderParams::default())?;
    let query = cfg.preset.as_deref().or(probe.preset.as_deref());
    let active = match select_preset(query, presets) {
        Some(i) => i,
        None => {
            if let Some(q) = query {
                tracing::warn!(query = q, "no preset matches; using the first");
            }
            0
        }
    };
    let mut params = load(&presets[active].defaults())?.params;
    cfg.apply_overrides(&mut params);
    Ok((active, params))
}

pub fn run(cfg: Config) -> anyhow::Result<()> {
    telemetry::init_file(cfg.log_file.as_deref())?;

    let report = probe_runtime(cfg.renderer, cfg.auto_probe);
    tracing::info!(
        status = %report.status_label(),
        truecolor = report.truecolor,
        "capability probe"
    );
    for note in report.notes() {
        tracing::info!("capability: {note}");
    }

    let presets = make_presets();
    let params_path = cfg.params.clone().or_else(params_storage_path);
    let (active, params) = resolve_startup(&cfg, &presets, params_path.as_deref())?;
    let seed = cfg.seed.unwrap_or_else(crate::shading::random_seed);
    let mut viewer = Viewer::new(presets, active, params, seed)?
        .with_params_path(params_path)
        .with_export_dir(cfg.export_dir.clone());
    tracing::info!(preset = viewer.preset().name, seed, "viewer starting");

    let mut renderer: Box<dyn Renderer> = match report.renderer {
        RendererMode::Ascii => Box::new(AsciiRenderer::new()),
        RendererMode::HalfBlock => Box::new(HalfBlockRenderer::new()),
        RendererMode::Kitty => Box::new(KittyRenderer::new()),
    };
    let cell = renderer.cell_pixels();

    let mut engine = ShaderEngine::new(cfg.threads).with_aspect_correction(cfg.aspect_correct);
    tracing::info!(workers = engine.workers(), "shader engine ready");

    let _term = TerminalGuard::new()?;
    let mut out = BufWriter::new(TerminalGuard::stdout());
    let (tx, mut queue) = control_channel(256);
    let _input = InputThread::spawn(tx);

    let mut size = TerminalGuard::size()?;
    if size.1 < 2 || size.0 < 4 {
        bail!("terminal too small (need at least 4x2, got {}x{})", size.0, size.1);
    }
    let mut layout = Layout::compute(size, viewer.show_hud(), cell);
    engine.resize(layout.px_w, layout.px_h);

    let mut tuning = ScaleTuning::new(cfg.adaptive_scale);
    let mut fps = FpsCounter::new();
    let mut actions = Vec::new();
    let mut last_frame = Instant::now();
    let mut last_shade_ms = 0.0f32;
    let target = Duration::from_secs_f32(1.0 / cfg.fps.max(1) as f32);

    loop {
        let now = Instant::now();

        let mut relayout = false;
        let mut export = false;
        queue.drain_into(&mut actions);
        for action in actions.drain(..) {
            match viewer.handle(action) {
                Outcome::Quit => return Ok(()),
                Outcome::Relayout => relayout = true,
                Outcome::Resize(c, r) => {
                    size = (c, r);
                    relayout = true;
                }
                Outcome::Export => export = true,
                Outcome::None => {}
            }
        }

        // Resize events can be missed by some terminals.
        let polled = TerminalGuard::size()?;
        if polled != size {
            size = polled;
            relayout = true;
        }
        if relayout {
            layout = Layout::compute(size, viewer.show_hud(), cell);
            engine.resize(layout.px_w, layout.px_h);
            tracing::debug!(
                cols = size.0,
                rows = size.1,
                w = layout.px_w,
                h = layout.px_h,
                "relayout"
            );
        }

        let dt = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        let input = viewer.begin_frame(dt, tuning.scale);
        let shade_start = Instant::now();
        engine.render(&input);
        last_shade_ms = shade_start.elapsed().as_secs_f32() * 1000.0 * 0.2 + last_shade_ms * 0.8;

        if export {
            if let Err(err) = viewer.export_snapshot(&engine, &input) {
                tracing::warn!("html export failed: {err:#}");
            }
        }

        let hud = if viewer.show_hud() {
            viewer
                .hud_lines(&FrameStats {
                    fps: fps.fps(),
                    shade_ms: last_shade_ms,
                    scale: tuning.scale,
                    renderer: renderer.name(),
                })
                .join("\n")
        } else {
            String::new()
        };

        let frame = Frame {
            term_cols: size.0,
            term_rows: size.1,
            visual_rows: layout.visual_rows,
            pixel_width: layout.px_w,
            pixel_height: layout.px_h,
            pixels_rgba: engine.composited(),
            hud: &hud,
            hud_rows: layout.hud_rows,
            hud_highlight: viewer.show_hud().then_some(HUD_SELECTED_LINE),
            overlay: viewer.show_help().then(help_popup_text),
            sync_updates: cfg.sync_updates,
        };
        renderer.render(&frame, &mut out)?;

        fps.tick();
        let elapsed = now.elapsed();
        tuning.update(elapsed.as_secs_f32() * 1000.0, target.as_secs_f32() * 1000.0);
        if elapsed < target {
            std::thread::sleep(target - elapsed);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    pub hud_rows: u16,
    pub visual_rows: u16,
    pub px_w: usize,
    pub px_h: usize,
}

impl Layout {
    pub fn compute(size: (u16, u16), show_hud: bool, cell: (usize, usize)) -> Self {
        let (cols, rows) = size;
        let hud_rows = if show_hud {
            HUD_LINES.min(rows.saturating_sub(1))
        } else {
            0
        };
        let visual_rows = rows.saturating_sub(hud_rows).max(1);
        Self {
            hud_rows,
            visual_rows,
            px_w: (cols as usize).saturating_mul(cell.0),
            px_h: (visual_rows as usize).saturating_mul(cell.1),
        }
    }
}

fn help_popup_text() -> &'static str {
    "Blob Visualizer\n\
up/down or 1-6  select control\n\
left/right (-/+)  adjust (shift = x5)\n\
[ / ]  previous / next preset\n\
n or enter  regenerate seed\n\
0  reset preset defaults\n\
c  next color slot; r g b raise, R G B lower\n\
#rrggbb enter  set slot color\n\
space  pause\n\
s  save params   e  export html\n\
i  toggle HUD\n\
? or h or F1 or tab  toggle this help\n\
q or esc  quit"
}

struct FpsCounter {
    last: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last: Instant::now(),
            frames: 0,
            fps: 0.0,
        }
    }

    fn tick(&mut self) {
        self.frames += 1;
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        if dt >= 0.5 {
            self.fps = self.frames as f32 / dt;
            self.frames = 0;
            self.last = now;
        }
    }

    fn fps(&self) -> f32 {
        self.fps
    }
}

/// Grows the shading block size when frames run long, shrinks it back
/// when there is headroom.
pub struct ScaleTuning {
    pub scale: usize,
    adaptive: bool,
    ema_ms: f32,
}

impl ScaleTuning {
    pub fn new(adaptive: bool) -> Self {
        Self {
            scale: 1,
            adaptive,
            ema_ms: 0.0,
        }
    }

    pub fn update(&mut self, frame_ms: f32, target_ms: f32) {
        if !self.adaptive {
            return;
        }
        self.ema_ms = if self.ema_ms == 0.0 {
            frame_ms
        } else {
            self.ema_ms * 0.95 + frame_ms * 0.05
        };

        if self.ema_ms > target_ms * 1.22 && self.scale < MAX_SCALE {
            self.scale += 1;
            // Let the average settle at the new block size.
            self.ema_ms = 0.0;
            tracing::debug!(scale = self.scale, "frame budget exceeded; coarser shading");
        } else if self.ema_ms < target_ms * 0.5 && self.scale > 1 {
            self.scale -= 1;
            self.ema_ms = 0.0;
        }
    }
}

pub fn list_presets() {
    for (i, p) in make_presets().iter().enumerate() {
        println!("{i}: {} ({})", p.name, p.formula.label());
    }
}
