use crate::shading::compositor::{DEFAULT_ASPECT, ShapeFormula, shade, surface_coord};
use crate::shading::params::{ParamRanges, Rgb, ShaderParams};
use rayon::prelude::*;

/// Width/height ratio of the surface the recipe was tuned on.
const PLANE_RATIO: f32 = 5.0 / 4.0;
/// Frames smaller than this are shaded on the calling thread.
const MIN_PARALLEL_PIXELS: usize = 64 * 64;

/// Seeds live in `[0, 1000)`.
pub fn random_seed() -> f32 {
    fastrand::f32() * 1000.0
}

/// Elapsed animation time plus the session seed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationState {
    elapsed: f32,
    seed: f32,
}

impl AnimationState {
    pub fn new(seed: f32) -> Self {
        Self {
            elapsed: 0.0,
            seed: if seed.is_finite() { seed } else { 0.0 },
        }
    }

    pub fn with_random_seed() -> Self {
        Self::new(random_seed())
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn seed(&self) -> f32 {
        self.seed
    }

    /// Integrates `dt * speed`; non-positive or non-finite steps are ignored
    /// so elapsed time never runs backwards.
    pub fn advance(&mut self, dt: f32, speed: f32) {
        let step = dt * speed;
        if step.is_finite() && step > 0.0 {
            self.elapsed += step;
        }
    }

    pub fn regenerate_seed(&mut self) -> f32 {
        self.seed = random_seed();
        self.seed
    }

    pub fn set_seed(&mut self, seed: f32) {
        if seed.is_finite() {
            self.seed = seed;
        }
    }
}

/// Committed snapshot read by the renderer plus a pending buffer the
/// control surface edits. `commit` swaps them between frames.
#[derive(Clone, Debug)]
pub struct ParamStore {
    committed: ShaderParams,
    pending: ShaderParams,
    ranges: ParamRanges,
}

impl ParamStore {
    pub fn new(params: ShaderParams, ranges: ParamRanges) -> Self {
        let params = params.sanitized(&ranges);
        Self {
            committed: params,
            pending: params,
            ranges,
        }
    }

    pub fn current(&self) -> &ShaderParams {
        &self.committed
    }

    pub fn pending(&self) -> &ShaderParams {
        &self.pending
    }

    pub fn pending_mut(&mut self) -> &mut ShaderParams {
        &mut self.pending
    }

    pub fn ranges(&self) -> &ParamRanges {
        &self.ranges
    }

    /// Replaces ranges and pending values together (preset switch).
    pub fn load(&mut self, params: ShaderParams, ranges: ParamRanges) {
        self.ranges = ranges;
        self.pending = params;
    }

    /// Publishes pending edits. Returns true when the snapshot changed.
    pub fn commit(&mut self) -> bool {
        let next = self.pending.sanitized(&self.ranges);
        self.pending = next;
        if next == self.committed {
            return false;
        }
        self.committed = next;
        true
    }
}

pub struct FrameInput {
    pub time: f32,
    pub seed: f32,
    pub params: ShaderParams,
    pub formula: ShapeFormula,
    /// Block size for adaptive downscale; 1 shades every pixel.
    pub scale: usize,
}

pub struct ShaderEngine {
    w: usize,
    h: usize,
    /// `None` shades on rayon's global pool.
    pool: Option<rayon::ThreadPool>,
    aspect_correct: bool,
    background: Rgb,
    straight: Vec<u8>,
    composited: Vec<u8>,
}

impl ShaderEngine {
    /// `workers = 0` shares rayon's global pool sized to the available parallelism.
    pub fn new(workers: usize) -> Self {
        let pool = if workers == 0 {
            None
        } else {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("blob-shade-{i}"))
                .build()
            {
                Ok(pool) => Some(pool),
                Err(err) => {
                    tracing::warn!(%err, workers, "shader pool unavailable; using global pool");
                    None
                }
            }
        };
        Self {
            w: 0,
            h: 0,
            pool,
            aspect_correct: true,
            background: Rgb::WHITE,
            straight: Vec::new(),
            composited: Vec::new(),
        }
    }

    pub fn with_aspect_correction(mut self, on: bool) -> Self {
        self.aspect_correct = on;
        self
    }

    pub fn with_background(mut self, bg: Rgb) -> Self {
        self.background = bg;
        self
    }

    pub fn workers(&self) -> usize {
        self.pool
            .as_ref()
            .map_or_else(rayon::current_num_threads, rayon::ThreadPool::current_num_threads)
    }

    pub fn size(&self) -> (usize, usize) {
        (self.w, self.h)
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        let n = w.saturating_mul(h).saturating_mul(4);
        self.straight.clear();
        self.straight.resize(n, 0);
        self.composited.clear();
        self.composited.resize(n, 0);
    }

    pub fn aspect(&self) -> f32 {
        if !self.aspect_correct || self.w == 0 || self.h == 0 {
            return DEFAULT_ASPECT;
        }
        DEFAULT_ASPECT * (self.w as f32 / self.h as f32) / PLANE_RATIO
    }

    /// Straight-alpha RGBA of the last frame.
    pub fn straight(&self) -> &[u8] {
        &self.straight
    }

    /// Last frame composited over the background, alpha forced opaque.
    pub fn composited(&self) -> &[u8] {
        &self.composited
    }

    /// Shades every pixel and returns the composited frame.
    pub fn render(&mut self, input: &FrameInput) -> &[u8] {
        let (w, h) = (self.w, self.h);
        if w == 0 || h == 0 {
            return &self.composited;
        }

        let scale = input.scale.max(1);
        let aspect = self.aspect();
        let bg = self.background;
        let row_bytes = w * 4;

        // One chunk per block row so blocks never straddle two tasks.
        let band_bytes = row_bytes * scale;
        let shade_row = |(i, (straight, comp)): (usize, (&mut [u8], &mut [u8]))| {
            shade_band(input, aspect, bg, w, h, i * scale, scale, straight, comp)
        };

        let straight = &mut self.straight;
        let composited = &mut self.composited;
        if w * h < MIN_PARALLEL_PIXELS {
            straight
                .chunks_mut(band_bytes)
                .zip(composited.chunks_mut(band_bytes))
                .enumerate()
                .for_each(shade_row);
        } else {
            let mut job = || {
                straight
                    .par_chunks_mut(band_bytes)
                    .zip(composited.par_chunks_mut(band_bytes))
                    .enumerate()
                    .for_each(shade_row)
            };
            match &self.pool {
                Some(pool) => pool.install(job),
                None => job(),
            }
        }

        &self.composited
    }
}

#[allow(clippy::too_many_arguments)]
fn shade_band(
    input: &FrameInput,
    aspect: f32,
    bg: Rgb,
    w: usize,
    h: usize,
    y0: usize,
    scale: usize,
    straight: &mut [u8],
    composited: &mut [u8],
) {
    let rows = straight.len() / (w * 4);
    for by in (0..rows).step_by(scale) {
        for bx in (0..w).step_by(scale) {
            let uv = surface_coord(bx, y0 + by, w, h, aspect);
            let px = shade(uv, input.time, input.seed, &input.params, input.formula);
            let s = px.to_u8();
            let [r, g, b] = px.over(bg).to_u8();
            let c = [r, g, b, 255];

            for dy in 0..scale.min(rows - by) {
                let row = (by + dy) * w;
                for dx in 0..scale.min(w - bx) {
                    let i = (row + bx + dx) * 4;
                    straight[i..i + 4].copy_from_slice(&s);
                    composited[i..i + 4].copy_from_slice(&c);
                }
            }
        }
    }
}
