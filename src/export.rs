//! Still-image encoding and the standalone HTML snapshot.

use crate::prefs::ParamFile;
use crate::shading::{ColorSlot, ParamId, ShaderParams};
use anyhow::{Context, bail};
use base64::Engine;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

fn encode_into<W: Write>(out: W, w: usize, h: usize, rgba: &[u8]) -> anyhow::Result<()> {
    if w == 0 || h == 0 {
        bail!("empty image ({w}x{h})");
    }
    let pixel_bytes = w.saturating_mul(h).saturating_mul(4);
    if rgba.len() < pixel_bytes {
        bail!("pixel buffer too small (need {pixel_bytes}, got {})", rgba.len());
    }
    let width = u32::try_from(w).context("image width out of range")?;
    let height = u32::try_from(h).context("image height out of range")?;

    let mut encoder = png::Encoder::new(out, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().context("write PNG header")?;
    writer.write_image_data(&rgba[..pixel_bytes]).context("write PNG image data")?;
    writer.finish().context("finish PNG stream")?;
    Ok(())
}

/// Encodes straight-alpha RGBA as an 8-bit RGBA PNG.
pub fn encode_png(w: usize, h: usize, rgba: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut out = Vec::new();
    encode_into(&mut out, w, h, rgba)?;
    Ok(out)
}

pub fn write_frame(path: &Path, w: usize, h: usize, rgba: &[u8]) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("create frame {}", path.display()))?;
    let mut out = BufWriter::new(file);
    encode_into(&mut out, w, h, rgba)
        .with_context(|| format!("encode frame {}", path.display()))?;
    out.flush().with_context(|| format!("write frame {}", path.display()))
}

/// Everything the HTML snapshot embeds.
pub struct HtmlSnapshot<'a> {
    pub preset: &'a str,
    pub formula: &'a str,
    pub seed: f32,
    pub time: f32,
    pub params: &'a ShaderParams,
    pub width: usize,
    pub height: usize,
    pub rgba: &'a [u8],
}

/// Builds a self-contained static page: the rendered frame as a data URI and
/// the parameter values both as a table and as a reloadable params block.
pub fn export_html(snap: &HtmlSnapshot<'_>) -> anyhow::Result<String> {
    let png = encode_png(snap.width, snap.height, snap.rgba)?;
    let b64 = base64::engine::general_purpose::STANDARD.encode(&png);
    let param_text = ParamFile {
        preset: Some(snap.preset.to_string()),
        params: *snap.params,
    }
    .to_text();

    let mut rows = String::new();
    for id in ParamId::all() {
        let _ = writeln!(
            rows,
            "      <tr data-key=\"{}\"><th>{}</th><td>{:.3}</td></tr>",
            id.key(),
            id.label(),
            snap.params.get(id)
        );
    }
    for slot in ColorSlot::all() {
        let hex = snap.params.palette.get(slot).to_hex();
        let _ = writeln!(
            rows,
            concat!(
                "      <tr data-key=\"{}\"><th>{}</th><td>",
                "<span class=\"swatch\" style=\"background:{hex}\"></span>{hex}</td></tr>",
            ),
            slot.key(),
            slot.label(),
            hex = hex,
        );
    }

    let title = escape_html(snap.preset);
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <style>
    body {{ margin: 0; background: #ffffff; font-family: sans-serif; color: #222; }}
    .frame {{ display: block; margin: 24px auto; width: {w}px; height: {h}px; }}
    table {{ margin: 0 auto; border-collapse: collapse; }}
    th, td {{ padding: 2px 10px; text-align: left; font-size: 13px; }}
    .swatch {{ display: inline-block; width: 12px; height: 12px; margin-right: 6px; }}
    pre {{ width: 480px; margin: 16px auto; font-size: 12px; }}
  </style>
</head>
<body>
  <img class="frame" alt="{title}" src="data:image/png;base64,{b64}">
  <table data-preset="{title}" data-formula="{formula}" data-seed="{seed}" data-time="{time}">
    <tbody>
{rows}    </tbody>
  </table>
  <pre id="params">{params}</pre>
</body>
</html>
"#,
        w = snap.width,
        h = snap.height,
        formula = escape_html(snap.formula),
        seed = snap.seed,
        time = snap.time,
        params = escape_html(&param_text),
    );
    Ok(html)
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
