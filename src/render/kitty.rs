use crate::render::{Frame, Renderer, draw_overlay_popup, write_hud_line};
use anyhow::{Context, anyhow};
use base64::Engine;
use std::fs;
use std::io::Write;

/// Bytes of raw pixel data per graphics escape; 3072 encodes to 4096 base64 bytes.
const RAW_CHUNK: usize = 3 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KittyTransport {
    /// Base64 pixels inline in the escape stream.
    Direct,
    /// Pixels written to a temp file; only the path travels inline.
    File,
}

impl KittyTransport {
    fn label(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::File => "file",
        }
    }
}

/// Kitty graphics protocol renderer (also understood by Ghostty).
pub struct KittyRenderer {
    image_id: u32,
    placement_id: u32,
    temp_path: String,
    temp_payload_b64: String,
    transports: Vec<KittyTransport>,
    active_transport_idx: usize,
    b64_buf: Vec<u8>,
    overlay_visible_last: bool,
    last_hud_rows: u16,
}

impl KittyRenderer {
    pub fn new() -> Self {
        let temp_path = format!("/tmp/blobviz-{}.rgba", std::process::id());
        let temp_payload_b64 =
            base64::engine::general_purpose::STANDARD.encode(temp_path.as_bytes());

        Self {
            image_id: 1,
            placement_id: 1,
            temp_path,
            temp_payload_b64,
            transports: pick_transport_chain(),
            active_transport_idx: 0,
            b64_buf: Vec::new(),
            overlay_visible_last: false,
            last_hud_rows: 0,
        }
    }

    fn write_frame_with_transport(
        &mut self,
        transport: KittyTransport,
        frame: &Frame<'_>,
        out: &mut dyn Write,
        cols: usize,
        rows: usize,
    ) -> anyhow::Result<()> {
        let (w, h) = (frame.pixel_width, frame.pixel_height);
        match transport {
            KittyTransport::Direct => write_kitty_direct_rgba(
                out,
                frame.pixels_rgba,
                w,
                h,
                cols,
                rows,
                self.image_id,
                self.placement_id,
                &mut self.b64_buf,
            ),
            KittyTransport::File => {
                fs::write(self.temp_path.as_str(), frame.pixels_rgba)
                    .with_context(|| format!("write kitty temp file {}", self.temp_path))?;
                write!(
                    out,
                    "\x1b_Ga=T,f=32,s={},v={},t=f,i={},p={},c={},r={},C=1,q=2,z=-1;{}\x1b\\",
                    w,
                    h,
                    self.image_id,
                    self.placement_id,
                    cols,
                    rows,
                    self.temp_payload_b64
                )?;
                Ok(())
            }
        }
    }
}

impl Default for KittyRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for KittyRenderer {
    fn name(&self) -> &'static str {
        "kitty"
    }

    fn cell_pixels(&self) -> (usize, usize) {
        (2, 4)
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let cols = frame.term_cols as usize;
        let visual_rows = frame.visual_rows as usize;
        let (w, h) = (frame.pixel_width, frame.pixel_height);
        if cols == 0 || visual_rows == 0 || w == 0 || h == 0 {
            return Ok(());
        }
        if frame.pixels_rgba.len() < w.saturating_mul(h).saturating_mul(4) {
            return Ok(());
        }

        if frame.sync_updates {
            out.write_all(b"\x1b[?2026h")?;
        }

        if let Some(text) = frame.overlay {
            // Hide the image so the popup text is readable.
            write!(out, "\x1b_Ga=d,d=I,i={}\x1b\\", self.image_id)?;
            clear_text_rows(out, frame.term_rows as usize)?;
            write_hud(frame, out, cols, visual_rows)?;
            draw_overlay_popup(out, frame.term_cols, frame.term_rows, text)?;
            self.overlay_visible_last = true;
            self.last_hud_rows = frame.hud_rows;
            if frame.sync_updates {
                out.write_all(b"\x1b[?2026l")?;
            }
            out.flush()?;
            return Ok(());
        }

        out.write_all(b"\x1b[H")?;

        let start = self.active_transport_idx.min(self.transports.len().saturating_sub(1));
        let mut last_err: Option<anyhow::Error> = None;
        let mut rendered = false;
        for step in 0..self.transports.len() {
            let idx = (start + step) % self.transports.len();
            let transport = self.transports[idx];
            match self.write_frame_with_transport(transport, frame, out, cols, visual_rows) {
                Ok(()) => {
                    if idx != self.active_transport_idx {
                        tracing::info!(transport = transport.label(), "kitty transport selected");
                    }
                    self.active_transport_idx = idx;
                    rendered = true;
                    break;
                }
                Err(err) => {
                    // Terminal I/O failures will not be fixed by another transport.
                    if err.downcast_ref::<std::io::Error>().is_some() {
                        return Err(err);
                    }
                    last_err = Some(err.context(format!(
                        "kitty transport '{}' failed",
                        transport.label()
                    )));
                }
            }
        }
        if !rendered {
            return Err(last_err.unwrap_or_else(|| anyhow!("no kitty transport succeeded")));
        }

        if frame.hud_rows != self.last_hud_rows || self.overlay_visible_last {
            clear_text_rows(out, frame.term_rows as usize)?;
        }
        write_hud(frame, out, cols, visual_rows)?;

        self.overlay_visible_last = false;
        self.last_hud_rows = frame.hud_rows;

        if frame.sync_updates {
            out.write_all(b"\x1b[?2026l")?;
        }
        out.flush()?;
        Ok(())
    }
}

impl Drop for KittyRenderer {
    fn drop(&mut self) {
        let _ = fs::remove_file(self.temp_path.as_str());
    }
}

fn pick_transport_chain() -> Vec<KittyTransport> {
    if let Ok(v) = std::env::var("BLOBVIZ_KITTY_TRANSPORT") {
        match v.trim().to_ascii_lowercase().as_str() {
            "direct" | "d" => return vec![KittyTransport::Direct],
            "file" | "f" | "temp" | "tempfile" => return vec![KittyTransport::File],
            _ => {}
        }
    }
    vec![KittyTransport::Direct, KittyTransport::File]
}

fn write_hud(
    frame: &Frame<'_>,
    out: &mut dyn Write,
    cols: usize,
    visual_rows: usize,
) -> anyhow::Result<()> {
    let mut hud_lines = frame.hud.lines();
    for i in 0..(frame.hud_rows as usize) {
        write_hud_line(
            out,
            visual_rows + i + 1,
            cols,
            hud_lines.next(),
            frame.hud_highlight == Some(i),
        )?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn write_kitty_direct_rgba(
    out: &mut dyn Write,
    rgba: &[u8],
    w: usize,
    h: usize,
    cols: usize,
    rows: usize,
    image_id: u32,
    placement_id: u32,
    b64_buf: &mut Vec<u8>,
) -> anyhow::Result<()> {
    let len = w * h * 4;
    if len == 0 {
        return Ok(());
    }
    let rgba = &rgba[..len];

    let mut first = true;
    let mut chunks = rgba.chunks(RAW_CHUNK).peekable();
    while let Some(chunk) = chunks.next() {
        let more = chunks.peek().is_some();
        let b64_len = chunk.len().div_ceil(3) * 4;
        if b64_buf.len() < b64_len {
            b64_buf.resize(b64_len, 0);
        }
        let written = base64::engine::general_purpose::STANDARD
            .encode_slice(chunk, &mut b64_buf[..b64_len])
            .context("base64 encode pixels")?;

        let m = u8::from(more);
        if first {
            write!(
                out,
                "\x1b_Ga=T,f=32,s={},v={},t=d,i={},p={},c={},r={},C=1,q=2,z=-1,m={};",
                w, h, image_id, placement_id, cols, rows, m
            )?;
            first = false;
        } else {
            write!(out, "\x1b_Gm={};", m)?;
        }
        out.write_all(&b64_buf[..written])?;
        out.write_all(b"\x1b\\")?;
    }
    Ok(())
}

fn clear_text_rows(out: &mut dyn Write, rows: usize) -> anyhow::Result<()> {
    for row in 1..=rows {
        write!(out, "\x1b[{};1H\x1b[0m\x1b[2K", row)?;
    }
    Ok(())
}
