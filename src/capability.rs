use crate::config::RendererMode;

#[derive(Debug, Clone)]
pub struct CapabilityReport {
    pub auto_probe: bool,
    pub requested_renderer: RendererMode,
    pub renderer: RendererMode,
    pub truecolor: bool,
    notes: Vec<String>,
}

impl CapabilityReport {
    pub fn changed(&self) -> bool {
        self.renderer != self.requested_renderer
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn push_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn status_label(&self) -> String {
        if !self.auto_probe {
            return format!("off (renderer={:?})", self.renderer);
        }
        if self.changed() {
            return format!("fallback {:?}->{:?}", self.requested_renderer, self.renderer);
        }
        format!("ok renderer={:?}", self.renderer)
    }
}

pub fn probe_runtime(requested_renderer: RendererMode, auto_probe: bool) -> CapabilityReport {
    let mut report = CapabilityReport {
        auto_probe,
        requested_renderer,
        renderer: requested_renderer,
        truecolor: truecolor_available(),
        notes: Vec::new(),
    };

    if !auto_probe {
        report.push_note("capability probe disabled by --auto-probe=false");
        return report;
    }

    if requested_renderer == RendererMode::Kitty && !kitty_graphics_available() {
        report.renderer = RendererMode::HalfBlock;
        report.push_note("kitty graphics unavailable; falling back to half-block renderer");
    }

    if !report.truecolor {
        report.push_note("COLORTERM does not advertise truecolor; colors may be quantized");
    }

    if report.notes.is_empty() {
        report.push_note("probe selected requested renderer with no fallback");
    }

    report
}

fn env_flag(name: &str) -> Option<bool> {
    let v = std::env::var(name).ok()?;
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn truecolor_available() -> bool {
    let colorterm = std::env::var("COLORTERM")
        .unwrap_or_default()
        .to_ascii_lowercase();
    colorterm.contains("truecolor") || colorterm.contains("24bit")
}

fn kitty_graphics_available() -> bool {
    if let Some(forced) = env_flag("BLOBVIZ_FORCE_KITTY") {
        return forced;
    }
    if std::env::var("KITTY_WINDOW_ID").is_ok() {
        return true;
    }
    let term = std::env::var("TERM").unwrap_or_default().to_ascii_lowercase();
    if term.contains("kitty") {
        return true;
    }
    let term_program = std::env::var("TERM_PROGRAM")
        .unwrap_or_default()
        .to_ascii_lowercase();
    term_program.contains("ghostty") || term_program.contains("kitty")
}
