//! Keyboard control surface.
//!
//! An input thread turns terminal events into [`ControlAction`]s and pushes
//! them through a single-producer ring buffer; the frame loop drains the
//! queue once per frame and only ever edits the pending parameter buffer.

use crate::shading::{ColorSlot, ParamId, ParamRanges, Rgb, ShaderParams, parse_color};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ringbuf::traits::{Consumer as _, Producer as _, Split as _};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Color channel step for keyboard edits (1/32).
const CHANNEL_STEP: f32 = 1.0 / 32.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ControlAction {
    SelectNext,
    SelectPrev,
    Select(ParamId),
    /// Moves the selected control by whole steps.
    Nudge(i32),
    NextColorSlot,
    NudgeChannel(Channel, i32),
    /// Hex entry progress; `None` once the entry is closed without a color.
    ColorEntry(Option<HexInput>),
    /// Replaces the color in the panel's current slot.
    SetColor(Rgb),
    Regenerate,
    ResetDefaults,
    NextPreset,
    PrevPreset,
    TogglePause,
    ToggleHud,
    ToggleHelp,
    SaveParams,
    ExportHtml,
    Resize(u16, u16),
    Quit,
}

pub fn map_key(k: KeyEvent) -> Option<ControlAction> {
    if k.kind == KeyEventKind::Release {
        return None;
    }
    if k.modifiers.contains(KeyModifiers::CONTROL) && matches!(k.code, KeyCode::Char('c')) {
        return Some(ControlAction::Quit);
    }
    let fast = k.modifiers.contains(KeyModifiers::SHIFT);

    let action = match k.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => ControlAction::Quit,
        KeyCode::Up => ControlAction::SelectPrev,
        KeyCode::Down => ControlAction::SelectNext,
        KeyCode::Left => ControlAction::Nudge(if fast { -5 } else { -1 }),
        KeyCode::Right => ControlAction::Nudge(if fast { 5 } else { 1 }),
        KeyCode::Char('-') | KeyCode::Char('_') => ControlAction::Nudge(-1),
        KeyCode::Char('=') | KeyCode::Char('+') => ControlAction::Nudge(1),
        KeyCode::Char('[') => ControlAction::PrevPreset,
        KeyCode::Char(']') => ControlAction::NextPreset,
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Enter => ControlAction::Regenerate,
        KeyCode::Char('0') => ControlAction::ResetDefaults,
        KeyCode::Char(d @ '1'..='9') => {
            let idx = (d as u8 - b'1') as usize;
            ControlAction::Select(*ParamId::all().get(idx)?)
        }
        KeyCode::Char('c') | KeyCode::Char('C') => ControlAction::NextColorSlot,
        KeyCode::Char('r') => ControlAction::NudgeChannel(Channel::Red, 1),
        KeyCode::Char('R') => ControlAction::NudgeChannel(Channel::Red, -1),
        KeyCode::Char('g') => ControlAction::NudgeChannel(Channel::Green, 1),
        KeyCode::Char('G') => ControlAction::NudgeChannel(Channel::Green, -1),
        KeyCode::Char('b') => ControlAction::NudgeChannel(Channel::Blue, 1),
        KeyCode::Char('B') => ControlAction::NudgeChannel(Channel::Blue, -1),
        KeyCode::Char(' ') => ControlAction::TogglePause,
        KeyCode::Char('i') | KeyCode::Char('I') => ControlAction::ToggleHud,
        KeyCode::Char('?')
        | KeyCode::Char('h')
        | KeyCode::Char('H')
        | KeyCode::F(1)
        | KeyCode::Tab => ControlAction::ToggleHelp,
        KeyCode::Char('s') | KeyCode::Char('S') => ControlAction::SaveParams,
        KeyCode::Char('e') | KeyCode::Char('E') => ControlAction::ExportHtml,
        _ => return None,
    };
    Some(action)
}

/// Up to six hex digits typed after `#`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HexInput {
    digits: [u8; 6],
    len: u8,
}

impl HexInput {
    /// Appends a hex digit; anything else, or a seventh digit, is refused.
    pub fn push(&mut self, ch: char) -> bool {
        let len = self.len as usize;
        if len == self.digits.len() || !ch.is_ascii_hexdigit() {
            return false;
        }
        self.digits[len] = ch.to_ascii_lowercase() as u8;
        self.len += 1;
        true
    }

    pub fn pop(&mut self) {
        self.len = self.len.saturating_sub(1);
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.digits[..self.len as usize]).unwrap_or("")
    }

    /// Malformed entries fall back to black.
    pub fn to_color(&self) -> Rgb {
        parse_color(self.as_str()).unwrap_or_else(|err| {
            tracing::warn!(%err, "color entry rejected; using black");
            Rgb::BLACK
        })
    }
}

/// Key mapping with one piece of state: `#` opens a hex color entry that
/// captures keys until enter or esc. Other keys go through [`map_key`].
#[derive(Debug, Default)]
pub struct KeyRouter {
    entry: Option<HexInput>,
}

impl KeyRouter {
    pub fn is_entering_color(&self) -> bool {
        self.entry.is_some()
    }

    pub fn route(&mut self, k: KeyEvent) -> Option<ControlAction> {
        if k.kind == KeyEventKind::Release {
            return None;
        }
        let Some(mut entry) = self.entry else {
            if k.code == KeyCode::Char('#') {
                self.entry = Some(HexInput::default());
                return Some(ControlAction::ColorEntry(self.entry));
            }
            return map_key(k);
        };
        if k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c') {
            self.entry = None;
            return Some(ControlAction::Quit);
        }
        match k.code {
            KeyCode::Esc => {
                self.entry = None;
                Some(ControlAction::ColorEntry(None))
            }
            KeyCode::Enter => {
                self.entry = None;
                Some(ControlAction::SetColor(entry.to_color()))
            }
            KeyCode::Backspace => {
                entry.pop();
                self.entry = Some(entry);
                Some(ControlAction::ColorEntry(self.entry))
            }
            KeyCode::Char(ch) if entry.push(ch) => {
                self.entry = Some(entry);
                Some(ControlAction::ColorEntry(self.entry))
            }
            _ => None,
        }
    }
}

pub struct ControlSender {
    prod: HeapProd<ControlAction>,
}

impl ControlSender {
    /// Returns false when the queue is full and the action was dropped.
    pub fn send(&mut self, action: ControlAction) -> bool {
        self.prod.try_push(action).is_ok()
    }
}

pub struct ControlQueue {
    cons: HeapCons<ControlAction>,
}

impl ControlQueue {
    pub fn drain_into(&mut self, out: &mut Vec<ControlAction>) {
        while let Some(a) = self.cons.try_pop() {
            out.push(a);
        }
    }
}

pub fn control_channel(capacity: usize) -> (ControlSender, ControlQueue) {
    let rb = HeapRb::<ControlAction>::new(capacity.max(1));
    let (prod, cons) = rb.split();
    (ControlSender { prod }, ControlQueue { cons })
}

pub struct InputThread {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl InputThread {
    pub fn spawn(mut tx: ControlSender) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_for_thread = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            let mut keys = KeyRouter::default();
            while !stop_for_thread.load(Ordering::Relaxed) {
                match event::poll(Duration::from_millis(25)) {
                    Ok(false) => continue,
                    Ok(true) => {}
                    Err(err) => {
                        tracing::warn!("input poll failed: {err}");
                        tx.send(ControlAction::Quit);
                        break;
                    }
                }
                let action = match event::read() {
                    Ok(Event::Key(k)) => keys.route(k),
                    Ok(Event::Resize(c, r)) => Some(ControlAction::Resize(c, r)),
                    Ok(_) => None,
                    Err(err) => {
                        tracing::warn!("input read failed: {err}");
                        Some(ControlAction::Quit)
                    }
                };
                if let Some(a) = action {
                    if !tx.send(a) {
                        tracing::debug!(?a, "control queue full; dropping action");
                    }
                }
            }
        });
        Self {
            stop,
            handle: Some(handle),
        }
    }
}

impl Drop for InputThread {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

/// Panel cursor state: which control and which color slot are being edited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlPanel {
    pub selected: ParamId,
    pub color_slot: ColorSlot,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            selected: ParamId::all()[0],
            color_slot: ColorSlot::DarkestGreen,
        }
    }
}

impl ControlPanel {
    /// Applies parameter edits to `params`. Returns false for actions that
    /// are not parameter edits (left to the caller).
    pub fn apply(
        &mut self,
        action: ControlAction,
        params: &mut ShaderParams,
        ranges: &ParamRanges,
    ) -> bool {
        match action {
            ControlAction::SelectNext => {
                self.selected = step_selection(self.selected, ranges, ParamId::next);
            }
            ControlAction::SelectPrev => {
                self.selected = step_selection(self.selected, ranges, ParamId::prev);
            }
            ControlAction::Select(id) => {
                if !ranges.get(id).is_locked() {
                    self.selected = id;
                }
            }
            ControlAction::Nudge(steps) => {
                let range = ranges.get(self.selected);
                if range.is_locked() {
                    return true;
                }
                let v = params.get(self.selected) + range.step * steps as f32;
                params.set(self.selected, range.clamp(v));
            }
            ControlAction::NextColorSlot => {
                self.color_slot = self.color_slot.next();
            }
            ControlAction::NudgeChannel(ch, steps) => {
                let mut c = params.palette.get(self.color_slot);
                let delta = CHANNEL_STEP * steps as f32;
                match ch {
                    Channel::Red => c.r = (c.r + delta).clamp(0.0, 1.0),
                    Channel::Green => c.g = (c.g + delta).clamp(0.0, 1.0),
                    Channel::Blue => c.b = (c.b + delta).clamp(0.0, 1.0),
                }
                params.palette.set(self.color_slot, c);
            }
            ControlAction::SetColor(c) => {
                params.palette.set(self.color_slot, c);
            }
            _ => return false,
        }
        true
    }

    /// Moves the cursor off a control the active preset locks.
    pub fn revalidate(&mut self, ranges: &ParamRanges) {
        if ranges.get(self.selected).is_locked() {
            self.selected = step_selection(self.selected, ranges, ParamId::next);
        }
    }
}

fn step_selection(from: ParamId, ranges: &ParamRanges, step: fn(ParamId) -> ParamId) -> ParamId {
    let mut cur = from;
    for _ in 0..ParamId::all().len() {
        cur = step(cur);
        if !ranges.get(cur).is_locked() {
            return cur;
        }
    }
    from
}
