use blob_visualizer::control::{
    Channel, ControlAction, ControlPanel, HexInput, KeyRouter, control_channel, map_key,
};
use blob_visualizer::shading::{ColorSlot, ParamId, ParamRanges, Rgb, ShaderParams, make_presets};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

// ── Key bindings ────────────────────────────────────────────────────────────

#[test]
fn quit_keys() {
    assert_eq!(map_key(key(KeyCode::Char('q'))), Some(ControlAction::Quit));
    assert_eq!(map_key(key(KeyCode::Esc)), Some(ControlAction::Quit));
    assert_eq!(
        map_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
        Some(ControlAction::Quit)
    );
}

#[test]
fn arrows_select_and_nudge() {
    assert_eq!(map_key(key(KeyCode::Up)), Some(ControlAction::SelectPrev));
    assert_eq!(map_key(key(KeyCode::Down)), Some(ControlAction::SelectNext));
    assert_eq!(map_key(key(KeyCode::Left)), Some(ControlAction::Nudge(-1)));
    assert_eq!(map_key(key(KeyCode::Right)), Some(ControlAction::Nudge(1)));
    assert_eq!(
        map_key(KeyEvent::new(KeyCode::Right, KeyModifiers::SHIFT)),
        Some(ControlAction::Nudge(5))
    );
    assert_eq!(map_key(key(KeyCode::Char('+'))), Some(ControlAction::Nudge(1)));
}

#[test]
fn action_keys() {
    let cases = [
        (KeyCode::Char('n'), ControlAction::Regenerate),
        (KeyCode::Enter, ControlAction::Regenerate),
        (KeyCode::Char('0'), ControlAction::ResetDefaults),
        (KeyCode::Char(']'), ControlAction::NextPreset),
        (KeyCode::Char('['), ControlAction::PrevPreset),
        (KeyCode::Char(' '), ControlAction::TogglePause),
        (KeyCode::Char('i'), ControlAction::ToggleHud),
        (KeyCode::Char('?'), ControlAction::ToggleHelp),
        (KeyCode::F(1), ControlAction::ToggleHelp),
        (KeyCode::Char('s'), ControlAction::SaveParams),
        (KeyCode::Char('e'), ControlAction::ExportHtml),
        (KeyCode::Char('c'), ControlAction::NextColorSlot),
        (KeyCode::Char('g'), ControlAction::NudgeChannel(Channel::Green, 1)),
        (KeyCode::Char('B'), ControlAction::NudgeChannel(Channel::Blue, -1)),
    ];
    for (code, want) in cases {
        assert_eq!(map_key(key(code)), Some(want), "{code:?}");
    }
}

#[test]
fn digit_keys_select_controls() {
    for (i, id) in ParamId::all().into_iter().enumerate() {
        let digit = char::from(b'1' + i as u8);
        assert_eq!(map_key(key(KeyCode::Char(digit))), Some(ControlAction::Select(id)));
    }
    assert_eq!(map_key(key(KeyCode::Char('7'))), None);
    assert_eq!(map_key(key(KeyCode::Char('9'))), None);
}

#[test]
fn unbound_and_release_events_are_ignored() {
    assert_eq!(map_key(key(KeyCode::Char('x'))), None);
    assert_eq!(map_key(key(KeyCode::Char('#'))), None);
    assert_eq!(map_key(key(KeyCode::Home)), None);
    let release =
        KeyEvent::new_with_kind(KeyCode::Char('q'), KeyModifiers::NONE, KeyEventKind::Release);
    assert_eq!(map_key(release), None);
}

// ── Hex color entry ─────────────────────────────────────────────────────────

fn type_keys(router: &mut KeyRouter, codes: &[KeyCode]) -> Vec<ControlAction> {
    codes
        .iter()
        .filter_map(|&code| router.route(key(code)))
        .collect()
}

fn entry(digits: &str) -> ControlAction {
    let mut input = HexInput::default();
    for ch in digits.chars() {
        assert!(input.push(ch));
    }
    ControlAction::ColorEntry(Some(input))
}

#[test]
fn hash_opens_entry_and_enter_applies_color() {
    let mut router = KeyRouter::default();
    let mut codes = vec![KeyCode::Char('#')];
    codes.extend("33CC99".chars().map(KeyCode::Char));
    codes.push(KeyCode::Enter);
    let actions = type_keys(&mut router, &codes);

    assert_eq!(actions.len(), 8);
    assert_eq!(actions[0], entry(""));
    assert_eq!(actions[3], entry("33c"));
    assert_eq!(actions[6], entry("33cc99"));
    assert_eq!(actions[7], ControlAction::SetColor(Rgb::new(0.2, 0.8, 0.6)));
    assert!(!router.is_entering_color());

    // Back to normal bindings afterwards.
    assert_eq!(router.route(key(KeyCode::Char('c'))), Some(ControlAction::NextColorSlot));
}

#[test]
fn entry_captures_letters_and_refuses_extra_digits() {
    let mut router = KeyRouter::default();
    let codes: Vec<_> = "#abcdef0q".chars().map(KeyCode::Char).collect();
    let actions = type_keys(&mut router, &codes);
    // '0' is a seventh digit and 'q' is not hex; neither quits nor resets.
    assert_eq!(actions.len(), 7);
    assert_eq!(actions[6], entry("abcdef"));
    assert!(router.is_entering_color());

    let actions = type_keys(&mut router, &[KeyCode::Backspace, KeyCode::Backspace]);
    assert_eq!(actions, vec![entry("abcde"), entry("abcd")]);
}

#[test]
fn short_entry_defaults_to_black() {
    let mut router = KeyRouter::default();
    let codes = [KeyCode::Char('#'), KeyCode::Char('1'), KeyCode::Char('2'), KeyCode::Enter];
    let actions = type_keys(&mut router, &codes);
    assert_eq!(actions.last(), Some(&ControlAction::SetColor(Rgb::BLACK)));
}

#[test]
fn esc_cancels_entry_without_quitting() {
    let mut router = KeyRouter::default();
    let actions = type_keys(&mut router, &[KeyCode::Char('#'), KeyCode::Char('f'), KeyCode::Esc]);
    assert_eq!(actions.last(), Some(&ControlAction::ColorEntry(None)));
    assert!(!router.is_entering_color());
    assert_eq!(router.route(key(KeyCode::Esc)), Some(ControlAction::Quit));
}

#[test]
fn ctrl_c_quits_during_entry() {
    let mut router = KeyRouter::default();
    router.route(key(KeyCode::Char('#')));
    assert_eq!(
        router.route(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
        Some(ControlAction::Quit)
    );
    assert!(!router.is_entering_color());
}

// ── Queue ───────────────────────────────────────────────────────────────────

#[test]
fn queue_preserves_order_and_bounds() {
    let (mut tx, mut rx) = control_channel(2);
    assert!(tx.send(ControlAction::Nudge(1)));
    assert!(tx.send(ControlAction::Regenerate));
    assert!(!tx.send(ControlAction::Quit), "full queue should drop");

    let mut out = Vec::new();
    rx.drain_into(&mut out);
    assert_eq!(out, vec![ControlAction::Nudge(1), ControlAction::Regenerate]);

    out.clear();
    rx.drain_into(&mut out);
    assert!(out.is_empty());
    assert!(tx.send(ControlAction::Quit));
}

// ── Panel edits ─────────────────────────────────────────────────────────────

#[test]
fn nudge_moves_selected_control_by_step() {
    let ranges = ParamRanges::default();
    let mut params = ShaderParams::default();
    let mut panel = ControlPanel::default();
    assert_eq!(panel.selected, ParamId::SphereEffect);

    assert!(panel.apply(ControlAction::Nudge(5), &mut params, &ranges));
    assert!((params.sphere_effect - 0.1).abs() < 1e-6);

    panel.apply(ControlAction::Select(ParamId::Speed), &mut params, &ranges);
    panel.apply(ControlAction::Nudge(-1000), &mut params, &ranges);
    assert_eq!(params.speed, 0.1);
    panel.apply(ControlAction::Nudge(1000), &mut params, &ranges);
    assert_eq!(params.speed, 3.0);
}

#[test]
fn selection_wraps_through_every_control() {
    let ranges = ParamRanges::default();
    let mut params = ShaderParams::default();
    let mut panel = ControlPanel::default();
    let mut seen = Vec::new();
    for _ in 0..ParamId::all().len() {
        seen.push(panel.selected);
        panel.apply(ControlAction::SelectNext, &mut params, &ranges);
    }
    assert_eq!(seen, ParamId::all().to_vec());
    assert_eq!(panel.selected, ParamId::SphereEffect);
    panel.apply(ControlAction::SelectPrev, &mut params, &ranges);
    assert_eq!(panel.selected, ParamId::GrainAmount);
}

#[test]
fn locked_controls_are_skipped() {
    let presets = make_presets();
    let flat = presets[2].ranges;
    let mut params = presets[2].defaults();
    let mut panel = ControlPanel::default();

    panel.revalidate(&flat);
    assert_eq!(panel.selected, ParamId::Speed);

    panel.apply(ControlAction::SelectPrev, &mut params, &flat);
    assert_eq!(panel.selected, ParamId::GrainAmount);

    panel.apply(ControlAction::Select(ParamId::SphereEffect), &mut params, &flat);
    assert_eq!(panel.selected, ParamId::GrainAmount);
}

#[test]
fn channel_edits_target_the_color_slot() {
    let ranges = ParamRanges::default();
    let mut params = ShaderParams::default();
    let mut panel = ControlPanel::default();
    panel.apply(ControlAction::NextColorSlot, &mut params, &ranges);
    assert_eq!(panel.color_slot, ColorSlot::MainGreen);

    params.palette.set(ColorSlot::MainGreen, Rgb::new(0.99, 0.5, 0.0));
    panel.apply(ControlAction::NudgeChannel(Channel::Red, 1), &mut params, &ranges);
    panel.apply(ControlAction::NudgeChannel(Channel::Blue, -1), &mut params, &ranges);
    let c = params.palette.get(ColorSlot::MainGreen);
    assert_eq!(c.r, 1.0);
    assert_eq!(c.g, 0.5);
    assert_eq!(c.b, 0.0);

    let untouched = ShaderParams::default().palette.get(ColorSlot::DarkestGreen);
    assert_eq!(params.palette.get(ColorSlot::DarkestGreen), untouched);
}

#[test]
fn set_color_writes_current_slot() {
    let ranges = ParamRanges::default();
    let mut params = ShaderParams::default();
    let mut panel = ControlPanel::default();
    for _ in 0..5 {
        panel.apply(ControlAction::NextColorSlot, &mut params, &ranges);
    }
    assert_eq!(panel.color_slot, ColorSlot::MainSand);

    let c = Rgb::new(0.1, 0.2, 0.3);
    assert!(panel.apply(ControlAction::SetColor(c), &mut params, &ranges));
    assert_eq!(params.palette.get(ColorSlot::MainSand), c);
    assert!(!panel.apply(ControlAction::ColorEntry(None), &mut params, &ranges));
}

#[test]
fn non_edit_actions_are_left_to_the_driver() {
    let ranges = ParamRanges::default();
    let mut params = ShaderParams::default();
    let before = params;
    let mut panel = ControlPanel::default();
    for a in [
        ControlAction::Regenerate,
        ControlAction::TogglePause,
        ControlAction::NextPreset,
        ControlAction::Quit,
        ControlAction::Resize(80, 24),
    ] {
        assert!(!panel.apply(a, &mut params, &ranges));
    }
    assert_eq!(params, before);
}
