use std::time::{Duration, Instant};

use smart_rewriter::dom::document::Document;
use smart_rewriter::dom::events::{DomEvent, KeyPress};
use smart_rewriter::field::shortcuts::{KeyCombo, Keymap, ShortcutAction, ShortcutError};
use smart_rewriter::field::tagger::{ElementFilter, FieldRule};
use smart_rewriter::field::tracker::{ActiveFieldTracker, DEFAULT_GRACE_DELAY, TrackerState};

mod common;
use crate::common::utils::element;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

// ============================================================================
// Active field tracking
// ============================================================================

#[test]
fn focus_on_editable_starts_tracking() {
    let mut doc = Document::new();
    let body = doc.body();
    let area = element(&mut doc, body, "textarea", &[]);
    let mut tracker = ActiveFieldTracker::default();
    let t0 = Instant::now();

    tracker.handle_event(&doc, &DomEvent::focus(area), t0);
    assert_eq!(tracker.state(), TrackerState::Tracking(area));
    assert_eq!(tracker.current(t0), Some(area));
}

#[test]
fn focus_on_non_editable_is_ignored() {
    let mut doc = Document::new();
    let body = doc.body();
    let button = element(&mut doc, body, "button", &[]);
    let mut tracker = ActiveFieldTracker::default();

    tracker.handle_event(&doc, &DomEvent::click(button), Instant::now());
    assert_eq!(tracker.state(), TrackerState::Idle);
}

#[test]
fn blur_clears_only_after_grace_delay() {
    let mut doc = Document::new();
    let body = doc.body();
    let area = element(&mut doc, body, "textarea", &[]);
    let mut tracker = ActiveFieldTracker::default();
    let t0 = Instant::now();

    tracker.handle_event(&doc, &DomEvent::focus(area), t0);
    tracker.handle_event(&doc, &DomEvent::blur(area), t0 + ms(10));

    assert!(tracker.has_pending_clear());
    assert_eq!(tracker.current(t0 + ms(100)), Some(area));
    assert_eq!(tracker.current(t0 + ms(10) + DEFAULT_GRACE_DELAY), None);
    assert!(!tracker.has_pending_clear());
}

#[test]
fn new_focus_supersedes_pending_clear() {
    let mut doc = Document::new();
    let body = doc.body();
    let first = element(&mut doc, body, "textarea", &[]);
    let second = element(&mut doc, body, "input", &[("type", "text")]);
    let mut tracker = ActiveFieldTracker::default();
    let t0 = Instant::now();

    tracker.handle_event(&doc, &DomEvent::focus(first), t0);
    tracker.handle_event(&doc, &DomEvent::blur(first), t0 + ms(5));
    tracker.handle_event(&doc, &DomEvent::focus(second), t0 + ms(50));

    assert!(!tracker.has_pending_clear());
    assert_eq!(tracker.current(t0 + ms(1000)), Some(second));
}

#[test]
fn blur_of_other_element_is_ignored() {
    let mut doc = Document::new();
    let body = doc.body();
    let area = element(&mut doc, body, "textarea", &[]);
    let other = element(&mut doc, body, "input", &[]);
    let mut tracker = ActiveFieldTracker::default();
    let t0 = Instant::now();

    tracker.handle_event(&doc, &DomEvent::focus(area), t0);
    tracker.handle_event(&doc, &DomEvent::blur(other), t0 + ms(1));
    assert!(!tracker.has_pending_clear());
}

#[test]
fn click_on_decorative_child_finds_field_within_three_levels() {
    let mut doc = Document::new();
    let body = doc.body();
    let editor = element(&mut doc, body, "div", &[("contenteditable", "true")]);
    let p = element(&mut doc, editor, "p", &[]);
    let span = element(&mut doc, p, "span", &[]);
    let icon = element(&mut doc, span, "i", &[]);
    let deeper = element(&mut doc, icon, "svg", &[]);
    let t0 = Instant::now();

    let mut tracker = ActiveFieldTracker::default();
    tracker.handle_event(&doc, &DomEvent::click(icon), t0);
    assert_eq!(tracker.state(), TrackerState::Tracking(editor));

    let mut tracker = ActiveFieldTracker::default();
    tracker.handle_event(&doc, &DomEvent::click(deeper), t0);
    assert_eq!(tracker.state(), TrackerState::Idle);
}

#[test]
fn field_inside_shadow_dom_is_tracked() {
    let mut doc = Document::new();
    let body = doc.body();
    let host = element(&mut doc, body, "chat-box", &[]);
    let shadow = doc.attach_shadow(host);
    let area = element(&mut doc, shadow, "textarea", &[]);
    let mut tracker = ActiveFieldTracker::default();

    tracker.handle_event(&doc, &DomEvent::context_menu(area), Instant::now());
    assert_eq!(tracker.state(), TrackerState::Tracking(area));
}

#[test]
fn removed_field_is_not_live() {
    let mut doc = Document::new();
    let body = doc.body();
    let area = element(&mut doc, body, "textarea", &[]);
    let mut tracker = ActiveFieldTracker::default();
    let t0 = Instant::now();

    tracker.handle_event(&doc, &DomEvent::focus(area), t0);
    doc.remove(area);

    assert_eq!(tracker.current(t0), Some(area));
    assert_eq!(tracker.current_live(&doc, t0), None);
}

#[test]
fn excluded_fields_are_not_tracked() {
    let mut doc = Document::new();
    let body = doc.body();
    let search = element(&mut doc, body, "input", &[("class", "search")]);
    let filter = ElementFilter::new(
        vec![FieldRule {
            class_name: Some("search".to_string()),
            ..FieldRule::default()
        }],
        vec![],
    );
    let mut tracker = ActiveFieldTracker::new(DEFAULT_GRACE_DELAY, filter);

    tracker.handle_event(&doc, &DomEvent::focus(search), Instant::now());
    assert_eq!(tracker.state(), TrackerState::Idle);
}

// ============================================================================
// Shortcuts
// ============================================================================

#[test]
fn key_combo_parses_case_insensitively() {
    let combo: KeyCombo = "ctrl+ALT+k".parse().unwrap();
    assert!(combo.ctrl && combo.alt && !combo.shift && !combo.meta);
    assert_eq!(combo.key, "k");
    assert_eq!(combo.to_string(), "Ctrl+Alt+K");

    let reordered: KeyCombo = "Shift + Alt + R".parse().unwrap();
    assert_eq!(reordered, "Alt+Shift+R".parse().unwrap());
}

#[test]
fn key_combo_rejects_bad_input() {
    assert_eq!("".parse::<KeyCombo>(), Err(ShortcutError::Empty));
    assert!(matches!(
        "Alt+Shift".parse::<KeyCombo>(),
        Err(ShortcutError::MissingKey(_))
    ));
    assert!(matches!(
        "Alt+R+T".parse::<KeyCombo>(),
        Err(ShortcutError::MultipleKeys(_))
    ));
}

#[test]
fn default_keymap_resolves_builtin_shortcuts() {
    let keymap = Keymap::default();

    assert_eq!(
        keymap.resolve(&KeyPress::new("r").alt()),
        Some(ShortcutAction::RewriteLastMode)
    );
    assert_eq!(
        keymap.resolve(&KeyPress::new("R").alt().shift()),
        Some(ShortcutAction::OpenModeSelection)
    );
    assert_eq!(
        keymap.resolve(&KeyPress::new("S").alt().shift()),
        Some(ShortcutAction::OpenSettings)
    );
    assert_eq!(keymap.resolve(&KeyPress::new("r")), None);
    assert_eq!(keymap.resolve(&KeyPress::new("r").alt().meta()), None);
}

#[test]
fn alt_digits_select_modes() {
    let keymap = Keymap::default();
    assert_eq!(
        keymap.resolve(&KeyPress::new("1").alt()),
        Some(ShortcutAction::SelectMode(0))
    );
    assert_eq!(
        keymap.resolve(&KeyPress::new("9").alt()),
        Some(ShortcutAction::SelectMode(8))
    );
    assert_eq!(keymap.resolve(&KeyPress::new("0").alt()), None);
    assert_eq!(keymap.resolve(&KeyPress::new("1").alt().ctrl()), None);
}

#[test]
fn invalid_custom_shortcut_falls_back_to_default() {
    let keymap = Keymap::from_strings("Alt+", "Ctrl+M");
    assert_eq!(
        keymap.resolve(&KeyPress::new("r").alt()),
        Some(ShortcutAction::RewriteLastMode)
    );
    assert_eq!(
        keymap.resolve(&KeyPress::new("m").ctrl()),
        Some(ShortcutAction::OpenModeSelection)
    );
}
