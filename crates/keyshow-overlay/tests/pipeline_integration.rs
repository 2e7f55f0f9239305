//! Integration tests for the capture-to-overlay pipeline.
//!
//! These tests exercise the application end-to-end with simulated
//! infrastructure: `SimulatedKeyboardListener` → `DisplayCoordinator` →
//! overlay context → recording sink, on Tokio's paused clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use keyshow_core::keymap::vk;
use keyshow_core::Transition;
use keyshow_overlay::application::display_coordinator::DisplayCoordinator;
use keyshow_overlay::application::overlay_context::{spawn_overlay_context, OverlaySink};
use keyshow_overlay::infrastructure::keyboard_capture::simulated::SimulatedKeyboardListener;
use keyshow_overlay::infrastructure::keyboard_capture::{HookDisposition, KeyboardListener};
use keyshow_overlay::infrastructure::storage::config::{AppConfig, SettingsHandle};
use tokio::time::Instant;

// ── Helpers ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Show(String),
    Clear,
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<(Instant, Call)>>>);

impl Recorder {
    fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
    }

    fn shows(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Show(text) => Some(text),
                Call::Clear => None,
            })
            .collect()
    }

    fn clear_offsets_ms(&self, start: Instant) -> Vec<u128> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, c)| *c == Call::Clear)
            .map(|(at, _)| (*at - start).as_millis())
            .collect()
    }
}

impl OverlaySink for Recorder {
    fn show(&mut self, text: &str) {
        self.0.lock().unwrap().push((Instant::now(), Call::Show(text.to_string())));
    }
    fn clear(&mut self) {
        self.0.lock().unwrap().push((Instant::now(), Call::Clear));
    }
}

struct Pipeline {
    listener: SimulatedKeyboardListener,
    settings: SettingsHandle,
    recorder: Recorder,
    coordinator: tokio::task::JoinHandle<()>,
}

fn start_pipeline(duration_ms: u64) -> Pipeline {
    let mut config = AppConfig::default();
    config.display.duration_ms = duration_ms;
    let settings = SettingsHandle::new(config);

    let listener = SimulatedKeyboardListener::new();
    let events = listener.start().expect("simulated start");

    let recorder = Recorder::default();
    let (overlay, _overlay_task) = spawn_overlay_context(recorder.clone());
    let coordinator = DisplayCoordinator::new(overlay, Arc::new(settings.clone()));
    let coordinator = tokio::spawn(coordinator.run(events));

    Pipeline {
        listener,
        settings,
        recorder,
        coordinator,
    }
}

async fn ms(n: u64) {
    tokio::time::sleep(Duration::from_millis(n)).await;
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_two_presses_clear_once_after_the_last() {
    // Arrange: E1 at t=0, E2 at t=100, duration 500
    let p = start_pipeline(500);
    let start = Instant::now();

    // Act
    let _ = p.listener.tap(vk::VK_A);
    ms(100).await;
    let _ = p.listener.tap(0x42);
    ms(1000).await;

    // Assert
    assert_eq!(p.recorder.shows(), vec!["A", "B"]);
    assert_eq!(p.recorder.clear_offsets_ms(start), vec![600]);
}

#[tokio::test(start_paused = true)]
async fn test_burst_shows_every_press_and_clears_once() {
    // Arrange
    let p = start_pipeline(500);
    let start = Instant::now();
    let keys: Vec<u32> = (vk::VK_A..vk::VK_A + 8).collect();

    // Act: 8 presses spaced 50ms apart (last at t=350)
    for (i, &code) in keys.iter().enumerate() {
        if i > 0 {
            ms(50).await;
        }
        let _ = p.listener.tap(code);
    }
    ms(2000).await;

    // Assert
    let expected: Vec<String> = keys.iter().map(|&c| char::from(c as u8).to_string()).collect();
    assert_eq!(p.recorder.shows(), expected);
    assert_eq!(p.recorder.clear_offsets_ms(start), vec![350 + 500]);
    assert_eq!(p.recorder.calls().last(), Some(&Call::Clear));
}

#[tokio::test(start_paused = true)]
async fn test_modifier_combination_renders_held_modifiers_first() {
    let p = start_pipeline(500);

    let _ = p.listener.inject(vk::VK_LSHIFT, Transition::Down);
    let _ = p.listener.inject(vk::VK_RCONTROL, Transition::Down);
    let _ = p.listener.tap(vk::VK_ESCAPE);
    let _ = p.listener.inject(vk::VK_RCONTROL, Transition::Up);
    let _ = p.listener.inject(vk::VK_LSHIFT, Transition::Up);
    ms(10).await;

    assert_eq!(
        p.recorder.shows(),
        vec!["SHIFT", "SHIFT + CTRL", "CTRL + SHIFT + ESC"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_held_modifier_auto_repeat_shows_once() {
    let p = start_pipeline(500);

    for _ in 0..10 {
        let _ = p.listener.inject(vk::VK_LMENU, Transition::Down);
        ms(30).await;
    }
    let _ = p.listener.inject(vk::VK_LMENU, Transition::Up);
    ms(1000).await;

    assert_eq!(p.recorder.calls(), vec![Call::Show("ALT".to_string()), Call::Clear]);
}

#[tokio::test(start_paused = true)]
async fn test_duration_change_applies_to_next_press_only() {
    // Arrange
    let p = start_pipeline(500);
    let start = Instant::now();

    // Act: first press uses 500ms; the change lands while it is showing
    let _ = p.listener.tap(vk::VK_A);
    ms(100).await;
    p.settings.set_display_duration_ms(200).unwrap();
    ms(1000).await;
    let second_at = Instant::now();
    let _ = p.listener.tap(0x42);
    ms(1000).await;

    // Assert
    let clears = p.recorder.clear_offsets_ms(start);
    assert_eq!(clears.len(), 2);
    assert_eq!(clears[0], 500, "first press keeps the duration read at press time");
    assert_eq!(clears[1], (second_at - start).as_millis() + 200);
}

#[tokio::test(start_paused = true)]
async fn test_every_transition_passes_through() {
    let p = start_pipeline(500);
    let sequence = [
        (vk::VK_LCONTROL, Transition::Down),
        (vk::VK_LCONTROL, Transition::Down),
        (0x43, Transition::Down),
        (0x43, Transition::Up),
        (vk::VK_LCONTROL, Transition::Up),
        (9999, Transition::Down),
        (9999, Transition::Up),
    ];

    for (code, transition) in sequence {
        assert_eq!(p.listener.inject(code, transition), HookDisposition::PassThrough);
    }
    ms(10).await;

    assert_eq!(p.recorder.shows(), vec!["CTRL", "CTRL + C", "VK_9999"]);
}

#[tokio::test(start_paused = true)]
async fn test_stop_ends_the_coordinator_and_nothing_more_is_shown() {
    // Arrange
    let p = start_pipeline(500);
    let _ = p.listener.tap(vk::VK_A);
    ms(10).await;

    // Act
    p.listener.stop();
    let _ = p.listener.tap(0x42);
    p.coordinator.await.expect("coordinator exits cleanly");
    ms(1000).await;

    // Assert: the pending hide still clears the last shown key
    assert_eq!(p.recorder.calls(), vec![Call::Show("A".to_string()), Call::Clear]);
}
