//! Global keyboard shortcut acting as the action control.
//!
//! Reads key events straight from /dev/input, so the user needs to be in the
//! `input` group.

use crate::messages::UiInput;
use anyhow::{Context, Result};
use evdev::{Device, EventSummary, KeyCode};
use std::fmt;
use tokio::sync::mpsc;

/// Modifiers plus one key, e.g. SUPER+ALT+D
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortcut {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
    pub key: KeyCode,
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("CTRL".to_string());
        }
        if self.alt {
            parts.push("ALT".to_string());
        }
        if self.shift {
            parts.push("SHIFT".to_string());
        }
        if self.meta {
            parts.push("SUPER".to_string());
        }
        parts.push(format!("{:?}", self.key).trim_start_matches("KEY_").to_string());
        write!(f, "{}", parts.join("+"))
    }
}

pub fn parse_shortcut(spec: &str) -> Result<Shortcut> {
    let mut ctrl = false;
    let mut alt = false;
    let mut shift = false;
    let mut meta = false;
    let mut key = None;

    for token in spec.split('+').map(|t| t.trim().to_ascii_uppercase()) {
        match token.as_str() {
            "CTRL" | "CONTROL" => ctrl = true,
            "ALT" => alt = true,
            "SHIFT" => shift = true,
            "SUPER" | "META" | "LOGO" => meta = true,
            other => {
                if key.is_some() {
                    anyhow::bail!("Shortcut {:?} has more than one non-modifier key", spec);
                }
                key = Some(
                    key_code(other)
                        .with_context(|| format!("Unknown key {:?} in shortcut {:?}", other, spec))?,
                );
            }
        }
    }

    let key = key.with_context(|| format!("Shortcut {:?} has no key", spec))?;
    Ok(Shortcut {
        ctrl,
        alt,
        shift,
        meta,
        key,
    })
}

fn key_code(name: &str) -> Option<KeyCode> {
    let code = match name {
        "A" => KeyCode::KEY_A,
        "B" => KeyCode::KEY_B,
        "C" => KeyCode::KEY_C,
        "D" => KeyCode::KEY_D,
        "E" => KeyCode::KEY_E,
        "F" => KeyCode::KEY_F,
        "G" => KeyCode::KEY_G,
        "H" => KeyCode::KEY_H,
        "I" => KeyCode::KEY_I,
        "J" => KeyCode::KEY_J,
        "K" => KeyCode::KEY_K,
        "L" => KeyCode::KEY_L,
        "M" => KeyCode::KEY_M,
        "N" => KeyCode::KEY_N,
        "O" => KeyCode::KEY_O,
        "P" => KeyCode::KEY_P,
        "Q" => KeyCode::KEY_Q,
        "R" => KeyCode::KEY_R,
        "S" => KeyCode::KEY_S,
        "T" => KeyCode::KEY_T,
        "U" => KeyCode::KEY_U,
        "V" => KeyCode::KEY_V,
        "W" => KeyCode::KEY_W,
        "X" => KeyCode::KEY_X,
        "Y" => KeyCode::KEY_Y,
        "Z" => KeyCode::KEY_Z,
        "0" => KeyCode::KEY_0,
        "1" => KeyCode::KEY_1,
        "2" => KeyCode::KEY_2,
        "3" => KeyCode::KEY_3,
        "4" => KeyCode::KEY_4,
        "5" => KeyCode::KEY_5,
        "6" => KeyCode::KEY_6,
        "7" => KeyCode::KEY_7,
        "8" => KeyCode::KEY_8,
        "9" => KeyCode::KEY_9,
        "SPACE" => KeyCode::KEY_SPACE,
        "ENTER" => KeyCode::KEY_ENTER,
        "F1" => KeyCode::KEY_F1,
        "F2" => KeyCode::KEY_F2,
        "F3" => KeyCode::KEY_F3,
        "F4" => KeyCode::KEY_F4,
        "F5" => KeyCode::KEY_F5,
        "F6" => KeyCode::KEY_F6,
        "F7" => KeyCode::KEY_F7,
        "F8" => KeyCode::KEY_F8,
        "F9" => KeyCode::KEY_F9,
        "F10" => KeyCode::KEY_F10,
        "F11" => KeyCode::KEY_F11,
        "F12" => KeyCode::KEY_F12,
        _ => return None,
    };
    Some(code)
}

/// Tracks held modifiers and reports presses of the shortcut
#[derive(Debug)]
struct ShortcutDetector {
    shortcut: Shortcut,
    left_ctrl: bool,
    right_ctrl: bool,
    left_alt: bool,
    right_alt: bool,
    left_shift: bool,
    right_shift: bool,
    left_meta: bool,
    right_meta: bool,
}

impl ShortcutDetector {
    fn new(shortcut: Shortcut) -> Self {
        Self {
            shortcut,
            left_ctrl: false,
            right_ctrl: false,
            left_alt: false,
            right_alt: false,
            left_shift: false,
            right_shift: false,
            left_meta: false,
            right_meta: false,
        }
    }

    /// `value`: 0 = released, 1 = pressed, 2 = repeat
    fn process_key(&mut self, key: KeyCode, value: i32) -> bool {
        let pressed = value != 0;

        match key {
            KeyCode::KEY_LEFTCTRL => self.left_ctrl = pressed,
            KeyCode::KEY_RIGHTCTRL => self.right_ctrl = pressed,
            KeyCode::KEY_LEFTALT => self.left_alt = pressed,
            KeyCode::KEY_RIGHTALT => self.right_alt = pressed,
            KeyCode::KEY_LEFTSHIFT => self.left_shift = pressed,
            KeyCode::KEY_RIGHTSHIFT => self.right_shift = pressed,
            KeyCode::KEY_LEFTMETA => self.left_meta = pressed,
            KeyCode::KEY_RIGHTMETA => self.right_meta = pressed,
            _ => {
                return value == 1
                    && key == self.shortcut.key
                    && (self.left_ctrl || self.right_ctrl) == self.shortcut.ctrl
                    && (self.left_alt || self.right_alt) == self.shortcut.alt
                    && (self.left_shift || self.right_shift) == self.shortcut.shift
                    && (self.left_meta || self.right_meta) == self.shortcut.meta;
            }
        }

        false
    }
}

fn find_keyboards() -> Vec<Device> {
    evdev::enumerate()
        .filter_map(|(path, device)| {
            let is_keyboard = device.supported_keys().is_some_and(|keys| {
                keys.contains(KeyCode::KEY_ENTER) && keys.contains(KeyCode::KEY_A)
            });

            if is_keyboard {
                tracing::info!(
                    "Found keyboard device: {:?} ({})",
                    path,
                    device.name().unwrap_or("Unknown")
                );
                Some(device)
            } else {
                None
            }
        })
        .collect()
}

/// Send a click each time the shortcut is pressed on any keyboard
pub async fn monitor_keyboards(shortcut: Shortcut, tx: mpsc::Sender<UiInput>) -> Result<()> {
    let keyboards = find_keyboards();
    if keyboards.is_empty() {
        anyhow::bail!(
            "No keyboard devices readable; add yourself to the 'input' group to use {}",
            shortcut
        );
    }

    tracing::info!(
        "Watching {} keyboard(s) for {}",
        keyboards.len(),
        shortcut
    );

    let monitors = keyboards
        .into_iter()
        .map(|device| tokio::spawn(monitor_device(device, shortcut, tx.clone())));

    for result in futures::future::join_all(monitors).await {
        match result {
            Ok(Err(e)) => tracing::warn!("Keyboard monitor stopped: {}", e),
            Err(e) => tracing::warn!("Keyboard monitor task failed: {}", e),
            Ok(Ok(())) => {}
        }
    }

    Ok(())
}

async fn monitor_device(device: Device, shortcut: Shortcut, tx: mpsc::Sender<UiInput>) -> Result<()> {
    let name = device.name().unwrap_or("Unknown").to_string();
    let mut events = device
        .into_event_stream()
        .with_context(|| format!("Failed to open event stream for {}", name))?;
    let mut detector = ShortcutDetector::new(shortcut);

    loop {
        let event = events
            .next_event()
            .await
            .with_context(|| format!("Failed to read events from {}", name))?;

        if let EventSummary::Key(_, key, value) = event.destructure() {
            if detector.process_key(key, value) {
                tracing::debug!("Shortcut pressed on {}", name);
                if tx.send(UiInput::Click).await.is_err() {
                    return Ok(());
                }
            }
        }
    }
}
