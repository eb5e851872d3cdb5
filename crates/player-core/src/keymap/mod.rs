//! Local key press → remote `hotkey` translation.
//!
//! Key names follow the DOM `KeyboardEvent.key` vocabulary (`"Enter"`,
//! `"ArrowUp"`, `"c"`, `"F5"` …), which is what every windowing toolkit the
//! player is embedded in can produce.
//!
//! Two rules decide whether a key press becomes a remote action:
//!
//! 1. With ctrl, meta or alt held, the press is a combination.  Active
//!    modifiers are written in the fixed order `ctrl cmd alt shift`, followed
//!    by the lower-cased key, all space-joined: `"ctrl shift t"`.
//! 2. Without those modifiers, only the keys in [`FORWARDED_KEYS`] are sent,
//!    lower-cased, as a single-key hotkey.  Ordinary characters are never
//!    forwarded on their own; literal text goes through the explicit `type`
//!    action instead.
//!
//! Shift alone does not make a combination.

/// Non-printable keys forwarded without a modifier.
pub const FORWARDED_KEYS: [&str; 21] = [
    "Enter", "Tab", "Escape", "Backspace", "Delete",
    "ArrowUp", "ArrowDown", "ArrowLeft", "ArrowRight",
    "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10", "F11", "F12",
];

/// One local key-down event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyInput {
    /// DOM-style key name.
    pub key: String,
    pub ctrl: bool,
    /// Command / Windows / Super key.
    pub meta: bool,
    pub alt: bool,
    pub shift: bool,
    /// Focus is on a text-entry control (e.g. the command box).  Such events
    /// never reach the remote host.
    pub in_text_entry: bool,
}

impl KeyInput {
    /// A key press with no modifiers, outside any text-entry control.
    pub fn plain(key: impl Into<String>) -> Self {
        Self { key: key.into(), ..Self::default() }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn in_text_entry(mut self) -> Self {
        self.in_text_entry = true;
        self
    }

    /// Returns `true` if a combination modifier (ctrl, meta or alt) is held.
    pub fn has_combo_modifier(&self) -> bool {
        self.ctrl || self.meta || self.alt
    }
}

/// Returns `true` if `key` is forwarded without a modifier.
pub fn is_forwarded_key(key: &str) -> bool {
    FORWARDED_KEYS.contains(&key)
}

/// Computes the wire `key` string for a key press, or `None` if the press is
/// not forwarded.
pub fn hotkey_for(input: &KeyInput) -> Option<String> {
    if input.in_text_entry || input.key.is_empty() {
        return None;
    }

    if input.has_combo_modifier() {
        let key = input.key.to_lowercase();
        let mut parts: Vec<&str> = Vec::with_capacity(5);
        if input.ctrl {
            parts.push("ctrl");
        }
        if input.meta {
            parts.push("cmd");
        }
        if input.alt {
            parts.push("alt");
        }
        if input.shift {
            parts.push("shift");
        }
        parts.push(&key);
        return Some(parts.join(" "));
    }

    is_forwarded_key(&input.key).then(|| input.key.to_lowercase())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
