//! Gesture disambiguation: local pointer / wheel / key events → remote actions.
//!
//! # The press–move–release problem
//!
//! Toolkits report a plain click as `down → up → click` and a drag as
//! `down → move* → up → click`.  The trailing `click` after a drag must not
//! become a remote click, or every drag would end with a stray click at the
//! drop point.  The translator therefore keeps an explicit phase:
//!
//! ```text
//! Idle ──down (primary)──► Pressed ──up, not armed──► Idle
//!                            │
//!                            ├─ move > 5 units ──► Pressed (drag armed)
//!                            ├─ leave / disable ──► Idle   (no action)
//!                            └─ up, armed ──► SuppressNextClick ──next click──► Idle
//! ```
//!
//! For one down→up sequence at most one of `click` or `drag` is produced.
//! Double-click, right-click, wheel and keys are independent and are never
//! suppressed.
//!
//! Coordinates are mapped through a [`CoordinateMapper`] at the moment of
//! each event.  When no mapping is available (no frame yet) the action is
//! suppressed.

use tracing::debug;

use crate::domain::geometry::{CoordinateMapper, LocalPoint, RemotePoint};
use crate::keymap::{hotkey_for, KeyInput};
use crate::protocol::messages::{Action, ScrollDirection};

/// Movement (in local display units) that must be exceeded before a press
/// becomes a drag.
pub const DRAG_THRESHOLD: f64 = 5.0;

/// Pointer button that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

/// State for one press of the primary button.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PressSession {
    start_local: LocalPoint,
    /// `None` if no mapping was available when the press began.
    start_remote: Option<RemotePoint>,
    /// Set once the pointer moved more than [`DRAG_THRESHOLD`] away from
    /// `start_local`.  Never cleared for the rest of the press.
    drag_armed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    Pressed(PressSession),
    /// A drag just completed; the next click event is its synthetic echo.
    SuppressNextClick,
}

/// Observable phase, for status displays and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Pressed { drag_armed: bool },
    SuppressNextClick,
}

/// Turns raw local input into at most one remote [`Action`] per event.
#[derive(Debug, Clone)]
pub struct GestureTranslator {
    phase: Phase,
    enabled: bool,
}

impl GestureTranslator {
    /// Creates a disabled translator.  Input is enabled when the connection
    /// opens.
    pub fn new() -> Self {
        Self { phase: Phase::Idle, enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables input handling.  Disabling cancels any open press.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.phase = Phase::Idle;
        }
    }

    pub fn phase(&self) -> GesturePhase {
        match self.phase {
            Phase::Idle => GesturePhase::Idle,
            Phase::Pressed(session) => GesturePhase::Pressed { drag_armed: session.drag_armed },
            Phase::SuppressNextClick => GesturePhase::SuppressNextClick,
        }
    }

    /// Opens a press session for the primary button.
    pub fn pointer_down(&mut self, button: PointerButton, at: LocalPoint, mapper: &dyn CoordinateMapper) {
        if !self.enabled || button != PointerButton::Primary {
            return;
        }
        self.phase = Phase::Pressed(PressSession {
            start_local: at,
            start_remote: mapper.map_to_remote(at),
            drag_armed: false,
        });
    }

    /// Arms the drag once the pointer has moved past the threshold.
    pub fn pointer_move(&mut self, at: LocalPoint) {
        if !self.enabled {
            return;
        }
        if let Phase::Pressed(ref mut session) = self.phase {
            if !session.drag_armed && session.start_local.distance_to(at) > DRAG_THRESHOLD {
                session.drag_armed = true;
            }
        }
    }

    /// Closes the press session.  Returns a `drag` action if the drag was
    /// armed; a plain press produces nothing here (the click event follows).
    pub fn pointer_up(
        &mut self,
        button: PointerButton,
        at: LocalPoint,
        mapper: &dyn CoordinateMapper,
    ) -> Option<Action> {
        if !self.enabled || button != PointerButton::Primary {
            return None;
        }
        let Phase::Pressed(session) = self.phase else {
            return None;
        };

        if !session.drag_armed {
            self.phase = Phase::Idle;
            return None;
        }

        self.phase = Phase::SuppressNextClick;
        match (session.start_remote, mapper.map_to_remote(at)) {
            (Some(start), Some(end)) => Some(Action::Drag {
                start_x: start.x,
                start_y: start.y,
                end_x: end.x,
                end_y: end.y,
            }),
            _ => {
                debug!("drag suppressed: no coordinate mapping available");
                None
            }
        }
    }

    /// The pointer left the surface: cancels any press without emitting.
    pub fn pointer_leave(&mut self) {
        self.phase = Phase::Idle;
    }

    /// A click event.  Swallowed once right after a completed drag.
    pub fn click(&mut self, button: PointerButton, at: LocalPoint, mapper: &dyn CoordinateMapper) -> Option<Action> {
        if !self.enabled || button != PointerButton::Primary {
            return None;
        }
        if self.phase == Phase::SuppressNextClick {
            self.phase = Phase::Idle;
            return None;
        }
        let point = map_or_log(mapper, at, "click")?;
        Some(Action::Click { x: point.x, y: point.y })
    }

    pub fn double_click(&mut self, at: LocalPoint, mapper: &dyn CoordinateMapper) -> Option<Action> {
        if !self.enabled {
            return None;
        }
        let point = map_or_log(mapper, at, "double_click")?;
        Some(Action::DoubleClick { x: point.x, y: point.y })
    }

    pub fn right_click(&mut self, at: LocalPoint, mapper: &dyn CoordinateMapper) -> Option<Action> {
        if !self.enabled {
            return None;
        }
        let point = map_or_log(mapper, at, "right_click")?;
        Some(Action::RightClick { x: point.x, y: point.y })
    }

    /// A wheel event.  Negative `delta_y` scrolls up.
    pub fn wheel(&mut self, at: LocalPoint, delta_y: f64, mapper: &dyn CoordinateMapper) -> Option<Action> {
        if !self.enabled {
            return None;
        }
        let point = map_or_log(mapper, at, "scroll")?;
        Some(Action::Scroll { x: point.x, y: point.y, direction: ScrollDirection::from_delta(delta_y) })
    }

    /// A key-down event.  See [`crate::keymap`] for which presses forward.
    pub fn key_down(&mut self, input: &KeyInput) -> Option<Action> {
        if !self.enabled {
            return None;
        }
        hotkey_for(input).map(|key| Action::Hotkey { key })
    }
}

impl Default for GestureTranslator {
    fn default() -> Self {
        Self::new()
    }
}

fn map_or_log(mapper: &dyn CoordinateMapper, at: LocalPoint, kind: &str) -> Option<RemotePoint> {
    let mapped = mapper.map_to_remote(at);
    if mapped.is_none() {
        debug!(kind, x = at.x, y = at.y, "action suppressed: no coordinate mapping available");
    }
    mapped
}

// ── Tests ─────────────────────────────────────────────────────────────────────
