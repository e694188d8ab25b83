/// Keyboard and focus tracker.
///
/// Tracks which keys are currently held down, enabling:
///   - Continuous walking while A/D or the arrows are held
///   - Edge-triggered action and pause (only fire on the initial press)
///   - Held jump, so a jump fires as soon as the cooldown allows
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.
///
/// In the fallback a held key goes quiet between its first press and the
/// terminal's first auto-repeat, long enough for the hold to time out. So a
/// key only counts as freshly pressed again once it has been silent for
/// `REPRESS_GRACE`. Two taps closer together than that read as one press.
///
/// Terminal focus changes are reported through `focus_lost` / `focus_gained`
/// for the frame they arrive in. Losing focus also forgets every held key,
/// since their Release events go to another window.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, poll};

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

/// Silence needed before a Press counts as fresh again in the fallback.
/// Longer than common auto-repeat delays (X11 defaults to 660 ms).
const REPRESS_GRACE: Duration = Duration::from_millis(700);

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that transitioned from "not held" → "held" during the
    /// most recent drain_events() call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    pub raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,

    pub focus_lost: bool,
    pub focus_gained: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
            focus_lost: false,
            focus_gained: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the simulation step.
    pub fn drain_events(&mut self) {
        self.begin_frame();

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(ev) => self.handle_event(ev),
                Err(e) => {
                    log::warn!("terminal event read failed: {e}");
                    break;
                }
            }
        }

        self.expire(Instant::now());
    }

    pub(crate) fn begin_frame(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();
        self.focus_lost = false;
        self.focus_gained = false;
    }

    pub(crate) fn handle_event(&mut self, ev: Event) {
        match ev {
            Event::Key(key) => {
                self.raw_events.push(key);

                match key.kind {
                    KeyEventKind::Release if self.honor_release => {
                        self.last_active.remove(&key.code);
                    }
                    KeyEventKind::Release => {
                        // Enhancement not confirmed: rely on timeout expiry
                    }
                    _ => {
                        let was_held = self.recently_active(key.code);
                        self.last_active.insert(key.code, Instant::now());
                        if !was_held {
                            self.fresh_presses.push(key.code);
                        }
                    }
                }
            }
            Event::FocusLost => {
                self.focus_lost = true;
                self.last_active.clear();
            }
            Event::FocusGained => {
                self.focus_gained = true;
            }
            _ => {}
        }
    }

    /// Forget keys silent for longer than the repress grace (fallback for
    /// terminals without Release). With Release events honored, keys stay
    /// held until released.
    fn expire(&mut self, now: Instant) {
        if self.honor_release { return; }
        self.last_active.retain(|_, t| now.duration_since(*t) < REPRESS_GRACE);
    }

    /// Would a Press of this key continue an existing hold?
    fn recently_active(&self, code: KeyCode) -> bool {
        match self.last_active.get(&code) {
            Some(_) if self.honor_release => true,
            Some(t) => t.elapsed() < REPRESS_GRACE,
            None => false,
        }
    }

    /// Is this key currently held down?
    pub fn is_held(&self, code: KeyCode) -> bool {
        match self.last_active.get(&code) {
            Some(_) if self.honor_release => true,
            Some(t) => t.elapsed() < HOLD_TIMEOUT,
            None => false,
        }
    }

    /// Convenience: is any of these keys held?
    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    /// Convenience: was any of these keys freshly pressed?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}
