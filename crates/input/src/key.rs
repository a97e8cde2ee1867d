use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// A steering key recognized by the control rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Forward,
    Back,
    Left,
    Right,
}

impl Key {
    pub const ALL: [Key; 4] = [Key::Forward, Key::Back, Key::Left, Key::Right];

    /// Map a DOM-style key code (W, S, A, D) to a steering key.
    pub fn from_key_code(code: u32) -> Option<Self> {
        match code {
            87 => Some(Self::Forward),
            83 => Some(Self::Back),
            65 => Some(Self::Left),
            68 => Some(Self::Right),
            _ => None,
        }
    }

    /// Map a key character, case-insensitively.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'w' => Some(Self::Forward),
            's' => Some(Self::Back),
            'a' => Some(Self::Left),
            'd' => Some(Self::Right),
            _ => None,
        }
    }

    fn bit(self) -> u8 {
        match self {
            Self::Forward => 1,
            Self::Back => 1 << 1,
            Self::Left => 1 << 2,
            Self::Right => 1 << 3,
        }
    }
}

/// Set of currently held steering keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputState {
    held: u8,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keys(keys: &[Key]) -> Self {
        let mut state = Self::new();
        for &key in keys {
            state.press(key);
        }
        state
    }

    /// Parse a key string such as `"wa"`. Unrecognized characters are skipped.
    pub fn from_chars(keys: &str) -> Self {
        let mut state = Self::new();
        for key in keys.chars().filter_map(Key::from_char) {
            state.press(key);
        }
        state
    }

    pub fn press(&mut self, key: Key) {
        self.held |= key.bit();
    }

    pub fn release(&mut self, key: Key) {
        self.held &= !key.bit();
    }

    /// Key-down event by key code. Returns whether the code was recognized.
    pub fn key_down(&mut self, code: u32) -> bool {
        match Key::from_key_code(code) {
            Some(key) => {
                self.press(key);
                true
            }
            None => false,
        }
    }

    /// Key-up event by key code. Returns whether the code was recognized.
    pub fn key_up(&mut self, code: u32) -> bool {
        match Key::from_key_code(code) {
            Some(key) => {
                self.release(key);
                true
            }
            None => false,
        }
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.held & key.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.held == 0
    }

    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        Key::ALL.into_iter().filter(|k| self.is_down(*k))
    }
}

/// Input state shared between an event thread (writer) and the frame loop
/// (reader). The frame loop takes one snapshot per frame.
#[derive(Debug, Clone, Default)]
pub struct SharedInput {
    inner: Arc<Mutex<InputState>>,
}

impl SharedInput {
    pub fn new() -> Self {
        Self::default()
    }

    fn update(&self, f: impl FnOnce(&mut InputState)) {
        let mut guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("input lock poisoned, continuing with last state");
                poisoned.into_inner()
            }
        };
        f(&mut *guard);
    }

    pub fn key_down(&self, code: u32) {
        self.update(|s| {
            s.key_down(code);
        });
    }

    pub fn key_up(&self, code: u32) {
        self.update(|s| {
            s.key_up(code);
        });
    }

    pub fn press(&self, key: Key) {
        self.update(|s| s.press(key));
    }

    pub fn release(&self, key: Key) {
        self.update(|s| s.release(key));
    }

    /// Copy of the current key set.
    pub fn snapshot(&self) -> InputState {
        match self.inner.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
