//! Remote-control key codes and press directions.
//!
//! Values are Android `KeyEvent` key codes; the peer matches them exactly.

use std::fmt;
use std::str::FromStr;

use crate::error::ProtoError;

/// A remote-control button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum KeyCode {
    Home = 3,
    Back = 4,
    DpadUp = 19,
    DpadDown = 20,
    DpadLeft = 21,
    DpadRight = 22,
    DpadCenter = 23,
    VolumeUp = 24,
    VolumeDown = 25,
    Power = 26,
    PlayPause = 85,
    MediaNext = 87,
    MediaPrevious = 88,
    Play = 126,
    Pause = 127,
    Mute = 164,
    /// Power off.
    Sleep = 223,
    /// Power on.
    Wakeup = 224,
}

impl KeyCode {
    pub const ALL: [KeyCode; 18] = [
        KeyCode::Home,
        KeyCode::Back,
        KeyCode::DpadUp,
        KeyCode::DpadDown,
        KeyCode::DpadLeft,
        KeyCode::DpadRight,
        KeyCode::DpadCenter,
        KeyCode::VolumeUp,
        KeyCode::VolumeDown,
        KeyCode::Power,
        KeyCode::PlayPause,
        KeyCode::MediaNext,
        KeyCode::MediaPrevious,
        KeyCode::Play,
        KeyCode::Pause,
        KeyCode::Mute,
        KeyCode::Sleep,
        KeyCode::Wakeup,
    ];

    /// Numeric key code sent in field 1 of the key-inject message.
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Lower snake-case name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            KeyCode::Home => "home",
            KeyCode::Back => "back",
            KeyCode::DpadUp => "dpad_up",
            KeyCode::DpadDown => "dpad_down",
            KeyCode::DpadLeft => "dpad_left",
            KeyCode::DpadRight => "dpad_right",
            KeyCode::DpadCenter => "dpad_center",
            KeyCode::VolumeUp => "volume_up",
            KeyCode::VolumeDown => "volume_down",
            KeyCode::Power => "power",
            KeyCode::PlayPause => "play_pause",
            KeyCode::MediaNext => "media_next",
            KeyCode::MediaPrevious => "media_previous",
            KeyCode::Play => "play",
            KeyCode::Pause => "pause",
            KeyCode::Mute => "mute",
            KeyCode::Sleep => "sleep",
            KeyCode::Wakeup => "wakeup",
        }
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeyCode {
    type Err = ProtoError;

    /// Parse a key name case-insensitively. `-` and `_` are interchangeable,
    /// and a leading `KEYCODE_` prefix is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        let normalized = normalized.strip_prefix("keycode_").unwrap_or(&normalized);
        let normalized = match normalized {
            "media_play_pause" => "play_pause",
            "media_play" => "play",
            "media_pause" => "pause",
            "power_on" => "wakeup",
            "power_off" => "sleep",
            other => other,
        };
        KeyCode::ALL
            .into_iter()
            .find(|key| key.name() == normalized)
            .ok_or_else(|| ProtoError::UnknownKey(s.to_string()))
    }
}

/// Press direction carried in field 2 of the key-inject message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum Direction {
    Down = 1,
    Up = 2,
    /// Atomic press-and-release.
    #[default]
    Short = 3,
}

impl Direction {
    pub fn code(self) -> u32 {
        self as u32
    }
}
