//! Remote-control keys understood by the device driver

use crate::errors::AutomationError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Pause after each key press so the device UI can catch up.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// The fixed remote-control command set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteKey {
    Home,
    Rev,
    Fwd,
    Play,
    Select,
    Left,
    Right,
    Down,
    Up,
    Back,
    InstantReplay,
    Info,
    Backspace,
    Search,
    Enter,
}

impl RemoteKey {
    pub const ALL: [RemoteKey; 15] = [
        RemoteKey::Home,
        RemoteKey::Rev,
        RemoteKey::Fwd,
        RemoteKey::Play,
        RemoteKey::Select,
        RemoteKey::Left,
        RemoteKey::Right,
        RemoteKey::Down,
        RemoteKey::Up,
        RemoteKey::Back,
        RemoteKey::InstantReplay,
        RemoteKey::Info,
        RemoteKey::Backspace,
        RemoteKey::Search,
        RemoteKey::Enter,
    ];

    /// Name as sent to the driver
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteKey::Home => "Home",
            RemoteKey::Rev => "Rev",
            RemoteKey::Fwd => "Fwd",
            RemoteKey::Play => "Play",
            RemoteKey::Select => "Select",
            RemoteKey::Left => "Left",
            RemoteKey::Right => "Right",
            RemoteKey::Down => "Down",
            RemoteKey::Up => "Up",
            RemoteKey::Back => "Back",
            RemoteKey::InstantReplay => "InstantReplay",
            RemoteKey::Info => "Info",
            RemoteKey::Backspace => "Backspace",
            RemoteKey::Search => "Search",
            RemoteKey::Enter => "Enter",
        }
    }
}

impl fmt::Display for RemoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper-cases the first character and leaves the rest untouched.
pub fn normalize_key_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl FromStr for RemoteKey {
    type Err = AutomationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_key_name(s);
        RemoteKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == normalized)
            .ok_or_else(|| {
                let allowed: Vec<&str> = RemoteKey::ALL.iter().map(|k| k.as_str()).collect();
                AutomationError::InvalidInput(format!(
                    "Invalid key: '{}'. Must be one of: {}",
                    s,
                    allowed.join(", ")
                ))
            })
    }
}
