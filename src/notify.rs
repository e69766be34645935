//! Notification gate - explains a veto to the subject unless they opted out
//!
//! At most one message and one cue per call. Nothing is queued or retried:
//! a subject who left the server simply misses the message.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::ConfigError;
use crate::core::types::SubjectId;
use crate::host::{has_capability, Capability, MessageCatalog, MessageSink, PermissionService};

/// Localizable messages the rules can send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKey {
    LimitedEndBuilding,
    StoneMiningHelp,
    NoPlacingOreAgainstStone,
    NoTorchesHere,
    RealisticBuilding,
    LimitedTorchPlacement,
}

impl MessageKey {
    pub const ALL: [MessageKey; 6] = [
        MessageKey::LimitedEndBuilding,
        MessageKey::StoneMiningHelp,
        MessageKey::NoPlacingOreAgainstStone,
        MessageKey::NoTorchesHere,
        MessageKey::RealisticBuilding,
        MessageKey::LimitedTorchPlacement,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MessageKey::LimitedEndBuilding => "limited_end_building",
            MessageKey::StoneMiningHelp => "stone_mining_help",
            MessageKey::NoPlacingOreAgainstStone => "no_placing_ore_against_stone",
            MessageKey::NoTorchesHere => "no_torches_here",
            MessageKey::RealisticBuilding => "realistic_building",
            MessageKey::LimitedTorchPlacement => "limited_torch_placement",
        }
    }

    fn english(&self) -> &'static str {
        match self {
            MessageKey::LimitedEndBuilding => {
                "You may only dig end stone here, stepping down toward the ground."
            }
            MessageKey::StoneMiningHelp => {
                "This stone is too hard. You need an iron or diamond pickaxe; try mining ore first to loosen it."
            }
            MessageKey::NoPlacingOreAgainstStone => "Ore can't be placed against stone.",
            MessageKey::NoTorchesHere => "It's too deep for a simple flame to survive here.",
            MessageKey::RealisticBuilding => "You can't reach that spot to build there.",
            MessageKey::LimitedTorchPlacement => "A torch won't hold on such a soft surface.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sound {
    Fizz,
}

/// An audible feedback cue played at the subject
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    pub sound: Sound,
    pub volume: f32,
    pub pitch: f32,
}

impl Cue {
    pub fn fizz() -> Self {
        Self {
            sound: Sound::Fizz,
            volume: 1.0,
            pitch: 20.0,
        }
    }
}

/// What to tell the subject about a veto
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Notice {
    pub message: MessageKey,
    /// Holding this capability silences the notice
    pub suppressed_by: Option<Capability>,
    pub cue: Option<Cue>,
}

impl Notice {
    /// A notice nobody can opt out of
    pub fn always(message: MessageKey) -> Self {
        Self {
            message,
            suppressed_by: None,
            cue: None,
        }
    }

    pub fn unless(message: MessageKey, capability: Capability) -> Self {
        Self {
            message,
            suppressed_by: Some(capability),
            cue: None,
        }
    }

    pub fn with_cue(mut self, cue: Cue) -> Self {
        self.cue = Some(cue);
        self
    }
}

/// What happened to a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    Suppressed,
    /// The subject could not be reached
    Dropped,
    /// The catalog had no text for the key
    Unresolved,
}

pub fn notify<H>(host: &mut H, subject: SubjectId, notice: &Notice) -> Delivery
where
    H: PermissionService + MessageCatalog + MessageSink + ?Sized,
{
    if let Some(capability) = notice.suppressed_by {
        if has_capability(host, subject, capability) {
            return Delivery::Suppressed;
        }
    }

    let Some(text) = host.resolve(notice.message) else {
        tracing::warn!(message = notice.message.name(), "no text for message");
        return Delivery::Unresolved;
    };

    if !host.send_message(subject, &text) {
        tracing::debug!(
            %subject,
            message = notice.message.name(),
            "subject unreachable, message dropped"
        );
        return Delivery::Dropped;
    }

    if let Some(cue) = notice.cue {
        host.play_cue(subject, cue);
    }
    Delivery::Delivered
}

/// Message catalog backed by a flat TOML table, falling back to English
#[derive(Debug, Clone)]
pub struct TomlCatalog {
    entries: AHashMap<MessageKey, String>,
}

impl TomlCatalog {
    pub fn english() -> Self {
        Self {
            entries: MessageKey::ALL
                .iter()
                .map(|k| (*k, k.english().to_string()))
                .collect(),
        }
    }

    /// Override the English defaults with the keys present in `content`
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = content.parse()?;
        let mut catalog = Self::english();

        for (name, value) in table {
            let key = MessageKey::ALL
                .into_iter()
                .find(|k| k.name() == name)
                .ok_or_else(|| ConfigError::UnknownKey(name.clone()))?;
            let text = value.as_str().ok_or(ConfigError::WrongType {
                key: name.clone(),
                expected: "a string",
            })?;
            catalog.entries.insert(key, text.to_string());
        }

        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

impl Default for TomlCatalog {
    fn default() -> Self {
        Self::english()
    }
}

impl MessageCatalog for TomlCatalog {
    fn resolve(&self, key: MessageKey) -> Option<String> {
        self.entries.get(&key).cloned()
    }
}
