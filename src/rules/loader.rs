//! Load rule configuration from TOML files
//!
//! The file is a flat table of option names:
//!
//! ```toml
//! worlds = ["world", "world_nether"]
//! super_hard_stone = true
//! iron_pick_durability_penalty = 32
//! broken_netherrack_catches_fire_percent = 20
//! ```
//!
//! Missing keys keep their defaults. Unknown keys and values of the wrong type
//! are errors, so a typo never silently disables a rule.

use std::fs;
use std::path::Path;

use crate::core::config::{BoolKey, IntKey, PercentKey, RuleConfig, SetKey};
use crate::core::error::ConfigError;

/// Load a rule config file
pub fn load_rule_config(path: &Path) -> Result<RuleConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_rule_config(&content)?;
    tracing::info!(path = %path.display(), "loaded rule config");
    Ok(config)
}

pub fn parse_rule_config(content: &str) -> Result<RuleConfig, ConfigError> {
    let table: toml::Table = content.parse()?;
    let mut config = RuleConfig::default();

    for (name, value) in &table {
        config = apply_key(config, name, value)?;
    }

    Ok(config)
}

fn apply_key(
    config: RuleConfig,
    name: &str,
    value: &toml::Value,
) -> Result<RuleConfig, ConfigError> {
    let wrong_type = |expected| ConfigError::WrongType {
        key: name.to_string(),
        expected,
    };

    if let Some(key) = BoolKey::ALL.into_iter().find(|k| k.name() == name) {
        let flag = value.as_bool().ok_or_else(|| wrong_type("a boolean"))?;
        return Ok(config.with_bool(key, flag));
    }

    if let Some(key) = IntKey::ALL.into_iter().find(|k| k.name() == name) {
        let number = value.as_integer().ok_or_else(|| wrong_type("an integer"))?;
        return Ok(config.with_int(key, number));
    }

    if let Some(key) = PercentKey::ALL.into_iter().find(|k| k.name() == name) {
        let number = value.as_integer().ok_or_else(|| wrong_type("an integer percentage"))?;
        return Ok(config.with_percent(key, number.clamp(0, 100) as u8));
    }

    if let Some(key) = SetKey::ALL.into_iter().find(|k| k.name() == name) {
        let items = value.as_array().ok_or_else(|| wrong_type("an array of strings"))?;
        let names = items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<String>>>()
            .ok_or_else(|| wrong_type("an array of strings"))?;
        return Ok(config.with_string_set(key, names));
    }

    Err(ConfigError::UnknownKey(name.to_string()))
}
