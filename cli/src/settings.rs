use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use sweeper_core::{BattlefieldConfig, Difficulty};

/// Board selection and seed, read from a TOML file and from the command line.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub difficulty: Option<Difficulty>,
    pub battlefield: Option<BattlefieldConfig>,
    pub seed: Option<u64>,
}

impl Settings {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Could not read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Layers `overrides` on top of `self`. Choosing a board in `overrides` replaces the whole board choice.
    pub fn merge(self, overrides: Settings) -> Settings {
        let board_overridden = overrides.difficulty.is_some() || overrides.battlefield.is_some();
        let (difficulty, battlefield) = if board_overridden {
            (overrides.difficulty, overrides.battlefield)
        } else {
            (self.difficulty, self.battlefield)
        };
        Settings {
            difficulty,
            battlefield,
            seed: overrides.seed.or(self.seed),
        }
    }

    /// A custom battlefield wins over a difficulty preset.
    pub fn battlefield_config(&self) -> BattlefieldConfig {
        self.battlefield
            .or_else(|| self.difficulty.map(Difficulty::config))
            .unwrap_or_default()
    }
}
