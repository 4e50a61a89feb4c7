use std::{fs, path::Path};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{CatalogError, GenerationOptions, TemplateCatalog, recipes::RECIPE_RARITY_MARGIN};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub max_health: i32,
    pub unarmed_damage: i32,
    pub unarmed_range: i32,
    pub attack_cooldown: i32,
    pub pickup_range: i32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: 100,
            unarmed_damage: 1,
            unarmed_range: 3,
            attack_cooldown: 4,
            pickup_range: 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub rules_seed: u64,
    /// Drawn from the clock when absent.
    pub world_seed: Option<u64>,
    pub catalog: TemplateCatalog,
    pub colour_variants: usize,
    pub basic_items_per_template: usize,
    pub seconds_per_turn: f32,
    pub conversion_recipes: bool,
    pub player: PlayerConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rules_seed: 0,
            world_seed: None,
            catalog: TemplateCatalog::default(),
            colour_variants: 3,
            basic_items_per_template: 3,
            seconds_per_turn: 0.1,
            conversion_recipes: true,
            player: PlayerConfig::default(),
        }
    }
}

impl GameConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.catalog.validate(&config.generation_options())?;
        Ok(config)
    }

    pub fn world_seed(&self) -> u64 {
        self.world_seed
            .unwrap_or_else(|| u64::from(Utc::now().timestamp_subsec_millis()))
    }

    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            colour_variants: self.colour_variants,
            basic_items_per_template: self.basic_items_per_template,
            conversion_recipes: self.conversion_recipes,
            recipe_margin: RECIPE_RARITY_MARGIN,
        }
    }
}
