//! Procedurally generated rulesets and an endless, turn-based world to play
//! them in.

pub mod ai;
pub mod clock;
pub mod config;
pub mod data;
pub mod ecs;
pub mod game;
pub mod grid;
pub mod inventory;
pub mod map;
pub mod render;
pub mod scripted_input;

pub use config::{ConfigError, GameConfig, PlayerConfig};
pub use game::{Game, PlayerCommand};
