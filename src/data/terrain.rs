use bracket_random::prelude::RandomNumberGenerator;
use bracket_terminal::prelude::RGB;

use super::{CreatureId, ItemId, chance, items::ItemType, weighted_pick};

pub const DEFAULT_TERRAIN_SPEED: i32 = 2;
pub const MAX_DAMAGE_PER_TURN: i32 = 2;

const P_ABNORMAL_SPEED: f32 = 0.3;
const ABNORMAL_SPEED_RARITY_MOD: f32 = 0.5;
const P_DAMAGE_PER_TURN: f32 = 0.2;
const RARITY_MOD_PER_DAMAGE: f32 = 0.5;

#[derive(Clone, Debug)]
pub struct TerrainType {
    pub sprite: String,
    pub color: RGB,
    pub terrain_speed: i32,
    pub damage_per_turn: i32,
    /// Below 1 means rarer than plain terrain.
    pub rarity: f32,
    /// Indexed by [`CreatureId`].
    pub spawn_weights: Vec<f32>,
    pub items_found_here: Vec<ItemId>,
}

impl TerrainType {
    pub fn generate(rng: &mut RandomNumberGenerator, sprite: &str, color: RGB) -> Self {
        let mut rarity = 1.0;

        let terrain_speed = if chance(rng, P_ABNORMAL_SPEED) {
            rarity *= ABNORMAL_SPEED_RARITY_MOD;
            if chance(rng, 0.5) { 1 } else { 4 }
        } else {
            DEFAULT_TERRAIN_SPEED
        };

        let damage_per_turn = if chance(rng, P_DAMAGE_PER_TURN) {
            let damage = rng.range(1, MAX_DAMAGE_PER_TURN + 1);
            rarity *= RARITY_MOD_PER_DAMAGE.powi(damage);
            damage
        } else {
            0
        };

        Self {
            sprite: sprite.to_string(),
            color,
            terrain_speed,
            damage_per_turn,
            rarity,
            spawn_weights: Vec::new(),
            items_found_here: Vec::new(),
        }
    }

    pub fn random_creature(&self, rng: &mut RandomNumberGenerator) -> Option<CreatureId> {
        let candidates: Vec<(CreatureId, f32)> = self
            .spawn_weights
            .iter()
            .enumerate()
            .map(|(idx, weight)| (CreatureId(idx), *weight))
            .collect();
        weighted_pick(rng, &candidates, "terrain_creature")
    }

    /// Rarer items turn up less often.
    pub fn random_item(&self, rng: &mut RandomNumberGenerator, items: &[ItemType]) -> Option<ItemId> {
        let candidates: Vec<(ItemId, f32)> = self
            .items_found_here
            .iter()
            .filter_map(|id| items.get(id.0).map(|item| (*id, 1.0 / item.rarity.max(f32::EPSILON))))
            .collect();
        weighted_pick(rng, &candidates, "terrain_item")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolled_stats_stay_in_bounds() {
        let mut rng = RandomNumberGenerator::seeded(99);
        for _ in 0..500 {
            let terrain = TerrainType::generate(&mut rng, "grass", RGB::from_f32(0.1, 0.8, 0.1));
            assert!([1, 2, 4].contains(&terrain.terrain_speed));
            assert!((0..=MAX_DAMAGE_PER_TURN).contains(&terrain.damage_per_turn));
            let mut expected = 1.0;
            if terrain.terrain_speed != DEFAULT_TERRAIN_SPEED {
                expected *= ABNORMAL_SPEED_RARITY_MOD;
            }
            expected *= RARITY_MOD_PER_DAMAGE.powi(terrain.damage_per_turn);
            assert!((terrain.rarity - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn empty_weights_spawn_nothing() {
        let mut rng = RandomNumberGenerator::seeded(1);
        let mut terrain = TerrainType::generate(&mut rng, "sand", RGB::from_f32(0.9, 0.9, 0.5));
        terrain.spawn_weights = vec![0.0, 0.0];
        assert_eq!(terrain.random_creature(&mut rng), None);
        assert_eq!(terrain.random_item(&mut rng, &[]), None);
    }

    #[test]
    fn creature_pick_respects_weights() {
        let mut rng = RandomNumberGenerator::seeded(4);
        let mut terrain = TerrainType::generate(&mut rng, "sand", RGB::from_f32(0.9, 0.9, 0.5));
        terrain.spawn_weights = vec![0.0, 0.3, 0.0];
        for _ in 0..20 {
            assert_eq!(terrain.random_creature(&mut rng), Some(CreatureId(1)));
        }
    }
}
