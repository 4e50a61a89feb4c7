use bracket_random::prelude::RandomNumberGenerator;
use bracket_terminal::prelude::RGB;

use super::{ItemId, remap, unit};

/// Stat ceilings and rarity multipliers for one family of items.
struct ItemBlueprint {
    max_health_effect: i32,
    health_rarity_mod: f32,
    max_melee_damage: i32,
    melee_damage_rarity_mod: f32,
    melee_damage_rarity_high: f32,
    max_melee_range: i32,
    melee_range_rarity_mod: f32,
    melee_range_rarity_high: f32,
    max_throw_damage: i32,
    throw_damage_rarity_mod: f32,
    throw_damage_rarity_high: f32,
    max_throw_range: i32,
    throw_range_rarity_mod: f32,
    throw_range_rarity_high: f32,
    rarity_divisor: f32,
}

const MIN_THROW_RANGE_ABOVE_MELEE: i32 = 3;

const BASIC: ItemBlueprint = ItemBlueprint {
    max_health_effect: 20,
    health_rarity_mod: 1.1,
    max_melee_damage: 5,
    melee_damage_rarity_mod: 1.2,
    melee_damage_rarity_high: 2.4,
    max_melee_range: 4,
    melee_range_rarity_mod: 1.2,
    melee_range_rarity_high: 2.4,
    max_throw_damage: 5,
    throw_damage_rarity_mod: 1.4,
    throw_damage_rarity_high: 2.7,
    max_throw_range: 12,
    throw_range_rarity_mod: 1.05,
    throw_range_rarity_high: 2.7,
    rarity_divisor: 1.0,
};

const CRAFTED: ItemBlueprint = ItemBlueprint {
    max_health_effect: 50,
    health_rarity_mod: 1.01,
    max_melee_damage: 50,
    melee_damage_rarity_mod: 1.0001,
    melee_damage_rarity_high: 10.0,
    max_melee_range: 5,
    melee_range_rarity_mod: 1.1,
    melee_range_rarity_high: 10.0,
    max_throw_damage: 30,
    throw_damage_rarity_mod: 1.035,
    throw_damage_rarity_high: 20.0,
    max_throw_range: 15,
    throw_range_rarity_mod: 1.05,
    throw_range_rarity_high: 30.0,
    rarity_divisor: 3.0,
};

#[derive(Clone, Debug)]
pub struct ItemType {
    pub id: ItemId,
    pub sprite: String,
    pub color: RGB,
    /// Negative values hurt when eaten.
    pub health_effect: i32,
    pub melee_range: i32,
    pub melee_damage: i32,
    pub throw_range: i32,
    pub throw_damage: i32,
    pub rarity: f32,
    pub crafted: bool,
}

impl ItemType {
    pub fn generate_basic(id: ItemId, rng: &mut RandomNumberGenerator) -> Self {
        Self::roll(id, &BASIC, false, rng)
    }

    pub fn generate_crafted(id: ItemId, rng: &mut RandomNumberGenerator) -> Self {
        Self::roll(id, &CRAFTED, true, rng)
    }

    fn roll(id: ItemId, blueprint: &ItemBlueprint, crafted: bool, rng: &mut RandomNumberGenerator) -> Self {
        let mut rarity = 1.0f32;

        let health = unit(rng);
        let health_effect = (blueprint.max_health_effect as f32 * (health.powi(3) - 0.2)) as i32;
        rarity *= blueprint.health_rarity_mod.powi(health_effect);

        let melee_damage = ((blueprint.max_melee_damage as f32
            * unit(rng)
            * remap(rarity, 0.8, blueprint.melee_damage_rarity_high, 1.0, -0.3)) as i32)
            .max(1);
        rarity *= blueprint.melee_damage_rarity_mod.powi(melee_damage);

        let melee_range = ((blueprint.max_melee_range as f32
            * unit(rng)
            * remap(rarity, 0.8, blueprint.melee_range_rarity_high, 1.0, 0.1)) as i32)
            .max(1);
        rarity *= blueprint.melee_range_rarity_mod.powi(melee_range - 2);

        let throw_damage = ((blueprint.max_throw_damage as f32
            * unit(rng)
            * remap(rarity, 0.75, blueprint.throw_damage_rarity_high, 1.0, 0.1)) as i32)
            .max(1);
        rarity *= blueprint.throw_damage_rarity_mod.powi(throw_damage - 2);

        let min_throw = melee_range + MIN_THROW_RANGE_ABOVE_MELEE;
        let max_throw = blueprint.max_throw_range.max(min_throw);
        let throw_roll = unit(rng) * remap(rarity, 0.75, blueprint.throw_range_rarity_high, 1.0, 0.5);
        let throw_range = (remap(throw_roll, 0.0, 1.0, min_throw as f32, max_throw as f32) as i32)
            .clamp(min_throw, max_throw);
        let throw_midpoint = (blueprint.max_throw_range - melee_range - MIN_THROW_RANGE_ABOVE_MELEE) / 2;
        rarity *= blueprint.throw_range_rarity_mod.powi(throw_range - throw_midpoint);

        Self {
            id,
            sprite: String::new(),
            color: RGB::from_f32(1.0, 1.0, 1.0),
            health_effect,
            melee_range,
            melee_damage,
            throw_range,
            throw_damage,
            rarity: rarity / blueprint.rarity_divisor,
            crafted,
        }
    }
}
