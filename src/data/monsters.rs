use bracket_random::prelude::RandomNumberGenerator;
use bracket_terminal::prelude::RGB;
use tracing::error;

use super::{CreatureId, ItemId, chance, remap, roll_range, uniform, unit};

pub const MAX_ATTACK_RANGE: i32 = 12;
pub const MIN_ATTACK_RANGE: i32 = 2;
pub const MIN_SIGHT_GAP: i32 = 5;
pub const MAX_SIGHT_RANGE: i32 = 20;
pub const MIN_ATTACK_DAMAGE: i32 = 3;
pub const MAX_ATTACK_DAMAGE: i32 = 8;
pub const MIN_HEALTH: i32 = 5;
pub const MAX_HEALTH: i32 = 60;
pub const DEFAULT_MOVE_SPEED: i32 = 2;

const P_ABNORMAL_SPEED: f32 = 0.2;
const P_FAST_GIVEN_ABNORMAL: f32 = 0.2;
const DIFF_MOD_IF_SLOW: f32 = 0.25;
const DIFF_MOD_IF_FAST: f32 = 4.0;

const INIT_ATTACK_COOLDOWN_MAX: i32 = 2;
const MIN_COOLDOWN_ADDITION: i32 = 2;
const MAX_COOLDOWN_ADDITION: i32 = 6;

const P_HOSTILE_TO_PLAYER: f32 = 0.5;
const P_SEMI_IF_HOSTILE_TO_PLAYER: f32 = 0.2;
const P_SEMI_IF_EVASIVE_TO_PLAYER: f32 = 0.8;

const STANCE_NOISE: f32 = 1.0;
const P_SEMI: f32 = 0.8;

/// How one creature treats another. Semi stances only react once provoked.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Stance {
    Hostile,
    SemiHostile,
    SemiEvasive,
    Evasive,
}

impl Stance {
    pub fn is_semi(self) -> bool {
        matches!(self, Stance::SemiHostile | Stance::SemiEvasive)
    }

    pub fn attacks(self) -> bool {
        matches!(self, Stance::Hostile | Stance::SemiHostile)
    }

    pub fn flees(self) -> bool {
        matches!(self, Stance::Evasive | Stance::SemiEvasive)
    }
}

#[derive(Clone, Debug)]
pub struct CreatureType {
    pub sprite: String,
    pub color: RGB,
    pub move_speed: i32,
    pub attack_range: i32,
    pub sight_range: i32,
    pub attack_damage: i32,
    pub attack_cooldown: i32,
    pub health: i32,
    /// Running difficulty estimate; stays positive.
    pub diff: f32,
    pub player_stance: Stance,
    /// Filled once every creature exists. Indexed by [`CreatureId`].
    pub stances: Option<Vec<Stance>>,
    pub drop: Option<ItemId>,
}

impl CreatureType {
    pub fn generate(rng: &mut RandomNumberGenerator, sprite: &str, color: RGB) -> Self {
        let mut diff = 1.0;

        let move_speed = if chance(rng, P_ABNORMAL_SPEED) {
            if chance(rng, P_FAST_GIVEN_ABNORMAL) {
                diff *= DIFF_MOD_IF_FAST;
                4
            } else {
                diff *= DIFF_MOD_IF_SLOW;
                1
            }
        } else {
            DEFAULT_MOVE_SPEED
        };

        let attack_range = roll_range(
            rng,
            MIN_ATTACK_RANGE,
            (1 + MAX_ATTACK_RANGE).min(1 + (MAX_ATTACK_RANGE as f32 / diff) as i32),
        );
        diff *= remap(
            attack_range as f32,
            MIN_ATTACK_RANGE as f32,
            MAX_ATTACK_RANGE as f32,
            0.5,
            1.5,
        );

        let min_sight = attack_range + MIN_SIGHT_GAP;
        let sight_range = roll_range(
            rng,
            min_sight,
            (1 + MAX_SIGHT_RANGE).min(1 + (MAX_SIGHT_RANGE as f32 / diff) as i32),
        );
        diff *= remap(
            sight_range as f32,
            min_sight as f32,
            MAX_SIGHT_RANGE as f32,
            0.9,
            1.1,
        );

        let damage_low = MIN_ATTACK_DAMAGE
            .max((MIN_ATTACK_DAMAGE as f32 / diff) as i32)
            .min(MAX_ATTACK_DAMAGE);
        let damage_high = (1 + MAX_ATTACK_DAMAGE).min(1 + (MAX_ATTACK_DAMAGE as f32 / diff) as i32);
        let attack_damage = roll_range(rng, damage_low, damage_high);
        diff *= remap(
            attack_damage as f32,
            MIN_ATTACK_DAMAGE as f32,
            MAX_ATTACK_DAMAGE as f32,
            0.5,
            2.0,
        );

        let max_cooldown = MAX_COOLDOWN_ADDITION + INIT_ATTACK_COOLDOWN_MAX;
        let attack_cooldown = (rng.range(0, 1 + INIT_ATTACK_COOLDOWN_MAX)
            + remap(
                diff,
                0.5,
                2.0,
                MIN_COOLDOWN_ADDITION as f32,
                MAX_COOLDOWN_ADDITION as f32,
            ) as i32)
            .clamp(MIN_COOLDOWN_ADDITION, max_cooldown);
        diff *= remap(
            attack_cooldown as f32,
            MIN_COOLDOWN_ADDITION as f32,
            max_cooldown as f32,
            2.0,
            0.5,
        );

        let roll = unit(rng);
        let health = (remap(
            roll * roll / diff,
            0.0,
            2.0,
            MIN_HEALTH as f32,
            (1 + MAX_HEALTH) as f32,
        ) as i32)
            .clamp(MIN_HEALTH, MAX_HEALTH);
        diff *= remap(health as f32, MIN_HEALTH as f32, MAX_HEALTH as f32, 0.5, 3.0);

        let player_stance = roll_player_stance(rng, diff);

        Self {
            sprite: sprite.to_string(),
            color,
            move_speed,
            attack_range,
            sight_range,
            attack_damage,
            attack_cooldown,
            health,
            diff,
            player_stance,
            stances: None,
            drop: None,
        }
    }

    /// Stronger creatures spawn less often.
    pub fn base_spawn_weight(&self) -> f32 {
        remap(self.diff, 0.5, 2.0, 1.0, 0.0).clamp(0.0, 1.0)
    }

    pub fn stance_toward(&self, other: CreatureId) -> Option<Stance> {
        match &self.stances {
            Some(stances) => stances.get(other.0).copied(),
            None => {
                error!(other = other.0, "stances_queried_before_generation");
                None
            }
        }
    }
}

fn roll_player_stance(rng: &mut RandomNumberGenerator, diff: f32) -> Stance {
    if chance(rng, P_HOSTILE_TO_PLAYER * remap(diff, 0.5, 2.0, 0.75, 1.5)) {
        let semi = P_SEMI_IF_HOSTILE_TO_PLAYER * remap((diff - 1.25).abs(), 0.0, 0.75, 1.5, 0.5);
        if chance(rng, semi) {
            Stance::SemiHostile
        } else {
            Stance::Hostile
        }
    } else if chance(rng, P_SEMI_IF_EVASIVE_TO_PLAYER * remap(diff, 0.5, 2.0, 1.1, 0.9)) {
        Stance::SemiEvasive
    } else {
        Stance::SemiHostile
    }
}

/// Fills every creature's stance table. Must run after every `diff` is final.
pub fn generate_stances(creatures: &mut [CreatureType], rng: &mut RandomNumberGenerator) {
    let diffs: Vec<f32> = creatures.iter().map(|creature| creature.diff).collect();
    for (idx, creature) in creatures.iter_mut().enumerate() {
        if creature.stances.is_some() {
            error!(creature = idx, "stances_already_generated");
            continue;
        }
        let stances = diffs
            .iter()
            .map(|other_diff| {
                let gap = other_diff - creature.diff;
                let p_semi = P_SEMI * remap(gap.abs(), 0.0, 2.5, 1.2, 0.8);
                if uniform(rng, -STANCE_NOISE, STANCE_NOISE) + gap > 0.0 {
                    if chance(rng, p_semi) {
                        Stance::SemiHostile
                    } else {
                        Stance::Hostile
                    }
                } else if chance(rng, p_semi) {
                    Stance::SemiEvasive
                } else {
                    Stance::Evasive
                }
            })
            .collect();
        creature.stances = Some(stances);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roll_many(seed: u64, count: usize) -> Vec<CreatureType> {
        let mut rng = RandomNumberGenerator::seeded(seed);
        (0..count)
            .map(|_| CreatureType::generate(&mut rng, "wolf", RGB::from_f32(0.5, 0.5, 0.5)))
            .collect()
    }

    #[test]
    fn stats_respect_their_bands() {
        for creature in roll_many(17, 2000) {
            assert!(creature.diff > 0.0, "diff {}", creature.diff);
            assert!([1, 2, 4].contains(&creature.move_speed));
            assert!((MIN_ATTACK_RANGE..=MAX_ATTACK_RANGE).contains(&creature.attack_range));
            assert!(creature.sight_range - creature.attack_range >= MIN_SIGHT_GAP);
            assert!(creature.sight_range <= MAX_SIGHT_RANGE);
            assert!((MIN_ATTACK_DAMAGE..=MAX_ATTACK_DAMAGE).contains(&creature.attack_damage));
            assert!((2..=8).contains(&creature.attack_cooldown));
            assert!((MIN_HEALTH..=MAX_HEALTH).contains(&creature.health));
        }
    }

    #[test]
    fn stance_table_is_complete_and_generated_once() {
        let mut creatures = roll_many(3, 12);
        let mut rng = RandomNumberGenerator::seeded(3);
        assert_eq!(creatures[0].stance_toward(CreatureId(1)), None);

        generate_stances(&mut creatures, &mut rng);
        let first: Vec<Option<Vec<Stance>>> = creatures.iter().map(|c| c.stances.clone()).collect();
        for creature in &creatures {
            for other in 0..creatures.len() {
                assert!(creature.stance_toward(CreatureId(other)).is_some());
            }
        }

        generate_stances(&mut creatures, &mut rng);
        let second: Vec<Option<Vec<Stance>>> = creatures.iter().map(|c| c.stances.clone()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn stance_helpers() {
        assert!(Stance::SemiHostile.is_semi() && Stance::SemiHostile.attacks());
        assert!(Stance::Evasive.flees() && !Stance::Evasive.is_semi());
        assert!(!Stance::Hostile.flees());
    }
}
