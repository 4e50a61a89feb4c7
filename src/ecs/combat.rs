use crate::{
    config::PlayerConfig,
    data::{items::ItemType, monsters::CreatureType, terrain::DEFAULT_TERRAIN_SPEED},
};

/// Numbers an attacker or mover brings to a turn.
pub trait CombatProfile {
    fn move_speed(&self) -> i32;
    fn attack_range(&self) -> i32;
    fn attack_damage(&self, square_distance: i32) -> i32;
    fn attack_cooldown(&self) -> i32;
}

impl CombatProfile for CreatureType {
    fn move_speed(&self) -> i32 {
        self.move_speed
    }

    fn attack_range(&self) -> i32 {
        self.attack_range
    }

    fn attack_damage(&self, _square_distance: i32) -> i32 {
        self.attack_damage
    }

    fn attack_cooldown(&self) -> i32 {
        self.attack_cooldown
    }
}

/// The player's fists, or whatever is equipped.
pub struct PlayerLoadout<'a> {
    pub config: PlayerConfig,
    pub equipped: Option<&'a ItemType>,
}

impl PlayerLoadout<'_> {
    /// Attacks past melee range throw the equipped item.
    pub fn is_throw(&self, square_distance: i32) -> bool {
        self.equipped
            .is_some_and(|item| square_distance > item.melee_range * item.melee_range)
    }
}

impl CombatProfile for PlayerLoadout<'_> {
    fn move_speed(&self) -> i32 {
        DEFAULT_TERRAIN_SPEED
    }

    fn attack_range(&self) -> i32 {
        self.equipped
            .map_or(self.config.unarmed_range, |item| item.throw_range)
    }

    fn attack_damage(&self, square_distance: i32) -> i32 {
        match self.equipped {
            None => self.config.unarmed_damage,
            Some(item) if self.is_throw(square_distance) => item.throw_damage,
            Some(item) => item.melee_damage,
        }
    }

    fn attack_cooldown(&self) -> i32 {
        self.config.attack_cooldown
    }
}

pub enum Profile<'a> {
    Creature(&'a CreatureType),
    Player(PlayerLoadout<'a>),
}

impl CombatProfile for Profile<'_> {
    fn move_speed(&self) -> i32 {
        match self {
            Profile::Creature(creature) => creature.move_speed(),
            Profile::Player(loadout) => loadout.move_speed(),
        }
    }

    fn attack_range(&self) -> i32 {
        match self {
            Profile::Creature(creature) => CombatProfile::attack_range(*creature),
            Profile::Player(loadout) => loadout.attack_range(),
        }
    }

    fn attack_damage(&self, square_distance: i32) -> i32 {
        match self {
            Profile::Creature(creature) => CombatProfile::attack_damage(*creature, square_distance),
            Profile::Player(loadout) => loadout.attack_damage(square_distance),
        }
    }

    fn attack_cooldown(&self) -> i32 {
        match self {
            Profile::Creature(creature) => CombatProfile::attack_cooldown(*creature),
            Profile::Player(loadout) => loadout.attack_cooldown(),
        }
    }
}
