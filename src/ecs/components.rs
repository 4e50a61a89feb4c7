use bracket_geometry::prelude::Point;
use specs::prelude::{Component, Entity, NullStorage, VecStorage};

use crate::data::CreatureId;

#[derive(Clone, Debug)]
pub struct Position {
    pub point: Point,
}

impl Component for Position {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vitals {
    pub hp: i32,
    pub max_hp: i32,
    pub dead: bool,
}

impl Vitals {
    pub const fn full(max_hp: i32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            dead: false,
        }
    }
}

impl Component for Vitals {
    type Storage = VecStorage<Self>;
}

/// Turn bookkeeping for anything that moves. While `moving_to` is set the
/// entity holds both its current tile and the destination.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Actor {
    pub action_timer: i32,
    pub attack_cooldown: i32,
    pub moving_to: Option<Point>,
}

impl Component for Actor {
    type Storage = VecStorage<Self>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ActorKind {
    Creature(CreatureId),
    Player,
}

impl Component for ActorKind {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Debug, Default)]
pub struct MonsterBrain {
    pub target: Option<Entity>,
}

impl Component for MonsterBrain {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Debug, Default)]
pub struct PlayerTag;

impl Component for PlayerTag {
    type Storage = NullStorage<Self>;
}
