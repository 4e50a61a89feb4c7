use bracket_geometry::prelude::Point;
use specs::prelude::Entity;
use tracing::debug;

use crate::{
    data::{
        CreatureId, Ruleset, chance,
        monsters::{CreatureType, Stance},
    },
    ecs::{EcsWorld, components::ActorKind, square_distance},
    map::WorldMap,
};

const P_IDLE: f32 = 0.5;

const DIRECTIONS: [Point; 4] = [
    Point { x: 1, y: 0 },
    Point { x: -1, y: 0 },
    Point { x: 0, y: 1 },
    Point { x: 0, y: -1 },
];

/// Picks what a creature does with its next action: keep or find a target,
/// then attack, chase, flee, or wander.
pub fn select_new_action(
    ecs: &mut EcsWorld,
    entity: Entity,
    kind: CreatureId,
    rules: &Ruleset,
    map: &mut WorldMap,
) {
    let creature = rules.creature(kind);
    let Some(point) = ecs.position(entity) else {
        return;
    };

    let kept = ecs
        .target_of(entity)
        .filter(|target| in_sight(ecs, creature, point, *target));
    let target = match kept {
        Some(target) => Some(target),
        None => {
            let found = search_for_target(ecs, entity, creature, point, map);
            if let Some(found) = found {
                debug!(entity = entity.id(), target = found.id(), "target_acquired");
            }
            found
        }
    };
    ecs.set_target(entity, target);

    match target {
        Some(target) => engage(ecs, entity, creature, point, target, rules, map),
        None => wander(ecs, entity, point, rules, map),
    }
}

fn in_sight(ecs: &EcsWorld, creature: &CreatureType, point: Point, target: Entity) -> bool {
    if ecs.is_dead(target) {
        return false;
    }
    ecs.position(target)
        .is_some_and(|at| square_distance(point, at) < creature.sight_range * creature.sight_range)
}

fn stance_toward(ecs: &EcsWorld, creature: &CreatureType, other: Entity) -> Option<Stance> {
    match ecs.kind(other)? {
        ActorKind::Player => Some(creature.player_stance),
        ActorKind::Creature(kind) => creature.stance_toward(kind),
    }
}

/// Walks square rings outwards from the creature, side columns first, then
/// the top and bottom rows.
fn search_for_target(
    ecs: &EcsWorld,
    entity: Entity,
    creature: &CreatureType,
    point: Point,
    map: &WorldMap,
) -> Option<Entity> {
    let is_candidate = |at: Point| -> Option<Entity> {
        let other = map.occupant(at)?;
        if other == entity || !in_sight(ecs, creature, point, other) || ecs.actor(other).is_none() {
            return None;
        }
        let stance = stance_toward(ecs, creature, other)?;
        (!stance.is_semi()).then_some(other)
    };

    for r in 0..creature.sight_range {
        for dy in -r..=r {
            for x in [point.x - r, point.x + r] {
                if let Some(found) = is_candidate(Point::new(x, point.y + dy)) {
                    return Some(found);
                }
            }
        }
        for dx in (-r + 1)..r {
            for y in [point.y - r, point.y + r] {
                if let Some(found) = is_candidate(Point::new(point.x + dx, y)) {
                    return Some(found);
                }
            }
        }
    }
    None
}

fn engage(
    ecs: &mut EcsWorld,
    entity: Entity,
    creature: &CreatureType,
    point: Point,
    target: Entity,
    rules: &Ruleset,
    map: &mut WorldMap,
) {
    let (Some(stance), Some(target_point)) = (stance_toward(ecs, creature, target), ecs.position(target)) else {
        return;
    };

    let cooldown = ecs.actor(entity).map_or(0, |actor| actor.attack_cooldown);
    let range_sq = creature.attack_range * creature.attack_range;
    if stance.attacks() && cooldown <= 0 && square_distance(point, target_point) < range_sq {
        if ecs.try_attack(entity, target, rules, map) {
            return;
        }
    }

    let dx = target_point.x - point.x;
    let dy = target_point.y - point.y;
    let flee = stance.flees();
    let (x_first, step_x, step_y) = ecs.roll(|rng| {
        let total = dx.abs() + dy.abs();
        let x_first = if total == 0 {
            rng.range(0, 2) == 0
        } else {
            rng.range(0, total) < dx.abs()
        };
        let mut axis_step = |offset: i32| match (offset.signum(), flee) {
            (0, true) => {
                if rng.range(0, 2) == 0 {
                    -1
                } else {
                    1
                }
            }
            (sign, true) => -sign,
            (sign, false) => sign,
        };
        let step_x = axis_step(dx);
        let step_y = axis_step(dy);
        (x_first, step_x, step_y)
    });

    let along_x = Point::new(step_x, 0);
    let along_y = Point::new(0, step_y);
    let order = if x_first { [along_x, along_y] } else { [along_y, along_x] };
    for step in order {
        if step == Point::new(0, 0) {
            continue;
        }
        if ecs.try_move_to(entity, point + step, rules, map) {
            return;
        }
    }
}

fn wander(ecs: &mut EcsWorld, entity: Entity, point: Point, rules: &Ruleset, map: &mut WorldMap) {
    let (idle, direction) = ecs.roll(|rng| (chance(rng, P_IDLE), rng.range(0, DIRECTIONS.len() as i32)));
    if idle {
        return;
    }
    let step = DIRECTIONS[direction as usize];
    ecs.try_move_to(entity, point + step, rules, map);
}
