pub mod combat;
pub mod components;
pub mod player;
pub mod resources;

use bracket_geometry::prelude::Point;
use bracket_pathfinding::prelude::DistanceAlg;
use bracket_random::prelude::RandomNumberGenerator;
use specs::prelude::{Builder, Entity, Join, World as SpecsWorld, WorldExt};
use tracing::{debug, error, info};

use crate::{
    ai,
    config::PlayerConfig,
    data::{CreatureId, ItemId, Ruleset, monsters::CreatureType},
    inventory::Inventory,
    map::{ACTIVE_ENTITY_RADIUS, CreatureSpawner, PLAYER_GENERATE_RADIUS, WorldMap},
};

use self::{
    combat::{CombatProfile, PlayerLoadout, Profile},
    components::{Actor, ActorKind, MonsterBrain, PlayerTag, Position, Vitals},
    resources::{EventLog, GameEvent, Score},
};

const SIMULATION_SEED_SALT: u64 = 0x51ec_5ead;

pub fn square_distance(a: Point, b: Point) -> i32 {
    DistanceAlg::PythagorasSquared.distance2d(a, b).round() as i32
}

/// Entity registry plus the ordered roster the turn loop walks. Joins and
/// leaves are buffered and spliced in at the start of the next turn.
pub struct EcsWorld {
    specs_world: SpecsWorld,
    roster: Vec<Entity>,
    pending_join: Vec<Entity>,
    pending_leave: Vec<Entity>,
    player: Option<Entity>,
    player_config: PlayerConfig,
    waiting_for_player: bool,
    pub turn: u64,
}

impl EcsWorld {
    pub fn new(world_seed: u64, player_config: PlayerConfig) -> Self {
        let mut specs_world = SpecsWorld::new();
        Self::register_components(&mut specs_world);
        specs_world.insert(RandomNumberGenerator::seeded(world_seed ^ SIMULATION_SEED_SALT));
        specs_world.insert(EventLog::default());
        specs_world.insert(Score::default());

        Self {
            specs_world,
            roster: Vec::new(),
            pending_join: Vec::new(),
            pending_leave: Vec::new(),
            player: None,
            player_config,
            waiting_for_player: false,
            turn: 0,
        }
    }

    fn register_components(world: &mut SpecsWorld) {
        world.register::<Position>();
        world.register::<Vitals>();
        world.register::<Actor>();
        world.register::<ActorKind>();
        world.register::<MonsterBrain>();
        world.register::<PlayerTag>();
        world.register::<Inventory>();
    }

    /// Puts the player on `point`, evicting anything generated there, and
    /// generates the surrounding square.
    pub fn place_player(&mut self, point: Point, rules: &Ruleset, map: &mut WorldMap) -> Entity {
        map.generate_around(point, PLAYER_GENERATE_RADIUS, rules, self);
        if let Some(squatter) = map.occupant(point) {
            self.despawn(squatter);
        }

        let player = self
            .specs_world
            .create_entity()
            .with(Position { point })
            .with(Vitals::full(self.player_config.max_health))
            .with(Actor::default())
            .with(ActorKind::Player)
            .with(PlayerTag)
            .with(Inventory::new(rules.items.len()))
            .build();
        self.pending_join.push(player);
        self.player = Some(player);

        if let Some(tile) = map.tile_mut(point, rules, self) {
            tile.entity = Some(player);
        }
        info!(x = point.x, y = point.y, "player_placed");
        player
    }

    fn despawn(&mut self, entity: Entity) {
        self.pending_join.retain(|e| *e != entity);
        self.roster.retain(|e| *e != entity);
        if let Err(err) = self.specs_world.delete_entity(entity) {
            error!(?err, "despawn_failed");
        }
        debug!(entity = entity.id(), "creature_despawned");
    }

    pub fn player(&self) -> Option<Entity> {
        self.player
    }

    pub fn player_point(&self) -> Option<Point> {
        self.player.and_then(|player| self.position(player))
    }

    pub fn player_alive(&self) -> bool {
        self.player.is_some_and(|player| !self.is_dead(player))
    }

    pub fn player_config(&self) -> PlayerConfig {
        self.player_config
    }

    pub fn waiting_for_player(&self) -> bool {
        self.waiting_for_player
    }

    pub fn roster(&self) -> &[Entity] {
        &self.roster
    }

    pub fn position(&self, entity: Entity) -> Option<Point> {
        let positions = self.specs_world.read_component::<Position>();
        positions.get(entity).map(|pos| pos.point)
    }

    fn set_position(&self, entity: Entity, point: Point) {
        let mut positions = self.specs_world.write_component::<Position>();
        if let Some(pos) = positions.get_mut(entity) {
            pos.point = point;
        }
    }

    pub fn vitals(&self, entity: Entity) -> Option<Vitals> {
        let vitals = self.specs_world.read_component::<Vitals>();
        vitals.get(entity).cloned()
    }

    pub fn actor(&self, entity: Entity) -> Option<Actor> {
        let actors = self.specs_world.read_component::<Actor>();
        actors.get(entity).copied()
    }

    pub(crate) fn update_actor<R>(&self, entity: Entity, f: impl FnOnce(&mut Actor) -> R) -> Option<R> {
        let mut actors = self.specs_world.write_component::<Actor>();
        actors.get_mut(entity).map(f)
    }

    pub fn kind(&self, entity: Entity) -> Option<ActorKind> {
        let kinds = self.specs_world.read_component::<ActorKind>();
        kinds.get(entity).copied()
    }

    pub fn creature_kind(&self, entity: Entity) -> Option<CreatureId> {
        match self.kind(entity)? {
            ActorKind::Creature(kind) => Some(kind),
            ActorKind::Player => None,
        }
    }

    pub fn target_of(&self, entity: Entity) -> Option<Entity> {
        let brains = self.specs_world.read_component::<MonsterBrain>();
        brains.get(entity).and_then(|brain| brain.target)
    }

    pub fn set_target(&self, entity: Entity, target: Option<Entity>) {
        let mut brains = self.specs_world.write_component::<MonsterBrain>();
        if let Some(brain) = brains.get_mut(entity) {
            brain.target = target;
        }
    }

    pub fn is_dead(&self, entity: Entity) -> bool {
        !self.specs_world.is_alive(entity) || self.vitals(entity).is_none_or(|vitals| vitals.dead)
    }

    pub fn inventory(&self) -> Option<Inventory> {
        let player = self.player?;
        let inventories = self.specs_world.read_component::<Inventory>();
        inventories.get(player).cloned()
    }

    pub(crate) fn with_inventory<R>(&self, f: impl FnOnce(&mut Inventory, &mut EventLog) -> R) -> Option<R> {
        let player = self.player?;
        let mut inventories = self.specs_world.write_component::<Inventory>();
        let mut log = self.specs_world.write_resource::<EventLog>();
        inventories.get_mut(player).map(|inventory| f(inventory, &mut log))
    }

    fn equipped(&self, entity: Entity) -> Option<ItemId> {
        let inventories = self.specs_world.read_component::<Inventory>();
        inventories.get(entity).and_then(Inventory::selected)
    }

    pub fn profile<'a>(&self, entity: Entity, rules: &'a Ruleset) -> Option<Profile<'a>> {
        match self.kind(entity)? {
            ActorKind::Creature(kind) => Some(Profile::Creature(rules.creature(kind))),
            ActorKind::Player => Some(Profile::Player(PlayerLoadout {
                config: self.player_config,
                equipped: self.equipped(entity).map(|item| rules.item(item)),
            })),
        }
    }

    pub fn score(&self) -> Score {
        *self.specs_world.read_resource::<Score>()
    }

    pub(crate) fn update_score(&self, f: impl FnOnce(&mut Score)) {
        {
            let mut score = self.specs_world.write_resource::<Score>();
            f(&mut score);
        }
        self.emit(GameEvent::ScoreChanged);
    }

    pub(crate) fn emit(&self, event: GameEvent) {
        self.specs_world.write_resource::<EventLog>().push(event);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.specs_world.write_resource::<EventLog>().drain()
    }

    pub(crate) fn roll<R>(&self, f: impl FnOnce(&mut RandomNumberGenerator) -> R) -> R {
        let mut rng = self.specs_world.write_resource::<RandomNumberGenerator>();
        f(&mut rng)
    }

    /// Living creatures, nearest first to `point`.
    pub fn creatures_near(&self, point: Point) -> Vec<(Entity, Point)> {
        let entities = self.specs_world.entities();
        let positions = self.specs_world.read_component::<Position>();
        let kinds = self.specs_world.read_component::<ActorKind>();
        let vitals = self.specs_world.read_component::<Vitals>();
        let mut found: Vec<(Entity, Point)> = (&entities, &positions, &kinds, &vitals)
            .join()
            .filter(|(_, _, kind, vitals)| matches!(kind, ActorKind::Creature(_)) && !vitals.dead)
            .map(|(entity, pos, _, _)| (entity, pos.point))
            .collect();
        found.sort_by_key(|(entity, pos)| (square_distance(point, *pos), entity.id()));
        found
    }

    fn apply_roster_changes(&mut self) {
        let joined = self.pending_join.len();
        let left = self.pending_leave.len();
        if joined > 0 {
            self.roster.append(&mut self.pending_join);
        }
        if left > 0 {
            let leaving = std::mem::take(&mut self.pending_leave);
            self.roster.retain(|entity| !leaving.contains(entity));
            for entity in leaving {
                if Some(entity) == self.player {
                    continue;
                }
                if let Err(err) = self.specs_world.delete_entity(entity) {
                    error!(?err, "roster_delete_failed");
                }
            }
            self.specs_world.maintain();
        }
        if joined > 0 || left > 0 {
            debug!(joined, left, roster = self.roster.len(), "roster_spliced");
        }
    }

    /// One simulation tick: splice the roster, then let every live entity act
    /// in roster order.
    pub fn run_turn(&mut self, rules: &Ruleset, map: &mut WorldMap) {
        self.apply_roster_changes();
        let roster = self.roster.clone();
        for entity in roster {
            if self.is_dead(entity) {
                continue;
            }
            self.take_turn(entity, rules, map);
        }
        if self.player_alive() {
            self.update_score(|score| score.turns_survived += 1);
        }
        self.turn = self.turn.wrapping_add(1);
    }

    fn in_activity_range(&self, entity: Entity) -> bool {
        let Some(player_point) = self.player_point() else {
            return false;
        };
        let radius_sq = ACTIVE_ENTITY_RADIUS * ACTIVE_ENTITY_RADIUS;
        let near_player = |point: Point| square_distance(point, player_point) < radius_sq;
        if self.position(entity).is_some_and(near_player) {
            return true;
        }
        self.target_of(entity)
            .filter(|target| !self.is_dead(*target))
            .and_then(|target| self.position(target))
            .is_some_and(near_player)
    }

    fn take_turn(&mut self, entity: Entity, rules: &Ruleset, map: &mut WorldMap) {
        if !self.in_activity_range(entity) {
            return;
        }
        let Some(point) = self.position(entity) else {
            return;
        };

        let terrain_damage = map
            .peek(point)
            .map_or(0, |tile| rules.terrain(tile.terrain).damage_per_turn);
        if terrain_damage > 0 {
            self.apply_damage(entity, terrain_damage, rules, map);
            if self.is_dead(entity) {
                return;
            }
        }

        let Some(timer) = self.update_actor(entity, |actor| {
            actor.action_timer -= 1;
            actor.attack_cooldown = (actor.attack_cooldown - 1).max(0);
            actor.action_timer
        }) else {
            return;
        };

        if timer == 0 {
            self.complete_move(entity, map);
        }
        if timer <= 0 {
            self.select_new_action(entity, rules, map);
        }
    }

    pub fn select_new_action(&mut self, entity: Entity, rules: &Ruleset, map: &mut WorldMap) {
        match self.kind(entity) {
            Some(ActorKind::Player) => self.waiting_for_player = true,
            Some(ActorKind::Creature(kind)) => ai::select_new_action(self, entity, kind, rules, map),
            None => error!(entity = entity.id(), "action_for_unknown_entity"),
        }
    }

    fn complete_move(&mut self, entity: Entity, map: &mut WorldMap) {
        let Some(dest) = self.actor(entity).and_then(|actor| actor.moving_to) else {
            return;
        };
        if let Some(src) = self.position(entity) {
            if src != dest {
                if let Some(tile) = map.peek_mut(src) {
                    if tile.entity == Some(entity) {
                        tile.entity = None;
                    }
                }
            }
        }
        self.set_position(entity, dest);
        self.update_actor(entity, |actor| actor.moving_to = None);
        self.emit(GameEvent::MovementEnd(entity));
    }

    /// Starts a one-tile orthogonal move. The destination is reserved at once.
    pub fn try_move_to(&mut self, entity: Entity, dest: Point, rules: &Ruleset, map: &mut WorldMap) -> bool {
        let Some(src) = self.position(entity) else {
            return false;
        };
        if (dest.x - src.x).abs() + (dest.y - src.y).abs() != 1 {
            return false;
        }
        let Some(move_speed) = self.profile(entity, rules).map(|profile| profile.move_speed()) else {
            return false;
        };

        let terrain_speed = {
            let Some(tile) = map.tile_mut(dest, rules, self) else {
                return false;
            };
            if !tile.is_free() {
                return false;
            }
            tile.entity = Some(entity);
            rules.terrain(tile.terrain).terrain_speed
        };

        let timer = (terrain_speed * move_speed / 2).max(1);
        self.update_actor(entity, |actor| {
            actor.moving_to = Some(dest);
            actor.action_timer = timer;
        });
        self.emit(GameEvent::MovementStart(entity));

        if Some(entity) == self.player {
            let delta = Point::new(dest.x - src.x, dest.y - src.y);
            map.generate_leading_edge(src, delta, rules, self);
        }
        true
    }

    /// Resolves one attack. Fails when out of range, on cooldown, or aimed at
    /// the attacker itself or a dead target.
    pub fn try_attack(&mut self, attacker: Entity, target: Entity, rules: &Ruleset, map: &mut WorldMap) -> bool {
        if attacker == target || self.is_dead(attacker) || self.is_dead(target) {
            return false;
        }
        let (Some(from), Some(to)) = (self.position(attacker), self.position(target)) else {
            return false;
        };
        let Some(profile) = self.profile(attacker, rules) else {
            return false;
        };
        let Some(actor) = self.actor(attacker) else {
            return false;
        };

        let distance = square_distance(from, to);
        let range = profile.attack_range();
        if distance >= range * range || actor.attack_cooldown > 0 {
            return false;
        }
        let damage = profile.attack_damage(distance);
        let cooldown = profile.attack_cooldown();

        self.apply_damage(target, damage, rules, map);
        self.update_actor(attacker, |actor| {
            actor.attack_cooldown = cooldown;
            actor.action_timer = 1;
        });
        if self.creature_kind(target).is_some() {
            self.set_target(target, Some(attacker));
        }
        self.emit(GameEvent::Attack {
            source: attacker,
            target,
        });
        debug!(attacker = attacker.id(), target = target.id(), damage, "attack_resolved");
        true
    }

    /// Negative amounts heal. Health is clamped to `0..=max_hp`.
    pub fn apply_damage(&mut self, entity: Entity, amount: i32, rules: &Ruleset, map: &mut WorldMap) {
        let died = {
            let mut storage = self.specs_world.write_component::<Vitals>();
            let Some(vitals) = storage.get_mut(entity) else {
                return;
            };
            if vitals.dead {
                error!(entity = entity.id(), "damage_to_dead_entity");
                return;
            }
            vitals.hp = (vitals.hp - amount).clamp(0, vitals.max_hp);
            if vitals.hp == 0 {
                vitals.dead = true;
            }
            vitals.dead
        };
        self.emit(GameEvent::HealthChanged(entity));
        if died {
            self.on_death(entity, rules, map);
        }
    }

    fn on_death(&mut self, entity: Entity, rules: &Ruleset, map: &mut WorldMap) {
        let point = self.position(entity);
        let actor = self.actor(entity);

        let drop = self.creature_kind(entity).and_then(|kind| rules.creature(kind).drop);
        if let (Some(drop), Some(point)) = (drop, point) {
            if let Some(tile) = map.peek_mut(point) {
                tile.stored_item = Some(drop);
                self.emit(GameEvent::TileItemChanged(point));
            }
        }

        if let Some(dest) = actor.and_then(|actor| actor.moving_to) {
            if let Some(tile) = map.peek_mut(dest) {
                if tile.entity == Some(entity) {
                    tile.entity = None;
                }
            }
        }
        if let Some(point) = point {
            if let Some(tile) = map.peek_mut(point) {
                if tile.entity == Some(entity) {
                    tile.entity = None;
                }
            }
        }

        self.pending_leave.push(entity);
        if Some(entity) == self.player {
            self.waiting_for_player = false;
            self.emit(GameEvent::Death);
            info!(turn = self.turn, "player_died");
        } else {
            debug!(entity = entity.id(), "creature_died");
        }
    }

    /// Creates a creature at `point` if the tile is free.
    pub fn spawn_creature_at(
        &mut self,
        kind: CreatureId,
        point: Point,
        rules: &Ruleset,
        map: &mut WorldMap,
    ) -> Option<Entity> {
        let free = map.tile(point, rules, self).is_some_and(|tile| tile.is_free());
        if !free {
            return None;
        }
        let entity = self.spawn_creature(kind, rules.creature(kind), point);
        if let Some(tile) = map.peek_mut(point) {
            tile.entity = Some(entity);
        }
        Some(entity)
    }
}

impl CreatureSpawner for EcsWorld {
    fn spawn_creature(&mut self, kind: CreatureId, creature: &CreatureType, point: Point) -> Entity {
        let entity = self
            .specs_world
            .create_entity()
            .with(Position { point })
            .with(Vitals::full(creature.health))
            .with(Actor::default())
            .with(ActorKind::Creature(kind))
            .with(MonsterBrain::default())
            .build();
        self.pending_join.push(entity);
        debug!(kind = kind.0, x = point.x, y = point.y, "creature_spawned");
        entity
    }
}
