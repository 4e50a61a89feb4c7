use bracket_geometry::prelude::Point;
use specs::prelude::Entity;
use tracing::info;

use crate::{
    clock::TurnClock,
    config::{ConfigError, GameConfig, PlayerConfig},
    data::{CreatureId, ItemId, RecipeId, Ruleset},
    ecs::{EcsWorld, resources::GameEvent, square_distance},
    map::WorldMap,
};

/// Everything the player can ask for while the game waits on them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerCommand {
    Move(Point),
    Pass,
    AttackAt(Point),
    PickUpAt(Point),
    ToggleEquip(ItemId),
    Eat(ItemId),
    Craft(RecipeId),
}

/// The simulation context: rules, world, entities and the clock driving them.
pub struct Game {
    pub rules: Ruleset,
    pub map: WorldMap,
    pub ecs: EcsWorld,
    clock: TurnClock,
}

impl Game {
    pub fn new(config: &GameConfig) -> Result<Self, ConfigError> {
        let rules = Ruleset::generate(config.rules_seed, &config.catalog, config.generation_options())?;
        Ok(Self::with_ruleset(
            rules,
            config.world_seed(),
            config.player,
            config.seconds_per_turn,
        ))
    }

    /// Starts a world around a player standing on the origin.
    pub fn with_ruleset(rules: Ruleset, world_seed: u64, player: PlayerConfig, seconds_per_turn: f32) -> Self {
        let mut map = WorldMap::new(world_seed, &rules);
        let mut ecs = EcsWorld::new(world_seed, player);
        ecs.place_player(Point::new(0, 0), &rules, &mut map);
        info!(
            rules_seed = rules.seed,
            world_seed,
            creatures = rules.creatures.len(),
            items = rules.items.len(),
            recipes = rules.recipes.len(),
            "game_started"
        );
        Self {
            rules,
            map,
            ecs,
            clock: TurnClock::new(seconds_per_turn),
        }
    }

    pub fn waiting_for_player(&self) -> bool {
        self.ecs.waiting_for_player()
    }

    pub fn is_over(&self) -> bool {
        !self.ecs.player_alive()
    }

    pub fn clock(&self) -> &TurnClock {
        &self.clock
    }

    /// Feeds real time to the clock. The clock stands still while the game
    /// waits for the player or once the player is dead. Returns true when a
    /// turn ran.
    pub fn update(&mut self, dt: f32) -> bool {
        if self.waiting_for_player() || self.is_over() {
            return false;
        }
        if !self.clock.advance(dt) {
            return false;
        }
        self.step_turn();
        true
    }

    pub fn step_turn(&mut self) {
        self.ecs.run_turn(&self.rules, &mut self.map);
    }

    /// Hands a command to the player. Rejected commands leave the game
    /// paused.
    pub fn apply(&mut self, command: PlayerCommand) -> bool {
        let accepted = match command {
            PlayerCommand::Move(delta) => self.ecs.player_move(delta, &self.rules, &mut self.map),
            PlayerCommand::Pass => self.ecs.player_pass(),
            PlayerCommand::AttackAt(point) => self.ecs.player_attack_at(point, &self.rules, &mut self.map),
            PlayerCommand::PickUpAt(point) => self.ecs.player_pick_up_at(point, &mut self.map),
            PlayerCommand::ToggleEquip(item) => self.ecs.player_toggle_equip(item),
            PlayerCommand::Eat(item) => self.ecs.player_eat(item, &self.rules, &mut self.map),
            PlayerCommand::Craft(recipe) => self.ecs.player_craft(recipe, &self.rules),
        };
        if accepted {
            self.clock.reset();
        }
        accepted
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.ecs.drain_events()
    }

    pub fn nearest_creature(&self) -> Option<(Entity, Point)> {
        let player = self.ecs.player_point()?;
        self.ecs.creatures_near(player).into_iter().next()
    }

    /// Closest tile holding an item that the player could pick up now.
    pub fn nearest_item_in_reach(&self) -> Option<Point> {
        let player = self.ecs.player()?;
        let centre = self.ecs.player_point()?;
        let range = self.ecs.player_config().pickup_range;
        let mut best: Option<(i32, Point)> = None;
        for x in (centre.x - range)..=(centre.x + range) {
            for y in (centre.y - range)..=(centre.y + range) {
                let point = Point::new(x, y);
                let distance = square_distance(centre, point);
                if distance >= range * range {
                    continue;
                }
                let Some(tile) = self.map.peek(point) else {
                    continue;
                };
                let reachable = tile.stored_item.is_some() && tile.entity.is_none_or(|e| e == player);
                if reachable && best.is_none_or(|(closest, _)| distance < closest) {
                    best = Some((distance, point));
                }
            }
        }
        best.map(|(_, point)| point)
    }

    pub fn spawn_creature_at(&mut self, kind: CreatureId, point: Point) -> Option<Entity> {
        self.ecs.spawn_creature_at(kind, point, &self.rules, &mut self.map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::flat_rules;

    fn flat_game() -> Game {
        Game::with_ruleset(flat_rules(), 3, PlayerConfig::default(), 0.1)
    }

    #[test]
    fn clock_stops_while_waiting() {
        let mut game = flat_game();
        assert!(game.update(0.1));
        assert!(game.waiting_for_player());
        assert!(!game.update(1.0));
        assert_eq!(game.ecs.turn, 1);

        assert!(game.apply(PlayerCommand::Pass));
        assert!(game.update(0.1));
        assert_eq!(game.ecs.turn, 2);
    }

    #[test]
    fn rejected_commands_keep_the_pause() {
        let mut game = flat_game();
        game.step_turn();
        assert!(!game.apply(PlayerCommand::Eat(ItemId(0))));
        assert!(!game.apply(PlayerCommand::Move(Point::new(2, 0))));
        assert!(game.waiting_for_player());
        assert!(game.apply(PlayerCommand::Move(Point::new(1, 0))));
        assert!(!game.waiting_for_player());
    }

    #[test]
    fn nearest_creature_prefers_the_closest() {
        let mut game = flat_game();
        let far = game.spawn_creature_at(CreatureId(0), Point::new(6, 0));
        let near = game.spawn_creature_at(CreatureId(0), Point::new(0, 2));
        assert!(far.is_some());
        assert_eq!(game.nearest_creature().map(|(entity, _)| entity), near);
    }

    #[test]
    fn item_reach_follows_pickup_range() {
        let mut game = flat_game();
        assert_eq!(game.nearest_item_in_reach(), None);
        if let Some(tile) = game.map.peek_mut(Point::new(2, 0)) {
            tile.stored_item = Some(ItemId(0));
        }
        assert_eq!(game.nearest_item_in_reach(), None);
        if let Some(tile) = game.map.peek_mut(Point::new(1, 1)) {
            tile.stored_item = Some(ItemId(1));
        }
        assert_eq!(game.nearest_item_in_reach(), Some(Point::new(1, 1)));
    }

    #[test]
    fn default_config_builds_a_game() {
        let config = GameConfig {
            world_seed: Some(8),
            ..GameConfig::default()
        };
        let game = Game::new(&config).expect("valid config");
        assert!(game.map.generated_count() > 0);
        assert!(!game.is_over());
    }
}
