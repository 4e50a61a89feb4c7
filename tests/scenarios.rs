use bracket_geometry::prelude::Point;
use bracket_terminal::prelude::RGB;
use seeded_wilds::{
    Game, PlayerCommand, PlayerConfig,
    data::{
        CreatureId, ItemId, Ruleset,
        items::ItemType,
        monsters::{CreatureType, Stance},
        recipes::ItemStack,
        terrain::TerrainType,
    },
    ecs::resources::{EventLog, GameEvent},
    inventory::Inventory,
};

fn creature(health: i32, sight_range: i32, player_stance: Stance) -> CreatureType {
    CreatureType {
        sprite: "rat".into(),
        color: RGB::from_f32(0.5, 0.4, 0.3),
        move_speed: 2,
        attack_range: 3,
        sight_range,
        attack_damage: 2,
        attack_cooldown: 3,
        health,
        diff: 0.75,
        player_stance,
        stances: Some(vec![Stance::SemiHostile]),
        drop: Some(ItemId(0)),
    }
}

/// One quiet terrain and a single creature kind; nothing spawns by itself.
fn flat_rules(creature: CreatureType) -> Ruleset {
    Ruleset {
        seed: 0,
        terrain: vec![TerrainType {
            sprite: "moss".into(),
            color: RGB::from_f32(0.1, 0.6, 0.2),
            terrain_speed: 2,
            damage_per_turn: 0,
            rarity: 1.0,
            spawn_weights: vec![0.0],
            items_found_here: Vec::new(),
        }],
        creatures: vec![creature],
        items: vec![ItemType {
            id: ItemId(0),
            sprite: "tail".into(),
            color: RGB::from_f32(0.5, 0.4, 0.3),
            health_effect: 2,
            melee_range: 1,
            melee_damage: 2,
            throw_range: 4,
            throw_damage: 1,
            rarity: 1.0,
            crafted: false,
        }],
        recipes: Vec::new(),
    }
}

#[test]
fn creature_out_of_sight_idles_or_steps_once() {
    let rules = flat_rules(creature(20, 4, Stance::Hostile));
    let mut game = Game::with_ruleset(rules, 9, PlayerConfig::default(), 0.1);
    let start = Point::new(5, 0);
    let rat = game.spawn_creature_at(CreatureId(0), start).expect("free tile");

    game.step_turn();

    assert_eq!(game.ecs.target_of(rat), None);
    assert_eq!(game.ecs.position(rat), Some(start));
    match game.ecs.actor(rat).expect("actor").moving_to {
        None => {}
        Some(dest) => {
            let step = (dest.x - start.x).abs() + (dest.y - start.y).abs();
            assert_eq!(step, 1);
        }
    }
    let health = game.ecs.player().and_then(|player| game.ecs.vitals(player)).expect("vitals");
    assert_eq!(health.hp, health.max_hp);
}

#[test]
fn unarmed_player_kills_a_weak_creature_and_the_drop_lands_once() {
    let rules = flat_rules(creature(5, 8, Stance::SemiEvasive));
    let player_config = PlayerConfig {
        unarmed_damage: 8,
        ..PlayerConfig::default()
    };
    let mut game = Game::with_ruleset(rules, 9, player_config, 0.1);
    let rat = game.spawn_creature_at(CreatureId(0), Point::new(1, 0)).expect("free tile");
    game.step_turn();
    assert!(game.waiting_for_player());
    game.drain_events();

    let at = game.ecs.position(rat).expect("position");
    assert!(game.apply(PlayerCommand::AttackAt(at)));
    assert!(game.ecs.is_dead(rat));
    assert_eq!(game.ecs.score().hunt_score, 0.75);

    let events = game.drain_events();
    let drops = events
        .iter()
        .filter(|event| matches!(event, GameEvent::TileItemChanged(_)))
        .count();
    assert_eq!(drops, 1);
    assert!(events.contains(&GameEvent::TileItemChanged(at)));
    assert_eq!(game.map.peek(at).and_then(|tile| tile.stored_item), Some(ItemId(0)));
    assert_eq!(game.map.occupant(at), None);

    for _ in 0..3 {
        game.step_turn();
        let _ = game.apply(PlayerCommand::Pass);
    }
    assert!(!game.ecs.roster().contains(&rat));
    let stored = game.map.tiles().filter(|tile| tile.stored_item.is_some()).count();
    assert_eq!(stored, 1);
    assert!(
        !game
            .drain_events()
            .iter()
            .any(|event| matches!(event, GameEvent::TileItemChanged(_)))
    );
}

#[test]
fn emptying_the_selected_stack_clears_the_selection() {
    let mut log = EventLog::default();
    let mut inventory = Inventory::new(3);
    let item = ItemId(1);

    inventory.add_stack(ItemStack::new(item, 2), &mut log);
    inventory.set_selected(Some(item), &mut log);
    assert!(inventory.remove_stack(ItemStack::new(item, 1), &mut log));
    assert_eq!(inventory.selected(), Some(item));
    assert!(inventory.remove_stack(ItemStack::new(item, 1), &mut log));

    assert_eq!(inventory.amount_of(item), 0);
    assert_eq!(inventory.selected(), None);
    assert!(log.events.contains(&GameEvent::SelectedItemChanged {
        new: None,
        old: Some(item),
    }));
}
