use std::env;

use bracket_geometry::prelude::{Point, Rect};
use seeded_wilds::{
    ConfigError, Game, GameConfig,
    data::ItemId,
    ecs::resources::{GameObserver, dispatch},
    render::{VisibleRegion, ascii_rows},
    scripted_input::{ScriptedInput, command_for, is_quit},
};
use specs::prelude::Entity;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const VIEW_RADIUS: i32 = 12;
const MAX_TURNS_PER_COMMAND: usize = 256;
const LOG_MAX_ENTRIES: usize = 8;

/// Turns notifications into a short message log.
#[derive(Default)]
struct LogObserver {
    message_log: Vec<String>,
    attacks: usize,
    player_entity: Option<Entity>,
}

impl LogObserver {
    fn push(&mut self, line: String) {
        debug!(message = %line, "game_event");
        self.message_log.push(line);
        if self.message_log.len() > LOG_MAX_ENTRIES {
            self.message_log.remove(0);
        }
    }
}

impl GameObserver for LogObserver {
    fn on_attack(&mut self, source: Entity, target: Entity) {
        self.attacks += 1;
        let line = if Some(source) == self.player_entity {
            format!("You strike #{}", target.id())
        } else if Some(target) == self.player_entity {
            format!("#{} hits you", source.id())
        } else {
            format!("#{} attacks #{}", source.id(), target.id())
        };
        self.push(line);
    }

    fn on_inventory_changed(&mut self, item: ItemId, amount: u32) {
        self.push(format!("Item {} x{}", item.0, amount));
    }

    fn on_selected_item_changed(&mut self, new: Option<ItemId>, _old: Option<ItemId>) {
        match new {
            Some(item) => self.push(format!("Equipped item {}", item.0)),
            None => self.push("Hands empty".to_string()),
        }
    }

    fn on_death(&mut self) {
        self.push("You died".to_string());
    }
}

struct Runner {
    game: Game,
    observer: LogObserver,
    region: VisibleRegion,
}

impl Runner {
    fn new(game: Game) -> Self {
        let observer = LogObserver {
            player_entity: game.ecs.player(),
            ..LogObserver::default()
        };
        Self {
            game,
            observer,
            region: VisibleRegion::new(),
        }
    }

    fn flush_events(&mut self) {
        let events = self.game.drain_events();
        dispatch(&events, &mut self.observer);
    }

    fn follow_player(&mut self) {
        let Some(centre) = self.game.ecs.player_point() else {
            return;
        };
        let change = self.region.recenter(view_around(centre));
        debug!(
            exited = change.exited.len(),
            entered = change.entered.len(),
            "view_recentred"
        );
    }

    /// Runs turns until the game needs the player again.
    fn run_until_waiting(&mut self) {
        let dt = self.game.clock().seconds_per_turn();
        let mut turns = 0;
        while !self.game.waiting_for_player() && !self.game.is_over() {
            self.game.update(dt);
            self.flush_events();
            turns += 1;
            if turns >= MAX_TURNS_PER_COMMAND {
                warn!(turns, "player_never_became_ready");
                break;
            }
        }
        self.follow_player();
    }

    fn play(&mut self, input: &mut ScriptedInput) {
        loop {
            self.run_until_waiting();
            if self.game.is_over() {
                break;
            }
            let Some(key) = input.next_key() else {
                break;
            };
            if is_quit(key) {
                info!("script_quit");
                break;
            }
            match command_for(key, &self.game) {
                Some(command) => {
                    if !self.game.apply(command) {
                        debug!(?key, ?command, "command_rejected");
                    }
                }
                None => debug!(?key, "key_without_target"),
            }
            self.flush_events();
        }
    }

    fn report(&self) {
        let score = self.game.ecs.score();
        let health = self
            .game
            .ecs
            .player()
            .and_then(|player| self.game.ecs.vitals(player))
            .map_or(0, |vitals| vitals.hp);
        let held: Vec<String> = self
            .game
            .ecs
            .inventory()
            .map(|inventory| {
                inventory
                    .held()
                    .map(|(item, count)| format!("{}x{}", item.0, count))
                    .collect()
            })
            .unwrap_or_default();
        info!(
            turns = self.game.ecs.turn,
            turns_survived = score.turns_survived,
            hunt_score = score.hunt_score,
            health,
            attacks = self.observer.attacks,
            tiles = self.game.map.generated_count(),
            held = %held.join(","),
            "run_finished"
        );
        for line in &self.observer.message_log {
            info!(message = %line, "log");
        }
        if let Some(centre) = self.game.ecs.player_point() {
            for row in ascii_rows(&self.game, view_around(centre)) {
                println!("{row}");
            }
        }
    }
}

fn view_around(centre: Point) -> Rect {
    Rect::with_exact(
        centre.x - VIEW_RADIUS,
        centre.y - VIEW_RADIUS,
        centre.x + VIEW_RADIUS + 1,
        centre.y + VIEW_RADIUS + 1,
    )
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> Result<(), ConfigError> {
    init_tracing();
    let args: Vec<String> = env::args().collect();

    let config = match args.get(1) {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    let mut input = match args.get(2) {
        Some(path) => ScriptedInput::from_file(path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?,
        None => ScriptedInput::demo(),
    };
    info!(keys = input.len(), "script_loaded");

    let game = Game::new(&config)?;
    let mut runner = Runner::new(game);
    runner.play(&mut input);
    runner.report();
    Ok(())
}
