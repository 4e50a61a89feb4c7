use bracket_geometry::prelude::Point;
use specs::prelude::Entity;
use tracing::debug;

use super::{EcsWorld, resources::GameEvent, square_distance};
use crate::{
    data::{ItemId, RecipeId, Ruleset, recipes::ItemStack},
    map::WorldMap,
};

/// Player commands. Each is accepted only while the game waits for the
/// player; a rejected command changes nothing and keeps the game paused.
impl EcsWorld {
    fn ready_player(&self) -> Option<Entity> {
        if !self.waiting_for_player {
            return None;
        }
        self.player.filter(|player| !self.is_dead(*player))
    }

    fn finish_player_action(&mut self, player: Entity) {
        self.waiting_for_player = false;
        self.update_actor(player, |actor| actor.action_timer = 1);
    }

    pub fn player_move(&mut self, delta: Point, rules: &Ruleset, map: &mut WorldMap) -> bool {
        let Some(player) = self.ready_player() else {
            return false;
        };
        let Some(from) = self.position(player) else {
            return false;
        };
        let dest = Point::new(from.x + delta.x, from.y + delta.y);
        if !self.try_move_to(player, dest, rules, map) {
            debug!(x = dest.x, y = dest.y, "player_move_blocked");
            return false;
        }
        self.waiting_for_player = false;
        true
    }

    pub fn player_pass(&mut self) -> bool {
        if self.ready_player().is_none() {
            return false;
        }
        self.waiting_for_player = false;
        true
    }

    pub fn player_attack_at(&mut self, point: Point, rules: &Ruleset, map: &mut WorldMap) -> bool {
        let Some(player) = self.ready_player() else {
            return false;
        };
        let Some(target) = map.occupant(point).filter(|target| *target != player) else {
            return false;
        };
        let (Some(from), Some(target_point)) = (self.position(player), self.position(target)) else {
            return false;
        };
        let thrown = self
            .equipped(player)
            .filter(|item| {
                let melee = rules.item(*item).melee_range;
                square_distance(from, target_point) > melee * melee
            });

        if !self.try_attack(player, target, rules, map) {
            return false;
        }
        self.waiting_for_player = false;

        let killed = self.is_dead(target);
        if let Some(item) = thrown {
            self.with_inventory(|inventory, log| inventory.remove_stack(ItemStack::new(item, 1), log));
            if !killed {
                if let Some(tile) = map.peek_mut(target_point) {
                    tile.stored_item = Some(item);
                    self.emit(GameEvent::TileItemChanged(target_point));
                }
            }
        }

        if killed {
            if let Some(kind) = self.creature_kind(target) {
                let diff = rules.creature(kind).diff;
                self.update_score(|score| score.hunt_score += diff);
            }
        }
        true
    }

    pub fn player_pick_up_at(&mut self, point: Point, map: &mut WorldMap) -> bool {
        let Some(player) = self.ready_player() else {
            return false;
        };
        let Some(from) = self.position(player) else {
            return false;
        };
        let range = self.player_config.pickup_range;
        if square_distance(from, point) >= range * range {
            return false;
        }
        let Some(tile) = map.peek_mut(point) else {
            return false;
        };
        if tile.entity.is_some_and(|occupant| occupant != player) {
            return false;
        }
        let Some(item) = tile.stored_item.take() else {
            return false;
        };

        self.emit(GameEvent::TileItemChanged(point));
        self.with_inventory(|inventory, log| inventory.add_stack(ItemStack::new(item, 1), log));
        self.finish_player_action(player);
        true
    }

    /// Equips `item`, or unequips it when it is already equipped.
    pub fn player_toggle_equip(&mut self, item: ItemId) -> bool {
        let Some(player) = self.ready_player() else {
            return false;
        };
        let accepted = self.with_inventory(|inventory, log| {
            if inventory.selected() == Some(item) {
                inventory.set_selected(None, log);
                true
            } else if inventory.amount_of(item) > 0 {
                inventory.set_selected(Some(item), log);
                true
            } else {
                false
            }
        });
        if accepted != Some(true) {
            return false;
        }
        self.finish_player_action(player);
        true
    }

    /// Eats one `item`; its health effect heals (or hurts).
    pub fn player_eat(&mut self, item: ItemId, rules: &Ruleset, map: &mut WorldMap) -> bool {
        let Some(player) = self.ready_player() else {
            return false;
        };
        let eaten = self.with_inventory(|inventory, log| {
            inventory.amount_of(item) > 0 && inventory.remove_stack(ItemStack::new(item, 1), log)
        });
        if eaten != Some(true) {
            return false;
        }
        self.finish_player_action(player);
        self.apply_damage(player, -rules.item(item).health_effect, rules, map);
        true
    }

    pub fn player_craft(&mut self, recipe: RecipeId, rules: &Ruleset) -> bool {
        let Some(player) = self.ready_player() else {
            return false;
        };
        let Some(recipe) = rules.recipe(recipe) else {
            return false;
        };
        if self.with_inventory(|inventory, log| inventory.craft(recipe, log)) != Some(true) {
            return false;
        }
        self.finish_player_action(player);
        true
    }

    pub fn craftable_recipes(&self, rules: &Ruleset) -> Vec<RecipeId> {
        let Some(inventory) = self.inventory() else {
            return Vec::new();
        };
        rules
            .recipes
            .iter()
            .enumerate()
            .filter(|(_, recipe)| inventory.can_craft(recipe))
            .map(|(idx, _)| RecipeId(idx))
            .collect()
    }
}
