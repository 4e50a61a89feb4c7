use specs::prelude::{Component, VecStorage};
use tracing::error;

use crate::{
    data::{
        ItemId,
        recipes::{CraftingRecipe, ItemStack},
    },
    ecs::resources::{EventLog, GameEvent},
};

/// Item counts indexed by [`ItemId`], plus the equipped item.
#[derive(Clone, Debug, Default)]
pub struct Inventory {
    counts: Vec<u32>,
    selected: Option<ItemId>,
}

impl Component for Inventory {
    type Storage = VecStorage<Self>;
}

impl Inventory {
    pub fn new(item_types: usize) -> Self {
        Self {
            counts: vec![0; item_types],
            selected: None,
        }
    }

    pub fn amount_of(&self, item: ItemId) -> u32 {
        self.counts.get(item.0).copied().unwrap_or(0)
    }

    pub fn selected(&self) -> Option<ItemId> {
        self.selected
    }

    pub fn held(&self) -> impl Iterator<Item = (ItemId, u32)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(idx, count)| (ItemId(idx), *count))
    }

    pub fn set_selected(&mut self, item: Option<ItemId>, log: &mut EventLog) {
        let old = self.selected;
        self.selected = item;
        log.push(GameEvent::SelectedItemChanged { new: item, old });
    }

    pub fn add_stack(&mut self, stack: ItemStack, log: &mut EventLog) {
        let Some(count) = self.counts.get_mut(stack.item.0) else {
            error!(item = stack.item.0, "inventory_unknown_item");
            return;
        };
        *count += stack.count;
        log.push(GameEvent::InventoryChanged {
            item: stack.item,
            amount: *count,
        });
    }

    /// Removes a stack. Fails without changing anything when short; emptying
    /// the equipped item unequips it.
    pub fn remove_stack(&mut self, stack: ItemStack, log: &mut EventLog) -> bool {
        let Some(count) = self.counts.get_mut(stack.item.0) else {
            error!(item = stack.item.0, "inventory_unknown_item");
            return false;
        };
        if *count < stack.count {
            error!(
                item = stack.item.0,
                held = *count,
                requested = stack.count,
                "inventory_remove_more_than_held"
            );
            return false;
        }
        *count -= stack.count;
        let amount = *count;
        log.push(GameEvent::InventoryChanged {
            item: stack.item,
            amount,
        });
        if amount == 0 && self.selected == Some(stack.item) {
            self.set_selected(None, log);
        }
        true
    }

    pub fn can_craft(&self, recipe: &CraftingRecipe) -> bool {
        recipe
            .inputs
            .iter()
            .all(|stack| self.amount_of(stack.item) >= stack.count)
    }

    pub fn craft(&mut self, recipe: &CraftingRecipe, log: &mut EventLog) -> bool {
        if !self.can_craft(recipe) {
            return false;
        }
        for stack in &recipe.inputs {
            self.remove_stack(*stack, log);
        }
        self.add_stack(recipe.output, log);
        true
    }
}
