use bracket_random::prelude::RandomNumberGenerator;
use smallvec::SmallVec;
use tracing::warn;

use super::{ItemId, items::ItemType, uniform};

/// Allowed surplus of input rarity over output rarity.
pub const RECIPE_RARITY_MARGIN: f32 = 3.0;
pub const RECIPES_PER_CRAFTED_ITEM: usize = 2;

const MIN_INPUTS: f32 = 1.5;
const MAX_INPUTS: f32 = 4.0;
const RARITY_TO_STACK_SIZE: f32 = 3.0;
const MAX_BALANCE_ROUNDS: usize = 64;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ItemStack {
    pub item: ItemId,
    pub count: u32,
}

impl ItemStack {
    pub const fn new(item: ItemId, count: u32) -> Self {
        Self { item, count }
    }

    pub fn rarity(&self, items: &[ItemType]) -> f32 {
        items
            .get(self.item.0)
            .map_or(0.0, |item| item.rarity * self.count as f32)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CraftingRecipe {
    pub inputs: SmallVec<[ItemStack; 3]>,
    pub output: ItemStack,
}

impl CraftingRecipe {
    pub fn in_rarity(&self, items: &[ItemType]) -> f32 {
        self.inputs.iter().map(|stack| stack.rarity(items)).sum()
    }

    pub fn out_rarity(&self, items: &[ItemType]) -> f32 {
        self.output.rarity(items)
    }

    pub fn is_balanced(&self, items: &[ItemType], margin: f32) -> bool {
        let surplus = self.in_rarity(items) - self.out_rarity(items);
        (0.0..=margin).contains(&surplus)
    }

    /// One to three distinct basic inputs, one of each, then balanced.
    pub fn build_for(
        output: ItemId,
        basic: &[ItemId],
        items: &[ItemType],
        margin: f32,
        rng: &mut RandomNumberGenerator,
    ) -> Self {
        let wanted = (uniform(rng, MIN_INPUTS, MAX_INPUTS) as usize).min(basic.len());
        let mut pool: Vec<ItemId> = basic.to_vec();
        let mut inputs = SmallVec::new();
        for _ in 0..wanted {
            let idx = rng.range(0, pool.len());
            inputs.push(ItemStack::new(pool.swap_remove(idx), 1));
        }

        let mut recipe = Self {
            inputs,
            output: ItemStack::new(output, 1),
        };
        recipe.balance(items, margin, rng);
        recipe
    }

    /// Turns `input` back into whichever basic material the existing recipes
    /// consume most. `None` when no recipe consumes a basic item.
    pub fn build_which_uses(
        input: ItemId,
        existing: &[CraftingRecipe],
        items: &[ItemType],
        margin: f32,
        rng: &mut RandomNumberGenerator,
    ) -> Option<Self> {
        let mut usage = vec![0u32; items.len()];
        for stack in existing.iter().flat_map(|recipe| recipe.inputs.iter()) {
            let basic = items.get(stack.item.0).is_some_and(|item| !item.crafted);
            if basic {
                usage[stack.item.0] += stack.count;
            }
        }

        let mut most_used: Option<(usize, u32)> = None;
        for (idx, count) in usage.into_iter().enumerate() {
            if count > most_used.map_or(0, |(_, best)| best) {
                most_used = Some((idx, count));
            }
        }
        let (output, _) = most_used?;
        let input_rarity = items.get(input.0)?.rarity;
        let output_rarity = items.get(output)?.rarity;

        let out_count = ((input_rarity * RARITY_TO_STACK_SIZE) as u32).max(1);
        let in_count = ((output_rarity * RARITY_TO_STACK_SIZE).ceil() as u32).max(1);

        let mut inputs = SmallVec::new();
        inputs.push(ItemStack::new(input, in_count));
        let mut recipe = Self {
            inputs,
            output: ItemStack::new(ItemId(output), out_count),
        };
        recipe.balance(items, margin, rng);
        Some(recipe)
    }

    fn balance(&mut self, items: &[ItemType], margin: f32, rng: &mut RandomNumberGenerator) {
        if self.inputs.is_empty() {
            return;
        }
        for _ in 0..MAX_BALANCE_ROUNDS {
            while self.in_rarity(items) > self.out_rarity(items) + margin {
                self.output.count += 1;
            }
            while self.in_rarity(items) < self.out_rarity(items) {
                let idx = rng.range(0, self.inputs.len());
                self.inputs[idx].count += 1;
            }
            if self.is_balanced(items, margin) {
                return;
            }
        }
        warn!(
            output = self.output.item.0,
            in_rarity = self.in_rarity(items),
            out_rarity = self.out_rarity(items),
            "recipe_left_unbalanced"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{GenerationOptions, Ruleset, TemplateCatalog};

    #[test]
    fn generated_recipes_are_balanced() {
        for seed in (0..200).chain([1234, 98_765, u64::MAX]) {
            let rules = Ruleset::generate(seed, &TemplateCatalog::default(), GenerationOptions::default())
                .expect("default catalog is valid");
            assert!(!rules.recipes.is_empty());
            for recipe in &rules.recipes {
                assert!(
                    recipe.is_balanced(&rules.items, RECIPE_RARITY_MARGIN),
                    "seed {seed}: in {} out {}",
                    recipe.in_rarity(&rules.items),
                    recipe.out_rarity(&rules.items)
                );
                assert!(!recipe.inputs.is_empty() && recipe.inputs.len() <= 3);
                let mut ids: Vec<ItemId> = recipe.inputs.iter().map(|s| s.item).collect();
                ids.sort();
                ids.dedup();
                assert_eq!(ids.len(), recipe.inputs.len(), "inputs must be distinct");
            }
        }
    }

    #[test]
    fn primary_recipes_take_basic_inputs_and_make_crafted_items() {
        let options = GenerationOptions {
            conversion_recipes: false,
            ..GenerationOptions::default()
        };
        let rules = Ruleset::generate(5, &TemplateCatalog::default(), options).expect("valid");
        let crafted = rules.items.iter().filter(|item| item.crafted).count();
        assert_eq!(rules.recipes.len(), crafted * RECIPES_PER_CRAFTED_ITEM);
        for recipe in &rules.recipes {
            assert!(rules.item(recipe.output.item).crafted);
            for stack in &recipe.inputs {
                assert!(!rules.item(stack.item).crafted);
            }
        }
    }

    #[test]
    fn conversion_recipes_turn_crafted_items_into_basic_ones() {
        let rules = Ruleset::generate(6, &TemplateCatalog::default(), GenerationOptions::default())
            .expect("valid");
        let conversions: Vec<_> = rules
            .recipes
            .iter()
            .filter(|recipe| rules.item(recipe.inputs[0].item).crafted)
            .collect();
        assert!(!conversions.is_empty());
        for recipe in conversions {
            assert_eq!(recipe.inputs.len(), 1);
            assert!(!rules.item(recipe.output.item).crafted);
        }
    }

    #[test]
    fn no_usage_means_no_conversion() {
        let mut rng = RandomNumberGenerator::seeded(0);
        let item = ItemType::generate_crafted(ItemId(0), &mut rng);
        assert_eq!(
            CraftingRecipe::build_which_uses(ItemId(0), &[], &[item], RECIPE_RARITY_MARGIN, &mut rng),
            None
        );
    }
}
