pub mod items;
pub mod monsters;
pub mod recipes;
pub mod terrain;

use bracket_random::prelude::RandomNumberGenerator;
use bracket_terminal::prelude::{HSV, RGB};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use self::{
    items::ItemType,
    monsters::CreatureType,
    recipes::CraftingRecipe,
    terrain::TerrainType,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TerrainId(pub usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CreatureId(pub usize);

/// Dense index into the item table; also indexes inventory counts.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecipeId(pub usize);

pub const TERRAIN_PALETTE: (f32, f32) = (0.85, 0.55);
pub const CREATURE_PALETTE: (f32, f32) = (0.85, 0.9);
pub const ITEM_PALETTE: (f32, f32) = (0.85, 0.9);

/// Sprite names the presentation layer knows how to draw, grouped by role.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateCatalog {
    pub terrain: Vec<String>,
    pub creatures: Vec<String>,
    pub basic_items: Vec<String>,
    pub crafted_items: Vec<String>,
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        fn names(list: &[&str]) -> Vec<String> {
            list.iter().map(|name| name.to_string()).collect()
        }
        Self {
            terrain: names(&["grass", "sand", "stone", "marsh"]),
            creatures: names(&["beetle", "wolf", "bat", "snake", "golem", "slime"]),
            basic_items: names(&[
                "beetle", "wolf", "bat", "snake", "golem", "slime", "stick", "pebble", "reed",
            ]),
            crafted_items: names(&["spear", "sling", "axe", "tonic"]),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("template catalog has no {0} templates")]
    Empty(&'static str),
    #[error("colour variant count must be at least one")]
    NoColourVariants,
    #[error("basic items per template must be at least one")]
    NoBasicItemsPerTemplate,
    #[error("{basic_items} basic items cannot give a drop to each of {creatures} creatures")]
    NotEnoughBasicItems { basic_items: usize, creatures: usize },
}

impl TemplateCatalog {
    pub fn validate(&self, options: &GenerationOptions) -> Result<(), CatalogError> {
        if options.colour_variants == 0 {
            return Err(CatalogError::NoColourVariants);
        }
        if options.basic_items_per_template == 0 {
            return Err(CatalogError::NoBasicItemsPerTemplate);
        }
        if self.terrain.is_empty() {
            return Err(CatalogError::Empty("terrain"));
        }
        if self.creatures.is_empty() {
            return Err(CatalogError::Empty("creature"));
        }
        if self.basic_items.is_empty() {
            return Err(CatalogError::Empty("basic item"));
        }
        let creatures = self.creatures.len() * options.colour_variants;
        let basic_items = self.basic_items.len() * options.basic_items_per_template;
        if basic_items < creatures {
            return Err(CatalogError::NotEnoughBasicItems {
                basic_items,
                creatures,
            });
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GenerationOptions {
    /// Colour variants per terrain, creature and crafted item template.
    pub colour_variants: usize,
    /// Basic items rolled per basic item template. Independent of
    /// `colour_variants`; leftover basic items are recoloured in groups of
    /// this size.
    pub basic_items_per_template: usize,
    pub conversion_recipes: bool,
    pub recipe_margin: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            colour_variants: 3,
            basic_items_per_template: 3,
            conversion_recipes: true,
            recipe_margin: recipes::RECIPE_RARITY_MARGIN,
        }
    }
}

/// Every generated definition. Immutable once built; ids index these tables.
#[derive(Clone, Debug)]
pub struct Ruleset {
    pub seed: u64,
    pub terrain: Vec<TerrainType>,
    pub creatures: Vec<CreatureType>,
    pub items: Vec<ItemType>,
    pub recipes: Vec<CraftingRecipe>,
}

impl Ruleset {
    pub fn generate(
        seed: u64,
        catalog: &TemplateCatalog,
        options: GenerationOptions,
    ) -> Result<Self, CatalogError> {
        RulesGenerator::new(seed, catalog, options).generate()
    }

    /// Direct lookups panic on an id from another ruleset; use the `get_*`
    /// variants for ids that did not come from this one.
    pub fn terrain(&self, id: TerrainId) -> &TerrainType {
        &self.terrain[id.0]
    }

    pub fn creature(&self, id: CreatureId) -> &CreatureType {
        &self.creatures[id.0]
    }

    pub fn item(&self, id: ItemId) -> &ItemType {
        &self.items[id.0]
    }

    pub fn get_terrain(&self, id: TerrainId) -> Option<&TerrainType> {
        self.terrain.get(id.0)
    }

    pub fn get_creature(&self, id: CreatureId) -> Option<&CreatureType> {
        self.creatures.get(id.0)
    }

    pub fn get_item(&self, id: ItemId) -> Option<&ItemType> {
        self.items.get(id.0)
    }

    pub fn recipe(&self, id: RecipeId) -> Option<&CraftingRecipe> {
        self.recipes.get(id.0)
    }

    pub fn terrain_ids(&self) -> impl Iterator<Item = TerrainId> + '_ {
        (0..self.terrain.len()).map(TerrainId)
    }

    pub fn creature_ids(&self) -> impl Iterator<Item = CreatureId> + '_ {
        (0..self.creatures.len()).map(CreatureId)
    }
}

/// Builds a [`Ruleset`] from one seed. The order of every roll is fixed, so a
/// seed and catalog always reproduce the same tables.
pub struct RulesGenerator<'a> {
    seed: u64,
    catalog: &'a TemplateCatalog,
    options: GenerationOptions,
    rng: RandomNumberGenerator,
}

impl<'a> RulesGenerator<'a> {
    pub fn new(seed: u64, catalog: &'a TemplateCatalog, options: GenerationOptions) -> Self {
        Self {
            seed,
            catalog,
            options,
            rng: RandomNumberGenerator::seeded(seed),
        }
    }

    pub fn generate(mut self) -> Result<Ruleset, CatalogError> {
        self.catalog.validate(&self.options)?;

        let mut terrain = self.generate_terrain();
        let mut creatures = self.generate_creatures();
        monsters::generate_stances(&mut creatures, &mut self.rng);
        self.assign_spawn_weights(&mut terrain, &creatures);

        let mut items = self.generate_basic_items();
        let leftovers = self.assign_drops(&mut items, &mut creatures);
        self.distribute_leftovers(&mut items, &mut terrain, &leftovers);

        let basic: Vec<_> = (0..items.len()).map(ItemId).collect();
        let recipes = self.generate_crafted(&mut items, &basic);

        info!(
            seed = self.seed,
            terrain_types = terrain.len(),
            creature_types = creatures.len(),
            item_types = items.len(),
            recipes = recipes.len(),
            "ruleset_generated"
        );

        Ok(Ruleset {
            seed: self.seed,
            terrain,
            creatures,
            items,
            recipes,
        })
    }

    fn generate_terrain(&mut self) -> Vec<TerrainType> {
        let (value, saturation) = TERRAIN_PALETTE;
        let mut terrain = Vec::new();
        let catalog = self.catalog;
        for sprite in &catalog.terrain {
            for color in random_colours(&mut self.rng, self.options.colour_variants, value, saturation) {
                terrain.push(TerrainType::generate(&mut self.rng, sprite, color));
            }
        }
        terrain
    }

    fn generate_creatures(&mut self) -> Vec<CreatureType> {
        let (value, saturation) = CREATURE_PALETTE;
        let mut creatures = Vec::new();
        let catalog = self.catalog;
        for sprite in &catalog.creatures {
            for color in random_colours(&mut self.rng, self.options.colour_variants, value, saturation) {
                creatures.push(CreatureType::generate(&mut self.rng, sprite, color));
            }
        }
        creatures
    }

    fn assign_spawn_weights(&mut self, terrain: &mut [TerrainType], creatures: &[CreatureType]) {
        for creature in creatures {
            let base = creature.base_spawn_weight();
            for terrain_type in terrain.iter_mut() {
                let roll = unit(&mut self.rng);
                terrain_type.spawn_weights.push(base * roll.powi(3));
            }
        }
    }

    fn generate_basic_items(&mut self) -> Vec<ItemType> {
        let count = self.catalog.basic_items.len() * self.options.basic_items_per_template;
        (0..count)
            .map(|idx| ItemType::generate_basic(ItemId(idx), &mut self.rng))
            .collect()
    }

    /// Gives the rarest items to the strongest creatures. Returns the items no
    /// creature drops.
    fn assign_drops(&mut self, items: &mut [ItemType], creatures: &mut [CreatureType]) -> Vec<ItemId> {
        let mut by_rarity: Vec<ItemId> = (0..items.len()).map(ItemId).collect();
        by_rarity.sort_by(|a, b| items[b.0].rarity.total_cmp(&items[a.0].rarity));

        let mut by_diff: Vec<CreatureId> = (0..creatures.len()).map(CreatureId).collect();
        by_diff.sort_by(|a, b| creatures[b.0].diff.total_cmp(&creatures[a.0].diff));

        for (creature_id, item_id) in by_diff.iter().zip(by_rarity.iter()) {
            let creature = &mut creatures[creature_id.0];
            let item = &mut items[item_id.0];
            item.sprite = creature.sprite.clone();
            item.color = creature.color;
            creature.drop = Some(*item_id);
        }

        by_rarity.split_off(by_diff.len().min(by_rarity.len()))
    }

    fn distribute_leftovers(
        &mut self,
        items: &mut [ItemType],
        terrain: &mut [TerrainType],
        leftovers: &[ItemId],
    ) {
        let (value, saturation) = ITEM_PALETTE;
        let variants = self.options.basic_items_per_template;
        let catalog = self.catalog;
        let templates = &catalog.basic_items;
        let first_template = catalog.creatures.len();

        for (chunk_idx, chunk) in leftovers.chunks(variants).enumerate() {
            let sprite = &templates[(first_template + chunk_idx) % templates.len()];
            let colours = random_colours(&mut self.rng, variants, value, saturation);
            for (item_id, color) in chunk.iter().zip(colours) {
                let item = &mut items[item_id.0];
                item.sprite = sprite.clone();
                item.color = color;
            }
        }

        if terrain.is_empty() {
            return;
        }
        for (idx, item_id) in leftovers.iter().enumerate() {
            let count = terrain.len();
            terrain[idx % count].items_found_here.push(*item_id);
        }
    }

    fn generate_crafted(&mut self, items: &mut Vec<ItemType>, basic: &[ItemId]) -> Vec<CraftingRecipe> {
        let (value, saturation) = ITEM_PALETTE;
        let margin = self.options.recipe_margin;
        let mut recipes = Vec::new();

        let catalog = self.catalog;
        for sprite in &catalog.crafted_items {
            for color in random_colours(&mut self.rng, self.options.colour_variants, value, saturation) {
                let id = ItemId(items.len());
                let mut item = ItemType::generate_crafted(id, &mut self.rng);
                item.sprite = sprite.clone();
                item.color = color;
                items.push(item);

                for _ in 0..recipes::RECIPES_PER_CRAFTED_ITEM {
                    recipes.push(CraftingRecipe::build_for(id, basic, items, margin, &mut self.rng));
                }
                if self.options.conversion_recipes {
                    if let Some(recipe) =
                        CraftingRecipe::build_which_uses(id, &recipes, items, margin, &mut self.rng)
                    {
                        recipes.push(recipe);
                    }
                }
            }
        }
        recipes
    }
}

/// Linear remap of `value` from one band onto another. No clamping.
pub fn remap(value: f32, from_low: f32, from_high: f32, to_low: f32, to_high: f32) -> f32 {
    to_low + (value - from_low) * (to_high - to_low) / (from_high - from_low)
}

pub fn chance(rng: &mut RandomNumberGenerator, probability: f32) -> bool {
    rng.rand::<f32>() < probability
}

/// Uniform sample from `[0, 1)`.
pub fn unit(rng: &mut RandomNumberGenerator) -> f32 {
    rng.rand::<f32>()
}

pub fn uniform(rng: &mut RandomNumberGenerator, low: f32, high: f32) -> f32 {
    low + unit(rng) * (high - low)
}

/// Integer roll in `min..max`; collapses to `min` when the range is empty.
pub fn roll_range(rng: &mut RandomNumberGenerator, min: i32, max: i32) -> i32 {
    if max <= min { min } else { rng.range(min, max) }
}

/// Colours evenly spaced around the hue wheel from a random start.
pub fn random_colours(
    rng: &mut RandomNumberGenerator,
    count: usize,
    value: f32,
    saturation: f32,
) -> Vec<RGB> {
    if count == 0 {
        return Vec::new();
    }
    let spacing = 1.0 / count as f32;
    let start = unit(rng);
    (0..count)
        .map(|idx| {
            let hue = (start + spacing * idx as f32).fract();
            HSV::from_f32(hue, saturation, value).to_rgb()
        })
        .collect()
}

/// Cumulative-weight pick. Falls back to the first candidate when float error
/// lets the roll run past the total.
pub fn weighted_pick<T: Copy>(
    rng: &mut RandomNumberGenerator,
    candidates: &[(T, f32)],
    context: &'static str,
) -> Option<T> {
    let total: f32 = candidates.iter().map(|(_, weight)| weight.max(0.0)).sum();
    if total <= 0.0 {
        return None;
    }
    let mut roll = unit(rng) * total;
    for (candidate, weight) in candidates {
        let weight = weight.max(0.0);
        if roll < weight {
            return Some(*candidate);
        }
        roll -= weight;
    }
    warn!(context, total, "weighted_pick_fallback");
    candidates.first().map(|(candidate, _)| *candidate)
}

#[cfg(test)]
pub(crate) mod test_support {
    use bracket_terminal::prelude::RGB;
    use smallvec::smallvec;

    use super::*;
    use crate::data::{monsters::Stance, recipes::ItemStack};

    pub(crate) fn creature(health: i32, attack_range: i32, sight_range: i32, stance: Stance) -> CreatureType {
        CreatureType {
            sprite: "wolf".into(),
            color: RGB::from_f32(0.6, 0.6, 0.6),
            move_speed: 2,
            attack_range,
            sight_range,
            attack_damage: 5,
            attack_cooldown: 3,
            health,
            diff: 1.0,
            player_stance: stance,
            stances: None,
            drop: Some(ItemId(0)),
        }
    }

    pub(crate) fn item(id: usize, crafted: bool) -> ItemType {
        ItemType {
            id: ItemId(id),
            sprite: "bone".into(),
            color: RGB::from_f32(1.0, 1.0, 1.0),
            health_effect: 5,
            melee_range: 1,
            melee_damage: 3,
            throw_range: 6,
            throw_damage: 2,
            rarity: 1.0,
            crafted,
        }
    }

    /// One harmless terrain with no natural spawns, so tests place everything.
    pub(crate) fn flat_rules_with(mut creatures: Vec<CreatureType>) -> Ruleset {
        let count = creatures.len();
        for creature in &mut creatures {
            creature.stances = Some(vec![Stance::SemiHostile; count]);
        }
        let terrain = TerrainType {
            sprite: "grass".into(),
            color: RGB::from_f32(0.2, 0.7, 0.2),
            terrain_speed: 2,
            damage_per_turn: 0,
            rarity: 1.0,
            spawn_weights: vec![0.0; count],
            items_found_here: Vec::new(),
        };
        Ruleset {
            seed: 0,
            terrain: vec![terrain],
            creatures,
            items: vec![item(0, false), item(1, true)],
            recipes: vec![CraftingRecipe {
                inputs: smallvec![ItemStack::new(ItemId(0), 2)],
                output: ItemStack::new(ItemId(1), 1),
            }],
        }
    }

    pub(crate) fn flat_rules() -> Ruleset {
        flat_rules_with(vec![creature(30, 3, 8, Stance::SemiHostile)])
    }
}
