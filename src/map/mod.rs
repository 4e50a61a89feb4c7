use bracket_geometry::prelude::{Point, Rect};
use bracket_noise::prelude::{FastNoise, NoiseType};
use bracket_random::prelude::RandomNumberGenerator;
use specs::Entity;
use tracing::debug;

use crate::{
    data::{
        CreatureId, ItemId, Ruleset, TerrainId, chance,
        monsters::{CreatureType, MAX_ATTACK_RANGE, MAX_SIGHT_RANGE},
    },
    grid::SparseGrid,
};

pub const TERRAIN_WAVELENGTH: f32 = 30.0;
pub const P_CREATURE_ON_TILE: f32 = 1.0 / 80.0;
pub const P_ITEM_ON_TILE: f32 = 1.0 / 60.0;
/// Entities further than this from the player (and whose target is too) sit idle.
pub const ACTIVE_ENTITY_RADIUS: i32 = MAX_SIGHT_RANGE * 3 / 2 + 1;
pub const PLAYER_GENERATE_RADIUS: i32 = ACTIVE_ENTITY_RADIUS + MAX_ATTACK_RANGE;

const MAX_NOISE_OFFSET: f32 = 25_000.0;

/// Creates the entity for a creature rolled during tile generation.
pub trait CreatureSpawner {
    fn spawn_creature(&mut self, kind: CreatureId, creature: &CreatureType, point: Point) -> Entity;
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    pub point: Point,
    pub terrain: TerrainId,
    /// Non-owning; cleared when the occupant leaves or dies.
    pub entity: Option<Entity>,
    pub stored_item: Option<ItemId>,
}

impl Tile {
    pub fn new(point: Point, terrain: TerrainId) -> Self {
        Self {
            point,
            terrain,
            entity: None,
            stored_item: None,
        }
    }

    pub fn is_free(&self) -> bool {
        self.entity.is_none()
    }
}

/// Per-terrain Perlin fields. The terrain with the strongest rarity-shaped
/// sample wins a coordinate.
struct TerrainField {
    noise: FastNoise,
    offsets: Vec<(f32, f32)>,
}

impl TerrainField {
    fn new(world_seed: u64, terrain_types: usize) -> Self {
        let mut noise = FastNoise::seeded(world_seed);
        noise.set_noise_type(NoiseType::Perlin);
        noise.set_frequency(1.0);

        let mut rng = RandomNumberGenerator::seeded(world_seed);
        let offsets = (0..terrain_types)
            .map(|_| {
                (
                    rng.range(-MAX_NOISE_OFFSET, MAX_NOISE_OFFSET),
                    rng.range(-MAX_NOISE_OFFSET, MAX_NOISE_OFFSET),
                )
            })
            .collect();
        Self { noise, offsets }
    }

    fn sample(&self, terrain: usize, point: Point) -> f32 {
        let (offset_x, offset_y) = self.offsets.get(terrain).copied().unwrap_or_default();
        let raw = self.noise.get_noise(
            offset_x + point.x as f32 / TERRAIN_WAVELENGTH,
            offset_y + point.y as f32 / TERRAIN_WAVELENGTH,
        );
        ((raw + 1.0) * 0.5).clamp(0.0, 1.0)
    }

    fn terrain_at(&self, point: Point, rules: &Ruleset) -> TerrainId {
        let mut best = TerrainId(0);
        let mut best_score = f32::MIN;
        for (idx, terrain) in rules.terrain.iter().enumerate() {
            let score = self.sample(idx, point).powf(1.0 / terrain.rarity);
            if score > best_score {
                best_score = score;
                best = TerrainId(idx);
            }
        }
        best
    }
}

/// The unbounded world. Tiles are generated on first touch and never removed;
/// generation of one tile depends only on the world seed and its coordinate.
pub struct WorldMap {
    seed: u64,
    tiles: SparseGrid<Tile>,
    field: TerrainField,
}

impl WorldMap {
    pub fn new(world_seed: u64, rules: &Ruleset) -> Self {
        Self {
            seed: world_seed,
            tiles: SparseGrid::new(),
            field: TerrainField::new(world_seed, rules.terrain.len()),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn terrain_at(&self, point: Point, rules: &Ruleset) -> TerrainId {
        self.field.terrain_at(point, rules)
    }

    /// Returns the tile at `point`, generating it (and any creature it rolls)
    /// when it does not exist yet.
    pub fn tile_mut(
        &mut self,
        point: Point,
        rules: &Ruleset,
        spawner: &mut dyn CreatureSpawner,
    ) -> Option<&mut Tile> {
        let field = &self.field;
        let seed = self.seed;
        self.tiles
            .get_or_insert_with(point, || generate_tile(field, seed, point, rules, spawner))
    }

    pub fn tile(&mut self, point: Point, rules: &Ruleset, spawner: &mut dyn CreatureSpawner) -> Option<&Tile> {
        self.tile_mut(point, rules, spawner).map(|tile| &*tile)
    }

    /// Looks at an existing tile without generating anything.
    pub fn peek(&self, point: Point) -> Option<&Tile> {
        self.tiles.peek(point)
    }

    pub fn peek_mut(&mut self, point: Point) -> Option<&mut Tile> {
        self.tiles.peek_mut(point)
    }

    pub fn occupant(&self, point: Point) -> Option<Entity> {
        self.peek(point).and_then(|tile| tile.entity)
    }

    /// Generates every tile in `bounds` (`x2`/`y2` exclusive).
    pub fn generate_in_bounds(&mut self, bounds: Rect, rules: &Ruleset, spawner: &mut dyn CreatureSpawner) {
        let mut generated = 0usize;
        for x in bounds.x1..bounds.x2 {
            for y in bounds.y1..bounds.y2 {
                let point = Point::new(x, y);
                if self.peek(point).is_none() {
                    generated += 1;
                }
                self.tile_mut(point, rules, spawner);
            }
        }
        debug!(
            x1 = bounds.x1,
            y1 = bounds.y1,
            x2 = bounds.x2,
            y2 = bounds.y2,
            generated,
            "map_bounds_generated"
        );
    }

    /// Square of side `2 * radius + 1` centred on `centre`.
    pub fn generate_around(&mut self, centre: Point, radius: i32, rules: &Ruleset, spawner: &mut dyn CreatureSpawner) {
        let bounds = Rect::with_exact(
            centre.x - radius,
            centre.y - radius,
            centre.x + radius + 1,
            centre.y + radius + 1,
        );
        self.generate_in_bounds(bounds, rules, spawner);
    }

    /// Generates the strip that enters the player's generation square after a
    /// one-tile step from `from` by `delta`.
    pub fn generate_leading_edge(
        &mut self,
        from: Point,
        delta: Point,
        rules: &Ruleset,
        spawner: &mut dyn CreatureSpawner,
    ) {
        let r = PLAYER_GENERATE_RADIUS;
        let bounds = match (delta.x.signum(), delta.y.signum()) {
            (1, 0) => Rect::with_exact(from.x + r + 1, from.y - r, from.x + r + 2, from.y + r + 1),
            (-1, 0) => Rect::with_exact(from.x - r - 1, from.y - r, from.x - r, from.y + r + 1),
            (0, 1) => Rect::with_exact(from.x - r, from.y + r + 1, from.x + r + 1, from.y + r + 2),
            (0, -1) => Rect::with_exact(from.x - r, from.y - r - 1, from.x + r + 1, from.y - r),
            _ => return,
        };
        self.generate_in_bounds(bounds, rules, spawner);
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles.iter().map(|(_, tile)| tile)
    }

    /// Number of tiles generated so far; constant time.
    pub fn generated_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn generated_bounds(&self) -> Option<Rect> {
        Some(Rect::with_exact(
            self.tiles.min_occupied_x()?,
            self.tiles.min_occupied_y()?,
            self.tiles.max_occupied_x()? + 1,
            self.tiles.max_occupied_y()? + 1,
        ))
    }
}

fn generate_tile(
    field: &TerrainField,
    world_seed: u64,
    point: Point,
    rules: &Ruleset,
    spawner: &mut dyn CreatureSpawner,
) -> Tile {
    let terrain = field.terrain_at(point, rules);
    let mut tile = Tile::new(point, terrain);
    let Some(terrain_type) = rules.terrain.get(terrain.0) else {
        return tile;
    };

    let mut rng = RandomNumberGenerator::seeded(tile_seed(world_seed, point));
    if chance(&mut rng, P_CREATURE_ON_TILE) {
        if let Some(kind) = terrain_type.random_creature(&mut rng) {
            let entity = spawner.spawn_creature(kind, rules.creature(kind), point);
            tile.entity = Some(entity);
        }
    }
    if chance(&mut rng, P_ITEM_ON_TILE) {
        tile.stored_item = terrain_type.random_item(&mut rng, &rules.items);
    }
    tile
}

/// Mixes the world seed and a coordinate into an independent stream seed.
fn tile_seed(world_seed: u64, point: Point) -> u64 {
    let packed = ((point.x as u32 as u64) << 32) | point.y as u32 as u64;
    let mut z = world_seed ^ packed.wrapping_mul(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{GenerationOptions, TemplateCatalog};
    use specs::{Builder, World as SpecsWorld, WorldExt};

    struct CountingSpawner {
        world: SpecsWorld,
        spawned: Vec<(CreatureId, Point)>,
    }

    impl CountingSpawner {
        fn new() -> Self {
            Self {
                world: SpecsWorld::new(),
                spawned: Vec::new(),
            }
        }
    }

    impl CreatureSpawner for CountingSpawner {
        fn spawn_creature(&mut self, kind: CreatureId, _creature: &CreatureType, point: Point) -> Entity {
            self.spawned.push((kind, point));
            self.world.create_entity().build()
        }
    }

    fn rules() -> Ruleset {
        Ruleset::generate(12, &TemplateCatalog::default(), GenerationOptions::default()).expect("valid")
    }

    #[test]
    fn radii_follow_sight_and_attack_limits() {
        assert_eq!(ACTIVE_ENTITY_RADIUS, 31);
        assert_eq!(PLAYER_GENERATE_RADIUS, 43);
    }

    #[test]
    fn tiles_are_generated_once_and_kept() {
        let rules = rules();
        let mut map = WorldMap::new(5, &rules);
        let mut spawner = CountingSpawner::new();
        let point = Point::new(-3, 8);
        assert!(map.peek(point).is_none());
        let first = map.tile(point, &rules, &mut spawner).cloned().expect("tile");
        let second = map.tile(point, &rules, &mut spawner).cloned().expect("tile");
        assert_eq!(first, second);
        assert_eq!(map.generated_count(), 1);
    }

    #[test]
    fn generation_is_independent_of_visit_order() {
        let rules = rules();
        let bounds = Rect::with_exact(-20, -20, 20, 20);

        let mut forward = WorldMap::new(77, &rules);
        let mut forward_spawner = CountingSpawner::new();
        forward.generate_in_bounds(bounds, &rules, &mut forward_spawner);

        let mut backward = WorldMap::new(77, &rules);
        let mut backward_spawner = CountingSpawner::new();
        for x in (bounds.x1..bounds.x2).rev() {
            for y in (bounds.y1..bounds.y2).rev() {
                backward.tile(Point::new(x, y), &rules, &mut backward_spawner);
            }
        }

        for x in bounds.x1..bounds.x2 {
            for y in bounds.y1..bounds.y2 {
                let point = Point::new(x, y);
                let a = forward.peek(point).expect("generated");
                let b = backward.peek(point).expect("generated");
                assert_eq!(a.terrain, b.terrain);
                assert_eq!(a.stored_item, b.stored_item);
                assert_eq!(a.entity.is_some(), b.entity.is_some());
            }
        }

        let mut spawned_a = forward_spawner.spawned.clone();
        let mut spawned_b = backward_spawner.spawned.clone();
        spawned_a.sort_by_key(|(kind, p)| (kind.0, p.x, p.y));
        spawned_b.sort_by_key(|(kind, p)| (kind.0, p.x, p.y));
        assert_eq!(spawned_a, spawned_b);
    }

    #[test]
    fn noise_produces_more_than_one_terrain() {
        let rules = rules();
        let map = WorldMap::new(3, &rules);
        let mut seen = std::collections::HashSet::new();
        for x in (-600..600).step_by(15) {
            for y in (-600..600).step_by(15) {
                seen.insert(map.terrain_at(Point::new(x, y), &rules));
            }
        }
        assert!(seen.len() > 1);
    }

    #[test]
    fn leading_edge_is_one_strip_beyond_the_square() {
        let rules = rules();
        let mut map = WorldMap::new(1, &rules);
        let mut spawner = CountingSpawner::new();
        map.generate_leading_edge(Point::new(0, 0), Point::new(1, 0), &rules, &mut spawner);
        let r = PLAYER_GENERATE_RADIUS;
        assert_eq!(map.generated_count(), (2 * r + 1) as usize);
        assert!(map.peek(Point::new(r + 1, r)).is_some());
        assert!(map.peek(Point::new(r + 1, -r)).is_some());
        assert!(map.peek(Point::new(r, 0)).is_none());
    }

    #[test]
    fn overlapping_generation_counts_each_tile_once() {
        let rules = rules();
        let mut map = WorldMap::new(4, &rules);
        let mut spawner = CountingSpawner::new();
        map.generate_around(Point::new(0, 0), 5, &rules, &mut spawner);
        map.generate_around(Point::new(3, 0), 5, &rules, &mut spawner);
        map.generate_leading_edge(Point::new(3, 0), Point::new(0, -1), &rules, &mut spawner);
        assert_eq!(map.generated_count(), map.tiles().count());
        assert_eq!(map.generated_count(), 14 * 11 + (2 * PLAYER_GENERATE_RADIUS + 1) as usize);
    }

    #[test]
    fn creature_spawns_are_recorded_on_their_tile() {
        let rules = rules();
        let mut map = WorldMap::new(9, &rules);
        let mut spawner = CountingSpawner::new();
        map.generate_around(Point::new(0, 0), 30, &rules, &mut spawner);
        assert_eq!(map.generated_count(), 61 * 61);
        for (_, point) in &spawner.spawned {
            assert!(map.occupant(*point).is_some());
        }
        let occupied = map.tiles().filter(|tile| !tile.is_free()).count();
        assert_eq!(occupied, spawner.spawned.len());
    }
}
