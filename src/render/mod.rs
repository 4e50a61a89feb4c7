use bracket_geometry::prelude::{Point, Rect};
use tracing::error;

use crate::{ecs::components::ActorKind, game::Game, grid::SparseGrid};

/// Coordinates that left and entered view after [`VisibleRegion::recenter`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionChange {
    pub exited: Vec<Point>,
    pub entered: Vec<Point>,
}

/// The rectangle of tiles a presentation layer currently shows. It only
/// tracks coordinates; whatever draws them disposes and creates visuals from
/// the reported changes.
#[derive(Default)]
pub struct VisibleRegion {
    shown: SparseGrid<Point>,
}

impl VisibleRegion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_shown(&self, point: Point) -> bool {
        self.shown.peek(point).is_some()
    }

    pub fn len(&self) -> usize {
        self.shown.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shown.is_empty()
    }

    /// Marks one coordinate as shown. Showing it twice is a caller bug.
    pub fn show(&mut self, point: Point) -> bool {
        if self.shown.set(point, point).is_some() {
            error!(x = point.x, y = point.y, "visual_created_twice");
            return false;
        }
        true
    }

    /// Moves the view to `range` (`x2`/`y2` exclusive).
    pub fn recenter(&mut self, range: Rect) -> RegionChange {
        let mut exited = self.shown.trim_to_range(range);
        exited.sort_by_key(|point| (point.x, point.y));

        let mut entered = Vec::new();
        for x in range.x1..range.x2 {
            for y in range.y1..range.y2 {
                let point = Point::new(x, y);
                if !self.is_shown(point) && self.show(point) {
                    entered.push(point);
                }
            }
        }
        RegionChange { exited, entered }
    }
}

/// One character per tile: `@` the player, a creature's initial, `*` for a
/// stored item, otherwise the terrain's initial. Ungenerated tiles are blank.
pub fn ascii_rows(game: &Game, range: Rect) -> Vec<String> {
    (range.y1..range.y2)
        .map(|y| {
            (range.x1..range.x2)
                .map(|x| glyph_at(game, Point::new(x, y)))
                .collect()
        })
        .collect()
}

fn glyph_at(game: &Game, point: Point) -> char {
    let Some(tile) = game.map.peek(point) else {
        return ' ';
    };
    let occupant = tile
        .entity
        .filter(|entity| game.ecs.position(*entity) == Some(point))
        .and_then(|entity| game.ecs.kind(entity));
    match occupant {
        Some(ActorKind::Player) => '@',
        Some(ActorKind::Creature(kind)) => initial(&game.rules.creature(kind).sprite, 'c').to_ascii_uppercase(),
        None if tile.stored_item.is_some() => '*',
        None => initial(&game.rules.terrain(tile.terrain).sprite, '.').to_ascii_lowercase(),
    }
}

fn initial(sprite: &str, fallback: char) -> char {
    sprite.chars().next().unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::PlayerConfig, data::{CreatureId, test_support::flat_rules}};

    #[test]
    fn recenter_reports_both_edges() {
        let mut region = VisibleRegion::new();
        let first = region.recenter(Rect::with_exact(0, 0, 3, 3));
        assert!(first.exited.is_empty());
        assert_eq!(first.entered.len(), 9);

        let moved = region.recenter(Rect::with_exact(1, 0, 4, 3));
        assert_eq!(
            moved.exited,
            vec![Point::new(0, 0), Point::new(0, 1), Point::new(0, 2)]
        );
        assert_eq!(
            moved.entered,
            vec![Point::new(3, 0), Point::new(3, 1), Point::new(3, 2)]
        );
        assert_eq!(region.len(), 9);
        assert!(!region.is_shown(Point::new(0, 1)));
    }

    #[test]
    fn showing_twice_is_refused() {
        let mut region = VisibleRegion::new();
        assert!(region.show(Point::new(-2, 5)));
        assert!(!region.show(Point::new(-2, 5)));
        assert_eq!(region.len(), 1);
    }

    #[test]
    fn ascii_marks_player_and_creatures() {
        let mut game = Game::with_ruleset(flat_rules(), 2, PlayerConfig::default(), 0.1);
        game.spawn_creature_at(CreatureId(0), Point::new(1, 0));
        let rows = ascii_rows(&game, Rect::with_exact(-1, 0, 2, 1));
        assert_eq!(rows, vec!["g@W".to_string()]);
    }
}
