use bracket_geometry::prelude::Point;
use specs::Entity;

use crate::data::ItemId;

/// Notifications for the presentation layer. Fire and forget.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Attack { source: Entity, target: Entity },
    MovementStart(Entity),
    MovementEnd(Entity),
    HealthChanged(Entity),
    TileItemChanged(Point),
    InventoryChanged { item: ItemId, amount: u32 },
    SelectedItemChanged { new: Option<ItemId>, old: Option<ItemId> },
    ScoreChanged,
    Death,
}

#[derive(Default)]
pub struct EventLog {
    pub events: Vec<GameEvent>,
}

impl EventLog {
    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Score {
    pub turns_survived: u64,
    pub hunt_score: f32,
}

/// Receiver for [`GameEvent`]s. Every hook defaults to doing nothing.
pub trait GameObserver {
    fn on_attack(&mut self, _source: Entity, _target: Entity) {}
    fn on_movement_start(&mut self, _entity: Entity) {}
    fn on_movement_end(&mut self, _entity: Entity) {}
    fn on_health_changed(&mut self, _entity: Entity) {}
    fn on_tile_item_changed(&mut self, _point: Point) {}
    fn on_inventory_changed(&mut self, _item: ItemId, _amount: u32) {}
    fn on_selected_item_changed(&mut self, _new: Option<ItemId>, _old: Option<ItemId>) {}
    fn on_score_changed(&mut self) {}
    fn on_death(&mut self) {}
}

pub fn dispatch<O: GameObserver + ?Sized>(events: &[GameEvent], observer: &mut O) {
    for event in events {
        match event {
            GameEvent::Attack { source, target } => observer.on_attack(*source, *target),
            GameEvent::MovementStart(entity) => observer.on_movement_start(*entity),
            GameEvent::MovementEnd(entity) => observer.on_movement_end(*entity),
            GameEvent::HealthChanged(entity) => observer.on_health_changed(*entity),
            GameEvent::TileItemChanged(point) => observer.on_tile_item_changed(*point),
            GameEvent::InventoryChanged { item, amount } => observer.on_inventory_changed(*item, *amount),
            GameEvent::SelectedItemChanged { new, old } => observer.on_selected_item_changed(*new, *old),
            GameEvent::ScoreChanged => observer.on_score_changed(),
            GameEvent::Death => observer.on_death(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Tally {
        tiles: Vec<Point>,
        scores: usize,
        deaths: usize,
    }

    impl GameObserver for Tally {
        fn on_tile_item_changed(&mut self, point: Point) {
            self.tiles.push(point);
        }

        fn on_score_changed(&mut self) {
            self.scores += 1;
        }

        fn on_death(&mut self) {
            self.deaths += 1;
        }
    }

    #[test]
    fn dispatch_routes_events_to_hooks() {
        let mut log = EventLog::default();
        log.push(GameEvent::TileItemChanged(Point::new(2, 3)));
        log.push(GameEvent::ScoreChanged);
        log.push(GameEvent::ScoreChanged);
        log.push(GameEvent::Death);
        let events = log.drain();
        assert!(log.events.is_empty());

        let mut tally = Tally::default();
        dispatch(&events, &mut tally);
        assert_eq!(tally.tiles, vec![Point::new(2, 3)]);
        assert_eq!(tally.scores, 2);
        assert_eq!(tally.deaths, 1);
    }
}
