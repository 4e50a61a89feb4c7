use bracket_geometry::prelude::{Point, Rect};

/// One axis of storage growing outward from index zero in both directions.
#[derive(Clone, Debug)]
struct Axis<T> {
    negatives: Vec<T>,
    non_negatives: Vec<T>,
}

impl<T> Axis<T> {
    fn new(fill: impl FnMut() -> T) -> Self {
        let mut axis = Self {
            negatives: Vec::new(),
            non_negatives: Vec::new(),
        };
        axis.extend_to(0, fill);
        axis
    }

    fn min_index(&self) -> i32 {
        -(self.negatives.len() as i32)
    }

    fn max_index(&self) -> i32 {
        self.non_negatives.len() as i32 - 1
    }

    fn extend_to(&mut self, index: i32, mut fill: impl FnMut() -> T) {
        while index > self.max_index() {
            self.non_negatives.push(fill());
        }
        while index < self.min_index() {
            self.negatives.push(fill());
        }
    }

    fn get(&self, index: i32) -> Option<&T> {
        if index >= 0 {
            self.non_negatives.get(index as usize)
        } else {
            self.negatives.get((-index - 1) as usize)
        }
    }

    fn get_mut(&mut self, index: i32) -> Option<&mut T> {
        if index >= 0 {
            self.non_negatives.get_mut(index as usize)
        } else {
            self.negatives.get_mut((-index - 1) as usize)
        }
    }

    /// Drops every slot outside `min..=max`, always keeping index zero.
    fn truncate(&mut self, min: i32, max: i32) {
        self.non_negatives.truncate((max.max(0) + 1) as usize);
        self.negatives.truncate((-min.min(0)) as usize);
    }

    fn iter(&self) -> impl Iterator<Item = (i32, &T)> + '_ {
        self.negatives
            .iter()
            .enumerate()
            .rev()
            .map(|(idx, value)| (-(idx as i32) - 1, value))
            .chain(
                self.non_negatives
                    .iter()
                    .enumerate()
                    .map(|(idx, value)| (idx as i32, value)),
            )
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.negatives.iter_mut().chain(self.non_negatives.iter_mut())
    }
}

/// Unbounded, origin-centred 2D storage. Columns always share one row extent,
/// so any coordinate resolves with two index lookups.
///
/// Reading through [`SparseGrid::get`] grows the allocation but never writes a
/// value; unset cells read as `None`.
#[derive(Clone, Debug)]
pub struct SparseGrid<T> {
    columns: Axis<Axis<Option<T>>>,
    occupied: usize,
}

impl<T> Default for SparseGrid<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SparseGrid<T> {
    pub fn new() -> Self {
        Self {
            columns: Axis::new(|| Axis::new(|| None)),
            occupied: 0,
        }
    }

    pub fn min_x(&self) -> i32 {
        self.columns.min_index()
    }

    pub fn max_x(&self) -> i32 {
        self.columns.max_index()
    }

    pub fn min_y(&self) -> i32 {
        self.columns.get(0).map_or(0, Axis::min_index)
    }

    pub fn max_y(&self) -> i32 {
        self.columns.get(0).map_or(0, Axis::max_index)
    }

    /// Row extent of every allocated column, left to right.
    pub fn column_row_bounds(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.columns
            .iter()
            .map(|(_, column)| (column.min_index(), column.max_index()))
    }

    fn extend_to(&mut self, x: i32, y: i32) {
        if y < self.min_y() || y > self.max_y() {
            for column in self.columns.iter_mut() {
                column.extend_to(y, || None);
            }
        }

        if x < self.min_x() || x > self.max_x() {
            let (min_y, max_y) = (self.min_y(), self.max_y());
            self.columns.extend_to(x, || {
                let mut column = Axis::new(|| None);
                column.extend_to(min_y, || None);
                column.extend_to(max_y, || None);
                column
            });
        }
    }

    fn slot_mut(&mut self, point: Point) -> Option<&mut Option<T>> {
        self.extend_to(point.x, point.y);
        self.columns
            .get_mut(point.x)
            .and_then(|column| column.get_mut(point.y))
    }

    /// Reads a cell, growing the allocation to cover it.
    pub fn get(&mut self, point: Point) -> Option<&T> {
        self.slot_mut(point).and_then(|slot| slot.as_ref())
    }

    pub fn get_mut(&mut self, point: Point) -> Option<&mut T> {
        self.slot_mut(point).and_then(|slot| slot.as_mut())
    }

    /// Reads a cell without touching the allocation.
    pub fn peek(&self, point: Point) -> Option<&T> {
        self.columns
            .get(point.x)
            .and_then(|column| column.get(point.y))
            .and_then(|slot| slot.as_ref())
    }

    pub fn peek_mut(&mut self, point: Point) -> Option<&mut T> {
        self.columns
            .get_mut(point.x)
            .and_then(|column| column.get_mut(point.y))
            .and_then(|slot| slot.as_mut())
    }

    /// Stores `value`, returning whatever was there before.
    pub fn set(&mut self, point: Point, value: T) -> Option<T> {
        let slot = self.slot_mut(point)?;
        let previous = slot.replace(value);
        if previous.is_none() {
            self.occupied += 1;
        }
        previous
    }

    /// Clears a cell, returning its value.
    pub fn take(&mut self, point: Point) -> Option<T> {
        let value = self
            .columns
            .get_mut(point.x)
            .and_then(|column| column.get_mut(point.y))
            .and_then(Option::take)?;
        self.occupied -= 1;
        Some(value)
    }

    pub fn get_or_insert_with(&mut self, point: Point, make: impl FnOnce() -> T) -> Option<&mut T> {
        if self.peek(point).is_none() {
            self.occupied += 1;
        }
        self.slot_mut(point).map(|slot| slot.get_or_insert_with(make))
    }

    fn column_occupied(&self, x: i32) -> bool {
        self.columns
            .get(x)
            .is_some_and(|column| column.iter().any(|(_, slot)| slot.is_some()))
    }

    fn row_occupied(&self, y: i32) -> bool {
        self.columns
            .iter()
            .any(|(_, column)| column.get(y).is_some_and(Option::is_some))
    }

    /// Occupied bounds scan column by column (or row by row) from the edge
    /// inwards, so a sparse grid can cost a pass over its whole allocation.
    pub fn min_occupied_x(&self) -> Option<i32> {
        (self.min_x()..=self.max_x()).find(|&x| self.column_occupied(x))
    }

    pub fn max_occupied_x(&self) -> Option<i32> {
        (self.min_x()..=self.max_x())
            .rev()
            .find(|&x| self.column_occupied(x))
    }

    pub fn min_occupied_y(&self) -> Option<i32> {
        (self.min_y()..=self.max_y()).find(|&y| self.row_occupied(y))
    }

    pub fn max_occupied_y(&self) -> Option<i32> {
        (self.min_y()..=self.max_y())
            .rev()
            .find(|&y| self.row_occupied(y))
    }

    /// Every stored value with its coordinate, column by column.
    pub fn iter(&self) -> impl Iterator<Item = (Point, &T)> + '_ {
        self.columns.iter().flat_map(|(x, column)| {
            column
                .iter()
                .filter_map(move |(y, slot)| slot.as_ref().map(|value| (Point::new(x, y), value)))
        })
    }

    pub fn len(&self) -> usize {
        self.occupied
    }

    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    /// Removes every value outside `range` (exclusive of `x2`/`y2`) and
    /// shrinks the allocation to the range. The origin cell is never freed.
    pub fn trim_to_range(&mut self, range: Rect) -> Vec<T> {
        let mut removed = Vec::new();
        for x in self.min_x()..=self.max_x() {
            let Some(column) = self.columns.get_mut(x) else {
                continue;
            };
            let column_inside = x >= range.x1 && x < range.x2;
            for (y, slot) in column_points_mut(column) {
                if column_inside && y >= range.y1 && y < range.y2 {
                    continue;
                }
                if let Some(value) = slot.take() {
                    removed.push(value);
                }
            }
        }

        self.columns.truncate(range.x1, range.x2 - 1);
        for column in self.columns.iter_mut() {
            column.truncate(range.y1, range.y2 - 1);
        }

        self.occupied -= removed.len();
        removed
    }
}

fn column_points_mut<T>(column: &mut Axis<Option<T>>) -> impl Iterator<Item = (i32, &mut Option<T>)> + '_ {
    let negatives = column
        .negatives
        .iter_mut()
        .enumerate()
        .map(|(idx, slot)| (-(idx as i32) - 1, slot));
    let non_negatives = column
        .non_negatives
        .iter_mut()
        .enumerate()
        .map(|(idx, slot)| (idx as i32, slot));
    negatives.chain(non_negatives)
}
