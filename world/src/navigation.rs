//! Static navigation field that guides returning ghosts back to their spawn.

use std::collections::VecDeque;

use maze_chase_core::{CellCoord, Heading};

/// Dense Manhattan-distance grid seeded from a single home tile.
///
/// The field mirrors the maze dimensions and stores reverse breadth-first
/// search results. Distances default to `u16::MAX` for unreachable cells so
/// callers can distinguish walls from traversable tiles.
#[derive(Clone, Debug, Default)]
pub(crate) struct NavigationField {
    width: u32,
    height: u32,
    distances: Vec<u16>,
}

impl NavigationField {
    /// Rebuilds the navigation distances using a reverse breadth-first search.
    pub(crate) fn rebuild_with<F>(&mut self, width: u32, height: u32, home: CellCoord, mut is_blocked: F)
    where
        F: FnMut(CellCoord) -> bool,
    {
        let width_usize = usize::try_from(width).unwrap_or(0);
        let height_usize = usize::try_from(height).unwrap_or(0);
        let cell_count = width_usize.checked_mul(height_usize).unwrap_or(0);

        self.width = width;
        self.height = height;

        if cell_count == 0 {
            self.distances.clear();
            return;
        }

        if self.distances.len() != cell_count {
            self.distances = vec![u16::MAX; cell_count];
        } else {
            self.distances.fill(u16::MAX);
        }

        if home.column() >= width || home.row() >= height || is_blocked(home) {
            return;
        }

        let mut queue = VecDeque::new();
        if let Some(home_index) = index(width_usize, home) {
            self.distances[home_index] = 0;
            queue.push_back(home);
        }

        while let Some(cell) = queue.pop_front() {
            let Some(current_index) = index(width_usize, cell) else {
                continue;
            };
            let current_distance = self.distances[current_index];

            if current_distance >= u16::MAX.saturating_sub(1) {
                continue;
            }

            let next_distance = current_distance + 1;

            for (_, neighbor) in neighbors(cell, width, height) {
                if is_blocked(neighbor) {
                    continue;
                }

                let Some(neighbor_index) = index(width_usize, neighbor) else {
                    continue;
                };

                if self.distances[neighbor_index] <= next_distance {
                    continue;
                }

                self.distances[neighbor_index] = next_distance;
                queue.push_back(neighbor);
            }
        }
    }

    /// Distance captured for the provided cell, if it lies within the field.
    #[must_use]
    pub(crate) fn distance(&self, cell: CellCoord) -> Option<u16> {
        if cell.column() >= self.width || cell.row() >= self.height {
            return None;
        }

        let width = usize::try_from(self.width).ok()?;
        index(width, cell).and_then(|offset| self.distances.get(offset).copied())
    }

    /// Heading toward the neighbour closest to home.
    ///
    /// Returns `None` on the home tile itself and on tiles the search never
    /// reached. Ties resolve in [`Heading::ALL`] order.
    #[must_use]
    pub(crate) fn descend(&self, cell: CellCoord) -> Option<Heading> {
        let current = self.distance(cell)?;
        if current == 0 || current == u16::MAX {
            return None;
        }

        neighbors(cell, self.width, self.height)
            .filter_map(|(heading, neighbor)| Some((heading, self.distance(neighbor)?)))
            .filter(|(_, distance)| *distance < current)
            .min_by_key(|(heading, distance)| (*distance, *heading))
            .map(|(heading, _)| heading)
    }
}

fn neighbors(
    cell: CellCoord,
    width: u32,
    height: u32,
) -> impl Iterator<Item = (Heading, CellCoord)> {
    Heading::ALL.into_iter().filter_map(move |heading| {
        let (dx, dy) = heading.delta();
        let column = i64::from(cell.column()) + dx;
        let row = i64::from(cell.row()) + dy;
        if column < 0 || row < 0 || column >= i64::from(width) || row >= i64::from(height) {
            return None;
        }
        Some((heading, CellCoord::new(column as u32, row as u32)))
    })
}

fn index(width: usize, cell: CellCoord) -> Option<usize> {
    let column = usize::try_from(cell.column()).ok()?;
    let row = usize::try_from(cell.row()).ok()?;
    row.checked_mul(width)?.checked_add(column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebuild_with_sets_home_cell_to_zero() {
        let mut field = NavigationField::default();

        field.rebuild_with(3, 4, CellCoord::new(1, 2), |_| false);

        assert_eq!(field.distance(CellCoord::new(1, 2)), Some(0));
        assert_eq!(field.distance(CellCoord::new(1, 1)), Some(1));
        assert_eq!(field.distance(CellCoord::new(1, 0)), Some(2));
        assert_eq!(field.distance(CellCoord::new(0, 0)), Some(3));
        assert_eq!(field.distance(CellCoord::new(3, 0)), None);
    }

    #[test]
    fn rebuild_with_respects_walls() {
        let mut field = NavigationField::default();
        let wall = CellCoord::new(1, 1);

        field.rebuild_with(3, 4, CellCoord::new(1, 2), |cell| cell == wall);

        assert_eq!(field.distance(wall), Some(u16::MAX));
        assert_eq!(field.distance(CellCoord::new(1, 0)), Some(4));
        assert_eq!(field.distance(CellCoord::new(0, 1)), Some(2));
    }

    #[test]
    fn descend_walks_around_walls_towards_home() {
        let mut field = NavigationField::default();
        let wall = CellCoord::new(1, 1);
        field.rebuild_with(3, 4, CellCoord::new(1, 2), |cell| cell == wall);

        assert_eq!(field.descend(CellCoord::new(1, 0)), Some(Heading::Left));
        assert_eq!(field.descend(CellCoord::new(0, 1)), Some(Heading::Down));
        assert_eq!(field.descend(CellCoord::new(0, 2)), Some(Heading::Right));
        assert_eq!(field.descend(CellCoord::new(1, 2)), None);
        assert_eq!(field.descend(wall), None);
    }
}
