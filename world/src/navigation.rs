//! Reverse breadth-first distance field over a tile surface.

use std::collections::VecDeque;

use chase_core::CellCoord;

/// Dense Manhattan-step distances seeded from one or more cells.
///
/// The field covers the rectangle `[0, width) x [0, height)` and stores the
/// number of 4-connected steps needed to reach the nearest seed through
/// passable cells. Distances default to `u32::MAX` for unreachable cells so
/// callers can distinguish walls and disconnected pockets from reachable
/// tiles.
#[derive(Clone, Debug, Default)]
pub struct DistanceField {
    width: u32,
    height: u32,
    distances: Vec<u32>,
}

impl DistanceField {
    /// Rebuilds the distances using a breadth-first search from the seeds.
    pub fn rebuild_with<F>(&mut self, width: u32, height: u32, seeds: &[CellCoord], mut is_blocked: F)
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
            self.distances = vec![u32::MAX; cell_count];
        } else {
            self.distances.fill(u32::MAX);
        }

        let mut queue = VecDeque::new();

        for &seed in seeds {
            if is_blocked(seed) {
                continue;
            }

            let Some(index) = self.index(seed) else {
                continue;
            };

            if self.distances[index] == 0 {
                continue;
            }

            self.distances[index] = 0;
            queue.push_back(seed);
        }

        while let Some(cell) = queue.pop_front() {
            let Some(current_index) = self.index(cell) else {
                continue;
            };
            let next_distance = self.distances[current_index].saturating_add(1);

            for neighbor in cell.cardinal_neighbors() {
                let Some(neighbor_index) = self.index(neighbor) else {
                    continue;
                };

                if self.distances[neighbor_index] <= next_distance {
                    continue;
                }

                if is_blocked(neighbor) {
                    continue;
                }

                self.distances[neighbor_index] = next_distance;
                queue.push_back(neighbor);
            }
        }
    }

    /// Width of the field in cells.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the field in cells.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Step distance captured for the cell, or `None` outside the field or
    /// when no seed can reach it.
    #[must_use]
    pub fn distance(&self, cell: CellCoord) -> Option<u32> {
        self.index(cell)
            .and_then(|offset| self.distances.get(offset).copied())
            .filter(|distance| *distance != u32::MAX)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        let column = u32::try_from(cell.x()).ok()?;
        let row = u32::try_from(cell.y()).ok()?;
        if column >= self.width || row >= self.height {
            return None;
        }

        let width = usize::try_from(self.width).ok()?;
        let column = usize::try_from(column).ok()?;
        let row = usize::try_from(row).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebuild_with_sets_seed_cells_to_zero() {
        let mut field = DistanceField::default();
        let seeds = [CellCoord::new(1, 2)];

        field.rebuild_with(3, 4, &seeds, |_| false);

        assert_eq!(field.distance(CellCoord::new(1, 2)), Some(0));
        assert_eq!(field.distance(CellCoord::new(1, 1)), Some(1));
        assert_eq!(field.distance(CellCoord::new(1, 0)), Some(2));
        assert_eq!(field.distance(CellCoord::new(0, 0)), Some(3));
    }

    #[test]
    fn rebuild_with_respects_walls() {
        let mut field = DistanceField::default();
        let seeds = [CellCoord::new(1, 2)];
        let wall = CellCoord::new(1, 1);

        field.rebuild_with(3, 4, &seeds, |cell| cell == wall);

        assert_eq!(field.distance(wall), None);
        assert_eq!(field.distance(CellCoord::new(1, 0)), Some(4));
        assert_eq!(field.distance(CellCoord::new(0, 1)), Some(2));
    }

    #[test]
    fn cells_outside_the_field_have_no_distance() {
        let mut field = DistanceField::default();
        field.rebuild_with(2, 2, &[CellCoord::new(0, 0)], |_| false);

        assert_eq!(field.distance(CellCoord::new(-1, 0)), None);
        assert_eq!(field.distance(CellCoord::new(2, 0)), None);
    }
}
