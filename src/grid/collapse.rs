//! The clear/compact/refill cycle that resolves a finished link gesture.
//! The whole cycle runs to completion inside one call, there are no
//! suspension points and only one writer, so no locking is involved.
use std::time::Instant;

use rand::Rng;
use tracing::instrument;

use crate::types::{
    CellChange, GridInstruments, LinkResolvableGame, Position,
};

use super::{CellIndex, Grid, CELL_COUNT, GRID_HEIGHT, GRID_WIDTH};

impl Grid {
    /// Resolves a finished link gesture. Every linked cell is counted and
    /// cleared in stable index order, survivors fall column by column without
    /// reordering, and any cell still empty afterwards receives a freshly
    /// colored token. Returns the number of cells cleared, which the caller
    /// uses for scoring. A gesture that linked nothing returns 0 and leaves
    /// the board untouched, without consuming the rng.
    #[instrument(level = "trace", skip_all)]
    pub fn check_linked_cells(
        &mut self,
        instruments: &impl GridInstruments,
        rng: &mut impl Rng,
    ) -> usize {
        let start = Instant::now();
        let mut changes = Vec::new();

        let cleared = self.clear_linked_cells(&mut changes);
        if cleared > 0 {
            self.compact(&mut changes);
            self.fill_empty_cells(rng, &mut changes);

            debug_assert!(
                self.assert_consistency(),
                "collapse left the board inconsistent: {}",
                self
            );
        }

        instruments.observe_collapse(&changes, start.elapsed());
        cleared
    }

    fn clear_linked_cells(&mut self, changes: &mut Vec<CellChange>) -> usize {
        let mut cleared = 0;
        for index in 0..CELL_COUNT {
            let cell = &mut self.cells[index];
            if cell.is_linked() {
                cell.clear_token();
                changes.push(CellChange::Cleared {
                    position: CellIndex::from_usize(index).into_position(),
                });
                cleared += 1;
            }
        }
        cleared
    }

    /// Gravity. Per column the surviving tokens keep their relative order and
    /// slide to the highest free row index. Two cursors per column instead of
    /// the recursive resolve-then-pull formulation: the write cursor only
    /// ever trails the read cursor, so every cell is visited exactly once.
    fn compact(&mut self, changes: &mut Vec<CellChange>) {
        for x in 0..GRID_WIDTH {
            let mut write_y = GRID_HEIGHT - 1;
            for read_y in (0..GRID_HEIGHT).rev() {
                let read = CellIndex::new(Position { x, y: read_y });
                if self.cells[read.as_usize()].is_empty() {
                    continue;
                }
                if read_y != write_y {
                    let write = CellIndex::new(Position { x, y: write_y });
                    self.pull_token(read, write);
                    changes.push(CellChange::Moved {
                        from: read.into_position(),
                        to: write.into_position(),
                    });
                }
                write_y -= 1;
            }
        }
    }

    /// moves the token at `from` down into `to` within a column. The transfer
    /// inherits the empty-source guard from [`Cell::transfer_from`].
    ///
    /// [`Cell::transfer_from`]: super::Cell::transfer_from
    fn pull_token(&mut self, from: CellIndex, to: CellIndex) {
        debug_assert!(from.as_usize() < to.as_usize());
        let (upper, lower) = self.cells.split_at_mut(to.as_usize());
        lower[0].transfer_from(&mut upper[from.as_usize()]);
    }

    /// Refill. Scans from the last cell back to the first and gives every
    /// cell still empty after compaction a freshly colored token, so the
    /// board is never short at rest.
    fn fill_empty_cells(&mut self, rng: &mut impl Rng, changes: &mut Vec<CellChange>) {
        for index in (0..CELL_COUNT).rev() {
            if self.cells[index].is_empty() {
                let id = self.allocate_token_id();
                let cell = &mut self.cells[index];
                cell.create_token(id, rng);
                changes.push(CellChange::Spawned {
                    position: CellIndex::from_usize(index).into_position(),
                    color: cell.color().expect("the cell was just filled"),
                });
            }
        }
    }
}

impl<T: GridInstruments> LinkResolvableGame<T> for Grid {
    fn resolve_links(&mut self, instruments: &T, rng: &mut impl Rng) -> usize {
        self.check_linked_cells(instruments, rng)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::time::Duration;

    use itertools::Itertools;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use crate::grid::{CellIndex, Grid, CELL_COUNT, GRID_HEIGHT, GRID_WIDTH};
    use crate::types::{
        CellChange, DotColor, GridInstruments, LinkSettableGame, Position, TokenId,
    };
    use crate::wire_representation::{CellState, GridState};

    #[derive(Debug)]
    struct Instruments {}

    impl GridInstruments for Instruments {
        fn observe_collapse(&self, _: &[CellChange], _: Duration) {}
    }

    #[derive(Debug, Default)]
    struct Recording(RefCell<Vec<CellChange>>);

    impl GridInstruments for Recording {
        fn observe_collapse(&self, changes: &[CellChange], _: Duration) {
            self.0.borrow_mut().extend_from_slice(changes);
        }
    }

    /// a full board with deterministic colors, with the given positions
    /// marked linked
    fn staged_grid(linked: &[(i32, i32)]) -> Grid {
        let cells = (0..GRID_HEIGHT)
            .cartesian_product(0..GRID_WIDTH)
            .map(|(y, x)| CellState {
                x,
                y,
                color: Some(DotColor::ALL[((x + y) % 4) as usize]),
                linked: linked.contains(&(x, y)),
            })
            .collect_vec();
        Grid::convert_from_state(&GridState {
            width: 6,
            height: 6,
            cells,
        })
        .unwrap()
    }

    fn column_token_ids(grid: &Grid, x: i32) -> Vec<Option<TokenId>> {
        (0..GRID_HEIGHT)
            .map(|y| {
                grid.cell_at(Position { x, y })
                    .unwrap()
                    .token()
                    .map(|t| t.id())
            })
            .collect()
    }

    #[test]
    fn test_single_column_gravity_keeps_survivor_order() {
        // column 0 reads [A, B, C, D, E, F] top to bottom, B and D are linked
        let mut grid = staged_grid(&[(0, 1), (0, 3)]);
        let before = column_token_ids(&grid, 0);
        let (a, c, e, f) = (before[0], before[2], before[4], before[5]);

        let mut rng = SmallRng::seed_from_u64(11);
        let cleared = grid.check_linked_cells(&Instruments {}, &mut rng);
        assert_eq!(cleared, 2);

        // survivors compact to [_, _, A, C, E, F] and the top two rows are new
        let after = column_token_ids(&grid, 0);
        assert_eq!(&after[2..], &[a, c, e, f]);
        for spawned in &after[..2] {
            assert!(spawned.unwrap().as_usize() >= CELL_COUNT);
        }
    }

    #[test]
    fn test_untouched_columns_stay_identical() {
        let mut grid = staged_grid(&[(2, 0), (2, 5)]);
        let before: Vec<_> = (0..GRID_WIDTH)
            .map(|x| column_token_ids(&grid, x))
            .collect();

        let mut rng = SmallRng::seed_from_u64(12);
        grid.check_linked_cells(&Instruments {}, &mut rng);

        for x in (0..GRID_WIDTH).filter(|x| *x != 2) {
            assert_eq!(column_token_ids(&grid, x), before[x as usize]);
        }
    }

    #[test]
    fn test_returns_count_of_linked_cells() {
        let mut grid = staged_grid(&[(0, 0), (1, 1), (2, 2), (3, 3), (4, 4)]);
        let mut rng = SmallRng::seed_from_u64(13);
        assert_eq!(grid.check_linked_cells(&Instruments {}, &mut rng), 5);
    }

    #[test]
    fn test_no_links_is_a_no_op() {
        let mut grid = staged_grid(&[]);
        let copy = grid;

        let mut rng = SmallRng::seed_from_u64(14);
        let mut untouched = rng.clone();

        assert_eq!(grid.check_linked_cells(&Instruments {}, &mut rng), 0);
        assert_eq!(grid, copy);
        // the rng was not consumed either
        assert_eq!(rng.gen::<u64>(), untouched.gen::<u64>());
    }

    #[test]
    fn test_board_is_full_and_unlinked_after_every_cycle() {
        let mut rng = SmallRng::seed_from_u64(15);
        let mut grid = Grid::new(&mut rng);

        for _ in 0..50 {
            let linked = (0..rng.gen_range(0..8))
                .map(|_| CellIndex::from_usize(rng.gen_range(0..CELL_COUNT)))
                .collect_vec();
            for index in &linked {
                grid.set_linked(*index);
            }

            grid.check_linked_cells(&Instruments {}, &mut rng);

            assert!(grid.assert_consistency());
            assert!(grid.cells().all(|c| !c.is_empty()));
            assert!(grid.cells().all(|c| !c.is_linked()));
        }
    }

    #[test]
    fn test_cleared_count_matches_distinct_linked_cells() {
        let mut rng = SmallRng::seed_from_u64(16);
        let mut grid = Grid::new(&mut rng);

        let linked = [(0, 0), (0, 1), (1, 1), (5, 5)];
        for (x, y) in &linked {
            grid.set_linked(CellIndex::new(Position { x: *x, y: *y }));
        }

        assert_eq!(grid.check_linked_cells(&Instruments {}, &mut rng), 4);
    }

    #[test]
    fn test_fully_cleared_column_is_reborn() {
        let linked = (0..GRID_HEIGHT).map(|y| (3, y)).collect_vec();
        let mut grid = staged_grid(&linked);

        let mut rng = SmallRng::seed_from_u64(17);
        assert_eq!(grid.check_linked_cells(&Instruments {}, &mut rng), 6);

        for id in column_token_ids(&grid, 3) {
            assert!(id.unwrap().as_usize() >= CELL_COUNT);
        }
        assert!(grid.assert_consistency());
    }

    #[test]
    fn test_refill_replaces_exactly_the_cleared_count_per_column() {
        // three cleared in column 1, one in column 4
        let mut grid = staged_grid(&[(1, 0), (1, 2), (1, 4), (4, 5)]);

        let mut rng = SmallRng::seed_from_u64(18);
        grid.check_linked_cells(&Instruments {}, &mut rng);

        let fresh_in = |grid: &Grid, x: i32| {
            column_token_ids(grid, x)
                .iter()
                .filter(|id| id.unwrap().as_usize() >= CELL_COUNT)
                .count()
        };
        assert_eq!(fresh_in(&grid, 1), 3);
        assert_eq!(fresh_in(&grid, 4), 1);
        assert_eq!(fresh_in(&grid, 0), 0);
    }

    #[test]
    fn test_change_events_describe_the_whole_cycle() {
        let mut grid = staged_grid(&[(0, 1), (0, 3)]);
        let recording = Recording::default();

        let mut rng = SmallRng::seed_from_u64(19);
        grid.check_linked_cells(&recording, &mut rng);

        let changes = recording.0.into_inner();
        let cleared = changes
            .iter()
            .filter(|c| matches!(c, CellChange::Cleared { .. }))
            .count();
        let moved = changes
            .iter()
            .filter(|c| matches!(c, CellChange::Moved { .. }))
            .count();
        let spawned = changes
            .iter()
            .filter(|c| matches!(c, CellChange::Spawned { .. }))
            .count();

        assert_eq!(cleared, 2);
        // A falls two rows, C falls one, E and F stay put
        assert_eq!(moved, 2);
        assert_eq!(spawned, 2);
        assert!(matches!(
            changes[0],
            CellChange::Cleared {
                position: Position { x: 0, y: 1 }
            }
        ));
    }

    #[test]
    fn test_no_op_cycle_reports_no_changes() {
        let mut grid = staged_grid(&[]);
        let recording = Recording::default();

        let mut rng = SmallRng::seed_from_u64(20);
        grid.check_linked_cells(&recording, &mut rng);

        assert!(recording.0.into_inner().is_empty());
    }

    #[test]
    fn test_mid_game_fixture_resolves() {
        let state = crate::grid_fixture(include_str!("../../fixtures/mid_game.json"));
        let mut grid = Grid::convert_from_state(&state).unwrap();

        let mut rng = SmallRng::seed_from_u64(21);
        let cleared = grid.check_linked_cells(&Instruments {}, &mut rng);

        assert_eq!(cleared, 4);
        assert!(grid.assert_consistency());
    }
}
