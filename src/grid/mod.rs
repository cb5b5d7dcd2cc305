//! The renderer agnostic board the game runs on: a fixed 6x6 grid of colored
//! dots that is always full and unlinked at rest. The input layer marks
//! matched cells as linked through [crate::types::LinkSettableGame], and
//! [Grid::check_linked_cells] resolves them in one run-to-completion cycle.
mod cell;
mod collapse;

use std::error::Error;
use std::fmt;

use fxhash::FxHashSet;
use itertools::Itertools;
use rand::Rng;

use crate::types::{
    DotColor, EmptyCellGettableGame, LinkQueryableGame, LinkSettableGame, Position,
    PositionGettableGame, SizeDeterminableGame, TokenGettableGame, TokenId,
};
use crate::wire_representation::{CellState, GridState};

pub use cell::{Cell, Token};

/// board width in cells
pub const GRID_WIDTH: i32 = 6;
/// board height in cells
pub const GRID_HEIGHT: i32 = 6;
/// number of cells on the board
pub const CELL_COUNT: usize = (GRID_WIDTH * GRID_HEIGHT) as usize;

/// wrapper type for an index in to the board, row-major with row 0 at the top
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct CellIndex(pub u8);

impl CellIndex {
    /// makes a new cell index from an on-board position
    pub fn new(pos: Position) -> Self {
        Self((pos.y * GRID_WIDTH + pos.x) as u8)
    }

    /// build a CellIndex from a usize
    pub fn from_usize(u: usize) -> Self {
        Self(u as u8)
    }

    /// get a usize from a CellIndex
    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }

    /// converts a cellindex to a position
    pub fn into_position(self) -> Position {
        Position {
            x: self.0 as i32 % GRID_WIDTH,
            y: self.0 as i32 / GRID_WIDTH,
        }
    }
}

/// The 6x6 board. Owns its 36 cells outright, there is no shared or global
/// state, so independent grids never contaminate each other.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Grid {
    cells: [Cell; CELL_COUNT],
    next_token_id: u32,
}

impl Grid {
    /// builds a board fully populated with uniformly random colors
    pub fn new(rng: &mut impl Rng) -> Self {
        let mut cells = [Cell::vacant(Position { x: 0, y: 0 }); CELL_COUNT];
        let mut next_token_id = 0;

        for (idx, cell) in cells.iter_mut().enumerate() {
            *cell = Cell::vacant(CellIndex::from_usize(idx).into_position());
            cell.create_token(TokenId(next_token_id), rng);
            next_token_id += 1;
        }

        let grid = Self {
            cells,
            next_token_id,
        };
        debug_assert!(grid.assert_consistency());
        grid
    }

    /// Builds a grid from a serialized state, validating that it describes
    /// exactly one cell for every position of the 6x6 board. Cells without a
    /// color come up empty, which is how tests stage mid-cycle boards.
    pub fn convert_from_state(state: &GridState) -> Result<Self, Box<dyn Error>> {
        if state.width != GRID_WIDTH as u32 || state.height != GRID_HEIGHT as u32 {
            return Err("grid state dimensions don't match the fixed 6x6 board".into());
        }

        if state.cells.len() != CELL_COUNT {
            return Err(format!(
                "expected {} cells, got {}",
                CELL_COUNT,
                state.cells.len()
            )
            .into());
        }

        let counts = state.cells.iter().map(|c| (c.x, c.y)).counts();
        if counts.values().any(|v| *v > 1) {
            return Err("grid state repeats a position".into());
        }

        let mut cells = [Cell::vacant(Position { x: 0, y: 0 }); CELL_COUNT];
        let mut next_token_id = 0;

        for cell_state in &state.cells {
            let position = Position {
                x: cell_state.x,
                y: cell_state.y,
            };
            if position.x < 0
                || position.x >= GRID_WIDTH
                || position.y < 0
                || position.y >= GRID_HEIGHT
            {
                return Err(format!(
                    "position ({}, {}) is off the board",
                    position.x, position.y
                )
                .into());
            }
            if cell_state.linked && cell_state.color.is_none() {
                return Err("an empty cell can't be linked".into());
            }

            let index = CellIndex::new(position);
            let mut cell = match cell_state.color {
                Some(color) => {
                    let token = Token::new(TokenId(next_token_id), color);
                    next_token_id += 1;
                    Cell::with_token(position, token)
                }
                None => Cell::vacant(position),
            };
            if cell_state.linked {
                cell.set_linked();
            }
            cells[index.as_usize()] = cell;
        }

        Ok(Self {
            cells,
            next_token_id,
        })
    }

    /// snapshots this board for the rendering layer or a fixture
    pub fn as_state(&self) -> GridState {
        GridState {
            width: GRID_WIDTH as u32,
            height: GRID_HEIGHT as u32,
            cells: self
                .cells
                .iter()
                .map(|cell| CellState {
                    x: cell.x(),
                    y: cell.y(),
                    color: cell.color(),
                    linked: cell.is_linked(),
                })
                .collect(),
        }
    }

    /// the cells of the board in stable row-major order, row 0 first
    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.iter()
    }

    /// the cell at the given position, None off the board
    pub fn cell_at(&self, pos: Position) -> Option<&Cell> {
        if self.off_board(pos) {
            None
        } else {
            Some(self.get_cell(CellIndex::new(pos)))
        }
    }

    /// determines if a given position is not on the board
    pub fn off_board(&self, position: Position) -> bool {
        position.x < 0
            || position.x >= GRID_WIDTH
            || position.y < 0
            || position.y >= GRID_HEIGHT
    }

    /// Checks the at-rest invariants: every cell holds exactly one token, no
    /// cell is linked, and no token is owned by two cells. Returns false
    /// instead of panicking so callers can attach context.
    pub fn assert_consistency(&self) -> bool {
        let mut seen = FxHashSet::default();
        for cell in self.cells.iter() {
            if cell.is_linked() {
                return false;
            }
            let token = match cell.token() {
                Some(t) => t,
                None => return false,
            };
            if !seen.insert(token.id()) {
                return false;
            }
        }
        true
    }

    fn get_cell(&self, index: CellIndex) -> &Cell {
        &self.cells[index.as_usize()]
    }

    fn get_cell_mut(&mut self, index: CellIndex) -> &mut Cell {
        &mut self.cells[index.as_usize()]
    }

    fn allocate_token_id(&mut self) -> TokenId {
        let id = TokenId(self.next_token_id);
        self.next_token_id += 1;
        id
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        for y in 0..GRID_HEIGHT {
            for x in 0..GRID_WIDTH {
                let cell = self.get_cell(CellIndex::new(Position { x, y }));
                let glyph = match cell.color() {
                    Some(color) if cell.is_linked() => color.as_char().to_ascii_uppercase(),
                    Some(color) => color.as_char(),
                    None => '.',
                };
                write!(f, "{} ", glyph)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl PositionGettableGame for Grid {
    type NativePositionType = CellIndex;

    fn position_is_empty(&self, pos: Self::NativePositionType) -> bool {
        self.get_cell(pos).is_empty()
    }

    fn position_from_native(&self, native: Self::NativePositionType) -> Position {
        native.into_position()
    }

    fn native_from_position(&self, pos: Position) -> Self::NativePositionType {
        CellIndex::new(pos)
    }

    fn off_board(&self, pos: Position) -> bool {
        Grid::off_board(self, pos)
    }
}

impl TokenGettableGame for Grid {
    fn get_token_color(&self, pos: &Self::NativePositionType) -> Option<DotColor> {
        self.get_cell(*pos).color()
    }
}

impl LinkQueryableGame for Grid {
    fn is_linked(&self, pos: &Self::NativePositionType) -> bool {
        self.get_cell(*pos).is_linked()
    }
}

impl LinkSettableGame for Grid {
    fn set_linked(&mut self, pos: Self::NativePositionType) {
        self.get_cell_mut(pos).set_linked();
    }

    fn clear_linked(&mut self, pos: Self::NativePositionType) {
        self.get_cell_mut(pos).clear_linked();
    }
}

impl EmptyCellGettableGame for Grid {
    fn get_empty_cells(&self) -> Box<dyn Iterator<Item = Self::NativePositionType> + '_> {
        Box::new(
            self.cells
                .iter()
                .enumerate()
                .filter(|(_, cell)| cell.is_empty())
                .map(|(idx, _)| CellIndex::from_usize(idx)),
        )
    }
}

impl SizeDeterminableGame for Grid {
    fn get_width(&self) -> u32 {
        GRID_WIDTH as u32
    }

    fn get_height(&self) -> u32 {
        GRID_HEIGHT as u32
    }
}
