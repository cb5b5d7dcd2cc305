#![allow(missing_docs)]
//! types to snapshot a board for fixtures, persistence and render layers
use std::error::Error;

use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::types::DotColor;

/// One cell of a serialized board
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellState {
    pub x: i32,
    pub y: i32,
    /// color of the held token, None for an empty cell
    pub color: Option<DotColor>,
    /// whether the cell is marked as part of a pending link
    #[serde(default)]
    pub linked: bool,
}

/// A serialized board, cell order does not matter as long as every position
/// of the 6x6 board appears exactly once
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GridState {
    pub width: u32,
    pub height: u32,
    pub cells: Vec<CellState>,
}

impl GridState {
    /// validates this snapshot and converts it into a live board
    pub fn as_grid(&self) -> Result<Grid, Box<dyn Error>> {
        Grid::convert_from_state(self)
    }
}
