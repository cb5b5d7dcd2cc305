#![deny(
    warnings,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs
)]
//! Types for working with the LinkDots dot-linking puzzle.
//! The goal is to provide the renderer agnostic core the game runs on: a
//! fixed 6x6 board of colored dots, the drag-to-link gesture that marks
//! matched runs, and the clear/compact/refill cycle that resolves them.
//! You will likely be most interested in the [grid::Grid] type, which owns
//! the board and the collapse cycle, together with [link::LinkGame], which
//! wires pointer transitions to the board and keeps score. A presentation
//! layer observes the board through [types::GridInstruments] and the
//! snapshot types in [wire_representation], it never mutates cells itself.

use wire_representation::GridState;

pub mod grid;
pub mod link;
pub mod types;
pub mod wire_representation;

/// Loads a grid fixture from a given string
pub fn grid_fixture(grid_fixture: &str) -> GridState {
    let g: Result<GridState, _> = serde_json::from_str(grid_fixture);
    g.expect("the json literal is valid")
}
