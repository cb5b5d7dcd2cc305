//! various types that are useful for working with the dot board
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::time::Duration;

/// A board position in renderer coordinates, `x` is the column and `y` is the
/// row, with row 0 at the top of the board
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    /// column, 0 at the left edge
    pub x: i32,
    /// row, 0 at the top edge
    pub y: i32,
}

impl Position {
    /// returns true if `other` is within a one-step Chebyshev neighborhood of
    /// this position. Diagonals count, and so does the position itself. This
    /// is the adjacency rule the link gesture validates against, looser than
    /// classic match-3 orthogonal adjacency, and kept that way because it is
    /// observable gameplay behavior.
    pub fn is_near(&self, other: Position) -> bool {
        (self.x - other.x).abs() <= 1 && (self.y - other.y).abs() <= 1
    }
}

/// The fixed palette dots are colored from
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DotColor {
    #[allow(missing_docs)]
    Yellow,
    #[allow(missing_docs)]
    Green,
    #[allow(missing_docs)]
    Blue,
    #[allow(missing_docs)]
    Red,
}

impl DotColor {
    /// every color in the palette, in a stable order
    pub const ALL: [DotColor; 4] = [
        DotColor::Yellow,
        DotColor::Green,
        DotColor::Blue,
        DotColor::Red,
    ];

    /// the css color the original board painted this dot with
    pub fn as_hex(&self) -> &'static str {
        match self {
            DotColor::Yellow => "#fffd69",
            DotColor::Green => "#56df7f",
            DotColor::Blue => "#567fe0",
            DotColor::Red => "#ff5a60",
        }
    }

    /// single letter used by the ascii board rendering
    pub fn as_char(&self) -> char {
        match self {
            DotColor::Yellow => 'y',
            DotColor::Green => 'g',
            DotColor::Blue => 'b',
            DotColor::Red => 'r',
        }
    }

    /// picks a color uniformly from the palette
    pub fn random(rng: &mut impl Rng) -> DotColor {
        *Self::ALL.choose(rng).expect("the palette is not empty")
    }
}

impl fmt::Display for DotColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DotColor::Yellow => write!(f, "yellow"),
            DotColor::Green => write!(f, "green"),
            DotColor::Blue => write!(f, "blue"),
            DotColor::Red => write!(f, "red"),
        }
    }
}

/// token to represent the identity of a dot. The id is stable while gravity
/// moves the dot between cells, which is what lets tests observe that a
/// column never reorders its survivors.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TokenId(pub u32);

impl TokenId {
    /// convert this token ID to a usize
    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

/// A single observable mutation of the board, emitted in order during a
/// collapse cycle so a presentation layer can redraw from the change list
/// without reaching into the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellChange {
    /// a linked token was discarded
    Cleared {
        /// where the token was
        position: Position,
    },
    /// a surviving token fell within its column
    Moved {
        /// cell it fell from
        from: Position,
        /// cell it landed on
        to: Position,
    },
    /// a fresh token was generated for a vacated top cell
    Spawned {
        /// the refilled cell
        position: Position,
        /// color the new token rolled
        color: DotColor,
    },
}

/// Instruments to be used with the collapse cycle
pub trait GridInstruments: std::fmt::Debug {
    /// called once per resolved gesture with every observable cell mutation,
    /// in the order they happened, plus how long the cycle took
    fn observe_collapse(&self, changes: &[CellChange], duration: Duration);
}

/// a game for which the size of the game board can be determined
pub trait SizeDeterminableGame {
    #[allow(missing_docs)]
    fn get_width(&self) -> u32;
    #[allow(missing_docs)]
    fn get_height(&self) -> u32;
}

/// A game for which board positions can be identified and returned
pub trait PositionGettableGame {
    /// the native position type for this board
    type NativePositionType: Eq + Hash + Clone + Ord + PartialOrd + Debug;

    /// Check if the given position currently holds no token
    fn position_is_empty(&self, pos: Self::NativePositionType) -> bool;

    /// Convert a native position to renderer coordinates
    fn position_from_native(&self, native: Self::NativePositionType) -> Position;

    /// Convert renderer coordinates to the native type
    fn native_from_position(&self, pos: Position) -> Self::NativePositionType;

    /// determines if a given position is not on the board
    fn off_board(&self, pos: Position) -> bool;
}

/// A game for which the token color at a given position can be got
pub trait TokenGettableGame: PositionGettableGame {
    /// get the color of the token at the given position, None for an empty
    /// cell
    fn get_token_color(&self, pos: &Self::NativePositionType) -> Option<DotColor>;
}

/// A game where positions can be checked for being part of a link in progress
pub trait LinkQueryableGame: PositionGettableGame {
    /// Is this position linked?
    fn is_linked(&self, pos: &Self::NativePositionType) -> bool;
}

/// A game where positions can have their linked flag set and cleared
pub trait LinkSettableGame: PositionGettableGame {
    /// mark this position as part of the pending link
    fn set_linked(&mut self, pos: Self::NativePositionType);

    /// clear this position of being linked
    fn clear_linked(&mut self, pos: Self::NativePositionType);
}

/// A game for which the empty cells can be enumerated
pub trait EmptyCellGettableGame: PositionGettableGame {
    /// returns the positions of every empty cell, in stable row-major order
    fn get_empty_cells(&self) -> Box<dyn Iterator<Item = Self::NativePositionType> + '_>;
}

/// a game which can resolve a finished link gesture by clearing its linked
/// cells, letting the survivors fall and refilling the board
pub trait LinkResolvableGame<T: GridInstruments>: Debug + Sized {
    /// runs one full clear/compact/refill cycle and returns the number of
    /// cells that were cleared. Calling this with nothing linked returns 0
    /// and leaves the board untouched.
    fn resolve_links(&mut self, instruments: &T, rng: &mut impl Rng) -> usize;
}
