//! A renderer agnostic reimplementation of the drag-to-link gesture. The
//! input layer reports pointer transitions, this module validates each step
//! against the adjacency and color rules, marks cells linked, and settles
//! the score once the pointer is released.
use std::fmt;

use num_format::{Locale, ToFormattedString};
use rand::Rng;

use crate::types::{
    GridInstruments, LinkQueryableGame, LinkResolvableGame, LinkSettableGame, Position,
    TokenGettableGame,
};

/// points awarded for every dot cleared by a finished link
pub const POINTS_PER_DOT: u64 = 10;

/// Accumulated score for one game
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Score(pub u64);

impl Score {
    /// the raw point total
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_formatted_string(&Locale::en))
    }
}

/// What a finished gesture did to the board
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LinkOutcome {
    /// number of cells the gesture cleared
    pub cleared: usize,
    /// points awarded for those cells
    pub points: u64,
}

/// Drives a board through pointer down/over/up transitions, mirroring the
/// mouse handlers of the original game while staying independent of any
/// input or rendering layer. The board itself only ever reacts to the
/// linked flags this type sets.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LinkGame<G> {
    grid: G,
    score: Score,
    current: Option<Position>,
}

impl<G> LinkGame<G>
where
    G: TokenGettableGame + LinkQueryableGame + LinkSettableGame,
{
    /// wraps a board, starting from a zero score with no gesture in progress
    pub fn new(grid: G) -> Self {
        Self {
            grid,
            score: Score::default(),
            current: None,
        }
    }

    /// read access to the wrapped board, for the rendering layer
    pub fn grid(&self) -> &G {
        &self.grid
    }

    /// the score accumulated so far
    pub fn score(&self) -> Score {
        self.score
    }

    /// the cell the gesture currently ends on, if one is in progress
    pub fn current(&self) -> Option<Position> {
        self.current
    }

    /// begin a gesture on the dot at `pos`
    pub fn pointer_down(&mut self, pos: Position) {
        if !self.grid.off_board(pos) {
            self.current = Some(pos);
        }
    }

    /// Extend the gesture to `pos`. The step is accepted when a gesture is in
    /// progress, the colors match, `pos` is not linked yet, and `pos` is
    /// within one step of the current cell. On success both cells are marked
    /// linked and the gesture advances to `pos`. The first cell of a gesture
    /// only becomes linked once a second cell joins it.
    pub fn pointer_over(&mut self, pos: Position) -> bool {
        let current = match self.current {
            Some(c) => c,
            None => return false,
        };
        if self.grid.off_board(pos) {
            return false;
        }

        let current_native = self.grid.native_from_position(current);
        let target_native = self.grid.native_from_position(pos);

        let current_color = self.grid.get_token_color(&current_native);
        if current_color.is_none() || current_color != self.grid.get_token_color(&target_native) {
            return false;
        }
        if self.grid.is_linked(&target_native) {
            return false;
        }
        if !current.is_near(pos) {
            return false;
        }

        self.grid.set_linked(current_native);
        self.grid.set_linked(target_native);
        self.current = Some(pos);
        true
    }

    /// Finish the gesture: resolve the linked cells, award
    /// [`POINTS_PER_DOT`] for each cleared dot, and return what happened.
    pub fn pointer_up<T: GridInstruments>(
        &mut self,
        instruments: &T,
        rng: &mut impl Rng,
    ) -> LinkOutcome
    where
        G: LinkResolvableGame<T>,
    {
        let cleared = self.grid.resolve_links(instruments, rng);
        let points = cleared as u64 * POINTS_PER_DOT;
        self.score.0 += points;
        self.current = None;

        LinkOutcome { cleared, points }
    }
}
