use rand::Rng;

use crate::types::{DotColor, Position, TokenId};

/// The colored unit a cell may hold. A token keeps its identity while
/// gravity moves it between cells, and exactly one cell owns it at a time,
/// its position is always the position of the owning cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Token {
    id: TokenId,
    color: DotColor,
}

impl Token {
    pub(crate) fn new(id: TokenId, color: DotColor) -> Self {
        Self { id, color }
    }

    /// the identity of this token, stable across cell transfers
    pub fn id(&self) -> TokenId {
        self.id
    }

    /// the palette color of this token
    pub fn color(&self) -> DotColor {
        self.color
    }
}

/// One slot of the board. The position is fixed at construction, the token
/// and the linked flag are what the collapse cycle mutates.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Cell {
    position: Position,
    linked: bool,
    token: Option<Token>,
}

impl Cell {
    pub(crate) fn vacant(position: Position) -> Self {
        Self {
            position,
            linked: false,
            token: None,
        }
    }

    pub(crate) fn with_token(position: Position, token: Token) -> Self {
        Self {
            position,
            linked: false,
            token: Some(token),
        }
    }

    /// the fixed board position of this cell
    pub fn position(&self) -> Position {
        self.position
    }

    /// column of this cell
    pub fn x(&self) -> i32 {
        self.position.x
    }

    /// row of this cell, 0 at the top
    pub fn y(&self) -> i32 {
        self.position.y
    }

    /// true iff no token is currently owned by this cell
    pub fn is_empty(&self) -> bool {
        self.token.is_none()
    }

    /// the color of the owned token, None for an empty cell
    pub fn color(&self) -> Option<DotColor> {
        self.token.map(|t| t.color())
    }

    /// the owned token, None for an empty cell
    pub fn token(&self) -> Option<Token> {
        self.token
    }

    /// whether this cell is marked as part of a completed match, pending
    /// clearing
    pub fn is_linked(&self) -> bool {
        self.linked
    }

    pub(crate) fn set_linked(&mut self) {
        self.linked = true;
    }

    pub(crate) fn clear_linked(&mut self) {
        self.linked = false;
    }

    /// returns true if `other` is within one step of this cell, diagonals and
    /// the cell's own position included
    pub fn is_near(&self, other: Position) -> bool {
        self.position.is_near(other)
    }

    /// discards the owned token and resets the linked flag. Safe to call on a
    /// cell that is already empty.
    pub fn clear_token(&mut self) {
        self.linked = false;
        self.token = None;
    }

    /// Takes ownership of `source`'s token, leaving `source` empty and
    /// unlinked. An empty `source` is a no-op rather than an error: column
    /// compaction legitimately asks full columns to pull from above, and the
    /// guard is what keeps that traversal from corrupting state.
    pub fn transfer_from(&mut self, source: &mut Cell) {
        if source.is_empty() {
            return;
        }

        self.token = source.token.take();
        source.clear_token();
    }

    /// gives this cell a freshly generated token with a uniformly random
    /// color. Only cells left empty once compaction has exhausted the supply
    /// above them get one of these.
    pub(crate) fn create_token(&mut self, id: TokenId, rng: &mut impl Rng) {
        self.token = Some(Token::new(id, DotColor::random(rng)));
    }
}
