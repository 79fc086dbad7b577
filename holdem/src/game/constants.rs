//! Table-wide limits shared by the game and table modules.

/// Most players that can be dealt into a single hand. With two hole cards
/// each plus a five card board this never needs more than 25 cards.
pub const MAX_PLAYERS: usize = 10;

/// Fewest players needed before a hand is dealt.
pub const MIN_PLAYERS: usize = 2;

/// Upper bound on raw user input, usernames are truncated to half of it.
pub const MAX_USER_INPUT_LENGTH: usize = 32;

pub const HOLE_CARDS: usize = 2;
pub const BOARD_CARDS: usize = 5;
pub const DECK_SIZE: usize = 52;
