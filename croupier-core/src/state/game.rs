//! Game modes and their card quotas

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Selectable game, which fixes how many cards each player gets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GameMode {
    #[default]
    Blackjack,
    FiveCardDraw,
    GoFish,
}

impl GameMode {
    /// Number of selectable modes
    pub const COUNT: u16 = 3;

    /// Mode for a button index; out-of-range indexes are rejected
    pub fn from_index(index: u16) -> Option<Self> {
        match index {
            0 => Some(GameMode::Blackjack),
            1 => Some(GameMode::FiveCardDraw),
            2 => Some(GameMode::GoFish),
            _ => None,
        }
    }

    pub fn index(self) -> u16 {
        match self {
            GameMode::Blackjack => 0,
            GameMode::FiveCardDraw => 1,
            GameMode::GoFish => 2,
        }
    }

    /// The mode after this one, wrapping around
    pub fn next(self) -> Self {
        match self {
            GameMode::Blackjack => GameMode::FiveCardDraw,
            GameMode::FiveCardDraw => GameMode::GoFish,
            GameMode::GoFish => GameMode::Blackjack,
        }
    }

    /// Cards dealt to each player
    pub fn quota(self) -> u8 {
        match self {
            GameMode::Blackjack => 2,
            GameMode::FiveCardDraw => 5,
            GameMode::GoFish => 7,
        }
    }

    /// Name used on the telemetry stream
    pub fn name(self) -> &'static str {
        match self {
            GameMode::Blackjack => "Blackjack",
            GameMode::FiveCardDraw => "FiveCardDraw",
            GameMode::GoFish => "GoFish",
        }
    }

    /// LED bit pattern (bit 0 = first LED, bit 1 = second LED)
    pub fn led_pattern(self) -> u8 {
        match self {
            GameMode::Blackjack => 0b01,
            GameMode::FiveCardDraw => 0b10,
            GameMode::GoFish => 0b11,
        }
    }
}
