//! Player table
//!
//! Players are remembered by the sweep position they were detected at,
//! together with how many cards they are still owed. Positions and counts
//! are stored together so reordering can never separate them.

use heapless::Vec;

use crate::config::MAX_PLAYERS;

/// One detected player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Player {
    /// Sweep pulse width where the player was seen (µs)
    pub angle_us: u16,
    /// Cards still to deal
    pub remaining: u8,
}

/// Fixed-capacity list of detected players
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerTable {
    players: Vec<Player, MAX_PLAYERS>,
}

impl PlayerTable {
    pub const fn new() -> Self {
        Self {
            players: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.players.clear();
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.players.is_full()
    }

    pub fn get(&self, index: usize) -> Option<&Player> {
        self.players.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    /// Most recently added player
    pub fn last(&self) -> Option<&Player> {
        self.players.last()
    }

    /// Is `angle_us` far enough from the last player to be someone new?
    ///
    /// The first detection always counts.
    pub fn is_new_player(&self, angle_us: u16, min_separation_us: u16) -> bool {
        match self.last() {
            Some(last) => angle_us.abs_diff(last.angle_us) > min_separation_us,
            None => true,
        }
    }

    /// Record a player; returns its index, or None if the table is full
    pub fn add(&mut self, angle_us: u16, remaining: u8) -> Option<usize> {
        self.players.push(Player { angle_us, remaining }).ok()?;
        Some(self.players.len() - 1)
    }

    /// Order players by ascending angle, keeping each count with its angle
    ///
    /// Stable insertion sort: equal angles keep their detection order.
    pub fn sort_by_angle(&mut self) {
        for i in 1..self.players.len() {
            let current = self.players[i];
            let mut j = i;
            while j > 0 && self.players[j - 1].angle_us > current.angle_us {
                self.players[j] = self.players[j - 1];
                j -= 1;
            }
            self.players[j] = current;
        }
    }

    /// Set every player's remaining count
    pub fn set_all_remaining(&mut self, remaining: u8) {
        for player in self.players.iter_mut() {
            player.remaining = remaining;
        }
    }

    /// Remaining count for a player (0 if the index is out of range)
    pub fn remaining(&self, index: usize) -> u8 {
        self.players.get(index).map_or(0, |p| p.remaining)
    }

    /// Angle for a player
    pub fn angle(&self, index: usize) -> Option<u16> {
        self.players.get(index).map(|p| p.angle_us)
    }

    /// Record one card dealt to a player; returns the new remaining count
    pub fn take_card(&mut self, index: usize) -> u8 {
        match self.players.get_mut(index) {
            Some(player) => {
                player.remaining = player.remaining.saturating_sub(1);
                player.remaining
            }
            None => 0,
        }
    }

    /// True once nobody is owed a card
    pub fn all_dealt(&self) -> bool {
        self.players.iter().all(|p| p.remaining == 0)
    }

    /// Total cards still owed
    pub fn total_remaining(&self) -> u16 {
        self.players.iter().map(|p| p.remaining as u16).sum()
    }

    /// Next index after `current` (wrapping) whose player is still owed cards
    ///
    /// Returns None if nobody is owed anything.
    pub fn next_pending(&self, current: usize) -> Option<usize> {
        let count = self.players.len();
        (1..=count)
            .map(|offset| (current + offset) % count)
            .find(|&index| self.players[index].remaining > 0)
    }
}
