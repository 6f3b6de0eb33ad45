//! # Command Module
//!
//! Single-byte wire format of the relay card.
//!
//! | byte        | meaning                   |
//! |-------------|---------------------------|
//! | `0`         | report all relay states   |
//! | `1..=8`     | switch relay *n* on       |
//! | `11..=18`   | switch relay *n* off      |
//!
//! Every command is answered with at most one byte whose bit *i* is the
//! state of relay *i + 1*.

use std::fmt;

use crate::error::{RelayError, Result};

/// Relays on one card.
pub const RELAY_COUNT: u8 = 8;

/// Command byte that reports all states.
pub const QUERY_STATES: u8 = 0;

/// Added to a relay number to form its clear command.
pub const CLEAR_OFFSET: u8 = 10;

/// A relay number validated to lie in `1..=8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Relay(u8);

impl Relay {
    /// Validates `relay`, failing with [`RelayError::InvalidArgument`] outside `1..=8`.
    pub fn new(relay: i32) -> Result<Self> {
        match u8::try_from(relay) {
            Ok(n) if (1..=RELAY_COUNT).contains(&n) => Ok(Relay(n)),
            _ => Err(RelayError::invalid_relay(relay)),
        }
    }

    /// All relays of a card in order.
    pub fn all() -> impl Iterator<Item = Relay> {
        (1..=RELAY_COUNT).map(Relay)
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// Bit position of this relay in a state byte.
    pub fn bit(self) -> u8 {
        self.0 - 1
    }
}

impl fmt::Display for Relay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operation encoded into one command byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Report every relay's state.
    QueryStates,
    /// Switch a relay on.
    Set(Relay),
    /// Switch a relay off.
    Clear(Relay),
}

impl Command {
    /// Wire byte for this command.
    pub fn byte(self) -> u8 {
        match self {
            Command::QueryStates => QUERY_STATES,
            Command::Set(relay) => relay.number(),
            Command::Clear(relay) => relay.number().wrapping_add(CLEAR_OFFSET),
        }
    }

    /// State the addressed relay must report afterwards, if any.
    pub fn expected_state(self) -> Option<(Relay, bool)> {
        match self {
            Command::QueryStates => None,
            Command::Set(relay) => Some((relay, true)),
            Command::Clear(relay) => Some((relay, false)),
        }
    }
}

/// Relay states as reported by the card: bit *i* is relay *i + 1*.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelayStates(u8);

impl RelayStates {
    pub fn new(mask: u8) -> Self {
        RelayStates(mask)
    }

    /// Raw mask byte.
    pub fn mask(self) -> u8 {
        self.0
    }

    pub fn is_on(self, relay: Relay) -> bool {
        (self.0 >> relay.bit()) & 1 == 1
    }

    /// `(relay, is_on)` for every relay in order.
    pub fn iter(self) -> impl Iterator<Item = (Relay, bool)> {
        Relay::all().map(move |relay| (relay, self.is_on(relay)))
    }
}

impl From<u8> for RelayStates {
    fn from(mask: u8) -> Self {
        RelayStates(mask)
    }
}

impl fmt::Display for RelayStates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08b}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_relay_range() {
        for n in 1..=8 {
            assert_eq!(Relay::new(n).unwrap().number(), n as u8);
        }
        for n in [0, 9, -1, 256, 265, i32::MAX, i32::MIN] {
            assert_eq!(Relay::new(n).unwrap_err().kind(), ErrorKind::InvalidArgument);
        }
    }

    #[test]
    fn test_command_bytes() {
        assert_eq!(Command::QueryStates.byte(), 0);
        for relay in Relay::all() {
            assert_eq!(Command::Set(relay).byte(), relay.number());
            assert_eq!(Command::Clear(relay).byte(), relay.number() + 10);
        }
    }

    #[test]
    fn test_expected_state() {
        let relay = Relay::new(4).unwrap();
        assert_eq!(Command::QueryStates.expected_state(), None);
        assert_eq!(Command::Set(relay).expected_state(), Some((relay, true)));
        assert_eq!(Command::Clear(relay).expected_state(), Some((relay, false)));
    }

    #[test]
    fn test_states_mask() {
        let states = RelayStates::new(0b0000_0101);
        let on: Vec<u8> = states
            .iter()
            .filter(|(_, on)| *on)
            .map(|(relay, _)| relay.number())
            .collect();
        assert_eq!(on, vec![1, 3]);
        assert_eq!(states.to_string(), "00000101");
    }

    #[test]
    fn test_relay_eight_is_high_bit() {
        let states = RelayStates::new(0b1000_0000);
        assert!(states.is_on(Relay::new(8).unwrap()));
        assert!(!states.is_on(Relay::new(7).unwrap()));
    }
}
