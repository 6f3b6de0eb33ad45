//! In-memory relay card.
//!
//! Answers command bytes the way the firmware does, so the controller can be
//! driven without hardware. Clones share the same card, which lets tests keep
//! a handle for inspection after handing one to a controller.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use log::debug;
use tokio::time::Duration;

use super::Transport;
use crate::error::{RelayError, Result};
use crate::relay::command::{CLEAR_OFFSET, QUERY_STATES, RELAY_COUNT};

#[derive(Debug, Default)]
struct CardState {
    states: u8,
    stuck: u8,
    silent: bool,
    fail_open: bool,
    response_delay: Duration,
    open: bool,
    opens: usize,
    closes: usize,
    overlapping_opens: usize,
    pending: Option<u8>,
    transcript: Vec<(u8, Option<u8>)>,
}

/// Simulated 8-relay card speaking the single-byte protocol.
#[derive(Clone, Debug, Default)]
pub struct SimulatedCard {
    inner: Arc<Mutex<CardState>>,
}

impl SimulatedCard {
    /// A card with every relay off.
    pub fn new() -> Self {
        Self::default()
    }

    /// A card whose relays start in `states`.
    pub fn with_states(states: u8) -> Self {
        let card = Self::new();
        card.lock().states = states;
        card
    }

    /// Relays in `mask` ignore set and clear commands.
    pub fn set_stuck(&self, mask: u8) {
        self.lock().stuck = mask;
    }

    /// When silent the card swallows commands and never answers.
    pub fn set_silent(&self, silent: bool) {
        self.lock().silent = silent;
    }

    /// Make every open attempt fail.
    pub fn set_fail_open(&self, fail: bool) {
        self.lock().fail_open = fail;
    }

    /// Delay applied before each answer is readable.
    pub fn set_response_delay(&self, delay: Duration) {
        self.lock().response_delay = delay;
    }

    pub fn states(&self) -> u8 {
        self.lock().states
    }

    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    pub fn opens(&self) -> usize {
        self.lock().opens
    }

    pub fn closes(&self) -> usize {
        self.lock().closes
    }

    /// Number of times the link was opened while already open.
    pub fn overlapping_opens(&self) -> usize {
        self.lock().overlapping_opens
    }

    /// Every command received with the answer the card gave.
    pub fn transcript(&self) -> Vec<(u8, Option<u8>)> {
        self.lock().transcript.clone()
    }

    fn lock(&self) -> MutexGuard<'_, CardState> {
        // state stays consistent even if a holder panicked
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CardState {
    fn apply(&mut self, command: u8) -> Option<u8> {
        let free = !self.stuck;
        match command {
            QUERY_STATES => {}
            1..=RELAY_COUNT => self.states |= (1 << (command - 1)) & free,
            c if (CLEAR_OFFSET + 1..=CLEAR_OFFSET + RELAY_COUNT).contains(&c) => {
                self.states &= !((1 << (c - CLEAR_OFFSET - 1)) & free);
            }
            _ => return None,
        }
        Some(self.states)
    }
}

#[async_trait]
impl Transport for SimulatedCard {
    async fn open(&mut self) -> Result<()> {
        let mut card = self.lock();
        if card.fail_open {
            return Err(RelayError::transport("simulated card refused to open"));
        }
        if card.open {
            card.overlapping_opens += 1;
        }
        card.open = true;
        card.opens += 1;
        Ok(())
    }

    fn close(&mut self) {
        let mut card = self.lock();
        if card.open {
            card.closes += 1;
        }
        card.open = false;
        card.pending = None;
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let mut card = self.lock();
        if !card.open {
            return Err(RelayError::transport("simulated card is not open"));
        }
        for &command in data {
            let answer = if card.silent { None } else { card.apply(command) };
            debug!("Simulated card got {command:#04x}, answers {answer:?}");
            card.pending = answer;
            card.transcript.push((command, answer));
        }
        Ok(())
    }

    async fn read(&mut self) -> Result<Vec<u8>> {
        let delay = {
            let card = self.lock();
            if !card.open {
                return Err(RelayError::transport("simulated card is not open"));
            }
            card.response_delay
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        Ok(self.lock().pending.take().into_iter().collect())
    }
}
