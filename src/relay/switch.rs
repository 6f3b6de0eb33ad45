//! # Switch Module
//!
//! One [`RelaySwitch`] per relay, each holding a shared handle to the
//! controller and a cached on/off flag. The cache is only a convenience for
//! the caller; the card is the source of truth whenever it is queried.

use std::sync::Arc;

use log::{debug, error};

use super::command::{RELAY_COUNT, Relay};
use super::controller::RelayController;
use crate::error::Result;
use crate::serial::Transport;

/// The only card the protocol can address.
pub const CARD: i32 = 1;

/// Static description of the card a switch belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub identifier: String,
    pub name: String,
    pub manufacturer: &'static str,
    pub model: &'static str,
}

/// A single relay exposed as an on/off switch.
pub struct RelaySwitch<T: Transport> {
    controller: Arc<RelayController<T>>,
    card: i32,
    relay: Relay,
    is_on: bool,
}

impl<T: Transport> RelaySwitch<T> {
    pub fn new(controller: Arc<RelayController<T>>, card: i32, relay: Relay, is_on: bool) -> Self {
        debug!(
            "Adding switch card {card} relay {relay} with state {}",
            if is_on { "on" } else { "off" }
        );
        RelaySwitch {
            controller,
            card,
            relay,
            is_on,
        }
    }

    /// Display name, `K<card>R<relay>`.
    pub fn name(&self) -> String {
        format!("K{}R{}", self.card, self.relay)
    }

    /// Stable id, `<card>.<relay>`.
    pub fn unique_id(&self) -> String {
        format!("{}.{}", self.card, self.relay)
    }

    pub fn card(&self) -> i32 {
        self.card
    }

    pub fn relay(&self) -> Relay {
        self.relay
    }

    pub fn device_info(&self) -> DeviceInfo {
        let card_name = format!("K{}", self.card);
        DeviceInfo {
            identifier: card_name.clone(),
            name: card_name,
            manufacturer: "Custom Relay",
            model: "8",
        }
    }

    /// Last known state.
    pub fn is_on(&self) -> bool {
        self.is_on
    }

    /// Switch the relay on. The cached state changes only if the card confirms.
    pub async fn turn_on(&mut self) -> Result<()> {
        let result = self.controller.set(self.card, self.relay.number().into()).await;
        self.apply(result, true)
    }

    /// Switch the relay off. The cached state changes only if the card confirms.
    pub async fn turn_off(&mut self) -> Result<()> {
        let result = self.controller.clear(self.card, self.relay.number().into()).await;
        self.apply(result, false)
    }

    fn apply(&mut self, result: Result<()>, is_on: bool) -> Result<()> {
        match result {
            Ok(()) => {
                self.is_on = is_on;
                Ok(())
            }
            Err(e) => {
                error!("{}: {}", self.name(), e);
                Err(e)
            }
        }
    }
}

/// Query the card once and build a switch for each of its relays.
pub async fn create_switches<T: Transport>(
    controller: Arc<RelayController<T>>,
) -> Result<Vec<RelaySwitch<T>>> {
    let states = controller.get_states().await?;
    let mut switches = Vec::with_capacity(usize::from(RELAY_COUNT));
    for (relay, is_on) in states.iter() {
        switches.push(RelaySwitch::new(Arc::clone(&controller), CARD, relay, is_on));
    }
    Ok(switches)
}

#[cfg(test)]
mod tests {
    use tokio::time::Duration;

    use super::*;
    use crate::error::ErrorKind;
    use crate::relay::controller::ControllerSettings;
    use crate::serial::SimulatedCard;

    fn controller(card: &SimulatedCard) -> Arc<RelayController<SimulatedCard>> {
        let settings = ControllerSettings {
            transaction_timeout: Duration::from_millis(500),
            settle_delay: Duration::from_millis(1),
        };
        Arc::new(RelayController::with_settings(card.clone(), settings))
    }

    #[tokio::test]
    async fn test_create_switches_from_states() {
        let card = SimulatedCard::with_states(0b0000_0101);
        let switches = create_switches(controller(&card)).await.unwrap();
        assert_eq!(switches.len(), 8);
        let on: Vec<bool> = switches.iter().map(RelaySwitch::is_on).collect();
        assert_eq!(on, vec![true, false, true, false, false, false, false, false]);
        assert_eq!(switches[0].name(), "K1R1");
        assert_eq!(switches[7].unique_id(), "1.8");
    }

    #[tokio::test]
    async fn test_create_switches_propagates_errors() {
        let card = SimulatedCard::new();
        card.set_silent(true);
        let err = create_switches(controller(&card)).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::EmptyResponse);
    }

    #[tokio::test]
    async fn test_turn_on_and_off() {
        let card = SimulatedCard::new();
        let mut switches = create_switches(controller(&card)).await.unwrap();
        let switch = &mut switches[3];
        switch.turn_on().await.unwrap();
        assert!(switch.is_on());
        assert_eq!(card.states(), 0b0000_1000);
        switch.turn_off().await.unwrap();
        assert!(!switch.is_on());
        assert_eq!(card.states(), 0);
    }

    #[tokio::test]
    async fn test_failed_turn_on_keeps_cached_state() {
        let card = SimulatedCard::new();
        card.set_stuck(0b0000_0001);
        let mut switches = create_switches(controller(&card)).await.unwrap();
        let err = switches[0].turn_on().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedState);
        assert!(!switches[0].is_on());
    }

    #[tokio::test]
    async fn test_device_info() {
        let card = SimulatedCard::new();
        let switch = RelaySwitch::new(controller(&card), CARD, Relay::new(2).unwrap(), false);
        let info = switch.device_info();
        assert_eq!(info.identifier, "K1");
        assert_eq!(info.manufacturer, "Custom Relay");
        assert_eq!(info.model, "8");
    }
}
