pub mod command;
pub mod controller;
pub mod switch;

pub use command::{Command, Relay, RelayStates};
pub use controller::{ControllerSettings, RelayController};
pub use switch::{DeviceInfo, RelaySwitch, create_switches};
