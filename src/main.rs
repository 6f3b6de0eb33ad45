use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::{error, info};

use customrelay8::prelude::*;
use customrelay8::relay::switch::CARD;

/// Control a Custom Relay 8 card over a serial port.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Serial port the card is attached to
    #[arg(short, long, default_value = "/dev/ttyUSB0")]
    port: String,

    /// Baud rate
    #[arg(short, long, default_value_t = 9600)]
    baud: u32,

    /// Upper bound for one transaction, in milliseconds
    #[arg(long, default_value_t = 3000)]
    timeout_ms: u64,

    /// Pause between command and response, in milliseconds
    #[arg(long, default_value_t = 10)]
    settle_ms: u64,

    /// Talk to an in-memory card instead of a serial port
    #[arg(long)]
    simulate: bool,

    #[command(subcommand)]
    action: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Print the state of every relay
    States,
    /// Switch a relay on
    On {
        relay: i32,
        #[arg(long, default_value_t = CARD)]
        card: i32,
    },
    /// Switch a relay off
    Off {
        relay: i32,
        #[arg(long, default_value_t = CARD)]
        card: i32,
    },
    /// List the switches of the card with their names and states
    Switches,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let settings = ControllerSettings {
        transaction_timeout: Duration::from_millis(args.timeout_ms),
        settle_delay: Duration::from_millis(args.settle_ms),
    };

    let result = if args.simulate {
        info!("Using simulated card");
        let controller = RelayController::with_settings(SimulatedCard::new(), settings);
        run(Arc::new(controller), args.action).await
    } else {
        let port = PortSettings::new(args.port).baud_rate(args.baud);
        run(Arc::new(RelayController::connect(port, settings)), args.action).await
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run<T: Transport>(controller: Arc<RelayController<T>>, action: Action) -> Result<()> {
    match action {
        Action::States => {
            let states = controller.get_states().await?;
            for (relay, is_on) in states.iter() {
                println!("relay {relay}: {}", if is_on { "on" } else { "off" });
            }
        }
        Action::On { relay, card } => controller.set(card, relay).await?,
        Action::Off { relay, card } => controller.clear(card, relay).await?,
        Action::Switches => {
            for switch in create_switches(controller).await? {
                println!(
                    "{} ({}): {}",
                    switch.name(),
                    switch.unique_id(),
                    if switch.is_on() { "on" } else { "off" }
                );
            }
        }
    }
    Ok(())
}
