use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use btaddr::host::usb::UsbConnector;
use btaddr::{BdAddr, Spoofer};

/// Inspect USB Bluetooth controllers and change their public address.
#[derive(Parser, Debug)]
#[command(name = "btaddr", version, about)]
struct Cli {
    /// Capture all HCI traffic of the opened controller to this btsnoop file
    #[arg(long, env = "BTSNOOP_LOG", global = true)]
    btsnoop: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the attached controllers with their index
    List,
    /// Write a new public address to a controller
    Spoof {
        /// Controller index as shown by `list`
        index: u16,
        /// New address in XX:XX:XX:XX:XX:XX notation
        address: BdAddr,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(layer().without_time())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut connector = UsbConnector::default();
    if let Some(path) = &cli.btsnoop {
        connector = connector.with_btsnoop_log(path);
    }

    match cli.command {
        Command::List => {
            for info in connector.list()? {
                println!("{}: {:04X}:{:04X} {} (bus {}, device {})",
                         info.index,
                         info.vendor_id,
                         info.product_id,
                         info.product.as_deref().unwrap_or("<unnamed>"),
                         info.bus_number,
                         info.device_address);
            }
        }
        Command::Spoof { index, address } => {
            let outcome = Spoofer::new(connector)
                .spoof_address(index, address)
                .await;
            info!("Finished with {:?}", outcome);
            println!("{}", outcome);
            if !outcome.address_written() {
                std::process::exit(1);
            }
        }
    }
    Ok(())
}
