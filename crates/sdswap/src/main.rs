//! sdswap command line
//!
//! Selects one SD swap device and switches it to the host or the target, or
//! reports which side currently owns it.

use anyhow::{Context, Result};
use clap::Parser;
use common::setup_logging;
use protocol::{BusAddress, PortPath, UsbId, parse_bus_address, parse_id, parse_path};
use sdswap::config::{self, SwapConfig};
use sdswap::{Mode, SwapError, SwapOptions};
use std::io;
use std::process::ExitCode;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "sdswap")]
#[command(
    author,
    version,
    about = "Switch a USB SD card reader between the host and a target"
)]
#[command(long_about = "
Switches an SD swap device between the host (PC) and the target board.

Without -c or -t the current attachment state is printed.

DEVICE SELECTION:
    Devices are matched by vendor:product ID (default 0bda:0316). When more
    than one is plugged in, narrow the choice with a location, a bus address
    or a serial number. Exactly one device must match.

EXAMPLES:
    # Show which side owns the card
    sdswap

    # Give the card to the target
    sdswap -t

    # Take it back and print its block device
    sdswap -c -p

    # Select the reader on bus 2, hub port 1, downstream port 3
    sdswap -l 2-1.3 -t

CONFIGURATION:
    The configuration file is looked up in the following order:
    1. Path specified with --config
    2. ~/.config/sdswap/config.toml
    3. /etc/sdswap/config.toml
    4. Built-in defaults
")]
struct Args {
    /// Switch the card to the host (controller)
    #[arg(short = 'c', long, visible_alias = "host", conflicts_with = "target")]
    controller: bool,

    /// Switch the card to the target
    #[arg(short, long)]
    target: bool,

    /// Print the block device of the card
    #[arg(short, long)]
    print: bool,

    /// Always use PORT_SUSPEND, even on SuperSpeed links
    #[arg(short, long)]
    exact: bool,

    /// Select by topological location, e.g. 2-1.3
    #[arg(short, long, value_name = "BUS-PORTS", value_parser = parse_path)]
    location: Option<PortPath>,

    /// Select by bus number and device address, e.g. 1-14
    #[arg(short, long, value_name = "BUS-ADDR", value_parser = parse_bus_address)]
    address: Option<BusAddress>,

    /// Select by serial number
    #[arg(short, long, value_name = "SERIAL")]
    serial: Option<String>,

    /// Vendor and product ID in hex
    #[arg(short = 'i', long = "id", value_name = "VID:PID", value_parser = parse_id)]
    id: Option<UsbId>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<String>,

    /// Save default configuration to default location and exit
    #[arg(long)]
    save_config: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

impl Args {
    fn mode(&self) -> Mode {
        if self.controller {
            Mode::Host
        } else if self.target {
            Mode::Target
        } else {
            Mode::Query
        }
    }

    /// Merge command line values over the configured defaults
    fn options(&self, config: &SwapConfig) -> SwapOptions {
        let mut options = SwapOptions::from_config(config);

        if let Some(id) = self.id {
            options.filter.id = id;
        }
        if let Some(address) = self.address {
            options.filter.bus_address = Some(address);
        }
        if let Some(location) = &self.location {
            options.filter.path = Some(location.clone());
        }
        if let Some(serial) = &self.serial {
            options.filter.serial = Some(serial.clone());
        }

        options.mode = self.mode();
        options.exact |= self.exact;
        options.print_block_device = self.print;
        options
    }
}

fn main() -> ExitCode {
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            if let Some(hint) = e.downcast_ref::<SwapError>().and_then(SwapError::hint) {
                eprintln!("Note: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> Result<()> {
    let args = Args::parse();

    // Handle --save-config flag early (before loading config)
    if args.save_config {
        let config = SwapConfig::default();
        let path = SwapConfig::default_path();
        config.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    let config =
        config::load_config(args.config.as_deref()).context("Failed to load configuration")?;

    // Use CLI log level if specified, otherwise use config value
    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.general.log_level);
    config::validate_log_level(log_level)?;
    setup_logging(log_level).context("Failed to setup logging")?;

    debug!("sdswap v{}", env!("CARGO_PKG_VERSION"));

    let options = args.options(&config);
    info!("Selecting device {} ({:?})", options.filter.id, options.mode);

    let context = rusb::Context::new()
        .map_err(SwapError::Enumeration)
        .context("Failed to initialize libusb")?;
    let resolver = sdswap::platform_resolver();

    let stdout = io::stdout();
    sdswap::run(&context, &options, resolver.as_ref(), &mut stdout.lock())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn test_mode_flags() {
        let args = Args::parse_from(["sdswap", "-c"]);
        assert_eq!(args.mode(), Mode::Host);

        let args = Args::parse_from(["sdswap", "--host"]);
        assert_eq!(args.mode(), Mode::Host);

        let args = Args::parse_from(["sdswap", "-t"]);
        assert_eq!(args.mode(), Mode::Target);

        let args = Args::parse_from(["sdswap"]);
        assert_eq!(args.mode(), Mode::Query);

        assert!(Args::try_parse_from(["sdswap", "-c", "-t"]).is_err());
    }

    #[test]
    fn test_identifier_arguments() {
        let args = Args::parse_from(["sdswap", "-l", "2-1.3", "-a", "1-14", "-i", "1234:abcd"]);
        assert_eq!(args.location, Some(PortPath::new(2, vec![1, 3])));
        assert_eq!(args.address, Some(BusAddress::new(1, 14)));
        assert_eq!(args.id, Some(UsbId::new(0x1234, 0xabcd)));

        assert!(Args::try_parse_from(["sdswap", "-l", "2-0"]).is_err());
        assert!(Args::try_parse_from(["sdswap", "-a", "0-1"]).is_err());
        assert!(Args::try_parse_from(["sdswap", "-i", "123:abcd"]).is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let mut config = SwapConfig::default();
        config.device.serial = Some("FROM-CONFIG".to_string());
        config.device.location = Some(PortPath::new(1, vec![2]));

        let args = Args::parse_from(["sdswap", "-t", "-p", "-s", "FROM-CLI"]);
        let options = args.options(&config);

        assert_eq!(options.mode, Mode::Target);
        assert!(options.print_block_device);
        assert_eq!(options.filter.serial.as_deref(), Some("FROM-CLI"));
        assert_eq!(options.filter.path, Some(PortPath::new(1, vec![2])));
        assert_eq!(options.filter.id, UsbId::default());
    }
}
