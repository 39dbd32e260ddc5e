use clap::Parser;

use crate::cli::MonitorCli;

/// Initialise the CLI and logging for the SNMP monitor.
pub fn init() -> MonitorCli {
    env_logger::init();

    MonitorCli::parse()
}
