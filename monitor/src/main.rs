#[macro_use]
extern crate log;

use snmp_monitor_runner::prelude::*;

const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> anyhow::Result<()> {
    let cli = init();
    info!("{CRATE_NAME} {CRATE_VERSION}");
    debug!(
        "Polling every {}s, keeping {} samples per metric",
        cli.interval, cli.history_capacity
    );

    run(cli)
}
