//! Command line interface for the `flowframe` binary.
//!
//! Also compiled by the build script to generate the man page.

use std::net::IpAddr;

use clap::Parser;

/// Command line arguments for the `flowframe` binary.
#[derive(Debug, Parser)]
#[command(
    name = "flowframe",
    version,
    about = "Stream length-prefixed JSON events from a TCP producer to stdout"
)]
pub struct Cli {
    /// Producer host address.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Producer TCP port.
    #[arg(short, long, default_value_t = 7000)]
    pub port: u16,

    /// Milliseconds between heartbeat markers.
    #[arg(long = "heartbeat-ms", default_value_t = 1000)]
    pub heartbeat_ms: u64,

    /// Decoded events allowed to wait for the display before reads pause.
    #[arg(long, default_value_t = 256)]
    pub queue_capacity: usize,
}
