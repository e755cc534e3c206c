use log::{info, LevelFilter};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use structopt::StructOpt;

use ipfix::collector::{Collector, CollectorConfig};
use ipfix::exporter::{Exporter, ExporterConfig};
use ipfix::session::Session;

#[derive(Debug, StructOpt)]
struct Opts {
    /// Log level to use
    #[structopt(long = "log", default_value = "Info")]
    log_level: LevelFilter,

    /// IP:port for the UDP collector
    #[structopt(short = "-l", long = "--listener", default_value = "0.0.0.0:4739")]
    listener: SocketAddr,

    /// IP:port the demo exporter sends its template refreshes to
    #[structopt(short = "-e", long = "--exporter", default_value = "127.0.0.1:4739")]
    exporter: SocketAddr,

    /// Template refresh interval, in seconds
    #[structopt(long = "refresh", default_value = "300")]
    refresh_seconds: u64,
}

fn main() {
    let opts = Opts::from_args();

    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter(None, opts.log_level)
        .init();

    info!("Starting App");

    let collector_session = Arc::new(Session::new(|domain, message, peer| {
        info!(
            "domain {}: received {} set(s) from {}",
            domain.domain_id,
            message.sets.len(),
            peer
        );
    }));
    let mut collector = Collector::new(
        collector_session,
        CollectorConfig {
            listen_ip: opts.listener.ip(),
            listen_port: opts.listener.port(),
        },
    );
    if let Err(e) = collector.start() {
        log::error!("failed to start collector: {}", e);
        std::process::exit(1);
    }

    let exporter_session = Arc::new(Session::new(|_, _, _| {}));
    let mut exporter = Exporter::new(
        exporter_session,
        ExporterConfig {
            local_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            server_ip: opts.exporter.ip(),
            server_port: opts.exporter.port(),
            template_refresh_interval: Duration::from_secs(opts.refresh_seconds),
        },
    );
    if let Err(e) = exporter.start() {
        log::error!("failed to start exporter: {}", e);
    }

    info!("Running. Press Ctrl-C to stop.");
    loop {
        std::thread::sleep(Duration::from_secs(3600));
    }
}
