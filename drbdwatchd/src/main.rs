#![deny(clippy::as_conversions)]
use drbdwatchd::{Parameters, Watcher};
use opts::Opts;
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod opts;

fn main() -> anyhow::Result<()> {
    init_logging();

    let opts = Opts::from_args();

    let params = Parameters::builder()
        .status_path(opts.status_file)
        .fstab_path(opts.fstab)
        .proc_mounts_path(opts.proc_mounts)
        .poll_interval(opts.sleep)
        .ignore_errors(opts.ignore_errors)
        .command(opts.command)
        .build();

    let watcher = Watcher::new(params)?;
    watcher.get_ctrl().install_signal_handler()?;

    watcher.run()?;

    Ok(())
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(atty::is(atty::Stream::Stderr))
                .with_writer(io::stderr),
        )
        .init();
}
