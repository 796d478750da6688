//! CLI entry point: `irc_server <port> <password> [--config <path>]`. Parses the
//! positional grammar in `SPEC_FULL.md` §6, loads ambient configuration (§10.3),
//! installs SIGINT/SIGTERM handlers, and runs the server until one of them fires.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use flexi_logger::{Duplicate, Logger};
use log::{error, info};

use irc_server::{shutdown_channel, Config, Server, ShutdownHandle};

#[derive(Parser, Debug)]
#[command(name = "irc_server", about = "A minimal IRC server")]
struct Args {
    /// TCP port to listen on.
    #[arg(value_parser = parse_port)]
    port: u16,

    /// Connection password clients must supply via PASS before registering.
    password: String,

    /// Optional path to a TOML configuration file (see SPEC_FULL.md §10.3).
    #[arg(long, default_value = "irc_server.toml")]
    config: PathBuf,
}

fn parse_port(raw: &str) -> Result<u16, String> {
    let port: u32 = raw
        .parse()
        .map_err(|_| format!("port must be numeric, got {raw:?}"))?;
    if port == 0 || port > 65535 {
        return Err(format!("port must be in 1..=65535, got {port}"));
    }
    Ok(port as u16)
}

#[tokio::main]
async fn main() -> ExitCode {
    Logger::try_with_str("info")
        .and_then(|logger| {
            logger
                .log_to_stderr()
                .duplicate_to_stderr(Duplicate::All)
                .start()
        })
        .ok();

    let args = Args::parse();

    let config = match Config::load_or_default(&args.config) {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let server = Server::new(config.server.name.clone(), args.password.clone(), &config);
    let bind_addr = format!("{}:{}", config.network.bind_address, args.port);

    let listener = match server.bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let (shutdown_handle, shutdown) = shutdown_channel();
    tokio::spawn(install_signal_handlers(shutdown_handle));

    server.serve(listener, shutdown).await;
    info!("server shut down cleanly");
    ExitCode::SUCCESS
}

/// Waits for SIGINT or SIGTERM and trips the shutdown flag, per `SPEC_FULL.md` §6.
async fn install_signal_handlers(handle: ShutdownHandle) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("received SIGINT"),
            _ = sigterm.recv() => info!("received SIGTERM"),
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("received ctrl-c");
    }
    handle.trigger();
}
