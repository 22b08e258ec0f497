// Netwatch - Main Entry Point
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! # Netwatch
//!
//! Daemon that tracks NetworkManager active connections and reacts to VPN
//! state changes.

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use netwatch::dbus::NmClient;
use netwatch::projector::InfoProjector;
use netwatch::reconciler::Reconciler;
use netwatch::services::{DesktopNotifier, SwitchHandle, VpnPipeline};
use netwatch::storage::ConfigStore;
use netwatch::store::ActiveConnectionStore;
use netwatch::{APP_NAME, GETTEXT_DOMAIN, VERSION};

/// Print version information and exit.
fn print_version() {
    println!("{} {}", APP_NAME, VERSION);
    println!("Copyright (C) 2026 Christos A. Daggas");
    println!("License: MIT");
    println!();
    println!("Active network connection tracker for NetworkManager.");
}

/// Print help information and exit.
fn print_help() {
    println!(
        "Usage: {} [OPTIONS]",
        env::args().next().unwrap_or_else(|| "netwatch".to_string())
    );
    println!();
    println!("Active network connection tracker for NetworkManager.");
    println!();
    println!("Options:");
    println!("  -h, --help       Show this help message and exit");
    println!("  -v, --version    Show version information and exit");
    println!("  -d, --debug      Enable debug logging");
    println!("      --once       Print active connection info as JSON and exit");
    println!();
    println!("Environment variables:");
    println!("  RUST_LOG         Set log level (trace, debug, info, warn, error)");
    println!();
    println!("Report bugs to: https://github.com/christosdaggas/netwatch/issues");
}

/// Initialize internationalization (gettext).
fn setup_i18n() {
    use gettextrs::{bindtextdomain, setlocale, textdomain, LocaleCategory};

    setlocale(LocaleCategory::LcAll, "");

    let locale_dirs = [
        "/usr/share/locale",
        "/usr/local/share/locale",
        concat!(env!("CARGO_MANIFEST_DIR"), "/po"),
    ];

    for dir in &locale_dirs {
        if std::path::Path::new(dir).exists() {
            if let Err(e) = bindtextdomain(GETTEXT_DOMAIN, *dir) {
                tracing::warn!("Failed to bind textdomain to {}: {}", dir, e);
            } else {
                tracing::debug!("Bound textdomain to {}", dir);
                break;
            }
        }
    }

    if let Err(e) = textdomain(GETTEXT_DOMAIN) {
        tracing::warn!("Failed to set textdomain: {}", e);
    }
}

/// Print both JSON documents to stdout.
async fn print_once(client: NmClient, store: &ActiveConnectionStore<NmClient>) -> ExitCode {
    let projector = InfoProjector::new(client);
    match (projector.list_json().await, store.snapshot_json()) {
        (Ok(info), Ok(snapshot)) => {
            println!("{}", info);
            println!("{}", snapshot);
            ExitCode::SUCCESS
        }
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("Failed to encode connection info: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let mut debug_mode = false;
    let mut once = false;

    for arg in &args[1..] {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                return ExitCode::SUCCESS;
            }
            "-v" | "--version" => {
                print_version();
                return ExitCode::SUCCESS;
            }
            "-d" | "--debug" => {
                debug_mode = true;
            }
            "--once" => {
                once = true;
            }
            _ => {
                if arg.starts_with('-') {
                    eprintln!("Unknown option: {}", arg);
                    eprintln!("Try '--help' for more information.");
                    return ExitCode::FAILURE;
                }
            }
        }
    }

    let config = ConfigStore::new();
    let settings = config.settings();

    let log_level = if debug_mode {
        tracing::Level::DEBUG
    } else {
        settings.log_level.parse().unwrap_or(tracing::Level::INFO)
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(log_level.into()),
        )
        .init();

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    setup_i18n();

    let client = match NmClient::system().await {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to connect to the system bus: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let store = Arc::new(ActiveConnectionStore::new(client.clone()));

    if once {
        if let Err(e) = store.initialize().await {
            tracing::warn!("Enumeration failed: {}", e);
        }
        return print_once(client, &store).await;
    }

    let notifier = DesktopNotifier::session(settings.show_notifications).await;
    let switch = Arc::new(SwitchHandle::new());
    let pipeline = VpnPipeline::new(Arc::new(config), Arc::new(notifier), switch.clone());
    let reconciler = Reconciler::new(Arc::clone(&store), pipeline);

    let mut snapshots = store.subscribe();
    tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let count = snapshots.borrow_and_update().len();
            tracing::debug!("Active connections: {}", count);
        }
    });

    let mut vpn_enabled = switch.subscribe();
    tokio::spawn(async move {
        if vpn_enabled.changed().await.is_ok() {
            tracing::info!("VPN feature enabled");
        }
    });

    match reconciler.run(client.connection()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Signal loop failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
