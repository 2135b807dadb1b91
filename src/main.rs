//! apkfetch CLI

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use apkfetch::config::{self, Config};
use apkfetch::ops::sync::{self, RunFlags};
use apkfetch::ui;

/// Keep a set of Android packages current from the market.
///
/// Mandatory options (android id, email, password, store, directory,
/// packages) may come from config files or the command line. Config
/// files are searched at ~/apkfetch.yml and ./apkfetch.yml, then
/// --config, melded in that order with command-line flags applied last.
#[derive(Parser)]
#[command(name = "apkfetch", version, about)]
struct Cli {
    /// Device android id
    #[arg(short = 'i', long)]
    android_id: Option<String>,

    /// Account email
    #[arg(short, long)]
    email: Option<String>,

    /// Account password
    #[arg(short, long)]
    password: Option<String>,

    /// Catalog store file
    #[arg(short = 'b', long)]
    store: Option<PathBuf>,

    /// Directory to save artifacts into
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// Extra config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Packages to keep current
    #[arg(short = 'a', long, num_args = 1..)]
    apks: Vec<String>,

    /// Download even when the local record is current
    #[arg(short, long)]
    force: bool,

    /// Re-create the catalog store from scratch
    #[arg(short, long)]
    recreate: bool,

    /// Compute and record updates without transferring artifacts
    #[arg(long)]
    dry_run: bool,

    /// Show package info only, no downloads
    #[arg(short = 's', long)]
    info: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = config::load(cli.config.as_deref());
    config.meld(Config {
        android_id: cli.android_id,
        email: cli.email,
        password: cli.password,
        store: cli.store,
        directory: cli.directory,
        apks: cli.apks,
    });

    let settings = match config.resolve() {
        Ok(settings) => settings,
        Err(missing) => {
            ui::error(&format!(
                "Absent parameters: {missing}.\n\
                 Set them either in a config file or on the command line."
            ));
            std::process::exit(2);
        }
    };

    let flags = RunFlags {
        force: cli.force,
        recreate: cli.recreate,
        dry_run: cli.dry_run,
        info_only: cli.info,
    };
    sync::run(&settings, &flags)
}
