mod app;

use std::path::PathBuf;

use app::{App, Privilege};
use clap::{Parser, Subcommand};
use color_eyre::Result;
use memsweep::config::{self, load_config, load_config_from_path};
use memsweep::logging;

#[derive(Parser)]
#[command(
    name = "memsweep",
    about = "Report CPU, memory and disk usage; clean temp files and trim working sets"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Restart with administrator privileges when not elevated
    #[arg(long, global = true)]
    elevate: bool,

    /// Log filter, e.g. "info" or "memsweep=debug"
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone)]
enum Command {
    /// Print one CPU, memory and disk reading (default)
    Status {
        /// Volume mount point to report disk space for
        #[arg(long)]
        volume: Option<PathBuf>,
    },
    /// Print readings on a fixed cadence until Ctrl-C
    Watch {
        /// Refresh rate in milliseconds (at least 1000)
        #[arg(long)]
        refresh_rate: Option<u64>,

        /// Stop after this many readings
        #[arg(long)]
        count: Option<u64>,

        /// Volume mount point to report disk space for
        #[arg(long)]
        volume: Option<PathBuf>,
    },
    /// Delete the contents of the temporary directory
    CleanTemp {
        /// Directory to clean instead of the OS temp location
        #[arg(long)]
        scratch_dir: Option<PathBuf>,
    },
    /// Trim process working sets to reclaim physical memory
    FreeMemory,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = load_config_for_cli(&cli);
    logging::init_tracing(&config.logging)?;

    let command = cli.command.clone().unwrap_or(Command::Status { volume: None });
    let mut app = App::new(config, cli.json);

    match command {
        Command::Status { .. } => app.status().await,
        Command::Watch { count, .. } => app.watch(count).await,
        Command::CleanTemp { .. } => {
            if app.check_privileges()? == Privilege::Relaunched {
                return Ok(());
            }
            app.clean_temp().await
        }
        Command::FreeMemory => {
            if app.check_privileges()? == Privilege::Relaunched {
                return Ok(());
            }
            app.free_memory().await
        }
    }
}

fn load_config_for_cli(cli: &Cli) -> config::Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if cli.elevate {
        config.general.elevate = true;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    match &cli.command {
        Some(Command::Status { volume }) => {
            if let Some(volume) = volume {
                config.general.volume = Some(volume.clone());
            }
        }
        Some(Command::Watch {
            refresh_rate,
            volume,
            ..
        }) => {
            if let Some(rate) = refresh_rate {
                config.general.refresh_rate_ms = *rate;
            }
            if let Some(volume) = volume {
                config.general.volume = Some(volume.clone());
            }
        }
        Some(Command::CleanTemp { scratch_dir }) => {
            if let Some(dir) = scratch_dir {
                config.cleanup.scratch_dir = Some(dir.clone());
            }
        }
        Some(Command::FreeMemory) | None => {}
    }

    config
}
