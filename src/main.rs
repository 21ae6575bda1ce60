//! Update Monitor - infer system update status from updater logs.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use update_monitor::commands::{
    CommandError, LogInput, Monitor, StatusSource, DEFAULT_WATCH_INTERVAL,
};
use update_monitor::config::ConfigLoader;
use update_monitor::display;
use update_monitor::inference::UpdateSnapshot;

#[derive(Parser)]
#[command(
    name = "update-monitor",
    about = "Infer system update status from updater logs",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file to use instead of the default search paths.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Infer the update status from a log file.
    Parse {
        /// Log file to read, or `-` for stdin. Defaults to the configured log path.
        file: Option<PathBuf>,
        /// Print the result without storing it.
        #[arg(long)]
        no_save: bool,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Show the last stored update status.
    Status {
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
        /// Keep polling while an update is in progress.
        #[arg(long)]
        watch: bool,
        /// Seconds between polls in watch mode.
        #[arg(long, default_value_t = DEFAULT_WATCH_INTERVAL.as_secs(), value_parser = clap::value_parser!(u64).range(1..))]
        interval_secs: u64,
    },
    /// Open the system settings page to start an update check.
    Check,
    /// Serve status requests over the IPC socket until Ctrl-C.
    Serve,
    /// Forget the stored update status.
    Reset,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn print(snapshot: &UpdateSnapshot, json: bool) {
    if json {
        if let Err(e) = display::print_snapshot_json(snapshot) {
            display::print_error(&format!("Failed to serialize status: {e}"));
        }
    } else {
        display::print_snapshot(snapshot);
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    let loader = cli.config.map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    let config = loader.load()?;
    let monitor = Monitor::new(config);

    match cli.command {
        Commands::Parse {
            file,
            no_save,
            json,
        } => {
            let input = LogInput::from_arg(file, monitor.config().log.path.clone());
            let snapshot = monitor.parse(&input, !no_save).await?;
            print(&snapshot, json);
        }
        Commands::Status {
            json,
            watch: false,
            ..
        } => {
            let (snapshot, source) = monitor.status().await?;
            tracing::debug!(from_server = source == StatusSource::Server, "Loaded status");
            print(&snapshot, json);
        }
        Commands::Status {
            json,
            watch: true,
            interval_secs,
        } => {
            let mut last: Option<UpdateSnapshot> = None;
            let watch = monitor.watch(Duration::from_secs(interval_secs), |snapshot, _| {
                if !last.as_ref().is_some_and(|prev| prev.same_status(snapshot)) {
                    print(snapshot, json);
                    last = Some(snapshot.clone());
                }
            });

            tokio::select! {
                result = watch => {
                    result?;
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::debug!("Watch interrupted");
                }
            }
        }
        Commands::Check => {
            monitor.check().await?;
            display::print_info("Opened settings page to check for updates");
        }
        Commands::Serve => monitor.serve().await?,
        Commands::Reset => {
            monitor.reset().await?;
            display::print_info("Update status cleared");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            display::print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
