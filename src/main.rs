use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use splitify_lib::commands::{self, AppState, CommandError, SplitRequest};
use splitify_lib::split::SplitOptions;
use splitify_lib::storage::JsonFileStorage;

#[derive(Parser)]
#[command(name = "splitify")]
#[command(about = "Split spreadsheet rows into per-region workbooks using cost center profiles")]
#[command(version)]
struct Cli {
    /// Directory holding profiles, settings and history
    #[arg(long, global = true, env = "SPLITIFY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show headers, row count and sample values of a file
    Columns {
        file: String,
    },

    /// Split a file into one workbook per region
    Split {
        file: String,

        /// Zero-based index of the cost center column
        #[arg(short, long)]
        column: usize,

        /// Profile id or name (default: favorite, then first profile)
        #[arg(short, long)]
        profile: Option<String>,

        /// Output directory (default: directory of the file)
        #[arg(short, long)]
        out: Option<String>,

        /// Also write a NON_MATCHING file with excluded and unknown rows
        #[arg(long)]
        keep_non_matching: bool,

        /// Replaces the source file name in output names
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Manage profiles
    Profiles {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Show settings
    Settings,

    /// Show past split runs
    History {
        /// Remove all entries
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// List stored profiles
    List,

    /// Merge profiles from a JSON array file
    Import {
        json: String,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CommandError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CommandError::new(format!("Failed to serialize output: {}", e)))?;
    println!("{}", json);
    Ok(())
}

fn run(cli: Cli) -> Result<(), CommandError> {
    let storage = match cli.data_dir {
        Some(dir) => JsonFileStorage::new(dir),
        None => JsonFileStorage::default_location()?,
    };
    tracing::debug!(data_dir = %storage.dir().display(), "using data directory");
    let state = AppState::new(Arc::new(storage));

    match cli.command {
        Commands::Columns { file } => print_json(&commands::read_file_columns(&file)?),
        Commands::Split {
            file,
            column,
            profile,
            out,
            keep_non_matching,
            prefix,
        } => {
            let profile = commands::resolve_profile(&state, profile.as_deref())?;
            tracing::info!(profile = %profile.name, "splitting {}", file);

            let request = SplitRequest {
                source_path: file,
                column_index: column,
                parameters: profile.parameters,
                output_dir: out,
                profile_name: Some(profile.name),
                options: SplitOptions {
                    keep_non_matching,
                    output_prefix: prefix,
                    run_date: None,
                },
            };
            print_json(&commands::split_file(&state, request)?)
        }
        Commands::Profiles { action } => match action {
            ProfileAction::List => print_json(&commands::get_profiles(&state)),
            ProfileAction::Import { json } => {
                let count = commands::import_profiles(&state, &json)?;
                print_json(&serde_json::json!({ "imported": count }))
            }
        },
        Commands::Settings => print_json(&commands::get_settings(&state)),
        Commands::History { clear } => {
            if clear {
                commands::clear_history(&state)?;
            }
            print_json(&commands::get_history(&state))
        }
    }
}

fn main() -> ExitCode {
    init_tracing();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
