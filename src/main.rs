mod batch;
mod cli;
mod dates;
mod db;
mod error;
mod extract;
mod fmt;
mod master;
mod models;
mod ocr;
mod pdf;
mod pipeline;
mod report;
mod settings;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use cli::process::ProcessOptions;
use cli::{Cli, Commands, RecordsCommands};
use settings::load_settings;

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> error::Result<()> {
    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "cashflow", &mut std::io::stdout());
        return Ok(());
    }

    let settings = load_settings(&cli.config)?;
    match cli.command {
        Commands::Init => cli::init::run(&cli.config, &settings),
        Commands::Check => cli::check::run(&settings),
        Commands::Scan { source } => cli::scan::run(&settings, source),
        Commands::Process {
            files,
            all,
            source,
            export,
            save,
            raw_dir,
            format,
        } => cli::process::run(
            &settings,
            ProcessOptions {
                files,
                all,
                source,
                export,
                save,
                raw_dir,
                format,
            },
        ),
        Commands::Extract {
            text_file,
            save,
            format,
        } => cli::process::extract(&settings, &text_file, save, format),
        Commands::Batch { source, output } => cli::batch::run(&settings, source, output),
        Commands::Records { command } => match command {
            RecordsCommands::List { filter, format } => cli::records::list(&settings, &filter, format),
            RecordsCommands::Delete { ids } => cli::records::delete(&settings, &ids),
            RecordsCommands::Export { filter, output_dir } => {
                cli::records::export(&settings, &filter, output_dir)
            }
            RecordsCommands::Options => cli::records::options(&settings),
            RecordsCommands::NormalizeDates => cli::records::normalize_dates(&settings),
        },
        Commands::Completions { .. } => Ok(()),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
