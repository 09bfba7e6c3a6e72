use clap::Parser;
use std::process::ExitCode;
use stock_log::args::{Args, Command};
use stock_log::commands::ViewStatus;
use stock_log::{commands, Config, Inventory, Mode, Result};
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error_type = %e.error_type(), "Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().home().path();

    // This allows for testing the program without hitting the Google APIs. When
    // STOCKLOG_IN_TEST_MODE is set and non-zero in length, then the mode will be Mode::Testing,
    // otherwise it will be Mode::Google.
    let mode = Mode::from_env();

    // Route to appropriate command handler
    match args.command() {
        Command::Init(init_args) => commands::init(
            home,
            init_args.credentials(),
            init_args.spreadsheet(),
            init_args.worksheet(),
        )
        .await?
        .print(),

        Command::Mcp => commands::mcp(Config::load(home).await?, mode)
            .await?
            .print(),

        Command::Check => {
            let inventory = open(home, mode).await?;
            commands::check(&inventory).await?.print()
        }

        Command::Add(add_args) => {
            let inventory = open(home, mode).await?;
            commands::add(&inventory, add_args.clone()).await?.print()
        }

        Command::List(list_args) => {
            let inventory = open(home, mode).await?;
            let out = commands::list(&inventory, list_args.clone()).await?;
            out.print();
            print_rows(out.structure());
        }

        Command::Search(search_args) => {
            let inventory = open(home, mode).await?;
            let out = commands::search(&inventory, search_args.clone()).await?;
            out.print();
            print_rows(out.structure());
        }
    };
    Ok(())
}

async fn open(home: &std::path::Path, mode: Mode) -> Result<Inventory> {
    let config = Config::load(home).await?;
    Inventory::open(&config, mode).await
}

/// Rendered rows go to stdout so that they can be piped; everything else is logged to stderr.
fn print_rows(view: Option<&commands::View>) {
    if let Some(view) = view {
        if view.status == ViewStatus::Data {
            println!("{}", view.rows);
        }
    }
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use the log level for this package's library and binary.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
