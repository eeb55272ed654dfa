use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use ratewatch::cli::dashboard::SortKey;
use ratewatch::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for ratewatch::AppCommand {
    fn from(cmd: Commands) -> ratewatch::AppCommand {
        match cmd {
            Commands::Rates { sort, desc } => ratewatch::AppCommand::Rates {
                sort,
                descending: desc,
            },
            Commands::Convert { amount, from, to } => {
                ratewatch::AppCommand::Convert { amount, from, to }
            }
            Commands::Watch {
                amount,
                from,
                to,
                sort,
                desc,
            } => ratewatch::AppCommand::Watch {
                amount,
                from,
                to,
                sort,
                descending: desc,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display current exchange rates and statistics
    Rates {
        /// Order of the rate table
        #[arg(short, long, value_enum, default_value_t = SortKey::Feed)]
        sort: SortKey,
        /// Sort in descending order
        #[arg(long)]
        desc: bool,
    },
    /// Convert an amount between two currencies at the current rates
    Convert {
        /// Amount to convert
        #[arg(allow_negative_numbers = true)]
        amount: f64,
        /// Currency to convert from, e.g. USD
        from: String,
        /// Currency to convert to, e.g. EUR
        to: String,
    },
    /// Keep a live dashboard open, refreshing periodically
    Watch {
        /// Initial converter amount
        #[arg(short, long, allow_negative_numbers = true)]
        amount: Option<f64>,
        /// Initial converter source currency
        #[arg(short, long)]
        from: Option<String>,
        /// Initial converter target currency
        #[arg(short, long)]
        to: Option<String>,
        /// Order of the rate table
        #[arg(short, long, value_enum, default_value_t = SortKey::Feed)]
        sort: SortKey,
        /// Sort in descending order
        #[arg(long)]
        desc: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => ratewatch::cli::setup::setup(),
        Some(cmd) => ratewatch::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
