use clap::{Parser, Subcommand};
use igloo_connector_dynamodb::Settings;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the query splits a job configuration produces.
    Split {
        /// Job settings file; defaults to $IGLOO_DYNAMODB_CONFIG_PATH.
        #[arg(short, long)]
        config: Option<String>,
        /// Overrides the configured parallelism.
        #[arg(short, long)]
        parallelism: Option<i64>,
        /// Print base64 wire bytes instead of conditions.
        #[arg(long)]
        encoded: bool,
    },
    /// Print the segments of a parallel table scan.
    ScanSplits {
        #[arg(short, long, default_value_t = 1)]
        parallelism: i64,
        #[arg(long)]
        encoded: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("igloo=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let lines = match args.command {
        Command::Split { config, parallelism, encoded } => {
            let settings = Settings::new(config.as_deref())?;
            info!(table = %settings.table_name, "planning query splits");
            let splits = igloo::plan_query_splits(&settings, parallelism)?;
            info!(splits = splits.len(), "splits planned");
            igloo::describe_query_splits(&splits, encoded)?
        }
        Command::ScanSplits { parallelism, encoded } => {
            let splits = igloo::plan_scan_splits(parallelism)?;
            igloo::describe_scan_splits(&splits, encoded)?
        }
    };
    for line in lines {
        println!("{line}");
    }
    Ok(())
}
