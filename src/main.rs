//! sheetquery - spreadsheet-driven SQL queries with spreadsheet and extract export.

use sheetquery::cli::{quiet_message, Cli, Command};
use sheetquery::config::{Config, DATABASE_URL_ENV};
use sheetquery::error::Result;
use sheetquery::extract::ExtractExporter;
use sheetquery::logging;
use sheetquery::query::QueryRunner;
use std::path::Path;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    logging::init(cli.verbose, cli.log_file.as_deref());

    if let Err(e) = run(&cli).await {
        if cli.quiet {
            println!("{}", quiet_message(&e));
            return;
        }
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;

    match &cli.command {
        Command::Query(args) => {
            args.validate()?;
            args.apply_overrides(&mut config);

            let connection = config.resolve_connection(
                args.db_url.as_deref(),
                args.connection.as_deref(),
                std::env::var(DATABASE_URL_ENV).ok(),
            )?;

            let runner = QueryRunner::from_config(&config);
            let summary = runner.run(&args.to_request(), &connection).await?;
            info!(
                "Executed {} with {} values in {:?}",
                args.query, summary.value_count, summary.elapsed
            );
            println!(
                "Query executed successfully. Results exported to '{}'.",
                summary.output_path.display()
            );

            if let Some(extract_path) = &args.extract {
                export(&summary.output_path, extract_path).await?;
            }
        }
        Command::Extract(args) => export(&args.input, &args.output).await?,
    }

    Ok(())
}

async fn export(source: &Path, output: &Path) -> Result<()> {
    let summary = ExtractExporter::new().run(source, output).await?;
    info!(
        "Extract has {} columns and {} rows",
        summary.column_count, summary.row_count
    );
    println!(
        "Data successfully exported to extract file: {}",
        summary.output_path.display()
    );
    Ok(())
}
