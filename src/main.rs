use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use karma_extract::{read_rows, Config, Pipeline, SourceKind, TableReport, TracingSink};

#[derive(Parser)]
#[command(name = "karma-extract", about = "Turn saved Credit Karma responses into flat CSV tables.")]
struct Cli {
    /// Where the CSV tables are written
    #[arg(long = "data-dir", env = "KARMA_DATA_DIR", default_value = "Data", global = true)]
    data_dir: PathBuf,

    /// Where the raw JSON responses are read from (default: the data directory)
    #[arg(long = "raw-dir", env = "KARMA_RAW_DIR", global = true)]
    raw_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract every table (the default).
    All,
    /// Extract a single table.
    Extract {
        /// card_balances, cash_balances, investment_balances, investment_history or transactions
        #[arg(value_parser = parse_table)]
        table: SourceKind,
    },
    /// Print the rows of a written table as JSON.
    Show {
        #[arg(value_parser = parse_table)]
        table: SourceKind,
    },
}

fn parse_table(table: &str) -> Result<SourceKind, String> {
    SourceKind::from_table(table).ok_or_else(|| {
        let known: Vec<&str> = SourceKind::ALL.iter().map(|k| k.table()).collect();
        format!("unknown table '{}' (expected one of: {})", table, known.join(", "))
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "karma_extract=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::with_dirs(cli.data_dir, cli.raw_dir);

    match cli.command.unwrap_or(Commands::All) {
        Commands::All => run_all(config),
        Commands::Extract { table } => run_extract(config, table),
        Commands::Show { table } => run_show(&config, table),
    }
}

fn run_all(config: Config) -> Result<()> {
    println!("📥 Extracting tables");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("   Raw:  {}", config.raw_dir.display());
    println!("   Data: {}", config.data_dir.display());

    let report = Pipeline::from_config(config).run(&TracingSink)?;

    println!();
    for table in &report.tables {
        print_table_report(table);
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ {} records across {} tables (run {})", report.total_records(), report.tables.len(), report.run_id);

    Ok(())
}

fn run_extract(config: Config, table: SourceKind) -> Result<()> {
    let report = Pipeline::from_config(config).run_one(table, &TracingSink)?;
    print_table_report(&report);
    Ok(())
}

fn run_show(config: &Config, table: SourceKind) -> Result<()> {
    let rows = read_rows(&config.csv_path(table))?;
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

fn print_table_report(report: &TableReport) {
    match &report.error {
        Some(error) => println!("❌ {:<20} {}", report.table.table(), error),
        None => println!(
            "✓ {:<20} {:>5} records → {}",
            report.table.table(),
            report.records,
            report.path.display()
        ),
    }
    for warning in &report.warnings {
        println!("   ⚠️  {}", warning);
    }
}
