//! CLI binary for refsync.
//!
//! Usage: refsync sync
//!        refsync cite urls.txt 10.1000/182 --format bibtex -o refs.bib

use clap::{Parser, Subcommand};
use refsync::config::{Overrides, Settings};
use refsync::input::{self, Origin};
use refsync::sync::{SyncOutcome, SyncReport};
use refsync::{batch, BatchOptions, ReadwiseClient, TranslatorClient, ZoteroClient};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "refsync", about = "Readwise-to-Zotero sync and citation resolution", version)]
struct Cli {
    /// Config file path (default: <config_dir>/refsync/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Readwise API token (overrides READWISE_API_TOKEN)
    #[arg(long, global = true)]
    readwise_token: Option<String>,

    /// Zotero API key (overrides ZOTERO_API_KEY)
    #[arg(long, global = true)]
    zotero_key: Option<String>,

    /// Zotero user ID (overrides ZOTERO_USER_ID)
    #[arg(long, global = true)]
    zotero_user: Option<String>,

    /// Translation server URL
    #[arg(long, global = true)]
    translator_url: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    no_ssl_verify: bool,

    /// Verbose diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ReportFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync Readwise highlight source URLs into the Zotero library
    Sync {
        /// Report format
        #[arg(long, default_value = "table")]
        output: ReportFormat,
    },
    /// Resolve URLs, DOIs, other identifiers, and file paths into citations
    Cite {
        /// URLs, DOIs, other identifiers, or file paths (stdin when empty)
        inputs: Vec<String>,
        /// Output file to write the results (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Format to store the results in
        #[arg(short, long, default_value = "bibtex")]
        format: String,
        /// Don't emit unresolved identifiers to the output
        #[arg(long)]
        hide_failures: bool,
    },
}

fn overrides(cli: &Cli) -> Overrides {
    Overrides {
        readwise_token: cli.readwise_token.clone(),
        zotero_api_key: cli.zotero_key.clone(),
        zotero_user_id: cli.zotero_user.clone(),
        translator_url: cli.translator_url.clone(),
        no_ssl_verify: cli.no_ssl_verify,
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "refsync=debug" } else { "refsync=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_report_table(report: &SyncReport) {
    use comfy_table::{ContentArrangement, Table};

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["URL", "Outcome", "Title"]);
    for record in &report.records {
        table.add_row(vec![
            record.url.as_str(),
            &record.outcome.to_string(),
            record.title.as_deref().unwrap_or("-"),
        ]);
    }
    println!("{table}");
    println!(
        "{} inserted, {} already present, {} failed to resolve, {} failed to insert",
        report.count(SyncOutcome::Inserted),
        report.count(SyncOutcome::Skipped),
        report.count(SyncOutcome::ResolveFailed),
        report.count(SyncOutcome::InsertFailed),
    );
}

async fn run_sync(settings: &Settings, output: ReportFormat) -> refsync::Result<()> {
    let creds = settings.sync_credentials()?;
    let readwise =
        ReadwiseClient::new(creds.readwise_token).with_ssl_verification(settings.verify_ssl);
    let zotero = ZoteroClient::new(creds.zotero_api_key, creds.zotero_user_id)
        .with_ssl_verification(settings.verify_ssl);
    let translator = TranslatorClient::new(settings.translator_url.clone())
        .with_ssl_verification(settings.verify_ssl);

    let report = refsync::sync::run(&readwise, &zotero, &translator).await;
    match output {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        ReportFormat::Table => print_report_table(&report),
    }
    Ok(())
}

async fn run_cite(
    settings: &Settings,
    inputs: Vec<String>,
    output: Option<PathBuf>,
    format: String,
    hide_failures: bool,
) -> refsync::Result<i32> {
    let items = if inputs.is_empty() {
        eprintln!("No arguments provided. Reading from standard input...");
        input::read_items(std::io::stdin().lock(), Origin::Stdin)?
    } else {
        input::collect_inputs(&inputs)?
    };

    if items.is_empty() {
        eprintln!("No URLs or identifiers found.\nUsage: refsync cite [URLs or IDs]");
        return Ok(1);
    }

    let translator = TranslatorClient::new(settings.translator_url.clone())
        .with_ssl_verification(settings.verify_ssl);
    let options = BatchOptions {
        format,
        hide_failures,
        ..Default::default()
    };

    // Per-item failures never change the exit code; only a hard error from
    // the run (export abort, unwritable output) does.
    let report = match output {
        Some(path) => {
            let mut file = std::fs::File::create(&path)?;
            batch::run(&translator, &items, &options, &mut file).await?
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            batch::run(&translator, &items, &options, &mut lock).await?
        }
    };

    tracing::info!(
        "{} resolved, {} unresolved",
        report.resolved,
        report.unresolved
    );
    Ok(0)
}

async fn run(cli: Cli) -> refsync::Result<i32> {
    let settings = Settings::resolve(cli.config.as_deref(), &overrides(&cli))?;

    match cli.command {
        Commands::Sync { output } => {
            run_sync(&settings, output).await?;
            Ok(0)
        }
        Commands::Cite {
            inputs,
            output,
            format,
            hide_failures,
        } => run_cite(&settings, inputs, output, format, hide_failures).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
