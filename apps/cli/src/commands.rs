//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use tecdoc_client::{Requests, TecdocClient};
use tecdoc_core::pipeline::{self, ExportRequest, ProgressReporter};
use tecdoc_core::RunContext;
use tecdoc_csv::{ExportOptions, ExportOutcome, ExportReport};
use tecdoc_shared::{
    ARTICLE_COLUMNS, AppConfig, FetchConfig, Table, init_config, load_config, load_config_from,
};

/// Longest value shown in the sample article printout.
const SAMPLE_VALUE_MAX_CHARS: usize = 100;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// tecdoc-export — normalize TecDoc catalog data into flat CSV tables.
#[derive(Parser)]
#[command(
    name = "tecdoc-export",
    version,
    about = "Export TecDoc articles and their related data as schema-stable CSV files.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.tecdoc-export/tecdoc-export.toml.
    #[arg(long, global = true, env = "TECDOC_EXPORT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch articles from the catalog API and export them.
    Run {
        /// Data supplier (brand) id.
        #[arg(short, long)]
        supplier: i64,

        /// Article number to search for (repeatable).
        #[arg(short, long = "article", required = true)]
        articles: Vec<String>,

        /// Output directory (defaults to [export].output_dir).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// File name of the articles table (defaults to a timestamped name).
        #[arg(long)]
        articles_file: Option<PathBuf>,

        /// Also write the summary export.
        #[arg(long)]
        summary: bool,

        /// Only export articles; skip attributes, vehicles, brands, etc.
        #[arg(long)]
        no_related: bool,
    },

    /// Normalize a saved getArticles response without calling the API.
    Convert {
        /// Path to the saved JSON response.
        input: PathBuf,

        /// Output directory (defaults to [export].output_dir).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Also write the summary export.
        #[arg(long)]
        summary: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "tecdoc=info",
        1 => "tecdoc=debug",
        _ => "tecdoc=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Run {
            supplier,
            articles,
            out,
            articles_file,
            summary,
            no_related,
        } => {
            let config = resolve_config(config_path)?;
            let args = RunArgs {
                supplier,
                articles,
                out,
                articles_file,
                summary,
                no_related,
            };
            cmd_run(&config, args).await
        }
        Command::Convert {
            input,
            out,
            summary,
        } => {
            let config = resolve_config(config_path)?;
            cmd_convert(&config, &input, out, summary)
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

struct RunArgs {
    supplier: i64,
    articles: Vec<String>,
    out: Option<PathBuf>,
    articles_file: Option<PathBuf>,
    summary: bool,
    no_related: bool,
}

async fn cmd_run(config: &AppConfig, args: RunArgs) -> Result<()> {
    config.api.validate()?;

    let client = TecdocClient::new(&config.api)?;
    let requests = Requests::new(&config.api);

    let fetch = if args.no_related {
        FetchConfig {
            linking_target_type: config.fetch.linking_target_type.clone(),
            ..FetchConfig::articles_only()
        }
    } else {
        config.fetch.clone()
    };

    let batch: Vec<ExportRequest> = args
        .articles
        .iter()
        .map(|number| ExportRequest {
            supplier_id: args.supplier,
            article_number: number.clone(),
            fetch: fetch.clone(),
        })
        .collect();

    info!(
        supplier = args.supplier,
        articles = batch.len(),
        related = !args.no_related,
        "starting export run"
    );

    let reporter = CliProgress::new();
    let ctx = pipeline::export_articles(&client, &requests, &batch, &reporter).await?;

    let output_dir = output_dir(config, args.out);
    let options = ExportOptions {
        articles_file: args.articles_file.map(|f| output_dir.join(f)),
        output_dir,
        delimiter: config.export.delimiter,
        summary: args.summary,
        write_manifest: config.export.write_manifest,
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
    };

    write_and_report(&ctx, &options)
}

// ---------------------------------------------------------------------------
// convert
// ---------------------------------------------------------------------------

fn cmd_convert(config: &AppConfig, input: &Path, out: Option<PathBuf>, summary: bool) -> Result<()> {
    let content = std::fs::read_to_string(input)
        .wrap_err_with(|| format!("cannot read {}", input.display()))?;
    let response: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| eyre!("{} is not valid JSON: {e}", input.display()))?;

    info!(input = %input.display(), "normalizing saved response");
    let ctx = pipeline::normalize_response(&response)?;

    let options = ExportOptions {
        output_dir: output_dir(config, out),
        delimiter: config.export.delimiter,
        articles_file: None,
        summary,
        write_manifest: config.export.write_manifest,
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
    };

    write_and_report(&ctx, &options)
}

fn output_dir(config: &AppConfig, out: Option<PathBuf>) -> PathBuf {
    out.unwrap_or_else(|| PathBuf::from(&config.export.output_dir))
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

fn write_and_report(ctx: &RunContext, options: &ExportOptions) -> Result<()> {
    let report = tecdoc_csv::export_run(ctx, options)?;
    print_report(ctx, &report);

    match report.articles() {
        ExportOutcome::Written { .. } => Ok(()),
        ExportOutcome::Empty => Err(eyre!(
            "no articles exported ({} skipped for a missing article id)",
            ctx.skipped()
        )),
    }
}

fn print_report(ctx: &RunContext, report: &ExportReport) {
    println!();
    println!("  Run:      {}", ctx.run_id);
    for file in report.written() {
        if let Some(path) = file.outcome.path() {
            println!(
                "  {:<17} {:>5} rows  {}",
                format!("{}:", file.name),
                file.outcome.rows(),
                path.display()
            );
        }
    }
    if ctx.skipped() > 0 {
        println!("  Skipped:  {} article(s) without an article id", ctx.skipped());
    }
    if let Some(manifest) = &report.manifest {
        println!("  Manifest: {}", manifest.display());
    }

    if let Some(sample) = ctx.records(Table::Articles).first() {
        println!();
        println!("  Sample article:");
        for column in ARTICLE_COLUMNS {
            let value = sample.value(column);
            if !value.is_empty() {
                println!("    {column}: {}", truncate(value, SAMPLE_VALUE_MAX_CHARS));
            }
        }
    }
    println!();
}

/// At most `max` characters, with `...` appended when cut.
fn truncate(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &value[..end]),
        None => value.to_string(),
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn article_processed(&self, article_number: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Processing [{current}/{total}] {article_number}"));
    }

    fn done(&self, _ctx: &RunContext) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 100), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("äöüß", 2), "äö...");
        assert_eq!(truncate("abc", 3), "abc");
    }

    #[test]
    fn run_accepts_repeated_articles() {
        let cli = Cli::try_parse_from([
            "tecdoc-export",
            "run",
            "--supplier",
            "355",
            "--article",
            "1.31809",
            "-a",
            "4.61311",
            "--summary",
            "--no-related",
        ])
        .unwrap();

        match cli.command {
            Command::Run {
                supplier,
                articles,
                summary,
                no_related,
                ..
            } => {
                assert_eq!(supplier, 355);
                assert_eq!(articles, vec!["1.31809", "4.61311"]);
                assert!(summary && no_related);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn run_requires_an_article() {
        assert!(Cli::try_parse_from(["tecdoc-export", "run", "--supplier", "355"]).is_err());
    }

    #[test]
    fn convert_takes_an_input_path() {
        let cli =
            Cli::try_parse_from(["tecdoc-export", "-vv", "convert", "saved.json", "--out", "out"])
                .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::Convert { .. }));
    }
}
