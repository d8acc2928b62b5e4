use clap::Parser;
use colored::Colorize;
use keyscan::{
    config::{parse_file_types, EncodingMode, ScanSettings},
    report, Aggregator, CancellationToken, ScanEngine, ScanError,
};
use std::{
    io,
    num::NonZeroUsize,
    path::PathBuf,
    process::ExitCode,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

type Result<T> = std::result::Result<T, ScanError>;

/// Search file names, and optionally file contents, for a keyword
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory to search recursively
    directory: PathBuf,

    /// Keyword to search for (literal, case-insensitive)
    keyword: String,

    /// Number of worker threads [default: 10]
    #[arg(long)]
    threads: Option<NonZeroUsize>,

    /// Maximum file size in bytes; -1 or inf for no limit [default: 10485760]
    #[arg(long, allow_hyphen_values = true)]
    max_size: Option<String>,

    /// Also search file contents
    #[arg(long)]
    read_content: bool,

    /// Comma separated file types to search, e.g. txt,log [default: all]
    #[arg(long)]
    file_types: Option<String>,

    /// File to write the results to [default: search_results.txt]
    #[arg(long)]
    output_file: Option<PathBuf>,

    /// How to handle invalid UTF-8 in file contents (ignore|replace) [default: ignore]
    #[arg(long)]
    encoding: Option<String>,

    /// Additional YAML settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl Cli {
    /// Settings given on the command line, used to override settings files
    fn settings(&self) -> Result<ScanSettings> {
        let encoding = self
            .encoding
            .as_deref()
            .map(str::parse::<EncodingMode>)
            .transpose()?;

        Ok(ScanSettings {
            threads: self.threads,
            max_size: self.max_size.clone(),
            read_content: self.read_content.then_some(true),
            file_types: self.file_types.as_deref().map(parse_file_types),
            output_file: self.output_file.clone(),
            encoding,
        })
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let settings = ScanSettings::load_from(cli.config.as_deref())?.merge(cli.settings()?);
    let config = settings.resolve(&cli.directory, &cli.keyword)?;
    info!("Resolved configuration: {:?}", config);

    let token = CancellationToken::new();
    let handler_token = token.clone();
    // first interrupt stops dispatching, a second one exits immediately
    if let Err(e) = ctrlc::set_handler(move || {
        if handler_token.is_cancelled() {
            std::process::exit(130);
        }
        handler_token.cancel();
    }) {
        warn!("Interrupt handler not installed: {}", e);
    }

    let aggregator = Aggregator::with_echo(io::stdout());
    let summary = ScanEngine::new(&config)
        .with_cancellation(token)
        .run(&aggregator)?;
    let records = aggregator.drain();

    if summary.interrupted {
        eprintln!(
            "{} scan interrupted, writing {} results found so far",
            "warning:".yellow().bold(),
            records.len()
        );
    }

    if let Err(e) = report::write_report(&config.output_file, &records, &summary) {
        // the records were already echoed; still show how long the run took
        println!("\n{}", summary.summary_line());
        return Err(e);
    }

    println!(
        "{}",
        format!("搜索结果已输出到 {}", config.output_file.display()).green()
    );
    Ok(())
}
