use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use llmscan::{
    analyzer::{ApiProvider, LlmVerifier, Verifier},
    config::Config,
    output::{format_report_to_string, print_report, OutputFormat},
    scanner::{self, patterns, ScanOptions},
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
}

#[derive(Parser)]
#[command(name = "llmscan")]
#[command(
    author,
    version,
    about = "Scan a codebase for LLM provider API calls"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a directory for LLM API calls
    Scan {
        /// Directory to scan
        directory: PathBuf,

        /// Output format (table, json, markdown)
        #[arg(short, long)]
        format: Option<String>,

        /// API key for verification of uncertain detections
        #[arg(long)]
        api_key: Option<String>,

        /// Verification API to use (openrouter, gemini, openai)
        #[arg(long)]
        provider: Option<String>,

        /// Skip LLM verification even when an API key is available
        #[arg(long)]
        no_verify: bool,

        /// Write output to file
        #[arg(short, long)]
        output: Option<String>,

        /// Number of files to scan concurrently
        #[arg(long)]
        max_workers: Option<usize>,

        /// Enable debug logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// List known providers and wrapper frameworks
    ListProviders,

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

async fn run() -> Result<u8> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_default();

    match cli.command {
        Commands::Scan {
            directory,
            format,
            api_key,
            provider,
            no_verify,
            output,
            max_workers,
            verbose,
        } => {
            init_tracing(verbose);

            let format_str = format.unwrap_or_else(|| config.default_format.clone());
            let api_provider = match provider {
                Some(p) => ApiProvider::from_str(&p).map_err(|e| anyhow::anyhow!(e))?,
                None => config.api_provider,
            };
            let workers = max_workers.unwrap_or(config.max_workers);
            let resolved_key = if no_verify {
                None
            } else {
                config.resolve_api_key(api_key.as_deref(), api_provider)
            };

            run_scan_command(
                directory,
                format_str,
                resolved_key,
                api_provider,
                output,
                workers,
            )
            .await
        }
        Commands::ListProviders => {
            list_providers();
            Ok(exit_codes::SUCCESS)
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "llmscan=debug" } else { "llmscan=warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_scan_command(
    directory: PathBuf,
    format: String,
    api_key: Option<String>,
    api_provider: ApiProvider,
    output_file: Option<String>,
    max_workers: usize,
) -> Result<u8> {
    let format = OutputFormat::from_str(&format).map_err(|e| anyhow::anyhow!(e))?;
    let is_interactive = format == OutputFormat::Table && output_file.is_none();

    let options = ScanOptions::new(directory).with_max_workers(max_workers);

    let verifier: Option<LlmVerifier> =
        api_key.map(|key| LlmVerifier::new(key, api_provider));

    let progress = if is_interactive {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(match &verifier {
            Some(v) => format!("Scanning for LLM API calls (verifying via {})...", v.name()),
            None => "Scanning for LLM API calls...".to_string(),
        });
        Some(pb)
    } else {
        None
    };

    let report = scanner::run_scan(
        &options,
        verifier.as_ref().map(|v| v as &dyn Verifier),
    )
    .await?;

    if let Some(pb) = progress {
        pb.finish_with_message(format!(
            "Scanned {} files, found {} calls",
            report.summary.files_scanned, report.summary.total_calls
        ));
    }

    if let Some(path) = output_file {
        let content = format_report_to_string(&report, format)?;
        std::fs::write(&path, content)?;
        println!("Results written to: {}", path);
    } else {
        print_report(&report, format)?;
    }

    Ok(exit_codes::SUCCESS)
}

fn list_providers() {
    println!("Known LLM providers:");
    println!();
    for provider in patterns::LLM_PROVIDERS {
        println!(
            "  {:<15} {} import pattern(s), {} endpoint(s)",
            provider.name,
            provider.imports.len(),
            provider.endpoints.len()
        );
    }

    println!();
    println!("Known wrapper frameworks:");
    println!();
    for wrapper in patterns::WRAPPER_FRAMEWORKS {
        println!(
            "  {:<15} {} import pattern(s)",
            wrapper.name,
            wrapper.imports.len()
        );
    }
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    // Show current config
    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'llmscan config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
