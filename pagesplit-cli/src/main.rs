use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use pagesplit::{decode, DocumentBackend, LopdfBackend, PdfSplitter, SplitOptions, NATIVE_MEDIA_TYPE};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Parser)]
#[command(
    name = "pagesplit",
    about = "Split PDF documents into one file per page",
    version,
    author
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a PDF into one file per page
    Split {
        /// Input PDF file
        input: PathBuf,

        /// Directory the pages are written to
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Output pattern (use {} for page number)
        #[arg(short = 'p', long, default_value = "page_{}.pdf")]
        pattern: String,
    },

    /// Get information about a PDF file
    Info {
        /// Input PDF file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Split {
            input,
            output,
            pattern,
        } => split(&input, &output, &pattern),
        Commands::Info { input } => show_info(&input),
    }
}

/// `RUST_LOG` wins; otherwise `-v` raises the default `warn` level.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn split(input: &Path, output_dir: &Path, pattern: &str) -> Result<()> {
    if !pattern.contains("{}") {
        bail!("output pattern must contain {{}} for the page number");
    }

    let raw = fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    let document = decode(&raw, false, Some(NATIVE_MEDIA_TYPE))
        .with_context(|| format!("{} holds no PDF data", input.display()))?;
    debug!(size = document.len(), "Read input document");

    let pages = PdfSplitter::lopdf(SplitOptions::default())
        .split(&document)
        .with_context(|| format!("failed to split {}", input.display()))?;

    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    for page in &pages {
        let path = output_dir.join(output_filename(pattern, page.page_number()));
        fs::write(&path, page.bytes())
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(page = page.page_number(), size = page.size(), path = %path.display(), "Wrote page");
    }

    println!(
        "Split {} into {} page(s) in {}",
        input.display(),
        pages.len(),
        output_dir.display()
    );
    Ok(())
}

fn show_info(input: &Path) -> Result<()> {
    let raw = fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    let opened = LopdfBackend::new()
        .open(&raw)
        .with_context(|| format!("failed to parse {}", input.display()))?;

    println!("PDF Information for: {}", input.display());
    println!("==========================================");
    println!("File size: {} bytes", raw.len());
    println!("Pages: {}", opened.page_count());
    Ok(())
}

/// Replace every `{}` in `pattern` with the 1-based page number
fn output_filename(pattern: &str, page_number: usize) -> String {
    pattern.replace("{}", &page_number.to_string())
}
