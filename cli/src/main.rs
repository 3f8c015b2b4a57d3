//! pdfsheet CLI - PDF table extraction tool

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfsheet::convert::MSG_COMPLETE;
use pdfsheet::{
    ConvertOptions, Converter, InvalidBytes, JsonFormat, LopdfBackend, NoProgress, PdfBackend,
    Progress,
};

#[derive(Parser)]
#[command(name = "pdfsheet")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Extract PDF tables and tabular text into XLSX workbooks", long_about = None)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output workbook
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert PDF to an XLSX workbook
    Convert {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output workbook (defaults to <input stem>.xlsx)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Handling of text that cannot be stored in a sheet
        #[arg(long, value_enum, default_value = "drop")]
        invalid_bytes: InvalidBytesMode,

        /// Skip table detection and write the text sheet only
        #[arg(long)]
        no_tables: bool,

        /// Maximum columns a detected table may have
        #[arg(long, value_name = "N")]
        max_columns: Option<usize>,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Emit the extracted sheets as JSON
    Json {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show document information
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum InvalidBytesMode {
    /// Remove undecodable bytes and illegal characters
    Drop,
    /// Replace them with U+FFFD
    Replace,
    /// Fail the conversion
    Error,
}

impl From<InvalidBytesMode> for InvalidBytes {
    fn from(mode: InvalidBytesMode) -> Self {
        match mode {
            InvalidBytesMode::Drop => InvalidBytes::Drop,
            InvalidBytesMode::Replace => InvalidBytes::Replace,
            InvalidBytesMode::Error => InvalidBytes::Error,
        }
    }
}

/// Spinner that shows the current stage and finishes on the last message.
struct SpinnerProgress {
    pb: ProgressBar,
}

impl SpinnerProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(100));
        Ok(Self { pb })
    }
}

impl Progress for SpinnerProgress {
    fn message(&self, message: &str) {
        if message == MSG_COMPLETE {
            self.pb.finish_with_message(message.to_string());
        } else {
            self.pb.set_message(message.to_string());
        }
    }
}

impl Drop for SpinnerProgress {
    fn drop(&mut self) {
        if !self.pb.is_finished() {
            self.pb.abandon();
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Convert {
            input,
            output,
            invalid_bytes,
            no_tables,
            max_columns,
            quiet,
        }) => {
            let mut options = ConvertOptions::new()
                .with_invalid_bytes(invalid_bytes.into())
                .with_table_detection(!no_tables);
            if let Some(n) = max_columns {
                options = options.with_max_columns(n);
            }
            cmd_convert(&input, output.as_deref(), options, quiet)
        }
        Some(Commands::Json {
            input,
            output,
            compact,
        }) => cmd_json(&input, output.as_deref(), compact),
        Some(Commands::Info { input }) => cmd_info(&input),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: convert if input is provided
            if let Some(input) = cli.input {
                cmd_convert(
                    &input,
                    cli.output.as_deref(),
                    ConvertOptions::default(),
                    false,
                )
            } else {
                println!("{}", "Usage: pdfsheet <FILE> [OUTPUT]".yellow());
                println!("       pdfsheet --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// `<input stem>.xlsx` in the current directory.
fn default_output(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    PathBuf::from(format!("{}.xlsx", stem))
}

fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    options: ConvertOptions,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output(input));

    let converter = Converter::new(options);
    let report = if quiet {
        converter.convert(input, &output, &NoProgress)?
    } else {
        let progress = SpinnerProgress::new()?;
        converter.convert(input, &output, &progress)?
    };

    if !quiet {
        println!(
            "\n{} {}",
            "Saved to".green().bold(),
            report.output.display()
        );
        println!(
            "  {} {} detected tables",
            "├─".dimmed(),
            report.detected_tables
        );
        println!("  {} {} text rows", "├─".dimmed(), report.text_rows);
        println!("  {} {} sheets", "└─".dimmed(), report.sheet_count);
    }

    Ok(())
}

fn cmd_json(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let workbook = Converter::default().assemble(input, &NoProgress)?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let json = pdfsheet::to_json(&workbook, format)?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let backend = LopdfBackend::load_file(input)?;

    let mut tables = 0;
    for page in backend.page_numbers() {
        tables += backend.page_tables(page)?.len();
    }

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), backend.format());
    println!("{}: {}", "Pages".bold(), backend.page_count());
    println!("{}: {}", "Detected tables".bold(), tables);

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdfsheet".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF table extraction tool");
    println!();
    println!("License: MIT");
}
