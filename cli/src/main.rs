//! hanu CLI - PDF to Excel, Word and PowerPoint converter

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use hanu::backend::LopdfBackend;
use hanu::progress::NoopReporter;
use hanu::{
    ConvertOptions, Engine, FileSink, PdfSource, ProgressTracker, SlideImageFormat, TargetFormat,
};

/// Default output directory, relative to the working directory.
const DEFAULT_OUTPUT_DIR: &str = "Hanu_Converted";

#[derive(Parser)]
#[command(name = "hanu")]
#[command(author = "Hanu")]
#[command(version)]
#[command(about = "Convert PDF files to Excel, Word and PowerPoint", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a PDF to an office document
    Convert {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Target format (xlsx, docx, pptx, excel, word, ppt)
        #[arg(short, long, value_name = "FORMAT", value_parser = parse_format)]
        to: TargetFormat,

        /// Output directory
        #[arg(short, long, value_name = "DIR", env = "HANU_OUTPUT_DIR")]
        output: Option<PathBuf>,

        /// Page render scale for presentations
        #[arg(long, default_value = "2.0")]
        scale: f32,

        /// Encode slide pictures as JPEG with the given quality
        #[arg(long, value_name = "QUALITY", num_args = 0..=1, default_missing_value = "90")]
        jpeg: Option<u8>,

        /// Progress display
        #[arg(long, value_enum, default_value = "bar")]
        progress: ProgressMode,
    },

    /// Show document information
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Number of text lines to preview
        #[arg(long, default_value = "10")]
        preview: usize,
    },

    /// List supported output formats
    Formats,

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ProgressMode {
    /// Progress bar on stderr
    Bar,
    /// One JSON object per progress event on stdout
    Json,
    /// No progress output
    None,
}

fn parse_format(s: &str) -> Result<TargetFormat, String> {
    s.parse::<TargetFormat>().map_err(|e| e.to_string())
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Convert {
            input,
            to,
            output,
            scale,
            jpeg,
            progress,
        }) => cmd_convert(&input, to, output.as_deref(), scale, jpeg, progress),
        Some(Commands::Info { input, preview }) => cmd_info(&input, preview),
        Some(Commands::Formats) => {
            cmd_formats();
            Ok(())
        }
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            println!("{}", "Usage: hanu convert <FILE> --to <FORMAT>".yellow());
            println!("       hanu --help for more information");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn cmd_convert(
    input: &Path,
    format: TargetFormat,
    output: Option<&Path>,
    scale: f32,
    jpeg: Option<u8>,
    mode: ProgressMode,
) -> Result<(), Box<dyn std::error::Error>> {
    if !hanu::is_pdf(input) {
        return Err(hanu::Error::UnknownFormat.into());
    }

    let mut options = ConvertOptions::new().with_raster_scale(scale);
    if let Some(quality) = jpeg {
        options = options.with_slide_image(SlideImageFormat::Jpeg { quality });
    }

    let source = PdfSource::open(input)?;
    let output_dir = output.unwrap_or_else(|| Path::new(DEFAULT_OUTPUT_DIR));
    let sink = FileSink::in_dir(output_dir, &format.output_file_name(source.name()))?;

    log::info!("Converting {} to {}", input.display(), sink.path().display());

    let engine = Engine::with_options(options);
    let handle = engine.spawn(source, format, sink)?;

    let pb = match mode {
        ProgressMode::Bar => {
            let pb = ProgressBar::new(100);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")?
                    .progress_chars("#>-"),
            );
            Some(pb)
        }
        _ => None,
    };

    // The channel disconnects once the worker is done.
    for event in handle.events().iter() {
        match mode {
            ProgressMode::Bar => {
                if let Some(pb) = &pb {
                    pb.set_position(event.percent as u64);
                    pb.set_message(event.status.clone());
                }
            }
            ProgressMode::Json => println!("{}", serde_json::to_string(&event)?),
            ProgressMode::None => {}
        }
    }

    let sink = match handle.join() {
        Ok(sink) => {
            if let Some(pb) = &pb {
                pb.finish_with_message("Done!");
            }
            sink
        }
        Err(e) => {
            if let Some(pb) = &pb {
                pb.abandon();
            }
            return Err(e.user_message().into());
        }
    };

    println!("\n{}", "Conversion complete".green().bold());
    println!("  {} {}", "├─ File:".dimmed(), sink.path().display());
    println!("  {} {}", "├─ Format:".dimmed(), format.label());
    println!(
        "  {} {}",
        "└─ Size:".dimmed(),
        format_size(sink.bytes_written().unwrap_or(0))
    );

    Ok(())
}

fn cmd_info(input: &Path, preview: usize) -> Result<(), Box<dyn std::error::Error>> {
    let header = hanu::detect::sniff_file(input)?;
    let source = PdfSource::open(input)?;
    let pages = hanu::extract::page_count(&source);
    let encryption = match LopdfBackend::load_bytes(source.bytes()) {
        Ok(backend) if backend.is_encrypted() => "yes",
        Ok(_) => "no",
        Err(hanu::Error::Encrypted) => "yes (password required)",
        Err(_) => "unknown",
    };

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), header);
    println!("{}: {}", "Size".bold(), format_size(source.len() as u64));
    println!("{}: {}", "Pages".bold(), pages);
    println!("{}: {}", "Encrypted".bold(), encryption);

    let mut progress = ProgressTracker::new(&NoopReporter);
    let lines = hanu::extract::extract(&source, &mut progress)?;

    println!();
    println!("{}", "Text Preview".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for line in lines.iter().take(preview) {
        if hanu::extract::is_page_marker(line) {
            println!("{}", line.dimmed());
        } else {
            println!("{}", line);
        }
    }
    if lines.len() > preview {
        println!("{}", format!("… {} more lines", lines.len() - preview).dimmed());
    }

    Ok(())
}

fn cmd_formats() {
    println!("{}", "Supported Formats".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for format in TargetFormat::ALL {
        println!("{:<6} {}", format.extension().bold(), format.label());
        println!("       {}", format.mime_type().dimmed());
    }
}

fn cmd_version() {
    println!("{} {}", "hanu".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF to Excel, Word and PowerPoint converter");
    println!();
    println!("License: MIT");
}
