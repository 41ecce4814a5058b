//! # ptouch CLI
//!
//! Command-line interface for Brother PT-P700 label printing.
//!
//! ## Usage
//!
//! ```bash
//! # Show printer status and installed tape
//! ptouch status
//!
//! # List supported tape widths
//! ptouch tapes
//!
//! # Print an image, three copies, cut between them
//! ptouch print --copies 3 label.png
//!
//! # Write the raster stream to a file instead of printing
//! ptouch print --tape 12 --dry-run out.bin label.png
//!
//! # Run a job against the built-in simulator
//! ptouch --simulate print label.png
//! ```
//!
//! Logging goes to stderr; `-v` / `-vv` raise the level, `RUST_LOG`
//! overrides it.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use ptouch::{
    PtouchError, label,
    printer::{Job, JobOptions, LabelPrinter, PrinterConfig, dry_run},
    protocol::{
        Status, TapeInfo,
        tables::{TAPE_WIDTHS, tape_info},
    },
    transport::{SerialTransport, SimulatedPrinter, Transport, serial::DEFAULT_DEVICE},
};

/// ptouch - Brother PT-P700 label printer utility
#[derive(Parser, Debug)]
#[command(name = "ptouch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Printer device path
    #[arg(long, global = true, default_value = DEFAULT_DEVICE)]
    device: PathBuf,

    /// Use the built-in printer simulator instead of a device
    #[arg(long, global = true)]
    simulate: bool,

    /// Tape width code (mm) for the simulator or a device-less dry run
    #[arg(long, global = true, value_name = "MM")]
    tape: Option<u8>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Query and show the printer status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List supported tape widths
    Tapes {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print an image file
    Print {
        /// Image to print; its height runs across the tape
        image: PathBuf,

        /// Number of copies
        #[arg(long, default_value = "1")]
        copies: usize,

        /// Don't cut between copies
        #[arg(long)]
        no_autocut: bool,

        /// Mirror the label
        #[arg(long)]
        mirror: bool,

        /// Chain printing: skip the feed and cut after the last copy
        #[arg(long)]
        chain: bool,

        /// Special tape (no cutting)
        #[arg(long)]
        special_tape: bool,

        /// Feed margin in dots
        #[arg(long, default_value = "14")]
        margin: u16,

        /// Send raster lines uncompressed
        #[arg(long)]
        no_compression: bool,

        /// Luminance threshold (0-255) below which pixels print
        #[arg(long, default_value_t = label::DEFAULT_THRESHOLD)]
        threshold: u8,

        /// Write the command stream to FILE instead of printing
        #[arg(long, value_name = "FILE")]
        dry_run: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

fn open_transport(cli: &Cli) -> Result<Box<dyn Transport>, PtouchError> {
    if cli.simulate {
        let tape = cli.tape.unwrap_or(24);
        tape_info(tape)?;
        tracing::info!(tape_mm = tape, "using simulated printer");
        Ok(Box::new(SimulatedPrinter::new(tape)))
    } else {
        Ok(Box::new(SerialTransport::open(&cli.device)?))
    }
}

fn run(cli: Cli) -> Result<(), PtouchError> {
    match &cli.command {
        Commands::Status { json } => {
            let mut transport = open_transport(&cli)?;
            let printer = LabelPrinter::new(&mut *transport);
            let status = printer.get_status()?;

            if *json {
                println!("{}", to_json(&status)?);
            } else {
                print_status(&status);
            }
        }

        Commands::Tapes { json } => {
            let tapes: Vec<(u8, TapeInfo)> = TAPE_WIDTHS
                .iter()
                .filter_map(|(code, info)| info.map(|info| (*code, info)))
                .collect();

            if *json {
                let entries: Vec<_> = tapes
                    .iter()
                    .map(|(code, info)| serde_json::json!({ "code": code, "tape": info }))
                    .collect();
                println!("{}", to_json(&entries)?);
            } else {
                let config = PrinterConfig::PT_P700;
                println!("Supported tapes ({}):", config.name);
                for (code, info) in &tapes {
                    println!(
                        "  {:>2}  {:>4}mm  {:>3} dots ({:.1}mm printable)  margins {} / {}",
                        code,
                        info.nominal_width_mm,
                        info.printarea_width,
                        config.dots_to_mm(info.printarea_width),
                        info.left_margin,
                        info.right_margin
                    );
                }
            }
        }

        Commands::Print {
            image,
            copies,
            no_autocut,
            mirror,
            chain,
            special_tape,
            margin,
            no_compression,
            threshold,
            dry_run: dry_run_path,
        } => {
            let options = JobOptions {
                autocut: !no_autocut,
                mirror: *mirror,
                chain_printing: *chain,
                special_tape: *special_tape,
                margin: *margin,
                compression: !no_compression,
                ..JobOptions::default()
            };

            if let Some(path) = dry_run_path {
                let tape = match cli.tape {
                    Some(code) => tape_info(code)?,
                    None => {
                        let mut transport = open_transport(&cli)?;
                        LabelPrinter::new(&mut *transport).get_status()?.tape
                    }
                }
                .ok_or_else(|| PtouchError::PrinterNotReady("no tape installed".to_string()))?;

                let bitmap = label::load(image, &tape, *threshold)?;
                let job = Job::from_bitmap(&bitmap, *copies)?;
                let bytes = dry_run(&job, &tape, &options)?;
                std::fs::write(path, &bytes)?;

                println!("Wrote {} bytes ({} lines) to {}", bytes.len(), job.line_count(), path.display());
                return Ok(());
            }

            let mut transport = open_transport(&cli)?;
            let mut printer = LabelPrinter::new(&mut *transport).with_options(options);

            let tape = printer
                .get_status()?
                .tape
                .ok_or_else(|| PtouchError::PrinterNotReady("no tape installed".to_string()))?;
            let bitmap = label::load(image, &tape, *threshold)?;
            println!(
                "Printing {} x {} dot label on {}mm tape ({} copies)...",
                bitmap.width(),
                bitmap.height(),
                tape.nominal_width_mm,
                copies
            );

            let job = Job::from_bitmap(&bitmap, *copies)?;
            let status = printer.print(&job)?;
            println!("Done. Printer reports: {:?}", status.status_type);
        }
    }

    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, PtouchError> {
    serde_json::to_string_pretty(value).map_err(|e| PtouchError::Io(e.into()))
}

fn print_status(status: &Status) {
    println!("Status:       {:?}", status.status_type);
    println!("Phase:        {} / {}", status.phase_type, status.phase_number);
    println!("Media type:   {:?}", status.media_type);
    match &status.tape {
        Some(tape) => println!(
            "Tape:         {}mm ({} printable dots)",
            tape.nominal_width_mm, tape.printarea_width
        ),
        None => println!("Tape:         none"),
    }
    println!("Errors:       {}", status.errors);
}
